//! Turns parsed rows into a login-keyed [`UserMapping`].

use tracing::{debug, info, warn};

use super::reader::Table;
use super::record::{FieldName, User, UserMapping};

/// Result of mapping a [`Table`].
#[derive(Debug, Clone, Default)]
pub struct MappedUsers {
    /// Users keyed by login.
    pub users: UserMapping,
    /// Logins that were overwritten by a later row, once per overwrite.
    pub duplicates: Vec<String>,
    /// Header labels that did not match any user attribute.
    pub ignored_columns: Vec<String>,
    /// Recognized attributes that no header column supplies.
    pub missing_fields: Vec<FieldName>,
}

/// Build a user from every data row and key it by login.
///
/// Columns are matched to attributes by header label. Unrecognized labels
/// are dropped, a row shorter than the header leaves the missing attributes
/// empty, and a later row with the same login replaces the earlier one.
pub fn map_records(table: &Table) -> MappedUsers {
    let columns: Vec<Option<FieldName>> = table
        .headers
        .iter()
        .map(|label| FieldName::from_header(label))
        .collect();

    let ignored_columns: Vec<String> = table
        .headers
        .iter()
        .zip(&columns)
        .filter(|(_, field)| field.is_none())
        .map(|(label, _)| label.clone())
        .collect();
    if !ignored_columns.is_empty() {
        debug!(columns = ?ignored_columns, "ignoring unrecognized columns");
    }

    let missing_fields: Vec<FieldName> = FieldName::ALL
        .into_iter()
        .filter(|field| !columns.contains(&Some(*field)))
        .collect();
    if !missing_fields.is_empty() {
        let names: Vec<String> = missing_fields.iter().map(ToString::to_string).collect();
        debug!(fields = %names.join(","), "export has no column for some attributes");
    }

    let mut users = UserMapping::new();
    let mut duplicates = Vec::new();

    for (index, row) in table.rows.iter().enumerate() {
        if row.len() < columns.len() {
            debug!(
                row = index + 1,
                fields = row.len(),
                expected = columns.len(),
                "row is shorter than header, missing fields left empty"
            );
        }

        let mut user = User::default();
        for (position, field) in columns.iter().enumerate() {
            if let Some(field) = field {
                let value = row.get(position).cloned().unwrap_or_default();
                user.set(*field, value);
            }
        }

        let login = user.login.clone();
        if users.insert(login.clone(), user).is_some() {
            warn!(login = %login, row = index + 1, "duplicate login, keeping later row");
            duplicates.push(login);
        }
    }

    info!(
        rows = table.rows.len(),
        users = users.len(),
        duplicates = duplicates.len(),
        "mapped directory records"
    );

    MappedUsers {
        users,
        duplicates,
        ignored_columns,
        missing_fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_single_row() {
        let mapped = map_records(&table(
            &["login", "firstName", "lastName"],
            &[&["jdoe", "Jane", "Doe"]],
        ));

        let expected = User {
            login: "jdoe".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            ..User::default()
        };
        assert_eq!(mapped.users.len(), 1);
        assert_eq!(mapped.users["jdoe"], expected);
        assert!(mapped.duplicates.is_empty());
    }

    #[test]
    fn test_one_entry_per_distinct_login() {
        let mapped = map_records(&table(
            &["login", "email"],
            &[
                &["a", "a@example.com"],
                &["b", "b@example.com"],
                &["c", "c@example.com"],
            ],
        ));
        assert_eq!(mapped.users.len(), 3);
    }

    #[test]
    fn test_duplicate_login_last_write_wins() {
        let mapped = map_records(&table(
            &["login", "firstName", "lastName"],
            &[&["bob", "Bob", "Smith"], &["bob", "Robert", "Smith"]],
        ));
        assert_eq!(mapped.users.len(), 1);
        assert_eq!(mapped.users["bob"].first_name, "Robert");
        assert_eq!(mapped.duplicates, vec!["bob"]);
    }

    #[test]
    fn test_unrecognized_column_dropped() {
        let mapped = map_records(&table(
            &["login", "phoneNumber", "email"],
            &[&["jdoe", "555-0100", "jdoe@example.com"]],
        ));
        let user = &mapped.users["jdoe"];
        assert_eq!(user.email, "jdoe@example.com");
        assert_eq!(mapped.ignored_columns, vec!["phoneNumber"]);
        assert!(!mapped.missing_fields.contains(&FieldName::Email));
        assert!(mapped.missing_fields.contains(&FieldName::StartDate));

        let json = serde_json::to_string(user).unwrap();
        assert!(!json.contains("phoneNumber"));
        assert!(!json.contains("555-0100"));
    }

    #[test]
    fn test_short_row_leaves_fields_empty() {
        let mapped = map_records(&table(
            &["login", "firstName", "department"],
            &[&["jdoe", "Jane"]],
        ));
        let user = &mapped.users["jdoe"];
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.department, "");
    }

    #[test]
    fn test_missing_login_column_collapses_to_empty_key() {
        let mapped = map_records(&table(
            &["firstName"],
            &[&["Jane"], &["John"]],
        ));
        assert_eq!(mapped.users.len(), 1);
        assert_eq!(mapped.users[""].first_name, "John");
    }

    #[test]
    fn test_column_order_is_irrelevant() {
        let mapped = map_records(&table(
            &["startDate", "division", "login"],
            &[&["2022-03-01", "Cloud", "kim"]],
        ));
        let user = &mapped.users["kim"];
        assert_eq!(user.start_date, "2022-03-01");
        assert_eq!(user.division, "Cloud");
    }

    #[test]
    fn test_all_columns_present() {
        let headers: Vec<&str> = FieldName::ALL.iter().map(FieldName::as_str).collect();
        let mapped = map_records(&table(&headers, &[]));
        assert!(mapped.missing_fields.is_empty());
        assert!(mapped.ignored_columns.is_empty());
    }

    #[test]
    fn test_no_data_rows() {
        let mapped = map_records(&table(&["login"], &[]));
        assert!(mapped.users.is_empty());
    }
}
