//! Terraform variables file rendering and writing.
//!
//! The output is a single assignment whose value is the user mapping as
//! pretty-printed JSON, which HCL accepts as an object literal:
//!
//! ```text
//!
//! users = {
//!   "jdoe": {
//!     "login": "jdoe",
//!     "firstName": "Jane",
//!     ...
//!   }
//! }
//! ```

use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::directory::UserMapping;
use crate::errors::ExportError;

/// Variable name used when none is configured.
pub const DEFAULT_VARIABLE: &str = "users";

/// Returns true if `name` can stand on the left of an HCL assignment.
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Render `users` as the body of a variables file.
///
/// Logins are emitted in sorted order and attributes in a fixed order, with
/// two-space indentation, so regenerated files diff cleanly.
pub fn render(variable: &str, users: &UserMapping) -> Result<String, ExportError> {
    if !is_valid_variable_name(variable) {
        return Err(ExportError::InvalidVariableName(variable.to_string()));
    }

    let value = serde_json::to_string_pretty(users)?;
    Ok(format!("\n{} = {}\n", variable, value))
}

/// Parse a rendered variables file back into a mapping.
pub fn parse(text: &str, variable: &str) -> Result<UserMapping, ExportError> {
    let body = text.trim_start();
    let value = body
        .strip_prefix(variable)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| {
            ExportError::Serialization(format!("missing '{} =' assignment", variable))
        })?;

    Ok(serde_json::from_str(value)?)
}

/// Replace the file at `path` with `contents`.
///
/// The data is written to a temporary file next to the target and renamed
/// over it, so a failure never leaves a truncated target behind.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), ExportError> {
    let path = path.as_ref();
    info!(path = %path.display(), bytes = contents.len(), "writing variables file");

    let write_err = |source: std::io::Error| ExportError::Write {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;

    // The temp file is created owner-only; keep the target's mode instead.
    let permissions = match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    };
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), "variables file replaced");
    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::User;

    fn sample() -> UserMapping {
        let mut users = UserMapping::new();
        users.insert(
            "jdoe".into(),
            User {
                login: "jdoe".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                email: "jdoe@example.com".into(),
                ..User::default()
            },
        );
        users.insert(
            "alice".into(),
            User {
                login: "alice".into(),
                title: "Staff \"SRE\"".into(),
                ..User::default()
            },
        );
        users
    }

    #[test]
    fn test_variable_names() {
        assert!(is_valid_variable_name("users"));
        assert!(is_valid_variable_name("_team_users"));
        assert!(is_valid_variable_name("okta-users2"));
        assert!(!is_valid_variable_name(""));
        assert!(!is_valid_variable_name("9users"));
        assert!(!is_valid_variable_name("my users"));
    }

    #[test]
    fn test_render_layout() {
        let mut users = UserMapping::new();
        users.insert(
            "jdoe".into(),
            User {
                login: "jdoe".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                ..User::default()
            },
        );

        let text = render("users", &users).unwrap();
        let expected = r#"
users = {
  "jdoe": {
    "login": "jdoe",
    "firstName": "Jane",
    "lastName": "Doe",
    "email": "",
    "title": "",
    "displayName": "",
    "nickName": "",
    "userType": "",
    "organization": "",
    "department": "",
    "division": "",
    "startDate": ""
  }
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_mapping() {
        let text = render("users", &UserMapping::new()).unwrap();
        assert_eq!(text, "\nusers = {}\n");
    }

    #[test]
    fn test_render_sorts_logins() {
        let text = render("users", &sample()).unwrap();
        let alice = text.find("\"alice\": {").unwrap();
        let jdoe = text.find("\"jdoe\": {").unwrap();
        assert!(alice < jdoe);
    }

    #[test]
    fn test_render_rejects_bad_variable() {
        let result = render("1users", &sample());
        assert!(matches!(result, Err(ExportError::InvalidVariableName(_))));
    }

    #[test]
    fn test_render_then_parse() {
        let users = sample();
        let text = render("directory_users", &users).unwrap();
        let parsed = parse(&text, "directory_users").unwrap();
        assert_eq!(parsed, users);
    }

    #[test]
    fn test_parse_wrong_variable() {
        let text = render("users", &sample()).unwrap();
        let result = parse(&text, "people");
        assert!(matches!(result, Err(ExportError::Serialization(_))));
    }

    #[test]
    fn test_parse_malformed_value() {
        let result = parse("\nusers = { \"jdoe\": \n", "users");
        assert!(matches!(result, Err(ExportError::Serialization(_))));
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variables.auto.tfvars");
        std::fs::write(&path, "stale content that is longer than the new one").unwrap();

        write_atomic(&path, "\nusers = {}\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\nusers = {}\n");

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_target_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variables.auto.tfvars");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, "\nusers = {}\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);

        std::fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();
        write_atomic(&path, "\nusers = {}\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variables.auto.tfvars");

        write_atomic(&path, "\nusers = {}\n").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_atomic_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("variables.auto.tfvars");
        let result = write_atomic(&path, "\nusers = {}\n");
        assert!(matches!(result, Err(ExportError::Write { .. })));
    }
}
