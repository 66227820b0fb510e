//! The user entity and the header-label lookup table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Login -> user mapping. Ordered by login so the rendered output is stable.
pub type UserMapping = BTreeMap<String, User>;

/// One directory record.
///
/// Every attribute is kept verbatim as text; nothing is parsed or validated.
/// Serialized field order follows declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Login identifier, also the mapping key.
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub title: String,
    pub display_name: String,
    pub nick_name: String,
    pub user_type: String,
    pub organization: String,
    pub department: String,
    pub division: String,
    /// Start date as exported, e.g. `2021-04-01`.
    pub start_date: String,
}

/// Header labels recognized in the directory export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Login,
    FirstName,
    LastName,
    Email,
    Title,
    DisplayName,
    NickName,
    UserType,
    Organization,
    Department,
    Division,
    StartDate,
}

impl FieldName {
    /// All recognized fields, in output order.
    pub const ALL: [FieldName; 12] = [
        FieldName::Login,
        FieldName::FirstName,
        FieldName::LastName,
        FieldName::Email,
        FieldName::Title,
        FieldName::DisplayName,
        FieldName::NickName,
        FieldName::UserType,
        FieldName::Organization,
        FieldName::Department,
        FieldName::Division,
        FieldName::StartDate,
    ];

    /// Look up a header label. Matching is exact and case-sensitive.
    pub fn from_header(label: &str) -> Option<Self> {
        let field = match label {
            "login" => FieldName::Login,
            "firstName" => FieldName::FirstName,
            "lastName" => FieldName::LastName,
            "email" => FieldName::Email,
            "title" => FieldName::Title,
            "displayName" => FieldName::DisplayName,
            "nickName" => FieldName::NickName,
            "userType" => FieldName::UserType,
            "organization" => FieldName::Organization,
            "department" => FieldName::Department,
            "division" => FieldName::Division,
            "startDate" => FieldName::StartDate,
            _ => return None,
        };
        Some(field)
    }

    /// The header label (and output key) for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Login => "login",
            FieldName::FirstName => "firstName",
            FieldName::LastName => "lastName",
            FieldName::Email => "email",
            FieldName::Title => "title",
            FieldName::DisplayName => "displayName",
            FieldName::NickName => "nickName",
            FieldName::UserType => "userType",
            FieldName::Organization => "organization",
            FieldName::Department => "department",
            FieldName::Division => "division",
            FieldName::StartDate => "startDate",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl User {
    /// Assign `value` to the attribute named by `field`.
    pub fn set(&mut self, field: FieldName, value: String) {
        let slot = match field {
            FieldName::Login => &mut self.login,
            FieldName::FirstName => &mut self.first_name,
            FieldName::LastName => &mut self.last_name,
            FieldName::Email => &mut self.email,
            FieldName::Title => &mut self.title,
            FieldName::DisplayName => &mut self.display_name,
            FieldName::NickName => &mut self.nick_name,
            FieldName::UserType => &mut self.user_type,
            FieldName::Organization => &mut self.organization,
            FieldName::Department => &mut self.department,
            FieldName::Division => &mut self.division,
            FieldName::StartDate => &mut self.start_date,
        };
        *slot = value;
    }

    /// Read the attribute named by `field`.
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Login => &self.login,
            FieldName::FirstName => &self.first_name,
            FieldName::LastName => &self.last_name,
            FieldName::Email => &self.email,
            FieldName::Title => &self.title,
            FieldName::DisplayName => &self.display_name,
            FieldName::NickName => &self.nick_name,
            FieldName::UserType => &self.user_type,
            FieldName::Organization => &self.organization,
            FieldName::Department => &self.department,
            FieldName::Division => &self.division,
            FieldName::StartDate => &self.start_date,
        }
    }
}
