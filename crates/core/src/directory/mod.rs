//! User-directory ingestion: reading the CSV export and turning its rows into
//! a login-keyed user mapping.
//!
//! The pipeline is:
//! 1. [`TabularReader`] parses the delimited file into a header row plus
//!    data rows.
//! 2. [`map_records`] builds a [`User`] from each row and inserts it under
//!    its login, later rows overwriting earlier ones.

pub mod mapper;
pub mod reader;
pub mod record;

pub use mapper::{map_records, MappedUsers};
pub use reader::{Table, TabularReader};
pub use record::{FieldName, User, UserMapping};
