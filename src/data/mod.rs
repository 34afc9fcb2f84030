//! Data files: CSV schemas, the built-in catalog, and log storage.

pub mod schema;
pub mod seed;
pub mod store;

pub use schema::parse_attempt_line;
pub use seed::default_catalog;
pub use store::{
    append_attempt, list_users, load_attempts_or_empty, load_catalog, user_log_path,
    write_catalog,
};
