pub mod admin;
pub mod query;
pub mod types;

pub use admin::{get_search_options, get_search_settings, update_search_settings};
pub use query::{list_search_types, search};
