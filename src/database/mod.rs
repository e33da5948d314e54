// Database module
// SQLite key-value store holding the document index cache and the API key

pub mod credentials;
pub mod index_cache;
pub mod sqlite;

pub use credentials::{CredentialStore, validate_api_key};
pub use index_cache::IndexStore;
pub use sqlite::Database;
