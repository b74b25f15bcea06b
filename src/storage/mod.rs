// Storage module: SQLite persistence behind the series cache.

pub mod sqlite;

pub use sqlite::SqliteStorage;
