pub mod mailboxes;
pub mod pool;
pub mod records;
pub mod schema;

// Re-export the pool type so callers can do `use crate::adapters::sqlite::DbPool`
// instead of `use crate::adapters::sqlite::pool::DbPool`
pub use pool::DbPool;
