pub mod memory;
pub mod postgres;
mod store;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PostgresStore};
pub use store::PreferenceStore;
