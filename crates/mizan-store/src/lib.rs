pub mod cache;
pub mod memory;
pub mod postgres;

pub use cache::CachedRecordStore;
pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;
