//! Reference adapter implementations.
//!
//! In-memory stand-ins for the database and lake contracts, used by the
//! flush-pipeline tests and embedded deployments. Real drivers (Postgres,
//! warehouses, object stores) live outside the sync plane and implement
//! the same traits.

mod memory_db;
mod memory_lake;

pub use memory_db::MemoryDatabaseAdapter;
pub use memory_lake::MemoryLakeAdapter;
