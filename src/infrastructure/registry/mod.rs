mod memory;
mod postgres;

pub use memory::create_memory_registry;
pub use postgres::{create_postgres_registry, init_postgres_schema};
