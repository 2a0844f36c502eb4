//! 持久化实现

mod memory;
mod migrations;
mod postgres;
mod rows;

pub use memory::InMemoryUnitOfWorkFactory;
pub use migrations::{migrations, run_migrations};
pub use postgres::{PostgresUnitOfWork, PostgresUnitOfWorkFactory, SharedTx, TxProductRepository};
