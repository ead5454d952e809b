mod base;
pub mod memory;
pub mod postgres;

pub use base::Destination;
pub use memory::MemoryDestination;
pub use postgres::PostgresDestination;
