//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod google;
pub mod memory;
pub mod postgres;

pub use google::GoogleProvider;
pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
