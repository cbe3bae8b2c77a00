//! Storage layer: contract records and negotiation sessions behind narrow
//! async interfaces, with in-memory implementations for tests and local use.

mod contract;
mod error;
mod session;

pub use contract::{ContractStore, MemoryContractStore};
pub use error::StoreError;
pub use session::{MemorySessionStore, SessionStore};
