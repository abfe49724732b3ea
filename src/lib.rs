//! Maps contract ABIs onto relational schemas and accumulates decoded
//! events and method call results against them.

pub mod config;
pub mod ethereum;
pub mod statediff;

pub use ethereum::{ContractSchema, Event, Field, Log, Method, StorageType, WireType};
pub use statediff::{FetchError, Payload, StateDiffFetcher};
