pub mod abi;
pub mod schema;
pub mod types;
pub mod wire;

pub use schema::ContractSchema;
pub use types::{value_to_string, CallResult, Event, Field, Log, Method};
pub use wire::{StorageType, WireKind, WireType};
