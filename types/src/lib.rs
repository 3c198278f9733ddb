pub mod address;
pub mod constants;
pub mod event;
pub mod snapshot;

pub use address::{Address, AddressError};
pub use event::{DomainEvent, DomainEventKind, RawEvent, RawEventRecord};
pub use snapshot::{IntegrityError, Phase, PlayerRecord, RoundConfig, RoundSnapshot};
