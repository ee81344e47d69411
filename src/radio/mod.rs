//! A module to encapsulate all things related to radio operation.
pub mod prelude;

mod cache;
pub use cache::{CacheEntry, CacheError, DeviceCache, DeviceId};

mod config;
pub use config::{address_to_bytes, RadioConfig, RxPipe, PIPE_COUNT};

pub mod nrf24;
pub use nrf24::{Nrf24Driver, Nrf24Error, Nrf24l01, RadioDetails};
