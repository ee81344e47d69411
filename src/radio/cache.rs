//! Per-device state remembered between driver calls.
//!
//! Switching the radio between TX and RX costs a bus transaction plus a settle
//! delay. The fragmentation protocol issues one mode-dependent operation per
//! packet, so the last known mode of every radio is cached here to skip
//! redundant switches.

use heapless::LinearMap;

use super::RadioConfig;
use crate::RadioMode;

/// A stable identity for one physical radio.
///
/// Every [`Nrf24l01`](struct@crate::radio::Nrf24l01) managed by the same
/// [`Nrf24Driver`](struct@crate::radio::Nrf24Driver) must use a distinct id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u8);

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "DeviceId({=u8})", self.0)
    }
}

/// What the driver remembers about one radio.
#[derive(Clone, Copy, Debug)]
pub struct CacheEntry {
    /// The configuration given to the last successful initialization.
    pub config: RadioConfig,
    /// The last mode the radio was switched into.
    pub mode: RadioMode,
}

/// Failures of [`DeviceCache`] operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// A new device was registered while the cache was already at capacity.
    Full,
    /// The device was never registered with [`DeviceCache::put()`].
    Unknown(DeviceId),
}

/// A fixed-capacity map from [`DeviceId`] to [`CacheEntry`].
///
/// `N` must be at least the number of radios managed concurrently.
#[derive(Debug, Default)]
pub struct DeviceCache<const N: usize> {
    entries: LinearMap<DeviceId, CacheEntry, N>,
}

impl<const N: usize> DeviceCache<N> {
    pub const fn new() -> Self {
        Self {
            entries: LinearMap::new(),
        }
    }

    /// Look up the entry of a registered device.
    pub fn get(&self, id: DeviceId) -> Option<&CacheEntry> {
        self.entries.get(&id)
    }

    /// Like [`DeviceCache::get()`], but an unregistered device is an error.
    pub fn entry(&self, id: DeviceId) -> Result<&CacheEntry, CacheError> {
        self.get(id).ok_or(CacheError::Unknown(id))
    }

    /// Register a device with its `config`, or replace the config of a known device.
    ///
    /// Either way the cached mode is reset to [`RadioMode::Uninitialized`].
    pub fn put(&mut self, id: DeviceId, config: RadioConfig) -> Result<(), CacheError> {
        let entry = CacheEntry {
            config,
            mode: RadioMode::Uninitialized,
        };
        self.entries
            .insert(id, entry)
            .map(|_| ())
            .map_err(|_| CacheError::Full)
    }

    /// Returns the cached mode of a registered device.
    pub fn mode(&self, id: DeviceId) -> Result<RadioMode, CacheError> {
        self.entry(id).map(|entry| entry.mode)
    }

    /// Remember the `mode` a registered device was switched into.
    pub fn set_mode(&mut self, id: DeviceId, mode: RadioMode) -> Result<(), CacheError> {
        let entry = self.entries.get_mut(&id).ok_or(CacheError::Unknown(id))?;
        entry.mode = mode;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
