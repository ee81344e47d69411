//! This module defines the traits that a radio needs from its environment,
//! beyond the ones provided by [`embedded_hal`].
//!
//! ```
//! use nrf24_link::radio::prelude::*;
//! ```

/// A monotonic millisecond tick source.
///
/// Blocking delays come from [`DelayNs`](trait@embedded_hal::delay::DelayNs);
/// this trait only provides the current time so that polling loops can be
/// bounded by a timeout. The counter may wrap around; elapsed time is always
/// computed with wrapping arithmetic.
pub trait MillisClock {
    /// The current tick count in milliseconds.
    fn now_ms(&mut self) -> u32;
}

impl<T: MillisClock + ?Sized> MillisClock for &mut T {
    fn now_ms(&mut self) -> u32 {
        T::now_ms(self)
    }
}
