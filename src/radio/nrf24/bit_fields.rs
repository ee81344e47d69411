use bitfield_struct::bitfield;

use crate::{DataRate, PaLevel};

/// The CONFIG register.
#[bitfield(u8, order = Msb)]
pub(crate) struct Config {
    #[bits(1)]
    _padding: u8,

    pub mask_rx_dr: bool,

    pub mask_tx_ds: bool,

    pub mask_max_rt: bool,

    /// CRC is enabled out of reset.
    #[bits(1, default = true)]
    pub crc_enabled: bool,

    pub crc_2_bytes: bool,

    pub power: bool,

    pub is_rx: bool,
}

impl Config {
    pub fn as_rx(self) -> Self {
        self.with_is_rx(true)
    }

    pub fn as_tx(self) -> Self {
        self.with_is_rx(false)
    }
}

#[bitfield(u8, order = Msb)]
pub(crate) struct SetupRetry {
    /// The auto-retry feature's `delay` in steps of 250 microseconds (0 means 250 us).
    #[bits(4, default = 5)]
    pub ard: u8,

    /// The auto-retry feature's `count`.
    #[bits(4, default = 15)]
    pub arc: u8,
}

impl SetupRetry {
    /// The retransmit delay in microseconds.
    pub const fn delay_us(&self) -> u16 {
        (self.ard() as u16 + 1) * 250
    }
}

/// The RF_SETUP register.
#[bitfield(u8, order = Msb)]
pub(crate) struct RfSetup {
    #[bits(2)]
    _padding: u8,

    #[bits(3, access = None)]
    data_rate: u8,

    #[bits(2, access = None, default = 3)]
    pa_level: u8,

    #[bits(1)]
    _obsolete: u8,
}

impl RfSetup {
    pub const fn data_rate(&self) -> DataRate {
        DataRate::from_bits(self.into_bits())
    }

    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        let new_val = self.into_bits() & !DataRate::MASK;
        Self::from_bits(new_val | data_rate.into_bits())
    }

    pub const fn pa_level(&self) -> PaLevel {
        PaLevel::from_bits(self.into_bits())
    }

    pub fn with_pa_level(self, level: PaLevel) -> Self {
        let new_val = self.into_bits() & !PaLevel::MASK;
        Self::from_bits(new_val | level.into_bits())
    }
}

/// The OBSERVE_TX register.
#[bitfield(u8, order = Msb)]
pub(crate) struct ObserveTx {
    /// Lost packets. Stops counting at 15 and resets when RF_CH is written.
    #[bits(4, access = RO)]
    pub plos_cnt: u8,

    /// Retransmits of the last payload. Resets when a new payload is sent.
    #[bits(4, access = RO)]
    pub arc_cnt: u8,
}
