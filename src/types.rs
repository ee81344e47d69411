//! This module defines types used to configure the radio and
//! to describe its state.

use core::{
    fmt::{Display, Formatter, Result},
    write,
};

use bitfield_struct::bitfield;

/// Power Amplifier level. The units dBm (decibel-milliwatts or dB<sub>mW</sub>)
/// represents a logarithmic signal loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaLevel {
    /// -18 dBm
    Min,
    /// -12 dBm
    Low,
    /// -6 dBm
    High,
    /// 0 dBm
    Max,
}

#[cfg(feature = "defmt")]
#[cfg(target_os = "none")]
impl defmt::Format for PaLevel {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PaLevel::Min => defmt::write!(fmt, "-18 dBm"),
            PaLevel::Low => defmt::write!(fmt, "-12 dBm"),
            PaLevel::High => defmt::write!(fmt, "-6 dBm"),
            PaLevel::Max => defmt::write!(fmt, "0 dBm"),
        }
    }
}

impl PaLevel {
    pub(crate) const MASK: u8 = 6;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            PaLevel::Min => 0,
            PaLevel::Low => 2,
            PaLevel::High => 4,
            PaLevel::Max => 6,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0 => PaLevel::Min,
            2 => PaLevel::Low,
            4 => PaLevel::High,
            _ => PaLevel::Max,
        }
    }
}

impl Display for PaLevel {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            PaLevel::Min => write!(f, "-18 dBm"),
            PaLevel::Low => write!(f, "-12 dBm"),
            PaLevel::High => write!(f, "-6 dBm"),
            PaLevel::Max => write!(f, "0 dBm"),
        }
    }
}

/// How fast data moves through the air. Units are in bits per second (bps).
///
/// Both ends of a link must use the same data rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataRate {
    /// represents 1 Mbps
    Mbps1,
    /// represents 2 Mbps
    Mbps2,
    /// represents 250 Kbps
    Kbps250,
}

impl DataRate {
    pub(crate) const MASK: u8 = 0x28;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => 0x8,
            DataRate::Kbps250 => 0x20,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0x8 => DataRate::Mbps2,
            0x20 => DataRate::Kbps250,
            _ => DataRate::Mbps1,
        }
    }
}

#[cfg(feature = "defmt")]
#[cfg(target_os = "none")]
impl defmt::Format for DataRate {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DataRate::Mbps1 => defmt::write!(fmt, "1 Mbps"),
            DataRate::Mbps2 => defmt::write!(fmt, "2 Mbps"),
            DataRate::Kbps250 => defmt::write!(fmt, "250 Kbps"),
        }
    }
}

impl Display for DataRate {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DataRate::Mbps1 => write!(f, "1 Mbps"),
            DataRate::Mbps2 => write!(f, "2 Mbps"),
            DataRate::Kbps250 => write!(f, "250 Kbps"),
        }
    }
}

/// The length of every address used on the air (applies to all pipes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressWidth {
    /// 3 byte addresses
    Bytes3,
    /// 4 byte addresses
    Bytes4,
    /// 5 byte addresses
    Bytes5,
}

impl AddressWidth {
    /// The value written to the SETUP_AW register.
    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            AddressWidth::Bytes3 => 1,
            AddressWidth::Bytes4 => 2,
            AddressWidth::Bytes5 => 3,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & 3 {
            1 => AddressWidth::Bytes3,
            2 => AddressWidth::Bytes4,
            _ => AddressWidth::Bytes5,
        }
    }

    /// The number of bytes in an address of this width.
    pub const fn bytes(self) -> usize {
        match self {
            AddressWidth::Bytes3 => 3,
            AddressWidth::Bytes4 => 4,
            AddressWidth::Bytes5 => 5,
        }
    }
}

#[cfg(feature = "defmt")]
#[cfg(target_os = "none")]
impl defmt::Format for AddressWidth {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=usize} bytes", self.bytes())
    }
}

impl Display for AddressWidth {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} bytes", self.bytes())
    }
}

/// The last known role of a radio, as remembered by the device cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RadioMode {
    /// No role has been set since the radio was (re)initialized.
    #[default]
    Uninitialized,
    /// Primary transmitter (PRIM_RX cleared).
    Transmit,
    /// Primary receiver (PRIM_RX set).
    Receive,
}

#[cfg(feature = "defmt")]
impl defmt::Format for RadioMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            RadioMode::Uninitialized => defmt::write!(fmt, "Uninitialized"),
            RadioMode::Transmit => defmt::write!(fmt, "TX"),
            RadioMode::Receive => defmt::write!(fmt, "RX"),
        }
    }
}

impl Display for RadioMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            RadioMode::Uninitialized => write!(f, "Uninitialized"),
            RadioMode::Transmit => write!(f, "TX"),
            RadioMode::Receive => write!(f, "RX"),
        }
    }
}

/// A snapshot of the radio's STATUS register.
///
/// The radio shifts out this register as the first byte of every SPI transaction,
/// so a fresh snapshot is available after any bus access.
///
/// Use [`StatusFlags::default`] to instantiate all flags set to false.
/// Use [`StatusFlags::new`] to instantiate all IRQ flags set to true.
#[bitfield(u8, new = false, order = Msb)]
#[derive(PartialEq, Eq)]
pub struct StatusFlags {
    #[bits(1)]
    _padding: u8,

    /// A flag to describe if RX Data Ready to read.
    #[bits(1, access = RO)]
    pub rx_dr: bool,

    /// A flag to describe if TX Data Sent.
    #[bits(1, access = RO)]
    pub tx_ds: bool,

    /// A flag to describe if the maximum number of retransmits was reached
    /// without receiving an ACK.
    #[bits(1, access = RO)]
    pub max_rt: bool,

    /// The pipe number whose payload is first in the RX FIFO.
    ///
    /// A value of 7 means the RX FIFO is empty.
    #[bits(3, access = RO)]
    pub rx_pipe: u8,

    /// A flag to describe if the TX FIFO is full.
    #[bits(1, access = RO)]
    pub tx_full: bool,
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}, rx_pipe: {}, tx_full: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt(),
            self.rx_pipe(),
            self.tx_full(),
        )
    }
}

impl StatusFlags {
    /// A mask to isolate only the IRQ flags. Writing this to the STATUS register
    /// clears all latched events.
    pub(crate) const IRQ_MASK: u8 = 0x70;

    /// The value of [`StatusFlags::rx_pipe()`] when the RX FIFO is empty.
    pub const RX_PIPE_EMPTY: u8 = 7;

    /// A convenience constructor similar to [`StatusFlags::default`] except
    /// all IRQ flags are set to `true`.
    pub fn new() -> Self {
        Self::from_bits(Self::IRQ_MASK)
    }

    /// The pipe that received the payload at the top of the RX FIFO, if any.
    ///
    /// Values outside the range [0, 5] are reported as `None`.
    pub const fn rx_pipe_number(&self) -> Option<u8> {
        let pipe = self.rx_pipe();
        if pipe > 5 {
            None
        } else {
            Some(pipe)
        }
    }
}

impl Display for StatusFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}, rx_pipe: {}, tx_full: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt(),
            self.rx_pipe(),
            self.tx_full()
        )
    }
}
