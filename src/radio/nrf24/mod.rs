use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};
pub(crate) mod bit_fields;
mod constants;
mod details;
mod init;
mod message;
mod mode;
mod packet;
mod power;
mod status;
pub use constants::{commands, mnemonics, registers, timing};
pub use details::RadioDetails;

use super::{
    cache::{CacheError, DeviceCache, DeviceId},
    prelude::MillisClock,
};
use crate::{fragment::FragmentError, StatusFlags};

/// A collection of error types to describe hardware malfunctions and
/// rejected requests.
///
/// Timeouts and transmissions that exhausted their retransmits are not errors;
/// the affected operations report them by returning `Ok(false)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Nrf24Error<SPI, DO> {
    /// Represents a SPI transaction error.
    Spi(SPI),
    /// Represents a DigitalOutput error.
    Gpo(DO),
    /// The configured RF channel is outside the range [0, 127].
    InvalidChannel(u8),
    /// A single packet cannot carry more than 32 bytes.
    PayloadTooLarge(usize),
    /// A fragment size outside the range [3, 32] was requested.
    InvalidPacketSize(u8),
    /// The pipe number is outside the range [0, 5].
    InvalidPipe(u8),
    /// The message needs more than 255 packets, which the fragment header cannot describe.
    MessageTooLarge(usize),
    /// The caller's buffer cannot hold the announced message.
    BufferTooSmall { required: usize, actual: usize },
    /// The radio was not registered by [`Nrf24Driver::init()`].
    NotInitialized(DeviceId),
    /// The device cache has no room for another radio.
    CacheFull,
}

impl<SPI, DO> From<CacheError> for Nrf24Error<SPI, DO> {
    fn from(value: CacheError) -> Self {
        match value {
            CacheError::Full => Nrf24Error::CacheFull,
            CacheError::Unknown(id) => Nrf24Error::NotInitialized(id),
        }
    }
}

impl<SPI, DO> From<FragmentError> for Nrf24Error<SPI, DO> {
    fn from(value: FragmentError) -> Self {
        match value {
            FragmentError::InvalidPacketSize(size) => Nrf24Error::InvalidPacketSize(size),
            FragmentError::MessageTooLarge(size) => Nrf24Error::MessageTooLarge(size),
        }
    }
}

#[cfg(feature = "defmt")]
impl<SPI, DO> defmt::Format for Nrf24Error<SPI, DO> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Nrf24Error::Spi(_) => defmt::write!(fmt, "SPI transaction failed"),
            Nrf24Error::Gpo(_) => defmt::write!(fmt, "CE pin failed"),
            Nrf24Error::InvalidChannel(ch) => defmt::write!(fmt, "invalid channel {=u8}", ch),
            Nrf24Error::PayloadTooLarge(len) => {
                defmt::write!(fmt, "payload of {=usize} bytes exceeds 32", len)
            }
            Nrf24Error::InvalidPacketSize(size) => {
                defmt::write!(fmt, "invalid packet size {=u8}", size)
            }
            Nrf24Error::InvalidPipe(pipe) => defmt::write!(fmt, "invalid pipe {=u8}", pipe),
            Nrf24Error::MessageTooLarge(len) => {
                defmt::write!(fmt, "message of {=usize} bytes needs too many packets", len)
            }
            Nrf24Error::BufferTooSmall { required, actual } => defmt::write!(
                fmt,
                "buffer of {=usize} bytes cannot hold {=usize} bytes",
                actual,
                required
            ),
            Nrf24Error::NotInitialized(id) => defmt::write!(fmt, "{} is not initialized", id),
            Nrf24Error::CacheFull => defmt::write!(fmt, "device cache is full"),
        }
    }
}

/// One physical nRF24L01 transceiver.
///
/// This owns the bus access to the radio (the SPI device and CE pin) and the
/// timing facilities used while waiting on it. The radio's role and
/// configuration are tracked by the [`Nrf24Driver`] it is used with.
pub struct Nrf24l01<SPI, DO, DELAY, CLOCK> {
    id: DeviceId,
    /// The CE pin for the radio.
    ///
    /// This is only exposed for advanced manipulation of the active TX/RX modes.
    pub ce_pin: DO,
    _spi: SPI,
    _delay_impl: DELAY,
    _clock: CLOCK,
    _buf: [u8; 33],
    _status: StatusFlags,
    enable_statistics: bool,
    packets_lost: u64,
    packets_retransmitted: u64,
    power_down_between_transactions: bool,
}

impl<SPI, DO, DELAY, CLOCK> Nrf24l01<SPI, DO, DELAY, CLOCK> {
    /// Instantiate a [`Nrf24l01`] object for use on the specified
    /// `spi` bus with the given `ce_pin`.
    ///
    /// The radio's CSN pin (aka Chip Select pin) shall be defined
    /// when instantiating the [`SpiDevice`](trait@embedded_hal::spi::SpiDevice)
    /// object (passed to the `spi` parameter).
    ///
    /// Statistics and the power saving mode are disabled by default.
    pub fn new(
        id: DeviceId,
        ce_pin: DO,
        spi: SPI,
        delay_impl: DELAY,
        clock: CLOCK,
    ) -> Nrf24l01<SPI, DO, DELAY, CLOCK> {
        Nrf24l01 {
            id,
            ce_pin,
            _spi: spi,
            _delay_impl: delay_impl,
            _clock: clock,
            _buf: [0u8; 33],
            _status: StatusFlags::from_bits(0),
            enable_statistics: false,
            packets_lost: 0,
            packets_retransmitted: 0,
            power_down_between_transactions: false,
        }
    }

    /// Collect the lost and retransmitted packet counts after every transmission.
    pub fn with_statistics(self, enable: bool) -> Self {
        Self {
            enable_statistics: enable,
            ..self
        }
    }

    /// Power the radio down between transactions.
    ///
    /// This significantly reduces power usage (about 2x less when transmitting, 4x less
    /// when receiving) at the cost of a 4.5 ms power up delay per transaction.
    /// This only sets the initial state; use
    /// [`Nrf24l01::use_power_down_mode()`] to change it after initialization.
    pub fn with_power_down_between_transactions(self, enable: bool) -> Self {
        Self {
            power_down_between_transactions: enable,
            ..self
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn statistics_enabled(&self) -> bool {
        self.enable_statistics
    }

    pub fn power_down_between_transactions(&self) -> bool {
        self.power_down_between_transactions
    }

    /// The number of packets lost since initialization or the last
    /// [`Nrf24l01::reset_statistics()`].
    ///
    /// Only counted while statistics are enabled.
    pub fn packets_lost(&self) -> u64 {
        self.packets_lost
    }

    /// The number of retransmitted packets since initialization or the last
    /// [`Nrf24l01::reset_statistics()`].
    ///
    /// Only counted while statistics are enabled.
    pub fn packets_retransmitted(&self) -> u64 {
        self.packets_retransmitted
    }

    pub fn reset_statistics(&mut self) {
        self.packets_lost = 0;
        self.packets_retransmitted = 0;
    }

    /// The [`StatusFlags`] cached from the latest SPI transaction.
    pub fn status(&self) -> StatusFlags {
        self._status
    }

    /// Release the bus, pin and timing objects.
    pub fn release(self) -> (SPI, DO, DELAY, CLOCK) {
        (self._spi, self.ce_pin, self._delay_impl, self._clock)
    }
}

impl<SPI, DO, DELAY, CLOCK> Nrf24l01<SPI, DO, DELAY, CLOCK>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    CLOCK: MillisClock,
{
    fn spi_transfer(&mut self, len: u8) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self._spi
            .transfer_in_place(&mut self._buf[..len as usize])
            .map_err(Nrf24Error::Spi)?;
        self._status = StatusFlags::from_bits(self._buf[0]);
        Ok(())
    }

    /// Clocks out `command` followed by `len` dummy bytes.
    ///
    /// This is also used to write SPI commands that consist of 1 byte:
    /// ```ignore
    /// self.spi_read(0, commands::NOP)?;
    /// // STATUS register is now stored in self._status
    /// ```
    fn spi_read(&mut self, len: u8, command: u8) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self._buf[0] = command;
        self._buf[1..(len as usize + 1)].fill(commands::NOP);
        self.spi_transfer(len + 1)
    }

    fn spi_write_byte(
        &mut self,
        register: u8,
        byte: u8,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self._buf[0] = register | commands::W_REGISTER;
        self._buf[1] = byte;
        self.spi_transfer(2)
    }

    fn spi_write_buf(
        &mut self,
        register: u8,
        buf: &[u8],
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.spi_write_command(register | commands::W_REGISTER, buf)
    }

    /// Writes a `command` followed by `buf` (at most 32 bytes).
    fn spi_write_command(
        &mut self,
        command: u8,
        buf: &[u8],
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        let buf_len = buf.len().min(32);
        self._buf[0] = command;
        self._buf[1..(buf_len + 1)].copy_from_slice(&buf[..buf_len]);
        self.spi_transfer(buf_len as u8 + 1)
    }

    /// Reads a single byte register.
    fn read_register(&mut self, register: u8) -> Result<u8, Nrf24Error<SPI::Error, DO::Error>> {
        self.spi_read(1, register)?;
        Ok(self._buf[1])
    }

    fn ce_high(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.ce_pin.set_high().map_err(Nrf24Error::Gpo)
    }

    fn ce_low(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.ce_pin.set_low().map_err(Nrf24Error::Gpo)
    }

    fn delay_us(&mut self, us: u32) {
        self._delay_impl.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self._delay_impl.delay_ms(ms);
    }

    fn now_ms(&mut self) -> u32 {
        self._clock.now_ms()
    }

    /// Milliseconds passed since `start` (as returned by the clock), tolerant of
    /// the clock wrapping around.
    fn elapsed_ms(&mut self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

/// The component that drives one or more [`Nrf24l01`] radios.
///
/// It owns the device cache that remembers each radio's configuration
/// and last mode. `N` is the maximum number of radios that can be
/// initialized with this driver.
///
/// ```ignore
/// let mut driver = Nrf24Driver::<1>::new();
/// let mut radio = Nrf24l01::new(DeviceId(0), ce_pin, spi, delay, clock);
/// driver.init(&mut radio, config)?;
/// driver.transmit(&mut radio, b"a message longer than one packet", 32)?;
/// ```
#[derive(Debug, Default)]
pub struct Nrf24Driver<const N: usize> {
    cache: DeviceCache<N>,
}

impl<const N: usize> Nrf24Driver<N> {
    pub const fn new() -> Self {
        Self {
            cache: DeviceCache::new(),
        }
    }

    /// Read-only access to the device cache.
    pub fn cache(&self) -> &DeviceCache<N> {
        &self.cache
    }
}
