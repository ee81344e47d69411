use crate::radio::nrf24::bit_fields::{RfSetup, SetupRetry};
use crate::{AddressWidth, DataRate, PaLevel};

/// The number of RX pipes on the nRF24L01.
pub const PIPE_COUNT: usize = 6;

/// Configuration of a single RX pipe.
///
/// Pipes 0 and 1 use a full address (as wide as the configured [`AddressWidth`]).
/// Pipes 2 - 5 only store the least significant byte of their address. The remaining
/// bytes are borrowed from the address of pipe 1, so an address given to these pipes
/// is truncated to its low byte.
///
/// ```
/// use nrf24_link::radio::RxPipe;
/// let pipe = RxPipe::new(5)
///     .with_enabled(true)
///     .with_auto_ack(true)
///     .with_address(0x11)
///     .with_dynamic_payload(true);
/// assert_eq!(pipe.index(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxPipe {
    index: u8,
    enabled: bool,
    auto_ack: bool,
    address: u64,
    payload_size: u8,
    dynamic_payload: bool,
}

impl RxPipe {
    /// A closed pipe with the given `index` (expected in range [0, 5]).
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            enabled: false,
            auto_ack: false,
            address: 0,
            payload_size: 0,
            dynamic_payload: false,
        }
    }

    pub const fn index(&self) -> u8 {
        self.index
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Open or close this pipe for receiving.
    pub const fn with_enabled(self, enable: bool) -> Self {
        Self {
            enabled: enable,
            ..self
        }
    }

    pub const fn auto_ack(&self) -> bool {
        self.auto_ack
    }

    /// Enable the hardware's automatic acknowledgement on this pipe.
    ///
    /// Only pipe 0 can receive the ACK packets when the radio is transmitting.
    pub const fn with_auto_ack(self, enable: bool) -> Self {
        Self {
            auto_ack: enable,
            ..self
        }
    }

    pub const fn address(&self) -> u64 {
        self.address
    }

    pub const fn with_address(self, address: u64) -> Self {
        Self { address, ..self }
    }

    pub const fn payload_size(&self) -> u8 {
        self.payload_size
    }

    /// The fixed payload size for this pipe (clamped to 32).
    ///
    /// This is ignored when [`RxPipe::with_dynamic_payload()`] is enabled.
    /// Should be equal to the packet size used by the sender.
    pub fn with_payload_size(self, size: u8) -> Self {
        Self {
            payload_size: size.min(32),
            ..self
        }
    }

    pub const fn dynamic_payload(&self) -> bool {
        self.dynamic_payload
    }

    /// Read each payload's length from the radio instead of using a fixed size.
    ///
    /// Requires [`RadioConfig::with_dynamic_payloads()`] to be enabled.
    pub const fn with_dynamic_payload(self, enable: bool) -> Self {
        Self {
            dynamic_payload: enable,
            ..self
        }
    }
}

/// An object to configure the radio.
///
/// This struct follows a builder pattern. Since all fields are private, users should
/// start with the [`RadioConfig::default`] constructor, then mutate the object accordingly.
///
/// A transmitter that receives ACK packets on pipe 0:
/// ```
/// use nrf24_link::{AddressWidth, DataRate, PaLevel, radio::{RadioConfig, RxPipe}};
///
/// let config = RadioConfig::default()
///     .with_address_width(AddressWidth::Bytes3)
///     .with_auto_retries(1000, 15)
///     .with_channel(1)
///     .with_pa_level(PaLevel::High)
///     .with_data_rate(DataRate::Kbps250)
///     .with_rx_pipe(
///         RxPipe::new(0)
///             .with_enabled(true)
///             .with_auto_ack(true)
///             .with_address(0x112233)
///             .with_dynamic_payload(true),
///     )
///     .with_tx_address(0x112233)
///     .with_dynamic_payloads(true);
/// assert_eq!(config.channel(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RadioConfig {
    address_width: AddressWidth,
    pub(crate) auto_retries: SetupRetry,
    pub(crate) rf_setup: RfSetup,
    channel: u8,
    rx_pipes: [RxPipe; PIPE_COUNT],
    tx_address: u64,
    dynamic_payloads: bool,
}

impl Default for RadioConfig {
    /// Instantiate a [`RadioConfig`] object with library defaults.
    ///
    /// | feature | default value |
    /// |--------:|:--------------|
    /// | [`RadioConfig::address_width()`] | [`AddressWidth::Bytes5`] |
    /// | [`RadioConfig::auto_retry_delay()`] | `1500` microseconds |
    /// | [`RadioConfig::auto_retry_count()`] | `15` |
    /// | [`RadioConfig::channel()`] | `76` |
    /// | [`RadioConfig::pa_level()`] | [`PaLevel::Max`] |
    /// | [`RadioConfig::data_rate()`] | [`DataRate::Mbps1`] |
    /// | [`RadioConfig::rx_pipes()`] | all closed, address `0` |
    /// | [`RadioConfig::tx_address()`] | `0` |
    /// | [`RadioConfig::dynamic_payloads()`] | `false` |
    fn default() -> Self {
        Self {
            address_width: AddressWidth::Bytes5,
            /*
               - 5 * 250 + 250 = 1500 us delay between attempts
               - 15 max attempts
            */
            auto_retries: SetupRetry::default(),
            /*
                - 1 Mbps data rate
                - Max PA level
            */
            rf_setup: RfSetup::default(),
            channel: 76,
            rx_pipes: [
                RxPipe::new(0),
                RxPipe::new(1),
                RxPipe::new(2),
                RxPipe::new(3),
                RxPipe::new(4),
                RxPipe::new(5),
            ],
            tx_address: 0,
            dynamic_payloads: false,
        }
    }
}

impl RadioConfig {
    /// Returns the value set by [`RadioConfig::with_address_width()`].
    pub const fn address_width(&self) -> AddressWidth {
        self.address_width
    }

    /// The address width (applies to all pipes and the TX address).
    pub fn with_address_width(self, width: AddressWidth) -> Self {
        Self {
            address_width: width,
            ..self
        }
    }

    /// The auto-retry feature's `delay` in microseconds.
    pub const fn auto_retry_delay(&self) -> u16 {
        self.auto_retries.delay_us()
    }

    /// The auto-retry feature's `count`.
    pub const fn auto_retry_count(&self) -> u8 {
        self.auto_retries.arc()
    }

    /// Set the auto-retry feature's `delay` (in microseconds) and `count` parameters.
    ///
    /// The `delay` is clamped to range [250, 4000] and rounded down to a multiple
    /// of 250. The `count` is clamped to range [0, 15] where 0 disables retransmits.
    pub fn with_auto_retries(self, delay: u16, count: u8) -> Self {
        let ard = (delay.clamp(250, 4000) / 250 - 1) as u8;
        let new_config = self.auto_retries.with_ard(ard).with_arc(count.min(15));
        Self {
            auto_retries: new_config,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_channel()`].
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// Set the channel (over the air frequency).
    ///
    /// The radio supports channels in range [0, 127]. The value is not clamped here;
    /// [`Nrf24Driver::init()`](fn@crate::radio::Nrf24Driver::init) rejects
    /// out-of-range channels. The radio's frequency is
    /// ```text
    /// frequency (in MHz) = channel + 2400
    /// ```
    pub fn with_channel(self, value: u8) -> Self {
        Self {
            channel: value,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_pa_level()`].
    pub const fn pa_level(&self) -> PaLevel {
        self.rf_setup.pa_level()
    }

    /// The Power Amplitude (PA) level.
    pub fn with_pa_level(self, level: PaLevel) -> Self {
        let new_config = self.rf_setup.with_pa_level(level);
        Self {
            rf_setup: new_config,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_data_rate()`].
    pub const fn data_rate(&self) -> DataRate {
        self.rf_setup.data_rate()
    }

    /// The Data Rate (over the air).
    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        let new_config = self.rf_setup.with_data_rate(data_rate);
        Self {
            rf_setup: new_config,
            ..self
        }
    }

    /// The configuration of all 6 pipes, indexed by pipe number.
    pub const fn rx_pipes(&self) -> &[RxPipe; PIPE_COUNT] {
        &self.rx_pipes
    }

    /// The configuration of a single pipe, if `pipe` is in range [0, 5].
    pub fn rx_pipe(&self, pipe: u8) -> Option<&RxPipe> {
        self.rx_pipes.get(pipe as usize)
    }

    /// Replace the configuration of the pipe at [`RxPipe::index()`].
    ///
    /// Pipes with an index greater than 5 are ignored.
    pub fn with_rx_pipe(self, pipe: RxPipe) -> Self {
        let mut rx_pipes = self.rx_pipes;
        if let Some(slot) = rx_pipes.get_mut(pipe.index() as usize) {
            *slot = pipe;
        }
        Self { rx_pipes, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_tx_address()`].
    pub const fn tx_address(&self) -> u64 {
        self.tx_address
    }

    /// The address of the receiver that payloads are sent to.
    ///
    /// To receive ACK packets, pipe 0 should be opened with the same address.
    pub fn with_tx_address(self, address: u64) -> Self {
        Self {
            tx_address: address,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_dynamic_payloads()`].
    pub const fn dynamic_payloads(&self) -> bool {
        self.dynamic_payloads
    }

    /// Unlock the radio's dynamic payload length feature.
    ///
    /// Each pipe still has to opt in using [`RxPipe::with_dynamic_payload()`].
    pub fn with_dynamic_payloads(self, enable: bool) -> Self {
        Self {
            dynamic_payloads: enable,
            ..self
        }
    }

    /// Builds a pipe bitmap from the pipes that are open and match the `predicate`.
    fn pipe_bitmap(&self, predicate: impl Fn(&RxPipe) -> bool) -> u8 {
        self.rx_pipes
            .iter()
            .filter(|pipe| pipe.enabled() && predicate(*pipe))
            .fold(0, |bits, pipe| bits | (1 << pipe.index()))
    }

    /// Value for the EN_AA register.
    pub(crate) fn auto_ack_pipes(&self) -> u8 {
        self.pipe_bitmap(RxPipe::auto_ack)
    }

    /// Value for the EN_RXADDR register.
    pub(crate) fn enabled_pipes(&self) -> u8 {
        self.pipe_bitmap(|_| true)
    }

    /// Value for the DYNPD register.
    pub(crate) fn dynamic_payload_pipes(&self) -> u8 {
        self.pipe_bitmap(RxPipe::dynamic_payload)
    }
}

/// Convert an `address` into the big-endian byte sequence that is written to
/// an address register. Only the `width` least significant bytes are used.
///
/// ```
/// use nrf24_link::{AddressWidth, radio::address_to_bytes};
/// let mut buf = [0u8; 5];
/// assert_eq!(address_to_bytes(0x112233, AddressWidth::Bytes3, &mut buf), &[0x11, 0x22, 0x33]);
/// ```
pub fn address_to_bytes(address: u64, width: AddressWidth, buf: &mut [u8; 5]) -> &[u8] {
    let len = width.bytes();
    for (i, byte) in buf[..len].iter_mut().enumerate() {
        *byte = (address >> ((len - i - 1) * 8)) as u8;
    }
    &buf[..len]
}
