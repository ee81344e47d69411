use core::fmt::{Display, Formatter, Result as FmtResult};

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{
    bit_fields::{Config, ObserveTx, RfSetup, SetupRetry},
    registers, Nrf24Driver, Nrf24Error, Nrf24l01,
};
use crate::{
    radio::prelude::MillisClock, AddressWidth, DataRate, PaLevel, RadioMode, StatusFlags,
};

/// A snapshot of the radio's configuration registers and the driver's
/// bookkeeping about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioDetails {
    pub channel: u8,
    pub data_rate: DataRate,
    pub pa_level: PaLevel,
    pub address_width: AddressWidth,
    pub auto_retry_delay: u16,
    pub auto_retry_count: u8,
    /// Bitmap of pipes with auto-ack enabled (EN_AA).
    pub auto_ack_pipes: u8,
    /// Bitmap of open pipes (EN_RXADDR).
    pub enabled_pipes: u8,
    /// Bitmap of pipes with dynamic payloads enabled (DYNPD).
    pub dynamic_payload_pipes: u8,
    pub crc_enabled: bool,
    pub irq_masks: [bool; 3],
    pub powered: bool,
    pub is_rx: bool,
    /// Packets lost on the current channel, as counted by the radio.
    pub lost_on_channel: u8,
    /// Retransmits of the last payload, as counted by the radio.
    pub last_retransmits: u8,
    pub status: StatusFlags,
    /// The mode remembered by the driver.
    pub mode: RadioMode,
    pub packets_lost: u64,
    pub packets_retransmitted: u64,
}

impl Display for RadioDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(
            f,
            "Channel___________________{} ~ {} MHz",
            self.channel,
            self.channel as u16 + 2400u16
        )?;
        writeln!(f, "RF Data Rate______________{}", self.data_rate)?;
        writeln!(f, "RF Power Amplifier________{}", self.pa_level)?;
        writeln!(f, "Address length____________{}", self.address_width)?;
        writeln!(
            f,
            "Auto retry delay__________{} microseconds",
            self.auto_retry_delay
        )?;
        writeln!(
            f,
            "Auto retry attempts_______{} maximum",
            self.auto_retry_count
        )?;
        writeln!(f, "CRC enabled_______________{}", self.crc_enabled)?;
        writeln!(f, "IRQ on Data Ready masked__{}", self.irq_masks[0])?;
        writeln!(f, "IRQ on Data Sent masked___{}", self.irq_masks[1])?;
        writeln!(f, "IRQ on Data Fail masked___{}", self.irq_masks[2])?;
        writeln!(
            f,
            "Packets lost\n    on current channel____{}",
            self.lost_on_channel
        )?;
        writeln!(
            f,
            "Retry attempts made\n    for last transmission_{}",
            self.last_retransmits
        )?;
        writeln!(f, "Open pipes________________{:#08b}", self.enabled_pipes)?;
        writeln!(f, "Auto Acknowledgment_______{:#08b}", self.auto_ack_pipes)?;
        writeln!(
            f,
            "Dynamic Payloads__________{:#08b}",
            self.dynamic_payload_pipes
        )?;
        writeln!(
            f,
            "Primary Mode______________{}X",
            if self.is_rx { "R" } else { "T" }
        )?;
        writeln!(f, "Powered Up________________{}", self.powered)?;
        writeln!(f, "Cached Mode_______________{}", self.mode)?;
        writeln!(f, "Total packets lost________{}", self.packets_lost)?;
        writeln!(
            f,
            "Total retransmits_________{}",
            self.packets_retransmitted
        )?;
        write!(f, "{}", self.status)
    }
}

#[cfg(feature = "defmt")]
#[cfg(target_os = "none")]
impl defmt::Format for RadioDetails {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Channel___________________{=u8}\nRF Data Rate______________{}\nRF Power Amplifier________{}\n",
            self.channel,
            self.data_rate,
            self.pa_level,
        );
        defmt::write!(
            fmt,
            "Address length____________{}\nAuto retry delay__________{=u16} microseconds\nAuto retry attempts_______{=u8} maximum\n",
            self.address_width,
            self.auto_retry_delay,
            self.auto_retry_count,
        );
        defmt::write!(
            fmt,
            "Open pipes________________0b{=0..8}\nAuto Acknowledgment_______0b{=0..8}\nDynamic Payloads__________0b{=0..8}\n",
            self.enabled_pipes,
            self.auto_ack_pipes,
            self.dynamic_payload_pipes,
        );
        defmt::write!(
            fmt,
            "Powered Up________________{=bool}\nPrimary RX________________{=bool}\nCached Mode_______________{}\n",
            self.powered,
            self.is_rx,
            self.mode,
        );
        defmt::write!(
            fmt,
            "Total packets lost________{=u64}\nTotal retransmits_________{=u64}\n{}",
            self.packets_lost,
            self.packets_retransmitted,
            self.status,
        )
    }
}

impl<const N: usize> Nrf24Driver<N> {
    /// Read the radio's configuration registers into a [`RadioDetails`] snapshot.
    ///
    /// This also works for radios that were never initialized with this driver;
    /// their [`RadioDetails::mode`] is reported as [`RadioMode::Uninitialized`].
    pub fn details<SPI, DO, DELAY, CLOCK>(
        &self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
    ) -> Result<RadioDetails, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        let config = Config::from_bits(device.read_register(registers::CONFIG)?);
        let auto_ack_pipes = device.read_register(registers::EN_AA)?;
        let enabled_pipes = device.read_register(registers::EN_RXADDR)?;
        let address_width = AddressWidth::from_bits(device.read_register(registers::SETUP_AW)?);
        let retries = SetupRetry::from_bits(device.read_register(registers::SETUP_RETR)?);
        let channel = device.read_register(registers::RF_CH)?;
        let rf_setup = RfSetup::from_bits(device.read_register(registers::RF_SETUP)?);
        let observed = ObserveTx::from_bits(device.read_register(registers::OBSERVE_TX)?);
        let dynamic_payload_pipes = device.read_register(registers::DYNPD)?;
        Ok(RadioDetails {
            channel,
            data_rate: rf_setup.data_rate(),
            pa_level: rf_setup.pa_level(),
            address_width,
            auto_retry_delay: retries.delay_us(),
            auto_retry_count: retries.arc(),
            auto_ack_pipes,
            enabled_pipes,
            dynamic_payload_pipes,
            crc_enabled: config.crc_enabled(),
            irq_masks: [config.mask_rx_dr(), config.mask_tx_ds(), config.mask_max_rt()],
            powered: config.power(),
            is_rx: config.is_rx(),
            lost_on_channel: observed.plos_cnt(),
            last_retransmits: observed.arc_cnt(),
            status: device.status(),
            mode: self.mode(device.id()).unwrap_or_default(),
            packets_lost: device.packets_lost(),
            packets_retransmitted: device.packets_retransmitted(),
        })
    }

    /// Print the [`RadioDetails`] of the `device`.
    ///
    /// The output goes through `defmt` or `std` if either feature is enabled.
    /// Otherwise this does nothing (not even bus traffic).
    #[cfg(any(feature = "defmt", feature = "std"))]
    pub fn print_details<SPI, DO, DELAY, CLOCK>(
        &self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        let details = self.details(device)?;
        #[cfg(all(feature = "defmt", target_os = "none"))]
        defmt::println!("{}", details);
        #[cfg(all(feature = "std", not(target_os = "none")))]
        std::println!("{details}");
        Ok(())
    }

    #[cfg(not(any(feature = "defmt", feature = "std")))]
    pub fn print_details<SPI, DO, DELAY, CLOCK>(
        &self,
        _device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        Ok(())
    }
}
