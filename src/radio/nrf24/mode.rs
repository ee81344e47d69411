use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{bit_fields::Config, registers, timing, Nrf24Driver, Nrf24Error, Nrf24l01};
use crate::{
    radio::{prelude::MillisClock, DeviceId, RadioConfig},
    RadioMode, StatusFlags,
};

impl<const N: usize> Nrf24Driver<N> {
    /// Make the radio a primary receiver.
    ///
    /// This is a no-op if the radio is already known to be in RX mode.
    /// Otherwise, the PRIM_RX bit is set and this blocks for 130 us (RX settling).
    pub fn enter_receive_mode<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        self.switch_mode(device, RadioMode::Receive)
    }

    /// Make the radio a primary transmitter.
    ///
    /// This is a no-op if the radio is already known to be in TX mode.
    /// Otherwise, the PRIM_RX bit is cleared and this blocks for 130 us (TX settling).
    pub fn enter_transmit_mode<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        self.switch_mode(device, RadioMode::Transmit)
    }

    fn switch_mode<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        mode: RadioMode,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        let id = device.id();
        if self.cache.mode(id)? == mode {
            return Ok(());
        }
        let config = Config::from_bits(device.read_register(registers::CONFIG)?);
        let config = if mode == RadioMode::Receive {
            config.as_rx()
        } else {
            config.as_tx()
        };
        device.spi_write_byte(registers::CONFIG, config.into_bits())?;
        self.cache.set_mode(id, mode)?;
        device.delay_us(timing::MODE_SETTLE_US);
        log::debug!("{:?} entered {:?} mode", id, mode);
        Ok(())
    }

    /// The last mode that the radio with the given `id` was switched into.
    ///
    /// Returns `None` if the radio was never initialized with this driver.
    pub fn mode(&self, id: DeviceId) -> Option<RadioMode> {
        self.cache.get(id).map(|entry| entry.mode)
    }

    /// The configuration that the radio with the given `id` was initialized with.
    pub fn config(&self, id: DeviceId) -> Option<&RadioConfig> {
        self.cache.get(id).map(|entry| &entry.config)
    }

    /// Read a fresh [`StatusFlags`] snapshot from the radio.
    pub fn status<SPI, DO, DELAY, CLOCK>(
        &self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
    ) -> Result<StatusFlags, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        device.update_status()
    }
}
