use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, mnemonics, registers, timing, Nrf24Driver, Nrf24Error, Nrf24l01};
use crate::radio::{address_to_bytes, prelude::MillisClock, RadioConfig};

impl<const N: usize> Nrf24Driver<N> {
    /// Register the `device` with this driver and configure it with `config`.
    ///
    /// The radio is powered up at the end unless it is configured to power down
    /// between transactions. Either way, it is left in standby mode with its
    /// role undecided ([`RadioMode::Uninitialized`](crate::RadioMode)).
    ///
    /// Calling this again for the same device applies the new `config`.
    ///
    /// Returns [`Nrf24Error::InvalidChannel`] (leaving the device unregistered) if
    /// [`RadioConfig::channel()`] is greater than 127, or [`Nrf24Error::CacheFull`]
    /// if this driver already manages `N` other radios. Neither touches the bus.
    pub fn init<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        config: RadioConfig,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        if config.channel() > 127 {
            return Err(Nrf24Error::InvalidChannel(config.channel()));
        }
        self.cache.put(device.id(), config)?;

        // configuration bits written during the power on reset window may not stick
        device.delay_ms(timing::POWER_ON_RESET_MS);
        // the first transaction only primes the bus
        device.spi_read(0, commands::NOP)?;

        device.spi_write_byte(registers::EN_AA, config.auto_ack_pipes())?;
        device.spi_write_byte(registers::EN_RXADDR, config.enabled_pipes())?;
        device.spi_write_byte(registers::SETUP_AW, config.address_width().into_bits())?;
        device.spi_write_byte(registers::SETUP_RETR, config.auto_retries.into_bits())?;
        device.spi_write_byte(registers::RF_CH, config.channel())?;
        device.spi_write_byte(registers::RF_SETUP, config.rf_setup.into_bits())?;

        let width = config.address_width();
        let mut address = [0u8; 5];
        for pipe in config.rx_pipes() {
            let index = pipe.index();
            let bytes = address_to_bytes(pipe.address(), width, &mut address);
            match index {
                // pipes 2 - 5 share the upper bytes of pipe 1's address
                0 | 1 if index == 1 || pipe.enabled() => {
                    device.spi_write_buf(registers::RX_ADDR_P0 + index, bytes)?;
                }
                _ if pipe.enabled() => {
                    device.spi_write_byte(registers::RX_ADDR_P0 + index, bytes[bytes.len() - 1])?;
                }
                _ => {}
            }
            if pipe.enabled() {
                device.spi_write_byte(registers::RX_PW_P0 + index, pipe.payload_size())?;
            }
        }

        let bytes = address_to_bytes(config.tx_address(), width, &mut address);
        device.spi_write_buf(registers::TX_ADDR, bytes)?;

        if config.dynamic_payloads() {
            // the key byte must follow ACTIVATE within the same transaction
            device.spi_write_command(commands::ACTIVATE, &[commands::ACTIVATE_KEY])?;
            device.spi_write_byte(registers::FEATURE, mnemonics::EN_DPL)?;
            device.spi_write_byte(registers::DYNPD, config.dynamic_payload_pipes())?;
        }

        if !device.power_down_between_transactions() {
            device.power_up()?;
        }
        log::debug!(
            "{:?} initialized on channel {}",
            device.id(),
            config.channel()
        );
        Ok(())
    }
}
