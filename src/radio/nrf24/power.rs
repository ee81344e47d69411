use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{bit_fields::Config, registers, timing, Nrf24Error, Nrf24l01};
use crate::radio::prelude::MillisClock;

impl<SPI, DO, DELAY, CLOCK> Nrf24l01<SPI, DO, DELAY, CLOCK>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    CLOCK: MillisClock,
{
    /// Set the PWR_UP bit and block until the radio is in standby mode.
    ///
    /// The radio needs up to 4.5 ms (Tpd2stby with an external crystal) before
    /// it can enter TX or RX mode.
    pub fn power_up(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        let config = Config::from_bits(self.read_register(registers::CONFIG)?).with_power(true);
        self.spi_write_byte(registers::CONFIG, config.into_bits())?;
        self.delay_us(timing::POWER_UP_US);
        log::debug!("{:?} powered up", self.id);
        Ok(())
    }

    /// Clear the PWR_UP bit.
    ///
    /// In power down mode the radio consumes approximately 900 nA.
    /// Register values are kept, so no settle time is needed afterward.
    pub fn power_down(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        let config = Config::from_bits(self.read_register(registers::CONFIG)?).with_power(false);
        self.spi_write_byte(registers::CONFIG, config.into_bits())?;
        log::debug!("{:?} powered down", self.id);
        Ok(())
    }

    /// Is the radio powered up? This reads the CONFIG register.
    pub fn is_powered(&mut self) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>> {
        Ok(Config::from_bits(self.read_register(registers::CONFIG)?).power())
    }

    /// Enable or disable powering down between transactions.
    ///
    /// The radio is left in the state implied by `enable` before returning:
    /// enabling powers it down immediately and disabling powers it up immediately.
    /// Calls that do not change the setting have no effect on the radio.
    pub fn use_power_down_mode(
        &mut self,
        enable: bool,
    ) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        if enable && !self.power_down_between_transactions {
            self.power_down()?;
        } else if !enable && self.power_down_between_transactions {
            self.power_up()?;
        }
        self.power_down_between_transactions = enable;
        Ok(())
    }
}
