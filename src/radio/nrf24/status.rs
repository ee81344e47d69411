use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{commands, registers, Nrf24Error, Nrf24l01};
use crate::{radio::prelude::MillisClock, StatusFlags};

impl<SPI, DO, DELAY, CLOCK> Nrf24l01<SPI, DO, DELAY, CLOCK>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    CLOCK: MillisClock,
{
    /// Read a fresh [`StatusFlags`] snapshot from the radio.
    pub fn update_status(&mut self) -> Result<StatusFlags, Nrf24Error<SPI::Error, DO::Error>> {
        self.spi_read(0, commands::NOP)?;
        Ok(self._status)
    }

    /// Clear all latched events (RX_DR, TX_DS and MAX_RT).
    pub fn clear_status_flags(&mut self) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        self.spi_write_byte(registers::STATUS, StatusFlags::IRQ_MASK)
    }
}

/////////////////////////////////////////////////////////////////////////////////
/// unit tests
#[cfg(test)]
mod test {
    extern crate std;
    use super::{commands, registers};
    use crate::{spi_test_expects, test::mk_radio};
    use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;
    use std::vec;

    #[test]
    pub fn update_status() {
        let spi_expectations = spi_test_expects![
            // RX_DR on pipe 2
            (vec![commands::NOP], vec![0x44u8]),
        ];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        let flags = radio.update_status().unwrap();
        assert!(flags.rx_dr());
        assert!(!flags.tx_ds());
        assert_eq!(flags.rx_pipe_number(), Some(2));
        assert_eq!(radio.status(), flags);
        spi.done();
        ce_pin.done();
    }

    #[test]
    pub fn clear_status_flags() {
        let spi_expectations = spi_test_expects![(
            vec![registers::STATUS | commands::W_REGISTER, 0x70u8],
            vec![0x7Eu8, 0u8],
        ),];
        let mocks = mk_radio(&[], &spi_expectations);
        let (mut radio, mut spi, mut ce_pin) = (mocks.0, mocks.1, mocks.2);
        radio.clear_status_flags().unwrap();
        spi.done();
        ce_pin.done();
    }
}
