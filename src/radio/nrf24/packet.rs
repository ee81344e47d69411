use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{
    bit_fields::ObserveTx, commands, registers, timing, Nrf24Driver, Nrf24Error, Nrf24l01,
};
use crate::radio::{prelude::MillisClock, RadioConfig, PIPE_COUNT};

impl<SPI, DO, DELAY, CLOCK> Nrf24l01<SPI, DO, DELAY, CLOCK>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
    CLOCK: MillisClock,
{
    /// Poll the STATUS register until the radio reports the outcome of a transmission.
    ///
    /// Returns `true` for TX_DS, `false` for MAX_RT or if neither flag was
    /// asserted within 100 ms.
    fn wait_for_transmission(&mut self) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>> {
        let start = self.now_ms();
        while self.elapsed_ms(start) < timing::TX_TIMEOUT_MS {
            let status = self.update_status()?;
            if status.tx_ds() {
                return Ok(true);
            }
            if status.max_rt() {
                log::warn!("{:?} reached the maximum number of retransmits", self.id);
                return Ok(false);
            }
        }
        log::warn!("{:?} timed out waiting for TX_DS or MAX_RT", self.id);
        Ok(false)
    }

    /// Add the counters in OBSERVE_TX to the cumulative statistics.
    ///
    /// The lost packet counter (PLOS_CNT) only resets when RF_CH is written,
    /// so the `channel` is written back after every read.
    fn update_statistics(&mut self, channel: u8) -> Result<(), Nrf24Error<SPI::Error, DO::Error>> {
        let observed = ObserveTx::from_bits(self.read_register(registers::OBSERVE_TX)?);
        self.packets_lost += observed.plos_cnt() as u64;
        self.packets_retransmitted += observed.arc_cnt() as u64;
        self.spi_write_byte(registers::RF_CH, channel)
    }

    /// Listen (CE must be high) until a payload from `pipe` arrives or `timeout_ms` passes.
    ///
    /// Payloads received on other pipes are read and dropped.
    fn poll_rx(
        &mut self,
        config: &RadioConfig,
        pipe: u8,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>> {
        let start = self.now_ms();
        while self.elapsed_ms(start) < timeout_ms {
            let status = self.update_status()?;
            if !status.rx_dr() {
                continue;
            }
            self.clear_status_flags()?;
            let Some(rx_pipe) = status.rx_pipe_number() else {
                continue;
            };
            let settings = config.rx_pipes()[rx_pipe as usize];
            let len = if config.dynamic_payloads() && settings.dynamic_payload() {
                self.spi_read(1, commands::R_RX_PL_WID)?;
                self._buf[1]
            } else {
                settings.payload_size()
            };
            if len > 32 {
                log::warn!("{:?} reported a corrupt payload length {}", self.id, len);
                self.spi_read(0, commands::FLUSH_RX)?;
                continue;
            }
            self.spi_read(len, commands::R_RX_PAYLOAD)?;
            if rx_pipe == pipe {
                let copied = buf.len().min(len as usize);
                buf[..copied].copy_from_slice(&self._buf[1..copied + 1]);
                log::trace!("{:?} received {} bytes on pipe {}", self.id, len, pipe);
                return Ok(true);
            }
            log::debug!(
                "{:?} dropped {} bytes received on pipe {}",
                self.id,
                len,
                rx_pipe
            );
        }
        Ok(false)
    }
}

impl<const N: usize> Nrf24Driver<N> {
    /// Send a single payload of up to 32 bytes.
    ///
    /// Returns `true` if the radio reported the payload as sent (and acknowledged,
    /// if auto-ack is enabled for pipe 0). Returns `false` if the maximum number of
    /// retransmits was reached, or if the radio did not report an outcome within 100 ms.
    ///
    /// Payloads larger than 32 bytes are rejected before any bus traffic.
    pub fn transmit_packet<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        data: &[u8],
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        if data.len() > 32 {
            return Err(Nrf24Error::PayloadTooLarge(data.len()));
        }
        let channel = self.cache.entry(device.id())?.config.channel();
        let power_saving = device.power_down_between_transactions();
        if power_saving {
            device.power_up()?;
        }
        let sent = self.send_packet(device, data, channel);
        if power_saving {
            device.power_down()?;
        }
        sent
    }

    fn send_packet<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        data: &[u8],
        channel: u8,
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        self.enter_transmit_mode(device)?;
        device.spi_read(0, commands::FLUSH_TX)?;
        device.spi_write_command(commands::W_TX_PAYLOAD, data)?;
        device.ce_high()?;
        device.delay_us(timing::CE_PULSE_US);
        device.ce_low()?;
        let outcome = device.wait_for_transmission().and_then(|sent| {
            if device.statistics_enabled() {
                device.update_statistics(channel)?;
            }
            Ok(sent)
        });
        // TX_DS and MAX_RT stay latched until cleared
        let cleared = device.clear_status_flags();
        let sent = outcome?;
        cleared?;
        log::trace!("{:?} sent {} bytes: {}", device.id(), data.len(), sent);
        Ok(sent)
    }

    /// Wait up to `timeout_ms` for a payload on `pipe` and copy it into `buf`.
    ///
    /// Returns `false` if nothing was received on `pipe` in time. Payloads that
    /// arrive on other pipes are discarded. If `buf` is shorter than the received
    /// payload, the excess bytes are dropped.
    pub fn receive_packet<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        pipe: u8,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        if pipe as usize >= PIPE_COUNT {
            return Err(Nrf24Error::InvalidPipe(pipe));
        }
        let config = self.cache.entry(device.id())?.config;
        let power_saving = device.power_down_between_transactions();
        if power_saving {
            device.power_up()?;
        }
        let received = self.listen(device, &config, pipe, buf, timeout_ms);
        if power_saving {
            device.power_down()?;
        }
        received
    }

    fn listen<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        config: &RadioConfig,
        pipe: u8,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        self.enter_receive_mode(device)?;
        device.ce_high()?;
        let received = device.poll_rx(config, pipe, buf, timeout_ms);
        device.ce_low()?;
        device.spi_read(0, commands::FLUSH_RX)?;
        received
    }
}
