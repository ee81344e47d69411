use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use super::{timing, Nrf24Driver, Nrf24Error, Nrf24l01};
use crate::{
    fragment::{FragmentHeader, Fragmenter, HEADER_LEN, MAX_PACKET_SIZE},
    radio::{prelude::MillisClock, PIPE_COUNT},
};

impl<const N: usize> Nrf24Driver<N> {
    /// Send `data` of any length as a sequence of `packet_size` packets.
    ///
    /// The `packet_size` must be in range [3, 32] and should match the payload
    /// size that the receiving pipe is configured with (unless it uses dynamic
    /// payloads). A message can span at most 255 packets, so the longest message
    /// is 762 bytes with 3 byte packets and 8157 bytes with 32 byte packets.
    /// Longer messages are rejected with [`Nrf24Error::MessageTooLarge`].
    ///
    /// Returns `false` as soon as one packet fails to be sent; the rest of the
    /// message is not sent. A radio that powers down between transactions is
    /// kept powered up until the whole message is sent.
    pub fn transmit<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        data: &[u8],
        packet_size: u8,
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        let fragments = Fragmenter::new(data, packet_size)?;
        self.cache.entry(device.id())?;
        let power_saving = device.power_down_between_transactions();
        if power_saving {
            device.use_power_down_mode(false)?;
        }
        let sent = self.transmit_fragments(device, fragments);
        if power_saving {
            device.use_power_down_mode(true)?;
        }
        sent
    }

    fn transmit_fragments<SPI, DO, DELAY, CLOCK>(
        &mut self,
        device: &mut Nrf24l01<SPI, DO, DELAY, CLOCK>,
        fragments: Fragmenter<'_>,
    ) -> Result<bool, Nrf24Error<SPI::Error, DO::Error>>
    where
        SPI: SpiDevice,
        DO: OutputPin,
        DELAY: DelayNs,
        CLOCK: MillisClock,
    {
        let count = fragments.len();
        for (index, fragment) in fragments.enumerate() {
            if !self.transmit_packet(device, fragment.as_bytes())? {
                log::warn!(
                    "{:?} failed to send packet {} of {}",
                    device.id(),
                    index + 1,
                    count
                );
                return Ok(false);
            }
        }
        log::trace!("{:?} sent a message in {} packets", device.id(), count);
        Ok(true)
    }

    /// Wait up to `timeout_ms` for a message on `pipe` and reassemble it into `buf`.
    ///
    /// Packets that do not start a message are dropped until a first packet
    /// arrives. Then every remaining packet of the message must arrive within
    /// 50 ms of the previous one, else this returns `false`.
    ///
    /// On success, `buf` starts with the message followed by the zeros that
    /// padded its last packet. The message length itself is not transmitted.
    /// Returns [`Nrf24Error::BufferTooSmall`] if the announced message (with
    /// padding) does not fit in `buf`.
    pub fn receive<SPI, DO, DELAY, CLOCK>(
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
        self.cache.entry(device.id())?;
        let power_saving = device.power_down_between_transactions();
        if power_saving {
            device.use_power_down_mode(false)?;
        }
        let received = self.receive_fragments(device, pipe, buf, timeout_ms);
        if power_saving {
            device.use_power_down_mode(true)?;
        }
        received
    }

    fn receive_fragments<SPI, DO, DELAY, CLOCK>(
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
        let start = device.now_ms();
        while device.elapsed_ms(start) < timeout_ms {
            let mut packet = [0u8; MAX_PACKET_SIZE as usize];
            if !self.receive_packet(device, pipe, &mut packet, timing::FRAGMENT_TIMEOUT_MS)? {
                continue;
            }
            let Some(header) = FragmentHeader::decode(&packet) else {
                log::debug!("{:?} dropped a packet that does not start a message", device.id());
                continue;
            };
            let required = header.reassembled_len();
            if buf.len() < required {
                return Err(Nrf24Error::BufferTooSmall {
                    required,
                    actual: buf.len(),
                });
            }
            let packet_size = header.packet_size as usize;
            let mut offset = packet_size - HEADER_LEN;
            buf[..offset].copy_from_slice(&packet[HEADER_LEN..packet_size]);
            for index in 1..header.packet_count {
                let chunk = &mut buf[offset..offset + packet_size];
                chunk.fill(0);
                if !self.receive_packet(device, pipe, chunk, timing::FRAGMENT_TIMEOUT_MS)? {
                    log::warn!(
                        "{:?} lost packet {} of {}",
                        device.id(),
                        index + 1,
                        header.packet_count
                    );
                    return Ok(false);
                }
                offset += packet_size;
            }
            log::trace!(
                "{:?} received a message in {} packets",
                device.id(),
                header.packet_count
            );
            return Ok(true);
        }
        Ok(false)
    }
}

/////////////////////////////////////////////////////////////////////////////////
/// unit tests
#[cfg(test)]
mod test {
    extern crate std;
    use crate::{
        fragment::{packet_count, FragmentHeader},
        radio::{DeviceId, Nrf24Driver, Nrf24Error},
        sim::{link_config, SimLink, SimRadio, LINK_ADDRESS, SIDE_ADDRESS},
    };
    use std::{vec, vec::Vec};

    struct Link {
        sim: SimLink,
        driver: Nrf24Driver<2>,
        tx: SimRadio,
        rx: SimRadio,
    }

    fn mk_link(packet_size: u8, dynamic: bool) -> Link {
        let sim = SimLink::new();
        let mut driver = Nrf24Driver::new();
        let (mut tx, _) = sim.radio(0);
        let (mut rx, _) = sim.radio(1);
        driver.init(&mut tx, link_config(packet_size, dynamic)).unwrap();
        driver.init(&mut rx, link_config(packet_size, dynamic)).unwrap();
        Link { sim, driver, tx, rx }
    }

    fn message(size: usize) -> Vec<u8> {
        (0..size).map(|i| (i % 253) as u8 + 1).collect()
    }

    #[test]
    fn round_trip_fixed_payloads() {
        for packet_size in 3u8..=32 {
            for size in [0usize, 1, 2, 28, 29, 30, 61, 100, 700, 2000] {
                if packet_count(size, packet_size).is_err() {
                    continue;
                }
                let mut link = mk_link(packet_size, false);
                let data = message(size);
                assert!(link.driver.transmit(&mut link.tx, &data, packet_size).unwrap());
                let header = FragmentHeader::for_message(size, packet_size).unwrap();
                let mut buf = vec![0xFFu8; header.reassembled_len()];
                assert!(link.driver.receive(&mut link.rx, 0, &mut buf, 5000).unwrap());
                assert_eq!(&buf[..size], data.as_slice());
                // padding
                assert!(buf[size..].iter().all(|b| *b == 0));
                assert_eq!(link.sim.in_flight(), 0);
            }
        }
    }

    #[test]
    fn round_trip_dynamic_payloads() {
        for packet_size in [3u8, 7, 16, 32] {
            for size in [0usize, 13, 29, 300] {
                let mut link = mk_link(packet_size, true);
                let data = message(size);
                assert!(link.driver.transmit(&mut link.tx, &data, packet_size).unwrap());
                let mut buf = vec![0u8; 320];
                assert!(link.driver.receive(&mut link.rx, 0, &mut buf, 5000).unwrap());
                assert_eq!(&buf[..size], data.as_slice());
            }
        }
    }

    #[test]
    fn strays_are_dropped() {
        let mut link = mk_link(8, false);
        // continuation bytes of an older message
        link.sim.inject(&LINK_ADDRESS, &[5, 6, 7, 8, 9, 10, 11, 12]);
        // a message start announcing impossible packet sizes
        link.sim.inject(&LINK_ADDRESS, &[0, 2, 2, 0, 0, 0, 0, 0]);
        // a message start with no packets
        link.sim.inject(&LINK_ADDRESS, &[0, 0, 8, 0, 0, 0, 0, 0]);
        let data = message(20);
        assert!(link.driver.transmit(&mut link.tx, &data, 8).unwrap());
        let mut buf = [0u8; 21];
        assert!(link.driver.receive(&mut link.rx, 0, &mut buf, 1000).unwrap());
        assert_eq!(&buf[..20], data.as_slice());
    }

    #[test]
    fn only_strays_time_out() {
        let mut link = mk_link(8, false);
        for _ in 0..5 {
            link.sim.inject(&LINK_ADDRESS, &[0xAA; 8]);
        }
        let mut buf = [0x55u8; 64];
        let start = link.sim.now_ms();
        assert!(!link.driver.receive(&mut link.rx, 0, &mut buf, 300).unwrap());
        assert!(link.sim.now_ms() - start >= 300);
        assert!(buf.iter().all(|b| *b == 0x55));
    }

    #[test]
    fn other_pipes_are_dropped() {
        let mut link = mk_link(8, false);
        link.sim.inject(&SIDE_ADDRESS, &[0, 1, 8, 1, 2, 3, 4, 5]);
        let data = message(5);
        assert!(link.driver.transmit(&mut link.tx, &data, 8).unwrap());
        let mut buf = [0u8; 5];
        assert!(link.driver.receive(&mut link.rx, 0, &mut buf, 1000).unwrap());
        assert_eq!(&buf, data.as_slice());
        assert_eq!(link.sim.in_flight(), 0);
    }

    #[test]
    fn receive_on_second_pipe() {
        let mut link = mk_link(8, false);
        link.sim.inject(&SIDE_ADDRESS, &[0, 1, 8, 1, 2, 3, 4, 5]);
        let mut buf = [0u8; 5];
        assert!(link.driver.receive(&mut link.rx, 1, &mut buf, 1000).unwrap());
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_fragment_fails_fast() {
        let mut link = mk_link(8, false);
        // announces 3 packets, only 1 arrives
        link.sim.inject(&LINK_ADDRESS, &[0, 3, 8, 1, 2, 3, 4, 5]);
        let mut buf = [0u8; 21];
        let start = link.sim.now_ms();
        assert!(!link.driver.receive(&mut link.rx, 0, &mut buf, 1000).unwrap());
        let elapsed = link.sim.now_ms() - start;
        assert!(elapsed >= 50);
        assert!(elapsed < 1000);
    }

    #[test]
    fn failed_packet_aborts_message() {
        let sim = SimLink::new();
        let mut driver = Nrf24Driver::<1>::new();
        let (mut tx, state) = sim.radio(0);
        driver.init(&mut tx, link_config(8, false)).unwrap();
        state.borrow_mut().fail_tx = true;
        assert!(!driver.transmit(&mut tx, &message(40), 8).unwrap());
        assert_eq!(state.borrow().sent, 0);
        assert_eq!(sim.in_flight(), 0);
    }

    #[test]
    fn power_down_between_transactions() {
        let sim = SimLink::new();
        let mut driver = Nrf24Driver::<2>::new();
        let (tx, tx_state) = sim.radio(0);
        let (rx, rx_state) = sim.radio(1);
        let mut tx = tx.with_power_down_between_transactions(true);
        let mut rx = rx.with_power_down_between_transactions(true);
        driver.init(&mut tx, link_config(16, false)).unwrap();
        driver.init(&mut rx, link_config(16, false)).unwrap();
        assert!(!tx_state.borrow().is_powered());
        let data = message(50);
        assert!(driver.transmit(&mut tx, &data, 16).unwrap());
        assert!(!tx_state.borrow().is_powered());
        assert!(tx.power_down_between_transactions());
        let mut buf = [0u8; 61];
        assert!(driver.receive(&mut rx, 0, &mut buf, 1000).unwrap());
        assert_eq!(&buf[..50], data.as_slice());
        assert!(!rx_state.borrow().is_powered());
        assert!(rx.power_down_between_transactions());
    }

    #[test]
    fn rejected_without_bus_traffic() {
        let sim = SimLink::new();
        let mut driver = Nrf24Driver::<1>::new();
        let (mut radio, state) = sim.radio(0);
        let mut buf = [0u8; 64];
        assert!(matches!(
            driver.transmit(&mut radio, &[1, 2, 3], 8),
            Err(Nrf24Error::NotInitialized(DeviceId(0)))
        ));
        assert!(matches!(
            driver.receive(&mut radio, 0, &mut buf, 100),
            Err(Nrf24Error::NotInitialized(DeviceId(0)))
        ));
        driver.init(&mut radio, link_config(8, false)).unwrap();
        let transactions = state.borrow().transactions;
        assert!(matches!(
            driver.transmit(&mut radio, &[1, 2, 3], 2),
            Err(Nrf24Error::InvalidPacketSize(2))
        ));
        assert!(matches!(
            driver.transmit(&mut radio, &[1, 2, 3], 33),
            Err(Nrf24Error::InvalidPacketSize(33))
        ));
        assert!(matches!(
            driver.transmit(&mut radio, &[0u8; 763], 3),
            Err(Nrf24Error::MessageTooLarge(763))
        ));
        assert!(matches!(
            driver.receive(&mut radio, 6, &mut buf, 100),
            Err(Nrf24Error::InvalidPipe(6))
        ));
        assert_eq!(state.borrow().transactions, transactions);
    }

    #[test]
    fn buffer_too_small() {
        let mut link = mk_link(8, false);
        assert!(link.driver.transmit(&mut link.tx, &message(20), 8).unwrap());
        let mut buf = [0u8; 20];
        assert!(matches!(
            link.driver.receive(&mut link.rx, 0, &mut buf, 1000),
            Err(Nrf24Error::BufferTooSmall {
                required: 21,
                actual: 20
            })
        ));
    }
}
