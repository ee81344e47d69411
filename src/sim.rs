//! An in-memory model of nRF24L01 radios sharing the air, for link level tests.
//!
//! Only the behavior the driver depends on is modeled: registers, the
//! STATUS latch, a single entry TX FIFO, the RX FIFO, address matching,
//! the OBSERVE_TX counters and PLOS_CNT reset on RF_CH writes.
//! Every transmission succeeds at once (unless [`SimState::fail_tx`] is set),
//! and frames wait on the air until a listening radio picks them up.
extern crate std;

use core::{cell::Cell, cell::RefCell, convert::Infallible};
use std::{collections::VecDeque, rc::Rc, vec::Vec};

use embedded_hal::{delay::DelayNs, digital, spi};

use crate::radio::{
    nrf24::{commands, mnemonics, registers},
    prelude::MillisClock,
    DeviceId, Nrf24l01, RadioConfig, RxPipe,
};

/// One payload in flight.
#[derive(Clone, Debug)]
pub struct Frame {
    pub address: Vec<u8>,
    pub payload: Vec<u8>,
}

type Air = Rc<RefCell<VecDeque<Frame>>>;

/// The register file and FIFOs of one simulated radio.
#[derive(Debug)]
pub struct SimState {
    regs: [[u8; 5]; 0x20],
    tx_payload: Option<Vec<u8>>,
    rx_fifo: VecDeque<(u8, Vec<u8>)>,
    ce: bool,
    air: Air,
    /// Report MAX_RT instead of sending anything.
    pub fail_tx: bool,
    /// Fail every SPI transaction that reads this register.
    pub fail_reads_of: Option<u8>,
    /// Number of SPI transactions seen.
    pub transactions: usize,
    /// Number of writes to the CONFIG register.
    pub config_writes: usize,
    /// Number of frames put on the air.
    pub sent: usize,
}

impl SimState {
    fn new(air: Air) -> Self {
        let mut regs = [[0u8; 5]; 0x20];
        regs[registers::CONFIG as usize][0] = 0x08;
        regs[registers::EN_AA as usize][0] = 0x3F;
        regs[registers::EN_RXADDR as usize][0] = 0x03;
        regs[registers::SETUP_AW as usize][0] = 0x03;
        regs[registers::RF_CH as usize][0] = 0x02;
        Self {
            regs,
            tx_payload: None,
            rx_fifo: VecDeque::new(),
            ce: false,
            air,
            fail_tx: false,
            fail_reads_of: None,
            transactions: 0,
            config_writes: 0,
            sent: 0,
        }
    }

    fn reg(&self, register: u8) -> u8 {
        self.regs[register as usize][0]
    }

    /// Preset the OBSERVE_TX register (PLOS_CNT in the upper nibble, ARC_CNT in the lower).
    pub fn set_observe_tx(&mut self, value: u8) {
        self.regs[registers::OBSERVE_TX as usize][0] = value;
    }

    pub fn observe_tx(&self) -> u8 {
        self.reg(registers::OBSERVE_TX)
    }

    pub fn is_powered(&self) -> bool {
        self.reg(registers::CONFIG) & 2 > 0
    }

    fn is_rx(&self) -> bool {
        self.reg(registers::CONFIG) & 1 > 0
    }

    pub fn status(&self) -> u8 {
        let pipe = self.rx_fifo.front().map_or(7, |(pipe, _)| *pipe);
        (self.reg(registers::STATUS) & 0x70) | (pipe << 1)
    }

    fn address_width(&self) -> usize {
        (self.reg(registers::SETUP_AW) & 3) as usize + 2
    }

    fn pipe_address(&self, pipe: u8) -> Vec<u8> {
        let width = self.address_width();
        if pipe < 2 {
            return self.regs[(registers::RX_ADDR_P0 + pipe) as usize][..width].to_vec();
        }
        let mut address = self.regs[registers::RX_ADDR_P1 as usize][..width].to_vec();
        address[width - 1] = self.reg(registers::RX_ADDR_P0 + pipe);
        address
    }

    fn pull_from_air(&mut self) {
        if !(self.ce && self.is_powered() && self.is_rx()) || !self.rx_fifo.is_empty() {
            return;
        }
        let Some(frame) = self.air.borrow_mut().pop_front() else {
            return;
        };
        let open_pipes = self.reg(registers::EN_RXADDR);
        let Some(pipe) =
            (0..6u8).find(|p| open_pipes & (1 << *p) > 0 && self.pipe_address(*p) == frame.address)
        else {
            return;
        };
        let dynamic = self.reg(registers::FEATURE) & mnemonics::EN_DPL > 0
            && self.reg(registers::DYNPD) & (1 << pipe) > 0;
        let mut payload = frame.payload;
        if !dynamic {
            payload.resize(self.reg(registers::RX_PW_P0 + pipe) as usize, 0);
        }
        self.rx_fifo.push_back((pipe, payload));
        self.regs[registers::STATUS as usize][0] |= mnemonics::MASK_RX_DR;
    }

    fn write_register(&mut self, register: u8, data: &[u8]) {
        let Some(first) = data.first().copied() else {
            return;
        };
        match register {
            registers::STATUS => {
                self.regs[registers::STATUS as usize][0] &= !(first & 0x70);
            }
            registers::RF_CH => {
                self.regs[registers::RF_CH as usize][0] = first;
                self.regs[registers::OBSERVE_TX as usize][0] &= 0x0F;
            }
            _ => {
                if register == registers::CONFIG {
                    self.config_writes += 1;
                }
                let len = data.len().min(5);
                self.regs[register as usize][..len].copy_from_slice(&data[..len]);
            }
        }
    }

    fn exchange(&mut self, buf: &mut [u8]) {
        if buf.is_empty() {
            return;
        }
        self.transactions += 1;
        self.pull_from_air();
        let status = self.status();
        let command = buf[0];
        match command {
            c if c < commands::W_REGISTER => {
                let register = c & 0x1F;
                for (i, byte) in buf[1..].iter_mut().enumerate() {
                    *byte = if register == registers::STATUS {
                        status
                    } else {
                        self.regs[register as usize].get(i).copied().unwrap_or(0)
                    };
                }
            }
            c if c < 0x40 => self.write_register(c & 0x1F, &buf[1..]),
            commands::R_RX_PL_WID => {
                let len = self.rx_fifo.front().map_or(0, |(_, p)| p.len() as u8);
                if let Some(byte) = buf.get_mut(1) {
                    *byte = len;
                }
            }
            commands::R_RX_PAYLOAD => {
                let payload = self.rx_fifo.pop_front().map(|(_, p)| p).unwrap_or_default();
                let out = &mut buf[1..];
                out.fill(0);
                let len = out.len().min(payload.len());
                out[..len].copy_from_slice(&payload[..len]);
            }
            commands::W_TX_PAYLOAD => self.tx_payload = Some(buf[1..].to_vec()),
            commands::FLUSH_TX => self.tx_payload = None,
            commands::FLUSH_RX => self.rx_fifo.clear(),
            _ => {}
        }
        buf[0] = status;
    }

    fn set_ce(&mut self, high: bool) {
        self.ce = high;
        if !high || !self.is_powered() || self.is_rx() {
            return;
        }
        let Some(payload) = self.tx_payload.take() else {
            return;
        };
        if self.fail_tx {
            self.regs[registers::STATUS as usize][0] |= mnemonics::MASK_MAX_RT;
            return;
        }
        let width = self.address_width();
        let address = self.regs[registers::TX_ADDR as usize][..width].to_vec();
        self.air.borrow_mut().push_back(Frame { address, payload });
        self.sent += 1;
        self.regs[registers::STATUS as usize][0] |= mnemonics::MASK_TX_DS;
    }
}

pub struct SimSpi(Rc<RefCell<SimState>>);

impl spi::ErrorType for SimSpi {
    type Error = spi::ErrorKind;
}

impl spi::SpiDevice for SimSpi {
    fn transaction(
        &mut self,
        operations: &mut [spi::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            if let spi::Operation::TransferInPlace(buf) = operation {
                let mut state = self.0.borrow_mut();
                if buf.first().is_some_and(|cmd| Some(*cmd) == state.fail_reads_of) {
                    return Err(spi::ErrorKind::Other);
                }
                state.exchange(buf);
            }
        }
        Ok(())
    }
}

pub struct SimPin(Rc<RefCell<SimState>>);

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl digital::OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_ce(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_ce(true);
        Ok(())
    }
}

/// Shared simulated time in nanoseconds.
type Time = Rc<Cell<u64>>;

pub struct SimDelay(Time);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.set(self.0.get() + ns as u64);
    }
}

/// Every read advances the simulated time by 100 us.
pub struct SimClock(Time);

impl MillisClock for SimClock {
    fn now_ms(&mut self) -> u32 {
        let now = self.0.get() + 100_000;
        self.0.set(now);
        (now / 1_000_000) as u32
    }
}

pub type SimRadio = Nrf24l01<SimSpi, SimPin, SimDelay, SimClock>;

/// The air and clock shared by all radios in a test.
#[derive(Default)]
pub struct SimLink {
    air: Air,
    time: Time,
}

impl SimLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new radio on this link, and a handle to its internal state.
    pub fn radio(&self, id: u8) -> (SimRadio, Rc<RefCell<SimState>>) {
        let state = Rc::new(RefCell::new(SimState::new(self.air.clone())));
        let radio = Nrf24l01::new(
            DeviceId(id),
            SimPin(state.clone()),
            SimSpi(state.clone()),
            SimDelay(self.time.clone()),
            SimClock(self.time.clone()),
        );
        (radio, state)
    }

    pub fn now_ms(&self) -> u32 {
        (self.time.get() / 1_000_000) as u32
    }

    /// Put a frame on the air as if another transmitter sent it.
    pub fn inject(&self, address: &[u8], payload: &[u8]) {
        self.air.borrow_mut().push_back(Frame {
            address: address.to_vec(),
            payload: payload.to_vec(),
        });
    }

    /// Frames sent but not yet received.
    pub fn in_flight(&self) -> usize {
        self.air.borrow().len()
    }
}

/// The 3 byte address that [`link_config()`] sends to and listens on (pipe 0).
pub const LINK_ADDRESS: [u8; 3] = [0x11, 0x22, 0x33];
/// The 3 byte address of pipe 1 in [`link_config()`].
pub const SIDE_ADDRESS: [u8; 3] = [0x44, 0x55, 0x66];

/// A configuration shared by both ends of a simulated link.
///
/// Pipes 0 and 1 are open with a fixed `packet_size`, unless `dynamic` is set.
pub fn link_config(packet_size: u8, dynamic: bool) -> RadioConfig {
    let pipe = |index: u8, address: u64| {
        RxPipe::new(index)
            .with_enabled(true)
            .with_address(address)
            .with_payload_size(packet_size)
            .with_dynamic_payload(dynamic)
    };
    RadioConfig::default()
        .with_address_width(crate::AddressWidth::Bytes3)
        .with_channel(42)
        .with_rx_pipe(pipe(0, 0x112233))
        .with_rx_pipe(pipe(1, 0x445566))
        .with_tx_address(0x112233)
        .with_dynamic_payloads(dynamic)
}
