//! # nrf24-link
//!
//! A pure-rust driver for the nRF24L01 transceiver that can send messages
//! larger than the radio's 32 byte payload limit.
//!
//! A [`Nrf24l01`](struct@crate::radio::Nrf24l01) owns the bus access to one
//! physical radio. The [`Nrf24Driver`](struct@crate::radio::Nrf24Driver)
//! remembers each radio's configuration and last mode, and implements the
//! transport on top of them.
//!
//! ## Basic API
//!
//! - [`Nrf24Driver::init()`](fn@crate::radio::Nrf24Driver::init)
//! - [`Nrf24Driver::transmit()`](fn@crate::radio::Nrf24Driver::transmit)
//! - [`Nrf24Driver::receive()`](fn@crate::radio::Nrf24Driver::receive)
//!
//! ## Single packet API
//!
//! - [`Nrf24Driver::transmit_packet()`](fn@crate::radio::Nrf24Driver::transmit_packet)
//! - [`Nrf24Driver::receive_packet()`](fn@crate::radio::Nrf24Driver::receive_packet)
//!
//! ## Mode and power API
//!
//! - [`Nrf24Driver::enter_transmit_mode()`](fn@crate::radio::Nrf24Driver::enter_transmit_mode)
//! - [`Nrf24Driver::enter_receive_mode()`](fn@crate::radio::Nrf24Driver::enter_receive_mode)
//! - [`Nrf24l01::power_up()`](fn@crate::radio::Nrf24l01::power_up)
//! - [`Nrf24l01::power_down()`](fn@crate::radio::Nrf24l01::power_down)
//! - [`Nrf24l01::use_power_down_mode()`](fn@crate::radio::Nrf24l01::use_power_down_mode)
//!
//! ## Diagnostics API
//!
//! - [`Nrf24Driver::status()`](fn@crate::radio::Nrf24Driver::status)
//! - [`Nrf24Driver::details()`](fn@crate::radio::Nrf24Driver::details)
//! - [`Nrf24Driver::print_details()`](fn@crate::radio::Nrf24Driver::print_details)
//! - [`Nrf24l01::packets_lost()`](fn@crate::radio::Nrf24l01::packets_lost)
//! - [`Nrf24l01::packets_retransmitted()`](fn@crate::radio::Nrf24l01::packets_retransmitted)
//!
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod types;
pub use types::{AddressWidth, DataRate, PaLevel, RadioMode, StatusFlags};
pub mod fragment;
pub mod radio;

#[cfg(test)]
mod sim;
