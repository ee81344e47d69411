/// Register offsets for the nRF24L01.
pub mod registers {
    pub const CONFIG: u8 = 0x00;
    pub const EN_AA: u8 = 0x01;
    pub const EN_RXADDR: u8 = 0x02;
    pub const SETUP_AW: u8 = 0x03;
    pub const SETUP_RETR: u8 = 0x04;
    pub const RF_CH: u8 = 0x05;
    pub const RF_SETUP: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const OBSERVE_TX: u8 = 0x08;
    pub const RX_ADDR_P0: u8 = 0x0A;
    pub const RX_ADDR_P1: u8 = 0x0B;
    pub const TX_ADDR: u8 = 0x10;
    pub const RX_PW_P0: u8 = 0x11;
    pub const DYNPD: u8 = 0x1C;
    pub const FEATURE: u8 = 0x1D;
}

/// SPI commands for the nRF24L01.
pub mod commands {
    pub const W_REGISTER: u8 = 0x20;
    pub const ACTIVATE: u8 = 0x50;
    /// Second byte of the ACTIVATE command that unlocks the FEATURE register.
    pub const ACTIVATE_KEY: u8 = 0x73;
    pub const R_RX_PL_WID: u8 = 0x60;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    /// Also used as the dummy byte clocked out while reading.
    pub const NOP: u8 = 0xFF;
}

/// Bit mnemonics
pub mod mnemonics {
    pub const MASK_RX_DR: u8 = 1 << 6;
    pub const MASK_TX_DS: u8 = 1 << 5;
    pub const MASK_MAX_RT: u8 = 1 << 4;
    /// FEATURE register bit enabling dynamic payload lengths.
    pub const EN_DPL: u8 = 1 << 2;
}

/// Settle times and polling windows used by the driver.
pub mod timing {
    /// Worst case crystal start-up (external crystal, Ls = 90 mH) after setting PWR_UP.
    pub const POWER_UP_US: u32 = 4500;
    /// Standby to active TX/RX mode.
    pub const MODE_SETTLE_US: u32 = 130;
    /// Minimum CE pulse that starts a transmission.
    pub const CE_PULSE_US: u32 = 10;
    /// Power on reset transition state.
    pub const POWER_ON_RESET_MS: u32 = 100;
    /// Window for the radio to report TX_DS or MAX_RT after a payload is sent.
    pub const TX_TIMEOUT_MS: u32 = 100;
    /// Window for each fragment of a multi-packet message to arrive.
    pub const FRAGMENT_TIMEOUT_MS: u32 = 50;
}
