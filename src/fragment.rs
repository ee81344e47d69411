//! On-air framing of messages that do not fit in a single packet.
//!
//! A message is split into a number of equally sized packets. The first packet
//! starts with a 3 byte header:
//!
//! | byte | value |
//! |-----:|:------|
//! | 0 | [`MESSAGE_START`] |
//! | 1 | total number of packets |
//! | 2 | size of every packet |
//!
//! followed by the first `packet_size - 3` bytes of the message. All following
//! packets carry only message bytes. The last packet is padded with zeros.
//!
//! ```
//! use nrf24_link::fragment::{FragmentHeader, Fragmenter};
//!
//! let message = [0xAAu8; 40];
//! let fragments = Fragmenter::new(&message, 16).unwrap();
//! assert_eq!(fragments.header(), FragmentHeader { packet_count: 3, packet_size: 16 });
//! for fragment in fragments {
//!     assert_eq!(fragment.as_bytes().len(), 16);
//! }
//! ```

/// The length of the header that precedes the first packet's payload.
pub const HEADER_LEN: usize = 3;

/// The identifier in the first byte of every message's first packet.
pub const MESSAGE_START: u8 = 0x00;

/// The smallest packet size that can carry the header.
pub const MIN_PACKET_SIZE: u8 = HEADER_LEN as u8;

/// The largest payload the radio can send at once.
pub const MAX_PACKET_SIZE: u8 = 32;

/// Reasons a message cannot be fragmented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentError {
    /// The packet size is outside the range [3, 32].
    InvalidPacketSize(u8),
    /// The message (of the given length) needs more than 255 packets.
    MessageTooLarge(usize),
}

#[cfg(feature = "defmt")]
impl defmt::Format for FragmentError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            FragmentError::InvalidPacketSize(size) => {
                defmt::write!(fmt, "invalid packet size {=u8}", size)
            }
            FragmentError::MessageTooLarge(len) => {
                defmt::write!(fmt, "message of {=usize} bytes needs too many packets", len)
            }
        }
    }
}

fn check_packet_size(packet_size: u8) -> Result<(), FragmentError> {
    if (MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&packet_size) {
        Ok(())
    } else {
        Err(FragmentError::InvalidPacketSize(packet_size))
    }
}

/// The number of `packet_size` packets needed to send a message of `size` bytes.
pub fn packet_count(size: usize, packet_size: u8) -> Result<u8, FragmentError> {
    check_packet_size(packet_size)?;
    let packet_size = packet_size as usize;
    let count = (size + HEADER_LEN + packet_size - 1) / packet_size;
    u8::try_from(count).map_err(|_| FragmentError::MessageTooLarge(size))
}

/// The number of zeros appended to a message of `size` bytes to fill the last packet.
///
/// This is 0 when the header and message exactly fill a whole number of packets.
/// `packet_size` is expected to be non-zero.
pub const fn fill_bytes(size: usize, packet_size: u8) -> usize {
    let packet_size = packet_size as usize;
    (packet_size - (size + HEADER_LEN) % packet_size) % packet_size
}

/// The header carried by the first packet of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentHeader {
    pub packet_count: u8,
    pub packet_size: u8,
}

#[cfg(feature = "defmt")]
impl defmt::Format for FragmentHeader {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "FragmentHeader packet_count: {=u8}, packet_size: {=u8}",
            self.packet_count,
            self.packet_size
        )
    }
}

impl FragmentHeader {
    /// The header describing a message of `size` bytes sent in `packet_size` packets.
    pub fn for_message(size: usize, packet_size: u8) -> Result<Self, FragmentError> {
        Ok(Self {
            packet_count: packet_count(size, packet_size)?,
            packet_size,
        })
    }

    pub const fn encode(&self) -> [u8; HEADER_LEN] {
        [MESSAGE_START, self.packet_count, self.packet_size]
    }

    /// Parse the header at the start of `packet`.
    ///
    /// Returns `None` if `packet` is not the first packet of a message: it is too
    /// short, does not start with [`MESSAGE_START`], announces no packets, or
    /// announces a packet size outside the range [3, 32].
    pub fn decode(packet: &[u8]) -> Option<Self> {
        match packet {
            [MESSAGE_START, count, size, ..]
                if *count > 0 && check_packet_size(*size).is_ok() =>
            {
                Some(Self {
                    packet_count: *count,
                    packet_size: *size,
                })
            }
            _ => None,
        }
    }

    /// The number of bytes that reassembling the announced packets produces.
    ///
    /// This includes the zeros that padded the last packet.
    pub const fn reassembled_len(&self) -> usize {
        let packet_size = self.packet_size as usize;
        (packet_size - HEADER_LEN) + (self.packet_count as usize - 1) * packet_size
    }
}

/// One packet produced by a [`Fragmenter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment {
    buf: [u8; MAX_PACKET_SIZE as usize],
    len: u8,
}

impl Fragment {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

/// An iterator over the packets of one message.
///
/// Packets are built on demand, so no buffer for the whole padded
/// message is needed.
#[derive(Clone, Debug)]
pub struct Fragmenter<'a> {
    data: &'a [u8],
    header: FragmentHeader,
    index: u8,
    offset: usize,
}

impl<'a> Fragmenter<'a> {
    /// Split `data` into packets of `packet_size` bytes (in range [3, 32]).
    pub fn new(data: &'a [u8], packet_size: u8) -> Result<Self, FragmentError> {
        Ok(Self {
            data,
            header: FragmentHeader::for_message(data.len(), packet_size)?,
            index: 0,
            offset: 0,
        })
    }

    pub fn header(&self) -> FragmentHeader {
        self.header
    }
}

impl Iterator for Fragmenter<'_> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.header.packet_count {
            return None;
        }
        let packet_size = self.header.packet_size as usize;
        let mut fragment = Fragment {
            buf: [0u8; MAX_PACKET_SIZE as usize],
            len: self.header.packet_size,
        };
        let body = if self.index == 0 {
            fragment.buf[..HEADER_LEN].copy_from_slice(&self.header.encode());
            &mut fragment.buf[HEADER_LEN..packet_size]
        } else {
            &mut fragment.buf[..packet_size]
        };
        let remaining = &self.data[self.offset..];
        let taken = body.len().min(remaining.len());
        body[..taken].copy_from_slice(&remaining[..taken]);
        self.offset += taken;
        self.index += 1;
        Some(fragment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.header.packet_count - self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Fragmenter<'_> {}
