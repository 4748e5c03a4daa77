//! Radio capability

use crate::packet::{Frame, MAX_PACKET_LEN};

/// Unreliable datagram link to the peer
///
/// Frames may be lost, duplicated or arrive out of order. Neither method may block.
pub trait Radio {
    /// Queue a frame for transmission
    fn send(&mut self, frame: &[u8]);

    /// Take the oldest received frame, if any
    fn receive(&mut self) -> Option<Frame>;

    /// Advance the transceiver state
    fn poll(&mut self) {}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataRate {
    Nrf1Mbit,
    Nrf2Mbit,
    Nrf250Kbit,
}

/// Radio parameters, fixed for the lifetime of the link
///
/// Both peers must use the same channel, address, group and data rate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RadioConfig {
    pub max_packet_len: u8,
    /// Number of received frames buffered before new ones are dropped
    pub queue_depth: u8,
    /// Frequency offset from 2400 MHz
    pub channel: u8,
    /// 0 (-30 dBm) to 7 (+4 dBm)
    pub power: u8,
    pub address: u32,
    pub group: u8,
    pub data_rate: DataRate,
}

impl RadioConfig {
    pub const DEFAULT: Self = Self {
        max_packet_len: MAX_PACKET_LEN as u8,
        queue_depth: 16,
        channel: 55,
        power: 7,
        address: 0x12E5_AB5C,
        group: 0,
        data_rate: DataRate::Nrf1Mbit,
    };
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
