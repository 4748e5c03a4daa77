//! Link configuration

use crate::arq::Timing;
use crate::packet::{HEADER_LEN, MAX_PAYLOAD_LEN};
use crate::radio::RadioConfig;
use crate::serial::SerialConfig;

#[cfg(feature = "json-config")]
pub use generated::CONFIG;

#[cfg(not(feature = "json-config"))]
pub use code::CONFIG;

/// Everything needed to bring up the link, fixed at build time
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LinkConfig {
    pub serial: SerialConfig,
    pub radio: RadioConfig,
    pub timing: Timing,
    /// Scheduler tick period
    pub tick_period_us: u32,
}

impl LinkConfig {
    /// Maximum number of serial bytes carried by one data packet
    pub fn chunk_len(&self) -> usize {
        (self.radio.max_packet_len as usize)
            .saturating_sub(HEADER_LEN)
            .clamp(1, MAX_PAYLOAD_LEN)
    }
}

#[cfg(feature = "json-config")]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

#[cfg(not(feature = "json-config"))]
mod code {
    use super::*;

    pub static CONFIG: LinkConfig = LinkConfig {
        serial: SerialConfig::DEFAULT,
        radio: RadioConfig::DEFAULT,
        timing: Timing::new(100),
        tick_period_us: 1000,
    };
}
