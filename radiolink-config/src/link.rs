use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::JsonSchema;

use crate::{impl_enum_to_tokens, impl_struct_to_tokens};

/// Baud rates that the nRF51 UART can generate
pub const BAUD_RATES: [u32; 16] = [
    1200, 2400, 4800, 9600, 14400, 19200, 28800, 38400,
    57600, 76800, 115200, 230400, 250000, 460800, 921600, 1_000_000,
];

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// GPIO number of the UART TX line
    pub tx_pin: u8,
    /// GPIO number of the UART RX line
    pub rx_pin: u8,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
pub struct RadioConfig {
    /// Maximum length of a radio frame, including the 2-byte protocol header
    pub max_packet_len: u8,
    /// Number of received frames buffered by the radio driver
    pub queue_depth: u8,
    pub channel: u8,
    /// Transmit power level, 0 (lowest) to 7 (highest)
    pub power: u8,
    pub address: u32,
    pub group: u8,
    pub data_rate: DataRate,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone, Copy)]
pub enum DataRate {
    Nrf1Mbit,
    Nrf2Mbit,
    Nrf250Kbit,
}

/// Retransmission timing in scheduler ticks; give-up is always 10 retry intervals
#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq, Clone)]
pub struct TimingConfig {
    pub retry_interval: u32,
}

impl ToTokens for TimingConfig {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let retry_interval = &self.retry_interval;
        tokens.append_all(quote! {
            crate::arq::Timing::new(#retry_interval)
        });
    }
}

impl_enum_to_tokens! {
    enum DataRate: crate::radio::DataRate,
}

impl_struct_to_tokens! {
    struct SerialConfig: crate::serial::SerialConfig { baud_rate, tx_pin, rx_pin, }
    struct RadioConfig: crate::radio::RadioConfig { max_packet_len, queue_depth, channel, power, address, group, data_rate, }
}
