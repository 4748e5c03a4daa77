pub mod format;
pub mod link;

use std::{path::Path, fs::File, io::{Write, BufReader}};

use anyhow::{ensure, Context};
use proc_macro2::TokenStream;
use quote::{quote, ToTokens, TokenStreamExt};
use serde::{Serialize, Deserialize};
use schemars::{JsonSchema, schema_for, schema::RootSchema};

pub use link::{SerialConfig, RadioConfig, DataRate, TimingConfig};

/// Protocol header: type byte + id byte
pub const HEADER_LEN: u8 = 2;
/// Largest frame the radio peripheral is configured for
pub const MAX_PACKET_LEN: u8 = 160;
/// Highest channel number (2400 MHz + channel)
pub const MAX_CHANNEL: u8 = 100;
/// Highest transmit power level
pub const MAX_POWER: u8 = 7;

fn default_tick_period_us() -> u32 {
    1000
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, PartialEq)]
pub struct LinkConfig {
    serial: SerialConfig,
    radio: RadioConfig,
    timing: TimingConfig,
    /// Scheduler tick period in microseconds
    #[serde(default = "default_tick_period_us")]
    tick_period_us: u32,
}

impl ToTokens for LinkConfig {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let serial = &self.serial;
        let radio = &self.radio;
        let timing = &self.timing;
        let tick_period_us = &self.tick_period_us;
        tokens.append_all(quote! {
            crate::config::LinkConfig {
                serial: #serial,
                radio: #radio,
                timing: #timing,
                tick_period_us: #tick_period_us,
            }
        })
    }
}

impl LinkConfig {
    fn file_tokens(&self) -> TokenStream {
        quote! {
            pub static CONFIG: crate::config::LinkConfig = #self;
        }
    }

    fn to_string_pretty(&self) -> anyhow::Result<String> {
        format::format_file(self.file_tokens())
    }

    /// Check values that the JSON schema cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        let serial = &self.serial;
        ensure!(link::BAUD_RATES.contains(&serial.baud_rate),
            "Unsupported baud rate {}", serial.baud_rate);
        ensure!(serial.tx_pin < 32 && serial.rx_pin < 32,
            "Pin numbers must be in range 0..32");
        ensure!(serial.tx_pin != serial.rx_pin, "TX and RX must use different pins");

        let radio = &self.radio;
        ensure!(radio.max_packet_len > HEADER_LEN && radio.max_packet_len <= MAX_PACKET_LEN,
            "max_packet_len must be in range {}..={}", HEADER_LEN + 1, MAX_PACKET_LEN);
        ensure!(radio.queue_depth > 0, "queue_depth must not be 0");
        ensure!(radio.channel <= MAX_CHANNEL, "channel must be <= {}", MAX_CHANNEL);
        ensure!(radio.power <= MAX_POWER, "power must be <= {}", MAX_POWER);

        ensure!(self.timing.retry_interval > 0, "retry_interval must not be 0");
        ensure!(self.timing.retry_interval.checked_mul(10).is_some(), "retry_interval too large");
        ensure!(self.tick_period_us > 0, "tick_period_us must not be 0");
        Ok(())
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let code = self.to_string_pretty()?;
        file.write_all(code.as_bytes())?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .context(format!("Could not open {}", path.display()))?;
        let mut reader = BufReader::new(file);
        let config = serde_json::from_reader(&mut reader)?;
        Ok(config)
    }

    pub fn schema() -> RootSchema {
        schema_for!(Self)
    }

    pub fn schema_to_file(path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        let schema = Self::schema();
        let string = serde_json::to_string_pretty(&schema)?;
        file.write_all(string.as_bytes())?;
        Ok(())
    }
}


/// Implement ToTokens for a simple enum with variants without data.
#[macro_export]
macro_rules! impl_enum_to_tokens {
    ( $( enum $enum:ident: $path:path ),* $(,)? ) => {
        $(
            impl ToTokens for $enum {
                fn to_tokens(&self, tokens: &mut TokenStream) {
                    let v = serde_json::to_value(self).unwrap();
                    let s = v.as_str().unwrap();
                    let i = Ident::new(s, Span::call_site());
                    tokens.append_all(quote! { $path::#i });
                }
            }
        )*
    };
}

/// Implement ToTokens for a regular struct
///
/// Generates implementations of ToTokens for a list of structs. Will use $path
/// as the name of struct in generated tokens. Each field in struct def has to
/// end with a comma (even the last one).
#[macro_export]
macro_rules! impl_struct_to_tokens {
    ( $( struct $struct:ident: $path:path { $($field:ident,)* } )* ) => {
        $(
            impl ToTokens for $struct {
                fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
                    $( let $field = &self.$field; )*
                    tokens.append_all(quote! {
                        $path { $( $field: #$field, )* }
                    });
                }
            }
        )*
    };
}
