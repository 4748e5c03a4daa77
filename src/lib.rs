#![no_std]

// Use std when running tests, see: https://stackoverflow.com/a/28186509
// Make sure to use different target when testing, e.g.
//   cargo test --target x86_64-unknown-linux-gnu
#[cfg(test)]
#[macro_use]
extern crate std;

/// Stop-and-wait retransmission engine
pub mod arq;
/// Scheduler loop connecting serial, queues, ARQ and radio
pub mod bridge;
pub mod config;
/// Radio frame encoding
pub mod packet;
pub mod queue;
pub mod radio;
pub mod serial;

/// Board support for the BBC micro:bit (nRF51822)
#[cfg(feature = "firmware")]
pub mod bsp;

#[cfg(test)]
mod sim;

/// Build metadata generated by `built`
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use bridge::Bridge;
pub use config::{LinkConfig, CONFIG};
