//! Cooperative serial <-> radio scheduler
//!
//! One [`Bridge::tick`] runs, in order: serial ingest, radio receive, serial egress
//! (only when nothing was received), new transmission and the retransmission timer.

use core::convert::Infallible;

use crate::arq::{Arq, LinkStats};
use crate::config::LinkConfig;
use crate::packet::{Packet, MAX_PACKET_LEN, MAX_PAYLOAD_LEN};
use crate::queue::{ChunkQueue, QUEUE_DEPTH};
use crate::radio::Radio;
use crate::serial::Serial;

/// Number of ticks between link statistics reports
pub const REPORT_PERIOD: u32 = 1000;

/// Periodic tick source
pub trait Ticker {
    /// Completes once per tick period
    fn wait(&mut self) -> nb::Result<(), Infallible>;
}

pub struct Bridge<S, R, const N: usize = QUEUE_DEPTH> {
    serial: S,
    radio: R,
    arq: Arq,
    outbound: ChunkQueue<N>,
    inbound: ChunkQueue<N>,
    chunk_len: usize,
    ticks: u32,
    reported: Option<LinkStats>,
}

impl<S: Serial, R: Radio, const N: usize> Bridge<S, R, N> {
    pub fn new(serial: S, radio: R, config: &LinkConfig) -> Self {
        Self {
            serial,
            radio,
            arq: Arq::with(config.timing),
            outbound: ChunkQueue::new(),
            inbound: ChunkQueue::new(),
            chunk_len: config.chunk_len(),
            ticks: 0,
            reported: None,
        }
    }

    /// Run one scheduler iteration
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);

        self.ingest();
        if !self.receive() {
            self.egress();
        }

        if let Some(packet) = self.arq.transmit(&mut self.outbound) {
            Self::send(&mut self.radio, &packet);
        }
        if let Some(packet) = self.arq.tick() {
            Self::send(&mut self.radio, &packet);
        }
    }

    /// Let collaborators move data between their buffers and hardware
    pub fn poll(&mut self) {
        self.serial.poll();
        self.radio.poll();
    }

    /// Poll collaborators and run a tick if one is due; returns true if it did
    pub fn step<T: Ticker>(&mut self, ticker: &mut T) -> bool {
        self.poll();
        match ticker.wait() {
            Ok(()) => {
                self.tick();
                if self.ticks % REPORT_PERIOD == 0 {
                    self.report();
                }
                true
            },
            Err(nb::Error::WouldBlock) => false,
            Err(nb::Error::Other(e)) => match e {},
        }
    }

    pub fn run<T: Ticker>(&mut self, ticker: &mut T) -> ! {
        loop {
            self.step(ticker);
        }
    }

    /// Log link statistics if they changed since the last report
    pub fn report(&mut self) {
        let stats = *self.arq.stats();
        if self.reported.as_ref() != Some(&stats) {
            defmt::info!("Link stats: {}", stats);
            self.reported = Some(stats);
        }
    }

    fn ingest(&mut self) {
        // Leave data in the serial buffers until there is space for it
        if self.outbound.is_full() || !self.serial.available() {
            return;
        }
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let n = self.serial.read(&mut buf[..self.chunk_len]);
        if n > 0 && !self.outbound.push_slice(&buf[..n]) {
            defmt::warn!("Outbound queue full, dropping {=usize} bytes", n);
        }
    }

    fn receive(&mut self) -> bool {
        let Some(frame) = self.radio.receive() else {
            return false;
        };
        if let Some(ack) = self.arq.on_frame(&frame, &mut self.inbound) {
            Self::send(&mut self.radio, &ack);
        }
        true
    }

    fn egress(&mut self) {
        let Some(len) = self.inbound.front().map(|chunk| chunk.len()) else {
            return;
        };
        if !self.serial.can_write(len) {
            return;
        }
        if let Some(chunk) = self.inbound.pop() {
            self.serial.write(&chunk);
        }
    }

    fn send(radio: &mut R, packet: &Packet) {
        let mut buf = [0u8; MAX_PACKET_LEN];
        match packet.to_slice(&mut buf) {
            Ok(frame) => radio.send(frame),
            Err(_) => defmt::warn!("Could not encode packet id={=u8}", packet.id()),
        }
    }

    pub fn arq(&self) -> &Arq {
        &self.arq
    }

    pub fn stats(&self) -> &LinkStats {
        self.arq.stats()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }
}
