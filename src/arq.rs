//! Stop-and-wait ARQ engine
//!
//! At most one data packet is in flight at any time. It is retransmitted every
//! `retry_interval` ticks until the matching acknowledgement arrives or until
//! [`Timing::GIVE_UP_RATIO`] retry intervals have elapsed, at which point the
//! payload is dropped. On the receive side only the id of the last accepted
//! packet is remembered, so a retransmission is suppressed only if nothing else
//! was accepted in between.

use smlang::statemachine;

use crate::packet::{Packet, PacketId};
use crate::queue::{Chunk, ChunkQueue};

pub type Arq = StateMachine<Context>;

statemachine! {
    transitions: {
        *Idle + Transmit [has_pending] / send_data = WaitingAck,

        WaitingAck + Ack [ack_matches] / release = Idle,
        WaitingAck + Retry / resend_data = WaitingAck,
        WaitingAck + GiveUp / give_up = Idle,
    }
}

/// Retransmission timing in scheduler ticks
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Timing {
    retry_interval: u32,
    give_up_after: u32,
}

impl Timing {
    /// Number of retry intervals after which an unacknowledged packet is dropped
    pub const GIVE_UP_RATIO: u32 = 10;

    pub const fn new(retry_interval: u32) -> Self {
        let retry_interval = if retry_interval == 0 { 1 } else { retry_interval };
        Self {
            retry_interval,
            give_up_after: retry_interval.saturating_mul(Self::GIVE_UP_RATIO),
        }
    }

    pub const fn retry_interval(&self) -> u32 {
        self.retry_interval
    }

    pub const fn give_up_after(&self) -> u32 {
        self.give_up_after
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Packet waiting for acknowledgement
#[derive(Debug, PartialEq)]
pub struct InFlight {
    pub id: PacketId,
    pub payload: Chunk,
    /// Ticks since the first transmission
    pub elapsed: u32,
}

/// Link counters, for diagnostics only
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub struct LinkStats {
    /// New data packets sent
    pub sent: u32,
    pub retransmitted: u32,
    /// Data packets confirmed by the peer
    pub acked: u32,
    /// Data packets dropped after exhausting retries
    pub gave_up: u32,
    /// Received data packets passed to the inbound queue
    pub accepted: u32,
    pub duplicates: u32,
    pub acks_sent: u32,
    pub unrecognized: u32,
    /// Received data packets refused because the inbound queue was full
    pub refused: u32,
}

fn inc(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

pub struct Context {
    timing: Timing,
    next_id: PacketId,
    in_flight: Option<InFlight>,
    // Chunk handed over to `send_data`
    pending: Option<Chunk>,
    // Id of the acknowledgement being processed
    ack_id: Option<PacketId>,
    // Set when the in-flight packet has to go on air
    emit: bool,
    last_accepted: Option<PacketId>,
    stats: LinkStats,
}

impl StateMachineContext for Context {
    fn has_pending(&mut self) -> Result<(), ()> {
        if self.pending.is_some() { Ok(()) } else { Err(()) }
    }

    fn send_data(&mut self) {
        let Some(payload) = self.pending.take() else {
            return;
        };
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        defmt::debug!("Send data id={=u8} len={=usize}", id, payload.len());
        let prev = self.in_flight.replace(InFlight { id, payload, elapsed: 0 });
        debug_assert!(prev.is_none(), "Send slot occupied");
        self.emit = true;
        inc(&mut self.stats.sent);
    }

    fn ack_matches(&mut self) -> Result<(), ()> {
        match (&self.in_flight, self.ack_id) {
            (Some(packet), Some(id)) if packet.id == id => Ok(()),
            _ => Err(()),
        }
    }

    fn release(&mut self) {
        if let Some(packet) = self.in_flight.take() {
            defmt::debug!("Acked id={=u8} after {=u32} ticks", packet.id, packet.elapsed);
        }
        inc(&mut self.stats.acked);
    }

    fn resend_data(&mut self) {
        if let Some(packet) = &self.in_flight {
            defmt::debug!("Retransmit id={=u8} at {=u32}", packet.id, packet.elapsed);
        }
        self.emit = true;
        inc(&mut self.stats.retransmitted);
    }

    fn give_up(&mut self) {
        if let Some(packet) = self.in_flight.take() {
            defmt::warn!("No ack for id={=u8}, dropping {=usize} bytes", packet.id, packet.payload.len());
        }
        inc(&mut self.stats.gave_up);
    }
}

impl StateMachine<Context> {
    /// Construct the engine in idle state with the first packet id 0
    pub fn with(timing: Timing) -> Self {
        Self::new(Context {
            timing,
            next_id: 0,
            in_flight: None,
            pending: None,
            ack_id: None,
            emit: false,
            last_accepted: None,
            stats: LinkStats::default(),
        })
    }

    /// Handle a frame received from the radio
    ///
    /// Returns an acknowledgement to be sent back, if any. Data that cannot be
    /// stored in `inbound` is not acknowledged so that the peer retransmits it.
    pub fn on_frame<const N: usize>(
        &mut self,
        frame: &[u8],
        inbound: &mut ChunkQueue<N>,
    ) -> Option<Packet<'static>> {
        match Packet::decode(frame) {
            Ok(Packet::Ack { id }) => {
                self.on_ack(id);
                None
            },
            Ok(Packet::Data { id, payload }) => self.on_data(id, payload, inbound),
            Err(_) => {
                defmt::trace!("Dropping unrecognized frame of {=usize} bytes", frame.len());
                inc(&mut self.context.stats.unrecognized);
                None
            },
        }
    }

    fn on_data<const N: usize>(
        &mut self,
        id: PacketId,
        payload: &[u8],
        inbound: &mut ChunkQueue<N>,
    ) -> Option<Packet<'static>> {
        let ctx = &mut self.context;
        if ctx.last_accepted == Some(id) {
            defmt::debug!("Duplicate data id={=u8}", id);
            inc(&mut ctx.stats.duplicates);
        } else {
            let Ok(chunk) = Chunk::from_slice(payload) else {
                inc(&mut ctx.stats.unrecognized);
                return None;
            };
            if inbound.push(chunk).is_err() {
                defmt::warn!("Inbound queue full, not acking id={=u8}", id);
                inc(&mut ctx.stats.refused);
                return None;
            }
            defmt::trace!("Accepted data id={=u8} len={=usize}", id, payload.len());
            ctx.last_accepted = Some(id);
            inc(&mut ctx.stats.accepted);
        }
        inc(&mut ctx.stats.acks_sent);
        Some(Packet::Ack { id })
    }

    /// Handle an acknowledgement; anything but the in-flight id is ignored
    pub fn on_ack(&mut self, id: PacketId) {
        self.context.ack_id = Some(id);
        if self.process_event(Events::Ack).is_err() {
            defmt::trace!("Ignoring ack id={=u8}", id);
        }
        self.context.ack_id = None;
    }

    /// Start sending the next chunk from `outbound` if nothing is in flight
    pub fn transmit<const N: usize>(&mut self, outbound: &mut ChunkQueue<N>) -> Option<Packet<'_>> {
        if !self.is_idle() {
            return None;
        }
        self.context.pending = Some(outbound.pop()?);
        self.process_event(Events::Transmit).ok();
        self.take_emitted()
    }

    /// Advance time by one tick, may return a retransmission
    pub fn tick(&mut self) -> Option<Packet<'_>> {
        let timing = self.context.timing;
        let packet = self.context.in_flight.as_mut()?;
        packet.elapsed += 1;
        let elapsed = packet.elapsed;

        if elapsed >= timing.give_up_after {
            self.process_event(Events::GiveUp).ok();
            None
        } else if elapsed % timing.retry_interval == 0 {
            self.process_event(Events::Retry).ok();
            self.take_emitted()
        } else {
            None
        }
    }

    fn take_emitted(&mut self) -> Option<Packet<'_>> {
        if !core::mem::take(&mut self.context.emit) {
            return None;
        }
        self.context.in_flight.as_ref()
            .map(|packet| Packet::Data { id: packet.id, payload: &packet.payload })
    }

    pub fn is_idle(&self) -> bool {
        matches!(*self.state(), States::Idle)
    }

    pub fn is_waiting(&self) -> bool {
        matches!(*self.state(), States::WaitingAck)
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.context.in_flight.as_ref()
    }

    /// Id that will be assigned to the next new data packet
    pub fn next_id(&self) -> PacketId {
        self.context.next_id
    }

    pub fn last_accepted_id(&self) -> Option<PacketId> {
        self.context.last_accepted
    }

    pub fn timing(&self) -> Timing {
        self.context.timing
    }

    pub fn stats(&self) -> &LinkStats {
        &self.context.stats
    }
}
