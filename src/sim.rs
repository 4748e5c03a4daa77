//! Deterministic simulation of two bridges connected over a lossy radio channel
//!
//! Connects endpoints as follows:
//!   left radio -> left_to_right -> right radio
//!   left radio <- right_to_left <- right radio
//! Time advances by one tick per [`Network::tick`]. A frame sent during tick `t`
//! can be received from tick `t + latency` on.

use std::boxed::Box;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::arq::Timing;
use crate::bridge::Bridge;
use crate::config::{LinkConfig, CONFIG};
use crate::packet::Frame;
use crate::radio::Radio;
use crate::serial::Serial;

type Clock = Rc<Cell<u32>>;
type DropFilter = Box<dyn FnMut(usize, &[u8]) -> bool>;

/// One direction of the radio channel
pub struct Wire {
    clock: Clock,
    in_transit: VecDeque<(u32, Frame)>,
    sent: Vec<Vec<u8>>,
    filter: Option<DropFilter>,
    latency: u32,
    reorder: bool,
}

impl Wire {
    fn new(clock: Clock) -> Self {
        Self {
            clock,
            in_transit: VecDeque::new(),
            sent: Vec::new(),
            filter: None,
            latency: 1,
            reorder: false,
        }
    }

    /// Drop frames for which `filter(index, frame)` returns true; index counts all frames sent
    pub fn drop_when(&mut self, filter: impl FnMut(usize, &[u8]) -> bool + 'static) {
        self.filter = Some(Box::new(filter));
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    pub fn set_latency(&mut self, ticks: u32) {
        self.latency = ticks;
    }

    /// Deliver the newest ready frame first
    pub fn set_reorder(&mut self, reorder: bool) {
        self.reorder = reorder;
    }

    /// Put a frame on the wire that can be received immediately, bypassing the filter
    pub fn inject(&mut self, frame: &[u8]) {
        let frame = Frame::from_slice(frame).expect("Frame too long");
        self.in_transit.push_back((self.clock.get(), frame));
    }

    /// All frames sent by the endpoint, including dropped ones
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn is_empty(&self) -> bool {
        self.in_transit.is_empty()
    }

    fn push(&mut self, frame: &[u8]) {
        let index = self.sent.len();
        self.sent.push(frame.to_vec());
        if self.filter.as_mut().map_or(false, |f| f(index, frame)) {
            return;
        }
        let frame = Frame::from_slice(frame).expect("Frame too long");
        self.in_transit.push_back((self.clock.get() + self.latency, frame));
    }

    fn pop(&mut self) -> Option<Frame> {
        let now = self.clock.get();
        let ready = |(at, _): &(u32, Frame)| *at <= now;
        let pos = if self.reorder {
            self.in_transit.iter().rposition(ready)?
        } else {
            self.in_transit.iter().position(ready)?
        };
        self.in_transit.remove(pos).map(|(_, frame)| frame)
    }
}

pub struct SimRadio {
    tx: Rc<RefCell<Wire>>,
    rx: Rc<RefCell<Wire>>,
}

impl Radio for SimRadio {
    fn send(&mut self, frame: &[u8]) {
        self.tx.borrow_mut().push(frame);
    }

    fn receive(&mut self) -> Option<Frame> {
        self.rx.borrow_mut().pop()
    }
}

#[derive(Default)]
pub struct SerialState {
    input: VecDeque<u8>,
    output: Vec<u8>,
    blocked: bool,
}

#[derive(Clone, Default)]
pub struct SimSerial(Rc<RefCell<SerialState>>);

impl Serial for SimSerial {
    fn available(&mut self) -> bool {
        !self.0.borrow().input.is_empty()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut state = self.0.borrow_mut();
        let n = buf.len().min(state.input.len());
        for (slot, byte) in buf.iter_mut().zip(state.input.drain(..n)) {
            *slot = byte;
        }
        n
    }

    fn write(&mut self, data: &[u8]) {
        let mut state = self.0.borrow_mut();
        assert!(!state.blocked, "Write while serial is blocked");
        state.output.extend_from_slice(data);
    }

    fn can_write(&self, _len: usize) -> bool {
        !self.0.borrow().blocked
    }
}

pub struct Node {
    pub bridge: Bridge<SimSerial, SimRadio>,
    serial: SimSerial,
}

impl Node {
    /// Make bytes available on the serial input
    pub fn input(&self, data: &[u8]) {
        self.serial.0.borrow_mut().input.extend(data.iter().copied());
    }

    /// Everything written to serial so far
    pub fn output(&self) -> Vec<u8> {
        self.serial.0.borrow().output.clone()
    }

    /// Bytes not yet read from the serial input
    pub fn pending_input(&self) -> usize {
        self.serial.0.borrow().input.len()
    }

    pub fn set_writable(&self, writable: bool) {
        self.serial.0.borrow_mut().blocked = !writable;
    }

    fn is_settled(&self) -> bool {
        self.pending_input() == 0
            && self.bridge.outbound_len() == 0
            && self.bridge.inbound_len() == 0
            && self.bridge.arq().is_idle()
    }
}

pub struct Network {
    pub left: Node,
    pub right: Node,
    pub left_to_right: Rc<RefCell<Wire>>,
    pub right_to_left: Rc<RefCell<Wire>>,
    clock: Clock,
}

impl Network {
    pub fn new(timing: Timing) -> Self {
        let config = LinkConfig { timing, ..CONFIG };
        let clock = Clock::default();
        let left_to_right = Rc::new(RefCell::new(Wire::new(Rc::clone(&clock))));
        let right_to_left = Rc::new(RefCell::new(Wire::new(Rc::clone(&clock))));
        let node = |tx: &Rc<RefCell<Wire>>, rx: &Rc<RefCell<Wire>>| {
            let serial = SimSerial::default();
            let radio = SimRadio { tx: Rc::clone(tx), rx: Rc::clone(rx) };
            Node { bridge: Bridge::new(serial.clone(), radio, &config), serial }
        };
        Self {
            left: node(&left_to_right, &right_to_left),
            right: node(&right_to_left, &left_to_right),
            left_to_right,
            right_to_left,
            clock,
        }
    }

    pub fn now(&self) -> u32 {
        self.clock.get()
    }

    pub fn tick(&mut self) {
        self.left.bridge.tick();
        self.right.bridge.tick();
        self.clock.set(self.clock.get() + 1);
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Tick until `done` returns true, returns false if it did not within `max_ticks`
    pub fn run_until(&mut self, max_ticks: u32, done: impl Fn(&Self) -> bool) -> bool {
        for _ in 0..max_ticks {
            if done(self) {
                return true;
            }
            self.tick();
        }
        done(self)
    }

    /// Nothing left to deliver in either direction
    pub fn is_settled(&self) -> bool {
        self.left.is_settled()
            && self.right.is_settled()
            && self.left_to_right.borrow().is_empty()
            && self.right_to_left.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_delays_delivery() {
        let clock = Clock::default();
        let mut wire = Wire::new(Rc::clone(&clock));
        wire.set_latency(3);
        wire.push(b"a1");
        clock.set(2);
        assert!(wire.pop().is_none());
        clock.set(3);
        assert_eq!(&wire.pop().unwrap()[..], b"a1");
    }

    #[test]
    fn filter_sees_every_frame() {
        let mut wire = Wire::new(Clock::default());
        wire.set_latency(0);
        wire.drop_when(|i, _| i % 2 == 0);
        for f in [b"a0", b"a1", b"a2", b"a3"] {
            wire.push(f);
        }
        assert_eq!(wire.sent().len(), 4);
        assert_eq!(&wire.pop().unwrap()[..], b"a1");
        assert_eq!(&wire.pop().unwrap()[..], b"a3");
        assert!(wire.pop().is_none());
    }

    #[test]
    fn reorder_delivers_newest_first() {
        let mut wire = Wire::new(Clock::default());
        wire.set_reorder(true);
        wire.inject(b"a1");
        wire.inject(b"a2");
        assert_eq!(&wire.pop().unwrap()[..], b"a2");
        assert_eq!(&wire.pop().unwrap()[..], b"a1");
    }

    #[test]
    fn settles_when_idle() {
        let mut net = Network::new(Timing::default());
        assert!(net.is_settled());
        net.left.input(b"x");
        assert!(!net.is_settled());
        assert!(net.run_until(100, |net| net.is_settled()));
        assert!(net.now() < 100);
    }
}
