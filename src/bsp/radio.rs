use core::sync::atomic::{compiler_fence, Ordering};

use heapless::Deque;

use super::pac::RADIO;
use crate::packet::{Frame, MAX_PACKET_LEN};
use crate::radio::{DataRate, Radio, RadioConfig};

/// Upper bound for [`RadioConfig::queue_depth`]
pub const RX_QUEUE_LEN: usize = 16;
const TX_QUEUE_LEN: usize = 4;

/// TXPOWER register values for power levels 0..=7 (-30 dBm to +4 dBm)
const TX_POWER: [u8; 8] = [0xD8, 0xEC, 0xF0, 0xF4, 0xF8, 0xFC, 0x00, 0x04];

/// Trigger a task
macro_rules! trigger {
    ($reg:expr) => {
        $reg.write(|w| unsafe { w.bits(1) })
    };
}

/// Check and clear an event
macro_rules! take_event {
    ($reg:expr) => {{
        let set = $reg.read().bits() != 0;
        if set {
            $reg.write(|w| unsafe { w.bits(0) });
        }
        set
    }};
}

#[derive(Clone, Copy, PartialEq, Eq, defmt::Format)]
enum State {
    /// Not started yet, see [`NrfRadio::poll`]
    Off,
    Rx,
    /// Leaving RX to transmit queued frames
    RxDisable,
    Tx,
    /// Leaving TX to go back to RX
    TxDisable,
}

/// nRF51 RADIO in the micro:bit compatible packet format
///
/// On air: 8-bit length field, payload, CRC16. Receiving is the default state,
/// queued frames are sent between receptions.
pub struct NrfRadio {
    radio: RADIO,
    state: State,
    // Length byte followed by the payload, used by EasyDMA in both directions
    buf: [u8; MAX_PACKET_LEN + 1],
    max_len: usize,
    rx_depth: usize,
    rx_queue: Deque<Frame, RX_QUEUE_LEN>,
    tx_queue: Deque<Frame, TX_QUEUE_LEN>,
    rx_dropped: u32,
    crc_errors: u32,
}

impl NrfRadio {
    /// Configure the peripheral; HFCLK must already be running
    pub fn new(radio: RADIO, config: &RadioConfig) -> Self {
        let max_len = (config.max_packet_len as usize).min(MAX_PACKET_LEN);
        let power = TX_POWER[(config.power as usize).min(TX_POWER.len() - 1)];
        let mode = match config.data_rate {
            DataRate::Nrf1Mbit => 0,
            DataRate::Nrf2Mbit => 1,
            DataRate::Nrf250Kbit => 2,
        };

        unsafe {
            radio.txpower.write(|w| w.bits(power as u32));
            radio.frequency.write(|w| w.bits(config.channel as u32));
            radio.mode.write(|w| w.bits(mode));

            radio.base0.write(|w| w.bits(config.address));
            radio.prefix0.write(|w| w.bits(config.group as u32));
            radio.txaddress.write(|w| w.bits(0));
            radio.rxaddresses.write(|w| w.bits(1));

            // LFLEN=8 bits, no S0/S1
            radio.pcnf0.write(|w| w.bits(8));
            // MAXLEN, BALEN=4, little endian, whitening on
            radio.pcnf1.write(|w| w.bits(max_len as u32 | (4 << 16) | (1 << 25)));

            radio.crccnf.write(|w| w.bits(2));
            radio.crcinit.write(|w| w.bits(0xFFFF));
            radio.crcpoly.write(|w| w.bits(0x11021));
            radio.datawhiteiv.write(|w| w.bits(0x18));

            // READY -> START
            radio.shorts.write(|w| w.bits(1));
        }

        defmt::debug!("Radio initialized: channel={=u8} power={=u8} max_len={=usize}",
            config.channel, config.power, max_len);

        Self {
            radio,
            state: State::Off,
            buf: [0; MAX_PACKET_LEN + 1],
            max_len,
            rx_depth: (config.queue_depth as usize).clamp(1, RX_QUEUE_LEN),
            rx_queue: Deque::new(),
            tx_queue: Deque::new(),
            rx_dropped: 0,
            crc_errors: 0,
        }
    }

    /// Frames dropped because the receive queue was full
    pub fn rx_dropped(&self) -> u32 {
        self.rx_dropped
    }

    pub fn crc_errors(&self) -> u32 {
        self.crc_errors
    }

    // The driver may be moved after construction, so the DMA pointer is
    // refreshed every time before the radio is started.
    fn set_packet_ptr(&mut self) {
        let ptr = self.buf.as_mut_ptr() as u32;
        self.radio.packetptr.write(|w| unsafe { w.bits(ptr) });
        compiler_fence(Ordering::SeqCst);
    }

    fn start_rx(&mut self) {
        self.set_packet_ptr();
        trigger!(self.radio.tasks_rxen);
    }

    /// Copy the next queued frame into the DMA buffer
    fn load_tx(&mut self) -> bool {
        let Some(frame) = self.tx_queue.pop_front() else {
            return false;
        };
        let len = frame.len().min(self.max_len);
        self.buf[0] = len as u8;
        self.buf[1..=len].copy_from_slice(&frame[..len]);
        self.set_packet_ptr();
        true
    }

    fn finish_rx(&mut self) {
        compiler_fence(Ordering::SeqCst);
        if !self.radio.crcstatus.read().crcstatus().is_crcok() {
            self.crc_errors = self.crc_errors.saturating_add(1);
            return;
        }
        let len = (self.buf[0] as usize).min(self.max_len);
        if self.rx_queue.len() >= self.rx_depth {
            self.rx_dropped = self.rx_dropped.saturating_add(1);
            defmt::trace!("Radio RX queue full, dropping frame");
            return;
        }
        if let Ok(frame) = Frame::from_slice(&self.buf[1..=len]) {
            self.rx_queue.push_back(frame).ok();
        }
    }
}

impl Radio for NrfRadio {
    fn send(&mut self, frame: &[u8]) {
        let Ok(frame) = Frame::from_slice(frame) else {
            defmt::warn!("Frame too long: {=usize}", frame.len());
            return;
        };
        if self.tx_queue.push_back(frame).is_err() {
            defmt::warn!("Radio TX queue full, dropping frame");
        }
    }

    fn receive(&mut self) -> Option<Frame> {
        self.rx_queue.pop_front()
    }

    fn poll(&mut self) {
        self.state = match self.state {
            State::Off => {
                self.start_rx();
                State::Rx
            },
            State::Rx => {
                if take_event!(self.radio.events_end) {
                    self.radio.events_address.write(|w| unsafe { w.bits(0) });
                    self.finish_rx();
                    if self.tx_queue.is_empty() {
                        // Radio waits in RXIDLE, restart reception
                        self.set_packet_ptr();
                        trigger!(self.radio.tasks_start);
                        State::Rx
                    } else {
                        trigger!(self.radio.tasks_disable);
                        State::RxDisable
                    }
                } else if !self.tx_queue.is_empty() && self.radio.events_address.read().bits() == 0 {
                    // Not in the middle of a reception
                    trigger!(self.radio.tasks_disable);
                    State::RxDisable
                } else {
                    State::Rx
                }
            },
            State::RxDisable => {
                if take_event!(self.radio.events_disabled) {
                    if self.load_tx() {
                        trigger!(self.radio.tasks_txen);
                        State::Tx
                    } else {
                        self.start_rx();
                        State::Rx
                    }
                } else {
                    State::RxDisable
                }
            },
            State::Tx => {
                if take_event!(self.radio.events_end) {
                    self.radio.events_address.write(|w| unsafe { w.bits(0) });
                    if self.load_tx() {
                        // Radio waits in TXIDLE, send the next one right away
                        trigger!(self.radio.tasks_start);
                        State::Tx
                    } else {
                        trigger!(self.radio.tasks_disable);
                        State::TxDisable
                    }
                } else {
                    State::Tx
                }
            },
            State::TxDisable => {
                if take_event!(self.radio.events_disabled) {
                    self.start_rx();
                    State::Rx
                } else {
                    State::TxDisable
                }
            },
        };
    }
}
