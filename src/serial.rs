//! Serial port capability

use embedded_hal::serial;
use heapless::Deque;

/// Byte stream endpoint as seen by the bridge
///
/// All methods must return immediately.
pub trait Serial {
    /// Check if there are received bytes waiting to be read
    fn available(&mut self) -> bool;

    /// Read up to `buf.len()` bytes, returning the number of bytes read (may be 0)
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue `data` for transmission
    fn write(&mut self, data: &[u8]);

    /// Check if `len` bytes can be written without dropping anything
    fn can_write(&self, _len: usize) -> bool {
        true
    }

    /// Move data between software buffers and hardware
    fn poll(&mut self) {}
}

/// Serial port parameters
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub tx_pin: u8,
    pub rx_pin: u8,
}

impl SerialConfig {
    /// micro:bit edge connector: RX on ring 0 (P0.03), TX on ring 1 (P0.02)
    pub const DEFAULT: Self = Self {
        baud_rate: 115_200,
        tx_pin: 2,
        rx_pin: 3,
    };
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub struct SerialStats {
    /// Received bytes dropped because the RX buffer was full
    pub rx_overruns: u32,
    /// Bytes dropped because the TX buffer was full
    pub tx_dropped: u32,
    /// Errors reported by the hardware
    pub errors: u32,
}

/// Software-buffered [`Serial`] on top of a byte-wise non-blocking UART
pub struct BufferedSerial<U, const N: usize> {
    uart: U,
    rx: Deque<u8, N>,
    tx: Deque<u8, N>,
    stats: SerialStats,
}

impl<U, const N: usize> BufferedSerial<U, N>
where
    U: serial::Read<u8> + serial::Write<u8>,
{
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            rx: Deque::new(),
            tx: Deque::new(),
            stats: SerialStats::default(),
        }
    }

    pub fn stats(&self) -> &SerialStats {
        &self.stats
    }

    pub fn free(self) -> U {
        self.uart
    }

    fn receive(&mut self) {
        loop {
            match self.uart.read() {
                Ok(byte) => if self.rx.push_back(byte).is_err() {
                    self.stats.rx_overruns = self.stats.rx_overruns.saturating_add(1);
                },
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    self.stats.errors = self.stats.errors.saturating_add(1);
                    break;
                },
            }
        }
    }

    fn transmit(&mut self) {
        while let Some(&byte) = self.tx.front() {
            match self.uart.write(byte) {
                Ok(()) => {
                    self.tx.pop_front();
                },
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    // Drop the byte, retrying would stall the queue forever
                    self.tx.pop_front();
                    self.stats.errors = self.stats.errors.saturating_add(1);
                },
            }
        }
    }
}

impl<U, const N: usize> Serial for BufferedSerial<U, N>
where
    U: serial::Read<u8> + serial::Write<u8>,
{
    fn available(&mut self) -> bool {
        self.receive();
        !self.rx.is_empty()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.rx.pop_front() {
                Some(byte) => *slot = byte,
                None => break,
            }
            n += 1;
        }
        n
    }

    fn write(&mut self, data: &[u8]) {
        for &byte in data {
            if self.tx.push_back(byte).is_err() {
                self.stats.tx_dropped = self.stats.tx_dropped.saturating_add(1);
            }
        }
        self.transmit();
    }

    fn can_write(&self, len: usize) -> bool {
        N - self.tx.len() >= len
    }

    fn poll(&mut self) {
        self.receive();
        self.transmit();
    }
}
