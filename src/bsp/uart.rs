use core::convert::Infallible;

use embedded_hal::serial;

use super::pac::{GPIO, UART0};
use crate::serial::SerialConfig;

/// UART reception error, from the ERRORSRC register
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Error {
    Overrun,
    Parity,
    Framing,
    Break,
}

impl Error {
    fn from_source(src: u32) -> Self {
        match src {
            s if s & 0b0001 != 0 => Error::Overrun,
            s if s & 0b0010 != 0 => Error::Parity,
            s if s & 0b0100 != 0 => Error::Framing,
            _ => Error::Break,
        }
    }
}

/// BAUDRATE register value for a given baud rate
fn baud_register(baud_rate: u32) -> Option<u32> {
    Some(match baud_rate {
        1200 => 0x0004_F000,
        2400 => 0x0009_D000,
        4800 => 0x0013_B000,
        9600 => 0x0027_5000,
        14400 => 0x003B_0000,
        19200 => 0x004E_A000,
        28800 => 0x0075_F000,
        38400 => 0x009D_5000,
        57600 => 0x00EB_F000,
        76800 => 0x013A_9000,
        115200 => 0x01D7_E000,
        230400 => 0x03AF_B000,
        250000 => 0x0400_0000,
        460800 => 0x075F_7000,
        921600 => 0x0EBE_DFA4,
        1_000_000 => 0x1000_0000,
        _ => return None,
    })
}

/// UART0 without flow control, one byte at a time
pub struct Uart {
    uart: UART0,
    tx_busy: bool,
}

impl Uart {
    pub fn new(uart: UART0, gpio: &GPIO, config: &SerialConfig) -> Self {
        let (tx, rx) = (config.tx_pin as usize, config.rx_pin as usize);

        // Keep TX idle-high before the peripheral takes over the pin
        gpio.outset.write(|w| unsafe { w.bits(1 << tx) });
        gpio.pin_cnf[tx].write(|w| w.pull().pullup().dir().output());
        gpio.pin_cnf[rx].write(|w| w.pull().disabled().dir().input());

        let baud = baud_register(config.baud_rate).unwrap_or_else(|| {
            defmt::warn!("Unsupported baud rate {=u32}, using 115200", config.baud_rate);
            0x01D7_E000
        });

        uart.pseltxd.write(|w| unsafe { w.bits(tx as u32) });
        uart.pselrxd.write(|w| unsafe { w.bits(rx as u32) });
        uart.baudrate.write(|w| unsafe { w.bits(baud) });
        uart.enable.write(|w| w.enable().enabled());

        uart.events_rxdrdy.write(|w| unsafe { w.bits(0) });
        uart.events_txdrdy.write(|w| unsafe { w.bits(0) });
        uart.tasks_startrx.write(|w| unsafe { w.bits(1) });
        uart.tasks_starttx.write(|w| unsafe { w.bits(1) });

        defmt::debug!("UART initialized: tx={=usize} rx={=usize} baud={=u32}", tx, rx, config.baud_rate);
        Self { uart, tx_busy: false }
    }
}

impl serial::Read<u8> for Uart {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.uart.events_error.read().bits() != 0 {
            self.uart.events_error.write(|w| unsafe { w.bits(0) });
            let src = self.uart.errorsrc.read().bits();
            // Flags are cleared by writing 1
            self.uart.errorsrc.write(|w| unsafe { w.bits(src) });
            return Err(nb::Error::Other(Error::from_source(src)));
        }
        if self.uart.events_rxdrdy.read().bits() == 0 {
            return Err(nb::Error::WouldBlock);
        }
        // Event must be cleared before reading RXD
        self.uart.events_rxdrdy.write(|w| unsafe { w.bits(0) });
        Ok(self.uart.rxd.read().bits() as u8)
    }
}

impl serial::Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.flush()?;
        self.uart.txd.write(|w| unsafe { w.bits(word as u32) });
        self.tx_busy = true;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.tx_busy {
            if self.uart.events_txdrdy.read().bits() == 0 {
                return Err(nb::Error::WouldBlock);
            }
            self.uart.events_txdrdy.write(|w| unsafe { w.bits(0) });
            self.tx_busy = false;
        }
        Ok(())
    }
}
