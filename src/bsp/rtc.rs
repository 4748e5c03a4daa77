use core::convert::Infallible;

use super::pac::{CLOCK, RTC0};
use crate::bridge::Ticker;

const LFCLK_HZ: u64 = 32_768;
const MAX_PRESCALER: u32 = 0xFFF;

/// Periodic tick from RTC0, polled without interrupts
pub struct TickTimer {
    rtc: RTC0,
}

impl TickTimer {
    /// Start ticking with a period as close to `period_us` as the 32 kHz clock allows
    pub fn new(rtc: RTC0, clock: &CLOCK, period_us: u32) -> Self {
        super::start_lfclk(clock);

        let prescaler = Self::prescaler(period_us);
        rtc.tasks_stop.write(|w| unsafe { w.bits(1) });
        rtc.prescaler.write(|w| unsafe { w.bits(prescaler) });
        rtc.evtenset.write(|w| w.tick().set());
        rtc.events_tick.write(|w| unsafe { w.bits(0) });
        rtc.tasks_start.write(|w| unsafe { w.bits(1) });

        defmt::info!("Tick timer started: prescaler={=u32}", prescaler);
        Self { rtc }
    }

    fn prescaler(period_us: u32) -> u32 {
        let divider = (LFCLK_HZ * period_us as u64 + 500_000) / 1_000_000;
        (divider.saturating_sub(1) as u32).min(MAX_PRESCALER)
    }
}

impl Ticker for TickTimer {
    fn wait(&mut self) -> nb::Result<(), Infallible> {
        if self.rtc.events_tick.read().bits() == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.rtc.events_tick.write(|w| unsafe { w.bits(0) });
        Ok(())
    }
}
