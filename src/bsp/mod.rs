/// Startup indicator on the LED matrix
pub mod display;
/// RADIO peripheral as a [`crate::radio::Radio`]
pub mod radio;
/// Scheduler tick source
pub mod rtc;
/// Byte-wise UART0 driver
pub mod uart;

pub use nrf51_hal::pac;

/// Start the external 16 MHz crystal, the radio does not work from the RC oscillator
pub fn start_hfclk(clock: &pac::CLOCK) {
    clock.events_hfclkstarted.write(|w| unsafe { w.bits(0) });
    clock.tasks_hfclkstart.write(|w| unsafe { w.bits(1) });
    while clock.events_hfclkstarted.read().bits() == 0 {}
    defmt::debug!("HFCLK started");
}

/// Start the 32 kHz clock used by the RTC
pub fn start_lfclk(clock: &pac::CLOCK) {
    clock.events_lfclkstarted.write(|w| unsafe { w.bits(0) });
    clock.tasks_lfclkstart.write(|w| unsafe { w.bits(1) });
    while clock.events_lfclkstarted.read().bits() == 0 {}
    defmt::debug!("LFCLK started");
}
