use super::pac::GPIO;

/// LED matrix rows (P0.13..=P0.15)
const ROWS: u32 = 0b111 << 13;
/// LED matrix columns (P0.04..=P0.12)
const COLS: u32 = 0x1FF << 4;
const ROW2: u32 = 1 << 14;
const COL3: u32 = 1 << 6;

/// Core runs from the 16 MHz clock
const CYCLES_PER_MS: u32 = 16_000;

/// Light the centre LED for `duration_ms`, then turn the matrix off
///
/// Blocks; meant to be used once during init to show that the firmware is alive.
pub fn flash_startup(gpio: &GPIO, duration_ms: u32) {
    // LEDs are lit when the row is high and the column is low
    gpio.outclr.write(|w| unsafe { w.bits(ROWS) });
    gpio.outset.write(|w| unsafe { w.bits(COLS) });
    gpio.dirset.write(|w| unsafe { w.bits(ROWS | COLS) });

    gpio.outset.write(|w| unsafe { w.bits(ROW2) });
    gpio.outclr.write(|w| unsafe { w.bits(COL3) });

    for _ in 0..duration_ms {
        cortex_m::asm::delay(CYCLES_PER_MS);
    }

    gpio.outclr.write(|w| unsafe { w.bits(ROWS) });
    gpio.outset.write(|w| unsafe { w.bits(COLS) });
}
