#![no_main]
#![no_std]

use panic_probe as _;
use defmt_rtt as _;
use radiolink as lib;

#[rtic::app(device = nrf51_hal::pac, peripherals = true)]
mod app {
    use super::lib;
    use lib::bsp::{self, display, radio::NrfRadio, rtc::TickTimer, uart::Uart};
    use lib::serial::BufferedSerial;
    use lib::{Bridge, CONFIG};

    /// Serial buffer size in each direction
    const SERIAL_BUF_LEN: usize = 256;
    const STARTUP_FLASH_MS: u32 = 1000;

    type Link = Bridge<BufferedSerial<Uart, SERIAL_BUF_LEN>, NrfRadio>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        bridge: Link,
        timer: TickTimer,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let dev = cx.device;

        bsp::start_hfclk(&dev.CLOCK);

        let uart = Uart::new(dev.UART0, &dev.GPIO, &CONFIG.serial);
        let radio = NrfRadio::new(dev.RADIO, &CONFIG.radio);

        defmt::info!("Liftoff! radiolink {=str} ({=str})",
            lib::build_info::PKG_VERSION,
            lib::build_info::PROFILE,
        );
        display::flash_startup(&dev.GPIO, STARTUP_FLASH_MS);

        // Start ticking only now so that the flash does not count as link time
        let timer = TickTimer::new(dev.RTC0, &dev.CLOCK, CONFIG.tick_period_us);
        let bridge = Bridge::new(BufferedSerial::new(uart), radio, &CONFIG);

        (Shared {}, Local { bridge, timer }, init::Monotonics())
    }

    /// The whole link runs here; nothing else competes for the CPU
    #[idle(local = [bridge, timer])]
    fn idle(cx: idle::Context) -> ! {
        cx.local.bridge.run(cx.local.timer)
    }
}
