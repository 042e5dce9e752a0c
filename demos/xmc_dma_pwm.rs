//! Streams a ramp-up/ramp-down duty cycle onto P1.3 (CCU40.OUT0) without
//! any CPU involvement after bring-up.

#![no_std]
#![no_main]

use panic_semihosting as _;

use cortex_m::asm;
use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use dma_pwm::ccu4::Ccu4Board;
use dma_pwm::{DmaStatics, PwmStream, VolatileBus, TIMER_PERIOD};

static mut STATICS: DmaStatics = DmaStatics::new();

#[entry]
fn main() -> ! {
    // Safety: this is the only bus instance, created once before anything
    // else touches the peripherals.
    let bus = unsafe { VolatileBus::new() };
    let statics = unsafe { &mut STATICS };
    let mut board = Ccu4Board::new(TIMER_PERIOD);

    match PwmStream::start(bus, &mut board, statics) {
        Ok(_stream) => {
            hprintln!("PWM stream running").unwrap();
            loop {
                asm::wfi();
            }
        }
        Err(error) => {
            hprintln!("bring-up failed: {:?}", error).ok();
            loop {
                continue;
            }
        }
    }
}
