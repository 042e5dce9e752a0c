//! Double-buffered DMA into a CCU4 compare register.
//!
//! GPDMA0 channel 0 walks a two-node descriptor ring, feeding an ascending
//! and a descending ramp of compare values into CCU40 slice 0, one value
//! per timer period. Channel 1 answers the same request by writing the
//! slice's shadow transfer bit, so every new compare value is latched at
//! the next period boundary. After [`PwmStream::start`] returns the CPU is
//! not involved anymore.

#![cfg_attr(not(test), no_std)]

pub mod bringup;
pub mod bus;
pub mod ccu4;
pub mod config;
pub mod gpdma;
pub mod ring;
mod traits;
pub mod waveform;

pub use bringup::{Board, BringUpError, DmaStatics, PwmStream};
pub use bus::{Bus, VolatileBus};
pub use gpdma::HardwareConfigError;
pub use traits::{dma_bytes, DmaReadBuffer, DmaTarget};

/// Compare values per ramp, and words per DMA block.
pub const BLOCK_SIZE: usize = 48;

/// Timer period in ticks.
pub const TIMER_PERIOD: u32 = 65535;

/// Step between neighbouring compare values.
pub const COMPARE_BLOCK: u32 = TIMER_PERIOD / BLOCK_SIZE as u32;

/// Channel walking the descriptor ring.
pub const PRIMARY_CHANNEL: u8 = 0;

/// Channel pulsing the shadow transfer request.
pub const SHADOW_CHANNEL: u8 = 1;

/// Timer slice the compare values are streamed into.
pub const PWM_SLICE: ccu4::Slice = ccu4::Slice::CC40;
