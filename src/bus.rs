//! Access to memory-mapped registers and DMA-visible memory.

use core::sync::atomic::{self, Ordering};

use crate::traits::DmaReadBuffer;

/// Everything the driver does to the outside world goes through a `Bus`.
///
/// Register writes are the only register access the driver performs; it
/// keeps its own copy of any register it has to update field by field.
pub trait Bus {
    /// Write one 32-bit peripheral register.
    fn write(&mut self, address: u32, value: u32);

    /// Bus address at which the DMA engine sees `buffer`.
    ///
    /// Must return the same address for the same buffer every time.
    fn locate<D: DmaReadBuffer>(&mut self, buffer: &D) -> u32;

    /// Make the current contents of `buffer` visible to the DMA engine.
    ///
    /// Called once the buffer is final and before any channel that reads
    /// it is enabled.
    fn publish<D: DmaReadBuffer>(&mut self, buffer: &D);
}

impl<T: Bus + ?Sized> Bus for &mut T {
    fn write(&mut self, address: u32, value: u32) {
        (**self).write(address, value)
    }

    fn locate<D: DmaReadBuffer>(&mut self, buffer: &D) -> u32 {
        (**self).locate(buffer)
    }

    fn publish<D: DmaReadBuffer>(&mut self, buffer: &D) {
        (**self).publish(buffer)
    }
}

/// The real system bus of a 32-bit target.
pub struct VolatileBus(());

impl VolatileBus {
    /// # Safety
    ///
    /// Only one `VolatileBus` may exist, and nothing else may touch GPDMA0,
    /// the DMA line router, CCU40 or the affected SCU reset bits while it
    /// does. Addresses handed to `write` must be valid register addresses.
    pub unsafe fn new() -> Self {
        VolatileBus(())
    }
}

impl Bus for VolatileBus {
    fn write(&mut self, address: u32, value: u32) {
        // Safety: guaranteed by the contract of `VolatileBus::new`.
        unsafe { core::ptr::write_volatile(address as usize as *mut u32, value) }
    }

    fn locate<D: DmaReadBuffer>(&mut self, buffer: &D) -> u32 {
        let (ptr, _) = buffer.dma_read_buffer();
        ptr as *const u8 as usize as u32
    }

    fn publish<D: DmaReadBuffer>(&mut self, _buffer: &D) {
        // The engine reads the buffer in place. Prevent preceding writes to
        // it from being moved past the channel enable that follows.
        atomic::compiler_fence(Ordering::Release);
    }
}

/// Bus double that only records register writes.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct Recorder {
    pub writes: heapless::Vec<(u32, u32), 64>,
}

#[cfg(test)]
impl Bus for Recorder {
    fn write(&mut self, address: u32, value: u32) {
        self.writes.push((address, value)).unwrap();
    }

    fn locate<D: DmaReadBuffer>(&mut self, _buffer: &D) -> u32 {
        0
    }

    fn publish<D: DmaReadBuffer>(&mut self, _buffer: &D) {}
}
