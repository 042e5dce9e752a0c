//! `unsafe` traits for memory the DMA engine reads from.
//!
//! Everything the GPDMA fetches on its own (compare buffers, the commit
//! word, the descriptor ring) is handed out through `DmaReadBuffer`. The
//! trait only guarantees that the pointer is stable and the memory is
//! readable; the `'static` requirement is enforced by `PwmStream::start`,
//! which only accepts `&'static mut DmaStatics`.

use as_slice::AsSlice;
use core::{mem, ops::Deref};
use stable_deref_trait::StableDeref;

/// Trait for buffers that can be given to DMA for reading.
///
/// # Safety
///
/// The implementing type must be safe to use for DMA reads. This means:
///
/// - It must be a pointer that references the actual buffer.
/// - The requirements documented on `dma_read_buffer` must be fulfilled.
pub unsafe trait DmaReadBuffer {
    type Target: ?Sized;

    /// Provide a buffer usable for DMA reads.
    ///
    /// The return value is:
    ///
    /// - pointer to the start of the buffer
    /// - buffer size in bytes
    ///
    /// # Safety
    ///
    /// - This function must always return the same values, if called multiple
    ///   times.
    /// - The memory specified by the returned pointer and size must be fully
    ///   readable by the DMA peripheral.
    fn dma_read_buffer(&self) -> (*const Self::Target, usize);
}

/// Element type of a buffer handed to the DMA engine.
///
/// # Safety
///
/// Implementors must be plain words without padding, so the engine sees
/// exactly the bytes the CPU wrote.
pub unsafe trait DmaTarget {}

unsafe impl DmaTarget for u32 {}

unsafe impl<B, E> DmaReadBuffer for B
where
    B: Deref + StableDeref,
    B::Target: AsSlice<Element = E>,
    E: DmaTarget,
{
    type Target = [E];

    fn dma_read_buffer(&self) -> (*const Self::Target, usize) {
        let target = self.as_slice();
        let ptr = target as *const Self::Target;
        let len = mem::size_of_val(target);
        (ptr, len)
    }
}

/// Byte view of a DMA read buffer.
///
/// Used by bus implementations that copy buffer contents instead of
/// letting the engine read them in place.
pub fn dma_bytes<B: DmaReadBuffer>(buffer: &B) -> &[u8] {
    let (ptr, len) = buffer.dma_read_buffer();
    // Safety: `DmaReadBuffer` guarantees `len` readable bytes at `ptr` for
    // as long as `buffer` is borrowed.
    unsafe { core::slice::from_raw_parts(ptr as *const u8, len) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::{CompareBuffer, ShadowCommit};
    use crate::BLOCK_SIZE;

    #[test]
    fn compare_buffer_spans_all_words() {
        let buffer = CompareBuffer::ascending();
        let (ptr, len) = (&buffer).dma_read_buffer();
        assert_eq!(len, BLOCK_SIZE * 4);
        assert_eq!(ptr as *const u32, buffer.as_slice().as_ptr());
    }

    #[test]
    fn commit_word_is_one_word() {
        let commit = ShadowCommit::slice(0);
        let commit = &commit;
        let bytes = dma_bytes(&commit);
        assert_eq!(bytes, &1u32.to_le_bytes()[..]);
    }
}
