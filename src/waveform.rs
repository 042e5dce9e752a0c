//! Compare values streamed into the timer, and the shadow commit word.

use as_slice::AsSlice;

use crate::ccu4;
use crate::{BLOCK_SIZE, COMPARE_BLOCK};

/// One full sweep of duty-cycle settings, one compare value per timer period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct CompareBuffer([u32; BLOCK_SIZE]);

impl CompareBuffer {
    pub const fn zeroed() -> Self {
        Self([0; BLOCK_SIZE])
    }

    /// `COMPARE_BLOCK * i` for every index.
    pub const fn ascending() -> Self {
        let mut values = [0; BLOCK_SIZE];
        let mut i = 0;
        while i < BLOCK_SIZE {
            values[i] = COMPARE_BLOCK * i as u32;
            i += 1;
        }
        Self(values)
    }

    /// Mirror image of `ascending`, starting at the top of the ramp.
    pub const fn descending() -> Self {
        let top = COMPARE_BLOCK * (BLOCK_SIZE as u32 - 1);
        let mut values = [0; BLOCK_SIZE];
        let mut i = 0;
        while i < BLOCK_SIZE {
            values[i] = top - COMPARE_BLOCK * i as u32;
            i += 1;
        }
        Self(values)
    }

    pub fn words(&self) -> &[u32; BLOCK_SIZE] {
        &self.0
    }
}

impl AsSlice for CompareBuffer {
    type Element = u32;

    fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Index of a buffer inside a [`Waveform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ramp {
    Up = 0,
    Down = 1,
}

/// Both ramps, in the order the descriptor ring plays them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Waveform {
    buffers: [CompareBuffer; 2],
}

impl Waveform {
    /// Storage for a waveform that is filled in at startup.
    pub const fn zeroed() -> Self {
        Self {
            buffers: [CompareBuffer::zeroed(); 2],
        }
    }

    pub const fn compute() -> Self {
        Self {
            buffers: [CompareBuffer::ascending(), CompareBuffer::descending()],
        }
    }

    /// Overwrite both buffers with the ramps. Must run before any channel
    /// that reads them is enabled.
    pub fn fill(&mut self) {
        *self = Self::compute();
    }

    pub fn buffer(&self, ramp: Ramp) -> &CompareBuffer {
        &self.buffers[ramp as usize]
    }

    pub fn ascending(&self) -> &CompareBuffer {
        self.buffer(Ramp::Up)
    }

    pub fn descending(&self) -> &CompareBuffer {
        self.buffer(Ramp::Down)
    }
}

/// Value the shadow-commit channel writes into `GCSS` every period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct ShadowCommit([u32; 1]);

impl ShadowCommit {
    pub const fn none() -> Self {
        Self([0])
    }

    /// Request the period/compare shadow transfer of one CCU4 slice.
    pub const fn slice(slice: u8) -> Self {
        Self([ccu4::GCSS_S0SE << (4 * slice as u32)])
    }

    pub fn value(&self) -> u32 {
        self.0[0]
    }
}

impl AsSlice for ShadowCommit {
    type Element = u32;

    fn as_slice(&self) -> &[u32] {
        &self.0
    }
}
