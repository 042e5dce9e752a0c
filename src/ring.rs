//! The two-node descriptor ring that double-buffers the compare values.
//!
//! Nodes are kept in a fixed array and refer to each other by index; bus
//! addresses only appear once the ring is linked into its hardware image
//! ([`LliRing`]), which is what the engine actually fetches.

use as_slice::AsSlice;
use zerocopy::{AsBytes, FromBytes};

use crate::config::{TransferControl, CTLL_LLP_DST_EN, CTLL_LLP_SRC_EN};
use crate::traits::DmaTarget;
use crate::waveform::Ramp;
use crate::BLOCK_SIZE;

/// Number of nodes in the ring.
pub const RING_LEN: usize = 2;

/// One node of the ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferDescriptor {
    pub block_size: u16,
    pub source: Ramp,
    /// Fixed peripheral register every word of the block lands in.
    pub destination: u32,
    pub control: TransferControl,
    /// Index of the node the engine loads once this block is done.
    pub next: usize,
    pub src_linked: bool,
    pub dst_linked: bool,
}

impl TransferDescriptor {
    const fn new(source: Ramp, destination: u32, next: usize) -> Self {
        Self {
            block_size: BLOCK_SIZE as u16,
            source,
            destination,
            control: TransferControl::BUFFER_TO_REGISTER,
            next,
            src_linked: true,
            dst_linked: true,
        }
    }

    /// `CTLL` as stored in the hardware descriptor.
    pub const fn ctll(&self) -> u32 {
        let mut ctll = self.control.bits();
        if self.src_linked {
            ctll |= CTLL_LLP_SRC_EN;
        }
        if self.dst_linked {
            ctll |= CTLL_LLP_DST_EN;
        }
        ctll
    }
}

/// Index of the node following `index`.
pub const fn next_index(index: usize) -> usize {
    1 - index
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorRing {
    nodes: [TransferDescriptor; RING_LEN],
}

impl DescriptorRing {
    /// Ascending ramp first, then descending, both into `destination`.
    pub const fn new(destination: u32) -> Self {
        Self {
            nodes: [
                TransferDescriptor::new(Ramp::Up, destination, next_index(0)),
                TransferDescriptor::new(Ramp::Down, destination, next_index(1)),
            ],
        }
    }

    pub fn node(&self, index: usize) -> &TransferDescriptor {
        &self.nodes[index]
    }

    /// Endless traversal starting at `start`, yielding node indices.
    pub fn walk(&self, start: usize) -> Walk<'_> {
        Walk {
            ring: self,
            current: start,
        }
    }

    /// Resolve the ring into the image the engine fetches.
    ///
    /// `ring_addr` is the bus address the returned image will live at and
    /// `sources` the bus addresses of the ascending and descending buffers.
    pub fn link(&self, ring_addr: u32, sources: [u32; 2]) -> LliRing {
        let mut image = LliRing::zeroed();
        for (index, node) in self.nodes.iter().enumerate() {
            image.0[index] = Lli {
                sar: sources[node.source as usize],
                dar: node.destination,
                llp: LliRing::node_addr(ring_addr, node.next),
                ctll: node.ctll(),
                ctlh: node.block_size as u32,
                dstat: 0,
                sstat: 0,
            };
        }
        image
    }
}

pub struct Walk<'a> {
    ring: &'a DescriptorRing,
    current: usize,
}

impl Iterator for Walk<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.current;
        self.current = self.ring.nodes[index].next;
        Some(index)
    }
}

/// Linked list item in the layout the engine fetches it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AsBytes, FromBytes)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct Lli {
    pub sar: u32,
    pub dar: u32,
    pub llp: u32,
    pub ctll: u32,
    pub ctlh: u32,
    pub dstat: u32,
    pub sstat: u32,
}

impl Lli {
    pub const ZERO: Self = Self {
        sar: 0,
        dar: 0,
        llp: 0,
        ctll: 0,
        ctlh: 0,
        dstat: 0,
        sstat: 0,
    };

    pub const SIZE: usize = core::mem::size_of::<Self>();
}

unsafe impl DmaTarget for Lli {}

/// Hardware image of the [`DescriptorRing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct LliRing([Lli; RING_LEN]);

impl LliRing {
    pub const fn zeroed() -> Self {
        Self([Lli::ZERO; RING_LEN])
    }

    pub fn node(&self, index: usize) -> &Lli {
        &self.0[index]
    }

    /// Bus address of node `index` when the image starts at `ring_addr`.
    pub const fn node_addr(ring_addr: u32, index: usize) -> u32 {
        ring_addr + (index * Lli::SIZE) as u32
    }
}

impl AsSlice for LliRing {
    type Element = Lli;

    fn as_slice(&self) -> &[Lli] {
        &self.0
    }
}

// The engine transfers exactly one buffer per block.
const _: () = assert!(BLOCK_SIZE == core::mem::size_of::<crate::waveform::CompareBuffer>() / 4);
// BLOCK_TS is 12 bits wide.
const _: () = assert!(BLOCK_SIZE > 0 && BLOCK_SIZE < 1 << 12);
const _: () = assert!(Lli::SIZE == 28);
