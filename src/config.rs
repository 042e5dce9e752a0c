//! Static channel configuration for the two GPDMA channels.
//!
//! Field encodings follow the GPDMA0 `CTLL`, `CFGL` and `CFGH` register
//! layouts; `Gpdma::init_channel` writes the words produced here verbatim.

use crate::ccu4;
use crate::BLOCK_SIZE;

/// Width of a single transfer on one side of the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferWidth {
    Bits8 = 0,
    Bits16 = 1,
    Bits32 = 2,
}

/// What happens to an address after each transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressCountMode {
    Increment = 0,
    Decrement = 1,
    NoChange = 2,
}

/// Number of transfers per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstLength {
    One = 0,
    Four = 1,
    Eight = 2,
}

/// Direction and flow controller; the engine is flow controller in every
/// variant listed here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferFlow {
    MemoryToMemory = 0,
    MemoryToPeripheral = 1,
    PeripheralToMemory = 2,
}

/// How the channel continues after a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferType {
    /// Both addresses come from the next descriptor in the list.
    MultiBlockLinked,
    /// Both addresses snap back to their configured start.
    MultiBlockReload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handshaking {
    Hardware,
    Software,
}

/// A request line of the DMA line router and the service request routed
/// onto it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralRequest {
    pub line: u8,
    pub select: u8,
}

impl PeripheralRequest {
    /// CCU40 service request 0 on line 0.
    ///
    /// Selector 6 of line 0 as listed for `DMA0_PERIPHERAL_REQUEST_CCU40_SR0_0`
    /// in XMClib's `xmc4_dma_map.h`.
    pub const CCU40_SR0: Self = Self { line: 0, select: 6 };
}

/// Channel priority, 0 is the lowest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(u8);

impl Priority {
    pub const LOWEST: Self = Self(0);
}

const CTLL_DST_TR_WIDTH_POS: u32 = 1;
const CTLL_SRC_TR_WIDTH_POS: u32 = 4;
const CTLL_DINC_POS: u32 = 7;
const CTLL_SINC_POS: u32 = 9;
const CTLL_DEST_MSIZE_POS: u32 = 11;
const CTLL_SRC_MSIZE_POS: u32 = 14;
const CTLL_TT_FC_POS: u32 = 20;
pub(crate) const CTLL_LLP_DST_EN: u32 = 1 << 27;
pub(crate) const CTLL_LLP_SRC_EN: u32 = 1 << 28;

const CFGL_CH_PRIOR_POS: u32 = 5;
const CFGL_HS_SEL_DST: u32 = 1 << 10;
const CFGL_HS_SEL_SRC: u32 = 1 << 11;
pub(crate) const CFGL_RELOAD_SRC: u32 = 1 << 30;
pub(crate) const CFGL_RELOAD_DST: u32 = 1 << 31;

const CFGH_PROTCTL_POS: u32 = 2;
const CFGH_DEST_PER_POS: u32 = 11;

/// Width, stepping and burst of both sides of a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferControl {
    pub src_width: TransferWidth,
    pub dst_width: TransferWidth,
    pub src_count: AddressCountMode,
    pub dst_count: AddressCountMode,
    pub src_burst: BurstLength,
    pub dst_burst: BurstLength,
    pub flow: TransferFlow,
}

impl TransferControl {
    /// Walk a word buffer into one fixed peripheral register.
    pub const BUFFER_TO_REGISTER: Self = Self {
        src_width: TransferWidth::Bits32,
        dst_width: TransferWidth::Bits32,
        src_count: AddressCountMode::Increment,
        dst_count: AddressCountMode::NoChange,
        src_burst: BurstLength::One,
        dst_burst: BurstLength::One,
        flow: TransferFlow::MemoryToPeripheral,
    };

    /// Copy one fixed word into one fixed peripheral register.
    pub const WORD_TO_REGISTER: Self = Self {
        src_count: AddressCountMode::NoChange,
        ..Self::BUFFER_TO_REGISTER
    };

    /// `CTLL` without the linked-list enables.
    pub const fn bits(&self) -> u32 {
        (self.dst_width as u32) << CTLL_DST_TR_WIDTH_POS
            | (self.src_width as u32) << CTLL_SRC_TR_WIDTH_POS
            | (self.dst_count as u32) << CTLL_DINC_POS
            | (self.src_count as u32) << CTLL_SINC_POS
            | (self.dst_burst as u32) << CTLL_DEST_MSIZE_POS
            | (self.src_burst as u32) << CTLL_SRC_MSIZE_POS
            | (self.flow as u32) << CTLL_TT_FC_POS
    }
}

/// Everything `Gpdma::init_channel` needs to program one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub block_size: u16,
    /// Ignored for linked transfers, the first descriptor provides it.
    pub src_addr: u32,
    /// Ignored for linked transfers, the first descriptor provides it.
    pub dst_addr: u32,
    /// Bus address of the first descriptor, linked transfers only.
    pub linked_list: Option<u32>,
    pub control: TransferControl,
    pub transfer_type: TransferType,
    pub src_handshaking: Handshaking,
    pub dst_handshaking: Handshaking,
    pub dst_request: PeripheralRequest,
    pub priority: Priority,
}

impl ChannelConfig {
    /// Walks the descriptor ring starting at `ring_head`, one compare value
    /// per timer request.
    pub const fn primary(ring_head: u32) -> Self {
        Self {
            block_size: BLOCK_SIZE as u16,
            src_addr: 0,
            dst_addr: 0,
            linked_list: Some(ring_head),
            control: TransferControl::BUFFER_TO_REGISTER,
            transfer_type: TransferType::MultiBlockLinked,
            src_handshaking: Handshaking::Software,
            dst_handshaking: Handshaking::Hardware,
            dst_request: PeripheralRequest::CCU40_SR0,
            priority: Priority::LOWEST,
        }
    }

    /// Rewrites the commit word at `commit` into the CCU40 shadow transfer
    /// set register on every timer request.
    pub fn shadow(commit: u32) -> Self {
        Self {
            block_size: BLOCK_SIZE as u16,
            src_addr: commit,
            dst_addr: ccu4::global_reg(ccu4::GCSS),
            linked_list: None,
            control: TransferControl::WORD_TO_REGISTER,
            transfer_type: TransferType::MultiBlockReload,
            src_handshaking: Handshaking::Software,
            dst_handshaking: Handshaking::Hardware,
            dst_request: PeripheralRequest::CCU40_SR0,
            priority: Priority::LOWEST,
        }
    }

    pub const fn ctll(&self) -> u32 {
        let llp = match self.transfer_type {
            TransferType::MultiBlockLinked => CTLL_LLP_SRC_EN | CTLL_LLP_DST_EN,
            TransferType::MultiBlockReload => 0,
        };
        self.control.bits() | llp
    }

    pub const fn ctlh(&self) -> u32 {
        self.block_size as u32
    }

    pub const fn cfgl(&self) -> u32 {
        let mut cfgl = (self.priority.0 as u32) << CFGL_CH_PRIOR_POS;
        if let Handshaking::Software = self.src_handshaking {
            cfgl |= CFGL_HS_SEL_SRC;
        }
        if let Handshaking::Software = self.dst_handshaking {
            cfgl |= CFGL_HS_SEL_DST;
        }
        if let TransferType::MultiBlockReload = self.transfer_type {
            cfgl |= CFGL_RELOAD_SRC | CFGL_RELOAD_DST;
        }
        cfgl
    }

    pub const fn cfgh(&self) -> u32 {
        // PROTCTL keeps its reset value of 1
        let mut cfgh = 1 << CFGH_PROTCTL_POS;
        if let Handshaking::Hardware = self.dst_handshaking {
            cfgh |= (self.dst_request.line as u32 & 0xF) << CFGH_DEST_PER_POS;
        }
        cfgh
    }
}
