//! Register-level driver for the GPDMA0 engine and the DMA line router.

use xmc4500 as pac;

use crate::bus::Bus;
use crate::config::{ChannelConfig, Handshaking, PeripheralRequest};

pub const CHANNELS: usize = 8;
/// Distance between the register blocks of neighbouring channels.
pub const CHANNEL_STRIDE: u32 = 0x58;

// Channel registers, relative to the channel block.
pub const SAR: u32 = 0x00;
pub const DAR: u32 = 0x08;
pub const LLP: u32 = 0x10;
pub const CTLL: u32 = 0x18;
pub const CTLH: u32 = 0x1C;
pub const CFGL: u32 = 0x40;
pub const CFGH: u32 = 0x44;

// Engine registers, relative to the GPDMA0 block.
pub const DMACFGREG: u32 = 0xD8;
pub const CHENREG: u32 = 0xE0;
pub const DMACFGREG_DMA_EN: u32 = 1;

// Line router registers, relative to the DLR block.
pub const SRSEL0: u32 = 0x08;
pub const LNEN: u32 = 0x10;
const DLR_LINES: u8 = 8;

/// `SCU_RESET.PRCLR2`, relative to the SCU reset block.
pub const PRCLR2: u32 = 0x2C;
pub const PRCLR2_DMA0RS: u32 = 1 << 4;

/// Address of register `offset` of channel `channel`.
pub fn channel_reg(channel: u8, offset: u32) -> u32 {
    pac::GPDMA0_CH0::ptr() as u32 + channel as u32 * CHANNEL_STRIDE + offset
}

/// Address of the engine wide register at `offset`.
pub fn engine_reg(offset: u32) -> u32 {
    pac::GPDMA0::ptr() as u32 + offset
}

/// Address of the line router register at `offset`.
pub fn dlr_reg(offset: u32) -> u32 {
    pac::DLR::ptr() as u32 + offset
}

/// `CHENREG` value that enables or disables exactly one channel.
pub const fn chenreg(channel: u8, enable: bool) -> u32 {
    let write_enable = 1 << (channel as u32 + 8);
    if enable {
        write_enable | 1 << channel as u32
    } else {
        write_enable
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    Uninitialized,
    Configured,
    /// Armed; from here on the hardware moves data on every request.
    Enabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareConfigError {
    /// `Gpdma::init` has not been called.
    EngineDisabled,
    /// Channel index outside of GPDMA0.
    NoSuchChannel(u8),
    /// The channel was enabled before it was configured.
    NotConfigured(u8),
    /// Request line outside of the lines routed to GPDMA0.
    NoSuchLine(u8),
    /// The channel is running and ignores new settings until disabled.
    ChannelBusy(u8),
}

/// Driver state for GPDMA0.
///
/// The engine's registers are only ever written, so the line router
/// registers are mirrored here.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gpdma {
    enabled: bool,
    channels: [ChannelState; CHANNELS],
    srsel0: u32,
    lnen: u32,
}

impl Gpdma {
    pub const fn new() -> Self {
        Self {
            enabled: false,
            channels: [ChannelState::Uninitialized; CHANNELS],
            srsel0: 0,
            lnen: 0,
        }
    }

    /// Take the engine out of reset and enable it.
    pub fn init<B: Bus>(&mut self, bus: &mut B) {
        bus.write(pac::SCU_RESET::ptr() as u32 + PRCLR2, PRCLR2_DMA0RS);
        bus.write(engine_reg(DMACFGREG), DMACFGREG_DMA_EN);
        self.enabled = true;
    }

    pub fn state(&self, channel: u8) -> Result<ChannelState, HardwareConfigError> {
        self.channels
            .get(channel as usize)
            .copied()
            .ok_or(HardwareConfigError::NoSuchChannel(channel))
    }

    /// Program `channel` with `config`. The channel stays disabled.
    ///
    /// Nothing is written unless every check passes.
    pub fn init_channel<B: Bus>(
        &mut self,
        bus: &mut B,
        channel: u8,
        config: &ChannelConfig,
    ) -> Result<(), HardwareConfigError> {
        if self.state(channel)? == ChannelState::Enabled {
            return Err(HardwareConfigError::ChannelBusy(channel));
        }
        if !self.enabled {
            return Err(HardwareConfigError::EngineDisabled);
        }
        let routed = match config.dst_handshaking {
            Handshaking::Hardware => Some(checked_line(config.dst_request)?),
            Handshaking::Software => None,
        };

        match config.linked_list {
            // The first block comes from the descriptor LLP points at.
            Some(head) => bus.write(channel_reg(channel, LLP), head),
            None => {
                bus.write(channel_reg(channel, SAR), config.src_addr);
                bus.write(channel_reg(channel, DAR), config.dst_addr);
                bus.write(channel_reg(channel, LLP), 0);
            }
        }
        bus.write(channel_reg(channel, CTLH), config.ctlh());
        bus.write(channel_reg(channel, CTLL), config.ctll());
        bus.write(channel_reg(channel, CFGL), config.cfgl());
        bus.write(channel_reg(channel, CFGH), config.cfgh());

        if let Some(request) = routed {
            self.route(bus, request);
        }

        self.channels[channel as usize] = ChannelState::Configured;
        Ok(())
    }

    /// Arm a configured channel.
    pub fn enable_channel<B: Bus>(
        &mut self,
        bus: &mut B,
        channel: u8,
    ) -> Result<(), HardwareConfigError> {
        match self.state(channel)? {
            ChannelState::Uninitialized => Err(HardwareConfigError::NotConfigured(channel)),
            ChannelState::Configured | ChannelState::Enabled => {
                bus.write(engine_reg(CHENREG), chenreg(channel, true));
                self.channels[channel as usize] = ChannelState::Enabled;
                Ok(())
            }
        }
    }

    /// Stop a channel. Its configuration is kept.
    pub fn disable_channel<B: Bus>(
        &mut self,
        bus: &mut B,
        channel: u8,
    ) -> Result<(), HardwareConfigError> {
        if self.state(channel)? == ChannelState::Enabled {
            bus.write(engine_reg(CHENREG), chenreg(channel, false));
            self.channels[channel as usize] = ChannelState::Configured;
        }
        Ok(())
    }

    fn route<B: Bus>(&mut self, bus: &mut B, request: PeripheralRequest) {
        let shift = 4 * request.line as u32;
        self.srsel0 = self.srsel0 & !(0xF << shift) | (request.select as u32 & 0xF) << shift;
        self.lnen |= 1 << request.line;

        bus.write(dlr_reg(SRSEL0), self.srsel0);
        bus.write(dlr_reg(LNEN), self.lnen);
    }
}

fn checked_line(request: PeripheralRequest) -> Result<PeripheralRequest, HardwareConfigError> {
    if request.line < DLR_LINES {
        Ok(request)
    } else {
        Err(HardwareConfigError::NoSuchLine(request.line))
    }
}

impl Default for Gpdma {
    fn default() -> Self {
        Self::new()
    }
}
