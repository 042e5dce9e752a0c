//! The bring-up sequence that arms both channels and starts the timer.

use crate::bus::Bus;
use crate::ccu4::Slice;
use crate::config::ChannelConfig;
use crate::gpdma::{Gpdma, HardwareConfigError};
use crate::ring::{DescriptorRing, LliRing};
use crate::waveform::{ShadowCommit, Waveform};
use crate::{PRIMARY_CHANNEL, PWM_SLICE, SHADOW_CHANNEL};

/// Board and peripheral bring-up (clocks, pins, timer slice setup).
pub trait Board {
    type Error;

    fn init<B: Bus>(&mut self, bus: &mut B) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError<E> {
    Board(E),
    Dma(HardwareConfigError),
}

impl<E> From<HardwareConfigError> for BringUpError<E> {
    fn from(error: HardwareConfigError) -> Self {
        BringUpError::Dma(error)
    }
}

/// All memory the engine reads on its own.
///
/// Lives in a `static` on target; it must not move or change once the
/// channels are enabled.
#[derive(Debug)]
#[repr(C)]
pub struct DmaStatics {
    pub waveform: Waveform,
    pub commit: ShadowCommit,
    pub ring: LliRing,
}

/// Channel configurations produced by [`DmaStatics::prepare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    pub primary: ChannelConfig,
    pub shadow: ChannelConfig,
}

impl DmaStatics {
    pub const fn new() -> Self {
        Self {
            waveform: Waveform::zeroed(),
            commit: ShadowCommit::none(),
            ring: LliRing::zeroed(),
        }
    }

    /// Compute the ramps, set the commit word and link the descriptor ring,
    /// then publish all of it to the engine.
    pub fn prepare<B: Bus>(&mut self, bus: &mut B) -> StreamConfig {
        self.waveform.fill();
        self.commit = ShadowCommit::slice(PWM_SLICE.index());

        let sources = [
            bus.locate(&self.waveform.ascending()),
            bus.locate(&self.waveform.descending()),
        ];
        let ring_addr = bus.locate(&&self.ring);
        self.ring = DescriptorRing::new(PWM_SLICE.crs()).link(ring_addr, sources);
        let commit_addr = bus.locate(&&self.commit);

        bus.publish(&self.waveform.ascending());
        bus.publish(&self.waveform.descending());
        bus.publish(&&self.commit);
        bus.publish(&&self.ring);

        StreamConfig {
            primary: ChannelConfig::primary(ring_addr),
            shadow: ChannelConfig::shadow(commit_addr),
        }
    }
}

impl Default for DmaStatics {
    fn default() -> Self {
        Self::new()
    }
}

/// A running ramp-up/ramp-down PWM pattern.
///
/// Once started, nothing here needs to be touched for the pattern to keep
/// going.
pub struct PwmStream<B> {
    bus: B,
    dma: Gpdma,
    timer: Slice,
    statics: &'static DmaStatics,
}

impl<B: Bus> PwmStream<B> {
    /// Bring up the board, arm both channels, then start the timer.
    ///
    /// The timer is started last: a request raised before the channels are
    /// enabled is dropped and the slice would run a period on a stale
    /// compare value.
    pub fn start<P: Board>(
        mut bus: B,
        board: &mut P,
        statics: &'static mut DmaStatics,
    ) -> Result<Self, BringUpError<P::Error>> {
        board.init(&mut bus).map_err(BringUpError::Board)?;

        let config = statics.prepare(&mut bus);
        let statics: &'static DmaStatics = statics;

        let mut dma = Gpdma::new();
        dma.init(&mut bus);
        dma.init_channel(&mut bus, PRIMARY_CHANNEL, &config.primary)?;
        dma.init_channel(&mut bus, SHADOW_CHANNEL, &config.shadow)?;

        dma.enable_channel(&mut bus, PRIMARY_CHANNEL)?;
        dma.enable_channel(&mut bus, SHADOW_CHANNEL)?;

        PWM_SLICE.start(&mut bus);

        Ok(PwmStream {
            bus,
            dma,
            timer: PWM_SLICE,
            statics,
        })
    }

    /// Stop the timer, then both channels.
    pub fn halt(&mut self) -> Result<(), HardwareConfigError> {
        self.timer.stop(&mut self.bus);
        self.dma.disable_channel(&mut self.bus, PRIMARY_CHANNEL)?;
        self.dma.disable_channel(&mut self.bus, SHADOW_CHANNEL)?;
        Ok(())
    }

    pub fn dma(&self) -> &Gpdma {
        &self.dma
    }

    pub fn statics(&self) -> &'static DmaStatics {
        self.statics
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn free(self) -> B {
        self.bus
    }
}
