//! A host model of the parts of an XMC4 that the PWM stream touches.
//!
//! Registers are decoded from the written addresses. DMA-visible memory is
//! whatever was published through the bus. `tick` advances the timer by one
//! period: pending shadow transfers take effect, then the period match
//! raises a DMA request which every armed channel serves with one burst.

#![allow(dead_code)]

use dma_pwm::ccu4::{self, TCCLR, TCCLR_TRBC, TCSET, TCSET_TRBS};
use dma_pwm::gpdma::{self, CHANNELS, CHANNEL_STRIDE};
use dma_pwm::ring::Lli;
use dma_pwm::{dma_bytes, Bus, DmaReadBuffer, PWM_SLICE};
use heapless::{FnvIndexMap, Vec};
use zerocopy::FromBytes;

const SRAM_BASE: u32 = 0x2000_0000;

const CTLL_SINC_MASK: u32 = 0b11 << 9;
const CTLL_DINC_MASK: u32 = 0b11 << 7;
const CTLL_LLP_SRC_EN: u32 = 1 << 28;
const CFGL_HS_SEL_DST: u32 = 1 << 10;
const CFGL_RELOAD_SRC: u32 = 1 << 30;
const CFGL_RELOAD_DST: u32 = 1 << 31;
const CFGH_DEST_PER_POS: u32 = 11;

/// Service request line the CCU40 period match is routed to.
const SR0_LINE: u8 = 0;

#[derive(Clone, Copy, Debug, Default)]
struct Channel {
    sar: u32,
    dar: u32,
    llp: u32,
    ctll: u32,
    ctlh: u32,
    cfgl: u32,
    cfgh: u32,
    enabled: bool,
    start_sar: u32,
    start_dar: u32,
    done: u32,
}

impl Channel {
    fn block_size(&self) -> u32 {
        self.ctlh & 0xFFF
    }

    fn serves(&self, line: u8) -> bool {
        self.enabled
            && self.cfgl & CFGL_HS_SEL_DST == 0
            && (self.cfgh >> CFGH_DEST_PER_POS) & 0xF == line as u32
    }

    fn load(&mut self, lli: &Lli) {
        self.sar = lli.sar;
        self.dar = lli.dar;
        self.llp = lli.llp;
        self.ctll = lli.ctll;
        self.ctlh = lli.ctlh;
    }
}

struct Region {
    host: usize,
    len: usize,
    bus: u32,
}

pub struct SimSoc {
    /// Register writes issued by firmware, in order.
    pub writes: Vec<(u32, u32), 64>,
    /// Compare value in effect for each elapsed timer period.
    pub latched: Vec<u32, 1024>,
    memory: FnvIndexMap<u32, u32, 256>,
    regions: Vec<Region, 8>,
    next_free: u32,
    dma_enabled: bool,
    channels: [Channel; CHANNELS],
    lnen: u32,
    /// Bit mask of channels that ever wrote an address.
    writers: FnvIndexMap<u32, u8, 8>,
    timer_running: bool,
    period_match: bool,
    crs: u32,
    cr: u32,
    shadow_pending: bool,
}

impl SimSoc {
    pub fn new() -> Self {
        SimSoc {
            writes: Vec::new(),
            latched: Vec::new(),
            memory: FnvIndexMap::new(),
            regions: Vec::new(),
            next_free: SRAM_BASE,
            dma_enabled: false,
            channels: [Channel::default(); CHANNELS],
            lnen: 0,
            writers: FnvIndexMap::new(),
            timer_running: false,
            period_match: false,
            crs: 0,
            cr: 0,
            shadow_pending: false,
        }
    }

    /// Compare value the slice is currently running on.
    pub fn compare(&self) -> u32 {
        self.cr
    }

    pub fn compare_shadow(&self) -> u32 {
        self.crs
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn channel_enabled(&self, channel: u8) -> bool {
        self.channels[channel as usize].enabled
    }

    /// Channels (as a bit mask) that wrote `address` through the DMA.
    pub fn writers_of(&self, address: u32) -> u8 {
        self.writers.get(&address).copied().unwrap_or(0)
    }

    /// One timer period.
    pub fn tick(&mut self) {
        if !self.timer_running {
            return;
        }
        if self.shadow_pending {
            self.cr = self.crs;
            self.shadow_pending = false;
        }
        self.latched.push(self.cr).unwrap();
        if self.period_match {
            self.request(SR0_LINE);
        }
    }

    pub fn run(&mut self, periods: usize) {
        for _ in 0..periods {
            self.tick();
        }
    }

    /// Raise DMA request `line`. Lost unless the engine is enabled, the
    /// line is routed and a channel is armed for it.
    pub fn request(&mut self, line: u8) {
        if !self.dma_enabled || self.lnen & (1 << line) == 0 {
            return;
        }
        // Equal priorities: the lower channel number is served first.
        for index in 0..CHANNELS {
            if self.channels[index].serves(line) {
                self.burst(index);
            }
        }
    }

    fn burst(&mut self, index: usize) {
        let mut channel = self.channels[index];

        let word = self.read_word(channel.sar);
        self.apply(channel.dar, word);
        let mask = self.writers.get(&channel.dar).copied().unwrap_or(0) | 1 << index;
        self.writers.insert(channel.dar, mask).unwrap();

        if channel.ctll & CTLL_SINC_MASK == 0 {
            channel.sar += 4;
        }
        if channel.ctll & CTLL_DINC_MASK == 0 {
            channel.dar += 4;
        }
        channel.done += 1;

        if channel.done == channel.block_size() {
            channel.done = 0;
            if channel.ctll & CTLL_LLP_SRC_EN != 0 && channel.llp != 0 {
                let lli = self.read_lli(channel.llp);
                channel.load(&lli);
            } else if channel.cfgl & (CFGL_RELOAD_SRC | CFGL_RELOAD_DST) != 0 {
                channel.sar = channel.start_sar;
                channel.dar = channel.start_dar;
            } else {
                channel.enabled = false;
            }
        }

        self.channels[index] = channel;
    }

    fn read_word(&self, address: u32) -> u32 {
        match self.memory.get(&address) {
            Some(word) => *word,
            None => panic!("DMA read from unpublished address {:#010x}", address),
        }
    }

    fn read_lli(&self, address: u32) -> Lli {
        let mut bytes = [0u8; Lli::SIZE];
        for (i, chunk) in bytes.chunks_mut(4).enumerate() {
            chunk.copy_from_slice(&self.read_word(address + 4 * i as u32).to_ne_bytes());
        }
        Lli::read_from(&bytes[..]).unwrap()
    }

    fn arm(&mut self, index: usize) {
        let mut channel = self.channels[index];
        if channel.ctll & CTLL_LLP_SRC_EN != 0 && channel.llp != 0 {
            let lli = self.read_lli(channel.llp);
            channel.load(&lli);
        }
        channel.start_sar = channel.sar;
        channel.start_dar = channel.dar;
        channel.done = 0;
        channel.enabled = true;
        self.channels[index] = channel;
    }

    /// Effect of a register write, from firmware or from the engine.
    fn apply(&mut self, address: u32, value: u32) {
        let first_channel = gpdma::channel_reg(0, 0);
        let channel_regs = first_channel..first_channel + CHANNELS as u32 * CHANNEL_STRIDE;

        if address == gpdma::engine_reg(gpdma::DMACFGREG) {
            self.dma_enabled = value & 1 != 0;
        } else if address == gpdma::engine_reg(gpdma::CHENREG) {
            for index in 0..CHANNELS {
                if value & 1 << (index + 8) == 0 {
                    continue;
                }
                if value & 1 << index != 0 {
                    if !self.channels[index].enabled {
                        self.arm(index);
                    }
                } else {
                    self.channels[index].enabled = false;
                }
            }
        } else if channel_regs.contains(&address) {
            let offset = address - first_channel;
            let channel = &mut self.channels[(offset / CHANNEL_STRIDE) as usize];
            if channel.enabled {
                // settings of a running channel are read-only
                return;
            }
            match offset % CHANNEL_STRIDE {
                gpdma::SAR => channel.sar = value,
                gpdma::DAR => channel.dar = value,
                gpdma::LLP => channel.llp = value,
                gpdma::CTLL => channel.ctll = value,
                gpdma::CTLH => channel.ctlh = value,
                gpdma::CFGL => channel.cfgl = value,
                gpdma::CFGH => channel.cfgh = value,
                _ => {}
            }
        } else if address == gpdma::dlr_reg(gpdma::LNEN) {
            self.lnen = value;
        } else if address == PWM_SLICE.crs() {
            self.crs = value;
        } else if address == ccu4::global_reg(ccu4::GCSS) {
            if value & ccu4::GCSS_S0SE != 0 {
                self.shadow_pending = true;
            }
        } else if address == PWM_SLICE.reg(TCSET) {
            if value & TCSET_TRBS != 0 {
                self.timer_running = true;
            }
        } else if address == PWM_SLICE.reg(TCCLR) {
            if value & TCCLR_TRBC != 0 {
                self.timer_running = false;
            }
        } else if address == PWM_SLICE.reg(ccu4::INTE) {
            self.period_match = value & ccu4::INTE_PME != 0;
        }
    }
}

impl Default for SimSoc {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimSoc {
    fn write(&mut self, address: u32, value: u32) {
        self.writes.push((address, value)).unwrap();
        self.apply(address, value);
    }

    fn locate<D: DmaReadBuffer>(&mut self, buffer: &D) -> u32 {
        let (ptr, len) = buffer.dma_read_buffer();
        let host = ptr as *const u8 as usize;
        if let Some(region) = self.regions.iter().find(|r| r.host == host) {
            assert_eq!(region.len, len, "buffer changed size");
            return region.bus;
        }

        let bus = self.next_free;
        self.next_free += (len as u32 + 31) & !31;
        self.regions.push(Region { host, len, bus }).ok().unwrap();
        bus
    }

    fn publish<D: DmaReadBuffer>(&mut self, buffer: &D) {
        let base = self.locate(buffer);
        for (i, chunk) in dma_bytes(buffer).chunks(4).enumerate() {
            let mut word = [0; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.memory
                .insert(base + 4 * i as u32, u32::from_ne_bytes(word))
                .unwrap();
        }
    }
}
