//! CCU40 timer slice driving the PWM output, and the reference board
//! bring-up for it.

use xmc4500 as pac;

use crate::bringup::Board;
use crate::bus::Bus;

// Global registers, relative to the CCU40 block.
pub const GIDLC: u32 = 0x0C;
pub const GCSS: u32 = 0x10;

pub const GIDLC_CS0I: u32 = 1 << 0;
pub const GIDLC_SPRB: u32 = 1 << 8;
/// Slice 0 period/compare shadow transfer request.
pub const GCSS_S0SE: u32 = 1 << 0;

const CC4_STRIDE: u32 = 0x100;

// Slice registers, relative to the slice block.
pub const TCSET: u32 = 0x0C;
pub const TCCLR: u32 = 0x10;
pub const PSC: u32 = 0x24;
pub const PRS: u32 = 0x34;
pub const CRS: u32 = 0x3C;
pub const INTE: u32 = 0xA4;
pub const SRS: u32 = 0xA8;

pub const TCSET_TRBS: u32 = 1 << 0;
pub const TCCLR_TRBC: u32 = 1 << 0;
pub const TCCLR_TCC: u32 = 1 << 1;
/// Period match event enable.
pub const INTE_PME: u32 = 1 << 0;

/// `SCU_RESET.PRCLR0`, relative to the SCU reset block.
pub const PRCLR0: u32 = 0x14;
pub const PRCLR0_CCU40RS: u32 = 1 << 2;

/// `PORT1.IOCR0`, relative to the port block.
pub const IOCR0: u32 = 0x10;
/// P1.3 carries CCU40.OUT0 on alternate function 3.
pub const IOCR0_PC3_ALT3_PUSH_PULL: u32 = 0x98 << 24;

/// Address of the CCU40 global register at `offset`.
pub fn global_reg(offset: u32) -> u32 {
    pac::CCU40::ptr() as u32 + offset
}

/// One timer slice of CCU40.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slice(u8);

impl Slice {
    pub const CC40: Self = Self(0);

    pub fn index(self) -> u8 {
        self.0
    }

    /// Address of register `offset` of this slice.
    pub fn reg(self, offset: u32) -> u32 {
        pac::CCU40_CC40::ptr() as u32 + CC4_STRIDE * self.0 as u32 + offset
    }

    /// Compare shadow register, where the compare values land.
    pub fn crs(self) -> u32 {
        self.reg(CRS)
    }

    /// Set up edge aligned PWM with `period` ticks and an initial compare
    /// value, raising service request 0 on every period match. The timer is
    /// not started.
    pub fn configure_pwm<B: Bus>(
        self,
        bus: &mut B,
        period: u32,
        compare: u32,
    ) -> Result<(), BoardError> {
        if period > 0xFFFF {
            return Err(BoardError::PeriodOutOfRange(period));
        }
        if compare > period + 1 {
            return Err(BoardError::CompareOutOfRange(compare));
        }

        bus.write(global_reg(GIDLC), GIDLC_SPRB);
        bus.write(self.reg(PSC), 0);
        bus.write(self.reg(PRS), period);
        bus.write(self.reg(CRS), compare);
        bus.write(global_reg(GCSS), GCSS_S0SE << (4 * self.0 as u32));
        bus.write(self.reg(SRS), 0);
        bus.write(self.reg(INTE), INTE_PME);
        bus.write(global_reg(GIDLC), GIDLC_CS0I << self.0 as u32);
        Ok(())
    }

    /// Let the timer run.
    pub fn start<B: Bus>(self, bus: &mut B) {
        bus.write(self.reg(TCSET), TCSET_TRBS);
    }

    /// Stop the timer and clear its count.
    pub fn stop<B: Bus>(self, bus: &mut B) {
        bus.write(self.reg(TCCLR), TCCLR_TRBC | TCCLR_TCC);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    /// CCU4 timers are 16 bits wide.
    PeriodOutOfRange(u32),
    CompareOutOfRange(u32),
}

/// Brings up CCU40 slice 0 for PWM on P1.3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ccu4Board {
    pub period: u32,
}

impl Ccu4Board {
    pub const fn new(period: u32) -> Self {
        Self { period }
    }
}

impl Board for Ccu4Board {
    type Error = BoardError;

    fn init<B: Bus>(&mut self, bus: &mut B) -> Result<(), BoardError> {
        bus.write(pac::SCU_RESET::ptr() as u32 + PRCLR0, PRCLR0_CCU40RS);
        // 0% duty until the first compare value is latched
        Slice::CC40.configure_pwm(bus, self.period, self.period.saturating_add(1))?;
        bus.write(pac::PORT1::ptr() as u32 + IOCR0, IOCR0_PC3_ALT3_PUSH_PULL);
        Ok(())
    }
}
