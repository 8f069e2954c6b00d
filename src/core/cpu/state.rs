// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Enumerable state registry
//!
//! Every architectural register is exposed through an ordered list of
//! `(name, bit-mask, accessor pair)` entries, used uniformly by the
//! save-state module and by debugger-style introspection. Masks narrow
//! the visible width where the storage is wider than the silicon
//! (e.g. IM is two bits, SAR0 twenty). Imports honor register side
//! effects: the MMU registers recompute the mapping table and R splits
//! into its counter and bit-7 latch.

use crate::core::bus::IoLines;
use crate::core::cpu::Z180;
use crate::core::error::{CoreError, Result};

/// One registry entry: a named, masked accessor pair
pub struct StateEntry {
    pub name: &'static str,
    pub mask: u32,
    pub(crate) get: fn(&Z180) -> u32,
    pub(crate) set: fn(&mut Z180, u32),
}

macro_rules! entry {
    ($name:literal, $mask:expr, $get:expr, $set:expr) => {
        StateEntry {
            name: $name,
            mask: $mask,
            get: $get,
            set: $set,
        }
    };
}

#[rustfmt::skip]
static STATE_TABLE: &[StateEntry] = &[
    entry!("PC", 0xFFFF, |c| c.regs.pc.word() as u32, |c, v| c.regs.pc.set_word(v as u16)),
    entry!("SP", 0xFFFF, |c| c.regs.sp.word() as u32, |c, v| c.regs.sp.set_word(v as u16)),
    entry!("AF", 0xFFFF, |c| c.regs.af.word() as u32, |c, v| c.regs.af.set_word(v as u16)),
    entry!("BC", 0xFFFF, |c| c.regs.bc.word() as u32, |c, v| c.regs.bc.set_word(v as u16)),
    entry!("DE", 0xFFFF, |c| c.regs.de.word() as u32, |c, v| c.regs.de.set_word(v as u16)),
    entry!("HL", 0xFFFF, |c| c.regs.hl.word() as u32, |c, v| c.regs.hl.set_word(v as u16)),
    entry!("IX", 0xFFFF, |c| c.regs.ix.word() as u32, |c, v| c.regs.ix.set_word(v as u16)),
    entry!("IY", 0xFFFF, |c| c.regs.iy.word() as u32, |c, v| c.regs.iy.set_word(v as u16)),
    entry!("AF2", 0xFFFF, |c| c.regs.af2.word() as u32, |c, v| c.regs.af2.set_word(v as u16)),
    entry!("BC2", 0xFFFF, |c| c.regs.bc2.word() as u32, |c, v| c.regs.bc2.set_word(v as u16)),
    entry!("DE2", 0xFFFF, |c| c.regs.de2.word() as u32, |c, v| c.regs.de2.set_word(v as u16)),
    entry!("HL2", 0xFFFF, |c| c.regs.hl2.word() as u32, |c, v| c.regs.hl2.set_word(v as u16)),
    entry!("R", 0xFF, |c| c.regs.r_effective() as u32, |c, v| c.regs.set_r_effective(v as u8)),
    entry!("I", 0xFF, |c| c.regs.i as u32, |c, v| c.regs.i = v as u8),
    entry!("IM", 0x03, |c| c.regs.im as u32, |c, v| c.regs.im = v as u8),
    entry!("IFF1", 0x01, |c| c.regs.iff1 as u32, |c, v| c.regs.iff1 = v != 0),
    entry!("IFF2", 0x01, |c| c.regs.iff2 as u32, |c, v| c.regs.iff2 = v != 0),
    entry!("HALT", 0x01, |c| c.regs.halted as u32, |c, v| c.regs.halted = v != 0),
    entry!("IOLINES", 0xFF_FFFF, |c| c.iol.bits(), |c, v| c.write_iolines(IoLines::from_bits_truncate(v))),
    entry!("CNTLA0", 0xFF, |c| c.asci.cntla[0] as u32, |c, v| c.asci.cntla[0] = v as u8),
    entry!("CNTLB0", 0xFF, |c| c.asci.cntlb[0] as u32, |c, v| c.asci.cntlb[0] = v as u8),
    entry!("STAT0", 0xFF, |c| c.asci.stat[0] as u32, |c, v| c.asci.stat[0] = v as u8),
    entry!("TDR0", 0xFF, |c| c.asci.tdr[0] as u32, |c, v| c.asci.tdr[0] = v as u8),
    entry!("RDR0", 0xFF, |c| c.asci.rdr[0] as u32, |c, v| c.asci.rdr[0] = v as u8),
    entry!("ASEXT0", 0x7F, |c| c.asci.ext[0] as u32, |c, v| c.asci.ext[0] = v as u8),
    entry!("ASTC0", 0xFFFF, |c| c.asci.tc[0] as u32, |c, v| c.asci.tc[0] = v as u16),
    entry!("CNTLA1", 0xFF, |c| c.asci.cntla[1] as u32, |c, v| c.asci.cntla[1] = v as u8),
    entry!("CNTLB1", 0xFF, |c| c.asci.cntlb[1] as u32, |c, v| c.asci.cntlb[1] = v as u8),
    entry!("STAT1", 0xFF, |c| c.asci.stat[1] as u32, |c, v| c.asci.stat[1] = v as u8),
    entry!("TDR1", 0xFF, |c| c.asci.tdr[1] as u32, |c, v| c.asci.tdr[1] = v as u8),
    entry!("RDR1", 0xFF, |c| c.asci.rdr[1] as u32, |c, v| c.asci.rdr[1] = v as u8),
    entry!("ASEXT1", 0x1F, |c| c.asci.ext[1] as u32, |c, v| c.asci.ext[1] = v as u8),
    entry!("ASTC1", 0xFFFF, |c| c.asci.tc[1] as u32, |c, v| c.asci.tc[1] = v as u16),
    entry!("CNTR", 0xF7, |c| c.csio.cntr as u32, |c, v| c.csio.cntr = v as u8),
    entry!("TRDR", 0xFF, |c| c.csio.trdr as u32, |c, v| c.csio.trdr = v as u8),
    entry!("TMDR0", 0xFFFF, |c| c.timers.counter(0) as u32, |c, v| c.timers.set_counter(0, v as u16)),
    entry!("RLDR0", 0xFFFF, |c| c.timers.reload(0) as u32, |c, v| c.timers.set_reload(0, v as u16)),
    entry!("TMDR1", 0xFFFF, |c| c.timers.counter(1) as u32, |c, v| c.timers.set_counter(1, v as u16)),
    entry!("RLDR1", 0xFFFF, |c| c.timers.reload(1) as u32, |c, v| c.timers.set_reload(1, v as u16)),
    entry!("TCR", 0xFF, |c| c.timers.tcr() as u32, |c, v| c.timers.set_tcr_raw(v as u8)),
    entry!("FRC", 0xFF, |c| c.timers.frc() as u32, |c, v| c.timers.set_frc(v as u8)),
    entry!("CMR", 0xC0, |c| c.cmr as u32, |c, v| c.cmr = v as u8),
    entry!("CCR", 0xFF, |c| c.ccr as u32, |c, v| c.ccr = v as u8),
    entry!("SAR0", 0xF_FFFF, |c| c.dma.sar0, |c, v| c.dma.sar0 = v),
    entry!("DAR0", 0xF_FFFF, |c| c.dma.dar0, |c, v| c.dma.dar0 = v),
    entry!("BCR0", 0xFFFF, |c| c.dma.bcr[0] as u32, |c, v| c.dma.bcr[0] = v as u16),
    entry!("MAR1", 0xF_FFFF, |c| c.dma.mar1, |c, v| c.dma.mar1 = v),
    entry!("IAR1", 0xCF_FFFF, |c| c.dma.iar1, |c, v| c.dma.iar1 = v),
    entry!("BCR1", 0xFFFF, |c| c.dma.bcr[1] as u32, |c, v| c.dma.bcr[1] = v as u16),
    entry!("DSTAT", 0xFD, |c| c.dma.dstat as u32, |c, v| c.dma.dstat = v as u8),
    entry!("DMODE", 0x3E, |c| c.dma.dmode as u32, |c, v| c.dma.dmode = v as u8),
    entry!("DCNTL", 0xFF, |c| c.dma.dcntl as u32, |c, v| c.dma.dcntl = v as u8),
    entry!("IL", 0xE0, |c| c.il as u32, |c, v| c.il = v as u8),
    entry!("ITC", 0xC7, |c| c.itc as u32, |c, v| c.itc = v as u8),
    entry!("RCR", 0xC3, |c| c.rcr as u32, |c, v| c.rcr = v as u8),
    entry!("CBR", 0xFF, |c| c.mmu.cbr() as u32, |c, v| c.mmu.write_cbr(v as u8)),
    entry!("BBR", 0xFF, |c| c.mmu.bbr() as u32, |c, v| c.mmu.write_bbr(v as u8)),
    entry!("CBAR", 0xFF, |c| c.mmu.cbar() as u32, |c, v| c.mmu.write_cbar(v as u8)),
    entry!("OMCR", 0xE0, |c| c.omcr as u32, |c, v| c.omcr = v as u8),
    entry!("IOCR", 0xE0, |c| c.iocr as u32, |c, v| c.iocr = v as u8),
];

impl Z180 {
    /// The ordered registry of architectural state entries
    pub fn state_table() -> &'static [StateEntry] {
        STATE_TABLE
    }

    /// Read a named state entry (mask applied)
    pub fn state_read(&self, name: &str) -> Result<u32> {
        STATE_TABLE
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| (entry.get)(self) & entry.mask)
            .ok_or_else(|| CoreError::UnknownStateEntry(name.to_string()))
    }

    /// Write a named state entry (mask applied, side effects honored)
    pub fn state_write(&mut self, name: &str, value: u32) -> Result<()> {
        let entry = STATE_TABLE
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| CoreError::UnknownStateEntry(name.to_string()))?;
        (entry.set)(self, value & entry.mask);
        Ok(())
    }
}
