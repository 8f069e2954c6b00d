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

//! Internal I/O register port
//!
//! The 64 internal control registers occupy a relocatable window of the
//! I/O space (base selected by IOCR bits 7:6). Every I/O access touches
//! the external I/O space first and the internal register table second;
//! on reads the internal register overrides the external data whenever
//! the (possibly remapped) port lands inside the window. The low 64
//! ports therefore reach the internal table even when the window has
//! been relocated — that double decode is how the silicon behaves and
//! several dependent systems rely on it.
//!
//! Nonexistent internal registers read 0xFF and discard writes.

use crate::core::asci;
use crate::core::cpu::{
    Z180, CMR_MASK, IL_MASK, IOCR_MASK, ITC_MASK, ITC_UFO, OMCR_MASK, OMCR_M1TE, RCR_MASK,
};
use crate::core::dma::{DmaEngine, DMA_ADDR_MASK, IAR1_MASK};

impl Z180 {
    /// Read an I/O port (instruction and DMA channel 0 path)
    ///
    /// External I/O is always consulted; the internal register table
    /// overrides the result for ports inside the internal window.
    pub fn io_read(&mut self, port: u16) -> u8 {
        let data = self.io.read_byte(port);
        self.extra_cycles += self.dma.io_wait_states();

        // remap the relocatable internal window
        let base = (self.iocr & 0xC0) as u16;
        let index = if port & base == base { port - base } else { port };

        if index < 0x40 {
            self.read_internal(index as u8)
        } else {
            data
        }
    }

    /// Write an I/O port (instruction and DMA channel 0 path)
    ///
    /// The write passes through to the external I/O space and is also
    /// stored into the internal register table when it lands inside the
    /// window.
    pub fn io_write(&mut self, port: u16, data: u8) {
        self.io.write_byte(port, data);
        self.extra_cycles += self.dma.io_wait_states();

        let base = (self.iocr & 0xC0) as u16;
        let index = if port & base == base { port - base } else { port };

        if index < 0x40 {
            self.write_internal(index as u8, data);
        }
    }

    fn read_internal(&mut self, index: u8) -> u8 {
        let data = match index {
            0x00 => self.asci.cntla[0],
            0x01 => self.asci.cntla[1],
            0x02 => self.asci.cntlb[0],
            0x03 => self.asci.cntlb[1],
            // TDRE reads back set; shipping drivers poll it
            0x04 => self.asci.stat[0] | asci::STAT0_TDRE,
            0x05 => self.asci.stat[1],
            0x06 => self.asci.tdr[0],
            0x07 => self.asci.tdr[1],
            0x08 => self.asci.rdr[0],
            0x09 => self.asci.rdr[1],
            0x0A => self.csio.read_cntr(),
            0x0B => self.csio.trdr,
            0x0C => self.timers.read_counter_lo(0),
            0x0D => self.timers.read_counter_hi(0),
            0x0E => self.timers.read_reload_lo(0),
            0x0F => self.timers.read_reload_hi(0),
            0x10 => self.timers.read_tcr(),
            0x12 => self.asci.ext[0],
            0x13 => self.asci.ext[1],
            0x14 => self.timers.read_counter_lo(1),
            0x15 => self.timers.read_counter_hi(1),
            0x16 => self.timers.read_reload_lo(1),
            0x17 => self.timers.read_reload_hi(1),
            0x18 => self.timers.frc(),
            0x1A => self.asci.tc[0] as u8,
            0x1B => (self.asci.tc[0] >> 8) as u8,
            0x1C => self.asci.tc[1] as u8,
            0x1D => (self.asci.tc[1] >> 8) as u8,
            0x1E => self.cmr | !CMR_MASK,
            0x1F => self.ccr,
            0x20 => DmaEngine::addr_byte(self.dma.sar0, 0),
            0x21 => DmaEngine::addr_byte(self.dma.sar0, 1),
            0x22 => DmaEngine::addr_byte(self.dma.sar0, 2) & (DMA_ADDR_MASK >> 16) as u8,
            0x23 => DmaEngine::addr_byte(self.dma.dar0, 0),
            0x24 => DmaEngine::addr_byte(self.dma.dar0, 1),
            0x25 => DmaEngine::addr_byte(self.dma.dar0, 2) & (DMA_ADDR_MASK >> 16) as u8,
            0x26 => self.dma.bcr[0] as u8,
            0x27 => (self.dma.bcr[0] >> 8) as u8,
            0x28 => DmaEngine::addr_byte(self.dma.mar1, 0),
            0x29 => DmaEngine::addr_byte(self.dma.mar1, 1),
            0x2A => DmaEngine::addr_byte(self.dma.mar1, 2) & (DMA_ADDR_MASK >> 16) as u8,
            0x2B => DmaEngine::addr_byte(self.dma.iar1, 0),
            0x2C => DmaEngine::addr_byte(self.dma.iar1, 1),
            0x2D => DmaEngine::addr_byte(self.dma.iar1, 2) & (IAR1_MASK >> 16) as u8,
            0x2E => self.dma.bcr[1] as u8,
            0x2F => (self.dma.bcr[1] >> 8) as u8,
            0x30 => self.dma.read_dstat(),
            0x31 => self.dma.read_dmode(),
            0x32 => self.dma.dcntl,
            0x33 => self.il & IL_MASK,
            0x34 => self.itc | !ITC_MASK,
            0x36 => self.rcr | !RCR_MASK,
            0x38 => self.mmu.cbr(),
            0x39 => self.mmu.bbr(),
            0x3A => self.mmu.cbar(),
            0x3E => self.omcr | OMCR_M1TE | !OMCR_MASK,
            0x3F => self.iocr | !IOCR_MASK,
            // nonexistent registers read all-ones
            _ => 0xFF,
        };
        log::trace!("io rd ${index:02x} -> ${data:02x}");
        data
    }

    fn write_internal(&mut self, index: u8, data: u8) {
        log::trace!("io wr ${index:02x} <- ${data:02x}");
        match index {
            0x00 => self.asci.cntla[0] = data,
            0x01 => self.asci.cntla[1] = data,
            0x02 => self.asci.cntlb[0] = data,
            0x03 => self.asci.cntlb[1] = data,
            0x04 => self.asci.write_stat(0, data),
            0x05 => self.asci.write_stat(1, data),
            0x06 => self.asci.tdr[0] = data,
            0x07 => self.asci.tdr[1] = data,
            0x08 => self.asci.rdr[0] = data,
            0x09 => self.asci.rdr[1] = data,
            0x0A => self.csio.write_cntr(data),
            0x0B => self.csio.trdr = data,
            0x0C => self.timers.write_counter_lo(0, data),
            0x0D => self.timers.write_counter_hi(0, data),
            0x0E => self.timers.write_reload_lo(0, data),
            0x0F => self.timers.write_reload_hi(0, data),
            0x10 => self.timers.write_tcr(data),
            0x12 => self.asci.write_ext(0, data),
            0x13 => self.asci.write_ext(1, data),
            0x14 => self.timers.write_counter_lo(1, data),
            0x15 => self.timers.write_counter_hi(1, data),
            0x16 => self.timers.write_reload_lo(1, data),
            0x17 => self.timers.write_reload_hi(1, data),
            0x18 => {} // FRC is read-only
            0x1A => self.asci.tc[0] = (self.asci.tc[0] & 0xFF00) | data as u16,
            0x1B => self.asci.tc[0] = (self.asci.tc[0] & 0x00FF) | ((data as u16) << 8),
            0x1C => self.asci.tc[1] = (self.asci.tc[1] & 0xFF00) | data as u16,
            0x1D => self.asci.tc[1] = (self.asci.tc[1] & 0x00FF) | ((data as u16) << 8),
            0x1E => self.cmr = data & CMR_MASK,
            0x1F => self.ccr = data,
            0x20 => self.dma.sar0 = DmaEngine::set_addr_byte(self.dma.sar0, 0, data, DMA_ADDR_MASK),
            0x21 => self.dma.sar0 = DmaEngine::set_addr_byte(self.dma.sar0, 1, data, DMA_ADDR_MASK),
            0x22 => self.dma.sar0 = DmaEngine::set_addr_byte(self.dma.sar0, 2, data, DMA_ADDR_MASK),
            0x23 => self.dma.dar0 = DmaEngine::set_addr_byte(self.dma.dar0, 0, data, DMA_ADDR_MASK),
            0x24 => self.dma.dar0 = DmaEngine::set_addr_byte(self.dma.dar0, 1, data, DMA_ADDR_MASK),
            0x25 => self.dma.dar0 = DmaEngine::set_addr_byte(self.dma.dar0, 2, data, DMA_ADDR_MASK),
            0x26 => self.dma.bcr[0] = (self.dma.bcr[0] & 0xFF00) | data as u16,
            0x27 => self.dma.bcr[0] = (self.dma.bcr[0] & 0x00FF) | ((data as u16) << 8),
            0x28 => self.dma.mar1 = DmaEngine::set_addr_byte(self.dma.mar1, 0, data, DMA_ADDR_MASK),
            0x29 => self.dma.mar1 = DmaEngine::set_addr_byte(self.dma.mar1, 1, data, DMA_ADDR_MASK),
            0x2A => self.dma.mar1 = DmaEngine::set_addr_byte(self.dma.mar1, 2, data, DMA_ADDR_MASK),
            0x2B => self.dma.iar1 = DmaEngine::set_addr_byte(self.dma.iar1, 0, data, IAR1_MASK),
            0x2C => self.dma.iar1 = DmaEngine::set_addr_byte(self.dma.iar1, 1, data, IAR1_MASK),
            0x2D => self.dma.iar1 = DmaEngine::set_addr_byte(self.dma.iar1, 2, data, IAR1_MASK),
            0x2E => self.dma.bcr[1] = (self.dma.bcr[1] & 0xFF00) | data as u16,
            0x2F => self.dma.bcr[1] = (self.dma.bcr[1] & 0x00FF) | ((data as u16) << 8),
            0x30 => self.dma.write_dstat(data),
            0x31 => self.dma.write_dmode(data),
            0x32 => self.dma.write_dcntl(data),
            0x33 => self.il = data & IL_MASK,
            0x34 => self.itc = (self.itc & ITC_UFO) | (data & ITC_MASK & !ITC_UFO),
            0x36 => self.rcr = data & RCR_MASK,
            0x38 => self.mmu.write_cbr(data),
            0x39 => self.mmu.write_bbr(data),
            0x3A => self.mmu.write_cbar(data),
            0x3E => self.omcr = data & OMCR_MASK,
            0x3F => self.iocr = data & IOCR_MASK,
            // nonexistent registers discard writes
            _ => {}
        }
    }
}
