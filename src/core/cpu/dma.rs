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

//! DMA transfer execution
//!
//! Channel 0 moves bytes between memory and memory (or memory and I/O,
//! gated by DREQ0); channel 1 moves single bytes between memory and
//! I/O under DREQ1 control. Channel 0's I/O legs go through the
//! internal I/O port contract, so a DMA transfer can program internal
//! control registers; channel 1 talks to the external I/O space
//! directly. Both charge a 6-cycle minimum per transferred unit plus
//! the configured memory/I/O wait states.

use crate::core::bus::IoLines;
use crate::core::cpu::Z180;
use crate::core::dma::{
    DCNTL_DIM1, DCNTL_DMS0, DMA_ADDR_MASK, DSTAT_DE0, DSTAT_DE1, DSTAT_DIE0, DSTAT_DIE1,
};
use crate::core::interrupt::Interrupt;

impl Z180 {
    /// Run DMA channel 0 for at most `max_cycles` cycles
    ///
    /// In burst mode (MMOD set) this performs back-to-back transfers
    /// until the byte counter or the budget is exhausted; in cycle
    /// steal mode it performs a single transfer unit. Returns the
    /// cycles consumed.
    pub(crate) fn dma0_transfer(&mut self, max_cycles: i32) -> u32 {
        if self.dma.dstat & DSTAT_DE0 == 0 {
            return 0;
        }

        let mut sar0 = self.dma.sar0;
        let mut dar0 = self.dma.dar0;
        let mut bcr0: u32 = match self.dma.bcr[0] {
            0 => 0x10000, // a zero counter transfers the full 65536 bytes
            n => n as u32,
        };

        let burst = self.dma.dmode & crate::core::dma::DMODE_MMOD != 0;
        let mut count: i64 = if burst { bcr0 as i64 } else { 1 };
        let mut cycles: u32 = 0;

        while count > 0 {
            self.extra_cycles = 0;

            // last transfer happening now?
            if bcr0 == 1 {
                self.iol.insert(IoLines::TEND0);
            }

            let mem_waits = self.dma.memory_wait_states();
            match self.dma.ch0_mode() {
                0x00 => {
                    // memory SAR0+1 to memory DAR0+1
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    sar0 = sar0.wrapping_add(1);
                    dar0 = dar0.wrapping_add(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x04 => {
                    // memory SAR0-1 to memory DAR0+1
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    sar0 = sar0.wrapping_sub(1);
                    dar0 = dar0.wrapping_add(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x08 => {
                    // memory SAR0 fixed to memory DAR0+1
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    dar0 = dar0.wrapping_add(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x0C => {
                    // I/O SAR0 fixed to memory DAR0+1
                    if self.iol.contains(IoLines::DREQ0) {
                        let data = self.io_read(sar0 as u16);
                        self.dma_mem_write(dar0, data);
                        dar0 = dar0.wrapping_add(1);
                        cycles += mem_waits;
                        bcr0 -= 1;
                        if self.dma.dcntl & DCNTL_DMS0 != 0 {
                            // edge sensitive DREQ0
                            self.iol.remove(IoLines::DREQ0);
                            count = 0;
                        }
                    }
                }
                0x10 => {
                    // memory SAR0+1 to memory DAR0-1
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    sar0 = sar0.wrapping_add(1);
                    dar0 = dar0.wrapping_sub(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x14 => {
                    // memory SAR0-1 to memory DAR0-1
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    sar0 = sar0.wrapping_sub(1);
                    dar0 = dar0.wrapping_sub(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x18 => {
                    // memory SAR0 fixed to memory DAR0-1
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    dar0 = dar0.wrapping_sub(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x1C => {
                    // I/O SAR0 fixed to memory DAR0-1
                    if self.iol.contains(IoLines::DREQ0) {
                        let data = self.io_read(sar0 as u16);
                        self.dma_mem_write(dar0, data);
                        dar0 = dar0.wrapping_sub(1);
                        cycles += mem_waits;
                        bcr0 -= 1;
                        if self.dma.dcntl & DCNTL_DMS0 != 0 {
                            self.iol.remove(IoLines::DREQ0);
                            count = 0;
                        }
                    }
                }
                0x20 => {
                    // memory SAR0+1 to memory DAR0 fixed
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    sar0 = sar0.wrapping_add(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x24 => {
                    // memory SAR0-1 to memory DAR0 fixed
                    let data = self.dma_mem_read(sar0);
                    self.dma_mem_write(dar0, data);
                    sar0 = sar0.wrapping_sub(1);
                    cycles += mem_waits * 2;
                    bcr0 -= 1;
                }
                0x30 => {
                    // memory SAR0+1 to I/O DAR0 fixed
                    if self.iol.contains(IoLines::DREQ0) {
                        let data = self.dma_mem_read(sar0);
                        self.io_write(dar0 as u16, data);
                        sar0 = sar0.wrapping_add(1);
                        cycles += mem_waits;
                        bcr0 -= 1;
                        if self.dma.dcntl & DCNTL_DMS0 != 0 {
                            self.iol.remove(IoLines::DREQ0);
                            count = 0;
                        }
                    }
                }
                0x34 => {
                    // memory SAR0-1 to I/O DAR0 fixed
                    if self.iol.contains(IoLines::DREQ0) {
                        let data = self.dma_mem_read(sar0);
                        self.io_write(dar0 as u16, data);
                        sar0 = sar0.wrapping_sub(1);
                        cycles += mem_waits;
                        bcr0 -= 1;
                        if self.dma.dcntl & DCNTL_DMS0 != 0 {
                            self.iol.remove(IoLines::DREQ0);
                            count = 0;
                        }
                    }
                }
                // 0x28/0x2C/0x38/0x3C are reserved encodings
                _ => {}
            }

            count -= 1;
            cycles += 6 + self.take_extra_cycles();
            if cycles as i64 > max_cycles as i64 {
                break;
            }
        }

        self.dma.sar0 = sar0 & DMA_ADDR_MASK;
        self.dma.dar0 = dar0 & DMA_ADDR_MASK;
        self.dma.bcr[0] = bcr0 as u16;

        // terminal count?
        if bcr0 == 0 {
            self.iol.remove(IoLines::TEND0);
            self.dma.dstat &= !DSTAT_DE0;
            if self.dma.dstat & DSTAT_DIE0 != 0 && self.regs.iff1 {
                self.pending.request(Interrupt::Dma0);
            }
            log::debug!("DMA0 terminal count, SAR0={sar0:05x} DAR0={dar0:05x}");
        }

        cycles
    }

    /// Run DMA channel 1 for one transfer opportunity
    ///
    /// Transfers exactly one byte when DREQ1 is asserted and the
    /// channel is enabled; returns the cycles consumed.
    pub(crate) fn dma1_transfer(&mut self) -> u32 {
        if !self.iol.contains(IoLines::DREQ1) {
            return 0;
        }
        if self.dma.dstat & DSTAT_DE1 == 0 {
            return 0;
        }

        let mut mar1 = self.dma.mar1;
        let iar1 = self.dma.iar1 as u16;
        let mut bcr1: u32 = match self.dma.bcr[1] {
            0 => 0x10000,
            n => n as u32,
        };

        // last transfer happening now?
        if bcr1 == 1 {
            self.iol.insert(IoLines::TEND1);
        }

        self.extra_cycles = 0;
        let mut cycles: u32 = 0;

        match self.dma.ch1_mode() {
            0x00 => {
                // memory MAR1+1 to I/O IAR1 fixed
                let data = self.dma_mem_read(mar1);
                self.dma_io_write(iar1, data);
                mar1 = mar1.wrapping_add(1);
            }
            0x01 => {
                // memory MAR1-1 to I/O IAR1 fixed
                let data = self.dma_mem_read(mar1);
                self.dma_io_write(iar1, data);
                mar1 = mar1.wrapping_sub(1);
            }
            0x02 => {
                // I/O IAR1 fixed to memory MAR1+1
                let data = self.dma_io_read(iar1);
                self.dma_mem_write(mar1, data);
                mar1 = mar1.wrapping_add(1);
            }
            _ => {
                // I/O IAR1 fixed to memory MAR1-1
                let data = self.dma_io_read(iar1);
                self.dma_mem_write(mar1, data);
                mar1 = mar1.wrapping_sub(1);
            }
        }
        bcr1 -= 1;

        cycles += self.dma.memory_wait_states();
        cycles += self.take_extra_cycles();

        // edge sensitive DREQ1?
        if self.dma.dcntl & DCNTL_DIM1 != 0 {
            self.iol.remove(IoLines::DREQ1);
        }

        self.dma.mar1 = mar1 & DMA_ADDR_MASK;
        self.dma.bcr[1] = bcr1 as u16;

        // terminal count?
        if bcr1 == 0 {
            self.iol.remove(IoLines::TEND1);
            self.dma.dstat &= !DSTAT_DE1;
            if self.dma.dstat & DSTAT_DIE1 != 0 && self.regs.iff1 {
                self.pending.request(Interrupt::Dma1);
            }
            log::debug!("DMA1 terminal count, MAR1={mar1:05x}");
        }

        // six cycles per transfer (minimum)
        6 + cycles
    }

    /// External I/O access for channel 1 (bypasses the internal window)
    fn dma_io_read(&mut self, port: u16) -> u8 {
        self.extra_cycles += self.dma.io_wait_states();
        self.io.read_byte(port)
    }

    fn dma_io_write(&mut self, port: u16, data: u8) {
        self.extra_cycles += self.dma.io_wait_states();
        self.io.write_byte(port, data);
    }
}
