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

//! Interrupt resolution at instruction boundaries
//!
//! The external IRQ lines are sampled into the pending set when IFF1 is
//! up and the previous instruction was not EI (one instruction of
//! latency after enabling, as on silicon); the highest-priority pending
//! source is then serviced. NMI never goes through here — it is
//! edge-latched and consumed at slice entry by the run loop.

use crate::core::cpu::{Z180, ITC_ITE0, ITC_ITE1, ITC_ITE2, ITC_TRAP, ITC_UFO};
use crate::core::interrupt::Interrupt;

/// Cycle cost of a mode 0/1 interrupt acknowledge (RST to 0x0038)
const INT_CYCLES_IM01: u32 = 13;

/// Cycle cost of a vectored acknowledge (mode 2 and internal sources)
const INT_CYCLES_VECTORED: u32 = 18;

/// Cycle cost of the TRAP restart
const TRAP_CYCLES: u32 = 11;

impl Z180 {
    /// Sample the IRQ lines and service the highest pending source
    ///
    /// Returns the cycles spent on the acknowledge sequence, zero when
    /// nothing was taken.
    pub(crate) fn check_interrupts(&mut self) -> u32 {
        if self.regs.iff1 && !self.after_ei {
            if self.irq_state[0] && self.itc & ITC_ITE0 != 0 {
                self.pending.request(Interrupt::Irq0);
            }
            if self.irq_state[1] && self.itc & ITC_ITE1 != 0 {
                self.pending.request(Interrupt::Irq1);
            }
            if self.irq_state[2] && self.itc & ITC_ITE2 != 0 {
                self.pending.request(Interrupt::Irq2);
            }
        }

        match self.pending.highest() {
            Some(source) => {
                let cycles = self.take_interrupt(source);
                self.pending.clear(source);
                cycles
            }
            None => 0,
        }
    }

    /// Vector to the service routine of `source`
    fn take_interrupt(&mut self, source: Interrupt) -> u32 {
        self.leave_halt();
        self.extra_cycles = 0;
        log::debug!("take interrupt {source:?} at PC={:04x}", self.regs.pc.word());

        let cycles = match source {
            Interrupt::Trap => {
                // ITC.TRAP/UFO were latched at the offending fetch;
                // the trap restarts execution at logical 0
                let pc = self.regs.pc.word();
                self.push16(pc);
                self.regs.pc.set_word(0x0000);
                TRAP_CYCLES
            }

            Interrupt::Nmi => {
                unreachable!("NMI is serviced at slice entry, never via the pending set")
            }

            Interrupt::Irq0 => {
                let vector = match &mut self.daisy {
                    Some(chain) => chain.irq_ack(),
                    None => 0xFF,
                };
                self.regs.iff1 = false;
                self.regs.iff2 = false;

                let pc = self.regs.pc.word();
                self.push16(pc);
                match self.regs.im {
                    0 | 1 => {
                        self.regs.pc.set_word(0x0038);
                        INT_CYCLES_IM01
                    }
                    _ => {
                        let table = ((self.regs.i as u16) << 8) | vector as u16;
                        let target = self.rm16(table);
                        self.regs.pc.set_word(target);
                        INT_CYCLES_VECTORED
                    }
                }
            }

            _ => {
                // IRQ1/IRQ2 and the internal peripherals autovector
                // through the IL register table
                let offset = match source.vector_offset() {
                    Some(offset) => offset,
                    None => unreachable!("source {source:?} has no IL vector"),
                };
                self.regs.iff1 = false;
                self.regs.iff2 = false;

                let pc = self.regs.pc.word();
                self.push16(pc);
                let table = ((self.regs.i as u16) << 8) | (self.il as u16) | offset as u16;
                let target = self.rm16(table);
                self.regs.pc.set_word(target);
                INT_CYCLES_VECTORED
            }
        };

        cycles + self.take_extra_cycles()
    }

    /// Latch the undefined-opcode trap
    ///
    /// `prefixed` marks a trap raised on the second or third byte of a
    /// prefixed encoding (the UFO bit tells the handler which).
    pub(crate) fn raise_trap(&mut self, prefixed: bool) {
        self.itc |= ITC_TRAP;
        if prefixed {
            self.itc |= ITC_UFO;
        } else {
            self.itc &= !ITC_UFO;
        }
        self.pending.request(Interrupt::Trap);
        log::debug!("TRAP latched at PC={:04x} (prefixed={prefixed})", self.regs.prev_pc);
    }
}
