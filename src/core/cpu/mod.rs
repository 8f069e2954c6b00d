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

//! Z180 CPU core
//!
//! The core owns the register file, the on-chip peripherals (MMU, PRT,
//! DMA, ASCI/CSI-O) and the run loop that interleaves instruction
//! execution, DMA transfers and timer ticks against a shared cycle
//! budget.
//!
//! ## Run loop discipline
//!
//! `run(budget)` consumes the budget cooperatively: a latched NMI is
//! serviced on entry; then, per iteration, either DMA channel 0 holds
//! the bus (burst mode) or one instruction executes (with pending
//! interrupts resolved at the boundary first), followed by a
//! cycle-steal DMA window for both channels. The timer block always
//! advances by exactly the cycles the chosen action consumed. The
//! budget may transiently go negative; an instruction once started
//! always completes within the same slice.

use serde::{Deserialize, Serialize};

use crate::core::asci::{Asci, Csio};
use crate::core::bus::{DaisyChain, InputLine, IoLines, IoSpace, MemorySpace};
use crate::core::dma::{DmaEngine, DMA_ADDR_MASK, DSTAT_DME};
use crate::core::error::{CoreError, Result};
use crate::core::interrupt::{Interrupt, PendingSet};
use crate::core::mmu::Mmu;
use crate::core::registers::Registers;
use crate::core::timer::PrtTimers;

mod alu;
mod dma;
mod execute;
mod interrupts;
mod io_ports;
mod state;
#[cfg(test)]
pub(crate) mod tests;
mod timing;

pub use state::StateEntry;

/// ITC: trap flag
pub const ITC_TRAP: u8 = 0x80;
/// ITC: unidentified fetch object (read-only)
pub const ITC_UFO: u8 = 0x40;
/// ITC: INT2 enable
pub const ITC_ITE2: u8 = 0x04;
/// ITC: INT1 enable
pub const ITC_ITE1: u8 = 0x02;
/// ITC: INT0 enable
pub const ITC_ITE0: u8 = 0x01;
/// ITC architectural bit mask
pub const ITC_MASK: u8 = 0xC7;

/// IL architectural bit mask (vector table base bits)
pub const IL_MASK: u8 = 0xE0;

/// RCR: refresh enable
pub const RCR_REFE: u8 = 0x80;
/// RCR: refresh wait
pub const RCR_REFW: u8 = 0x40;
/// RCR architectural bit mask
pub const RCR_MASK: u8 = 0xC3;

/// CMR architectural bit mask
pub const CMR_MASK: u8 = 0xC0;

/// OMCR: M1 enable
pub const OMCR_M1E: u8 = 0x80;
/// OMCR: M1 temporary enable (write-only)
pub const OMCR_M1TE: u8 = 0x40;
/// OMCR: I/O compatibility
pub const OMCR_IOC: u8 = 0x20;
/// OMCR architectural bit mask
pub const OMCR_MASK: u8 = 0xE0;

/// IOCR architectural bit mask (bits 7:6 relocate the internal window)
pub const IOCR_MASK: u8 = 0xE0;

/// Construction-time options for a core instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Raise the TRAP interrupt source on undefined opcodes
    ///
    /// Disable to execute undefined encodings as NOPs instead, which
    /// some loosely written driver ROMs rely on.
    pub trap_on_undefined: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            trap_on_undefined: true,
        }
    }
}

/// The Z180 CPU core
///
/// Built through [`Z180::builder`](Z180::builder); the program and I/O
/// address spaces are mandatory collaborators, the decrypted
/// opcode-fetch space and the daisy-chain resolver are optional.
pub struct Z180 {
    /// CPU-side register file
    pub(crate) regs: Registers,

    /// Memory management unit
    pub(crate) mmu: Mmu,

    /// Programmable reload timers + free-running counter
    pub(crate) timers: PrtTimers,

    /// DMA register state
    pub(crate) dma: DmaEngine,

    /// ASCI channel pair
    pub(crate) asci: Asci,

    /// Clocked serial port
    pub(crate) csio: Csio,

    /// Pending-interrupt set
    pub(crate) pending: PendingSet,

    /// NMI line level and rising-edge latch
    pub(crate) nmi_state: bool,
    pub(crate) nmi_pending: bool,

    /// IRQ0-2 line levels
    pub(crate) irq_state: [bool; 3],

    /// Set while the instruction immediately after EI executes
    pub(crate) after_ei: bool,

    /// I/O line status
    pub(crate) iol: IoLines,

    /// Interrupt vector low register
    pub(crate) il: u8,

    /// Interrupt/trap control register
    pub(crate) itc: u8,

    /// Refresh control register
    pub(crate) rcr: u8,

    /// Clock multiplier register
    pub(crate) cmr: u8,

    /// Chip control register
    pub(crate) ccr: u8,

    /// Operation mode control register
    pub(crate) omcr: u8,

    /// I/O control register
    pub(crate) iocr: u8,

    /// Remaining cycle budget of the current slice
    pub(crate) icount: i32,

    /// Wait-state cycles accrued by the access in flight
    pub(crate) extra_cycles: u32,

    /// Program address space (20-bit)
    pub(crate) program: Box<dyn MemorySpace>,

    /// Separate opcode-fetch space when decrypted opcodes are configured
    pub(crate) opcodes: Option<Box<dyn MemorySpace>>,

    /// I/O address space (16-bit)
    pub(crate) io: Box<dyn IoSpace>,

    /// Daisy-chain priority resolver for INT0
    pub(crate) daisy: Option<Box<dyn DaisyChain>>,

    pub(crate) config: CoreConfig,
}

/// Builder for [`Z180`](Z180)
///
/// Fails at `build()` when a required address space is missing, before
/// any run-loop invocation can happen.
pub struct Z180Builder {
    program: Option<Box<dyn MemorySpace>>,
    opcodes: Option<Box<dyn MemorySpace>>,
    io: Option<Box<dyn IoSpace>>,
    daisy: Option<Box<dyn DaisyChain>>,
    config: CoreConfig,
}

impl Z180Builder {
    /// Attach the program address space (required)
    pub fn program(mut self, space: Box<dyn MemorySpace>) -> Self {
        self.program = Some(space);
        self
    }

    /// Attach a separate opcode-fetch space (decrypted opcodes)
    pub fn opcodes(mut self, space: Box<dyn MemorySpace>) -> Self {
        self.opcodes = Some(space);
        self
    }

    /// Attach the I/O address space (required)
    pub fn io(mut self, space: Box<dyn IoSpace>) -> Self {
        self.io = Some(space);
        self
    }

    /// Attach a daisy-chain priority resolver
    pub fn daisy(mut self, chain: Box<dyn DaisyChain>) -> Self {
        self.daisy = Some(chain);
        self
    }

    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Construct the core in its reset state
    pub fn build(self) -> Result<Z180> {
        let program = self.program.ok_or(CoreError::MissingProgramSpace)?;
        let io = self.io.ok_or(CoreError::MissingIoSpace)?;

        let mut cpu = Z180 {
            regs: Registers::new(),
            mmu: Mmu::new(),
            timers: PrtTimers::new(),
            dma: DmaEngine::new(),
            asci: Asci::new(),
            csio: Csio::new(),
            pending: PendingSet::new(),
            nmi_state: false,
            nmi_pending: false,
            irq_state: [false; 3],
            after_ei: false,
            iol: IoLines::empty(),
            il: 0,
            itc: ITC_ITE0,
            rcr: RCR_REFE | RCR_REFW,
            cmr: 0,
            ccr: 0,
            omcr: OMCR_M1E | OMCR_M1TE | OMCR_IOC,
            iocr: 0,
            icount: 0,
            extra_cycles: 0,
            program,
            opcodes: self.opcodes,
            io,
            daisy: self.daisy,
            config: self.config,
        };
        cpu.reset();
        Ok(cpu)
    }
}

impl Z180 {
    /// Start building a core instance
    pub fn builder() -> Z180Builder {
        Z180Builder {
            program: None,
            opcodes: None,
            io: None,
            daisy: None,
            config: CoreConfig::default(),
        }
    }

    /// Reset the core to its power-on state
    ///
    /// Address spaces and configuration are kept; registers, peripheral
    /// state, line latches and the pending set all clear.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mmu.reset();
        self.timers.reset();
        self.dma.reset();
        self.asci.reset();
        self.csio.reset();
        self.pending.clear_all();
        self.nmi_state = false;
        self.nmi_pending = false;
        self.irq_state = [false; 3];
        self.after_ei = false;
        self.iol = IoLines::empty();
        self.il = 0;
        self.itc = ITC_ITE0;
        self.rcr = RCR_REFE | RCR_REFW;
        self.cmr = 0;
        self.ccr = 0;
        self.omcr = OMCR_M1E | OMCR_M1TE | OMCR_IOC;
        self.iocr = 0;
        self.icount = 0;
        self.extra_cycles = 0;
        log::debug!("core reset");
    }

    /// Execute a cycle slice
    ///
    /// Runs until the budget is exhausted and returns the number of
    /// cycles actually consumed (which may exceed the budget by the
    /// tail of the last instruction or DMA unit).
    pub fn run(&mut self, budget: i32) -> i32 {
        self.icount = budget;

        // NMIs can only be latched from outside a slice, so servicing
        // the latch once on the way in is sufficient
        if self.nmi_pending {
            log::debug!("take NMI");
            self.leave_halt();

            // NMI shuts the DMA engine down
            self.dma.dstat &= !DSTAT_DME;

            self.regs.iff2 = self.regs.iff1;
            self.regs.iff1 = false;
            self.extra_cycles = 0;
            let pc = self.regs.pc.word();
            self.push16(pc);
            self.regs.pc.set_word(0x0066);
            let cycles = 11 + self.take_extra_cycles();
            self.icount -= cycles as i32;
            self.nmi_pending = false;
            self.handle_io_timers(cycles);
        }

        while self.icount > 0 {
            if self.dma.dma_enabled() {
                if self.dma.ch0_burst() {
                    // burst mode: channel 0 owns the bus
                    let used = self.dma0_transfer(self.icount);
                    self.icount -= used as i32;
                    self.handle_io_timers(used);
                    continue;
                }

                self.execute_one();

                // the instruction may have flipped channel 0 into burst
                // mode; re-evaluate before granting cycle-steal windows
                if self.dma.ch0_burst() {
                    continue;
                }

                let used = self.dma0_transfer(6);
                self.icount -= used as i32;
                self.handle_io_timers(used);

                let used = self.dma1_transfer();
                self.icount -= used as i32;
                self.handle_io_timers(used);
            } else {
                self.execute_one();
            }
        }

        budget - self.icount
    }

    /// Resolve interrupts, then execute one instruction (or charge the
    /// halted cost) and advance the timers accordingly
    fn execute_one(&mut self) {
        let int_cycles = self.check_interrupts();
        if int_cycles > 0 {
            self.icount -= int_cycles as i32;
            self.handle_io_timers(int_cycles);
        }
        self.after_ei = false;

        self.regs.prev_pc = self.regs.pc.word();

        let cycles = if !self.regs.halted {
            self.regs.bump_r();
            self.timers.bump_frc();
            self.extra_cycles = 0;
            let op = self.rop();
            let base = self.exec_op(op);
            base + self.take_extra_cycles()
        } else {
            // no fetch while halted, but the counters keep moving
            self.regs.bump_r();
            self.timers.bump_frc();
            3
        };

        self.icount -= cycles as i32;
        self.handle_io_timers(cycles);
    }

    /// Advance the timer block and latch any resulting requests
    pub(crate) fn handle_io_timers(&mut self, cycles: u32) {
        let permitted = self.regs.iff1 && !self.after_ei;
        let request = self.timers.tick(cycles, permitted);
        if request[0] {
            self.pending.request(Interrupt::Prt0);
        }
        if request[1] {
            self.pending.request(Interrupt::Prt1);
        }
    }

    /// Drive an externally visible input line
    ///
    /// NMI is latched on the rising edge; the IRQ lines are level
    /// sensitive (IRQ0 additionally resolved through the daisy chain
    /// when one is attached); the DREQ lines feed the DMA engine.
    pub fn set_input_line(&mut self, line: InputLine, state: bool) {
        match line {
            InputLine::Nmi => {
                if !self.nmi_state && state {
                    self.nmi_pending = true;
                }
                self.nmi_state = state;
            }
            InputLine::Irq0 | InputLine::Irq1 | InputLine::Irq2 => {
                let idx = match line {
                    InputLine::Irq0 => 0,
                    InputLine::Irq1 => 1,
                    _ => 2,
                };
                log::trace!("set_irq_line {idx} = {state}");
                self.irq_state[idx] = state;
                if let Some(daisy) = &self.daisy {
                    self.irq_state[0] = daisy.irq_state();
                }
            }
            InputLine::Dreq0 => {
                let mut iol = self.iol;
                iol.set(IoLines::DREQ0, state);
                self.write_iolines(iol);
            }
            InputLine::Dreq1 => {
                let mut iol = self.iol;
                iol.set(IoLines::DREQ1, state);
                self.write_iolines(iol);
            }
        }
    }

    /// Apply externally driven I/O line states
    ///
    /// Only input lines take effect; attempts to drive core-owned
    /// output lines are ignored.
    pub fn write_iolines(&mut self, lines: IoLines) {
        let changes = self.iol ^ lines;
        let rejected = changes & !IoLines::INPUTS;
        if !rejected.is_empty() {
            log::trace!("iolines: output lines {rejected:?} won't change");
        }
        let applied = changes & IoLines::INPUTS;
        self.iol ^= applied;
        if !applied.is_empty() {
            log::trace!("iolines now {:?}", self.iol);
        }
    }

    /// Current I/O line states (inputs and outputs)
    pub fn iolines(&self) -> IoLines {
        self.iol
    }

    /// Transfer-end output line of DMA channel 0
    pub fn tend0(&self) -> bool {
        self.iol.contains(IoLines::TEND0)
    }

    /// Transfer-end output line of DMA channel 1
    pub fn tend1(&self) -> bool {
        self.iol.contains(IoLines::TEND1)
    }

    /// Register file access (debug/introspection)
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// MMU state (debug/introspection)
    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    /// Timer block state (debug/introspection)
    pub fn timers(&self) -> &PrtTimers {
        &self.timers
    }

    /// DMA register state (debug/introspection)
    pub fn dma(&self) -> &DmaEngine {
        &self.dma
    }

    /// Pending-interrupt set (debug/introspection)
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    #[cfg(test)]
    pub(crate) fn pending_mut_for_tests(&mut self) -> &mut PendingSet {
        &mut self.pending
    }

    /// Translate a logical address through the MMU (debugger aid)
    pub fn translate(&self, logical: u16) -> u32 {
        self.mmu.remap(logical)
    }

    // ---- internal access plumbing ----

    /// Take and clear the wait-state cycles accrued so far
    #[inline(always)]
    pub(crate) fn take_extra_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.extra_cycles)
    }

    /// Read a data byte through the MMU
    #[inline(always)]
    pub(crate) fn rm(&mut self, addr: u16) -> u8 {
        let phys = self.mmu.remap(addr);
        self.extra_cycles += self.dma.memory_wait_states();
        self.program.read_byte(phys)
    }

    /// Write a data byte through the MMU
    #[inline(always)]
    pub(crate) fn wm(&mut self, addr: u16, data: u8) {
        let phys = self.mmu.remap(addr);
        self.extra_cycles += self.dma.memory_wait_states();
        self.program.write_byte(phys, data);
    }

    pub(crate) fn rm16(&mut self, addr: u16) -> u16 {
        let lo = self.rm(addr) as u16;
        let hi = self.rm(addr.wrapping_add(1)) as u16;
        lo | (hi << 8)
    }

    pub(crate) fn wm16(&mut self, addr: u16, data: u16) {
        self.wm(addr, data as u8);
        self.wm(addr.wrapping_add(1), (data >> 8) as u8);
    }

    /// Fetch the next opcode byte (M1 cycle, possibly from the
    /// decrypted-opcode space)
    pub(crate) fn rop(&mut self) -> u8 {
        let addr = self.regs.pc.word();
        self.regs.pc.set_word(addr.wrapping_add(1));
        let phys = self.mmu.remap(addr);
        self.extra_cycles += self.dma.memory_wait_states();
        match &mut self.opcodes {
            Some(space) => space.read_byte(phys),
            None => self.program.read_byte(phys),
        }
    }

    /// Fetch an operand byte (always from the program space)
    pub(crate) fn arg(&mut self) -> u8 {
        let addr = self.regs.pc.word();
        self.regs.pc.set_word(addr.wrapping_add(1));
        let phys = self.mmu.remap(addr);
        self.extra_cycles += self.dma.memory_wait_states();
        self.program.read_byte(phys)
    }

    pub(crate) fn arg16(&mut self) -> u16 {
        let lo = self.arg() as u16;
        let hi = self.arg() as u16;
        lo | (hi << 8)
    }

    pub(crate) fn push16(&mut self, data: u16) {
        let sp = self.regs.sp.word().wrapping_sub(2);
        self.regs.sp.set_word(sp);
        self.wm16(sp, data);
    }

    pub(crate) fn pop16(&mut self) -> u16 {
        let sp = self.regs.sp.word();
        let data = self.rm16(sp);
        self.regs.sp.set_word(sp.wrapping_add(2));
        data
    }

    /// Raw physical-address access for DMA transfers (no MMU, no
    /// implicit wait accounting)
    #[inline(always)]
    pub(crate) fn dma_mem_read(&mut self, addr: u32) -> u8 {
        self.program.read_byte(addr & DMA_ADDR_MASK)
    }

    #[inline(always)]
    pub(crate) fn dma_mem_write(&mut self, addr: u32, data: u8) {
        self.program.write_byte(addr & DMA_ADDR_MASK, data);
    }

    /// Wake from HALT/SLP (interrupt service)
    ///
    /// PC already points past the halting instruction; execution
    /// resumes there after the service routine returns.
    pub(crate) fn leave_halt(&mut self) {
        if self.regs.halted {
            self.regs.halted = false;
        }
    }
}
