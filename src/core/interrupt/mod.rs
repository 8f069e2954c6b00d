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

//! Interrupt sources and the pending set
//!
//! One flag per interrupt source, set by the owning subsystem and
//! cleared exclusively by the interrupt controller once serviced.
//! Sources are serviced strictly in priority order, evaluated only at
//! instruction boundaries.
//!
//! ## Priority order (highest first)
//!
//! ```text
//! TRAP   undefined opcode
//! NMI    non-maskable interrupt
//! IRQ0   external request 0 (daisy-chain capable)
//! IRQ1   external request 1
//! IRQ2   external request 2
//! PRT0   timer channel 0 underflow
//! PRT1   timer channel 1 underflow
//! DMA0   DMA channel 0 terminal count
//! DMA1   DMA channel 1 terminal count
//! CSIO   clocked serial port
//! ASCI0  async serial channel 0
//! ASCI1  async serial channel 1
//! ```

/// Interrupt sources in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Undefined opcode trap
    Trap = 0,
    /// Non-maskable interrupt
    Nmi = 1,
    /// External interrupt request 0
    Irq0 = 2,
    /// External interrupt request 1
    Irq1 = 3,
    /// External interrupt request 2
    Irq2 = 4,
    /// PRT channel 0 underflow
    Prt0 = 5,
    /// PRT channel 1 underflow
    Prt1 = 6,
    /// DMA channel 0 terminal count
    Dma0 = 7,
    /// DMA channel 1 terminal count
    Dma1 = 8,
    /// Clocked serial I/O
    Csio = 9,
    /// ASCI channel 0
    Asci0 = 10,
    /// ASCI channel 1
    Asci1 = 11,
}

impl Interrupt {
    /// All sources, highest priority first
    pub const ALL: [Interrupt; 12] = [
        Interrupt::Trap,
        Interrupt::Nmi,
        Interrupt::Irq0,
        Interrupt::Irq1,
        Interrupt::Irq2,
        Interrupt::Prt0,
        Interrupt::Prt1,
        Interrupt::Dma0,
        Interrupt::Dma1,
        Interrupt::Csio,
        Interrupt::Asci0,
        Interrupt::Asci1,
    ];

    /// Priority index (0 = highest)
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Vector table offset for sources that vector through the IL
    /// register (IRQ1 and below); `None` for TRAP/NMI/IRQ0
    pub fn vector_offset(self) -> Option<u8> {
        let idx = self.index();
        if idx >= Interrupt::Irq1.index() {
            Some(((idx - Interrupt::Irq1.index()) as u8) << 1)
        } else {
            None
        }
    }
}

/// The pending-interrupt set
///
/// # Example
///
/// ```
/// use rz180::core::interrupt::{Interrupt, PendingSet};
///
/// let mut pending = PendingSet::new();
/// pending.request(Interrupt::Dma0);
/// pending.request(Interrupt::Prt1);
///
/// // timer outranks DMA terminal count
/// assert_eq!(pending.highest(), Some(Interrupt::Prt1));
/// pending.clear(Interrupt::Prt1);
/// assert_eq!(pending.highest(), Some(Interrupt::Dma0));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingSet {
    bits: u16,
}

impl PendingSet {
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    /// Mark a source pending
    pub fn request(&mut self, source: Interrupt) {
        self.bits |= 1 << source.index();
        log::trace!("INT pending: {:?} (${:03x})", source, self.bits);
    }

    /// Clear a source (interrupt controller only)
    pub fn clear(&mut self, source: Interrupt) {
        self.bits &= !(1 << source.index());
    }

    /// Clear everything (reset)
    pub fn clear_all(&mut self) {
        self.bits = 0;
    }

    #[inline(always)]
    pub fn is_pending(&self, source: Interrupt) -> bool {
        self.bits & (1 << source.index()) != 0
    }

    /// Highest-priority pending source, if any
    pub fn highest(&self) -> Option<Interrupt> {
        if self.bits == 0 {
            return None;
        }
        let idx = self.bits.trailing_zeros() as usize;
        Some(Interrupt::ALL[idx])
    }

    /// Raw bits for state snapshots
    #[inline(always)]
    pub fn raw(&self) -> u16 {
        self.bits
    }

    pub fn set_raw(&mut self, bits: u16) {
        self.bits = bits & 0x0FFF;
    }
}
