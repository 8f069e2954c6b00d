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

//! External collaborator contracts
//!
//! The core consumes three narrow interfaces supplied by the
//! surrounding system: a byte-addressable program space (20-bit
//! physical addresses, optionally shadowed by a decrypted opcode-fetch
//! space), a byte-addressable I/O space (16-bit ports) and an optional
//! daisy-chain priority resolver for the INT0 line. Interrupt and DMA
//! request lines are pushed into the core through
//! [`InputLine`](InputLine) setters; the core never polls.

use bitflags::bitflags;

/// Byte-addressable memory space (20-bit address width)
pub trait MemorySpace {
    fn read_byte(&mut self, addr: u32) -> u8;
    fn write_byte(&mut self, addr: u32, data: u8);
}

/// Byte-addressable I/O space (16-bit address width)
pub trait IoSpace {
    fn read_byte(&mut self, port: u16) -> u8;
    fn write_byte(&mut self, port: u16, data: u8);
}

/// Daisy-chained interrupt priority resolution
///
/// Queried for the effective combined INT0 line state whenever an IRQ
/// line changes, and for the service vector byte when an INT0 request
/// is taken in interrupt mode 2.
pub trait DaisyChain {
    /// Combined INT0 request state of the chain
    fn irq_state(&self) -> bool;

    /// Acknowledge the highest-priority device and return its vector byte
    fn irq_ack(&mut self) -> u8;
}

/// Externally driven input lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLine {
    /// Non-maskable interrupt (edge latched on the rising transition)
    Nmi,
    /// Maskable interrupt request 0 (daisy-chain capable)
    Irq0,
    /// Maskable interrupt request 1
    Irq1,
    /// Maskable interrupt request 2
    Irq2,
    /// DMA channel 0 request
    Dreq0,
    /// DMA channel 1 request
    Dreq1,
}

bitflags! {
    /// I/O line status bits
    ///
    /// One bit per package pin of interest, input and output lines
    /// alike. Output lines (RTS0, TEND0/1, TOUT, TXA0/1, TXS) are owned
    /// by the core; attempts to drive them from outside are ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IoLines: u32 {
        /// I/O asynchronous clock 0 (or DREQ0, muxed)
        const CKA0 = 0x0000_0001;
        /// I/O asynchronous clock 1 (or TEND1, muxed)
        const CKA1 = 0x0000_0002;
        /// I/O serial clock
        const CKS = 0x0000_0004;
        /// Input: clear to send 0 (active low)
        const CTS0 = 0x0000_0100;
        /// Input: clear to send 1 (active low, or RXS muxed)
        const CTS1 = 0x0000_0200;
        /// Input: data carrier detect (active low)
        const DCD0 = 0x0000_0400;
        /// Input: DMA channel 0 data request (active low, or CKA0 muxed)
        const DREQ0 = 0x0000_0800;
        /// Input: DMA channel 1 data request (active low)
        const DREQ1 = 0x0000_1000;
        /// Input: asynchronous receive data 0
        const RXA0 = 0x0000_2000;
        /// Input: asynchronous receive data 1
        const RXA1 = 0x0000_4000;
        /// Input: clocked serial receive data (or CTS1 muxed)
        const RXS = 0x0000_8000;
        /// Output: request to send (active low)
        const RTS0 = 0x0001_0000;
        /// Output: transfer end 0 (active low, or CKA1 muxed)
        const TEND0 = 0x0002_0000;
        /// Output: transfer end 1 (active low)
        const TEND1 = 0x0004_0000;
        /// Output: timer out (PRT channel, active low, or A18 muxed)
        const A18_TOUT = 0x0008_0000;
        /// Output: asynchronous transmit data 0
        const TXA0 = 0x0010_0000;
        /// Output: asynchronous transmit data 1
        const TXA1 = 0x0020_0000;
        /// Output: clocked serial transmit data
        const TXS = 0x0040_0000;
    }
}

impl IoLines {
    /// Input lines the external system is allowed to drive
    pub const INPUTS: IoLines = IoLines::CKA0
        .union(IoLines::CKA1)
        .union(IoLines::CKS)
        .union(IoLines::CTS0)
        .union(IoLines::CTS1)
        .union(IoLines::DCD0)
        .union(IoLines::DREQ0)
        .union(IoLines::DREQ1)
        .union(IoLines::RXA0)
        .union(IoLines::RXA1)
        .union(IoLines::RXS);
}
