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

//! CPU core unit tests
//!
//! Programs are hand-assembled byte strings executed on a 64K shared
//! RAM; the test I/O space answers 0xAA and records writes so the
//! internal-window double decode can be observed from outside.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::bus::{DaisyChain, InputLine, IoSpace, MemorySpace};
use crate::core::cpu::{Z180, ITC_TRAP, ITC_UFO};
use crate::core::dma::{DMODE_MMOD, DSTAT_DE0, DSTAT_DE1, DSTAT_DIE0};
use crate::core::flags::{CF, HF, NF, SF, VF, ZF};
use crate::core::interrupt::Interrupt;
use crate::core::timer::{TCR_TDE0, TCR_TIE0, TCR_TIF0};

/// 64K RAM shared between the core and the test body
pub(crate) struct SharedRam(pub Rc<RefCell<Vec<u8>>>);

impl MemorySpace for SharedRam {
    fn read_byte(&mut self, addr: u32) -> u8 {
        self.0.borrow()[addr as usize & 0xFFFF]
    }

    fn write_byte(&mut self, addr: u32, data: u8) {
        self.0.borrow_mut()[addr as usize & 0xFFFF] = data;
    }
}

/// External I/O space answering 0xAA, with a write log
#[derive(Default)]
pub(crate) struct IoLog {
    pub writes: Vec<(u16, u8)>,
}

pub(crate) struct SharedIo(pub Rc<RefCell<IoLog>>);

impl IoSpace for SharedIo {
    fn read_byte(&mut self, _port: u16) -> u8 {
        0xAA
    }

    fn write_byte(&mut self, port: u16, data: u8) {
        self.0.borrow_mut().writes.push((port, data));
    }
}

/// Build a core with `program` at address 0 and no wait states
pub(crate) fn test_core_with_ram(program: &[u8]) -> (Z180, Rc<RefCell<Vec<u8>>>) {
    let mut mem = vec![0u8; 0x10000];
    mem[..program.len()].copy_from_slice(program);
    let ram = Rc::new(RefCell::new(mem));
    let io = Rc::new(RefCell::new(IoLog::default()));

    let mut cpu = Z180::builder()
        .program(Box::new(SharedRam(ram.clone())))
        .io(Box::new(SharedIo(io)))
        .build()
        .unwrap();
    // drop the reset-default wait states so cycle math stays exact
    cpu.io_write(0x32, 0x00);
    (cpu, ram)
}

pub(crate) fn test_core(program: &[u8]) -> Z180 {
    test_core_with_ram(program).0
}

fn test_core_with_io(program: &[u8]) -> (Z180, Rc<RefCell<IoLog>>) {
    let mut mem = vec![0u8; 0x10000];
    mem[..program.len()].copy_from_slice(program);
    let ram = Rc::new(RefCell::new(mem));
    let io = Rc::new(RefCell::new(IoLog::default()));

    let mut cpu = Z180::builder()
        .program(Box::new(SharedRam(ram)))
        .io(Box::new(SharedIo(io.clone())))
        .build()
        .unwrap();
    cpu.io_write(0x32, 0x00);
    (cpu, io)
}

#[test]
fn test_builder_requires_address_spaces() {
    assert!(Z180::builder().build().is_err());

    let ram = Rc::new(RefCell::new(vec![0u8; 0x10000]));
    assert!(Z180::builder()
        .program(Box::new(SharedRam(ram)))
        .build()
        .is_err());
}

#[test]
fn test_reset_state() {
    let cpu = test_core(&[]);
    let regs = cpu.registers();
    assert_eq!(regs.pc.word(), 0);
    assert_eq!(regs.ix.word(), 0xFFFF);
    assert_eq!(regs.iy.word(), 0xFFFF);
    assert_eq!(regs.f(), ZF);
    assert!(!regs.iff1);
    assert_eq!(cpu.timers().counter(0), 0xFFFF);
}

#[test]
fn test_nop_timing_and_pc() {
    let mut cpu = test_core(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    let consumed = cpu.run(12);
    assert_eq!(consumed, 12); // four NOPs at 3 cycles each
    assert_eq!(cpu.registers().pc.word(), 4);
}

#[test]
fn test_run_overshoots_only_by_instruction_tail() {
    // budget lands mid-instruction: the NOP still completes
    let mut cpu = test_core(&[0x00, 0x00]);
    let consumed = cpu.run(4);
    assert_eq!(consumed, 6);
    assert_eq!(cpu.registers().pc.word(), 2);
}

#[test]
fn test_ld_and_add_immediate() {
    // LD A,0x12 ; ADD A,0x34
    let mut cpu = test_core(&[0x3E, 0x12, 0xC6, 0x34]);
    cpu.run(12);
    assert_eq!(cpu.registers().a(), 0x46);
    assert_eq!(cpu.registers().f() & (ZF | CF | NF), 0);
}

#[test]
fn test_add_sets_carry_zero_half() {
    // LD A,0xFF ; ADD A,0x01
    let mut cpu = test_core(&[0x3E, 0xFF, 0xC6, 0x01]);
    cpu.run(12);
    assert_eq!(cpu.registers().a(), 0x00);
    let f = cpu.registers().f();
    assert_eq!(f & (ZF | CF | HF), ZF | CF | HF);
}

#[test]
fn test_sub_sets_borrow() {
    // LD A,0x10 ; SUB 0x20
    let mut cpu = test_core(&[0x3E, 0x10, 0xD6, 0x20]);
    cpu.run(12);
    assert_eq!(cpu.registers().a(), 0xF0);
    let f = cpu.registers().f();
    assert_eq!(f & (CF | NF | SF), CF | NF | SF);
}

#[test]
fn test_inc_overflow_edge() {
    // LD A,0x7F ; INC A
    let mut cpu = test_core(&[0x3E, 0x7F, 0x3C]);
    cpu.run(10);
    assert_eq!(cpu.registers().a(), 0x80);
    let f = cpu.registers().f();
    assert_eq!(f & (VF | SF | HF), VF | SF | HF);
}

#[test]
fn test_add16_and_loads() {
    // LD HL,0x1234 ; LD BC,0x0FFF ; ADD HL,BC
    let mut cpu = test_core(&[0x21, 0x34, 0x12, 0x01, 0xFF, 0x0F, 0x09]);
    cpu.run(25);
    assert_eq!(cpu.registers().hl.word(), 0x2233);
    assert_eq!(cpu.registers().f() & HF, HF); // carry out of bit 11
}

#[test]
fn test_memory_store_and_load() {
    // LD A,0x5A ; LD (0x8000),A ; LD B,A
    let (mut cpu, ram) = test_core_with_ram(&[0x3E, 0x5A, 0x32, 0x00, 0x80, 0x47]);
    cpu.run(23);
    assert_eq!(ram.borrow()[0x8000], 0x5A);
    assert_eq!(cpu.registers().bc.hi(), 0x5A);
}

#[test]
fn test_stack_and_call_ret() {
    // LD SP,0xF000 ; CALL 0x0010 ; HALT ; pad ; at 0x10: LD A,7 ; RET
    let mut program = vec![0x31, 0x00, 0xF0, 0xCD, 0x10, 0x00, 0x76];
    program.resize(0x10, 0x00);
    program.extend_from_slice(&[0x3E, 0x07, 0xC9]);
    let (mut cpu, ram) = test_core_with_ram(&program);
    cpu.run(60);
    assert_eq!(cpu.registers().a(), 0x07);
    assert!(cpu.registers().halted);
    // return address 0x0006 was pushed at 0xEFFE/0xEFFF
    assert_eq!(ram.borrow()[0xEFFE], 0x06);
    assert_eq!(ram.borrow()[0xEFFF], 0x00);
    assert_eq!(cpu.registers().sp.word(), 0xF000);
}

#[test]
fn test_djnz_loop() {
    // LD B,3 ; INC A ; DJNZ -3 ; HALT
    let mut cpu = test_core(&[0x06, 0x03, 0x3C, 0x10, 0xFD, 0x76]);
    cpu.run(60);
    assert_eq!(cpu.registers().a(), 3);
    assert_eq!(cpu.registers().bc.hi(), 0);
    assert!(cpu.registers().halted);
}

#[test]
fn test_exx_and_ex_af() {
    // LD BC,0x1111 ; EX AF,AF' ; EXX ; LD BC,0x2222 ; HALT
    let mut cpu = test_core(&[0x01, 0x11, 0x11, 0x08, 0xD9, 0x01, 0x22, 0x22, 0x76]);
    cpu.run(40);
    assert_eq!(cpu.registers().bc.word(), 0x2222);
    assert_eq!(cpu.registers().bc2.word(), 0x1111);
}

#[test]
fn test_halt_charges_three_cycles_and_counts() {
    let mut cpu = test_core(&[0x76]);
    cpu.run(3); // executes HALT
    assert!(cpu.registers().halted);
    let pc = cpu.registers().pc.word();
    let r_before = cpu.registers().r;
    let frc_before = cpu.timers().frc();

    let consumed = cpu.run(9);
    assert_eq!(consumed, 9); // three halted iterations
    assert_eq!(cpu.registers().pc.word(), pc);
    // refresh and free-running counters keep moving while halted
    assert_eq!(cpu.registers().r.wrapping_sub(r_before), 3);
    assert_eq!(cpu.timers().frc().wrapping_sub(frc_before), 3);
}

#[test]
fn test_ei_has_one_instruction_latency() {
    // EI ; NOP ; NOP...  IRQ0 asserted the whole time, IM defaults to
    // the fixed 0x0038 vector
    let mut cpu = test_core(&[0xFB, 0x00, 0x00, 0x00]);
    cpu.set_input_line(InputLine::Irq0, true);

    // EI executes, then exactly one more instruction before the
    // interrupt is accepted
    let consumed = cpu.run(9);
    assert_eq!(consumed, 6 + 13 + 3); // EI, NOP, acknowledge, first handler op
    assert_eq!(cpu.registers().pc.word(), 0x0039);
    assert!(!cpu.registers().iff1);
}

#[test]
fn test_irq_masked_by_itc() {
    let mut cpu = test_core(&[0xFB, 0x00, 0x00, 0x00, 0x00, 0x00]);
    cpu.io_write(0x34, 0x00); // clear ITC.ITE0
    cpu.set_input_line(InputLine::Irq0, true);
    cpu.run(18);
    // no vectoring happened; execution stayed in the NOP run
    assert!(cpu.registers().pc.word() < 0x10);
}

#[test]
fn test_nmi_edge_latch_and_vector() {
    let mut cpu = test_core(&[0x00; 32]);
    cpu.registers_mut().sp.set_word(0xF000);

    cpu.set_input_line(InputLine::Nmi, true);
    cpu.run(14); // 11-cycle NMI acknowledge + one NOP at 0x0066
    assert_eq!(cpu.registers().pc.word(), 0x0067);

    // still asserted: no second service without a new rising edge
    let pc = cpu.registers().pc.word();
    cpu.run(6);
    assert_eq!(cpu.registers().pc.word(), pc + 2);

    // falling then rising edge latches a second NMI
    cpu.set_input_line(InputLine::Nmi, false);
    cpu.set_input_line(InputLine::Nmi, true);
    cpu.run(14);
    assert_eq!(cpu.registers().pc.word(), 0x0067);
}

#[test]
fn test_nmi_swaps_iff_and_disables_dma() {
    let mut cpu = test_core(&[0x00; 16]);
    cpu.registers_mut().sp.set_word(0xF000);
    cpu.registers_mut().iff1 = true;
    cpu.registers_mut().iff2 = true;
    cpu.io_write(0x30, DSTAT_DE0); // raises DME
    assert!(cpu.dma().dma_enabled());

    cpu.set_input_line(InputLine::Nmi, true);
    cpu.run(11);
    assert!(!cpu.registers().iff1);
    assert!(cpu.registers().iff2);
    assert!(!cpu.dma().dma_enabled());
}

struct FixedDaisy {
    vector: u8,
}

impl DaisyChain for FixedDaisy {
    fn irq_state(&self) -> bool {
        true
    }

    fn irq_ack(&mut self) -> u8 {
        self.vector
    }
}

#[test]
fn test_im2_vector_through_daisy_chain() {
    let mut mem = vec![0u8; 0x10000];
    mem[0x3010] = 0x34; // vector table entry -> 0x1234
    mem[0x3011] = 0x12;
    let ram = Rc::new(RefCell::new(mem));
    let io = Rc::new(RefCell::new(IoLog::default()));
    let mut cpu = Z180::builder()
        .program(Box::new(SharedRam(ram)))
        .io(Box::new(SharedIo(io)))
        .daisy(Box::new(FixedDaisy { vector: 0x10 }))
        .build()
        .unwrap();
    cpu.io_write(0x32, 0x00);

    cpu.registers_mut().sp.set_word(0xF000);
    cpu.registers_mut().i = 0x30;
    cpu.registers_mut().im = 2;
    cpu.registers_mut().iff1 = true;
    cpu.registers_mut().iff2 = true;
    cpu.set_input_line(InputLine::Irq0, true);

    cpu.run(20); // 18-cycle acknowledge + first handler instruction
    assert_eq!(cpu.registers().pc.word(), 0x1235);
}

#[test]
fn test_undefined_opcode_traps() {
    // JP 0x0100 ; at 0x0100: ED 55, which has no meaning on this part
    let mut program = vec![0xC3, 0x00, 0x01];
    program.resize(0x100, 0x00);
    program.extend_from_slice(&[0xED, 0x55]);
    let (mut cpu, ram) = test_core_with_ram(&program);
    cpu.registers_mut().sp.set_word(0xF000);

    cpu.run(9); // JP
    cpu.run(6); // the undefined encoding
    let itc = cpu.state_read("ITC").unwrap() as u8;
    assert_eq!(itc & (ITC_TRAP | ITC_UFO), ITC_TRAP | ITC_UFO);
    assert!(cpu.pending().is_pending(Interrupt::Trap));

    // the trap restarts at logical 0, which jumps away again
    cpu.run(11);
    assert!(!cpu.pending().is_pending(Interrupt::Trap));
    // pushed PC pointed past the offending encoding (0x0102)
    assert_eq!(ram.borrow()[0xEFFE], 0x02);
    assert_eq!(ram.borrow()[0xEFFF], 0x01);
}

#[test]
fn test_trap_can_be_disabled() {
    let mut cpu = {
        let mut mem = vec![0u8; 0x10000];
        mem[0] = 0xED;
        mem[1] = 0x55;
        let ram = Rc::new(RefCell::new(mem));
        let io = Rc::new(RefCell::new(IoLog::default()));
        Z180::builder()
            .program(Box::new(SharedRam(ram)))
            .io(Box::new(SharedIo(io)))
            .config(crate::core::cpu::CoreConfig {
                trap_on_undefined: false,
            })
            .build()
            .unwrap()
    };
    cpu.io_write(0x32, 0x00);
    cpu.run(6);
    assert!(!cpu.pending().is_pending(Interrupt::Trap));
}

#[test]
fn test_mlt_multiplies_pair_halves() {
    // LD HL,0x0C0D ; MLT HL (ED 6C)
    let mut cpu = test_core(&[0x21, 0x0D, 0x0C, 0xED, 0x6C]);
    cpu.run(30);
    assert_eq!(cpu.registers().hl.word(), 0x0C * 0x0D);
}

#[test]
fn test_tst_preserves_accumulator() {
    // LD A,0xF0 ; TST 0x0F (ED 64)
    let mut cpu = test_core(&[0x3E, 0xF0, 0xED, 0x64, 0x0F]);
    cpu.run(20);
    assert_eq!(cpu.registers().a(), 0xF0);
    let f = cpu.registers().f();
    assert_eq!(f & (ZF | HF), ZF | HF);
    assert_eq!(f & CF, 0);
}

#[test]
fn test_out0_reaches_internal_window_and_external_bus() {
    // OUT0 (0x3F),A writes IOCR: both the external bus and the
    // internal register see it
    let (mut cpu, io) = test_core_with_io(&[0x3E, 0xC0, 0xED, 0x39, 0x3F]);
    cpu.run(25);
    assert_eq!(cpu.state_read("IOCR").unwrap(), 0xC0);
    assert!(io.borrow().writes.contains(&(0x3F, 0xC0)));
}

#[test]
fn test_indexed_load_store() {
    // LD IX,0x8000 ; LD (IX+5),0x77 ; LD B,(IX+5)
    let (mut cpu, ram) = test_core_with_ram(&[
        0xDD, 0x21, 0x00, 0x80, // LD IX,0x8000
        0xDD, 0x36, 0x05, 0x77, // LD (IX+5),0x77
        0xDD, 0x46, 0x05, // LD B,(IX+5)
    ]);
    cpu.run(50);
    assert_eq!(ram.borrow()[0x8005], 0x77);
    assert_eq!(cpu.registers().bc.hi(), 0x77);
}

#[test]
fn test_cb_bit_operations() {
    // LD A,0x00 ; SET 3,A ; BIT 3,A ; RES 3,A
    let mut cpu = test_core(&[0x3E, 0x00, 0xCB, 0xDF, 0xCB, 0x5F, 0xCB, 0x9F]);
    cpu.run(14); // through SET
    assert_eq!(cpu.registers().a(), 0x08);
    cpu.run(7); // BIT
    assert_eq!(cpu.registers().f() & ZF, 0);
    cpu.run(7); // RES
    assert_eq!(cpu.registers().a(), 0x00);
}

#[test]
fn test_block_transfer_ldir() {
    // LD HL,0x8000 ; LD DE,0x9000 ; LD BC,3 ; LDIR ; HALT
    let (mut cpu, ram) = test_core_with_ram(&[
        0x21, 0x00, 0x80, 0x11, 0x00, 0x90, 0x01, 0x03, 0x00, 0xED, 0xB0, 0x76,
    ]);
    {
        let mut mem = ram.borrow_mut();
        mem[0x8000..0x8003].copy_from_slice(&[0xDE, 0xAD, 0xBF]);
    }
    cpu.run(120);
    assert_eq!(&ram.borrow()[0x9000..0x9003], &[0xDE, 0xAD, 0xBF]);
    assert_eq!(cpu.registers().bc.word(), 0);
    assert_eq!(cpu.registers().hl.word(), 0x8003);
    assert_eq!(cpu.registers().de.word(), 0x9003);
    assert_eq!(cpu.registers().f() & VF, 0);
}

#[test]
fn test_internal_window_relocation_keeps_low_fallback() {
    let (mut cpu, _io) = test_core_with_io(&[]);
    cpu.io_write(0x3F, 0x40); // move the internal window to 0x40

    // CNTLA0 reset value is visible at the relocated window...
    let relocated = cpu.io_read(0x40);
    // ...and still at the low ports (hardware double decode)
    let low = cpu.io_read(0x00);
    assert_eq!(relocated, low);

    // ports outside both windows are pure external I/O
    assert_eq!(cpu.io_read(0x180), 0xAA);
}

#[test]
fn test_nonexistent_internal_register_reads_ff() {
    let mut cpu = test_core(&[]);
    assert_eq!(cpu.io_read(0x11), 0xFF);
    assert_eq!(cpu.io_read(0x35), 0xFF);
    assert_eq!(cpu.io_read(0x3B), 0xFF);
    // writes are discarded without effect
    cpu.io_write(0x11, 0x55);
    assert_eq!(cpu.io_read(0x11), 0xFF);
}

#[test]
fn test_in_instruction_reads_internal_register() {
    // LD A,0x05 ; LD C,0x3F wait - use IN0: IN0 A,(0x34) reads ITC
    let mut cpu = test_core(&[0xED, 0x38, 0x34]);
    cpu.run(12);
    // ITC resets to ITE0 with the undefined bits reading high
    assert_eq!(cpu.registers().a(), 0x01 | 0x38);
}

#[test]
fn test_dma0_cycle_steal_interleaves_with_instructions() {
    // the program just burns NOPs while DMA copies 4 bytes
    let (mut cpu, ram) = test_core_with_ram(&[0x00; 64]);
    {
        let mut mem = ram.borrow_mut();
        mem[0x1000..0x1004].copy_from_slice(&[0x11, 0x22, 0x33, 0x44]);
    }
    cpu.io_write(0x20, 0x00); // SAR0 = 0x1000
    cpu.io_write(0x21, 0x10);
    cpu.io_write(0x22, 0x00);
    cpu.io_write(0x23, 0x00); // DAR0 = 0x2000
    cpu.io_write(0x24, 0x20);
    cpu.io_write(0x25, 0x00);
    cpu.io_write(0x26, 0x04); // BCR0 = 4
    cpu.io_write(0x27, 0x00);
    cpu.io_write(0x31, 0x00); // memory++ to memory++, cycle steal
    cpu.io_write(0x30, DSTAT_DE0); // enable channel 0

    cpu.run(60);
    assert_eq!(&ram.borrow()[0x2000..0x2004], &[0x11, 0x22, 0x33, 0x44]);
    assert_eq!(cpu.dma().sar0, 0x1004);
    assert_eq!(cpu.dma().dar0, 0x2004);
    assert_eq!(cpu.dma().dstat & DSTAT_DE0, 0);
    assert!(!cpu.tend0());
}

#[test]
fn test_dma0_terminal_count_interrupt_needs_iff1() {
    let (mut cpu, _ram) = test_core_with_ram(&[0x00; 64]);
    cpu.io_write(0x26, 0x02);
    cpu.io_write(0x27, 0x00);
    cpu.io_write(0x31, 0x00);
    cpu.io_write(0x30, DSTAT_DE0 | DSTAT_DIE0);
    cpu.run(40);
    // IFF1 clear: terminal count must not mark the source pending
    assert!(!cpu.pending().is_pending(Interrupt::Dma0));
}

#[test]
fn test_dma0_burst_owns_the_bus() {
    let (mut cpu, ram) = test_core_with_ram(&[0x00; 64]);
    {
        let mut mem = ram.borrow_mut();
        for i in 0..8 {
            mem[0x1000 + i] = i as u8;
        }
    }
    cpu.io_write(0x21, 0x10); // SAR0 = 0x1000
    cpu.io_write(0x24, 0x20); // DAR0 = 0x2000
    cpu.io_write(0x26, 0x08); // BCR0 = 8
    cpu.io_write(0x31, DMODE_MMOD); // burst
    cpu.io_write(0x30, DSTAT_DE0);

    // 8 transfers at 6 cycles each run back to back; no instruction
    // executes until the channel finishes
    cpu.run(48);
    assert_eq!(cpu.registers().pc.word(), 0);
    assert_eq!(&ram.borrow()[0x2000..0x2008], &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(cpu.dma().dstat & DSTAT_DE0, 0);
}

#[test]
fn test_dma1_requires_request_line() {
    let (mut cpu, ram) = test_core_with_ram(&[0x00; 64]);
    ram.borrow_mut()[0x3000] = 0x99;
    cpu.io_write(0x28, 0x00); // MAR1 = 0x3000
    cpu.io_write(0x29, 0x30);
    cpu.io_write(0x2B, 0x80); // IAR1 = 0x0080
    cpu.io_write(0x2C, 0x00);
    cpu.io_write(0x2E, 0x01); // BCR1 = 1
    cpu.io_write(0x2F, 0x00);
    cpu.io_write(0x32, 0x00); // memory+ -> I/O
    cpu.io_write(0x30, DSTAT_DE1);

    cpu.run(20);
    assert_eq!(cpu.dma().bcr[1], 1, "no transfer without DREQ1");

    cpu.set_input_line(InputLine::Dreq1, true);
    cpu.run(20);
    assert_eq!(cpu.dma().bcr[1], 0);
    assert_eq!(cpu.dma().dstat & DSTAT_DE1, 0);
    assert_eq!(cpu.dma().mar1, 0x3001);
}

#[test]
fn test_timer_interrupt_vectors_through_il_table() {
    let (mut cpu, ram) = test_core_with_ram(&[0x00; 64]);
    {
        let mut mem = ram.borrow_mut();
        // PRT0 vector slot: I=0x40, IL=0x20 -> table at 0x4024
        mem[0x4024] = 0x00;
        mem[0x4025] = 0x60;
    }
    cpu.registers_mut().sp.set_word(0xF000);
    cpu.registers_mut().i = 0x40;
    cpu.io_write(0x33, 0x20); // IL
    cpu.io_write(0x0E, 0x01); // RLDR0 = 1
    cpu.io_write(0x0F, 0x00);
    cpu.io_write(0x10, TCR_TDE0 | TCR_TIE0); // enable + irq enable
    cpu.registers_mut().iff1 = true;
    cpu.registers_mut().iff2 = true;

    // two timer ticks raise TIF0, the third re-arms the request; the
    // handler entry is observed through PC
    cpu.run(20 * 3 + 40);
    assert_eq!(cpu.timers().tcr() & TCR_TIF0, TCR_TIF0);
    assert!(cpu.registers().pc.word() >= 0x6000);
    assert!(!cpu.registers().iff1);
}

#[test]
fn test_prev_pc_tracks_instruction_start() {
    let mut cpu = test_core(&[0x3E, 0x01, 0x3C]); // LD A,1 ; INC A
    cpu.run(6); // LD executes
    assert_eq!(cpu.registers().prev_pc, 0x0000);
    cpu.run(4); // INC executes
    assert_eq!(cpu.registers().prev_pc, 0x0002);
}

#[test]
fn test_opcode_space_is_used_for_fetches_only() {
    // opcode space holds LD A,n with operand taken from program space
    let program = Rc::new(RefCell::new(vec![0u8; 0x10000]));
    program.borrow_mut()[1] = 0x42; // operand read from program space
    let opcodes = Rc::new(RefCell::new(vec![0u8; 0x10000]));
    opcodes.borrow_mut()[0] = 0x3E; // LD A,n seen only by the fetch

    let io = Rc::new(RefCell::new(IoLog::default()));
    let mut cpu = Z180::builder()
        .program(Box::new(SharedRam(program)))
        .opcodes(Box::new(SharedRam(opcodes)))
        .io(Box::new(SharedIo(io)))
        .build()
        .unwrap();
    cpu.io_write(0x32, 0x00);

    cpu.run(6);
    assert_eq!(cpu.registers().a(), 0x42);
}
