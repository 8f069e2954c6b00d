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

//! Instruction decode and dispatch
//!
//! Five prefix families, each dispatched through its own 256-entry
//! cycle table: the base set, CB (bit operations), ED (extended,
//! including the Z180-only MLT/TST/IN0/OUT0/OTIM/TSTIO/SLP group),
//! DD/FD (index register forms) and the DD/FD CB displacement form.
//! Undefined encodings latch the TRAP interrupt source.

use crate::core::cpu::timing::{CC_CB, CC_ED, CC_ED_REPEAT, CC_EX, CC_OP, CC_XY, CC_XYCB};
use crate::core::cpu::Z180;
use crate::core::flags::{tables, CF, HF, NF, PF, SF, VF, XF, YF, ZF};

impl Z180 {
    /// 8-bit register/memory operand by its 3-bit code (6 = (HL))
    fn read_r8(&mut self, code: u8) -> u8 {
        match code {
            0 => self.regs.bc.hi(),
            1 => self.regs.bc.lo(),
            2 => self.regs.de.hi(),
            3 => self.regs.de.lo(),
            4 => self.regs.hl.hi(),
            5 => self.regs.hl.lo(),
            6 => {
                let hl = self.regs.hl.word();
                self.rm(hl)
            }
            _ => self.regs.a(),
        }
    }

    fn write_r8(&mut self, code: u8, value: u8) {
        match code {
            0 => self.regs.bc.set_hi(value),
            1 => self.regs.bc.set_lo(value),
            2 => self.regs.de.set_hi(value),
            3 => self.regs.de.set_lo(value),
            4 => self.regs.hl.set_hi(value),
            5 => self.regs.hl.set_lo(value),
            6 => {
                let hl = self.regs.hl.word();
                self.wm(hl, value);
            }
            _ => self.regs.set_a(value),
        }
    }

    /// 16-bit register pair by its 2-bit code (BC, DE, HL, SP)
    fn read_rp(&self, code: u8) -> u16 {
        match code {
            0 => self.regs.bc.word(),
            1 => self.regs.de.word(),
            2 => self.regs.hl.word(),
            _ => self.regs.sp.word(),
        }
    }

    fn write_rp(&mut self, code: u8, value: u16) {
        match code {
            0 => self.regs.bc.set_word(value),
            1 => self.regs.de.set_word(value),
            2 => self.regs.hl.set_word(value),
            _ => self.regs.sp.set_word(value),
        }
    }

    /// Condition by its 3-bit code (NZ, Z, NC, C, PO, PE, P, M)
    fn condition(&self, code: u8) -> bool {
        let f = self.regs.f();
        match code {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }

    /// Shift/rotate body by its 3-bit code
    fn apply_shift(&mut self, code: u8, value: u8) -> u8 {
        match code {
            0 => self.op_rlc(value),
            1 => self.op_rrc(value),
            2 => self.op_rl(value),
            3 => self.op_rr(value),
            4 => self.op_sla(value),
            5 => self.op_sra(value),
            6 => {
                // undocumented SLL: shift left, bit 0 set
                let res = (value << 1) | 0x01;
                let carry = if value & 0x80 != 0 { CF } else { 0 };
                self.regs.set_f(tables().szp[res as usize] | carry);
                res
            }
            _ => self.op_srl(value),
        }
    }

    /// Dispatch one ALU operation against the accumulator
    fn alu_dispatch(&mut self, code: u8, value: u8) {
        match code {
            0 => self.alu_add(value),
            1 => self.alu_adc(value),
            2 => self.alu_sub(value),
            3 => self.alu_sbc(value),
            4 => self.alu_and(value),
            5 => self.alu_xor(value),
            6 => self.alu_or(value),
            _ => self.alu_cp(value),
        }
    }

    /// Execute one already-fetched base opcode; returns its cycle cost
    pub(crate) fn exec_op(&mut self, op: u8) -> u32 {
        let mut cycles = CC_OP[op as usize] as u32;

        match op {
            0x00 => {} // NOP

            // 16-bit loads / stack
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.arg16();
                self.write_rp((op >> 4) & 3, value);
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16();
                match (op >> 4) & 3 {
                    0 => self.regs.bc.set_word(value),
                    1 => self.regs.de.set_word(value),
                    2 => self.regs.hl.set_word(value),
                    _ => self.regs.af.set_word(value),
                }
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = match (op >> 4) & 3 {
                    0 => self.regs.bc.word(),
                    1 => self.regs.de.word(),
                    2 => self.regs.hl.word(),
                    _ => self.regs.af.word(),
                };
                self.push16(value);
            }
            0xF9 => {
                let hl = self.regs.hl.word();
                self.regs.sp.set_word(hl);
            }

            // 8-bit immediate loads
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let value = self.arg();
                self.write_r8((op >> 3) & 7, value);
            }

            // accumulator <-> memory
            0x02 => {
                let bc = self.regs.bc.word();
                let a = self.regs.a();
                self.wm(bc, a);
            }
            0x12 => {
                let de = self.regs.de.word();
                let a = self.regs.a();
                self.wm(de, a);
            }
            0x0A => {
                let bc = self.regs.bc.word();
                let value = self.rm(bc);
                self.regs.set_a(value);
            }
            0x1A => {
                let de = self.regs.de.word();
                let value = self.rm(de);
                self.regs.set_a(value);
            }
            0x22 => {
                let addr = self.arg16();
                let hl = self.regs.hl.word();
                self.wm16(addr, hl);
            }
            0x2A => {
                let addr = self.arg16();
                let value = self.rm16(addr);
                self.regs.hl.set_word(value);
            }
            0x32 => {
                let addr = self.arg16();
                let a = self.regs.a();
                self.wm(addr, a);
            }
            0x3A => {
                let addr = self.arg16();
                let value = self.rm(addr);
                self.regs.set_a(value);
            }

            // 16-bit inc/dec/add (no flags on inc/dec)
            0x03 | 0x13 | 0x23 | 0x33 => {
                let code = (op >> 4) & 3;
                let value = self.read_rp(code).wrapping_add(1);
                self.write_rp(code, value);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let code = (op >> 4) & 3;
                let value = self.read_rp(code).wrapping_sub(1);
                self.write_rp(code, value);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let src = self.read_rp((op >> 4) & 3);
                let hl = self.regs.hl.word();
                let res = self.alu_add16(hl, src);
                self.regs.hl.set_word(res);
            }

            // 8-bit inc/dec
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let code = (op >> 3) & 7;
                let value = self.read_r8(code);
                let res = self.alu_inc(value);
                self.write_r8(code, res);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let code = (op >> 3) & 7;
                let value = self.read_r8(code);
                let res = self.alu_dec(value);
                self.write_r8(code, res);
            }

            // accumulator rotates
            0x07 => {
                let a = self.regs.a().rotate_left(1);
                self.regs.set_a(a);
                let f = (self.regs.f() & (SF | ZF | PF)) | (a & (YF | XF | CF));
                self.regs.set_f(f);
            }
            0x0F => {
                let a = self.regs.a();
                let mut f = (self.regs.f() & (SF | ZF | PF)) | (a & CF);
                let a = a.rotate_right(1);
                f |= a & (YF | XF);
                self.regs.set_a(a);
                self.regs.set_f(f);
            }
            0x17 => {
                let a = self.regs.a();
                let res = (a << 1) | (self.regs.f() & CF);
                let carry = if a & 0x80 != 0 { CF } else { 0 };
                let f = (self.regs.f() & (SF | ZF | PF)) | carry | (res & (YF | XF));
                self.regs.set_a(res);
                self.regs.set_f(f);
            }
            0x1F => {
                let a = self.regs.a();
                let res = (a >> 1) | ((self.regs.f() & CF) << 7);
                let carry = a & CF;
                let f = (self.regs.f() & (SF | ZF | PF)) | carry | (res & (YF | XF));
                self.regs.set_a(res);
                self.regs.set_f(f);
            }

            // flag/accumulator housekeeping
            0x27 => self.alu_daa(),
            0x2F => {
                let a = !self.regs.a();
                self.regs.set_a(a);
                let f = (self.regs.f() & (SF | ZF | PF | CF)) | HF | NF | (a & (YF | XF));
                self.regs.set_f(f);
            }
            0x37 => {
                let f = (self.regs.f() & (SF | ZF | PF)) | CF | (self.regs.a() & (YF | XF));
                self.regs.set_f(f);
            }
            0x3F => {
                let old = self.regs.f();
                let mut f = (old & (SF | ZF | PF | CF)) | (self.regs.a() & (YF | XF));
                f |= (old & CF) << 4; // old carry into half carry
                f ^= CF;
                self.regs.set_f(f);
            }

            // exchanges
            0x08 => self.regs.ex_af_af2(),
            0xD9 => self.regs.exx(),
            0xEB => {
                std::mem::swap(&mut self.regs.de, &mut self.regs.hl);
            }
            0xE3 => {
                let sp = self.regs.sp.word();
                let value = self.rm16(sp);
                let hl = self.regs.hl.word();
                self.wm16(sp, hl);
                self.regs.hl.set_word(value);
            }

            // relative jumps
            0x10 => {
                let disp = self.arg() as i8;
                let b = self.regs.bc.hi().wrapping_sub(1);
                self.regs.bc.set_hi(b);
                if b != 0 {
                    let pc = self.regs.pc.word().wrapping_add_signed(disp as i16);
                    self.regs.pc.set_word(pc);
                    cycles += CC_EX[op as usize] as u32;
                }
            }
            0x18 => {
                let disp = self.arg() as i8;
                let pc = self.regs.pc.word().wrapping_add_signed(disp as i16);
                self.regs.pc.set_word(pc);
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let disp = self.arg() as i8;
                if self.condition((op >> 3) & 3) {
                    let pc = self.regs.pc.word().wrapping_add_signed(disp as i16);
                    self.regs.pc.set_word(pc);
                    cycles += CC_EX[op as usize] as u32;
                }
            }

            // absolute jumps / calls / returns
            0xC3 => {
                let addr = self.arg16();
                self.regs.pc.set_word(addr);
            }
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let addr = self.arg16();
                if self.condition((op >> 3) & 7) {
                    self.regs.pc.set_word(addr);
                    cycles += CC_EX[op as usize] as u32;
                }
            }
            0xE9 => {
                let hl = self.regs.hl.word();
                self.regs.pc.set_word(hl);
            }
            0xCD => {
                let addr = self.arg16();
                let pc = self.regs.pc.word();
                self.push16(pc);
                self.regs.pc.set_word(addr);
            }
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let addr = self.arg16();
                if self.condition((op >> 3) & 7) {
                    let pc = self.regs.pc.word();
                    self.push16(pc);
                    self.regs.pc.set_word(addr);
                    cycles += CC_EX[op as usize] as u32;
                }
            }
            0xC9 => {
                let addr = self.pop16();
                self.regs.pc.set_word(addr);
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition((op >> 3) & 7) {
                    let addr = self.pop16();
                    self.regs.pc.set_word(addr);
                    cycles += CC_EX[op as usize] as u32;
                }
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let pc = self.regs.pc.word();
                self.push16(pc);
                self.regs.pc.set_word((op & 0x38) as u16);
            }

            // I/O
            0xD3 => {
                let port = self.arg() as u16 | ((self.regs.a() as u16) << 8);
                let a = self.regs.a();
                self.io_write(port, a);
            }
            0xDB => {
                let port = self.arg() as u16 | ((self.regs.a() as u16) << 8);
                let value = self.io_read(port);
                self.regs.set_a(value);
            }

            // interrupt control
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }
            0xFB => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                // interrupts are held off for one more instruction
                self.after_ei = true;
            }

            0x76 => {
                self.regs.halted = true;
                log::trace!("HALT at PC={:04x}", self.regs.prev_pc);
            }

            // register-to-register loads
            0x40..=0x7F => {
                let value = self.read_r8(op & 7);
                self.write_r8((op >> 3) & 7, value);
            }

            // accumulator ALU group
            0x80..=0xBF => {
                let value = self.read_r8(op & 7);
                self.alu_dispatch((op >> 3) & 7, value);
            }
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.arg();
                self.alu_dispatch((op >> 3) & 7, value);
            }

            // prefixes
            0xCB => cycles = self.exec_cb(),
            0xED => cycles = self.exec_ed(),
            0xDD => cycles = self.exec_indexed(false),
            0xFD => cycles = self.exec_indexed(true),
        }

        cycles
    }

    /// CB prefix: shifts, rotates and bit operations
    fn exec_cb(&mut self) -> u32 {
        self.regs.bump_r();
        let op = self.rop();
        let cycles = CC_CB[op as usize] as u32;
        let reg = op & 7;
        let field = (op >> 3) & 7;

        match op >> 6 {
            0 => {
                let value = self.read_r8(reg);
                let res = self.apply_shift(field, value);
                self.write_r8(reg, res);
            }
            1 => {
                let value = self.read_r8(reg);
                self.op_bit(field, value);
            }
            2 => {
                let value = self.read_r8(reg);
                self.write_r8(reg, value & !(1 << field));
            }
            _ => {
                let value = self.read_r8(reg);
                self.write_r8(reg, value | (1 << field));
            }
        }

        cycles
    }

    /// ED prefix: extended set plus the Z180-only operations
    fn exec_ed(&mut self) -> u32 {
        self.regs.bump_r();
        let op = self.rop();
        let mut cycles = CC_ED[op as usize] as u32;

        match op {
            // IN0 r,(n) — port high byte is 0
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {
                let port = self.arg() as u16;
                let value = self.io_read(port);
                self.in_flags(value);
                let reg = (op >> 3) & 7;
                if reg != 6 {
                    self.write_r8(reg, value);
                }
            }

            // OUT0 (n),r
            0x01 | 0x09 | 0x11 | 0x19 | 0x21 | 0x29 | 0x39 => {
                let port = self.arg() as u16;
                let value = self.read_r8((op >> 3) & 7);
                self.io_write(port, value);
            }

            // TST r / TST (HL)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let value = self.read_r8((op >> 3) & 7);
                self.op_tst(value);
            }

            // TST n
            0x64 => {
                let value = self.arg();
                self.op_tst(value);
            }

            // TSTIO n — port addressed by C
            0x74 => {
                let mask = self.arg();
                let port = self.regs.bc.lo() as u16;
                let value = self.io_read(port) & mask;
                self.regs.set_f(tables().szp[value as usize] | HF);
            }

            // IN r,(C)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let port = self.regs.bc.word();
                let value = self.io_read(port);
                self.in_flags(value);
                let reg = (op >> 3) & 7;
                if reg != 6 {
                    self.write_r8(reg, value);
                }
            }

            // OUT (C),r
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let port = self.regs.bc.word();
                let reg = (op >> 3) & 7;
                let value = if reg == 6 { 0 } else { self.read_r8(reg) };
                self.io_write(port, value);
            }

            // 16-bit arithmetic with carry
            0x42 | 0x52 | 0x62 | 0x72 => {
                let src = self.read_rp((op >> 4) & 3);
                self.alu_sbc16(src);
            }
            0x4A | 0x5A | 0x6A | 0x7A => {
                let src = self.read_rp((op >> 4) & 3);
                self.alu_adc16(src);
            }

            // 16-bit absolute loads
            0x43 | 0x53 | 0x63 | 0x73 => {
                let addr = self.arg16();
                let value = self.read_rp((op >> 4) & 3);
                self.wm16(addr, value);
            }
            0x4B | 0x5B | 0x6B | 0x7B => {
                let addr = self.arg16();
                let value = self.rm16(addr);
                self.write_rp((op >> 4) & 3, value);
            }

            0x44 => self.alu_neg(),

            0x45 => {
                // RETN
                let addr = self.pop16();
                self.regs.pc.set_word(addr);
                self.regs.iff1 = self.regs.iff2;
            }
            0x4D => {
                // RETI
                let addr = self.pop16();
                self.regs.pc.set_word(addr);
            }

            0x46 => self.regs.im = 0,
            0x56 => self.regs.im = 1,
            0x5E => self.regs.im = 2,

            0x47 => self.regs.i = self.regs.a(),
            0x4F => {
                let a = self.regs.a();
                self.regs.set_r_effective(a);
            }
            0x57 => {
                let value = self.regs.i;
                self.regs.set_a(value);
                self.ld_a_special_flags(value);
            }
            0x5F => {
                let value = self.regs.r_effective();
                self.regs.set_a(value);
                self.ld_a_special_flags(value);
            }

            // MLT ww
            0x4C | 0x5C | 0x6C | 0x7C => {
                let code = (op >> 4) & 3;
                let pair = self.read_rp(code);
                let product = (pair >> 8) * (pair & 0xFF);
                self.write_rp(code, product);
            }

            // RRD/RLD
            0x67 => {
                let hl = self.regs.hl.word();
                let value = self.rm(hl);
                let a = self.regs.a();
                self.wm(hl, (value >> 4) | (a << 4));
                let a = (a & 0xF0) | (value & 0x0F);
                self.regs.set_a(a);
                self.in_flags(a);
            }
            0x6F => {
                let hl = self.regs.hl.word();
                let value = self.rm(hl);
                let a = self.regs.a();
                self.wm(hl, (value << 4) | (a & 0x0F));
                let a = (a & 0xF0) | (value >> 4);
                self.regs.set_a(a);
                self.in_flags(a);
            }

            0x76 => {
                // SLP: stop fetching until an interrupt, like HALT
                self.regs.halted = true;
                log::trace!("SLP at PC={:04x}", self.regs.prev_pc);
            }

            // OTIM/OTDM and their repeat forms
            0x83 => self.op_otim(1),
            0x8B => self.op_otim(-1),
            0x93 => {
                self.op_otim(1);
                if self.regs.bc.hi() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0x9B => {
                self.op_otim(-1);
                if self.regs.bc.hi() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }

            // block transfer/search/IO
            0xA0 => self.op_ldi(1),
            0xA8 => self.op_ldi(-1),
            0xB0 => {
                self.op_ldi(1);
                if self.regs.bc.word() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xB8 => {
                self.op_ldi(-1);
                if self.regs.bc.word() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xA1 => self.op_cpi(1),
            0xA9 => self.op_cpi(-1),
            0xB1 => {
                self.op_cpi(1);
                if self.regs.bc.word() != 0 && self.regs.f() & ZF == 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xB9 => {
                self.op_cpi(-1);
                if self.regs.bc.word() != 0 && self.regs.f() & ZF == 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xA2 => self.op_ini(1),
            0xAA => self.op_ini(-1),
            0xB2 => {
                self.op_ini(1);
                if self.regs.bc.hi() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xBA => {
                self.op_ini(-1);
                if self.regs.bc.hi() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xA3 => self.op_outi(1),
            0xAB => self.op_outi(-1),
            0xB3 => {
                self.op_outi(1);
                if self.regs.bc.hi() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }
            0xBB => {
                self.op_outi(-1);
                if self.regs.bc.hi() != 0 {
                    let pc = self.regs.pc.word().wrapping_sub(2);
                    self.regs.pc.set_word(pc);
                    cycles += CC_ED_REPEAT as u32;
                }
            }

            _ => {
                if self.config.trap_on_undefined {
                    self.raise_trap(true);
                }
            }
        }

        cycles
    }

    /// DD/FD prefix: index register forms
    fn exec_indexed(&mut self, use_iy: bool) -> u32 {
        self.regs.bump_r();
        let op = self.rop();
        let mut cycles = CC_XY[op as usize] as u32;

        match op {
            0x09 | 0x19 | 0x29 | 0x39 => {
                let idx = self.index_reg(use_iy);
                let src = match (op >> 4) & 3 {
                    0 => self.regs.bc.word(),
                    1 => self.regs.de.word(),
                    2 => idx,
                    _ => self.regs.sp.word(),
                };
                let res = self.alu_add16(idx, src);
                self.set_index_reg(use_iy, res);
            }

            0x21 => {
                let value = self.arg16();
                self.set_index_reg(use_iy, value);
            }
            0x22 => {
                let addr = self.arg16();
                let idx = self.index_reg(use_iy);
                self.wm16(addr, idx);
            }
            0x2A => {
                let addr = self.arg16();
                let value = self.rm16(addr);
                self.set_index_reg(use_iy, value);
            }
            0x23 => {
                let value = self.index_reg(use_iy).wrapping_add(1);
                self.set_index_reg(use_iy, value);
            }
            0x2B => {
                let value = self.index_reg(use_iy).wrapping_sub(1);
                self.set_index_reg(use_iy, value);
            }

            0x34 => {
                let addr = self.index_addr(use_iy);
                let value = self.rm(addr);
                let res = self.alu_inc(value);
                self.wm(addr, res);
            }
            0x35 => {
                let addr = self.index_addr(use_iy);
                let value = self.rm(addr);
                let res = self.alu_dec(value);
                self.wm(addr, res);
            }
            0x36 => {
                let addr = self.index_addr(use_iy);
                let value = self.arg();
                self.wm(addr, value);
            }

            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x7E => {
                let addr = self.index_addr(use_iy);
                let value = self.rm(addr);
                self.write_r8((op >> 3) & 7, value);
            }
            0x70..=0x75 | 0x77 => {
                let addr = self.index_addr(use_iy);
                let value = self.read_r8(op & 7);
                self.wm(addr, value);
            }

            0x86 | 0x8E | 0x96 | 0x9E | 0xA6 | 0xAE | 0xB6 | 0xBE => {
                let addr = self.index_addr(use_iy);
                let value = self.rm(addr);
                self.alu_dispatch((op >> 3) & 7, value);
            }

            0xCB => cycles = self.exec_xycb(use_iy),

            0xE1 => {
                let value = self.pop16();
                self.set_index_reg(use_iy, value);
            }
            0xE3 => {
                let sp = self.regs.sp.word();
                let value = self.rm16(sp);
                let idx = self.index_reg(use_iy);
                self.wm16(sp, idx);
                self.set_index_reg(use_iy, value);
            }
            0xE5 => {
                let idx = self.index_reg(use_iy);
                self.push16(idx);
            }
            0xE9 => {
                let idx = self.index_reg(use_iy);
                self.regs.pc.set_word(idx);
            }
            0xF9 => {
                let idx = self.index_reg(use_iy);
                self.regs.sp.set_word(idx);
            }

            _ => {
                // no index form exists for this encoding
                if self.config.trap_on_undefined {
                    self.raise_trap(true);
                }
            }
        }

        cycles
    }

    /// DD/FD CB displacement form
    fn exec_xycb(&mut self, use_iy: bool) -> u32 {
        let addr = self.index_addr(use_iy);
        let op = self.arg(); // final byte is not an M1 fetch
        let cycles = CC_XYCB[op as usize] as u32;

        // only the memory forms exist; the register-copy encodings are
        // undefined on this part
        if op & 7 != 6 && self.config.trap_on_undefined {
            self.raise_trap(true);
            return cycles;
        }

        let field = (op >> 3) & 7;
        match op >> 6 {
            0 => {
                let value = self.rm(addr);
                let res = self.apply_shift(field, value);
                self.wm(addr, res);
            }
            1 => {
                let value = self.rm(addr);
                self.op_bit(field, value);
            }
            2 => {
                let value = self.rm(addr);
                self.wm(addr, value & !(1 << field));
            }
            _ => {
                let value = self.rm(addr);
                self.wm(addr, value | (1 << field));
            }
        }

        cycles
    }

    #[inline(always)]
    fn index_reg(&self, use_iy: bool) -> u16 {
        if use_iy {
            self.regs.iy.word()
        } else {
            self.regs.ix.word()
        }
    }

    #[inline(always)]
    fn set_index_reg(&mut self, use_iy: bool, value: u16) {
        if use_iy {
            self.regs.iy.set_word(value);
        } else {
            self.regs.ix.set_word(value);
        }
    }

    /// Fetch the displacement and form the effective (IX/IY + d) address
    fn index_addr(&mut self, use_iy: bool) -> u16 {
        let disp = self.arg() as i8;
        self.index_reg(use_iy).wrapping_add_signed(disp as i16)
    }

    // ---- block operation bodies ----

    fn op_ldi(&mut self, step: i16) {
        let hl = self.regs.hl.word();
        let de = self.regs.de.word();
        let value = self.rm(hl);
        self.wm(de, value);
        self.regs.hl.set_word(hl.wrapping_add_signed(step));
        self.regs.de.set_word(de.wrapping_add_signed(step));
        let bc = self.regs.bc.word().wrapping_sub(1);
        self.regs.bc.set_word(bc);

        let mut f = self.regs.f() & (SF | ZF | CF);
        let n = self.regs.a().wrapping_add(value);
        if n & 0x02 != 0 {
            f |= YF;
        }
        if n & 0x08 != 0 {
            f |= XF;
        }
        if bc != 0 {
            f |= VF;
        }
        self.regs.set_f(f);
    }

    fn op_cpi(&mut self, step: i16) {
        let hl = self.regs.hl.word();
        let value = self.rm(hl);
        let a = self.regs.a();
        let mut res = a.wrapping_sub(value);
        self.regs.hl.set_word(hl.wrapping_add_signed(step));
        let bc = self.regs.bc.word().wrapping_sub(1);
        self.regs.bc.set_word(bc);

        let mut f = (self.regs.f() & CF)
            | (tables().sz[res as usize] & !(YF | XF))
            | ((a ^ value ^ res) & HF)
            | NF;
        if f & HF != 0 {
            res = res.wrapping_sub(1);
        }
        if res & 0x02 != 0 {
            f |= YF;
        }
        if res & 0x08 != 0 {
            f |= XF;
        }
        if bc != 0 {
            f |= VF;
        }
        self.regs.set_f(f);
    }

    fn op_ini(&mut self, step: i16) {
        let port = self.regs.bc.word();
        let value = self.io_read(port);
        let b = self.regs.bc.hi().wrapping_sub(1);
        self.regs.bc.set_hi(b);
        let hl = self.regs.hl.word();
        self.wm(hl, value);
        self.regs.hl.set_word(hl.wrapping_add_signed(step));

        let c_next = self.regs.bc.lo().wrapping_add_signed(step as i8);
        let k = value as u16 + c_next as u16;
        let mut f = tables().sz[b as usize];
        if value & 0x80 != 0 {
            f |= NF;
        }
        if k > 0xFF {
            f |= HF | CF;
        }
        f |= tables().szp[((k as u8 & 0x07) ^ b) as usize] & PF;
        self.regs.set_f(f);
    }

    fn op_outi(&mut self, step: i16) {
        let hl = self.regs.hl.word();
        let value = self.rm(hl);
        // B decrements before the port address is formed
        let b = self.regs.bc.hi().wrapping_sub(1);
        self.regs.bc.set_hi(b);
        let port = self.regs.bc.word();
        self.io_write(port, value);
        self.regs.hl.set_word(hl.wrapping_add_signed(step));

        let k = value as u16 + self.regs.hl.lo() as u16;
        let mut f = tables().sz[b as usize];
        if value & 0x80 != 0 {
            f |= NF;
        }
        if k > 0xFF {
            f |= HF | CF;
        }
        f |= tables().szp[((k as u8 & 0x07) ^ b) as usize] & PF;
        self.regs.set_f(f);
    }

    /// OTIM/OTDM: out (C),(HL) with HL and C stepping together
    fn op_otim(&mut self, step: i16) {
        let hl = self.regs.hl.word();
        let value = self.rm(hl);
        let c = self.regs.bc.lo();
        self.io_write(c as u16, value);
        self.regs.hl.set_word(hl.wrapping_add_signed(step));
        self.regs.bc.set_lo(c.wrapping_add_signed(step as i8));
        let b = self.regs.bc.hi().wrapping_sub(1);
        self.regs.bc.set_hi(b);

        let f = (self.regs.f() & CF) | tables().sz[b as usize] | NF;
        self.regs.set_f(f);
    }
}
