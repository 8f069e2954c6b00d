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

//! Shared fixtures for the integration tests

use std::cell::RefCell;
use std::rc::Rc;

use rz180::core::bus::{IoSpace, MemorySpace};
use rz180::core::cpu::Z180;

/// 64K RAM shared between the core and the test body
pub struct SharedRam(pub Rc<RefCell<Vec<u8>>>);

impl MemorySpace for SharedRam {
    fn read_byte(&mut self, addr: u32) -> u8 {
        self.0.borrow()[addr as usize & 0xFFFF]
    }

    fn write_byte(&mut self, addr: u32, data: u8) {
        self.0.borrow_mut()[addr as usize & 0xFFFF] = data;
    }
}

/// I/O space with open-bus reads
pub struct OpenBusIo;

impl IoSpace for OpenBusIo {
    fn read_byte(&mut self, _port: u16) -> u8 {
        0xFF
    }

    fn write_byte(&mut self, _port: u16, _data: u8) {}
}

/// Build a core over a shared 64K RAM with `program` at address 0
///
/// Wait-state insertion is switched off so tests can reason about
/// exact cycle counts.
pub fn build_core(program: &[u8]) -> (Z180, Rc<RefCell<Vec<u8>>>) {
    init_logging();

    let mut mem = vec![0u8; 0x10000];
    mem[..program.len()].copy_from_slice(program);
    let ram = Rc::new(RefCell::new(mem));

    let mut cpu = Z180::builder()
        .program(Box::new(SharedRam(ram.clone())))
        .io(Box::new(OpenBusIo))
        .build()
        .expect("core construction");
    cpu.io_write(0x32, 0x00); // DCNTL: no memory or I/O wait states
    (cpu, ram)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
