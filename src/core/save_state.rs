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

//! Save state serialization for the Z180 core
//!
//! Snapshots are serialized with bincode for efficient binary encoding
//! and carry a version number for compatibility checking. The
//! architectural registers go through the enumerable state registry —
//! the same accessor list the debugger uses — so the two views can
//! never drift apart; a small runtime block captures the
//! non-architectural latches (interrupt pending set, timer prescaler,
//! TMDR high-byte latches, NMI edge state).
//!
//! The external address spaces are collaborators and are not part of a
//! core snapshot; the surrounding system saves its own memory.
//!
//! # Example
//!
//! ```no_run
//! use rz180::core::save_state::SaveState;
//! # use rz180::core::cpu::Z180;
//! # fn demo(cpu: &mut Z180) -> rz180::core::error::Result<()> {
//! let state = SaveState::from_core(cpu, "before boss fight");
//! state.save_to_file("save.state")?;
//!
//! let loaded = SaveState::load_from_file("save.state")?;
//! loaded.apply(cpu)?;
//! # Ok(())
//! # }
//! ```

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::core::cpu::Z180;
use crate::core::error::{CoreError, Result};

/// Save state version for compatibility checking
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete core save state
#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Save state metadata
    pub metadata: SaveStateMetadata,

    /// Architectural registers, in state-registry order
    pub registers: Vec<RegisterValue>,

    /// Non-architectural runtime latches
    pub runtime: RuntimeState,
}

/// Save state metadata
#[derive(Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Free-form label supplied by the caller
    pub label: String,
}

/// One architectural register value
#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct RegisterValue {
    pub name: String,
    pub value: u32,
}

/// Runtime latches outside the architectural register set
#[derive(Serialize, Deserialize, Encode, Decode, Default)]
pub struct RuntimeState {
    pub prev_pc: u16,
    pub after_ei: bool,
    pub nmi_state: bool,
    pub nmi_pending: bool,
    pub irq_state: [bool; 3],
    pub int_pending: u16,
    pub timer_prescale: u32,
    pub tmdr_latch: u8,
    pub tmdrh: [u8; 2],
    pub tmdr_read_toggle: [bool; 2],
}

impl SaveState {
    /// Capture the complete core state
    pub fn from_core(cpu: &Z180, label: &str) -> Self {
        let registers = Z180::state_table()
            .iter()
            .map(|entry| RegisterValue {
                name: entry.name.to_string(),
                value: (entry.get)(cpu) & entry.mask,
            })
            .collect();

        let runtime = RuntimeState {
            prev_pc: cpu.regs.prev_pc,
            after_ei: cpu.after_ei,
            nmi_state: cpu.nmi_state,
            nmi_pending: cpu.nmi_pending,
            irq_state: cpu.irq_state,
            int_pending: cpu.pending.raw(),
            timer_prescale: cpu.timers.timer_cnt,
            tmdr_latch: cpu.timers.tmdr_latch,
            tmdrh: cpu.timers.tmdrh,
            tmdr_read_toggle: cpu.timers.read_toggle,
        };

        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                label: label.to_string(),
            },
            registers,
            runtime,
        }
    }

    /// Restore the core from this snapshot
    ///
    /// Registry imports replay their side effects (MMU recompute, R
    /// split), so the restored core is immediately runnable.
    pub fn apply(&self, cpu: &mut Z180) -> Result<()> {
        if self.version != SAVE_STATE_VERSION {
            return Err(CoreError::UnsupportedSaveStateVersion {
                expected: SAVE_STATE_VERSION,
                got: self.version,
            });
        }

        for reg in &self.registers {
            cpu.state_write(&reg.name, reg.value)?;
        }

        cpu.regs.prev_pc = self.runtime.prev_pc;
        cpu.after_ei = self.runtime.after_ei;
        cpu.nmi_state = self.runtime.nmi_state;
        cpu.nmi_pending = self.runtime.nmi_pending;
        cpu.irq_state = self.runtime.irq_state;
        cpu.pending.set_raw(self.runtime.int_pending);
        cpu.timers.timer_cnt = self.runtime.timer_prescale;
        cpu.timers.tmdr_latch = self.runtime.tmdr_latch;
        cpu.timers.tmdrh = self.runtime.tmdrh;
        cpu.timers.read_toggle = self.runtime.tmdr_read_toggle;

        log::info!("save state applied (label: {})", self.metadata.label);
        Ok(())
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, config::standard())
            .map_err(|e| CoreError::SaveStateEncode(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (state, _) = bincode::decode_from_slice(data, config::standard())
            .map_err(|e| CoreError::SaveStateDecode(e.to_string()))?;
        Ok(state)
    }

    /// Write the snapshot to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Load a snapshot from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}
