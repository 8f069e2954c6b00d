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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for the Z180 core
///
/// The simulation itself is closed and deterministic; errors surface
/// only at the boundaries: core construction with an incomplete set of
/// collaborators, save-state serialization, and debugger state access.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("no program address space attached")]
    MissingProgramSpace,

    #[error("no I/O address space attached")]
    MissingIoSpace,

    #[error("unsupported save state version: {got} (expected {expected})")]
    UnsupportedSaveStateVersion { expected: u32, got: u32 },

    #[error("save state encode error: {0}")]
    SaveStateEncode(String),

    #[error("save state decode error: {0}")]
    SaveStateDecode(String),

    #[error("unknown state entry: {0}")]
    UnknownStateEntry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
