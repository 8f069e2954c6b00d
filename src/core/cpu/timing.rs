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

//! Per-opcode cycle cost tables
//!
//! One 256-entry table per prefix family, holding the base clock count
//! of each encoding (prefix fetches included). Conditional operations
//! store their not-taken cost here; [`CC_EX`](CC_EX) holds the extra
//! cycles charged when the condition is met (and the per-iteration
//! penalty of the block-repeat operations). Values follow the Z8018x
//! family instruction summary; the Z180 runs most encodings a cycle or
//! two faster than the Z80.

/// Base instruction table
#[rustfmt::skip]
pub const CC_OP: [u8; 256] = [
     3, 9, 7, 4, 4, 4, 6, 3,  4, 7, 6, 4, 4, 4, 6, 3,
     7, 9, 7, 4, 4, 4, 6, 3,  8, 7, 6, 4, 4, 4, 6, 3,
     6, 9,16, 4, 4, 4, 6, 4,  6, 7,15, 4, 4, 4, 6, 3,
     6, 9,13, 4,10,10, 9, 3,  6, 7,12, 4, 4, 4, 6, 3,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     7, 7, 7, 7, 7, 7, 3, 7,  4, 4, 4, 4, 4, 4, 6, 4,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     4, 4, 4, 4, 4, 4, 6, 4,  4, 4, 4, 4, 4, 4, 6, 4,
     5, 9, 6, 9, 6,11, 6,11,  5, 9, 6, 0, 6,16, 6,11,
     5, 9, 6,10, 6,11, 6,11,  5, 3, 6, 9, 6, 0, 6,11,
     5, 9, 6,16, 6,11, 6,11,  5, 3, 6, 3, 6, 0, 6,11,
     5, 9, 6, 3, 6,11, 6,11,  5, 4, 6, 3, 6, 0, 6,11,
];

/// Extra cycles for taken conditions / repeating block operations
#[rustfmt::skip]
pub const CC_EX: [u8; 256] = [
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     2, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     2, 0, 0, 0, 0, 0, 0, 0,  2, 0, 0, 0, 0, 0, 0, 0,
     2, 0, 0, 0, 0, 0, 0, 0,  2, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     0, 0, 0, 0, 0, 0, 0, 0,  0, 0, 0, 0, 0, 0, 0, 0,
     2, 2, 2, 2, 0, 0, 0, 0,  2, 2, 2, 2, 0, 0, 0, 0,
     5, 0, 3, 0,10, 0, 0, 0,  5, 0, 3, 0,10, 0, 0, 0,
     5, 0, 3, 0,10, 0, 0, 0,  5, 0, 3, 0,10, 0, 0, 0,
     5, 0, 3, 0,10, 0, 0, 0,  5, 0, 3, 0,10, 0, 0, 0,
     5, 0, 3, 0,10, 0, 0, 0,  5, 0, 3, 0,10, 0, 0, 0,
];

/// CB-prefixed table (prefix fetch included)
#[rustfmt::skip]
pub const CC_CB: [u8; 256] = [
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     6, 6, 6, 6, 6, 6, 9, 6,  6, 6, 6, 6, 6, 6, 9, 6,
     6, 6, 6, 6, 6, 6, 9, 6,  6, 6, 6, 6, 6, 6, 9, 6,
     6, 6, 6, 6, 6, 6, 9, 6,  6, 6, 6, 6, 6, 6, 9, 6,
     6, 6, 6, 6, 6, 6, 9, 6,  6, 6, 6, 6, 6, 6, 9, 6,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
     7, 7, 7, 7, 7, 7,13, 7,  7, 7, 7, 7, 7, 7,13, 7,
];

/// ED-prefixed table (prefix fetch included); undefined slots carry the
/// fetch cost charged before the trap is latched
#[rustfmt::skip]
pub const CC_ED: [u8; 256] = [
    12,13, 6, 6, 7, 6, 6, 6, 12,13, 6, 6, 7, 6, 6, 6,
    12,13, 6, 6, 7, 6, 6, 6, 12,13, 6, 6, 7, 6, 6, 6,
    12,13, 6, 6, 7, 6, 6, 6, 12,13, 6, 6, 7, 6, 6, 6,
    12,13, 6, 6,10, 6, 6, 6, 12,13, 6, 6, 7, 6, 6, 6,
     9,10,10,19, 6,12, 6, 6,  9,10,10,18,17,12, 6, 6,
     9,10,10,19, 6, 6, 6, 6,  9,10,10,18,17, 6, 6, 6,
     9,10,10,19, 9, 6, 6,16,  9,10,10,18,17, 6, 6,16,
     9,10,10,19,12, 6, 8, 6,  9,10,10,18,17, 6, 6, 6,
     6, 6, 6,14, 6, 6, 6, 6,  6, 6, 6,14, 6, 6, 6, 6,
     6, 6, 6,14, 6, 6, 6, 6,  6, 6, 6,14, 6, 6, 6, 6,
    12,12,12,12, 6, 6, 6, 6, 12,12,12,12, 6, 6, 6, 6,
    12,12,12,12, 6, 6, 6, 6, 12,12,12,12, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 6, 6, 6, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 6, 6, 6, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 6, 6, 6, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 6, 6, 6, 6, 6, 6, 6,
];

/// Extra cycles per repeating iteration of the block operations
pub const CC_ED_REPEAT: u8 = 2;

/// DD/FD-prefixed table (prefix fetch included); undefined slots carry
/// the fetch cost charged before the trap is latched
#[rustfmt::skip]
pub const CC_XY: [u8; 256] = [
     6, 6, 6, 6, 6, 6, 6, 6,  6,10, 6, 6, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6,10, 6, 6, 6, 6, 6, 6,
     6,12,19, 7, 6, 6, 6, 6,  6,10,18, 7, 6, 6, 6, 6,
     6, 6, 6, 6,18,18,15, 6,  6,10, 6, 6, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
    15,15,15,15,15,15, 6,15,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6,14, 6,  6, 6, 6, 6, 6, 6,14, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 6, 6, 0, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 6, 6, 6, 6, 6, 6, 6,
     6,12, 6,19, 6,14, 6, 6,  6, 6, 6, 6, 6, 6, 6, 6,
     6, 6, 6, 6, 6, 6, 6, 6,  6, 7, 6, 6, 6, 6, 6, 6,
];

/// DD/FD CB displacement form (prefixes and displacement included)
#[rustfmt::skip]
pub const CC_XYCB: [u8; 256] = [
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    15,15,15,15,15,15,15,15, 15,15,15,15,15,15,15,15,
    15,15,15,15,15,15,15,15, 15,15,15,15,15,15,15,15,
    15,15,15,15,15,15,15,15, 15,15,15,15,15,15,15,15,
    15,15,15,15,15,15,15,15, 15,15,15,15,15,15,15,15,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
    19,19,19,19,19,19,19,19, 19,19,19,19,19,19,19,19,
];
