// Copyright (C) 2025  Tom Waddington
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! keyhand - command sequences for a two-handed key-pressing rig
//!
//! The rig understands four commands: wait, move a hand over a key, press a
//! finger and release a finger. This crate holds the built-in sequence,
//! reads and writes instruction text, arranges note events into commands,
//! exports C headers for the firmware and plays sequences back.

pub mod arranger;
pub mod error;
pub mod export;
pub mod keys;
pub mod midi;
pub mod parser;
pub mod playback;
pub mod table;
pub mod types;

pub use error::{ArrangeError, ParseError, PlaybackError};
pub use table::{command_count, commands};
pub use types::{Command, CommandKind, Hand, PlaybackConfig, Script};
