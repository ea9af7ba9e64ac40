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

//! Error types for keyhand

use thiserror::Error;

use crate::types::Hand;

/// Errors from reading instruction text.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Line {line}: Parse error: {message}")]
    Syntax { line: usize, message: String },

    #[error("Line {line}: Unexpected text after command: '{rest}'")]
    TrailingText { line: usize, rest: String },

    #[error("Line {line}: {message}")]
    InvalidDirective { line: usize, message: String },
}

/// Errors from reading note event lists.
#[derive(Debug, Error, PartialEq)]
pub enum ArrangeError {
    #[error("Line {line}: Invalid note event: {message}")]
    InvalidEvent { line: usize, message: String },

    #[error("Invalid arranger setting: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid MIDI file: {message}")]
    InvalidMidi { message: String },
}

/// Errors raised while driving an actuator.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Key {key} is outside the keyboard (1..={max})")]
    KeyOutOfRange { key: u32, max: u32 },

    #[error("Finger {finger} does not exist (1..={max})")]
    FingerOutOfRange { finger: u32, max: u32 },

    #[error("Finger {finger} on the {hand} hand is already pressed")]
    FingerAlreadyPressed { hand: Hand, finger: u32 },

    #[error("Finger {finger} on the {hand} hand is not pressed")]
    FingerNotPressed { hand: Hand, finger: u32 },

    #[error("Actuator failed: {0}")]
    Actuator(#[from] std::io::Error),
}
