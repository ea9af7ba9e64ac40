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

//! Core types for keyhand command sequences

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Integer selector used by the firmware: 0 for left, 1 for right.
    pub fn selector(self) -> i64 {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    pub fn from_selector(selector: i64) -> Option<Self> {
        match selector {
            0 => Some(Hand::Left),
            1 => Some(Hand::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Left => write!(f, "left"),
            Hand::Right => write!(f, "right"),
        }
    }
}

/// Tag of a command record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Wait,
    MoveHand,
    PressFinger,
    UnpressFinger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Milliseconds
    Wait { duration_ms: u32 },
    // Key is a white key number, 1 is the lowest C
    MoveHand { hand: Hand, key: u32 },
    PressFinger { hand: Hand, finger: u32 },
    UnpressFinger { hand: Hand, finger: u32 },
}

impl Command {
    pub const fn wait(duration_ms: u32) -> Self {
        Command::Wait { duration_ms }
    }

    pub const fn move_hand(hand: Hand, key: u32) -> Self {
        Command::MoveHand { hand, key }
    }

    pub const fn press(hand: Hand, finger: u32) -> Self {
        Command::PressFinger { hand, finger }
    }

    pub const fn unpress(hand: Hand, finger: u32) -> Self {
        Command::UnpressFinger { hand, finger }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Wait { .. } => CommandKind::Wait,
            Command::MoveHand { .. } => CommandKind::MoveHand,
            Command::PressFinger { .. } => CommandKind::PressFinger,
            Command::UnpressFinger { .. } => CommandKind::UnpressFinger,
        }
    }

    /// Hand the command acts on. Waits belong to neither hand.
    pub fn hand(&self) -> Option<Hand> {
        match self {
            Command::Wait { .. } => None,
            Command::MoveHand { hand, .. }
            | Command::PressFinger { hand, .. }
            | Command::UnpressFinger { hand, .. } => Some(*hand),
        }
    }

    /// Flat record payload: key number, finger number, or wait duration in ms.
    pub fn parameter(&self) -> u32 {
        match self {
            Command::Wait { duration_ms } => *duration_ms,
            Command::MoveHand { key, .. } => *key,
            Command::PressFinger { finger, .. } | Command::UnpressFinger { finger, .. } => *finger,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Command::Wait { duration_ms } => Some(Duration::from_millis(u64::from(*duration_ms))),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Wait { duration_ms } => write!(f, "wait({})", duration_ms),
            Command::MoveHand { hand, key } => {
                write!(f, "move_hand({}, {})", hand.selector(), key)
            }
            Command::PressFinger { hand, finger } => {
                write!(f, "press_finger({}, {})", hand.selector(), finger)
            }
            Command::UnpressFinger { hand, finger } => {
                write!(f, "unpress_finger({}, {})", hand.selector(), finger)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    // Wait durations are divided by this; 2.0 plays twice as fast
    pub tempo: f64,
    // Jitter as a fraction (0.0 to 1.0) of each wait
    pub jitter: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tempo: 1.0,  // As written
            jitter: 0.0, // No jitter
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub config: PlaybackConfig,
    pub commands: Vec<Command>,
}

impl Script {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            config: PlaybackConfig::default(),
            commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_view_of_wait() {
        let cmd = Command::wait(400);
        assert_eq!(cmd.kind(), CommandKind::Wait);
        assert_eq!(cmd.hand(), None);
        assert_eq!(cmd.parameter(), 400);
        assert_eq!(cmd.duration(), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_record_view_of_hand_commands() {
        let cmd = Command::move_hand(Hand::Left, 13);
        assert_eq!(cmd.kind(), CommandKind::MoveHand);
        assert_eq!(cmd.hand(), Some(Hand::Left));
        assert_eq!(cmd.parameter(), 13);
        assert_eq!(cmd.duration(), None);

        let cmd = Command::unpress(Hand::Right, 4);
        assert_eq!(cmd.kind(), CommandKind::UnpressFinger);
        assert_eq!(cmd.hand(), Some(Hand::Right));
        assert_eq!(cmd.parameter(), 4);
    }

    #[test]
    fn test_hand_selector() {
        assert_eq!(Hand::Left.selector(), 0);
        assert_eq!(Hand::Right.selector(), 1);
        assert_eq!(Hand::from_selector(1), Some(Hand::Right));
        assert_eq!(Hand::from_selector(-1), None);
        assert_eq!(Hand::from_selector(2), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::wait(200).to_string(), "wait(200)");
        assert_eq!(Command::move_hand(Hand::Right, 1).to_string(), "move_hand(1, 1)");
        assert_eq!(Command::press(Hand::Left, 3).to_string(), "press_finger(0, 3)");
        assert_eq!(Command::unpress(Hand::Left, 2).to_string(), "unpress_finger(0, 2)");
    }
}
