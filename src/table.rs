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

//! Built-in command table
//!
//! The sequence the rig plays when no script is given. Entries are consumed
//! strictly in order; the count is always taken from the slice itself.

use crate::types::{Command, Hand, Script};

use Hand::{Left, Right};

static COMMANDS: &[Command] = &[
    Command::move_hand(Right, 1),
    Command::press(Right, 1),
    Command::wait(200),
    Command::unpress(Right, 1),
    Command::press(Right, 2),
    Command::wait(200),
    Command::move_hand(Left, 8),
    Command::press(Left, 1),
    Command::unpress(Right, 2),
    Command::press(Right, 3),
    Command::wait(200),
    Command::unpress(Left, 1),
    Command::press(Left, 2),
    Command::unpress(Right, 3),
    Command::press(Right, 4),
    Command::wait(200),
    Command::unpress(Left, 2),
    Command::press(Left, 3),
    Command::wait(200),
    Command::unpress(Left, 3),
    Command::press(Left, 4),
    Command::unpress(Right, 4),
    Command::wait(400),
    Command::unpress(Left, 4),
    Command::press(Left, 5),
    Command::wait(200),
    Command::unpress(Left, 5),
    Command::move_hand(Left, 13),
    Command::press(Left, 1),
    Command::wait(200),
    Command::unpress(Left, 1),
    Command::press(Left, 2),
    Command::wait(200),
    Command::unpress(Left, 2),
];

/// The built-in sequence, in playback order.
pub fn commands() -> &'static [Command] {
    COMMANDS
}

pub fn command_count() -> usize {
    COMMANDS.len()
}

/// Built-in sequence with default playback settings.
pub fn builtin_script() -> Script {
    Script::new(COMMANDS.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandKind;

    #[test]
    fn test_count_matches_entries() {
        assert_eq!(command_count(), commands().iter().count());
        assert_eq!(command_count(), 34);
    }

    #[test]
    fn test_repeated_access_is_stable() {
        let first = commands();
        let second = commands();
        assert_eq!(first, second);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_opening_commands() {
        let cmds = commands();
        assert_eq!(cmds[0], Command::move_hand(Hand::Right, 1));
        assert_eq!(cmds[1], Command::press(Hand::Right, 1));
        assert_eq!(cmds[2].kind(), CommandKind::Wait);
        assert_eq!(cmds[2].parameter(), 200);
    }

    #[test]
    fn test_last_command() {
        let last = commands().last().copied();
        assert_eq!(last, Some(Command::unpress(Hand::Left, 2)));
    }

    #[test]
    fn test_waits_are_200_or_400() {
        let waits: Vec<u32> = commands()
            .iter()
            .filter(|c| c.kind() == CommandKind::Wait)
            .map(|c| c.parameter())
            .collect();
        assert!(!waits.is_empty());
        assert!(waits.iter().all(|ms| *ms == 200 || *ms == 400));
    }

    #[test]
    fn test_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| commands().len()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), command_count());
        }
    }

    #[test]
    fn test_builtin_script_uses_defaults() {
        let script = builtin_script();
        assert_eq!(script.commands.as_slice(), commands());
        assert_eq!(script.config.tempo, 1.0);
        assert_eq!(script.config.jitter, 0.0);
    }
}
