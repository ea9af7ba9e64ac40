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

//! C header export
//!
//! Writes a command sequence as a header the rig firmware includes directly.

use crate::types::Command;

pub const DEFAULT_GUARD: &str = "MACHINE_INSTRUCTIONS_H";

// Hand value the firmware expects for waits
const NO_HAND: i64 = -1;

fn c_entry(cmd: &Command) -> String {
    let tag = match cmd {
        Command::Wait { .. } => "CMD_WAIT",
        Command::MoveHand { .. } => "CMD_MOVE_HAND",
        Command::PressFinger { .. } => "CMD_PRESS_FINGER",
        Command::UnpressFinger { .. } => "CMD_UNPRESS_FINGER",
    };
    let hand = cmd.hand().map_or(NO_HAND, |h| h.selector());
    format!("{{ {}, {}, {} }}", tag, hand, cmd.parameter())
}

pub fn render_c_header(commands: &[Command], guard: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("#ifndef {}\n", guard));
    out.push_str(&format!("#define {}\n\n", guard));
    out.push_str(
        "typedef enum {\n    CMD_WAIT,\n    CMD_MOVE_HAND,\n    CMD_PRESS_FINGER,\n    CMD_UNPRESS_FINGER\n} CommandType;\n\n",
    );
    out.push_str("typedef struct {\n");
    out.push_str("    CommandType type;\n");
    out.push_str("    int which_hand;  // 0 for left, 1 for right (ignored for CMD_WAIT)\n");
    out.push_str("    int param;       // key number, finger number, or wait duration\n");
    out.push_str("} Command;\n\n");
    out.push_str("const Command commands[] = {\n");
    for cmd in commands {
        out.push_str(&format!("    {},\n", c_entry(cmd)));
    }
    out.push_str("};\n\n");
    out.push_str("const int numCommands = sizeof(commands) / sizeof(commands[0]);\n\n");
    out.push_str("#endif\n");
    out
}
