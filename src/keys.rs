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

//! White key numbering
//!
//! The rig only plays white keys. They are numbered 1..=50 from C1 (MIDI 24)
//! up to C8 (MIDI 108).

pub const WHITE_KEY_COUNT: u32 = 50;
pub const FINGERS_PER_HAND: u32 = 5;

const LOWEST_MIDI_NOTE: u8 = 24;

// Semitone offsets of the white keys within an octave, starting at C
const WHITE_OFFSETS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

const KEY_LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// Translate a MIDI note number to a white key number.
pub fn midi_to_white_key(note: u8) -> Option<u32> {
    if note < LOWEST_MIDI_NOTE {
        return None;
    }
    let above = u32::from(note - LOWEST_MIDI_NOTE);
    let octave = above / 12;
    let position = WHITE_OFFSETS
        .iter()
        .position(|offset| u32::from(*offset) == above % 12)?;
    let key = octave * 7 + position as u32 + 1;
    (key <= WHITE_KEY_COUNT).then_some(key)
}

pub fn white_key_to_midi(key: u32) -> Option<u8> {
    if !(1..=WHITE_KEY_COUNT).contains(&key) {
        return None;
    }
    let index = key - 1;
    let semitones = (index / 7) * 12 + u32::from(WHITE_OFFSETS[(index % 7) as usize]);
    u8::try_from(semitones + u32::from(LOWEST_MIDI_NOTE)).ok()
}

/// Key name in octave:letter form, e.g. key 1 is "1:C" and key 8 is "2:C".
pub fn key_name(key: u32) -> Option<String> {
    if !(1..=WHITE_KEY_COUNT).contains(&key) {
        return None;
    }
    let index = key - 1;
    Some(format!("{}:{}", 1 + index / 7, KEY_LETTERS[(index % 7) as usize]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_ends() {
        assert_eq!(midi_to_white_key(24), Some(1));
        assert_eq!(midi_to_white_key(108), Some(50));
        assert_eq!(midi_to_white_key(23), None);
        assert_eq!(midi_to_white_key(110), None);
    }

    #[test]
    fn test_black_keys_skipped() {
        assert_eq!(midi_to_white_key(25), None); // C#1
        assert_eq!(midi_to_white_key(61), None); // C#4
        assert_eq!(midi_to_white_key(26), Some(2));
        assert_eq!(midi_to_white_key(60), Some(22)); // middle C
    }

    #[test]
    fn test_every_white_key_maps_back() {
        for key in 1..=WHITE_KEY_COUNT {
            let note = white_key_to_midi(key).unwrap();
            assert_eq!(midi_to_white_key(note), Some(key));
        }
        assert_eq!(white_key_to_midi(0), None);
        assert_eq!(white_key_to_midi(51), None);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(1).as_deref(), Some("1:C"));
        assert_eq!(key_name(7).as_deref(), Some("1:B"));
        assert_eq!(key_name(8).as_deref(), Some("2:C"));
        assert_eq!(key_name(13).as_deref(), Some("2:A"));
        assert_eq!(key_name(50).as_deref(), Some("8:C"));
        assert_eq!(key_name(0), None);
    }
}
