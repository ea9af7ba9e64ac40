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

//! Standard MIDI file input
//!
//! Reads note presses and releases out of a `.mid` file. The channel of each
//! note selects the hand (0 left, 1 right) and black keys are dropped.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use tracing::debug;

use crate::arranger::{NoteAction, NoteEvent};
use crate::error::ArrangeError;
use crate::keys::midi_to_white_key;

// 120 bpm, used until the first tempo event
const DEFAULT_TEMPO_US_PER_QN: u32 = 500_000;

enum Clock {
    // Ticks per quarter note, tempo changes as (tick, us per quarter note)
    Metrical { ticks_per_qn: f64, tempos: Vec<(u64, u32)> },
    // Ticks per second, independent of tempo
    Timecode { ticks_per_sec: f64 },
}

impl Clock {
    fn to_ms(&self, tick: u64) -> f64 {
        match self {
            Clock::Metrical {
                ticks_per_qn,
                tempos,
            } => {
                let span_ms = |ticks: u64, us_per_qn: u32| {
                    ticks as f64 * f64::from(us_per_qn) / (ticks_per_qn * 1000.0)
                };
                let mut ms = 0.0;
                let mut last_tick = 0;
                let mut us_per_qn = DEFAULT_TEMPO_US_PER_QN;
                for &(change_tick, tempo) in tempos {
                    if change_tick >= tick {
                        break;
                    }
                    ms += span_ms(change_tick - last_tick, us_per_qn);
                    last_tick = change_tick;
                    us_per_qn = tempo;
                }
                ms + span_ms(tick - last_tick, us_per_qn)
            }
            Clock::Timecode { ticks_per_sec } => tick as f64 * 1000.0 / ticks_per_sec,
        }
    }
}

struct RawNote {
    tick: u64,
    channel: u8,
    action: NoteAction,
    note: u8,
}

/// Decode a MIDI file into note events sorted by time.
pub fn parse_midi(bytes: &[u8]) -> Result<Vec<NoteEvent>, ArrangeError> {
    let smf = Smf::parse(bytes).map_err(|e| ArrangeError::InvalidMidi {
        message: e.to_string(),
    })?;

    let mut tempos = Vec::new();
    let mut notes = Vec::new();

    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_qn)) => {
                    tempos.push((tick, us_per_qn.as_int()));
                }
                TrackEventKind::Midi { channel, message } => {
                    let action = match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            Some((NoteAction::Press, key))
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            Some((NoteAction::Release, key))
                        }
                        _ => None,
                    };
                    if let Some((action, key)) = action {
                        notes.push(RawNote {
                            tick,
                            channel: channel.as_int(),
                            action,
                            note: key.as_int(),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    // Tempo events may sit on any track; order them on the shared timeline
    tempos.sort_by_key(|(tick, _)| *tick);

    let clock = match smf.header.timing {
        Timing::Metrical(ticks_per_qn) => {
            if ticks_per_qn.as_int() == 0 {
                return Err(ArrangeError::InvalidMidi {
                    message: "zero ticks per quarter note".to_string(),
                });
            }
            Clock::Metrical {
                ticks_per_qn: f64::from(ticks_per_qn.as_int()),
                tempos,
            }
        }
        Timing::Timecode(fps, subframes) => {
            let ticks_per_sec = f64::from(fps.as_f32()) * f64::from(subframes);
            if ticks_per_sec <= 0.0 {
                return Err(ArrangeError::InvalidMidi {
                    message: "zero ticks per frame".to_string(),
                });
            }
            Clock::Timecode { ticks_per_sec }
        }
    };

    let mut events = Vec::new();
    for raw in notes {
        match midi_to_white_key(raw.note) {
            Some(key) => events.push(NoteEvent {
                time_ms: clock.to_ms(raw.tick),
                hand: i64::from(raw.channel),
                action: raw.action,
                key,
            }),
            None => debug!(note = raw.note, "Dropping note that is not a white key"),
        }
    }
    events.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));

    debug!(tracks = smf.tracks.len(), events = events.len(), "Decoded MIDI file");
    Ok(events)
}
