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

//! Arranger for note events
//!
//! Turns a time-stamped list of key presses and releases into rig commands:
//! waits between events, hand moves when a key is out of reach, and finger
//! assignments from each hand's pool of free fingers.

use std::collections::VecDeque;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{space0, space1},
    combinator::value,
};
use tracing::{debug, warn};

use crate::error::ArrangeError;
use crate::keys::{FINGERS_PER_HAND, midi_to_white_key};
use crate::types::{Command, Hand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    Press,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    // Absolute time in milliseconds
    pub time_ms: f64,
    // Raw hand selector; anything but 0 or 1 is skipped
    pub hand: i64,
    pub action: NoteAction,
    // White key number
    pub key: u32,
}

#[derive(Debug, Clone)]
pub struct ArrangerConfig {
    // Gaps shorter than this are played as simultaneous
    pub min_delay_ms: f64,
    // A press further than this from the hand position moves the hand
    pub move_threshold: u32,
    // Divides every emitted wait when set
    pub wait_divisor: Option<f64>,
}

impl Default for ArrangerConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 75.0,
            move_threshold: 4,
            wait_divisor: None,
        }
    }
}

impl ArrangerConfig {
    pub fn validate(&self) -> Result<(), ArrangeError> {
        if !(self.min_delay_ms.is_finite() && self.min_delay_ms >= 0.0) {
            return Err(ArrangeError::InvalidConfig {
                message: format!("minimum delay must not be negative, got {}", self.min_delay_ms),
            });
        }
        if let Some(divisor) = self.wait_divisor {
            if !(divisor.is_finite() && divisor > 0.0) {
                return Err(ArrangeError::InvalidConfig {
                    message: format!("wait divisor must be positive, got {}", divisor),
                });
            }
        }
        Ok(())
    }
}

struct HandState {
    hand: Hand,
    position: Option<u32>,
    // (finger, key) in press order
    held: Vec<(u32, u32)>,
    free: VecDeque<u32>,
}

impl HandState {
    fn new(hand: Hand) -> Self {
        Self {
            hand,
            position: None,
            held: Vec::new(),
            free: (1..=FINGERS_PER_HAND).collect(),
        }
    }

    fn needs_move(&self, key: u32, threshold: u32) -> bool {
        match self.position {
            None => true,
            Some(position) => key.abs_diff(position) > threshold,
        }
    }

    fn move_to(&mut self, key: u32, out: &mut Vec<Command>) {
        if self.position.is_some() {
            // Lift everything before the hand travels
            for (finger, _) in self.held.drain(..) {
                out.push(Command::unpress(self.hand, finger));
                self.free.push_back(finger);
            }
        }
        out.push(Command::move_hand(self.hand, key));
        self.position = Some(key);
    }

    fn press(&mut self, key: u32, out: &mut Vec<Command>) {
        match self.free.pop_front() {
            Some(finger) => {
                self.held.push((finger, key));
                out.push(Command::press(self.hand, finger));
            }
            None => warn!(hand = %self.hand, key, "No available fingers, skipping press"),
        }
    }

    fn release(&mut self, key: u32, out: &mut Vec<Command>) {
        match self.held.iter().position(|(_, held_key)| *held_key == key) {
            Some(index) => {
                let (finger, _) = self.held.remove(index);
                out.push(Command::unpress(self.hand, finger));
                self.free.push_back(finger);
            }
            None => warn!(hand = %self.hand, key, "Key was not pressed, skipping release"),
        }
    }
}

/// Arrange note events into commands.
///
/// Events are played in time order; events sharing a timestamp keep their
/// input order.
pub fn arrange(events: &[NoteEvent], config: &ArrangerConfig) -> Vec<Command> {
    let mut sorted: Vec<&NoteEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));

    let mut out = Vec::new();
    let mut left = HandState::new(Hand::Left);
    let mut right = HandState::new(Hand::Right);
    let mut previous_time = 0.0;

    for event in sorted {
        let gap = event.time_ms - previous_time;
        if gap >= config.min_delay_ms {
            out.push(Command::wait(scale_wait(gap, config.wait_divisor)));
            previous_time = event.time_ms;
        }

        let state = match Hand::from_selector(event.hand) {
            Some(Hand::Left) => &mut left,
            Some(Hand::Right) => &mut right,
            None => {
                warn!(hand = event.hand, key = event.key, "Unknown hand, skipping event");
                continue;
            }
        };

        match event.action {
            NoteAction::Press => {
                if state.needs_move(event.key, config.move_threshold) {
                    state.move_to(event.key, &mut out);
                }
                state.press(event.key, &mut out);
            }
            NoteAction::Release => state.release(event.key, &mut out),
        }
    }

    debug!(events = events.len(), commands = out.len(), "Arranged note events");
    out
}

fn scale_wait(gap_ms: f64, divisor: Option<f64>) -> u32 {
    let ms = match divisor {
        // Non-positive divisors are rejected by ArrangerConfig::validate
        Some(divisor) => gap_ms / divisor,
        None => gap_ms,
    };
    // Float to int casts saturate, so huge gaps clamp instead of wrapping
    ms as u32
}

fn parse_action(input: &str) -> IResult<&str, NoteAction> {
    alt((
        value(NoteAction::Press, tag("press")),
        value(NoteAction::Release, tag("release")),
    ))
    .parse(input)
}

// <time_ms> <hand> press|release <midi_note>
fn parse_event_line(input: &str) -> IResult<&str, (f64, i64, NoteAction, u8)> {
    let (input, time_ms) = nom::number::complete::double(input)?;
    let (input, _) = space1(input)?;
    let (input, hand) = nom::character::complete::i64(input)?;
    let (input, _) = space1(input)?;
    let (input, action) = parse_action(input)?;
    let (input, _) = space1(input)?;
    let (input, note) = nom::character::complete::u8(input)?;
    let (input, _) = space0(input)?;
    Ok((input, (time_ms, hand, action, note)))
}

/// Parse a note event list.
///
/// Notes that are not white keys are dropped since the rig cannot play them.
pub fn parse_events(input: &str) -> Result<Vec<NoteEvent>, ArrangeError> {
    let mut events = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line_num = line_num + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (time_ms, hand, action, note) = match parse_event_line(trimmed) {
            Ok(("", parsed)) => parsed,
            Ok((rest, _)) => {
                return Err(ArrangeError::InvalidEvent {
                    line: line_num,
                    message: format!("unexpected text '{}'", rest),
                });
            }
            Err(e) => {
                return Err(ArrangeError::InvalidEvent {
                    line: line_num,
                    message: e.to_string(),
                });
            }
        };

        if !(time_ms.is_finite() && time_ms >= 0.0) {
            return Err(ArrangeError::InvalidEvent {
                line: line_num,
                message: format!("time must be a non-negative number, got {}", time_ms),
            });
        }

        match midi_to_white_key(note) {
            Some(key) => events.push(NoteEvent {
                time_ms,
                hand,
                action,
                key,
            }),
            None => debug!(line = line_num, note, "Dropping note that is not a white key"),
        }
    }

    Ok(events)
}
