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

//! Playback engine for keyhand scripts
//!
//! Executes commands in order against an actuator, sleeping through waits
//! with tempo and jitter applied.

use rand::Rng;
use std::collections::HashSet;
use std::io::Write;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::PlaybackError;
use crate::keys::{FINGERS_PER_HAND, WHITE_KEY_COUNT, key_name};
use crate::types::{Command, Hand, PlaybackConfig, Script};

/// Hardware (or stand-in) that carries out hand and finger commands.
pub trait Actuator {
    fn move_hand(&mut self, hand: Hand, key: u32) -> Result<(), PlaybackError>;
    fn press_finger(&mut self, hand: Hand, finger: u32) -> Result<(), PlaybackError>;
    fn unpress_finger(&mut self, hand: Hand, finger: u32) -> Result<(), PlaybackError>;
}

/// Prints each actuation as a line of text.
pub struct ConsoleActuator<W: Write> {
    out: W,
}

impl<W: Write> ConsoleActuator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) -> Result<(), PlaybackError> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Actuator for ConsoleActuator<W> {
    fn move_hand(&mut self, hand: Hand, key: u32) -> Result<(), PlaybackError> {
        let name = key_name(key).unwrap_or_else(|| "?".to_string());
        self.emit(&format!("{} hand -> key {} ({})", hand, key, name))
    }

    fn press_finger(&mut self, hand: Hand, finger: u32) -> Result<(), PlaybackError> {
        self.emit(&format!("{} hand press finger {}", hand, finger))
    }

    fn unpress_finger(&mut self, hand: Hand, finger: u32) -> Result<(), PlaybackError> {
        self.emit(&format!("{} hand release finger {}", hand, finger))
    }
}

/// Records every actuation it receives, for checking playback.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub actions: Vec<Command>,
}

impl Actuator for RecordingActuator {
    fn move_hand(&mut self, hand: Hand, key: u32) -> Result<(), PlaybackError> {
        self.actions.push(Command::move_hand(hand, key));
        Ok(())
    }

    fn press_finger(&mut self, hand: Hand, finger: u32) -> Result<(), PlaybackError> {
        self.actions.push(Command::press(hand, finger));
        Ok(())
    }

    fn unpress_finger(&mut self, hand: Hand, finger: u32) -> Result<(), PlaybackError> {
        self.actions.push(Command::unpress(hand, finger));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSummary {
    pub executed: usize,
    // Total time spent in waits after tempo and jitter
    pub waited: Duration,
    pub stopped_early: bool,
}

pub struct PlaybackEngine<A: Actuator> {
    actuator: A,
    config: PlaybackConfig,
    running: Arc<AtomicBool>,
    pressed: HashSet<(Hand, u32)>,
}

impl<A: Actuator> PlaybackEngine<A> {
    pub fn new(actuator: A) -> Self {
        Self {
            actuator,
            config: PlaybackConfig::default(),
            running: Arc::new(AtomicBool::new(true)),
            pressed: HashSet::new(),
        }
    }

    /// Flag that stops playback before the next command once cleared.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn into_actuator(self) -> A {
        self.actuator
    }

    fn should_continue(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn calculate_delay(&self, duration_ms: u32) -> Duration {
        let base_ms = (f64::from(duration_ms) / self.config.tempo) as u64;
        let jitter_ms = (base_ms as f64 * self.config.jitter) as u64;

        if jitter_ms > 0 {
            let mut rng = rand::rng();
            let variation = rng.random_range(0..=jitter_ms.saturating_mul(2));
            let delay = base_ms.saturating_add(variation).saturating_sub(jitter_ms);
            Duration::from_millis(delay)
        } else {
            Duration::from_millis(base_ms)
        }
    }

    fn check_key(key: u32) -> Result<(), PlaybackError> {
        if (1..=WHITE_KEY_COUNT).contains(&key) {
            Ok(())
        } else {
            Err(PlaybackError::KeyOutOfRange {
                key,
                max: WHITE_KEY_COUNT,
            })
        }
    }

    fn check_finger(finger: u32) -> Result<(), PlaybackError> {
        if (1..=FINGERS_PER_HAND).contains(&finger) {
            Ok(())
        } else {
            Err(PlaybackError::FingerOutOfRange {
                finger,
                max: FINGERS_PER_HAND,
            })
        }
    }

    async fn execute_command(&mut self, command: &Command) -> Result<Duration, PlaybackError> {
        debug!(%command, "Executing");
        match *command {
            Command::Wait { duration_ms } => {
                let delay = self.calculate_delay(duration_ms);
                sleep(delay).await;
                return Ok(delay);
            }
            Command::MoveHand { hand, key } => {
                Self::check_key(key)?;
                self.actuator.move_hand(hand, key)?;
            }
            Command::PressFinger { hand, finger } => {
                Self::check_finger(finger)?;
                if self.pressed.contains(&(hand, finger)) {
                    return Err(PlaybackError::FingerAlreadyPressed { hand, finger });
                }
                self.actuator.press_finger(hand, finger)?;
                self.pressed.insert((hand, finger));
            }
            Command::UnpressFinger { hand, finger } => {
                Self::check_finger(finger)?;
                if !self.pressed.contains(&(hand, finger)) {
                    return Err(PlaybackError::FingerNotPressed { hand, finger });
                }
                self.actuator.unpress_finger(hand, finger)?;
                self.pressed.remove(&(hand, finger));
            }
        }
        Ok(Duration::ZERO)
    }

    pub async fn execute(&mut self, script: &Script) -> Result<PlaybackSummary, PlaybackError> {
        self.config = script.config.clone();
        self.pressed.clear();

        info!(
            commands = script.commands.len(),
            tempo = self.config.tempo,
            jitter = self.config.jitter,
            "Starting playback"
        );

        let mut summary = PlaybackSummary {
            executed: 0,
            waited: Duration::ZERO,
            stopped_early: false,
        };

        for command in &script.commands {
            if !self.should_continue() {
                summary.stopped_early = true;
                break;
            }

            summary.waited += self.execute_command(command).await?;
            summary.executed += 1;
        }

        info!(
            executed = summary.executed,
            waited_ms = summary.waited.as_millis() as u64,
            stopped_early = summary.stopped_early,
            "Playback finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;

    #[tokio::test(start_paused = true)]
    async fn test_builtin_table_plays_in_order() {
        let script = table::builtin_script();
        let mut engine = PlaybackEngine::new(RecordingActuator::default());

        let start = tokio::time::Instant::now();
        let summary = engine.execute(&script).await.unwrap();

        assert_eq!(summary.executed, table::command_count());
        assert!(!summary.stopped_early);

        let expected_ms: u64 = table::commands()
            .iter()
            .filter_map(|c| c.duration())
            .map(|d| d.as_millis() as u64)
            .sum();
        assert_eq!(summary.waited, Duration::from_millis(expected_ms));
        assert!(start.elapsed() >= summary.waited);

        let expected: Vec<Command> = table::commands()
            .iter()
            .copied()
            .filter(|c| c.duration().is_none())
            .collect();
        assert_eq!(engine.actuator().actions, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tempo_scales_waits() {
        let mut script = Script::new(vec![Command::wait(400), Command::wait(200)]);
        script.config.tempo = 2.0;
        let mut engine = PlaybackEngine::new(RecordingActuator::default());

        let summary = engine.execute(&script).await.unwrap();
        assert_eq!(summary.waited, Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let mut engine = PlaybackEngine::new(RecordingActuator::default());
        engine.config.jitter = 0.1;

        for _ in 0..50 {
            let delay = engine.calculate_delay(1000);
            assert!(delay >= Duration::from_millis(900));
            assert!(delay <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_tiny_tempo_saturates_instead_of_overflowing() {
        let script = crate::parser::parse_script("@ tempo:1e-300\n@ jitter:0.6\nwait(200)\n").unwrap();
        let mut engine = PlaybackEngine::new(RecordingActuator::default());
        engine.config = script.config.clone();

        let delay = engine.calculate_delay(script.commands[0].parameter());
        assert!(delay >= Duration::from_secs(u64::from(u32::MAX)));
    }

    #[tokio::test]
    async fn test_stop_flag_halts_before_next_command() {
        let script = table::builtin_script();
        let mut engine = PlaybackEngine::new(RecordingActuator::default());
        engine.stop_handle().store(false, Ordering::SeqCst);

        let summary = engine.execute(&script).await.unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.executed, 0);
        assert!(engine.actuator().actions.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_key_rejected() {
        let script = Script::new(vec![Command::move_hand(Hand::Left, 0)]);
        let mut engine = PlaybackEngine::new(RecordingActuator::default());

        let err = engine.execute(&script).await.unwrap_err();
        assert!(matches!(err, PlaybackError::KeyOutOfRange { key: 0, .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_finger_rejected() {
        let script = Script::new(vec![Command::press(Hand::Right, 6)]);
        let mut engine = PlaybackEngine::new(RecordingActuator::default());

        let err = engine.execute(&script).await.unwrap_err();
        assert!(matches!(err, PlaybackError::FingerOutOfRange { finger: 6, .. }));
    }

    #[tokio::test]
    async fn test_finger_state_enforced() {
        let mut engine = PlaybackEngine::new(RecordingActuator::default());

        let double_press = Script::new(vec![
            Command::press(Hand::Right, 1),
            Command::press(Hand::Right, 1),
        ]);
        let err = engine.execute(&double_press).await.unwrap_err();
        assert!(matches!(err, PlaybackError::FingerAlreadyPressed { .. }));

        let stray_release = Script::new(vec![Command::unpress(Hand::Left, 2)]);
        let err = engine.execute(&stray_release).await.unwrap_err();
        assert!(matches!(err, PlaybackError::FingerNotPressed { .. }));
    }

    #[test]
    fn test_console_actuator_output() {
        let mut console = ConsoleActuator::new(Vec::new());
        console.move_hand(Hand::Right, 8).unwrap();
        console.press_finger(Hand::Right, 1).unwrap();
        console.unpress_finger(Hand::Right, 1).unwrap();

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            text,
            "right hand -> key 8 (2:C)\nright hand press finger 1\nright hand release finger 1\n"
        );
    }
}
