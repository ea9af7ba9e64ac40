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

//! Instruction parser for keyhand scripts
//!
//! Parses scripts with the format:
//! - @ directives (tempo, jitter)
//! - # comments
//! - commands: wait(ms), move_hand(hand, key), press_finger(hand, finger),
//!   unpress_finger(hand, finger)

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, not_line_ending, space0},
    combinator::{map, value},
};

use crate::error::ParseError;
use crate::types::{Command, Hand, PlaybackConfig, Script};

#[derive(Clone)]
enum Line {
    Command(Command),
    Tempo(f64),
    Jitter(f64),
}

fn parse_float(input: &str) -> IResult<&str, f64> {
    nom::number::complete::double(input)
}

fn parse_hand(input: &str) -> IResult<&str, Hand> {
    alt((
        value(Hand::Left, tag("left")),
        value(Hand::Right, tag("right")),
        value(Hand::Left, char('0')),
        value(Hand::Right, char('1')),
    ))
    .parse(input)
}

// "(hand, n)" argument list shared by the hand commands
fn parse_hand_args(input: &str) -> IResult<&str, (Hand, u32)> {
    let (input, _) = space0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = space0(input)?;
    let (input, hand) = parse_hand(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char(',')(input)?;
    let (input, _) = space0(input)?;
    let (input, n) = nom::character::complete::u32(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, (hand, n)))
}

fn parse_wait(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("wait")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = space0(input)?;
    let (input, ms) = nom::character::complete::u32(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Command::wait(ms)))
}

fn parse_move_hand(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("move_hand")(input)?;
    let (input, (hand, key)) = parse_hand_args(input)?;
    Ok((input, Command::move_hand(hand, key)))
}

fn parse_press_finger(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("press_finger")(input)?;
    let (input, (hand, finger)) = parse_hand_args(input)?;
    Ok((input, Command::press(hand, finger)))
}

fn parse_unpress_finger(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag("unpress_finger")(input)?;
    let (input, (hand, finger)) = parse_hand_args(input)?;
    Ok((input, Command::unpress(hand, finger)))
}

fn parse_command(input: &str) -> IResult<&str, Command> {
    alt((
        parse_wait,
        parse_move_hand,
        parse_press_finger,
        parse_unpress_finger,
    ))
    .parse(input)
}

fn parse_tempo(input: &str) -> IResult<&str, Line> {
    let (input, _) = tag("@")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("tempo:")(input)?;
    let (input, value) = parse_float(input)?;
    Ok((input, Line::Tempo(value)))
}

fn parse_jitter(input: &str) -> IResult<&str, Line> {
    let (input, _) = tag("@")(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("jitter:")(input)?;
    let (input, value) = parse_float(input)?;
    Ok((input, Line::Jitter(value)))
}

fn parse_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('#')(input)?;
    let (input, _) = not_line_ending(input)?;
    Ok((input, ()))
}

fn parse_line(input: &str) -> IResult<&str, Option<Line>> {
    alt((
        map(parse_tempo, Some),
        map(parse_jitter, Some),
        value(None, parse_comment),
        map(parse_command, |cmd| Some(Line::Command(cmd))),
    ))
    .parse(input)
}

pub fn parse_script(input: &str) -> Result<Script, ParseError> {
    let mut config = PlaybackConfig::default();
    let mut commands = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line_num = line_num + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        match parse_line(trimmed) {
            Ok((remaining, parsed)) => {
                if !remaining.trim().is_empty() {
                    return Err(ParseError::TrailingText {
                        line: line_num,
                        rest: remaining.to_string(),
                    });
                }
                match parsed {
                    Some(Line::Command(cmd)) => commands.push(cmd),
                    Some(Line::Tempo(tempo)) => {
                        if !(tempo.is_finite() && tempo > 0.0) {
                            return Err(ParseError::InvalidDirective {
                                line: line_num,
                                message: format!("tempo must be positive, got {}", tempo),
                            });
                        }
                        config.tempo = tempo;
                    }
                    Some(Line::Jitter(jitter)) => {
                        if !(0.0..=1.0).contains(&jitter) {
                            return Err(ParseError::InvalidDirective {
                                line: line_num,
                                message: format!("jitter must be between 0 and 1, got {}", jitter),
                            });
                        }
                        config.jitter = jitter;
                    }
                    None => {}
                }
            }
            Err(e) => {
                return Err(ParseError::Syntax {
                    line: line_num,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(Script { config, commands })
}

/// Canonical instruction text, one command per line.
pub fn render_script(commands: &[Command]) -> String {
    let mut out = String::new();
    for cmd in commands {
        out.push_str(&cmd.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table;

    #[test]
    fn test_parse_wait() {
        let (_, cmd) = parse_wait("wait(200)").unwrap();
        assert_eq!(cmd, Command::wait(200));

        let (_, cmd) = parse_wait("wait ( 400 )").unwrap();
        assert_eq!(cmd, Command::wait(400));
    }

    #[test]
    fn test_parse_move_hand() {
        let (_, cmd) = parse_move_hand("move_hand(1, 1)").unwrap();
        assert_eq!(cmd, Command::move_hand(Hand::Right, 1));

        let (_, cmd) = parse_move_hand("move_hand(left,13)").unwrap();
        assert_eq!(cmd, Command::move_hand(Hand::Left, 13));
    }

    #[test]
    fn test_parse_fingers() {
        let (_, cmd) = parse_command("press_finger(0, 3)").unwrap();
        assert_eq!(cmd, Command::press(Hand::Left, 3));

        let (_, cmd) = parse_command("unpress_finger(right, 4)").unwrap();
        assert_eq!(cmd, Command::unpress(Hand::Right, 4));
    }

    #[test]
    fn test_unknown_hand_rejected() {
        assert!(parse_command("press_finger(2, 1)").is_err());
        assert!(parse_command("press_finger(-1, 1)").is_err());
    }

    #[test]
    fn test_negative_wait_rejected() {
        assert!(parse_wait("wait(-200)").is_err());
    }

    #[test]
    fn test_parse_script() {
        let input = r#"@ tempo:1.5
@ jitter:0.1
# Opening phrase
move_hand(1, 1)
press_finger(1, 1)

wait(200)
unpress_finger(1, 1)
"#;
        let script = parse_script(input).unwrap();
        assert_eq!(script.config.tempo, 1.5);
        assert_eq!(script.config.jitter, 0.1);
        assert_eq!(
            script.commands,
            vec![
                Command::move_hand(Hand::Right, 1),
                Command::press(Hand::Right, 1),
                Command::wait(200),
                Command::unpress(Hand::Right, 1),
            ]
        );
    }

    #[test]
    fn test_trailing_text_reports_line() {
        let input = "wait(200)\nwait(200) extra\n";
        let err = parse_script(input).unwrap_err();
        assert_eq!(
            err,
            ParseError::TrailingText {
                line: 2,
                rest: " extra".to_string()
            }
        );
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let input = "# header\n\nhop(1)\n";
        match parse_script(input) {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_directives() {
        assert!(matches!(
            parse_script("@ tempo:0"),
            Err(ParseError::InvalidDirective { line: 1, .. })
        ));
        assert!(matches!(
            parse_script("wait(1)\n@ jitter:1.5"),
            Err(ParseError::InvalidDirective { line: 2, .. })
        ));
    }

    #[test]
    fn test_rendered_builtin_table_parses_back() {
        let text = render_script(table::commands());
        assert!(text.starts_with("move_hand(1, 1)\npress_finger(1, 1)\nwait(200)\n"));

        let script = parse_script(&text).unwrap();
        assert_eq!(script.commands.as_slice(), table::commands());
    }
}
