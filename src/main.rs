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

//! keyhand - drive a two-handed key-pressing rig.
//!
//! Usage:
//!   keyhand list                 Print the built-in command table
//!   keyhand play [SCRIPT]        Play a script (or the built-in table)
//!   keyhand arrange <EVENTS>     Arrange a MIDI file or note event list into commands
//!   keyhand export [SCRIPT]      Convert a script to instruction text or a C header

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyhand::arranger::{ArrangerConfig, NoteEvent, arrange, parse_events};
use keyhand::export::{DEFAULT_GUARD, render_c_header};
use keyhand::keys::key_name;
use keyhand::midi::parse_midi;
use keyhand::parser::{parse_script, render_script};
use keyhand::playback::{ConsoleActuator, PlaybackEngine};
use keyhand::{Command, Script, table};

#[derive(Parser)]
#[command(name = "keyhand")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in command table
    List {
        /// Annotate moves with key names
        #[arg(long)]
        names: bool,
    },

    /// Play a script through the console actuator
    Play {
        /// Instruction script; the built-in table is played when omitted
        #[arg(value_name = "SCRIPT")]
        script: Option<PathBuf>,

        /// Tempo multiplier (overrides the script's @ tempo)
        #[arg(long)]
        tempo: Option<f64>,

        /// Wait jitter as a fraction 0.0-1.0 (overrides the script's @ jitter)
        #[arg(long)]
        jitter: Option<f64>,
    },

    /// Arrange a MIDI file or note event list into commands
    Arrange {
        /// MIDI file (.mid), or a file of "<time_ms> <hand> press|release <midi_note>" lines
        #[arg(value_name = "EVENTS")]
        events: PathBuf,

        /// Shortest gap in ms that produces a wait
        #[arg(long, default_value_t = 75.0)]
        min_delay: f64,

        /// Key distance beyond which the hand moves
        #[arg(long, default_value_t = 4)]
        move_threshold: u32,

        /// Divide every wait by this value
        #[arg(long)]
        wait_divisor: Option<f64>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a script to instruction text or a C header
    Export {
        /// Instruction script; the built-in table is exported when omitted
        #[arg(value_name = "SCRIPT")]
        script: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Header)]
        format: Format,

        /// Include guard for header output
        #[arg(long, default_value = DEFAULT_GUARD)]
        guard: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One instruction per line
    Text,
    /// C header for the firmware
    Header,
}

fn load_script(path: Option<&Path>) -> Result<Script> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script '{}'", path.display()))?;
            let script = parse_script(&content)
                .with_context(|| format!("Failed to parse script '{}'", path.display()))?;
            Ok(script)
        }
        None => Ok(table::builtin_script()),
    }
}

fn is_midi_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mid") || ext.eq_ignore_ascii_case("midi"))
}

fn load_events(path: &Path) -> Result<Vec<NoteEvent>> {
    let events = if is_midi_file(path) {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read MIDI file '{}'", path.display()))?;
        parse_midi(&bytes)
            .with_context(|| format!("Failed to decode MIDI file '{}'", path.display()))?
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read events '{}'", path.display()))?;
        parse_events(&content)
            .with_context(|| format!("Failed to parse events '{}'", path.display()))?
    };
    info!(events = events.len(), path = %path.display(), "Loaded note events");
    Ok(events)
}

fn render(commands: &[Command], format: Format, guard: &str) -> String {
    match format {
        Format::Text => render_script(commands),
        Format::Header => render_c_header(commands, guard),
    }
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "Wrote output");
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn list(names: bool) {
    for (index, cmd) in table::commands().iter().enumerate() {
        match (names, cmd) {
            (true, Command::MoveHand { key, .. }) => {
                let name = key_name(*key).unwrap_or_else(|| "?".to_string());
                println!("{:3}  {}  # {}", index, cmd, name);
            }
            _ => println!("{:3}  {}", index, cmd),
        }
    }
    println!("{} commands", table::command_count());
}

async fn play(path: Option<&Path>, tempo: Option<f64>, jitter: Option<f64>) -> Result<()> {
    let mut script = load_script(path)?;

    if let Some(tempo) = tempo {
        anyhow::ensure!(tempo > 0.0, "Tempo must be positive, got {}", tempo);
        script.config.tempo = tempo;
    }
    if let Some(jitter) = jitter {
        anyhow::ensure!(
            (0.0..=1.0).contains(&jitter),
            "Jitter must be between 0 and 1, got {}",
            jitter
        );
        script.config.jitter = jitter;
    }

    let mut engine = PlaybackEngine::new(ConsoleActuator::new(std::io::stdout()));

    let running = engine.stop_handle();
    ctrlc::set_handler(move || {
        warn!("Received Ctrl-C, stopping playback");
        running.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let summary = engine.execute(&script).await.context("Playback failed")?;
    if summary.stopped_early {
        eprintln!(
            "Stopped after {} of {} commands",
            summary.executed,
            script.commands.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyhand=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { names } => list(names),
        Commands::Play {
            script,
            tempo,
            jitter,
        } => play(script.as_deref(), tempo, jitter).await?,
        Commands::Arrange {
            events: events_path,
            min_delay,
            move_threshold,
            wait_divisor,
            format,
            output,
        } => {
            let config = ArrangerConfig {
                min_delay_ms: min_delay,
                move_threshold,
                wait_divisor,
            };
            config.validate().context("Invalid arrange options")?;

            let events = load_events(&events_path)?;
            let commands = arrange(&events, &config);
            info!(commands = commands.len(), "Arranged");

            write_output(output.as_deref(), &render(&commands, format, DEFAULT_GUARD))?;
        }
        Commands::Export {
            script,
            format,
            guard,
            output,
        } => {
            let script = load_script(script.as_deref())?;
            write_output(output.as_deref(), &render(&script.commands, format, &guard))?;
        }
    }

    Ok(())
}
