use std::io::BufRead;

use clap::Args;
use shadowbox_core::moves::Stance;
use shadowbox_core::session::{spawn, SessionCommand, SessionOptions};
use shadowbox_core::storage::load_or_default;
use shadowbox_core::timer::{ClockSettings, SystemClock};
use shadowbox_core::{Config, Database, FightSession};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use super::{load_badge, parse_stance, save_badge, Source, SourceArgs};

#[derive(Args, Debug)]
pub struct FightArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of rounds (defaults to `session.total_rounds`)
    #[arg(long)]
    pub rounds: Option<u32>,
    /// Round length in seconds
    #[arg(long, value_name = "SECS")]
    pub round_secs: Option<f64>,
    /// Rest length in seconds
    #[arg(long, value_name = "SECS")]
    pub rest_secs: Option<f64>,
    /// Stance for this fight only (orthodox|southpaw)
    #[arg(long, value_parser = parse_stance)]
    pub stance: Option<Stance>,
    /// Speed multiplier for this fight only
    #[arg(long)]
    pub speed: Option<f64>,
    /// Ignore stdin instead of reading commands from it
    #[arg(long)]
    pub no_input: bool,
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

fn clock_settings(args: &FightArgs, config: &Config) -> ClockSettings {
    let mut settings = config.clock_settings();
    if let Some(rounds) = args.rounds {
        settings.total_rounds = rounds;
    }
    if let Some(secs) = args.round_secs {
        settings.round_duration_ms = secs_to_ms(secs);
    }
    if let Some(secs) = args.rest_secs {
        settings.rest_duration_ms = secs_to_ms(secs);
    }
    settings
}

/// One line of stdin as a session command. Blank lines are ignored.
fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };
    let command = match word {
        "p" | "pause" => SessionCommand::Pause,
        "r" | "resume" => SessionCommand::Resume,
        "t" | "toggle" => SessionCommand::TogglePause,
        "s" | "status" => SessionCommand::Snapshot,
        "q" | "quit" | "stop" => SessionCommand::Stop,
        "speed" => {
            let value = parts.next().ok_or("usage: speed <multiplier>")?;
            SessionCommand::SetSpeed(value.parse::<f64>().map_err(|e| format!("{value}: {e}"))?)
        }
        "stance" => {
            let value = parts.next().ok_or("usage: stance <orthodox|southpaw>")?;
            SessionCommand::SetStance(parse_stance(value)?)
        }
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

/// Feed stdin lines to the session until stdin closes or the session ends.
fn forward_stdin(commands: UnboundedSender<SessionCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if commands.send(command).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => eprintln!("{e}"),
            }
        }
    });
}

pub fn run(args: FightArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let prefs = load_or_default(&db);

    let mut options = SessionOptions::from_preferences(clock_settings(&args, &config), &prefs)
        .pause_moves_during_rest(config.session.pause_moves_during_rest);
    if let Some(stance) = args.stance {
        options.stance = stance;
    }
    if let Some(speed) = args.speed {
        options.speed_multiplier = speed;
    }

    let request = args.source.request(&config);
    let source = Source::from_args(&args.source, &config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let summary = runtime.block_on(async {
        let session = FightSession::prepare(&source, &request, options, SystemClock).await?;
        if let Some(left) = session.fights_left() {
            info!(fights_left = left, "fight generated");
        }

        let badge = load_badge(&db);
        let fresh = badge.note_combos(session.combo_names());
        if fresh > 0 {
            info!(fresh, total = badge.count(), "new combos");
        }
        save_badge(&db, &badge)?;

        let mut handle = spawn(session, config.session.clock_tick());
        if !args.no_input {
            forward_stdin(handle.commander());
        }
        while let Some(event) = handle.next_event().await {
            println!("{}", serde_json::to_string(&event)?);
        }
        Ok::<_, Box<dyn std::error::Error>>(handle.join().await?)
    })?;

    if let Some(fight) = summary.to_new_fight(&request.category, &request.difficulty) {
        let id = db.record_fight(&fight)?;
        info!(id, completed = summary.completed, "fight recorded");
    }
    Ok(())
}
