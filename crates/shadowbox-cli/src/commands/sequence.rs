use clap::Args;
use serde_json::json;
use shadowbox_core::moves::{build, Stance};
use shadowbox_core::storage::load_or_default;
use shadowbox_core::{Config, Database, FightError, FightGenerator};

use super::{parse_stance, Source, SourceArgs};

#[derive(Args, Debug)]
pub struct SequenceArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Stance to mirror the moves for (defaults to the saved preference)
    #[arg(long, value_parser = parse_stance)]
    pub stance: Option<Stance>,
}

pub fn run(args: SequenceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let stance = match args.stance {
        Some(stance) => stance,
        None => load_or_default(&Database::open()?).stance,
    };

    let request = args.source.request(&config);
    let source = Source::from_args(&args.source, &config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = runtime.block_on(source.generate(&request))?;
    if response.is_quota_exhausted() {
        return Err(FightError::NoFightsLeft.into());
    }

    let sequence = build(&response.combos)?.with_stance(stance);
    let out = json!({
        "stance": stance,
        "length": sequence.len(),
        "body_length": sequence.body_len(),
        "fights_left": response.fights_left,
        "combos": sequence.combo_spans(),
        "moves": sequence.moves(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
