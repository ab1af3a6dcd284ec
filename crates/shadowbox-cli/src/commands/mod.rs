pub mod config;
pub mod fight;
pub mod prefs;
pub mod sequence;
pub mod stats;

use std::future::Future;
use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};
use shadowbox_core::moves::Stance;
use shadowbox_core::{
    ComboBadge, Config, Database, FightError, FightGenerator, FightRequest, FightResponse,
    FileFightGenerator, HttpFightGenerator,
};
use tracing::warn;

const COMBO_BADGE_KEY: &str = "combo_badge";

/// Where a fight's combos come from.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Category sent to the fight service (defaults to `service.default_category`)
    #[arg(long)]
    pub category: Option<String>,
    /// Difficulty sent to the fight service (defaults to `service.default_difficulty`)
    #[arg(long)]
    pub difficulty: Option<String>,
    /// Read combos from a JSON file instead of the fight service
    #[arg(long, value_name = "PATH")]
    pub combos_file: Option<PathBuf>,
    /// Shuffle combos read from --combos-file
    #[arg(long, requires = "combos_file")]
    pub shuffle: bool,
}

impl SourceArgs {
    pub fn request(&self, config: &Config) -> FightRequest {
        FightRequest::new(
            self.category
                .clone()
                .unwrap_or_else(|| config.service.default_category.clone()),
            self.difficulty
                .clone()
                .unwrap_or_else(|| config.service.default_difficulty.clone()),
        )
    }
}

/// Either generator behind one type, so callers stay generic-free.
pub enum Source {
    File(FileFightGenerator),
    Http(HttpFightGenerator),
}

impl Source {
    pub fn from_args(args: &SourceArgs, config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(match &args.combos_file {
            Some(path) => {
                let generator = FileFightGenerator::new(path);
                Source::File(if args.shuffle {
                    generator.shuffled()
                } else {
                    generator
                })
            }
            None => Source::Http(HttpFightGenerator::new(
                &config.service.base_url,
                config.service.timeout(),
            )?),
        })
    }
}

impl FightGenerator for Source {
    fn name(&self) -> &str {
        match self {
            Source::File(g) => g.name(),
            Source::Http(g) => g.name(),
        }
    }

    fn generate(
        &self,
        request: &FightRequest,
    ) -> impl Future<Output = Result<FightResponse, FightError>> + Send {
        async move {
            match self {
                Source::File(g) => g.generate(request).await,
                Source::Http(g) => g.generate(request).await,
            }
        }
    }
}

pub fn parse_stance(value: &str) -> Result<Stance, String> {
    match value.to_ascii_lowercase().as_str() {
        "orthodox" => Ok(Stance::Orthodox),
        "southpaw" => Ok(Stance::Southpaw),
        other => Err(format!("unknown stance '{other}' (orthodox|southpaw)")),
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BadgeState {
    seen: Vec<String>,
    count: u32,
}

/// The "new combos" badge as left by the previous run.
pub fn load_badge(db: &Database) -> ComboBadge {
    let state = match db.kv_get(COMBO_BADGE_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "malformed combo badge, starting over");
            BadgeState::default()
        }),
        Ok(None) => BadgeState::default(),
        Err(e) => {
            warn!(error = %e, "could not read combo badge");
            BadgeState::default()
        }
    };
    let badge = ComboBadge::with_seen(state.seen);
    badge.observable().set(state.count);
    badge
}

pub fn save_badge(db: &Database, badge: &ComboBadge) -> Result<(), Box<dyn std::error::Error>> {
    let state = BadgeState {
        seen: badge.seen(),
        count: badge.count(),
    };
    db.kv_set(COMBO_BADGE_KEY, &serde_json::to_string(&state)?)?;
    Ok(())
}
