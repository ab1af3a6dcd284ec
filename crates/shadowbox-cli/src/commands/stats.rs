use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use shadowbox_core::Database;

use super::{load_badge, save_badge};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, today's fights and the current day streak
    Summary,
    /// Most recent fights
    Recent {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Combos seen so far; clears the "new combos" badge
    Combos,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Summary => {
            let stats = db.stats()?;
            let streak = db.training_streak(Utc::now().date_naive())?;
            let out = json!({
                "total_fights": stats.total_fights,
                "completed_fights": stats.completed_fights,
                "total_rounds": stats.total_rounds,
                "today_fights": stats.today_fights,
                "streak_days": streak,
                "new_combos": load_badge(&db).count(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StatsAction::Recent { limit } => {
            let fights = db.recent_fights(limit)?;
            println!("{}", serde_json::to_string_pretty(&fights)?);
        }
        StatsAction::Combos => {
            let badge = load_badge(&db);
            let out = json!({
                "new": badge.count(),
                "seen": badge.seen(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            badge.clear();
            save_badge(&db, &badge)?;
        }
    }
    Ok(())
}
