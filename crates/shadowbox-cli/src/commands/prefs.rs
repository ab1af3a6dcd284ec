use clap::Subcommand;
use shadowbox_core::storage::{load_or_default, Preferences, PreferencesStore};
use shadowbox_core::Database;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Get a preference value
    Get {
        /// Preference key (e.g. "stance", "speedMultiplier")
        key: String,
    },
    /// Set a preference value
    Set {
        /// Preference key
        key: String,
        /// New value
        value: String,
    },
    /// List all preferences
    List,
    /// Reset preferences to defaults
    Reset,
}

pub fn run(action: PrefsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        PrefsAction::Get { key } => {
            let prefs = load_or_default(&db);
            match prefs.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        PrefsAction::Set { key, value } => {
            let mut prefs = load_or_default(&db);
            prefs.set(&key, &value)?;
            db.save(&prefs)?;
            println!("ok");
        }
        PrefsAction::List => {
            let prefs = load_or_default(&db);
            println!("{}", serde_json::to_string_pretty(&prefs)?);
        }
        PrefsAction::Reset => {
            db.save(&Preferences::default())?;
            println!("preferences reset to defaults");
        }
    }
    Ok(())
}
