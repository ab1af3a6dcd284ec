//! Fight generation: where combos for a session come from.

mod file;
mod http;
mod traits;
mod types;

pub use file::FileFightGenerator;
pub use http::HttpFightGenerator;
pub use traits::FightGenerator;
pub use types::{FightRequest, FightResponse};
