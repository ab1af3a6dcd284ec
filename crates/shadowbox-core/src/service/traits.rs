use std::future::Future;

use super::types::{FightRequest, FightResponse};
use crate::error::FightError;

/// Source of combos for a fight session.
///
/// Implementations map quota refusals to [`FightError::NoFightsLeft`] and
/// keep them apart from transport failures ([`FightError::Network`]).
pub trait FightGenerator: Send + Sync {
    /// Short identifier for logs (e.g. "http", "file").
    fn name(&self) -> &str;

    fn generate(
        &self,
        request: &FightRequest,
    ) -> impl Future<Output = Result<FightResponse, FightError>> + Send;
}
