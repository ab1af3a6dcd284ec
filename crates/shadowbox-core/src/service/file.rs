//! Offline fight generation from a JSON file in the service's response shape.

use std::future::Future;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use super::traits::FightGenerator;
use super::types::{FightRequest, FightResponse};
use crate::error::FightError;

pub struct FileFightGenerator {
    path: PathBuf,
    shuffle: bool,
}

impl FileFightGenerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            shuffle: false,
        }
    }

    /// Play the file's combos in random order.
    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<FightResponse, FightError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            FightError::InvalidResponse(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let mut response: FightResponse = serde_json::from_str(&content)
            .map_err(|e| FightError::InvalidResponse(e.to_string()))?;
        if self.shuffle {
            response.combos.shuffle(&mut rand::thread_rng());
        }
        Ok(response)
    }
}

impl FightGenerator for FileFightGenerator {
    fn name(&self) -> &str {
        "file"
    }

    fn generate(
        &self,
        _request: &FightRequest,
    ) -> impl Future<Output = Result<FightResponse, FightError>> + Send {
        std::future::ready(self.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_combos_from_file() {
        let file = write_temp(
            r#"{"combos": [{"name": "A", "moves": [{"text": "JAB", "pauseTimeMs": 500}]}]}"#,
        );
        let response = FileFightGenerator::new(file.path())
            .generate(&FightRequest::new("boxing", "beginner"))
            .await
            .unwrap();
        assert_eq!(response.combos.len(), 1);
        assert_eq!(response.combos[0].moves[0].text, "JAB");
    }

    #[tokio::test]
    async fn shuffling_keeps_every_combo() {
        let file = write_temp(
            r#"{"combos": [
                {"name": "A", "moves": [{"text": "JAB", "pauseTimeMs": 500}]},
                {"name": "B", "moves": [{"text": "CROSS", "pauseTimeMs": 500}]},
                {"name": "C", "moves": [{"text": "HOOK", "pauseTimeMs": 500}]}
            ]}"#,
        );
        let response = FileFightGenerator::new(file.path())
            .shuffled()
            .generate(&FightRequest::new("boxing", "beginner"))
            .await
            .unwrap();
        let mut names: Vec<_> = response.combos.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn missing_file_is_an_invalid_response() {
        let err = FileFightGenerator::new("/definitely/not/here.json")
            .generate(&FightRequest::new("boxing", "beginner"))
            .await
            .unwrap_err();
        assert!(matches!(err, FightError::InvalidResponse(_)));
    }
}
