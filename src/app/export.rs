use crate::domain::model::{OutfitSuggestions, TryOnOutcome};
use crate::domain::ports::Storage;
use crate::utils::error::Result;

pub const SUGGESTIONS_FILE: &str = "suggestions.json";

/// Folder name for one command-line run, e.g. `run_20250101_120000`.
pub fn run_folder_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("run_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Writes the suggestions and, when present, the try-on image.
/// Returns the written paths.
pub async fn export_run<S: Storage>(
    storage: &S,
    suggestions: &OutfitSuggestions,
    outcome: Option<&TryOnOutcome>,
) -> Result<Vec<String>> {
    let mut written = Vec::new();

    let json = serde_json::to_vec_pretty(suggestions)?;
    written.push(storage.write_file(SUGGESTIONS_FILE, &json).await?);

    if let Some(outcome) = outcome {
        let name = format!("try_on.{}", outcome.image.extension());
        written.push(storage.write_file(&name, &outcome.image.bytes).await?);
    }

    tracing::info!("💾 Saved {} file(s)", written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::domain::model::fixtures::JPEG;
    use crate::domain::model::{
        ImageData, QueryRequirements, SearchKeywords, UserProfile,
    };
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn suggestions() -> OutfitSuggestions {
        OutfitSuggestions {
            profile: UserProfile::default(),
            requirements: QueryRequirements::default(),
            keywords: SearchKeywords::default(),
            tops: Vec::new(),
            bottoms: Vec::new(),
            outfit_sets: Vec::new(),
            explanation: String::new(),
            status: "Found 0 tops and 0 bottoms!".to_string(),
        }
    }

    #[test]
    fn test_run_folder_name() {
        let now = chrono::Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(run_folder_name(now), "run_20250309_140507");
    }

    #[tokio::test]
    async fn test_export_run_writes_files() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("run"));
        let outcome = TryOnOutcome {
            image: ImageData::from_bytes(JPEG.to_vec()).unwrap(),
            status: "Try-on complete! Showing: Tee".to_string(),
            buy_url: None,
        };

        let written = export_run(&storage, &suggestions(), Some(&outcome))
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[1].ends_with("try_on.jpg"));

        let json = storage.read_file(SUGGESTIONS_FILE).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["status"], "Found 0 tops and 0 bottoms!");
        assert_eq!(storage.read_file("try_on.jpg").await.unwrap(), JPEG.to_vec());
    }
}
