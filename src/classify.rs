use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{Category, TaskRecord};

/// Keyword lists driving the classification. Road-leveling keywords always
/// take priority over core-supplement keywords.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub road_leveling: Vec<String>,
    pub core_supplement: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            // 超平 is a frequent mis-transcription of 抄平.
            road_leveling: vec!["抄平".to_string(), "超平".to_string()],
            core_supplement: vec!["核补".to_string()],
        }
    }
}

impl KeywordConfig {
    /// Loads a keyword configuration from a JSON file. Missing lists fall back
    /// to the built-in defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: KeywordConfig = serde_json::from_str(&data)?;
        Ok(config)
    }
}

/// Case- and whitespace-insensitive keyword classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    road_leveling: Vec<String>,
    core_supplement: Vec<String>,
}

impl Classifier {
    pub fn new(config: &KeywordConfig) -> Result<Self> {
        Ok(Self {
            road_leveling: prepare_keywords(&config.road_leveling)?,
            core_supplement: prepare_keywords(&config.core_supplement)?,
        })
    }

    pub fn classify(&self, text: &str) -> Category {
        let text = fold(text);
        if self.road_leveling.iter().any(|kw| text.contains(kw.as_str())) {
            Category::RoadLeveling
        } else if self.core_supplement.iter().any(|kw| text.contains(kw.as_str())) {
            Category::CoreSupplementTopography
        } else {
            Category::Uncategorized
        }
    }

    /// Assigns a category to every record from its descriptive text.
    pub fn classify_records(&self, records: Vec<TaskRecord>) -> Vec<TaskRecord> {
        records
            .into_iter()
            .map(|mut record| {
                record.category = self.classify(&record.description);
                debug!(code = %record.code, category = %record.category, "classified task");
                record
            })
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(&KeywordConfig::default()).expect("built-in keywords are non-empty")
    }
}

fn prepare_keywords(keywords: &[String]) -> Result<Vec<String>> {
    keywords
        .iter()
        .map(|keyword| {
            let folded = fold(keyword);
            if folded.is_empty() {
                Err(ToolError::InvalidKeywords(format!(
                    "empty keyword '{keyword}'"
                )))
            } else {
                Ok(folded)
            }
        })
        .collect()
}

fn fold(text: &str) -> String {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
