use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Model-reported confidence in a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Urgency assessment attached to a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Parsed output of the classification call.
///
/// Collection fields default to empty so a model response that omits them
/// still parses; the core fields are required.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResult {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub confidence: Confidence,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Entities the summarizer pulled out of the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportantDetails {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub amounts: Vec<String>,
    #[serde(default)]
    pub parties: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Parsed output of the summarization call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResult {
    pub main_purpose: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub important_details: ImportantDetails,
    #[serde(default)]
    pub action_items: Vec<String>,
    pub summary: String,
    pub urgency_level: Urgency,
    #[serde(default)]
    pub requires_follow_up: bool,
}

/// Derived statistics about the analyzed text, computed locally.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisMetadata {
    pub processed_at: DateTime<Utc>,
    pub content_length: usize,
    pub word_count: usize,
    pub char_count: usize,
    pub estimated_reading_time_minutes: usize,
}

/// Reading speed used for the estimated reading time, in words per minute.
const READING_WORDS_PER_MINUTE: usize = 200;

impl AnalysisMetadata {
    pub fn for_content(content: &str) -> Self {
        let word_count = content.split_whitespace().count();
        Self {
            processed_at: Utc::now(),
            content_length: content.len(),
            word_count,
            char_count: content.chars().count(),
            estimated_reading_time_minutes: word_count.div_ceil(READING_WORDS_PER_MINUTE).max(1),
        }
    }
}

/// Complete result of one document analysis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentAnalysis {
    pub classification: ClassificationResult,
    pub summary: SummaryResult,
    pub metadata: AnalysisMetadata,
}
