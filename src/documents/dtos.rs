use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::agent::{AnalysisMetadata, ClassificationResult, SummaryResult};

/// JSON body for URL-based processing.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UrlRequest {
    pub url: Option<String>,
}

/// Where the processed document came from.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceInfo {
    File {
        name: String,
        size: usize,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Url {
        url: String,
    },
}

/// Successful processing envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessResponse {
    pub success: bool,
    pub data: AnalysisData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisData {
    pub classification: ClassificationResult,
    pub summary: SummaryResult,
    pub metadata: ResponseMetadata,
}

/// Analysis metadata plus request-level context.
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMetadata {
    #[serde(flatten)]
    pub analysis: AnalysisMetadata,
    pub source: SourceInfo,
    pub processing_time_ms: u64,
}

/// Request rejected before any processing started.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub hint: String,
}

/// Processing started but failed partway through.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessingErrorResponse {
    pub success: bool,
    pub error: String,
    pub details: String,
    pub processing_time_ms: u64,
    pub hint: String,
}
