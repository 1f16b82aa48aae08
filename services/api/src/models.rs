//! API Models
//!
//! This module defines the data structures returned by the REST API and used
//! for generating OpenAPI documentation with `utoipa`.

use avi_core::phrase::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
pub enum RecordStatus {
    Active,
    Ended,
}

/// A practice session as stored and listed over the REST API.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct SessionRecord {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub topic: String,
    #[schema(value_type = String, example = "A1")]
    pub level: Level,
    #[schema(value_type = String, example = "Active")]
    pub status: RecordStatus,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub final_score: Option<u8>,
}

/// A topic as listed over the REST API, phrases elided.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TopicSummary {
    #[schema(example = "Saludos y Presentaciones")]
    pub name: String,
    #[schema(value_type = String, example = "A1")]
    pub level: Level,
    pub description: String,
    pub phrase_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
