//! Employee performance review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Record;

pub const REVIEWS_KEY: &str = "performance_reviews";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewMetrics {
    pub promos_created: u32,
    pub leads_handled: u32,
    pub sales_closed: u32,
    /// Average customer score, 0 to 5
    pub customer_satisfaction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReview {
    pub id: String,
    pub user_id: String,
    /// Free-form period label, e.g. `2026-09` or `2026-T3`
    pub period: String,
    #[serde(default)]
    pub metrics: ReviewMetrics,
    /// Overall rating, 0 to 10
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub reviewer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for PerformanceReview {
    const KEY: &'static str = REVIEWS_KEY;
    const LABEL: &'static str = "Avaliação";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub metrics: ReviewMetrics,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}
