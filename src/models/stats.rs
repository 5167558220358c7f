//! Read-side aggregates and report shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::UserView;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestinationCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromoStats {
    pub total_promos: usize,
    pub unique_destinations: usize,
    pub average_value: f64,
    pub average_nights: f64,
    pub most_popular_destination: Option<DestinationCount>,
    /// Last 30 days, oldest first, today included
    pub daily_counts: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserPromoCount {
    pub user_id: String,
    pub name: String,
    pub promos: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: usize,
    pub active_users: usize,
    pub inactive_users: usize,
    pub admins: usize,
    pub agents: usize,
    /// Sum of salaries of active users
    pub monthly_payroll: f64,
    pub total_reviews: usize,
    pub average_rating: Option<f64>,
    pub promos_by_user: Vec<UserPromoCount>,
}

/// Employee listing row: the user plus a review digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    #[serde(flatten)]
    pub user: UserView,
    pub review_count: usize,
    pub average_rating: Option<f64>,
    pub last_review_period: Option<String>,
}

/// Outcome of `POST /migrate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub records_fixed: usize,
    pub passwords_hashed: usize,
    pub history_entries: usize,
}

/// Outcome of `GET /init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub admin_created: bool,
    pub keys_created: Vec<String>,
}
