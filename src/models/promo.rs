//! Travel promotion model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::Record;

pub const PROMOS_KEY: &str = "promos";

/// Meal-plan flags. Exactly one must be set on a stored promo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlan {
    pub breakfast: bool,
    pub half_board: bool,
    pub full_board: bool,
    pub all_inclusive: bool,
}

impl MealPlan {
    fn flags(&self) -> [(bool, &'static str); 4] {
        [
            (self.breakfast, "Café da manhã"),
            (self.half_board, "Meia pensão"),
            (self.full_board, "Pensão completa"),
            (self.all_inclusive, "All inclusive"),
        ]
    }

    pub fn selected_count(&self) -> usize {
        self.flags().iter().filter(|(on, _)| *on).count()
    }

    /// Label of the selected plan (first one if several are set).
    pub fn label(&self) -> &'static str {
        self.flags()
            .iter()
            .find(|(on, _)| *on)
            .map(|(_, label)| *label)
            .unwrap_or("")
    }
}

/// Departure-city flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Departures {
    pub sao_paulo: bool,
    pub rio_de_janeiro: bool,
    pub belo_horizonte: bool,
    pub brasilia: bool,
}

impl Departures {
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.sao_paulo, "São Paulo"),
            (self.rio_de_janeiro, "Rio de Janeiro"),
            (self.belo_horizonte, "Belo Horizonte"),
            (self.brasilia, "Brasília"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }

    pub fn any(&self) -> bool {
        self.sao_paulo || self.rio_de_janeiro || self.belo_horizonte || self.brasilia
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Promo {
    pub id: String,
    pub destination: String,
    pub hotel: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `dd/mm/yyyy a dd/mm/yyyy`
    pub date_range: String,
    pub nights: i64,
    /// Per-person base price as typed by the agent
    pub value: String,
    pub installments: u32,
    #[serde(flatten)]
    pub meal_plan: MealPlan,
    #[serde(default)]
    pub departures: Departures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Promo {
    const KEY: &'static str = PROMOS_KEY;
    const LABEL: &'static str = "Promoção";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Request body for creating or replacing a promo.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub hotel: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default = "default_installments")]
    pub installments: u32,
    #[serde(flatten)]
    pub meal_plan: MealPlan,
    #[serde(default)]
    pub departures: Departures,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Honoured for admins only; agents always own what they create
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_installments() -> u32 {
    10
}

/// Accept `"1.299,00"` as well as `1299`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Query filters for promo listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// `GET /promos/csv` selector.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    #[default]
    All,
    Today,
    Custom,
}

impl ExportScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportScope::All => "all",
            ExportScope::Today => "today",
            ExportScope::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(default, rename = "type")]
    pub scope: ExportScope,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accepts_numeric_value_and_flat_flags() {
        let payload: PromoPayload = serde_json::from_value(serde_json::json!({
            "destination": "Rio",
            "hotel": "Copacabana Palace",
            "value": 1299.5,
            "halfBoard": true,
            "departures": { "saoPaulo": true }
        }))
        .unwrap();

        assert_eq!(payload.value, "1299.5");
        assert_eq!(payload.installments, 10);
        assert!(payload.meal_plan.half_board);
        assert_eq!(payload.meal_plan.selected_count(), 1);
        assert_eq!(payload.departures.labels(), vec!["São Paulo"]);
    }

    #[test]
    fn test_meal_plan_label() {
        let plan = MealPlan {
            all_inclusive: true,
            ..Default::default()
        };
        assert_eq!(plan.label(), "All inclusive");
        assert_eq!(MealPlan::default().label(), "");
    }
}
