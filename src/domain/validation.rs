//! Payload validation.
//!
//! Each validator collects every violation so the client gets the full list
//! in `details`, then hands back a typed draft the repository can store.

use chrono::NaiveDate;

use super::dates::{nights_between, parse_date};
use super::money::parse_price;
use crate::errors::AppError;
use crate::models::{
    Departures, MealPlan, PromoPayload, ReviewMetrics, ReviewPayload, Role, UserPayload,
};

pub const MAX_INSTALLMENTS: u32 = 24;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_RATING: f64 = 10.0;
pub const MAX_SATISFACTION: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PromoDraft {
    pub destination: String,
    pub hotel: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: i64,
    pub value: String,
    pub installments: u32,
    pub meal_plan: MealPlan,
    pub departures: Departures,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub salary: Option<f64>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub user_id: String,
    pub period: String,
    pub metrics: ReviewMetrics,
    pub rating: f64,
    pub comments: Option<String>,
}

fn finish<T>(draft: Option<T>, violations: Vec<String>) -> Result<T, AppError> {
    match draft {
        Some(draft) if violations.is_empty() => Ok(draft),
        _ => Err(AppError::validation(violations)),
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_date(
    raw: &Option<String>,
    field: &str,
    violations: &mut Vec<String>,
) -> Option<NaiveDate> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            violations.push(format!("{}: data é obrigatória", field));
            None
        }
        Some(s) => {
            let parsed = parse_date(s);
            if parsed.is_none() {
                violations.push(format!("{}: data inválida, use AAAA-MM-DD", field));
            }
            parsed
        }
    }
}

pub fn validate_promo(payload: &PromoPayload) -> Result<PromoDraft, AppError> {
    let mut violations = Vec::new();

    let destination = payload.destination.trim().to_string();
    if destination.is_empty() {
        violations.push("destination: destino é obrigatório".to_string());
    }
    let hotel = payload.hotel.trim().to_string();
    if hotel.is_empty() {
        violations.push("hotel: hotel é obrigatório".to_string());
    }

    let start_date = required_date(&payload.start_date, "startDate", &mut violations);
    let end_date = required_date(&payload.end_date, "endDate", &mut violations);
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end <= start {
            violations.push("endDate: data de término deve ser posterior ao início".to_string());
        }
    }

    let value = payload.value.trim().to_string();
    match parse_price(&value) {
        None => violations.push("value: valor inválido".to_string()),
        Some(v) if v <= 0.0 => violations.push("value: valor deve ser maior que zero".to_string()),
        Some(_) => {}
    }

    if !(1..=MAX_INSTALLMENTS).contains(&payload.installments) {
        violations.push(format!(
            "installments: parcelas devem estar entre 1 e {}",
            MAX_INSTALLMENTS
        ));
    }

    if payload.meal_plan.selected_count() != 1 {
        violations.push("mealPlan: selecione exatamente um regime de alimentação".to_string());
    }
    if !payload.departures.any() {
        violations.push("departures: selecione ao menos uma cidade de saída".to_string());
    }

    let image_url = trimmed(&payload.image_url);
    if let Some(url) = &image_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            violations.push("imageUrl: URL da imagem inválida".to_string());
        }
    }

    let draft = match (start_date, end_date) {
        (Some(start_date), Some(end_date)) => Some(PromoDraft {
            destination,
            hotel,
            start_date,
            end_date,
            nights: nights_between(start_date, end_date),
            value,
            installments: payload.installments,
            meal_plan: payload.meal_plan.clone(),
            departures: payload.departures.clone(),
            image_url,
        }),
        _ => None,
    };

    finish(draft, violations)
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn validate_user(payload: &UserPayload) -> Result<UserDraft, AppError> {
    let mut violations = Vec::new();

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        violations.push("name: nome é obrigatório".to_string());
    }

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        violations.push("email: email é obrigatório".to_string());
    } else if !looks_like_email(&email) {
        violations.push("email: email inválido".to_string());
    }

    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    if let Some(p) = &password {
        if p.chars().count() < MIN_PASSWORD_LEN {
            violations.push(format!(
                "password: senha deve ter ao menos {} caracteres",
                MIN_PASSWORD_LEN
            ));
        }
    }

    let role = match trimmed(&payload.role) {
        None => None,
        Some(raw) => {
            let parsed = Role::parse(&raw);
            if parsed.is_none() {
                violations.push("role: perfil deve ser admin ou agent".to_string());
            }
            parsed
        }
    };

    if let Some(salary) = payload.salary {
        if !salary.is_finite() || salary < 0.0 {
            violations.push("salary: salário não pode ser negativo".to_string());
        }
    }

    let hire_date = match trimmed(&payload.hire_date) {
        None => None,
        Some(raw) => {
            let parsed = parse_date(&raw);
            if parsed.is_none() {
                violations.push("hireDate: data inválida, use AAAA-MM-DD".to_string());
            }
            parsed
        }
    };

    let draft = UserDraft {
        name,
        email,
        password,
        role,
        active: payload.active,
        salary: payload.salary,
        position: trimmed(&payload.position),
        phone: trimmed(&payload.phone),
        hire_date,
    };

    finish(Some(draft), violations)
}

pub fn validate_review(payload: &ReviewPayload) -> Result<ReviewDraft, AppError> {
    let mut violations = Vec::new();

    let user_id = payload.user_id.trim().to_string();
    if user_id.is_empty() {
        violations.push("userId: funcionário é obrigatório".to_string());
    }
    let period = payload.period.trim().to_string();
    if period.is_empty() {
        violations.push("period: período é obrigatório".to_string());
    }

    let rating = match payload.rating {
        None => {
            violations.push("rating: nota é obrigatória".to_string());
            0.0
        }
        Some(r) => {
            if !(0.0..=MAX_RATING).contains(&r) {
                violations.push(format!("rating: nota deve estar entre 0 e {}", MAX_RATING));
            }
            r
        }
    };

    let satisfaction = payload.metrics.customer_satisfaction;
    if !(0.0..=MAX_SATISFACTION).contains(&satisfaction) {
        violations.push(format!(
            "metrics.customerSatisfaction: satisfação deve estar entre 0 e {}",
            MAX_SATISFACTION
        ));
    }

    let draft = ReviewDraft {
        user_id,
        period,
        metrics: payload.metrics.clone(),
        rating,
        comments: trimmed(&payload.comments),
    };

    finish(Some(draft), violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo_payload() -> PromoPayload {
        PromoPayload {
            destination: " Rio ".to_string(),
            hotel: "Copacabana Palace".to_string(),
            start_date: Some("2026-11-10".to_string()),
            end_date: Some("2026-11-15".to_string()),
            value: "1.299,90".to_string(),
            installments: 10,
            meal_plan: MealPlan {
                breakfast: true,
                ..Default::default()
            },
            departures: Departures {
                sao_paulo: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn details(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation { details, .. } => details,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_promo_derives_nights() {
        let draft = validate_promo(&promo_payload()).unwrap();
        assert_eq!(draft.destination, "Rio");
        assert_eq!(draft.nights, 5);
        assert_eq!(draft.value, "1.299,90");
    }

    #[test]
    fn test_promo_meal_plan_must_be_exactly_one() {
        let mut payload = promo_payload();
        payload.meal_plan.all_inclusive = true;
        let errs = details(validate_promo(&payload).unwrap_err());
        assert_eq!(errs.len(), 1);
        assert!(errs[0].starts_with("mealPlan"));

        payload.meal_plan = MealPlan::default();
        assert!(validate_promo(&payload).is_err());
    }

    #[test]
    fn test_promo_collects_every_violation() {
        let payload = PromoPayload {
            installments: 0,
            ..Default::default()
        };
        let errs = details(validate_promo(&payload).unwrap_err());
        let fields: Vec<&str> = errs.iter().filter_map(|e| e.split(':').next()).collect();
        for field in [
            "destination",
            "hotel",
            "startDate",
            "endDate",
            "value",
            "installments",
            "mealPlan",
            "departures",
        ] {
            assert!(fields.contains(&field), "missing {} in {:?}", field, errs);
        }
    }

    #[test]
    fn test_promo_end_before_start() {
        let mut payload = promo_payload();
        payload.end_date = Some("2026-11-10".to_string());
        let errs = details(validate_promo(&payload).unwrap_err());
        assert!(errs[0].starts_with("endDate"));
    }

    #[test]
    fn test_user_validation() {
        let payload = UserPayload {
            name: "Ana".to_string(),
            email: " Ana@Agencia.com.br ".to_string(),
            password: Some("segredo1".to_string()),
            role: Some("admin".to_string()),
            ..Default::default()
        };
        let draft = validate_user(&payload).unwrap();
        assert_eq!(draft.email, "ana@agencia.com.br");
        assert_eq!(draft.role, Some(Role::Admin));

        let bad = UserPayload {
            name: "".to_string(),
            email: "not-an-email".to_string(),
            password: Some("123".to_string()),
            role: Some("owner".to_string()),
            salary: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(details(validate_user(&bad).unwrap_err()).len(), 5);
    }

    #[test]
    fn test_review_rating_range() {
        let mut payload = ReviewPayload {
            user_id: "u1".to_string(),
            period: "2026-09".to_string(),
            rating: Some(8.5),
            ..Default::default()
        };
        assert!(validate_review(&payload).is_ok());

        payload.rating = Some(11.0);
        assert!(validate_review(&payload).is_err());

        payload.rating = None;
        assert!(validate_review(&payload).is_err());
    }
}
