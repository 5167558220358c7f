//! CSV export of promos.

use chrono::{DateTime, FixedOffset, Utc};

use super::dates::{days_window, parse_date, today_window, Window};
use super::money::{format_brl, package_total, parse_price};
use crate::errors::AppError;
use crate::models::{ExportQuery, ExportScope, Promo};

pub const CSV_HEADER: [&str; 11] = [
    "Destino",
    "Hotel",
    "Período",
    "Noites",
    "Valor por pessoa",
    "Valor total",
    "Parcelas",
    "Valor da parcela",
    "Regime",
    "Saídas",
    "Criado em",
];

/// Resolve the export scope into an optional creation-time window.
pub fn export_window(
    query: &ExportQuery,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Option<Window>, AppError> {
    match query.scope {
        ExportScope::All => Ok(None),
        ExportScope::Today => Ok(Some(today_window(now, offset)?)),
        ExportScope::Custom => {
            let start = query.start_date.as_deref().and_then(parse_date);
            let end = query.end_date.as_deref().and_then(parse_date);
            match (start, end) {
                (Some(start), Some(end)) if start <= end => {
                    Ok(Some(days_window(start, end, offset)?))
                }
                (Some(_), Some(_)) => Err(AppError::validation(vec![
                    "endDate: data final deve ser igual ou posterior à inicial".to_string(),
                ])),
                _ => Err(AppError::validation(vec![
                    "startDate/endDate: informe as duas datas no formato AAAA-MM-DD".to_string(),
                ])),
            }
        }
    }
}

/// Quote-wrap a field, doubling embedded quotes.
fn field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn row(promo: &Promo, offset: FixedOffset) -> String {
    let per_person = parse_price(&promo.value).unwrap_or(0.0);
    let total = package_total(per_person);
    let installment = total / f64::from(promo.installments.max(1));

    let columns = [
        promo.destination.clone(),
        promo.hotel.clone(),
        promo.date_range.clone(),
        promo.nights.to_string(),
        format_brl(per_person),
        format_brl(total),
        promo.installments.to_string(),
        format_brl(installment),
        promo.meal_plan.label().to_string(),
        promo.departures.labels().join(" / "),
        promo
            .created_at
            .with_timezone(&offset)
            .format("%d/%m/%Y %H:%M")
            .to_string(),
    ];

    columns.iter().map(|c| field(c)).collect::<Vec<_>>().join(",")
}

/// Header plus one line per promo, `\n`-separated.
pub fn promos_to_csv(promos: &[Promo], offset: FixedOffset) -> String {
    let header = CSV_HEADER.iter().map(|h| field(h)).collect::<Vec<_>>().join(",");
    std::iter::once(header)
        .chain(promos.iter().map(|p| row(p, offset)))
        .collect::<Vec<_>>()
        .join("\n")
}
