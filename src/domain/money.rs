//! Price parsing and Brazilian-real formatting.

/// Travellers a package price covers; the stored value is per person.
pub const PEOPLE_PER_PACKAGE: f64 = 2.0;

/// Parse a price typed by an agent.
///
/// Accepts `1299`, `1299.90`, `1.299,90`, `R$ 1.299,90` and `1.299`
/// (a single dot followed by exactly three digits is a thousands separator).
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 {
        cleaned.replace('.', "")
    } else {
        match cleaned.split_once('.') {
            Some((_, decimals)) if decimals.len() == 3 => cleaned.replace('.', ""),
            _ => cleaned,
        }
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Package price for the whole party.
pub fn package_total(value: f64) -> f64 {
    value * PEOPLE_PER_PACKAGE
}

/// Format as `R$ 1.234,56`.
pub fn format_brl(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let units = cents / 100;
    let fraction = cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("100"), Some(100.0));
        assert_eq!(parse_price("1299.90"), Some(1299.9));
        assert_eq!(parse_price("1.299,90"), Some(1299.9));
        assert_eq!(parse_price("R$ 2.450,00"), Some(2450.0));
        assert_eq!(parse_price("1.299"), Some(1299.0));
        assert_eq!(parse_price("1.234.567"), Some(1234567.0));
        assert_eq!(parse_price("  "), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(0.0), "R$ 0,00");
        assert_eq!(format_brl(99.5), "R$ 99,50");
        assert_eq!(format_brl(1234.56), "R$ 1.234,56");
        assert_eq!(format_brl(1234567.891), "R$ 1.234.567,89");
    }

    #[test]
    fn test_package_total() {
        assert_eq!(package_total(150.0), 300.0);
    }
}
