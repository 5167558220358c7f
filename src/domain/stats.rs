//! Read-side aggregation, recomputed from the full lists on every request.

use std::collections::HashMap;

use chrono::{Duration, FixedOffset, NaiveDate};

use super::dates::local_date;
use super::money::{package_total, parse_price};
use crate::models::{
    DailyCount, DestinationCount, EmployeeSummary, PerformanceReview, Promo, PromoStats, Role,
    User, UserPromoCount, UserStats, UserView,
};

pub const DAILY_WINDOW_DAYS: i64 = 30;

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Most frequent destination, grouped on the stored value as-is; ties go to
/// the one seen first.
fn most_popular(promos: &[Promo]) -> (usize, Option<DestinationCount>) {
    // destination -> (count, first index)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, promo) in promos.iter().enumerate() {
        counts.entry(promo.destination.as_str()).or_insert((0, index)).0 += 1;
    }

    let best = counts
        .iter()
        .max_by(|(_, a), (_, b)| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(name, (count, _))| DestinationCount {
            name: name.to_string(),
            count: *count,
        });

    (counts.len(), best)
}

pub fn promo_stats(promos: &[Promo], today: NaiveDate, offset: FixedOffset) -> PromoStats {
    let (unique_destinations, most_popular_destination) = most_popular(promos);

    let average_value = mean(
        promos
            .iter()
            .filter_map(|p| parse_price(&p.value))
            .map(package_total),
    )
    .unwrap_or(0.0);

    let average_nights = mean(promos.iter().map(|p| p.nights as f64)).unwrap_or(0.0);

    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for promo in promos {
        *per_day.entry(local_date(promo.created_at, offset)).or_default() += 1;
    }

    let daily_counts = (0..DAILY_WINDOW_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            DailyCount {
                date,
                count: per_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect();

    PromoStats {
        total_promos: promos.len(),
        unique_destinations,
        average_value,
        average_nights,
        most_popular_destination,
        daily_counts,
    }
}

pub fn user_stats(users: &[User], reviews: &[PerformanceReview], promos: &[Promo]) -> UserStats {
    let active: Vec<&User> = users.iter().filter(|u| u.active).collect();

    let mut promos_per_user: HashMap<&str, usize> = HashMap::new();
    for promo in promos {
        if let Some(owner) = promo.created_by.as_deref() {
            *promos_per_user.entry(owner).or_default() += 1;
        }
    }

    let mut promos_by_user: Vec<UserPromoCount> = users
        .iter()
        .filter_map(|u| {
            promos_per_user.get(u.id.as_str()).map(|count| UserPromoCount {
                user_id: u.id.clone(),
                name: u.name.clone(),
                promos: *count,
            })
        })
        .collect();
    promos_by_user.sort_by(|a, b| b.promos.cmp(&a.promos).then_with(|| a.name.cmp(&b.name)));

    UserStats {
        total_users: users.len(),
        active_users: active.len(),
        inactive_users: users.len() - active.len(),
        admins: users.iter().filter(|u| u.role == Role::Admin).count(),
        agents: users.iter().filter(|u| u.role == Role::Agent).count(),
        monthly_payroll: active.iter().filter_map(|u| u.salary).sum(),
        total_reviews: reviews.len(),
        average_rating: mean(reviews.iter().map(|r| r.rating)),
        promos_by_user,
    }
}

/// Employee rows sorted by name.
pub fn employee_summaries(users: &[User], reviews: &[PerformanceReview]) -> Vec<EmployeeSummary> {
    let mut rows: Vec<EmployeeSummary> = users
        .iter()
        .map(|user| {
            let own: Vec<&PerformanceReview> =
                reviews.iter().filter(|r| r.user_id == user.id).collect();
            EmployeeSummary {
                user: UserView::from(user),
                review_count: own.len(),
                average_rating: mean(own.iter().map(|r| r.rating)),
                last_review_period: own
                    .iter()
                    .max_by_key(|r| r.created_at)
                    .map(|r| r.period.clone()),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.user.name.to_lowercase().cmp(&b.user.name.to_lowercase()));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Departures, MealPlan};
    use chrono::{TimeZone, Utc};

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn promo(destination: &str, value: &str, nights: i64, days_ago: i64) -> Promo {
        let created_at = Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap()
            - Duration::days(days_ago);
        Promo {
            id: format!("{}-{}", destination, value),
            destination: destination.to_string(),
            hotel: "Hotel".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap() + Duration::days(nights),
            date_range: String::new(),
            nights,
            value: value.to_string(),
            installments: 10,
            meal_plan: MealPlan {
                breakfast: true,
                ..Default::default()
            },
            departures: Departures::default(),
            image_url: None,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_fixture_stats() {
        let promos = vec![
            promo("Rio", "100", 3, 0),
            promo("Rio", "200", 5, 1),
            promo("SP", "150", 4, 40),
        ];

        let stats = promo_stats(&promos, today(), brt());

        assert_eq!(stats.total_promos, 3);
        assert_eq!(stats.unique_destinations, 2);
        assert_eq!(
            stats.most_popular_destination,
            Some(DestinationCount {
                name: "Rio".to_string(),
                count: 2
            })
        );
        let expected = (100.0 + 200.0 + 150.0) * crate::domain::money::PEOPLE_PER_PACKAGE / 3.0;
        assert!((stats.average_value - expected).abs() < 1e-9);
        assert!((stats.average_nights - 4.0).abs() < 1e-9);

        assert_eq!(stats.daily_counts.len(), 30);
        assert_eq!(stats.daily_counts.last().unwrap().date, today());
        assert_eq!(stats.daily_counts.last().unwrap().count, 1);
        assert_eq!(stats.daily_counts[28].count, 1);
        // The 40-day-old promo falls outside the window
        let in_window: usize = stats.daily_counts.iter().map(|d| d.count).sum();
        assert_eq!(in_window, 2);
    }

    #[test]
    fn test_most_popular_tie_goes_to_first_seen() {
        let promos = vec![
            promo("Salvador", "100", 2, 0),
            promo("Natal", "100", 2, 0),
            promo("Natal", "100", 2, 0),
            promo("Salvador", "100", 2, 0),
        ];
        let stats = promo_stats(&promos, today(), brt());
        assert_eq!(stats.most_popular_destination.unwrap().name, "Salvador");
    }

    #[test]
    fn test_destinations_are_counted_verbatim() {
        let promos = vec![
            promo("Rio", "100", 2, 0),
            promo("rio", "100", 2, 0),
            promo("rio", "100", 2, 0),
        ];
        let stats = promo_stats(&promos, today(), brt());
        assert_eq!(stats.unique_destinations, 2);
        assert_eq!(
            stats.most_popular_destination,
            Some(DestinationCount {
                name: "rio".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn test_empty_stats() {
        let stats = promo_stats(&[], today(), brt());
        assert_eq!(stats.total_promos, 0);
        assert_eq!(stats.average_value, 0.0);
        assert!(stats.most_popular_destination.is_none());
        assert!(stats.daily_counts.iter().all(|d| d.count == 0));
    }
}
