//! Store bootstrap and repair.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::repository::{promo_history, review_history};
use super::{new_id, Record, Repository};
use crate::auth::{hash_password, is_hashed};
use crate::config::AdminSeed;
use crate::errors::AppError;
use crate::models::{
    InitReport, MigrationReport, PerformanceReview, Promo, Role, User, INSTAGRAM_KEY, PROMOS_KEY,
    REVIEWS_KEY, SESSIONS_KEY, USERS_KEY,
};

const LIST_KEYS: [&str; 5] = [USERS_KEY, PROMOS_KEY, REVIEWS_KEY, INSTAGRAM_KEY, SESSIONS_KEY];

/// Fill id and timestamps on one raw record. Returns whether anything changed.
fn fill_record_defaults(record: &mut Map<String, Value>, now: &str) -> bool {
    let mut changed = false;

    let missing_id = match record.get("id") {
        Some(Value::String(id)) => id.trim().is_empty(),
        _ => true,
    };
    if missing_id {
        record.insert("id".to_string(), Value::String(new_id()));
        changed = true;
    }

    if !matches!(record.get("createdAt"), Some(Value::String(_))) {
        record.insert("createdAt".to_string(), Value::String(now.to_string()));
        changed = true;
    }
    if !matches!(record.get("updatedAt"), Some(Value::String(_))) {
        let created = record
            .get("createdAt")
            .cloned()
            .unwrap_or_else(|| Value::String(now.to_string()));
        record.insert("updatedAt".to_string(), created);
        changed = true;
    }

    changed
}

/// User-specific defaults. Returns `(changed, password_hashed)`.
fn fill_user_defaults(record: &mut Map<String, Value>) -> Result<(bool, bool), AppError> {
    let mut changed = false;

    if !matches!(record.get("active"), Some(Value::Bool(_))) {
        record.insert("active".to_string(), Value::Bool(true));
        changed = true;
    }
    if !matches!(record.get("performanceHistory"), Some(Value::Array(_))) {
        record.insert("performanceHistory".to_string(), Value::Array(Vec::new()));
        changed = true;
    }

    let plaintext = match record.get("password") {
        Some(Value::String(p)) if !p.is_empty() && !is_hashed(p) => Some(p.clone()),
        _ => None,
    };
    match plaintext {
        Some(plain) => {
            record.insert("password".to_string(), Value::String(hash_password(&plain)?));
            Ok((true, true))
        }
        None => Ok((changed, false)),
    }
}

/// Typed view of a raw list; records that still do not parse are skipped.
fn parse_records<T: DeserializeOwned>(key: &str, raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key, "Skipping unreadable record: {}", e);
                None
            }
        })
        .collect()
}

impl Repository {
    /// Create missing keys and seed the first admin. Safe to call repeatedly.
    pub async fn init(&self, admin: &AdminSeed) -> Result<InitReport, AppError> {
        let mut report = InitReport::default();

        for key in LIST_KEYS {
            if self.kv.exists(key).await? {
                continue;
            }

            let seeded = if key == USERS_KEY {
                vec![serde_json::to_value(seed_admin(admin)?)?]
            } else {
                Vec::new()
            };

            // Version 0 only inserts when the key is still absent
            if self.kv.compare_and_set(key, &seeded, 0).await? {
                if key == USERS_KEY {
                    report.admin_created = true;
                }
                report.keys_created.push(key.to_string());
            }
        }

        tracing::info!(
            admin_created = report.admin_created,
            keys = ?report.keys_created,
            "Store initialized"
        );
        Ok(report)
    }

    /// Repair legacy data in place and rebuild performance histories.
    pub async fn migrate(&self) -> Result<MigrationReport, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut report = MigrationReport::default();

        for key in LIST_KEYS {
            let (fixed, hashed) = self
                .kv
                .update::<Vec<Value>, _, _>(key, |records| {
                    let mut fixed = 0;
                    let mut hashed = 0;
                    for record in records.iter_mut() {
                        let Some(object) = record.as_object_mut() else {
                            continue;
                        };
                        let mut changed = fill_record_defaults(object, &now);
                        if key == USERS_KEY {
                            let (user_changed, password_hashed) = fill_user_defaults(object)?;
                            changed |= user_changed;
                            if password_hashed {
                                hashed += 1;
                            }
                        }
                        if changed {
                            fixed += 1;
                        }
                    }
                    Ok((fixed, hashed))
                })
                .await?;

            if fixed > 0 {
                tracing::info!(key, fixed, "Repaired records");
            }
            report.records_fixed += fixed;
            report.passwords_hashed += hashed;
        }

        report.history_entries = self.rebuild_histories().await?;

        tracing::info!(
            records_fixed = report.records_fixed,
            passwords_hashed = report.passwords_hashed,
            history_entries = report.history_entries,
            "Migration finished"
        );
        Ok(report)
    }

    async fn raw_list<T: Record>(&self) -> Result<Vec<T>, AppError> {
        let raw = self.kv.get::<Vec<Value>>(T::KEY).await?.unwrap_or_default();
        Ok(parse_records(T::KEY, raw))
    }

    /// Recompute every user's history from promos and reviews.
    async fn rebuild_histories(&self) -> Result<usize, AppError> {
        let promos: Vec<Promo> = self.raw_list().await?;
        let reviews: Vec<PerformanceReview> = self.raw_list().await?;
        let now = Utc::now();

        self.users
            .mutate(|users| {
                let mut total = 0;
                for user in users.iter_mut() {
                    let entries: Vec<_> = promos
                        .iter()
                        .filter(|p| p.created_by.as_deref() == Some(user.id.as_str()))
                        .map(promo_history)
                        .chain(
                            reviews
                                .iter()
                                .filter(|r| r.user_id == user.id)
                                .map(review_history),
                        )
                        .collect();

                    let before = user.performance_history.clone();
                    user.performance_history.retain(|e| {
                        entries
                            .iter()
                            .any(|n| n.kind == e.kind && n.reference_id == e.reference_id)
                    });
                    for entry in entries {
                        user.record_history(entry);
                    }
                    user.performance_history.sort_by_key(|e| e.created_at);

                    if user.performance_history != before {
                        user.updated_at = now;
                    }
                    total += user.performance_history.len();
                }
                Ok(total)
            })
            .await
    }
}

fn seed_admin(admin: &AdminSeed) -> Result<User, AppError> {
    let password = match &admin.password {
        Some(p) => p.clone(),
        None => {
            let generated = new_id().replace('-', "")[..16].to_string();
            tracing::warn!(
                email = %admin.email,
                password = %generated,
                "No admin password configured; generated one. Change it after first login"
            );
            generated
        }
    };

    let now = Utc::now();
    Ok(User {
        id: new_id(),
        name: admin.name.clone(),
        email: admin.email.trim().to_lowercase(),
        password: hash_password(&password)?,
        role: Role::Admin,
        active: true,
        salary: None,
        position: None,
        phone: None,
        hire_date: None,
        performance_history: Vec::new(),
        created_at: now,
        updated_at: now,
    })
}
