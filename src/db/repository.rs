//! Entity operations over the list repositories.
//!
//! Business rules that span records (email uniqueness, the last-admin guard,
//! history fan-out) live here so handlers stay thin.

use chrono::{DateTime, Utc};

use super::{new_id, KvStore, ListRepository, Upsert};
use crate::auth::{hash_password, Claims};
use crate::domain::dates::{format_date_range, Window};
use crate::domain::validation::{validate_promo, validate_review, validate_user};
use crate::errors::{messages, AppError};
use crate::models::{
    HistoryKind, InboxAction, InboxQuery, PerformanceHistoryEntry, PerformanceReview, Promo,
    PromoPayload, Reply, ReviewPayload, Role, SocialMessage, User, UserPayload, UserSession,
    INSTAGRAM_CHANNEL, MAX_SESSION_RECORDS,
};

/// Repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(crate) kv: KvStore,
    pub users: ListRepository<User>,
    pub promos: ListRepository<Promo>,
    pub reviews: ListRepository<PerformanceReview>,
    pub messages: ListRepository<SocialMessage>,
    pub sessions: ListRepository<UserSession>,
}

/// Filters for promo listings.
#[derive(Debug, Clone, Default)]
pub struct PromoFilter {
    pub created: Option<Window>,
    pub created_by: Option<String>,
}

impl PromoFilter {
    pub fn matches(&self, promo: &Promo) -> bool {
        let window_ok = self
            .created
            .map(|w| w.contains(promo.created_at))
            .unwrap_or(true);
        let owner_ok = match &self.created_by {
            Some(owner) => promo.created_by.as_deref() == Some(owner.as_str()),
            None => true,
        };
        window_ok && owner_ok
    }
}

fn non_empty_id(id: Option<&str>) -> Option<String> {
    id.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn active_admins(users: &[User]) -> usize {
    users.iter().filter(|u| u.is_active_admin()).count()
}

fn last_admin_conflict() -> AppError {
    AppError::Conflict(messages::LAST_ADMIN.to_string())
}

impl Repository {
    pub fn new(kv: KvStore) -> Self {
        Self {
            users: ListRepository::new(kv.clone()),
            promos: ListRepository::new(kv.clone()),
            reviews: ListRepository::new(kv.clone()),
            messages: ListRepository::new(kv.clone()),
            sessions: ListRepository::new(kv.clone()),
            kv,
        }
    }

    // ==================== USER OPERATIONS ====================

    /// Create or replace a user.
    ///
    /// `id` from the path wins over the payload id; with neither, a new user
    /// is created. An unknown id is created rather than rejected.
    pub async fn save_user(
        &self,
        id: Option<&str>,
        payload: &UserPayload,
        default_role: Role,
    ) -> Result<(User, Upsert), AppError> {
        let draft = validate_user(payload)?;
        let id = non_empty_id(id)
            .or_else(|| non_empty_id(payload.id.as_deref()))
            .unwrap_or_else(new_id);

        // Hash outside the write so retries do not pay for it again
        let new_hash = match &draft.password {
            Some(plain) => Some(hash_password(plain)?),
            None => None,
        };
        let now = Utc::now();

        let (user, outcome) = self
            .users
            .upsert_with(&id, |existing, all| {
                if all
                    .iter()
                    .any(|u| u.id != id && u.email.eq_ignore_ascii_case(&draft.email))
                {
                    return Err(AppError::Conflict(messages::EMAIL_IN_USE.to_string()));
                }

                let password = match (&new_hash, existing) {
                    (Some(hash), _) => hash.clone(),
                    (None, Some(current)) => current.password.clone(),
                    (None, None) => {
                        return Err(AppError::validation(vec![
                            "password: senha é obrigatória".to_string(),
                        ]))
                    }
                };

                let role = draft
                    .role
                    .or(existing.map(|u| u.role))
                    .unwrap_or(default_role);
                let active = draft
                    .active
                    .or(existing.map(|u| u.active))
                    .unwrap_or(true);

                if let Some(current) = existing {
                    let stays_admin = active && role == Role::Admin;
                    if current.is_active_admin() && !stays_admin && active_admins(all) <= 1 {
                        return Err(last_admin_conflict());
                    }
                }

                Ok(User {
                    id: id.clone(),
                    name: draft.name.clone(),
                    email: draft.email.clone(),
                    password,
                    role,
                    active,
                    salary: draft.salary,
                    position: draft.position.clone(),
                    phone: draft.phone.clone(),
                    hire_date: draft.hire_date,
                    performance_history: existing
                        .map(|u| u.performance_history.clone())
                        .unwrap_or_default(),
                    created_at: existing.map(|u| u.created_at).unwrap_or(now),
                    updated_at: now,
                })
            })
            .await?;

        tracing::info!(user_id = %user.id, ?outcome, "User saved");
        Ok((user, outcome))
    }

    /// Soft-delete a user; the last active admin is protected.
    pub async fn deactivate_user(&self, id: &str) -> Result<User, AppError> {
        self.users
            .delete_checked(id, |user, all| {
                if user.is_active_admin() && active_admins(all) <= 1 {
                    return Err(last_admin_conflict());
                }
                Ok(())
            })
            .await
    }

    /// Append (or refresh) an entry in a user's performance history.
    pub async fn append_history(
        &self,
        user_id: &str,
        entry: PerformanceHistoryEntry,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        self.users
            .modify(user_id, |user| {
                user.record_history(entry.clone());
                user.updated_at = now;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Second step of a fan-out write. The primary record is already stored,
    /// so a failure here is logged and left for `/migrate` to rebuild.
    async fn append_history_lagging(&self, user_id: &str, entry: PerformanceHistoryEntry) {
        let reference_id = entry.reference_id.clone();
        if let Err(e) = self.append_history(user_id, entry).await {
            tracing::warn!(
                user_id,
                reference_id = %reference_id,
                "Performance history append failed: {}",
                e
            );
        }
    }

    /// Drop the history entry pointing at `reference_id`, logging failures
    /// like [`Self::append_history_lagging`].
    async fn detach_history_lagging(&self, user_id: &str, kind: HistoryKind, reference_id: &str) {
        let now = Utc::now();
        let result = self
            .users
            .modify(user_id, |user| {
                user.performance_history
                    .retain(|e| !(e.kind == kind && e.reference_id == reference_id));
                user.updated_at = now;
                Ok(())
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(user_id, reference_id, "Performance history detach failed: {}", e);
        }
    }

    /// Find a user by login email, active or not.
    pub async fn find_login(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.trim();
        Ok(self
            .users
            .all()
            .await?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    // ==================== PROMO OPERATIONS ====================

    pub async fn list_promos(&self, filter: &PromoFilter) -> Result<Vec<Promo>, AppError> {
        self.promos.list(|p| filter.matches(p)).await
    }

    /// Create or replace a promo; creation also lands in the owner's history.
    pub async fn save_promo(
        &self,
        id: Option<&str>,
        payload: &PromoPayload,
        actor: &Claims,
    ) -> Result<(Promo, Upsert), AppError> {
        let draft = validate_promo(payload)?;
        let id = non_empty_id(id)
            .or_else(|| non_empty_id(payload.id.as_deref()))
            .unwrap_or_else(new_id);
        let requested_owner = non_empty_id(payload.created_by.as_deref())
            .filter(|_| actor.is_admin())
            .unwrap_or_else(|| actor.id.clone());
        let now = Utc::now();

        let (promo, outcome) = self
            .promos
            .upsert_with(&id, |existing, _| {
                Ok(Promo {
                    id: id.clone(),
                    destination: draft.destination.clone(),
                    hotel: draft.hotel.clone(),
                    start_date: draft.start_date,
                    end_date: draft.end_date,
                    date_range: format_date_range(draft.start_date, draft.end_date),
                    nights: draft.nights,
                    value: draft.value.clone(),
                    installments: draft.installments,
                    meal_plan: draft.meal_plan.clone(),
                    departures: draft.departures.clone(),
                    image_url: draft.image_url.clone(),
                    created_by: existing
                        .and_then(|p| p.created_by.clone())
                        .or_else(|| Some(requested_owner.clone())),
                    created_at: existing.map(|p| p.created_at).unwrap_or(now),
                    updated_at: now,
                })
            })
            .await?;

        tracing::info!(promo_id = %promo.id, ?outcome, "Promo saved");

        if outcome == Upsert::Created {
            if let Some(owner) = promo.created_by.as_deref() {
                self.append_history_lagging(owner, promo_history(&promo))
                    .await;
            }
        }

        Ok((promo, outcome))
    }

    // ==================== REVIEW OPERATIONS ====================

    /// Create or replace a review and keep the reviewed user's history entry
    /// current. Moving a review to another user moves its entry too.
    pub async fn save_review(
        &self,
        id: Option<&str>,
        payload: &ReviewPayload,
        reviewer: &Claims,
    ) -> Result<(PerformanceReview, Upsert), AppError> {
        let draft = validate_review(payload)?;
        if self.users.find(&draft.user_id).await?.is_none() {
            return Err(AppError::validation(vec![format!(
                "userId: funcionário {} não existe",
                draft.user_id
            )]));
        }

        let id = non_empty_id(id)
            .or_else(|| non_empty_id(payload.id.as_deref()))
            .unwrap_or_else(new_id);
        let now = Utc::now();
        let mut previous_user = None;

        let (review, outcome) = self
            .reviews
            .upsert_with(&id, |existing, _| {
                previous_user = existing.map(|r| r.user_id.clone());
                Ok(PerformanceReview {
                    id: id.clone(),
                    user_id: draft.user_id.clone(),
                    period: draft.period.clone(),
                    metrics: draft.metrics.clone(),
                    rating: draft.rating,
                    comments: draft.comments.clone(),
                    reviewer_id: existing
                        .map(|r| r.reviewer_id.clone())
                        .unwrap_or_else(|| reviewer.id.clone()),
                    created_at: existing.map(|r| r.created_at).unwrap_or(now),
                    updated_at: now,
                })
            })
            .await?;

        tracing::info!(review_id = %review.id, ?outcome, "Review saved");

        if let Some(previous) = previous_user.filter(|p| *p != review.user_id) {
            self.detach_history_lagging(&previous, HistoryKind::Review, &review.id)
                .await;
        }
        self.append_history_lagging(&review.user_id, review_history(&review))
            .await;

        Ok((review, outcome))
    }

    // ==================== INBOX OPERATIONS ====================

    pub async fn list_messages(&self, query: &InboxQuery) -> Result<Vec<SocialMessage>, AppError> {
        self.messages.list(|m| query.matches(m)).await
    }

    /// Apply one triage action. Returns the message and whether it is new.
    pub async fn apply_inbox_action(
        &self,
        action: InboxAction,
        actor: &Claims,
    ) -> Result<(SocialMessage, Upsert), AppError> {
        let now = Utc::now();

        match action {
            InboxAction::Receive { sender, content } => {
                let mut violations = Vec::new();
                if sender.username.trim().is_empty() {
                    violations.push("sender.username: remetente é obrigatório".to_string());
                }
                if content.trim().is_empty() {
                    violations.push("content: mensagem vazia".to_string());
                }
                if !violations.is_empty() {
                    return Err(AppError::validation(violations));
                }

                let id = new_id();
                let message = SocialMessage {
                    id: id.clone(),
                    channel: INSTAGRAM_CHANNEL.to_string(),
                    sender,
                    content: content.trim().to_string(),
                    read: false,
                    assigned_to: None,
                    replies: Vec::new(),
                    created_at: now,
                    updated_at: now,
                };
                self.messages
                    .upsert_with(&id, |_, _| Ok(message.clone()))
                    .await
            }
            InboxAction::MarkRead { id, read } => {
                let message = self
                    .messages
                    .modify(&id, |m| {
                        m.read = read;
                        m.updated_at = now;
                        Ok(())
                    })
                    .await?;
                Ok((message, Upsert::Updated))
            }
            InboxAction::Assign { id, assigned_to } => {
                let assigned_to = non_empty_id(assigned_to.as_deref());
                if let Some(user_id) = &assigned_to {
                    match self.users.find(user_id).await? {
                        Some(user) if user.active => {}
                        _ => {
                            return Err(AppError::validation(vec![format!(
                                "assignedTo: usuário {} não existe ou está inativo",
                                user_id
                            )]))
                        }
                    }
                }
                let message = self
                    .messages
                    .modify(&id, |m| {
                        m.assigned_to = assigned_to.clone();
                        m.updated_at = now;
                        Ok(())
                    })
                    .await?;
                Ok((message, Upsert::Updated))
            }
            InboxAction::Reply { id, content } => {
                let content = content.trim().to_string();
                if content.is_empty() {
                    return Err(AppError::validation(vec![
                        "content: resposta vazia".to_string()
                    ]));
                }
                let reply = Reply {
                    id: new_id(),
                    author_id: actor.id.clone(),
                    author_name: actor.name.clone(),
                    content,
                    created_at: now,
                };
                let message = self
                    .messages
                    .modify(&id, |m| {
                        m.replies.push(reply.clone());
                        m.read = true;
                        m.updated_at = now;
                        Ok(())
                    })
                    .await?;
                Ok((message, Upsert::Updated))
            }
        }
    }

    // ==================== SESSION OPERATIONS ====================

    /// Record a login; only the newest [`MAX_SESSION_RECORDS`] are kept.
    pub async fn record_session(&self, session: UserSession) -> Result<(), AppError> {
        self.sessions
            .mutate(|sessions| {
                sessions.push(session.clone());
                if sessions.len() > MAX_SESSION_RECORDS {
                    let excess = sessions.len() - MAX_SESSION_RECORDS;
                    sessions.drain(..excess);
                }
                Ok(())
            })
            .await
    }
}

pub(crate) fn promo_history(promo: &Promo) -> PerformanceHistoryEntry {
    PerformanceHistoryEntry {
        id: new_id(),
        kind: HistoryKind::Promo,
        reference_id: promo.id.clone(),
        summary: format!("Promoção {} - {}", promo.destination, promo.hotel),
        rating: None,
        period: None,
        created_at: promo.created_at,
    }
}

pub(crate) fn review_history(review: &PerformanceReview) -> PerformanceHistoryEntry {
    PerformanceHistoryEntry {
        id: new_id(),
        kind: HistoryKind::Review,
        reference_id: review.id.clone(),
        summary: format!("Avaliação {}: nota {:.1}", review.period, review.rating),
        rating: Some(review.rating),
        period: Some(review.period.clone()),
        created_at: review.created_at,
    }
}

/// Audit entry for a login that issued `claims`.
pub fn session_record(
    claims: &Claims,
    now: DateTime<Utc>,
    user_agent: Option<String>,
) -> UserSession {
    UserSession {
        id: new_id(),
        user_id: claims.id.clone(),
        email: claims.email.clone(),
        role: claims.role,
        created_at: now,
        expires_at: claims.expires_at(),
        user_agent,
    }
}
