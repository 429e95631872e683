//! SQLite storage implementation.
//!
//! This module provides `SqliteStore`, the single access path to durable
//! state. The deduct / refund / grant protocols each run as one SQLite
//! transaction; the admission check and the balance decrement are a single
//! conditional `UPDATE` so two concurrent submissions from the same user
//! cannot both pass with only one credit in the bank.

use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use stylelayer_core::{
    ActionType, BillingCycle, CreditLogEntry, GenerationId, GenerationStatus, GenerationTask,
    IdentityId, Plan, SessionUser, Subscription, SubscriptionStatus, User,
    ONBOARDING_BONUS_CREDITS,
};

use crate::error::{Result, StoreError};
use crate::schema;

/// SQLite-backed storage.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Parameters for admitting a new generation task.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    /// The submitting user.
    pub identity_id: IdentityId,
    /// Extraction type selected by the user.
    pub kind: String,
    /// Public URL of the uploaded source image.
    pub original_url: String,
    /// The full prompt that will be sent to the generation API.
    pub prompt_used: String,
    /// Credits to charge for this task.
    pub cost: i64,
}

/// Outcome of an activation attempt for a subscription.
///
/// Both the user-facing return redirect and the asynchronous webhook call
/// this; only the first caller observes `Activated` and grants credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The pending record transitioned to ACTIVE and credits were granted.
    Activated {
        /// The plan now in effect for the user.
        plan: Plan,
        /// Credits granted for the first billing period.
        credits_granted: i64,
    },
    /// The record was already past PENDING; nothing changed.
    AlreadyProcessed,
    /// No record exists for that external subscription id.
    NotFound,
}

impl SqliteStore {
    /// Connect to a SQLite database, creating the file if missing, and
    /// apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be applied.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.apply_schema().await?;
        Ok(store)
    }

    /// Open a fresh in-memory database (used by tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub async fn in_memory() -> Result<Self> {
        // A pooled in-memory database must stay on one connection or each
        // checkout would see a different empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<()> {
        for stmt in schema::STATEMENTS {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Fetch a user, provisioning them with the onboarding bonus on first
    /// sight. Idempotent: the bonus is granted at most once per identity,
    /// even under concurrent first sign-ins.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_or_create_user(&self, identity_id: &IdentityId, email: &str) -> Result<User> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // The conflict clause makes the provisioning race-free: only the
        // insert that actually lands writes the onboarding ledger entry.
        let inserted = sqlx::query(
            "INSERT INTO users (identity_id, email, plan, credits_balance, created_at, updated_at)
             VALUES (?, ?, 'FREE', ?, ?, ?)
             ON CONFLICT (identity_id) DO NOTHING",
        )
        .bind(identity_id.as_str())
        .bind(email)
        .bind(ONBOARDING_BONUS_CREDITS)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 1 {
            sqlx::query(
                "INSERT INTO credit_logs (identity_id, amount, action_type, description, created_at)
                 VALUES (?, ?, 'ONBOARDING', 'New user signup bonus', ?)",
            )
            .bind(identity_id.as_str())
            .bind(ONBOARDING_BONUS_CREDITS)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            tracing::info!(identity_id = %identity_id, "Provisioned new user with onboarding bonus");
        }

        tx.commit().await?;

        self.get_user(identity_id)
            .await?
            .ok_or_else(|| StoreError::not_found("user", identity_id.as_str()))
    }

    /// Fetch a user without provisioning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_user(&self, identity_id: &IdentityId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT identity_id, email, plan, credits_balance, created_at, updated_at
             FROM users WHERE identity_id = ?",
        )
        .bind(identity_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Current credit balance; 0 for unprovisioned identities.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_balance(&self, identity_id: &IdentityId) -> Result<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT credits_balance FROM users WHERE identity_id = ?")
                .bind(identity_id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Persist a session row. The display fields are snapshotted from the
    /// sign-in, not re-read from `users` later.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_session(
        &self,
        session_id: &str,
        user: &SessionUser,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, identity_id, email, name, picture, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(user.identity_id.as_str())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.picture.as_deref())
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolve a session token to its user, or `None` when the token is
    /// unknown or the session has expired. An expired session is a normal
    /// unauthenticated outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionUser>> {
        let row = sqlx::query(
            "SELECT identity_id, email, name, picture, expires_at FROM sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        if expires_at <= Utc::now() {
            return Ok(None);
        }

        let identity: String = row.try_get("identity_id")?;
        Ok(Some(SessionUser {
            identity_id: identity.parse().map_err(StoreError::Corrupt)?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            picture: row.try_get("picture")?,
        }))
    }

    /// Delete a session. Idempotent: deleting an unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop all sessions past their expiry. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let purged = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if purged > 0 {
            tracing::debug!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }

    // =========================================================================
    // Generation tasks + credit protocol
    // =========================================================================

    /// Admit a generation request: deduct the cost, create the PENDING task
    /// row and append the GENERATION ledger entry, all in one transaction.
    ///
    /// The balance check and the decrement are a single conditional update
    /// (`... WHERE credits_balance >= cost`), so concurrent submissions
    /// cannot double-spend the same credit.
    ///
    /// # Errors
    ///
    /// - `StoreError::InsufficientCredits` when the balance does not cover
    ///   the cost; no writes are performed.
    /// - `StoreError::NotFound` when the user is not provisioned.
    pub async fn reserve_generation(&self, new: &NewGeneration) -> Result<GenerationTask> {
        let id = GenerationId::generate();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let deducted = sqlx::query(
            "UPDATE users
             SET credits_balance = credits_balance - ?, updated_at = ?
             WHERE identity_id = ? AND credits_balance >= ?",
        )
        .bind(new.cost)
        .bind(now)
        .bind(new.identity_id.as_str())
        .bind(new.cost)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deducted == 0 {
            let balance: Option<i64> =
                sqlx::query_scalar("SELECT credits_balance FROM users WHERE identity_id = ?")
                    .bind(new.identity_id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;

            return match balance {
                Some(balance) => Err(StoreError::InsufficientCredits {
                    balance,
                    required: new.cost,
                }),
                None => Err(StoreError::not_found("user", new.identity_id.as_str())),
            };
        }

        sqlx::query(
            "INSERT INTO generations
                (id, identity_id, kind, original_url, status, prompt_used, credits_spent, created_at)
             VALUES (?, ?, ?, ?, 'PENDING', ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(new.identity_id.as_str())
        .bind(&new.kind)
        .bind(&new.original_url)
        .bind(&new.prompt_used)
        .bind(new.cost)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO credit_logs (identity_id, amount, action_type, description, created_at)
             VALUES (?, ?, 'GENERATION', ?, ?)",
        )
        .bind(new.identity_id.as_str())
        .bind(-new.cost)
        .bind(format!("Generation {id}"))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            generation_id = %id,
            identity_id = %new.identity_id,
            cost = new.cost,
            "Generation admitted, credits reserved"
        );

        Ok(GenerationTask {
            id,
            identity_id: new.identity_id.clone(),
            kind: new.kind.clone(),
            original_url: new.original_url.clone(),
            result_url: None,
            status: GenerationStatus::Pending,
            prompt_used: new.prompt_used.clone(),
            credits_spent: new.cost,
            created_at: now,
        })
    }

    /// Mark a task COMPLETED and record its result reference. Guarded on
    /// PENDING so a terminal task never changes again. Returns whether the
    /// transition happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn complete_generation(&self, id: &GenerationId, result_url: &str) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE generations SET result_url = ?, status = 'COMPLETED'
             WHERE id = ? AND status = 'PENDING'",
        )
        .bind(result_url)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    /// Mark a task FAILED and refund its cost: flip the status (only if
    /// still PENDING), append the REFUND ledger entry and restore the
    /// balance in one transaction. The PENDING guard means the refund runs
    /// at most once per task, however many times the failure path fires.
    ///
    /// Returns whether the refund was performed.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` when the task does not exist.
    pub async fn fail_and_refund_generation(&self, id: &GenerationId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT identity_id, credits_spent FROM generations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::not_found("generation", id.to_string()))?;

        let identity_id: String = row.try_get("identity_id")?;
        let cost: i64 = row.try_get("credits_spent")?;

        let flipped = sqlx::query(
            "UPDATE generations SET status = 'FAILED' WHERE id = ? AND status = 'PENDING'",
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flipped == 0 {
            // Already terminal; the refund (if due) happened on the first call.
            return Ok(false);
        }

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO credit_logs (identity_id, amount, action_type, description, created_at)
             VALUES (?, ?, 'REFUND', ?, ?)",
        )
        .bind(&identity_id)
        .bind(cost)
        .bind(format!("Refund for failed generation {id}"))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET credits_balance = credits_balance + ?, updated_at = ?
             WHERE identity_id = ?",
        )
        .bind(cost)
        .bind(now)
        .bind(&identity_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            generation_id = %id,
            identity_id = %identity_id,
            refunded = cost,
            "Generation failed, credits refunded"
        );

        Ok(true)
    }

    /// Fetch a task by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_generation(&self, id: &GenerationId) -> Result<Option<GenerationTask>> {
        let row = sqlx::query(
            "SELECT id, identity_id, kind, original_url, result_url, status, prompt_used,
                    credits_spent, created_at
             FROM generations WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(generation_from_row).transpose()
    }

    // =========================================================================
    // Credit ledger reads
    // =========================================================================

    /// Recent ledger entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_credit_log(
        &self,
        identity_id: &IdentityId,
        limit: i64,
    ) -> Result<Vec<CreditLogEntry>> {
        let rows = sqlx::query(
            "SELECT id, identity_id, amount, action_type, description, created_at
             FROM credit_logs WHERE identity_id = ?
             ORDER BY id DESC LIMIT ?",
        )
        .bind(identity_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(credit_log_from_row).collect()
    }

    /// Sum of all ledger entries for a user. Reconciliation invariant:
    /// this must equal the user's `credits_balance`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn ledger_total(&self, identity_id: &IdentityId) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM credit_logs WHERE identity_id = ?",
        )
        .bind(identity_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Record a PENDING subscription tied to the externally issued id,
    /// before the user has approved payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create_pending_subscription(
        &self,
        identity_id: &IdentityId,
        paypal_subscription_id: &str,
        plan: Plan,
        billing_cycle: BillingCycle,
        credits_per_month: i64,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO subscriptions
                (identity_id, paypal_subscription_id, plan, billing_cycle, status,
                 credits_per_month, created_at, updated_at)
             VALUES (?, ?, ?, ?, 'PENDING', ?, ?, ?)",
        )
        .bind(identity_id.as_str())
        .bind(paypal_subscription_id)
        .bind(plan.as_str())
        .bind(billing_cycle.as_str())
        .bind(credits_per_month)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a subscription by its external id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_subscription(
        &self,
        paypal_subscription_id: &str,
    ) -> Result<Option<Subscription>> {
        let row = sqlx::query(
            "SELECT id, identity_id, paypal_subscription_id, plan, billing_cycle, status,
                    credits_per_month, current_period_start, current_period_end,
                    created_at, updated_at
             FROM subscriptions WHERE paypal_subscription_id = ?",
        )
        .bind(paypal_subscription_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(subscription_from_row).transpose()
    }

    /// Activate a PENDING subscription: set the billing period, upgrade the
    /// user's plan and grant the first month of credits as a PURCHASE
    /// ledger entry, all in one transaction.
    ///
    /// The PENDING status guard makes this idempotent: the return redirect
    /// and the activation webhook can both call it for the same external id
    /// and the credits are granted exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn activate_subscription(
        &self,
        paypal_subscription_id: &str,
    ) -> Result<ActivationOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT identity_id, plan, billing_cycle, credits_per_month
             FROM subscriptions WHERE paypal_subscription_id = ?",
        )
        .bind(paypal_subscription_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(ActivationOutcome::NotFound);
        };

        let identity_id: String = row.try_get("identity_id")?;
        let plan: Plan = parse_col(&row, "plan")?;
        let cycle: BillingCycle = parse_col(&row, "billing_cycle")?;
        let credits: i64 = row.try_get("credits_per_month")?;

        let now = Utc::now();
        let period_end = next_period_end(now);

        let flipped = sqlx::query(
            "UPDATE subscriptions
             SET status = 'ACTIVE', current_period_start = ?, current_period_end = ?,
                 updated_at = ?
             WHERE paypal_subscription_id = ? AND status = 'PENDING'",
        )
        .bind(now)
        .bind(period_end)
        .bind(now)
        .bind(paypal_subscription_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flipped == 0 {
            return Ok(ActivationOutcome::AlreadyProcessed);
        }

        sqlx::query(
            "UPDATE users
             SET plan = ?, credits_balance = credits_balance + ?, updated_at = ?
             WHERE identity_id = ?",
        )
        .bind(plan.as_str())
        .bind(credits)
        .bind(now)
        .bind(&identity_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO credit_logs (identity_id, amount, action_type, description, created_at)
             VALUES (?, ?, 'PURCHASE', ?, ?)",
        )
        .bind(&identity_id)
        .bind(credits)
        .bind(format!(
            "{plan} {cycle} subscription activated ({credits} credits)"
        ))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            paypal_subscription_id,
            identity_id = %identity_id,
            plan = %plan,
            credits_granted = credits,
            "Subscription activated"
        );

        Ok(ActivationOutcome::Activated {
            plan,
            credits_granted: credits,
        })
    }

    /// Grant the monthly allotment for a successful recurring charge and
    /// advance the billing period. Only applies to ACTIVE subscriptions;
    /// returns the credits granted, or `None` when the subscription is
    /// unknown or not active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn record_recurring_payment(
        &self,
        paypal_subscription_id: &str,
    ) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT identity_id, plan, credits_per_month
             FROM subscriptions WHERE paypal_subscription_id = ? AND status = 'ACTIVE'",
        )
        .bind(paypal_subscription_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let identity_id: String = row.try_get("identity_id")?;
        let plan: Plan = parse_col(&row, "plan")?;
        let credits: i64 = row.try_get("credits_per_month")?;

        let now = Utc::now();

        sqlx::query(
            "UPDATE users SET credits_balance = credits_balance + ?, updated_at = ?
             WHERE identity_id = ?",
        )
        .bind(credits)
        .bind(now)
        .bind(&identity_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO credit_logs (identity_id, amount, action_type, description, created_at)
             VALUES (?, ?, 'PURCHASE', ?, ?)",
        )
        .bind(&identity_id)
        .bind(credits)
        .bind(format!("Recurring {plan} payment ({credits} credits)"))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE subscriptions
             SET current_period_start = ?, current_period_end = ?, updated_at = ?
             WHERE paypal_subscription_id = ?",
        )
        .bind(now)
        .bind(next_period_end(now))
        .bind(now)
        .bind(paypal_subscription_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            paypal_subscription_id,
            identity_id = %identity_id,
            credits_granted = credits,
            "Recurring payment credited"
        );

        Ok(Some(credits))
    }

    /// Move a subscription to a terminal state. Downgrades the owner to the
    /// free plan only when they hold no other ACTIVE subscription (a plan
    /// switch can leave a stale id that terminates later). Returns whether
    /// a row transitioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn terminate_subscription(
        &self,
        paypal_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<bool> {
        debug_assert!(status.is_terminal(), "termination requires a terminal status");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            "UPDATE subscriptions SET status = ?, updated_at = ?
             WHERE paypal_subscription_id = ? AND status IN ('PENDING', 'ACTIVE')",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(paypal_subscription_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flipped == 0 {
            return Ok(false);
        }

        let identity_id: String = sqlx::query_scalar(
            "SELECT identity_id FROM subscriptions WHERE paypal_subscription_id = ?",
        )
        .bind(paypal_subscription_id)
        .fetch_one(&mut *tx)
        .await?;

        let other_active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM subscriptions
             WHERE identity_id = ? AND status = 'ACTIVE' AND paypal_subscription_id != ?",
        )
        .bind(&identity_id)
        .bind(paypal_subscription_id)
        .fetch_one(&mut *tx)
        .await?;

        if other_active == 0 {
            sqlx::query(
                "UPDATE users SET plan = 'FREE', updated_at = ? WHERE identity_id = ?",
            )
            .bind(now)
            .bind(&identity_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            paypal_subscription_id,
            identity_id = %identity_id,
            status = %status,
            downgraded = other_active == 0,
            "Subscription terminated"
        );

        Ok(true)
    }
}

// =========================================================================
// Row mapping
// =========================================================================

fn parse_col<T: FromStr<Err = stylelayer_core::CoreError>>(
    row: &SqliteRow,
    col: &str,
) -> Result<T> {
    let raw: String = row.try_get(col)?;
    raw.parse().map_err(StoreError::Corrupt)
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let identity: String = row.try_get("identity_id")?;
    Ok(User {
        identity_id: identity.parse().map_err(StoreError::Corrupt)?,
        email: row.try_get("email")?,
        plan: parse_col(row, "plan")?,
        credits_balance: row.try_get("credits_balance")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn credit_log_from_row(row: &SqliteRow) -> Result<CreditLogEntry> {
    let identity: String = row.try_get("identity_id")?;
    let action: String = row.try_get("action_type")?;
    Ok(CreditLogEntry {
        id: row.try_get("id")?,
        identity_id: identity.parse().map_err(StoreError::Corrupt)?,
        amount: row.try_get("amount")?,
        action_type: action
            .parse::<ActionType>()
            .map_err(StoreError::Corrupt)?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn generation_from_row(row: &SqliteRow) -> Result<GenerationTask> {
    let id: String = row.try_get("id")?;
    let identity: String = row.try_get("identity_id")?;
    let status: String = row.try_get("status")?;
    Ok(GenerationTask {
        id: id.parse().map_err(StoreError::Corrupt)?,
        identity_id: identity.parse().map_err(StoreError::Corrupt)?,
        kind: row.try_get("kind")?,
        original_url: row.try_get("original_url")?,
        result_url: row.try_get("result_url")?,
        status: status
            .parse::<GenerationStatus>()
            .map_err(StoreError::Corrupt)?,
        prompt_used: row.try_get("prompt_used")?,
        credits_spent: row.try_get("credits_spent")?,
        created_at: row.try_get("created_at")?,
    })
}

fn subscription_from_row(row: &SqliteRow) -> Result<Subscription> {
    let identity: String = row.try_get("identity_id")?;
    Ok(Subscription {
        id: row.try_get("id")?,
        identity_id: identity.parse().map_err(StoreError::Corrupt)?,
        paypal_subscription_id: row.try_get("paypal_subscription_id")?,
        plan: parse_col(row, "plan")?,
        billing_cycle: parse_col(row, "billing_cycle")?,
        status: parse_col(row, "status")?,
        credits_per_month: row.try_get("credits_per_month")?,
        current_period_start: row.try_get("current_period_start")?,
        current_period_end: row.try_get("current_period_end")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// One billing month ahead; falls back to 30 days near calendar edges.
fn next_period_end(from: DateTime<Utc>) -> DateTime<Utc> {
    from.checked_add_months(Months::new(1))
        .unwrap_or(from + Duration::days(30))
}
