//! Database schema definitions.
//!
//! Statements are idempotent (`IF NOT EXISTS`) and applied at startup.

/// All DDL statements, in creation order.
pub const STATEMENTS: &[&str] = &[
    // Users, keyed by the external OAuth subject.
    "CREATE TABLE IF NOT EXISTS users (
        identity_id     TEXT PRIMARY KEY,
        email           TEXT NOT NULL,
        plan            TEXT NOT NULL DEFAULT 'FREE',
        credits_balance INTEGER NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    )",
    // Server-side sessions; display fields are a snapshot, not a live join.
    "CREATE TABLE IF NOT EXISTS sessions (
        id          TEXT PRIMARY KEY,
        identity_id TEXT NOT NULL,
        email       TEXT NOT NULL,
        name        TEXT NOT NULL,
        picture     TEXT,
        expires_at  TEXT NOT NULL
    )",
    // Append-only credit ledger. Rows are never updated or deleted.
    "CREATE TABLE IF NOT EXISTS credit_logs (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        identity_id TEXT NOT NULL,
        amount      INTEGER NOT NULL,
        action_type TEXT NOT NULL,
        description TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_credit_logs_identity
        ON credit_logs (identity_id)",
    // Generation tasks; status is monotonic PENDING -> COMPLETED | FAILED.
    "CREATE TABLE IF NOT EXISTS generations (
        id            TEXT PRIMARY KEY,
        identity_id   TEXT NOT NULL,
        kind          TEXT NOT NULL,
        original_url  TEXT NOT NULL,
        result_url    TEXT,
        status        TEXT NOT NULL DEFAULT 'PENDING',
        prompt_used   TEXT NOT NULL,
        credits_spent INTEGER NOT NULL,
        created_at    TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_generations_identity
        ON generations (identity_id)",
    // Mirrored PayPal subscriptions, keyed by the external subscription id.
    "CREATE TABLE IF NOT EXISTS subscriptions (
        id                     INTEGER PRIMARY KEY AUTOINCREMENT,
        identity_id            TEXT NOT NULL,
        paypal_subscription_id TEXT NOT NULL UNIQUE,
        plan                   TEXT NOT NULL,
        billing_cycle          TEXT NOT NULL,
        status                 TEXT NOT NULL DEFAULT 'PENDING',
        credits_per_month      INTEGER NOT NULL,
        current_period_start   TEXT,
        current_period_end     TEXT,
        created_at             TEXT NOT NULL,
        updated_at             TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_identity
        ON subscriptions (identity_id)",
];
