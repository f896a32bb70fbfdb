//! SQLite schema for the inventura store.
//!
//! - `users` / `sessions` back registration, login, and bearer tokens
//! - `items` is the per-cadence catalog; `rowid` order is catalog order
//! - `inventories` holds saved snapshots, rows embedded as a JSON copy
//! - `pending_confirmations` backs the two-phase destructive-action gate
//!
//! Timestamps are UTC microseconds (`*_us`); calendar dates are ISO text.

/// Migration v1: accounts, catalog, and snapshots.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_salt TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
    created_at_us INTEGER NOT NULL,
    last_login_us INTEGER,
    CHECK (user_id LIKE 'usr-%'),
    CHECK (length(username) BETWEEN 3 AND 30)
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL,
    expires_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id TEXT PRIMARY KEY,
    cadence TEXT NOT NULL CHECK (cadence IN ('daily', 'weekly', 'monthly')),
    item_number TEXT NOT NULL CHECK (length(trim(item_number)) > 0),
    description TEXT NOT NULL,
    unit_label_1 TEXT NOT NULL,
    unit_label_2 TEXT NOT NULL,
    unit_label_3 TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'pre_activation', 'inactive')),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    UNIQUE (cadence, item_number),
    CHECK (item_id LIKE 'itm-%')
);

CREATE TABLE IF NOT EXISTS inventories (
    inventory_id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    inventory_date TEXT NOT NULL,
    cadence TEXT CHECK (cadence IS NULL OR cadence IN ('daily', 'weekly', 'monthly')),
    items_json TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'completed', 'archived')),
    completed_at_us INTEGER,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (inventory_id LIKE 'inv-%')
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_items_cadence ON items(cadence);
CREATE INDEX IF NOT EXISTS idx_inventories_owner_date
    ON inventories(owner_id, inventory_date DESC);
";

/// Migration v2: pending confirmations for destructive bulk operations.
pub const MIGRATION_V2_SQL: &str = r"
CREATE TABLE IF NOT EXISTS pending_confirmations (
    token TEXT PRIMARY KEY,
    action TEXT NOT NULL CHECK (action IN ('delete_all_items', 'reset_values')),
    cadence TEXT NOT NULL CHECK (cadence IN ('daily', 'weekly', 'monthly')),
    step INTEGER NOT NULL CHECK (step >= 1),
    steps INTEGER NOT NULL CHECK (steps >= step),
    created_at_us INTEGER NOT NULL,
    expires_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pending_confirmations_expiry
    ON pending_confirmations(expires_at_us);
";

pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_sessions_user",
    "idx_items_cadence",
    "idx_inventories_owner_date",
    "idx_pending_confirmations_expiry",
];
