//! SQL schema for the Keeper SQLite store.
//!
//! Executed once at connection startup.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,    -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id  TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(user_id),
    name        TEXT NOT NULL,
    email       TEXT,
    phone       TEXT,
    kind        TEXT,             -- serialised as `type`
    created_at  TEXT NOT NULL     -- fixed-width RFC 3339 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS contacts_owner_created_idx
    ON contacts(owner_id, created_at);
";
