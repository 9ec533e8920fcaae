//! SQL schema for the petdir SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    email        TEXT NOT NULL UNIQUE,
    display_name TEXT,
    role         TEXT NOT NULL DEFAULT 'user',   -- 'user' | 'business' | 'admin'
    token_hash   TEXT NOT NULL UNIQUE,           -- hex SHA-256 of the API token
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS businesses (
    business_id   TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(user_id),
    name          TEXT NOT NULL,
    contact_email TEXT NOT NULL,
    contact_phone TEXT,
    plan          TEXT NOT NULL DEFAULT 'free',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Directory listings. Owner and business are set when a claim is approved.
CREATE TABLE IF NOT EXISTS places (
    place_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    website     TEXT,
    owner_id    TEXT REFERENCES users(user_id),
    business_id TEXT REFERENCES businesses(business_id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Claims are never deleted; terminal claims keep their history.
CREATE TABLE IF NOT EXISTS claims (
    claim_id           TEXT PRIMARY KEY,
    place_id           TEXT NOT NULL REFERENCES places(place_id),
    user_id            TEXT NOT NULL REFERENCES users(user_id),
    status             TEXT NOT NULL DEFAULT 'pending',
    method             TEXT NOT NULL,
    verification_email TEXT,
    verification_phone TEXT,
    verification_code  TEXT,
    code_issued_at     TEXT,
    code_expires_at    TEXT,
    attempts           INTEGER NOT NULL DEFAULT 0,
    verified_at        TEXT,
    reviewed_at        TEXT,
    admin_notes        TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    CHECK (attempts BETWEEN 0 AND 5)
);

CREATE INDEX IF NOT EXISTS claims_user_idx     ON claims(user_id);
CREATE INDEX IF NOT EXISTS claims_place_idx    ON claims(place_id);
CREATE INDEX IF NOT EXISTS claims_status_idx   ON claims(status);
CREATE INDEX IF NOT EXISTS businesses_owner_idx ON businesses(owner_id);

PRAGMA user_version = 1;
";
