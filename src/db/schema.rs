/// Schema for the offline delivery tables.
pub const SCHEMA: &str = r#"
-- Named whole-collection values (the offline request queue lives here)
CREATE TABLE IF NOT EXISTS kv_store (
    name TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Last successful read response per fully-qualified URL
CREATE TABLE IF NOT EXISTS response_cache (
    url_hash TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    payload BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
