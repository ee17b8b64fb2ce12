//! SQL DDL for the `denuncia` table, one flavor per backend.
//!
//! Column shapes follow the table the SQLite → Postgres migration tool
//! reads and writes: `id`, `numero`, `nombre` (nullable), `lugar`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// Detect the backend from a connection URL scheme. `None` means no
    /// driver is available for it.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':')?.0.to_ascii_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Backend::Sqlite),
            "postgres" | "postgresql" => Some(Backend::Postgres),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
        }
    }

    /// Statements run in order by `init_schema`, one query each.
    pub fn init_statements(self) -> &'static [&'static str] {
        match self {
            Backend::Sqlite => SQLITE_INIT,
            Backend::Postgres => POSTGRES_INIT,
        }
    }
}

pub const SQLITE_INIT: &[&str] = &[r#"
CREATE TABLE IF NOT EXISTS denuncia (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    numero INTEGER NOT NULL,
    nombre VARCHAR(100) NULL,
    lugar VARCHAR(200) NOT NULL
)"#];

/// Postgres schema. A table created by the migration tool with a plain
/// integer `id` gets a sequence attached as its default, then the sequence
/// is moved past any rows copied in with explicit ids.
pub const POSTGRES_INIT: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS denuncia (
    id SERIAL PRIMARY KEY,
    numero INTEGER NOT NULL,
    nombre VARCHAR(100),
    lugar VARCHAR(200) NOT NULL
)"#,
    r#"
DO $$
BEGIN
    IF pg_get_serial_sequence('denuncia', 'id') IS NULL THEN
        CREATE SEQUENCE IF NOT EXISTS denuncia_id_seq OWNED BY denuncia.id;
        ALTER TABLE denuncia ALTER COLUMN id SET DEFAULT nextval('denuncia_id_seq');
    END IF;
END
$$"#,
    r#"
SELECT setval(s.seq::regclass, (SELECT COALESCE(MAX(id), 0) + 1 FROM denuncia), false)
FROM (SELECT pg_get_serial_sequence('denuncia', 'id') AS seq) s
WHERE s.seq IS NOT NULL"#,
];
