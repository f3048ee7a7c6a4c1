use crate::domain::error::DomainError;
use crate::domain::ports::alias_source::{AliasPair, AliasSource};
use crate::domain::values::ticker::canonical_ticker;
use csv::ReaderBuilder;
use rusqlite::{params, Connection};
use std::io::Cursor;
use std::sync::Mutex;

pub struct SqliteAliasRepo {
    conn: Mutex<Connection>,
}

impl SqliteAliasRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Stores one alias. Returns `false` when the pair already existed.
    pub fn add_alias(&self, name: &str, ticker: &str) -> Result<bool, DomainError> {
        let name = name.trim();
        let ticker = canonical_ticker(ticker);
        if name.is_empty() || ticker.is_empty() {
            return Err(DomainError::InvalidInput("Alias name and ticker are required".into()));
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO aliases (name, ticker, created_at) VALUES (?1, ?2, ?3)",
                params![name, ticker, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Inserts every pair in one transaction; returns how many were new.
    pub fn import(&self, pairs: &[AliasPair]) -> Result<usize, DomainError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare("INSERT OR IGNORE INTO aliases (name, ticker, created_at) VALUES (?1, ?2, ?3)")
                .map_err(|e| DomainError::Database(e.to_string()))?;
            for pair in pairs {
                let name = pair.name.trim();
                let ticker = canonical_ticker(&pair.ticker);
                if name.is_empty() || ticker.is_empty() {
                    continue;
                }
                inserted += stmt
                    .execute(params![name, ticker, now])
                    .map_err(|e| DomainError::Database(e.to_string()))?;
            }
        }
        tx.commit()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(inserted)
    }

    pub fn count(&self) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM aliases", [], |row| row.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(n as usize)
    }
}

impl AliasSource for SqliteAliasRepo {
    fn load_aliases(&self) -> Result<Vec<AliasPair>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT name, ticker FROM aliases ORDER BY created_at ASC, rowid ASC")
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(AliasPair::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(e.to_string()))
    }
}

/// Parses a company list with `Symbol`, `Company Name` and optional
/// `Alternate Names` (comma-separated) columns.
pub fn parse_alias_csv(content: &str) -> Result<Vec<AliasPair>, DomainError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(content));

    let headers = reader
        .headers()
        .map_err(|e| DomainError::Parse(format!("Failed to read headers: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let symbol_col = column("Symbol")
        .ok_or_else(|| DomainError::Parse("Missing 'Symbol' column".into()))?;
    let name_col = column("Company Name")
        .ok_or_else(|| DomainError::Parse("Missing 'Company Name' column".into()))?;
    let alt_col = column("Alternate Names");

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DomainError::Parse(format!("Failed to read record: {e}")))?;
        let Some(symbol) = record.get(symbol_col).filter(|s| !s.is_empty()) else {
            continue;
        };
        if let Some(name) = record.get(name_col).filter(|s| !s.is_empty()) {
            pairs.push(AliasPair::new(name, symbol));
        }
        if let Some(alternates) = alt_col.and_then(|c| record.get(c)) {
            for alt in alternates.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                pairs.push(AliasPair::new(alt, symbol));
            }
        }
    }
    Ok(pairs)
}
