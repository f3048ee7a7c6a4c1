use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS aliases (
            name TEXT NOT NULL,
            ticker TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (name, ticker)
        );

        CREATE TABLE IF NOT EXISTS metrics (
            ticker TEXT NOT NULL,
            metric TEXT NOT NULL,
            fiscal_year INTEGER NOT NULL,
            fiscal_quarter INTEGER NOT NULL DEFAULT 0,
            value REAL NOT NULL,
            PRIMARY KEY (ticker, metric, fiscal_year, fiscal_quarter)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_aliases_created ON aliases(created_at);
        CREATE INDEX IF NOT EXISTS idx_metrics_ticker_year ON metrics(ticker, fiscal_year);
        CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at);
        "
    ).map_err(|e| format!("Migration failed: {e}"))
}
