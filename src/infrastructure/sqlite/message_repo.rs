use crate::domain::entities::message::{Message, Role};
use crate::domain::error::DomainError;
use crate::domain::ports::message_store::MessageStore;
use chrono::{DateTime, SecondsFormat};
use rusqlite::{params, Connection};
use std::sync::Mutex;
use tracing::warn;

pub struct SqliteMessageRepo {
    conn: Mutex<Connection>,
}

impl SqliteMessageRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_message(row: &rusqlite::Row) -> Result<Message, rusqlite::Error> {
        let role_str: String = row.get(1)?;
        let created_str: String = row.get(3)?;
        Ok(Message {
            id: row.get(0)?,
            role: role_str.parse().unwrap_or_else(|_| {
                warn!(role = %role_str, "invalid role in message log, treating as user");
                Role::User
            }),
            content: row.get(2)?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}

impl MessageStore for SqliteMessageRepo {
    fn append(&self, message: &Message) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO messages (id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                message.id,
                message.role.to_string(),
                message.content,
                // fixed width so text order matches time order
                message.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )
        .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<Message>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, role, content, created_at FROM messages
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_message)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut messages = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        messages.reverse();
        Ok(messages)
    }
}
