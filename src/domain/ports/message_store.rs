use crate::domain::entities::message::Message;
use crate::domain::error::DomainError;

pub trait MessageStore: Send + Sync {
    fn append(&self, message: &Message) -> Result<(), DomainError>;
    /// Most recent messages, oldest first.
    fn recent(&self, limit: usize) -> Result<Vec<Message>, DomainError>;
}
