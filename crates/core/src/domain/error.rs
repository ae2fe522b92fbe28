// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Entry {entry_id} belongs to {owner}, not {participant}")]
    ForeignEntry {
        entry_id: String,
        owner: String,
        participant: String,
    },

    #[error("Entry already tracked: {0}")]
    DuplicateEntry(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
