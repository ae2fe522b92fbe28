// Domain Layer - Pure business logic and entities

pub mod config;
pub mod decision;
pub mod entry;
pub mod error;
pub mod history;
pub mod participant;

// Re-exports
pub use config::{QueueConfig, QueueConfigPatch, QueueRecord};
pub use decision::{Decision, RejectionReason};
pub use entry::{Entry, EntryId, ParticipantId, Playtime, QueueId};
pub use error::DomainError;
pub use history::EntryHistory;
pub use participant::{Participant, ParticipantLock, ParticipantQueue};
