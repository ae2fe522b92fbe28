// Application Layer - Use Cases and Business Logic

pub mod admission;
pub mod maintenance;
pub mod queue;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod settings;
pub mod shutdown;

// Re-exports
pub use admission::{evaluate, Admission, AdmissionController, AggregatePlaytime};
pub use maintenance::{CompactionReport, CompactionScheduler};
pub use queue::{
    ParticipantStats, QueuePorts, QueueService, QueueSummary, RestoreReport, SubmissionRequest,
};
pub use registry::ParticipantRegistry;
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::{insertion_index, FairScheduler, Turn};
pub use settings::Settings;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
