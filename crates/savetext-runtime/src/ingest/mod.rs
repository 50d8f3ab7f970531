mod batch;
mod coordinator;

pub use batch::{BatchProgress, BatchReport, BatchRunner, CancelToken, FailedFile};
pub use coordinator::{EventOutcome, IngestCoordinator, IngestReport, IngestState, SkipReason};
