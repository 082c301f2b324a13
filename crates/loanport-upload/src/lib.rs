//! Upload orchestration for loan application documents.
//!
//! [`UploadOrchestrator`] validates user-selected files, uploads them one at a
//! time through a [`DocumentUploader`], tracks each file as an
//! [`UploadItem`](loanport_core::UploadItem) and recomputes the requirement
//! gate whenever an upload reaches a terminal state.

pub mod events;
pub mod notify;
pub mod orchestrator;
pub mod traits;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use events::UploadEvent;
pub use notify::{CollectingNotifier, Notification, NotificationLevel, TracingNotifier};
pub use orchestrator::{BatchReport, UploadOrchestrator};
pub use traits::{DocumentUploader, Notifier, ProgressFn};
