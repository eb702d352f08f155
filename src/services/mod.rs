//! Single-unit capabilities used by the workflow and orchestration layers

pub mod notifier;
pub mod publisher;
pub mod staging;

pub use notifier::{LogNotifier, Notifier, SlackNotifier};
pub use publisher::{CommandPublisher, Publisher};
pub use staging::StagingArea;
