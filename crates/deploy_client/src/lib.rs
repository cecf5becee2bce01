//! Client for remote deploy and redeploy sessions: sends one request frame
//! over a WebSocket and turns the streamed server output into a typed
//! transcript plus success/error notifications.

pub mod classifier;
pub mod config;
pub mod error;
pub mod logs;
pub mod messages;
pub mod notifier;
pub mod session;
pub mod transcript;

pub use classifier::{
    classify, normalize, Classification, EntryKind, NotificationEvent, Severity, TranscriptEntry,
};
pub use config::{default_config_path, Config, ConfigError, LogSection, ServerSection};
pub use error::ClientError;
pub use messages::{endpoint_url, DeployPayload, DeployRequest, Flow};
pub use notifier::{ChannelNotifier, ConsoleNotifier, LogNotifier, Notifier, NotifyError};
pub use session::{Session, SessionEvent, SessionHandle, SessionReport, SessionState};
pub use transcript::Transcript;
