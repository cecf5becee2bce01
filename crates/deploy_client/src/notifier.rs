//! Notification sinks for server-signaled success and failure.

use std::io::{IsTerminal, Write};

use colored::Colorize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::classifier::{NotificationEvent, Severity};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification receiver closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Presents notifications outside the transcript. One call per event; a
/// failure is the sink's problem and never ends the session.
pub trait Notifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        (**self).notify(event)
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        (**self).notify(event)
    }
}

/// Emits notifications as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        match event.severity {
            Severity::Error => tracing::error!(detail = %event.message, "deployment error"),
            Severity::Success => tracing::info!(detail = %event.message, "deployment success"),
        }
        Ok(())
    }
}

/// Forwards notifications to a channel, e.g. for a UI task to display.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::UnboundedSender<NotificationEvent>) -> Self {
        Self { sender }
    }

    /// Notifier plus the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.sender
            .send(event.clone())
            .map_err(|_| NotifyError::Closed)
    }
}

/// Writes one tagged line per notification to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    color: bool,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleNotifier {
    /// Colour is used only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            color: std::io::stderr().is_terminal(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let tag = match (event.severity, self.color) {
            (Severity::Error, true) => "error:".red().bold().to_string(),
            (Severity::Success, true) => "success:".green().bold().to_string(),
            (Severity::Error, false) => "error:".to_string(),
            (Severity::Success, false) => "success:".to_string(),
        };
        let mut err = std::io::stderr().lock();
        writeln!(err, "{} {}", tag, event.message)?;
        Ok(())
    }
}
