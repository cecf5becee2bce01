//! Inbound unit classification: prefix-tagged control text, `{"command": ...}`
//! records, and free-form log output.

use crate::messages::CommandRecord;

const ERROR_PREFIX: &str = "ERROR:";
const SUCCESS_PREFIX: &str = "SUCCESS:";
const CMD_PREFIX: &str = "CMD:";

/// Kind of a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An instruction run remotely and echoed back.
    Command,
    /// Console or log text.
    Output,
}

/// One immutable line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub text: String,
    pub kind: EntryKind,
}

impl TranscriptEntry {
    pub fn command(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: EntryKind::Command,
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: EntryKind::Output,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

/// Transient user-facing signal; never stored in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub severity: Severity,
    pub message: String,
}

/// Everything one inbound unit produces, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub notification: Option<NotificationEvent>,
    pub entries: Vec<TranscriptEntry>,
}

/// Replace single quotes with double quotes so dict-repr text decodes as JSON.
pub fn normalize(raw: &str) -> String {
    raw.replace('\'', "\"")
}

/// Classify one raw inbound unit. Total: malformed input falls back to a
/// single Output entry holding the raw text.
///
/// The prefix rules and the record decode both run on every unit, so a
/// `CMD:` line yields a Command entry with the normalized text followed by
/// an Output entry with the raw text.
pub fn classify(raw: &str) -> Classification {
    let normalized = normalize(raw);
    let mut classification = Classification::default();

    if normalized.starts_with(ERROR_PREFIX) {
        classification.notification = Some(NotificationEvent {
            severity: Severity::Error,
            message: normalized.clone(),
        });
    } else if normalized.starts_with(SUCCESS_PREFIX) {
        classification.notification = Some(NotificationEvent {
            severity: Severity::Success,
            message: normalized.clone(),
        });
    } else if normalized.starts_with(CMD_PREFIX) {
        classification
            .entries
            .push(TranscriptEntry::command(normalized.clone()));
    }

    let entry = match serde_json::from_str::<CommandRecord>(&normalized) {
        Ok(record) => TranscriptEntry::command(record.command),
        Err(_) => TranscriptEntry::output(raw),
    };
    classification.entries.push(entry);

    classification
}
