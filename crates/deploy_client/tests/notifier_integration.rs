//! Notifier sinks.

use std::sync::Arc;

use deploy_client::{
    ChannelNotifier, LogNotifier, NotificationEvent, Notifier, NotifyError, Severity,
};

fn event(severity: Severity, message: &str) -> NotificationEvent {
    NotificationEvent {
        severity,
        message: message.into(),
    }
}

#[test]
fn channel_notifier_delivers_in_order() {
    let (notifier, mut rx) = ChannelNotifier::channel();
    notifier.notify(&event(Severity::Error, "ERROR: a")).unwrap();
    notifier.notify(&event(Severity::Success, "SUCCESS: b")).unwrap();

    assert_eq!(rx.try_recv().unwrap(), event(Severity::Error, "ERROR: a"));
    assert_eq!(rx.try_recv().unwrap(), event(Severity::Success, "SUCCESS: b"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn channel_notifier_reports_closed_receiver() {
    let (notifier, rx) = ChannelNotifier::channel();
    drop(rx);
    let err = notifier
        .notify(&event(Severity::Success, "SUCCESS: late"))
        .unwrap_err();
    assert!(matches!(err, NotifyError::Closed));
}

#[test]
fn log_notifier_never_fails() {
    let notifier = Arc::new(LogNotifier);
    assert!(notifier.notify(&event(Severity::Error, "ERROR: x")).is_ok());
    assert!((&*notifier)
        .notify(&event(Severity::Success, "SUCCESS: y"))
        .is_ok());
}
