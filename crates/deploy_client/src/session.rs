//! Session client: one connection, one request frame, a stream of classified
//! units until the connection closes.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::classifier::{classify, Severity};
use crate::error::ClientError;
use crate::messages::{endpoint_url, DeployRequest, Flow};
use crate::notifier::Notifier;
use crate::transcript::Transcript;

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Closed,
}

/// Signals delivered by the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Established,
    Unit(String),
    Closed,
}

/// What happened during a session, returned once it is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Whether the connection was ever established.
    pub connected: bool,
    pub frames_sent: usize,
    pub units_received: usize,
    pub errors: usize,
    pub successes: usize,
    pub last_notification: Option<Severity>,
}

/// Drives one deploy or redeploy submission. Not reusable: a resubmission
/// builds a new session with a new transcript.
pub struct Session<N> {
    request: DeployRequest,
    state: SessionState,
    transcript: Transcript,
    notifier: N,
    report: SessionReport,
}

impl<N: Notifier> Session<N> {
    /// New idle session with a fresh transcript for the request's flow.
    pub fn new(request: DeployRequest, notifier: N) -> Self {
        let transcript = Transcript::for_flow(request.flow());
        Self::with_transcript(request, transcript, notifier)
    }

    /// New idle session appending to `transcript`, which should be fresh.
    pub fn with_transcript(request: DeployRequest, transcript: Transcript, notifier: N) -> Self {
        Self {
            request,
            state: SessionState::Idle,
            transcript,
            notifier,
            report: SessionReport::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn flow(&self) -> Flow {
        self.request.flow()
    }

    /// Handle to the transcript for rendering.
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Idle → Connecting. Returns the flow whose endpoint should be opened.
    pub fn begin(&mut self) -> Option<Flow> {
        if self.state != SessionState::Idle {
            return None;
        }
        self.state = SessionState::Connecting;
        tracing::debug!(flow = %self.flow(), "session connecting");
        Some(self.flow())
    }

    /// Connecting → Streaming. Returns the one request frame to send; `None`
    /// in any other state, so the frame goes out at most once. Call
    /// `on_frame_sent` once the transport has accepted it.
    pub fn on_established(&mut self) -> Option<String> {
        if self.state != SessionState::Connecting {
            return None;
        }
        match self.request.to_frame() {
            Ok(frame) => {
                self.state = SessionState::Streaming;
                self.report.connected = true;
                tracing::debug!(flow = %self.flow(), "session streaming");
                Some(frame)
            }
            Err(e) => {
                tracing::warn!("failed to serialize request: {e}");
                self.on_closed();
                None
            }
        }
    }

    /// Record that the request frame went out. Counted once.
    pub fn on_frame_sent(&mut self) {
        if self.state == SessionState::Streaming && self.report.frames_sent == 0 {
            self.report.frames_sent = 1;
        }
    }

    /// Classify one inbound unit and route its entries and notification.
    /// Ignored unless streaming.
    pub fn on_unit(&mut self, raw: &str) {
        if self.state != SessionState::Streaming {
            tracing::trace!(state = ?self.state, "dropping unit outside of streaming");
            return;
        }
        self.report.units_received += 1;

        let classification = classify(raw);
        for entry in classification.entries {
            self.transcript.append(entry);
        }
        if let Some(event) = classification.notification {
            match event.severity {
                Severity::Error => self.report.errors += 1,
                Severity::Success => self.report.successes += 1,
            }
            self.report.last_notification = Some(event.severity);
            if let Err(e) = self.notifier.notify(&event) {
                tracing::debug!("notification not shown: {e}");
            }
        }
    }

    /// Any state → Closed. Idempotent.
    pub fn on_closed(&mut self) {
        if self.state != SessionState::Closed {
            tracing::debug!(
                flow = %self.flow(),
                units = self.report.units_received,
                "session closed"
            );
        }
        self.state = SessionState::Closed;
    }

    /// Dispatch one connection signal. Returns an outbound frame when the
    /// signal calls for one.
    pub fn handle(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::Established => self.on_established(),
            SessionEvent::Unit(raw) => {
                self.on_unit(&raw);
                None
            }
            SessionEvent::Closed => {
                self.on_closed();
                None
            }
        }
    }

    /// Run the session against `base_url` until the server closes, the
    /// connection fails, or `cancel` fires (sent or dropped).
    pub async fn run(mut self, base_url: &str, mut cancel: oneshot::Receiver<()>) -> SessionReport {
        let Some(flow) = self.begin() else {
            return self.finish();
        };
        let url = endpoint_url(base_url, flow);

        let ws_stream = tokio::select! {
            _ = &mut cancel => {
                tracing::debug!("session cancelled while connecting");
                return self.finish();
            }
            result = tokio_tungstenite::connect_async(url.as_str()) => match result {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => {
                    tracing::warn!("failed to connect to {url}: {e}");
                    return self.finish();
                }
            },
        };
        let (mut write, mut read) = ws_stream.split();

        let Some(frame) = self.on_established() else {
            let _ = write.close().await;
            return self.finish();
        };
        if let Err(e) = write.send(Message::Text(frame)).await {
            tracing::warn!("failed to send request to {url}: {e}");
            return self.finish();
        }
        self.on_frame_sent();

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    tracing::debug!("session cancelled");
                    let _ = write.close().await;
                    break;
                }
                item = read.next() => match item {
                    Some(Ok(Message::Text(text))) => self.on_unit(&text),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => self.on_unit(&text),
                        Err(_) => tracing::debug!("skipping non UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!("connection error: {e}");
                        break;
                    }
                },
            }
        }

        self.finish()
    }

    fn finish(mut self) -> SessionReport {
        self.on_closed();
        self.report
    }
}

impl<N: Notifier + Send + 'static> Session<N> {
    /// Run the session on the tokio runtime.
    pub fn spawn(self, base_url: impl Into<String>) -> SessionHandle {
        let base_url = base_url.into();
        let transcript = self.transcript();
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(async move { self.run(&base_url, close_rx).await });
        SessionHandle {
            close_tx: Some(close_tx),
            task: Some(task),
            transcript,
        }
    }
}

/// Owner of a running session. Dropping it tears the connection down.
pub struct SessionHandle {
    close_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<SessionReport>>,
    transcript: Transcript,
}

impl SessionHandle {
    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    /// Request teardown. Units not yet processed are dropped.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the session to close.
    pub async fn join(mut self) -> Result<SessionReport, ClientError> {
        // Held until the task ends; dropping it early would cancel the session.
        let _close_tx = self.close_tx.take();
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(SessionReport::default()),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.close();
    }
}
