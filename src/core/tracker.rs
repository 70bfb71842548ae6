//! Order tracking over the server-push event stream.
//!
//! A [`TrackingSession`] owns exactly one connection. A background task pumps
//! raw frames from the [`EventTransport`] into a channel; the session owner
//! applies them one at a time, so state only changes inside
//! [`TrackingSession::next_update`] or [`TrackingSession::drain_pending`].

use crate::domain::model::{
    CloseReason, EventFrame, LogEntry, LogKind, OrderEvent, SessionState, StatusUpdate,
};
use crate::domain::ports::EventTransport;
use crate::utils::error::{OrderError, Result};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const CONNECTION_CLOSED: &str = "Connection closed.";

enum StreamMessage {
    Connected,
    Frame(EventFrame),
    Failed(String),
    Ended,
}

/// What a single step of the session did, for the view layer to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerUpdate {
    Opened,
    /// `init` frame: the order's status at connect time.
    Snapshot(String),
    Event(OrderEvent),
    /// Status payload that failed to parse; recorded in [`TrackingSession::errors`].
    Malformed(String),
    /// Event name this client does not know about.
    Ignored(String),
    Closed(CloseReason),
}

pub struct TrackingSession {
    order_id: String,
    state: SessionState,
    current_status: Option<String>,
    log: VecDeque<LogEntry>,
    errors: Vec<OrderError>,
    rx: Option<mpsc::UnboundedReceiver<StreamMessage>>,
    pump: Option<JoinHandle<()>>,
}

impl TrackingSession {
    fn idle(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            state: SessionState::Idle,
            current_status: None,
            log: VecDeque::new(),
            errors: Vec::new(),
            rx: None,
            pump: None,
        }
    }

    /// Spawns the connection task and moves to `Connecting`. Must be called
    /// from within a tokio runtime.
    fn connect<T>(mut self, transport: Arc<T>) -> Self
    where
        T: EventTransport + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let order_id = self.order_id.clone();
        self.pump = Some(tokio::spawn(pump_frames(transport, order_id, tx)));
        self.rx = Some(rx);
        self.state = SessionState::Connecting;
        tracing::info!("Tracking order {}: connecting", self.order_id);
        self
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn current_status(&self) -> Option<&str> {
        self.current_status.as_deref()
    }

    /// Display log, most recent first.
    pub fn log(&self) -> &VecDeque<LogEntry> {
        &self.log
    }

    pub fn log_lines(&self) -> Vec<&str> {
        self.log.iter().map(|e| e.text.as_str()).collect()
    }

    /// Parse failures seen so far, kept apart from transport failures.
    pub fn errors(&self) -> &[OrderError] {
        &self.errors
    }

    /// Waits for the next stream message and applies it. Returns `None` once
    /// the session is closed.
    pub async fn next_update(&mut self) -> Option<TrackerUpdate> {
        let message = self.rx.as_mut()?.recv().await;
        Some(self.apply(message))
    }

    /// Applies every message that has already arrived without waiting.
    pub fn drain_pending(&mut self) -> Vec<TrackerUpdate> {
        let mut updates = Vec::new();
        while let Some(rx) = self.rx.as_mut() {
            match rx.try_recv() {
                Ok(message) => updates.push(self.apply(Some(message))),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    updates.push(self.apply(None));
                }
            }
        }
        updates
    }

    /// Runs the session until it closes and returns the close reason.
    pub async fn run_until_closed(&mut self) -> CloseReason {
        while self.next_update().await.is_some() {}
        match &self.state {
            SessionState::Closed(reason) => reason.clone(),
            // Only an idle session has no channel to drain.
            _ => CloseReason::ClientRequested,
        }
    }

    /// Closes the connection. A no-op once the session is closed.
    pub fn stop(&mut self) {
        self.close(CloseReason::ClientRequested);
    }

    fn close(&mut self, reason: CloseReason) {
        if self.state.is_closed() {
            return;
        }
        self.release();
        tracing::info!("Tracking order {} closed: {:?}", self.order_id, reason);
        self.state = SessionState::Closed(reason);
    }

    fn release(&mut self) {
        if let Some(handle) = self.pump.take() {
            handle.abort();
        }
        if let Some(mut rx) = self.rx.take() {
            rx.close();
        }
    }

    fn apply(&mut self, message: Option<StreamMessage>) -> TrackerUpdate {
        match message {
            Some(StreamMessage::Connected) => {
                self.mark_open();
                TrackerUpdate::Opened
            }
            Some(StreamMessage::Frame(frame)) => self.apply_frame(frame),
            Some(StreamMessage::Failed(message)) => {
                tracing::warn!("Event stream for {} failed: {}", self.order_id, message);
                self.close_with_entry(CloseReason::TransportError(message))
            }
            // A vanished sender means the pump stopped without saying why.
            Some(StreamMessage::Ended) | None => {
                self.close_with_entry(CloseReason::ServerClosed)
            }
        }
    }

    fn apply_frame(&mut self, frame: EventFrame) -> TrackerUpdate {
        match frame.event.as_str() {
            "status" => match serde_json::from_str::<StatusUpdate>(&frame.data) {
                Ok(update) => {
                    self.mark_open();
                    self.log.push_front(LogEntry {
                        kind: LogKind::Status,
                        text: update.display_line(),
                    });
                    self.current_status = Some(update.status.clone());
                    TrackerUpdate::Event(OrderEvent::Status(update))
                }
                Err(e) => {
                    tracing::warn!(
                        "Dropping malformed status event for {}: {}",
                        self.order_id,
                        e
                    );
                    self.errors.push(OrderError::ParseError {
                        event: "status".to_string(),
                        message: e.to_string(),
                    });
                    TrackerUpdate::Malformed(frame.data)
                }
            },
            "notification" => {
                self.mark_open();
                self.log.push_front(LogEntry {
                    kind: LogKind::Notification,
                    text: frame.data.clone(),
                });
                TrackerUpdate::Event(OrderEvent::Notification(frame.data))
            }
            "init" => {
                self.mark_open();
                let status = frame.data.trim().to_string();
                self.current_status = Some(status.clone());
                TrackerUpdate::Snapshot(status)
            }
            other => {
                tracing::debug!("Ignoring '{}' event for {}", other, self.order_id);
                TrackerUpdate::Ignored(other.to_string())
            }
        }
    }

    fn mark_open(&mut self) {
        if self.state == SessionState::Connecting {
            tracing::info!("Tracking order {}: open", self.order_id);
            self.state = SessionState::Open;
        }
    }

    fn close_with_entry(&mut self, reason: CloseReason) -> TrackerUpdate {
        self.log.push_back(LogEntry {
            kind: LogKind::Closed,
            text: CONNECTION_CLOSED.to_string(),
        });
        self.close(reason.clone());
        TrackerUpdate::Closed(reason)
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.release();
    }
}

async fn pump_frames<T>(
    transport: Arc<T>,
    order_id: String,
    tx: mpsc::UnboundedSender<StreamMessage>,
) where
    T: EventTransport + ?Sized,
{
    let mut stream = match transport.open_event_stream(&order_id).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = tx.send(StreamMessage::Failed(e.to_string()));
            return;
        }
    };
    if tx.send(StreamMessage::Connected).is_err() {
        return;
    }

    while let Some(item) = stream.next().await {
        let message = match item {
            Ok(frame) => StreamMessage::Frame(frame),
            Err(e) => {
                let _ = tx.send(StreamMessage::Failed(e.to_string()));
                return;
            }
        };
        if tx.send(message).is_err() {
            return;
        }
    }
    let _ = tx.send(StreamMessage::Ended);
}

/// Holds at most one live [`TrackingSession`].
pub struct OrderTracker<T: EventTransport + ?Sized + 'static> {
    transport: Arc<T>,
    session: Option<TrackingSession>,
}

impl<T: EventTransport + ?Sized + 'static> OrderTracker<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            session: None,
        }
    }

    /// Starts tracking `order_id`, closing any session this tracker already
    /// owns first.
    pub fn start_tracking(&mut self, order_id: &str) -> Result<&mut TrackingSession> {
        let order_id = crate::utils::validation::validate_non_empty_string("order_id", order_id)?;

        if let Some(mut previous) = self.session.take() {
            if !previous.is_closed() {
                tracing::info!(
                    "Replacing tracking session for {} with {}",
                    previous.order_id(),
                    order_id
                );
            }
            previous.close(CloseReason::Replaced);
        }

        let session = TrackingSession::idle(order_id).connect(Arc::clone(&self.transport));
        Ok(self.session.insert(session))
    }

    /// Stops the current session, if any. Safe to call repeatedly.
    pub fn stop_tracking(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
    }

    pub fn session(&self) -> Option<&TrackingSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut TrackingSession> {
        self.session.as_mut()
    }

    /// Hands the current session to the caller; the tracker goes back to idle.
    pub fn take_session(&mut self) -> Option<TrackingSession> {
        self.session.take()
    }
}
