use log::info;
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::broadcast::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub message: String,
}

/// Sink for human readable run events. Implementations only append; nothing
/// downstream interprets the messages.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);

    fn emit(&self, message: String) {
        self.report(ProgressEvent { message });
    }
}

/// Append-only log of one run. Events are mirrored to the `log` facade and
/// broadcast to any live subscribers.
pub struct RunLog {
    events: Mutex<Vec<ProgressEvent>>,
    sender: Sender<ProgressEvent>,
}

impl RunLog {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(512);
        Self {
            events: Mutex::new(Vec::new()),
            sender,
        }
    }

    pub fn subscribe(&self) -> Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events().iter().any(|e| e.message.contains(needle))
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for RunLog {
    fn report(&self, event: ProgressEvent) {
        info!("{}", event.message);
        // No subscribers is fine, the event is still kept in the log.
        let _ = self.sender.send(event.clone());
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
