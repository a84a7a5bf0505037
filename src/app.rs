// Service wiring: builds the event queue, registers the focus listener
// and owns the engine task for the life of the subsystem.

use std::sync::Arc;

use log::warn;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::config::PreferenceStore;
use crate::core::engine::{CallAlertEngine, DeviceSet, EngineEvent, EventSender};
use crate::core::error::StartupError;
use crate::core::model::CallEvent;
use crate::core::notify::AlertPresenter;

/// Handle over a running alert engine. The telephony signal source feeds
/// it through [`submit`](Self::submit); dropping it without
/// [`shutdown`](Self::shutdown) leaves the engine running detached.
pub struct CallAlertService {
    events: EventSender,
    engine: JoinHandle<()>,
}

impl CallAlertService {
    /// Spawn the engine over a fresh event queue. Must be called inside a
    /// tokio runtime. A failed focus-listener registration is fatal;
    /// nothing is held at that point, so the error is simply returned.
    pub fn start(
        devices: DeviceSet,
        prefs: Arc<dyn PreferenceStore>,
        presenter: Arc<dyn AlertPresenter>,
    ) -> Result<Self, StartupError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventSender::new(tx);
        devices.focus.subscribe(&events)?;
        let engine = CallAlertEngine::new(devices, prefs, presenter, events.clone());
        let handle = tokio::spawn(engine.run(rx));
        Ok(Self {
            events,
            engine: handle,
        })
    }

    /// Entry point for the telephony signal source.
    pub fn submit(&self, event: CallEvent) {
        self.events.send(EngineEvent::Call(event));
    }

    /// Queue sender for collaborators that marshal their notifications
    /// onto the engine's sequence (focus listeners, tests).
    pub fn events(&self) -> EventSender {
        self.events.clone()
    }

    /// Stop the engine. Any live session is torn down before the task
    /// exits, so no device resource outlives the service.
    pub async fn shutdown(self) {
        self.events.send(EngineEvent::Shutdown);
        if self.engine.await.is_err() {
            warn!("engine task ended abnormally during shutdown");
        }
    }
}
