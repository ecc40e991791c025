// Event log - writes every published event as one JSON line
use crate::application::event::DashboardEvent;
use crate::application::event_bus::{EventBus, EventFilter, SubscriptionId};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub fn render_event(event: &DashboardEvent) -> String {
    match serde_json::to_string(event) {
        Ok(line) => line,
        Err(e) => {
            tracing::error!("Failed to serialize event {}: {}", event.correlation_id, e);
            format!(
                r#"{{"correlation_id":"{}","type":"{}"}}"#,
                event.correlation_id,
                event.kind()
            )
        }
    }
}

/// Subscribes a writer that receives one line per event.
pub fn attach<W>(bus: &EventBus, writer: W) -> SubscriptionId
where
    W: Write + Send + 'static,
{
    let writer = Arc::new(Mutex::new(writer));
    bus.subscribe(EventFilter::All, move |event| {
        if event.is_success() {
            tracing::info!("{} -> {}", event.correlation_id, event.kind());
        } else {
            tracing::warn!("{} -> {}", event.correlation_id, event.kind());
        }

        let line = render_event(event);
        let mut writer = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(writer, "{}", line) {
            tracing::error!("Failed to write event log: {}", e);
        }
    })
}
