//! Run observers — the runner's only side channel.
//!
//! RULE: Engines never log configuration or hold logger state.
//! The runner reports progress to the observer it was built with;
//! callers choose where that goes.

use crate::event::RunEvent;

/// Receives run events. Must be `Sync`: concurrent runs report from
/// worker threads.
pub trait RunObserver: Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Forwards run events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::RunStarted { users, events, plans, sources } => log::info!(
                "metrics run started: {users} users, {events} events, {plans} plans, {sources} sources"
            ),
            RunEvent::EngineFinished { engine, rows } => {
                log::debug!("engine {} finished ({rows} rows)", engine.name())
            }
            RunEvent::RunCompleted { engines } => {
                log::info!("metrics run completed ({engines} engines)")
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_event(&self, _event: &RunEvent) {}
}

impl<T: RunObserver + ?Sized> RunObserver for &T {
    fn on_event(&self, event: &RunEvent) {
        (**self).on_event(event)
    }
}
