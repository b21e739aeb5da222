//! Single-threaded actor around a [`Companion`].
//!
//! All state changes run serially on one tokio task: host inputs arrive on
//! an unbounded channel, and the task sleeps until the companion's next
//! deadline when there is nothing to read. Every view change is published on
//! a `watch` channel for the render layer.
//!
//! Dropping every [`CompanionHandle`] or calling
//! [`CompanionHandle::shutdown`] stops the task and with it every pending
//! timer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::candidate::{BubbleAction, Candidate};
use crate::companion::Companion;
use crate::error::{CompanionError, Result};
use crate::hint::{ContextUpdate, Surface};
use crate::scheduler::BubbleView;
use crate::triggers::AppEvent;

/// A host signal. Also the wire format of `companion run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    Event { event: AppEvent },
    Propose { candidate: Candidate },
    Activity,
    Visibility { visible: bool },
    Context { update: ContextUpdate },
    Surface { surface: Surface },
    Dismiss,
    OutsideClick,
    ActivateAction,
    MuteToday,
    MuteForever,
    Unmute,
    Pause,
    Resume,
    AmbientTick,
}

enum Command {
    Input(Input),
    Activate(oneshot::Sender<Option<BubbleAction>>),
    Snapshot(oneshot::Sender<BubbleView>),
    Shutdown(oneshot::Sender<()>),
}

/// Cheap, cloneable access to a running companion.
#[derive(Clone)]
pub struct CompanionHandle {
    tx: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<BubbleView>,
}

/// Start the actor on the current tokio runtime.
pub fn spawn(companion: Companion) -> CompanionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(companion.view());
    tokio::spawn(run(companion, rx, view_tx));
    CompanionHandle { tx, view: view_rx }
}

impl CompanionHandle {
    pub fn send(&self, input: Input) -> Result<()> {
        self.tx
            .send(Command::Input(input))
            .map_err(|_| CompanionError::Stopped)
    }

    pub fn event(&self, event: AppEvent) -> Result<()> {
        self.send(Input::Event { event })
    }

    pub fn dismiss(&self) -> Result<()> {
        self.send(Input::Dismiss)
    }

    pub fn outside_click(&self) -> Result<()> {
        self.send(Input::OutsideClick)
    }

    pub fn mute_today(&self) -> Result<()> {
        self.send(Input::MuteToday)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Input::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Input::Resume)
    }

    /// Take the showing bubble's action, if it has one.
    pub async fn activate_action(&self) -> Result<Option<BubbleAction>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Activate(reply))
            .map_err(|_| CompanionError::Stopped)?;
        rx.await.map_err(|_| CompanionError::Stopped)
    }

    /// Latest published view.
    pub fn view(&self) -> BubbleView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BubbleView> {
        self.view.clone()
    }

    /// View after every input sent so far has been applied.
    pub async fn snapshot(&self) -> Result<BubbleView> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Snapshot(reply))
            .map_err(|_| CompanionError::Stopped)?;
        rx.await.map_err(|_| CompanionError::Stopped)
    }

    /// Stop the actor and wait for it to let go of its state.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown(ack))
            .map_err(|_| CompanionError::Stopped)?;
        rx.await.map_err(|_| CompanionError::Stopped)
    }
}

async fn run(
    mut companion: Companion,
    mut rx: mpsc::UnboundedReceiver<Command>,
    view_tx: watch::Sender<BubbleView>,
) {
    info!("companion runtime started");

    let ack = loop {
        let wait = companion.time_to_next_deadline();
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Input(input)) => {
                    if let Some(action) = companion.apply(input) {
                        debug!(?action, "action activated without a reply channel");
                    }
                }
                Some(Command::Activate(reply)) => {
                    let _ = reply.send(companion.activate_action());
                }
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(companion.view());
                }
                Some(Command::Shutdown(ack)) => break Some(ack),
                None => break None,
            },
            _ = sleep_for(wait) => {
                companion.tick();
            }
        }
        publish(&view_tx, companion.view());
    };

    companion.shutdown();
    publish(&view_tx, companion.view());
    drop(rx);
    info!("companion runtime stopped");
    if let Some(ack) = ack {
        let _ = ack.send(());
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending::<()>().await,
    }
}

fn publish(view_tx: &watch::Sender<BubbleView>, view: BubbleView) {
    view_tx.send_if_modified(|current| {
        if *current == view {
            false
        } else {
            *current = view;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::storage::{CompanionConfig, MemoryStore};
    use std::sync::Arc;

    fn fast_companion() -> Companion {
        let mut config = CompanionConfig::default();
        config.display.short_ms = 40;
        config.display.medium_ms = 40;
        config.display.long_ms = 40;
        config.display.exit_transition_ms = 10;
        Companion::with_seed(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            3,
        )
    }

    #[test]
    fn input_wire_format() {
        let input: Input =
            serde_json::from_str(r#"{"type":"event","event":{"type":"level_up","level":3}}"#)
                .unwrap();
        assert_eq!(
            input,
            Input::Event {
                event: AppEvent::LevelUp { level: 3 }
            }
        );
        let input: Input = serde_json::from_str(r#"{"type":"mute_today"}"#).unwrap();
        assert_eq!(input, Input::MuteToday);
        let input: Input =
            serde_json::from_str(r#"{"type":"visibility","visible":false}"#).unwrap();
        assert_eq!(input, Input::Visibility { visible: false });
    }

    #[tokio::test]
    async fn bubble_shows_then_expires_on_its_own() {
        let handle = spawn(fast_companion());
        handle.event(AppEvent::GoalCreated).unwrap();

        let view = handle.snapshot().await.unwrap();
        assert!(view.visible);

        let mut views = handle.subscribe();
        tokio::time::timeout(
            Duration::from_secs(2),
            views.wait_for(|v| !v.visible && !v.hiding),
        )
        .await
        .expect("bubble never expired")
        .unwrap();

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn activate_without_action_returns_none() {
        let handle = spawn(fast_companion());
        handle.event(AppEvent::TaskCompleted { title: None }).unwrap();
        assert_eq!(handle.activate_action().await.unwrap(), None);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn mute_today_hides_through_handle() {
        let handle = spawn(fast_companion());
        handle.event(AppEvent::ExerciseCompleted).unwrap();
        handle.mute_today().unwrap();
        let view = handle.snapshot().await.unwrap();
        assert!(!view.visible);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_accepting_inputs() {
        let handle = spawn(fast_companion());
        handle.shutdown().await.unwrap();
        assert!(matches!(
            handle.send(Input::Dismiss),
            Err(CompanionError::Stopped)
        ));
        assert!(handle.snapshot().await.is_err());
    }
}
