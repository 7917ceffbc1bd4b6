//! SequencePlayer - control surface and timed-emission loop
//!
//! The controlling context calls `start`/`pause`/`resume`/`stop`; all four
//! return immediately. The timing loop runs on its own tokio task and
//! observes control changes at its next poll point through a watch channel,
//! so stop/pause latency is bounded by a runtime wakeup rather than a fixed
//! polling interval.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use seqbox_common::events::{EventBus, PlayerEvent};
use seqbox_common::schedule::Schedule;
use seqbox_common::time::now;

use crate::channel::{Channel, ChannelError, DISABLE_COMMAND};
use crate::error::{Error, Result};
use crate::player::state::{PlayerState, SharedPlayerState};

/// Control signal from the controlling context to the run task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Run,
    Pause,
    Stop,
}

/// Outcome of an inter-entry wait
enum WaitOutcome {
    /// The full interval elapsed
    Completed,
    /// A pause interrupted the wait; after resume the player proceeds
    /// directly to the next send (accepted policy, commands are idempotent
    /// state-setters)
    ResumedEarly,
    /// Stop was requested during the wait
    Stopped,
}

/// Drives one schedule through one channel
///
/// Each instance is independent; exactly one run is active per player, and
/// the channel handed to `start` is exclusively owned by that run until a
/// terminal state closes it.
pub struct SequencePlayer {
    state: SharedPlayerState,
    events: Arc<EventBus>,
    ctrl_tx: RwLock<Option<watch::Sender<Control>>>,
    run_handle: RwLock<Option<JoinHandle<()>>>,
}

impl SequencePlayer {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            state: SharedPlayerState::new(),
            events,
            ctrl_tx: RwLock::new(None),
            run_handle: RwLock::new(None),
        }
    }

    /// Current player state
    pub async fn state(&self) -> PlayerState {
        self.state.get().await
    }

    /// Handle to the event bus this player emits on
    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    /// Start a run
    ///
    /// Rejected unless the player is `Idle` or in a terminal state; rejection
    /// emits an `InvalidTransition` event and returns an error so two runs
    /// can never race for the same channel. On success the timing loop is
    /// spawned and the fresh run id returned.
    pub async fn start(&self, schedule: Schedule, channel: Box<dyn Channel>) -> Result<Uuid> {
        let current = self.state.get().await;
        if !current.can_start() {
            self.events.emit_lossy(PlayerEvent::InvalidTransition {
                requested: "start".to_string(),
                state: current.to_string(),
                timestamp: now(),
            });
            return Err(Error::InvalidState(format!(
                "start rejected while {}",
                current
            )));
        }

        let run_id = Uuid::new_v4();
        let (ctrl_tx, ctrl_rx) = watch::channel(Control::Run);

        self.state.set(PlayerState::Running).await;
        *self.ctrl_tx.write().await = Some(ctrl_tx);

        info!("Starting run {} with {} entries", run_id, schedule.len());
        self.events.emit_lossy(PlayerEvent::Started {
            run_id,
            entries: schedule.len(),
            timestamp: now(),
        });

        let task = RunTask {
            run_id,
            schedule,
            channel,
            ctrl: ctrl_rx,
            state: self.state.clone(),
            events: Arc::clone(&self.events),
        };
        *self.run_handle.write().await = Some(tokio::spawn(task.run()));

        Ok(run_id)
    }

    /// Request a pause
    ///
    /// Meaningful only while a run is executing; otherwise a no-op reported
    /// via an `InvalidTransition` event. The loop acknowledges at its next
    /// poll point without dropping or skipping the current entry.
    pub async fn pause(&self) -> Result<()> {
        let guard = self.ctrl_tx.read().await;
        let current = self.state.get().await;
        match guard.as_ref() {
            Some(tx) if *tx.borrow() == Control::Run && !current.is_terminal() => {
                debug!("Pause requested");
                let _ = tx.send(Control::Pause);
            }
            _ => {
                debug!("Pause ignored while {}", current);
                self.events.emit_lossy(PlayerEvent::InvalidTransition {
                    requested: "pause".to_string(),
                    state: current.to_string(),
                    timestamp: now(),
                });
            }
        }
        Ok(())
    }

    /// Resume a paused run
    pub async fn resume(&self) -> Result<()> {
        let guard = self.ctrl_tx.read().await;
        let current = self.state.get().await;
        match guard.as_ref() {
            Some(tx) if *tx.borrow() == Control::Pause && !current.is_terminal() => {
                debug!("Resume requested");
                let _ = tx.send(Control::Run);
            }
            _ => {
                debug!("Resume ignored while {}", current);
                self.events.emit_lossy(PlayerEvent::InvalidTransition {
                    requested: "resume".to_string(),
                    state: current.to_string(),
                    timestamp: now(),
                });
            }
        }
        Ok(())
    }

    /// Stop the active run
    ///
    /// Safe to call from any state and idempotent: once the player is
    /// `Stopping` or terminal, further calls are no-ops. The run task sends
    /// the disable command and closes the channel exactly once.
    pub async fn stop(&self) -> Result<()> {
        if !self.state.begin_stop().await {
            debug!("Stop ignored: no run in flight");
            return Ok(());
        }

        info!("Stop requested");
        if let Some(tx) = self.ctrl_tx.read().await.as_ref() {
            let _ = tx.send(Control::Stop);
        }
        Ok(())
    }

    /// Await termination of the current run, if any
    pub async fn wait_until_done(&self) -> Result<()> {
        let handle = self.run_handle.write().await.take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| Error::Internal(format!("run task failed: {}", e)))?;
        }
        Ok(())
    }
}

/// State moved onto the spawned timing-loop task
struct RunTask {
    run_id: Uuid,
    schedule: Schedule,
    channel: Box<dyn Channel>,
    ctrl: watch::Receiver<Control>,
    state: SharedPlayerState,
    events: Arc<EventBus>,
}

impl RunTask {
    /// The timing loop: one pass over the schedule
    async fn run(mut self) {
        let total = self.schedule.len();
        let mut sent = 0usize;

        for index in 0..total {
            match self.current_control() {
                Control::Stop => {
                    self.finalize_stopped(sent).await;
                    return;
                }
                Control::Pause => {
                    // resumes at the same index, nothing dropped
                    if !self.block_while_paused().await {
                        self.finalize_stopped(sent).await;
                        return;
                    }
                }
                Control::Run => {}
            }

            let Some(entry) = self.schedule.get(index) else {
                break;
            };
            let command = entry.command.clone();
            let offset_minutes = entry.offset_minutes;

            // intent is reported before the write so listeners see the
            // command even if the write fails
            self.events.emit_lossy(PlayerEvent::Progress {
                run_id: self.run_id,
                index,
                scheduled_offset_minutes: offset_minutes,
                command: String::from_utf8_lossy(&command).into_owned(),
                timestamp: now(),
            });

            if let Err(e) = self.channel.write(&command) {
                self.finalize_failed(e, sent).await;
                return;
            }
            sent += 1;

            if !self.channel.is_open() {
                self.finalize_failed(ChannelError::Closed, sent).await;
                return;
            }

            if let Some(wait) = self.schedule.wait_after(index) {
                // zero covers duplicate and out-of-order offsets: fire
                // immediately instead of failing the run
                if !wait.is_zero() {
                    match self.interruptible_wait(wait).await {
                        WaitOutcome::Completed | WaitOutcome::ResumedEarly => {}
                        WaitOutcome::Stopped => {
                            self.finalize_stopped(sent).await;
                            return;
                        }
                    }
                }
            }
        }

        // a stop that lands during the final send still wins over Finished
        if self.current_control() == Control::Stop {
            self.finalize_stopped(sent).await;
        } else {
            self.finalize_finished(sent).await;
        }
    }

    fn current_control(&self) -> Control {
        *self.ctrl.borrow()
    }

    /// Suspend until resume or stop. Returns false on stop (or when the
    /// controlling side went away).
    async fn block_while_paused(&mut self) -> bool {
        self.state.set(PlayerState::Paused).await;
        info!("Run {} paused", self.run_id);
        self.events.emit_lossy(PlayerEvent::Paused {
            run_id: self.run_id,
            timestamp: now(),
        });

        loop {
            if self.ctrl.changed().await.is_err() {
                return false;
            }
            match self.current_control() {
                Control::Run => {
                    self.state.set(PlayerState::Running).await;
                    info!("Run {} resumed", self.run_id);
                    self.events.emit_lossy(PlayerEvent::Resumed {
                        run_id: self.run_id,
                        timestamp: now(),
                    });
                    return true;
                }
                Control::Stop => return false,
                Control::Pause => continue,
            }
        }
    }

    /// Sleep for `wait`, waking early on any control change
    async fn interruptible_wait(&mut self, wait: std::time::Duration) -> WaitOutcome {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return WaitOutcome::Completed,
                changed = self.ctrl.changed() => {
                    if changed.is_err() {
                        return WaitOutcome::Stopped;
                    }
                    match self.current_control() {
                        Control::Stop => return WaitOutcome::Stopped,
                        Control::Pause => {
                            if !self.block_while_paused().await {
                                return WaitOutcome::Stopped;
                            }
                            // remaining wait is intentionally not re-armed
                            return WaitOutcome::ResumedEarly;
                        }
                        Control::Run => continue,
                    }
                }
            }
        }
    }

    /// Best-effort disable command; failure is logged, never escalated
    fn send_disable(&mut self) {
        if !self.channel.is_open() {
            return;
        }
        if let Err(e) = self.channel.write(&[DISABLE_COMMAND]) {
            warn!("Failed to send disable command: {}", e);
        }
    }

    async fn finalize_stopped(&mut self, sent: usize) {
        self.send_disable();
        self.channel.close();
        self.state.set(PlayerState::Stopped).await;
        info!(
            "Run {} stopped after {} of {} commands",
            self.run_id,
            sent,
            self.schedule.len()
        );
        self.events.emit_lossy(PlayerEvent::Stopped {
            run_id: self.run_id,
            commands_sent: sent,
            timestamp: now(),
        });
    }

    async fn finalize_failed(&mut self, cause: ChannelError, sent: usize) {
        // no disable attempt here: the channel just proved unusable and the
        // player never retries a write
        let reason = cause.to_string();
        self.channel.close();
        self.state
            .set(PlayerState::Failed {
                reason: reason.clone(),
            })
            .await;
        error!(
            "Run {} failed after {} commands: {}",
            self.run_id, sent, reason
        );
        self.events.emit_lossy(PlayerEvent::Failed {
            run_id: self.run_id,
            reason,
            commands_sent: sent,
            timestamp: now(),
        });
    }

    async fn finalize_finished(&mut self, sent: usize) {
        // no disable on natural completion, the device keeps its final state
        self.channel.close();
        self.state.set(PlayerState::Finished).await;
        info!("Run {} finished, {} commands sent", self.run_id, sent);
        self.events.emit_lossy(PlayerEvent::Finished {
            run_id: self.run_id,
            commands_sent: sent,
            timestamp: now(),
        });
    }
}
