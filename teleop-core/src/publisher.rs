use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, trace, warn};

use crate::{
    error::Error,
    move_base::{BaseVelocity, MoveBase},
    state::TeleopHandle,
};

pub const DEFAULT_PUBLISH_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Interval between two velocity commands.
    pub period: Duration,
    /// Keep publishing zero velocity while there is no input.
    ///
    /// If false, a single zero is sent after the last motion command and the
    /// topic stays quiet until the operator moves again. An engaged E-stop is
    /// always published.
    pub publish_when_idle: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PUBLISH_PERIOD,
            publish_when_idle: true,
        }
    }
}

/// Sends the command of a [`TeleopHandle`] to a [`MoveBase`] at a fixed rate.
#[derive(Debug)]
pub struct VelocityPublisher<M>
where
    M: MoveBase,
{
    move_base: M,
    handle: TeleopHandle,
    config: PublisherConfig,
    is_running: AtomicBool,
    stop_requested: AtomicBool,
    stop_notify: Notify,
}

impl<M> VelocityPublisher<M>
where
    M: MoveBase,
{
    pub fn new(move_base: M, handle: TeleopHandle, config: PublisherConfig) -> Self {
        Self {
            move_base,
            handle,
            config,
            is_running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
        }
    }

    pub fn handle(&self) -> &TeleopHandle {
        &self.handle
    }

    pub fn move_base(&self) -> &M {
        &self.move_base
    }

    pub fn config(&self) -> PublisherConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Requests the loop to finish. The loop sends a final zero velocity on exit.
    ///
    /// A stop requested while the loop is not running makes the next
    /// [`run`](Self::run) return right after its final zero. The request is
    /// consumed when the loop exits, so the publisher can be run again.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
        self.stop_notify.notify_waiters();
    }

    /// Engages the E-stop and sends zero without waiting for the next tick.
    pub fn emergency_stop_now(&self) -> Result<(), Error> {
        self.handle.engage_emergency_stop();
        self.move_base.send_velocity(&BaseVelocity::ZERO)
    }

    /// Runs the publishing loop until [`stop`](Self::stop) is called.
    ///
    /// Missed ticks are skipped, so a stalled runtime never produces a burst
    /// of queued commands.
    pub async fn run(&self) {
        if self.is_running.swap(true, Ordering::Relaxed) {
            warn!("velocity publisher is already running");
            return;
        }
        info!(period = ?self.config.period, "velocity publisher started");

        let mut interval = time::interval(self.config.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_sent_zero = false;
        loop {
            // registered before the flag check so a concurrent `stop` is not missed
            let notified = self.stop_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.stop_requested.load(Ordering::Relaxed) {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut notified => break,
            }
            self.publish_once(&mut last_sent_zero);
        }

        debug!("send final zero velocity");
        if let Err(e) = self.move_base.send_velocity(&BaseVelocity::ZERO) {
            warn!("failed to send final zero velocity: {e}");
        }
        self.stop_requested.store(false, Ordering::Relaxed);
        self.is_running.store(false, Ordering::Relaxed);
        info!("velocity publisher stopped");
    }

    fn publish_once(&self, last_sent_zero: &mut bool) {
        let state = self.handle.snapshot();
        let velocity = state.command();
        if !self.config.publish_when_idle
            && !state.is_emergency_stopped()
            && velocity.is_zero()
            && *last_sent_zero
        {
            trace!("idle");
            return;
        }

        debug!(?velocity, "send_velocity");
        match self.move_base.send_velocity(&velocity) {
            Ok(()) => *last_sent_zero = velocity.is_zero(),
            Err(e) => warn!("failed to send velocity: {e}"),
        }
    }
}

impl<M> VelocityPublisher<M>
where
    M: MoveBase + Send + Sync + 'static,
{
    /// Spawns [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let publisher = self.clone();
        tokio::spawn(async move { publisher.run().await })
    }
}
