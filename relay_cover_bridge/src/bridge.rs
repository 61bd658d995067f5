//! Host bridge event loop.
//!
//! Wires the cover runtime to the outside world on one task:
//!
//! | source                  | effect                                   |
//! |-------------------------|------------------------------------------|
//! | host command line       | parsed, dispatched to the runtime        |
//! | earliest timer deadline | `poll()` settles due covers              |
//! | report interval         | live state of moving covers re-published |
//! | shutdown signal / EOF   | stop moving covers, save, exit           |
//!
//! After every event, pending state changes are published to each cover's
//! state topic and positions are saved whenever a cover comes to rest.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use relay_cover_common::channel::SharedChannel;
use relay_cover_common::config::CoverConfig;
use relay_cover_common::cover::{CoverError, Position};
use relay_cover_engine::{Clock, CoverRuntime, CoverUpdate, EntityDescriptor, EntityState};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::BridgeError;
use crate::host::HostLine;
use crate::state::{PersistedState, StatePersistence};

/// Bridge settings resolved from configuration and CLI.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub report_interval: Duration,
    pub state_file: Option<PathBuf>,
}

pub struct Bridge<C: Clock + Clone> {
    runtime: CoverRuntime<C>,
    channel: SharedChannel,
    store: Option<StatePersistence>,
    report_interval: Duration,
    /// object_id → state topic
    state_topics: BTreeMap<String, String>,
}

impl<C: Clock + Clone> Bridge<C> {
    /// Build the runtime and restore saved positions.
    pub fn new(
        covers: Vec<CoverConfig>,
        options: BridgeOptions,
        clock: C,
        channel: SharedChannel,
    ) -> Self {
        let state_topics = covers
            .iter()
            .filter_map(|c| {
                c.state_topic
                    .as_ref()
                    .map(|topic| (c.object_id.clone(), topic.clone()))
            })
            .collect();

        for config in &covers {
            let entity = EntityDescriptor::from_config(config);
            info!(
                cover = %config.object_id,
                unique_id = %entity.unique_id,
                name = %entity.name,
                features = entity.supported_features,
                "cover registered"
            );
        }

        let mut bridge = Self {
            runtime: CoverRuntime::new(covers, clock, channel.clone()),
            channel,
            store: options.state_file.map(StatePersistence::new),
            report_interval: options.report_interval,
            state_topics,
        };
        bridge.restore();
        bridge
    }

    #[inline]
    pub fn runtime(&self) -> &CoverRuntime<C> {
        &self.runtime
    }

    #[inline]
    pub fn runtime_mut(&mut self) -> &mut CoverRuntime<C> {
        &mut self.runtime
    }

    /// Handle one host command line.
    ///
    /// # Errors
    /// Parse errors, unknown covers and invalid positions. Nothing is
    /// changed when an error is returned.
    pub fn handle_line(&mut self, line: &str) -> Result<(), CoverError> {
        match line.parse::<HostLine>()? {
            HostLine::Empty => Ok(()),
            HostLine::Status => {
                self.log_status();
                Ok(())
            }
            HostLine::Command { cover, command } => {
                let command = command.to_cover_command()?;
                self.runtime.dispatch(&cover, command)
            }
        }
    }

    /// Fire due timers at the clock's current instant.
    pub fn tick(&mut self) -> usize {
        let now = self.runtime.clock().now();
        self.runtime.poll(now)
    }

    /// Publish pending state changes; save if any cover came to rest.
    pub fn flush_updates(&mut self) {
        let updates = self.runtime.drain_updates();
        let mut settled = false;
        for update in &updates {
            self.publish_state(update);
            settled |= !update.status.motion.is_moving();
        }
        if settled {
            self.save_state();
        }
    }

    /// Re-publish the live state of every moving cover.
    pub fn report_moving(&self) {
        for update in self.runtime.moving_statuses() {
            self.publish_state(&update);
        }
    }

    pub fn save_state(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(&PersistedState::capture(&self.runtime)) {
            warn!(path = ?store.path(), error = %e, "failed to save cover positions");
        }
    }

    /// Stop moving covers, publish their final state and save.
    pub fn shutdown(&mut self) {
        self.runtime.stop_all();
        self.flush_updates();
        self.save_state();

        let stats = self.runtime.stats();
        let (relay_commands, delivery_failures) =
            self.runtime.covers().fold((0, 0), |(sent, failed), engine| {
                (
                    sent + engine.stats().relay_commands,
                    failed + engine.stats().delivery_failures,
                )
            });
        info!(
            commands = stats.commands,
            refused = stats.refused,
            timers_fired = stats.timers_fired,
            stale_timers = stats.stale_timers,
            relay_commands,
            delivery_failures,
            "bridge stopped"
        );
    }

    /// Run until `input` reaches EOF or `shutdown` resolves.
    ///
    /// # Errors
    /// `BridgeError::Io` if reading `input` fails.
    pub async fn run<R, S>(&mut self, input: R, shutdown: S) -> Result<(), BridgeError>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        let mut report = time::interval(self.report_interval);
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(covers = self.runtime.len(), "bridge running");
        self.flush_updates();

        let result = loop {
            let deadline = self.runtime.next_deadline();
            let moving = self.runtime.any_moving();
            let timer = async move {
                match deadline {
                    Some(at) => time::sleep_until(time::Instant::from_std(at)).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Err(e) = self.handle_line(&line) {
                            warn!(line = %line.trim(), error = %e, "host command rejected");
                        }
                    }
                    Ok(None) => {
                        info!("host input closed");
                        break Ok(());
                    }
                    Err(e) => break Err(BridgeError::Io(e)),
                },
                () = timer => {
                    let settled = self.tick();
                    debug!(settled, "timer deadline reached");
                }
                _ = report.tick(), if moving => self.report_moving(),
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
            }

            self.flush_updates();
        };

        self.shutdown();
        result
    }

    fn restore(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let saved = match store.load() {
            Ok(Some(saved)) => saved,
            Ok(None) => return,
            Err(e) => {
                warn!(path = ?store.path(), error = %e, "ignoring unreadable state file");
                return;
            }
        };

        let restored: Vec<(String, Position)> = self
            .runtime
            .covers()
            .filter_map(|engine| {
                saved
                    .position_of(&engine.config().unique_id)
                    .map(|position| (engine.id().to_string(), position))
            })
            .collect();

        for (id, position) in restored {
            if let Some(engine) = self.runtime.cover_mut(&id) {
                engine.restore(position);
                info!(cover = %id, position = position.percent(), "position restored");
            }
        }
    }

    fn log_status(&self) {
        for engine in self.runtime.covers() {
            let state = EntityState::from_status(&engine.status());
            info!(cover = %engine.id(), name = %engine.config().name, %state, "status");
        }
    }

    fn publish_state(&self, update: &CoverUpdate) {
        let state = EntityState::from_status(&update.status);
        debug!(cover = %update.object_id, %state, "state update");

        let Some(topic) = self.state_topics.get(&update.object_id) else {
            return;
        };
        match serde_json::to_string(&state) {
            Ok(json) => {
                if let Err(e) = self.channel.publish(topic, &json) {
                    warn!(cover = %update.object_id, error = %e, "state not delivered");
                }
            }
            Err(e) => warn!(cover = %update.object_id, error = %e, "state not encoded"),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
