//! Multi-cover runtime.
//!
//! Owns one [`CoverEngine`] per configured cover and presents them to the
//! host on a single timeline: commands are dispatched by cover id, the
//! earliest pending deadline across all covers is exposed for the host's
//! sleep, and `poll()` fires every due timer.
//!
//! Covers are fully independent. The runtime adds no cross-cover logic
//! beyond routing and statistics.

use std::collections::BTreeMap;
use std::time::Instant;

use relay_cover_common::channel::SharedChannel;
use relay_cover_common::config::CoverConfig;
use relay_cover_common::cover::CoverError;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::command::CoverCommand;
use crate::engine::{CoverEngine, CoverStatus, TimerOutcome};
use crate::timer::TimerHandle;

// ─── Runtime Statistics ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Commands executed successfully.
    pub commands: u64,
    /// Commands refused (unknown cover, invalid argument).
    pub refused: u64,
    /// Timer fires that settled a cover.
    pub timers_fired: u64,
    /// Timer fires dropped because the handle was no longer armed.
    pub stale_timers: u64,
}

impl RuntimeStats {
    #[inline]
    fn record_timer(&mut self, outcome: TimerOutcome) {
        match outcome {
            TimerOutcome::Settled => self.timers_fired += 1,
            TimerOutcome::Stale => self.stale_timers += 1,
        }
    }
}

/// State change of one cover, as drained by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverUpdate {
    pub object_id: String,
    pub status: CoverStatus,
}

// ─── Cover Runtime ──────────────────────────────────────────────────

pub struct CoverRuntime<C: Clock> {
    covers: BTreeMap<String, CoverEngine<C>>,
    clock: C,
    stats: RuntimeStats,
}

impl<C: Clock + Clone> CoverRuntime<C> {
    /// Build one engine per cover. All engines share `clock` and `channel`.
    pub fn new(configs: Vec<CoverConfig>, clock: C, channel: SharedChannel) -> Self {
        let covers = configs
            .into_iter()
            .map(|config| {
                let id = config.object_id.clone();
                (id, CoverEngine::new(config, clock.clone(), channel.clone()))
            })
            .collect();
        Self {
            covers,
            clock,
            stats: RuntimeStats::default(),
        }
    }
}

impl<C: Clock> CoverRuntime<C> {
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.covers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.covers.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> &RuntimeStats {
        &self.stats
    }

    /// Engines in id order.
    pub fn covers(&self) -> impl Iterator<Item = &CoverEngine<C>> {
        self.covers.values()
    }

    /// Look up by object id, then by unique id.
    pub fn cover(&self, id: &str) -> Option<&CoverEngine<C>> {
        self.covers
            .get(id)
            .or_else(|| self.covers.values().find(|e| e.config().unique_id == id))
    }

    pub fn cover_mut(&mut self, id: &str) -> Option<&mut CoverEngine<C>> {
        let key = self.resolve(id)?;
        self.covers.get_mut(&key)
    }

    /// Route `command` to cover `id`.
    ///
    /// # Errors
    /// `CoverError::UnknownCover` or the engine's own validation error.
    pub fn dispatch(&mut self, id: &str, command: CoverCommand) -> Result<(), CoverError> {
        let Some(engine) = self.cover_mut(id) else {
            self.stats.refused += 1;
            warn!(cover = id, command = command.name(), "command for unknown cover");
            return Err(CoverError::UnknownCover(id.to_string()));
        };

        match command.apply(engine) {
            Ok(()) => {
                self.stats.commands += 1;
                debug!(cover = id, command = command.name(), "command dispatched");
                Ok(())
            }
            Err(e) => {
                self.stats.refused += 1;
                warn!(cover = id, command = command.name(), error = %e, "command refused");
                Err(e)
            }
        }
    }

    /// Earliest armed deadline across all covers.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.covers
            .values()
            .filter_map(|e| e.pending_timer())
            .map(|h| h.deadline())
            .min()
    }

    /// Fire every timer due at `now`. Returns the number of covers settled.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut settled = 0;
        for engine in self.covers.values_mut() {
            if let Some(outcome) = engine.poll(now) {
                self.stats.record_timer(outcome);
                if outcome == TimerOutcome::Settled {
                    settled += 1;
                }
            }
        }
        settled
    }

    /// Deliver an externally scheduled timer fire.
    ///
    /// # Errors
    /// `CoverError::UnknownCover` if `id` is not configured.
    pub fn deliver(&mut self, id: &str, handle: TimerHandle) -> Result<TimerOutcome, CoverError> {
        let engine = self
            .cover_mut(id)
            .ok_or_else(|| CoverError::UnknownCover(id.to_string()))?;
        let outcome = engine.on_timer(handle);
        self.stats.record_timer(outcome);
        Ok(outcome)
    }

    pub fn any_moving(&self) -> bool {
        self.covers.values().any(|e| e.motion().is_moving())
    }

    /// Pending state changes, in id order.
    pub fn drain_updates(&mut self) -> Vec<CoverUpdate> {
        self.covers
            .iter_mut()
            .filter_map(|(id, engine)| {
                engine.take_update().map(|status| CoverUpdate {
                    object_id: id.clone(),
                    status,
                })
            })
            .collect()
    }

    /// Live status of every moving cover.
    pub fn moving_statuses(&self) -> Vec<CoverUpdate> {
        self.covers
            .iter()
            .filter(|(_, e)| e.motion().is_moving())
            .map(|(id, e)| CoverUpdate {
                object_id: id.clone(),
                status: e.status(),
            })
            .collect()
    }

    /// Stop every moving cover (shutdown path).
    pub fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        for engine in self.covers.values_mut() {
            if engine.motion().is_moving() {
                engine.stop();
                stopped += 1;
            }
        }
        if stopped > 0 {
            info!(stopped, "stopped moving covers");
        }
        stopped
    }

    fn resolve(&self, id: &str) -> Option<String> {
        if self.covers.contains_key(id) {
            return Some(id.to_string());
        }
        self.covers
            .iter()
            .find(|(_, e)| e.config().unique_id == id)
            .map(|(k, _)| k.clone())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
