use chrono::{DateTime, Utc};
use game_core::GameContext;
use game_types::GameError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::config::Config;

/// Drives the engine's clock: a periodic tick on the bus for the idle sweep,
/// and a fast pump that fires due game timers.
pub struct TimerService {
    ctx: GameContext,
    tick_interval: Duration,
    resolution: Duration,
}

impl TimerService {
    pub fn new(ctx: GameContext, config: &Config) -> Self {
        Self {
            ctx,
            tick_interval: config.tick_interval(),
            resolution: config.timer_resolution(),
        }
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Result<(), GameError> {
        self.ctx.tick(now)
    }

    pub fn pump(&self, now: DateTime<Utc>) -> Result<(), GameError> {
        self.ctx.run_timers(now)
    }

    /// Runs until `shutdown` resolves. The first failing tick or timer stops
    /// the loop and is returned.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), GameError> {
        let mut tick = interval(self.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        tick.tick().await;

        let mut pump = interval(self.resolution);
        pump.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        info!(
            "timer service running (tick every {:?}, resolution {:?})",
            self.tick_interval, self.resolution
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("timer service stopping");
                    return Ok(());
                }
                _ = tick.tick() => {
                    self.tick(Utc::now()).inspect_err(|e| error!("tick failed: {}", e))?;
                }
                _ = pump.tick() => {
                    self.pump(Utc::now()).inspect_err(|e| error!("timer pump failed: {}", e))?;
                }
            }
        }
    }
}
