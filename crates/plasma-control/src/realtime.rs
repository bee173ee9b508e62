// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Real-Time Control (RTC) Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Wall-clock paced stepping of the control aggregate.
//!
//! Each control step is released at a fixed deadline on the monotonic clock.
//! A step released later than `max_jitter_us` past its deadline aborts the
//! shot with [`PlasmaError::DeadlineMissed`].

use crate::scenario::ShotController;
use crate::shot::{shot_steps, ShotRecorder, ShotReport};
use crate::system::PlasmaControlSystem;
use plasma_types::error::{PlasmaError, PlasmaResult};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Pacing policy of the real-time driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtcConfig {
    /// Control loop rate [Hz]; the step length is its inverse
    pub target_hz: f64,
    /// Lateness budget per step [µs]; zero disables the check
    pub max_jitter_us: f64,
    /// Spin instead of sleeping until each deadline
    pub use_busy_wait: bool,
}

impl Default for RtcConfig {
    fn default() -> Self {
        RtcConfig {
            target_hz: 1000.0,
            max_jitter_us: 200.0,
            use_busy_wait: false,
        }
    }
}

impl RtcConfig {
    fn validate(&self) -> PlasmaResult<()> {
        if !self.target_hz.is_finite() || self.target_hz <= 0.0 {
            return Err(PlasmaError::ConfigError(format!(
                "rtc target_hz must be finite and > 0, got {}",
                self.target_hz
            )));
        }
        if !self.max_jitter_us.is_finite() || self.max_jitter_us < 0.0 {
            return Err(PlasmaError::ConfigError(format!(
                "rtc max_jitter_us must be finite and >= 0, got {}",
                self.max_jitter_us
            )));
        }
        Ok(())
    }

    /// Control period [s].
    pub fn period(&self) -> f64 {
        1.0 / self.target_hz
    }

    fn check_lateness(&self, late: Duration) -> PlasmaResult<()> {
        let jitter_us = late.as_secs_f64() * 1.0e6;
        let allowed_us = self.max_jitter_us;
        if allowed_us > 0.0 && jitter_us > allowed_us {
            return Err(PlasmaError::DeadlineMissed {
                jitter_us,
                allowed_us,
            });
        }
        Ok(())
    }
}

/// Paced driver owning the system and its controller.
pub struct RealtimeDriver<C: ShotController, R: Rng = ChaCha8Rng> {
    pub system: PlasmaControlSystem<R>,
    pub controller: C,
    pub config: RtcConfig,
}

impl<C: ShotController, R: Rng> RealtimeDriver<C, R> {
    pub fn new(system: PlasmaControlSystem<R>, controller: C, config: RtcConfig) -> Self {
        RealtimeDriver {
            system,
            controller,
            config,
        }
    }

    /// Run a shot with `dt` equal to the control period, releasing one step
    /// per deadline until `duration_s` of simulated time or SAFE_SHUTDOWN.
    pub fn run_shot_paced(&mut self, duration_s: f64) -> PlasmaResult<ShotReport> {
        self.config.validate()?;
        let dt = self.config.period();
        let steps = shot_steps(duration_s, dt)?;
        let period = Duration::from_secs_f64(dt);
        debug!(steps, period_us = dt * 1.0e6, "paced shot");

        let mut recorder = ShotRecorder::start(self.system.state());
        let mut deadline = Instant::now();
        for _ in 0..steps {
            if self.system.phase().is_terminal() {
                break;
            }
            self.wait_until(deadline);
            let released = Instant::now();
            let late = released.saturating_duration_since(deadline);
            if let Err(err) = self.config.check_lateness(late) {
                warn!(time = self.system.time(), %err, "paced shot aborted");
                return Err(err);
            }

            let actuators = self.controller.actuate(&self.system.context(), dt);
            let report = self.system.step(&actuators, dt)?;
            let step_us = released.elapsed().as_secs_f64() * 1.0e6;
            recorder.observe(&report, step_us, self.system.fusion_gain_q());
            deadline += period;
        }
        Ok(recorder.finish(&self.system))
    }

    fn wait_until(&self, deadline: Instant) {
        if self.config.use_busy_wait {
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
    }
}
