// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

/// Caller contract violations.
///
/// Physics anomalies (limit violations, quenches, non-finite integration
/// results) are never reported through this type; they surface as flags,
/// operational phases and mitigation decisions.
#[derive(Error, Debug)]
pub enum PlasmaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Time step must be finite and > 0, got {0}")]
    InvalidTimeStep(f64),

    #[error("Actuator layout mismatch for {channel}: expected {expected}, got {actual}")]
    ActuatorLayout {
        channel: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Session already in safe shutdown at t={time_s:.6} s")]
    SessionTerminated { time_s: f64 },

    #[error("Control deadline missed: started {jitter_us:.3} us late, budget {allowed_us:.3} us")]
    DeadlineMissed { jitter_us: f64, allowed_us: f64 },

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PlasmaResult<T> = Result<T, PlasmaError>;
