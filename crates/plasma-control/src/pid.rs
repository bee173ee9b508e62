// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — PID
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Discrete PID controller with output saturation.

use plasma_types::error::{PlasmaError, PlasmaResult};

/// Generic PID controller.
///
/// The integral accumulates `error·dt` and is frozen while the output is
/// saturated in the direction of the error.
#[derive(Debug, Clone)]
pub struct PIDController {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Symmetric output bound
    pub output_limit: f64,
    err_integral: f64,
    last_err: Option<f64>,
}

impl PIDController {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        PIDController {
            kp,
            ki,
            kd,
            output_limit: f64::INFINITY,
            err_integral: 0.0,
            last_err: None,
        }
    }

    pub fn with_limit(mut self, output_limit: f64) -> PlasmaResult<Self> {
        if output_limit.is_nan() || output_limit <= 0.0 {
            return Err(PlasmaError::ConfigError(format!(
                "PID output limit must be > 0, got {output_limit}"
            )));
        }
        self.output_limit = output_limit;
        Ok(self)
    }

    /// One PID step. Returns the saturated control output.
    pub fn step(&mut self, error: f64, dt: f64) -> f64 {
        let d_err = match self.last_err {
            Some(last) if dt > 0.0 => (error - last) / dt,
            _ => 0.0,
        };
        self.last_err = Some(error);

        let candidate_integral = self.err_integral + error * dt;
        let raw = self.kp * error + self.ki * candidate_integral + self.kd * d_err;
        let output = raw.clamp(-self.output_limit, self.output_limit);
        let winding_up = raw != output && raw.signum() == error.signum();
        if !winding_up {
            self.err_integral = candidate_integral;
        }
        output
    }

    /// Reset accumulated state.
    pub fn reset(&mut self) {
        self.err_integral = 0.0;
        self.last_err = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_zero_error() {
        let mut pid = PIDController::new(1.0, 0.1, 0.5);
        let out = pid.step(0.0, 1e-3);
        assert!(out.abs() < 1e-10, "Zero error → zero output: {out}");
    }

    #[test]
    fn test_pid_proportional() {
        let mut pid = PIDController::new(2.0, 0.0, 0.0);
        let out = pid.step(5.0, 1e-3);
        assert!((out - 10.0).abs() < 1e-10, "Pure P: 2.0 * 5.0 = 10.0: {out}");
    }

    #[test]
    fn test_pid_integral_scales_with_dt() {
        let mut pid = PIDController::new(0.0, 1.0, 0.0);
        pid.step(1.0, 0.5);
        pid.step(1.0, 0.5);
        let out = pid.step(1.0, 0.5);
        assert!((out - 1.5).abs() < 1e-10, "∫1 dt over 1.5 s = 1.5: {out}");
    }

    #[test]
    fn test_pid_no_derivative_kick_on_first_step() {
        let mut pid = PIDController::new(0.0, 0.0, 1.0);
        assert_eq!(pid.step(3.0, 1e-3), 0.0);
        let out = pid.step(4.0, 0.5);
        assert!((out - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_pid_saturation_stops_windup() {
        let mut pid = PIDController::new(1.0, 10.0, 0.0).with_limit(2.0).unwrap();
        for _ in 0..100 {
            assert!(pid.step(10.0, 0.1) <= 2.0);
        }
        // Without windup the sign flips as soon as the error does.
        let out = pid.step(-1.0, 0.1);
        assert!(out < 0.0, "integral wound up: {out}");
    }

    #[test]
    fn test_pid_rejects_bad_limit() {
        assert!(PIDController::new(1.0, 0.0, 0.0).with_limit(0.0).is_err());
        assert!(PIDController::new(1.0, 0.0, 0.0).with_limit(f64::NAN).is_err());
    }

    #[test]
    fn test_pid_reset() {
        let mut pid = PIDController::new(0.0, 1.0, 0.0);
        pid.step(1.0, 1.0);
        pid.reset();
        assert!((pid.step(1.0, 1.0) - 1.0).abs() < 1e-12);
    }
}
