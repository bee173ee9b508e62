// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Plasma Control System
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The control-loop aggregate.
//!
//! Owns the current and target plasma states, the last applied actuator
//! commands, the integrator, the safety system, the phase and the diagnostic
//! history. Each [`PlasmaControlSystem::step`] advances all
//! of them by exactly one `dt`:
//!
//! 1. Reject an invalid `dt`, a mismatched actuator layout, or a session
//!    already in SAFE_SHUTDOWN.
//! 2. Snapshot, integrate, and roll back to the snapshot if any state field
//!    came out non-finite.
//! 3. Evaluate disruption flags, risk and the mitigation decision.
//! 4. Sequence the phase; entering DISRUPTION starts the quench models.
//! 5. Append a history sample.

use crate::history::{DiagnosticHistory, HistorySample};
use crate::safety::{DisruptionFlags, QuenchRates, SafetyMitigationSystem};
use crate::scenario::ControlContext;
use crate::sequencer::{next_phase, PhaseInputs};
use plasma_physics::integrator::{AdvanceReport, PlasmaIntegrator};
use plasma_physics::stability::check_limits;
use plasma_types::config::MachineConfig;
use plasma_types::error::{PlasmaError, PlasmaResult};
use plasma_types::state::{
    ControlActuators, DisruptionPrediction, LimitViolations, MitigationDecision,
    OperationalPhase, PlantState, PlasmaState, QuenchOnset,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

/// Outcome of one control step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Simulation time at the end of the step [s]
    pub time: f64,
    pub phase: OperationalPhase,
    /// (from, to) when the phase changed this step
    pub transition: Option<(OperationalPhase, OperationalPhase)>,
    pub state: PlasmaState,
    pub flags: DisruptionFlags,
    pub prediction: DisruptionPrediction,
    pub decision: MitigationDecision,
    pub advance: AdvanceReport,
    /// First non-finite field if the step was rolled back
    pub rolled_back: Option<&'static str>,
}

/// Single-owner plasma control aggregate.
pub struct PlasmaControlSystem<R: Rng = ChaCha8Rng> {
    config: MachineConfig,
    integrator: PlasmaIntegrator<R>,
    safety: SafetyMitigationSystem,
    history: DiagnosticHistory,
    state: PlasmaState,
    target: PlasmaState,
    actuators: ControlActuators,
    plant: PlantState,
    phase: OperationalPhase,
    phase_entered_at: f64,
    time: f64,
    step_count: u64,
    disruption_detected: bool,
    mitigation_activated: bool,
    disruption_warning_time: Option<f64>,
    fusion_gain_q: f64,
}

impl PlasmaControlSystem<ChaCha8Rng> {
    /// Validated system with noise seeded from `config.rng_seed`.
    pub fn new(config: MachineConfig) -> PlasmaResult<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> PlasmaControlSystem<R> {
    pub fn with_rng(config: MachineConfig, rng: R) -> PlasmaResult<Self> {
        config.validate()?;
        let integrator = PlasmaIntegrator::with_rng(config.clone(), rng);
        let mut state = PlasmaState::from_config(&config);
        let plant = integrator.prime(&mut state);
        let target = PlasmaState {
            plasma_current: config.scenario.plasma_current_target,
            ..state
        };
        info!(
            machine = %config.machine_name,
            ip_ma = state.plasma_current,
            q95 = state.safety_factor_q95,
            "plasma control system initialised"
        );
        Ok(PlasmaControlSystem {
            safety: SafetyMitigationSystem::new(&config),
            history: DiagnosticHistory::new(config.history_capacity),
            actuators: ControlActuators::idle(&config.actuators),
            config,
            integrator,
            state,
            target,
            plant,
            phase: OperationalPhase::Init,
            phase_entered_at: 0.0,
            time: 0.0,
            step_count: 0,
            disruption_detected: false,
            mitigation_activated: false,
            disruption_warning_time: None,
            fusion_gain_q: 0.0,
        })
    }

    /// Flat-top current target [MA].
    pub fn set_target(&mut self, plasma_current_ma: f64) -> PlasmaResult<()> {
        if !plasma_current_ma.is_finite() || plasma_current_ma <= 0.0 {
            return Err(PlasmaError::ConfigError(format!(
                "plasma current target must be finite and > 0, got {plasma_current_ma}"
            )));
        }
        self.target.plasma_current = plasma_current_ma;
        Ok(())
    }

    /// Replace the whole target state. Its plasma current becomes the
    /// flat-top target.
    pub fn set_target_state(&mut self, target: PlasmaState) -> PlasmaResult<()> {
        if let Some(field) = target.first_non_finite() {
            return Err(PlasmaError::ConfigError(format!(
                "target state has non-finite {field}"
            )));
        }
        if target.plasma_current <= 0.0 {
            return Err(PlasmaError::ConfigError(format!(
                "target plasma current must be > 0, got {}",
                target.plasma_current
            )));
        }
        self.target = target;
        Ok(())
    }

    /// Replace the plasma state, recomputing its derived fields and the
    /// stored energy. Any running quench is kept.
    pub fn reset_state(&mut self, mut state: PlasmaState) -> PlasmaResult<()> {
        if let Some(field) = state.first_non_finite() {
            return Err(PlasmaError::PhysicsViolation(format!(
                "replacement state has non-finite {field}"
            )));
        }
        let quench = self.plant.quench;
        self.plant = self.integrator.prime(&mut state);
        self.plant.quench = quench;
        self.state = state;
        Ok(())
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn state(&self) -> &PlasmaState {
        &self.state
    }

    pub fn plant(&self) -> &PlantState {
        &self.plant
    }

    pub fn phase(&self) -> OperationalPhase {
        self.phase
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn target(&self) -> &PlasmaState {
        &self.target
    }

    /// Flat-top current target [MA].
    pub fn current_target(&self) -> f64 {
        self.target.plasma_current
    }

    /// Actuator commands applied by the last accepted step; idle before the
    /// first step.
    pub fn actuators(&self) -> &ControlActuators {
        &self.actuators
    }

    pub fn history(&self) -> &DiagnosticHistory {
        &self.history
    }

    pub fn safety(&self) -> &SafetyMitigationSystem {
        &self.safety
    }

    pub fn safety_mut(&mut self) -> &mut SafetyMitigationSystem {
        &mut self.safety
    }

    pub fn disruption_detected(&self) -> bool {
        self.disruption_detected
    }

    pub fn mitigation_activated(&self) -> bool {
        self.mitigation_activated
    }

    /// Simulation time at which a disruption warning was first raised.
    pub fn disruption_warning_time(&self) -> Option<f64> {
        self.disruption_warning_time
    }

    /// P_fusion / P_heating of the last step, zero without heating.
    pub fn fusion_gain_q(&self) -> f64 {
        self.fusion_gain_q
    }

    /// Snapshot handed to a controller before the next step.
    pub fn context(&self) -> ControlContext {
        ControlContext {
            time: self.time,
            phase: self.phase,
            state: self.state,
            current_target: self.target.plasma_current,
        }
    }

    /// Advance the whole aggregate by one `dt`.
    pub fn step(&mut self, actuators: &ControlActuators, dt: f64) -> PlasmaResult<StepReport> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PlasmaError::InvalidTimeStep(dt));
        }
        actuators.check_layout(&self.config.actuators)?;
        if self.phase.is_terminal() {
            return Err(PlasmaError::SessionTerminated { time_s: self.time });
        }

        self.actuators.clone_from(actuators);
        let snapshot = (self.state, self.plant);
        let advance =
            self.integrator
                .advance(&mut self.state, &mut self.plant, actuators, self.time, dt);
        let rolled_back = self.state.first_non_finite();
        if let Some(field) = rolled_back {
            error!(
                time = self.time,
                field,
                "non-finite state after integration, rolling back"
            );
            (self.state, self.plant) = snapshot;
        }
        self.time += dt;
        self.step_count += 1;

        // Safety
        let rates = if rolled_back.is_some() {
            QuenchRates::default()
        } else {
            QuenchRates {
                current: advance.current_ramp_rate,
                temperature: advance.temperature_rate,
            }
        };
        let flags = self.safety.evaluate(&self.state, rates, self.time);
        let prediction = self.safety.predict(&self.state, self.time);
        let decision = match rolled_back {
            Some(field) => self
                .safety
                .emergency_decision(format!("non-finite {field}, state rolled back")),
            None => self.safety.decide(&flags, &prediction),
        };

        // Phase
        let violations = if rolled_back.is_some() {
            check_limits(&self.state, &self.config.limits)
        } else {
            advance.violations
        };
        let inputs = PhaseInputs {
            time: self.time,
            phase_entered_at: self.phase_entered_at,
            current_target: self.target.plasma_current,
            plasma_current: self.state.plasma_current,
            violations,
            non_finite: rolled_back.is_some(),
            mitigation_ready: self.safety.readiness.any_ready(),
        };
        let next = next_phase(self.phase, &inputs, &self.config);
        let transition = (next != self.phase).then_some((self.phase, next));
        if let Some((from, to)) = transition {
            self.enter_phase(from, to, &violations);
        }

        let warning_raised = prediction.probability >= self.config.safety.warning_probability
            || self.phase == OperationalPhase::Disruption;
        if warning_raised && self.disruption_warning_time.is_none() {
            warn!(
                time = self.time,
                probability = prediction.probability,
                dominant = %prediction.dominant,
                "disruption warning"
            );
            self.disruption_warning_time = Some(self.time);
        }
        if decision.is_actuation() {
            warn!(
                action = ?decision.action,
                urgency = decision.urgency,
                note = %decision.note,
                "mitigation requested"
            );
        }

        self.fusion_gain_q = if advance.heating_power_mw > 0.0 {
            advance.fusion_power_mw / advance.heating_power_mw
        } else {
            0.0
        };
        self.history
            .record(&HistorySample::capture(self.time, &self.state, &self.plant));
        debug!(
            time = self.time,
            phase = %self.phase,
            ip_ma = self.state.plasma_current,
            q95 = self.state.safety_factor_q95,
            activity = self.state.mhd_activity_level,
            "step"
        );

        Ok(StepReport {
            time: self.time,
            phase: self.phase,
            transition,
            state: self.state,
            flags,
            prediction,
            decision,
            advance,
            rolled_back,
        })
    }

    fn enter_phase(
        &mut self,
        from: OperationalPhase,
        to: OperationalPhase,
        violations: &LimitViolations,
    ) {
        if from == OperationalPhase::Mitigation {
            if let Some(onset) = self.plant.quench {
                let success = self
                    .safety
                    .record_mitigation_outcome(self.plant.stored_energy_mj, onset.initial_energy_mj);
                info!(
                    time = self.time,
                    success,
                    stored_energy_mj = self.plant.stored_energy_mj,
                    "mitigation finished"
                );
            }
        }
        match to {
            OperationalPhase::Disruption => {
                self.disruption_detected = true;
                self.plant.quench = Some(QuenchOnset {
                    onset_time: self.time,
                    initial_energy_mj: self.plant.stored_energy_mj,
                    initial_current_ma: self.state.plasma_current,
                });
                warn!(
                    time = self.time,
                    q95_low = violations.q95_low,
                    beta_high = violations.beta_high,
                    vertical_excursion = violations.vertical_excursion,
                    "disruption declared"
                );
            }
            OperationalPhase::Mitigation => self.mitigation_activated = true,
            _ => {}
        }
        info!(time = self.time, from = %from, to = %to, "phase transition");
        self.phase = to;
        self.phase_entered_at = self.time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasma_types::state::MitigationAction;

    fn system() -> PlasmaControlSystem {
        PlasmaControlSystem::new(MachineConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = MachineConfig::default();
        cfg.geometry.minor_radius = -1.0;
        assert!(PlasmaControlSystem::new(cfg).is_err());
    }

    #[test]
    fn test_first_step_enters_ramp_up() {
        let mut sys = system();
        let idle = ControlActuators::idle(&sys.config().actuators);
        let report = sys.step(&idle, 1e-3).unwrap();
        assert_eq!(
            report.transition,
            Some((OperationalPhase::Init, OperationalPhase::RampUp))
        );
        assert_eq!(sys.phase(), OperationalPhase::RampUp);
        assert_eq!(sys.history().len(), 1);
        assert!((sys.time() - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_dt_rejected() {
        let mut sys = system();
        let idle = ControlActuators::idle(&sys.config().actuators);
        for dt in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            assert!(matches!(sys.step(&idle, dt), Err(PlasmaError::InvalidTimeStep(_))));
        }
        assert_eq!(sys.step_count(), 0);
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let mut sys = system();
        let mut act = ControlActuators::idle(&sys.config().actuators);
        act.vertical_coil_currents.pop();
        let err = sys.step(&act, 1e-3).unwrap_err();
        assert!(matches!(
            err,
            PlasmaError::ActuatorLayout {
                channel: "vertical_coil_currents",
                ..
            }
        ));
    }

    #[test]
    fn test_set_target_validates() {
        let mut sys = system();
        assert!(sys.set_target(0.0).is_err());
        assert!(sys.set_target(f64::NAN).is_err());
        sys.set_target(1.2).unwrap();
        assert_eq!(sys.current_target(), 1.2);
        assert_eq!(sys.target().plasma_current, 1.2);
    }

    #[test]
    fn test_target_state_defaults_to_scenario_current() {
        let mut sys = system();
        assert_eq!(sys.target().plasma_current, 1.5);
        assert_eq!(sys.target().density_core, sys.state().density_core);

        let mut target = *sys.target();
        target.plasma_current = 2.0;
        target.density_core = 0.8;
        sys.set_target_state(target).unwrap();
        assert_eq!(sys.current_target(), 2.0);
        assert_eq!(sys.context().current_target, 2.0);
        assert_eq!(sys.target().density_core, 0.8);

        target.plasma_current = 0.0;
        assert!(sys.set_target_state(target).is_err());
        target.plasma_current = 1.0;
        target.beta_normalized = f64::NAN;
        assert!(sys.set_target_state(target).is_err());
        assert_eq!(sys.current_target(), 2.0);
    }

    #[test]
    fn test_applied_actuators_are_kept() {
        let mut sys = system();
        let idle = ControlActuators::idle(&sys.config().actuators);
        assert_eq!(sys.actuators(), &idle);

        let mut act = idle.clone();
        act.pf_coil_currents[0] = 12.5;
        act.fuel_injection_rate = 1.0e20;
        sys.step(&act, 1e-3).unwrap();
        assert_eq!(sys.actuators(), &act);

        let mut bad = act.clone();
        bad.heating.pop();
        assert!(sys.step(&bad, 1e-3).is_err());
        assert_eq!(sys.actuators(), &act);
    }

    #[test]
    fn test_non_finite_step_rolls_back_and_disrupts() {
        let mut sys = system();
        let before = *sys.state();
        let mut act = ControlActuators::idle(&sys.config().actuators);
        act.pf_coil_currents[0] = f64::NAN;
        let report = sys.step(&act, 1e-3).unwrap();
        assert_eq!(report.rolled_back, Some("plasma_current"));
        assert_eq!(report.state, before);
        assert_eq!(sys.phase(), OperationalPhase::Disruption);
        assert!(sys.disruption_detected());
        assert_eq!(report.decision.action, MitigationAction::CombinedMgiKillerPulse);
        assert!(sys.plant().quench.is_some());
        assert_eq!(sys.disruption_warning_time(), Some(report.time));
    }

    #[test]
    fn test_reset_state_rejects_non_finite() {
        let mut sys = system();
        let mut state = *sys.state();
        state.temperature_core = f64::INFINITY;
        assert!(sys.reset_state(state).is_err());
    }

    #[test]
    fn test_fusion_gain_tracks_heating() {
        let mut sys = system();
        let mut act = ControlActuators::idle(&sys.config().actuators);
        sys.step(&act, 1e-3).unwrap();
        assert_eq!(sys.fusion_gain_q(), 0.0);
        act.heating[2].power = 10.0;
        act.heating[2].enabled = true;
        let report = sys.step(&act, 1e-3).unwrap();
        let expected = report.advance.fusion_power_mw / 10.0;
        assert!((sys.fusion_gain_q() - expected).abs() < 1e-15);
    }
}
