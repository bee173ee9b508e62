// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Shot Runner
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Full-discharge driver and its summary report.

use crate::scenario::ShotController;
use crate::system::{PlasmaControlSystem, StepReport};
use plasma_types::error::{PlasmaError, PlasmaResult};
use plasma_types::state::{MitigationAction, OperationalPhase, PlasmaState};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// One recorded phase change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub time: f64,
    pub from: OperationalPhase,
    pub to: OperationalPhase,
}

/// Number of steps that produced each mitigation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub none: usize,
    pub gas_injection: usize,
    pub pellet_injection: usize,
    pub killer_pulse: usize,
    pub combined_mgi_killer_pulse: usize,
    pub control_adjust: usize,
}

impl DecisionCounts {
    pub fn record(&mut self, action: MitigationAction) {
        let slot = match action {
            MitigationAction::None => &mut self.none,
            MitigationAction::GasInjection => &mut self.gas_injection,
            MitigationAction::PelletInjection => &mut self.pellet_injection,
            MitigationAction::KillerPulse => &mut self.killer_pulse,
            MitigationAction::CombinedMgiKillerPulse => &mut self.combined_mgi_killer_pulse,
            MitigationAction::ControlAdjust => &mut self.control_adjust,
        };
        *slot += 1;
    }

    /// Steps that requested mitigation hardware.
    pub fn actuations(&self) -> usize {
        self.gas_injection + self.pellet_injection + self.killer_pulse + self.combined_mgi_killer_pulse
    }
}

/// Shot result metrics for analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotReport {
    pub machine: String,
    pub steps: usize,
    /// Simulated time covered [s]
    pub duration_s: f64,
    pub wall_time_ms: f64,
    pub max_step_time_us: f64,
    pub final_phase: OperationalPhase,
    pub final_state: PlasmaState,
    pub disrupted: bool,
    pub mitigated: bool,
    pub disruption_warning_time: Option<f64>,
    pub disruption_count: u32,
    pub mitigation_success_count: u32,
    pub rolled_back_steps: usize,
    pub peak_plasma_current: f64,
    pub min_q95: f64,
    pub max_beta_n: f64,
    pub max_abs_vertical_position: f64,
    pub max_mhd_activity: f64,
    pub peak_fusion_power_mw: f64,
    pub peak_fusion_gain: f64,
    /// Largest disruption force estimate seen during a quench [N]
    pub peak_disruption_force_n: f64,
    pub phases: Vec<PhaseChange>,
    pub decisions: DecisionCounts,
}

/// Running aggregate shared by the offline and real-time drivers.
#[derive(Debug, Clone)]
pub(crate) struct ShotRecorder {
    steps: usize,
    max_step_time_us: f64,
    rolled_back_steps: usize,
    peak_plasma_current: f64,
    min_q95: f64,
    max_beta_n: f64,
    max_abs_vertical_position: f64,
    max_mhd_activity: f64,
    peak_fusion_power_mw: f64,
    peak_fusion_gain: f64,
    peak_disruption_force_n: f64,
    phases: Vec<PhaseChange>,
    decisions: DecisionCounts,
    started: Instant,
}

impl ShotRecorder {
    pub(crate) fn start(initial: &PlasmaState) -> Self {
        ShotRecorder {
            steps: 0,
            max_step_time_us: 0.0,
            rolled_back_steps: 0,
            peak_plasma_current: initial.plasma_current,
            min_q95: initial.safety_factor_q95,
            max_beta_n: initial.beta_normalized,
            max_abs_vertical_position: initial.vertical_position.abs(),
            max_mhd_activity: initial.mhd_activity_level,
            peak_fusion_power_mw: 0.0,
            peak_fusion_gain: 0.0,
            peak_disruption_force_n: 0.0,
            phases: Vec::new(),
            decisions: DecisionCounts::default(),
            started: Instant::now(),
        }
    }

    pub(crate) fn observe(&mut self, report: &StepReport, step_time_us: f64, fusion_gain: f64) {
        let s = &report.state;
        self.steps += 1;
        self.max_step_time_us = self.max_step_time_us.max(step_time_us);
        self.rolled_back_steps += usize::from(report.rolled_back.is_some());
        self.peak_plasma_current = self.peak_plasma_current.max(s.plasma_current);
        self.min_q95 = self.min_q95.min(s.safety_factor_q95);
        self.max_beta_n = self.max_beta_n.max(s.beta_normalized);
        self.max_abs_vertical_position = self.max_abs_vertical_position.max(s.vertical_position.abs());
        self.max_mhd_activity = self.max_mhd_activity.max(s.mhd_activity_level);
        self.peak_fusion_power_mw = self.peak_fusion_power_mw.max(report.advance.fusion_power_mw);
        self.peak_fusion_gain = self.peak_fusion_gain.max(fusion_gain);
        self.peak_disruption_force_n =
            self.peak_disruption_force_n.max(report.advance.disruption_force_n);
        if let Some((from, to)) = report.transition {
            self.phases.push(PhaseChange {
                time: report.time,
                from,
                to,
            });
        }
        self.decisions.record(report.decision.action);
    }

    pub(crate) fn finish<R: Rng>(self, system: &PlasmaControlSystem<R>) -> ShotReport {
        let safety = system.safety();
        ShotReport {
            machine: system.config().machine_name.clone(),
            steps: self.steps,
            duration_s: system.time(),
            wall_time_ms: self.started.elapsed().as_secs_f64() * 1000.0,
            max_step_time_us: self.max_step_time_us,
            final_phase: system.phase(),
            final_state: *system.state(),
            disrupted: system.disruption_detected(),
            mitigated: system.mitigation_activated(),
            disruption_warning_time: system.disruption_warning_time(),
            disruption_count: safety.disruption_count(),
            mitigation_success_count: safety.mitigation_success_count(),
            rolled_back_steps: self.rolled_back_steps,
            peak_plasma_current: self.peak_plasma_current,
            min_q95: self.min_q95,
            max_beta_n: self.max_beta_n,
            max_abs_vertical_position: self.max_abs_vertical_position,
            max_mhd_activity: self.max_mhd_activity,
            peak_fusion_power_mw: self.peak_fusion_power_mw,
            peak_fusion_gain: self.peak_fusion_gain,
            peak_disruption_force_n: self.peak_disruption_force_n,
            phases: self.phases,
            decisions: self.decisions,
        }
    }
}

/// Number of `dt` steps covering `duration`, after validating both.
pub(crate) fn shot_steps(duration: f64, dt: f64) -> PlasmaResult<usize> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(PlasmaError::ConfigError(format!(
            "shot duration must be finite and > 0, got {duration}"
        )));
    }
    if !dt.is_finite() || dt <= 0.0 {
        return Err(PlasmaError::InvalidTimeStep(dt));
    }
    Ok((duration / dt).round().max(1.0) as usize)
}

/// Run `system` under `controller` for `duration` seconds of simulated time
/// or until SAFE_SHUTDOWN, whichever comes first.
pub fn run_shot<R: Rng, C: ShotController + ?Sized>(
    system: &mut PlasmaControlSystem<R>,
    duration: f64,
    dt: f64,
    controller: &mut C,
) -> PlasmaResult<ShotReport> {
    let steps = shot_steps(duration, dt)?;
    let mut recorder = ShotRecorder::start(system.state());
    for _ in 0..steps {
        if system.phase().is_terminal() {
            break;
        }
        let actuators = controller.actuate(&system.context(), dt);
        let t_step = Instant::now();
        let report = system.step(&actuators, dt)?;
        let step_us = t_step.elapsed().as_secs_f64() * 1_000_000.0;
        recorder.observe(&report, step_us, system.fusion_gain_q());
    }
    let report = recorder.finish(system);
    info!(
        steps = report.steps,
        duration_s = report.duration_s,
        final_phase = %report.final_phase,
        disrupted = report.disrupted,
        "shot complete"
    );
    Ok(report)
}
