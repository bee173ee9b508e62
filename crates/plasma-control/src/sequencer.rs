// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Phase Sequencer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Operational phase transitions.
//!
//! INIT → RAMP_UP → FLAT_TOP → RAMP_DOWN → SAFE_SHUTDOWN on the nominal
//! path; any nominal phase drops to DISRUPTION on a limit violation or a
//! non-finite step, then DISRUPTION → MITIGATION → SAFE_SHUTDOWN.

use plasma_types::config::MachineConfig;
use plasma_types::state::{LimitViolations, OperationalPhase};

/// Everything a transition decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseInputs {
    /// Simulation time at the end of the step [s]
    pub time: f64,
    /// Time the current phase was entered [s]
    pub phase_entered_at: f64,
    /// Target flat-top current [MA]
    pub current_target: f64,
    pub plasma_current: f64,
    pub violations: LimitViolations,
    /// The step produced a non-finite state
    pub non_finite: bool,
    /// Any mitigation system is armed
    pub mitigation_ready: bool,
}

/// Phase after one step.
pub fn next_phase(
    phase: OperationalPhase,
    inputs: &PhaseInputs,
    config: &MachineConfig,
) -> OperationalPhase {
    use OperationalPhase::*;

    if phase.is_nominal() && (inputs.non_finite || inputs.violations.any()) {
        return Disruption;
    }

    let in_phase = inputs.time - inputs.phase_entered_at;
    let scenario = &config.scenario;
    match phase {
        Init => RampUp,
        RampUp if inputs.plasma_current >= scenario.ramp_up_fraction * inputs.current_target => {
            FlatTop
        }
        FlatTop if in_phase >= config.timing.flat_top_duration => RampDown,
        RampDown
            if inputs.plasma_current.abs()
                <= scenario.shutdown_fraction * inputs.current_target =>
        {
            SafeShutdown
        }
        Disruption if inputs.mitigation_ready => Mitigation,
        Mitigation if in_phase >= config.timing.mitigation_response_time => SafeShutdown,
        other => other,
    }
}
