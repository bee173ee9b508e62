// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Safety and Mitigation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Disruption detection, risk prediction and mitigation decisions.
//!
//! Detection reuses [`check_limits`] for the q95, β_N and vertical checks so
//! the safety system and the phase sequencer never disagree on a limit.

use plasma_physics::stability::{check_limits, greenwald_density};
use plasma_types::config::MachineConfig;
use plasma_types::state::{
    DisruptionPrediction, InstabilitySource, MitigationAction, MitigationDecision, PlasmaState,
};
use serde::{Deserialize, Serialize};

/// Sources scored by [`SafetyMitigationSystem::predict`].
const PROXIMITY_SOURCES: [InstabilitySource; 6] = [
    InstabilitySource::LowSafetyFactor,
    InstabilitySource::BetaLimit,
    InstabilitySource::VerticalDisplacement,
    InstabilitySource::LockedMode,
    InstabilitySource::DensityLimit,
    InstabilitySource::Radiation,
];

/// Active disruption precursors of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisruptionFlags {
    pub locked_mode: bool,
    pub low_q: bool,
    pub vde: bool,
    pub beta_limit: bool,
    pub density_limit: bool,
    pub current_quench: bool,
    pub thermal_quench: bool,
}

impl DisruptionFlags {
    pub fn any(&self) -> bool {
        self.locked_mode
            || self.low_q
            || self.vde
            || self.beta_limit
            || self.density_limit
            || self.current_quench
            || self.thermal_quench
    }

    /// Events that leave no time for a control response.
    pub fn imminent(&self) -> bool {
        self.vde || self.current_quench || self.thermal_quench
    }

    fn imminent_source(&self) -> InstabilitySource {
        if self.vde {
            InstabilitySource::VerticalDisplacement
        } else if self.current_quench {
            InstabilitySource::CurrentQuench
        } else if self.thermal_quench {
            InstabilitySource::ThermalQuench
        } else {
            InstabilitySource::None
        }
    }
}

/// Arming state of the mitigation hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationReadiness {
    pub mgi: bool,
    pub pellet: bool,
    pub killer_pulse: bool,
    pub runaway: bool,
}

impl Default for MitigationReadiness {
    fn default() -> Self {
        MitigationReadiness {
            mgi: true,
            pellet: true,
            killer_pulse: true,
            runaway: true,
        }
    }
}

impl MitigationReadiness {
    pub fn any_ready(&self) -> bool {
        self.mgi || self.pellet || self.killer_pulse || self.runaway
    }

    pub fn none_ready() -> Self {
        MitigationReadiness {
            mgi: false,
            pellet: false,
            killer_pulse: false,
            runaway: false,
        }
    }
}

/// Measured rates that feed the quench detectors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuenchRates {
    /// dI_p/dt [MA/s]
    pub current: f64,
    /// dT_core/dt [keV/s]
    pub temperature: f64,
}

/// Map a limit ratio (value / limit) to a risk in [0, 1].
///
/// Zero below `onset`, one at or past the limit, linear in between. A NaN
/// ratio is treated as fully at risk.
fn proximity_risk(ratio: f64, onset: f64) -> f64 {
    if ratio.is_nan() {
        return 1.0;
    }
    ((ratio - onset) / (1.0 - onset)).clamp(0.0, 1.0)
}

/// Disruption detector and mitigation planner.
#[derive(Debug, Clone)]
pub struct SafetyMitigationSystem {
    config: MachineConfig,
    pub readiness: MitigationReadiness,
    flags: DisruptionFlags,
    previous_ratios: Option<(f64, [f64; 6])>,
    disruption_count: u32,
    mitigation_attempts: u32,
    mitigation_success_count: u32,
    last_disruption_time: Option<f64>,
}

impl SafetyMitigationSystem {
    pub fn new(config: &MachineConfig) -> Self {
        SafetyMitigationSystem {
            config: config.clone(),
            readiness: MitigationReadiness::default(),
            flags: DisruptionFlags::default(),
            previous_ratios: None,
            disruption_count: 0,
            mitigation_attempts: 0,
            mitigation_success_count: 0,
            last_disruption_time: None,
        }
    }

    pub fn flags(&self) -> DisruptionFlags {
        self.flags
    }

    /// Number of transitions from no active precursor to at least one.
    pub fn disruption_count(&self) -> u32 {
        self.disruption_count
    }

    pub fn mitigation_attempts(&self) -> u32 {
        self.mitigation_attempts
    }

    pub fn mitigation_success_count(&self) -> u32 {
        self.mitigation_success_count
    }

    pub fn last_disruption_time(&self) -> Option<f64> {
        self.last_disruption_time
    }

    /// Evaluate the precursor flags on a post-step state.
    pub fn evaluate(&mut self, state: &PlasmaState, rates: QuenchRates, time: f64) -> DisruptionFlags {
        let limits = &self.config.limits;
        let violations = check_limits(state, limits);
        let n_greenwald = greenwald_density(state.plasma_current, &self.config.geometry);
        let flags = DisruptionFlags {
            locked_mode: state.ntm_amplitude >= limits.locked_mode_width,
            low_q: violations.q95_low,
            vde: violations.vertical_excursion,
            beta_limit: violations.beta_high,
            density_limit: state.density_core > limits.greenwald_fraction_limit * n_greenwald,
            current_quench: rates.current < -limits.disruption_current_ramp,
            thermal_quench: rates.temperature < -limits.thermal_quench_rate,
        };
        if flags.any() && !self.flags.any() {
            self.disruption_count += 1;
            self.last_disruption_time = Some(time);
        }
        self.flags = flags;
        flags
    }

    fn limit_ratios(&self, state: &PlasmaState) -> [f64; 6] {
        let limits = &self.config.limits;
        let n_greenwald = greenwald_density(state.plasma_current, &self.config.geometry);
        [
            limits.q95_min / state.safety_factor_q95,
            state.beta_normalized / limits.beta_n_limit,
            state.vertical_position.abs() / limits.vertical_displacement_max,
            state.ntm_amplitude / limits.locked_mode_width,
            state.density_core / (limits.greenwald_fraction_limit * n_greenwald),
            state.radiation_power / limits.radiation_power_limit,
        ]
    }

    /// Combined disruption probability and the dominant source.
    ///
    /// Per-source risks rise linearly from `risk_onset_ratio` of a limit to
    /// the limit itself and combine as 1 − Π(1 − rᵢ). The time estimate
    /// extrapolates the dominant ratio's trend to 1; without an approaching
    /// trend it falls back to the warning time scaled by 1 − p.
    pub fn predict(&mut self, state: &PlasmaState, time: f64) -> DisruptionPrediction {
        let onset = self.config.safety.risk_onset_ratio;
        let ratios = self.limit_ratios(state);
        let risks = ratios.map(|r| proximity_risk(r, onset));

        let survival: f64 = risks.iter().map(|r| 1.0 - r).product();
        let probability = (1.0 - survival).clamp(0.0, 1.0);

        let (dominant_idx, dominant_risk) = risks
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0), |best, (i, r)| if r > best.1 { (i, r) } else { best });
        let dominant = if dominant_risk > 0.0 {
            PROXIMITY_SOURCES[dominant_idx]
        } else {
            InstabilitySource::None
        };

        let fallback = self.config.timing.disruption_warning_time * (1.0 - probability);
        let time_to_disruption = match self.previous_ratios {
            Some((t_prev, prev)) if dominant != InstabilitySource::None && time > t_prev => {
                let ratio = ratios[dominant_idx];
                let rate = (ratio - prev[dominant_idx]) / (time - t_prev);
                if rate > 0.0 && ratio.is_finite() {
                    ((1.0 - ratio) / rate).max(0.0)
                } else {
                    fallback
                }
            }
            _ => fallback,
        };
        self.previous_ratios = Some((time, ratios));

        DisruptionPrediction {
            probability,
            time_to_disruption,
            dominant,
        }
    }

    fn mass_injection(&self, prefer_pellet: bool) -> Option<MitigationAction> {
        let r = &self.readiness;
        match (prefer_pellet, r.mgi, r.pellet) {
            (true, _, true) | (false, false, true) => Some(MitigationAction::PelletInjection),
            (_, true, _) => Some(MitigationAction::GasInjection),
            _ => None,
        }
    }

    fn fastest_shutdown(&self) -> Option<MitigationAction> {
        let r = &self.readiness;
        if r.mgi && r.killer_pulse {
            Some(MitigationAction::CombinedMgiKillerPulse)
        } else if r.mgi {
            Some(MitigationAction::GasInjection)
        } else if r.killer_pulse {
            Some(MitigationAction::KillerPulse)
        } else if r.pellet {
            Some(MitigationAction::PelletInjection)
        } else {
            None
        }
    }

    /// Mitigation request for the current flags and risk.
    pub fn decide(
        &self,
        flags: &DisruptionFlags,
        prediction: &DisruptionPrediction,
    ) -> MitigationDecision {
        let p = prediction.probability;
        let safety = &self.config.safety;

        if flags.imminent() {
            let trigger = flags.imminent_source();
            return match self.fastest_shutdown() {
                Some(action) => MitigationDecision {
                    action,
                    urgency: 1.0,
                    note: format!("{trigger} imminent"),
                },
                None => MitigationDecision {
                    action: MitigationAction::None,
                    urgency: 1.0,
                    note: format!("{trigger} imminent, no mitigation system ready"),
                },
            };
        }

        if flags.locked_mode || flags.beta_limit || flags.low_q {
            let (source, adjustment) = if flags.locked_mode {
                (InstabilitySource::LockedMode, "apply ECCD at the island")
            } else if flags.beta_limit {
                (InstabilitySource::BetaLimit, "reduce heating power")
            } else {
                (InstabilitySource::LowSafetyFactor, "reduce plasma current")
            };
            if p > safety.mitigation_probability {
                if let Some(action) = self.mass_injection(flags.locked_mode) {
                    return MitigationDecision {
                        action,
                        urgency: p,
                        note: format!("{source} with p={p:.2}"),
                    };
                }
            }
            return MitigationDecision {
                action: MitigationAction::ControlAdjust,
                urgency: p,
                note: format!("{source}: {adjustment}"),
            };
        }

        if flags.density_limit {
            return MitigationDecision {
                action: MitigationAction::ControlAdjust,
                urgency: p,
                note: "density limit: reduce fueling".to_string(),
            };
        }

        if p >= safety.warning_probability {
            return MitigationDecision {
                action: MitigationAction::ControlAdjust,
                urgency: p,
                note: format!("elevated risk from {}", prediction.dominant),
            };
        }

        MitigationDecision::none()
    }

    /// Fastest available shutdown regardless of flags.
    pub fn emergency_decision(&self, note: String) -> MitigationDecision {
        MitigationDecision {
            action: self.fastest_shutdown().unwrap_or(MitigationAction::None),
            urgency: 1.0,
            note,
        }
    }

    /// Record a finished mitigation; success means the stored energy fell
    /// to the configured fraction of its onset value.
    pub fn record_mitigation_outcome(&mut self, final_energy_mj: f64, initial_energy_mj: f64) -> bool {
        self.mitigation_attempts += 1;
        let success = final_energy_mj
            <= self.config.scenario.mitigation_success_fraction * initial_energy_mj;
        if success {
            self.mitigation_success_count += 1;
        }
        success
    }
}
