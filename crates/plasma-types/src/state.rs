// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::config::{ActuatorLayout, MachineConfig};
use crate::error::{PlasmaError, PlasmaResult};
use serde::{Deserialize, Serialize};

/// Volume-averaged plasma snapshot at one time instant.
///
/// Mutated only by the state-advancement integrator, once per step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlasmaState {
    pub plasma_current: f64,         // [MA], signed only during current quench
    pub safety_factor_q95: f64,      // q at r/a = 0.95
    pub beta_normalized: f64,        // β_N [% m T / MA]
    pub li_inductance: f64,          // internal inductance ℓi
    pub radial_position: f64,        // [m]
    pub vertical_position: f64,      // [m]
    pub elongation: f64,             // κ
    pub triangularity: f64,          // δ
    pub temperature_core: f64,       // [keV]
    pub temperature_edge: f64,       // [keV]
    pub density_core: f64,           // [10^20 m^-3]
    pub density_edge: f64,           // [10^20 m^-3]
    pub mhd_activity_level: f64,     // dimensionless severity
    pub ntm_amplitude: f64,          // normalized island width
    pub elm_frequency: f64,          // [Hz]
    pub neutron_rate: f64,           // [n/s]
    pub impurity_concentration: f64, // fraction in [0, 1]
    pub radiation_power: f64,        // [MW]
}

impl PlasmaState {
    /// Session-start state from the configured initial conditions.
    ///
    /// Derived quantities (q95, β_N, rates) start at zero and are filled in
    /// by the first stability refresh.
    pub fn from_config(config: &MachineConfig) -> Self {
        let init = &config.initial;
        PlasmaState {
            plasma_current: init.plasma_current,
            li_inductance: init.li_inductance,
            radial_position: config.geometry.major_radius,
            vertical_position: init.vertical_position,
            elongation: init.elongation,
            triangularity: init.triangularity,
            temperature_core: init.temperature_core,
            temperature_edge: init.temperature_core * config.pedestal.temperature,
            density_core: init.density_core,
            density_edge: init.density_core * config.pedestal.density,
            ntm_amplitude: init.ntm_amplitude,
            impurity_concentration: init.impurity_concentration,
            ..PlasmaState::default()
        }
    }

    /// Name/value pairs of every scalar field.
    pub fn fields(&self) -> [(&'static str, f64); 18] {
        [
            ("plasma_current", self.plasma_current),
            ("safety_factor_q95", self.safety_factor_q95),
            ("beta_normalized", self.beta_normalized),
            ("li_inductance", self.li_inductance),
            ("radial_position", self.radial_position),
            ("vertical_position", self.vertical_position),
            ("elongation", self.elongation),
            ("triangularity", self.triangularity),
            ("temperature_core", self.temperature_core),
            ("temperature_edge", self.temperature_edge),
            ("density_core", self.density_core),
            ("density_edge", self.density_edge),
            ("mhd_activity_level", self.mhd_activity_level),
            ("ntm_amplitude", self.ntm_amplitude),
            ("elm_frequency", self.elm_frequency),
            ("neutron_rate", self.neutron_rate),
            ("impurity_concentration", self.impurity_concentration),
            ("radiation_power", self.radiation_power),
        ]
    }

    /// First field holding NaN or ±∞, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(name, _)| name)
    }

    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    /// Finite, with non-negative temperatures and densities.
    pub fn is_physical(&self) -> bool {
        self.is_finite()
            && self.temperature_core >= 0.0
            && self.temperature_edge >= 0.0
            && self.density_core >= 0.0
            && self.density_edge >= 0.0
    }
}

/// Heating method of one auxiliary heating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeatingKind {
    /// Electron-cyclotron resonance heating
    Ecrh,
    /// Ion-cyclotron resonance heating
    Icrh,
    /// Neutral beam injection
    Nbi,
}

/// Per-step command for one heating system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatingSystem {
    pub kind: HeatingKind,
    pub power: f64,     // [MW]
    pub frequency: f64, // [Hz], zero for beams
    pub enabled: bool,
}

impl HeatingSystem {
    pub fn new(kind: HeatingKind, power: f64, frequency: f64) -> Self {
        HeatingSystem {
            kind,
            power,
            frequency,
            enabled: true,
        }
    }

    /// Standard complement: ECRH at the on-axis fundamental resonance of a
    /// 5.3 T machine, 50 MHz ICRH, and a neutral beam.
    fn standard(index: usize) -> Self {
        let (kind, frequency) = match index % 3 {
            0 => (HeatingKind::Ecrh, 148.3e9),
            1 => (HeatingKind::Icrh, 50.0e6),
            _ => (HeatingKind::Nbi, 0.0),
        };
        HeatingSystem {
            kind,
            power: 0.0,
            frequency,
            enabled: false,
        }
    }
}

/// External actuator command consumed by one integration step.
///
/// Coil currents are in arbitrary normalized units; fuel injection is in
/// particles/s, impurity injection in concentration/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlActuators {
    pub pf_coil_currents: Vec<f64>,
    pub vertical_coil_currents: Vec<f64>,
    pub horizontal_coil_currents: Vec<f64>,
    pub heating: Vec<HeatingSystem>,
    pub fuel_injection_rate: f64,
    pub impurity_injection_rate: f64,
}

impl ControlActuators {
    /// All coils at zero, heating present but disabled, no fueling.
    pub fn idle(layout: &ActuatorLayout) -> Self {
        ControlActuators {
            pf_coil_currents: vec![0.0; layout.num_pf_coils],
            vertical_coil_currents: vec![0.0; layout.num_vertical_coils],
            horizontal_coil_currents: vec![0.0; layout.num_horizontal_coils],
            heating: (0..layout.num_heating_systems)
                .map(HeatingSystem::standard)
                .collect(),
            fuel_injection_rate: 0.0,
            impurity_injection_rate: 0.0,
        }
    }

    /// Sum of the powers of enabled heating systems [MW].
    pub fn total_heating_power(&self) -> f64 {
        self.heating
            .iter()
            .filter(|h| h.enabled)
            .map(|h| h.power)
            .sum()
    }

    /// Primary PF coil current (drives the loop voltage).
    pub fn primary_coil_current(&self) -> f64 {
        self.pf_coil_currents.first().copied().unwrap_or(0.0)
    }

    /// Verify vector lengths against the machine layout.
    pub fn check_layout(&self, layout: &ActuatorLayout) -> PlasmaResult<()> {
        let checks = [
            ("pf_coil_currents", layout.num_pf_coils, self.pf_coil_currents.len()),
            (
                "vertical_coil_currents",
                layout.num_vertical_coils,
                self.vertical_coil_currents.len(),
            ),
            (
                "horizontal_coil_currents",
                layout.num_horizontal_coils,
                self.horizontal_coil_currents.len(),
            ),
            ("heating", layout.num_heating_systems, self.heating.len()),
        ];
        for (channel, expected, actual) in checks {
            if expected != actual {
                return Err(PlasmaError::ActuatorLayout {
                    channel,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Disruption onset snapshot driving the quench models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuenchOnset {
    pub onset_time: f64,        // [s]
    pub initial_energy_mj: f64, // [MJ]
    pub initial_current_ma: f64, // [MA]
}

/// Integrator bookkeeping that is not part of the plasma snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlantState {
    pub stored_energy_mj: f64,        // [MJ]
    pub vertical_velocity: f64,       // [m/s]
    pub energy_confinement_time: f64, // [s], last effective τ_E
    /// Set once a disruption is declared; energy and current then follow
    /// the quench models.
    pub quench: Option<QuenchOnset>,
}

/// Limit checks shared by the activity accumulator, the phase sequencer
/// and the safety system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LimitViolations {
    pub q95_low: bool,
    pub beta_high: bool,
    pub vertical_excursion: bool,
}

impl LimitViolations {
    pub fn any(&self) -> bool {
        self.q95_low || self.beta_high || self.vertical_excursion
    }
}

/// Operational phase of the discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationalPhase {
    #[default]
    Init,
    RampUp,
    FlatTop,
    RampDown,
    Disruption,
    Mitigation,
    SafeShutdown,
}

impl OperationalPhase {
    pub fn is_terminal(self) -> bool {
        self == OperationalPhase::SafeShutdown
    }

    /// Phases from which a limit violation forces a disruption.
    pub fn is_nominal(self) -> bool {
        matches!(
            self,
            OperationalPhase::Init
                | OperationalPhase::RampUp
                | OperationalPhase::FlatTop
                | OperationalPhase::RampDown
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationalPhase::Init => "INIT",
            OperationalPhase::RampUp => "RAMP_UP",
            OperationalPhase::FlatTop => "FLAT_TOP",
            OperationalPhase::RampDown => "RAMP_DOWN",
            OperationalPhase::Disruption => "DISRUPTION",
            OperationalPhase::Mitigation => "MITIGATION",
            OperationalPhase::SafeShutdown => "SAFE_SHUTDOWN",
        }
    }
}

impl std::fmt::Display for OperationalPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mitigation actuation requested from the external safety collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MitigationAction {
    #[default]
    None,
    /// Massive gas injection
    GasInjection,
    PelletInjection,
    KillerPulse,
    CombinedMgiKillerPulse,
    /// Adjust normal control setpoints instead of firing hardware
    ControlAdjust,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MitigationDecision {
    pub action: MitigationAction,
    /// Urgency in [0, 1]
    pub urgency: f64,
    pub note: String,
}

impl MitigationDecision {
    pub fn none() -> Self {
        MitigationDecision::default()
    }

    pub fn is_actuation(&self) -> bool {
        !matches!(
            self.action,
            MitigationAction::None | MitigationAction::ControlAdjust
        )
    }
}

/// Instability driving a disruption risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InstabilitySource {
    #[default]
    None,
    LowSafetyFactor,
    BetaLimit,
    VerticalDisplacement,
    LockedMode,
    DensityLimit,
    Radiation,
    ThermalQuench,
    CurrentQuench,
}

impl InstabilitySource {
    pub fn as_str(self) -> &'static str {
        match self {
            InstabilitySource::None => "none",
            InstabilitySource::LowSafetyFactor => "low q95",
            InstabilitySource::BetaLimit => "beta limit",
            InstabilitySource::VerticalDisplacement => "vertical displacement",
            InstabilitySource::LockedMode => "locked mode",
            InstabilitySource::DensityLimit => "density limit",
            InstabilitySource::Radiation => "radiation",
            InstabilitySource::ThermalQuench => "thermal quench",
            InstabilitySource::CurrentQuench => "current quench",
        }
    }
}

impl std::fmt::Display for InstabilitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral disruption risk assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisruptionPrediction {
    /// Probability in [0, 1]
    pub probability: f64,
    /// Estimated time to disruption [s]
    pub time_to_disruption: f64,
    pub dominant: InstabilitySource,
}
