// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{PlasmaError, PlasmaResult};
use serde::{Deserialize, Serialize};

/// Top-level machine configuration.
/// Maps 1:1 to `configs/compact_tokamak.json`. Every section is optional in
/// JSON and falls back to the compact-tokamak defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub machine_name: String,
    pub geometry: MachineGeometry,
    pub limits: StabilityLimits,
    pub timing: CharacteristicTimes,
    pub circuit: CircuitParams,
    pub vertical: VerticalParams,
    pub activity: ActivityParams,
    pub ntm: NtmParams,
    pub elm: ElmParams,
    pub quench: QuenchParams,
    pub ecrh: EcrhParams,
    pub force: ForceParams,
    pub radiation: RadiationParams,
    pub pedestal: PedestalFractions,
    pub actuators: ActuatorLayout,
    pub initial: InitialConditions,
    pub scenario: ScenarioParams,
    pub safety: SafetyParams,
    /// Capacity of the diagnostic ring buffer (samples).
    pub history_capacity: usize,
    /// Seed of the default noise generator.
    pub rng_seed: u64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            machine_name: "NPE-Compact".to_string(),
            geometry: MachineGeometry::default(),
            limits: StabilityLimits::default(),
            timing: CharacteristicTimes::default(),
            circuit: CircuitParams::default(),
            vertical: VerticalParams::default(),
            activity: ActivityParams::default(),
            ntm: NtmParams::default(),
            elm: ElmParams::default(),
            quench: QuenchParams::default(),
            ecrh: EcrhParams::default(),
            force: ForceParams::default(),
            radiation: RadiationParams::default(),
            pedestal: PedestalFractions::default(),
            actuators: ActuatorLayout::default(),
            initial: InitialConditions::default(),
            scenario: ScenarioParams::default(),
            safety: SafetyParams::default(),
            history_capacity: 1000,
            rng_seed: 42,
        }
    }
}

/// Static machine geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineGeometry {
    /// Major radius R0 [m]
    pub major_radius: f64,
    /// Minor radius a [m]
    pub minor_radius: f64,
    /// Toroidal field on axis B_t [T]
    pub toroidal_field: f64,
}

impl Default for MachineGeometry {
    fn default() -> Self {
        MachineGeometry {
            major_radius: 1.8,
            minor_radius: 0.6,
            toroidal_field: 5.3,
        }
    }
}

/// Operational stability and safety limits.
///
/// The q95, β_N and vertical-displacement bounds are the disruption
/// triggers; the remaining entries only feed the safety flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityLimits {
    pub q95_min: f64,
    pub q95_max: f64,
    pub beta_n_limit: f64,
    /// Maximum |Z| before a VDE is declared [m]
    pub vertical_displacement_max: f64,
    /// Current decay rate that counts as a current quench [MA/s]
    pub disruption_current_ramp: f64,
    /// Fraction of the Greenwald density that counts as the density limit
    pub greenwald_fraction_limit: f64,
    /// Normalized island width at which the mode is treated as locked
    pub locked_mode_width: f64,
    /// Radiated power limit [MW]
    pub radiation_power_limit: f64,
    /// Core temperature collapse rate that counts as a thermal quench [keV/s]
    pub thermal_quench_rate: f64,
}

impl Default for StabilityLimits {
    fn default() -> Self {
        StabilityLimits {
            q95_min: 3.0,
            q95_max: 5.0,
            beta_n_limit: 3.5,
            vertical_displacement_max: 0.15,
            disruption_current_ramp: 3.0,
            greenwald_fraction_limit: 1.0,
            locked_mode_width: 0.5,
            radiation_power_limit: 10.0,
            thermal_quench_rate: 1000.0,
        }
    }
}

/// Characteristic times [s].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacteristicTimes {
    pub current_rise_time: f64,
    /// Upper bound on the scaling-law confinement time, and its value when
    /// no heating power is applied.
    pub energy_confinement_time: f64,
    pub disruption_warning_time: f64,
    pub mitigation_response_time: f64,
    pub particle_confinement_time: f64,
    pub flat_top_duration: f64,
}

impl Default for CharacteristicTimes {
    fn default() -> Self {
        CharacteristicTimes {
            current_rise_time: 30.0,
            energy_confinement_time: 5.0,
            disruption_warning_time: 0.05,
            mitigation_response_time: 0.01,
            particle_confinement_time: 10.0,
            flat_top_duration: 5.0,
        }
    }
}

/// Lumped resistive-inductive plasma circuit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitParams {
    /// Plasma self-inductance L_p [H]
    pub plasma_inductance: f64,
    /// Plasma resistance R_p [Ω]
    pub plasma_resistance: f64,
    /// Loop voltage per unit primary PF coil current [V]
    pub loop_voltage_gain: f64,
}

impl Default for CircuitParams {
    fn default() -> Self {
        CircuitParams {
            plasma_inductance: 5.0e-7,
            plasma_resistance: 1.0e-6,
            loop_voltage_gain: 0.1,
        }
    }
}

/// Vertical position dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalParams {
    /// Force per (coil current × MA) [N]
    pub force_gain: f64,
    /// Linear velocity damping rate γ [1/s]
    pub damping_rate: f64,
}

impl Default for VerticalParams {
    fn default() -> Self {
        VerticalParams {
            force_gain: 0.1,
            damping_rate: 10.0,
        }
    }
}

/// MHD activity accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityParams {
    pub baseline_amplitude: f64,
    /// Angular frequency of the baseline oscillation [rad/s]
    pub baseline_frequency: f64,
    pub noise_amplitude: f64,
    pub q95_penalty: f64,
    pub beta_penalty: f64,
    pub vde_penalty: f64,
    /// Contribution per unit NTM island width
    pub ntm_weight: f64,
    /// Fraction of the previous activity carried into the next step, in
    /// [0, 1). Zero resets the accumulator every step.
    pub memory: f64,
}

impl Default for ActivityParams {
    fn default() -> Self {
        ActivityParams {
            baseline_amplitude: 0.1,
            baseline_frequency: 100.0,
            noise_amplitude: 0.05,
            q95_penalty: 0.5,
            beta_penalty: 0.3,
            vde_penalty: 0.7,
            ntm_weight: 0.5,
            memory: 0.0,
        }
    }
}

/// Modified-Rutherford NTM island model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NtmParams {
    /// Saturation width w_sat
    pub w_sat: f64,
    /// Classical stability index Δ'
    pub delta_prime: f64,
    /// Bootstrap drive per unit β_N
    pub bootstrap_drive: f64,
    /// Polarization-current damping
    pub polarization_damping: f64,
    /// Steepness of the logistic saturation rolloff
    pub saturation_sharpness: f64,
}

impl Default for NtmParams {
    fn default() -> Self {
        NtmParams {
            w_sat: 1.0,
            delta_prime: -0.5,
            bootstrap_drive: 0.2,
            polarization_damping: 0.1,
            saturation_sharpness: 10.0,
        }
    }
}

/// ELM cycle proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElmParams {
    pub frequency_coefficient: f64,
    pub base_amplitude: f64,
    pub modulation: f64,
}

impl Default for ElmParams {
    fn default() -> Self {
        ElmParams {
            frequency_coefficient: 0.1,
            base_amplitude: 0.05,
            modulation: 0.1,
        }
    }
}

/// Thermal and current quench decay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuenchParams {
    /// τ_TQ [s]
    pub thermal_time: f64,
    /// τ_CQ [s]
    pub current_time: f64,
    /// Residual-energy reduction per unit impurity concentration
    pub impurity_attenuation: f64,
    /// Linear resistive correction coefficient of the current quench
    pub resistive_correction: f64,
}

impl Default for QuenchParams {
    fn default() -> Self {
        QuenchParams {
            thermal_time: 1.0e-3,
            current_time: 1.0e-2,
            impurity_attenuation: 0.5,
            resistive_correction: 0.1,
        }
    }
}

/// Electron-cyclotron resonance heating absorption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcrhParams {
    /// Half-width of the resonant band [Hz]
    pub resonance_bandwidth: f64,
    pub resonant_absorption: f64,
    pub off_resonance_absorption: f64,
    /// Variance of the Gaussian off-resonance rolloff [Hz²]
    pub spectral_variance: f64,
    /// Normalized radius of peak deposition
    pub deposition_center: f64,
    /// Gaussian width parameter of the deposition profile
    pub deposition_width: f64,
    pub profile_points: usize,
}

impl Default for EcrhParams {
    fn default() -> Self {
        EcrhParams {
            resonance_bandwidth: 1.0e9,
            resonant_absorption: 0.8,
            off_resonance_absorption: 0.3,
            spectral_variance: 1.0e18,
            deposition_center: 0.5,
            deposition_width: 0.1,
            profile_points: 10,
        }
    }
}

/// Disruption force estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    /// Field per unit PF coil current per metre of major circumference [T·m]
    pub coil_field_scale: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        ForceParams {
            coil_field_scale: 1.0e-6,
        }
    }
}

/// Radiated power model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiationParams {
    /// Bremsstrahlung coefficient [W·m³·keV^-1/2]
    pub bremsstrahlung_coefficient: f64,
    /// Z_eff increase per unit impurity concentration
    pub impurity_enhancement: f64,
}

impl Default for RadiationParams {
    fn default() -> Self {
        RadiationParams {
            bremsstrahlung_coefficient: 5.35e-37,
            impurity_enhancement: 10.0,
        }
    }
}

/// Edge values as fractions of the core values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PedestalFractions {
    pub temperature: f64,
    pub density: f64,
}

impl Default for PedestalFractions {
    fn default() -> Self {
        PedestalFractions {
            temperature: 0.2,
            density: 0.6,
        }
    }
}

/// Number of actuator channels of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorLayout {
    pub num_pf_coils: usize,
    pub num_vertical_coils: usize,
    pub num_horizontal_coils: usize,
    pub num_heating_systems: usize,
}

impl Default for ActuatorLayout {
    fn default() -> Self {
        ActuatorLayout {
            num_pf_coils: 10,
            num_vertical_coils: 4,
            num_horizontal_coils: 4,
            num_heating_systems: 3,
        }
    }
}

/// Session start conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    pub plasma_current: f64,
    pub temperature_core: f64,
    pub density_core: f64,
    pub elongation: f64,
    pub triangularity: f64,
    pub li_inductance: f64,
    pub impurity_concentration: f64,
    pub ntm_amplitude: f64,
    pub vertical_position: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions {
            plasma_current: 0.5,
            temperature_core: 5.0,
            density_core: 1.0,
            elongation: 1.7,
            triangularity: 0.33,
            li_inductance: 1.0,
            impurity_concentration: 0.01,
            ntm_amplitude: 0.01,
            vertical_position: 0.0,
        }
    }
}

/// Discharge programme used by the phase sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    /// Flat-top plasma current [MA]
    pub plasma_current_target: f64,
    /// Fraction of the target at which ramp-up completes
    pub ramp_up_fraction: f64,
    /// Fraction of the target below which ramp-down ends the session
    pub shutdown_fraction: f64,
    /// Residual stored-energy fraction below which a mitigation counts as
    /// successful
    pub mitigation_success_fraction: f64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        ScenarioParams {
            plasma_current_target: 1.5,
            ramp_up_fraction: 0.95,
            shutdown_fraction: 0.05,
            mitigation_success_fraction: 0.1,
        }
    }
}

/// Disruption risk assessment thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyParams {
    /// Probability at which a disruption warning is raised
    pub warning_probability: f64,
    /// Probability at which mitigation hardware is fired pre-emptively
    pub mitigation_probability: f64,
    /// Limit ratio at which a source starts contributing risk
    pub risk_onset_ratio: f64,
}

impl Default for SafetyParams {
    fn default() -> Self {
        SafetyParams {
            warning_probability: 0.3,
            mitigation_probability: 0.7,
            risk_onset_ratio: 0.7,
        }
    }
}

fn require_positive(name: &str, value: f64) -> PlasmaResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PlasmaError::ConfigError(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(name: &str, value: f64) -> PlasmaResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlasmaError::ConfigError(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

fn require_fraction(name: &str, value: f64) -> PlasmaResult<()> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(PlasmaError::ConfigError(format!(
            "{name} must lie in (0, 1], got {value}"
        )));
    }
    Ok(())
}

fn require_unit_interval(name: &str, value: f64) -> PlasmaResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(PlasmaError::ConfigError(format!(
            "{name} must lie in [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl MachineConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> PlasmaResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter the models divide by or take powers of.
    pub fn validate(&self) -> PlasmaResult<()> {
        let g = &self.geometry;
        require_positive("geometry.major_radius", g.major_radius)?;
        require_positive("geometry.minor_radius", g.minor_radius)?;
        require_positive("geometry.toroidal_field", g.toroidal_field)?;
        if g.minor_radius >= g.major_radius {
            return Err(PlasmaError::ConfigError(format!(
                "minor radius {} must be smaller than major radius {}",
                g.minor_radius, g.major_radius
            )));
        }

        let l = &self.limits;
        require_positive("limits.q95_min", l.q95_min)?;
        if l.q95_max < l.q95_min {
            return Err(PlasmaError::ConfigError(format!(
                "limits.q95_max ({}) < limits.q95_min ({})",
                l.q95_max, l.q95_min
            )));
        }
        require_positive("limits.beta_n_limit", l.beta_n_limit)?;
        require_positive("limits.vertical_displacement_max", l.vertical_displacement_max)?;
        require_positive("limits.disruption_current_ramp", l.disruption_current_ramp)?;
        require_positive("limits.greenwald_fraction_limit", l.greenwald_fraction_limit)?;
        require_positive("limits.locked_mode_width", l.locked_mode_width)?;
        require_positive("limits.radiation_power_limit", l.radiation_power_limit)?;
        require_positive("limits.thermal_quench_rate", l.thermal_quench_rate)?;

        let t = &self.timing;
        require_positive("timing.current_rise_time", t.current_rise_time)?;
        require_positive("timing.energy_confinement_time", t.energy_confinement_time)?;
        require_positive("timing.disruption_warning_time", t.disruption_warning_time)?;
        require_non_negative("timing.mitigation_response_time", t.mitigation_response_time)?;
        require_positive("timing.particle_confinement_time", t.particle_confinement_time)?;
        require_non_negative("timing.flat_top_duration", t.flat_top_duration)?;

        require_positive("circuit.plasma_inductance", self.circuit.plasma_inductance)?;
        require_non_negative("circuit.plasma_resistance", self.circuit.plasma_resistance)?;
        require_non_negative("vertical.damping_rate", self.vertical.damping_rate)?;

        let a = &self.activity;
        if !a.memory.is_finite() || !(0.0..1.0).contains(&a.memory) {
            return Err(PlasmaError::ConfigError(format!(
                "activity.memory must lie in [0, 1), got {}",
                a.memory
            )));
        }
        require_non_negative("activity.q95_penalty", a.q95_penalty)?;
        require_non_negative("activity.beta_penalty", a.beta_penalty)?;
        require_non_negative("activity.vde_penalty", a.vde_penalty)?;
        require_non_negative("activity.noise_amplitude", a.noise_amplitude)?;

        require_positive("ntm.w_sat", self.ntm.w_sat)?;
        require_positive("quench.thermal_time", self.quench.thermal_time)?;
        require_positive("quench.current_time", self.quench.current_time)?;
        require_unit_interval("quench.impurity_attenuation", self.quench.impurity_attenuation)?;
        require_positive("ecrh.spectral_variance", self.ecrh.spectral_variance)?;
        require_positive("ecrh.deposition_width", self.ecrh.deposition_width)?;
        if self.ecrh.profile_points < 2 {
            return Err(PlasmaError::ConfigError(format!(
                "ecrh.profile_points must be >= 2, got {}",
                self.ecrh.profile_points
            )));
        }

        require_fraction("pedestal.temperature", self.pedestal.temperature)?;
        require_fraction("pedestal.density", self.pedestal.density)?;

        if self.actuators.num_pf_coils == 0 {
            return Err(PlasmaError::ConfigError(
                "actuators.num_pf_coils must be >= 1 (coil 0 drives the loop voltage)".to_string(),
            ));
        }

        let i = &self.initial;
        require_positive("initial.plasma_current", i.plasma_current)?;
        require_non_negative("initial.temperature_core", i.temperature_core)?;
        require_positive("initial.density_core", i.density_core)?;
        require_positive("initial.elongation", i.elongation)?;
        require_non_negative("initial.ntm_amplitude", i.ntm_amplitude)?;
        require_unit_interval("initial.impurity_concentration", i.impurity_concentration)?;

        let s = &self.scenario;
        require_positive("scenario.plasma_current_target", s.plasma_current_target)?;
        require_fraction("scenario.ramp_up_fraction", s.ramp_up_fraction)?;
        require_fraction("scenario.shutdown_fraction", s.shutdown_fraction)?;
        require_fraction(
            "scenario.mitigation_success_fraction",
            s.mitigation_success_fraction,
        )?;

        let p = &self.safety;
        require_fraction("safety.warning_probability", p.warning_probability)?;
        require_fraction("safety.mitigation_probability", p.mitigation_probability)?;
        if !p.risk_onset_ratio.is_finite() || !(0.0..1.0).contains(&p.risk_onset_ratio) {
            return Err(PlasmaError::ConfigError(format!(
                "safety.risk_onset_ratio must lie in [0, 1), got {}",
                p.risk_onset_ratio
            )));
        }

        if self.history_capacity == 0 {
            return Err(PlasmaError::ConfigError(
                "history_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
