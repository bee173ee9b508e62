// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Heating and Confinement
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Auxiliary heating, energy confinement, fusion and radiation power.
//!
//! Energy bookkeeping convention: stored energy W [MJ] and core
//! temperature T [keV] are related by W = 1.5·n·T·V.

use ndarray::Array1;
use plasma_types::config::{EcrhParams, MachineGeometry, RadiationParams};
use plasma_types::constants::{
    DENSITY_UNIT, E_FUSION_DT, KEV_TO_JOULES, MEGA, M_ELECTRON, Q_ELECTRON,
};
use plasma_types::state::PlasmaState;
use std::f64::consts::PI;

/// Minimum temperature in keV (below this σv is negligible).
const T_MIN_KEV: f64 = 0.1;

/// Density floor for per-particle conversions [10^20 m^-3].
pub const DENSITY_FLOOR: f64 = 1.0e-6;

/// Shortest confinement time the integrator accepts [s].
pub const CONFINEMENT_FLOOR: f64 = 1.0e-4;

/// IPB98(y,2) coefficient and exponents.
const IPB98_C: f64 = 0.0562;
const IPB98_CURRENT: f64 = 0.93;
const IPB98_FIELD: f64 = 0.15;
const IPB98_DENSITY: f64 = 0.41;
const IPB98_POWER: f64 = -0.69;
const IPB98_MAJOR: f64 = 1.97;
const IPB98_MINOR: f64 = 0.58;
const IPB98_ELONGATION: f64 = 0.78;

/// ECRH absorption and deposition for one gyrotron.
#[derive(Debug, Clone, PartialEq)]
pub struct EcrhDeposition {
    /// Electron cyclotron frequency on axis [Hz]
    pub resonance_frequency: f64,
    /// Absorbed fraction in [0, 1]
    pub absorption: f64,
    /// Absorbed power [MW]
    pub power_absorbed: f64,
    /// Absorbed power per radial bin [MW], sums to `power_absorbed`
    pub profile: Array1<f64>,
    /// Core electron heating rate implied by the absorbed power [keV/s]
    pub heating_rate: f64,
}

impl EcrhDeposition {
    /// Normalized radius of the deposition peak.
    pub fn peak_radius(&self) -> f64 {
        let n = self.profile.len();
        if n < 2 {
            return 0.0;
        }
        let (idx, _) = self
            .profile
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best });
        idx as f64 / (n - 1) as f64
    }
}

/// Electron cyclotron frequency f_ce = eB / (2π m_e) [Hz].
pub fn electron_cyclotron_frequency(field_t: f64) -> f64 {
    Q_ELECTRON * field_t / (2.0 * PI * M_ELECTRON)
}

/// Plasma volume of an elongated torus, V = 2π² R₀ a² κ [m³].
pub fn plasma_volume(geometry: &MachineGeometry, elongation: f64) -> f64 {
    2.0 * PI * PI * geometry.major_radius * geometry.minor_radius.powi(2) * elongation
}

/// Thermal energy [MJ] of a plasma at density n [10^20 m^-3] and
/// temperature T [keV] filling volume V.
pub fn stored_energy_mj(temperature_kev: f64, density: f64, volume: f64) -> f64 {
    1.5 * density * DENSITY_UNIT * volume * temperature_kev * KEV_TO_JOULES / MEGA
}

/// Core temperature [keV] implied by a stored energy [MJ].
///
/// The density is floored at [`DENSITY_FLOOR`].
pub fn core_temperature(stored_energy_mj: f64, density: f64, volume: f64) -> f64 {
    let particles = density.max(DENSITY_FLOOR) * DENSITY_UNIT * volume;
    stored_energy_mj * MEGA / (1.5 * particles * KEV_TO_JOULES)
}

/// ECRH absorption and radial deposition.
///
/// Absorption is `resonant_absorption` within `resonance_bandwidth` of the
/// on-axis cyclotron frequency and falls off as a Gaussian in frequency
/// mismatch outside it.
pub fn ecrh_heating_model(
    power_mw: f64,
    frequency_hz: f64,
    state: &PlasmaState,
    geometry: &MachineGeometry,
    params: &EcrhParams,
) -> EcrhDeposition {
    let resonance_frequency = electron_cyclotron_frequency(geometry.toroidal_field);
    let mismatch = frequency_hz - resonance_frequency;
    let absorption = if mismatch.abs() < params.resonance_bandwidth {
        params.resonant_absorption
    } else {
        params.off_resonance_absorption
            * (-mismatch * mismatch / (2.0 * params.spectral_variance)).exp()
    };
    let power_absorbed = power_mw.max(0.0) * absorption;

    let shape = Array1::linspace(0.0, 1.0, params.profile_points).mapv(|r: f64| {
        let d = r - params.deposition_center;
        (-d * d / params.deposition_width).exp()
    });
    let norm = shape.sum();
    let profile = if norm > 0.0 {
        shape * (power_absorbed / norm)
    } else {
        Array1::zeros(params.profile_points)
    };

    let volume = plasma_volume(geometry, state.elongation);
    let heating_rate = power_absorbed * MEGA
        / (1.5 * state.density_core.max(DENSITY_FLOOR) * DENSITY_UNIT * volume * KEV_TO_JOULES);

    EcrhDeposition {
        resonance_frequency,
        absorption,
        power_absorbed,
        profile,
        heating_rate,
    }
}

/// IPB98(y,2) energy confinement time [s].
///
/// τ_E = 0.0562 · I^0.93 · B^0.15 · n₁₉^0.41 · R^1.97 · a^0.58 · κ^0.78 · P^−0.69
///
/// Unclamped: zero heating power yields +∞, zero current or density 0.
pub fn energy_confinement_time(
    state: &PlasmaState,
    geometry: &MachineGeometry,
    heating_power_mw: f64,
) -> f64 {
    let n19 = 10.0 * state.density_core.max(0.0);
    IPB98_C
        * state.plasma_current.abs().powf(IPB98_CURRENT)
        * geometry.toroidal_field.powf(IPB98_FIELD)
        * n19.powf(IPB98_DENSITY)
        * geometry.major_radius.powf(IPB98_MAJOR)
        * geometry.minor_radius.powf(IPB98_MINOR)
        * state.elongation.max(0.0).powf(IPB98_ELONGATION)
        * heating_power_mw.max(0.0).powf(IPB98_POWER)
}

/// Confinement time used for energy loss, clamped to
/// [[`CONFINEMENT_FLOOR`], `cap`]. A NaN scaling falls back to `cap`.
pub fn effective_confinement_time(
    state: &PlasmaState,
    geometry: &MachineGeometry,
    heating_power_mw: f64,
    cap: f64,
) -> f64 {
    let tau = energy_confinement_time(state, geometry, heating_power_mw);
    if tau.is_nan() {
        cap
    } else {
        tau.max(CONFINEMENT_FLOOR).min(cap)
    }
}

/// Bosch-Hale D-T fusion reaction rate ⟨σv⟩ in m³/s.
///
/// NRL Plasma Formulary approximation, T clamped to 0.1 keV:
///   σv = 3.68e-18 / T^(2/3) × exp(-19.94 / T^(1/3))
pub fn bosch_hale_dt(t_kev: f64) -> f64 {
    let t = t_kev.max(T_MIN_KEV);
    3.68e-18 / t.powf(2.0 / 3.0) * (-19.94 / t.powf(1.0 / 3.0)).exp()
}

/// D-T neutron production rate for a 50:50 mix [n/s].
pub fn neutron_rate(state: &PlasmaState, geometry: &MachineGeometry) -> f64 {
    let n_fuel = 0.5 * state.density_core.max(0.0) * DENSITY_UNIT;
    let volume = plasma_volume(geometry, state.elongation);
    n_fuel * n_fuel * bosch_hale_dt(state.temperature_core) * volume
}

/// Fusion power carried by the neutron rate [MW].
pub fn fusion_power_mw(neutron_rate: f64) -> f64 {
    neutron_rate * E_FUSION_DT / MEGA
}

/// Bremsstrahlung with impurity enhancement [MW].
///
/// P = C_B·(1 + k·c)·n²·√T·V
pub fn radiation_power_mw(
    state: &PlasmaState,
    geometry: &MachineGeometry,
    params: &RadiationParams,
) -> f64 {
    let n = state.density_core.max(0.0) * DENSITY_UNIT;
    let enhancement = 1.0 + params.impurity_enhancement * state.impurity_concentration.max(0.0);
    let volume = plasma_volume(geometry, state.elongation);
    params.bremsstrahlung_coefficient
        * enhancement
        * n
        * n
        * state.temperature_core.max(0.0).sqrt()
        * volume
        / MEGA
}
