// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Instability Models
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reduced instability models: NTM island growth, ELM cycling, thermal and
//! current quench, and the disruption force proxy.
//!
//! All functions are pure; time arguments are measured from the relevant
//! onset and clamped at zero.

use crate::stability::poloidal_field;
use plasma_types::config::{ElmParams, ForceParams, MachineGeometry, NtmParams, QuenchParams};
use plasma_types::constants::{MEGA, MU0_SI};
use plasma_types::state::PlasmaState;
use std::f64::consts::PI;

/// Coefficients of the modified Rutherford equation for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandDrive {
    /// Saturation width w_sat
    pub w_sat: f64,
    /// Classical stability index Δ'
    pub delta_prime: f64,
    /// Bootstrap drive α
    pub bootstrap: f64,
    /// Polarization damping β
    pub polarization: f64,
    /// Steepness of the logistic saturation
    pub sharpness: f64,
}

impl IslandDrive {
    /// Drive with the bootstrap term scaled by the current normalized beta.
    pub fn from_params(params: &NtmParams, beta_normalized: f64) -> Self {
        IslandDrive {
            w_sat: params.w_sat,
            delta_prime: params.delta_prime,
            bootstrap: params.bootstrap_drive * beta_normalized.max(0.0),
            polarization: params.polarization_damping,
            sharpness: params.saturation_sharpness,
        }
    }
}

/// One explicit step of the modified Rutherford equation.
///
/// dw/dt = Δ'w + αw/(1 + |w|³) − βw, throttled by the logistic factor
/// 1/(1 + exp(k(w − w_sat))) so that growth stalls past w_sat.
pub fn ntm_island_growth(w: f64, drive: &IslandDrive, dt: f64) -> f64 {
    let bootstrap = drive.bootstrap * w / (1.0 + w.abs().powi(3));
    let growth = drive.delta_prime * w + bootstrap - drive.polarization * w;
    let saturation = 1.0 / (1.0 + (drive.sharpness * (w - drive.w_sat)).exp());
    w + dt * growth * saturation
}

/// Nonzero equilibrium width of the Rutherford drive, if any.
///
/// Solves Δ' + α/(1 + w³) − β = 0 for w > 0.
pub fn island_equilibrium_width(drive: &IslandDrive) -> Option<f64> {
    let net_decay = drive.polarization - drive.delta_prime;
    if net_decay <= 0.0 || drive.bootstrap <= net_decay {
        return None;
    }
    Some((drive.bootstrap / net_decay - 1.0).cbrt())
}

/// ELM repetition frequency f = c·√(p_ped / I_ped) [Hz].
///
/// Returns zero for a non-positive pedestal pressure or current.
pub fn elm_frequency(pedestal_pressure: f64, pedestal_current: f64, params: &ElmParams) -> f64 {
    if pedestal_pressure <= 0.0 || pedestal_current <= 0.0 {
        return 0.0;
    }
    params.frequency_coefficient * (pedestal_pressure / pedestal_current).sqrt()
}

/// Periodic ELM amplitude a₀ + a₁·sin(2π f t).
pub fn elm_cycle_model(
    time: f64,
    pedestal_pressure: f64,
    pedestal_current: f64,
    params: &ElmParams,
) -> f64 {
    let f = elm_frequency(pedestal_pressure, pedestal_current, params);
    params.base_amplitude + params.modulation * (2.0 * PI * f * time).sin()
}

/// Stored energy during a thermal quench [MJ].
///
/// W(t) = W₀·exp(−t/τ_TQ)·(1 − k·c), with the impurity concentration c
/// clamped to [0, 1]. The residual never goes below zero.
pub fn thermal_quench_model(
    time: f64,
    initial_energy_mj: f64,
    impurity_concentration: f64,
    params: &QuenchParams,
) -> f64 {
    let t = time.max(0.0);
    let attenuation =
        (1.0 - params.impurity_attenuation * impurity_concentration.clamp(0.0, 1.0)).max(0.0);
    initial_energy_mj * (-t / params.thermal_time).exp() * attenuation
}

/// Plasma current during a current quench [MA].
///
/// I(t) = I₀·exp(−t/τ_CQ)·(1 − k·R·t). The linear resistive correction can
/// drive the current through zero for large R·t.
pub fn current_quench_model(
    time: f64,
    initial_current_ma: f64,
    plasma_resistance: f64,
    params: &QuenchParams,
) -> f64 {
    let t = time.max(0.0);
    initial_current_ma
        * (-t / params.current_time).exp()
        * (1.0 - params.resistive_correction * plasma_resistance * t)
}

/// Disruption force estimate [N], always non-negative.
///
/// Lorentz term from the current decay rate crossing the PF coil field,
/// plus the magnetic pressure B²/(2μ₀) acting over the minor radius.
pub fn calculate_disruption_force(
    state: &PlasmaState,
    pf_coil_currents: &[f64],
    geometry: &MachineGeometry,
    quench: &QuenchParams,
    params: &ForceParams,
) -> f64 {
    let plasma_current_ma = state.plasma_current;
    let current_decay_rate = -plasma_current_ma * MEGA / quench.current_time;
    let coil_field: f64 = pf_coil_currents
        .iter()
        .map(|i| i * params.coil_field_scale / (2.0 * PI * geometry.major_radius))
        .sum();
    let lorentz = current_decay_rate * coil_field * geometry.minor_radius;

    let b_pol = poloidal_field(plasma_current_ma, geometry);
    let b_sq = geometry.toroidal_field * geometry.toroidal_field + b_pol * b_pol;
    let magnetic_pressure = b_sq / (2.0 * MU0_SI);

    (lorentz + magnetic_pressure * geometry.minor_radius).abs()
}
