// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Stability Metrics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Equilibrium stability metrics: safety factor, beta, normalized beta.
//!
//! Closed-form cylindrical proxies evaluated on the volume-averaged state.
//! None of these guard against a vanishing plasma current; callers that can
//! reach I_p → 0 floor the current first (see [`crate::integrator`]).

use plasma_types::config::{MachineGeometry, StabilityLimits};
use plasma_types::constants::{DENSITY_UNIT, KEV_TO_JOULES, MEGA, MU0_SI};
use plasma_types::state::{LimitViolations, PlasmaState};
use std::f64::consts::PI;

/// Normalized minor radius at which q95 is evaluated.
pub const Q95_RADIUS: f64 = 0.95;

/// Safety factor at normalized radius `r_normalized` ∈ (0, 1].
///
/// q = 2π B_t r² a² / (μ₀ R₀ I_p) · (1 + 0.5 r²)
pub fn safety_factor(r_normalized: f64, plasma_current_ma: f64, geometry: &MachineGeometry) -> f64 {
    let a = geometry.minor_radius;
    let r2 = r_normalized * r_normalized;
    let q = (2.0 * PI * geometry.toroidal_field * r2 * a * a)
        / (MU0_SI * geometry.major_radius * plasma_current_ma * MEGA);
    q * (1.0 + 0.5 * r2)
}

/// Safety factor of `state` at normalized radius `r_normalized`.
pub fn safety_factor_profile(
    r_normalized: f64,
    state: &PlasmaState,
    geometry: &MachineGeometry,
) -> f64 {
    safety_factor(r_normalized, state.plasma_current, geometry)
}

/// Poloidal field at the plasma edge: B_p = μ₀ I_p / (2π a) [T].
pub fn poloidal_field(plasma_current_ma: f64, geometry: &MachineGeometry) -> f64 {
    MU0_SI * plasma_current_ma * MEGA / (2.0 * PI * geometry.minor_radius)
}

/// Volume-averaged toroidal beta.
///
/// β = 2μ₀⟨p⟩ / (B_t² + B_p²), with ⟨p⟩ = n T / 3.
pub fn calculate_beta(state: &PlasmaState, geometry: &MachineGeometry) -> f64 {
    let pressure_avg =
        state.density_core * DENSITY_UNIT * state.temperature_core * KEV_TO_JOULES / 3.0;
    let b_pol = poloidal_field(state.plasma_current, geometry);
    let b_total_sq = geometry.toroidal_field * geometry.toroidal_field + b_pol * b_pol;
    2.0 * MU0_SI * pressure_avg / b_total_sq
}

/// Troyon normalization: β_N = 100 β · a B_t / I_p.
pub fn normalize_beta(beta: f64, plasma_current_ma: f64, geometry: &MachineGeometry) -> f64 {
    beta * 100.0 * geometry.minor_radius * geometry.toroidal_field / plasma_current_ma
}

/// Normalized beta of `state` [% m T / MA].
pub fn calculate_beta_normalized(state: &PlasmaState, geometry: &MachineGeometry) -> f64 {
    normalize_beta(
        calculate_beta(state, geometry),
        state.plasma_current,
        geometry,
    )
}

/// Greenwald density limit n_G = I_p / (π a²) [10^20 m^-3].
pub fn greenwald_density(plasma_current_ma: f64, geometry: &MachineGeometry) -> f64 {
    plasma_current_ma.abs() / (PI * geometry.minor_radius * geometry.minor_radius)
}

/// Evaluate the three disruption-trigger limits.
///
/// This is the only place the thresholds are compared; the activity
/// accumulator, the phase sequencer and the safety system all consume its
/// result. Non-finite values compare false and are caught separately.
pub fn check_limits(state: &PlasmaState, limits: &StabilityLimits) -> LimitViolations {
    LimitViolations {
        q95_low: state.safety_factor_q95 < limits.q95_min,
        beta_high: state.beta_normalized > limits.beta_n_limit,
        vertical_excursion: state.vertical_position.abs() > limits.vertical_displacement_max,
    }
}
