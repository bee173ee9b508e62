// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Vacuum permeability (H/m), 4π·10⁻⁷.
pub const MU0_SI: f64 = 4.0e-7 * std::f64::consts::PI;

/// Elementary charge (C)
pub const Q_ELECTRON: f64 = 1.602e-19;

/// Electron mass (kg)
pub const M_ELECTRON: f64 = 9.109e-31;

/// Proton mass (kg)
pub const M_PROTON: f64 = 1.673e-27;

/// keV to Joules: 1 keV = 1000 eV × 1.602e-19 J/eV
pub const KEV_TO_JOULES: f64 = 1.602e-16;

/// Density unit used by [`crate::state::PlasmaState`] (m⁻³).
/// All densities are stored in units of 10²⁰ m⁻³.
pub const DENSITY_UNIT: f64 = 1.0e20;

/// D-T fusion energy release (J) - 17.6 MeV
pub const E_FUSION_DT: f64 = 17.6 * 1.602e-13;

/// MA → A
pub const MEGA: f64 = 1.0e6;
