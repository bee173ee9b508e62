// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Plasma Physics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Zero-dimensional plasma physics.
//!
//! Stability metrics, instability growth models, heating and confinement
//! scalings, and the fixed-step state-advancement integrator.

pub mod heating;
pub mod instability;
pub mod integrator;
pub mod stability;
