// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Plasma Types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Shared data model for the zero-dimensional plasma control core.
//!
//! Volume-averaged plasma state, actuator commands, machine configuration,
//! operational phases and the mitigation outputs consumed by external
//! collaborators.

pub mod config;
pub mod constants;
pub mod error;
pub mod state;
