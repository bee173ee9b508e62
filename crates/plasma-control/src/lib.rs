// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Plasma Control
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Control and safety layer.
//!
//! Phase sequencing, disruption detection and mitigation decisions, the
//! control-loop aggregate, and the shot drivers built on top of it.

pub mod history;
pub mod pid;
pub mod realtime;
pub mod safety;
pub mod scenario;
pub mod sequencer;
pub mod shot;
pub mod system;
