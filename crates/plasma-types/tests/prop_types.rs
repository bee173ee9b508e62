// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Property-Based Tests (proptest) for plasma-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for plasma-types using proptest.
//!
//! Covers: bit-exact PlasmaState serialization, actuator heating sums,
//! finiteness detection.

use plasma_types::config::{ActuatorLayout, MachineConfig};
use plasma_types::state::{ControlActuators, PlasmaState};
use proptest::prelude::*;

fn any_state() -> impl Strategy<Value = PlasmaState> {
    (
        prop::array::uniform6(-1.0e6f64..1.0e6),
        prop::array::uniform6(0.0f64..1.0e3),
        prop::array::uniform6(-1.0e20f64..1.0e20),
    )
        .prop_map(|(a, b, c)| PlasmaState {
            plasma_current: a[0],
            safety_factor_q95: a[1],
            beta_normalized: a[2],
            li_inductance: a[3],
            radial_position: a[4],
            vertical_position: a[5],
            elongation: b[0],
            triangularity: b[1],
            temperature_core: b[2],
            temperature_edge: b[3],
            density_core: b[4],
            density_edge: b[5],
            mhd_activity_level: c[0],
            ntm_amplitude: c[1],
            elm_frequency: c[2],
            neutron_rate: c[3],
            impurity_concentration: c[4],
            radiation_power: c[5],
        })
}

// ── PlasmaState Serialization ────────────────────────────────────────

proptest! {
    /// JSON round-trip preserves every scalar bit-for-bit.
    #[test]
    fn plasma_state_json_roundtrip_is_bit_exact(state in any_state()) {
        let json = serde_json::to_string(&state).unwrap();
        let back: PlasmaState = serde_json::from_str(&json).unwrap();
        for ((name, a), (_, b)) in state.fields().iter().zip(back.fields().iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits(), "field {} changed: {} -> {}", name, a, b);
        }
    }

    /// Finite inputs are always reported finite.
    #[test]
    fn finite_state_has_no_non_finite_field(state in any_state()) {
        prop_assert!(state.is_finite());
    }

    /// Poisoning any single field is detected and named.
    #[test]
    fn single_nan_is_located(state in any_state(), idx in 0usize..18) {
        let name = state.fields()[idx].0;
        let mut poisoned = state;
        match name {
            "plasma_current" => poisoned.plasma_current = f64::NAN,
            "safety_factor_q95" => poisoned.safety_factor_q95 = f64::NAN,
            "beta_normalized" => poisoned.beta_normalized = f64::NAN,
            "li_inductance" => poisoned.li_inductance = f64::NAN,
            "radial_position" => poisoned.radial_position = f64::NAN,
            "vertical_position" => poisoned.vertical_position = f64::NAN,
            "elongation" => poisoned.elongation = f64::NAN,
            "triangularity" => poisoned.triangularity = f64::NAN,
            "temperature_core" => poisoned.temperature_core = f64::NAN,
            "temperature_edge" => poisoned.temperature_edge = f64::NAN,
            "density_core" => poisoned.density_core = f64::NAN,
            "density_edge" => poisoned.density_edge = f64::NAN,
            "mhd_activity_level" => poisoned.mhd_activity_level = f64::NAN,
            "ntm_amplitude" => poisoned.ntm_amplitude = f64::NAN,
            "elm_frequency" => poisoned.elm_frequency = f64::NAN,
            "neutron_rate" => poisoned.neutron_rate = f64::NAN,
            "impurity_concentration" => poisoned.impurity_concentration = f64::NAN,
            _ => poisoned.radiation_power = f64::NAN,
        }
        prop_assert_eq!(poisoned.first_non_finite(), Some(name));
    }
}

// ── Actuator Invariants ──────────────────────────────────────────────

proptest! {
    /// Heating sum equals the sum over enabled systems only.
    #[test]
    fn heating_sum_counts_enabled_only(
        powers in prop::array::uniform3(0.0f64..50.0),
        enabled in prop::array::uniform3(any::<bool>()),
    ) {
        let mut act = ControlActuators::idle(&ActuatorLayout::default());
        let mut expected = 0.0;
        for i in 0..3 {
            act.heating[i].power = powers[i];
            act.heating[i].enabled = enabled[i];
            if enabled[i] {
                expected += powers[i];
            }
        }
        prop_assert!((act.total_heating_power() - expected).abs() < 1e-9);
    }

    /// Idle actuators always satisfy their own layout.
    #[test]
    fn idle_actuators_fit_layout(
        pf in 1usize..16,
        vert in 0usize..8,
        horiz in 0usize..8,
        heat in 0usize..6,
    ) {
        let layout = ActuatorLayout {
            num_pf_coils: pf,
            num_vertical_coils: vert,
            num_horizontal_coils: horiz,
            num_heating_systems: heat,
        };
        let act = ControlActuators::idle(&layout);
        prop_assert!(act.check_layout(&layout).is_ok());
    }
}

// ── Config Invariants ────────────────────────────────────────────────

proptest! {
    /// Any positive toroidal field keeps the default config valid.
    #[test]
    fn positive_field_is_valid(b in 0.1f64..20.0) {
        let mut cfg = MachineConfig::default();
        cfg.geometry.toroidal_field = b;
        prop_assert!(cfg.validate().is_ok());
    }
}
