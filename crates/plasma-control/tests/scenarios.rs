// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Discharge Scenario Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end discharges through the public control API.

use plasma_control::safety::MitigationReadiness;
use plasma_control::scenario::{ControlContext, ReferenceScenario, ShotController};
use plasma_control::shot::run_shot;
use plasma_control::system::PlasmaControlSystem;
use plasma_types::config::MachineConfig;
use plasma_types::constants::MEGA;
use plasma_types::error::PlasmaError;
use plasma_types::state::{ControlActuators, MitigationAction, OperationalPhase};

const DT: f64 = 1e-3;

fn short_flat_top() -> MachineConfig {
    let mut cfg = MachineConfig::default();
    cfg.timing.flat_top_duration = 0.5;
    cfg
}

fn displaced() -> MachineConfig {
    let mut cfg = MachineConfig::default();
    cfg.initial.vertical_position = 0.2;
    cfg
}

fn idle(system: &PlasmaControlSystem) -> ControlActuators {
    ControlActuators::idle(&system.config().actuators)
}

// ── Limit-driven disruptions ─────────────────────────────────────────

#[test]
fn low_q95_penalises_activity_and_disrupts() {
    let mut system = PlasmaControlSystem::new(MachineConfig::default()).unwrap();
    let mut state = *system.state();
    state.plasma_current *= state.safety_factor_q95 / 1.8;
    system.reset_state(state).unwrap();
    assert!((system.state().safety_factor_q95 - 1.8).abs() < 1e-9);

    // Drive the loop voltage that holds the raised current steady.
    let circuit = system.config().circuit;
    let mut hold = idle(&system);
    hold.pf_coil_currents[0] =
        circuit.plasma_resistance * system.state().plasma_current * MEGA / circuit.loop_voltage_gain;

    let before = system.state().mhd_activity_level;
    let report = system.step(&hold, DT).unwrap();
    assert!(report.advance.violations.q95_low);
    assert!(report.advance.activity.penalties >= 0.5);
    assert!(report.state.mhd_activity_level - before >= 0.5);
    assert!(report.flags.low_q);
    assert!(!report.flags.current_quench);
    assert_eq!(
        report.transition,
        Some((OperationalPhase::Init, OperationalPhase::Disruption))
    );
    assert_eq!(report.decision.action, MitigationAction::GasInjection);
    assert!(system.disruption_detected());
}

#[test]
fn vertical_excursion_fires_fastest_shutdown() {
    let mut system = PlasmaControlSystem::new(displaced()).unwrap();
    let report = system.step(&idle(&system), DT).unwrap();
    assert!(report.advance.violations.vertical_excursion);
    assert!((report.advance.activity.penalties - 0.7).abs() < 1e-12);
    assert!(report.flags.vde);
    assert_eq!(report.phase, OperationalPhase::Disruption);
    assert_eq!(report.decision.action, MitigationAction::CombinedMgiKillerPulse);
    assert_eq!(report.decision.urgency, 1.0);
    assert_eq!(system.disruption_warning_time(), Some(report.time));
    assert!(system.plant().quench.is_some());
}

#[test]
fn disruption_is_mitigated_then_shut_down() {
    let mut system = PlasmaControlSystem::new(displaced()).unwrap();
    let initial_energy = system.plant().stored_energy_mj;

    let first = system.step(&idle(&system), DT).unwrap();
    assert_eq!(first.phase, OperationalPhase::Disruption);
    let second = system.step(&idle(&system), DT).unwrap();
    assert_eq!(
        second.transition,
        Some((OperationalPhase::Disruption, OperationalPhase::Mitigation))
    );
    assert!(system.mitigation_activated());
    let mitigation_start = second.time;

    let mut shutdown_at = None;
    for _ in 0..50 {
        let report = system.step(&idle(&system), DT).unwrap();
        assert!(report.advance.quench_active);
        if report.phase == OperationalPhase::SafeShutdown {
            shutdown_at = Some(report.time);
            break;
        }
    }
    let shutdown_at = shutdown_at.expect("mitigation never completed");
    let response = system.config().timing.mitigation_response_time;
    assert!(shutdown_at - mitigation_start >= response - 1e-9);
    assert!(shutdown_at - mitigation_start <= response + 2.0 * DT);

    assert_eq!(system.safety().mitigation_attempts(), 1);
    assert_eq!(system.safety().mitigation_success_count(), 1);
    assert!(system.plant().stored_energy_mj < 0.1 * initial_energy);
}

#[test]
fn disruption_holds_without_ready_hardware() {
    let mut system = PlasmaControlSystem::new(displaced()).unwrap();
    system.safety_mut().readiness = MitigationReadiness::none_ready();
    for _ in 0..20 {
        let report = system.step(&idle(&system), DT).unwrap();
        assert_eq!(report.phase, OperationalPhase::Disruption);
        assert_eq!(report.decision.action, MitigationAction::None);
        assert_eq!(report.decision.urgency, 1.0);
    }
    assert!(!system.mitigation_activated());
}

#[test]
fn quench_reports_disruption_force() {
    let cfg = displaced();
    let layout = cfg.actuators;
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    let mut idle_controller = |_: &ControlContext, _: f64| ControlActuators::idle(&layout);
    let report = run_shot(&mut system, 0.05, DT, &mut idle_controller).unwrap();
    assert!(report.disrupted);
    assert!(report.peak_disruption_force_n > 0.0);
    assert!(report.peak_disruption_force_n.is_finite());
}

#[test]
fn excessive_impurity_attenuation_is_rejected() {
    let mut cfg = displaced();
    cfg.quench.impurity_attenuation = 3.0;
    cfg.initial.impurity_concentration = 0.5;
    assert!(matches!(
        PlasmaControlSystem::new(cfg),
        Err(PlasmaError::ConfigError(_))
    ));
}

#[test]
fn fully_attenuated_quench_stays_physical() {
    let mut cfg = displaced();
    cfg.quench.impurity_attenuation = 1.0;
    cfg.initial.impurity_concentration = 1.0;
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    for _ in 0..5 {
        let report = system.step(&idle(&system), DT).unwrap();
        assert!(report.state.is_physical(), "{:?}", report.state);
        assert!(system.plant().stored_energy_mj >= 0.0);
    }
    assert!(system.plant().quench.is_some());
}

#[test]
fn terminated_session_rejects_steps() {
    let mut system = PlasmaControlSystem::new(displaced()).unwrap();
    while system.phase() != OperationalPhase::SafeShutdown {
        system.step(&idle(&system), DT).unwrap();
        assert!(system.step_count() < 100);
    }
    let count = system.step_count();
    let err = system.step(&idle(&system), DT).unwrap_err();
    assert!(matches!(err, PlasmaError::SessionTerminated { .. }));
    assert_eq!(system.step_count(), count);
}

// ── Reference discharge ──────────────────────────────────────────────

#[test]
fn reference_discharge_completes_without_disruption() {
    let cfg = short_flat_top();
    let mut scenario = ReferenceScenario::new(&cfg).unwrap();
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    let report = run_shot(&mut system, 10.0, DT, &mut scenario).unwrap();

    assert_eq!(report.final_phase, OperationalPhase::SafeShutdown);
    assert!(!report.disrupted);
    assert!(!system.disruption_detected());
    assert_eq!(report.rolled_back_steps, 0);
    let sequence: Vec<_> = report.phases.iter().map(|c| (c.from, c.to)).collect();
    assert_eq!(
        sequence,
        vec![
            (OperationalPhase::Init, OperationalPhase::RampUp),
            (OperationalPhase::RampUp, OperationalPhase::FlatTop),
            (OperationalPhase::FlatTop, OperationalPhase::RampDown),
            (OperationalPhase::RampDown, OperationalPhase::SafeShutdown),
        ]
    );
    assert!(report.peak_plasma_current >= 0.95 * 1.5);
    assert!(report.max_beta_n < 3.5);
    assert!(report.max_abs_vertical_position < 0.15);
    assert!(report.duration_s < 10.0);
    assert!(report.final_state.plasma_current.abs() <= 0.05 * 1.5);
}

#[test]
fn flat_top_lasts_its_programmed_duration() {
    let cfg = short_flat_top();
    let mut scenario = ReferenceScenario::new(&cfg).unwrap();
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    let report = run_shot(&mut system, 10.0, DT, &mut scenario).unwrap();
    let entered = |phase| {
        report
            .phases
            .iter()
            .find(|c| c.to == phase)
            .map(|c| c.time)
            .unwrap()
    };
    let flat_top = entered(OperationalPhase::RampDown) - entered(OperationalPhase::FlatTop);
    assert!(flat_top >= 0.5 - 1e-9 && flat_top <= 0.5 + 2.0 * DT, "flat-top {flat_top}");
}

#[test]
fn closure_controller_drives_a_shot() {
    let cfg = MachineConfig::default();
    let layout = cfg.actuators;
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    let mut calls = 0usize;
    let mut controller = |ctx: &ControlContext, _dt: f64| {
        calls += 1;
        assert!(ctx.phase.is_nominal());
        ControlActuators::idle(&layout)
    };
    let report = run_shot(&mut system, 0.02, DT, &mut controller).unwrap();
    assert_eq!(report.steps, 20);
    assert_eq!(calls, 20);
}

// ── History and determinism ──────────────────────────────────────────

#[test]
fn history_keeps_most_recent_window() {
    let mut cfg = MachineConfig::default();
    cfg.history_capacity = 16;
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    for _ in 0..40 {
        system.step(&idle(&system), DT).unwrap();
    }
    let history = system.history();
    assert_eq!(history.len(), 16);
    let oldest = history.sample(0).unwrap();
    let newest = history.latest().unwrap();
    assert!((oldest.time - 25.0 * DT).abs() < 1e-9);
    assert!((newest.time - system.time()).abs() < 1e-15);
    assert_eq!(newest.plasma_current, system.state().plasma_current);
    let times: Vec<f64> = history.samples().iter().map(|s| s.time).collect();
    assert!(times.windows(2).all(|w| w[1] > w[0]));
}

fn reference_trace(seed: u64, steps: usize) -> Vec<[u64; 18]> {
    let mut cfg = MachineConfig::default();
    cfg.rng_seed = seed;
    let mut scenario = ReferenceScenario::new(&cfg).unwrap();
    let mut system = PlasmaControlSystem::new(cfg).unwrap();
    (0..steps)
        .map(|_| {
            let act = scenario.actuate(&system.context(), DT);
            let report = system.step(&act, DT).unwrap();
            report.state.fields().map(|(_, v)| v.to_bits())
        })
        .collect()
}

#[test]
fn same_seed_reproduces_trajectory() {
    assert_eq!(reference_trace(7, 200), reference_trace(7, 200));
}

#[test]
fn different_seed_changes_activity_noise() {
    let a = reference_trace(7, 5);
    let b = reference_trace(8, 5);
    let activity_idx = 12;
    assert_ne!(a[0][activity_idx], b[0][activity_idx]);
    // Noise does not feed back into the transport.
    assert_eq!(a[0][0], b[0][0]);
}
