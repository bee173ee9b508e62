// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Reference Scenario
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reference discharge programme.
//!
//! Current is tracked on the primary PF coil with a slew-limited reference,
//! a resistive feed-forward and a PID trim. Vertical position is held at
//! zero by the vertical coils. Heating follows the phase; fueling holds
//! density below a fraction of the Greenwald limit.

use crate::pid::PIDController;
use plasma_physics::heating::plasma_volume;
use plasma_physics::stability::greenwald_density;
use plasma_types::config::MachineConfig;
use plasma_types::constants::{DENSITY_UNIT, MEGA};
use plasma_types::error::PlasmaResult;
use plasma_types::state::{ControlActuators, HeatingKind, OperationalPhase, PlasmaState};
use serde::{Deserialize, Serialize};

/// What a controller sees before each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlContext {
    pub time: f64,
    pub phase: OperationalPhase,
    pub state: PlasmaState,
    /// Flat-top current target [MA]
    pub current_target: f64,
}

/// Source of actuator commands for a shot.
pub trait ShotController {
    fn actuate(&mut self, ctx: &ControlContext, dt: f64) -> ControlActuators;
}

impl<F> ShotController for F
where
    F: FnMut(&ControlContext, f64) -> ControlActuators,
{
    fn actuate(&mut self, ctx: &ControlContext, dt: f64) -> ControlActuators {
        self(ctx, dt)
    }
}

/// Tunable parts of the reference programme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProgramme {
    /// Reference current slew limit [MA/s]
    pub current_ramp_rate: f64,
    /// ECRH power during ramp-up [MW]
    pub ramp_up_heating: f64,
    /// Total power during flat-top, split over the ECRH and ICRH systems [MW]
    pub flat_top_heating: f64,
    /// Density reference [10^20 m^-3]
    pub density_target: f64,
    /// Density reference ceiling as a Greenwald fraction
    pub greenwald_fraction: f64,
    /// Density feedback gain [1/s]
    pub fueling_gain: f64,
    /// Primary coil current bound
    pub pf_coil_limit: f64,
}

impl Default for ScenarioProgramme {
    fn default() -> Self {
        ScenarioProgramme {
            current_ramp_rate: 1.0,
            ramp_up_heating: 5.0,
            flat_top_heating: 10.0,
            density_target: 1.0,
            greenwald_fraction: 0.8,
            fueling_gain: 5.0,
            pf_coil_limit: 100.0,
        }
    }
}

const CURRENT_KP: f64 = 40.0;
const CURRENT_KI: f64 = 20.0;
const VERTICAL_KP: f64 = 50.0;
const VERTICAL_KI: f64 = 5.0;
const VERTICAL_KD: f64 = 10.0;

/// Phase-programmed feedback controller.
#[derive(Debug, Clone)]
pub struct ReferenceScenario {
    config: MachineConfig,
    pub programme: ScenarioProgramme,
    current_pid: PIDController,
    vertical_pid: PIDController,
    reference_current: Option<f64>,
}

impl ReferenceScenario {
    pub fn new(config: &MachineConfig) -> PlasmaResult<Self> {
        Self::with_programme(config, ScenarioProgramme::default())
    }

    pub fn with_programme(config: &MachineConfig, programme: ScenarioProgramme) -> PlasmaResult<Self> {
        let current_pid =
            PIDController::new(CURRENT_KP, CURRENT_KI, 0.0).with_limit(programme.pf_coil_limit)?;
        Ok(ReferenceScenario {
            config: config.clone(),
            programme,
            current_pid,
            vertical_pid: PIDController::new(VERTICAL_KP, VERTICAL_KI, VERTICAL_KD),
            reference_current: None,
        })
    }

    /// Slew-limited current reference after this step [MA].
    pub fn reference_current(&self) -> Option<f64> {
        self.reference_current
    }

    /// PF current whose loop voltage balances the resistive drop at `ip_ma`.
    fn feed_forward(&self, ip_ma: f64) -> f64 {
        let circuit = &self.config.circuit;
        circuit.plasma_resistance * ip_ma * MEGA / circuit.loop_voltage_gain
    }

    fn heating_power(&self, phase: OperationalPhase, ctx: &ControlContext) -> f64 {
        match phase {
            OperationalPhase::Init | OperationalPhase::RampUp => self.programme.ramp_up_heating,
            OperationalPhase::FlatTop => self.programme.flat_top_heating,
            OperationalPhase::RampDown => {
                let fraction = (ctx.state.plasma_current / ctx.current_target).clamp(0.0, 1.0);
                self.programme.flat_top_heating * fraction
            }
            _ => 0.0,
        }
    }

    fn fueling_rate(&self, state: &PlasmaState) -> f64 {
        let ceiling = self.programme.greenwald_fraction
            * greenwald_density(state.plasma_current, &self.config.geometry);
        let density_ref = self.programme.density_target.min(ceiling);
        let volume = plasma_volume(&self.config.geometry, state.elongation);
        let per_unit = DENSITY_UNIT * volume;
        let holding = state.density_core * per_unit / self.config.timing.particle_confinement_time;
        let feedback = self.programme.fueling_gain * (density_ref - state.density_core) * per_unit;
        (holding + feedback).max(0.0)
    }
}

impl ShotController for ReferenceScenario {
    fn actuate(&mut self, ctx: &ControlContext, dt: f64) -> ControlActuators {
        let mut act = ControlActuators::idle(&self.config.actuators);
        let phase = ctx.phase;
        if !phase.is_nominal() {
            self.current_pid.reset();
            self.vertical_pid.reset();
            return act;
        }

        let ip = ctx.state.plasma_current;
        let goal = if phase == OperationalPhase::RampDown {
            0.0
        } else {
            ctx.current_target
        };
        let max_step = self.programme.current_ramp_rate * dt;
        let reference = self.reference_current.unwrap_or(ip);
        let reference = reference + (goal - reference).clamp(-max_step, max_step);
        self.reference_current = Some(reference);

        let trim = self.current_pid.step(reference - ip, dt);
        let limit = self.programme.pf_coil_limit;
        if let Some(primary) = act.pf_coil_currents.first_mut() {
            *primary = (self.feed_forward(reference) + trim).clamp(-limit, limit);
        }

        let vertical = self.vertical_pid.step(-ctx.state.vertical_position, dt);
        act.vertical_coil_currents.fill(vertical);

        let power = self.heating_power(phase, ctx);
        let flat_top = phase == OperationalPhase::FlatTop || phase == OperationalPhase::RampDown;
        let mut rf: Vec<_> = act
            .heating
            .iter_mut()
            .filter(|h| {
                h.kind == HeatingKind::Ecrh || (flat_top && h.kind == HeatingKind::Icrh)
            })
            .collect();
        let share = power / rf.len().max(1) as f64;
        for system in rf.iter_mut() {
            system.power = share;
            system.enabled = share > 0.0;
        }

        act.fuel_injection_rate = self.fueling_rate(&ctx.state);
        act
    }
}
