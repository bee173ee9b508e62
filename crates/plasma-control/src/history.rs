// ─────────────────────────────────────────────────────────────────────
// SCPN Plasma Guard — Diagnostic History
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-capacity diagnostic history.
//!
//! Storage is allocated once at construction; once full, every new sample
//! evicts the oldest one.

use plasma_types::state::{PlantState, PlasmaState};
use serde::{Deserialize, Serialize};

/// A fixed-size circular buffer for a single diagnostic channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircularChannel {
    data: Vec<f64>,
    capacity: usize,
    head: usize,
    count: usize,
}

impl CircularChannel {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            capacity,
            head: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Index of the `i`-th oldest retained value in `data`.
    fn physical_index(&self, i: usize) -> usize {
        let oldest = if self.count < self.capacity { 0 } else { self.head };
        (oldest + i) % self.capacity
    }

    /// The `i`-th retained value, oldest first.
    pub fn get(&self, i: usize) -> Option<f64> {
        (i < self.count).then(|| self.data[self.physical_index(i)])
    }

    /// Retained values in chronological order (oldest to newest).
    pub fn view(&self) -> Vec<f64> {
        (0..self.count)
            .map(|i| self.data[self.physical_index(i)])
            .collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.count
            .checked_sub(1)
            .map(|last| self.data[self.physical_index(last)])
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }
}

/// Recorded diagnostic channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryChannel {
    Time,
    PlasmaCurrent,
    SafetyFactorQ95,
    BetaNormalized,
    TemperatureCore,
    DensityCore,
    VerticalPosition,
    MhdActivity,
    NtmAmplitude,
    StoredEnergy,
}

impl HistoryChannel {
    pub const ALL: [HistoryChannel; 10] = [
        HistoryChannel::Time,
        HistoryChannel::PlasmaCurrent,
        HistoryChannel::SafetyFactorQ95,
        HistoryChannel::BetaNormalized,
        HistoryChannel::TemperatureCore,
        HistoryChannel::DensityCore,
        HistoryChannel::VerticalPosition,
        HistoryChannel::MhdActivity,
        HistoryChannel::NtmAmplitude,
        HistoryChannel::StoredEnergy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HistoryChannel::Time => "time_s",
            HistoryChannel::PlasmaCurrent => "plasma_current_ma",
            HistoryChannel::SafetyFactorQ95 => "q95",
            HistoryChannel::BetaNormalized => "beta_n",
            HistoryChannel::TemperatureCore => "temperature_core_kev",
            HistoryChannel::DensityCore => "density_core_1e20",
            HistoryChannel::VerticalPosition => "vertical_position_m",
            HistoryChannel::MhdActivity => "mhd_activity",
            HistoryChannel::NtmAmplitude => "ntm_amplitude",
            HistoryChannel::StoredEnergy => "stored_energy_mj",
        }
    }
}

/// One time-stamped row of the history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HistorySample {
    pub time: f64,
    pub plasma_current: f64,
    pub safety_factor_q95: f64,
    pub beta_normalized: f64,
    pub temperature_core: f64,
    pub density_core: f64,
    pub vertical_position: f64,
    pub mhd_activity_level: f64,
    pub ntm_amplitude: f64,
    pub stored_energy_mj: f64,
}

impl HistorySample {
    pub fn capture(time: f64, state: &PlasmaState, plant: &PlantState) -> Self {
        HistorySample {
            time,
            plasma_current: state.plasma_current,
            safety_factor_q95: state.safety_factor_q95,
            beta_normalized: state.beta_normalized,
            temperature_core: state.temperature_core,
            density_core: state.density_core,
            vertical_position: state.vertical_position,
            mhd_activity_level: state.mhd_activity_level,
            ntm_amplitude: state.ntm_amplitude,
            stored_energy_mj: plant.stored_energy_mj,
        }
    }
}

/// Ten parallel circular channels advanced in lock-step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticHistory {
    channels: [CircularChannel; 10],
}

impl DiagnosticHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: std::array::from_fn(|_| CircularChannel::new(capacity)),
        }
    }

    pub fn record(&mut self, sample: &HistorySample) {
        let values = [
            sample.time,
            sample.plasma_current,
            sample.safety_factor_q95,
            sample.beta_normalized,
            sample.temperature_core,
            sample.density_core,
            sample.vertical_position,
            sample.mhd_activity_level,
            sample.ntm_amplitude,
            sample.stored_energy_mj,
        ];
        for (channel, value) in self.channels.iter_mut().zip(values) {
            channel.push(value);
        }
    }

    pub fn channel(&self, which: HistoryChannel) -> &CircularChannel {
        &self.channels[which as usize]
    }

    /// The `i`-th retained sample, oldest first.
    pub fn sample(&self, i: usize) -> Option<HistorySample> {
        let mut row = [0.0; 10];
        for (slot, channel) in row.iter_mut().zip(self.channels.iter()) {
            *slot = channel.get(i)?;
        }
        Some(HistorySample {
            time: row[0],
            plasma_current: row[1],
            safety_factor_q95: row[2],
            beta_normalized: row[3],
            temperature_core: row[4],
            density_core: row[5],
            vertical_position: row[6],
            mhd_activity_level: row[7],
            ntm_amplitude: row[8],
            stored_energy_mj: row[9],
        })
    }

    pub fn latest(&self) -> Option<HistorySample> {
        self.len().checked_sub(1).and_then(|last| self.sample(last))
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> Vec<HistorySample> {
        (0..self.len()).filter_map(|i| self.sample(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.channels[0].capacity()
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
    }
}
