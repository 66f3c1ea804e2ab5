//! Rolling population statistics for graphs and run summaries.
use std::collections::VecDeque;

use serde::Serialize;

use crate::commit::CommitReport;
use crate::snapshot::{ClassAverages, PopulationCounts};

/// Bounded history of one population metric; the oldest sample falls off
/// once the window is full.
pub struct Series {
    samples: VecDeque<f32>,
    window: usize,
}

impl Series {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    pub fn peak(&self) -> Option<f32> {
        self.iter().reduce(f32::max)
    }
}

/// Population history, one series per metric.
pub struct PopulationStats {
    pub fish: Series,
    pub predators: Series,
    pub prey: Series,
    pub predator_energy: Series,
    pub prey_energy: Series,
    pub predator_size: Series,
    pub prey_size: Series,
    pub plankton: Series,
    pub crustaceans: Series,
    pub dead_algae: Series,
    pub algae_segments: Series,
    pub eggs: Series,
    pub births: Series,
    pub deaths: Series,

    // Accumulated between samples
    pub births_since_sample: u32,
    pub deaths_since_sample: u32,
    pub sample_interval: u32,
    pub tick_counter: u32,

    pub totals: LifetimeTotals,
}

/// Running totals since the world was seeded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LifetimeTotals {
    pub births: u64,
    pub hatches: u64,
    pub matings: u64,
    pub eggs_laid: u64,
    pub starved: u64,
    pub died_of_age: u64,
    pub eaten: u64,
    pub dropped_births: u64,
}

impl PopulationStats {
    pub fn new(capacity: usize, sample_interval: u32) -> Self {
        Self {
            fish: Series::new(capacity),
            predators: Series::new(capacity),
            prey: Series::new(capacity),
            predator_energy: Series::new(capacity),
            prey_energy: Series::new(capacity),
            predator_size: Series::new(capacity),
            prey_size: Series::new(capacity),
            plankton: Series::new(capacity),
            crustaceans: Series::new(capacity),
            dead_algae: Series::new(capacity),
            algae_segments: Series::new(capacity),
            eggs: Series::new(capacity),
            births: Series::new(capacity),
            deaths: Series::new(capacity),
            births_since_sample: 0,
            deaths_since_sample: 0,
            sample_interval: sample_interval.max(1),
            tick_counter: 0,
            totals: LifetimeTotals::default(),
        }
    }

    /// Fold one tick's commit and extra events into the totals.
    pub fn absorb(&mut self, report: &CommitReport, hatches: u32, died_of_age: u32) {
        let births = report.births + hatches;
        let deaths = report.starved + died_of_age + report.fish_eaten;
        self.births_since_sample += births;
        self.deaths_since_sample += deaths;

        let t = &mut self.totals;
        t.births += report.births as u64;
        t.hatches += hatches as u64;
        t.matings += report.matings as u64;
        t.eggs_laid += report.eggs_laid as u64;
        t.starved += report.starved as u64;
        t.died_of_age += died_of_age as u64;
        t.eaten += report.fish_eaten as u64;
        t.dropped_births += report.dropped_births as u64;
    }

    /// Record a sample every `sample_interval` ticks.
    pub fn record(&mut self, counts: &PopulationCounts, averages: &ClassAverages) {
        self.tick_counter += 1;
        if self.tick_counter % self.sample_interval != 0 {
            return;
        }

        self.fish.push(counts.live_fish() as f32);
        self.predators.push(counts.predators as f32);
        self.prey.push(counts.prey as f32);
        self.predator_energy.push(averages.predator_energy);
        self.prey_energy.push(averages.prey_energy);
        self.predator_size.push(averages.predator_size);
        self.prey_size.push(averages.prey_size);
        self.plankton.push(counts.plankton as f32);
        self.crustaceans.push(counts.crustaceans as f32);
        self.dead_algae.push(counts.dead_algae as f32);
        self.algae_segments.push(counts.algae_segments as f32);
        self.eggs.push(counts.eggs as f32);
        self.births.push(self.births_since_sample as f32);
        self.deaths.push(self.deaths_since_sample as f32);

        self.births_since_sample = 0;
        self.deaths_since_sample = 0;
    }

    /// Largest live fish count seen in the retained window.
    pub fn peak_fish(&self) -> usize {
        self.fish.peak().unwrap_or(0.0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_drops_the_oldest_sample_when_full() {
        let mut series = Series::new(3);
        for value in [6.0, 2.0, 3.0, 4.0] {
            series.push(value);
        }

        let values: Vec<f32> = series.iter().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.latest(), Some(4.0));
        assert_eq!(series.peak(), Some(4.0));
    }

    #[test]
    fn stats_aggregate_births_and_deaths_between_samples() {
        let mut stats = PopulationStats::new(8, 2);
        let counts = PopulationCounts {
            predators: 3,
            prey: 7,
            ..Default::default()
        };
        let averages = ClassAverages::default();

        let report = CommitReport {
            births: 3,
            starved: 1,
            ..Default::default()
        };
        stats.absorb(&report, 0, 0);
        stats.record(&counts, &averages);
        assert!(stats.births.is_empty());
        assert!(stats.deaths.is_empty());

        let report = CommitReport {
            births: 1,
            fish_eaten: 2,
            ..Default::default()
        };
        stats.absorb(&report, 1, 2);
        stats.record(&counts, &averages);

        let births: Vec<f32> = stats.births.iter().collect();
        let deaths: Vec<f32> = stats.deaths.iter().collect();
        assert_eq!(births, vec![5.0]);
        assert_eq!(deaths, vec![5.0]);
        assert_eq!(stats.births_since_sample, 0);
        assert_eq!(stats.deaths_since_sample, 0);
        assert_eq!(stats.fish.latest(), Some(10.0));
        assert_eq!(stats.totals.hatches, 1);
        assert_eq!(stats.totals.eaten, 2);
    }
}
