//! Synthetic traffic generation
//!
//! Drives dynamic packet-in rates for every switch when no live telemetry
//! is wired in. The simulator writes exactly the per-switch fields a live
//! agent's report would (rate plus projected loads via the shared
//! conversion factors), so the rest of the engine cannot tell the sources
//! apart.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::f64::consts::PI;

use config::balancing::{CONVERSION, INTENSITY_MAX, INTENSITY_MIN};

use crate::state::CoreState;

/// Traffic shape applied across the switch population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficPattern {
    /// All switches generate similar traffic.
    Uniform,
    /// A quarter of the switches carry several times the base rate.
    Hotspot,
    /// Periodic short-lived bursts on a rotating subset.
    Burst,
    /// Sinusoidal load that travels across controller domains.
    Wave,
    /// Heavy traffic everywhere, enough to force migrations.
    Stress,
}

impl TrafficPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            TrafficPattern::Uniform => "uniform",
            TrafficPattern::Hotspot => "hotspot",
            TrafficPattern::Burst => "burst",
            TrafficPattern::Wave => "wave",
            TrafficPattern::Stress => "stress",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "uniform" => Some(TrafficPattern::Uniform),
            "hotspot" => Some(TrafficPattern::Hotspot),
            "burst" => Some(TrafficPattern::Burst),
            "wave" => Some(TrafficPattern::Wave),
            "stress" => Some(TrafficPattern::Stress),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct TrafficSimulator {
    pattern: TrafficPattern,
    intensity: f64,
    tick: u64,
    rng: ChaCha8Rng,
    burst_targets: HashMap<String, f64>,
    burst_timer: i32,
}

impl TrafficSimulator {
    pub fn new(pattern: TrafficPattern, intensity: f64, seed: u64) -> Self {
        Self {
            pattern,
            intensity: intensity.clamp(INTENSITY_MIN, INTENSITY_MAX),
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            burst_targets: HashMap::new(),
            burst_timer: 0,
        }
    }

    pub fn pattern(&self) -> TrafficPattern {
        self.pattern
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Change pattern and intensity; burst bookkeeping restarts.
    pub fn set_pattern(&mut self, pattern: TrafficPattern, intensity: f64) {
        self.pattern = pattern;
        self.intensity = intensity.clamp(INTENSITY_MIN, INTENSITY_MAX);
        self.burst_targets.clear();
        self.burst_timer = 0;
    }

    /// Generate one tick of traffic for every switch.
    pub fn advance(&mut self, state: &mut CoreState) {
        self.tick += 1;

        let switch_ids: Vec<String> = state.switches.keys().cloned().collect();
        if switch_ids.is_empty() || state.controllers.is_empty() {
            return;
        }

        let rates = self.generate_rates(state, &switch_ids);

        for id in &switch_ids {
            let base = rates.get(id).copied().unwrap_or(10.0) * self.intensity;
            // Small multiplicative jitter so ticks never repeat exactly
            let rate = (base * (1.0 + self.gauss(0.05))).max(0.0);
            if let Some(sw) = state.switches.get_mut(id) {
                sw.apply_rate(rate, &CONVERSION);
            }
        }
    }

    fn generate_rates(&mut self, state: &CoreState, switch_ids: &[String]) -> HashMap<String, f64> {
        let mut rates = HashMap::with_capacity(switch_ids.len());

        match self.pattern {
            TrafficPattern::Uniform => {
                for id in switch_ids {
                    rates.insert(id.clone(), 50.0 + self.gauss(5.0));
                }
            }
            TrafficPattern::Hotspot => {
                let n_hot = (switch_ids.len() / 4).max(1);
                for (i, id) in switch_ids.iter().enumerate() {
                    let rate = if i < n_hot {
                        150.0 + self.gauss(20.0)
                    } else {
                        30.0 + self.gauss(5.0)
                    };
                    rates.insert(id.clone(), rate);
                }
            }
            TrafficPattern::Burst => {
                if self.tick % 15 == 0 || self.burst_targets.is_empty() {
                    let n_burst = (switch_ids.len() / 5).max(1);
                    let mut pool: Vec<&String> = switch_ids.iter().collect();
                    pool.shuffle(&mut self.rng);
                    self.burst_targets = pool
                        .into_iter()
                        .take(n_burst)
                        .map(|id| (id.clone(), 200.0 + self.rng.gen::<f64>() * 100.0))
                        .collect();
                    self.burst_timer = 10;
                }

                self.burst_timer -= 1;
                if self.burst_timer <= 0 {
                    self.burst_targets.clear();
                }

                for id in switch_ids {
                    let rate = self
                        .burst_targets
                        .get(id)
                        .copied()
                        .unwrap_or_else(|| 30.0 + self.gauss(5.0));
                    rates.insert(id.clone(), rate);
                }
            }
            TrafficPattern::Wave => {
                let t = self.tick as f64 * 0.15;
                let ctrl_ids: Vec<&String> = state.controllers.keys().collect();
                for id in switch_ids {
                    let owner = &state.switches[id].controller_id;
                    let idx = ctrl_ids.iter().position(|c| *c == owner).unwrap_or(0);
                    let phase = idx as f64 * (2.0 * PI / ctrl_ids.len() as f64);
                    let wave = (t + phase).sin();
                    rates.insert(id.clone(), 40.0 + 60.0 * (wave + 1.0) / 2.0);
                }
            }
            TrafficPattern::Stress => {
                for id in switch_ids {
                    rates.insert(id.clone(), 120.0 + self.gauss(30.0));
                }
            }
        }

        rates
    }

    /// Zero-mean Gaussian sample via Box-Muller.
    fn gauss(&mut self, std_dev: f64) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> CoreState {
        CoreState::from_topology(topology::load("custom"))
    }

    #[test]
    fn pattern_parsing_round_trips() {
        for name in ["uniform", "hotspot", "burst", "wave", "stress"] {
            assert_eq!(TrafficPattern::parse(name).unwrap().as_str(), name);
        }
        assert!(TrafficPattern::parse("tsunami").is_none());
    }

    #[test]
    fn advance_writes_rates_and_projected_loads() {
        let mut state = state();
        let mut sim = TrafficSimulator::new(TrafficPattern::Uniform, 1.0, 42);
        sim.advance(&mut state);

        for sw in state.switches.values() {
            assert!(sw.packet_in_rate > 0.0);
            // Projection stays consistent with the shared factors
            assert!((sw.load_cpu - sw.packet_in_rate * CONVERSION.cpu).abs() < 1e-9);
            assert!((sw.load_mem - sw.packet_in_rate * CONVERSION.mem).abs() < 1e-9);
            assert!((sw.load_bw - sw.packet_in_rate * CONVERSION.bw).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_generates_same_traffic() {
        let mut a = state();
        let mut b = state();
        let mut sim_a = TrafficSimulator::new(TrafficPattern::Wave, 1.0, 42);
        let mut sim_b = TrafficSimulator::new(TrafficPattern::Wave, 1.0, 42);
        for _ in 0..5 {
            sim_a.advance(&mut a);
            sim_b.advance(&mut b);
        }
        for (id, sw) in &a.switches {
            assert_eq!(sw.packet_in_rate, b.switches[id].packet_in_rate);
        }
    }

    #[test]
    fn hotspot_skews_traffic_to_the_first_quarter() {
        let mut state = state();
        let mut sim = TrafficSimulator::new(TrafficPattern::Hotspot, 1.0, 42);
        sim.advance(&mut state);

        let ids: Vec<String> = state.switches.keys().cloned().collect();
        let n_hot = (ids.len() / 4).max(1);
        let hot_avg: f64 = ids[..n_hot]
            .iter()
            .map(|id| state.switches[id].packet_in_rate)
            .sum::<f64>()
            / n_hot as f64;
        let cold_avg: f64 = ids[n_hot..]
            .iter()
            .map(|id| state.switches[id].packet_in_rate)
            .sum::<f64>()
            / (ids.len() - n_hot) as f64;
        assert!(hot_avg > cold_avg * 2.0);
    }

    #[test]
    fn intensity_is_clamped() {
        let sim = TrafficSimulator::new(TrafficPattern::Uniform, 50.0, 42);
        assert_eq!(sim.intensity(), INTENSITY_MAX);
        let sim = TrafficSimulator::new(TrafficPattern::Uniform, 0.0, 42);
        assert_eq!(sim.intensity(), INTENSITY_MIN);
    }
}
