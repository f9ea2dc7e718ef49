//! Energy budget of things in the ecosystem.

use crate::config::CreatureConfig;
use serde::{Deserialize, Serialize};

/// A depleting, age-capped energy budget.
///
/// The cap starts at `initial * max_energy_to_initial_energy` and decays
/// linearly to zero over the lifespan. Once the value reaches zero the
/// energy is depleted for good.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Energy {
    /// Never depletes. Always reports its max value and ignores ticks.
    Infinite,
    Finite {
        initial: f64,
        value: f64,
        max_for_age: f64,
        decay: f64,
    },
}

impl Energy {
    pub fn new(initial: f64, lifespan: f64, max_to_initial: f64) -> Self {
        let max_for_age = initial * max_to_initial;
        Energy::Finite {
            initial,
            value: initial,
            max_for_age,
            decay: if lifespan > 0.0 { max_for_age / lifespan } else { max_for_age },
        }
    }

    pub fn for_creature(initial: f64, config: &CreatureConfig) -> Self {
        Self::new(initial, config.lifespan, config.max_energy_to_initial_energy)
    }

    pub fn value(&self) -> f64 {
        match self {
            Energy::Infinite => 1.0,
            Energy::Finite { value, .. } => *value,
        }
    }

    pub fn initial_value(&self) -> f64 {
        match self {
            Energy::Infinite => 1.0,
            Energy::Finite { initial, .. } => *initial,
        }
    }

    /// Current age-dependent cap.
    pub fn max(&self) -> f64 {
        match self {
            Energy::Infinite => 1.0,
            Energy::Finite { max_for_age, .. } => *max_for_age,
        }
    }

    pub fn is_depleted(&self) -> bool {
        match self {
            Energy::Infinite => false,
            Energy::Finite { value, .. } => *value <= 0.0,
        }
    }

    pub fn percent_of_initial_value(&self) -> f64 {
        match self {
            Energy::Infinite => 1.0,
            Energy::Finite { initial, value, .. } => {
                if *value <= 0.0 || *initial <= 0.0 {
                    0.0
                } else {
                    (value / initial).min(1.0)
                }
            }
        }
    }

    /// Age by one tick, then apply the net energy change.
    pub fn tick(&mut self, spent: f64, gained: f64) {
        if let Energy::Finite { max_for_age, decay, .. } = self {
            *max_for_age -= *decay;
        }
        if self.is_depleted() {
            return;
        }
        self.increase_by(gained - spent);
    }

    /// Absorb `amount` of energy, for example from a food pellet.
    pub fn consume(&mut self, amount: f64) {
        if !self.is_depleted() {
            self.increase_by(amount);
        }
    }

    /// Give away a fraction of the current value. Refuses (returning zero)
    /// if what is left would fall below the initial value.
    pub fn transfer(&mut self, fraction: f64) -> f64 {
        match self {
            Energy::Infinite => 0.0,
            Energy::Finite { initial, value, .. } => {
                let transferred = *value * fraction;
                if transferred <= 0.0 || *value - transferred < *initial {
                    return 0.0;
                }
                *value -= transferred;
                transferred
            }
        }
    }

    fn increase_by(&mut self, amount: f64) {
        if let Energy::Finite { value, max_for_age, .. } = self {
            *value = (*value + amount).min(*max_for_age).max(0.0);
        }
    }
}
