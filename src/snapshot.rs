//! Serializable view of an ecosystem, for visualizers and logs.
//!
//! Snapshots are plain data: entity ids are exported as their raw bits and
//! nothing in a snapshot refers back into the live ecosystem.

use crate::chemistry::Element;
use crate::ecosystem::Ecosystem;
use crate::things::Label;
use serde::{Deserialize, Serialize};

/// One organ, as a colored segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganSnapshot {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub thickness: f64,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarjilloSnapshot {
    pub id: u64,
    pub dna: u64,
    pub x: f64,
    pub y: f64,
    pub age: u64,
    pub energy: f64,
    pub max_energy: f64,
    pub breathes: Element,
    pub emits: Element,
    pub organs: Vec<OrganSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EggSnapshot {
    pub id: u64,
    pub dna: u64,
    pub x: f64,
    pub y: f64,
    pub age: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSnapshot {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmosphereSnapshot {
    pub oxygen: u64,
    pub hydrogen: u64,
    pub nitrogen: u64,
}

/// Complete ecosystem state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub size: f64,
    pub food_consumed: u64,
    pub atmosphere: AtmosphereSnapshot,
    pub narjillos: Vec<NarjilloSnapshot>,
    pub eggs: Vec<EggSnapshot>,
    pub food: Vec<FoodSnapshot>,
}

impl Snapshot {
    pub fn from_ecosystem(ecosystem: &Ecosystem) -> Self {
        let narjillos = ecosystem
            .narjillos()
            .iter()
            .filter_map(|&entity| {
                let narjillo = ecosystem.narjillo(entity)?;
                let position = narjillo.position();
                let organs = narjillo
                    .body()
                    .organs()
                    .iter()
                    .map(|organ| {
                        let (start, end) = (organ.start_point(), organ.end_point());
                        let fiber = organ.fiber();
                        OrganSnapshot {
                            start_x: start.x,
                            start_y: start.y,
                            end_x: end.x,
                            end_y: end.y,
                            thickness: organ.thickness(),
                            red: fiber.red,
                            green: fiber.green,
                            blue: fiber.blue,
                        }
                    })
                    .collect();
                Some(NarjilloSnapshot {
                    id: entity.to_bits(),
                    dna: narjillo.dna().0,
                    x: position.x,
                    y: position.y,
                    age: narjillo.age(),
                    energy: narjillo.energy().value(),
                    max_energy: narjillo.energy().max(),
                    breathes: narjillo.breathed_element(),
                    emits: narjillo.byproduct(),
                    organs,
                })
            })
            .collect();

        let eggs = ecosystem
            .things(Label::Egg)
            .into_iter()
            .filter_map(|entity| {
                let egg = ecosystem.egg(entity)?;
                Some(EggSnapshot {
                    id: entity.to_bits(),
                    dna: egg.dna().0,
                    x: egg.position().x,
                    y: egg.position().y,
                    age: egg.age(),
                })
            })
            .collect();

        let food = ecosystem
            .things(Label::Food)
            .into_iter()
            .filter_map(|entity| {
                let pellet = ecosystem.food(entity)?;
                Some(FoodSnapshot {
                    id: entity.to_bits(),
                    x: pellet.position.x,
                    y: pellet.position.y,
                })
            })
            .collect();

        let atmosphere = ecosystem.atmosphere();
        Self {
            tick: ecosystem.ticks(),
            size: ecosystem.size(),
            food_consumed: ecosystem.food_consumed(),
            atmosphere: AtmosphereSnapshot {
                oxygen: atmosphere.density(Element::Oxygen),
                hydrogen: atmosphere.density(Element::Hydrogen),
                nitrogen: atmosphere.density(Element::Nitrogen),
            },
            narjillos,
            eggs,
            food,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::genomics::GenePool;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_snapshot_survives_json() {
        let mut config = Configuration::default();
        config.ecosystem.size = 1000.0;
        config.ecosystem.worker_threads = 1;
        config.creature.egg_incubation_time = 0;
        config.creature.egg_hatch_probability = 1.0;
        let mut ecosystem = Ecosystem::new(config).unwrap();
        let mut pool = GenePool::new();
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        ecosystem.populate(&mut pool, &mut rng);
        ecosystem.tick(&mut pool, &mut rng).unwrap();

        let snapshot = ecosystem.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.narjillos.len(), 4);
        assert!(snapshot.eggs.is_empty());
        assert!(snapshot.narjillos.iter().all(|n| !n.organs.is_empty()));

        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap();
        assert_eq!(restored.narjillos.len(), snapshot.narjillos.len());
        assert_eq!(restored.food.len(), snapshot.food.len());
        assert_eq!(restored.atmosphere, snapshot.atmosphere);
    }
}
