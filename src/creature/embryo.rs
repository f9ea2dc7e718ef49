//! Turns a genome into a body.

use crate::chemistry::Element;
use crate::config::Configuration;
use crate::creature::body::Body;
use crate::creature::organ::{Fiber, HeadTraits, Organ, SegmentTraits};
use crate::genomics::{Dna, HEAD_GENES, ORGAN_GENES};

/// Reads genes in order. Missing genes read as zero.
struct GeneReader<'a> {
    genes: &'a [u8],
}

impl GeneReader<'_> {
    fn gene(&self, index: usize) -> u8 {
        self.genes.get(index).copied().unwrap_or(0)
    }

    /// Gene mapped linearly onto `min..=max`.
    fn scaled(&self, index: usize, min: f64, max: f64) -> f64 {
        min + (max - min) * self.gene(index) as f64 / 255.0
    }

    fn fiber(&self, index: usize) -> Fiber {
        Fiber::new(self.gene(index), self.gene(index + 1), self.gene(index + 2))
    }
}

pub struct Embryo;

impl Embryo {
    /// Build the hatchling body encoded by `dna`.
    ///
    /// The first genes describe the head; every following chunk describes
    /// one segment, attached to an organ built before it.
    pub fn develop(dna: &Dna, config: &Configuration) -> Body {
        let genes = GeneReader { genes: dna.genes() };
        let size = config.physics.hatchling_size;

        let traits = HeadTraits {
            metabolic_rate: genes.scaled(5, 0.5, 2.0),
            byproduct: Element::BREATHABLE[genes.gene(6) as usize % Element::BREATHABLE.len()],
            wave_beat_ratio: genes.scaled(7, 0.5, 2.0),
            energy_to_children: genes.scaled(8, 0.1, 0.6),
            egg_interval: config.creature.min_egg_interval + genes.gene(9) as u64 * 10,
            egg_velocity: genes.scaled(10, 0.0, config.creature.max_egg_velocity),
        };
        let head = Organ::head(
            genes.scaled(0, 15.0, 60.0),
            genes.scaled(1, 5.0, 30.0),
            genes.fiber(2),
            traits,
            size,
        );

        let mut organs = vec![head];
        let segment_genes = dna.genes().len().saturating_sub(HEAD_GENES);
        for chunk in 0..segment_genes / ORGAN_GENES {
            if organs.len() >= config.creature.max_organs.max(1) {
                break;
            }
            let base = HEAD_GENES + chunk * ORGAN_GENES;
            let traits = SegmentTraits {
                rest_angle: genes.scaled(base + 3, -90.0, 90.0),
                amplitude: genes.scaled(base + 4, 0.0, 60.0),
                skew: genes.scaled(base + 5, -45.0, 45.0),
                delay: genes.scaled(base + 6, 0.0, 360.0),
            };
            organs.push(Organ::segment(
                genes.gene(base) as usize % organs.len(),
                genes.scaled(base + 1, 10.0, 60.0),
                genes.scaled(base + 2, 3.0, 23.0),
                genes.fiber(base + 7),
                traits,
                size,
            ));
        }

        Body::new(organs, &config.physics)
    }
}
