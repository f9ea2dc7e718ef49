//! DNA and the gene pool.
//!
//! The gene pool hands out serial ids for every genome it creates and keeps
//! track of which genomes belong to living creatures. The ecosystem only
//! asks it for new (mutated) genomes and tells it when a creature dies.

use crate::error::SimError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Genes that describe the head.
pub const HEAD_GENES: usize = 11;
/// Genes that describe each additional organ.
pub const ORGAN_GENES: usize = 10;

const MAX_RANDOM_ORGANS: usize = 6;
const MAX_MUTATION_STEP: i16 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DnaId(pub u64);

impl fmt::Display for DnaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A genome: a string of genes, each in 0..=255.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dna {
    id: DnaId,
    genes: Vec<u8>,
    parent: Option<DnaId>,
}

impl Dna {
    pub fn new(id: DnaId, genes: Vec<u8>, parent: Option<DnaId>) -> Self {
        Self { id, genes, parent }
    }

    pub fn random<R: Rng + ?Sized>(id: DnaId, rng: &mut R) -> Self {
        let organs = rng.gen_range(1..=MAX_RANDOM_ORGANS);
        let genes = (0..HEAD_GENES + organs * ORGAN_GENES).map(|_| rng.gen()).collect();
        Self::new(id, genes, None)
    }

    /// Parse the textual form, e.g. `{001_255_032}`.
    pub fn parse_genes(text: &str) -> Result<Vec<u8>, SimError> {
        let inner = text
            .trim()
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| SimError::MalformedDna(text.to_string()))?;
        if inner.is_empty() {
            return Ok(Vec::new());
        }
        inner
            .split('_')
            .map(|gene| {
                gene.trim()
                    .parse::<u8>()
                    .map_err(|_| SimError::MalformedDna(text.to_string()))
            })
            .collect()
    }

    pub fn id(&self) -> DnaId {
        self.id
    }

    pub fn genes(&self) -> &[u8] {
        &self.genes
    }

    pub fn parent(&self) -> Option<DnaId> {
        self.parent
    }

    /// Copy with every gene independently mutated with probability `rate`.
    pub fn mutate<R: Rng + ?Sized>(&self, id: DnaId, rate: f64, rng: &mut R) -> Dna {
        let genes = self
            .genes
            .iter()
            .map(|&gene| {
                if rng.gen::<f64>() < rate {
                    let step = rng.gen_range(-MAX_MUTATION_STEP..=MAX_MUTATION_STEP);
                    (gene as i16 + step).clamp(0, 255) as u8
                } else {
                    gene
                }
            })
            .collect();
        Dna::new(id, genes, Some(self.id))
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, gene) in self.genes.iter().enumerate() {
            if index > 0 {
                write!(f, "_")?;
            }
            write!(f, "{:03}", gene)?;
        }
        write!(f, "}}")
    }
}

/// Registry of every genome ever created and of the ones still alive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenePool {
    serial_id: u64,
    history: BTreeMap<DnaId, Dna>,
    current: BTreeSet<DnaId>,
}

impl GenePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_random_dna<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DnaId {
        let dna = Dna::random(self.next_id(), rng);
        self.register(dna)
    }

    pub fn create_dna(&mut self, text: &str) -> Result<DnaId, SimError> {
        let genes = Dna::parse_genes(text)?;
        let dna = Dna::new(self.next_id(), genes, None);
        Ok(self.register(dna))
    }

    pub fn mutate_dna<R: Rng + ?Sized>(
        &mut self,
        parent: DnaId,
        rate: f64,
        rng: &mut R,
    ) -> Result<DnaId, SimError> {
        let id = DnaId(self.serial_id + 1);
        let child = self
            .history
            .get(&parent)
            .ok_or(SimError::UnknownDna(parent))?
            .mutate(id, rate, rng);
        self.serial_id = id.0;
        Ok(self.register(child))
    }

    /// Forget a genome whose creature died. It stays in the history.
    pub fn remove_genome(&mut self, id: DnaId) {
        self.current.remove(&id);
    }

    pub fn dna(&self, id: DnaId) -> Option<&Dna> {
        self.history.get(&id)
    }

    pub fn current_pool(&self) -> &BTreeSet<DnaId> {
        &self.current
    }

    pub fn current_serial_id(&self) -> u64 {
        self.serial_id
    }

    /// Lineage from the oldest ancestor down to `id`.
    pub fn ancestry(&self, id: DnaId) -> Vec<DnaId> {
        let mut lineage = Vec::new();
        let mut next = self.history.get(&id);
        while let Some(dna) = next {
            lineage.push(dna.id());
            next = dna.parent().and_then(|parent| self.history.get(&parent));
        }
        lineage.reverse();
        lineage
    }

    /// Generation of a genome. Genomes without a parent are generation 1.
    pub fn generation_of(&self, id: DnaId) -> usize {
        self.ancestry(id).len()
    }

    pub fn average_generation(&self) -> f64 {
        if self.current.is_empty() {
            return 0.0;
        }
        let total: usize = self.current.iter().map(|&id| self.generation_of(id)).sum();
        total as f64 / self.current.len() as f64
    }

    fn next_id(&mut self) -> DnaId {
        self.serial_id += 1;
        DnaId(self.serial_id)
    }

    fn register(&mut self, dna: Dna) -> DnaId {
        let id = dna.id();
        self.current.insert(id);
        self.history.insert(id, dna);
        id
    }
}
