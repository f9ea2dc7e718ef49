//! Atmospheric elements and the shared atmosphere.
//!
//! Creatures breathe one element and emit another. The atmosphere is shared
//! mutable state, so it is only ever converted on the scheduling thread.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    /// Neutral element. Breathing or emitting it is a no-op.
    Zero,
    Oxygen,
    Hydrogen,
    Nitrogen,
}

impl Element {
    pub const BREATHABLE: [Element; 3] = [Element::Oxygen, Element::Hydrogen, Element::Nitrogen];

    fn slot(self) -> Option<usize> {
        match self {
            Element::Zero => None,
            Element::Oxygen => Some(0),
            Element::Hydrogen => Some(1),
            Element::Nitrogen => Some(2),
        }
    }
}

/// Gas concentrations shared by every creature in an ecosystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atmosphere {
    densities: [u64; 3],
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

impl Atmosphere {
    /// Atmosphere with the same initial density for every element.
    pub fn new(initial_density: u64) -> Self {
        Self {
            densities: [initial_density; 3],
        }
    }

    /// Turn one unit of `consumed` into one unit of `emitted`.
    pub fn convert(&mut self, consumed: Element, emitted: Element) {
        let (Some(from), Some(to)) = (consumed.slot(), emitted.slot()) else {
            return;
        };
        if from == to || self.densities[from] == 0 {
            return;
        }
        self.densities[from] -= 1;
        self.densities[to] += 1;
    }

    pub fn density(&self, element: Element) -> u64 {
        element.slot().map(|slot| self.densities[slot]).unwrap_or(0)
    }

    pub fn density_percent(&self, element: Element) -> f64 {
        let total: u64 = self.densities.iter().sum();
        if total == 0 {
            return 0.0;
        }
        self.density(element) as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_moves_one_unit() {
        let mut atmosphere = Atmosphere::new(10);
        atmosphere.convert(Element::Oxygen, Element::Nitrogen);
        assert_eq!(atmosphere.density(Element::Oxygen), 9);
        assert_eq!(atmosphere.density(Element::Nitrogen), 11);
        assert_eq!(atmosphere.density(Element::Hydrogen), 10);
    }

    #[test]
    fn test_zero_element_is_inert() {
        let mut atmosphere = Atmosphere::new(10);
        atmosphere.convert(Element::Zero, Element::Oxygen);
        atmosphere.convert(Element::Hydrogen, Element::Zero);
        assert_eq!(atmosphere, Atmosphere::new(10));
    }

    #[test]
    fn test_exhausted_element_cannot_be_breathed() {
        let mut atmosphere = Atmosphere::new(1);
        atmosphere.convert(Element::Oxygen, Element::Hydrogen);
        atmosphere.convert(Element::Oxygen, Element::Hydrogen);
        assert_eq!(atmosphere.density(Element::Oxygen), 0);
        assert_eq!(atmosphere.density(Element::Hydrogen), 2);
        assert!((atmosphere.density_percent(Element::Hydrogen) - 2.0 / 3.0).abs() < 1e-9);
    }
}
