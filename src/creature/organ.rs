//! Organs: the rigid segments a creature's body is made of.
//!
//! Organs live in an arena owned by their `Body` and refer to each other by
//! index. The head is always organ zero.

use crate::chemistry::Element;
use crate::physics::{Angle, Segment, Vector};
use serde::{Deserialize, Serialize};

/// Index of an organ inside its body.
pub type OrganId = usize;

/// Color of an organ's fibers. Decides which element the creature breathes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fiber {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Fiber {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red, green and blue shares. They always sum to one.
    pub fn percentages(&self) -> (f64, f64, f64) {
        let total = self.red as f64 + self.green as f64 + self.blue as f64;
        if total == 0.0 {
            return (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
        }
        (
            self.red as f64 / total,
            self.green as f64 / total,
            self.blue as f64 / total,
        )
    }
}

/// Traits carried by the head. They drive metabolism and reproduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadTraits {
    pub metabolic_rate: f64,
    pub byproduct: Element,
    pub wave_beat_ratio: f64,
    /// Fraction of its energy a creature gives to each egg.
    pub energy_to_children: f64,
    pub egg_interval: u64,
    pub egg_velocity: f64,
}

/// Movement program of a body segment, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentTraits {
    /// Angle to the parent when the segment is at rest.
    pub rest_angle: f64,
    /// Oscillation amplitude around the rest angle.
    pub amplitude: f64,
    /// How much the segment bends toward the target.
    pub skew: f64,
    /// Phase lag behind the head's brain wave.
    pub delay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrganKind {
    Head(HeadTraits),
    Segment(SegmentTraits),
}

#[derive(Debug, Clone)]
pub struct Organ {
    pub kind: OrganKind,
    pub(crate) parent: Option<OrganId>,
    pub(crate) children: Vec<OrganId>,
    adult_length: f64,
    adult_thickness: f64,
    length: f64,
    thickness: f64,
    fiber: Fiber,
    /// For the head, this is its absolute angle.
    pub(crate) angle_to_parent: f64,
    pub(crate) absolute_angle: f64,
    pub(crate) position: Segment,
}

impl Organ {
    pub fn head(length: f64, thickness: f64, fiber: Fiber, traits: HeadTraits, size: f64) -> Self {
        Self::new(OrganKind::Head(traits), None, length, thickness, fiber, 0.0, size)
    }

    pub fn segment(
        parent: OrganId,
        length: f64,
        thickness: f64,
        fiber: Fiber,
        traits: SegmentTraits,
        size: f64,
    ) -> Self {
        let rest_angle = traits.rest_angle;
        Self::new(OrganKind::Segment(traits), Some(parent), length, thickness, fiber, rest_angle, size)
    }

    fn new(
        kind: OrganKind,
        parent: Option<OrganId>,
        adult_length: f64,
        adult_thickness: f64,
        fiber: Fiber,
        angle_to_parent: f64,
        size: f64,
    ) -> Self {
        let size = size.clamp(0.0, 1.0);
        Self {
            kind,
            parent,
            children: Vec::new(),
            adult_length,
            adult_thickness,
            length: adult_length * size,
            thickness: adult_thickness * size,
            fiber,
            angle_to_parent,
            absolute_angle: angle_to_parent,
            position: Segment::default(),
        }
    }

    pub fn parent(&self) -> Option<OrganId> {
        self.parent
    }

    pub fn children(&self) -> &[OrganId] {
        &self.children
    }

    pub fn fiber(&self) -> Fiber {
        self.fiber
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn mass(&self) -> f64 {
        self.length * self.thickness
    }

    pub fn adult_mass(&self) -> f64 {
        self.adult_length * self.adult_thickness
    }

    pub fn absolute_angle(&self) -> f64 {
        self.absolute_angle
    }

    pub fn position_in_space(&self) -> Segment {
        self.position
    }

    pub fn start_point(&self) -> Vector {
        self.position.start
    }

    pub fn end_point(&self) -> Vector {
        self.position.end()
    }

    pub fn center_of_mass(&self) -> Vector {
        self.position.center()
    }

    pub fn is_grown(&self) -> bool {
        self.length >= self.adult_length && self.thickness >= self.adult_thickness
    }

    /// Grow by `rate` of the adult size, up to the adult size.
    pub(crate) fn grow(&mut self, rate: f64) {
        self.length = (self.length + self.adult_length * rate).min(self.adult_length);
        self.thickness = (self.thickness + self.adult_thickness * rate).min(self.adult_thickness);
    }

    pub(crate) fn grow_to_adult(&mut self) {
        self.length = self.adult_length;
        self.thickness = self.adult_thickness;
    }

    /// Place the organ given where it starts and the absolute angle of its parent.
    pub(crate) fn place(&mut self, start: Vector, parent_angle: f64) {
        self.absolute_angle = Angle::normalize(parent_angle + self.angle_to_parent);
        self.position = Segment::new(start, Vector::polar(self.absolute_angle, self.length));
    }

    pub(crate) fn shift(&mut self, offset: Vector) {
        self.position.start = self.position.start.plus(offset);
    }
}
