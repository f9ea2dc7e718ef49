//! Geometry and the per-tick force engines used by creature bodies.
//!
//! A body reshapes itself as if it were in a vacuum, then the two engines
//! turn the organs' movements into one corrective rotation and one
//! corrective translation, each with the energy it costs.

pub mod rotations;
pub mod translations;
pub mod vector;
pub mod viscosity;

pub use rotations::RotationsPhysicsEngine;
pub use translations::TranslationsPhysicsEngine;
pub use vector::{Angle, Segment, Vector, ZeroVectorAngle};
pub use viscosity::Viscosity;
