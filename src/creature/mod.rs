//! Creatures and their eggs.

pub mod body;
pub mod egg;
pub mod embryo;
pub mod narjillo;
pub mod organ;

pub use body::Body;
pub use egg::Egg;
pub use embryo::Embryo;
pub use narjillo::{Narjillo, Target};
pub use organ::{Fiber, HeadTraits, Organ, OrganId, OrganKind, SegmentTraits};
