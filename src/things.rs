//! Things that populate an ecosystem: food pellets, eggs and narjillos.

use crate::creature::{Egg, Narjillo};
use crate::physics::Vector;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// A pellet of food. Never moves.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodPellet {
    pub position: Vector,
    pub energy: f64,
}

impl FoodPellet {
    pub fn new(position: Vector, energy: f64) -> Self {
        Self { position, energy }
    }
}

/// Kind of a thing, used to filter spatial queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Food,
    Egg,
    Narjillo,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Food, Label::Egg, Label::Narjillo];

    pub(crate) fn index(self) -> usize {
        match self {
            Label::Food => 0,
            Label::Egg => 1,
            Label::Narjillo => 2,
        }
    }
}

/// Borrowed view of any thing in the ecosystem.
#[derive(Debug, Clone, Copy)]
pub enum Thing<'a> {
    Food(&'a FoodPellet),
    Egg(&'a Egg),
    Narjillo(&'a Narjillo),
}

impl Thing<'_> {
    pub fn label(&self) -> Label {
        match self {
            Thing::Food(_) => Label::Food,
            Thing::Egg(_) => Label::Egg,
            Thing::Narjillo(_) => Label::Narjillo,
        }
    }

    pub fn position(&self) -> Vector {
        match self {
            Thing::Food(food) => food.position,
            Thing::Egg(egg) => egg.position(),
            Thing::Narjillo(narjillo) => narjillo.position(),
        }
    }

    pub fn energy(&self) -> f64 {
        match self {
            Thing::Food(food) => food.energy,
            Thing::Egg(egg) => egg.energy(),
            Thing::Narjillo(narjillo) => narjillo.energy().value(),
        }
    }

    pub fn is_movable(&self) -> bool {
        !matches!(self, Thing::Food(_))
    }
}

/// Observer of things entering and leaving an ecosystem. Called on the
/// thread that runs the tick, once per event.
pub trait ThingListener: Send {
    fn thing_added(&mut self, entity: Entity, label: Label);
    fn thing_removed(&mut self, entity: Entity, label: Label);
}
