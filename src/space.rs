//! Spatial partitioning of food and eggs.
//!
//! The world is divided into square cells. Every stored thing lives in the
//! cell that contains its position, so neighbour and collision queries only
//! look at a handful of cells rather than at every thing.
//!
//! Narjillos are not stored here: nothing ever looks them up by position.

use crate::config::SpaceConfig;
use crate::physics::{Segment, Vector};
use crate::things::Label;
use bevy_ecs::prelude::*;
use std::collections::{BTreeMap, HashMap};

type Cell = (i64, i64);

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub position: Vector,
    pub label: Label,
}

#[derive(Debug, Clone)]
pub struct Space {
    cell_size: f64,
    collision_distance: f64,
    cells: HashMap<Cell, Vec<SpatialEntry>>,
    /// Reverse lookup: entity to cell. Ordered so that listings are stable.
    entity_cells: BTreeMap<Entity, (Cell, Label)>,
    counts: [usize; 3],
}

impl Space {
    pub fn new(cell_size: f64, collision_distance: f64) -> Self {
        Self {
            cell_size,
            collision_distance,
            cells: HashMap::new(),
            entity_cells: BTreeMap::new(),
            counts: [0; 3],
        }
    }

    pub fn from_config(config: &SpaceConfig) -> Self {
        Self::new(config.cell_size, config.collision_distance)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn collision_distance(&self) -> f64 {
        self.collision_distance
    }

    #[inline]
    fn world_to_cell(&self, position: Vector) -> Cell {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Store a thing. Adding a thing twice moves it.
    pub fn add(&mut self, entity: Entity, position: Vector, label: Label) {
        self.remove(entity);
        let cell = self.world_to_cell(position);
        self.cells.entry(cell).or_default().push(SpatialEntry { entity, position, label });
        self.entity_cells.insert(entity, (cell, label));
        self.counts[label.index()] += 1;
    }

    /// Move a stored thing. Returns false if it is not stored.
    pub fn update_position(&mut self, entity: Entity, position: Vector) -> bool {
        let Some(&(old_cell, label)) = self.entity_cells.get(&entity) else {
            return false;
        };
        let cell = self.world_to_cell(position);
        if cell == old_cell {
            if let Some(entry) = self
                .cells
                .get_mut(&cell)
                .and_then(|entries| entries.iter_mut().find(|entry| entry.entity == entity))
            {
                entry.position = position;
            }
        } else {
            self.add(entity, position, label);
        }
        true
    }

    /// Remove a thing. Returns false if it was not stored.
    pub fn remove(&mut self, entity: Entity) -> bool {
        let Some((cell, label)) = self.entity_cells.remove(&entity) else {
            return false;
        };
        if let Some(entries) = self.cells.get_mut(&cell) {
            entries.retain(|entry| entry.entity != entity);
            if entries.is_empty() {
                self.cells.remove(&cell);
            }
        }
        self.counts[label.index()] -= 1;
        true
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entity_cells.contains_key(&entity)
    }

    pub fn count(&self, label: Label) -> usize {
        self.counts[label.index()]
    }

    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }

    pub fn position_of(&self, entity: Entity) -> Option<Vector> {
        let (cell, _) = self.entity_cells.get(&entity)?;
        self.cells
            .get(cell)?
            .iter()
            .find(|entry| entry.entity == entity)
            .map(|entry| entry.position)
    }

    /// All things with `label`, ordered by entity.
    pub fn get_all(&self, label: Label) -> Vec<Entity> {
        self.entity_cells
            .iter()
            .filter(|(_, (_, entry_label))| *entry_label == label)
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// Closest stored thing with `label` to another stored thing, never
    /// the thing itself.
    pub fn find_closest_to(&self, entity: Entity, label: Label) -> Option<Entity> {
        let position = self.position_of(entity)?;
        self.find_closest(position, label, Some(entity))
    }

    /// Closest thing with `label` to `position`, skipping `except`.
    ///
    /// Searches rings of cells around `position`, stopping as soon as no
    /// unvisited cell can hold anything closer than the best match.
    pub fn find_closest(&self, position: Vector, label: Label, except: Option<Entity>) -> Option<Entity> {
        let total = self.count(label);
        if total == 0 {
            return None;
        }

        let center = self.world_to_cell(position);
        let mut best: Option<(f64, Entity)> = None;
        let mut visited = 0;
        let mut ring = 0;
        loop {
            for cell in ring_cells(center, ring) {
                let Some(entries) = self.cells.get(&cell) else {
                    continue;
                };
                for entry in entries.iter().filter(|entry| entry.label == label) {
                    visited += 1;
                    if Some(entry.entity) == except {
                        continue;
                    }
                    let distance = entry.position.distance_to(position);
                    let closer = match best {
                        None => true,
                        Some((best_distance, best_entity)) => {
                            distance < best_distance
                                || (distance == best_distance && entry.entity < best_entity)
                        }
                    };
                    if closer {
                        best = Some((distance, entry.entity));
                    }
                }
            }

            if visited >= total {
                break;
            }
            // Anything beyond this ring is at least this far away.
            if let Some((distance, _)) = best {
                if distance < ring as f64 * self.cell_size {
                    break;
                }
            }
            ring += 1;
        }

        best.map(|(_, entity)| entity)
    }

    /// Things with `label` within collision distance of a movement.
    pub fn detect_collisions(&self, movement: &Segment, label: Label) -> Vec<Entity> {
        let start = movement.start;
        let end = movement.end();
        let reach = self.collision_distance;
        let (min_x, min_y) = self.world_to_cell(Vector::cartesian(
            start.x.min(end.x) - reach,
            start.y.min(end.y) - reach,
        ));
        let (max_x, max_y) = self.world_to_cell(Vector::cartesian(
            start.x.max(end.x) + reach,
            start.y.max(end.y) + reach,
        ));

        let mut collisions = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                let Some(entries) = self.cells.get(&(x, y)) else {
                    continue;
                };
                collisions.extend(
                    entries
                        .iter()
                        .filter(|entry| {
                            entry.label == label && movement.distance_from_point(entry.position) <= reach
                        })
                        .map(|entry| entry.entity),
                );
            }
        }
        collisions
    }
}

/// Cells at exactly `ring` steps (Chebyshev distance) from `center`.
fn ring_cells(center: Cell, ring: i64) -> Vec<Cell> {
    if ring == 0 {
        return vec![center];
    }
    let mut cells = Vec::with_capacity(8 * ring as usize);
    for dx in -ring..=ring {
        for dy in -ring..=ring {
            if dx.abs() == ring || dy.abs() == ring {
                cells.push((center.0 + dx, center.1 + dy));
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> Space {
        Space::new(10.0, 2.0)
    }

    #[test]
    fn test_add_remove_and_count() {
        let mut space = space();
        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);

        space.add(e1, Vector::cartesian(5.0, 5.0), Label::Food);
        space.add(e2, Vector::cartesian(15.0, 5.0), Label::Egg);
        assert_eq!(space.count(Label::Food), 1);
        assert_eq!(space.count(Label::Egg), 1);
        assert!(space.contains(e1));

        // Adding again moves rather than duplicates.
        space.add(e1, Vector::cartesian(25.0, 5.0), Label::Food);
        assert_eq!(space.count(Label::Food), 1);
        assert_eq!(space.position_of(e1), Some(Vector::cartesian(25.0, 5.0)));

        assert!(space.remove(e1));
        assert!(!space.remove(e1));
        assert_eq!(space.count(Label::Food), 0);
        assert_eq!(space.total_count(), 1);
    }

    #[test]
    fn test_get_all_is_ordered_and_filtered() {
        let mut space = space();
        for raw in [7, 3, 5] {
            space.add(Entity::from_raw(raw), Vector::cartesian(raw as f64 * 20.0, 0.0), Label::Food);
        }
        space.add(Entity::from_raw(4), Vector::ZERO, Label::Egg);

        assert_eq!(
            space.get_all(Label::Food),
            vec![Entity::from_raw(3), Entity::from_raw(5), Entity::from_raw(7)]
        );
        assert_eq!(space.get_all(Label::Egg), vec![Entity::from_raw(4)]);
    }

    #[test]
    fn test_find_closest_never_returns_self() {
        let mut space = space();
        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);
        let e3 = Entity::from_raw(3);

        space.add(e1, Vector::ZERO, Label::Egg);
        assert_eq!(space.find_closest_to(e1, Label::Egg), None);

        space.add(e2, Vector::cartesian(300.0, 0.0), Label::Egg);
        space.add(e3, Vector::cartesian(200.0, 40.0), Label::Egg);
        assert_eq!(space.find_closest_to(e1, Label::Egg), Some(e3));
        assert_eq!(space.find_closest_to(e2, Label::Egg), Some(e3));
    }

    #[test]
    fn test_find_closest_crosses_cell_boundaries() {
        let mut space = space();
        let near_but_other_cell = Entity::from_raw(1);
        let same_cell_far = Entity::from_raw(2);

        space.add(near_but_other_cell, Vector::cartesian(10.5, 0.5), Label::Food);
        space.add(same_cell_far, Vector::cartesian(0.5, 9.5), Label::Food);

        let closest = space.find_closest(Vector::cartesian(9.5, 0.5), Label::Food, None);
        assert_eq!(closest, Some(near_but_other_cell));
        assert_eq!(space.find_closest(Vector::ZERO, Label::Egg, None), None);
    }

    #[test]
    fn test_detect_collisions_along_movement() {
        let mut space = space();
        let on_path = Entity::from_raw(1);
        let near_path = Entity::from_raw(2);
        let off_path = Entity::from_raw(3);
        let egg = Entity::from_raw(4);

        space.add(on_path, Vector::cartesian(15.0, 0.0), Label::Food);
        space.add(near_path, Vector::cartesian(25.0, 1.5), Label::Food);
        space.add(off_path, Vector::cartesian(15.0, 5.0), Label::Food);
        space.add(egg, Vector::cartesian(20.0, 0.0), Label::Egg);

        let movement = Segment::between(Vector::ZERO, Vector::cartesian(30.0, 0.0));
        let mut hits = space.detect_collisions(&movement, Label::Food);
        hits.sort();
        assert_eq!(hits, vec![on_path, near_path]);

        // A still thing only collides with what is under it.
        let still = Segment::between(Vector::cartesian(15.0, 1.0), Vector::cartesian(15.0, 1.0));
        assert_eq!(space.detect_collisions(&still, Label::Food), vec![on_path]);
    }

    #[test]
    fn test_update_position_moves_between_cells() {
        let mut space = space();
        let egg = Entity::from_raw(1);
        space.add(egg, Vector::cartesian(1.0, 1.0), Label::Egg);

        assert!(space.update_position(egg, Vector::cartesian(2.0, 2.0)));
        assert!(space.update_position(egg, Vector::cartesian(55.0, 2.0)));
        assert_eq!(space.position_of(egg), Some(Vector::cartesian(55.0, 2.0)));
        assert_eq!(space.count(Label::Egg), 1);
        assert!(!space.update_position(Entity::from_raw(9), Vector::ZERO));
    }
}
