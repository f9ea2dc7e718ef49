//! The physical body of a creature and its per-tick physics solve.
//!
//! `Body::tick` is the core movement algorithm. Organs reshape themselves as
//! if the body were floating in a vacuum; the rotation and translation force
//! fields then turn those internal movements into a rigid motion of the
//! whole body, and the energy spent doing it is returned.
//!
//! The order of the steps matters: every step after the reshaping compares
//! the current geometry against values captured before it.

use crate::chemistry::Element;
use crate::config::PhysicsConfig;
use crate::creature::organ::{HeadTraits, Organ, OrganId, OrganKind};
use crate::physics::{
    Angle, RotationsPhysicsEngine, Segment, TranslationsPhysicsEngine, Vector, ZeroVectorAngle,
};
use std::sync::OnceLock;

const MIN_RADIUS: f64 = 1.0;

/// Center of mass and radius, valid for one geometry generation.
#[derive(Debug, Clone, Default)]
struct GeometryCache {
    generation: u64,
    value: OnceLock<(Vector, f64)>,
}

impl GeometryCache {
    fn invalidate(&mut self) {
        self.generation += 1;
        self.value = OnceLock::new();
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    organs: Vec<Organ>,
    /// Depth-first order, head first. Parents always precede children.
    traversal: Vec<OrganId>,
    metabolic_consumption: f64,
    adult_mass: f64,
    mass: f64,
    red_mass: f64,
    green_mass: f64,
    blue_mass: f64,
    brain_wave_angle: f64,
    geometry: GeometryCache,
}

impl Body {
    /// Assemble a body from organs. `organs[0]` must be the head; every
    /// other organ names an earlier organ as its parent (anything else is
    /// attached to the head).
    pub fn new(mut organs: Vec<Organ>, physics: &PhysicsConfig) -> Self {
        for id in 1..organs.len() {
            let parent = match organs[id].parent {
                Some(parent) if parent < id => parent,
                _ => 0,
            };
            organs[id].parent = Some(parent);
            organs[parent].children.push(id);
        }
        if let Some(head) = organs.first_mut() {
            head.parent = None;
        }

        let traversal = depth_first(&organs);
        let adult_mass = organs.iter().map(Organ::adult_mass).sum();
        let metabolic_rate = match organs.first().map(|organ| organ.kind) {
            Some(OrganKind::Head(traits)) => traits.metabolic_rate,
            _ => 1.0,
        };

        let mut body = Self {
            organs,
            traversal,
            metabolic_consumption: metabolic_rate.powf(physics.metabolic_consumption_exponent),
            adult_mass,
            mass: 0.0,
            red_mass: 0.0,
            green_mass: 0.0,
            blue_mass: 0.0,
            brain_wave_angle: 0.0,
            geometry: GeometryCache::default(),
        };
        body.update_geometry();
        body.update_masses();
        body
    }

    pub fn organs(&self) -> &[Organ] {
        &self.organs
    }

    pub fn head(&self) -> &Organ {
        &self.organs[0]
    }

    pub fn head_traits(&self) -> HeadTraits {
        match self.head().kind {
            OrganKind::Head(traits) => traits,
            OrganKind::Segment(_) => HeadTraits {
                metabolic_rate: 1.0,
                byproduct: Element::Zero,
                wave_beat_ratio: 1.0,
                energy_to_children: 0.0,
                egg_interval: u64::MAX,
                egg_velocity: 0.0,
            },
        }
    }

    /// Position of the mouth, at the start of the head.
    pub fn start_point(&self) -> Vector {
        self.head().start_point()
    }

    /// Heading of the body. The head trails behind the mouth.
    pub fn angle(&self) -> f64 {
        Angle::normalize(self.head().absolute_angle() + 180.0)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn red_mass(&self) -> f64 {
        self.red_mass
    }

    pub fn green_mass(&self) -> f64 {
        self.green_mass
    }

    pub fn blue_mass(&self) -> f64 {
        self.blue_mass
    }

    pub fn adult_mass(&self) -> f64 {
        self.adult_mass
    }

    pub fn metabolic_consumption(&self) -> f64 {
        self.metabolic_consumption
    }

    pub fn geometry_generation(&self) -> u64 {
        self.geometry.generation
    }

    pub fn has_stopped_growing(&self) -> bool {
        self.mass >= self.adult_mass
    }

    pub fn byproduct(&self) -> Element {
        self.head_traits().byproduct
    }

    /// Red-heavy bodies breathe oxygen, green-heavy hydrogen, the rest
    /// nitrogen. A body that would breathe its own byproduct breathes nothing.
    pub fn breathed_element(&self) -> Element {
        let element = if self.red_mass > self.green_mass && self.red_mass > self.blue_mass {
            Element::Oxygen
        } else if self.green_mass > self.blue_mass {
            Element::Hydrogen
        } else {
            Element::Nitrogen
        };
        if element == self.byproduct() {
            Element::Zero
        } else {
            element
        }
    }

    pub fn center_of_mass(&self) -> Vector {
        self.cached_geometry().0
    }

    pub fn radius(&self) -> f64 {
        self.cached_geometry().1
    }

    fn cached_geometry(&self) -> (Vector, f64) {
        *self.geometry.value.get_or_init(|| {
            let center = self.calculate_center_of_mass();
            (center, self.calculate_radius(center))
        })
    }

    /// Move the mouth to `position`, pointing the head along `angle`.
    pub fn force_position(&mut self, position: Vector, angle: f64) {
        let head = &mut self.organs[0];
        head.angle_to_parent = angle;
        head.position.start = position;
        self.update_geometry();
        self.geometry.invalidate();
    }

    pub fn grow_to_adult_form(&mut self) {
        for organ in &mut self.organs {
            organ.grow_to_adult();
        }
        self.update_geometry();
        self.update_masses();
        self.geometry.invalidate();
    }

    /// Move toward `target_direction` and return the energy consumed.
    pub fn tick(
        &mut self,
        target_direction: Vector,
        physics: &PhysicsConfig,
    ) -> Result<f64, ZeroVectorAngle> {
        // Angles are stored rather than recomputed from the positions later.
        let initial_center_of_mass = self.calculate_center_of_mass();
        let initial_angles: Vec<f64> = self.organs.iter().map(Organ::absolute_angle).collect();
        let initial_positions: Vec<Segment> =
            self.organs.iter().map(Organ::position_in_space).collect();

        let angle_to_target = self.angle_to(target_direction)?;
        self.reshape(angle_to_target, physics);

        // Fully grown bodies keep their mass.
        if !self.has_stopped_growing() {
            self.update_masses();
        }

        let rotation_energy = self.rotate(&initial_angles, initial_center_of_mass, physics);

        // Reshaping alone must not displace the center of mass.
        let center_after_rotation = self.calculate_center_of_mass();
        self.translate_by(initial_center_of_mass.minus(center_after_rotation));

        // Without a target, growth is not thrust.
        let translation_energy = match angle_to_target {
            Some(_) => self.translate(&initial_positions, physics),
            None => 0.0,
        };

        self.geometry.invalidate();
        Ok((rotation_energy + translation_energy) * self.metabolic_consumption)
    }

    /// Recompute total and per-color mass from the organs.
    pub fn update_masses(&mut self) {
        self.mass = 0.0;
        self.red_mass = 0.0;
        self.green_mass = 0.0;
        self.blue_mass = 0.0;
        for organ in &self.organs {
            let mass = organ.mass();
            let (red, green, blue) = organ.fiber().percentages();
            self.mass += mass;
            self.red_mass += mass * red;
            self.green_mass += mass * green;
            self.blue_mass += mass * blue;
        }
    }

    fn angle_to(&self, direction: Vector) -> Result<Option<f64>, ZeroVectorAngle> {
        if direction.is_zero() {
            return Ok(None);
        }
        Ok(Some(Angle::normalize(self.angle() - direction.angle()?)))
    }

    /// Organs grow and move according to their own program. Without a
    /// target they hold their pose.
    fn reshape(&mut self, angle_to_target: Option<f64>, physics: &PhysicsConfig) {
        for organ in &mut self.organs {
            organ.grow(physics.growth_rate);
        }

        if let Some(angle_to_target) = angle_to_target {
            let beat = self.head_traits().wave_beat_ratio;
            self.brain_wave_angle =
                Angle::normalize(self.brain_wave_angle + physics.wave_speed * beat);
            let brain_wave = self.brain_wave_angle;

            for &id in &self.traversal {
                let organ = &mut self.organs[id];
                if let OrganKind::Segment(traits) = organ.kind {
                    organ.angle_to_parent = traits.rest_angle
                        + traits.amplitude * Angle::sin(brain_wave - traits.delay)
                        + traits.skew * angle_to_target / 180.0;
                }
            }
        }

        self.update_geometry();
    }

    fn rotate(&mut self, initial_angles: &[f64], center_of_mass: Vector, physics: &PhysicsConfig) -> f64 {
        let radius = self.calculate_radius(center_of_mass);
        let mut force_field = RotationsPhysicsEngine::new(self.mass, radius, center_of_mass, physics);
        for (organ, &initial_angle) in self.organs.iter().zip(initial_angles) {
            force_field.register_movement(
                initial_angle,
                organ.absolute_angle(),
                &organ.position_in_space(),
                organ.mass(),
            );
        }
        self.rotate_by(force_field.rotation());
        force_field.energy()
    }

    fn translate(&mut self, initial_positions: &[Segment], physics: &PhysicsConfig) -> f64 {
        let mut force_field = TranslationsPhysicsEngine::new(self.mass, physics);
        for (organ, initial_position) in self.organs.iter().zip(initial_positions) {
            force_field.register_movement(initial_position, &organ.position_in_space(), organ.mass());
        }
        self.translate_by(force_field.translation());
        force_field.energy()
    }

    /// Rigid rotation around the mouth.
    fn rotate_by(&mut self, angle: f64) {
        if angle == 0.0 {
            return;
        }
        self.organs[0].angle_to_parent += angle;
        self.update_geometry();
    }

    fn translate_by(&mut self, offset: Vector) {
        if offset.is_zero() {
            return;
        }
        for organ in &mut self.organs {
            organ.shift(offset);
        }
    }

    fn update_geometry(&mut self) {
        for index in 0..self.traversal.len() {
            let id = self.traversal[index];
            match self.organs[id].parent {
                None => {
                    let start = self.organs[id].start_point();
                    self.organs[id].place(start, 0.0);
                }
                Some(parent) => {
                    let start = self.organs[parent].end_point();
                    let parent_angle = self.organs[parent].absolute_angle();
                    self.organs[id].place(start, parent_angle);
                }
            }
        }
    }

    fn calculate_center_of_mass(&self) -> Vector {
        if self.mass <= 0.0 {
            return self.start_point();
        }
        let (mut total_x, mut total_y) = (0.0, 0.0);
        for organ in &self.organs {
            let weighted = organ.center_of_mass().by(organ.mass());
            total_x += weighted.x;
            total_y += weighted.y;
        }
        Vector::cartesian(total_x / self.mass, total_y / self.mass)
    }

    fn calculate_radius(&self, center_of_mass: Vector) -> f64 {
        self.organs.iter().fold(MIN_RADIUS, |radius, organ| {
            let start = organ.start_point().distance_to(center_of_mass);
            let end = organ.end_point().distance_to(center_of_mass);
            radius.max(start).max(end)
        })
    }
}

fn depth_first(organs: &[Organ]) -> Vec<OrganId> {
    let mut order = Vec::with_capacity(organs.len());
    if organs.is_empty() {
        return order;
    }
    let mut stack = vec![0];
    while let Some(id) = stack.pop() {
        order.push(id);
        // Reverse so the first child is visited first.
        stack.extend(organs[id].children.iter().rev());
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::organ::{Fiber, SegmentTraits};

    fn head_traits(byproduct: Element) -> HeadTraits {
        HeadTraits {
            metabolic_rate: 1.0,
            byproduct,
            wave_beat_ratio: 1.0,
            energy_to_children: 0.2,
            egg_interval: 100,
            egg_velocity: 0.0,
        }
    }

    fn segment(parent: OrganId, rest_angle: f64, amplitude: f64, fiber: Fiber, size: f64) -> Organ {
        let traits = SegmentTraits { rest_angle, amplitude, skew: 20.0, delay: 45.0 };
        Organ::segment(parent, 30.0, 8.0, fiber, traits, size)
    }

    /// A branching body: a head, a tail of three segments and two side fins.
    fn branching_body(size: f64) -> Body {
        let organs = vec![
            Organ::head(20.0, 10.0, Fiber::new(200, 50, 10), head_traits(Element::Nitrogen), size),
            segment(0, 10.0, 30.0, Fiber::new(10, 200, 10), size),
            segment(1, -15.0, 25.0, Fiber::new(10, 10, 200), size),
            segment(2, 20.0, 40.0, Fiber::new(100, 100, 0), size),
            segment(0, 60.0, 15.0, Fiber::new(0, 0, 0), size),
            segment(0, -60.0, 15.0, Fiber::new(255, 0, 0), size),
        ];
        let mut body = Body::new(organs, &PhysicsConfig::default());
        body.force_position(Vector::cartesian(100.0, 200.0), 30.0);
        body
    }

    fn head_only_body() -> Body {
        let organs = vec![Organ::head(20.0, 10.0, Fiber::new(255, 0, 0), head_traits(Element::Hydrogen), 1.0)];
        Body::new(organs, &PhysicsConfig::default())
    }

    #[test]
    fn test_organs_form_a_tree() {
        let body = branching_body(1.0);
        assert_eq!(body.organs().len(), 6);
        assert_eq!(body.head().children(), &[1, 4, 5]);
        assert_eq!(body.traversal, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(body.organs()[3].parent(), Some(2));

        // Children start where their parent ends.
        for organ in body.organs().iter().skip(1) {
            let parent = &body.organs()[organ.parent().unwrap()];
            assert!(organ.start_point().approx_eq(parent.end_point(), 1e-9));
        }
    }

    #[test]
    fn test_masses_sum_over_organs() {
        let body = branching_body(0.5);
        let total: f64 = body.organs().iter().map(Organ::mass).sum();
        assert!((body.mass() - total).abs() < 1e-9);

        let colors = body.red_mass() + body.green_mass() + body.blue_mass();
        assert!((colors - body.mass()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_direction_keeps_center_of_mass() {
        for mut body in [branching_body(1.0), head_only_body()] {
            body.grow_to_adult_form();
            let before = body.center_of_mass();

            for _ in 0..10 {
                body.tick(Vector::ZERO, &PhysicsConfig::default()).unwrap();
            }

            assert!(body.center_of_mass().approx_eq(before, 1e-9));
        }
    }

    #[test]
    fn test_zero_direction_keeps_center_of_mass_while_growing() {
        let mut body = branching_body(0.3);
        assert!(!body.has_stopped_growing());
        let before = body.center_of_mass();

        let energy = body.tick(Vector::ZERO, &PhysicsConfig::default()).unwrap();
        assert!(body.center_of_mass().approx_eq(before, 1e-6));
        assert_eq!(energy, 0.0);

        for _ in 0..20 {
            body.tick(Vector::ZERO, &PhysicsConfig::default()).unwrap();
        }
        assert!(body.center_of_mass().approx_eq(before, 1e-6));
    }

    #[test]
    fn test_reshaping_does_not_drift_center_before_translation() {
        // With no drag at all, the only motion left is the recentering.
        let physics = PhysicsConfig {
            perpendicular_drag: 0.0,
            parallel_drag: 0.0,
            ..PhysicsConfig::default()
        };
        let mut body = branching_body(1.0);
        let before = body.center_of_mass();
        for _ in 0..20 {
            body.tick(Vector::cartesian(1.0, 1.0), &physics).unwrap();
        }
        assert!(body.center_of_mass().approx_eq(before, 1e-6));
    }

    #[test]
    fn test_moving_toward_a_target_costs_energy() {
        let mut body = branching_body(1.0);
        let energy = body.tick(Vector::cartesian(1.0, 0.0), &PhysicsConfig::default()).unwrap();
        assert!(energy > 0.0);
    }

    #[test]
    fn test_growing_body_updates_mass_until_adult() {
        let mut body = branching_body(0.1);
        assert!(!body.has_stopped_growing());
        let initial_mass = body.mass();

        body.tick(Vector::ZERO, &PhysicsConfig::default()).unwrap();
        assert!(body.mass() > initial_mass);

        for _ in 0..200 {
            body.tick(Vector::cartesian(0.0, 1.0), &PhysicsConfig::default()).unwrap();
        }
        assert!(body.has_stopped_growing());
        assert!((body.mass() - body.adult_mass()).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_cache_is_invalidated_by_ticks() {
        let mut body = branching_body(1.0);
        let generation = body.geometry_generation();
        let _ = body.center_of_mass();
        body.tick(Vector::cartesian(1.0, 0.0), &PhysicsConfig::default()).unwrap();
        assert!(body.geometry_generation() > generation);
        assert!(body.center_of_mass().approx_eq(body.calculate_center_of_mass(), 1e-12));
        assert!(body.radius() >= MIN_RADIUS);
    }

    #[test]
    fn test_breathed_element_never_equals_byproduct() {
        let red = head_only_body();
        assert_eq!(red.breathed_element(), Element::Oxygen);

        let organs = vec![Organ::head(20.0, 10.0, Fiber::new(255, 0, 0), head_traits(Element::Oxygen), 1.0)];
        let cheater = Body::new(organs, &PhysicsConfig::default());
        assert_eq!(cheater.breathed_element(), Element::Zero);
    }

    #[test]
    fn test_angle_points_away_from_head() {
        let mut body = head_only_body();
        body.force_position(Vector::ZERO, 0.0);
        assert_eq!(body.angle(), 180.0);
        assert!(body.head().end_point().approx_eq(Vector::cartesian(20.0, 0.0), 1e-9));
    }
}
