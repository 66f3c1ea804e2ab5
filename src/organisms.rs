use std::f32::consts::{PI, TAU};

use macroquad::prelude::{vec2, Vec2};

use crate::config::{AlgaeConfig, CrustaceanConfig, EggConfig, FishConfig, PlanktonConfig};
use crate::entity::Arena;
use crate::fish::Fish;
use crate::genome::Genome;
use crate::random::SimContext;
use crate::world::World;

/// Stationary food for prey; fades away on the detritus cadence.
#[derive(Clone, Debug)]
pub struct Plankton {
    pub pos: Vec2,
    pub energy_value: f32,
    pub lifetime: f32,
}

impl Plankton {
    pub fn new(pos: Vec2, settings: &PlanktonConfig, ctx: &mut SimContext) -> Self {
        Self {
            pos,
            energy_value: ctx.uniform_in(settings.energy_value).round(),
            lifetime: ctx.uniform_in(settings.lifetime).round(),
        }
    }

    /// Returns false once the plankton has expired.
    pub fn update(&mut self, settings: &PlanktonConfig) -> bool {
        self.lifetime -= settings.decay;
        self.lifetime > 0.0
    }
}

/// Bottom dweller hunted by predators.
#[derive(Clone, Debug)]
pub struct Crustacean {
    pub pos: Vec2,
    pub energy_value: f32,
    pub speed: f32,
    pub heading: f32,
    pub lifetime: f32,
}

impl Crustacean {
    pub fn new(pos: Vec2, settings: &CrustaceanConfig, ctx: &mut SimContext) -> Self {
        Self {
            pos,
            energy_value: ctx.uniform_in(settings.energy_value).round(),
            speed: ctx.uniform_in(settings.speed),
            heading: ctx.uniform(0.0, TAU),
            lifetime: ctx.uniform_in(settings.lifetime).round(),
        }
    }

    /// Wander the lower water column; anything above the upper third sinks
    /// back down. Returns false once the crustacean has expired.
    pub fn update(&mut self, world: &World, settings: &CrustaceanConfig, ctx: &mut SimContext) -> bool {
        let ceiling = world.height / 3.0;
        if self.pos.y < ceiling {
            self.pos.y += self.speed / 2.0;
            self.pos.x += ctx.jitter(self.speed);
        } else {
            self.pos += Vec2::from_angle(self.heading) * self.speed;
        }
        self.lifetime -= settings.decay;

        if self.pos.x < 0.0 || self.pos.x > world.width {
            self.heading = PI - self.heading;
        }
        if self.pos.y < ceiling || self.pos.y > world.height - 10.0 {
            self.heading = -self.heading;
        }
        self.lifetime > 0.0
    }
}

/// A piece of dead vegetation floating toward the surface.
#[derive(Clone, Debug)]
pub struct DeadAlgaePart {
    pub pos: Vec2,
    pub energy_value: f32,
    pub float_speed: f32,
    pub lifetime: f32,
}

impl DeadAlgaePart {
    pub fn new(pos: Vec2, settings: &AlgaeConfig, ctx: &mut SimContext) -> Self {
        Self {
            pos,
            energy_value: ctx.uniform_in(settings.dead_part_energy).round(),
            float_speed: ctx.uniform_in(settings.dead_part_float),
            lifetime: ctx.uniform_in(settings.dead_part_lifetime).round(),
        }
    }

    /// Returns false once the part has decayed or reached the surface.
    pub fn update(&mut self, current: Vec2, drift: f32, settings: &AlgaeConfig) -> bool {
        self.pos += current * drift;
        self.pos.y -= self.float_speed * 1.2 - 0.02 + self.float_speed;
        self.lifetime -= settings.dead_part_decay;
        self.lifetime > 0.0 && self.pos.y > 0.0
    }
}

/// A fertilised egg drifting until it hatches or perishes.
#[derive(Clone, Debug)]
pub struct Egg {
    pub pos: Vec2,
    pub genome: Genome,
    /// Remaining incubation; the egg may hatch once this reaches zero.
    pub lifetime: f32,
    pub survival_chance: f32,
    pub energy_value: f32,
    pub float_speed: f32,
    /// Generation of the fish that will hatch.
    pub generation: u32,
}

impl Egg {
    pub fn new(
        pos: Vec2,
        genome: Genome,
        predator: bool,
        generation: u32,
        settings: &EggConfig,
        ctx: &mut SimContext,
    ) -> Self {
        let (incubation, survival_chance) = if predator {
            (settings.predator_incubation, settings.predator_survival)
        } else {
            (settings.prey_incubation, settings.prey_survival)
        };
        Self {
            pos,
            genome,
            lifetime: ctx.uniform_in(incubation).round(),
            survival_chance,
            energy_value: ctx.uniform_in(settings.energy_value).round(),
            float_speed: ctx.uniform_in(settings.float_speed),
            generation,
        }
    }

    /// Drift and survival roll. Returns false when the egg is lost.
    pub fn update(&mut self, current: Vec2, height: f32, settings: &EggConfig, ctx: &mut SimContext) -> bool {
        self.pos += current * 0.5;
        self.pos.y -= self.float_speed;
        self.lifetime -= settings.decay;
        if self.pos.y <= 0.0 || self.pos.y >= height {
            return false;
        }
        ctx.roll() <= self.survival_chance
    }

    /// A fish hatches where the egg lies once incubation is over and the
    /// survival roll succeeds.
    pub fn hatch(&self, settings: &FishConfig, height: f32, ctx: &mut SimContext) -> Option<Fish> {
        if self.lifetime > 0.0 || ctx.roll() >= self.survival_chance {
            return None;
        }
        let mut fish = Fish::new(
            self.pos,
            self.genome.clone(),
            Some(settings.hatchling_energy),
            settings,
            height,
            ctx,
        );
        fish.generation = self.generation;
        Some(fish)
    }
}

/// Every non-fish, non-vegetation population, owned by the scheduler.
#[derive(Default)]
pub struct Organisms {
    pub plankton: Arena<Plankton>,
    pub crustaceans: Arena<Crustacean>,
    pub dead_algae: Arena<DeadAlgaePart>,
    pub eggs: Arena<Egg>,
}

impl Organisms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Random position in the upper two thirds of the water column.
    pub fn plankton_spot(world: &World, ctx: &mut SimContext) -> Vec2 {
        vec2(ctx.uniform(0.0, world.width), ctx.uniform(0.0, world.height / 1.5))
    }

    /// Random position in the lower two thirds of the water column.
    pub fn crustacean_spot(world: &World, ctx: &mut SimContext) -> Vec2 {
        vec2(ctx.uniform(0.0, world.width), ctx.uniform(world.height / 3.0, world.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn egg(lifetime: f32, survival_chance: f32, ctx: &mut SimContext) -> Egg {
        let mut egg = Egg::new(
            vec2(120.0, 300.0),
            Genome::random(ctx),
            false,
            3,
            &EggConfig::default(),
            ctx,
        );
        egg.lifetime = lifetime;
        egg.survival_chance = survival_chance;
        egg
    }

    #[test]
    fn expired_egg_with_lucky_roll_hatches_in_place() {
        let mut ctx = SimContext::new(1, 32);
        let egg = egg(0.0, 1.0, &mut ctx);
        let fish = egg.hatch(&FishConfig::default(), 650.0, &mut ctx).expect("hatched");
        assert_eq!(fish.pos, egg.pos);
        assert_eq!(fish.energy, FishConfig::default().hatchling_energy);
        assert_eq!(fish.generation, 3);
        assert_eq!(fish.genome, egg.genome);
    }

    #[test]
    fn unexpired_or_unlucky_egg_does_not_hatch() {
        let mut ctx = SimContext::new(2, 32);
        let waiting = egg(10.0, 1.0, &mut ctx);
        assert!(waiting.hatch(&FishConfig::default(), 650.0, &mut ctx).is_none());
        let doomed = egg(0.0, 0.0, &mut ctx);
        assert!(doomed.hatch(&FishConfig::default(), 650.0, &mut ctx).is_none());
    }

    #[test]
    fn egg_leaving_the_water_is_lost() {
        let mut ctx = SimContext::new(3, 32);
        let mut floating = egg(50.0, 1.0, &mut ctx);
        floating.pos.y = 0.1;
        assert!(!floating.update(Vec2::ZERO, 650.0, &EggConfig::default(), &mut ctx));
    }

    #[test]
    fn crustaceans_sink_back_from_the_upper_third() {
        let world = World::new(1100.0, 650.0);
        let settings = CrustaceanConfig::default();
        let mut ctx = SimContext::new(4, 32);
        let mut crab = Crustacean::new(vec2(500.0, 50.0), &settings, &mut ctx);
        crab.lifetime = 1e6;
        let start = crab.pos.y;
        crab.update(&world, &settings, &mut ctx);
        assert!(crab.pos.y > start);
    }

    #[test]
    fn plankton_and_dead_parts_expire() {
        let mut ctx = SimContext::new(5, 32);
        let mut plankton = Plankton::new(vec2(1.0, 1.0), &PlanktonConfig::default(), &mut ctx);
        plankton.lifetime = 3.0;
        assert!(!plankton.update(&PlanktonConfig::default()));

        let settings = AlgaeConfig::default();
        let mut part = DeadAlgaePart::new(vec2(10.0, 0.3), &settings, &mut ctx);
        assert!(!part.update(Vec2::ZERO, 0.5, &settings));
    }
}
