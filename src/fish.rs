use macroquad::prelude::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::FishConfig;
use crate::genome::Genome;
use crate::random::SimContext;
use crate::traits::{FishTraits, Sex, TraitOverrides};

/// Life-cycle state of a fish.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Alive,
    /// Live-bearing female carrying a litter until the timer reaches her
    /// pregnancy duration.
    Pregnant { timer: u32, litter: Vec<Genome> },
    /// Cooldown after giving birth or laying eggs; no mating.
    Refractory { remaining: f32 },
    /// Drifting corpse, still edible by predators.
    Dead,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Alive => "alive",
            Condition::Pregnant { .. } => "pregnant",
            Condition::Refractory { .. } => "refractory",
            Condition::Dead => "dead",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifeStage {
    Juvenile,
    Adult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeathCause {
    Starvation,
    OldAge,
}

/// A mobile, genome-driven organism.
#[derive(Clone, Debug)]
pub struct Fish {
    pub pos: Vec2,
    pub heading: f32,
    pub genome: Genome,
    pub sex: Sex,
    pub traits: FishTraits,
    pub size: f32,
    /// Current cruising speed; falls as the body grows.
    pub speed: f32,
    pub energy: f32,
    pub age: f32,
    pub condition: Condition,
    pub ready_to_mate: bool,
    /// Consecutive ticks of food scarcity.
    pub scarcity_timer: u32,
    /// Number of ancestors back to a founder.
    pub generation: u32,
}

impl Fish {
    /// New fish with traits derived from `genome`. Without an explicit
    /// energy the fish starts anywhere between empty and full.
    pub fn new(
        pos: Vec2,
        genome: Genome,
        energy: Option<f32>,
        settings: &FishConfig,
        height: f32,
        ctx: &mut SimContext,
    ) -> Self {
        let sex = Sex::random(ctx);
        Self::build(pos, genome, sex, energy, settings, height, ctx)
    }

    /// User-authored fish: traits derived from the genome are replaced by
    /// whatever the overrides name.
    pub fn with_overrides(
        pos: Vec2,
        genome: Genome,
        energy: Option<f32>,
        overrides: &TraitOverrides,
        settings: &FishConfig,
        height: f32,
        ctx: &mut SimContext,
    ) -> Self {
        let sex = overrides.sex.unwrap_or_else(|| Sex::random(ctx));
        let mut fish = Self::build(pos, genome, sex, energy, settings, height, ctx);
        overrides.apply(&mut fish.traits, settings, height);
        fish.speed = fish.cruising_speed();
        fish.energy = fish.energy.min(fish.traits.max_energy);
        fish
    }

    fn build(
        pos: Vec2,
        genome: Genome,
        sex: Sex,
        energy: Option<f32>,
        settings: &FishConfig,
        height: f32,
        ctx: &mut SimContext,
    ) -> Self {
        let traits = FishTraits::derive(&genome, sex, settings, height, ctx);
        let energy = energy.unwrap_or_else(|| ctx.uniform(0.0, traits.max_energy));
        Self {
            pos,
            heading: ctx.uniform(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2),
            genome,
            sex,
            speed: traits.base_speed * (1.0 - settings.initial_size / 20.0),
            traits,
            size: settings.initial_size,
            energy,
            age: 0.0,
            condition: Condition::Alive,
            ready_to_mate: false,
            scarcity_timer: 0,
            generation: 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.condition == Condition::Dead
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    pub fn is_pregnant(&self) -> bool {
        matches!(self.condition, Condition::Pregnant { .. })
    }

    pub fn is_predator(&self) -> bool {
        self.traits.is_predator
    }

    pub fn stage(&self) -> LifeStage {
        if self.age < self.traits.min_reproduction_age {
            LifeStage::Juvenile
        } else {
            LifeStage::Adult
        }
    }

    /// Energy extracted from food of the given value.
    pub fn digest(&self, value: f32) -> f32 {
        value * (0.5 + self.traits.digestion * 0.5)
    }

    pub fn gain_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).min(self.traits.max_energy);
    }

    /// Grow toward the adult size; fast metabolisms and good digestion grow
    /// quicker, and so does everyone in a favourable season.
    pub fn grow(&mut self, season_modifier: f32, settings: &FishConfig) {
        if self.is_dead() || self.size >= self.traits.max_size {
            return;
        }
        let fill = (self.energy / self.traits.max_energy).clamp(0.0, 1.0);
        let rate = settings.growth_rate
            * fill
            * (1.0 + self.traits.metabolism)
            * (0.5 + self.traits.digestion * 0.5)
            * season_modifier;
        self.size = (self.size + rate).min(self.traits.max_size);
        self.speed = self.cruising_speed();
    }

    fn cruising_speed(&self) -> f32 {
        self.traits.base_speed * (1.0 - self.size / 20.0)
    }

    /// Scarcity slowly lowers metabolism and sharpens digestion; plenty
    /// restores metabolism.
    pub fn update_epigenetics(&mut self, food_availability: f32, settings: &FishConfig) {
        if food_availability < settings.scarcity_threshold {
            self.scarcity_timer += 1;
            if self.scarcity_timer > settings.scarcity_patience {
                self.traits.metabolism = (self.traits.metabolism * 0.95).max(0.3);
                self.traits.digestion = (self.traits.digestion * 1.05).min(1.0);
            }
        } else {
            self.scarcity_timer = self.scarcity_timer.saturating_sub(1);
            self.traits.metabolism = (self.traits.metabolism * 1.01).min(1.0);
        }
    }

    /// Per-tick readiness roll. Refractory fish count down instead.
    pub fn check_mating_readiness(&mut self, season_modifier: f32, ctx: &mut SimContext) {
        match &mut self.condition {
            Condition::Refractory { remaining } => {
                *remaining -= 1.0;
                if *remaining <= 0.0 {
                    self.condition = Condition::Alive;
                }
                self.ready_to_mate = false;
            }
            Condition::Alive => {
                let t = &self.traits;
                let chance = t.reproduction_rate
                    * season_modifier
                    * (0.7 + t.digestion * 0.3)
                    * (1.0 - t.defense * 0.2);
                self.ready_to_mate = self.energy > t.energy_threshold
                    && self.age >= t.min_reproduction_age
                    && ctx.roll() < chance;
            }
            Condition::Pregnant { .. } | Condition::Dead => self.ready_to_mate = false,
        }
    }

    /// Age-out check run before steering.
    pub fn check_age(&mut self, settings: &FishConfig) -> Option<DeathCause> {
        if self.is_alive() && self.age >= self.traits.max_age {
            self.die(self.energy.max(settings.old_age_energy_floor));
            return Some(DeathCause::OldAge);
        }
        None
    }

    /// Starvation check run after the tick's meals and matings.
    pub fn check_energy(&mut self, settings: &FishConfig, ctx: &mut SimContext) -> Option<DeathCause> {
        if self.is_alive() && self.energy <= 0.0 {
            let corpse = ctx.uniform_in(settings.corpse_energy).round() + self.size * 0.5;
            self.die(corpse);
            return Some(DeathCause::Starvation);
        }
        None
    }

    fn die(&mut self, corpse_energy: f32) {
        self.condition = Condition::Dead;
        self.ready_to_mate = false;
        self.energy = corpse_energy;
    }

    /// Corpses drift with the current and float up.
    pub fn drift_corpse(&mut self, current: Vec2, settings: &FishConfig) {
        self.pos += current * settings.current_drift;
        self.pos.y -= self.traits.float_speed * 1.2 - self.size * 0.02;
    }

    /// A corpse that reached the surface leaves the simulation.
    pub fn surfaced(&self) -> bool {
        self.is_dead() && self.pos.y <= 0.0
    }
}
