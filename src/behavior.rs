use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_6, TAU};

use macroquad::prelude::Vec2;

use crate::calendar::Calendar;
use crate::commit::{BirthRecord, MatingIntent, PendingChanges};
use crate::config::SimConfig;
use crate::currents::{angle_delta, CurrentGrid};
use crate::entity::EntityId;
use crate::feeding;
use crate::fields::ScalarFields;
use crate::fish::{DeathCause, Fish};
use crate::food::{FoodIndex, FoodRef};
use crate::random::SimContext;
use crate::reproduction;
use crate::spatial_hash::SpatialIndex;
use crate::traits::Sex;
use crate::vegetation::Vegetation;
use crate::world::World;

// Idle steering odds.
const DEPTH_SEEK_CHANCE: f32 = 0.2;
const DEPTH_SEEK_SPEED: f32 = 0.4;
const BAND_STEER_CHANCE: f32 = 0.7;
const WANDER_CHANCE: f32 = 0.15;
const JITTER_CHANCE: f32 = 0.25;
/// Horizontal lever used when steering toward a depth, so the turn is not vertical.
const DEPTH_LEVER: f32 = 10.0;

/// Start-of-tick view of one fish, shared by every query during the tick.
#[derive(Clone, Copy, Debug)]
pub struct FishView {
    pub id: EntityId,
    pub pos: Vec2,
    pub size: f32,
    pub predator: bool,
    pub dead: bool,
    pub sex: Sex,
    pub ready: bool,
    pub in_algae: bool,
    pub defense: f32,
}

impl FishView {
    pub fn of(id: EntityId, fish: &Fish, vegetation: &Vegetation, segment_radius: f32) -> Self {
        Self {
            id,
            pos: fish.pos,
            size: fish.size,
            predator: fish.is_predator(),
            dead: fish.is_dead(),
            sex: fish.sex,
            ready: fish.ready_to_mate,
            in_algae: vegetation.is_near(fish.pos, fish.size + segment_radius),
            defense: fish.traits.defense,
        }
    }
}

/// Everything a fish may read during its update. Nothing here changes
/// until the commit phase.
pub struct TickView<'a> {
    pub config: &'a SimConfig,
    pub world: &'a World,
    pub calendar: &'a Calendar,
    pub currents: &'a CurrentGrid,
    pub fields: &'a ScalarFields,
    pub vegetation: &'a Vegetation,
    pub food: &'a FoodIndex,
    pub fish: &'a [FishView],
    pub fish_index: &'a SpatialIndex<usize>,
    /// Indices into `fish` of every live predator.
    pub predators: &'a [usize],
    pub prey_food_availability: f32,
    pub predator_food_availability: f32,
}

/// The steering branch a fish took this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Flee,
    Court,
    Hunt,
    Forage,
    Retreat,
    Idle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Drifting,
    Died(DeathCause),
    Acted(Action),
}

/// One fish update. The fish mutates only itself; meals, matings and births
/// are queued in `pending` for the commit phase.
pub fn step(
    fish: &mut Fish,
    me: usize,
    view: &TickView,
    ctx: &mut SimContext,
    pending: &mut PendingChanges,
) -> StepOutcome {
    let settings = &view.config.fish;
    if fish.is_dead() {
        fish.drift_corpse(view.currents.vector_at(fish.pos), settings);
        return StepOutcome::Drifting;
    }

    let season_modifier = view.calendar.season_modifier();
    fish.check_mating_readiness(season_modifier, ctx);

    let this = view.fish[me];
    let in_algae = this.in_algae;

    // The current both carries the fish and resists it.
    let current = view.currents.vector_at(fish.pos);
    let flow = current.length();
    let base_speed = fish.speed * if in_algae { settings.vegetation_speed_factor } else { 1.0 };
    let resistance = if flow > 0.0 {
        angle_delta(current.y.atan2(current.x), fish.heading).cos()
    } else {
        1.0
    };
    let mut speed = (base_speed * (1.0 - flow * settings.current_resistance * (1.0 - resistance))).max(0.0);
    fish.pos += current * settings.current_drift;

    let metabolism = effective_metabolism(fish, view);

    fish.age += settings.age_per_tick;
    fish.grow(season_modifier, settings);
    let availability = if fish.is_predator() {
        view.predator_food_availability
    } else {
        view.prey_food_availability
    };
    fish.update_epigenetics(availability, settings);
    if let Some(cause) = fish.check_age(settings) {
        return StepOutcome::Died(cause);
    }

    // Surface stream, strongest at the top.
    fish.pos.x += (view.world.height - fish.pos.y) / view.world.height * settings.surface_stream;

    if in_algae {
        speed *= settings.vegetation_drag;
    }
    if fish.is_pregnant() {
        speed *= settings.pregnant_speed_factor;
    }

    let threat = nearest_threat(fish, me, view);
    let mate = if fish.ready_to_mate {
        nearest_mate(fish, me, view)
    } else {
        None
    };
    let food = nearest_food(fish, in_algae, view);
    let prey = if fish.is_predator() {
        nearest_prey(fish, me, view)
    } else {
        None
    };
    let hungry = fish.energy < fish.traits.max_energy * settings.satiation;
    let turn = fish.traits.turn_speed;

    let action = if let Some(threat) = threat {
        let away = (fish.pos - threat).y.atan2((fish.pos - threat).x);
        let desired = if view.world.near_surface(fish.pos.y) {
            // Dodge sideways when there is no more room to climb.
            [away + FRAC_PI_3, away - FRAC_PI_3, away]
                .into_iter()
                .max_by(|a, b| {
                    let da = (fish.pos + Vec2::from_angle(*a) * speed).distance_squared(threat);
                    let db = (fish.pos + Vec2::from_angle(*b) * speed).distance_squared(threat);
                    da.total_cmp(&db)
                })
                .unwrap_or(away)
        } else {
            away
        };
        fish.heading = steer(fish.heading, desired, turn);
        fish.pos += Vec2::from_angle(fish.heading) * speed * settings.flee_speed_factor;
        Action::Flee
    } else if let Some(partner) = mate {
        let target = view.fish[partner].pos;
        fish.heading = steer(fish.heading, bearing(fish.pos, target), turn);
        fish.pos += Vec2::from_angle(fish.heading) * speed;
        Action::Court
    } else if let Some(aim) = fish
        .is_predator()
        .then(|| prey.map(|p| p.1).or(food.map(|f| f.1)))
        .flatten()
        .filter(|_| hungry)
    {
        fish.heading = steer(fish.heading, bearing(fish.pos, aim), turn);
        fish.pos += Vec2::from_angle(fish.heading) * speed;
        Action::Hunt
    } else if fish.is_predator()
        && fish.energy < fish.traits.max_energy * settings.low_energy
        && prey.is_none()
        && food.is_none()
    {
        let desired = (fish.traits.preferred_depth - fish.pos.y).atan2(DEPTH_LEVER);
        // Retreat forward only: heading stays within a quarter turn of +x.
        let forward = angle_delta(0.0, steer(fish.heading, desired, turn / 2.0));
        fish.heading = wrap_angle(forward.clamp(-FRAC_PI_2, FRAC_PI_2));
        fish.pos += Vec2::from_angle(fish.heading) * speed;
        Action::Retreat
    } else if !fish.is_predator() && hungry && food.is_some() {
        let aim = food.map(|f| f.1).unwrap_or(fish.pos);
        fish.heading = steer(fish.heading, bearing(fish.pos, aim), turn);
        fish.pos += Vec2::from_angle(fish.heading) * speed;
        Action::Forage
    } else {
        idle(fish, in_algae, speed, view, ctx);
        Action::Idle
    };

    if ctx.chance(JITTER_CHANCE) {
        fish.heading += ctx.jitter(turn * 0.1);
    } else if in_algae && ctx.chance(JITTER_CHANCE) {
        fish.heading += ctx.uniform(-turn * 0.3, -turn * 0.1);
    }

    separate(fish, me, view);
    fish.pos = view.world.confine(fish.pos, fish.size);

    fish.energy -= energy_cost(fish, speed, metabolism, view);

    if let Some(litter) = reproduction::give_birth(fish, settings) {
        let generation = fish.generation + 1;
        pending.births.extend(litter.into_iter().map(|genome| BirthRecord {
            pos: fish.pos,
            genome,
            generation,
        }));
    }

    feeding::claim_meals(fish, me, view, ctx, pending);

    if fish.ready_to_mate {
        if let Some(partner) = mate {
            pending.matings.push(MatingIntent {
                first: this.id,
                second: view.fish[partner].id,
            });
        }
    }

    StepOutcome::Acted(action)
}

/// Metabolic rate after temperature and oxygen strain.
fn effective_metabolism(fish: &Fish, view: &TickView) -> f32 {
    let settings = &view.config.fish;
    let field = view.fields.settings();
    let temperature = view.fields.temperature_at(fish.pos);
    let oxygen = view.fields.oxygen_at(fish.pos);
    let deviation = (temperature - field.optimal_temperature).abs() / field.optimal_temperature;
    let mut metabolism = fish.traits.metabolism * (1.0 + deviation * settings.temperature_strain) * 0.75;
    if oxygen < field.critical_oxygen {
        metabolism *= 1.0 + (field.critical_oxygen - oxygen) * settings.oxygen_strain;
    }
    metabolism
}

fn oxygen_factor(fish: &Fish, view: &TickView) -> f32 {
    let critical = view.fields.settings().critical_oxygen;
    let oxygen = view.fields.oxygen_at(fish.pos);
    if oxygen < critical {
        (oxygen / critical).max(0.05)
    } else {
        1.0
    }
}

/// Energy spent this tick: movement scaled by size and metabolism, armour
/// and pregnancy upkeep, and a basal rate that never stops.
fn energy_cost(fish: &Fish, speed: f32, metabolism: f32, view: &TickView) -> f32 {
    let settings = &view.config.fish;
    let t = &fish.traits;
    let mut cost = speed * fish.size * settings.movement_cost * metabolism * (1.0 - t.defense * 0.4)
        / oxygen_factor(fish, view);
    if metabolism > t.digestion + 0.3 {
        cost *= 1.15;
    }
    cost += t.defense_cost;
    if fish.is_pregnant() {
        cost += t.pregnancy_upkeep;
    }
    cost + settings.basal_cost * (metabolism + t.energy_penalty)
}

/// Turn toward `desired` by at most `max_turn`.
pub fn steer(heading: f32, desired: f32, max_turn: f32) -> f32 {
    let diff = angle_delta(heading, desired);
    let next = if diff.abs() > max_turn {
        heading + max_turn * diff.signum()
    } else {
        desired
    };
    wrap_angle(next)
}

fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

fn bearing(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

fn vision_sq(fish: &Fish, in_algae: bool) -> f32 {
    if in_algae {
        fish.traits.vision_sq_in_algae
    } else {
        fish.traits.vision_sq
    }
}

/// Nearest predator within sight that could eat this fish.
fn nearest_threat(fish: &Fish, me: usize, view: &TickView) -> Option<Vec2> {
    let margin = view.config.fish.eat_size_margin;
    let limit = vision_sq(fish, view.fish[me].in_algae);
    view.predators
        .iter()
        .filter(|&&i| i != me)
        .map(|&i| &view.fish[i])
        .filter(|p| !fish.is_predator() || p.size > fish.size + margin)
        .map(|p| (p.pos, p.pos.distance_squared(fish.pos)))
        .filter(|(_, d)| *d < limit)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(pos, _)| pos)
}

/// Sight radius toward another fish: reduced inside vegetation, and again
/// when the other one hides in vegetation the looker is not in.
fn sight_to(base: f32, looker_in_algae: bool, other_in_algae: bool, view: &TickView) -> f32 {
    let settings = &view.config.fish;
    let mut radius = base;
    if looker_in_algae {
        radius *= settings.vision_in_algae;
    }
    if other_in_algae && !looker_in_algae {
        radius *= settings.hidden_target_vision;
    }
    radius
}

fn nearest_fish(
    fish: &Fish,
    me: usize,
    base: f32,
    view: &TickView,
    accept: impl Fn(&FishView) -> bool,
) -> Option<usize> {
    let own = view.fish[me];
    view.fish_index
        .query_radius(fish.pos, base)
        .filter(|(i, _)| *i != me)
        .filter_map(|(i, _)| {
            let other = &view.fish[*i];
            if !accept(other) {
                return None;
            }
            let radius = sight_to(base, own.in_algae, other.in_algae, view);
            let d = other.pos.distance_squared(fish.pos);
            (d < radius * radius).then_some((*i, d))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Ready partner of the opposite sex and same class.
fn nearest_mate(fish: &Fish, me: usize, view: &TickView) -> Option<usize> {
    if fish.is_pregnant() || fish.is_dead() {
        return None;
    }
    let predator = fish.is_predator();
    let sex = fish.sex;
    nearest_fish(fish, me, fish.traits.mate_vision, view, |o| {
        o.ready && !o.dead && o.predator == predator && o.sex != sex
    })
}

/// Corpses, prey fish and clearly smaller predators.
fn nearest_prey(fish: &Fish, me: usize, view: &TickView) -> Option<(usize, Vec2)> {
    let margin = view.config.fish.eat_size_margin;
    let size = fish.size;
    nearest_fish(fish, me, fish.traits.vision, view, |o| {
        o.dead || !o.predator || o.size + margin < size
    })
    .map(|i| (i, view.fish[i].pos))
}

/// Closest edible food within sight.
fn nearest_food(fish: &Fish, in_algae: bool, view: &TickView) -> Option<(FoodRef, Vec2)> {
    let limit = vision_sq(fish, in_algae);
    let radius = limit.sqrt();
    let loose = if fish.is_predator() {
        view.food.nearest(fish.pos, radius, FoodRef::feeds_predators)
    } else {
        view.food.nearest(fish.pos, radius, FoodRef::feeds_prey)
    };
    let plant = if fish.is_predator() {
        None
    } else {
        view.vegetation
            .nearest_segment(fish.pos, radius)
            .map(|(key, pos, d)| (FoodRef::AlgaeSegment(key), pos, d))
    };
    [loose, plant]
        .into_iter()
        .flatten()
        .filter(|(_, _, d)| *d < limit)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(food, pos, _)| (food, pos))
}

/// Wandering: drift back toward the preferred depth, avoid the bottom band,
/// and send pregnant fish in open water climbing up and forward.
fn idle(fish: &mut Fish, in_algae: bool, speed: f32, view: &TickView, ctx: &mut SimContext) {
    let settings = &view.config.fish;
    let turn = fish.traits.turn_speed;
    let depth_gap = (fish.pos.y - fish.traits.preferred_depth).abs();
    let idle_speed = if depth_gap > settings.depth_tolerance && ctx.chance(DEPTH_SEEK_CHANCE) {
        let desired = (fish.traits.preferred_depth - fish.pos.y).atan2(DEPTH_LEVER);
        fish.heading = steer(fish.heading, desired, turn * 0.5);
        speed * DEPTH_SEEK_SPEED
    } else {
        let pregnant = fish.is_pregnant();
        if view.world.near_bottom(fish.pos.y) && !pregnant {
            if ctx.chance(BAND_STEER_CHANCE) {
                fish.heading = ctx.uniform(-FRAC_PI_6, 0.0);
            } else {
                fish.heading += ctx.jitter(turn * 0.2);
            }
        } else if pregnant && !in_algae && !view.world.near_bottom(fish.pos.y) {
            if ctx.chance(BAND_STEER_CHANCE) {
                fish.heading = ctx.uniform(3.0 * FRAC_PI_2, TAU);
            } else {
                fish.heading += ctx.jitter(turn * 0.2);
            }
        } else if ctx.chance(WANDER_CHANCE) {
            fish.heading += ctx.jitter(turn * 0.2);
        }
        speed * settings.idle_speed_factor
    };
    fish.pos += Vec2::from_angle(fish.heading) * idle_speed;
}

/// Push this fish out of every live neighbour it overlaps, using the
/// start-of-tick positions of the others.
fn separate(fish: &mut Fish, me: usize, view: &TickView) {
    let settings = &view.config.fish;
    let reach = fish.size + view.fish.iter().map(|f| f.size).fold(0.0, f32::max);
    let mut push = Vec2::ZERO;
    let mut normal: Option<f32> = None;
    for (i, other_pos) in view.fish_index.query_radius(fish.pos, reach) {
        if *i == me {
            continue;
        }
        let other = &view.fish[*i];
        if other.dead {
            continue;
        }
        let offset = fish.pos - *other_pos;
        let min_distance = fish.size + other.size;
        let d_sq = offset.length_squared();
        if d_sq >= min_distance * min_distance || d_sq <= 0.0 {
            continue;
        }
        let distance = d_sq.sqrt();
        let dir = offset / distance;
        push += dir * (min_distance - distance) * settings.collision_push;
        normal = Some(dir.y.atan2(dir.x));
    }
    fish.pos += push;
    if let Some(angle) = normal {
        let blend = settings.collision_heading_blend;
        fish.heading += angle_delta(fish.heading, angle) * blend;
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use macroquad::prelude::vec2;

    use super::*;
    use crate::commit::Meal;
    use crate::config::CrustaceanConfig;
    use crate::fish::Condition;
    use crate::genome::{Gene, Genome, Trait, TRAIT_COUNT};
    use crate::organisms::{Crustacean, Organisms};

    struct Scene {
        config: SimConfig,
        world: World,
        calendar: Calendar,
        currents: CurrentGrid,
        fields: ScalarFields,
        vegetation: Vegetation,
        food: FoodIndex,
        ctx: SimContext,
    }

    impl Scene {
        fn new(seed: u64) -> Self {
            let config = SimConfig::default();
            let world = World::from_config(&config.world);
            let mut ctx = SimContext::new(seed, 256);
            let mut fields = ScalarFields::new(&world, &config.fields);
            let calendar = Calendar::new(&config.calendar);
            fields.update(&calendar, std::iter::empty());
            Self {
                currents: CurrentGrid::new(&world, &config.currents, &mut ctx),
                vegetation: Vegetation::new(&world, &config.algae, config.spatial.cell_size),
                food: FoodIndex::new(&world, config.spatial.cell_size),
                fields,
                calendar,
                world,
                config,
                ctx,
            }
        }

        fn fish(&mut self, pos: Vec2, predator: bool, energy: f32) -> Fish {
            let p = if predator { 0.9 } else { 0.1 };
            let mut genes = [Gene::new(0.5, 0.5, 0); TRAIT_COUNT];
            genes[Trait::Predator.index()] = Gene::new(p, p, 0);
            let genome = Genome::from_genes(genes);
            let mut fish = Fish::new(pos, genome, Some(energy), &self.config.fish, self.world.height, &mut self.ctx);
            fish.traits.max_age = 1e6;
            fish
        }
    }

    struct Snapshot {
        views: Vec<FishView>,
        index: SpatialIndex<usize>,
        predators: Vec<usize>,
    }

    fn snapshot(scene: &Scene, fish: &[Fish]) -> Snapshot {
        let views: Vec<FishView> = fish
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let id = EntityId {
                    index: i as u32,
                    generation: 0,
                };
                FishView::of(id, f, &scene.vegetation, scene.config.algae.segment_radius)
            })
            .collect();
        let mut index = SpatialIndex::new(scene.world.width, scene.world.height, scene.config.spatial.cell_size);
        index.rebuild(views.iter().enumerate().map(|(i, v)| (i, v.pos)));
        let predators = views
            .iter()
            .enumerate()
            .filter(|(_, v)| v.predator && !v.dead)
            .map(|(i, _)| i)
            .collect();
        Snapshot {
            views,
            index,
            predators,
        }
    }

    fn view<'a>(scene: &'a Scene, snap: &'a Snapshot) -> TickView<'a> {
        TickView {
            config: &scene.config,
            world: &scene.world,
            calendar: &scene.calendar,
            currents: &scene.currents,
            fields: &scene.fields,
            vegetation: &scene.vegetation,
            food: &scene.food,
            fish: &snap.views,
            fish_index: &snap.index,
            predators: &snap.predators,
            prey_food_availability: 1.0,
            predator_food_availability: 1.0,
        }
    }

    /// Run one step for `fish[me]` against a snapshot of all of them.
    fn run(scene: &mut Scene, fish: &mut [Fish], me: usize, pending: &mut PendingChanges) -> StepOutcome {
        let snap = snapshot(scene, fish);
        let mut ctx = std::mem::replace(&mut scene.ctx, SimContext::new(0, 1));
        let outcome = step(&mut fish[me], me, &view(scene, &snap), &mut ctx, pending);
        scene.ctx = ctx;
        outcome
    }

    #[test]
    fn steer_turns_at_most_max_turn_and_wraps() {
        assert!((steer(0.0, 1.0, 0.2) - 0.2).abs() < 1e-6);
        assert!((steer(0.1, 0.15, 0.2) - 0.15).abs() < 1e-6);
        assert!((steer(0.1, -0.5, 0.2) - (TAU - 0.1)).abs() < 1e-5);
    }

    #[test]
    fn energy_drains_every_tick_without_food() {
        let mut scene = Scene::new(11);
        let mut fish = vec![scene.fish(vec2(400.0, 300.0), false, 50.0)];
        let mut last = fish[0].energy;
        for _ in 0..200 {
            let mut pending = PendingChanges::default();
            run(&mut scene, &mut fish, 0, &mut pending);
            assert!(pending.claims.is_empty());
            assert!(fish[0].energy < last, "energy must fall tick over tick");
            last = fish[0].energy;
        }
        assert!(last < 50.0);
    }

    #[test]
    fn prey_turns_away_from_a_nearby_predator() {
        let mut scene = Scene::new(12);
        let mut prey = scene.fish(vec2(500.0, 300.0), false, 50.0);
        prey.heading = 0.0;
        let hunter = scene.fish(vec2(530.0, 300.0), true, 100.0);
        let mut fish = vec![prey, hunter];

        let mut pending = PendingChanges::default();
        let outcome = run(&mut scene, &mut fish, 0, &mut pending);

        assert_eq!(outcome, StepOutcome::Acted(Action::Flee));
        let turn = fish[0].traits.turn_speed;
        assert!(angle_delta(fish[0].heading, PI).abs() < PI - turn * 0.5);
    }

    #[test]
    fn ready_fish_court_a_compatible_partner() {
        let mut scene = Scene::new(13);
        let mut fish: Vec<Fish> = [(300.0, Sex::Male), (330.0, Sex::Female)]
            .into_iter()
            .map(|(x, sex)| {
                let mut f = scene.fish(vec2(x, 300.0), false, 0.0);
                f.sex = sex;
                f.energy = f.traits.max_energy * 0.9;
                f.age = f.traits.min_reproduction_age + 1.0;
                f.traits.reproduction_rate = 10.0;
                f.ready_to_mate = true;
                f
            })
            .collect();

        let mut pending = PendingChanges::default();
        let outcome = run(&mut scene, &mut fish, 0, &mut pending);

        assert_eq!(outcome, StepOutcome::Acted(Action::Court));
        assert_eq!(
            pending.matings,
            vec![MatingIntent {
                first: EntityId { index: 0, generation: 0 },
                second: EntityId { index: 1, generation: 0 },
            }]
        );
    }

    #[test]
    fn hungry_predator_claims_a_crustacean_in_reach() {
        let mut scene = Scene::new(14);
        let pos = vec2(600.0, 400.0);
        let mut organisms = Organisms::new();
        let crab = organisms
            .crustaceans
            .spawn(Crustacean::new(pos, &CrustaceanConfig::default(), &mut scene.ctx));
        scene.food.rebuild(&organisms);

        let mut fish = vec![scene.fish(pos, true, 10.0)];
        let mut pending = PendingChanges::default();
        let outcome = run(&mut scene, &mut fish, 0, &mut pending);

        assert_eq!(outcome, StepOutcome::Acted(Action::Hunt));
        assert!(pending
            .claims
            .iter()
            .any(|c| c.meal == Meal::Food(FoodRef::Crustacean(crab))));
    }

    #[test]
    fn pregnant_fish_in_open_water_idle_upward() {
        let mut scene = Scene::new(16);
        let mut mother = scene.fish(vec2(400.0, 300.0), false, 50.0);
        mother.traits.preferred_depth = 300.0;
        mother.condition = Condition::Pregnant {
            timer: 0,
            litter: Vec::new(),
        };
        let fish = vec![mother.clone()];
        let snap = snapshot(&scene, &fish);
        let view = view(&scene, &snap);
        let mut ctx = SimContext::new(3, 64);
        for _ in 0..100 {
            mother.pos = vec2(400.0, 300.0);
            mother.heading = 7.0 * PI / 4.0;
            idle(&mut mother, false, 1.0, &view, &mut ctx);
            assert!(mother.heading.sin() < 0.0, "heading {} points down", mother.heading);
            assert!(mother.pos.y < 300.0);
        }
    }

    #[test]
    fn corpses_only_drift() {
        let mut scene = Scene::new(15);
        let mut corpse = scene.fish(vec2(200.0, 500.0), false, 0.0);
        let mut ctx = SimContext::new(1, 8);
        assert!(corpse.check_energy(&scene.config.fish, &mut ctx).is_some());
        let mut fish = vec![corpse];
        let mut pending = PendingChanges::default();
        let outcome = run(&mut scene, &mut fish, 0, &mut pending);
        assert_eq!(outcome, StepOutcome::Drifting);
        assert!(pending.is_empty());
    }
}
