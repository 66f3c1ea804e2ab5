use std::collections::VecDeque;

use macroquad::prelude::{vec2, Vec2};
use tracing::{debug, info, trace, warn};

use crate::behavior::{self, FishView, StepOutcome, TickView};
use crate::calendar::Calendar;
use crate::commands::{Command, CommandOutcome, Species, VisualFlags};
use crate::commit::{self, CommitReport, CommitTargets, PendingChanges};
use crate::config::{ConfigError, SimConfig};
use crate::currents::CurrentGrid;
use crate::entity::{Arena, EntityId};
use crate::fields::ScalarFields;
use crate::fish::{DeathCause, Fish};
use crate::food::FoodIndex;
use crate::genome::Genome;
use crate::organisms::{Crustacean, Organisms, Plankton};
use crate::random::SimContext;
use crate::snapshot::{
    CalendarSnapshot, ClassAverages, EnvironmentProbe, FishSnapshot, PopulationCounts, SimSummary,
};
use crate::spatial_hash::SpatialIndex;
use crate::stats::PopulationStats;
use crate::vegetation::Vegetation;
use crate::world::World;

/// Outcome of one completed tick.
#[derive(Clone, Copy, Debug)]
pub struct TickReport {
    pub tick: u64,
    pub counts: PopulationCounts,
    pub commit: CommitReport,
    pub hatches: u32,
    pub died_of_age: u32,
    /// No live fish remain. Whether to stop is the caller's decision.
    pub collapsed: bool,
}

/// The whole simulated world and its fixed-step scheduler.
pub struct SimState {
    pub(crate) config: SimConfig,
    pub(crate) world: World,
    pub(crate) calendar: Calendar,
    pub(crate) currents: CurrentGrid,
    pub(crate) fields: ScalarFields,
    pub(crate) vegetation: Vegetation,
    pub(crate) organisms: Organisms,
    pub(crate) fish: Arena<Fish>,
    food: FoodIndex,
    fish_index: SpatialIndex<usize>,
    pub(crate) ctx: SimContext,
    commands: VecDeque<Command>,
    pub paused: bool,
    pub visuals: VisualFlags,
    pub stats: PopulationStats,
    collapse_reported: bool,
}

impl SimState {
    /// Validate the parameter block and seed the world.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let world = World::from_config(&config.world);
        let mut ctx = SimContext::new(config.seed, config.population.sample_buffer_len);
        let cell = config.spatial.cell_size;

        let currents = CurrentGrid::new(&world, &config.currents, &mut ctx);
        let fields = ScalarFields::new(&world, &config.fields);
        let vegetation = Vegetation::new(&world, &config.algae, cell);
        let stats = PopulationStats::new(
            config.population.stats_capacity,
            config.population.stats_interval,
        );

        let mut sim = Self {
            calendar: Calendar::new(&config.calendar),
            currents,
            fields,
            vegetation,
            organisms: Organisms::new(),
            fish: Arena::with_capacity(config.population.max_fish),
            food: FoodIndex::new(&world, cell),
            fish_index: SpatialIndex::new(world.width, world.height, cell),
            ctx,
            commands: VecDeque::new(),
            paused: false,
            visuals: VisualFlags::default(),
            stats,
            collapse_reported: false,
            world,
            config,
        };
        sim.seed_world();
        Ok(sim)
    }

    fn seed_world(&mut self) {
        let population = self.config.population.clone();
        let height = self.world.height;

        for _ in 0..population.initial_algae {
            let x = self.ctx.uniform(0.0, self.world.width);
            self.vegetation.plant(x, height, &mut self.ctx);
        }
        let growth = self.calendar.season().growth_factor();
        for _ in 0..population.seeding_steps {
            self.vegetation.seed_step(growth, &mut self.ctx);
        }

        for _ in 0..population.initial_plankton {
            let pos = Organisms::plankton_spot(&self.world, &mut self.ctx);
            self.organisms
                .plankton
                .spawn(Plankton::new(pos, &self.config.plankton, &mut self.ctx));
        }
        for _ in 0..population.initial_crustaceans {
            let pos = Organisms::crustacean_spot(&self.world, &mut self.ctx);
            self.organisms
                .crustaceans
                .spawn(Crustacean::new(pos, &self.config.crustacean, &mut self.ctx));
        }
        for _ in 0..population.initial_fish {
            let pos = self.fish_spot();
            let energy = self.ctx.uniform_in(self.config.fish.initial_energy).round();
            let genome = Genome::random(&mut self.ctx);
            let fish = Fish::new(pos, genome, Some(energy), &self.config.fish, height, &mut self.ctx);
            self.fish.spawn(fish);
        }

        self.fields.update(&self.calendar, self.vegetation.segment_positions());
        let counts = self.counts();
        info!(
            fish = counts.live_fish(),
            predators = counts.predators,
            algae = counts.algae,
            segments = counts.algae_segments,
            plankton = counts.plankton,
            crustaceans = counts.crustaceans,
            seed = self.config.seed,
            "world seeded"
        );
    }

    /// Random spot above the bottom band for a new fish.
    fn fish_spot(&mut self) -> Vec2 {
        let floor = (self.world.height - self.world.surface_band - self.ctx.uniform(0.0, 20.0)).max(0.0);
        vec2(
            self.ctx.uniform(0.0, self.world.width),
            self.ctx.uniform(0.0, floor),
        )
    }

    /// Queue a command for the next `advance`.
    pub fn submit(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Apply queued commands, then run one tick unless paused.
    pub fn advance(&mut self) -> Option<TickReport> {
        while let Some(command) = self.commands.pop_front() {
            self.apply_command(command);
        }
        if self.paused {
            None
        } else {
            Some(self.tick())
        }
    }

    /// One fixed step: environment, fields, ambient spawns, every fish
    /// against a start-of-tick snapshot, the commit, then detritus.
    pub fn tick(&mut self) -> TickReport {
        self.calendar.advance();
        self.currents.update(
            &self.calendar,
            &self.fields,
            self.vegetation.index(),
            &mut self.ctx,
        );
        self.fields
            .update(&self.calendar, self.vegetation.segment_positions());

        self.spawn_ambient();

        // Snapshot
        let ids = self.fish.ids();
        let segment_radius = self.config.algae.segment_radius;
        let views: Vec<FishView> = ids
            .iter()
            .filter_map(|&id| {
                self.fish
                    .get(id)
                    .map(|f| FishView::of(id, f, &self.vegetation, segment_radius))
            })
            .collect();
        self.fish_index
            .rebuild(views.iter().enumerate().map(|(i, v)| (i, v.pos)));
        let predators: Vec<usize> = views
            .iter()
            .enumerate()
            .filter(|(_, v)| v.predator && !v.dead)
            .map(|(i, _)| i)
            .collect();
        self.food.rebuild(&self.organisms);

        let population = &self.config.population;
        let prey_food = ratio(self.vegetation.algae_count(), population.max_algae);
        let predator_food = ratio(self.organisms.crustaceans.len(), population.initial_crustaceans);

        let mut pending = PendingChanges::default();
        let mut died_of_age = 0;
        {
            let view = TickView {
                config: &self.config,
                world: &self.world,
                calendar: &self.calendar,
                currents: &self.currents,
                fields: &self.fields,
                vegetation: &self.vegetation,
                food: &self.food,
                fish: &views,
                fish_index: &self.fish_index,
                predators: &predators,
                prey_food_availability: prey_food,
                predator_food_availability: predator_food,
            };
            for (i, v) in views.iter().enumerate() {
                let Some(fish) = self.fish.get_mut(v.id) else {
                    continue;
                };
                let outcome = behavior::step(fish, i, &view, &mut self.ctx, &mut pending);
                if outcome == StepOutcome::Died(DeathCause::OldAge) {
                    died_of_age += 1;
                }
            }
        }

        let report = commit::apply(
            pending,
            CommitTargets {
                fish: &mut self.fish,
                vegetation: &mut self.vegetation,
                organisms: &mut self.organisms,
            },
            &self.config,
            self.world.height,
            &mut self.ctx,
        );

        let cadence = self.config.population.detritus_cadence.max(1) as u64;
        let hatches = if self.calendar.tick() % cadence == 0 {
            self.update_detritus()
        } else {
            0
        };

        let counts = self.counts();
        let averages = ClassAverages::of(self.fish.values());
        self.stats.absorb(&report, hatches, died_of_age);
        self.stats.record(&counts, &averages);

        let collapsed = counts.collapsed();
        if collapsed && !self.collapse_reported {
            info!(tick = self.calendar.tick(), "population collapsed: no live fish remain");
        }
        self.collapse_reported = collapsed;

        trace!(
            tick = self.calendar.tick(),
            fish = counts.live_fish(),
            eggs = counts.eggs,
            plankton = counts.plankton,
            segments = counts.algae_segments,
            "tick"
        );

        TickReport {
            tick: self.calendar.tick(),
            counts,
            commit: report,
            hatches,
            died_of_age,
            collapsed,
        }
    }

    /// At most one ambient organism per tick, gated by the season.
    fn spawn_ambient(&mut self) {
        let p = &self.config.population;
        let gate = p.spawn_gate * self.calendar.season().growth_factor();
        if !self.ctx.chance(gate) {
            return;
        }
        let (algae_spawn, plankton_spawn, crustacean_spawn, max_algae) =
            (p.algae_spawn, p.plankton_spawn, p.crustacean_spawn, p.max_algae);
        if self.ctx.chance(algae_spawn) && self.vegetation.algae_count() < max_algae {
            let x = self.ctx.uniform(0.0, self.world.width);
            self.vegetation.plant(x, self.world.height, &mut self.ctx);
        } else if self.ctx.chance(plankton_spawn) {
            let pos = Organisms::plankton_spot(&self.world, &mut self.ctx);
            self.organisms
                .plankton
                .spawn(Plankton::new(pos, &self.config.plankton, &mut self.ctx));
        } else if self.ctx.chance(crustacean_spawn) {
            let pos = Organisms::crustacean_spot(&self.world, &mut self.ctx);
            self.organisms
                .crustaceans
                .spawn(Crustacean::new(pos, &self.config.crustacean, &mut self.ctx));
        }
    }

    /// Reduced-cadence pass over vegetation and everything that only drifts,
    /// decays or incubates. Returns the number of hatched fish.
    fn update_detritus(&mut self) -> u32 {
        let daytime = self.calendar.is_day();
        let growth = self.calendar.season().growth_factor();
        let shed = self.vegetation.update(
            daytime,
            growth,
            self.config.population.max_algae,
            &mut self.ctx,
        );
        for part in shed {
            self.organisms.dead_algae.spawn(part);
        }

        let plankton = &self.config.plankton;
        self.organisms.plankton.retain(|p| p.update(plankton));

        let drift = self.config.fish.current_drift;
        let algae = &self.config.algae;
        let currents = &self.currents;
        self.organisms
            .dead_algae
            .retain(|part| part.update(currents.vector_at(part.pos), drift, algae));

        for id in self.organisms.crustaceans.ids() {
            let alive = match self.organisms.crustaceans.get_mut(id) {
                Some(c) => c.update(&self.world, &self.config.crustacean, &mut self.ctx),
                None => continue,
            };
            if !alive {
                self.organisms.crustaceans.despawn(id);
            }
        }

        let mut hatches = 0;
        for id in self.organisms.eggs.ids() {
            let Some(egg) = self.organisms.eggs.get_mut(id) else {
                continue;
            };
            let current = self.currents.vector_at(egg.pos);
            if !egg.update(current, self.world.height, &self.config.egg, &mut self.ctx) {
                self.organisms.eggs.despawn(id);
                continue;
            }
            if self.fish.len() >= self.config.population.max_fish {
                continue;
            }
            if let Some(fish) = egg.hatch(&self.config.fish, self.world.height, &mut self.ctx) {
                self.organisms.eggs.despawn(id);
                self.fish.spawn(fish);
                hatches += 1;
            }
        }
        if hatches > 0 {
            debug!(hatches, "eggs hatched");
        }
        hatches
    }

    fn apply_command(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::SpawnPlankton { pos } => {
                let pos = self.world.confine(pos.into(), 0.0);
                self.organisms
                    .plankton
                    .spawn(Plankton::new(pos, &self.config.plankton, &mut self.ctx));
                CommandOutcome::Applied
            }
            Command::SpawnCrustacean { pos } => {
                let pos = self.world.confine(pos.into(), 0.0);
                self.organisms
                    .crustaceans
                    .spawn(Crustacean::new(pos, &self.config.crustacean, &mut self.ctx));
                CommandOutcome::Applied
            }
            Command::SpawnFish {
                pos,
                genome,
                energy,
                overrides,
            } => {
                if self.fish.len() >= self.config.population.max_fish {
                    warn!(cap = self.config.population.max_fish, "fish population at cap, spawn ignored");
                    return CommandOutcome::NoEffect;
                }
                let genome = genome.unwrap_or_else(|| Genome::random(&mut self.ctx));
                let pos = self.world.confine(pos.into(), self.config.fish.initial_size);
                let settings = &self.config.fish;
                let height = self.world.height;
                let fish = if overrides.is_empty() {
                    Fish::new(pos, genome, energy, settings, height, &mut self.ctx)
                } else {
                    Fish::with_overrides(pos, genome, energy, &overrides, settings, height, &mut self.ctx)
                };
                let id = self.fish.spawn(fish);
                debug!(?id, "fish spawned by command");
                CommandOutcome::Applied
            }
            Command::RemoveNearest { species, pos } => self.remove_nearest(species, pos.into()),
            Command::Pause => {
                self.paused = true;
                CommandOutcome::Applied
            }
            Command::Resume => {
                self.paused = false;
                CommandOutcome::Applied
            }
            Command::TogglePause => {
                self.paused = !self.paused;
                CommandOutcome::Applied
            }
            Command::ToggleVisualization(flag) => {
                self.visuals.toggle(flag);
                CommandOutcome::Applied
            }
        }
    }

    fn remove_nearest(&mut self, species: Species, pos: Vec2) -> CommandOutcome {
        let removed = match species {
            Species::Fish => {
                let hit = self
                    .fish
                    .iter()
                    .map(|(id, f)| (id, f.pos.distance(pos), Species::fish_hit_radius(f.size)))
                    .filter(|(_, d, r)| d < r)
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(id, _, _)| id);
                hit.and_then(|id| self.fish.despawn(id)).is_some()
            }
            Species::Plankton | Species::Crustacean | Species::Egg | Species::DeadAlgae => {
                let radius = species.hit_radius(&self.config).unwrap_or(0.0);
                let o = &mut self.organisms;
                match species {
                    Species::Plankton => remove_closest(&mut o.plankton, pos, radius, |p| p.pos),
                    Species::Crustacean => remove_closest(&mut o.crustaceans, pos, radius, |c| c.pos),
                    Species::Egg => remove_closest(&mut o.eggs, pos, radius, |e| e.pos),
                    _ => remove_closest(&mut o.dead_algae, pos, radius, |d| d.pos),
                }
            }
        };
        if removed {
            debug!(?species, x = pos.x, y = pos.y, "organism removed by command");
            CommandOutcome::Applied
        } else {
            warn!(?species, x = pos.x, y = pos.y, "nothing to remove within reach");
            CommandOutcome::NoEffect
        }
    }

    // Queries

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tick_count(&self) -> u64 {
        self.calendar.tick()
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn calendar_snapshot(&self) -> CalendarSnapshot {
        CalendarSnapshot {
            tick: self.calendar.tick(),
            day_phase: self.calendar.day_phase(),
            season: self.calendar.season(),
            season_modifier: self.calendar.season_modifier(),
        }
    }

    pub fn fish(&self) -> &Arena<Fish> {
        &self.fish
    }

    pub fn organisms(&self) -> &Organisms {
        &self.organisms
    }

    pub fn vegetation(&self) -> &Vegetation {
        &self.vegetation
    }

    pub fn currents(&self) -> &CurrentGrid {
        &self.currents
    }

    pub fn fields(&self) -> &ScalarFields {
        &self.fields
    }

    /// Live boundary curves of the current field.
    pub fn boundaries(&self) -> &[Vec<f32>] {
        self.currents.boundaries()
    }

    pub fn counts(&self) -> PopulationCounts {
        let mut counts = PopulationCounts {
            eggs: self.organisms.eggs.len(),
            plankton: self.organisms.plankton.len(),
            crustaceans: self.organisms.crustaceans.len(),
            dead_algae: self.organisms.dead_algae.len(),
            algae: self.vegetation.algae_count(),
            algae_segments: self.vegetation.segment_count(),
            ..Default::default()
        };
        for fish in self.fish.values() {
            if fish.is_dead() {
                counts.dead_fish += 1;
            } else if fish.is_predator() {
                counts.predators += 1;
            } else {
                counts.prey += 1;
            }
            if fish.is_pregnant() {
                counts.pregnant += 1;
            }
        }
        counts
    }

    pub fn fish_snapshot(&self, id: EntityId) -> Option<FishSnapshot> {
        self.fish.get(id).map(|f| FishSnapshot::of(id, f))
    }

    pub fn fish_snapshots(&self) -> Vec<FishSnapshot> {
        self.fish
            .iter()
            .map(|(id, f)| FishSnapshot::of(id, f))
            .collect()
    }

    /// Current, temperature and oxygen at a world coordinate.
    pub fn probe(&self, pos: Vec2) -> EnvironmentProbe {
        let current = self.currents.sample_at(pos);
        EnvironmentProbe {
            pos: pos.into(),
            layer: self.currents.layer_at(pos.x, pos.y),
            current_strength: current.strength,
            current_direction: current.direction,
            temperature: self.fields.temperature_at(pos),
            oxygen: self.fields.oxygen_at(pos),
            in_vegetation: self
                .vegetation
                .is_near(pos, self.config.algae.segment_radius),
        }
    }

    pub fn summary(&self) -> SimSummary {
        let counts = self.counts();
        SimSummary {
            seed: self.config.seed,
            ticks: self.calendar.tick(),
            calendar: self.calendar_snapshot(),
            collapsed: counts.collapsed(),
            counts,
            averages: ClassAverages::of(self.fish.values()),
            totals: self.stats.totals,
            peak_fish: self.stats.peak_fish().max(counts.live_fish()),
            max_generation: self.fish.values().map(|f| f.generation).max().unwrap_or(0),
        }
    }
}

fn ratio(have: usize, reference: usize) -> f32 {
    if reference == 0 {
        1.0
    } else {
        have as f32 / reference as f32
    }
}

/// Despawn the item closest to `pos` within `radius`.
fn remove_closest<T>(arena: &mut Arena<T>, pos: Vec2, radius: f32, at: impl Fn(&T) -> Vec2) -> bool {
    let hit = arena
        .iter()
        .map(|(id, item)| (id, at(item).distance(pos)))
        .filter(|(_, d)| *d < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id);
    hit.and_then(|id| arena.despawn(id)).is_some()
}
