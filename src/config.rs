// All tunable simulation constants in one place, grouped per concern.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration block cannot drive a simulation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} range is inverted: min {min} > max {max}")]
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must lie within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// World bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the tank in world units.
    pub width: f32,
    /// Height of the tank in world units; y grows downward.
    pub height: f32,
    /// Thickness of the surface and bottom bands used by fleeing and idle steering.
    pub surface_band: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1100.0,
            height: 650.0,
            surface_band: 60.0,
        }
    }
}

/// Day and season timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Ticks per full day (day half followed by night half).
    pub day_length: u32,
    /// Days per season.
    pub days_in_season: u32,
    /// Fraction of a season at each end over which the season modifier blends.
    pub transition_fraction: f32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            day_length: 180,
            days_in_season: 5,
            transition_fraction: 0.1,
        }
    }
}

impl CalendarConfig {
    pub fn season_length(&self) -> u32 {
        self.day_length * self.days_in_season
    }
}

/// Layered current field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentConfig {
    /// Grid cell size of the current field.
    pub cell_size: f32,
    /// Number of horizontal depth bands.
    pub layers: usize,
    /// Base strength of the top layer and of the bottom layer; interpolated in between.
    pub base_strength: [f32; 2],
    /// Base direction (radians) of the top layer and of the bottom layer.
    pub base_direction: [f32; 2],
    /// Per-tick gain of layer strength toward its target.
    pub layer_strength_gain: f32,
    /// Per-tick gain of layer direction toward its target.
    pub layer_direction_gain: f32,
    /// Per-tick gain of the live boundary curves toward the target curves.
    pub boundary_gain: f32,
    /// Per-tick gain of the target curves toward their noise-shifted goal.
    pub boundary_target_gain: f32,
    /// Per-tick gain of cell strength toward its target.
    pub cell_strength_gain: f32,
    /// Per-tick gain of cell direction toward its target.
    pub cell_direction_gain: f32,
    /// Minimum distance between adjacent boundary curves, as a fraction of height.
    pub min_gap_fraction: f32,
    /// Maximum strength reduction caused by one nearby algae segment.
    pub algae_drag: f32,
    /// How strongly warmer water speeds up cell currents.
    pub temperature_coupling: f32,
    /// Strength returned for positions outside the grid.
    pub default_strength: f32,
    /// Direction returned for positions outside the grid.
    pub default_direction: f32,
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            layers: 5,
            base_strength: [0.5, 0.1],
            base_direction: [-FRAC_PI_2, FRAC_PI_2],
            layer_strength_gain: 0.01,
            layer_direction_gain: 0.05,
            boundary_gain: 0.005,
            boundary_target_gain: 0.02,
            cell_strength_gain: 0.02,
            cell_direction_gain: 0.05,
            min_gap_fraction: 0.02,
            algae_drag: 0.3,
            temperature_coupling: 0.3,
            default_strength: 0.3,
            default_direction: 0.0,
        }
    }
}

/// Temperature and oxygen grids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub cell_size: f32,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub optimal_temperature: f32,
    pub min_oxygen: f32,
    pub max_oxygen: f32,
    /// Below this oxygen level fish metabolism is strained.
    pub critical_oxygen: f32,
    /// Oxygen added right at an algae segment.
    pub oxygen_boost: f32,
    /// Radius around an algae segment that receives a boost.
    pub oxygen_boost_radius: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            min_temperature: 10.0,
            max_temperature: 25.0,
            optimal_temperature: 20.0,
            min_oxygen: 2.0,
            max_oxygen: 10.0,
            critical_oxygen: 3.0,
            oxygen_boost: 3.0,
            oxygen_boost_radius: 50.0,
        }
    }
}

/// Bucket size for proximity lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 50.0 }
    }
}

/// Inheritance and mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticsConfig {
    /// Probability that an inherited allele mutates.
    pub mutation_rate: f32,
    /// Half-width of the uniform perturbation applied by a mutation.
    pub mutation_range: f32,
    /// Half-width of the perturbation for the predator trait.
    pub predator_mutation_range: f32,
    /// Probability that a parent passes on its dominant allele.
    pub dominant_inheritance: f32,
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.15,
            mutation_range: 0.15,
            predator_mutation_range: 0.005,
            dominant_inheritance: 0.7,
        }
    }
}

/// Fish physiology and behaviour. Ranges are `[min, max]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FishConfig {
    /// Reference energy scaled by size, digestion and reproduction traits.
    pub max_energy: f32,
    pub size_effect: f32,
    pub digestion_effect: f32,
    pub reproduction_effect: f32,
    pub metabolism_effect: f32,
    /// Body size at birth.
    pub initial_size: f32,
    pub age_per_tick: f32,
    /// Size margin a predator needs over another predator to eat it.
    pub eat_size_margin: f32,
    /// Vision multiplier while the fish itself sits in vegetation.
    pub vision_in_algae: f32,
    /// Vision multiplier for spotting a target hidden in vegetation.
    pub hidden_target_vision: f32,
    /// Share of the local current applied to fish each tick.
    pub current_drift: f32,
    /// Eastward stream at the surface, fading to zero at the bottom.
    pub surface_stream: f32,
    pub idle_speed_factor: f32,
    pub flee_speed_factor: f32,
    /// Share of pair overlap a fish moves itself out by each tick.
    pub collision_push: f32,
    /// Heading blend toward the separation normal on contact.
    pub collision_heading_blend: f32,
    pub initial_energy: [f32; 2],
    pub hatchling_energy: f32,
    pub prey_energy_threshold: f32,
    pub predator_energy_threshold: f32,
    pub prey_pregnancy_duration: [u32; 2],
    pub predator_pregnancy_duration: [u32; 2],
    pub prey_after_birth: [u32; 2],
    pub predator_after_birth: [u32; 2],
    pub prey_litter: [u32; 2],
    pub predator_litter: [u32; 2],
    pub prey_clutch: [u32; 2],
    pub predator_clutch: [u32; 2],
    /// Share of max energy each partner spends on mating.
    pub mating_cost: f32,
    /// Cost multiplier for a female that lays eggs instead of carrying young.
    pub egg_layer_cost_factor: f32,
    pub birth_cost: f32,
    /// Both partners need at least this share of max energy to mate.
    pub min_mating_energy: f32,
    /// Fish stop seeking food above this share of max energy.
    pub satiation: f32,
    /// Predators below this share of max energy retreat to their preferred depth.
    pub low_energy: f32,
    /// Vertical distance from the preferred depth that triggers depth seeking.
    pub depth_tolerance: f32,
    pub corpse_energy: [f32; 2],
    pub old_age_energy_floor: f32,
    pub scarcity_threshold: f32,
    pub scarcity_patience: u32,
    pub escape_factor: f32,
    pub retaliation_factor: f32,
    pub retaliation_cost: f32,
    pub corpse_gain_factor: f32,
    pub algae_bite_energy: f32,
    /// Upkeep paid every tick regardless of movement, scaled by metabolism.
    pub basal_cost: f32,
    /// Movement cost per unit of speed and size.
    pub movement_cost: f32,
    pub prey_turn_speed: f32,
    pub predator_turn_speed: f32,
    /// Extra upkeep per tick while carrying young.
    pub prey_pregnancy_upkeep: f32,
    pub predator_pregnancy_upkeep: f32,
    /// Food within `size + eat_reach` of a fish can be eaten.
    pub eat_reach: f32,
    /// Speed multiplier for a fish swimming through vegetation.
    pub vegetation_speed_factor: f32,
    /// Additional drag applied on top of the vegetation speed factor.
    pub vegetation_drag: f32,
    pub pregnant_speed_factor: f32,
    /// Speed lost per unit of current when swimming against it.
    pub current_resistance: f32,
    /// Metabolic strain per unit of relative temperature deviation.
    pub temperature_strain: f32,
    /// Metabolic strain per unit of oxygen below the critical level.
    pub oxygen_strain: f32,
    /// Base growth per tick at full energy.
    pub growth_rate: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            size_effect: 0.3,
            digestion_effect: 0.5,
            reproduction_effect: 0.5,
            metabolism_effect: 0.5,
            initial_size: 1.0,
            age_per_tick: 0.005,
            eat_size_margin: 1.5,
            vision_in_algae: 0.6,
            hidden_target_vision: 0.4,
            current_drift: 0.5,
            surface_stream: 0.5,
            idle_speed_factor: 0.3,
            flee_speed_factor: 1.2,
            collision_push: 0.3,
            collision_heading_blend: 0.5,
            initial_energy: [40.0, 60.0],
            hatchling_energy: 20.0,
            prey_energy_threshold: 20.0,
            predator_energy_threshold: 35.0,
            prey_pregnancy_duration: [150, 250],
            predator_pregnancy_duration: [250, 400],
            prey_after_birth: [100, 200],
            predator_after_birth: [200, 300],
            prey_litter: [1, 3],
            predator_litter: [1, 2],
            prey_clutch: [15, 25],
            predator_clutch: [10, 15],
            mating_cost: 0.125,
            egg_layer_cost_factor: 0.55,
            birth_cost: 5.0,
            min_mating_energy: 0.2,
            satiation: 0.95,
            low_energy: 0.2,
            depth_tolerance: 50.0,
            corpse_energy: [5.0, 15.0],
            old_age_energy_floor: 10.0,
            scarcity_threshold: 0.3,
            scarcity_patience: 50,
            escape_factor: 0.35,
            retaliation_factor: 0.2,
            retaliation_cost: 5.0,
            corpse_gain_factor: 0.7,
            algae_bite_energy: 3.0,
            basal_cost: 0.005,
            movement_cost: 0.005,
            prey_turn_speed: 0.1,
            predator_turn_speed: 0.08,
            prey_pregnancy_upkeep: 0.05,
            predator_pregnancy_upkeep: 0.1,
            eat_reach: 5.0,
            vegetation_speed_factor: 0.6,
            vegetation_drag: 0.65,
            pregnant_speed_factor: 0.85,
            current_resistance: 0.5,
            temperature_strain: 0.3,
            oxygen_strain: 0.2,
            growth_rate: 0.01,
        }
    }
}

/// Rooted vegetation and the debris it sheds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgaeConfig {
    pub energy_value: f32,
    /// Energy a plant loses per eaten segment.
    pub bite_loss: f32,
    /// Maximum plant height as a fraction of world height.
    pub max_height_fraction: [f32; 2],
    pub growth_timer: [f32; 2],
    /// Growth timer decrease per update.
    pub growth_tick: f32,
    pub growth_step: [f32; 2],
    pub branch_step: [f32; 2],
    pub branch_chance: f32,
    pub branch_offset: f32,
    pub lateral_jitter: f32,
    pub grow_chance: f32,
    pub propagate_chance: f32,
    pub propagate_spread: f32,
    /// A segment this close to the base anchors the plant.
    pub root_tolerance: f32,
    /// Number of lowest segments checked for anchoring.
    pub root_segments: usize,
    pub dead_part_chance: f32,
    /// Contact radius of a segment, used for the in-vegetation test.
    pub segment_radius: f32,
    pub dead_part_energy: [f32; 2],
    pub dead_part_float: [f32; 2],
    pub dead_part_lifetime: [f32; 2],
    pub dead_part_decay: f32,
    pub dead_part_hit_radius: f32,
}

impl Default for AlgaeConfig {
    fn default() -> Self {
        Self {
            energy_value: 10.0,
            bite_loss: 3.0,
            max_height_fraction: [0.3, 0.5],
            growth_timer: [50.0, 100.0],
            growth_tick: 3.0,
            growth_step: [4.0, 7.0],
            branch_step: [2.0, 5.0],
            branch_chance: 0.1,
            branch_offset: 5.0,
            lateral_jitter: 2.0,
            grow_chance: 0.6,
            propagate_chance: 0.01,
            propagate_spread: 20.0,
            root_tolerance: 4.0,
            root_segments: 5,
            dead_part_chance: 0.4,
            segment_radius: 2.0,
            dead_part_energy: [2.0, 5.0],
            dead_part_float: [0.2, 0.5],
            dead_part_lifetime: [500.0, 800.0],
            dead_part_decay: 2.0,
            dead_part_hit_radius: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanktonConfig {
    pub energy_value: [f32; 2],
    pub lifetime: [f32; 2],
    pub decay: f32,
    pub hit_radius: f32,
}

impl Default for PlanktonConfig {
    fn default() -> Self {
        Self {
            energy_value: [3.0, 7.0],
            lifetime: [200.0, 400.0],
            decay: 3.0,
            hit_radius: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrustaceanConfig {
    pub energy_value: [f32; 2],
    pub speed: [f32; 2],
    pub lifetime: [f32; 2],
    pub decay: f32,
    pub hit_radius: f32,
}

impl Default for CrustaceanConfig {
    fn default() -> Self {
        Self {
            energy_value: [25.0, 40.0],
            speed: [0.5, 1.0],
            lifetime: [300.0, 500.0],
            decay: 2.0,
            hit_radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EggConfig {
    pub prey_incubation: [f32; 2],
    pub predator_incubation: [f32; 2],
    pub prey_survival: f32,
    pub predator_survival: f32,
    /// Eggs are scattered this far around the mother.
    pub spread: f32,
    pub float_speed: [f32; 2],
    pub energy_value: [f32; 2],
    pub decay: f32,
    pub hit_radius: f32,
    /// The mother rests for her after-birth duration divided by this.
    pub rest_divisor: f32,
}

impl Default for EggConfig {
    fn default() -> Self {
        Self {
            prey_incubation: [80.0, 110.0],
            predator_incubation: [100.0, 150.0],
            prey_survival: 0.88,
            predator_survival: 0.73,
            spread: 2.0,
            float_speed: [0.1, 0.3],
            energy_value: [2.0, 5.0],
            decay: 3.0,
            hit_radius: 2.0,
            rest_divisor: 4.5,
        }
    }
}

/// Population sizes, caps and scheduler cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub initial_fish: usize,
    pub initial_algae: usize,
    pub initial_plankton: usize,
    pub initial_crustaceans: usize,
    pub max_algae: usize,
    /// Births and hatches beyond this many fish are dropped.
    pub max_fish: usize,
    /// Vegetation growth steps run before the first tick.
    pub seeding_steps: u32,
    /// Length of the buffered random sample pool.
    pub sample_buffer_len: usize,
    /// Detritus and vegetation update every N ticks.
    pub detritus_cadence: u32,
    /// Probability of considering an ambient spawn each tick, before the season factor.
    pub spawn_gate: f32,
    pub algae_spawn: f32,
    pub plankton_spawn: f32,
    pub crustacean_spawn: f32,
    /// Statistics sample every N ticks.
    pub stats_interval: u32,
    pub stats_capacity: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_fish: 40,
            initial_algae: 100,
            initial_plankton: 20,
            initial_crustaceans: 10,
            max_algae: 150,
            max_fish: 400,
            seeding_steps: 1000,
            sample_buffer_len: 1000,
            detritus_cadence: 2,
            spawn_gate: 0.3,
            algae_spawn: 0.0035,
            plankton_spawn: 0.15,
            crustacean_spawn: 0.05,
            stats_interval: 10,
            stats_capacity: 600,
        }
    }
}

/// Immutable parameter block supplied once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for every random stream in the simulation.
    pub seed: u64,
    pub world: WorldConfig,
    pub calendar: CalendarConfig,
    pub currents: CurrentConfig,
    pub fields: FieldConfig,
    pub spatial: SpatialConfig,
    pub genetics: GeneticsConfig,
    pub fish: FishConfig,
    pub algae: AlgaeConfig,
    pub plankton: PlanktonConfig,
    pub crustacean: CrustaceanConfig,
    pub egg: EggConfig,
    pub population: PopulationConfig,
}

impl SimConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter blocks that cannot drive a simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world.width", self.world.width)?;
        positive("world.height", self.world.height)?;
        positive("calendar.day_length", self.calendar.day_length as f32)?;
        positive("calendar.days_in_season", self.calendar.days_in_season as f32)?;
        unit("calendar.transition_fraction", self.calendar.transition_fraction)?;
        if self.calendar.transition_fraction > 0.5 {
            return Err(ConfigError::InvalidConfig(
                "calendar.transition_fraction must not exceed half a season",
            ));
        }

        positive("currents.cell_size", self.currents.cell_size)?;
        if self.currents.layers == 0 {
            return Err(ConfigError::InvalidConfig("currents.layers must be at least 1"));
        }
        if self.currents.min_gap_fraction * self.currents.layers as f32 >= 1.0 {
            return Err(ConfigError::InvalidConfig(
                "currents.min_gap_fraction leaves no room for the layers",
            ));
        }
        for (field, gain) in [
            ("currents.layer_strength_gain", self.currents.layer_strength_gain),
            ("currents.layer_direction_gain", self.currents.layer_direction_gain),
            ("currents.boundary_gain", self.currents.boundary_gain),
            ("currents.boundary_target_gain", self.currents.boundary_target_gain),
            ("currents.cell_strength_gain", self.currents.cell_strength_gain),
            ("currents.cell_direction_gain", self.currents.cell_direction_gain),
            ("currents.algae_drag", self.currents.algae_drag),
        ] {
            unit(field, gain)?;
        }

        positive("fields.cell_size", self.fields.cell_size)?;
        ordered(
            "fields.temperature",
            self.fields.min_temperature,
            self.fields.max_temperature,
        )?;
        ordered("fields.oxygen", self.fields.min_oxygen, self.fields.max_oxygen)?;
        positive("fields.optimal_temperature", self.fields.optimal_temperature)?;
        positive("fields.critical_oxygen", self.fields.critical_oxygen)?;
        positive("spatial.cell_size", self.spatial.cell_size)?;

        unit("genetics.mutation_rate", self.genetics.mutation_rate)?;
        unit("genetics.dominant_inheritance", self.genetics.dominant_inheritance)?;

        positive("fish.max_energy", self.fish.max_energy)?;
        positive("fish.initial_size", self.fish.initial_size)?;
        for (field, range) in [
            ("fish.initial_energy", self.fish.initial_energy),
            ("fish.corpse_energy", self.fish.corpse_energy),
            ("algae.max_height_fraction", self.algae.max_height_fraction),
            ("algae.growth_timer", self.algae.growth_timer),
            ("algae.growth_step", self.algae.growth_step),
            ("algae.dead_part_lifetime", self.algae.dead_part_lifetime),
            ("plankton.lifetime", self.plankton.lifetime),
            ("crustacean.lifetime", self.crustacean.lifetime),
            ("egg.prey_incubation", self.egg.prey_incubation),
            ("egg.predator_incubation", self.egg.predator_incubation),
        ] {
            ordered(field, range[0], range[1])?;
        }
        for (field, range) in [
            ("fish.prey_pregnancy_duration", self.fish.prey_pregnancy_duration),
            ("fish.predator_pregnancy_duration", self.fish.predator_pregnancy_duration),
            ("fish.prey_after_birth", self.fish.prey_after_birth),
            ("fish.predator_after_birth", self.fish.predator_after_birth),
            ("fish.prey_litter", self.fish.prey_litter),
            ("fish.predator_litter", self.fish.predator_litter),
            ("fish.prey_clutch", self.fish.prey_clutch),
            ("fish.predator_clutch", self.fish.predator_clutch),
        ] {
            ordered(field, range[0] as f32, range[1] as f32)?;
        }
        unit("egg.prey_survival", self.egg.prey_survival)?;
        unit("egg.predator_survival", self.egg.predator_survival)?;
        positive("egg.rest_divisor", self.egg.rest_divisor)?;

        if self.population.sample_buffer_len == 0 {
            return Err(ConfigError::InvalidConfig(
                "population.sample_buffer_len must be non-zero",
            ));
        }
        if self.population.detritus_cadence == 0 {
            return Err(ConfigError::InvalidConfig(
                "population.detritus_cadence must be non-zero",
            ));
        }
        if self.population.stats_interval == 0 || self.population.stats_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "population statistics need a non-zero interval and capacity",
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field,
            value: value as f64,
        })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange {
            field,
            value: value as f64,
        })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange {
            field,
            min: min as f64,
            max: max as f64,
        })
    }
}
