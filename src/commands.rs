use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::genome::Genome;
use crate::snapshot::Point;
use crate::traits::TraitOverrides;

/// Extra reach around a fish's body when picking it for removal.
const FISH_PICK_MARGIN: f32 = 5.0;

/// Populations a remove command can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    Fish,
    Plankton,
    Crustacean,
    Egg,
    DeadAlgae,
}

impl Species {
    /// Pick radius for the non-fish species. Fish are picked by body size.
    pub fn hit_radius(self, config: &SimConfig) -> Option<f32> {
        match self {
            Species::Fish => None,
            Species::Plankton => Some(config.plankton.hit_radius),
            Species::Crustacean => Some(config.crustacean.hit_radius),
            Species::Egg => Some(config.egg.hit_radius),
            Species::DeadAlgae => Some(config.algae.dead_part_hit_radius),
        }
    }

    pub fn fish_hit_radius(size: f32) -> f32 {
        size + FISH_PICK_MARGIN
    }
}

/// Display-only overlays. Toggling them never touches simulation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualFlag {
    Vision,
    Targets,
    Currents,
    Temperature,
    Oxygen,
    Boundaries,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualFlags {
    pub vision: bool,
    pub targets: bool,
    pub currents: bool,
    pub temperature: bool,
    pub oxygen: bool,
    pub boundaries: bool,
}

impl VisualFlags {
    pub fn toggle(&mut self, flag: VisualFlag) {
        let slot = match flag {
            VisualFlag::Vision => &mut self.vision,
            VisualFlag::Targets => &mut self.targets,
            VisualFlag::Currents => &mut self.currents,
            VisualFlag::Temperature => &mut self.temperature,
            VisualFlag::Oxygen => &mut self.oxygen,
            VisualFlag::Boundaries => &mut self.boundaries,
        };
        *slot = !*slot;
    }

    pub fn is_set(&self, flag: VisualFlag) -> bool {
        match flag {
            VisualFlag::Vision => self.vision,
            VisualFlag::Targets => self.targets,
            VisualFlag::Currents => self.currents,
            VisualFlag::Temperature => self.temperature,
            VisualFlag::Oxygen => self.oxygen,
            VisualFlag::Boundaries => self.boundaries,
        }
    }
}

/// Mutation request from the presentation layer, applied between ticks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Command {
    SpawnPlankton {
        pos: Point,
    },
    SpawnCrustacean {
        pos: Point,
    },
    /// A random genome is drawn when none is given; overrides replace the
    /// traits derived from it.
    SpawnFish {
        pos: Point,
        genome: Option<Genome>,
        energy: Option<f32>,
        #[serde(default)]
        overrides: TraitOverrides,
    },
    RemoveNearest {
        species: Species,
        pos: Point,
    },
    Pause,
    Resume,
    TogglePause,
    ToggleVisualization(VisualFlag),
}

/// What applying a command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// A remove found nothing within reach, or a spawn hit the fish cap.
    NoEffect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_restores_the_flag() {
        let mut flags = VisualFlags::default();
        flags.toggle(VisualFlag::Currents);
        assert!(flags.is_set(VisualFlag::Currents));
        assert!(!flags.is_set(VisualFlag::Oxygen));
        flags.toggle(VisualFlag::Currents);
        assert_eq!(flags, VisualFlags::default());
    }

    #[test]
    fn commands_parse_from_json() {
        let command: Command =
            serde_json::from_str(r#"{"RemoveNearest":{"species":"Egg","pos":{"x":4.0,"y":9.5}}}"#)
                .expect("valid command");
        match command {
            Command::RemoveNearest { species, pos } => {
                assert_eq!(species, Species::Egg);
                assert_eq!(pos, Point { x: 4.0, y: 9.5 });
            }
            other => panic!("unexpected {other:?}"),
        }

        let spawn: Command = serde_json::from_str(
            r#"{"SpawnFish":{"pos":{"x":1.0,"y":2.0},"genome":null,"energy":30.0}}"#,
        )
        .expect("overrides default");
        assert!(matches!(spawn, Command::SpawnFish { overrides, .. } if overrides.is_empty()));
    }

    #[test]
    fn pick_radii_follow_the_config() {
        let config = SimConfig::default();
        assert_eq!(Species::Fish.hit_radius(&config), None);
        assert_eq!(Species::Plankton.hit_radius(&config), Some(config.plankton.hit_radius));
        assert_eq!(Species::fish_hit_radius(4.0), 9.0);
    }
}
