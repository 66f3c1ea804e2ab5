use macroquad::prelude::Vec2;

use crate::entity::EntityId;
use crate::organisms::Organisms;
use crate::spatial_hash::SpatialIndex;
use crate::vegetation::{SegmentKey, Vegetation};
use crate::world::World;

/// Anything a fish can eat that is not another fish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FoodRef {
    AlgaeSegment(SegmentKey),
    Plankton(EntityId),
    DeadAlgae(EntityId),
    Crustacean(EntityId),
    Egg(EntityId),
}

impl FoodRef {
    /// Plant matter and plankton feed prey.
    pub fn feeds_prey(&self) -> bool {
        matches!(
            self,
            FoodRef::AlgaeSegment(_) | FoodRef::Plankton(_) | FoodRef::DeadAlgae(_)
        )
    }

    /// Crustaceans and eggs feed predators.
    pub fn feeds_predators(&self) -> bool {
        matches!(self, FoodRef::Crustacean(_) | FoodRef::Egg(_))
    }

    /// Current position, or `None` once the food is gone.
    pub fn position(&self, vegetation: &Vegetation, organisms: &Organisms) -> Option<Vec2> {
        match *self {
            FoodRef::AlgaeSegment(key) => vegetation.segment_pos(key),
            FoodRef::Plankton(id) => organisms.plankton.get(id).map(|p| p.pos),
            FoodRef::DeadAlgae(id) => organisms.dead_algae.get(id).map(|p| p.pos),
            FoodRef::Crustacean(id) => organisms.crustaceans.get(id).map(|c| c.pos),
            FoodRef::Egg(id) => organisms.eggs.get(id).map(|e| e.pos),
        }
    }
}

/// Loose food (everything except algae segments, which live in the
/// vegetation index), rebuilt once per tick from the start-of-tick positions.
pub struct FoodIndex {
    index: SpatialIndex<FoodRef>,
}

impl FoodIndex {
    pub fn new(world: &World, cell_size: f32) -> Self {
        Self {
            index: SpatialIndex::new(world.width, world.height, cell_size),
        }
    }

    pub fn rebuild(&mut self, organisms: &Organisms) {
        let plankton = organisms.plankton.iter().map(|(id, p)| (FoodRef::Plankton(id), p.pos));
        let dead = organisms.dead_algae.iter().map(|(id, p)| (FoodRef::DeadAlgae(id), p.pos));
        let crustaceans = organisms
            .crustaceans
            .iter()
            .map(|(id, c)| (FoodRef::Crustacean(id), c.pos));
        let eggs = organisms.eggs.iter().map(|(id, e)| (FoodRef::Egg(id), e.pos));
        self.index
            .rebuild(plankton.chain(dead).chain(crustaceans).chain(eggs));
    }

    pub fn within(&self, pos: Vec2, radius: f32) -> impl Iterator<Item = &(FoodRef, Vec2)> + '_ {
        self.index.query_radius(pos, radius)
    }

    pub fn nearest(
        &self,
        pos: Vec2,
        radius: f32,
        filter: impl FnMut(&FoodRef) -> bool,
    ) -> Option<(FoodRef, Vec2, f32)> {
        self.index.nearest(pos, radius, filter)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
