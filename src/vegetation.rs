use macroquad::prelude::{vec2, Vec2};
use tracing::debug;

use crate::config::AlgaeConfig;
use crate::entity::{Arena, EntityId};
use crate::organisms::DeadAlgaePart;
use crate::random::SimContext;
use crate::spatial_hash::SpatialIndex;
use crate::world::World;

/// Identity of one algae segment: the plant plus a per-plant serial number
/// that survives removal of earlier segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    pub algae: EntityId,
    pub segment: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub id: u32,
    pub pos: Vec2,
}

/// A rooted plant growing segment by segment from the bottom.
#[derive(Clone, Debug)]
pub struct Algae {
    pub root_x: f32,
    pub base_y: f32,
    pub segments: Vec<Segment>,
    next_segment: u32,
    pub energy_value: f32,
    pub growth_timer: f32,
    pub max_height: f32,
    pub alive: bool,
}

impl Algae {
    fn new(x: f32, base_y: f32, world: &World, settings: &AlgaeConfig, ctx: &mut SimContext) -> Self {
        Self {
            root_x: x,
            base_y,
            segments: vec![Segment {
                id: 0,
                pos: vec2(x, base_y),
            }],
            next_segment: 1,
            energy_value: settings.energy_value,
            growth_timer: ctx.uniform_in(settings.growth_timer).round(),
            max_height: (ctx.uniform_in(settings.max_height_fraction) * world.height).floor(),
            alive: true,
        }
    }

    fn push_segment(&mut self, pos: Vec2) -> u32 {
        let id = self.next_segment;
        self.next_segment += 1;
        self.segments.push(Segment { id, pos });
        id
    }

    /// Anchored while one of the lowest segments still touches the base.
    pub fn is_rooted(&self, settings: &AlgaeConfig) -> bool {
        self.segments
            .iter()
            .take(settings.root_segments)
            .any(|s| s.pos.y >= self.base_y - settings.root_tolerance)
    }

    pub fn height(&self) -> f32 {
        self.segments
            .iter()
            .map(|s| self.base_y - s.pos.y)
            .fold(0.0, f32::max)
    }

    fn top(&self) -> Option<Segment> {
        self.segments
            .iter()
            .copied()
            .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
    }
}

/// The algae population together with the segment index used for
/// vegetation occlusion, oxygen and prey feeding. All segment insertions and
/// removals go through here so the index always mirrors the arena.
pub struct Vegetation {
    settings: AlgaeConfig,
    world: World,
    algae: Arena<Algae>,
    index: SpatialIndex<SegmentKey>,
}

impl Vegetation {
    pub fn new(world: &World, settings: &AlgaeConfig, cell_size: f32) -> Self {
        Self {
            settings: settings.clone(),
            world: *world,
            algae: Arena::new(),
            index: SpatialIndex::new(world.width, world.height, cell_size),
        }
    }

    /// Plant a new root at `(x, base_y)`.
    pub fn plant(&mut self, x: f32, base_y: f32, ctx: &mut SimContext) -> EntityId {
        let algae = Algae::new(x, base_y, &self.world, &self.settings, ctx);
        let root = algae.segments[0];
        let id = self.algae.spawn(algae);
        self.index.insert(
            SegmentKey {
                algae: id,
                segment: root.id,
            },
            root.pos,
        );
        id
    }

    /// One growth attempt. Plants grow in daylight only, on their own timer,
    /// one segment above the current top and sometimes a side branch.
    pub fn grow(&mut self, id: EntityId, daytime: bool, growth_factor: f32, ctx: &mut SimContext) {
        let s = &self.settings;
        let Some(algae) = self.algae.get_mut(id) else {
            return;
        };
        if !algae.alive || !daytime {
            return;
        }
        if algae.growth_timer > 0.0 {
            algae.growth_timer -= s.growth_tick;
            return;
        }
        let Some(top) = algae.top() else {
            return;
        };
        if algae.base_y - top.pos.y >= algae.max_height {
            return;
        }

        let pos = vec2(
            top.pos.x + ctx.jitter(s.lateral_jitter),
            top.pos.y - ctx.uniform_in(s.growth_step) * growth_factor,
        );
        let segment = algae.push_segment(pos);
        algae.energy_value += ctx.int_inclusive(1, 3) as f32;
        self.index.insert(SegmentKey { algae: id, segment }, pos);

        if ctx.chance(s.branch_chance) {
            let pos = vec2(
                top.pos.x + ctx.jitter(s.branch_offset),
                top.pos.y - ctx.uniform_in(s.branch_step) * growth_factor,
            );
            let segment = algae.push_segment(pos);
            algae.energy_value += ctx.int_inclusive(1, 2) as f32;
            self.index.insert(SegmentKey { algae: id, segment }, pos);
        }

        algae.growth_timer = ctx.uniform_in(s.growth_timer).round();
    }

    /// Accelerated growth used while seeding the world before the first tick.
    pub fn seed_step(&mut self, growth_factor: f32, ctx: &mut SimContext) {
        for id in self.algae.ids() {
            if !ctx.chance(0.2) {
                continue;
            }
            self.grow(id, true, growth_factor, ctx);
            let short = (ctx.uniform_in(self.settings.growth_timer) / 10.0).round();
            if let Some(algae) = self.algae.get_mut(id) {
                algae.growth_timer = algae.growth_timer.min(short);
            }
        }
    }

    /// Detritus-cadence update of every plant: uprooted plants die and shed
    /// floating parts, living ones grow and occasionally seed an offshoot.
    pub fn update(
        &mut self,
        daytime: bool,
        growth_factor: f32,
        max_algae: usize,
        ctx: &mut SimContext,
    ) -> Vec<DeadAlgaePart> {
        let mut shed = Vec::new();
        let mut offshoots = Vec::new();

        for id in self.algae.ids() {
            let Some((alive, rooted, root_x, base_y)) = self
                .algae
                .get(id)
                .map(|a| (a.alive, a.is_rooted(&self.settings), a.root_x, a.base_y))
            else {
                continue;
            };
            if !alive {
                continue;
            }
            if !rooted {
                shed.extend(self.uproot(id, ctx));
                continue;
            }

            if ctx.chance(self.settings.grow_chance) {
                self.grow(id, daytime, growth_factor, ctx);
            }
            if self.algae.len() + offshoots.len() < max_algae
                && ctx.chance(self.settings.propagate_chance)
            {
                let spread = self.settings.propagate_spread;
                let x = root_x + ctx.uniform(-spread, spread).round();
                if (0.0..=self.world.width).contains(&x) {
                    offshoots.push((x, base_y));
                }
            }
        }

        for (x, base_y) in offshoots {
            self.plant(x, base_y, ctx);
        }
        shed
    }

    /// Kill a plant: every segment leaves the index, segments above the
    /// base may turn into floating debris, and the plant is removed.
    fn uproot(&mut self, id: EntityId, ctx: &mut SimContext) -> Vec<DeadAlgaePart> {
        let Some(algae) = self.algae.despawn(id) else {
            return Vec::new();
        };
        let mut parts = Vec::new();
        for seg in &algae.segments {
            if seg.pos.y < algae.base_y - self.settings.root_tolerance
                && ctx.chance(self.settings.dead_part_chance)
            {
                parts.push(DeadAlgaePart::new(seg.pos, &self.settings, ctx));
            }
            self.index.remove(
                SegmentKey {
                    algae: id,
                    segment: seg.id,
                },
                seg.pos,
            );
        }
        debug!(segments = algae.segments.len(), shed = parts.len(), "algae uprooted");
        parts
    }

    /// Remove one eaten segment. Returns false if it was already gone.
    pub fn consume_segment(&mut self, key: SegmentKey) -> bool {
        let Some(algae) = self.algae.get_mut(key.algae) else {
            return false;
        };
        let Some(slot) = algae.segments.iter().position(|s| s.id == key.segment) else {
            return false;
        };
        let seg = algae.segments.remove(slot);
        algae.energy_value = (algae.energy_value - self.settings.bite_loss).max(0.0);
        let empty = algae.segments.is_empty();
        self.index.remove(key, seg.pos);
        if empty {
            self.algae.despawn(key.algae);
        }
        true
    }

    pub fn segment_pos(&self, key: SegmentKey) -> Option<Vec2> {
        self.algae
            .get(key.algae)?
            .segments
            .iter()
            .find(|s| s.id == key.segment)
            .map(|s| s.pos)
    }

    /// True when any segment lies strictly within `radius` of `pos`.
    pub fn is_near(&self, pos: Vec2, radius: f32) -> bool {
        let radius_sq = radius * radius;
        self.index
            .query_radius(pos, radius)
            .any(|(_, p)| p.distance_squared(pos) < radius_sq)
    }

    /// Closest segment within `radius`, with its squared distance.
    pub fn nearest_segment(&self, pos: Vec2, radius: f32) -> Option<(SegmentKey, Vec2, f32)> {
        self.index.nearest(pos, radius, |_| true)
    }

    pub fn segments_within(&self, pos: Vec2, radius: f32) -> impl Iterator<Item = &(SegmentKey, Vec2)> + '_ {
        self.index.query_radius(pos, radius)
    }

    pub fn segment_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.index.iter().map(|(_, p)| *p)
    }

    pub fn segment_count(&self) -> usize {
        self.index.len()
    }

    pub fn algae_count(&self) -> usize {
        self.algae.len()
    }

    pub fn algae(&self) -> &Arena<Algae> {
        &self.algae
    }

    pub fn index(&self) -> &SpatialIndex<SegmentKey> {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (World, Vegetation, SimContext) {
        let world = World::new(1100.0, 650.0);
        let vegetation = Vegetation::new(&world, &AlgaeConfig::default(), 50.0);
        (world, vegetation, SimContext::new(11, 128))
    }

    fn grown(vegetation: &mut Vegetation, id: EntityId, ctx: &mut SimContext, steps: usize) {
        for _ in 0..steps {
            vegetation.grow(id, true, 1.0, ctx);
        }
    }

    fn index_matches_arena(vegetation: &Vegetation) -> bool {
        let in_arena: usize = vegetation.algae().values().map(|a| a.segments.len()).sum();
        in_arena == vegetation.segment_count()
            && vegetation.algae().iter().all(|(id, a)| {
                a.segments.iter().all(|s| {
                    vegetation
                        .index()
                        .query_neighbors(s.pos)
                        .any(|(k, _)| *k == SegmentKey { algae: id, segment: s.id })
                })
            })
    }

    #[test]
    fn plants_grow_upward_in_daylight_only() {
        let (world, mut vegetation, mut ctx) = setup();
        let id = vegetation.plant(300.0, world.height, &mut ctx);
        for _ in 0..500 {
            vegetation.grow(id, false, 1.0, &mut ctx);
        }
        assert_eq!(vegetation.segment_count(), 1);

        grown(&mut vegetation, id, &mut ctx, 2000);
        let algae = vegetation.algae().get(id).expect("alive");
        assert!(algae.segments.len() > 1);
        assert!(algae.segments.iter().all(|s| s.pos.y <= world.height));
        assert!(algae.height() <= algae.max_height + 7.0 * 1.0);
        assert!(index_matches_arena(&vegetation));
    }

    #[test]
    fn eating_the_root_uproots_the_plant() {
        let (world, mut vegetation, mut ctx) = setup();
        let id = vegetation.plant(500.0, world.height, &mut ctx);
        grown(&mut vegetation, id, &mut ctx, 3000);
        let total = vegetation.segment_count();
        assert!(total > 2);

        let base = world.height - AlgaeConfig::default().root_tolerance;
        let anchors: Vec<SegmentKey> = vegetation
            .algae()
            .get(id)
            .expect("alive")
            .segments
            .iter()
            .filter(|s| s.pos.y >= base)
            .map(|s| SegmentKey { algae: id, segment: s.id })
            .collect();
        for key in &anchors {
            assert!(vegetation.consume_segment(*key));
        }
        assert!(!vegetation.consume_segment(SegmentKey { algae: id, segment: 0 }));
        assert_eq!(vegetation.segment_count(), total - anchors.len());

        let mut rolls = SimContext::new(1, 64);
        vegetation.update(true, 1.0, 150, &mut rolls);
        assert!(vegetation.algae().get(id).is_none());
        assert_eq!(vegetation.segment_count(), 0);
        assert!(index_matches_arena(&vegetation));
    }

    #[test]
    fn consuming_the_last_segment_removes_the_plant() {
        let (world, mut vegetation, mut ctx) = setup();
        let id = vegetation.plant(10.0, world.height, &mut ctx);
        assert!(vegetation.consume_segment(SegmentKey { algae: id, segment: 0 }));
        assert_eq!(vegetation.algae_count(), 0);
        assert_eq!(vegetation.segment_count(), 0);
    }

    #[test]
    fn proximity_queries_use_exact_distance() {
        let (world, mut vegetation, mut ctx) = setup();
        vegetation.plant(200.0, world.height, &mut ctx);
        let root = vec2(200.0, world.height);
        assert!(vegetation.is_near(root + vec2(1.0, 0.0), 2.0));
        assert!(!vegetation.is_near(root + vec2(0.0, -40.0), 2.0));
        let (_, pos, d_sq) = vegetation.nearest_segment(root + vec2(3.0, -4.0), 10.0).expect("segment");
        assert_eq!(pos, root);
        assert!((d_sq - 25.0).abs() < 1e-3);
    }

    #[test]
    fn offshoots_respect_the_cap() {
        let (world, mut vegetation, mut ctx) = setup();
        for i in 0..5 {
            vegetation.plant(100.0 + i as f32 * 100.0, world.height, &mut ctx);
        }
        for _ in 0..2000 {
            vegetation.update(true, 1.0, 6, &mut ctx);
        }
        assert!(vegetation.algae_count() <= 6);
        assert!(index_matches_arena(&vegetation));
    }
}
