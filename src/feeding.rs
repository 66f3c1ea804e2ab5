use std::collections::HashSet;

use crate::behavior::TickView;
use crate::commit::{FeedClaim, Meal, PendingChanges};
use crate::fish::Fish;
use crate::food::FoodRef;
use crate::random::SimContext;

/// Queue everything this fish can eat from where it ended the tick.
/// Live prey get an escape roll here; the commit phase resolves contested
/// food first come, first served.
pub fn claim_meals(
    fish: &Fish,
    me: usize,
    view: &TickView,
    ctx: &mut SimContext,
    pending: &mut PendingChanges,
) {
    let settings = &view.config.fish;
    if fish.is_dead() || fish.energy >= fish.traits.max_energy * settings.satiation {
        return;
    }
    let eater = view.fish[me].id;
    let reach = fish.size + settings.eat_reach;
    let reach_sq = reach * reach;
    let mut claim = |meal: Meal| pending.claims.push(FeedClaim { eater, meal });

    if fish.is_predator() {
        for (food, pos) in view.food.within(fish.pos, reach) {
            if food.feeds_predators() && pos.distance_squared(fish.pos) < reach_sq {
                claim(Meal::Food(*food));
            }
        }

        let largest = view.fish.iter().map(|f| f.size).fold(0.0, f32::max);
        for (i, pos) in view.fish_index.query_radius(fish.pos, fish.size + largest) {
            if *i == me {
                continue;
            }
            let other = &view.fish[*i];
            let contact = fish.size + other.size;
            if pos.distance_squared(fish.pos) >= contact * contact {
                continue;
            }
            if other.dead {
                claim(Meal::Corpse(other.id));
                continue;
            }
            let edible = !other.predator || other.size + settings.eat_size_margin < fish.size;
            if !edible {
                continue;
            }
            if ctx.roll() < other.defense * settings.escape_factor {
                continue;
            }
            let retaliation = ctx.roll() < other.defense * settings.retaliation_factor;
            claim(Meal::Fish {
                prey: other.id,
                retaliation,
            });
        }
    } else {
        // One bite per plant per tick.
        let mut bitten = HashSet::new();
        for (key, pos) in view.vegetation.segments_within(fish.pos, reach) {
            if pos.distance_squared(fish.pos) < reach_sq && bitten.insert(key.algae) {
                claim(Meal::Food(FoodRef::AlgaeSegment(*key)));
            }
        }
        for (food, pos) in view.food.within(fish.pos, reach) {
            if food.feeds_prey() && pos.distance_squared(fish.pos) < reach_sq {
                claim(Meal::Food(*food));
            }
        }
    }
}
