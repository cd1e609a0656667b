//! Single-slot assumed fill, standing in for the host's solver when the world
//! is generated on its own (CLI runs and tests).

use anyhow::{bail, Result};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::{LocationIdx, RegionGraph};
use crate::traverse::sweep;
use crate::world::{Placement, TunicWorld};

pub fn assumed_fill<R: Rng>(
    world: &TunicWorld,
    rng: &mut R,
) -> Result<(RegionGraph, Vec<Placement>)> {
    let player = world.player;
    let mut graph = world.graph.clone();
    let mut progression: Vec<&str> = vec![];
    let mut other: Vec<&str> = vec![];
    for item in &world.item_pool {
        if item.is_progression() {
            progression.push(&item.name);
        } else {
            other.push(&item.name);
        }
    }
    progression.shuffle(rng);
    other.shuffle(rng);

    let mut empty: Vec<LocationIdx> = graph
        .locations
        .iter()
        .enumerate()
        .filter(|(_, loc)| !loc.event && !loc.locked && loc.item.is_none())
        .map(|(i, _)| i)
        .collect();
    let mut unplaced = world.start_state();
    for &item in &progression {
        unplaced.collect(item, player);
    }

    while let Some(item) = progression.pop() {
        unplaced.remove(item, player);
        let reach = sweep(&graph, &unplaced, player)?;
        let candidates: Vec<usize> = (0..empty.len())
            .filter(|&k| reach.locations[empty[k]])
            .collect();
        let Some(&k) = candidates.choose(rng) else {
            bail!("[player {player}] No reachable location left for {item}");
        };
        let loc_idx = empty.swap_remove(k);
        debug!(
            "[player {player}] Placing {item} at {}",
            graph.locations[loc_idx].name
        );
        graph.locations[loc_idx].item = Some(item.to_string());
    }

    empty.shuffle(rng);
    for (loc_idx, item) in empty.into_iter().zip(other) {
        graph.locations[loc_idx].item = Some(item.to_string());
    }

    let placements = graph
        .fillable_locations()
        .filter_map(|loc| {
            loc.item.as_ref().map(|item| Placement {
                item: item.clone(),
                location: loc.name.clone(),
                player,
            })
        })
        .collect();
    Ok((graph, placements))
}
