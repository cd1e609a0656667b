use std::collections::VecDeque;

use anyhow::Result;
use tunic_game::error::WorldError;
use tunic_logic::{AllItems, CollectionState, Inventory, Player, SweepState};

use crate::graph::{LocationIdx, RegionGraph, RegionIdx};

#[derive(Clone, Debug)]
pub struct Reachability {
    pub regions: Vec<bool>,
    // Location is in a reached region and its own rule passes.
    pub locations: Vec<bool>,
    // Items picked up from reachable locations that already hold one.
    pub collected: Inventory,
}

impl Reachability {
    pub fn reachable_locations(&self) -> impl Iterator<Item = LocationIdx> + '_ {
        self.locations
            .iter()
            .enumerate()
            .filter(|&(_, &r)| r)
            .map(|(i, _)| i)
    }
}

fn reach_regions<S: CollectionState>(
    graph: &RegionGraph,
    state: &S,
    player: Player,
    start: RegionIdx,
) -> Vec<bool> {
    let mut visited = vec![false; graph.regions.len()];
    let mut queue: VecDeque<RegionIdx> = VecDeque::new();
    visited[start] = true;
    queue.push_back(start);
    while let Some(region_idx) = queue.pop_front() {
        for &exit_idx in &graph.regions[region_idx].exits {
            let exit = &graph.exits[exit_idx];
            if !visited[exit.to] && exit.rule.evaluate(state, player) {
                visited[exit.to] = true;
                queue.push_back(exit.to);
            }
        }
    }
    visited
}

/// Repeatedly expands the reachable graph, picking up the items already placed
/// at reachable locations (events, locked items, host placements), until
/// nothing new is found.
pub fn sweep<S: CollectionState>(
    graph: &RegionGraph,
    base: &S,
    player: Player,
) -> Result<Reachability> {
    let start = graph.start_region()?;
    let mut state = SweepState::new(base);
    let mut checked = vec![false; graph.locations.len()];
    loop {
        let regions = reach_regions(graph, &state, player, start);
        let mut progress = false;
        for (idx, location) in graph.locations.iter().enumerate() {
            if checked[idx] || !regions[location.region] {
                continue;
            }
            if !location.rule.evaluate(&state, player) {
                continue;
            }
            checked[idx] = true;
            if let Some(item) = &location.item {
                state.extra.collect(item, player);
                progress = true;
            }
        }
        if !progress {
            return Ok(Reachability {
                regions,
                locations: checked,
                collected: state.extra,
            });
        }
    }
}

pub fn can_reach_region<S: CollectionState>(
    graph: &RegionGraph,
    state: &S,
    player: Player,
    region: &str,
) -> Result<bool> {
    let region_idx = graph.require_region(region)?;
    Ok(sweep(graph, state, player)?.regions[region_idx])
}

pub fn can_reach_location<S: CollectionState>(
    graph: &RegionGraph,
    state: &S,
    player: Player,
    location: &str,
) -> Result<bool> {
    let location_idx = graph.require_location(location)?;
    Ok(sweep(graph, state, player)?.locations[location_idx])
}

pub fn is_beatable<S: CollectionState>(
    graph: &RegionGraph,
    state: &S,
    player: Player,
) -> Result<bool> {
    let Some(completion) = &graph.completion else {
        return Ok(false);
    };
    let reach = sweep(graph, state, player)?;
    let combined = SweepState {
        base: state,
        extra: reach.collected,
    };
    Ok(completion.is_met(&combined, player))
}

/// Every region must be reachable from the start once all items are held.
pub fn verify_all_reachable(graph: &RegionGraph, player: Player) -> Result<()> {
    let reach = sweep(graph, &AllItems, player)?;
    if let Some(idx) = reach.regions.iter().position(|&r| !r) {
        return Err(WorldError::UnsatisfiablePairing(format!(
            "region {} is unreachable from the start",
            graph.regions[idx].name
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StaticExitResolver;
    use tunic_game::GameData;
    use tunic_logic::Rule;

    const P1: Player = Player(1);

    #[test]
    fn test_sweep_collects_events() -> Result<()> {
        let game_data = GameData::load()?;
        let mut graph = RegionGraph::build(&game_data, &StaticExitResolver)?;
        graph.connection_mut("Overworld", "Overworld Temple Door")?.rule = Rule::make_and(vec![
            Rule::item("Ring East Bell"),
            Rule::item("Ring West Bell"),
        ]);
        // Bells are free events here, so the sweep opens the temple by itself.
        assert!(can_reach_region(&graph, &Inventory::new(), P1, "Sealed Temple")?);
        graph.location_mut("Ring West Bell")?.rule = Rule::item("Stick");
        assert!(!can_reach_region(&graph, &Inventory::new(), P1, "Sealed Temple")?);
        assert!(can_reach_region(
            &graph,
            &Inventory::with_items(P1, &[("Stick", 1)]),
            P1,
            "Sealed Temple"
        )?);
        Ok(())
    }

    #[test]
    fn test_unreachable_region_is_reported() -> Result<()> {
        let game_data = GameData::load()?;
        let mut graph = RegionGraph::build(&game_data, &StaticExitResolver)?;
        verify_all_reachable(&graph, P1)?;
        graph.connection_mut("Quarry", "Lower Quarry")?.rule = Rule::Never;
        let err = verify_all_reachable(&graph, P1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorldError>(),
            Some(WorldError::UnsatisfiablePairing(_))
        ));
        Ok(())
    }
}
