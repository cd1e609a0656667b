use std::collections::{BTreeMap, VecDeque};

use anyhow::Result;
use hashbrown::HashSet;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tunic_game::error::WorldError;
use tunic_game::regions::{Portal, RegionTable, START_REGION};
use tunic_game::LocationId;

use crate::graph::{ExitKind, RegionGraph};
use crate::settings::Options;

pub const SHOP_SCENE: &str = "Shop";
pub const SHOP_DESTINATION: &str = "Previous Region";
pub const FIXED_SHOP_PORTAL: &str = "Overworld Redux, Windmill_";
pub const SHOP_COUNT: usize = 6;
pub const FIXED_SHOP_COUNT: usize = 1;

/// Maps location id to the start-area portal whose far side leads to it.
pub type HintMap = BTreeMap<LocationId, String>;

pub fn shop_portal(num: usize) -> Portal {
    Portal {
        name: format!("Shop Portal {num}"),
        region: format!("Shop Portal {num}"),
        scene: SHOP_SCENE.to_string(),
        destination: SHOP_DESTINATION.to_string(),
        tag: String::new(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PortalPairing {
    pub pairs: Vec<(Portal, Portal)>,
}

impl PortalPairing {
    pub fn shop_portals(&self) -> impl Iterator<Item = &Portal> {
        self.pairs
            .iter()
            .flat_map(|(a, b)| [a, b])
            .filter(|p| p.scene == SHOP_SCENE)
    }

    /// The "Entrance Rando" table sent to the client.
    pub fn scene_destinations(&self) -> BTreeMap<String, String> {
        self.pairs
            .iter()
            .map(|(a, b)| (a.scene_destination(), b.scene_destination()))
            .collect()
    }

    pub fn partner(&self, portal: &str) -> Option<&Portal> {
        self.pairs.iter().find_map(|(a, b)| {
            if a.name == portal {
                Some(b)
            } else if b.name == portal {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Checks the pairing constraints: every portal used once, shops only
    /// against multi-exit regions in distinct scenes, no dead end against a
    /// dead end or a shop.
    pub fn check_legality(&self, table: &RegionTable) -> Result<()> {
        let is_dead_end = |p: &Portal| table.get(&p.region).is_some_and(|r| r.dead_end);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut shop_scenes: HashSet<&str> = HashSet::new();
        for (a, b) in &self.pairs {
            for p in [a, b] {
                if !seen.insert(p.name.as_str()) {
                    return Err(WorldError::UnsatisfiablePairing(format!(
                        "portal {} is paired twice",
                        p.name
                    ))
                    .into());
                }
            }
            let shop_a = a.scene == SHOP_SCENE;
            let shop_b = b.scene == SHOP_SCENE;
            let illegal = if shop_a || shop_b {
                let other = if shop_a { b } else { a };
                (shop_a && shop_b)
                    || is_dead_end(other)
                    || !shop_scenes.insert(other.scene.as_str())
            } else {
                is_dead_end(a) && is_dead_end(b)
            };
            if illegal {
                return Err(WorldError::UnsatisfiablePairing(format!(
                    "illegal pairing {} <-> {}",
                    a.name, b.name
                ))
                .into());
            }
        }
        for portal in &table.portals {
            if !seen.contains(portal.name.as_str()) {
                return Err(WorldError::UnsatisfiablePairing(format!(
                    "portal {} is left unpaired",
                    portal.name
                ))
                .into());
            }
        }
        Ok(())
    }
}

fn unsatisfiable(msg: String) -> anyhow::Error {
    WorldError::UnsatisfiablePairing(msg).into()
}

/// Randomly pairs every portal so that all regions stay connected to the start.
pub fn pair_portals<R: Rng>(
    table: &RegionTable,
    rng: &mut R,
    options: &Options,
) -> Result<PortalPairing> {
    let mut two_plus: Vec<Portal> = vec![];
    let mut dead_ends: Vec<Portal> = vec![];
    for portal in &table.portals {
        let dead_end = table.get(&portal.region).is_some_and(|r| r.dead_end);
        if dead_end {
            dead_ends.push(portal.clone());
        } else {
            two_plus.push(portal.clone());
        }
    }

    let mut pairs: Vec<(Portal, Portal)> = vec![];
    let mut shop_scenes: HashSet<String> = HashSet::new();
    let mut shop_num = 1;
    let mut shop_count = SHOP_COUNT;
    if options.fixed_shop {
        let idx = two_plus
            .iter()
            .position(|p| p.scene_destination() == FIXED_SHOP_PORTAL)
            .ok_or_else(|| unsatisfiable(format!("no portal {FIXED_SHOP_PORTAL} for the shop")))?;
        let portal = two_plus.remove(idx);
        shop_scenes.insert(portal.scene.clone());
        pairs.push((portal, shop_portal(shop_num)));
        shop_num += 1;
        shop_count = FIXED_SHOP_COUNT;
    }

    two_plus.shuffle(rng);
    let mut connected = table.dependent_regions(START_REGION);
    let must_connect: Vec<&str> = table
        .regions
        .iter()
        .filter(|r| !r.dead_end)
        .map(|r| r.name.as_str())
        .collect();
    while must_connect.iter().any(|&r| !connected.contains(r)) {
        let idx1 = two_plus
            .iter()
            .position(|p| connected.contains(&p.region))
            .ok_or_else(|| unsatisfiable("no open portal left in the connected area".to_string()))?;
        let portal1 = two_plus.remove(idx1);
        let idx2 = two_plus
            .iter()
            .position(|p| !connected.contains(&p.region))
            .ok_or_else(|| {
                unsatisfiable("no portal left leading out of the connected area".to_string())
            })?;
        let portal2 = two_plus.remove(idx2);
        connected.extend(table.dependent_regions(&portal2.region));
        debug!("Connecting {} <-> {}", portal1.name, portal2.name);
        pairs.push((portal1, portal2));
        two_plus.shuffle(rng);
    }

    for _ in 0..shop_count {
        let idx = two_plus
            .iter()
            .position(|p| !shop_scenes.contains(&p.scene))
            .ok_or_else(|| unsatisfiable(format!("no scene left for shop {shop_num}")))?;
        let portal = two_plus.remove(idx);
        shop_scenes.insert(portal.scene.clone());
        pairs.push((portal, shop_portal(shop_num)));
        shop_num += 1;
    }

    while let Some(dead_end) = dead_ends.pop() {
        let portal = two_plus
            .pop()
            .ok_or_else(|| unsatisfiable(format!("nothing left to pair {} with", dead_end.name)))?;
        pairs.push((portal, dead_end));
    }

    if two_plus.len() % 2 != 0 {
        return Err(unsatisfiable(format!(
            "{} portals left over, cannot pair them all",
            two_plus.len()
        )));
    }
    while let (Some(a), Some(b)) = (two_plus.pop(), two_plus.pop()) {
        pairs.push((a, b));
    }

    info!("Paired {} portals ({} shops)", pairs.len() * 2, shop_num - 1);
    Ok(PortalPairing { pairs })
}

/// For each location outside the start area, the name of the start-area portal
/// through which its region is first reached, ignoring rules.
pub fn hint_map(graph: &RegionGraph, table: &RegionTable) -> HintMap {
    let start_cluster = table.dependent_regions(START_REGION);
    let mut label: Vec<Option<String>> = vec![None; graph.regions.len()];
    let mut visited = vec![false; graph.regions.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (idx, region) in graph.regions.iter().enumerate() {
        if start_cluster.contains(&region.name) {
            visited[idx] = true;
        }
    }
    for exit in &graph.exits {
        let from = &graph.regions[exit.from];
        if !start_cluster.contains(&from.name) || visited[exit.to] {
            continue;
        }
        if let ExitKind::Portal { portal } = &exit.kind {
            visited[exit.to] = true;
            label[exit.to] = Some(portal.clone());
            queue.push_back(exit.to);
        }
    }
    while let Some(region_idx) = queue.pop_front() {
        for &exit_idx in &graph.regions[region_idx].exits {
            let to = graph.exits[exit_idx].to;
            if !visited[to] {
                visited[to] = true;
                label[to] = label[region_idx].clone();
                queue.push_back(to);
            }
        }
    }
    let mut hints = HintMap::new();
    for location in &graph.locations {
        if let (Some(id), Some(portal)) = (location.id, &label[location.region]) {
            hints.insert(id, portal.clone());
        }
    }
    hints
}
