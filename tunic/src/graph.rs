use anyhow::Result;
use serde::Serialize;
use tunic_game::error::WorldError;
use tunic_game::regions::{Portal, RegionData, RegionTable, START_REGION, VICTORY_REGION};
use tunic_game::{GameData, IndexedVec, LocationId};
use tunic_logic::{CollectionState, Player, Rule};

use crate::entrance::PortalPairing;

pub const VICTORY_LOCATION: &str = "The Heir";
pub const VICTORY_ITEM: &str = "Victory";

pub type RegionIdx = usize; // Index into RegionGraph.regions
pub type ExitIdx = usize; // Index into RegionGraph.exits
pub type LocationIdx = usize; // Index into RegionGraph.locations

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ExitKind {
    Connection,
    Portal { portal: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct Exit {
    pub name: String,
    pub from: RegionIdx,
    pub to: RegionIdx,
    pub kind: ExitKind,
    pub rule: Rule,
}

#[derive(Clone, Debug, Serialize)]
pub struct Location {
    pub name: String,
    pub region: RegionIdx,
    pub id: Option<LocationId>,
    pub rule: Rule,
    pub item: Option<String>,
    pub locked: bool,
    pub event: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Region {
    pub name: String,
    pub scene: String,
    pub dead_end: bool,
    pub exits: Vec<ExitIdx>,
    pub locations: Vec<LocationIdx>,
}

/// Named predicate the host checks to decide whether a slot is finished.
#[derive(Clone, Debug, Serialize)]
pub struct CompletionCondition {
    pub name: String,
    pub rule: Rule,
}

impl CompletionCondition {
    pub fn is_met<S: CollectionState>(&self, state: &S, player: Player) -> bool {
        self.rule.evaluate(state, player)
    }
}

/// One directed transition through a portal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalExit {
    pub portal: String,
    pub from_region: String,
    pub to_region: String,
}

/// Supplies the portal transitions of the graph: vanilla or shuffled.
pub trait ExitResolver {
    fn extra_regions(&self) -> Vec<RegionData> {
        vec![]
    }

    fn portal_exits(&self, table: &RegionTable) -> Result<Vec<PortalExit>>;
}

fn exits_for_pair(a: &Portal, b: &Portal) -> [PortalExit; 2] {
    [
        PortalExit {
            portal: a.name.clone(),
            from_region: a.region.clone(),
            to_region: b.region.clone(),
        },
        PortalExit {
            portal: b.name.clone(),
            from_region: b.region.clone(),
            to_region: a.region.clone(),
        },
    ]
}

pub struct StaticExitResolver;

impl ExitResolver for StaticExitResolver {
    fn portal_exits(&self, table: &RegionTable) -> Result<Vec<PortalExit>> {
        let mut out = vec![];
        for (i, j) in table.vanilla_portal_pairs()? {
            out.extend(exits_for_pair(&table.portals[i], &table.portals[j]));
        }
        Ok(out)
    }
}

pub struct PairingExitResolver<'a> {
    pub pairing: &'a PortalPairing,
}

impl ExitResolver for PairingExitResolver<'_> {
    fn extra_regions(&self) -> Vec<RegionData> {
        self.pairing
            .shop_portals()
            .map(|portal| RegionData {
                name: portal.region.clone(),
                scene: portal.scene.clone(),
                dead_end: true,
            })
            .collect()
    }

    fn portal_exits(&self, _table: &RegionTable) -> Result<Vec<PortalExit>> {
        Ok(self
            .pairing
            .pairs
            .iter()
            .flat_map(|(a, b)| exits_for_pair(a, b))
            .collect())
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegionGraph {
    pub regions: Vec<Region>,
    pub region_isv: IndexedVec<String>,
    pub exits: Vec<Exit>,
    pub locations: Vec<Location>,
    pub location_isv: IndexedVec<String>,
    pub completion: Option<CompletionCondition>,
}

impl RegionGraph {
    pub fn build(game_data: &GameData, resolver: &dyn ExitResolver) -> Result<RegionGraph> {
        let table = &game_data.regions;
        let mut graph = RegionGraph::default();
        for region in table.regions.iter().cloned().chain(resolver.extra_regions()) {
            graph.add_region(region)?;
        }
        for conn in &table.connections {
            let from = graph.require_region(&conn.from)?;
            let to = graph.require_region(&conn.to)?;
            graph.add_exit(Exit {
                name: format!("{} -> {}", conn.from, conn.to),
                from,
                to,
                kind: ExitKind::Connection,
                rule: Rule::Free,
            });
        }
        for portal_exit in resolver.portal_exits(table)? {
            let from = graph.require_region(&portal_exit.from_region)?;
            let to = graph.require_region(&portal_exit.to_region)?;
            graph.add_exit(Exit {
                name: portal_exit.portal.clone(),
                from,
                to,
                kind: ExitKind::Portal {
                    portal: portal_exit.portal,
                },
                rule: Rule::Free,
            });
        }
        for location in &game_data.locations.locations {
            graph.add_location(&location.name, &location.region, Some(location.id), None)?;
        }
        for event in &table.events {
            graph.add_location(&event.name, &event.region, None, Some(&event.name))?;
        }
        graph.add_location(VICTORY_LOCATION, VICTORY_REGION, None, Some(VICTORY_ITEM))?;
        graph.completion = Some(CompletionCondition {
            name: VICTORY_ITEM.to_string(),
            rule: Rule::item(VICTORY_ITEM),
        });
        Ok(graph)
    }

    fn add_region(&mut self, region: RegionData) -> Result<RegionIdx> {
        if self.region_isv.index_by_key.contains_key(&region.name) {
            return Err(
                WorldError::MalformedCatalog(format!("duplicate region {}", region.name)).into(),
            );
        }
        let idx = self.region_isv.add(&region.name);
        self.regions.push(Region {
            name: region.name,
            scene: region.scene,
            dead_end: region.dead_end,
            exits: vec![],
            locations: vec![],
        });
        Ok(idx)
    }

    fn add_exit(&mut self, exit: Exit) -> ExitIdx {
        let idx = self.exits.len();
        self.regions[exit.from].exits.push(idx);
        self.exits.push(exit);
        idx
    }

    // Event locations (no id) are locked to the item of the same purpose.
    fn add_location(
        &mut self,
        name: &str,
        region: &str,
        id: Option<LocationId>,
        locked_item: Option<&str>,
    ) -> Result<LocationIdx> {
        let region_idx = self.require_region(region)?;
        if self.location_isv.index_by_key.contains_key(name) {
            return Err(WorldError::MalformedCatalog(format!("duplicate location {name}")).into());
        }
        let idx = self.location_isv.add(name);
        self.locations.push(Location {
            name: name.to_string(),
            region: region_idx,
            id,
            rule: Rule::Free,
            item: locked_item.map(|x| x.to_string()),
            locked: locked_item.is_some(),
            event: id.is_none(),
        });
        self.regions[region_idx].locations.push(idx);
        Ok(idx)
    }

    pub fn require_region(&self, name: &str) -> Result<RegionIdx, WorldError> {
        self.region_isv
            .index_by_key
            .get(name)
            .copied()
            .ok_or_else(|| WorldError::DanglingReference(format!("unknown region {name}")))
    }

    pub fn require_location(&self, name: &str) -> Result<LocationIdx, WorldError> {
        self.location_isv
            .index_by_key
            .get(name)
            .copied()
            .ok_or_else(|| WorldError::DanglingReference(format!("unknown location {name}")))
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.location_isv
            .index_by_key
            .get(name)
            .map(|&idx| &self.locations[idx])
    }

    pub fn start_region(&self) -> Result<RegionIdx, WorldError> {
        self.require_region(START_REGION)
    }

    /// Intra-scene exit between two named regions.
    pub fn connection_mut(&mut self, from: &str, to: &str) -> Result<&mut Exit, WorldError> {
        let from_idx = self.require_region(from)?;
        let to_idx = self.require_region(to)?;
        let exit_idx = self.regions[from_idx]
            .exits
            .iter()
            .copied()
            .find(|&e| self.exits[e].to == to_idx && self.exits[e].kind == ExitKind::Connection)
            .ok_or_else(|| {
                WorldError::DanglingReference(format!("no connection from {from} to {to}"))
            })?;
        Ok(&mut self.exits[exit_idx])
    }

    pub fn location_mut(&mut self, name: &str) -> Result<&mut Location, WorldError> {
        let idx = self.require_location(name)?;
        Ok(&mut self.locations[idx])
    }

    pub fn place_locked_item(&mut self, location: &str, item: &str) -> Result<(), WorldError> {
        let location = self.location_mut(location)?;
        location.item = Some(item.to_string());
        location.locked = true;
        Ok(())
    }

    /// Locations that receive an item from the pool.
    pub fn fillable_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(|loc| !loc.event && !loc.locked)
    }

    pub fn portal_exits(&self) -> impl Iterator<Item = &Exit> {
        self.exits
            .iter()
            .filter(|exit| matches!(exit.kind, ExitKind::Portal { .. }))
    }

    pub fn exit_target(&self, portal: &str) -> Option<&Region> {
        self.portal_exits()
            .find(|exit| exit.name == portal)
            .map(|exit| &self.regions[exit.to])
    }
}
