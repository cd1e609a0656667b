use anyhow::Result;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::IndexedVec;

pub const START_REGION: &str = "Overworld";
pub const VICTORY_REGION: &str = "Spirit Arena Victory";

#[derive(Deserialize)]
struct RegionsJson {
    regions: Vec<RegionData>,
    #[serde(default)]
    connections: Vec<ConnectionData>,
    #[serde(default)]
    portals: Vec<PortalJson>,
    #[serde(default)]
    events: Vec<EventData>,
}

#[derive(Deserialize)]
struct PortalJson {
    name: String,
    region: String,
    destination: String,
    #[serde(default)]
    tag: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionData {
    pub name: String,
    pub scene: String,
    // Scene that is only reachable through a single portal.
    #[serde(default)]
    pub dead_end: bool,
}

/// Directed edge between two regions of the same scene. Never shuffled.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionData {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventData {
    pub name: String,
    pub region: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
pub struct Portal {
    pub name: String,
    pub region: String,
    pub scene: String,
    pub destination: String,
    pub tag: String,
}

impl Portal {
    pub fn scene_destination(&self) -> String {
        format!("{}, {}_{}", self.scene, self.destination, self.tag)
    }

    fn vanilla_key(&self) -> (&str, &str, &str) {
        (&self.scene, &self.destination, &self.tag)
    }

    fn mirror_key(&self) -> (&str, &str, &str) {
        (&self.destination, &self.scene, &self.tag)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegionTable {
    pub regions: Vec<RegionData>,
    pub region_isv: IndexedVec<String>,
    pub connections: Vec<ConnectionData>,
    pub portals: Vec<Portal>,
    pub events: Vec<EventData>,
}

impl RegionTable {
    pub fn load_str(json_str: &str) -> Result<Self> {
        let regions_json: RegionsJson = serde_json::from_str(json_str)
            .map_err(|e| WorldError::MalformedCatalog(format!("region table: {e}")))?;
        let mut table = RegionTable::default();
        for region in regions_json.regions {
            if table.region_isv.index_by_key.contains_key(&region.name) {
                let msg = format!("duplicate region {}", region.name);
                return Err(WorldError::MalformedCatalog(msg).into());
            }
            table.region_isv.add(&region.name);
            table.regions.push(region);
        }
        for conn in &regions_json.connections {
            let from = table.require(&conn.from, "connection")?;
            let to = table.require(&conn.to, "connection")?;
            if from.scene != to.scene {
                return Err(WorldError::MalformedCatalog(format!(
                    "connection {} -> {} crosses scenes",
                    conn.from, conn.to
                ))
                .into());
            }
        }
        table.connections = regions_json.connections;

        let mut portal_names: HashSet<String> = HashSet::new();
        for portal_json in regions_json.portals {
            if !portal_names.insert(portal_json.name.clone()) {
                return Err(WorldError::MalformedCatalog(format!(
                    "duplicate portal {}",
                    portal_json.name
                ))
                .into());
            }
            let scene = table
                .require(&portal_json.region, &portal_json.name)?
                .scene
                .clone();
            table.portals.push(Portal {
                name: portal_json.name,
                region: portal_json.region,
                scene,
                destination: portal_json.destination,
                tag: portal_json.tag,
            });
        }
        for event in &regions_json.events {
            table.require(&event.region, &event.name)?;
        }
        table.events = regions_json.events;
        table.require(START_REGION, "start")?;
        table.require(VICTORY_REGION, "victory")?;
        table.vanilla_portal_pairs()?;
        Ok(table)
    }

    fn require(&self, region: &str, referrer: &str) -> Result<&RegionData, WorldError> {
        self.get(region).ok_or_else(|| {
            WorldError::DanglingReference(format!("{referrer} references unknown region {region}"))
        })
    }

    pub fn get(&self, name: &str) -> Option<&RegionData> {
        self.region_isv
            .index_by_key
            .get(name)
            .map(|&idx| &self.regions[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.region_isv.index_by_key.contains_key(name)
    }

    pub fn portal(&self, name: &str) -> Option<&Portal> {
        self.portals.iter().find(|p| p.name == name)
    }

    /// Vanilla portal pairs, each unordered pair reported once in table order.
    pub fn vanilla_portal_pairs(&self) -> Result<Vec<(usize, usize)>> {
        let mut idx_by_key: HashMap<(&str, &str, &str), usize> = HashMap::new();
        for (i, portal) in self.portals.iter().enumerate() {
            if idx_by_key.insert(portal.vanilla_key(), i).is_some() {
                return Err(WorldError::MalformedCatalog(format!(
                    "portal {} has an ambiguous destination {}",
                    portal.name,
                    portal.scene_destination()
                ))
                .into());
            }
        }
        let mut pairs = vec![];
        for (i, portal) in self.portals.iter().enumerate() {
            let Some(&j) = idx_by_key.get(&portal.mirror_key()) else {
                return Err(WorldError::MalformedCatalog(format!(
                    "portal {} has no vanilla counterpart",
                    portal.name
                ))
                .into());
            };
            if i < j {
                pairs.push((i, j));
            }
        }
        Ok(pairs)
    }

    /// Regions reachable from `start` through intra-scene connections alone.
    pub fn dependent_regions(&self, start: &str) -> HashSet<String> {
        let mut out: HashSet<String> = HashSet::new();
        let mut stack = vec![start.to_string()];
        while let Some(region) = stack.pop() {
            if !out.insert(region.clone()) {
                continue;
            }
            for conn in &self.connections {
                if conn.from == region && !out.contains(&conn.to) {
                    stack.push(conn.to.clone());
                }
            }
        }
        out
    }
}
