use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::{IndexedVec, LocationId, BASE_ID};

#[derive(Deserialize)]
struct LocationsJson {
    locations: Vec<LocationJson>,
    #[serde(default)]
    boss_rewards: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct LocationJson {
    name: String,
    region: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LocationData {
    pub name: String,
    pub region: String,
    pub id: LocationId,
}

impl LocationData {
    // "Overworld - [Southwest] Chest Near Turret" -> "Overworld"
    pub fn area(&self) -> &str {
        match self.name.split_once(" - ") {
            Some((area, _)) => area,
            None => &self.name,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LocationCatalog {
    pub locations: Vec<LocationData>,
    pub location_isv: IndexedVec<String>,
    pub by_region: BTreeMap<String, Vec<usize>>,
    pub by_area: BTreeMap<String, Vec<usize>>,
    // Colored hexagon name -> the boss reward location that holds it.
    pub hexagon_locations: BTreeMap<String, String>,
}

impl LocationCatalog {
    pub fn load_str(json_str: &str) -> Result<Self> {
        let locations_json: LocationsJson = serde_json::from_str(json_str)
            .map_err(|e| WorldError::MalformedCatalog(format!("location table: {e}")))?;
        let mut catalog = LocationCatalog::default();
        for (i, location_json) in locations_json.locations.into_iter().enumerate() {
            if catalog
                .location_isv
                .index_by_key
                .contains_key(&location_json.name)
            {
                return Err(WorldError::MalformedCatalog(format!(
                    "duplicate location {}",
                    location_json.name
                ))
                .into());
            }
            let idx = catalog.location_isv.add(&location_json.name);
            let location = LocationData {
                id: BASE_ID + i as LocationId,
                name: location_json.name,
                region: location_json.region,
            };
            catalog
                .by_region
                .entry(location.region.clone())
                .or_default()
                .push(idx);
            catalog
                .by_area
                .entry(location.area().to_string())
                .or_default()
                .push(idx);
            catalog.locations.push(location);
        }
        for (hexagon, location_name) in &locations_json.boss_rewards {
            if !catalog.contains(location_name) {
                return Err(WorldError::DanglingReference(format!(
                    "boss reward for {hexagon} names unknown location {location_name}"
                ))
                .into());
            }
        }
        catalog.hexagon_locations = locations_json.boss_rewards;
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&LocationData> {
        self.location_isv
            .index_by_key
            .get(name)
            .map(|&idx| &self.locations[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.location_isv.index_by_key.contains_key(name)
    }

    pub fn in_region(&self, region: &str) -> impl Iterator<Item = &LocationData> {
        self.by_region
            .get(region)
            .into_iter()
            .flatten()
            .map(|&idx| &self.locations[idx])
    }

    pub fn in_area(&self, area: &str) -> impl Iterator<Item = &LocationData> {
        self.by_area
            .get(area)
            .into_iter()
            .flatten()
            .map(|&idx| &self.locations[idx])
    }
}
