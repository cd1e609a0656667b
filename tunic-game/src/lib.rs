pub mod error;
pub mod items;
pub mod locations;
pub mod regions;

use std::borrow::ToOwned;
use std::hash::Hash;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use hashbrown::HashMap;
use log::info;

use crate::error::WorldError;
use crate::items::ItemCatalog;
use crate::locations::LocationCatalog;
use crate::regions::RegionTable;

pub type ItemId = u64; // BASE_ID + index into ItemCatalog.items
pub type LocationId = u64; // BASE_ID + index into LocationCatalog.locations

pub const BASE_ID: u64 = 509342400;
pub const GAME_NAME: &str = "TUNIC";

const ITEMS_JSON: &str = include_str!("../data/items.json");
const LOCATIONS_JSON: &str = include_str!("../data/locations.json");
const REGIONS_JSON: &str = include_str!("../data/regions.json");

#[derive(Default, Clone, Debug)]
pub struct IndexedVec<T: Hash + Eq> {
    pub keys: Vec<T>,
    pub index_by_key: HashMap<T, usize>,
}

impl<T: Hash + Eq> IndexedVec<T> {
    pub fn add<U: ToOwned<Owned = T> + ?Sized>(&mut self, name: &U) -> usize {
        if !self.index_by_key.contains_key(&name.to_owned()) {
            let idx = self.keys.len();
            self.index_by_key.insert(name.to_owned(), self.keys.len());
            self.keys.push(name.to_owned());
            idx
        } else {
            self.index_by_key[&name.to_owned()]
        }
    }
}

/// Immutable registry of the static TUNIC data, shared by every slot.
#[derive(Clone, Debug, Default)]
pub struct GameData {
    pub items: ItemCatalog,
    pub locations: LocationCatalog,
    pub regions: RegionTable,
}

static SHARED: OnceLock<GameData> = OnceLock::new();

impl GameData {
    /// Loads the data embedded in the binary.
    pub fn load() -> Result<GameData> {
        Self::from_json_strs(ITEMS_JSON, LOCATIONS_JSON, REGIONS_JSON)
    }

    pub fn load_from_dir(base_path: &Path) -> Result<GameData> {
        let read = |name: &str| -> Result<String> {
            let path = base_path.join(name);
            std::fs::read_to_string(&path)
                .with_context(|| format!("unable to read {}", path.display()))
        };
        Self::from_json_strs(
            &read("items.json")?,
            &read("locations.json")?,
            &read("regions.json")?,
        )
    }

    pub fn from_json_strs(items: &str, locations: &str, regions: &str) -> Result<GameData> {
        let game_data = GameData {
            items: ItemCatalog::load_str(items).context("Unable to load item catalog")?,
            locations: LocationCatalog::load_str(locations)
                .context("Unable to load location catalog")?,
            regions: RegionTable::load_str(regions).context("Unable to load region table")?,
        };
        game_data.validate()?;
        info!(
            "Loaded {} items, {} locations, {} regions, {} portals",
            game_data.items.items.len(),
            game_data.locations.locations.len(),
            game_data.regions.regions.len(),
            game_data.regions.portals.len()
        );
        Ok(game_data)
    }

    /// Process-wide registry built from the embedded data on first use.
    pub fn shared() -> Result<&'static GameData> {
        if let Some(game_data) = SHARED.get() {
            return Ok(game_data);
        }
        let game_data = Self::load()?;
        Ok(SHARED.get_or_init(|| game_data))
    }

    fn validate(&self) -> Result<()> {
        for location in &self.locations.locations {
            if !self.regions.contains(&location.region) {
                return Err(WorldError::DanglingReference(format!(
                    "location {} is in unknown region {}",
                    location.name, location.region
                ))
                .into());
            }
        }
        for hexagon in self.locations.hexagon_locations.keys() {
            if !self.items.contains(hexagon) {
                return Err(WorldError::UnknownItemReference(format!(
                    "boss reward names unknown item {hexagon}"
                ))
                .into());
            }
        }
        for event in &self.regions.events {
            if self.locations.contains(&event.name) || self.items.contains(&event.name) {
                return Err(WorldError::MalformedCatalog(format!(
                    "event {} collides with a catalog name",
                    event.name
                ))
                .into());
            }
        }
        Ok(())
    }
}
