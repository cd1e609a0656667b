use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames};

use crate::error::WorldError;
use crate::{IndexedVec, ItemId, BASE_ID};

pub const GOLD_HEXAGON: &str = "Gold Questagon";
pub const RED_HEXAGON: &str = "Red Questagon";
pub const GREEN_HEXAGON: &str = "Green Questagon";
pub const BLUE_HEXAGON: &str = "Blue Questagon";
pub const FOOL_TRAP: &str = "Fool Trap";
pub const PRAYER_PAGE: &str = "Pages 24-25 (Prayer)";
pub const HOLY_CROSS_PAGE: &str = "Pages 42-43 (Holy Cross)";
pub const ICE_ROD_PAGE: &str = "Pages 52-53 (Ice Rod)";
pub const STICK: &str = "Stick";
pub const SWORD: &str = "Sword";
pub const SWORD_UPGRADE: &str = "Sword Upgrade";
pub const FIRE_WAND: &str = "Magic Wand";
pub const ICE_DAGGER: &str = "Magic Dagger";
pub const GRAPPLE: &str = "Magic Orb";
pub const LAURELS: &str = "Hero's Laurels";
pub const LANTERN: &str = "Lantern";
pub const MASK: &str = "Scavenger Mask";
pub const HOUSE_KEY: &str = "Old House Key";
pub const KEY: &str = "Key";
pub const VAULT_KEY: &str = "Fortress Vault Key";
pub const COINS: &str = "Golden Coin";
pub const FAIRY: &str = "Fairy";

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Progression,
    Useful,
    Filler,
    Trap,
}

impl Classification {
    pub fn parse(s: &str) -> Result<Self, WorldError> {
        Classification::from_str(s).map_err(|_| {
            WorldError::MalformedCatalog(format!(
                "unknown item classification {s:?} (expected one of {:?})",
                Classification::VARIANTS
            ))
        })
    }
}

#[derive(Deserialize)]
struct ItemsJson {
    items: Vec<ItemJson>,
}

#[derive(Deserialize)]
struct ItemJson {
    name: String,
    classification: String,
    quantity: i64,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    fool_tier: Option<usize>,
    #[serde(default)]
    trackable: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ItemData {
    pub name: String,
    pub id: ItemId,
    pub classification: Classification,
    pub pool_quantity: usize,
    pub groups: Vec<String>,
    // Lowest fool-trap level at which this item gets turned into a Fool Trap.
    pub fool_tier: Option<usize>,
    // Whether the client tracks where copies of this item end up (slot data).
    pub trackable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ItemCatalog {
    pub items: Vec<ItemData>,
    pub item_isv: IndexedVec<String>,
    pub filler_items: Vec<String>,
    pub groups: BTreeMap<String, Vec<String>>,
}

impl ItemCatalog {
    pub fn load_str(json_str: &str) -> Result<Self> {
        let items_json: ItemsJson = serde_json::from_str(json_str)
            .map_err(|e| WorldError::MalformedCatalog(format!("item table: {e}")))?;
        let mut catalog = ItemCatalog::default();
        for (i, item_json) in items_json.items.into_iter().enumerate() {
            let classification = Classification::parse(&item_json.classification)
                .with_context(|| format!("item {}", item_json.name))?;
            if item_json.quantity < 0 {
                return Err(WorldError::MalformedCatalog(format!(
                    "item {} has negative quantity {}",
                    item_json.name, item_json.quantity
                ))
                .into());
            }
            if item_json.name.is_empty() {
                return Err(WorldError::MalformedCatalog(format!("item #{i} has no name")).into());
            }
            if catalog.item_isv.index_by_key.contains_key(&item_json.name) {
                return Err(WorldError::MalformedCatalog(format!(
                    "duplicate item {}",
                    item_json.name
                ))
                .into());
            }
            catalog.item_isv.add(&item_json.name);
            if classification == Classification::Filler {
                catalog.filler_items.push(item_json.name.clone());
            }
            for group in &item_json.groups {
                catalog
                    .groups
                    .entry(group.clone())
                    .or_default()
                    .push(item_json.name.clone());
            }
            catalog.items.push(ItemData {
                id: BASE_ID + i as ItemId,
                name: item_json.name,
                classification,
                pool_quantity: item_json.quantity as usize,
                groups: item_json.groups,
                fool_tier: item_json.fool_tier,
                trackable: item_json.trackable,
            });
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&ItemData> {
        self.item_isv
            .index_by_key
            .get(name)
            .map(|&idx| &self.items[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.item_isv.index_by_key.contains_key(name)
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.item_isv.index_by_key.get(name).copied()
    }

    /// Money items converted into Fool Traps at the given fool-trap level (0 = off).
    pub fn fool_tier_items(&self, level: usize) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| matches!(item.fool_tier, Some(t) if level > 0 && t <= level))
            .map(|item| item.name.as_str())
            .collect()
    }

    pub fn slot_data_item_names(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.trackable)
            .map(|item| item.name.as_str())
            .collect()
    }

    pub fn group(&self, name: &str) -> &[String] {
        self.groups.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table_is_exhaustive() {
        for name in Classification::VARIANTS {
            let c = Classification::parse(name).unwrap();
            assert_eq!(&c.to_string(), name);
        }
        assert!(matches!(
            Classification::parse("Progression"),
            Err(WorldError::MalformedCatalog(_))
        ));
    }

    #[test]
    fn test_fool_tiers() {
        let catalog = ItemCatalog::load_str(
            r#"{"items": [
                {"name": "Money x1", "classification": "filler", "quantity": 1, "fool_tier": 1},
                {"name": "Money x20", "classification": "filler", "quantity": 1, "fool_tier": 2},
                {"name": "Money x30", "classification": "filler", "quantity": 1, "fool_tier": 3},
                {"name": "Money x255", "classification": "filler", "quantity": 1}
            ]}"#,
        )
        .unwrap();
        assert!(catalog.fool_tier_items(0).is_empty());
        assert_eq!(catalog.fool_tier_items(1), vec!["Money x1"]);
        assert_eq!(catalog.fool_tier_items(2), vec!["Money x1", "Money x20"]);
        assert_eq!(catalog.fool_tier_items(3).len(), 3);
        assert_eq!(catalog.filler_items.len(), 4);
    }

    #[test]
    fn test_malformed_items() {
        for json in [
            r#"{"items": [{"name": "A", "classification": "junk", "quantity": 1}]}"#,
            r#"{"items": [{"name": "A", "classification": "filler", "quantity": -1}]}"#,
            r#"{"items": [{"name": "A", "classification": "filler", "quantity": 1},
                          {"name": "A", "classification": "useful", "quantity": 1}]}"#,
            r#"{"items": [{"name": "A"}]}"#,
        ] {
            let err = ItemCatalog::load_str(json).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<WorldError>(),
                    Some(WorldError::MalformedCatalog(_))
                ),
                "{err:?}"
            );
        }
    }
}
