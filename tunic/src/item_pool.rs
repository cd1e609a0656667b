use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tunic_game::error::WorldError;
use tunic_game::items::{
    Classification, ItemCatalog, FOOL_TRAP, GOLD_HEXAGON, STICK, SWORD, SWORD_UPGRADE,
};
use tunic_game::locations::LocationCatalog;
use tunic_game::ItemId;
use tunic_logic::Player;

use crate::settings::Options;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TunicItem {
    pub name: String,
    pub id: ItemId,
    pub classification: Classification,
    pub player: Player,
}

impl TunicItem {
    pub fn new(items: &ItemCatalog, name: &str, player: Player) -> Result<TunicItem, WorldError> {
        let data = items.get(name).ok_or_else(|| {
            WorldError::UnknownItemReference(format!("cannot create unknown item {name}"))
        })?;
        Ok(TunicItem {
            name: data.name.clone(),
            id: data.id,
            classification: data.classification,
            player,
        })
    }

    pub fn is_progression(&self) -> bool {
        self.classification == Classification::Progression
    }
}

/// Item counts (indexed like the catalog) and the items locked at fixed locations.
#[derive(Clone, Debug, Default)]
pub struct PoolPlan {
    pub counts: Vec<usize>,
    pub locked: Vec<(String, String)>, // (location, item)
}

impl PoolPlan {
    pub fn count(&self, items: &ItemCatalog, name: &str) -> usize {
        items.index(name).map(|i| self.counts[i]).unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub fn random_filler<R: Rng>(items: &ItemCatalog, rng: &mut R) -> Result<String, WorldError> {
    items
        .filler_items
        .choose(rng)
        .cloned()
        .ok_or_else(|| {
            WorldError::InsufficientFiller("a filler pick (catalog has none)".to_string())
        })
}

pub fn plan_item_pool<R: Rng>(
    items: &ItemCatalog,
    locations: &LocationCatalog,
    options: &Options,
    rng: &mut R,
) -> Result<PoolPlan> {
    let idx = |name: &str| -> Result<usize, WorldError> {
        items.index(name).ok_or_else(|| {
            WorldError::UnknownItemReference(format!("item pool references unknown item {name}"))
        })
    };
    let mut counts: Vec<usize> = items.items.iter().map(|item| item.pool_quantity).collect();

    let fool_idx = idx(FOOL_TRAP)?;
    for money in items.fool_tier_items(options.fool_traps.tier()) {
        let money_idx = idx(money)?;
        counts[fool_idx] += counts[money_idx];
        counts[money_idx] = 0;
    }

    if options.sword_progression {
        counts[idx(STICK)?] = 0;
        counts[idx(SWORD)?] = 0;
    } else {
        counts[idx(SWORD_UPGRADE)?] = 0;
    }

    let gold_idx = idx(GOLD_HEXAGON)?;
    let mut locked = vec![];
    let mut locked_golds = 0;
    if options.keys_behind_bosses {
        for (hexagon, location) in &locations.hexagon_locations {
            let item = if options.hexagon_quest {
                locked_golds += 1;
                GOLD_HEXAGON
            } else {
                hexagon.as_str()
            };
            locked.push((location.clone(), item.to_string()));
            counts[idx(hexagon)?] = 0;
        }
    }

    if options.hexagon_quest {
        counts[gold_idx] = options.gold_hexagon_total().saturating_sub(locked_golds);

        for (i, item) in items.items.iter().enumerate() {
            let replaced =
                item.name.contains("Pages") || locations.hexagon_locations.contains_key(&item.name);
            if replaced && counts[i] > 0 {
                let filler_idx = idx(&random_filler(items, rng)?)?;
                counts[filler_idx] += counts[i];
                counts[i] = 0;
            }
        }

        let mut available: Vec<usize> = (0..counts.len())
            .filter(|&i| counts[i] > 0 && items.items[i].classification == Classification::Filler)
            .collect();
        for n in 0..counts[gold_idx] {
            if available.is_empty() {
                return Err(WorldError::InsufficientFiller(format!(
                    "gold hexagon {} of {}",
                    n + 1,
                    counts[gold_idx]
                ))
                .into());
            }
            let k = rng.gen_range(0..available.len());
            let filler_idx = available[k];
            counts[filler_idx] -= 1;
            if counts[filler_idx] == 0 {
                available.remove(k);
            }
        }
    }

    Ok(PoolPlan { counts, locked })
}
