use anyhow::{ensure, Context, Result};
use hashbrown::HashMap;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tunic_game::error::WorldError;
use tunic_game::items::{GOLD_HEXAGON, SWORD};
use tunic_game::GameData;
use tunic_logic::{Ability, Inventory, Player};

use crate::entrance::{hint_map, pair_portals, HintMap, PortalPairing};
use crate::graph::{PairingExitResolver, RegionGraph, StaticExitResolver};
use crate::item_pool::{plan_item_pool, random_filler, TunicItem};
use crate::rules::{attach_rules, randomize_ability_unlocks, AbilityUnlocks, RuleContext};
use crate::settings::Options;
use crate::traverse::verify_all_reachable;

pub const MAX_GOLD_HEXAGON_ENTRIES: usize = 6;
pub const POCKET_LOCATION: &str = "Your Pocket";

/// Where one of this slot's items ended up, as reported by the host after fill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub item: String,
    pub location: String,
    pub player: Player,
}

pub struct TunicWorld<'a> {
    pub game_data: &'a GameData,
    pub player: Player,
    pub options: Options,
    pub rng: StdRng,
    // Assigned in `create_regions`.
    pub ability_unlocks: Option<AbilityUnlocks>,
    pub graph: RegionGraph,
    pub portal_pairing: Option<PortalPairing>,
    pub portal_hints: HintMap,
    pub item_pool: Vec<TunicItem>,
    // Trackable items locked in this world, reported ahead of host placements.
    pub locked_slot_data_items: Vec<Placement>,
}

impl<'a> TunicWorld<'a> {
    pub fn new(game_data: &'a GameData, player: Player, options: Options, seed: usize) -> Self {
        let mut rng_seed = [0u8; 32];
        rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
        TunicWorld {
            game_data,
            player,
            options,
            rng: StdRng::from_seed(rng_seed),
            ability_unlocks: None,
            graph: RegionGraph::default(),
            portal_pairing: None,
            portal_hints: HintMap::new(),
            item_pool: vec![],
            locked_slot_data_items: vec![],
        }
    }

    pub fn generate_early(&mut self) -> Result<()> {
        self.options.validate()?;
        if self.options.start_with_sword && !self.options.start_inventory.contains_key(SWORD) {
            self.options.start_inventory.insert(SWORD.to_string(), 1);
        }
        for name in self
            .options
            .start_inventory
            .keys()
            .chain(self.options.start_inventory_from_pool.keys())
        {
            if !self.game_data.items.contains(name) {
                return Err(WorldError::UnknownItemReference(format!(
                    "start inventory names unknown item {name}"
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn create_regions(&mut self) -> Result<()> {
        self.ability_unlocks = Some(randomize_ability_unlocks(&mut self.rng, &self.options));
        if self.options.entrance_rando {
            let table = &self.game_data.regions;
            let pairing = pair_portals(table, &mut self.rng, &self.options)
                .with_context(|| format!("[player {}] Unable to pair portals", self.player))?;
            pairing.check_legality(table)?;
            let graph = RegionGraph::build(
                self.game_data,
                &PairingExitResolver { pairing: &pairing },
            )?;
            verify_all_reachable(&graph, self.player)?;
            self.portal_hints = hint_map(&graph, table);
            self.graph = graph;
            self.portal_pairing = Some(pairing);
        } else {
            self.graph = RegionGraph::build(self.game_data, &StaticExitResolver)?;
        }
        info!(
            "[player {}] Created {} regions, {} exits, {} locations",
            self.player,
            self.graph.regions.len(),
            self.graph.exits.len(),
            self.graph.locations.len()
        );
        Ok(())
    }

    pub fn create_items(&mut self) -> Result<()> {
        let items = &self.game_data.items;
        let plan = plan_item_pool(
            items,
            &self.game_data.locations,
            &self.options,
            &mut self.rng,
        )?;
        self.locked_slot_data_items.clear();
        for (location, item) in &plan.locked {
            self.graph.place_locked_item(location, item)?;
            self.locked_slot_data_items.push(Placement {
                item: item.clone(),
                location: location.clone(),
                player: self.player,
            });
        }
        self.item_pool.clear();
        for (item_data, &count) in items.items.iter().zip(&plan.counts) {
            for _ in 0..count {
                self.item_pool
                    .push(TunicItem::new(items, &item_data.name, self.player)?);
            }
        }
        let fillable = self.graph.fillable_locations().count();
        ensure!(
            self.item_pool.len() == fillable,
            "[player {}] item pool has {} items for {} locations",
            self.player,
            self.item_pool.len(),
            fillable
        );
        info!(
            "[player {}] Created {} pool items ({} locked)",
            self.player,
            self.item_pool.len(),
            plan.locked.len()
        );
        Ok(())
    }

    fn require_ability_unlocks(&self) -> Result<&AbilityUnlocks> {
        self.ability_unlocks
            .as_ref()
            .with_context(|| format!("[player {}] create_regions has not run", self.player))
    }

    pub fn set_rules(&mut self) -> Result<()> {
        let ability_unlocks = self.require_ability_unlocks()?.clone();
        let ctx = RuleContext {
            options: &self.options,
            ability_unlocks: &ability_unlocks,
        };
        attach_rules(&mut self.graph, &ctx, self.game_data)
    }

    pub fn create_item(&self, name: &str) -> Result<TunicItem> {
        Ok(TunicItem::new(&self.game_data.items, name, self.player)?)
    }

    pub fn get_filler_item_name(&mut self) -> Result<String> {
        Ok(random_filler(&self.game_data.items, &mut self.rng)?)
    }

    /// Starting state for this slot: the configured start inventory.
    pub fn start_state(&self) -> Inventory {
        let mut state = Inventory::new();
        for (item, &count) in self
            .options
            .start_inventory
            .iter()
            .chain(&self.options.start_inventory_from_pool)
        {
            state.add(item, self.player, count);
        }
        state
    }

    pub fn extend_hint_information(&self, hint_data: &mut HashMap<Player, HintMap>) {
        if self.options.entrance_rando {
            hint_data.insert(self.player, self.portal_hints.clone());
        }
    }

    pub fn fill_slot_data(&mut self, placements: &[Placement]) -> Result<Map<String, Value>> {
        let seed = self.rng.gen_range(0..=2147483647u32);
        let ability_unlocks = self.require_ability_unlocks()?;
        let options = &self.options;
        let mut slot_data = Map::new();
        slot_data.insert("seed".to_string(), json!(seed));
        for (key, value) in [
            ("start_with_sword", options.start_with_sword),
            ("keys_behind_bosses", options.keys_behind_bosses),
            ("sword_progression", options.sword_progression),
            ("ability_shuffling", options.ability_shuffling),
            ("hexagon_quest", options.hexagon_quest),
            ("entrance_rando", options.entrance_rando),
        ] {
            slot_data.insert(key.to_string(), json!(value as u8));
        }
        slot_data.insert("fool_traps".to_string(), json!(options.fool_traps.tier()));
        for ability in Ability::ALL {
            slot_data.insert(
                ability.slot_data_key().to_string(),
                json!(ability_unlocks.threshold(ability)),
            );
        }
        slot_data.insert(
            "Hexagon Quest Goal".to_string(),
            json!(options.hexagon_goal),
        );
        let portal_pairs = self
            .portal_pairing
            .as_ref()
            .map(|p| p.scene_destinations())
            .unwrap_or_default();
        slot_data.insert("Entrance Rando".to_string(), json!(portal_pairs));

        let trackable = self.game_data.items.slot_data_item_names();
        for placement in self.locked_slot_data_items.iter().chain(placements) {
            if !trackable.contains(&placement.item.as_str()) {
                continue;
            }
            let entry = slot_data
                .entry(placement.item.clone())
                .or_insert_with(|| json!([]));
            let Value::Array(entries) = entry else {
                continue;
            };
            if placement.item == GOLD_HEXAGON && entries.len() >= MAX_GOLD_HEXAGON_ENTRIES {
                continue;
            }
            entries.push(json!(placement.location));
            entries.push(json!(placement.player.0));
        }
        for (item, &count) in &options.start_inventory_from_pool {
            if !trackable.contains(&item.as_str()) {
                continue;
            }
            let entry = slot_data.entry(item.clone()).or_insert_with(|| json!([]));
            if let Value::Array(entries) = entry {
                for _ in 0..count {
                    entries.push(json!(POCKET_LOCATION));
                    entries.push(json!(self.player.0));
                }
            }
        }
        Ok(slot_data)
    }
}

/// Runs the slot generation steps in the order the host calls them.
pub fn generate<'a>(
    game_data: &'a GameData,
    player: Player,
    options: Options,
    seed: usize,
) -> Result<TunicWorld<'a>> {
    let mut world = TunicWorld::new(game_data, player, options, seed);
    world.generate_early()?;
    world.create_regions()?;
    world.create_items()?;
    world.set_rules()?;
    Ok(world)
}
