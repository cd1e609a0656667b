use std::collections::BTreeMap;

use serde::Serialize;
use tunic_logic::{Ability, Player};

use crate::entrance::HintMap;
use crate::settings::Options;
use crate::world::{Placement, TunicWorld};

#[derive(Serialize)]
pub struct SpoilerAbility {
    pub ability: String,
    pub threshold: usize,
}

#[derive(Serialize)]
pub struct SpoilerLog {
    pub player: Player,
    pub seed: usize,
    pub options: Options,
    pub abilities: Vec<SpoilerAbility>,
    pub portal_pairs: Vec<(String, String)>,
    pub entrance_rando: BTreeMap<String, String>,
    pub placements: Vec<Placement>,
    pub hints: HintMap,
}

pub fn get_spoiler_log(world: &TunicWorld, seed: usize, placements: &[Placement]) -> SpoilerLog {
    let locked = world
        .graph
        .locations
        .iter()
        .filter(|loc| loc.locked && !loc.event)
        .filter_map(|loc| {
            loc.item.as_ref().map(|item| Placement {
                item: item.clone(),
                location: loc.name.clone(),
                player: world.player,
            })
        });
    SpoilerLog {
        player: world.player,
        seed,
        options: world.options.clone(),
        abilities: world
            .ability_unlocks
            .iter()
            .flat_map(|unlocks| {
                Ability::ALL.map(|ability| SpoilerAbility {
                    ability: ability.to_string(),
                    threshold: unlocks.threshold(ability),
                })
            })
            .collect(),
        portal_pairs: world
            .portal_pairing
            .iter()
            .flat_map(|p| p.pairs.iter())
            .map(|(a, b)| (a.name.clone(), b.name.clone()))
            .collect(),
        entrance_rando: world
            .portal_pairing
            .as_ref()
            .map(|p| p.scene_destinations())
            .unwrap_or_default(),
        placements: locked.chain(placements.iter().cloned()).collect(),
        hints: world.portal_hints.clone(),
    }
}
