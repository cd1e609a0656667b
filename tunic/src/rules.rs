use anyhow::Result;
use hashbrown::HashSet;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tunic_game::error::WorldError;
use tunic_game::items::{
    BLUE_HEXAGON, COINS, FAIRY, FIRE_WAND, GOLD_HEXAGON, GRAPPLE, GREEN_HEXAGON, HOUSE_KEY, KEY,
    LANTERN, LAURELS, MASK, RED_HEXAGON, STICK, SWORD, SWORD_UPGRADE, VAULT_KEY,
};
use tunic_game::GameData;
use tunic_logic::{Ability, Rule};

use crate::graph::{RegionGraph, VICTORY_ITEM};
use crate::settings::Options;

pub const RING_EAST_BELL: &str = "Ring East Bell";
pub const RING_WEST_BELL: &str = "Ring West Bell";

/// Gold hexagon count (or page requirement) unlocking each ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AbilityUnlocks {
    // Indexed by `Ability::index`.
    pub thresholds: [usize; 3],
}

impl AbilityUnlocks {
    pub fn threshold(&self, ability: Ability) -> usize {
        self.thresholds[ability.index()]
    }
}

pub fn randomize_ability_unlocks<R: Rng>(rng: &mut R, options: &Options) -> AbilityUnlocks {
    let mut abilities = Ability::ALL;
    abilities.shuffle(rng);
    let mut thresholds = [0; 3];
    for (ability, threshold) in abilities.into_iter().zip(options.ability_thresholds()) {
        thresholds[ability.index()] = threshold;
    }
    AbilityUnlocks { thresholds }
}

pub struct RuleContext<'a> {
    pub options: &'a Options,
    pub ability_unlocks: &'a AbilityUnlocks,
}

impl RuleContext<'_> {
    pub fn ability(&self, ability: Ability) -> Rule {
        if !self.options.ability_shuffling {
            Rule::Free
        } else if self.options.hexagon_quest {
            Rule::item_count(GOLD_HEXAGON, self.ability_unlocks.threshold(ability))
        } else {
            Rule::item(ability.page_item())
        }
    }

    pub fn prayer(&self) -> Rule {
        self.ability(Ability::Prayer)
    }

    pub fn holy_cross(&self) -> Rule {
        self.ability(Ability::HolyCross)
    }

    pub fn ice_rod(&self) -> Rule {
        self.ability(Ability::IceRod)
    }

    pub fn goal(&self) -> Rule {
        if self.options.hexagon_quest {
            Rule::item_count(GOLD_HEXAGON, self.options.hexagon_goal)
        } else {
            Rule::make_and(vec![
                Rule::item(RED_HEXAGON),
                Rule::item(GREEN_HEXAGON),
                Rule::item(BLUE_HEXAGON),
            ])
        }
    }
}

pub fn has_sword() -> Rule {
    Rule::make_or(vec![Rule::item(SWORD), Rule::item_count(SWORD_UPGRADE, 2)])
}

pub fn has_stick() -> Rule {
    Rule::any_of(&[STICK, SWORD, SWORD_UPGRADE])
}

pub fn has_lantern() -> Rule {
    Rule::item(LANTERN)
}

pub fn has_mask() -> Rule {
    Rule::item(MASK)
}

fn orb_or_laurels() -> Rule {
    Rule::make_or(vec![Rule::item(GRAPPLE), Rule::item(LAURELS)])
}

/// Rules on intra-scene connections. Unlisted connections are free.
pub fn connection_rules(ctx: &RuleContext) -> Vec<(&'static str, &'static str, Rule)> {
    vec![
        ("Overworld", "Overworld Holy Cross", ctx.holy_cross()),
        (
            "Overworld",
            "Overworld West Garden Laurels Entry",
            Rule::item(LAURELS),
        ),
        (
            "Overworld West Garden Laurels Entry",
            "Overworld",
            Rule::item(LAURELS),
        ),
        (
            "Overworld",
            "Overworld Temple Door",
            Rule::make_and(vec![
                Rule::item(RING_EAST_BELL),
                Rule::item(RING_WEST_BELL),
            ]),
        ),
        (
            "Beneath the Well Front",
            "Beneath the Well Main",
            Rule::make_or(vec![has_stick(), Rule::item(FIRE_WAND)]),
        ),
        (
            "Beneath the Well Back",
            "Beneath the Well Main",
            Rule::make_or(vec![has_stick(), Rule::item(FIRE_WAND)]),
        ),
        ("Dark Tomb Entry Point", "Dark Tomb Main", has_lantern()),
        ("Dark Tomb Dark Exit", "Dark Tomb Main", has_lantern()),
        ("West Garden", "West Garden after Boss", has_sword()),
        (
            "Eastern Vault Fortress",
            "Eastern Vault Fortress Gold Door",
            ctx.prayer(),
        ),
        (
            "Beneath the Vault Front",
            "Beneath the Vault Back",
            has_lantern(),
        ),
        (
            "Ruined Atoll",
            "Ruined Atoll Statue",
            Rule::make_and(vec![orb_or_laurels(), ctx.prayer()]),
        ),
        ("Frog's Domain Entry", "Frog's Domain", Rule::item(GRAPPLE)),
        (
            "Library Exterior",
            "Library Exterior Ladder",
            orb_or_laurels(),
        ),
        (
            "Quarry Entry",
            "Quarry",
            Rule::make_or(vec![has_sword(), Rule::item(FIRE_WAND)]),
        ),
        ("Quarry", "Lower Quarry", has_mask()),
        (
            "Rooted Ziggurat Entry",
            "Rooted Ziggurat Upper",
            ctx.prayer(),
        ),
        (
            "Rooted Ziggurat Upper",
            "Rooted Ziggurat Lower",
            has_sword(),
        ),
        (
            "Swamp",
            "Swamp Cathedral Door",
            Rule::make_and(vec![Rule::item(LAURELS), ctx.prayer()]),
        ),
        (
            "Spirit Arena",
            "Spirit Arena Victory",
            Rule::make_and(vec![ctx.goal(), ctx.prayer(), has_sword()]),
        ),
    ]
}

const SWORD_LOCATIONS: [&str; 5] = [
    "Fortress Arena - Siege Engine/Vault Key Pickup",
    "Librarian - Hexagon Green",
    "Rooted Ziggurat Lower - Hexagon Blue",
    "Forest Belltower - After Guard Captain",
    "Cathedral Gauntlet - Gauntlet Reward",
];

/// Rule for a single location, combining name-pattern gates with specific ones.
pub fn location_rule(ctx: &RuleContext, name: &str) -> Rule {
    let mut rules = vec![];
    if name.contains("Holy Cross") {
        rules.push(ctx.holy_cross());
    }
    if name.starts_with("Old House - ") {
        rules.push(Rule::item(HOUSE_KEY));
    }
    if name == "East Forest - Ice Rod Grapple Chest" {
        rules.push(ctx.ice_rod());
    }
    if name.contains("Grapple") {
        rules.push(Rule::item(GRAPPLE));
    }
    if SWORD_LOCATIONS.contains(&name) {
        rules.push(has_sword());
    }
    match name {
        "Coins in the Well - 3 Coins" => rules.push(Rule::item_count(COINS, 3)),
        "Coins in the Well - 6 Coins" => rules.push(Rule::item_count(COINS, 6)),
        "Coins in the Well - 10 Coins" => rules.push(Rule::item_count(COINS, 10)),
        "Coins in the Well - 15 Coins" => rules.push(Rule::item_count(COINS, 15)),
        "Secret Gathering Place - 10 Fairy Reward" => rules.push(Rule::item_count(FAIRY, 10)),
        "Secret Gathering Place - 20 Fairy Reward" => rules.push(Rule::item_count(FAIRY, 20)),
        "Hourglass Cave - Hourglass Chest" | "Overworld - [Southeast] Cube Cave" => {
            rules.push(Rule::item(LAURELS))
        }
        "Ruined Atoll - [East] Locked Room Lower Chest"
        | "Ruined Atoll - [East] Locked Room Upper Chest" => rules.push(Rule::item_count(KEY, 2)),
        "Fortress Arena - Hexagon Red" => {
            rules.push(Rule::item(VAULT_KEY));
            rules.push(ctx.prayer());
        }
        RING_EAST_BELL | RING_WEST_BELL => rules.push(has_stick()),
        _ => {}
    }
    Rule::make_and(rules)
}

/// Attaches every connection and location rule to the graph. The graph's portal
/// exits come from whichever resolver built it, so this runs unchanged for
/// vanilla and shuffled topologies.
pub fn attach_rules(
    graph: &mut RegionGraph,
    ctx: &RuleContext,
    game_data: &GameData,
) -> Result<()> {
    for (from, to, rule) in connection_rules(ctx) {
        graph.connection_mut(from, to)?.rule = rule;
    }
    for location in graph.locations.iter_mut() {
        location.rule = location_rule(ctx, &location.name);
    }
    check_rule_items(graph, game_data)?;
    debug!(
        "Attached rules to {} exits and {} locations",
        graph.exits.iter().filter(|e| !e.rule.is_free()).count(),
        graph.locations.iter().filter(|l| !l.rule.is_free()).count()
    );
    Ok(())
}

/// Every item a rule in the graph tests must be a catalog item, an event or Victory.
pub fn check_rule_items(graph: &RegionGraph, game_data: &GameData) -> Result<()> {
    let event_items: HashSet<&str> = game_data
        .regions
        .events
        .iter()
        .map(|e| e.name.as_str())
        .chain([VICTORY_ITEM])
        .collect();
    let known = |item: &str| game_data.items.contains(item) || event_items.contains(item);
    if let Some(completion) = &graph.completion {
        validate_rule_items(&completion.rule, &completion.name, known)?;
    }
    for exit in &graph.exits {
        validate_rule_items(&exit.rule, &exit.name, known)?;
    }
    for location in &graph.locations {
        validate_rule_items(&location.rule, &location.name, known)?;
    }
    Ok(())
}

fn validate_rule_items(rule: &Rule, owner: &str, known: impl Fn(&str) -> bool) -> Result<()> {
    for item in rule.items() {
        if !known(item) {
            return Err(WorldError::UnknownItemReference(format!(
                "rule on {owner} references unknown item {item}"
            ))
            .into());
        }
    }
    Ok(())
}
