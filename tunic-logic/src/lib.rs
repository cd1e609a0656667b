use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, VariantNames};

/// Slot number of a player in the multiworld.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Player(pub usize);

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of the items a player has collected so far.
pub trait CollectionState {
    fn count(&self, item: &str, player: Player) -> usize;

    fn has(&self, item: &str, player: Player, count: usize) -> bool {
        self.count(item, player) >= count
    }

    fn has_any<S: AsRef<str>>(&self, items: &[S], player: Player) -> bool
    where
        Self: Sized,
    {
        items.iter().any(|item| self.count(item.as_ref(), player) > 0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    Free,
    Never,
    Item { item: String, count: usize },
    AnyOf(Vec<String>),
    And(Vec<Rule>),
    Or(Vec<Rule>),
}

impl Rule {
    pub fn item(item: &str) -> Rule {
        Rule::Item {
            item: item.to_string(),
            count: 1,
        }
    }

    pub fn item_count(item: &str, count: usize) -> Rule {
        if count == 0 {
            Rule::Free
        } else {
            Rule::Item {
                item: item.to_string(),
                count,
            }
        }
    }

    pub fn any_of(items: &[&str]) -> Rule {
        match items {
            [] => Rule::Never,
            [item] => Rule::item(item),
            _ => Rule::AnyOf(items.iter().map(|x| x.to_string()).collect()),
        }
    }

    pub fn make_and(rules: Vec<Rule>) -> Rule {
        let mut out_rules: Vec<Rule> = vec![];
        for rule in rules {
            match rule {
                Rule::Never => return Rule::Never,
                Rule::Free => continue,
                Rule::And(and_rules) => out_rules.extend(and_rules),
                _ => out_rules.push(rule),
            }
        }
        match out_rules.len() {
            0 => Rule::Free,
            1 => out_rules.remove(0),
            _ => Rule::And(out_rules),
        }
    }

    pub fn make_or(rules: Vec<Rule>) -> Rule {
        let mut out_rules: Vec<Rule> = vec![];
        for rule in rules {
            match rule {
                Rule::Never => continue,
                Rule::Free => return Rule::Free,
                Rule::Or(or_rules) => out_rules.extend(or_rules),
                _ => out_rules.push(rule),
            }
        }
        match out_rules.len() {
            0 => Rule::Never,
            1 => out_rules.remove(0),
            _ => Rule::Or(out_rules),
        }
    }

    pub fn evaluate<S: CollectionState>(&self, state: &S, player: Player) -> bool {
        match self {
            Rule::Free => true,
            Rule::Never => false,
            Rule::Item { item, count } => state.has(item, player, *count),
            Rule::AnyOf(items) => state.has_any(items.as_slice(), player),
            Rule::And(rules) => rules.iter().all(|r| r.evaluate(state, player)),
            Rule::Or(rules) => rules.iter().any(|r| r.evaluate(state, player)),
        }
    }

    /// Every item name the rule tests, in tree order (may repeat).
    pub fn items(&self) -> Vec<&str> {
        let mut out = vec![];
        self.collect_items(&mut out);
        out
    }

    fn collect_items<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Rule::Free | Rule::Never => {}
            Rule::Item { item, .. } => out.push(item),
            Rule::AnyOf(items) => out.extend(items.iter().map(|x| x.as_str())),
            Rule::And(rules) | Rule::Or(rules) => {
                for rule in rules {
                    rule.collect_items(out);
                }
            }
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Rule::Free)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, rules: &[Rule], sep: &str| -> fmt::Result {
            write!(f, "(")?;
            for (i, rule) in rules.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{rule}")?;
            }
            write!(f, ")")
        };
        match self {
            Rule::Free => write!(f, "free"),
            Rule::Never => write!(f, "never"),
            Rule::Item { item, count: 1 } => write!(f, "{item}"),
            Rule::Item { item, count } => write!(f, "{item} x{count}"),
            Rule::AnyOf(items) => write!(f, "any({})", items.join(", ")),
            Rule::And(rules) => join(f, rules, "and"),
            Rule::Or(rules) => join(f, rules, "or"),
        }
    }
}

/// Spells unlocked by finding their manual pages.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    VariantNames,
    Serialize,
    Deserialize,
)]
pub enum Ability {
    Prayer,
    #[strum(serialize = "Holy Cross")]
    HolyCross,
    #[strum(serialize = "Ice Rod")]
    IceRod,
}

impl Ability {
    pub const ALL: [Ability; 3] = [Ability::Prayer, Ability::HolyCross, Ability::IceRod];

    /// Position in `Ability::ALL`.
    pub fn index(self) -> usize {
        match self {
            Ability::Prayer => 0,
            Ability::HolyCross => 1,
            Ability::IceRod => 2,
        }
    }

    pub fn page_item(self) -> &'static str {
        match self {
            Ability::Prayer => "Pages 24-25 (Prayer)",
            Ability::HolyCross => "Pages 42-43 (Holy Cross)",
            Ability::IceRod => "Pages 52-53 (Ice Rod)",
        }
    }

    // Key used when the unlock threshold is echoed to the client.
    pub fn slot_data_key(self) -> &'static str {
        match self {
            Ability::Prayer => "Hexagon Quest Prayer",
            Ability::HolyCross => "Hexagon Quest Holy Cross",
            Ability::IceRod => "Hexagon Quest Ice Rod",
        }
    }
}

/// Concrete item counts per player.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    counts: HashMap<(Player, String), usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(player: Player, items: &[(&str, usize)]) -> Self {
        let mut inventory = Self::new();
        for &(item, count) in items {
            inventory.add(item, player, count);
        }
        inventory
    }

    pub fn add(&mut self, item: &str, player: Player, count: usize) {
        *self.counts.entry((player, item.to_string())).or_insert(0) += count;
    }

    pub fn collect(&mut self, item: &str, player: Player) {
        self.add(item, player, 1);
    }

    pub fn remove(&mut self, item: &str, player: Player) -> bool {
        match self.counts.get_mut(&(player, item.to_string())) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

impl CollectionState for Inventory {
    fn count(&self, item: &str, player: Player) -> usize {
        self.counts
            .get(&(player, item.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

/// State in which every item is held in unlimited quantity.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllItems;

impl CollectionState for AllItems {
    fn count(&self, _item: &str, _player: Player) -> usize {
        usize::MAX
    }
}

/// Layers a borrowed base state with extra items collected during a sweep.
pub struct SweepState<'a, S: CollectionState> {
    pub base: &'a S,
    pub extra: Inventory,
}

impl<'a, S: CollectionState> SweepState<'a, S> {
    pub fn new(base: &'a S) -> Self {
        SweepState {
            base,
            extra: Inventory::new(),
        }
    }
}

impl<S: CollectionState> CollectionState for SweepState<'_, S> {
    fn count(&self, item: &str, player: Player) -> usize {
        self.base
            .count(item, player)
            .saturating_add(self.extra.count(item, player))
    }
}
