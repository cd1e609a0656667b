use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, VariantNames};
use tunic_game::error::WorldError;

pub const MIN_HEXAGON_GOAL: usize = 15;
pub const MAX_HEXAGON_GOAL: usize = 50;
pub const MAX_EXTRA_HEXAGON_PERCENTAGE: usize = 100;

#[derive(
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    Default,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FoolTraps {
    Off,
    #[default]
    Normal,
    Double,
    Onslaught,
}

impl FoolTraps {
    pub fn tier(self) -> usize {
        match self {
            FoolTraps::Off => 0,
            FoolTraps::Normal => 1,
            FoolTraps::Double => 2,
            FoolTraps::Onslaught => 3,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Options {
    pub sword_progression: bool,
    pub start_with_sword: bool,
    pub keys_behind_bosses: bool,
    pub ability_shuffling: bool,
    pub entrance_rando: bool,
    pub fixed_shop: bool,
    pub fool_traps: FoolTraps,
    pub hexagon_quest: bool,
    pub hexagon_goal: usize,
    pub extra_hexagon_percentage: usize,
    pub start_inventory: BTreeMap<String, usize>,
    pub start_inventory_from_pool: BTreeMap<String, usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sword_progression: true,
            start_with_sword: false,
            keys_behind_bosses: false,
            ability_shuffling: false,
            entrance_rando: false,
            fixed_shop: false,
            fool_traps: FoolTraps::Normal,
            hexagon_quest: false,
            hexagon_goal: 20,
            extra_hexagon_percentage: 50,
            start_inventory: BTreeMap::new(),
            start_inventory_from_pool: BTreeMap::new(),
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(MIN_HEXAGON_GOAL..=MAX_HEXAGON_GOAL).contains(&self.hexagon_goal) {
            return Err(WorldError::InvalidOption(format!(
                "hexagon_goal must be between {MIN_HEXAGON_GOAL} and {MAX_HEXAGON_GOAL}, got {}",
                self.hexagon_goal
            )));
        }
        if self.extra_hexagon_percentage > MAX_EXTRA_HEXAGON_PERCENTAGE {
            return Err(WorldError::InvalidOption(format!(
                "extra_hexagon_percentage must be at most {MAX_EXTRA_HEXAGON_PERCENTAGE}, got {}",
                self.extra_hexagon_percentage
            )));
        }
        Ok(())
    }

    /// Gold hexagons created in hexagon quest, rounding half up.
    pub fn gold_hexagon_total(&self) -> usize {
        (2 * self.hexagon_goal * (100 + self.extra_hexagon_percentage) + 100) / 200
    }

    // Thresholds hit when a quarter, half and three quarters of the goal is collected.
    pub fn ability_thresholds(&self) -> [usize; 3] {
        if self.hexagon_quest {
            let goal = self.hexagon_goal;
            [goal / 4, goal / 2, goal * 3 / 4]
        } else {
            [1, 1, 1]
        }
    }
}

pub fn parse_options(options_json: &str) -> Result<Options> {
    let options: Options = serde_json::from_str(options_json)
        .map_err(|e| WorldError::InvalidOption(e.to_string()))
        .context("Unable to parse options")?;
    options.validate()?;
    Ok(options)
}
