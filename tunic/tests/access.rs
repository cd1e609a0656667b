use anyhow::{bail, Result};
use tunic::settings::Options;
use tunic::traverse::{can_reach_location, can_reach_region};
use tunic::{generate, TunicWorld};
use tunic_game::items::{
    COINS, FAIRY, GOLD_HEXAGON, HOLY_CROSS_PAGE, LANTERN, LAURELS, RED_HEXAGON,
};
use tunic_game::GameData;
use tunic_logic::{Inventory, Player};

const P1: Player = Player(1);

/// Every catalog item in ample supply, apart from the excluded ones.
fn all_except(game_data: &GameData, excluded: &[&str]) -> Inventory {
    let mut state = Inventory::new();
    for item in &game_data.items.items {
        if !excluded.contains(&item.name.as_str()) {
            state.add(&item.name, P1, 100);
        }
    }
    state
}

fn world_for(options: Options) -> Result<TunicWorld<'static>> {
    let game_data = GameData::shared()?;
    let mut last_err = None;
    for seed in 0..20 {
        match generate(game_data, P1, options.clone(), seed) {
            Ok(world) => return Ok(world),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => bail!("no seed tried"),
    }
}

#[test]
fn temple_needs_laurels_or_lantern() -> Result<()> {
    let world = world_for(Options::default())?;
    let location = "Sealed Temple - Page Pickup";
    let mut state = all_except(world.game_data, &[LAURELS, LANTERN]);
    assert!(!can_reach_location(&world.graph, &state, P1, location)?);
    state.collect(LANTERN, P1);
    assert!(can_reach_location(&world.graph, &state, P1, location)?);

    let state = all_except(world.game_data, &[LANTERN]);
    assert!(can_reach_location(&world.graph, &state, P1, location)?);
    Ok(())
}

#[test]
fn well_rewards_count_coins() -> Result<()> {
    let world = world_for(Options::default())?;
    let mut state = all_except(world.game_data, &[COINS]);
    assert!(!can_reach_location(&world.graph, &state, P1, "Coins in the Well - 3 Coins")?);
    state.add(COINS, P1, 3);
    assert!(can_reach_location(&world.graph, &state, P1, "Coins in the Well - 3 Coins")?);
    assert!(!can_reach_location(&world.graph, &state, P1, "Coins in the Well - 6 Coins")?);
    state.add(COINS, P1, 12);
    assert!(can_reach_location(&world.graph, &state, P1, "Coins in the Well - 15 Coins")?);
    Ok(())
}

#[test]
fn fairy_rewards_count_fairies() -> Result<()> {
    let world = world_for(Options::default())?;
    let ten = "Secret Gathering Place - 10 Fairy Reward";
    let location = "Secret Gathering Place - 20 Fairy Reward";
    let mut state = all_except(world.game_data, &[FAIRY]);
    state.add(FAIRY, P1, 19);
    assert!(can_reach_location(&world.graph, &state, P1, ten)?);
    assert!(!can_reach_location(&world.graph, &state, P1, location)?);
    state.collect(FAIRY, P1);
    assert!(can_reach_location(&world.graph, &state, P1, location)?);
    Ok(())
}

#[test]
fn heir_needs_all_three_hexagons() -> Result<()> {
    let world = world_for(Options::default())?;
    let mut state = all_except(world.game_data, &[RED_HEXAGON, GOLD_HEXAGON]);
    assert!(!can_reach_location(&world.graph, &state, P1, "The Heir")?);
    state.collect(RED_HEXAGON, P1);
    assert!(can_reach_location(&world.graph, &state, P1, "The Heir")?);
    Ok(())
}

#[test]
fn heir_needs_gold_hexagons_in_hexagon_quest() -> Result<()> {
    let options = Options {
        hexagon_quest: true,
        hexagon_goal: 15,
        ..Options::default()
    };
    let world = world_for(options)?;
    let mut state = all_except(world.game_data, &[GOLD_HEXAGON]);
    state.add(GOLD_HEXAGON, P1, 14);
    assert!(!can_reach_location(&world.graph, &state, P1, "The Heir")?);
    state.collect(GOLD_HEXAGON, P1);
    assert!(can_reach_location(&world.graph, &state, P1, "The Heir")?);
    Ok(())
}

#[test]
fn holy_cross_spots_need_the_page_with_shuffled_entrances() -> Result<()> {
    let options = Options {
        entrance_rando: true,
        ability_shuffling: true,
        ..Options::default()
    };
    let world = world_for(options)?;
    let location = "Overworld - [Southwest] Flowers Holy Cross";
    let mut state = all_except(world.game_data, &[HOLY_CROSS_PAGE]);
    assert!(!can_reach_location(&world.graph, &state, P1, location)?);
    assert!(!can_reach_region(&world.graph, &state, P1, "Overworld Holy Cross")?);
    state.collect(HOLY_CROSS_PAGE, P1);
    assert!(can_reach_location(&world.graph, &state, P1, location)?);

    let mut state = all_except(world.game_data, &[COINS]);
    assert!(!can_reach_location(&world.graph, &state, P1, "Coins in the Well - 10 Coins")?);
    state.add(COINS, P1, 10);
    assert!(can_reach_location(&world.graph, &state, P1, "Coins in the Well - 10 Coins")?);
    Ok(())
}

#[test]
fn start_region_is_reachable_with_nothing() -> Result<()> {
    let world = world_for(Options::default())?;
    assert!(can_reach_region(&world.graph, &Inventory::new(), P1, "Overworld")?);
    assert!(!can_reach_location(&world.graph, &Inventory::new(), P1, "The Heir")?);
    Ok(())
}
