use anyhow::Result;
use hashbrown::HashMap;
use rand::SeedableRng;
use serde_json::{json, Value};
use tunic::entrance::{pair_portals, HintMap, SHOP_COUNT};
use tunic::fill::assumed_fill;
use tunic::graph::RegionGraph;
use tunic::settings::{parse_options, FoolTraps, Options};
use tunic::traverse::is_beatable;
use tunic::world::MAX_GOLD_HEXAGON_ENTRIES;
use tunic::{generate, Placement, TunicWorld};
use tunic_game::error::WorldError;
use tunic_game::items::{FOOL_TRAP, GOLD_HEXAGON, SWORD};
use tunic_game::regions::{RegionTable, START_REGION};
use tunic_game::GameData;
use tunic_logic::Player;

const P1: Player = Player(1);

fn world_error(err: &anyhow::Error) -> Option<&WorldError> {
    err.downcast_ref::<WorldError>()
}

fn generate_any(options: &Options) -> Result<(TunicWorld<'static>, usize)> {
    let game_data = GameData::shared()?;
    let mut last_err = anyhow::anyhow!("no seed tried");
    for seed in 0..20 {
        match generate(game_data, P1, options.clone(), seed) {
            Ok(world) => return Ok((world, seed)),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

fn generate_and_fill(
    options: &Options,
) -> Result<(TunicWorld<'static>, RegionGraph, Vec<Placement>)> {
    let game_data = GameData::shared()?;
    let mut last_err = anyhow::anyhow!("no seed tried");
    for seed in 0..20 {
        let filled = generate(game_data, P1, options.clone(), seed).and_then(|world| {
            let (graph, placements) = assumed_fill(&world, &mut fill_rng(seed))?;
            Ok((world, graph, placements))
        });
        match filled {
            Ok(x) => return Ok(x),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

fn fill_rng(seed: usize) -> rand::rngs::StdRng {
    let mut rng_seed = [0u8; 32];
    rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
    rng_seed[8] = 1;
    rand::rngs::StdRng::from_seed(rng_seed)
}

#[test]
fn pool_fills_every_location() -> Result<()> {
    let game_data = GameData::shared()?;
    for hexagon_quest in [false, true] {
        for keys_behind_bosses in [false, true] {
            for sword_progression in [false, true] {
                let options = Options {
                    hexagon_quest,
                    keys_behind_bosses,
                    sword_progression,
                    ..Options::default()
                };
                let (world, _) = generate_any(&options)?;
                let locked = world.locked_slot_data_items.len();
                assert_eq!(
                    world.item_pool.len() + locked,
                    game_data.locations.locations.len()
                );
                assert_eq!(locked, if keys_behind_bosses { 3 } else { 0 });
            }
        }
    }
    Ok(())
}

#[test]
fn fool_traps_replace_money() -> Result<()> {
    let count_fools = |world: &TunicWorld| {
        world
            .item_pool
            .iter()
            .filter(|item| item.name == FOOL_TRAP)
            .count()
    };
    let mut counts = vec![];
    for fool_traps in [
        FoolTraps::Off,
        FoolTraps::Normal,
        FoolTraps::Double,
        FoolTraps::Onslaught,
    ] {
        let (world, _) = generate_any(&Options {
            fool_traps,
            ..Options::default()
        })?;
        counts.push(count_fools(&world));
    }
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    assert!(counts[0] < counts[3]);
    Ok(())
}

#[test]
fn keys_behind_bosses_locks_hexagons() -> Result<()> {
    let (world, _) = generate_any(&Options {
        keys_behind_bosses: true,
        ..Options::default()
    })?;
    let hexagon_locations = &world.game_data.locations.hexagon_locations;
    assert_eq!(hexagon_locations.len(), 3);
    for (hexagon, location) in hexagon_locations {
        let held = world
            .graph
            .location(location)
            .map(|loc| (loc.locked, loc.item.clone()));
        assert_eq!(held, Some((true, Some(hexagon.clone()))), "{location}");
        assert!(!world.item_pool.iter().any(|item| &item.name == hexagon));
    }
    Ok(())
}

#[test]
fn start_with_sword_adds_to_start_inventory() -> Result<()> {
    let (world, _) = generate_any(&Options {
        start_with_sword: true,
        ..Options::default()
    })?;
    assert_eq!(world.options.start_inventory.get(SWORD), Some(&1));
    Ok(())
}

#[test]
fn invalid_options_are_rejected() -> Result<()> {
    let game_data = GameData::shared()?;
    let options = Options {
        hexagon_goal: 51,
        ..Options::default()
    };
    let err = generate(game_data, P1, options, 0).err();
    assert!(matches!(
        err.as_ref().and_then(world_error),
        Some(WorldError::InvalidOption(_))
    ));

    let err = parse_options(r#"{"extra_hexagon_percentage": 101}"#).unwrap_err();
    assert!(matches!(world_error(&err), Some(WorldError::InvalidOption(_))));
    let err = parse_options(r#"{"fool_traps": "sometimes"}"#).unwrap_err();
    assert!(matches!(world_error(&err), Some(WorldError::InvalidOption(_))));

    let mut options = Options::default();
    options.start_inventory.insert("Grappling Hook".to_string(), 1);
    let err = generate(game_data, P1, options, 0).err();
    assert!(matches!(
        err.as_ref().and_then(world_error),
        Some(WorldError::UnknownItemReference(_))
    ));
    Ok(())
}

#[test]
fn entrance_rando_is_deterministic() -> Result<()> {
    let options = Options {
        entrance_rando: true,
        ..Options::default()
    };
    let (world, seed) = generate_any(&options)?;
    let again = generate(GameData::shared()?, P1, options, seed)?;
    assert_eq!(world.portal_pairing, again.portal_pairing);
    assert_eq!(world.ability_unlocks, again.ability_unlocks);
    assert_eq!(world.portal_hints, again.portal_hints);

    let pairing = world.portal_pairing.as_ref().map(|p| p.pairs.len());
    let portal_count = world.game_data.regions.portals.len();
    assert_eq!(pairing, Some((portal_count + SHOP_COUNT) / 2));
    if let Some(pairing) = &world.portal_pairing {
        pairing.check_legality(&world.game_data.regions)?;
        assert_eq!(pairing.shop_portals().count(), SHOP_COUNT);
    }
    Ok(())
}

#[test]
fn hints_point_at_start_area_portals() -> Result<()> {
    let (world, _) = generate_any(&Options {
        entrance_rando: true,
        ..Options::default()
    })?;
    let table = &world.game_data.regions;
    let start_cluster = table.dependent_regions(START_REGION);
    assert!(!world.portal_hints.is_empty());
    for portal_name in world.portal_hints.values() {
        let portal = table.portal(portal_name);
        assert!(portal.is_some_and(|p| start_cluster.contains(&p.region)));
    }
    let start_location = world
        .game_data
        .locations
        .get("Overworld - [Southwest] Chest Near Turret")
        .map(|loc| loc.id);
    assert!(start_location.is_some_and(|id| !world.portal_hints.contains_key(&id)));

    let mut hint_data: HashMap<Player, HintMap> = HashMap::new();
    world.extend_hint_information(&mut hint_data);
    assert_eq!(hint_data.get(&P1), Some(&world.portal_hints));

    let (vanilla, _) = generate_any(&Options::default())?;
    let mut hint_data: HashMap<Player, HintMap> = HashMap::new();
    vanilla.extend_hint_information(&mut hint_data);
    assert!(hint_data.is_empty());
    Ok(())
}

#[test]
fn filled_world_is_beatable() -> Result<()> {
    for options in [
        Options::default(),
        Options {
            entrance_rando: true,
            ability_shuffling: true,
            ..Options::default()
        },
        Options {
            hexagon_quest: true,
            keys_behind_bosses: true,
            ability_shuffling: true,
            ..Options::default()
        },
    ] {
        let (world, filled, placements) = generate_and_fill(&options)?;
        assert_eq!(placements.len(), world.item_pool.len());
        assert!(is_beatable(&filled, &world.start_state(), P1)?);
    }
    Ok(())
}

#[test]
fn slot_data_reports_options_and_items() -> Result<()> {
    let options = Options {
        hexagon_quest: true,
        keys_behind_bosses: true,
        ability_shuffling: true,
        entrance_rando: true,
        ..Options::default()
    };
    let (mut world, _, placements) = generate_and_fill(&options)?;
    let slot_data = world.fill_slot_data(&placements)?;

    assert!(slot_data.get("seed").is_some_and(Value::is_u64));
    assert_eq!(slot_data.get("hexagon_quest"), Some(&json!(1)));
    assert_eq!(slot_data.get("start_with_sword"), Some(&json!(0)));
    assert_eq!(slot_data.get("fool_traps"), Some(&json!(1)));
    assert_eq!(slot_data.get("Hexagon Quest Goal"), Some(&json!(20)));
    for key in [
        "Hexagon Quest Prayer",
        "Hexagon Quest Holy Cross",
        "Hexagon Quest Ice Rod",
    ] {
        assert!(slot_data.get(key).is_some_and(Value::is_u64));
    }
    let entrances = slot_data.get("Entrance Rando").and_then(Value::as_object);
    assert!(entrances.is_some_and(|e| !e.is_empty()));

    let golds = slot_data.get(GOLD_HEXAGON).and_then(Value::as_array);
    assert_eq!(golds.map(Vec::len), Some(MAX_GOLD_HEXAGON_ENTRIES));
    let lantern = slot_data.get("Lantern").and_then(Value::as_array);
    assert_eq!(lantern.map(Vec::len), Some(2));
    assert!(slot_data.get("Golden Coin").is_none());
    Ok(())
}

#[test]
fn slot_data_counts_pool_items_started_with() -> Result<()> {
    let mut options = Options::default();
    options
        .start_inventory_from_pool
        .insert("Hero's Laurels".to_string(), 1);
    let (mut world, _, placements) = generate_and_fill(&options)?;
    let slot_data = world.fill_slot_data(&placements)?;
    let laurels = slot_data.get("Hero's Laurels").and_then(Value::as_array);
    assert!(laurels.is_some_and(|l| l.contains(&json!("Your Pocket"))));
    Ok(())
}

#[test]
fn bad_catalogs_are_rejected() -> Result<()> {
    let regions = r#"{
        "regions": [
            {"name": "Overworld", "scene": "Overworld Redux"},
            {"name": "Spirit Arena Victory", "scene": "Spirit Arena", "dead_end": true}
        ]
    }"#;
    let locations = r#"{"locations": [{"name": "Overworld - Chest", "region": "Overworld"}]}"#;
    let items = r#"{"items": [{"name": "Stick", "classification": "progression", "quantity": 1}]}"#;
    GameData::from_json_strs(items, locations, regions)?;

    let bad_class = r#"{"items": [{"name": "Stick", "classification": "shiny", "quantity": 1}]}"#;
    let err = GameData::from_json_strs(bad_class, locations, regions).unwrap_err();
    assert!(matches!(world_error(&err), Some(WorldError::MalformedCatalog(_))));

    let dangling = r#"{"locations": [{"name": "Cave - Chest", "region": "Cave"}]}"#;
    let err = GameData::from_json_strs(items, dangling, regions).unwrap_err();
    assert!(matches!(world_error(&err), Some(WorldError::DanglingReference(_))));
    Ok(())
}

#[test]
fn too_few_scenes_for_shops_is_unsatisfiable() -> Result<()> {
    let table = RegionTable::load_str(
        r#"{
            "regions": [
                {"name": "Overworld", "scene": "Overworld Redux"},
                {"name": "Windmill", "scene": "Windmill", "dead_end": true},
                {"name": "Spirit Arena Victory", "scene": "Spirit Arena", "dead_end": true}
            ],
            "portals": [
                {"name": "Windmill Entrance", "region": "Overworld", "destination": "Windmill"},
                {"name": "Windmill Exit", "region": "Windmill", "destination": "Overworld Redux"}
            ]
        }"#,
    )?;
    let options = Options {
        entrance_rando: true,
        ..Options::default()
    };
    let err = pair_portals(&table, &mut fill_rng(0), &options).unwrap_err();
    assert!(matches!(
        world_error(&err),
        Some(WorldError::UnsatisfiablePairing(_))
    ));
    Ok(())
}
