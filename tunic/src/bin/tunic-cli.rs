use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use rand::SeedableRng;
use tunic::fill::assumed_fill;
use tunic::settings::{parse_options, Options};
use tunic::spoiler_log::get_spoiler_log;
use tunic::traverse::is_beatable;
use tunic::{generate, Placement, TunicWorld};
use tunic_game::GameData;
use tunic_logic::Player;

#[derive(Parser)]
struct Args {
    #[arg(long)]
    options: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long)]
    random_seed: Option<usize>,

    #[arg(long, default_value_t = 1)]
    player: usize,

    #[arg(long, default_value_t = 10)]
    max_attempts: usize,

    #[arg(long)]
    output_slot_data: Option<PathBuf>,

    #[arg(long)]
    output_spoiler_log: Option<PathBuf>,
}

fn get_world<'a>(
    args: &Args,
    game_data: &'a GameData,
    options: &Options,
) -> Result<(TunicWorld<'a>, Vec<Placement>, usize)> {
    let root_seed = args
        .random_seed
        .unwrap_or_else(|| rand::random::<u32>() as usize);
    for attempt_num in 0..args.max_attempts {
        let seed = root_seed.wrapping_add(attempt_num);
        info!("[attempt {attempt_num}] Generating with seed {seed}");
        let world = match generate(game_data, Player(args.player), options.clone(), seed) {
            Ok(w) => w,
            Err(e) => {
                warn!("[attempt {attempt_num}] Generation failed: {e:#}");
                continue;
            }
        };
        let mut fill_rng_seed = [0u8; 32];
        fill_rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
        fill_rng_seed[8] = 1;
        let mut fill_rng = rand::rngs::StdRng::from_seed(fill_rng_seed);
        let (filled_graph, placements) = match assumed_fill(&world, &mut fill_rng) {
            Ok(x) => x,
            Err(e) => {
                warn!("[attempt {attempt_num}] Fill failed: {e:#}");
                continue;
            }
        };
        if !is_beatable(&filled_graph, &world.start_state(), world.player)? {
            warn!("[attempt {attempt_num}] Filled world is not beatable");
            continue;
        }
        info!("[attempt {attempt_num}] Successful");
        return Ok((world, placements, seed));
    }
    bail!("Exhausted generation attempts");
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let game_data = match &args.data_dir {
        Some(path) => GameData::load_from_dir(path)?,
        None => GameData::load()?,
    };
    let options = match &args.options {
        Some(path) => {
            let options_str = std::fs::read_to_string(path)
                .with_context(|| format!("Unable to read options at {}", path.display()))?;
            parse_options(&options_str)?
        }
        None => Options::default(),
    };

    let (mut world, placements, seed) = get_world(&args, &game_data, &options)?;
    let slot_data = world.fill_slot_data(&placements)?;

    let slot_data_str = serde_json::to_string_pretty(&slot_data)?;
    match &args.output_slot_data {
        Some(path) => {
            println!("Writing slot data to {}", path.display());
            std::fs::write(path, slot_data_str)?;
        }
        None => println!("{slot_data_str}"),
    }

    if let Some(path) = &args.output_spoiler_log {
        println!("Writing spoiler log to {}", path.display());
        let spoiler_log = get_spoiler_log(&world, seed, &placements);
        std::fs::write(path, serde_json::to_string_pretty(&spoiler_log)?)?;
    }
    Ok(())
}
