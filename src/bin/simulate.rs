//! Random self-play driver for the rules engine. Runs N games in parallel
//! with seeded dice and prints win/turn statistics. Useful for smoke-testing
//! rule changes: any engine invariant violation surfaces as an error here.

use clap::Parser;
use itertools::Itertools;
use rayon::prelude::*;

use landlord::board::STARTING_BALANCE;
use landlord::dice::{Clock, RandomSource, SystemClock, XorshiftSource};
use landlord::engine::turn::Landing;
use landlord::engine::{bankruptcy, property, turn};
use landlord::entities::GameStatus;
use landlord::errors::{EngineError, EngineResult};
use landlord::store::{GameStore, UserDirectory};

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Random self-play over the game engine")]
struct Args {
    /// Number of games to simulate
    #[arg(short = 'n', long, default_value_t = 100)]
    num_games: u64,

    /// Players per game
    #[arg(short, long, default_value_t = 4)]
    players: usize,

    /// Turn limit per game before forcing resolution
    #[arg(short, long, default_value_t = 1000)]
    max_turns: u32,

    /// Base RNG seed; game i uses seed + i
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Print per-game results
    #[arg(short, long)]
    verbose: bool,
}

struct GameReport {
    winner: Option<String>,
    turns: u32,
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();
    log::info!(
        "simulating {} games with {} players each (seed {})",
        args.num_games,
        args.players,
        args.seed
    );

    let reports: Vec<GameReport> = (0..args.num_games)
        .into_par_iter()
        .map(|i| {
            let report = run_game(args.seed + i, args.players, args.max_turns)
                .unwrap_or_else(|err| panic!("game {} violated an engine rule: {}", i, err));
            if args.verbose {
                match &report.winner {
                    Some(name) => println!("game {}: {} won in {} turns", i, name, report.turns),
                    None => println!("game {}: no winner after {} turns", i, report.turns),
                }
            }
            report
        })
        .collect();

    let completed = reports.iter().filter(|r| r.winner.is_some()).count();
    let total_turns: u64 = reports.iter().map(|r| u64::from(r.turns)).sum();
    println!("completed: {}/{}", completed, reports.len());
    if !reports.is_empty() {
        println!(
            "average turns per game: {:.1}",
            total_turns as f64 / reports.len() as f64
        );
    }
    let wins = reports
        .iter()
        .filter_map(|r| r.winner.as_deref())
        .counts();
    for (name, count) in wins.iter().sorted() {
        println!(
            "{}: {} wins ({:.1}%)",
            name,
            count,
            *count as f64 / reports.len() as f64 * 100.0
        );
    }
}

/// Play one full game with a random policy, returning the winner's name.
fn run_game(seed: u64, players: usize, max_turns: u32) -> EngineResult<GameReport> {
    let mut rng = XorshiftSource::seeded(seed);
    let clock = SystemClock;
    let mut users = UserDirectory::new();

    let mut store = GameStore::new(format!("sim-{}", seed), players, clock.now());
    let mut first = None;
    for i in 0..players {
        let id = store.insert_player(
            format!("bot-{}", i + 1),
            format!("Bot {}", i + 1),
            STARTING_BALANCE,
        );
        first.get_or_insert(id);
    }
    store.materialize_board();
    store.game_mut().status = GameStatus::Active;
    store.game_mut().current_player_id = first;

    let mut turns = 0;
    while turns < max_turns && store.game().status == GameStatus::Active {
        turns += 1;
        let player_id = match store.game().current_player_id {
            Some(id) => id,
            None => break,
        };
        let actor = store.player(player_id)?.user_id.clone();

        if store.player(player_id)?.pending_rent.is_some() {
            match turn::pay_rent(&mut store, &actor, player_id, &clock) {
                Ok(_) => {}
                Err(EngineError::InsufficientFunds { .. }) => {
                    bankruptcy::declare_bankruptcy(&mut store, &actor, player_id, &mut users, &clock)?;
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        if store.player(player_id)?.in_jail && store.player(player_id)?.jail_cards > 0 {
            turn::use_jail_card(&mut store, &actor, player_id, &clock)?;
        }

        let outcome = match turn::roll_and_move(&mut store, &actor, player_id, &mut rng, &clock) {
            Ok(outcome) => outcome,
            Err(EngineError::InsufficientFunds { .. }) => {
                // Forced jail fine with an empty wallet.
                bankruptcy::declare_bankruptcy(&mut store, &actor, player_id, &mut users, &clock)?;
                continue;
            }
            Err(err) => return Err(err),
        };

        if let Some(Landing::BuyOffer {
            property_id,
            can_buy: true,
            ..
        }) = outcome.landing
        {
            // Buy roughly two out of three offers.
            if rng.pick(3) > 0 {
                property::buy(&mut store, &actor, player_id, property_id, &clock)?;
            }
        }
    }

    if store.game().status == GameStatus::Active {
        bankruptcy::end_game(&mut store, &mut users, &clock)?;
    }

    let winner = store
        .history()
        .iter()
        .rev()
        .find(|h| h.action == "game_ended")
        .and_then(|h| h.player_id)
        .and_then(|id| store.player(id).ok())
        .map(|p| p.name.clone());
    Ok(GameReport { winner, turns })
}
