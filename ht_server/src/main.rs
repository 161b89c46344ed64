//! Single-table hold'em host driven from the console.
//!
//! Spawns one TableActor and feeds it commands read from stdin. Every event
//! a joined player may see is printed to stdout as a JSON line tagged with
//! that player.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Error};
use holdem_table::{
    GameSettings, TableEngine,
    entities::PlayerId,
    events::TableEvent,
    table::{InMemoryTableRepository, Sequenced, TableActor, TableHandle, TableResponse},
};
use ht_server::{
    commands::{Command, parse_command},
    config::{CliOverrides, ServerConfig},
    logging,
};
use log::info;
use pico_args::Arguments;
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};

const HELP: &str = "\
Run a single hold'em table driven from stdin

USAGE:
  ht_server [OPTIONS]

OPTIONS:
  --name         NAME    Table name                 [default: env TABLE_NAME or Default Table]
  --seats        N       Number of seats            [default: env TABLE_MAX_SEATS or 9]
  --small-blind  CHIPS   Small blind                [default: env TABLE_SMALL_BLIND or 50]
  --big-blind    CHIPS   Big blind                  [default: env TABLE_BIG_BLIND or 100]
  --seed         N       Fixed shuffle seed         [default: env TABLE_SEED or random]

FLAGS:
  -h, --help             Print help information

ENVIRONMENT:
  TABLE_MAX_BUY_IN, TABLE_ACTION_TIMEOUT_SECS, TABLE_CLEANUP_DELAY_MS,
  TABLE_REPLAY_CAPACITY, TABLE_REPLAY_THRESHOLD,
  TABLE_SNAPSHOT_EVERY, TABLE_SUBSCRIBER_BUFFER
  RUST_LOG               Log filter (logs go to stderr)
  (See .env file for all configuration options)
";

const COMMANDS: &str = "\
COMMANDS:
  PLAYER join [NAME]        subscribe to table events
  PLAYER leave              unsubscribe
  PLAYER sit SEAT BUYIN     take a seat
  PLAYER stand              leave the seat (folds a live hand)
  PLAYER fold|check|call|all-in [@HAND]
  PLAYER bet|raise AMOUNT [@HAND]
                            bet or raise to AMOUNT this street; @HAND
                            rejects the action unless that hand is current
  PLAYER resync LAST_SEQ    replay missed events or get a snapshot
  [PLAYER] snapshot         print the table as PLAYER (or an observer) sees it
  help | quit
";

/// One line of stdout.
#[derive(Serialize)]
struct Output<'a, T: Serialize> {
    viewer: Option<&'a PlayerId>,
    #[serde(flatten)]
    body: &'a T,
}

fn print_json<T: Serialize>(viewer: Option<&PlayerId>, body: &T) {
    match serde_json::to_string(&Output { viewer, body }) {
        Ok(line) => println!("{line}"),
        Err(e) => log::error!("Failed to encode output: {}", e),
    }
}

fn spawn_printer(
    player: PlayerId,
    mut events: mpsc::Receiver<Sequenced<TableEvent>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_json(Some(&player), &event);
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}\n{COMMANDS}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        name: pargs.opt_value_from_str("--name")?,
        max_seats: pargs.opt_value_from_str("--seats")?,
        small_blind: pargs.opt_value_from_str("--small-blind")?,
        big_blind: pargs.opt_value_from_str("--big-blind")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate().context("Invalid table configuration")?;
    info!(
        "Starting table {} '{}' with {} seats, blinds {}/{}",
        config.table_id,
        config.table.name,
        config.table.max_seats,
        config.table.small_blind,
        config.table.big_blind
    );

    let repository = Arc::new(InMemoryTableRepository::new(config.table.replay_capacity));
    let settings = GameSettings::from(&config.table);
    let engine = match config.seed {
        Some(seed) => TableEngine::with_seed(settings, seed),
        None => TableEngine::new(settings),
    };
    let (actor, handle) = TableActor::with_engine(config.table_id, config.table, engine, repository);
    let actor_task = tokio::spawn(actor.run());

    info!("Table is running. Type 'help' for commands, Ctrl+C to stop.");

    let mut printers: HashMap<PlayerId, JoinHandle<()>> = HashMap::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if !run_command(&handle, &mut printers, command).await {
                            log::error!("Table actor stopped");
                            break;
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    info!("Shutting down table...");
    handle.close().await;
    actor_task.await.context("Table actor panicked")?;
    for printer in printers.into_values() {
        let _ = printer.await;
    }

    Ok(())
}

/// Execute one command against the table. Returns `false` once the table is
/// gone.
async fn run_command(
    handle: &TableHandle,
    printers: &mut HashMap<PlayerId, JoinHandle<()>>,
    command: Command,
) -> bool {
    let (player, name, response) = match command {
        Command::Help => {
            print!("{COMMANDS}");
            return true;
        }
        Command::Quit => return true,

        Command::Join { player, name } => {
            if printers.contains_key(&player) {
                eprintln!("{player} already joined");
                return true;
            }
            let Ok(events) = handle.subscribe(&player, &name).await else {
                return false;
            };
            printers.insert(player.clone(), spawn_printer(player, events));
            return true;
        }
        Command::Leave { player } => {
            if handle.unsubscribe(&player).await.is_err() {
                return false;
            }
            // The printer ends once the actor drops the sender.
            printers.remove(&player);
            return true;
        }

        Command::Sit {
            player,
            seat,
            buy_in,
        } => {
            let response = handle.sit_down(&player, player.as_str(), seat, buy_in).await;
            (player, "sit", response)
        }
        Command::Stand { player } => {
            let response = handle.stand_up(&player).await;
            (player, "stand", response)
        }
        Command::Act {
            player,
            action,
            amount,
            hand_id,
        } => {
            let hand_id = match hand_id {
                Some(hand_id) => hand_id,
                None => {
                    let Ok(snapshot) = handle.snapshot(Some(&player)).await else {
                        return false;
                    };
                    let Some(hand_id) = snapshot.view.hand_id else {
                        eprintln!("No hand has been dealt yet");
                        return true;
                    };
                    hand_id
                }
            };
            let response = handle.act(&player, hand_id, action, amount).await;
            (player, "action", response)
        }

        Command::Resync { player, last_seq } => {
            let Ok(resync) = handle.resync(Some(&player), last_seq).await else {
                return false;
            };
            print_json(Some(&player), &resync);
            return true;
        }
        Command::Snapshot { player } => {
            let Ok(snapshot) = handle.snapshot(player.as_ref()).await else {
                return false;
            };
            print_json(player.as_ref(), &snapshot);
            return true;
        }
    };

    logging::log_table_response(player.as_str(), name, &response);
    if let Some(reason) = response.error_message() {
        eprintln!("{player}: {reason}");
    }
    response != TableResponse::TableClosed
}
