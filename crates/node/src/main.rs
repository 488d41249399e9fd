mod config;
mod presenter;
mod robot;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use config::{Command, discovery_wait, node_config};
use presenter::LogPresenter;
use snakes::{DiscoveryListener, GameConfig, NetworkEndpoint, NodeController, Presenter};

#[derive(Parser)]
#[command(name = "snakes-node")]
#[command(about = "Peer-to-peer multiplayer snake node")]
struct Args {
    #[arg(short, long, default_value = "player")]
    name: String,

    #[arg(short, long, default_value = "0.0.0.0:0", help = "Game socket address")]
    bind: String,

    #[arg(long, help = "Play as a robot steered towards the nearest food")]
    robot: bool,

    #[arg(long, default_value_t = 0.0, help = "Outbound packet loss percentage (0-100)")]
    loss_percent: f64,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let presenter = Arc::new(LogPresenter::default());
    let node_config = node_config(&args.name, args.robot, args.loss_percent);

    let mut controller = match &args.command {
        Command::Host(host) => {
            let config = host.game_config().context("invalid game settings")?;
            let endpoint = NetworkEndpoint::bind(&args.bind)
                .with_context(|| format!("failed to bind {}", args.bind))?;
            NodeController::host(endpoint, config, node_config, presenter.clone())?
        }
        Command::Join {
            master,
            view,
            discover_ms,
        } => {
            let (master_addr, config) = match master {
                Some(addr) => (*addr, GameConfig::default()),
                None => {
                    let game = discover(presenter.clone(), discovery_wait(*discover_ms), true)?
                        .into_iter()
                        .find(|g| g.announcement.can_join || *view)
                        .context("no joinable game found")?;
                    (game.source, game.announcement.config)
                }
            };
            let endpoint = NetworkEndpoint::bind(&args.bind)
                .with_context(|| format!("failed to bind {}", args.bind))?;
            NodeController::join(
                endpoint,
                master_addr,
                config,
                *view,
                node_config,
                presenter.clone(),
            )?
        }
        Command::List { wait_ms } => {
            let games = discover(presenter.clone(), discovery_wait(*wait_ms), false)?;
            if games.is_empty() {
                println!("No games found");
            }
            for game in games {
                let host = game.announcement.master().map_or("?", |m| m.name.as_str());
                println!(
                    "{}  host={}  {}x{}  players={}  {}",
                    game.source,
                    host,
                    game.announcement.config.width,
                    game.announcement.config.height,
                    game.announcement.players.len(),
                    if game.announcement.can_join { "open" } else { "full" }
                );
            }
            return Ok(());
        }
    };

    let robot = if args.robot {
        let period = controller
            .state()
            .map_or(Duration::from_millis(100), |s| s.config.iteration_delay() / 2);
        Some(robot::spawn(
            presenter.clone(),
            controller.handle(),
            controller.my_id(),
            period,
        )?)
    } else {
        None
    };

    info!(
        "Node {} running as {} on {}",
        controller.my_id(),
        controller.role().as_str(),
        controller.local_addr()
    );
    let result = controller.run();
    controller.handle().shutdown();
    if let Some(robot) = robot {
        if robot.join().is_err() {
            warn!("Robot thread panicked");
        }
    }
    result?;
    Ok(())
}

/// Listens for announcements for `wait`. With `first` set, returns as soon as
/// one joinable game shows up.
fn discover(
    presenter: Arc<LogPresenter>,
    wait: Duration,
    first: bool,
) -> Result<Vec<snakes::JoinableGame>> {
    let listener = DiscoveryListener::bind(presenter.clone() as Arc<dyn Presenter>)
        .context("failed to join the discovery group")?;
    let (running, handle) = listener.spawn()?;

    let deadline = Instant::now() + wait;
    let mut games = Vec::new();
    while Instant::now() < deadline {
        games = presenter.games().list();
        if first && games.iter().any(|g| g.announcement.can_join) {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    running.store(false, std::sync::atomic::Ordering::SeqCst);
    match handle.join() {
        Ok(result) => result.context("discovery failed")?,
        Err(_) => bail!("discovery thread panicked"),
    }
    Ok(games)
}
