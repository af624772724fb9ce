use std::pin::pin;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::{BackendClient, UserContext};
use crate::error::AppResult;
use crate::player::command::{self, PlayerCommand, render_lesson};
use crate::player::{CoursePlayer, PlayerOptions};
use crate::progress::FileCache;
use crate::utils::signal::shutdown_signal;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod client;
pub mod error;
pub mod model;
pub mod player;
pub mod progress;
pub mod utils;

static APPLICATION_NAME: &str = "cursus";

/// Loads the course through the configured backend, with progress cached under `cache_dir`.
#[tracing::instrument]
pub async fn build_player(course_id: u64) -> AppResult<CoursePlayer> {
    let use_local = cfg!(debug_assertions);
    let config = Config::get_or_init(use_local).await;

    let client = Arc::new(BackendClient::from_config(config)?);
    let cache = Arc::new(FileCache::new(config.player().cache_dir())?);
    let user = UserContext::student(config.player().user_id());

    tracing::debug!("loading course {course_id} from {}", client.base_url());
    let player = CoursePlayer::load(
        client.as_ref(),
        course_id,
        &user,
        cache,
        client.clone(),
        PlayerOptions::from_config(config),
    )
    .await?;
    Ok(player)
}

/// Reads commands from stdin until `quit`, end of input or Ctrl+C, then flushes progress.
#[tracing::instrument(skip(player), fields(course_id = player.course_id()))]
pub async fn run_player(mut player: CoursePlayer) -> AppResult<()> {
    println!("{}\n", player.title());
    print!("{}", render_lesson(&player));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shutdown = pin!(shutdown_signal());

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => break,
        };
        let Some(line) = line else {
            break;
        };

        let cmd = match PlayerCommand::parse(&line) {
            None => continue,
            Some(Err(hint)) => {
                println!("{hint}");
                continue;
            }
            Some(Ok(cmd)) => cmd,
        };
        if cmd == PlayerCommand::Quit {
            break;
        }

        match command::apply(&mut player, &cmd) {
            Ok(out) => print!("{out}"),
            Err(e) => println!("{e}"),
        }
    }

    tracing::info!("closing {}, {}% complete", player.title(), player.progress_percentage());
    player.close().await;
    Ok(())
}

pub fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("{APPLICATION_NAME} tracing initialized.");
}

#[tracing::instrument]
pub async fn run(course_id: u64) -> AppResult<()> {
    setup_trace();
    let player = build_player(course_id).await?;
    run_player(player).await
}
