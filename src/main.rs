//! Pico Fermi Bagel Engine
//!
//! Runs a two-seat multiplayer game against the configured service (an
//! in-process loopback unless `PFB_REMOTE_URL` is set), with both seats
//! played by a candidate-elimination solver, then prints the ranking and
//! saves stats.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pico_fermi::{
    VERSION, Action, Engine, EngineConfig,
    core::clock::SystemClock,
    core::hash::short_hex,
    game::{
        evaluate_guess, Difficulty, Guess, Settings,
        leaderboard::LeaderboardEntry,
        state::EngineState,
    },
    network::{
        LoopbackService, MultiplayerCoordinator, RemoteService, RemoteUpdate, UserProfile,
        WsRemoteService,
    },
    storage::FileStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Pico Fermi Bagel Engine v{}", VERSION);
    info!("Store: {}", config.store_path.display());

    let service: Arc<dyn RemoteService> = match &config.remote_url {
        Some(url) => {
            info!("Remote service: {} ({:?})", url, config.wire_format);
            Arc::new(WsRemoteService::new(url.clone(), config.wire_format, config.remote_timeout))
        }
        None => {
            info!("Remote service: in-process loopback");
            Arc::new(LoopbackService::new(2, &Settings::for_difficulty(Difficulty::Medium)))
        }
    };

    demo_match(&config, service).await
}

/// Two seats, one persistent (this device) and one in-memory rival.
async fn demo_match(config: &EngineConfig, service: Arc<dyn RemoteService>) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let store = FileStore::new(config.store_path.clone());
    let mut local = Engine::open(Box::new(store), Box::new(SystemClock));
    let mut rival = Engine::with_clock(EngineState::new(Settings::default()), Box::new(SystemClock));

    let me = UserProfile {
        player_id: format!("player-{}", config.device_id),
        player_name: config.player_name.clone(),
        device_id: config.device_id.clone(),
    };
    let bot = UserProfile {
        player_id: format!("rival-{}", config.device_id),
        player_name: "rival".to_string(),
        device_id: format!("{}-rival", config.device_id),
    };
    let mut seat_a = MultiplayerCoordinator::new(service.clone(), me, config.retry);
    let mut seat_b = MultiplayerCoordinator::new(service, bot, config.retry);

    seat_a.register().await?;
    seat_b.register().await?;
    seat_a.join().await?;

    let poll = Duration::from_millis(250);
    let start_b = seat_b.wait_for_start(poll, 40).await?;
    let start_a = seat_a.wait_for_start(poll, 40).await?;
    if start_a.game_id != start_b.game_id {
        bail!("seats landed in different games: {} / {}", start_a.game_id, start_b.game_id);
    }

    seat_a.begin(&mut local, &start_a)?;
    seat_b.begin(&mut rival, &start_b)?;
    info!("Game {}: board {}", start_a.game_id, short_hex(&local.fingerprint()));

    // Alternate turns until both boards are finished
    while !(local.session().is_over() && rival.session().is_over()) {
        if !local.session().is_over() {
            play_turn(&mut local, false)?;
            seat_a.send_pulse(&local);
        }
        if !rival.session().is_over() {
            play_turn(&mut rival, true)?;
            seat_b.send_pulse(&rival);
        }
        tokio::task::yield_now().await;
        for update in seat_a.drain_updates() {
            if let RemoteUpdate::Progress { progress, .. } = update {
                for p in progress {
                    info!("  {} - {} guesses, score {}", p.player_name, p.guess_count, p.score);
                }
            }
        }
        seat_b.drain_updates();
    }

    seat_a.submit_result(&local);
    seat_b.submit_result(&rival);
    let ranking = seat_a.await_ranking().await;
    seat_b.await_ranking().await;

    info!("=== Match Results ===");
    match &ranking {
        Some(ranking) => {
            let source = if ranking.authoritative { "service" } else { "local fallback" };
            info!("Ranking ({})", source);
            for entry in &ranking.entries {
                info!(
                    "  #{} {} - {} points, {} guesses, {} min",
                    entry.rank, entry.player_name, entry.score, entry.guesses, entry.time_minutes,
                );
            }
        }
        None => info!("No ranking available"),
    }

    let session = local.session();
    let entry = LeaderboardEntry {
        player_name: config.player_name.clone(),
        score: session.score,
        guesses: session.guesses.len() as u32,
        time_minutes: session.elapsed_minutes(local.now_ms()),
        difficulty: local.settings().difficulty,
        timestamp: local.now_ms(),
    };
    local.dispatch(Action::SaveScore(entry))?;

    let stats = local.stats(local.settings().difficulty);
    info!(
        "Stats: {} played, {} won, best streak {}, {:.1} guesses per win",
        stats.games_played,
        stats.games_won,
        stats.best_streak,
        stats.average_guesses().unwrap_or(0.0),
    );

    seat_a.leave().await?;
    seat_b.leave().await?;
    local.persist().context("failed to save state")?;
    Ok(())
}

/// Enter and submit the next guess consistent with every previous answer.
fn play_turn(engine: &mut Engine, from_the_back: bool) -> anyhow::Result<()> {
    let settings = engine.settings().clone();
    let mut pool = candidates(settings.target_length as usize, settings.digit_range, &engine.session().guesses);
    let guess = if from_the_back { pool.pop() } else { pool.into_iter().next() };
    let Some(guess) = guess else {
        bail!("no candidate fits the feedback so far");
    };

    for (position, digit) in guess.into_iter().enumerate() {
        engine.dispatch(Action::SetGuessDigit { position, digit: Some(digit) })?;
    }
    engine.dispatch(Action::SubmitGuess)?;

    if let Some(last) = engine.session().guesses.last() {
        let f = last.feedback;
        info!(
            "Guess {:?}: {} pico, {} fermi, {} bagel",
            last.digits, f.picos, f.fermis, f.bagels,
        );
    }
    Ok(())
}

/// Every distinct-digit sequence that would have produced the recorded feedback.
fn candidates(length: usize, digit_range: u8, history: &[Guess]) -> Vec<Vec<u8>> {
    fn extend(prefix: &mut Vec<u8>, length: usize, digit_range: u8, history: &[Guess], out: &mut Vec<Vec<u8>>) {
        if prefix.len() == length {
            if history.iter().all(|g| evaluate_guess(&g.digits, prefix) == g.feedback) {
                out.push(prefix.clone());
            }
            return;
        }
        for digit in 0..=digit_range {
            if !prefix.contains(&digit) {
                prefix.push(digit);
                extend(prefix, length, digit_range, history, out);
                prefix.pop();
            }
        }
    }

    let mut out = Vec::new();
    extend(&mut Vec::with_capacity(length), length, digit_range, history, &mut out);
    out
}
