//! Multiplayer Coordinator
//!
//! Seeds every seated client with the same target, reports progress and
//! collects the final ranking. Remote calls run on spawned tasks and report
//! back through a channel; nothing here blocks a dispatch, and remote results
//! never touch the engine state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::hash::short_hex;
use crate::core::rng::derive_game_seed;
use crate::game::action::{Action, Rejection};
use crate::game::engine::Engine;
use crate::game::events::GameEvent;
use crate::network::error::RemoteError;
use crate::network::protocol::{
    GamePulse, GameResultSubmission, GameStartEvent, LobbyState, PlayerId, PlayerProgress,
    Ranking, UserProfile,
};
use crate::network::remote::RemoteService;
use crate::network::retry::{with_retry, RetryPolicy};

/// Result of a background remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteUpdate {
    /// Progress of every player, as returned by a pulse
    Progress {
        /// Game the pulse was sent for
        game_id: String,
        /// Every player's latest progress
        progress: Vec<PlayerProgress>,
    },
    /// Final ranking, authoritative or local fallback
    Ranking(Ranking),
    /// A call failed for good
    Failed {
        /// Which call
        operation: &'static str,
        /// Last error
        error: RemoteError,
    },
}

/// The multiplayer game being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplayerSession {
    /// Game id
    pub game_id: String,
    /// Seed every client uses
    pub random_seed: u64,
    /// Latest known progress per player
    pub players: BTreeMap<PlayerId, PlayerProgress>,
    /// Local start time (ms)
    pub start_time: u64,
}

/// Drives one device through lobby, game and ranking.
pub struct MultiplayerCoordinator {
    service: Arc<dyn RemoteService>,
    policy: RetryPolicy,
    profile: UserProfile,
    lobby_id: Option<String>,
    session: Option<MultiplayerSession>,
    pulse_sequence: u64,
    submitted: BTreeSet<String>,
    ranking: Option<Ranking>,
    last_error: Option<RemoteError>,
    tx: mpsc::UnboundedSender<RemoteUpdate>,
    rx: mpsc::UnboundedReceiver<RemoteUpdate>,
}

impl MultiplayerCoordinator {
    /// Coordinator for one player on one device.
    pub fn new(service: Arc<dyn RemoteService>, profile: UserProfile, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            policy,
            profile,
            lobby_id: None,
            session: None,
            pulse_sequence: 0,
            submitted: BTreeSet::new(),
            ranking: None,
            last_error: None,
            tx,
            rx,
        }
    }

    /// Local player.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Current game, if any.
    pub fn session(&self) -> Option<&MultiplayerSession> {
        self.session.as_ref()
    }

    /// Final ranking once known.
    pub fn ranking(&self) -> Option<&Ranking> {
        self.ranking.as_ref()
    }

    /// Most recent permanent failure.
    pub fn last_error(&self) -> Option<&RemoteError> {
        self.last_error.as_ref()
    }

    /// Idempotency key for the current game.
    pub fn idempotency_key(&self) -> Option<String> {
        self.session.as_ref()
            .map(|s| GameResultSubmission::key_for(&s.game_id, &self.profile.device_id))
    }

    // =========================================================================
    // LOBBY
    // =========================================================================

    /// Register the local profile.
    pub async fn register(&self) -> Result<UserProfile, RemoteError> {
        let service = self.service.clone();
        let profile = self.profile.clone();
        with_retry(&self.policy, "register_user", || {
            let service = service.clone();
            let profile = profile.clone();
            async move { service.register_user(profile).await }
        })
        .await
    }

    /// Join the open lobby.
    pub async fn join(&mut self) -> Result<LobbyState, RemoteError> {
        let service = self.service.clone();
        let profile = self.profile.clone();
        let lobby = with_retry(&self.policy, "join_lobby", || {
            let service = service.clone();
            let profile = profile.clone();
            async move { service.join_lobby(profile).await }
        })
        .await?;
        self.lobby_id = Some(lobby.lobby_id.clone());
        Ok(lobby)
    }

    /// Rejoin every `poll` until the lobby launches a game.
    pub async fn wait_for_start(&mut self, poll: Duration, max_polls: u32) -> Result<GameStartEvent, RemoteError> {
        for _ in 0..max_polls.max(1) {
            if let Some(start) = self.join().await?.game_start {
                return Ok(start);
            }
            tokio::time::sleep(poll).await;
        }
        Err(RemoteError::network("lobby did not launch a game in time"))
    }

    /// Leave the current lobby.
    pub async fn leave(&mut self) -> Result<(), RemoteError> {
        let Some(lobby_id) = self.lobby_id.take() else {
            return Ok(());
        };
        let service = self.service.clone();
        let player_id = self.profile.player_id.clone();
        with_retry(&self.policy, "leave_lobby", || {
            let service = service.clone();
            let lobby_id = lobby_id.clone();
            let player_id = player_id.clone();
            async move { service.leave_lobby(&lobby_id, &player_id).await }
        })
        .await
    }

    // =========================================================================
    // GAME
    // =========================================================================

    /// Apply the game's board and start it on the shared seed.
    ///
    /// The engine is seeded before this returns, so the player never sees a
    /// board that differs from the other seats. Board fields the event leaves
    /// out come from the defaults, never from local settings.
    pub fn begin(&mut self, engine: &mut Engine, start: &GameStartEvent) -> Result<Vec<GameEvent>, Rejection> {
        let random_seed = start.random_seed.unwrap_or_else(|| derive_game_seed(&start.game_id));

        if !start.game_settings.pins_board() {
            warn!("Start event for {} leaves board fields unset, using defaults for them", start.game_id);
        }
        let board = start.game_settings.with_pinned_board()?;

        let mut events = engine.dispatch(Action::UpdateSettings(board))?;
        events.extend(engine.dispatch(Action::StartMultiplayerGame { random_seed })?);

        let players = start.players.iter()
            .map(|p| {
                (p.player_id.clone(), PlayerProgress {
                    player_id: p.player_id.clone(),
                    player_name: p.player_name.clone(),
                    score: engine.current_score(),
                    guess_count: 0,
                    hints_used: 0,
                    active: true,
                    sequence: 0,
                })
            })
            .collect();

        self.session = Some(MultiplayerSession {
            game_id: start.game_id.clone(),
            random_seed,
            players,
            start_time: engine.now_ms(),
        });
        self.pulse_sequence = 0;
        self.ranking = None;
        self.last_error = None;

        info!(
            "Joined {} with seed {} (board {})",
            start.game_id,
            random_seed,
            short_hex(&engine.fingerprint()),
        );
        Ok(events)
    }

    /// Report local progress in the background. Returns the pulse sequence.
    pub fn send_pulse(&mut self, engine: &Engine) -> Option<u64> {
        let session = self.session.as_ref()?;
        self.pulse_sequence += 1;
        let game_id = session.game_id.clone();
        let pulse = GamePulse {
            game_id: game_id.clone(),
            player_id: self.profile.player_id.clone(),
            player_name: self.profile.player_name.clone(),
            sequence: self.pulse_sequence,
            score: engine.current_score(),
            guess_count: engine.session().guesses.len() as u32,
            hints_used: engine.state().hints.hints_used(),
            active: engine.session().is_active(),
        };

        let service = self.service.clone();
        let policy = self.policy;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = with_retry(&policy, "send_game_pulse", || {
                let service = service.clone();
                let pulse = pulse.clone();
                async move { service.send_game_pulse(pulse).await }
            })
            .await;
            let update = match result {
                Ok(progress) => RemoteUpdate::Progress { game_id, progress },
                Err(error) => RemoteUpdate::Failed { operation: "send_game_pulse", error },
            };
            let _ = tx.send(update);
        });

        Some(self.pulse_sequence)
    }

    /// Submit final stats in the background, once per game.
    ///
    /// If the service cannot be reached the ranking resolves locally to
    /// this player alone. Returns `false` if nothing was sent.
    pub fn submit_result(&mut self, engine: &Engine) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        if !engine.session().is_over() {
            return false;
        }
        let key = GameResultSubmission::key_for(&session.game_id, &self.profile.device_id);
        if !self.submitted.insert(key.clone()) {
            debug!("Result for {} already submitted", key);
            return false;
        }

        let submission = GameResultSubmission {
            idempotency_key: key,
            game_id: session.game_id.clone(),
            device_id: self.profile.device_id.clone(),
            player_id: self.profile.player_id.clone(),
            player_name: self.profile.player_name.clone(),
            score: engine.session().score,
            guesses: engine.session().guesses.len() as u32,
            time_minutes: engine.session().elapsed_minutes(engine.now_ms()),
            hints_used: engine.state().hints.hints_used(),
            won: engine.session().is_won(),
            board: hex::encode(engine.fingerprint()),
        };

        let service = self.service.clone();
        let policy = self.policy;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = with_retry(&policy, "submit_game_result", || {
                let service = service.clone();
                let submission = submission.clone();
                async move { service.submit_game_result(submission).await }
            })
            .await;
            match result {
                Ok(ranking) => {
                    let _ = tx.send(RemoteUpdate::Ranking(ranking));
                }
                Err(error) => {
                    warn!("Ranking unavailable ({:?}), resolving locally", error.recovery());
                    let fallback = Ranking::from_results(&submission.game_id, [&submission], false);
                    let _ = tx.send(RemoteUpdate::Failed { operation: "submit_game_result", error });
                    let _ = tx.send(RemoteUpdate::Ranking(fallback));
                }
            }
        });

        true
    }

    // =========================================================================
    // MERGING
    // =========================================================================

    /// Merge every update that has arrived, without waiting.
    pub fn drain_updates(&mut self) -> Vec<RemoteUpdate> {
        let mut applied = Vec::new();
        while let Ok(update) = self.rx.try_recv() {
            self.apply(&update);
            applied.push(update);
        }
        applied
    }

    /// Wait for the ranking of the submitted game.
    ///
    /// Returns immediately with whatever is known if no result was submitted.
    pub async fn await_ranking(&mut self) -> Option<Ranking> {
        self.drain_updates();
        let Some(key) = self.idempotency_key() else {
            return self.ranking.clone();
        };
        if !self.submitted.contains(&key) {
            return self.ranking.clone();
        }
        while self.ranking.is_none() {
            match self.rx.recv().await {
                Some(update) => self.apply(&update),
                None => break,
            }
        }
        self.ranking.clone()
    }

    fn apply(&mut self, update: &RemoteUpdate) {
        match update {
            RemoteUpdate::Progress { game_id, progress } => {
                let Some(session) = self.session.as_mut().filter(|s| &s.game_id == game_id) else {
                    debug!("Dropping progress for {}", game_id);
                    return;
                };
                for p in progress {
                    let newer = session.players.get(&p.player_id)
                        .map_or(true, |known| p.sequence > known.sequence);
                    if newer {
                        session.players.insert(p.player_id.clone(), p.clone());
                    }
                }
            }
            RemoteUpdate::Ranking(ranking) => {
                if self.session.as_ref().map_or(true, |s| s.game_id != ranking.game_id) {
                    return;
                }
                let replace = match &self.ranking {
                    None => true,
                    Some(current) => !current.authoritative && ranking.authoritative,
                };
                if replace {
                    info!(
                        "Ranking for {} ({}): {} players",
                        ranking.game_id,
                        if ranking.authoritative { "service" } else { "local" },
                        ranking.entries.len(),
                    );
                    self.ranking = Some(ranking.clone());
                }
            }
            RemoteUpdate::Failed { operation, error } => {
                warn!("{} gave up: {}", operation, error);
                self.last_error = Some(error.clone());
            }
        }
    }
}
