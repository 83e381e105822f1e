//! The per-channel game state machine.
//!
//! A `Game` is single-threaded and event-driven: player commands and timer
//! expiries both arrive as ordinary method calls on `&mut self` and run to
//! completion before the next one. The host drives timers by calling
//! [`Game::tick`] whenever its clock has moved; nothing in here blocks or
//! spawns.

use std::rc::Rc;
use std::time::Duration;

use log::{debug, info, warn};
use rustc_hash::FxHashSet;

use crate::cards::{CardStock, DeckPair};
use crate::core::{GameConfig, GameRng, Identity, Player};
use crate::scoring::Ledger;
use crate::timers::{Clock, TimerKind, TimerScheduler};

use super::format;
use super::sink::MessageSink;
use super::state::{GameState, PauseSnapshot};
use super::table::{Entry, Table};

/// How a player removal should behave.
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoveOptions {
    /// Skip the "has left the game" announcement.
    pub silent: bool,
}

/// Which score listing to announce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreFlavor {
    /// Game start: the target only, no scores yet.
    Start,
    /// Between rounds: current scores plus the target.
    Round,
    /// Game over: final scores.
    Final,
}

/// Countdown warning marks for a phase, announced once each at first
/// crossing. A warning for a wider window than the time actually left is
/// skipped, not announced late.
#[derive(Clone, Copy, Debug, Default)]
struct Countdown {
    announced: [bool; 3],
}

const COUNTDOWN_MARKS: [u64; 3] = [60, 30, 10];

impl Countdown {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// The mark whose window `left` has newly entered, if any.
    fn crossing(&mut self, left: Duration) -> Option<u64> {
        let left = left.as_secs();
        let mut tightest = None;
        for (i, &mark) in COUNTDOWN_MARKS.iter().enumerate() {
            if left <= mark {
                tightest = Some(i);
            }
        }
        let i = tightest?;
        if self.announced[i] {
            return None;
        }
        self.announced[i] = true;
        Some(COUNTDOWN_MARKS[i])
    }
}

/// One running game in one channel.
pub struct Game {
    channel: String,
    config: GameConfig,
    state: GameState,
    round: u32,
    players: Vec<Player>,
    /// Seat of the current czar, kept in step with roster mutations so
    /// rotation survives players leaving. `None` before the first round.
    czar_index: Option<usize>,
    /// Identities kicked from this game; they may not rejoin.
    removed: FxHashSet<Identity>,
    ledger: Ledger,
    calls: DeckPair,
    responses: DeckPair,
    table: Table,
    timers: TimerScheduler,
    rng: GameRng,
    sink: Rc<dyn MessageSink>,
    clock: Rc<dyn Clock>,
    started_at: Duration,
    /// When the current timed phase (play or winner pick) began.
    round_started: Duration,
    pause: Option<PauseSnapshot>,
    turn_countdown: Countdown,
    winner_countdown: Countdown,
}

impl Game {
    /// Create a game in `channel` and announce it. The first player joins
    /// separately via [`Game::add_player`].
    #[must_use]
    pub fn new(
        channel: impl Into<String>,
        config: GameConfig,
        stock: &CardStock,
        seed: u64,
        sink: Rc<dyn MessageSink>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let mut rng = GameRng::new(seed);
        let calls = DeckPair::new("call", stock.calls.clone(), &mut rng);
        let responses = DeckPair::new("response", stock.responses.clone(), &mut rng);
        let now = clock.now();

        let mut game = Self {
            channel: channel.into(),
            state: GameState::Waiting,
            round: 0,
            players: Vec::new(),
            czar_index: None,
            removed: FxHashSet::default(),
            ledger: Ledger::new(),
            calls,
            responses,
            table: Table::default(),
            timers: TimerScheduler::new(),
            rng,
            sink,
            clock,
            started_at: now,
            round_started: now,
            pause: None,
            turn_countdown: Countdown::default(),
            winner_countdown: Countdown::default(),
            config,
        };
        info!("new game in {} with seed {seed}", game.channel);
        game.announce(&format!(
            "A new game is starting! Type .join to take part; the game begins once {} have joined.",
            format::pluralize(game.config.min_players, "player")
        ));
        game.show_points(ScoreFlavor::Start);
        game.timers
            .schedule_once(TimerKind::Wait, now, game.config.wait_timeout);
        game
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Rounds started so far.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// The channel this game runs in.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Currently seated players, in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The seated player with this identity, if any.
    #[must_use]
    pub fn player(&self, identity: &Identity) -> Option<&Player> {
        self.players.iter().find(|p| &p.identity == identity)
    }

    /// The player judging the current round, if one is seated.
    #[must_use]
    pub fn current_czar(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_czar)
    }

    /// The scoring ledger.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Response cards across decks, hands and table entries. Constant for
    /// the lifetime of the game.
    #[must_use]
    pub fn response_cards_total(&self) -> usize {
        self.responses.total()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + self
                .table
                .entries
                .iter()
                .map(|e| e.picks.len())
                .sum::<usize>()
    }

    /// Call cards across the deck and the table. Constant for the lifetime
    /// of the game.
    #[must_use]
    pub fn call_cards_total(&self) -> usize {
        self.calls.total() + usize::from(self.table.question.is_some())
    }

    // ---- roster ----------------------------------------------------------

    /// Seat a player. Joining mid-round is allowed; they are dealt in at the
    /// next round. A previously kicked identity may not return.
    pub fn add_player(&mut self, identity: Identity, nick: impl Into<String>) {
        let nick = nick.into();
        if self.state == GameState::Stopped {
            debug!("{identity} tried to join a stopped game");
            return;
        }
        if self.removed.contains(&identity) {
            info!("{identity} was kicked and tried to rejoin");
            self.notify(&nick, "You have been removed from this game.");
            return;
        }
        if self.index_of(&identity).is_some() {
            debug!("{identity} is already seated");
            return;
        }

        let points = self.ledger.ensure(&identity, &nick);
        if points > 0 {
            debug!("{nick} rejoined with {points} points");
        }
        self.players.push(Player::new(identity, &nick));
        self.announce(&format!("{nick} has joined the game."));

        if self.state != GameState::Waiting {
            return;
        }
        let now = self.now();
        if self.config.wait_from_last_join && self.timers.is_scheduled(TimerKind::Wait) {
            self.timers
                .schedule_once(TimerKind::Wait, now, self.config.wait_timeout);
        }
        let shortfall = self.config.min_players.saturating_sub(self.players.len());
        if shortfall == 0 {
            self.next_round();
        } else if now.saturating_sub(self.started_at) >= self.config.join_announce_after {
            self.announce(&format!(
                "Waiting for {} to join.",
                format::pluralize(shortfall, "more player")
            ));
        }
    }

    /// Unseat a player. Their hand goes to the discard pile; their score
    /// stays in the ledger in case they return.
    pub fn remove_player(&mut self, identity: &Identity, opts: RemoveOptions) {
        let Some(index) = self.index_of(identity) else {
            debug!("{identity} is not seated; ignoring removal");
            return;
        };
        let player = self.players.remove(index);
        let was_czar = player.is_czar;

        if let Some(czar) = self.czar_index {
            if self.players.is_empty() {
                self.czar_index = None;
            } else if index < czar {
                self.czar_index = Some(czar - 1);
            } else if index == czar {
                // Point at the seat before the removed czar so the next
                // rotation lands on the player who was after them.
                self.czar_index = Some((czar + self.players.len() - 1) % self.players.len());
            }
        }
        self.responses.discard.discard_all(player.hand);
        if !opts.silent {
            self.announce(&format!("{} has left the game.", player.nick));
        }

        if self.state == GameState::Stopped {
            return;
        }
        if was_czar && self.state == GameState::Played {
            self.announce("The Card Czar has fled the scene. So I will pick the winner on this round.");
            self.auto_select_winner();
            return;
        }
        if self.players.is_empty() {
            if self.config.stop_on_empty {
                info!("last player left {}; stopping", self.channel);
                self.stop(None);
            }
            return;
        }
        if self.state == GameState::Playable && self.awaiting() == 0 {
            self.show_entries();
        }
    }

    /// Kick `target_nick` and bar the identity from rejoining this game.
    pub fn kick(&mut self, target_nick: &str) {
        match self.players.iter().find(|p| p.nick == target_nick) {
            Some(player) => {
                let identity = player.identity.clone();
                self.removed.insert(identity.clone());
                self.remove_player(&identity, RemoveOptions::default());
            }
            None => self.announce(&format!("{target_nick} is not currently playing.")),
        }
    }

    /// Transport-level departure (quit/part), resolved by nick.
    pub fn player_left(&mut self, nick: &str) {
        if let Some(player) = self.players.iter().find(|p| p.nick == nick) {
            let identity = player.identity.clone();
            self.remove_player(&identity, RemoveOptions::default());
        }
    }

    /// A seated player changed display name.
    pub fn rename_player(&mut self, old_nick: &str, new_nick: &str) {
        if let Some(index) = self.players.iter().position(|p| p.nick == old_nick) {
            self.players[index].nick = new_nick.to_string();
            let identity = self.players[index].identity.clone();
            self.ledger.rename(&identity, new_nick);
        }
    }

    // ---- round flow ------------------------------------------------------

    /// Submit (or change) an entry for the current round. `indices` address
    /// the player's hand as last shown; a pick change addresses the full
    /// hand, exactly as the first submission did.
    pub fn play_card(&mut self, identity: &Identity, indices: &[usize]) {
        let Some(index) = self.index_of(identity) else {
            debug!("{identity} tried to play without being seated");
            return;
        };
        let nick = self.players[index].nick.clone();
        if self.pause.is_some() {
            self.notify(&nick, "Game is currently paused.");
            return;
        }
        if self.state != GameState::Playable {
            self.notify(&nick, "Can't play at the moment.");
            return;
        }
        if self.players[index].is_czar {
            self.notify(
                &nick,
                "You are the Card Czar. You pick the winner after everyone else has played.",
            );
            return;
        }
        if self.players[index].hand.is_empty() {
            self.notify(&nick, "You have no cards to play this round.");
            return;
        }
        let Some(pick) = self.table.question.as_ref().map(|q| q.pick) else {
            warn!("playable state without a question card");
            return;
        };

        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if indices.len() != pick || sorted.len() != indices.len() {
            self.announce(&format!(
                "{nick}: You must pick {}.",
                format::pluralize(pick, "different card")
            ));
            return;
        }

        // Pick change: put the earlier submission back first so the new
        // indices address the same hand layout the player was shown.
        let prior = self.table.entry_position(identity);
        let mut prior_indices = Vec::new();
        if let Some(pos) = prior {
            let mut picks = std::mem::take(&mut self.table.entries[pos].picks);
            prior_indices = picks.iter().map(|(i, _)| *i).collect();
            picks.sort_by_key(|(i, _)| *i);
            for (i, card) in picks {
                self.players[index].hand.insert(i, card);
            }
        }

        let Some(picks) = self.players[index].hand.take_indices(indices) else {
            self.notify(&nick, "Invalid card index.");
            if let Some(pos) = prior {
                let picks = self.players[index]
                    .hand
                    .take_indices(&prior_indices)
                    .expect("prior picks were just restored");
                self.table.entries[pos].picks = picks;
            }
            return;
        };

        let pos = match prior {
            Some(pos) => {
                self.table.entries[pos].picks = picks;
                self.notify(&nick, "Changing your pick...");
                pos
            }
            None => {
                self.table.entries.push(Entry {
                    owner: identity.clone(),
                    picks,
                });
                self.table.entries.len() - 1
            }
        };
        self.players[index].has_played = true;
        self.players[index].inactive_rounds = 0;

        let question = self.table.question.as_ref().expect("question checked above");
        let filled = format::fill_entry(question, &self.table.entries[pos].cards());
        self.notify(&nick, &format!("You played: {filled}"));

        if self.awaiting() == 0 {
            self.show_entries();
        }
    }

    /// The czar picks the winning entry. With `fast_pick`, rejections that
    /// would otherwise be announced are silent, so a shared pick command can
    /// be routed here speculatively.
    pub fn select_winner(&mut self, actor: &Identity, index: usize, fast_pick: bool) {
        let Some(player) = self.player(actor) else {
            debug!("{actor} tried to pick a winner without being seated");
            return;
        };
        let nick = player.nick.clone();
        let is_czar = player.is_czar;
        if self.pause.is_some() {
            if !fast_pick {
                self.announce("Game is currently paused.");
            }
            return;
        }
        if self.state != GameState::Played {
            if !fast_pick {
                self.notify(&nick, "Can't pick a winner at the moment.");
            }
            return;
        }
        if !is_czar {
            if !fast_pick {
                self.announce(&format!(
                    "{nick}: You are not the Card Czar. Only the Card Czar can pick the winning entry."
                ));
            }
            return;
        }
        if index >= self.table.entries.len() {
            self.announce("Invalid winner.");
            return;
        }
        self.award_entry(index);
    }

    /// Suspend play. Timed phases keep their remaining budget for resume.
    pub fn pause(&mut self) {
        match self.state {
            GameState::Paused => {
                self.announce("Game is already paused. Type .resume to begin playing again.");
            }
            GameState::Playable | GameState::Played => {
                self.pause = Some(PauseSnapshot {
                    state: self.state,
                    elapsed: self.now().saturating_sub(self.round_started),
                });
                self.state = GameState::Paused;
                self.timers.cancel(TimerKind::TurnCheck);
                self.timers.cancel(TimerKind::WinnerCheck);
                self.announce("Game is now paused. Type .resume to begin playing again.");
            }
            _ => self.announce("The game cannot be paused right now."),
        }
    }

    /// Resume a user-paused game with the remaining phase time it had.
    pub fn resume(&mut self) {
        let snapshot = match (self.state, self.pause.take()) {
            (GameState::Paused, Some(snapshot)) => snapshot,
            _ => {
                self.announce("The game is not paused.");
                return;
            }
        };
        self.announce("Game has been resumed.");
        let now = self.now();
        self.round_started = now.saturating_sub(snapshot.elapsed);
        self.state = snapshot.state;
        match self.state {
            GameState::Played => {
                if self.current_czar().is_none() {
                    self.announce(
                        "The Card Czar left during the pause. I will pick the winner on this round.",
                    );
                    self.auto_select_winner();
                    return;
                }
                self.timers
                    .schedule_periodic(TimerKind::WinnerCheck, now, self.config.check_interval);
            }
            GameState::Playable => {
                self.timers
                    .schedule_periodic(TimerKind::TurnCheck, now, self.config.check_interval);
            }
            _ => {}
        }
    }

    /// Stop the game for good. Every card returns to a deck and the roster
    /// empties; the game object stays around only to be reaped.
    pub fn stop(&mut self, initiator: Option<&Identity>) {
        if self.state == GameState::Stopped {
            debug!("stop on an already stopped game");
            return;
        }
        self.timers.cancel_all();
        match initiator.and_then(|id| self.player(id)) {
            Some(player) => {
                let nick = player.nick.clone();
                self.announce(&format!("{nick} stopped the game."));
            }
            None => self.announce("Game has been stopped."),
        }
        if self.round >= 2 && !self.ledger.is_empty() {
            self.show_points(ScoreFlavor::Final);
        }
        self.state = GameState::Stopped;

        let mut table = std::mem::take(&mut self.table);
        table.sweep(&mut self.calls.discard, &mut self.responses.discard);
        let players: Vec<Player> = self.players.drain(..).collect();
        for player in players {
            self.responses.discard.discard_all(player.hand);
        }
        self.czar_index = None;
        self.pause = None;
    }

    /// Deliver any timers that have come due. The host calls this whenever
    /// its clock moves; calling it early or often is harmless.
    pub fn tick(&mut self) {
        if self.state == GameState::Stopped {
            return;
        }
        let now = self.now();
        for kind in self.timers.due(now) {
            if self.state == GameState::Stopped {
                break;
            }
            match kind {
                TimerKind::Wait => {
                    self.announce("Not enough players to play a game.");
                    self.stop(None);
                }
                TimerKind::NextRound => self.start_next_round(),
                TimerKind::TurnCheck => self.turn_check(now),
                TimerKind::WinnerCheck => self.winner_check(now),
            }
        }
    }

    // ---- reports ---------------------------------------------------------

    /// Announce what the game is waiting for.
    pub fn show_status(&self) {
        let line = match self.state {
            GameState::Stopped => "Status: Game has been stopped.".to_string(),
            GameState::Paused => "Status: Game is paused.".to_string(),
            GameState::RoundEnd => "Status: Round has ended and the next one is starting.".to_string(),
            GameState::Waiting => format!(
                "Status: Waiting for {} to join.",
                format::pluralize(
                    self.config.min_players.saturating_sub(self.players.len()),
                    "more player"
                )
            ),
            GameState::Played => {
                let czar = self
                    .current_czar()
                    .map_or("the Card Czar", |p| p.nick.as_str());
                format!("Status: Waiting for {czar} to select the winner.")
            }
            GameState::Playable => {
                let czar = self
                    .current_czar()
                    .map_or("the Card Czar", |p| p.nick.as_str());
                let waiting: Vec<&str> = self
                    .players
                    .iter()
                    .filter(|p| !p.is_czar && !p.has_played && !p.hand.is_empty())
                    .map(|p| p.nick.as_str())
                    .collect();
                format!(
                    "Status: {czar} is the Card Czar. Waiting for players to play: {}.",
                    format::join_names(&waiting)
                )
            }
        };
        self.announce(&line);
    }

    /// Announce scores and/or the point target.
    pub fn show_points(&self, flavor: ScoreFlavor) {
        let listing: Vec<String> = self
            .ledger
            .scores()
            .map(|(nick, points)| format!("{nick}: {points}"))
            .collect();
        match flavor {
            ScoreFlavor::Start => {}
            ScoreFlavor::Round => {
                if !listing.is_empty() {
                    self.announce(&format!("Current scores: {}.", listing.join(", ")));
                }
            }
            ScoreFlavor::Final => {
                if !listing.is_empty() {
                    self.announce(&format!("Final scores: {}.", listing.join(", ")));
                }
                return;
            }
        }
        if self.config.point_limit > 0 {
            self.announce(&format!("Needed to win: {}.", self.config.point_limit));
        }
    }

    /// Privately show a player their hand.
    pub fn show_cards(&self, identity: &Identity) {
        let Some(player) = self.player(identity) else {
            return;
        };
        if player.is_czar {
            self.notify(
                &player.nick,
                "You are the Card Czar. Waiting for the other players to play.",
            );
            return;
        }
        if player.hand.is_empty() {
            self.notify(&player.nick, "You have no cards.");
            return;
        }
        let listing: Vec<String> = player
            .hand
            .iter()
            .enumerate()
            .map(|(i, card)| format!("[{i}] {}", card.text[0]))
            .collect();
        self.notify(&player.nick, &format!("Your cards are: {}", listing.join(" ")));
    }

    /// Announce who is seated.
    pub fn list_players(&self) {
        if self.players.is_empty() {
            self.announce("No players have joined the game yet.");
            return;
        }
        let names: Vec<&str> = self.players.iter().map(|p| p.nick.as_str()).collect();
        self.announce(&format!(
            "Players currently in the game: {}.",
            format::join_names(&names)
        ));
    }

    // ---- internals -------------------------------------------------------

    fn announce(&self, text: &str) {
        self.sink.announce(&self.channel, text);
    }

    fn notify(&self, nick: &str, text: &str) {
        self.sink.notify(nick, text);
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn index_of(&self, identity: &Identity) -> Option<usize> {
        self.players.iter().position(|p| &p.identity == identity)
    }

    /// Players whose entry the round is still waiting on. Players already
    /// marked inactive do not hold the round open.
    fn awaiting(&self) -> usize {
        self.players
            .iter()
            .filter(|p| {
                !p.is_czar && !p.has_played && !p.hand.is_empty() && p.inactive_rounds == 0
            })
            .count()
    }

    /// Schedule the next round, or end/idle the game if scores or the
    /// roster say so.
    fn next_round(&mut self) {
        self.timers.cancel(TimerKind::Wait);
        if self.end_game() {
            return;
        }
        if self.need_players() > 0 {
            return;
        }
        self.state = GameState::Paused;
        self.pause = None;
        if self.round == 0 {
            let names: Vec<&str> = self.players.iter().map(|p| p.nick.as_str()).collect();
            self.announce(&format!(
                "Starting in {} seconds. {} get ready!",
                self.config.time_between_rounds.as_secs(),
                format::join_names(&names)
            ));
        } else {
            self.show_points(ScoreFlavor::Round);
        }
        let now = self.now();
        self.timers
            .schedule_once(TimerKind::NextRound, now, self.config.time_between_rounds);
    }

    /// The pre-round pause elapsed: rotate the czar, deal, play a question.
    fn start_next_round(&mut self) {
        if self.state != GameState::Paused || self.pause.is_some() {
            debug!("next-round timer fired in {:?}", self.state);
            return;
        }
        if self.config.min_players > self.players.len() {
            // Players left during the pre-round pause.
            self.need_players();
            return;
        }
        self.round += 1;
        self.rotate_czar();
        if !self.deal() {
            return;
        }
        let czar = self
            .current_czar()
            .map(|p| p.nick.clone())
            .unwrap_or_default();
        self.announce(&format!("Round {}! {czar} is the Card Czar.", self.round));
        if !self.play_question() {
            return;
        }
        self.state = GameState::Playable;
        for i in 0..self.players.len() {
            if !self.players[i].is_czar {
                let identity = self.players[i].identity.clone();
                self.show_cards(&identity);
            }
        }
    }

    fn rotate_czar(&mut self) {
        let len = self.players.len();
        debug_assert!(len > 0, "rotating the czar with an empty roster");
        let next = match self.czar_index {
            Some(index) => (index + 1) % len,
            // Round one: the second player to join judges first.
            None => 1 % len,
        };
        for player in &mut self.players {
            player.is_czar = false;
        }
        self.players[next].is_czar = true;
        self.czar_index = Some(next);
    }

    /// Top every hand up to the configured size. Stops the game on deck
    /// exhaustion.
    fn deal(&mut self) -> bool {
        for i in 0..self.players.len() {
            let need = self
                .config
                .hand_size
                .saturating_sub(self.players[i].hand.len());
            if need == 0 {
                continue;
            }
            match self.responses.draw(need, &mut self.rng) {
                Ok(cards) => {
                    let identity = self.players[i].identity.clone();
                    for mut card in cards {
                        card.owner = Some(identity.clone());
                        self.players[i].hand.add(card);
                    }
                }
                Err(err) => {
                    warn!("cannot deal in {}: {err}", self.channel);
                    self.announce("Not enough response cards to deal. Stopping the game.");
                    self.stop(None);
                    return false;
                }
            }
        }
        true
    }

    /// Draw and announce the round's question, handle its draw marker and
    /// start the play-phase timer.
    fn play_question(&mut self) -> bool {
        let question = match self.calls.draw(1, &mut self.rng) {
            Ok(mut cards) => cards.pop().expect("draw(1) yields one card"),
            Err(err) => {
                warn!("out of question cards in {}: {err}", self.channel);
                self.announce("Not enough question cards to continue. Stopping the game.");
                self.stop(None);
                return false;
            }
        };
        self.announce(&format::question_line(&question));
        let draw = question.draw;
        self.table.question = Some(question);

        if draw > 0 {
            for i in 0..self.players.len() {
                match self.responses.draw(draw, &mut self.rng) {
                    Ok(cards) => {
                        let identity = self.players[i].identity.clone();
                        for mut card in cards {
                            card.owner = Some(identity.clone());
                            self.players[i].hand.add(card);
                        }
                    }
                    Err(err) => {
                        warn!("cannot honor draw marker in {}: {err}", self.channel);
                        self.announce("Not enough response cards to deal. Stopping the game.");
                        self.stop(None);
                        return false;
                    }
                }
            }
        }

        let now = self.now();
        self.round_started = now;
        self.turn_countdown.reset();
        self.timers
            .schedule_periodic(TimerKind::TurnCheck, now, self.config.check_interval);
        true
    }

    /// Close the play phase and hand the round to the czar.
    fn show_entries(&mut self) {
        self.timers.cancel(TimerKind::TurnCheck);
        self.state = GameState::Played;

        if self.table.entries.is_empty() {
            self.announce("No one played on this round.");
            self.clean_round();
            if self.state != GameState::Stopped {
                self.next_round();
            }
            return;
        }
        if self.table.entries.len() == 1 {
            self.announce("Only one player played and is the winner by default.");
            self.award_entry(0);
            return;
        }

        self.announce("Everyone has played. Here are the entries:");
        let question = self.table.question.clone().expect("round has a question");
        for (i, entry) in self.table.entries.iter().enumerate() {
            let line = format!("{i}: {}", format::fill_entry(&question, &entry.cards()));
            self.sink.announce(&self.channel, &line);
        }

        match self.current_czar() {
            Some(czar) => {
                let nick = czar.nick.clone();
                self.announce(&format!("{nick}: Select the winner (.winner <entry number>)"));
                let now = self.now();
                self.round_started = now;
                self.winner_countdown.reset();
                self.timers
                    .schedule_periodic(TimerKind::WinnerCheck, now, self.config.check_interval);
            }
            None => {
                self.announce("The Card Czar is gone. I will pick the winner on this round.");
                self.auto_select_winner();
            }
        }
    }

    fn auto_select_winner(&mut self) {
        if self.table.entries.is_empty() {
            self.clean_round();
            if self.state != GameState::Stopped {
                self.next_round();
            }
            return;
        }
        let index = self.rng.gen_range(0..self.table.entries.len());
        self.award_entry(index);
    }

    /// Award a round to the entry at `index` and move on.
    fn award_entry(&mut self, index: usize) {
        self.timers.cancel(TimerKind::WinnerCheck);
        self.state = GameState::RoundEnd;

        let entry = &self.table.entries[index];
        let winner = entry.owner.clone();
        let question = self.table.question.clone().expect("round has a question");
        let filled = format::fill_entry(&question, &entry.cards());
        let nick = self
            .player(&winner)
            .map(|p| p.nick.clone())
            .or_else(|| self.ledger.nick_of(&winner).map(String::from))
            .unwrap_or_else(|| winner.user.clone());

        let total = self.ledger.award(&winner, 1);
        let streak = self.ledger.update_streak(&winner);
        self.announce(&format!(
            "Winner is: {nick} with \"{filled}\"! {nick} now has {}.",
            format::pluralize(total as usize, "awesome point")
        ));
        if streak >= 2 {
            self.announce(&format!("{nick} is on a {streak}-round winning streak!"));
        }

        self.clean_round();
        if self.state != GameState::Stopped {
            self.next_round();
        }
    }

    /// Sweep the table, reset per-round flags and drop idle players.
    fn clean_round(&mut self) {
        let mut table = std::mem::take(&mut self.table);
        table.sweep(&mut self.calls.discard, &mut self.responses.discard);
        for player in &mut self.players {
            player.reset_round();
        }

        if self.config.max_idle_rounds > 0 {
            let idle: Vec<(Identity, String)> = self
                .players
                .iter()
                .filter(|p| p.inactive_rounds >= self.config.max_idle_rounds)
                .map(|p| (p.identity.clone(), p.nick.clone()))
                .collect();
            if !idle.is_empty() {
                let names: Vec<&str> = idle.iter().map(|(_, nick)| nick.as_str()).collect();
                self.announce(&format!(
                    "Removing inactive players: {}.",
                    format::join_names(&names)
                ));
                for (identity, _) in &idle {
                    self.remove_player(identity, RemoveOptions { silent: true });
                }
            }
        }

        if self.state != GameState::Stopped {
            self.state = GameState::Waiting;
        }
    }

    /// If the roster is short, announce it, arm the wait timeout and stay
    /// in `Waiting`. Returns the shortfall.
    fn need_players(&mut self) -> usize {
        let shortfall = self.config.min_players.saturating_sub(self.players.len());
        if shortfall > 0 {
            let now = self.now();
            self.state = GameState::Waiting;
            self.timers
                .schedule_once(TimerKind::Wait, now, self.config.wait_timeout);
            if self.round >= 1 {
                self.announce(&format!(
                    "Need {} to start the next round.",
                    format::pluralize(shortfall, "more player")
                ));
                self.show_points(ScoreFlavor::Round);
            }
        }
        shortfall
    }

    /// Stop the game if someone has reached the point target.
    fn end_game(&mut self) -> bool {
        let Some(winner) = self.ledger.check_winner(self.config.point_limit) else {
            return false;
        };
        let nick = winner.nick.clone();
        let points = winner.points;
        self.announce(&format!(
            "{nick} has reached {} and is the winner of the game! Congratulations, {nick}!",
            format::pluralize(points as usize, "awesome point")
        ));
        self.stop(None);
        true
    }

    /// Play-phase timer: countdown warnings, then expiry.
    fn turn_check(&mut self, now: Duration) {
        if self.state != GameState::Playable {
            warn!("turn check fired in {:?}", self.state);
            self.timers.cancel(TimerKind::TurnCheck);
            return;
        }
        let elapsed = now.saturating_sub(self.round_started);
        if elapsed >= self.config.time_limit {
            self.announce("Time is up!");
            for player in &mut self.players {
                if !player.is_czar && !player.has_played && !player.hand.is_empty() {
                    player.inactive_rounds += 1;
                }
            }
            self.show_entries();
            return;
        }
        if let Some(mark) = self.turn_countdown.crossing(self.config.time_limit - elapsed) {
            match mark {
                60 => {
                    self.announce("Hurry up, 1 minute left!");
                    self.show_status();
                }
                30 => self.announce("30 seconds left!"),
                _ => self.announce("10 seconds left!"),
            }
        }
    }

    /// Winner-pick timer: countdown warnings addressed to the czar, then a
    /// random pick on expiry.
    fn winner_check(&mut self, now: Duration) {
        if self.state != GameState::Played {
            warn!("winner check fired in {:?}", self.state);
            self.timers.cancel(TimerKind::WinnerCheck);
            return;
        }
        let elapsed = now.saturating_sub(self.round_started);
        if elapsed >= self.config.time_limit {
            self.announce("Time is up. I will pick the winner on this round.");
            if let Some(index) = self.players.iter().position(|p| p.is_czar) {
                self.players[index].inactive_rounds += 1;
            }
            self.auto_select_winner();
            return;
        }
        let czar = self
            .current_czar()
            .map(|p| p.nick.clone())
            .unwrap_or_default();
        if let Some(mark) = self
            .winner_countdown
            .crossing(self.config.time_limit - elapsed)
        {
            match mark {
                60 => self.announce(&format!("{czar}: Hurry up, 1 minute left!")),
                30 => self.announce(&format!("{czar}: 30 seconds left!")),
                _ => self.announce(&format!("{czar}: 10 seconds left!")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, CardStock};
    use crate::engine::sink::MemorySink;
    use crate::timers::ManualClock;

    const CHANNEL: &str = "#games";

    fn stock() -> CardStock {
        CardStock {
            calls: (0..12)
                .map(|i| Card::call([format!("Q{i} "), String::new()], 0))
                .collect(),
            responses: (0..80).map(|i| Card::response(format!("R{i}"))).collect(),
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            min_players: 3,
            time_between_rounds: Duration::from_secs(10),
            ..GameConfig::default()
        }
    }

    fn setup() -> (Game, Rc<MemorySink>, Rc<ManualClock>) {
        let sink = Rc::new(MemorySink::new());
        let clock = Rc::new(ManualClock::new());
        let game = Game::new(
            CHANNEL,
            config(),
            &stock(),
            7,
            sink.clone(),
            clock.clone(),
        );
        (game, sink, clock)
    }

    fn id(user: &str) -> Identity {
        Identity::new(user, "host")
    }

    fn join_three(game: &mut Game) {
        game.add_player(id("a"), "Alice");
        game.add_player(id("b"), "Bob");
        game.add_player(id("c"), "Carol");
    }

    fn start_round(game: &mut Game, clock: &ManualClock) {
        clock.advance(Duration::from_secs(10));
        game.tick();
    }

    fn non_czar_ids(game: &Game) -> Vec<Identity> {
        game.players()
            .iter()
            .filter(|p| !p.is_czar)
            .map(|p| p.identity.clone())
            .collect()
    }

    #[test]
    fn test_countdown_announces_each_mark_once() {
        let mut countdown = Countdown::default();

        assert_eq!(countdown.crossing(Duration::from_secs(70)), None);
        assert_eq!(countdown.crossing(Duration::from_secs(55)), Some(60));
        assert_eq!(countdown.crossing(Duration::from_secs(45)), None);
        assert_eq!(countdown.crossing(Duration::from_secs(25)), Some(30));
        assert_eq!(countdown.crossing(Duration::from_secs(8)), Some(10));
        assert_eq!(countdown.crossing(Duration::from_secs(2)), None);
    }

    #[test]
    fn test_countdown_skips_stale_marks() {
        let mut countdown = Countdown::default();

        // First check already inside the tightest window: wider marks are
        // never announced afterwards.
        assert_eq!(countdown.crossing(Duration::from_secs(9)), Some(10));
        assert_eq!(countdown.crossing(Duration::from_secs(5)), None);
    }

    #[test]
    fn test_quorum_starts_the_first_round() {
        let (mut game, sink, clock) = setup();

        join_three(&mut game);
        assert_eq!(game.state(), GameState::Paused);
        assert!(sink.channel_contains(CHANNEL, "Starting in 10 seconds."));

        start_round(&mut game, &clock);
        assert_eq!(game.state(), GameState::Playable);
        assert_eq!(game.round(), 1);
        // The second player to join judges the first round.
        assert_eq!(game.current_czar().unwrap().nick, "Bob");
        assert!(sink.channel_contains(CHANNEL, "Round 1! Bob is the Card Czar."));
    }

    #[test]
    fn test_all_entries_in_hands_round_to_czar() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        for identity in non_czar_ids(&game) {
            game.play_card(&identity, &[0]);
        }

        assert_eq!(game.state(), GameState::Played);
        assert!(sink.channel_contains(CHANNEL, "Everyone has played. Here are the entries:"));
        assert!(sink.channel_contains(CHANNEL, "Bob: Select the winner"));
    }

    #[test]
    fn test_repick_replaces_entry_in_place() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        let players = non_czar_ids(&game);
        game.play_card(&players[0], &[2]);
        game.play_card(&players[0], &[2]);

        let nick = game.player(&players[0]).unwrap().nick.clone();
        assert!(sink
            .private_texts(&nick)
            .iter()
            .any(|t| t == "Changing your pick..."));
        // Still one entry, still one card short of a full hand.
        assert_eq!(game.state(), GameState::Playable);
        assert_eq!(game.player(&players[0]).unwrap().hand.len(), 9);
    }

    #[test]
    fn test_wrong_pick_count_is_announced_publicly() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        let players = non_czar_ids(&game);
        game.play_card(&players[0], &[0, 1]);

        let nick = game.player(&players[0]).unwrap().nick.clone();
        assert!(sink.channel_contains(CHANNEL, &format!("{nick}: You must pick 1 different card.")));
        assert_eq!(game.player(&players[0]).unwrap().hand.len(), 10);
    }

    #[test]
    fn test_czar_cannot_play_a_card() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        let czar = game.current_czar().unwrap().identity.clone();
        game.play_card(&czar, &[0]);

        assert!(sink
            .private_texts("Bob")
            .iter()
            .any(|t| t.contains("You are the Card Czar")));
        assert_eq!(game.player(&czar).unwrap().hand.len(), 10);
    }

    #[test]
    fn test_winner_award_and_next_round() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        let players = non_czar_ids(&game);
        for identity in &players {
            game.play_card(identity, &[0]);
        }
        let czar = game.current_czar().unwrap().identity.clone();
        game.select_winner(&czar, 0, false);

        assert!(sink.channel_contains(CHANNEL, "Winner is:"));
        assert!(sink.channel_contains(CHANNEL, "1 awesome point"));
        assert!(sink.channel_contains(CHANNEL, "Current scores:"));
        // Pre-round pause before round two.
        assert_eq!(game.state(), GameState::Paused);

        start_round(&mut game, &clock);
        assert_eq!(game.round(), 2);
        // Rotation advances one seat.
        assert_eq!(game.current_czar().unwrap().nick, "Carol");
    }

    #[test]
    fn test_turn_expiry_marks_inactive_players() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        let players = non_czar_ids(&game);
        game.play_card(&players[0], &[0]);

        clock.advance(Duration::from_secs(120));
        game.tick();

        assert!(sink.channel_contains(CHANNEL, "Time is up!"));
        assert_eq!(game.player(&players[1]).unwrap().inactive_rounds, 1);
        assert_eq!(game.player(&players[0]).unwrap().inactive_rounds, 0);
    }

    #[test]
    fn test_removed_czar_rotation_continues_from_successor() {
        let (mut game, _sink, clock) = setup();
        game.add_player(id("a"), "Alice");
        game.add_player(id("b"), "Bob");
        game.add_player(id("c"), "Carol");
        game.add_player(id("d"), "Dave");
        start_round(&mut game, &clock);
        assert_eq!(game.current_czar().unwrap().nick, "Bob");

        game.remove_player(&id("b"), RemoveOptions::default());

        // Entries from the two remaining non-czar seats close the round.
        for identity in non_czar_ids(&game) {
            game.play_card(&identity, &[0]);
        }
        // Czar gone: a winner was auto-picked and the next round scheduled.
        assert_eq!(game.state(), GameState::Paused);

        start_round(&mut game, &clock);
        assert_eq!(game.round(), 2);
        assert_eq!(game.current_czar().unwrap().nick, "Carol");
    }

    #[test]
    fn test_card_multiset_is_conserved() {
        let (mut game, _sink, clock) = setup();
        let responses_before = game.response_cards_total();
        let calls_before = game.call_cards_total();

        join_three(&mut game);
        start_round(&mut game, &clock);
        for identity in non_czar_ids(&game) {
            game.play_card(&identity, &[0]);
        }
        let czar = game.current_czar().unwrap().identity.clone();
        game.select_winner(&czar, 1, false);

        assert_eq!(game.response_cards_total(), responses_before);
        assert_eq!(game.call_cards_total(), calls_before);
    }

    #[test]
    fn test_pause_preserves_remaining_time() {
        let (mut game, sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        clock.advance(Duration::from_secs(100));
        game.tick();
        game.pause();
        assert_eq!(game.state(), GameState::Paused);

        // A long pause does not consume play time.
        clock.advance(Duration::from_secs(500));
        game.tick();
        assert_eq!(game.state(), GameState::Paused);

        game.resume();
        assert_eq!(game.state(), GameState::Playable);
        clock.advance(Duration::from_secs(19));
        game.tick();
        assert_eq!(game.state(), GameState::Playable);
        clock.advance(Duration::from_secs(1));
        game.tick();
        assert!(sink.channel_contains(CHANNEL, "Time is up!"));
    }

    #[test]
    fn test_wait_timeout_stops_an_underfilled_game() {
        let (mut game, sink, clock) = setup();
        game.add_player(id("a"), "Alice");

        clock.advance(Duration::from_secs(180));
        game.tick();

        assert_eq!(game.state(), GameState::Stopped);
        assert!(sink.channel_contains(CHANNEL, "Not enough players to play a game."));
        assert!(sink.channel_contains(CHANNEL, "Game has been stopped."));
    }

    #[test]
    fn test_kicked_identity_cannot_rejoin() {
        let (mut game, sink, _clock) = setup();
        game.add_player(id("a"), "Alice");
        game.add_player(id("b"), "Bob");

        game.kick("Bob");
        assert!(game.player(&id("b")).is_none());
        assert!(sink.channel_contains(CHANNEL, "Bob has left the game."));

        game.add_player(id("b"), "Bob");
        assert!(game.player(&id("b")).is_none());
        assert!(sink
            .private_texts("Bob")
            .iter()
            .any(|t| t.contains("removed from this game")));
    }

    #[test]
    fn test_score_survives_leave_and_rejoin() {
        let (mut game, _sink, clock) = setup();
        join_three(&mut game);
        start_round(&mut game, &clock);

        let players = non_czar_ids(&game);
        for identity in &players {
            game.play_card(identity, &[0]);
        }
        let czar = game.current_czar().unwrap().identity.clone();
        game.select_winner(&czar, 0, false);
        let winner = game.ledger().scores().find(|(_, p)| *p == 1).unwrap();
        let winner_nick = winner.0.to_string();
        let winner_id = players
            .iter()
            .find(|i| game.player(i).map(|p| p.nick.as_str()) == Some(winner_nick.as_str()))
            .unwrap()
            .clone();

        game.remove_player(&winner_id, RemoveOptions::default());
        game.add_player(winner_id.clone(), "Reborn");

        assert_eq!(game.ledger().points(&winner_id), 1);
    }

    #[test]
    fn test_point_limit_ends_the_game() {
        let sink = Rc::new(MemorySink::new());
        let clock = Rc::new(ManualClock::new());
        let mut game = Game::new(
            CHANNEL,
            config().with_point_limit(1),
            &stock(),
            7,
            sink.clone(),
            clock.clone(),
        );
        join_three(&mut game);
        start_round(&mut game, &clock);

        for identity in non_czar_ids(&game) {
            game.play_card(&identity, &[0]);
        }
        let czar = game.current_czar().unwrap().identity.clone();
        game.select_winner(&czar, 0, false);

        assert_eq!(game.state(), GameState::Stopped);
        assert!(sink.channel_contains(CHANNEL, "is the winner of the game!"));
        assert!(sink.channel_contains(CHANNEL, "Game has been stopped."));
    }
}
