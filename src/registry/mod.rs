//! Channel-to-game registry.
//!
//! `Games` owns every running [`Game`], keyed by channel, and routes host
//! commands and transport events to the right one. Channels are fully
//! independent; an identity can sit in several games at once. Stopped games
//! are reaped lazily, so a channel can start fresh immediately after a stop.

use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::cards::CardStock;
use crate::core::{GameConfig, GameRng, Identity};
use crate::decks::{DeckInfo, DeckInfoError, DeckInfoProvider};
use crate::engine::{Game, GameState, MessageSink, RemoveOptions, ScoreFlavor};
use crate::timers::Clock;

/// All games a host is running.
pub struct Games {
    games: FxHashMap<String, Game>,
    config: GameConfig,
    stock: CardStock,
    sink: Rc<dyn MessageSink>,
    clock: Rc<dyn Clock>,
    /// Hands out a fresh seed per game so channels do not share a stream.
    seeder: GameRng,
    deck_info: Option<Rc<dyn DeckInfoProvider>>,
}

impl Games {
    /// Create a registry. `seed` makes every game it starts deterministic.
    #[must_use]
    pub fn new(
        config: GameConfig,
        stock: CardStock,
        sink: Rc<dyn MessageSink>,
        clock: Rc<dyn Clock>,
        seed: u64,
    ) -> Self {
        Self {
            games: FxHashMap::default(),
            config,
            stock,
            sink,
            clock,
            seeder: GameRng::new(seed),
            deck_info: None,
        }
    }

    /// Resolve deck lookups inline with this provider.
    #[must_use]
    pub fn with_deck_info_provider(mut self, provider: Rc<dyn DeckInfoProvider>) -> Self {
        self.deck_info = Some(provider);
        self
    }

    /// Is a game running in `channel`?
    #[must_use]
    pub fn has_game(&self, channel: &str) -> bool {
        self.games
            .get(channel)
            .is_some_and(|g| g.state() != GameState::Stopped)
    }

    /// The game in `channel`, if one is running.
    #[must_use]
    pub fn game(&self, channel: &str) -> Option<&Game> {
        self.games
            .get(channel)
            .filter(|g| g.state() != GameState::Stopped)
    }

    /// Number of running games.
    #[must_use]
    pub fn game_count(&self) -> usize {
        self.games
            .values()
            .filter(|g| g.state() != GameState::Stopped)
            .count()
    }

    // ---- commands --------------------------------------------------------

    /// Start a game in `channel` with the requester seated first.
    pub fn start(
        &mut self,
        channel: &str,
        identity: &Identity,
        nick: &str,
        point_limit: Option<i32>,
    ) {
        self.reap(channel);
        if let Some(game) = self.games.get(channel) {
            if game.player(identity).is_some() {
                self.sink
                    .announce(channel, "You are already in the current game.");
            } else {
                self.sink.announce(
                    channel,
                    "A game is already running. Type .join to join the game.",
                );
            }
            return;
        }
        let config = match point_limit {
            Some(limit) => self.config.clone().with_point_limit(limit),
            None => self.config.clone(),
        };
        let seed = self.seeder.next_seed();
        let mut game = Game::new(
            channel,
            config,
            &self.stock,
            seed,
            self.sink.clone(),
            self.clock.clone(),
        );
        game.add_player(identity.clone(), nick);
        self.games.insert(channel.to_string(), game);
    }

    /// Join the game in `channel`, starting one if none is running.
    pub fn join(&mut self, channel: &str, identity: &Identity, nick: &str) {
        self.reap(channel);
        match self.games.get_mut(channel) {
            Some(game) => game.add_player(identity.clone(), nick),
            None => self.start(channel, identity, nick, None),
        }
    }

    /// Leave the game in `channel`.
    pub fn quit(&mut self, channel: &str, identity: &Identity) {
        match self.game_mut(channel) {
            Some(game) => game.remove_player(identity, RemoveOptions::default()),
            None => self.no_game(channel),
        }
        self.reap(channel);
    }

    /// Kick `target_nick` out of the game in `channel` for good.
    pub fn kick(&mut self, channel: &str, target_nick: &str) {
        match self.game_mut(channel) {
            Some(game) => game.kick(target_nick),
            None => self.no_game(channel),
        }
        self.reap(channel);
    }

    /// Submit cards for the current round.
    pub fn play(&mut self, channel: &str, identity: &Identity, indices: &[usize]) {
        match self.game_mut(channel) {
            Some(game) => game.play_card(identity, indices),
            None => self.no_game(channel),
        }
    }

    /// Pick the winning entry.
    pub fn winner(&mut self, channel: &str, identity: &Identity, index: usize) {
        match self.game_mut(channel) {
            Some(game) => game.select_winner(identity, index, false),
            None => self.no_game(channel),
        }
        self.reap(channel);
    }

    /// State-routed shorthand: plays cards while answers are open, picks the
    /// winner while the czar is choosing. With `fast_pick`, a pick that is
    /// not currently available is dropped silently, so hosts can route a
    /// bare number here without spamming the channel.
    pub fn pick(&mut self, channel: &str, identity: &Identity, args: &[usize], fast_pick: bool) {
        let Some(game) = self.game_mut(channel) else {
            if !fast_pick {
                self.no_game(channel);
            }
            return;
        };
        match game.state() {
            GameState::Played => match args.first() {
                Some(&index) => game.select_winner(identity, index, fast_pick),
                None => {
                    if !fast_pick {
                        self.sink.announce(channel, "Invalid winner.");
                    }
                }
            },
            GameState::Playable => game.play_card(identity, args),
            _ => {
                if !fast_pick {
                    self.sink.announce(channel, "Can't pick at the moment.");
                }
            }
        }
        self.reap(channel);
    }

    /// Pause the game in `channel`.
    pub fn pause(&mut self, channel: &str) {
        match self.game_mut(channel) {
            Some(game) => game.pause(),
            None => self.no_game(channel),
        }
    }

    /// Resume the game in `channel`.
    pub fn resume(&mut self, channel: &str) {
        match self.game_mut(channel) {
            Some(game) => game.resume(),
            None => self.no_game(channel),
        }
        self.reap(channel);
    }

    /// Stop the game in `channel`.
    pub fn stop(&mut self, channel: &str, identity: &Identity) {
        match self.game_mut(channel) {
            Some(game) => game.stop(Some(identity)),
            None => self.no_game(channel),
        }
        self.reap(channel);
    }

    /// Announce what the game in `channel` is waiting for.
    pub fn status(&mut self, channel: &str) {
        match self.game_mut(channel) {
            Some(game) => game.show_status(),
            None => self.no_game(channel),
        }
    }

    /// Announce current scores and the point target.
    pub fn points(&mut self, channel: &str) {
        match self.game_mut(channel) {
            Some(game) => game.show_points(ScoreFlavor::Round),
            None => self.no_game(channel),
        }
    }

    /// Privately re-show a player their hand.
    pub fn cards(&mut self, channel: &str, identity: &Identity) {
        match self.game_mut(channel) {
            Some(game) => game.show_cards(identity),
            None => self.no_game(channel),
        }
    }

    /// Announce who is seated in `channel`.
    pub fn list(&mut self, channel: &str) {
        match self.game_mut(channel) {
            Some(game) => game.list_players(),
            None => self.no_game(channel),
        }
    }

    /// Look up a deck by code with the configured provider.
    pub fn deck_info(&mut self, channel: &str, nick: &str, code: &str) {
        let Some(provider) = self.deck_info.clone() else {
            self.sink.notify(nick, "Deck lookups are not available.");
            return;
        };
        let result = provider.fetch(code);
        self.deck_info_resolved(channel, nick, code, result);
    }

    /// Deliver the outcome of a deck lookup the host resolved itself.
    pub fn deck_info_resolved(
        &mut self,
        channel: &str,
        nick: &str,
        code: &str,
        result: Result<DeckInfo, DeckInfoError>,
    ) {
        match result {
            Ok(info) => self.sink.announce(channel, &info.summary()),
            Err(err) => self
                .sink
                .notify(nick, &format!("Error fetching deck {code}: {err}")),
        }
    }

    // ---- transport events ------------------------------------------------

    /// `nick` left one channel.
    pub fn player_left(&mut self, channel: &str, nick: &str) {
        if let Some(game) = self.game_mut(channel) {
            game.player_left(nick);
        }
        self.reap(channel);
    }

    /// `nick` disconnected entirely: leaves every game they were in.
    pub fn player_quit(&mut self, nick: &str) {
        for game in self.games.values_mut() {
            game.player_left(nick);
        }
        self.reap_all();
    }

    /// `identity` reappeared in `channel` (rejoined the room, not the game).
    /// If they have standing points in a running game, remind them privately.
    pub fn player_rejoined(&mut self, channel: &str, identity: &Identity, nick: &str) {
        let Some(game) = self.game_mut(channel) else {
            return;
        };
        let seated = game.player(identity).is_some();
        let points = game.ledger().points(identity);
        if !seated && points > 0 {
            self.sink.notify(
                nick,
                &format!("A game is in progress in {channel}. Type .join to get back in; you have {points} points."),
            );
        }
    }

    /// `old_nick` is now `new_nick`, everywhere.
    pub fn player_renamed(&mut self, old_nick: &str, new_nick: &str) {
        for game in self.games.values_mut() {
            game.rename_player(old_nick, new_nick);
        }
    }

    /// Drive timers in every game and reap any that stopped.
    pub fn tick(&mut self) {
        for game in self.games.values_mut() {
            game.tick();
        }
        self.reap_all();
    }

    // ---- internals -------------------------------------------------------

    fn game_mut(&mut self, channel: &str) -> Option<&mut Game> {
        self.games
            .get_mut(channel)
            .filter(|g| g.state() != GameState::Stopped)
    }

    fn no_game(&self, channel: &str) {
        self.sink
            .announce(channel, "No game running. Start the game by typing .start.");
    }

    fn reap(&mut self, channel: &str) {
        if self
            .games
            .get(channel)
            .is_some_and(|g| g.state() == GameState::Stopped)
        {
            debug!("reaping stopped game in {channel}");
            self.games.remove(channel);
        }
    }

    fn reap_all(&mut self) {
        self.games.retain(|channel, game| {
            let keep = game.state() != GameState::Stopped;
            if !keep {
                debug!("reaping stopped game in {channel}");
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cards::Card;
    use crate::decks::StaticDeckInfoProvider;
    use crate::engine::MemorySink;
    use crate::timers::ManualClock;

    fn stock() -> CardStock {
        CardStock {
            calls: (0..12)
                .map(|i| Card::call([format!("Q{i} "), String::new()], 0))
                .collect(),
            responses: (0..80).map(|i| Card::response(format!("R{i}"))).collect(),
        }
    }

    fn setup() -> (Games, Rc<MemorySink>, Rc<ManualClock>) {
        let sink = Rc::new(MemorySink::new());
        let clock = Rc::new(ManualClock::new());
        let games = Games::new(
            GameConfig::default(),
            stock(),
            sink.clone(),
            clock.clone(),
            99,
        );
        (games, sink, clock)
    }

    fn id(user: &str) -> Identity {
        Identity::new(user, "host")
    }

    #[test]
    fn test_commands_without_a_game_say_so() {
        let (mut games, sink, _clock) = setup();

        games.status("#a");
        games.play("#a", &id("a"), &[0]);

        assert_eq!(
            sink.channel_texts("#a"),
            vec![
                "No game running. Start the game by typing .start.",
                "No game running. Start the game by typing .start."
            ]
        );
    }

    #[test]
    fn test_fast_pick_is_silent_without_a_game() {
        let (mut games, sink, _clock) = setup();

        games.pick("#a", &id("a"), &[0], true);
        assert!(sink.messages().is_empty());

        games.pick("#a", &id("a"), &[0], false);
        assert!(sink.channel_contains("#a", "No game running."));
    }

    #[test]
    fn test_start_twice_points_at_join() {
        let (mut games, sink, _clock) = setup();

        games.start("#a", &id("a"), "Alice", None);
        games.start("#a", &id("a"), "Alice", None);
        games.start("#a", &id("b"), "Bob", None);

        assert!(sink.channel_contains("#a", "You are already in the current game."));
        assert!(sink.channel_contains("#a", "A game is already running. Type .join to join the game."));
        assert_eq!(games.game_count(), 1);
    }

    #[test]
    fn test_join_starts_a_game_when_none_runs() {
        let (mut games, sink, _clock) = setup();

        games.join("#a", &id("a"), "Alice");

        assert!(games.has_game("#a"));
        assert!(sink.channel_contains("#a", "A new game is starting!"));
        assert!(sink.channel_contains("#a", "Alice has joined the game."));
    }

    #[test]
    fn test_channels_are_independent() {
        let (mut games, _sink, _clock) = setup();

        games.start("#a", &id("a"), "Alice", None);
        games.start("#b", &id("a"), "Alice", None);

        assert_eq!(games.game_count(), 2);
        assert!(games.game("#a").unwrap().player(&id("a")).is_some());
        assert!(games.game("#b").unwrap().player(&id("a")).is_some());

        games.quit("#a", &id("a"));
        assert!(!games.has_game("#a"));
        assert!(games.has_game("#b"));
    }

    #[test]
    fn test_stop_reaps_and_channel_can_restart() {
        let (mut games, sink, _clock) = setup();
        games.start("#a", &id("a"), "Alice", None);

        games.stop("#a", &id("a"));
        assert!(!games.has_game("#a"));
        assert!(sink.channel_contains("#a", "Alice stopped the game."));

        games.start("#a", &id("b"), "Bob", None);
        assert!(games.has_game("#a"));
    }

    #[test]
    fn test_wait_timeout_reaps_on_tick() {
        let (mut games, _sink, clock) = setup();
        games.start("#a", &id("a"), "Alice", None);

        clock.advance(Duration::from_secs(180));
        games.tick();

        assert_eq!(games.game_count(), 0);
    }

    #[test]
    fn test_rename_follows_player_across_channels() {
        let (mut games, _sink, _clock) = setup();
        games.start("#a", &id("a"), "Alice", None);
        games.start("#b", &id("a"), "Alice", None);

        games.player_renamed("Alice", "Alicia");

        assert_eq!(games.game("#a").unwrap().player(&id("a")).unwrap().nick, "Alicia");
        assert_eq!(games.game("#b").unwrap().player(&id("a")).unwrap().nick, "Alicia");
    }

    #[test]
    fn test_deck_info_success_and_failure() {
        let (games, sink, clock) = setup();
        let provider = StaticDeckInfoProvider::new(vec![DeckInfo {
            code: "CAHBS".to_string(),
            name: "Base Set".to_string(),
            description: "The original".to_string(),
            author: "cards".to_string(),
            created: "2013-01-01".to_string(),
            call_count: 90,
            response_count: 460,
        }]);
        let _ = clock;
        let mut games = games.with_deck_info_provider(Rc::new(provider));

        games.deck_info("#a", "alice", "CAHBS");
        games.deck_info("#a", "alice", "XXXX");

        assert!(sink.channel_contains("#a", "\"Base Set\" by cards"));
        assert!(sink
            .private_texts("alice")
            .iter()
            .any(|t| t.contains("Error fetching deck XXXX: deck XXXX not found")));
    }

    #[test]
    fn test_point_limit_override_applies_to_one_game() {
        let (mut games, sink, _clock) = setup();

        games.start("#a", &id("a"), "Alice", Some(3));
        games.start("#b", &id("a"), "Alice", None);

        assert!(sink.channel_texts("#a").iter().any(|t| t == "Needed to win: 3."));
        assert!(sink.channel_texts("#b").iter().any(|t| t == "Needed to win: 10."));
    }
}
