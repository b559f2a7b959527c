mod common;

use chrono::Duration;
use common::*;
use game_core::{Event, EventBus, GameEvent, LobbyEvent, PlayerEvent};
use game_types::{GameError, GameOverReason, GameState, HostConfig, LobbyState, UserState};

#[test]
fn test_three_player_time_up_scenario() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, Some(1));
    let ids = add_players(&mut lobby, &["A", "B", "C"]);
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    start_playing(&mut lobby, &ids);
    assert_eq!(lobby.game().unwrap().state(), GameState::Playing);

    // A finds their opponent's word on the first try
    let target = opponent_word(&lobby, a);
    let history = lobby.submit_guess(a, &submission(&target)).unwrap();
    assert_eq!(history.guess.common, 5);
    assert!(history.guess.won);

    // B hits every letter in the wrong order, C hits nothing
    let reversed: String = opponent_word(&lobby, b).chars().rev().collect();
    let history = lobby.submit_guess(b, &submission(&reversed)).unwrap();
    assert_eq!(history.guess.common, 5);
    assert!(!history.guess.won);

    let history = lobby.submit_guess(c, &submission("zzzzz")).unwrap();
    assert_eq!(history.guess.common, 0);

    assert_eq!(lobby.game().unwrap().state(), GameState::Playing);

    let started_on = lobby.game().unwrap().started_on().unwrap();
    lobby.run_timers(started_on + Duration::seconds(59)).unwrap();
    assert_eq!(lobby.state(), LobbyState::InGame);

    lobby.run_timers(started_on + Duration::minutes(1)).unwrap();
    assert_eq!(lobby.state(), LobbyState::InRoom);

    let game = lobby.game().unwrap();
    assert_eq!(game.state(), GameState::GameOver);

    let summary = game.summary().unwrap();
    assert_eq!(summary.game_over_reason, GameOverReason::TimeUp);
    assert_eq!(summary.game_length, 60);

    let order: Vec<_> = summary.player_summaries.iter().map(|s| s.user_id).collect();
    assert_eq!(order, vec![a, b, c]);

    let first = &summary.player_summaries[0];
    assert_eq!(first.place, 1);
    assert_eq!(first.num_guesses, 1);
    assert!(first.won_at.is_some());
    assert_eq!(summary.player_summaries[1].best_guess, 5);
    assert_eq!(summary.player_summaries[2].place, 3);

    for id in &ids {
        assert_eq!(lobby.find_user(*id).unwrap().state, UserState::GameOver);
    }
}

#[test]
fn test_all_won_then_timer_is_noop() {
    let bus = EventBus::new();
    let collector = EventCollector::attach(&bus);
    let mut lobby = create_test_lobby(&bus, Some(5));
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    start_playing(&mut lobby, &ids);

    win_game(&mut lobby, &ids);

    let game = lobby.game().unwrap();
    assert_eq!(game.game_over_reason(), Some(GameOverReason::AllWon));
    let summary = game.summary().unwrap().clone();
    let deadline = game.started_on().unwrap() + Duration::minutes(5);

    lobby.run_timers(deadline).unwrap();

    assert_eq!(lobby.game().unwrap().summary().unwrap(), &summary);
    assert_eq!(
        collector.count_matching(|e| matches!(
            e,
            Event::Game(GameEvent::GameStateChanged {
                state: GameState::GameOver,
                ..
            })
        )),
        1
    );
}

#[test]
fn test_pick_word_deadline_assigns_words() {
    let bus = EventBus::new();
    let collector = EventCollector::attach(&bus);
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    lobby.start_game(HostConfig::default()).unwrap();
    lobby.set_word(ids[0], "crane").unwrap();

    let deadline = lobby.game().unwrap().pick_word_deadline();
    lobby.run_timers(deadline).unwrap();

    assert_eq!(lobby.game().unwrap().state(), GameState::Playing);
    assert_eq!(
        collector.count_matching(|e| matches!(
            e,
            Event::Player(PlayerEvent::SetWord { assigned: true, .. })
        )),
        2
    );
    for id in &ids {
        assert_eq!(lobby.find_user(*id).unwrap().state, UserState::Playing);
    }
    // untimed match: no end timer
    assert!(!lobby.game().unwrap().has_armed_timers());
}

#[test]
fn test_state_rejections() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);

    // nothing to do before a game exists
    assert!(lobby.set_word(ids[0], "crane").is_err());
    assert!(lobby.submit_guess(ids[0], &submission("crane")).is_err());

    start_playing(&mut lobby, &ids);

    let result = lobby.set_word(ids[0], "dwarf");
    assert!(matches!(result, Err(GameError::InvalidState { .. })));

    let result = lobby.start_game(HostConfig::default());
    assert!(matches!(result, Err(GameError::InvalidState { .. })));

    win_game(&mut lobby, &ids);
    assert_eq!(lobby.game().unwrap().state(), GameState::GameOver);

    // the finished match takes no more words or guesses
    let result = lobby.submit_guess(ids[0], &submission("crane"));
    assert!(matches!(result, Err(GameError::InvalidState { .. })));
    let result = lobby.set_word(ids[1], "dwarf");
    assert!(matches!(result, Err(GameError::InvalidState { .. })));
    assert_eq!(lobby.game().unwrap().guesses().len(), 2);
}

#[test]
fn test_zombie_substitution_keeps_ring() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    lobby.start_game(HostConfig::default()).unwrap();
    lobby.set_word(ids[1], "blimp").unwrap();

    assert!(!lobby.on_user_disconnected(ids[1], true).unwrap());

    let game = lobby.game().unwrap();
    assert_eq!(game.players().len(), 3);
    assert!(game.player(ids[1]).unwrap().is_zombie());
    for player in game.players() {
        let opponent = player.opponent().unwrap();
        assert!(game.includes(opponent));
    }
    assert!(!lobby.includes(ids[1]));

    // the zombie's word is still there to be guessed
    lobby.set_word(ids[0], "crane").unwrap();
    lobby.set_word(ids[2], "dwarf").unwrap();
    assert_eq!(lobby.game().unwrap().state(), GameState::Playing);
}

#[test]
fn test_remaining_players_winning_ends_game() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    start_playing(&mut lobby, &ids);

    lobby.on_user_disconnected(ids[2], true).unwrap();
    win_game(&mut lobby, &ids[..2]);

    let game = lobby.game().unwrap();
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(game.summary().unwrap().player_summaries.len(), 3);
}

#[test]
fn test_game_destroyed_when_everyone_leaves() {
    let bus = EventBus::new();
    let collector = EventCollector::attach(&bus);
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    let watcher = add_observer(&mut lobby, "Watcher");
    lobby.start_game(HostConfig::default()).unwrap();

    assert!(!lobby.on_user_disconnected(ids[0], true).unwrap());
    assert!(!lobby.on_user_disconnected(ids[1], true).unwrap());

    assert!(collector.has_event_type(|e| matches!(
        e,
        Event::Game(GameEvent::GameStateChanged {
            state: GameState::Destroyed,
            ..
        })
    )));
    assert!(lobby.game().is_none());
    assert_eq!(lobby.state(), LobbyState::InRoom);
    assert_eq!(lobby.find_user(watcher).unwrap().state, UserState::InRoom);

    // the observer leaving empties the lobby
    assert!(lobby.on_user_disconnected(watcher, true).unwrap());
    assert!(collector.has_event_type(|e| matches!(e, Event::Lobby(LobbyEvent::LobbyEmpty { .. }))));
}

#[test]
fn test_go_back_to_room_and_rematch() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    lobby.go_back_to_room(ids[0]).unwrap();
    // a second request is ignored
    lobby.go_back_to_room(ids[0]).unwrap();

    let alice = lobby.room().find(ids[0]).unwrap();
    assert_eq!(alice.total_wins(), 1);
    assert!(!alice.has_word());
    assert_eq!(alice.identity.state(), UserState::InRoom);
    assert!(lobby.game().unwrap().player(ids[0]).unwrap().is_zombie());

    // lingering players are swept into the next match
    lobby.start_game(HostConfig::default()).unwrap();
    let game = lobby.game().unwrap();
    assert_eq!(game.players().len(), 3);
    assert!(game.players().iter().all(|p| !p.is_zombie()));
    assert!(game.players().iter().all(|p| p.total_wins() == 1));
}

#[test]
fn test_all_players_back_in_room_destroys_game() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    lobby.go_back_to_room(ids[0]).unwrap();
    lobby.go_back_to_room(ids[1]).unwrap();

    assert!(lobby.game().is_none());
    assert_eq!(lobby.room().len(), 2);
}

#[test]
fn test_restore_cascade() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, Some(3));
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    let watcher = add_observer(&mut lobby, "Watcher");

    let restore = lobby.user_restore(ids[0]).unwrap();
    assert_eq!(restore.state, UserState::InRoom);
    assert_eq!(restore.users.len(), 3);
    assert!(restore.config.is_none());

    lobby.start_game(HostConfig::default()).unwrap();
    let restore = lobby.user_restore(ids[0]).unwrap();
    assert_eq!(restore.state, UserState::PickingWord);
    assert_eq!(restore.config.unwrap().game_length, Some(3));
    assert!(restore.pick_word_deadline.is_some());
    assert!(restore.word.is_none());

    lobby.set_word(ids[0], "crane").unwrap();
    let restore = lobby.user_restore(ids[0]).unwrap();
    assert_eq!(restore.word.as_deref(), Some("crane"));
    assert!(restore.history.is_none());

    lobby.set_word(ids[1], "blimp").unwrap();
    lobby.submit_guess(ids[1], &submission("cabin")).unwrap();
    let restore = lobby.user_restore(ids[0]).unwrap();
    assert_eq!(restore.state, UserState::Playing);
    assert_eq!(restore.history.unwrap().len(), 1);
    assert!(restore.started_on.is_some());
    assert!(restore.game_summary.is_none());

    // observers see everything but have no word of their own
    let restore = lobby.user_restore(watcher).unwrap();
    assert_eq!(restore.state, UserState::Playing);
    assert!(restore.word.is_none());
    assert!(restore.history.is_some());

    win_game(&mut lobby, &ids);
    let restore = lobby.user_restore(ids[1]).unwrap();
    assert_eq!(restore.state, UserState::GameOver);
    assert_eq!(restore.word.as_deref(), Some("blimp"));
    assert_eq!(restore.history.unwrap().len(), 3);
    assert_eq!(restore.game_summary.unwrap().player_summaries.len(), 2);
}

#[test]
fn test_restore_unknown_user() {
    let bus = EventBus::new();
    let lobby = create_test_lobby(&bus, None);
    let id = uuid::Uuid::new_v4();
    assert_eq!(
        lobby.user_restore(id),
        Err(GameError::UserNotFound { user_id: id })
    );
}

#[test]
fn test_observer_restore_after_game_destroyed() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    let watcher = add_observer(&mut lobby, "Watcher");
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    lobby.go_back_to_room(ids[0]).unwrap();
    lobby.go_back_to_room(ids[1]).unwrap();
    assert!(lobby.game().is_none());

    let restore = lobby.user_restore(watcher).unwrap();
    assert_eq!(restore.state, UserState::InRoom);
    assert!(restore.game_summary.is_none());
}

#[test]
fn test_users_for_follows_state() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    add_observer(&mut lobby, "Watcher");
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    lobby.go_back_to_room(ids[0]).unwrap();

    // Alice sees the room, Bob still sees the finished match
    assert_eq!(lobby.users_for(ids[0]).unwrap().len(), 2);
    assert_eq!(lobby.users_for(ids[1]).unwrap().len(), 4);
}

#[test]
fn test_player_wins_include_leavers() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    lobby.on_user_disconnected(ids[0], true).unwrap();

    let wins = lobby.player_wins();
    assert_eq!(wins.len(), 3);
    assert!(wins.iter().all(|w| w.total_wins == 1));
}

#[test]
fn test_failed_rematch_keeps_finished_match() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    let rejecting = bus.subscribe(
        |e| matches!(e, Event::Game(GameEvent::GameCreated { .. })),
        |_| Err(GameError::invalid_state("transport rejected")),
    );
    let result = lobby.start_game(HostConfig::default());
    assert!(matches!(result, Err(GameError::InvalidState { .. })));

    let game = lobby.game().unwrap();
    assert_eq!(game.state(), GameState::GameOver);
    assert!(game.summary().is_ok());
    assert!(lobby.room().is_empty());
    assert!(lobby.room().is_open());
    assert_eq!(lobby.state(), LobbyState::InRoom);
    assert!(ids.iter().all(|id| lobby.includes(*id)));

    drop(rejecting);
    lobby.start_game(HostConfig::default()).unwrap();
    assert_eq!(lobby.game().unwrap().players().len(), 2);
}

#[test]
fn test_too_few_players_keeps_finished_match() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob"]);
    start_playing(&mut lobby, &ids);
    win_game(&mut lobby, &ids);

    lobby.on_user_disconnected(ids[1], true).unwrap();

    let result = lobby.start_game(HostConfig::default());
    assert!(matches!(result, Err(GameError::InvalidState { .. })));
    assert!(lobby.game().unwrap().summary().is_ok());
    assert!(lobby.room().is_empty());
    assert_eq!(
        lobby.user_restore(ids[0]).unwrap().state,
        UserState::GameOver
    );
}

#[test]
fn test_restore_player_who_left_mid_match() {
    let bus = EventBus::new();
    let mut lobby = create_test_lobby(&bus, None);
    let ids = add_players(&mut lobby, &["Alice", "Bob", "Carol"]);
    start_playing(&mut lobby, &ids);
    lobby.submit_guess(ids[2], &submission("zzzzz")).unwrap();

    lobby.on_user_disconnected(ids[2], true).unwrap();
    assert!(!lobby.includes(ids[2]));

    let restore = lobby.user_restore(ids[2]).unwrap();
    assert_eq!(restore.state, UserState::Playing);
    assert_eq!(restore.word.as_deref(), Some(TEST_WORDS[2]));
    assert_eq!(restore.history.unwrap().len(), 1);
    assert_eq!(restore.users.len(), 3);

    win_game(&mut lobby, &ids[..2]);
    let restore = lobby.user_restore(ids[2]).unwrap();
    assert_eq!(restore.state, UserState::GameOver);
    assert_eq!(restore.game_summary.unwrap().player_summaries.len(), 3);
}
