//! Peer-synchronized matches: replication out, validation and mirroring in.

use serde_json::json;
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{peer_engine, quiet_engine, run_frames};

fn action(kind: ActionKind, payload: serde_json::Value, origin: &str, timestamp: u64) -> RemoteAction {
    RemoteAction {
        kind,
        payload,
        origin_id: origin.to_string(),
        timestamp,
    }
}

#[test]
fn echoed_actions_are_dropped() {
    let mut engine = peer_engine(MatchConfig::default(), "alice");
    let before = engine.state_hash();

    let echo = action(ActionKind::Tower, json!({}), "alice", 3);
    assert_eq!(engine.apply_remote_action(&echo), BridgeOutcome::DroppedEcho);
    assert_eq!(engine.state_hash(), before);
}

#[test]
fn stale_actions_are_dropped_but_ties_are_kept() {
    let mut engine = peer_engine(MatchConfig::default(), "alice");

    let first = action(ActionKind::Tower, json!({}), "bob", 10);
    assert_eq!(engine.apply_remote_action(&first), BridgeOutcome::Applied);

    let older = action(ActionKind::Tower, json!({}), "bob", 5);
    assert_eq!(engine.apply_remote_action(&older), BridgeOutcome::DroppedStale);

    let same = action(ActionKind::Tower, json!({}), "bob", 10);
    assert_eq!(engine.apply_remote_action(&same), BridgeOutcome::Applied);

    let other_origin = action(ActionKind::Tower, json!({}), "carol", 1);
    assert_eq!(engine.apply_remote_action(&other_origin), BridgeOutcome::Applied);

    assert_eq!(engine.world().structures[Faction::Opponent].tower_count(), 3);
}

#[test]
fn malformed_payloads_are_dropped() {
    let mut engine = peer_engine(MatchConfig::default(), "alice");
    let unknown = action(ActionKind::Spawn, json!({ "unit": "dragon" }), "bob", 1);
    assert!(matches!(
        engine.apply_remote_action(&unknown),
        BridgeOutcome::DroppedInvalid(_)
    ));
    let missing_x = action(ActionKind::Skill, json!({ "skill": "Barrage" }), "bob", 2);
    assert!(matches!(
        engine.apply_remote_action(&missing_x),
        BridgeOutcome::DroppedInvalid(_)
    ));
    assert!(engine.world().registry.queue(Faction::Opponent).is_empty());
}

#[test]
fn remote_cast_matches_local_cast_on_mirrored_lane() {
    let mut remote = peer_engine(MatchConfig::default(), "alice");
    let mut local = quiet_engine(MatchConfig::default());

    let freeze = action(ActionKind::Skill, json!({ "skill": "Freeze", "x": 500 }), "bob", 0);
    assert_eq!(remote.apply_remote_action(&freeze), BridgeOutcome::Applied);
    assert!(local
        .apply_command(
            Faction::Opponent,
            Command::CastAbility {
                ability: AbilityKind::Freeze,
                x: fx(2500),
            },
        )
        .is_applied());

    assert_eq!(remote.world().registry.hazards()[0].x, fx(2500));
    assert_eq!(remote.state_hash(), local.state_hash());

    run_frames(&mut remote, 120);
    run_frames(&mut local, 120);
    assert_eq!(remote.state_hash(), local.state_hash());
}

#[test]
fn local_actions_are_replicated_and_remote_ones_are_not() {
    let mut engine = peer_engine(MatchConfig::default(), "alice");
    run_frames(&mut engine, 7);

    assert!(engine.queue_unit(Archetype::Miner).is_applied());
    assert!(engine.set_rally_point(fx(400)).is_applied());
    assert!(engine.use_ability_barrage(fx(700)).is_applied());
    assert_eq!(
        engine.queue_unit(Archetype::Hero),
        CommandOutcome::Rejected(Rejection::InsufficientGold)
    );
    let remote = action(ActionKind::Tower, json!({}), "bob", 7);
    assert_eq!(engine.apply_remote_action(&remote), BridgeOutcome::Applied);

    let sent = engine.take_outgoing_actions();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].kind, ActionKind::Spawn);
    assert_eq!(sent[0].payload, json!({ "unit": "miner" }));
    assert_eq!(sent[1].kind, ActionKind::Skill);
    assert!(sent.iter().all(|a| a.origin_id == "alice" && a.timestamp == 7));
    assert!(engine.take_outgoing_actions().is_empty());
}

#[test]
fn two_peers_see_each_other_on_the_opposing_side() {
    let mut alice = peer_engine(MatchConfig::default(), "alice");
    let mut bob = peer_engine(MatchConfig::default(), "bob");

    assert!(alice.queue_unit(Archetype::Swordsman).is_applied());
    assert!(alice.use_ability_freeze(fx(600)).is_applied());

    for sent in alice.take_outgoing_actions() {
        let line = sent.to_json_line().unwrap();
        let received = RemoteAction::from_json_line(&line).unwrap();
        assert_eq!(bob.apply_remote_action(&received), BridgeOutcome::Applied);
    }

    let queue = bob.world().registry.queue(Faction::Opponent);
    assert_eq!(queue.current().map(|item| item.archetype), Some(Archetype::Swordsman));
    assert_eq!(bob.world().registry.hazards()[0].x, fx(2400));
    assert_eq!(bob.world().registry.hazards()[0].faction, Faction::Opponent);
    assert!(bob.take_outgoing_actions().is_empty());
}

#[test]
fn peer_matches_cannot_pause() {
    let mut engine = peer_engine(MatchConfig::default(), "alice");
    assert_eq!(engine.toggle_pause(), CommandOutcome::Rejected(Rejection::Unavailable));
    assert!(engine.ai().is_none());
}

#[test]
fn single_player_has_no_remote_surface() {
    let mut engine = quiet_engine(MatchConfig::default());
    let tower = action(ActionKind::Tower, json!({}), "bob", 1);
    assert_eq!(
        engine.apply_remote_action(&tower),
        BridgeOutcome::Rejected(Rejection::Unavailable)
    );
    assert!(engine.take_outgoing_actions().is_empty());
}
