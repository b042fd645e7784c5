//! Replication of local actions to a remote peer, and back.
//!
//! In a peer-synchronized match the remote human drives the opposing
//! faction. Every successful local spawn, cast or tower purchase becomes a
//! [`RemoteAction`]; the transport (not part of this crate) carries them
//! across as JSON lines. Incoming actions are checked for echoes and stale
//! timestamps, mirrored onto the opposing side of the lane and turned back
//! into ordinary [`Command`]s.
//!
//! Conflict handling is last-writer-wins per origin: an action older than
//! the newest one already accepted from the same origin is dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::abilities::AbilityKind;
use crate::archetypes::Archetype;
use crate::command::Command;
use crate::error::{GameError, Rejection, Result};
use crate::math::{fx, Fixed};

/// What a remote action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Queue a unit. Payload `{"unit": "<name>"}`.
    Spawn,
    /// Cast an ability. Payload `{"skill": "<name>", "x": <lane x>}`.
    Skill,
    /// Buy a tower. Payload ignored.
    Tower,
}

/// One replicated action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAction {
    /// Action kind.
    pub kind: ActionKind,
    /// Kind-specific data.
    pub payload: Value,
    /// Peer that produced the action.
    pub origin_id: String,
    /// Producer's frame counter when the action happened.
    pub timestamp: u64,
}

impl RemoteAction {
    /// Encode as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Decode one JSON line.
    pub fn from_json_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).map_err(|e| GameError::InvalidRemoteAction(e.to_string()))
    }
}

/// Parse a JSON-lines document, skipping blank lines.
///
/// Each entry is the line number (1-based) and its decode result, so a
/// caller can report bad lines without giving up on the rest.
#[must_use]
pub fn parse_json_lines(source: &str) -> Vec<(usize, Result<RemoteAction>)> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, RemoteAction::from_json_line(line)))
        .collect()
}

/// Result of applying a remote action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The action went through the command surface and took effect.
    Applied,
    /// The action was well-formed but the command surface refused it.
    Rejected(Rejection),
    /// The action came from this peer.
    DroppedEcho,
    /// The action is older than one already accepted from its origin.
    DroppedStale,
    /// The payload does not fit its kind.
    DroppedInvalid(String),
}

impl BridgeOutcome {
    /// Whether the action was dropped before reaching the command surface.
    #[must_use]
    pub const fn is_dropped(&self) -> bool {
        matches!(
            self,
            Self::DroppedEcho | Self::DroppedStale | Self::DroppedInvalid(_)
        )
    }
}

/// Per-match replication state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBridge {
    local_id: String,
    last_timestamps: BTreeMap<String, u64>,
    #[serde(skip)]
    outgoing: Vec<RemoteAction>,
}

impl RemoteBridge {
    /// Bridge for the peer named `local_id`.
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            ..Self::default()
        }
    }

    /// This peer's id.
    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Record a successful local command for replication. Commands that are
    /// not replicated are ignored.
    pub fn record(&mut self, command: &Command, frame: u64) {
        let Some((kind, payload)) = encode(command) else {
            return;
        };
        self.outgoing.push(RemoteAction {
            kind,
            payload,
            origin_id: self.local_id.clone(),
            timestamp: frame,
        });
    }

    /// Drain actions waiting to be sent.
    pub fn take_outgoing(&mut self) -> Vec<RemoteAction> {
        std::mem::take(&mut self.outgoing)
    }

    /// Actions waiting to be sent.
    #[must_use]
    pub fn pending(&self) -> &[RemoteAction] {
        &self.outgoing
    }

    /// Validate an incoming action and translate it into a command for the
    /// opposing faction. `lane_length` mirrors lane positions.
    ///
    /// Accepting an action advances its origin's timestamp even if the
    /// command surface later refuses the command.
    pub fn accept(&mut self, action: &RemoteAction, lane_length: i32) -> std::result::Result<Command, BridgeOutcome> {
        if action.origin_id == self.local_id {
            tracing::debug!(origin = %action.origin_id, "Dropping echoed remote action");
            return Err(BridgeOutcome::DroppedEcho);
        }
        if let Some(&last) = self.last_timestamps.get(&action.origin_id) {
            if action.timestamp < last {
                tracing::debug!(
                    origin = %action.origin_id,
                    timestamp = action.timestamp,
                    last,
                    "Dropping stale remote action"
                );
                return Err(BridgeOutcome::DroppedStale);
            }
        }
        let command = decode(action, lane_length).map_err(|reason| {
            tracing::warn!(origin = %action.origin_id, kind = ?action.kind, %reason, "Dropping invalid remote action");
            BridgeOutcome::DroppedInvalid(reason)
        })?;
        self.last_timestamps
            .insert(action.origin_id.clone(), action.timestamp);
        Ok(command)
    }
}

fn encode(command: &Command) -> Option<(ActionKind, Value)> {
    match command {
        Command::QueueUnit(archetype) => Some((ActionKind::Spawn, json!({ "unit": archetype.name() }))),
        Command::CastAbility { ability, x } => Some((
            ActionKind::Skill,
            json!({ "skill": ability.name(), "x": x.to_num::<f64>() }),
        )),
        Command::BuyTower => Some((ActionKind::Tower, json!({}))),
        _ => None,
    }
}

fn decode(action: &RemoteAction, lane_length: i32) -> std::result::Result<Command, String> {
    match action.kind {
        ActionKind::Spawn => {
            let name = action
                .payload
                .get("unit")
                .and_then(Value::as_str)
                .ok_or("spawn payload needs a unit name")?;
            let archetype = Archetype::from_name(name).ok_or_else(|| format!("unknown unit '{name}'"))?;
            Ok(Command::QueueUnit(archetype))
        }
        ActionKind::Skill => {
            let name = action
                .payload
                .get("skill")
                .and_then(Value::as_str)
                .ok_or("skill payload needs a skill name")?;
            let ability = AbilityKind::from_name(name).ok_or_else(|| format!("unknown skill '{name}'"))?;
            let x = action
                .payload
                .get("x")
                .and_then(Value::as_f64)
                .and_then(Fixed::checked_from_num)
                .ok_or("skill payload needs a numeric x")?;
            Ok(Command::CastAbility {
                ability,
                x: fx(lane_length) - x,
            })
        }
        ActionKind::Tower => Ok(Command::BuyTower),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(kind: ActionKind, payload: Value, origin: &str, timestamp: u64) -> RemoteAction {
        RemoteAction {
            kind,
            payload,
            origin_id: origin.to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_records_only_replicated_commands() {
        let mut bridge = RemoteBridge::new("alice");
        bridge.record(&Command::QueueUnit(Archetype::Archer), 10);
        bridge.record(&Command::SetRallyPoint(fx(500)), 11);
        bridge.record(
            &Command::CastAbility {
                ability: AbilityKind::Freeze,
                x: fx(700),
            },
            12,
        );
        bridge.record(&Command::BuyTower, 13);

        let sent = bridge.take_outgoing();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].payload, json!({ "unit": "archer" }));
        assert_eq!(sent[1].payload, json!({ "skill": "Freeze", "x": 700.0 }));
        assert!(sent.iter().all(|a| a.origin_id == "alice"));
        assert!(bridge.take_outgoing().is_empty());
    }

    #[test]
    fn test_skill_is_mirrored() {
        let mut bridge = RemoteBridge::new("alice");
        let incoming = action(ActionKind::Skill, json!({ "skill": "Barrage", "x": 700 }), "bob", 5);
        assert_eq!(
            bridge.accept(&incoming, 3000),
            Ok(Command::CastAbility {
                ability: AbilityKind::Barrage,
                x: fx(2300)
            })
        );
    }

    #[test]
    fn test_echo_and_stale_are_dropped() {
        let mut bridge = RemoteBridge::new("alice");
        let echo = action(ActionKind::Tower, json!({}), "alice", 1);
        assert_eq!(bridge.accept(&echo, 3000), Err(BridgeOutcome::DroppedEcho));

        let newer = action(ActionKind::Tower, json!({}), "bob", 20);
        let older = action(ActionKind::Tower, json!({}), "bob", 19);
        let same = action(ActionKind::Tower, json!({}), "bob", 20);
        assert!(bridge.accept(&newer, 3000).is_ok());
        assert_eq!(bridge.accept(&older, 3000), Err(BridgeOutcome::DroppedStale));
        assert!(bridge.accept(&same, 3000).is_ok());
    }

    #[test]
    fn test_invalid_payloads_are_dropped() {
        let mut bridge = RemoteBridge::new("alice");
        for payload in [json!({}), json!({ "unit": "dragon" }), json!({ "unit": 3 })] {
            let incoming = action(ActionKind::Spawn, payload, "bob", 1);
            assert!(matches!(
                bridge.accept(&incoming, 3000),
                Err(BridgeOutcome::DroppedInvalid(_))
            ));
        }
        let no_x = action(ActionKind::Skill, json!({ "skill": "Freeze" }), "bob", 1);
        assert!(bridge.accept(&no_x, 3000).is_err());
    }

    #[test]
    fn test_json_lines() {
        let line = action(ActionKind::Spawn, json!({ "unit": "hero" }), "bob", 7)
            .to_json_line()
            .unwrap();
        assert!(line.contains("\"kind\":\"spawn\""));
        let source = format!("{line}\n\nnot json\n");
        let parsed = parse_json_lines(&source);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, 1);
        assert!(parsed[0].1.is_ok());
        assert_eq!(parsed[1].0, 3);
        assert!(parsed[1].1.is_err());
    }
}
