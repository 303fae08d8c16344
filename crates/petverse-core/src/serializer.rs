//! Encoding and diffing of the replicated tree.
//!
//! [`encode`] walks a [`SessionState`] into a JSON tree. [`diff`] compares
//! two encodings and emits JSON-pointer patch operations. Objects are
//! compared key by key; any other change (including arrays) replaces the
//! whole node.

use petverse_types::{PatchKind, PatchOp};
use serde_json::{Map, Value};

use crate::state::SessionState;

/// Encode the full tree.
pub fn encode(state: &SessionState) -> Result<Value, serde_json::Error> {
    let mut players = Map::new();
    for (id, player) in &state.players {
        players.insert(id.to_string(), serde_json::to_value(player)?);
    }

    let mut pets = Map::new();
    for (id, pet) in &state.pets {
        pets.insert(id.to_string(), serde_json::to_value(pet)?);
    }

    let mut root = Map::new();
    root.insert(String::from("session_id"), Value::String(state.session_id.to_string()));
    root.insert(String::from("created_at"), serde_json::to_value(state.created_at)?);
    root.insert(String::from("players"), Value::Object(players));
    root.insert(String::from("pets"), Value::Object(pets));
    Ok(Value::Object(root))
}

/// Changed paths between `previous` and `current`.
pub fn diff(previous: &Value, current: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_at(String::new(), previous, current, &mut ops);
    ops
}

fn diff_at(path: String, previous: &Value, current: &Value, ops: &mut Vec<PatchOp>) {
    match (previous, current) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                let child = child_path(&path, key);
                match new.get(key) {
                    Some(new_value) => diff_at(child, old_value, new_value, ops),
                    None => ops.push(PatchOp {
                        op: PatchKind::Remove,
                        path: child,
                        value: None,
                    }),
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    ops.push(PatchOp {
                        op: PatchKind::Add,
                        path: child_path(&path, key),
                        value: Some(new_value.clone()),
                    });
                }
            }
        }
        (old, new) if old == new => {}
        (_, new) => ops.push(PatchOp {
            op: PatchKind::Replace,
            path,
            value: Some(new.clone()),
        }),
    }
}

/// Append `key` to a JSON pointer, escaping `~` and `/`.
fn child_path(parent: &str, key: &str) -> String {
    let escaped = key.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{escaped}")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use petverse_types::{Player, PlayerIdentity, SessionId};
    use serde_json::json;

    use super::*;

    #[test]
    fn identical_trees_have_no_ops() {
        let v = json!({"a": 1, "b": {"c": [1, 2]}});
        assert!(diff(&v, &v).is_empty());
    }

    #[test]
    fn nested_change_is_a_single_replace() {
        let old = json!({"pets": {"p1": {"hunger": {"value": 90.0}}}});
        let new = json!({"pets": {"p1": {"hunger": {"value": 100.0}}}});
        let ops = diff(&old, &new);
        assert_eq!(
            ops,
            vec![PatchOp {
                op: PatchKind::Replace,
                path: String::from("/pets/p1/hunger/value"),
                value: Some(json!(100.0)),
            }]
        );
    }

    #[test]
    fn added_and_removed_keys() {
        let old = json!({"pets": {"a": 1}});
        let new = json!({"pets": {"b": 2}});
        let ops = diff(&old, &new);
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().any(|o| o.op == PatchKind::Remove && o.path == "/pets/a"));
        assert!(ops.iter().any(|o| o.op == PatchKind::Add && o.path == "/pets/b"));
    }

    #[test]
    fn arrays_are_replaced_whole() {
        let old = json!({"waste": [1]});
        let new = json!({"waste": [1, 2]});
        let ops = diff(&old, &new);
        assert_eq!(ops.first().map(|o| o.path.as_str()), Some("/waste"));
        assert_eq!(ops.first().map(|o| o.op), Some(PatchKind::Replace));
    }

    #[test]
    fn pointer_segments_are_escaped() {
        assert_eq!(child_path("/a", "x/y~z"), "/a/x~1y~0z");
    }

    #[test]
    fn encode_keys_players_by_id() {
        let mut state = SessionState::new(SessionId::new(), Utc::now());
        let identity = PlayerIdentity {
            wallet: String::from("0x9"),
            display_name: String::from("Noa"),
        };
        let player = Player::new(&identity, 7, Utc::now());
        let key = player.id.to_string();
        state.players.insert(player.id, player);

        let encoded = encode(&state).unwrap_or_default();
        let tokens = encoded
            .get("players")
            .and_then(|p| p.get(&key))
            .and_then(|p| p.get("tokens"))
            .and_then(Value::as_u64);
        assert_eq!(tokens, Some(7));
    }
}
