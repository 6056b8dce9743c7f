use serde_json::Value;
use sweep_chunk::{TileDelta, Tint};
use sweep_geom::{PartitionKey, parse_bigint};

use crate::ProtocolError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Add,
    Update,
    Remove,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Add => "a",
            ActionKind::Update => "u",
            ActionKind::Remove => "r",
        }
    }
}

/// One entry of the authority's ordered action stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Add {
        key: PartitionKey,
        tiles: Vec<String>,
    },
    Update {
        key: PartitionKey,
        color: Option<Tint>,
        deltas: Vec<TileDelta>,
    },
    Remove {
        key: PartitionKey,
    },
}

impl Action {
    #[inline]
    pub fn key(&self) -> &PartitionKey {
        match self {
            Action::Add { key, .. } | Action::Update { key, .. } | Action::Remove { key } => key,
        }
    }

    #[inline]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Add { .. } => ActionKind::Add,
            Action::Update { .. } => ActionKind::Update,
            Action::Remove { .. } => ActionKind::Remove,
        }
    }
}

/// Decodes a whole batch. Only a non-array payload fails the batch; each
/// entry carries its own result so one malformed entry does not drop the rest.
pub fn decode_batch(json: &str) -> Result<Vec<Result<Action, ProtocolError>>, ProtocolError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(ProtocolError::NotABatch);
    };
    Ok(entries.iter().map(decode_action).collect())
}

pub fn decode_action(entry: &Value) -> Result<Action, ProtocolError> {
    let fields = match entry.as_array() {
        Some(fields) if !fields.is_empty() => fields,
        _ => return Err(ProtocolError::NotAnEntry(entry.to_string())),
    };
    let tag = fields[0]
        .as_str()
        .ok_or_else(|| ProtocolError::UnknownTag(fields[0].to_string()))?;
    match tag {
        "a" => {
            let key = key_at(fields, "a")?;
            let grid = field(fields, "a", 3)?
                .as_array()
                .ok_or_else(|| ProtocolError::BadTile(fields[3].to_string()))?;
            let tiles = grid.iter().map(tile_id).collect::<Result<Vec<_>, _>>()?;
            Ok(Action::Add { key, tiles })
        }
        "u" => {
            let key = key_at(fields, "u")?;
            // The colour slot may be omitted entirely: ["u", x, y, deltas].
            let (color, deltas) = match fields.len() {
                4 => (None, &fields[3]),
                _ => (color_hint(field(fields, "u", 3)?)?, field(fields, "u", 4)?),
            };
            let deltas = deltas
                .as_array()
                .ok_or_else(|| ProtocolError::BadDelta(deltas.to_string()))?
                .iter()
                .map(delta)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Action::Update { key, color, deltas })
        }
        "r" => Ok(Action::Remove {
            key: key_at(fields, "r")?,
        }),
        other => Err(ProtocolError::UnknownTag(other.to_string())),
    }
}

fn field<'a>(fields: &'a [Value], tag: &'static str, index: usize) -> Result<&'a Value, ProtocolError> {
    fields
        .get(index)
        .ok_or(ProtocolError::MissingField { tag, index })
}

fn key_at(fields: &[Value], tag: &'static str) -> Result<PartitionKey, ProtocolError> {
    let x = key_component(field(fields, tag, 1)?)?;
    let y = key_component(field(fields, tag, 2)?)?;
    Ok(PartitionKey::new(x, y))
}

fn key_component(v: &Value) -> Result<sweep_geom::num_bigint::BigInt, ProtocolError> {
    let text = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(ProtocolError::BadKey(other.to_string())),
    };
    parse_bigint(&text).map_err(|e| ProtocolError::BadKey(e.to_string()))
}

fn tile_id(v: &Value) -> Result<String, ProtocolError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ProtocolError::BadTile(other.to_string())),
    }
}

fn color_hint(v: &Value) -> Result<Option<Tint>, ProtocolError> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .filter(|c| *c <= 0xFF_FF_FF)
            .map(|c| Some(Tint(c as u32)))
            .ok_or_else(|| ProtocolError::BadColor(n.to_string())),
        Value::String(s) => {
            let hex = s.strip_prefix('#').unwrap_or(s);
            if hex.len() != 6 {
                return Err(ProtocolError::BadColor(s.clone()));
            }
            u32::from_str_radix(hex, 16)
                .map(|c| Some(Tint(c)))
                .map_err(|_| ProtocolError::BadColor(s.clone()))
        }
        other => Err(ProtocolError::BadColor(other.to_string())),
    }
}

fn delta(v: &Value) -> Result<TileDelta, ProtocolError> {
    let bad = || ProtocolError::BadDelta(v.to_string());
    let parts = v.as_array().filter(|p| p.len() == 3).ok_or_else(bad)?;
    let lx = parts[0].as_u64().ok_or_else(bad)? as usize;
    let ly = parts[1].as_u64().ok_or_else(bad)? as usize;
    let tile = tile_id(&parts[2])?;
    Ok(TileDelta { lx, ly, tile })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_kind() {
        let batch = decode_batch(
            r##"[["a","2","3",["u","1"]],["u",2,3,"#ff0000",[[0,0,"x"]]],["r","2","3"]]"##,
        )
        .unwrap();
        let actions: Vec<Action> = batch.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            actions[0],
            Action::Add {
                key: PartitionKey::new(2, 3),
                tiles: vec!["u".into(), "1".into()]
            }
        );
        assert_eq!(
            actions[1],
            Action::Update {
                key: PartitionKey::new(2, 3),
                color: Some(Tint(0xFF0000)),
                deltas: vec![TileDelta {
                    lx: 0,
                    ly: 0,
                    tile: "x".into()
                }],
            }
        );
        assert_eq!(actions[2].kind(), ActionKind::Remove);
    }

    #[test]
    fn update_without_color_slot() {
        let v: Value = serde_json::from_str(r#"["u","0","0",[[1,2,"f"]]]"#).unwrap();
        let Action::Update { color, deltas, .. } = decode_action(&v).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(color, None);
        assert_eq!(deltas.len(), 1);
    }

    #[test]
    fn null_color_is_no_fade() {
        let v: Value = serde_json::from_str(r#"["u","0","0",null,[]]"#).unwrap();
        assert!(matches!(
            decode_action(&v).unwrap(),
            Action::Update { color: None, .. }
        ));
    }

    #[test]
    fn huge_keys_survive() {
        let v: Value =
            serde_json::from_str(r#"["r","-98765432109876543210987654321","5"]"#).unwrap();
        let action = decode_action(&v).unwrap();
        assert_eq!(
            action.key().coord().x.to_string(),
            "-98765432109876543210987654321"
        );
    }

    #[test]
    fn bad_entries_are_isolated() {
        let batch = decode_batch(r#"[["z",1,2],["r",1],["r","1","1"],["u","1","1",12,[[0]]]]"#)
            .unwrap();
        assert!(matches!(batch[0], Err(ProtocolError::UnknownTag(_))));
        assert!(matches!(
            batch[1],
            Err(ProtocolError::MissingField { tag: "r", index: 2 })
        ));
        assert!(batch[2].is_ok());
        assert!(matches!(batch[3], Err(ProtocolError::BadDelta(_))));
    }

    #[test]
    fn non_array_batch_is_rejected() {
        assert!(matches!(
            decode_batch(r#"{"a":1}"#),
            Err(ProtocolError::NotABatch)
        ));
        assert!(matches!(decode_batch("[1,"), Err(ProtocolError::Json(_))));
    }
}
