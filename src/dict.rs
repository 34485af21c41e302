//! The structural parser behind `Dict` options (spec §3, §4.5): `key=value`
//! tokens with dot-notation nesting, bracket-index addressing, a
//! JSON-fallback sibling option, and an optional `strict_structure` toggle.
//! Kept behind its own interface, as spec §9 recommends, so the value
//! consumer doesn't need to know dict grammar internals.

use crate::error::DictErrorKind;
use std::collections::BTreeMap;

/// One segment of a dict key path: `a.b[2].c` is `[Key("a"), Key("b"),
/// Index(2), Key("c")]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// The structural value produced by accumulating `Dict` occurrences.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum DictNode {
    Leaf(String),
    Map(BTreeMap<String, DictNode>),
    List(Vec<DictNode>),
}

/// Split a `key=value` token into its path segments and raw value string.
pub(crate) fn parse_pair(token: &str) -> Result<(Vec<Segment>, String), DictErrorKind> {
    let (key, value) = token.split_once('=').ok_or_else(|| DictErrorKind::UnescapedBracket {
        token: token.to_string(),
    })?;
    let segments = parse_key_path(key, token)?;
    Ok((segments, value.to_string()))
}

fn parse_key_path(key: &str, whole_token: &str) -> Result<Vec<Segment>, DictErrorKind> {
    let mut segments = Vec::new();
    for part in key.split('.') {
        segments.extend(parse_key_part(part, whole_token)?);
    }
    if segments.is_empty() {
        return Err(DictErrorKind::UnescapedBracket {
            token: whole_token.to_string(),
        });
    }
    Ok(segments)
}

/// Parse a single dot-separated part, e.g. `name[0][1]`, into a `Key`
/// segment followed by zero or more `Index` segments. A literal bracket
/// character in a name must be escaped as `\[` / `\]`.
fn parse_key_part(part: &str, whole_token: &str) -> Result<Vec<Segment>, DictErrorKind> {
    let mut out = Vec::new();
    let mut name = String::new();
    let mut chars = part.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('[') => name.push('['),
                Some(']') => name.push(']'),
                _ => {
                    return Err(DictErrorKind::UnescapedBracket {
                        token: whole_token.to_string(),
                    })
                }
            },
            '[' => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => {
                            return Err(DictErrorKind::UnescapedBracket {
                                token: whole_token.to_string(),
                            })
                        }
                    }
                }
                if !name.is_empty() {
                    out.push(Segment::Key(std::mem::take(&mut name)));
                }
                let idx: usize = digits.parse().map_err(|_| DictErrorKind::UnescapedBracket {
                    token: whole_token.to_string(),
                })?;
                out.push(Segment::Index(idx));
            }
            ']' => {
                return Err(DictErrorKind::UnescapedBracket {
                    token: whole_token.to_string(),
                })
            }
            c => name.push(c),
        }
    }
    if !name.is_empty() {
        out.push(Segment::Key(name));
    }
    Ok(out)
}

/// Insert `value` at `path` within `tree`, creating intermediate maps/lists
/// as needed. Later writes to the same path win (last-write-wins at the
/// leaf); a path that crosses an existing leaf or changes a node's shape
/// (map vs. list) is only accepted when `strict_structure` is `false`.
pub(crate) fn insert(
    tree: &mut DictNode,
    path: &[Segment],
    value: String,
    strict_structure: bool,
) -> Result<(), DictErrorKind> {
    match path {
        [] => unreachable!("empty paths are rejected by parse_key_path"),
        [Segment::Key(key)] => {
            let map = as_map_mut(tree, strict_structure, key)?;
            map.insert(key.clone(), DictNode::Leaf(value));
            Ok(())
        }
        [Segment::Key(key), rest @ ..] => {
            let map = as_map_mut(tree, strict_structure, key)?;
            let child = map
                .entry(key.clone())
                .or_insert_with(|| empty_for(&rest[0]));
            insert(child, rest, value, strict_structure)
        }
        [Segment::Index(idx)] => {
            let list = as_list_mut(tree, strict_structure, *idx)?;
            set_index(list, *idx, DictNode::Leaf(value), strict_structure)
        }
        [Segment::Index(idx), rest @ ..] => {
            let list = as_list_mut(tree, strict_structure, *idx)?;
            if *idx > list.len() {
                return Err(DictErrorKind::IndexOutOfBoundsPolicy {
                    token: format!("[{idx}]"),
                });
            }
            if *idx == list.len() {
                list.push(empty_for(&rest[0]));
            }
            insert(&mut list[*idx], rest, value, strict_structure)
        }
    }
}

fn empty_for(next: &Segment) -> DictNode {
    match next {
        Segment::Key(_) => DictNode::Map(BTreeMap::new()),
        Segment::Index(_) => DictNode::List(Vec::new()),
    }
}

fn as_map_mut<'a>(
    tree: &'a mut DictNode,
    strict_structure: bool,
    key: &str,
) -> Result<&'a mut BTreeMap<String, DictNode>, DictErrorKind> {
    match tree {
        DictNode::Map(m) => Ok(m),
        DictNode::Leaf(_) | DictNode::List(_) if strict_structure => {
            Err(DictErrorKind::StrictStructureConflict {
                token: key.to_string(),
            })
        }
        other => {
            *other = DictNode::Map(BTreeMap::new());
            match other {
                DictNode::Map(m) => Ok(m),
                _ => unreachable!(),
            }
        }
    }
}

fn as_list_mut<'a>(
    tree: &'a mut DictNode,
    strict_structure: bool,
    idx: usize,
) -> Result<&'a mut Vec<DictNode>, DictErrorKind> {
    match tree {
        DictNode::List(l) => Ok(l),
        DictNode::Leaf(_) | DictNode::Map(_) if strict_structure => {
            Err(DictErrorKind::StrictStructureConflict {
                token: format!("[{idx}]"),
            })
        }
        other => {
            *other = DictNode::List(Vec::new());
            match other {
                DictNode::List(l) => Ok(l),
                _ => unreachable!(),
            }
        }
    }
}

fn set_index(
    list: &mut Vec<DictNode>,
    idx: usize,
    value: DictNode,
    _strict_structure: bool,
) -> Result<(), DictErrorKind> {
    if idx > list.len() {
        return Err(DictErrorKind::IndexOutOfBoundsPolicy {
            token: format!("[{idx}]"),
        });
    }
    if idx == list.len() {
        list.push(value);
    } else {
        list[idx] = value;
    }
    Ok(())
}

/// Structurally merge `incoming` into `base`; on conflicting leaves or
/// shapes the incoming value wins (spec §4.6's `MERGE` accumulation mode).
pub(crate) fn merge(base: &mut DictNode, incoming: DictNode) {
    match (base, incoming) {
        (DictNode::Map(base_map), DictNode::Map(incoming_map)) => {
            for (k, v) in incoming_map {
                match base_map.get_mut(&k) {
                    Some(existing) => merge(existing, v),
                    None => {
                        base_map.insert(k, v);
                    }
                }
            }
        }
        (base_slot, incoming_value) => {
            *base_slot = incoming_value;
        }
    }
}

/// Parse the JSON-fallback sibling's raw value into a [`DictNode`].
pub(crate) fn from_json(raw: &str) -> Result<DictNode, DictErrorKind> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| DictErrorKind::JsonFallbackParseFailure {
            message: e.to_string(),
        })?;
    Ok(json_to_dict(value))
}

fn json_to_dict(value: serde_json::Value) -> DictNode {
    match value {
        serde_json::Value::Array(items) => DictNode::List(items.into_iter().map(json_to_dict).collect()),
        serde_json::Value::Object(map) => {
            DictNode::Map(map.into_iter().map(|(k, v)| (k, json_to_dict(v))).collect())
        }
        serde_json::Value::String(s) => DictNode::Leaf(s),
        other => DictNode::Leaf(other.to_string()),
    }
}
