//! Declarative version-gated extra-map table: HELLO, RUN, BEGIN, PULL and
//! DISCARD each carry an `extra`/top-level map whose legal keys depend on
//! the negotiated Bolt version. Rather than repeating per-message
//! if-version-then-field logic, every message that needs this walks the
//! same small table.

use indexmap::IndexMap;

use crate::errors::{BoltError, Result};
use crate::value::Value;
use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    ListStr,
    Map,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Str, Value::String(_)) => true,
            (FieldKind::Int, Value::Integer(_)) => true,
            (FieldKind::Map, Value::Map(_)) => true,
            (FieldKind::ListStr, Value::List(items)) => items.iter().all(|v| matches!(v, Value::String(_))),
            _ => false,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Str => "a string",
            FieldKind::Int => "an integer",
            FieldKind::ListStr => "a list of strings",
            FieldKind::Map => "a map",
        }
    }
}

/// One row of the version-gated extra-map table: a key, its expected
/// PackStream shape, the version range it's valid in (`None` bound = open),
/// and whether it's mandatory within that range.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub min_version: Option<(u8, u8)>,
    pub max_version: Option<(u8, u8)>,
    pub mandatory: bool,
}

impl FieldSpec {
    const fn new(key: &'static str, kind: FieldKind) -> Self {
        FieldSpec { key, kind, min_version: None, max_version: None, mandatory: false }
    }

    const fn since(mut self, major: u8, minor: u8) -> Self {
        self.min_version = Some((major, minor));
        self
    }

    const fn until(mut self, major: u8, minor: u8) -> Self {
        self.max_version = Some((major, minor));
        self
    }

    const fn required(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn applies_to(&self, version: Version) -> bool {
        let above_min = self.min_version.map_or(true, |(maj, min)| version.at_least(maj, min));
        let below_max = self
            .max_version
            .map_or(true, |(maj, min)| version <= Version::new(maj, min));
        above_min && below_max
    }
}

/// HELLO's `extra` map. `bolt_agent` is itself a nested map; its internal
/// shape (`product` mandatory) is validated by the HELLO message codec, not
/// by this table.
pub const HELLO_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("user_agent", FieldKind::Str).required(),
    FieldSpec::new("scheme", FieldKind::Str).until(5, 0),
    FieldSpec::new("principal", FieldKind::Str).until(5, 0),
    FieldSpec::new("credentials", FieldKind::Str).until(5, 0),
    FieldSpec::new("routing", FieldKind::Map).since(4, 1),
    FieldSpec::new("patch_bolt", FieldKind::ListStr).since(4, 3).until(4, 4),
    FieldSpec::new("notifications_minimum_severity", FieldKind::Str).since(5, 2),
    FieldSpec::new("notifications_disabled_categories", FieldKind::ListStr).since(5, 2),
    FieldSpec::new("bolt_agent", FieldKind::Map).since(5, 3).required(),
];

/// Shared by RUN's `extra` and BEGIN's `extra`: BEGIN carries the same keys
/// as RUN's extra, minus the query itself.
pub const RUN_EXTRA_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("bookmarks", FieldKind::ListStr).since(3, 0),
    FieldSpec::new("tx_timeout", FieldKind::Int).since(3, 0),
    FieldSpec::new("tx_metadata", FieldKind::Map).since(3, 0),
    FieldSpec::new("mode", FieldKind::Str).since(3, 0),
    FieldSpec::new("db", FieldKind::Str).since(4, 0),
    FieldSpec::new("imp_user", FieldKind::Str).since(4, 4),
    FieldSpec::new("notifications_minimum_severity", FieldKind::Str).since(5, 2),
    FieldSpec::new("notifications_disabled_categories", FieldKind::ListStr).since(5, 2),
];

/// PULL and DISCARD share this shape.
pub const PULL_DISCARD_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("n", FieldKind::Int).required(),
    FieldSpec::new("qid", FieldKind::Int),
];

/// Splits a decoded extra map into (typed known fields, passthrough other
/// fields), validating the shape of every key the table recognizes at
/// `version`. A key outside its table row's version window is treated the
/// same as a key the table doesn't recognize at all: forwarded verbatim
/// under `other_extra_tokens` rather than type-checked. Unknown keys are
/// never an error.
pub fn split_known_fields(
    map: IndexMap<String, Value>,
    table: &[FieldSpec],
    version: Version,
) -> Result<(IndexMap<String, Value>, IndexMap<String, Value>)> {
    let mut known = IndexMap::new();
    let mut other = IndexMap::new();
    for (key, value) in map {
        match table.iter().find(|f| f.key == key && f.applies_to(version)) {
            Some(spec) if spec.kind.matches(&value) => {
                known.insert(key, value);
            }
            Some(spec) => {
                return Err(BoltError::InvalidMessageFormat(format!(
                    "field '{key}' must be {}",
                    spec.kind.name()
                )))
            }
            None => {
                other.insert(key, value);
            }
        }
    }
    Ok((known, other))
}

/// Verifies every mandatory key applicable at `version` is present in
/// `known` (used after [`split_known_fields`]).
pub fn check_mandatory(known: &IndexMap<String, Value>, table: &[FieldSpec], version: Version) -> Result<()> {
    for spec in table {
        if spec.mandatory && spec.applies_to(version) && !known.contains_key(spec.key) {
            return Err(BoltError::InvalidMessageFormat(format!(
                "missing mandatory field '{}'",
                spec.key
            )));
        }
    }
    Ok(())
}

/// Builds an extra map from (key, optional value) pairs, keeping only the
/// ones present, gated by the table's version window, then appending any
/// passthrough tokens. Used by every message's `serialize_*`.
pub fn build_extra_map(
    pairs: &[(&'static str, Option<Value>)],
    table: &[FieldSpec],
    version: Version,
    other_tokens: &IndexMap<String, Value>,
) -> IndexMap<String, Value> {
    let mut map = IndexMap::new();
    for (key, value) in pairs {
        if let Some(value) = value {
            if table.iter().any(|f| f.key == *key && f.applies_to(version)) {
                map.insert((*key).to_string(), value.clone());
            }
        }
    }
    for (key, value) in other_tokens {
        map.insert(key.clone(), value.clone());
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_bolt_only_applies_within_its_window() {
        let spec = HELLO_FIELDS.iter().find(|f| f.key == "patch_bolt").unwrap();
        assert!(!spec.applies_to(Version::new(4, 2)));
        assert!(spec.applies_to(Version::new(4, 3)));
        assert!(spec.applies_to(Version::new(4, 4)));
        assert!(!spec.applies_to(Version::new(5, 0)));
    }

    #[test]
    fn bolt_agent_required_only_from_5_3() {
        let spec = HELLO_FIELDS.iter().find(|f| f.key == "bolt_agent").unwrap();
        assert!(!spec.applies_to(Version::new(5, 2)));
        assert!(spec.applies_to(Version::new(5, 3)));
    }

    #[test]
    fn inline_auth_fields_stop_applying_after_5_0() {
        for key in ["scheme", "principal", "credentials"] {
            let spec = HELLO_FIELDS.iter().find(|f| f.key == key).unwrap();
            assert!(spec.applies_to(Version::new(5, 0)));
            assert!(!spec.applies_to(Version::new(5, 1)));
        }
    }

    #[test]
    fn split_rejects_wrong_typed_known_field() {
        let mut map = IndexMap::new();
        map.insert("n".to_string(), Value::String("not an int".to_string()));
        let err = split_known_fields(map, PULL_DISCARD_FIELDS, Version::new(5, 0)).unwrap_err();
        assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
    }

    #[test]
    fn split_forwards_unknown_keys() {
        let mut map = IndexMap::new();
        map.insert("n".to_string(), Value::Integer(-1));
        map.insert("x-custom".to_string(), Value::Boolean(true));
        let (known, other) = split_known_fields(map, PULL_DISCARD_FIELDS, Version::new(5, 0)).unwrap();
        assert_eq!(known.get("n"), Some(&Value::Integer(-1)));
        assert_eq!(other.get("x-custom"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn check_mandatory_flags_missing_user_agent() {
        let known = IndexMap::new();
        let err = check_mandatory(&known, HELLO_FIELDS, Version::new(5, 0)).unwrap_err();
        assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
    }
}
