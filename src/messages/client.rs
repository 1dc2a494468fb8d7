//! Client request serializers. Each takes a parameter struct and the
//! negotiated version and appends one PackStream `Structure` to the
//! writer; errors leave the writer poisoned, same as
//! [`crate::packstream::PackStreamWriter`] already guarantees.

use std::io::Write;

use indexmap::IndexMap;

use crate::errors::{BoltError, Result};
use crate::packstream::PackStreamWriter;
use crate::value::{Structure, Value};
use crate::version::Version;

use super::extra::{build_extra_map, check_mandatory, split_known_fields, HELLO_FIELDS, RUN_EXTRA_FIELDS};
use super::tags::MessageTag;

#[derive(Debug, Clone, Default)]
pub struct BoltAgentInfo {
    pub product: String,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub language_details: Option<String>,
}

impl BoltAgentInfo {
    fn to_value(&self) -> Value {
        let mut m = IndexMap::new();
        m.insert("product".to_string(), Value::String(self.product.clone()));
        if let Some(v) = &self.platform {
            m.insert("platform".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &self.language {
            m.insert("language".to_string(), Value::String(v.clone()));
        }
        if let Some(v) = &self.language_details {
            m.insert("language_details".to_string(), Value::String(v.clone()));
        }
        Value::Map(m)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HelloParams {
    pub user_agent: String,
    pub auth_scheme: Option<String>,
    pub auth_principal: Option<String>,
    pub auth_credentials: Option<String>,
    pub routing_context: Option<IndexMap<String, Value>>,
    pub patch_bolt: Option<Vec<String>>,
    pub notifications_minimum_severity: Option<String>,
    pub notifications_disabled_categories: Option<Vec<String>>,
    pub bolt_agent: Option<BoltAgentInfo>,
    pub other_extra_tokens: IndexMap<String, Value>,
}

fn list_str(items: &Option<Vec<String>>) -> Option<Value> {
    items.as_ref().map(|v| Value::List(v.iter().cloned().map(Value::String).collect()))
}

pub fn serialize_hello<W: Write>(params: &HelloParams, writer: &mut PackStreamWriter<W>, version: Version) -> Result<()> {
    if version.at_least(5, 3) && params.bolt_agent.is_none() {
        return Err(BoltError::SerializationError(
            "bolt_agent is mandatory for HELLO at Bolt 5.3+".to_string(),
        ));
    }
    let pairs: Vec<(&'static str, Option<Value>)> = vec![
        ("user_agent", Some(Value::String(params.user_agent.clone()))),
        ("scheme", params.auth_scheme.clone().map(Value::String)),
        ("principal", params.auth_principal.clone().map(Value::String)),
        ("credentials", params.auth_credentials.clone().map(Value::String)),
        ("routing", params.routing_context.clone().map(Value::Map)),
        ("patch_bolt", list_str(&params.patch_bolt)),
        (
            "notifications_minimum_severity",
            params.notifications_minimum_severity.clone().map(Value::String),
        ),
        (
            "notifications_disabled_categories",
            list_str(&params.notifications_disabled_categories),
        ),
        ("bolt_agent", params.bolt_agent.as_ref().map(BoltAgentInfo::to_value)),
    ];
    let extra = build_extra_map(&pairs, HELLO_FIELDS, version, &params.other_extra_tokens);
    let structure = Structure::new(MessageTag::Hello.byte(), vec![Value::Map(extra)]);
    writer.write_value(&Value::Structure(structure))
}

/// Decodes a HELLO structure (used by test harnesses acting as a mock
/// server; the connection state machine never receives HELLO itself).
pub fn deserialize_hello(structure: &Structure, version: Version) -> Result<HelloParams> {
    if structure.tag != MessageTag::Hello.byte() || structure.fields.len() != 1 {
        return Err(BoltError::InvalidMessageFormat("malformed HELLO structure".to_string()));
    }
    let map = structure.fields[0]
        .as_map()
        .ok_or_else(|| BoltError::InvalidMessageFormat("HELLO extra must be a map".to_string()))?
        .clone();
    let (known, other) = split_known_fields(map, HELLO_FIELDS, version)?;
    check_mandatory(&known, HELLO_FIELDS, version)?;
    let user_agent = known
        .get("user_agent")
        .and_then(Value::as_str)
        .ok_or_else(|| BoltError::InvalidMessageFormat("missing field 'user_agent'".to_string()))?
        .to_string();
    let bolt_agent = known.get("bolt_agent").and_then(Value::as_map).map(|m| BoltAgentInfo {
        product: m.get("product").and_then(Value::as_str).unwrap_or_default().to_string(),
        platform: m.get("platform").and_then(Value::as_str).map(str::to_string),
        language: m.get("language").and_then(Value::as_str).map(str::to_string),
        language_details: m.get("language_details").and_then(Value::as_str).map(str::to_string),
    });
    Ok(HelloParams {
        user_agent,
        auth_scheme: known.get("scheme").and_then(Value::as_str).map(str::to_string),
        auth_principal: known.get("principal").and_then(Value::as_str).map(str::to_string),
        auth_credentials: known.get("credentials").and_then(Value::as_str).map(str::to_string),
        routing_context: known.get("routing").and_then(Value::as_map).cloned(),
        patch_bolt: known.get("patch_bolt").and_then(Value::as_list).map(|l| {
            l.iter().filter_map(Value::as_str).map(str::to_string).collect()
        }),
        notifications_minimum_severity: known
            .get("notifications_minimum_severity")
            .and_then(Value::as_str)
            .map(str::to_string),
        notifications_disabled_categories: known.get("notifications_disabled_categories").and_then(Value::as_list).map(|l| {
            l.iter().filter_map(Value::as_str).map(str::to_string).collect()
        }),
        bolt_agent,
        other_extra_tokens: other,
    })
}

#[derive(Debug, Clone, Default)]
pub struct LogonParams {
    pub auth_tokens: IndexMap<String, Value>,
}

pub fn serialize_logon<W: Write>(params: &LogonParams, writer: &mut PackStreamWriter<W>) -> Result<()> {
    let structure = Structure::new(MessageTag::Logon.byte(), vec![Value::Map(params.auth_tokens.clone())]);
    writer.write_value(&Value::Structure(structure))
}

pub fn serialize_logoff<W: Write>(writer: &mut PackStreamWriter<W>) -> Result<()> {
    writer.write_value(&Value::Structure(Structure::new(MessageTag::Logoff.byte(), vec![])))
}

#[derive(Debug, Clone, Default)]
pub struct RunExtra {
    pub bookmarks: Option<Vec<String>>,
    pub tx_timeout: Option<i64>,
    pub tx_metadata: Option<IndexMap<String, Value>>,
    pub mode: Option<String>,
    pub db: Option<String>,
    pub imp_user: Option<String>,
    pub notifications_minimum_severity: Option<String>,
    pub notifications_disabled_categories: Option<Vec<String>>,
    pub other_extra_tokens: IndexMap<String, Value>,
}

impl RunExtra {
    fn to_map(&self, version: Version) -> IndexMap<String, Value> {
        let pairs: Vec<(&'static str, Option<Value>)> = vec![
            ("bookmarks", list_str(&self.bookmarks)),
            ("tx_timeout", self.tx_timeout.map(Value::Integer)),
            ("tx_metadata", self.tx_metadata.clone().map(Value::Map)),
            ("mode", self.mode.clone().map(Value::String)),
            ("db", self.db.clone().map(Value::String)),
            ("imp_user", self.imp_user.clone().map(Value::String)),
            (
                "notifications_minimum_severity",
                self.notifications_minimum_severity.clone().map(Value::String),
            ),
            (
                "notifications_disabled_categories",
                list_str(&self.notifications_disabled_categories),
            ),
        ];
        build_extra_map(&pairs, RUN_EXTRA_FIELDS, version, &self.other_extra_tokens)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub query: String,
    pub parameters: IndexMap<String, Value>,
    pub extra: RunExtra,
}

pub fn serialize_run<W: Write>(params: &RunParams, writer: &mut PackStreamWriter<W>, version: Version) -> Result<()> {
    let structure = Structure::new(
        MessageTag::Run.byte(),
        vec![
            Value::String(params.query.clone()),
            Value::Map(params.parameters.clone()),
            Value::Map(params.extra.to_map(version)),
        ],
    );
    writer.write_value(&Value::Structure(structure))
}

/// Decodes a RUN structure (test-harness use, mirroring [`deserialize_hello`]).
pub fn deserialize_run(structure: &Structure, version: Version) -> Result<RunParams> {
    if structure.tag != MessageTag::Run.byte() || structure.fields.len() != 3 {
        return Err(BoltError::InvalidMessageFormat("malformed RUN structure".to_string()));
    }
    let query = structure.fields[0]
        .as_str()
        .ok_or_else(|| BoltError::InvalidMessageFormat("RUN query must be a string".to_string()))?
        .to_string();
    let parameters = structure.fields[1]
        .as_map()
        .ok_or_else(|| BoltError::InvalidMessageFormat("RUN parameters must be a map".to_string()))?
        .clone();
    let extra_map = structure.fields[2]
        .as_map()
        .ok_or_else(|| BoltError::InvalidMessageFormat("RUN extra must be a map".to_string()))?
        .clone();
    let (known, other) = split_known_fields(extra_map, RUN_EXTRA_FIELDS, version)?;
    let extra = RunExtra {
        bookmarks: known.get("bookmarks").and_then(Value::as_list).map(|l| {
            l.iter().filter_map(Value::as_str).map(str::to_string).collect()
        }),
        tx_timeout: known.get("tx_timeout").and_then(Value::as_integer),
        tx_metadata: known.get("tx_metadata").and_then(Value::as_map).cloned(),
        mode: known.get("mode").and_then(Value::as_str).map(str::to_string),
        db: known.get("db").and_then(Value::as_str).map(str::to_string),
        imp_user: known.get("imp_user").and_then(Value::as_str).map(str::to_string),
        notifications_minimum_severity: known
            .get("notifications_minimum_severity")
            .and_then(Value::as_str)
            .map(str::to_string),
        notifications_disabled_categories: known.get("notifications_disabled_categories").and_then(Value::as_list).map(|l| {
            l.iter().filter_map(Value::as_str).map(str::to_string).collect()
        }),
        other_extra_tokens: other,
    };
    Ok(RunParams { query, parameters, extra })
}

#[derive(Debug, Clone, Default)]
pub struct BeginParams {
    pub extra: RunExtra,
}

pub fn serialize_begin<W: Write>(params: &BeginParams, writer: &mut PackStreamWriter<W>, version: Version) -> Result<()> {
    let structure = Structure::new(MessageTag::Begin.byte(), vec![Value::Map(params.extra.to_map(version))]);
    writer.write_value(&Value::Structure(structure))
}

pub fn serialize_commit<W: Write>(writer: &mut PackStreamWriter<W>) -> Result<()> {
    writer.write_value(&Value::Structure(Structure::new(MessageTag::Commit.byte(), vec![Value::Map(IndexMap::new())])))
}

pub fn serialize_rollback<W: Write>(writer: &mut PackStreamWriter<W>) -> Result<()> {
    writer.write_value(&Value::Structure(Structure::new(MessageTag::Rollback.byte(), vec![Value::Map(IndexMap::new())])))
}

#[derive(Debug, Clone, Default)]
pub struct PullParams {
    pub n: i64,
    pub qid: Option<i64>,
}

fn pull_discard_map(n: i64, qid: Option<i64>) -> IndexMap<String, Value> {
    let mut m = IndexMap::new();
    m.insert("n".to_string(), Value::Integer(n));
    if let Some(qid) = qid {
        m.insert("qid".to_string(), Value::Integer(qid));
    }
    m
}

pub fn serialize_pull<W: Write>(params: &PullParams, writer: &mut PackStreamWriter<W>) -> Result<()> {
    let structure = Structure::new(MessageTag::Pull.byte(), vec![Value::Map(pull_discard_map(params.n, params.qid))]);
    writer.write_value(&Value::Structure(structure))
}

#[derive(Debug, Clone, Default)]
pub struct DiscardParams {
    pub n: i64,
    pub qid: Option<i64>,
}

pub fn serialize_discard<W: Write>(params: &DiscardParams, writer: &mut PackStreamWriter<W>) -> Result<()> {
    let structure = Structure::new(MessageTag::Discard.byte(), vec![Value::Map(pull_discard_map(params.n, params.qid))]);
    writer.write_value(&Value::Structure(structure))
}

pub fn serialize_reset<W: Write>(writer: &mut PackStreamWriter<W>) -> Result<()> {
    writer.write_value(&Value::Structure(Structure::new(MessageTag::Reset.byte(), vec![])))
}

pub fn serialize_goodbye<W: Write>(writer: &mut PackStreamWriter<W>) -> Result<()> {
    writer.write_value(&Value::Structure(Structure::new(MessageTag::Goodbye.byte(), vec![])))
}

#[derive(Debug, Clone, Default)]
pub struct RouteParams {
    pub routing_context: IndexMap<String, Value>,
    pub bookmarks: Vec<String>,
    pub db: Option<String>,
    pub imp_user: Option<String>,
}

/// ROUTE's shape changed twice: <4.4 three fields with a nullable `db`
/// string; 4.4 three fields with an `extra` map wrapping `db`/`imp_user`;
/// 5.0+ four flat top-level fields.
pub fn serialize_route<W: Write>(params: &RouteParams, writer: &mut PackStreamWriter<W>, version: Version) -> Result<()> {
    let routing_context = Value::Map(params.routing_context.clone());
    let bookmarks = Value::List(params.bookmarks.iter().cloned().map(Value::String).collect());
    let fields = if version.at_least(5, 0) {
        vec![
            routing_context,
            bookmarks,
            params.db.clone().map(Value::String).unwrap_or(Value::Null),
            params.imp_user.clone().map(Value::String).unwrap_or(Value::Null),
        ]
    } else if version.at_least(4, 4) {
        let mut extra = IndexMap::new();
        if let Some(db) = &params.db {
            extra.insert("db".to_string(), Value::String(db.clone()));
        }
        if let Some(imp_user) = &params.imp_user {
            extra.insert("imp_user".to_string(), Value::String(imp_user.clone()));
        }
        vec![routing_context, bookmarks, Value::Map(extra)]
    } else {
        vec![
            routing_context,
            bookmarks,
            params.db.clone().map(Value::String).unwrap_or(Value::Null),
        ]
    };
    writer.write_value(&Value::Structure(Structure::new(MessageTag::Route.byte(), fields)))
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryParams {
    pub metadata: IndexMap<String, Value>,
}

pub fn serialize_telemetry<W: Write>(params: &TelemetryParams, writer: &mut PackStreamWriter<W>) -> Result<()> {
    let structure = Structure::new(MessageTag::Telemetry.byte(), vec![Value::Map(params.metadata.clone())]);
    writer.write_value(&Value::Structure(structure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut PackStreamWriter<Vec<u8>>) -> Result<()>) -> Value {
        let mut w = PackStreamWriter::new(Vec::new());
        f(&mut w).unwrap();
        let bytes = w.into_inner();
        crate::packstream::decode(&bytes).unwrap()
    }

    #[test]
    fn hello_requires_bolt_agent_at_5_3() {
        let params = HelloParams { user_agent: "lib/0.1".to_string(), ..Default::default() };
        let mut w = PackStreamWriter::new(Vec::new());
        let err = serialize_hello(&params, &mut w, Version::new(5, 3)).unwrap_err();
        assert!(matches!(err, BoltError::SerializationError(_)));
    }

    #[test]
    fn hello_encodes_user_agent_and_bolt_agent() {
        let params = HelloParams {
            user_agent: "lib/0.1".to_string(),
            bolt_agent: Some(BoltAgentInfo { product: "lib/0.1".to_string(), ..Default::default() }),
            ..Default::default()
        };
        let value = written(|w| serialize_hello(&params, w, Version::new(5, 3)));
        let s = value.as_structure().unwrap();
        assert_eq!(s.tag, MessageTag::Hello.byte());
        let extra = s.fields[0].as_map().unwrap();
        assert_eq!(extra.get("user_agent").unwrap().as_str(), Some("lib/0.1"));
        assert!(extra.contains_key("bolt_agent"));
    }

    #[test]
    fn hello_omits_patch_bolt_outside_its_version_window() {
        let params = HelloParams {
            user_agent: "lib/0.1".to_string(),
            patch_bolt: Some(vec!["utc".to_string()]),
            ..Default::default()
        };
        let value = written(|w| serialize_hello(&params, w, Version::new(5, 0)));
        let extra = value.as_structure().unwrap().fields[0].as_map().unwrap();
        assert!(!extra.contains_key("patch_bolt"));
    }

    #[test]
    fn run_encodes_query_params_and_gated_extra() {
        let params = RunParams {
            query: "RETURN 1".to_string(),
            parameters: IndexMap::new(),
            extra: RunExtra { db: Some("neo4j".to_string()), imp_user: Some("alice".to_string()), ..Default::default() },
        };
        let value = written(|w| serialize_run(&params, w, Version::new(4, 0)));
        let s = value.as_structure().unwrap();
        assert_eq!(s.fields[0].as_str(), Some("RETURN 1"));
        let extra = s.fields[2].as_map().unwrap();
        assert!(extra.contains_key("db"));
        assert!(!extra.contains_key("imp_user")); // imp_user needs >=4.4
    }

    #[test]
    fn commit_and_rollback_are_empty_map_structures() {
        let value = written(|w| serialize_commit(w));
        let s = value.as_structure().unwrap();
        assert_eq!(s.tag, MessageTag::Commit.byte());
        assert_eq!(s.fields.len(), 1);
        assert_eq!(s.fields[0].as_map().unwrap().len(), 0);
    }

    #[test]
    fn reset_and_goodbye_have_no_fields() {
        let value = written(|w| serialize_reset(w));
        assert_eq!(value.as_structure().unwrap().fields.len(), 0);
        let value = written(|w| serialize_goodbye(w));
        assert_eq!(value.as_structure().unwrap().fields.len(), 0);
    }

    #[test]
    fn route_shape_changes_by_version() {
        let params = RouteParams { db: Some("neo4j".to_string()), ..Default::default() };
        let pre44 = written(|w| serialize_route(&params, w, Version::new(4, 3)));
        assert_eq!(pre44.as_structure().unwrap().fields.len(), 3);
        assert_eq!(pre44.as_structure().unwrap().fields[2].as_str(), Some("neo4j"));

        let at44 = written(|w| serialize_route(&params, w, Version::new(4, 4)));
        let extra44 = at44.as_structure().unwrap().fields[2].as_map().unwrap();
        assert_eq!(extra44.get("db").unwrap().as_str(), Some("neo4j"));

        let at50 = written(|w| serialize_route(&params, w, Version::new(5, 0)));
        assert_eq!(at50.as_structure().unwrap().fields.len(), 4);
    }

    #[test]
    fn deserialize_hello_requires_user_agent() {
        let mut m = IndexMap::new();
        m.insert("scheme".to_string(), Value::String("basic".to_string()));
        let s = Structure::new(MessageTag::Hello.byte(), vec![Value::Map(m)]);
        let err = deserialize_hello(&s, Version::new(5, 0)).unwrap_err();
        assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
    }

    #[test]
    fn deserialize_run_rejects_non_string_query() {
        let s = Structure::new(
            MessageTag::Run.byte(),
            vec![Value::Integer(1), Value::Map(IndexMap::new()), Value::Map(IndexMap::new())],
        );
        let err = deserialize_run(&s, Version::new(5, 0)).unwrap_err();
        assert!(matches!(err, BoltError::InvalidMessageFormat(_)));
    }

    #[test]
    fn hello_roundtrips_through_deserialize() {
        let params = HelloParams {
            user_agent: "lib/0.1".to_string(),
            bolt_agent: Some(BoltAgentInfo { product: "lib/0.1".to_string(), ..Default::default() }),
            ..Default::default()
        };
        let mut w = PackStreamWriter::new(Vec::new());
        serialize_hello(&params, &mut w, Version::new(5, 3)).unwrap();
        let bytes = w.into_inner();
        let value = crate::packstream::decode(&bytes).unwrap();
        let decoded = deserialize_hello(value.as_structure().unwrap(), Version::new(5, 3)).unwrap();
        assert_eq!(decoded.user_agent, "lib/0.1");
        assert_eq!(decoded.bolt_agent.unwrap().product, "lib/0.1");
    }

    #[test]
    fn pull_encodes_n_and_optional_qid() {
        let params = PullParams { n: -1, qid: Some(7) };
        let value = written(|w| serialize_pull(&params, w));
        let extra = value.as_structure().unwrap().fields[0].as_map().unwrap();
        assert_eq!(extra.get("n"), Some(&Value::Integer(-1)));
        assert_eq!(extra.get("qid"), Some(&Value::Integer(7)));
    }
}
