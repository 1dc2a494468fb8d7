//! Server reply deserializers and the single decode-then-inspect entry
//! point every other decoder is built on.

use indexmap::IndexMap;

use crate::errors::{missing_field, BoltError, Result};
use crate::packstream;
use crate::value::{Structure, Value};

use super::tags::MessageTag;

/// Fully decodes one PackStream value and inspects its tag, rather than
/// attempting to peek the structure header before consuming it (peeking a
/// partially-consumed stream is unreliable once bytes have been read off
/// it). Every `deserialize_*` in this module is built on top of this,
/// never on a partial parse.
pub fn decode_message_envelope(bytes: &[u8]) -> Result<(MessageTag, Structure)> {
    let value = packstream::decode(bytes)?;
    let structure = match value {
        Value::Structure(s) => s,
        other => {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected a message Structure, got {:?}",
                other.kind()
            )))
        }
    };
    let tag = MessageTag::from_byte(structure.tag)?;
    Ok((tag, structure))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessageParams {
    pub metadata: IndexMap<String, Value>,
}

pub fn deserialize_success(structure: &Structure) -> Result<SuccessMessageParams> {
    if structure.fields.len() != 1 {
        return Err(BoltError::InvalidMessageFormat(format!(
            "SUCCESS has {} fields, expected 1",
            structure.fields.len()
        )));
    }
    let metadata = structure.fields[0]
        .as_map()
        .ok_or_else(|| BoltError::InvalidMessageFormat("SUCCESS metadata must be a map".to_string()))?
        .clone();
    Ok(SuccessMessageParams { metadata })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailureMessageParams {
    pub code: String,
    pub message: String,
    pub metadata: IndexMap<String, Value>,
}

pub fn deserialize_failure(structure: &Structure) -> Result<FailureMessageParams> {
    if structure.fields.len() != 1 {
        return Err(BoltError::InvalidMessageFormat(format!(
            "FAILURE has {} fields, expected 1",
            structure.fields.len()
        )));
    }
    let metadata = structure.fields[0]
        .as_map()
        .ok_or_else(|| BoltError::InvalidMessageFormat("FAILURE metadata must be a map".to_string()))?
        .clone();
    let code = metadata
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| missing_field("code"))?
        .to_string();
    let message = metadata
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| missing_field("message"))?
        .to_string();
    Ok(FailureMessageParams { code, message, metadata })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMessageParams {
    pub fields: Vec<Value>,
}

pub fn deserialize_record(structure: &Structure) -> Result<RecordMessageParams> {
    if structure.fields.len() != 1 {
        return Err(BoltError::InvalidMessageFormat(format!(
            "RECORD has {} fields, expected 1",
            structure.fields.len()
        )));
    }
    let fields = structure.fields[0]
        .as_list()
        .ok_or_else(|| BoltError::InvalidMessageFormat("RECORD fields must be a list".to_string()))?
        .to_vec();
    Ok(RecordMessageParams { fields })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgnoredMessageParams {
    pub metadata: IndexMap<String, Value>,
}

/// `code_or_default` fills in `code = "Neo.ClientError.Request.Ignored"`
/// when the server omitted it: IGNORED carries `{}` or `{metadata}`, and
/// callers shouldn't have to special-case the empty form.
pub fn deserialize_ignored(structure: &Structure) -> Result<IgnoredMessageParams> {
    let metadata = match structure.fields.len() {
        0 => IndexMap::new(),
        1 => structure.fields[0]
            .as_map()
            .ok_or_else(|| BoltError::InvalidMessageFormat("IGNORED metadata must be a map".to_string()))?
            .clone(),
        n => {
            return Err(BoltError::InvalidMessageFormat(format!(
                "IGNORED has {n} fields, expected 0 or 1"
            )))
        }
    };
    Ok(IgnoredMessageParams { metadata })
}

pub const IGNORED_DEFAULT_CODE: &str = "Neo.ClientError.Request.Ignored";

impl IgnoredMessageParams {
    pub fn code_or_default(&self) -> String {
        self.metadata
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| IGNORED_DEFAULT_CODE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::PackStreamWriter;

    fn envelope(tag: u8, fields: Vec<Value>) -> Vec<u8> {
        let mut w = PackStreamWriter::new(Vec::new());
        w.write_value(&Value::Structure(Structure::new(tag, fields))).unwrap();
        w.into_inner()
    }

    #[test]
    fn decodes_success_envelope() {
        let mut m = IndexMap::new();
        m.insert("connection_id".to_string(), Value::String("c-1".to_string()));
        let bytes = envelope(MessageTag::Success.byte(), vec![Value::Map(m)]);
        let (tag, structure) = decode_message_envelope(&bytes).unwrap();
        assert_eq!(tag, MessageTag::Success);
        let parsed = deserialize_success(&structure).unwrap();
        assert_eq!(parsed.metadata.get("connection_id").unwrap().as_str(), Some("c-1"));
    }

    #[test]
    fn decodes_failure_and_requires_code_and_message() {
        let mut m = IndexMap::new();
        m.insert("code".to_string(), Value::String("Neo.ClientError.Statement.SyntaxError".to_string()));
        m.insert("message".to_string(), Value::String("bad query".to_string()));
        let bytes = envelope(MessageTag::Failure.byte(), vec![Value::Map(m)]);
        let (tag, structure) = decode_message_envelope(&bytes).unwrap();
        assert_eq!(tag, MessageTag::Failure);
        let parsed = deserialize_failure(&structure).unwrap();
        assert_eq!(parsed.code, "Neo.ClientError.Statement.SyntaxError");
    }

    #[test]
    fn failure_missing_code_is_invalid_format() {
        let mut m = IndexMap::new();
        m.insert("message".to_string(), Value::String("bad".to_string()));
        let structure = Structure::new(MessageTag::Failure.byte(), vec![Value::Map(m)]);
        assert!(deserialize_failure(&structure).is_err());
    }

    #[test]
    fn decodes_record_fields() {
        let structure = Structure::new(MessageTag::Record.byte(), vec![Value::List(vec![Value::Integer(1)])]);
        let parsed = deserialize_record(&structure).unwrap();
        assert_eq!(parsed.fields, vec![Value::Integer(1)]);
    }

    #[test]
    fn ignored_synthesizes_default_code_when_absent() {
        let empty = Structure::new(MessageTag::Ignored.byte(), vec![]);
        let parsed = deserialize_ignored(&empty).unwrap();
        assert_eq!(parsed.code_or_default(), IGNORED_DEFAULT_CODE);

        let mut m = IndexMap::new();
        m.insert("code".to_string(), Value::String("Neo.ClientError.Custom".to_string()));
        let with_code = Structure::new(MessageTag::Ignored.byte(), vec![Value::Map(m)]);
        let parsed = deserialize_ignored(&with_code).unwrap();
        assert_eq!(parsed.code_or_default(), "Neo.ClientError.Custom");
    }
}
