use indexmap::IndexMap;

use crate::errors::{BoltError, Result};
use crate::value::{Structure, Value};
use crate::version::Version;

use super::tags;

/// Tag 0x4E. Pre-5.0 wire shape carries the first 3 fields only; 5.0+ adds
/// `element_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: IndexMap<String, Value>,
    pub element_id: Option<String>,
}

impl Node {
    pub fn to_packstream(&self, version: Version) -> Structure {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::List(self.labels.iter().cloned().map(Value::String).collect()),
            Value::Map(self.properties.clone()),
        ];
        if version.at_least(5, 0) {
            fields.push(match &self.element_id {
                Some(id) => Value::String(id.clone()),
                None => Value::Null,
            });
        }
        Structure::new(tags::NODE, fields)
    }

    pub fn from_packstream(s: &Structure, version: Version) -> Result<Self> {
        if s.tag != tags::NODE {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected Node tag 0x{:02X}, got 0x{:02X}",
                tags::NODE,
                s.tag
            )));
        }
        let minimal = s.fields.len() == 3;
        let extended = s.fields.len() == 4;
        if !minimal && !extended {
            return Err(BoltError::InvalidMessageFormat(format!(
                "Node has {} fields, expected 3 (pre-5.0) or 4 (5.0+)",
                s.fields.len()
            )));
        }
        let _ = version;
        let id = s.fields[0]
            .as_integer()
            .ok_or_else(|| BoltError::InvalidMessageFormat("Node.id must be an integer".into()))?;
        let labels = s.fields[1]
            .as_list()
            .ok_or_else(|| BoltError::InvalidMessageFormat("Node.labels must be a list".into()))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| BoltError::InvalidMessageFormat("Node.labels must be strings".into()))
            })
            .collect::<Result<Vec<_>>>()?;
        let properties = s.fields[2]
            .as_map()
            .ok_or_else(|| BoltError::InvalidMessageFormat("Node.properties must be a map".into()))?
            .clone();
        let element_id = if extended {
            match &s.fields[3] {
                Value::Null => None,
                Value::String(id) => Some(id.clone()),
                _ => {
                    return Err(BoltError::InvalidMessageFormat(
                        "Node.element_id must be a string or null".into(),
                    ))
                }
            }
        } else {
            None
        };
        Ok(Node { id, labels, properties, element_id })
    }
}

/// Tag 0x52. Pre-5.0 carries the first 5 fields only; 5.0+ adds the three
/// element-id fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i64,
    pub start_node_id: i64,
    pub end_node_id: i64,
    pub rel_type: String,
    pub properties: IndexMap<String, Value>,
    pub element_id: Option<String>,
    pub start_node_element_id: Option<String>,
    pub end_node_element_id: Option<String>,
}

impl Relationship {
    pub fn to_packstream(&self, version: Version) -> Structure {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::Integer(self.start_node_id),
            Value::Integer(self.end_node_id),
            Value::String(self.rel_type.clone()),
            Value::Map(self.properties.clone()),
        ];
        if version.at_least(5, 0) {
            fields.push(opt_string(&self.element_id));
            fields.push(opt_string(&self.start_node_element_id));
            fields.push(opt_string(&self.end_node_element_id));
        }
        Structure::new(tags::RELATIONSHIP, fields)
    }

    pub fn from_packstream(s: &Structure, _version: Version) -> Result<Self> {
        if s.tag != tags::RELATIONSHIP {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected Relationship tag 0x{:02X}, got 0x{:02X}",
                tags::RELATIONSHIP,
                s.tag
            )));
        }
        let minimal = s.fields.len() == 5;
        let extended = s.fields.len() == 8;
        if !minimal && !extended {
            return Err(BoltError::InvalidMessageFormat(format!(
                "Relationship has {} fields, expected 5 (pre-5.0) or 8 (5.0+)",
                s.fields.len()
            )));
        }
        let id = require_int(&s.fields[0], "Relationship.id")?;
        let start_node_id = require_int(&s.fields[1], "Relationship.startNodeId")?;
        let end_node_id = require_int(&s.fields[2], "Relationship.endNodeId")?;
        let rel_type = require_string(&s.fields[3], "Relationship.type")?;
        let properties = require_map(&s.fields[4], "Relationship.properties")?;
        let (element_id, start_node_element_id, end_node_element_id) = if extended {
            (
                require_opt_string(&s.fields[5], "Relationship.element_id")?,
                require_opt_string(&s.fields[6], "Relationship.start_node_element_id")?,
                require_opt_string(&s.fields[7], "Relationship.end_node_element_id")?,
            )
        } else {
            (None, None, None)
        };
        Ok(Relationship {
            id,
            start_node_id,
            end_node_id,
            rel_type,
            properties,
            element_id,
            start_node_element_id,
            end_node_element_id,
        })
    }
}

/// Tag 0x72. The form a `Relationship` takes inside a `Path`, without
/// endpoint ids (the path's node list supplies those).
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundRelationship {
    pub id: i64,
    pub rel_type: String,
    pub properties: IndexMap<String, Value>,
    pub element_id: Option<String>,
}

impl UnboundRelationship {
    pub fn to_packstream(&self, version: Version) -> Structure {
        let mut fields = vec![
            Value::Integer(self.id),
            Value::String(self.rel_type.clone()),
            Value::Map(self.properties.clone()),
        ];
        if version.at_least(5, 0) {
            fields.push(opt_string(&self.element_id));
        }
        Structure::new(tags::UNBOUND_RELATIONSHIP, fields)
    }

    pub fn from_packstream(s: &Structure, _version: Version) -> Result<Self> {
        if s.tag != tags::UNBOUND_RELATIONSHIP {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected UnboundRelationship tag 0x{:02X}, got 0x{:02X}",
                tags::UNBOUND_RELATIONSHIP,
                s.tag
            )));
        }
        let minimal = s.fields.len() == 3;
        let extended = s.fields.len() == 4;
        if !minimal && !extended {
            return Err(BoltError::InvalidMessageFormat(format!(
                "UnboundRelationship has {} fields, expected 3 (pre-5.0) or 4 (5.0+)",
                s.fields.len()
            )));
        }
        let id = require_int(&s.fields[0], "UnboundRelationship.id")?;
        let rel_type = require_string(&s.fields[1], "UnboundRelationship.type")?;
        let properties = require_map(&s.fields[2], "UnboundRelationship.properties")?;
        let element_id = if extended {
            require_opt_string(&s.fields[3], "UnboundRelationship.element_id")?
        } else {
            None
        };
        Ok(UnboundRelationship { id, rel_type, properties, element_id })
    }
}

fn opt_string(s: &Option<String>) -> Value {
    match s {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}

pub(super) fn require_int(v: &Value, field: &'static str) -> Result<i64> {
    v.as_integer()
        .ok_or_else(|| BoltError::InvalidMessageFormat(format!("{field} must be an integer")))
}

pub(super) fn require_string(v: &Value, field: &'static str) -> Result<String> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| BoltError::InvalidMessageFormat(format!("{field} must be a string")))
}

pub(super) fn require_opt_string(v: &Value, field: &'static str) -> Result<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(BoltError::InvalidMessageFormat(format!("{field} must be a string or null"))),
    }
}

pub(super) fn require_map(v: &Value, field: &'static str) -> Result<IndexMap<String, Value>> {
    v.as_map()
        .cloned()
        .ok_or_else(|| BoltError::InvalidMessageFormat(format!("{field} must be a map")))
}
