use crate::errors::{BoltError, Result};
use crate::value::{Structure, Value};
use crate::version::Version;

use super::node::{Node, UnboundRelationship};
use super::tags;

/// Tag 0x50. A path alternates nodes and unbound relationships; the
/// `indices` list encodes that interleaving (odd/even signed 1-based index
/// into `rels`/`nodes`, per the Bolt wire convention) without this codec
/// needing to interpret it structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub rels: Vec<UnboundRelationship>,
    pub indices: Vec<i64>,
}

impl Path {
    pub fn to_packstream(&self, version: Version) -> Structure {
        let nodes = self
            .nodes
            .iter()
            .map(|n| Value::Structure(n.to_packstream(version)))
            .collect();
        let rels = self
            .rels
            .iter()
            .map(|r| Value::Structure(r.to_packstream(version)))
            .collect();
        let indices = self.indices.iter().map(|i| Value::Integer(*i)).collect();
        Structure::new(tags::PATH, vec![Value::List(nodes), Value::List(rels), Value::List(indices)])
    }

    pub fn from_packstream(s: &Structure, version: Version) -> Result<Self> {
        if s.tag != tags::PATH {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected Path tag 0x{:02X}, got 0x{:02X}",
                tags::PATH,
                s.tag
            )));
        }
        if s.fields.len() != 3 {
            return Err(BoltError::InvalidMessageFormat(format!(
                "Path has {} fields, expected 3",
                s.fields.len()
            )));
        }
        let nodes = s.fields[0]
            .as_list()
            .ok_or_else(|| BoltError::InvalidMessageFormat("Path.nodes must be a list".into()))?
            .iter()
            .map(|v| {
                let inner = v
                    .as_structure()
                    .ok_or_else(|| BoltError::InvalidMessageFormat("Path.nodes elements must be structures".into()))?;
                Node::from_packstream(inner, version)
            })
            .collect::<Result<Vec<_>>>()?;
        let rels = s.fields[1]
            .as_list()
            .ok_or_else(|| BoltError::InvalidMessageFormat("Path.rels must be a list".into()))?
            .iter()
            .map(|v| {
                let inner = v
                    .as_structure()
                    .ok_or_else(|| BoltError::InvalidMessageFormat("Path.rels elements must be structures".into()))?;
                UnboundRelationship::from_packstream(inner, version)
            })
            .collect::<Result<Vec<_>>>()?;
        let indices = s.fields[2]
            .as_list()
            .ok_or_else(|| BoltError::InvalidMessageFormat("Path.indices must be a list".into()))?
            .iter()
            .map(|v| {
                v.as_integer()
                    .ok_or_else(|| BoltError::InvalidMessageFormat("Path.indices elements must be integers".into()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Path { nodes, rels, indices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn path_roundtrips_with_nested_structures() {
        let p = Path {
            nodes: vec![Node {
                id: 1,
                labels: vec!["Person".to_string()],
                properties: IndexMap::new(),
                element_id: Some("5:e:1".to_string()),
            }],
            rels: vec![UnboundRelationship {
                id: 2,
                rel_type: "KNOWS".to_string(),
                properties: IndexMap::new(),
                element_id: Some("5:e:2".to_string()),
            }],
            indices: vec![1, 1],
        };
        let s = p.to_packstream(Version::new(5, 0));
        let back = Path::from_packstream(&s, Version::new(5, 0)).unwrap();
        assert_eq!(back, p);
    }
}
