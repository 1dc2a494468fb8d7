use crate::errors::{BoltError, Result};
use crate::value::{Structure, Value};

use super::node::require_int;
use super::tags;

fn srid_to_wire(srid: u32) -> Value {
    Value::Integer(srid as i64)
}

/// `srid` travels as the only PackStream integer form (int64) but must fit
/// in `u32` on decode.
fn srid_from_wire(v: &Value, field: &'static str) -> Result<u32> {
    let wide = require_int(v, field)?;
    u32::try_from(wide).map_err(|_| {
        BoltError::DeserializationError(format!("{field} ({wide}) does not fit in u32"))
    })
}

fn require_float(v: &Value, field: &'static str) -> Result<f64> {
    v.as_float()
        .ok_or_else(|| BoltError::InvalidMessageFormat(format!("{field} must be a float")))
}

/// Tag 0x58.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub srid: u32,
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(tags::POINT_2D, vec![srid_to_wire(self.srid), Value::Float(self.x), Value::Float(self.y)])
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        if s.tag != tags::POINT_2D {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected Point2D tag 0x{:02X}, got 0x{:02X}",
                tags::POINT_2D,
                s.tag
            )));
        }
        if s.fields.len() != 3 {
            return Err(BoltError::InvalidMessageFormat(format!(
                "Point2D has {} fields, expected 3",
                s.fields.len()
            )));
        }
        Ok(Point2D {
            srid: srid_from_wire(&s.fields[0], "Point2D.srid")?,
            x: require_float(&s.fields[1], "Point2D.x")?,
            y: require_float(&s.fields[2], "Point2D.y")?,
        })
    }
}

/// Tag 0x59.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub srid: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn to_packstream(&self) -> Structure {
        Structure::new(
            tags::POINT_3D,
            vec![srid_to_wire(self.srid), Value::Float(self.x), Value::Float(self.y), Value::Float(self.z)],
        )
    }

    pub fn from_packstream(s: &Structure) -> Result<Self> {
        if s.tag != tags::POINT_3D {
            return Err(BoltError::InvalidMessageFormat(format!(
                "expected Point3D tag 0x{:02X}, got 0x{:02X}",
                tags::POINT_3D,
                s.tag
            )));
        }
        if s.fields.len() != 4 {
            return Err(BoltError::InvalidMessageFormat(format!(
                "Point3D has {} fields, expected 4",
                s.fields.len()
            )));
        }
        Ok(Point3D {
            srid: srid_from_wire(&s.fields[0], "Point3D.srid")?,
            x: require_float(&s.fields[1], "Point3D.x")?,
            y: require_float(&s.fields[2], "Point3D.y")?,
            z: require_float(&s.fields[3], "Point3D.z")?,
        })
    }
}
