//! Typed structure codec: conversions between domain records and
//! PackStream `Structure`s, per the negotiated Bolt version.

mod node;
mod path;
mod spatial;
mod temporal;

pub use node::{Node, Relationship, UnboundRelationship};
pub use path::Path;
pub use spatial::{Point2D, Point3D};
pub use temporal::{Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Time};

pub mod tags {
    pub const NODE: u8 = 0x4E;
    pub const RELATIONSHIP: u8 = 0x52;
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    pub const PATH: u8 = 0x50;
    pub const DATE: u8 = 0x44;
    pub const TIME: u8 = 0x54;
    pub const LOCAL_TIME: u8 = 0x74;
    pub const DATE_TIME: u8 = 0x49;
    pub const DATE_TIME_LEGACY: u8 = 0x46;
    pub const DATE_TIME_ZONE_ID: u8 = 0x69;
    pub const DATE_TIME_ZONE_ID_LEGACY: u8 = 0x66;
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    pub const DURATION: u8 = 0x45;
    pub const POINT_2D: u8 = 0x58;
    pub const POINT_3D: u8 = 0x59;
}
