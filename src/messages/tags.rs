//! Message tag bytes for the full Bolt client/server message set.

use crate::errors::BoltError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTag {
    Hello,
    Logon,
    Logoff,
    Run,
    Begin,
    Commit,
    Rollback,
    Discard,
    Pull,
    Reset,
    Goodbye,
    Route,
    Telemetry,
    Success,
    Record,
    Ignored,
    Failure,
}

impl MessageTag {
    pub fn byte(self) -> u8 {
        match self {
            MessageTag::Hello => 0x01,
            MessageTag::Run => 0x10,
            MessageTag::Discard => 0x2F,
            MessageTag::Pull => 0x3F,
            MessageTag::Begin => 0x11,
            MessageTag::Commit => 0x12,
            MessageTag::Rollback => 0x13,
            MessageTag::Reset => 0x0F,
            MessageTag::Goodbye => 0x02,
            MessageTag::Route => 0x66,
            MessageTag::Telemetry => 0x54,
            MessageTag::Logon => 0x6A,
            MessageTag::Logoff => 0x6B,
            MessageTag::Success => 0x70,
            MessageTag::Record => 0x71,
            MessageTag::Ignored => 0x7E,
            MessageTag::Failure => 0x7F,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, BoltError> {
        Ok(match b {
            0x01 => MessageTag::Hello,
            0x10 => MessageTag::Run,
            0x2F => MessageTag::Discard,
            0x3F => MessageTag::Pull,
            0x11 => MessageTag::Begin,
            0x12 => MessageTag::Commit,
            0x13 => MessageTag::Rollback,
            0x0F => MessageTag::Reset,
            0x02 => MessageTag::Goodbye,
            0x66 => MessageTag::Route,
            0x54 => MessageTag::Telemetry,
            0x6A => MessageTag::Logon,
            0x6B => MessageTag::Logoff,
            0x70 => MessageTag::Success,
            0x71 => MessageTag::Record,
            0x7E => MessageTag::Ignored,
            0x7F => MessageTag::Failure,
            other => {
                return Err(BoltError::InvalidMessageFormat(format!(
                    "unknown message tag 0x{other:02X}"
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_tag() {
        let all = [
            MessageTag::Hello,
            MessageTag::Logon,
            MessageTag::Logoff,
            MessageTag::Run,
            MessageTag::Begin,
            MessageTag::Commit,
            MessageTag::Rollback,
            MessageTag::Discard,
            MessageTag::Pull,
            MessageTag::Reset,
            MessageTag::Goodbye,
            MessageTag::Route,
            MessageTag::Telemetry,
            MessageTag::Success,
            MessageTag::Record,
            MessageTag::Ignored,
            MessageTag::Failure,
        ];
        for tag in all {
            assert_eq!(MessageTag::from_byte(tag.byte()).unwrap(), tag);
        }
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert!(MessageTag::from_byte(0xAB).is_err());
    }
}
