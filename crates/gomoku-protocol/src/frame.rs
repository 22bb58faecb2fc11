//! Push frames: how a subscription is rendered on the wire.
//!
//! A push connection always starts with the snapshot it got at subscribe
//! time, then forwards each event in the order it arrived:
//!
//! ```text
//! {"type":"initial","state":{...}}
//! {"type":"update","new_state":{...}}
//! {"type":"delete"}
//! ```
//!
//! Events are written as-is (room events already carry their own `type`
//! tag), so [`Frame`] has a hand-written `Serialize` impl instead of a
//! derived tagged one.

use serde::ser::{Serialize, SerializeStruct, Serializer};

#[cfg(feature = "json")]
use crate::ProtocolError;

/// One unit of a push stream: the initial snapshot or a later event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<S, E> {
    /// The state at subscribe time.
    Initial(S),
    /// A change applied after the snapshot was taken.
    Event(E),
}

impl<S: Serialize, E: Serialize> Serialize for Frame<S, E> {
    fn serialize<Z: Serializer>(
        &self,
        serializer: Z,
    ) -> Result<Z::Ok, Z::Error> {
        match self {
            Self::Initial(state) => {
                let mut frame = serializer.serialize_struct("Frame", 2)?;
                frame.serialize_field("type", "initial")?;
                frame.serialize_field("state", state)?;
                frame.end()
            }
            Self::Event(event) => event.serialize(serializer),
        }
    }
}

#[cfg(feature = "json")]
impl<S: Serialize, E: Serialize> Frame<S, E> {
    /// Compact JSON for this frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// The frame as one server-sent-events message: `data: <json>\n\n`.
    pub fn to_sse(&self) -> Result<String, ProtocolError> {
        Ok(format!("data: {}\n\n", self.to_json()?))
    }
}
