//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means a problem with the shape of data
//! (rendering a frame or parsing an identifier), never a lobby rule.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a frame failed.
    ///
    /// The inner `serde_json::Error` is kept so the caller can log the
    /// exact field that could not be represented.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A string that should name a room is not a six-digit decimal id.
    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),
}
