//! The JSON codec capability used for code-block post-processing.
//!
//! The core never touches a JSON library directly: serialization asks whatever [`JsonCodec`] the
//! caller installed on the writer, and falls back to emitting code content unchanged when there
//! is none (or when the codec refuses the input).

use std::fmt::{Display, Formatter};

/// A host-supplied JSON pretty-printer/minifier.
///
/// Implementations must be pure with respect to the text they're given; the writer may call them
/// any number of times during serialization. If the host shares one codec across threads, the
/// codec is responsible for its own thread-safety; this crate adds no locking.
pub trait JsonCodec {
    /// Produces the indented form of `text`, ending with a newline.
    fn pretty_json(&self, text: &str) -> Result<String, JsonCodecError>;

    /// Produces the single-line form of `text`, with no trailing newline.
    fn minify_json(&self, text: &str) -> Result<String, JsonCodecError>;
}

/// Why a codec refused its input. Failures are always swallowed by the writer, so this mostly
/// exists for codec implementations to talk to their own tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonCodecError {
    message: String,
}

impl JsonCodecError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

impl Display for JsonCodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JsonCodecError {}

impl From<serde_json::Error> for JsonCodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// The [`JsonCodec`] this crate ships: `serde_json` underneath.
#[derive(Copy, Clone, Default, Debug)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn pretty_json(&self, text: &str) -> Result<String, JsonCodecError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let mut pretty = serde_json::to_string_pretty(&value)?;
        pretty.push('\n');
        Ok(pretty)
    }

    fn minify_json(&self, text: &str) -> Result<String, JsonCodecError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Ok(serde_json::to_string(&value)?)
    }
}
