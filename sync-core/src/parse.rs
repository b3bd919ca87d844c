//! Extraction of patch envelopes from received wire items.
//!
//! Every item ends up as either [`ParsedItem::Parsed`] or
//! [`ParsedItem::Malformed`]; nothing here panics or bubbles up an error
//! for a bad item, so one broken item can never take the rest of a batch
//! down with it.

use sync_types::{PatchEnvelope, PeerId, WireItem, FIELD_NAMES};
use thiserror::Error;

use crate::classify::normalize_path;

/// Why a received item was not actionable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeParseError {
    /// The bytes are not a list of nullable strings.
    #[error("unrecognized item shape: {0}")]
    UnrecognizedShape(String),

    /// A required positional field is absent or null.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// The author field is not a usable identity.
    #[error("invalid author identity `{0}`")]
    InvalidAuthor(String),

    /// The target path would escape the working copy.
    #[error("unsafe target path `{0}`")]
    UnsafePath(String),

    /// The item belongs to a project this peer does not track.
    #[error("item for foreign project `{0}`")]
    ForeignProject(String),

    /// The target path is excluded from synchronization.
    #[error("path `{0}` is excluded from sync")]
    Excluded(String),
}

/// Outcome of parsing one received item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedItem {
    /// All four fields were present.
    Parsed(PatchEnvelope),
    /// The item cannot be acted upon.
    Malformed(EnvelopeParseError),
}

impl ParsedItem {
    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<PatchEnvelope, EnvelopeParseError> {
        match self {
            ParsedItem::Parsed(envelope) => Ok(envelope),
            ParsedItem::Malformed(error) => Err(error),
        }
    }
}

/// Parse raw item bytes (MessagePack array of nullable strings).
pub fn parse_item(bytes: &[u8]) -> ParsedItem {
    match WireItem::from_bytes(bytes) {
        Ok(item) => parse_wire(&item),
        Err(e) => ParsedItem::Malformed(EnvelopeParseError::UnrecognizedShape(e.to_string())),
    }
}

/// Extract an envelope from a decoded item by positional lookup.
pub fn parse_wire(item: &WireItem) -> ParsedItem {
    let mut fields = [""; 4];
    for (index, name) in FIELD_NAMES.iter().enumerate() {
        match item.field(index) {
            Some(value) => fields[index] = value,
            None => return ParsedItem::Malformed(EnvelopeParseError::MissingField(name)),
        }
    }
    let [project, path, diff, author] = fields;

    let author = match PeerId::new(author) {
        Ok(author) => author,
        Err(_) => {
            return ParsedItem::Malformed(EnvelopeParseError::InvalidAuthor(author.to_string()))
        }
    };

    ParsedItem::Parsed(PatchEnvelope::new(project, path, diff, author))
}

/// Normalize a wire path and make sure it stays inside the working copy.
///
/// Rejects absolute paths, `..` components, NUL bytes, backslashes and
/// Windows drive prefixes, and paths that normalize to nothing.
pub fn safe_relative_path(path: &str) -> Result<String, EnvelopeParseError> {
    let unsafe_path = || EnvelopeParseError::UnsafePath(path.to_string());

    if path.starts_with('/') || path.contains('\0') || path.contains('\\') {
        return Err(unsafe_path());
    }
    if has_drive_prefix(path) {
        return Err(unsafe_path());
    }

    let normalized = normalize_path(path);
    if normalized.is_empty() || normalized.split('/').any(|c| c == "..") {
        return Err(unsafe_path());
    }
    Ok(normalized)
}

/// `C:` or `C:/...`; `a:b.txt` is an ordinary file name.
fn has_drive_prefix(path: &str) -> bool {
    match path.as_bytes() {
        [letter, b':'] => letter.is_ascii_alphabetic(),
        [letter, b':', b'/', ..] => letter.is_ascii_alphabetic(),
        _ => false,
    }
}
