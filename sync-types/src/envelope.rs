//! Patch envelopes and their positional wire representation.

use serde::{Deserialize, Serialize};

use crate::{PeerId, SyncError};

/// Number of positional fields in a wire item.
pub const FIELD_COUNT: usize = 4;

/// Names of the positional fields, in wire order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = ["project", "path", "diff", "author"];

/// One item as carried by the pub/sub channel.
///
/// On the wire this is a MessagePack array of nullable strings:
/// `[project, path, diff, author]`. Any field may be absent or null here;
/// turning it into a [`PatchEnvelope`] is where required fields are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireItem(pub Vec<Option<String>>);

impl WireItem {
    /// Build an item from its positional fields.
    pub fn new(fields: Vec<Option<String>>) -> Self {
        Self(fields)
    }

    /// Look up a field by position. Missing and null fields both yield `None`.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|f| f.as_deref())
    }

    /// Number of fields present (including null ones).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the item carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        rmp_serde::to_vec(self).map_err(SyncError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Fails when the bytes are not an array of nullable strings.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        rmp_serde::from_slice(bytes).map_err(SyncError::Deserialization)
    }
}

/// One peer's edit to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEnvelope {
    /// Project the edit belongs to.
    pub project: String,
    /// Path of the edited file, relative to the working-copy root, `/`-separated.
    pub path: String,
    /// Opaque diff produced by the patch service.
    pub diff: String,
    /// Identity of the peer that produced the edit.
    pub author: PeerId,
}

impl PatchEnvelope {
    /// Create a new envelope.
    pub fn new(
        project: impl Into<String>,
        path: impl Into<String>,
        diff: impl Into<String>,
        author: PeerId,
    ) -> Self {
        Self {
            project: project.into(),
            path: path.into(),
            diff: diff.into(),
            author,
        }
    }

    /// Positional wire representation of this envelope.
    pub fn to_wire(&self) -> WireItem {
        WireItem(vec![
            Some(self.project.clone()),
            Some(self.path.clone()),
            Some(self.diff.clone()),
            Some(self.author.as_str().to_string()),
        ])
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        self.to_wire().to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatchEnvelope {
        PatchEnvelope::new(
            "baboon",
            "src/main.rs",
            "@@ -1 +1 @@\n-a\n+b\n",
            PeerId::new("alice@example.org").unwrap(),
        )
    }

    #[test]
    fn envelope_wire_roundtrip() {
        let envelope = sample();
        let bytes = envelope.to_bytes().unwrap();
        let item = WireItem::from_bytes(&bytes).unwrap();

        assert_eq!(item.len(), FIELD_COUNT);
        assert_eq!(item.field(0), Some("baboon"));
        assert_eq!(item.field(1), Some("src/main.rs"));
        assert_eq!(item.field(3), Some("alice@example.org"));
    }

    #[test]
    fn wire_item_keeps_nulls() {
        let item = WireItem::new(vec![Some("p".into()), None, Some("d".into())]);
        let restored = WireItem::from_bytes(&item.to_bytes().unwrap()).unwrap();

        assert_eq!(restored, item);
        assert_eq!(restored.field(1), None);
        assert_eq!(restored.field(3), None);
    }

    #[test]
    fn non_array_bytes_are_rejected() {
        let bytes = rmp_serde::to_vec(&42u32).unwrap();
        assert!(WireItem::from_bytes(&bytes).is_err());

        let bytes = rmp_serde::to_vec(&vec![1u8, 2, 3]).unwrap();
        assert!(WireItem::from_bytes(&bytes).is_err());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(WireItem::from_bytes(&[0xc1]).is_err());
        assert!(WireItem::from_bytes(&[]).is_err());
    }
}
