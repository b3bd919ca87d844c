//! JSON batch files.
//!
//! A batch file is a JSON array with one entry per pub/sub item. Entries
//! shaped like `[project, path, diff, author]` (strings or nulls) become wire
//! items; any other entry is encoded as-is so the handler sees exactly what
//! a misbehaving peer would have sent.

use anyhow::{Context, Result};
use serde_json::Value;
use sync_types::WireItem;

/// Encode a JSON batch into raw wire items.
pub fn encode_batch(json: &str) -> Result<Vec<Vec<u8>>> {
    let value: Value = serde_json::from_str(json).context("Batch file is not valid JSON")?;
    let Value::Array(entries) = value else {
        anyhow::bail!("Batch file must contain a JSON array of items");
    };

    entries
        .into_iter()
        .map(|entry| match serde_json::from_value::<WireItem>(entry.clone()) {
            Ok(item) => item.to_bytes().context("Failed to encode item"),
            Err(_) => rmp_serde::to_vec(&entry).context("Failed to encode item"),
        })
        .collect()
}

/// Decode raw wire items into a pretty-printed JSON batch.
pub fn decode_batch(items: &[Vec<u8>]) -> Result<String> {
    let entries = items
        .iter()
        .map(|bytes| WireItem::from_bytes(bytes).context("Published item is not a wire item"))
        .collect::<Result<Vec<_>>>()?;
    serde_json::to_string_pretty(&entries).context("Failed to encode batch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{parse_item, EnvelopeParseError, ParsedItem};

    #[test]
    fn well_formed_entries_become_wire_items() {
        let items =
            encode_batch(r#"[["baboon", "a.txt", "@@ -1 +1 @@\n-a\n+b\n", "alice"]]"#).unwrap();
        assert_eq!(items.len(), 1);

        let envelope = parse_item(&items[0]).into_result().unwrap();
        assert_eq!(envelope.path, "a.txt");
        assert_eq!(envelope.author, "alice");
    }

    #[test]
    fn null_fields_survive_as_missing() {
        let items = encode_batch(r#"[["baboon", "a.txt", "d", null]]"#).unwrap();
        assert_eq!(
            parse_item(&items[0]),
            ParsedItem::Malformed(EnvelopeParseError::MissingField("author"))
        );
    }

    #[test]
    fn odd_entries_are_kept_and_fail_parsing() {
        let items = encode_batch(r#"[{"project": "baboon"}, 42]"#).unwrap();
        assert_eq!(items.len(), 2);
        for item in &items {
            assert!(matches!(
                parse_item(item),
                ParsedItem::Malformed(EnvelopeParseError::UnrecognizedShape(_))
            ));
        }
    }

    #[test]
    fn non_array_batch_is_rejected() {
        assert!(encode_batch(r#"{"items": []}"#).is_err());
        assert!(encode_batch("not json").is_err());
    }

    #[test]
    fn decode_emits_positional_arrays() {
        let items = encode_batch(r#"[["p", "f", "d", "a"]]"#).unwrap();
        let json = decode_batch(&items).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!([["p", "f", "d", "a"]]));
    }
}
