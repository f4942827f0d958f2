//! Artifact encoding: compact JSON, gzip-compressed.

use crate::{SnapshotChain, SnapshotResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors raised while decoding a persisted chain.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The artifact is not a valid gzip stream.
    #[error("decompression failed: {0}")]
    Compression(#[from] std::io::Error),

    /// The decompressed payload is not a valid chain document.
    #[error("invalid chain document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but its roots or current pointer are inconsistent.
    #[error("{0}")]
    Invalid(String),
}

/// Encode a chain into its persisted byte form.
pub fn encode(chain: &SnapshotChain) -> SnapshotResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    serde_json::to_writer(&mut encoder, chain)?;
    encoder.flush()?;
    Ok(encoder.finish()?)
}

/// Decode a chain from its persisted byte form.
pub fn decode(bytes: &[u8]) -> Result<SnapshotChain, CodecError> {
    let mut json = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut json)?;

    let chain: SnapshotChain = serde_json::from_slice(&json)?;
    chain.validate().map_err(CodecError::Invalid)?;
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionId;

    #[test]
    fn test_empty_chain_round_trip() {
        let chain = SnapshotChain::new();
        let decoded = decode(&encode(&chain).unwrap()).unwrap();
        assert_eq!(decoded, chain);
    }

    #[test]
    fn test_branching_chain_round_trip() {
        let mut chain = SnapshotChain::new();
        let root = chain.record("v1\n", 1).unwrap().unwrap();
        chain.record("v1\nfirst\n", 2).unwrap().unwrap();
        chain.pivot(&root).unwrap();
        let second = chain.record("v1\nsecond\n", 3).unwrap().unwrap();

        let decoded = decode(&encode(&chain).unwrap()).unwrap();
        assert_eq!(decoded, chain);
        assert_eq!(decoded.current(), Some(&second));
        assert_eq!(decoded.reconstruct(&second).unwrap(), "v1\nsecond\n");
    }

    #[test]
    fn test_document_uses_short_keys() {
        let mut chain = SnapshotChain::new();
        chain.record("body", 42).unwrap();
        let json = serde_json::to_value(&chain).unwrap();

        let current = json["c"].as_str().unwrap();
        assert!(current.starts_with("ver_"));
        assert_eq!(json["i"][current]["b"], "body");
        assert_eq!(json["i"][current]["t"], 42);
        assert!(json["i"][current].get("p").is_none());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            decode(b"definitely not gzip"),
            Err(CodecError::Compression(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"c\": 12").unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(matches!(decode(&bytes), Err(CodecError::Json(_))));
    }

    #[test]
    fn test_dangling_current_pointer_is_rejected() {
        let mut chain = SnapshotChain::new();
        chain.record("v1", 1).unwrap();
        let mut json = serde_json::to_value(&chain).unwrap();
        json["c"] = serde_json::Value::String(VersionId::from_string("ver_nope").to_string());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        serde_json::to_writer(&mut encoder, &json).unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(matches!(decode(&bytes), Err(CodecError::Invalid(_))));
    }

    #[test]
    fn test_node_without_body_or_patch_is_rejected() {
        let json = br#"{"c":"ver_a","i":{"ver_a":{"t":1}}}"#;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json).unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(matches!(decode(&bytes), Err(CodecError::Json(_))));
    }

    fn gzip(json: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_second_root_is_rejected() {
        let json = br#"{"c":"ver_a","i":{"ver_a":{"t":1,"b":"one"},"ver_b":{"t":2,"b":"two"}}}"#;
        let err = decode(&gzip(json)).unwrap_err();
        assert!(matches!(err, CodecError::Invalid(_)));
        assert!(err.to_string().contains("2 root versions"));
    }

    #[test]
    fn test_chain_without_root_is_rejected() {
        let json = br#"{"c":"ver_a","i":{"ver_a":{"t":1,"p":"ver_b","d":[]},"ver_b":{"t":0,"p":"ver_a","d":[]}}}"#;
        assert!(matches!(decode(&gzip(json)), Err(CodecError::Invalid(_))));
    }
}
