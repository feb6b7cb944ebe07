//! Magnet URI parsing.

use url::Url;

use super::types::MagnetLink;
use crate::engine::InfoHashes;
use crate::session::SessionError;

// Multihash prefix for a sha2-256 digest: function 0x12, length 0x20.
const BTMH_SHA256_PREFIX: &str = "1220";

impl MagnetLink {
    /// Parses a magnet descriptor.
    ///
    /// Accepts `xt=urn:btih:<40 hex>` for v1 hashes and
    /// `xt=urn:btmh:1220<64 hex>` for v2; uppercase hex is normalized. The
    /// `dn` and `tr` parameters are carried through as hints.
    ///
    /// # Errors
    /// - `SessionError::Parse` - Not a magnet URI, missing exact topic, or
    ///   malformed hash.
    pub fn parse(uri: &str) -> Result<Self, SessionError> {
        let url = Url::parse(uri).map_err(|e| SessionError::Parse {
            reason: format!("invalid magnet URI: {e}"),
        })?;

        if url.scheme() != "magnet" {
            return Err(SessionError::Parse {
                reason: format!("expected magnet scheme, got '{}'", url.scheme()),
            });
        }

        let mut info_hashes = InfoHashes::default();
        let mut display_name = None;
        let mut trackers = Vec::new();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "xt" => apply_exact_topic(&value, &mut info_hashes)?,
                "dn" => display_name = Some(value.into_owned()),
                "tr" => trackers.push(value.into_owned()),
                _ => {}
            }
        }

        if info_hashes.is_empty() {
            return Err(SessionError::Parse {
                reason: "missing exact topic (xt) with a btih or btmh hash".to_string(),
            });
        }

        Ok(Self {
            info_hashes,
            display_name,
            trackers,
        })
    }
}

fn apply_exact_topic(value: &str, hashes: &mut InfoHashes) -> Result<(), SessionError> {
    if let Some(hex_hash) = value.strip_prefix("urn:btih:") {
        hashes.v1 = Some(decode_hash::<20>(hex_hash)?);
        Ok(())
    } else if let Some(multihash) = value.strip_prefix("urn:btmh:") {
        let digest = multihash
            .strip_prefix(BTMH_SHA256_PREFIX)
            .ok_or_else(|| SessionError::Parse {
                reason: format!("unsupported btmh multihash prefix in '{multihash}'"),
            })?;
        hashes.v2 = Some(decode_hash::<32>(digest)?);
        Ok(())
    } else {
        Err(SessionError::Parse {
            reason: format!("unsupported exact topic '{value}'"),
        })
    }
}

fn decode_hash<const N: usize>(hex_str: &str) -> Result<[u8; N], SessionError> {
    let bytes = hex::decode(hex_str).map_err(|e| SessionError::Parse {
        reason: format!("invalid hex in hash '{hex_str}': {e}"),
    })?;

    bytes.try_into().map_err(|_| SessionError::Parse {
        reason: format!(
            "invalid hash length: {} hex characters (expected {})",
            hex_str.len(),
            N * 2
        ),
    })
}
