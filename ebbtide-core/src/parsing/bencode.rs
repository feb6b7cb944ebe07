//! Bencode parsing and info hash calculation for .torrent files.

use std::collections::HashMap;

use serde_bencode::value::Value;
use sha1::{Digest, Sha1};

use super::types::{TorrentFileEntry, TorrentMetadata};
use crate::session::SessionError;

type BencodeDict = HashMap<Vec<u8>, Value>;

impl TorrentMetadata {
    /// Parses the raw bytes of a .torrent file.
    ///
    /// The info hash is the SHA-1 digest of the re-encoded info dictionary;
    /// bencode dictionaries are key-sorted by definition, so re-encoding
    /// reproduces the original bytes.
    ///
    /// # Errors
    /// - `SessionError::Parse` - Malformed bencode or missing required
    ///   fields.
    pub fn from_bencode(data: &[u8]) -> Result<Self, SessionError> {
        let root: Value = serde_bencode::from_bytes(data).map_err(|e| SessionError::Parse {
            reason: format!("bencode parsing failed: {e}"),
        })?;

        let Value::Dict(root_dict) = &root else {
            return Err(parse_error("root element must be a dictionary"));
        };

        let info = root_dict
            .get(b"info".as_slice())
            .ok_or_else(|| parse_error("missing 'info' dictionary"))?;
        let info_hash = info_hash_of(info)?;

        let Value::Dict(info_dict) = info else {
            return Err(parse_error("'info' must be a dictionary"));
        };

        let name = string_field(info_dict, b"name")?;
        let piece_length = integer_field(info_dict, b"piece length")?;
        let (files, total_length) = extract_files(info_dict, &name)?;
        let announce_urls = extract_announce_urls(root_dict)?;

        Ok(Self {
            info_hash,
            name,
            piece_length,
            total_length,
            files,
            announce_urls,
        })
    }
}

fn info_hash_of(info: &Value) -> Result<[u8; 20], SessionError> {
    let encoded = serde_bencode::to_bytes(info).map_err(|e| SessionError::Parse {
        reason: format!("failed to re-encode info dictionary: {e}"),
    })?;
    Ok(Sha1::digest(&encoded).into())
}

/// Single-file layout uses `length`; multi-file layout lists `files`.
fn extract_files(
    info_dict: &BencodeDict,
    name: &str,
) -> Result<(Vec<TorrentFileEntry>, u64), SessionError> {
    if info_dict.contains_key(b"length".as_slice()) {
        let length = integer_field(info_dict, b"length")?;
        let files = vec![TorrentFileEntry {
            path: vec![name.to_string()],
            length,
        }];
        return Ok((files, length));
    }

    let Some(Value::List(entries)) = info_dict.get(b"files".as_slice()) else {
        return Err(parse_error("missing 'length' or 'files' field"));
    };

    let mut files = Vec::with_capacity(entries.len());
    let mut total_length = 0u64;

    for entry in entries {
        let Value::Dict(entry_dict) = entry else {
            return Err(parse_error("file entry must be a dictionary"));
        };

        let length = integer_field(entry_dict, b"length")?;
        let Some(Value::List(parts)) = entry_dict.get(b"path".as_slice()) else {
            return Err(parse_error("file entry missing 'path' list"));
        };

        let path = parts
            .iter()
            .map(|part| match part {
                Value::Bytes(bytes) => utf8_string(bytes),
                _ => Err(parse_error("path component must be a string")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        total_length = total_length
            .checked_add(length)
            .ok_or_else(|| parse_error("total file length overflows u64"))?;
        files.push(TorrentFileEntry { path, length });
    }

    Ok((files, total_length))
}

fn extract_announce_urls(root_dict: &BencodeDict) -> Result<Vec<String>, SessionError> {
    // announce-list supersedes the single announce URL when present.
    if let Some(Value::List(tiers)) = root_dict.get(b"announce-list".as_slice()) {
        let mut urls = Vec::new();
        for tier in tiers {
            let Value::List(entries) = tier else {
                return Err(parse_error("announce-list tier must be a list"));
            };
            for entry in entries {
                let Value::Bytes(bytes) = entry else {
                    return Err(parse_error("announce URL must be a string"));
                };
                urls.push(utf8_string(bytes)?);
            }
        }
        return Ok(urls);
    }

    match root_dict.get(b"announce".as_slice()) {
        Some(Value::Bytes(bytes)) => Ok(vec![utf8_string(bytes)?]),
        Some(_) => Err(parse_error("'announce' must be a string")),
        None => Ok(Vec::new()),
    }
}

fn string_field(dict: &BencodeDict, key: &[u8]) -> Result<String, SessionError> {
    match dict.get(key) {
        Some(Value::Bytes(bytes)) => utf8_string(bytes),
        _ => Err(parse_error(&format!(
            "missing or invalid '{}' field",
            String::from_utf8_lossy(key)
        ))),
    }
}

fn integer_field(dict: &BencodeDict, key: &[u8]) -> Result<u64, SessionError> {
    match dict.get(key) {
        Some(Value::Int(value)) if *value >= 0 => Ok(*value as u64),
        _ => Err(parse_error(&format!(
            "missing or invalid '{}' field",
            String::from_utf8_lossy(key)
        ))),
    }
}

fn utf8_string(bytes: &[u8]) -> Result<String, SessionError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| SessionError::Parse {
        reason: format!("invalid UTF-8 string: {e}"),
    })
}

fn parse_error(reason: &str) -> SessionError {
    SessionError::Parse {
        reason: reason.to_string(),
    }
}
