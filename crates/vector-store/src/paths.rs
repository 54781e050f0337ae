use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

pub const METADATA_FILENAME: &str = "00000000.json";
pub const QUARANTINE_DIR_NAME: &str = "quarantine";
pub const DOCUMENT_EXT: &str = "json";

static COLLECTION_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]{1,200}$").unwrap());

/// First 8 hex chars of SHA-256(name) — the hash-addressed directory name
/// for a collection (§3, §6 on-disk layout).
pub fn collection_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

pub fn is_valid_collection_name(name: &str) -> bool {
    COLLECTION_NAME_PATTERN.is_match(name)
}

/// 8-char lowercase hex only (§8 boundary behavior); any other input to
/// `restore_from_quarantine` is rejected.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 8 && hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

pub fn document_filename(index: u64) -> String {
    format!("{index:08}.{DOCUMENT_EXT}")
}

/// Parses a document record filename (`NNNNNNNN.json`, index > 0) and
/// returns its index, or `None` for the metadata file or anything else.
pub fn parse_document_filename(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(&format!(".{DOCUMENT_EXT}"))?;
    if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u64 = stem.parse().ok()?;
    if index == 0 {
        None
    } else {
        Some(index)
    }
}
