//! Wire format of checksum database lookup responses.
//!
//! A lookup answer is the record id on its own line, the record text (one or
//! more non-empty lines), a blank line, and the signed tree note:
//!
//! ```text
//! 1234
//! golang.org/x/text v0.14.0 h1:...
//! golang.org/x/text v0.14.0/go.mod h1:...
//!
//! go.sum database tree
//! 5678
//! <base64 root hash>
//!
//! \u{2014} sum.golang.org <base64 signature>
//! ```

use crate::SumdbError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// First line of every tree note body.
pub const TREE_HEADER: &str = "go.sum database tree";
/// Size in bytes of a tree root hash.
pub const HASH_SIZE: usize = 32;

const SIGNATURE_PREFIX: &str = "\u{2014} ";

/// A lookup answer split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub id: u64,
    pub text: &'a str,
    pub note: &'a [u8],
}

/// The log size and root hash a tree note attests to, plus the names of the
/// keys that signed it. Signatures are never checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeHead {
    pub size: u64,
    pub hash: [u8; HASH_SIZE],
    pub signers: Vec<String>,
}

fn malformed(what: &str) -> SumdbError {
    SumdbError::Malformed(what.to_owned())
}

/// Split a lookup response into record id, record text, and tree note.
pub fn parse_record(data: &[u8]) -> Result<Record<'_>, SumdbError> {
    let text = std::str::from_utf8(data).map_err(|_| malformed("record is not valid UTF-8"))?;
    let (id_line, rest) = text
        .split_once('\n')
        .ok_or_else(|| malformed("missing record id"))?;
    let id = id_line
        .parse::<u64>()
        .map_err(|_| malformed("invalid record id"))?;
    let end = rest
        .find("\n\n")
        .ok_or_else(|| malformed("unterminated record text"))?;
    let (record_text, note) = (&rest[..=end], &rest[end + 2..]);

    if record_text
        .chars()
        .any(|c| c != '\n' && (c.is_control() || c == '\u{FEFF}'))
    {
        return Err(malformed("record text contains control characters"));
    }

    Ok(Record {
        id,
        text: record_text,
        note: note.as_bytes(),
    })
}

/// Parse a signed tree note without verifying its signatures.
pub fn parse_tree_note(note: &[u8]) -> Result<TreeHead, SumdbError> {
    let note = std::str::from_utf8(note).map_err(|_| malformed("tree note is not valid UTF-8"))?;
    let (body, sigs) = note
        .split_once("\n\n")
        .ok_or_else(|| malformed("tree note has no signatures"))?;

    let mut lines = body.split('\n');
    if lines.next() != Some(TREE_HEADER) {
        return Err(malformed("tree note has wrong header"));
    }
    let size = lines
        .next()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n < 1 << 63)
        .ok_or_else(|| malformed("invalid tree size"))?;
    let hash: [u8; HASH_SIZE] = lines
        .next()
        .and_then(|h| STANDARD.decode(h).ok())
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| malformed("invalid tree hash"))?;

    let signers = sigs
        .lines()
        .map(|line| {
            line.strip_prefix(SIGNATURE_PREFIX)
                .and_then(|rest| rest.split_once(' '))
                .map(|(name, _sig)| name.to_owned())
                .ok_or_else(|| malformed("invalid signature line"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if signers.is_empty() {
        return Err(malformed("tree note has no signatures"));
    }

    Ok(TreeHead {
        size,
        hash,
        signers,
    })
}

/// Render a tree note signed by `signer`. `signature` is opaque bytes.
pub fn format_tree_note(size: u64, hash: &[u8; HASH_SIZE], signer: &str, signature: &[u8]) -> String {
    format!(
        "{TREE_HEADER}\n{size}\n{}\n\n{SIGNATURE_PREFIX}{signer} {}\n",
        STANDARD.encode(hash),
        STANDARD.encode(signature)
    )
}

/// Render a complete lookup response. `text` must end with a newline.
pub fn format_record(id: u64, text: &str, note: &str) -> String {
    format!("{id}\n{text}\n{note}")
}
