//! # Recursive Length Prefix
//!
//! The byte encoding used for signing and broadcasting transactions.
//! Only what legacy transactions need is implemented: byte strings, lists,
//! and unsigned integers as minimal big-endian byte strings. The decoder
//! is used by [`MockChain`](crate::mock::MockChain) to read back broadcast
//! transactions.

use crate::error::ChainError;

/// A decoded or to-be-encoded RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte string.
    Bytes(Vec<u8>),
    /// A list of items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// An unsigned integer as a minimal big-endian byte string (zero is empty).
    pub fn uint(value: u128) -> Self {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self::Bytes(bytes[first..].to_vec())
    }

    /// A byte string with leading zero bytes stripped, as signature
    /// components are encoded.
    pub fn trimmed(bytes: &[u8]) -> Self {
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self::Bytes(bytes[first..].to_vec())
    }

    /// Encode this item.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Bytes(b) if b.len() == 1 && b[0] < 0x80 => b.clone(),
            Self::Bytes(b) => {
                let mut out = length_prefix(0x80, b.len());
                out.extend_from_slice(b);
                out
            }
            Self::List(items) => {
                let payload: Vec<u8> = items.iter().flat_map(|i| i.encode()).collect();
                let mut out = length_prefix(0xc0, payload.len());
                out.extend_from_slice(&payload);
                out
            }
        }
    }

    /// Decode exactly one item spanning all of `input`.
    pub fn decode(input: &[u8]) -> Result<Self, ChainError> {
        let (item, used) = decode_item(input)?;
        if used != input.len() {
            return Err(ChainError::Encoding(format!(
                "RLP: {} trailing bytes",
                input.len() - used
            )));
        }
        Ok(item)
    }

    /// The byte string payload, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::List(_) => None,
        }
    }

    /// The list items, if this is a list.
    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            Self::List(items) => Some(items),
            Self::Bytes(_) => None,
        }
    }

    /// Interpret a byte string as a big-endian unsigned integer.
    pub fn as_uint(&self) -> Option<u128> {
        let bytes = self.as_bytes()?;
        if bytes.len() > 16 {
            return None;
        }
        Some(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
    }
}

fn length_prefix(offset: u8, len: usize) -> Vec<u8> {
    if len <= 55 {
        vec![offset + len as u8]
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let first = len_bytes.iter().position(|b| *b != 0).unwrap_or(7);
        let mut out = vec![offset + 55 + (8 - first) as u8];
        out.extend_from_slice(&len_bytes[first..]);
        out
    }
}

fn decode_item(input: &[u8]) -> Result<(RlpItem, usize), ChainError> {
    let truncated = || ChainError::Encoding("RLP: truncated input".to_string());
    let prefix = *input.first().ok_or_else(truncated)?;

    match prefix {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), 1)),
        0x80..=0xbf => {
            let (start, len) = payload_bounds(input, prefix, 0x80)?;
            let end = start.checked_add(len).ok_or_else(truncated)?;
            let body = input.get(start..end).ok_or_else(truncated)?;
            Ok((RlpItem::Bytes(body.to_vec()), end))
        }
        0xc0..=0xff => {
            let (start, len) = payload_bounds(input, prefix, 0xc0)?;
            let end = start.checked_add(len).ok_or_else(truncated)?;
            let mut body = input.get(start..end).ok_or_else(truncated)?;
            let mut items = Vec::new();
            while !body.is_empty() {
                let (item, used) = decode_item(body)?;
                items.push(item);
                body = &body[used..];
            }
            Ok((RlpItem::List(items), end))
        }
    }
}

/// Returns (payload start, payload length) for a string or list prefix.
fn payload_bounds(input: &[u8], prefix: u8, offset: u8) -> Result<(usize, usize), ChainError> {
    let short = prefix - offset;
    if short <= 55 {
        return Ok((1, short as usize));
    }
    let len_of_len = (short - 55) as usize;
    let len_bytes = input
        .get(1..1 + len_of_len)
        .ok_or_else(|| ChainError::Encoding("RLP: truncated length".to_string()))?;
    if len_of_len > 8 {
        return Err(ChainError::Encoding("RLP: length overflow".to_string()));
    }
    let len = len_bytes.iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
    Ok((1 + len_of_len, len))
}
