//! # Contract ABI Encoding
//!
//! Minimal Solidity ABI codec covering the parameter types used by the
//! verification registry and identity-manager contracts. Calldata is the
//! 4-byte function selector followed by head/tail encoded arguments.

use evp_core::{keccak256, ChainAddress};

use crate::error::ChainError;

const WORD: usize = 32;

/// An ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `address`
    Address(ChainAddress),
    /// `bytes32`
    FixedBytes32([u8; 32]),
    /// `uint256`, restricted to values that fit in 128 bits.
    Uint(u128),
    /// `bool`
    Bool(bool),
    /// `bytes`
    Bytes(Vec<u8>),
    /// `string`
    String(String),
}

/// An ABI type, used to drive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `address`
    Address,
    /// `bytes32`
    FixedBytes32,
    /// `uint256`
    Uint,
    /// `bool`
    Bool,
    /// `bytes`
    Bytes,
    /// `string`
    String,
}

impl ParamType {
    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes | Self::String)
    }
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes(_) | Self::String(_))
    }
}

/// The 4-byte selector for a canonical function signature such as
/// `verify(bytes32,uint256)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode(args));
    out
}

/// Head/tail encode a tuple of tokens.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend(uint_word((head_len + tail.len()) as u128));
            tail.extend(encode_dynamic(token));
        } else {
            head.extend(encode_static(token));
        }
    }

    head.extend(tail);
    head
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn encode_static(token: &Token) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match token {
        Token::Address(a) => word[12..].copy_from_slice(a.as_bytes()),
        Token::FixedBytes32(b) => word.copy_from_slice(b),
        Token::Uint(v) => word = uint_word(*v),
        Token::Bool(b) => word[31] = u8::from(*b),
        Token::Bytes(_) | Token::String(_) => {}
    }
    word
}

fn encode_dynamic(token: &Token) -> Vec<u8> {
    let data: &[u8] = match token {
        Token::Bytes(b) => b,
        Token::String(s) => s.as_bytes(),
        _ => &[],
    };
    let padded = data.len().div_ceil(WORD) * WORD;
    let mut out = uint_word(data.len() as u128).to_vec();
    out.extend_from_slice(data);
    out.resize(WORD + padded, 0);
    out
}

/// Decode a tuple of the given types from return data or argument data
/// (without selector).
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, ChainError> {
    types
        .iter()
        .enumerate()
        .map(|(i, ty)| {
            let head = word_at(data, i * WORD)?;
            if ty.is_dynamic() {
                let offset = word_to_usize(head)?;
                let len = word_to_usize(word_at(data, offset)?)?;
                let start = offset + WORD;
                let end = start.checked_add(len).unwrap_or(usize::MAX);
                let bytes = data
                    .get(start..end)
                    .ok_or_else(|| ChainError::Encoding("ABI: dynamic value out of range".into()))?
                    .to_vec();
                match ty {
                    ParamType::String => String::from_utf8(bytes)
                        .map(Token::String)
                        .map_err(|e| ChainError::Encoding(format!("ABI: invalid UTF-8 string: {e}"))),
                    _ => Ok(Token::Bytes(bytes)),
                }
            } else {
                decode_static(*ty, head)
            }
        })
        .collect()
}

/// Split calldata into its selector and argument data.
pub fn split_selector(calldata: &[u8]) -> Result<([u8; 4], &[u8]), ChainError> {
    if calldata.len() < 4 {
        return Err(ChainError::Encoding("ABI: calldata shorter than selector".into()));
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&calldata[..4]);
    Ok((sel, &calldata[4..]))
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], ChainError> {
    data.get(offset..offset.saturating_add(WORD))
        .ok_or_else(|| ChainError::Encoding(format!("ABI: no word at offset {offset}")))
}

fn word_to_u128(word: &[u8]) -> Result<u128, ChainError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ChainError::Encoding("ABI: uint256 exceeds 128 bits".into()));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

fn word_to_usize(word: &[u8]) -> Result<usize, ChainError> {
    usize::try_from(word_to_u128(word)?)
        .map_err(|_| ChainError::Encoding("ABI: offset exceeds usize".into()))
}

fn decode_static(ty: ParamType, word: &[u8]) -> Result<Token, ChainError> {
    match ty {
        ParamType::Address => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(Token::Address(ChainAddress::from_bytes(addr)))
        }
        ParamType::FixedBytes32 => {
            let mut b = [0u8; 32];
            b.copy_from_slice(word);
            Ok(Token::FixedBytes32(b))
        }
        ParamType::Uint => Ok(Token::Uint(word_to_u128(word)?)),
        ParamType::Bool => Ok(Token::Bool(word[31] != 0)),
        ParamType::Bytes | ParamType::String => {
            Err(ChainError::Encoding("ABI: dynamic type decoded as static".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_erc20_transfer() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn registry_and_proxy_selectors() {
        assert_eq!(hex::encode(selector("verify(bytes32,uint256)")), "382262fc");
        assert_eq!(hex::encode(selector("verifications(bytes32,address)")), "95f5114c");
        assert_eq!(hex::encode(selector("revoke(bytes32)")), "b75c7dc6");
        assert_eq!(hex::encode(selector("hasCap(address,address,string)")), "140c5a4e");
        assert_eq!(
            hex::encode(selector("forwardTo(address,address,uint256,bytes)")),
            "73b40a5c"
        );
    }

    #[test]
    fn encodes_static_arguments() {
        let data = encode(&[Token::Uint(30), Token::Bool(true)]);
        assert_eq!(data.len(), 64);
        assert_eq!(data[31], 30);
        assert_eq!(data[63], 1);
    }

    #[test]
    fn encodes_dynamic_string_with_offset() {
        let addr = ChainAddress::parse("0x00000000000000000000000000000000000000aa").unwrap();
        let data = encode(&[Token::Address(addr), Token::Address(addr), Token::String("fw".into())]);
        // 3 head words + length word + one padded data word.
        assert_eq!(data.len(), 5 * 32);
        assert_eq!(data[95], 96); // offset of the string
        assert_eq!(data[127], 2); // length
        assert_eq!(&data[128..130], b"fw");
        assert!(data[130..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decode_reverses_encode_for_forward_call() {
        let identity = ChainAddress::parse("0x00000000000000000000000000000000000000aa").unwrap();
        let dest = ChainAddress::parse("0x00000000000000000000000000000000000000bb").unwrap();
        let tokens = vec![
            Token::Address(identity),
            Token::Address(dest),
            Token::Uint(0),
            Token::Bytes(vec![0xde, 0xad, 0xbe, 0xef, 0x01]),
        ];
        let decoded = decode(
            &[ParamType::Address, ParamType::Address, ParamType::Uint, ParamType::Bytes],
            &encode(&tokens),
        )
        .unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn decode_rejects_short_data() {
        assert!(decode(&[ParamType::Uint, ParamType::Uint], &[0u8; 32]).is_err());
        assert!(split_selector(&[1, 2]).is_err());
    }

    #[test]
    fn decode_rejects_uint_over_128_bits() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(decode(&[ParamType::Uint], &word).is_err());
    }
}
