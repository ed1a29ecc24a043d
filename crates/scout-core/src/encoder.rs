//! # Key Encoder
//!
//! Derives the 32-byte key under which the hook stores a position:
//! `keccak256(owner ‖ poolId ‖ tickLower ‖ tickUpper ‖ salt)`, every field
//! rendered as one big-endian 32-byte ABI word. Ticks are signed and are
//! written as their 256-bit two's-complement form.

use alloy_primitives::{keccak256, Address, B256};
use scout_types::{check_tick, ScoutError, ScoutResult, KEY_PREIMAGE_LEN, WORD_SIZE};

/// Width of an EVM address in bytes
const ADDRESS_SIZE: usize = 20;

/// Render a signed value as a 256-bit two's-complement word.
///
/// Equivalent to `2^256 + value` for negative values: the sign bit is
/// extended across the full word, so `-1` becomes thirty-two `0xff` bytes.
pub fn encode_signed_word(value: i32) -> [u8; WORD_SIZE] {
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut word = [fill; WORD_SIZE];
    word[WORD_SIZE - 4..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-pad a big-endian byte string to one word, rejecting anything wider
pub fn encode_word_left_padded(field: &str, bytes: &[u8]) -> ScoutResult<[u8; WORD_SIZE]> {
    if bytes.len() > WORD_SIZE {
        return Err(ScoutError::encoding(
            field,
            &format!("{} bytes exceeds word width of {}", bytes.len(), WORD_SIZE),
        ));
    }
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

/// Build the 160-byte pre-image hashed into a position key
pub fn key_preimage(
    owner: Address,
    pool_id: B256,
    tick_lower: i32,
    tick_upper: i32,
    salt: B256,
) -> ScoutResult<[u8; KEY_PREIMAGE_LEN]> {
    check_tick("tick_lower", tick_lower)?;
    check_tick("tick_upper", tick_upper)?;
    if tick_lower >= tick_upper {
        return Err(ScoutError::encoding(
            "tick_range",
            &format!("tick_lower {} must be below tick_upper {}", tick_lower, tick_upper),
        ));
    }

    let words = [
        encode_word_left_padded("owner", owner.as_slice())?,
        pool_id.0,
        encode_signed_word(tick_lower),
        encode_signed_word(tick_upper),
        salt.0,
    ];

    let mut buf = [0u8; KEY_PREIMAGE_LEN];
    for (chunk, word) in buf.chunks_exact_mut(WORD_SIZE).zip(words.iter()) {
        chunk.copy_from_slice(word);
    }
    Ok(buf)
}

/// Derive the storage key of a position
pub fn derive_key(
    owner: Address,
    pool_id: B256,
    tick_lower: i32,
    tick_upper: i32,
    salt: B256,
) -> ScoutResult<B256> {
    let preimage = key_preimage(owner, pool_id, tick_lower, tick_upper, salt)?;
    Ok(keccak256(preimage))
}

/// Derive a key from raw byte strings, checking each against its declared width.
///
/// `owner` may be at most 20 bytes and is left-padded; `pool_id` and `salt`
/// must be exactly one word.
pub fn derive_key_from_slices(
    owner: &[u8],
    pool_id: &[u8],
    tick_lower: i32,
    tick_upper: i32,
    salt: &[u8],
) -> ScoutResult<B256> {
    if owner.len() > ADDRESS_SIZE {
        return Err(ScoutError::encoding(
            "owner",
            &format!("{} bytes exceeds address width of {}", owner.len(), ADDRESS_SIZE),
        ));
    }
    let owner_word = encode_word_left_padded("owner", owner)?;
    let owner = Address::from_slice(&owner_word[WORD_SIZE - ADDRESS_SIZE..]);

    derive_key(
        owner,
        exact_word("pool_id", pool_id)?,
        tick_lower,
        tick_upper,
        exact_word("salt", salt)?,
    )
}

fn exact_word(field: &str, bytes: &[u8]) -> ScoutResult<B256> {
    if bytes.len() != WORD_SIZE {
        return Err(ScoutError::encoding(
            field,
            &format!("expected {} bytes, got {}", WORD_SIZE, bytes.len()),
        ));
    }
    Ok(B256::from_slice(bytes))
}
