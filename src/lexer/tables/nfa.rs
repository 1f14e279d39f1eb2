// src/lexer/tables/nfa.rs
//! Automaton states and the character-move predicates evaluated once per
//! active state per input character.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// 256-bit set indexed by one byte of a character code.
pub type BitVec256 = [u64; 4];

pub const ALL_BITS: BitVec256 = [u64::MAX; 4];

/// One NFA state: the characters that enable its move, the kind accepted
/// once the move is taken, and the successor slice in `next_states`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NfaState {
    /// Move mask for characters 0..128, two 64-bit words.
    pub ascii: [u64; 2],
    /// Index into `Tables::non_ascii`; `None` means no move above 127.
    pub non_ascii: Option<usize>,
    /// Kind matched after taking this state's move.
    pub kind: Option<u32>,
    pub next_start: usize,
    pub next_len: usize,
}

/// Move predicate for characters above the 7-bit range.
///
/// For a BMP character the high byte selects either an explicit low-byte
/// vector (`blocks`) or, failing that, the first `(hi, lo)` pair of `ranges`
/// whose high vector contains it. Supplementary-plane characters are tested
/// against `astral`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NonAsciiClass {
    /// `(high byte, low vector)` sorted by high byte.
    pub blocks: Vec<(u8, usize)>,
    /// `(high vector, low vector)` pairs.
    pub ranges: Vec<(usize, usize)>,
    /// Inclusive code point ranges above U+FFFF, sorted and disjoint.
    pub astral: Vec<(u32, u32)>,
}

#[inline]
pub fn ascii_move(mask: &[u64; 2], c: u32) -> bool {
    debug_assert!(c < 128);
    if c < 64 {
        (mask[0] >> c) & 1 != 0
    } else {
        (mask[1] >> (c & 0o77)) & 1 != 0
    }
}

impl NonAsciiClass {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.ranges.is_empty() && self.astral.is_empty()
    }

    pub fn can_move(&self, c: u32, vectors: &[BitVec256]) -> bool {
        if c > 0xFFFF {
            return self
                .astral
                .binary_search_by(|&(lo, hi)| {
                    if hi < c {
                        Ordering::Less
                    } else if lo > c {
                        Ordering::Greater
                    } else {
                        Ordering::Equal
                    }
                })
                .is_ok();
        }

        let hi_byte = c >> 8;
        let i2 = ((c & 0xff) >> 6) as usize;
        let l2 = 1u64 << (c & 0o77);

        if let Ok(at) = self
            .blocks
            .binary_search_by_key(&(hi_byte as u8), |&(hi, _)| hi)
        {
            return vectors[self.blocks[at].1][i2] & l2 != 0;
        }

        let i1 = (hi_byte >> 6) as usize;
        let l1 = 1u64 << (hi_byte & 0o77);
        for &(hi_vec, lo_vec) in &self.ranges {
            if vectors[hi_vec][i1] & l1 != 0 {
                return vectors[lo_vec][i2] & l2 != 0;
            }
        }
        false
    }
}
