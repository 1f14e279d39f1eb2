// src/lexer/tables/build.rs
//! Assemble [`Tables`] from already-resolved token definitions: kinds with
//! their action class, lexical states, and for each definition a sequence of
//! character sets with repetition. Each set becomes one automaton state
//! (position automaton), so no subset construction happens here.

use std::{collections::BTreeMap, time::Instant};

use hashbrown::HashMap;
use rayon::prelude::*;

use super::{
    LexStateTable, Tables,
    nfa::{ALL_BITS, BitVec256, NfaState, NonAsciiClass},
};
use crate::lexer::{actions::TokenAction, error::TableError};

// ------------------ character sets ------------------

const MAX_CHAR: u32 = char::MAX as u32;

/// Set of characters as sorted, disjoint, non-adjacent inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

impl CharSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn any() -> Self {
        Self {
            ranges: vec![(0, MAX_CHAR)],
        }
    }

    pub fn single(c: char) -> Self {
        Self::range(c, c)
    }

    pub fn range(lo: char, hi: char) -> Self {
        let (lo, hi) = (lo as u32, hi as u32);
        if lo > hi {
            return Self::empty();
        }
        Self {
            ranges: vec![(lo, hi)],
        }
    }

    /// Every character of `chars`.
    pub fn of(chars: &str) -> Self {
        Self::from_ranges(chars.chars().map(|c| (c as u32, c as u32)).collect())
    }

    /// Every character except those of `chars`, i.e. `~[...]`.
    pub fn any_except(chars: &str) -> Self {
        Self::of(chars).negate()
    }

    fn from_ranges(mut ranges: Vec<(u32, u32)>) -> Self {
        ranges.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        Self { ranges: merged }
    }

    pub fn union(mut self, other: &CharSet) -> Self {
        self.ranges.extend_from_slice(&other.ranges);
        Self::from_ranges(self.ranges)
    }

    pub fn negate(self) -> Self {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for (lo, hi) in self.ranges {
            if lo > next {
                out.push((next, lo - 1));
            }
            next = hi + 1;
        }
        if next <= MAX_CHAR {
            out.push((next, MAX_CHAR));
        }
        Self { ranges: out }
    }

    pub fn contains(&self, c: char) -> bool {
        let c = c as u32;
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repeat {
    Once,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

impl Repeat {
    fn nullable(self) -> bool {
        matches!(self, Repeat::Optional | Repeat::ZeroOrMore)
    }

    fn loops(self) -> bool {
        matches!(self, Repeat::OneOrMore | Repeat::ZeroOrMore)
    }
}

/// One character from `set`, repeated per `repeat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub set: CharSet,
    pub repeat: Repeat,
}

impl Piece {
    pub fn once(set: CharSet) -> Self {
        Self {
            set,
            repeat: Repeat::Once,
        }
    }

    pub fn optional(set: CharSet) -> Self {
        Self {
            set,
            repeat: Repeat::Optional,
        }
    }

    pub fn one_or_more(set: CharSet) -> Self {
        Self {
            set,
            repeat: Repeat::OneOrMore,
        }
    }

    pub fn zero_or_more(set: CharSet) -> Self {
        Self {
            set,
            repeat: Repeat::ZeroOrMore,
        }
    }
}

// ------------------ builder ------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Image {
    Undefined,
    Literal(String),
    Pattern,
}

struct KindDecl {
    name: String,
    action: TokenAction,
    image: Image,
    new_lex_state: Option<usize>,
}

struct DraftState {
    set: CharSet,
    kind: u32,
    accepts: bool,
    next: Vec<usize>,
}

#[derive(Default)]
struct DraftLexState {
    name: String,
    initial: Vec<usize>,
    empty_match: Option<u32>,
}

pub struct TablesBuilder {
    lex_states: Vec<DraftLexState>,
    default_lex_state: usize,
    kinds: Vec<KindDecl>,
    states: Vec<DraftState>,
    eof_lex_state: Option<usize>,
    keep_line_column: bool,
}

impl Default for TablesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TablesBuilder {
    /// Builder with only kind 0 (`<EOF>`) declared.
    pub fn new() -> Self {
        Self {
            lex_states: Vec::new(),
            default_lex_state: 0,
            kinds: vec![KindDecl {
                name: "<EOF>".into(),
                action: TokenAction::Token,
                image: Image::Undefined,
                new_lex_state: None,
            }],
            states: Vec::new(),
            eof_lex_state: None,
            keep_line_column: true,
        }
    }

    pub fn keep_line_column(&mut self, keep: bool) -> &mut Self {
        self.keep_line_column = keep;
        self
    }

    /// Declare a lexical state. The first one declared is the default.
    pub fn lex_state(&mut self, name: &str) -> usize {
        self.lex_states.push(DraftLexState {
            name: name.to_string(),
            ..Default::default()
        });
        self.lex_states.len() - 1
    }

    pub fn set_default_lex_state(&mut self, lex_state: usize) -> Result<&mut Self, TableError> {
        self.check_lex_state(lex_state)?;
        self.default_lex_state = lex_state;
        Ok(self)
    }

    /// Declare the next kind. Kinds are numbered in declaration order, and on
    /// equal-length matches the lower number wins.
    pub fn kind(&mut self, name: &str, action: TokenAction) -> u32 {
        let name = if name.starts_with('<') {
            name.to_string()
        } else {
            format!("<{name}>")
        };
        self.kinds.push(KindDecl {
            name,
            action,
            image: Image::Undefined,
            new_lex_state: None,
        });
        (self.kinds.len() - 1) as u32
    }

    /// Switch to `lex_state` after every match of `kind`.
    pub fn switch_after(&mut self, kind: u32, lex_state: usize) -> Result<&mut Self, TableError> {
        self.check_kind(kind)?;
        self.check_lex_state(lex_state)?;
        self.kinds[kind as usize].new_lex_state = Some(lex_state);
        Ok(self)
    }

    pub fn on_eof_switch_to(&mut self, lex_state: usize) -> Result<&mut Self, TableError> {
        self.check_lex_state(lex_state)?;
        self.eof_lex_state = Some(lex_state);
        Ok(self)
    }

    /// `kind` matches exactly `text` in `lex_state`. A kind defined only by
    /// one literal reports that literal as its image.
    pub fn literal(
        &mut self,
        lex_state: usize,
        kind: u32,
        text: &str,
    ) -> Result<&mut Self, TableError> {
        let pieces: Vec<Piece> = text.chars().map(|c| Piece::once(CharSet::single(c))).collect();
        self.add_sequence(lex_state, kind, &pieces)?;
        let decl = &mut self.kinds[kind as usize];
        decl.image = match &decl.image {
            Image::Undefined => Image::Literal(text.to_string()),
            Image::Literal(prev) if prev == text => Image::Literal(text.to_string()),
            _ => Image::Pattern,
        };
        Ok(self)
    }

    /// `kind` matches the concatenation of `pieces` in `lex_state`.
    pub fn sequence(
        &mut self,
        lex_state: usize,
        kind: u32,
        pieces: &[Piece],
    ) -> Result<&mut Self, TableError> {
        self.add_sequence(lex_state, kind, pieces)?;
        self.kinds[kind as usize].image = Image::Pattern;
        Ok(self)
    }

    fn check_lex_state(&self, lex_state: usize) -> Result<(), TableError> {
        if lex_state >= self.lex_states.len() {
            return Err(TableError::Invalid(format!(
                "lexical state {lex_state} is not declared"
            )));
        }
        Ok(())
    }

    fn check_kind(&self, kind: u32) -> Result<(), TableError> {
        if kind == 0 || kind as usize >= self.kinds.len() {
            return Err(TableError::Invalid(format!(
                "kind {kind} is not a declared token kind"
            )));
        }
        Ok(())
    }

    fn add_sequence(
        &mut self,
        lex_state: usize,
        kind: u32,
        pieces: &[Piece],
    ) -> Result<(), TableError> {
        self.check_lex_state(lex_state)?;
        self.check_kind(kind)?;
        if let Some(at) = pieces.iter().position(|p| p.set.is_empty()) {
            return Err(TableError::Invalid(format!(
                "piece {at} of kind {kind} matches no character"
            )));
        }

        let n = pieces.len();
        let base = self.states.len();
        // nullable_from[i]: pieces[i..] can all match nothing.
        let mut nullable_from = vec![true; n + 1];
        for i in (0..n).rev() {
            nullable_from[i] = nullable_from[i + 1] && pieces[i].repeat.nullable();
        }

        // Positions reachable before consuming anything from `from` onwards.
        let reachable = |from: usize| -> Vec<usize> {
            let mut out = Vec::new();
            for j in from..n {
                out.push(base + j);
                if !pieces[j].repeat.nullable() {
                    break;
                }
            }
            out
        };

        for (i, piece) in pieces.iter().enumerate() {
            let mut next = Vec::new();
            if piece.repeat.loops() {
                next.push(base + i);
            }
            next.extend(reachable(i + 1));
            self.states.push(DraftState {
                set: piece.set.clone(),
                kind,
                accepts: nullable_from[i + 1],
                next,
            });
        }

        let lex = &mut self.lex_states[lex_state];
        lex.initial.extend(reachable(0));
        if nullable_from[0] {
            lex.empty_match = Some(lex.empty_match.map_or(kind, |k| k.min(kind)));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Tables, TableError> {
        let t0 = Instant::now();
        if self.lex_states.is_empty() {
            return Err(TableError::Invalid("no lexical states declared".into()));
        }

        let encoded: Vec<EncodedSet> = self.states.par_iter().map(|s| encode(&s.set)).collect();

        let mut interner = Interner::default();
        let mut next_states: Vec<usize> = Vec::new();
        let mut next_ids: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut states = Vec::with_capacity(self.states.len());

        for (draft, enc) in self.states.iter().zip(encoded) {
            let (next_start, next_len) = if draft.next.is_empty() {
                (0, 0)
            } else {
                let start = *next_ids.entry(draft.next.clone()).or_insert_with(|| {
                    let start = next_states.len();
                    next_states.extend_from_slice(&draft.next);
                    start
                });
                (start, draft.next.len())
            };
            states.push(NfaState {
                ascii: enc.ascii,
                non_ascii: interner.class(enc),
                kind: draft.accepts.then_some(draft.kind),
                next_start,
                next_len,
            });
        }

        let n_kinds = self.kinds.len();
        let words = n_kinds.div_ceil(64);
        let mut to_token = vec![0u64; words];
        let mut to_skip = vec![0u64; words];
        let mut to_special = vec![0u64; words];
        let mut to_more = vec![0u64; words];
        for (kind, decl) in self.kinds.iter().enumerate() {
            let bits = match decl.action {
                TokenAction::Token => &mut to_token,
                TokenAction::Skip => &mut to_skip,
                TokenAction::Special => &mut to_special,
                TokenAction::More => &mut to_more,
            };
            bits[kind >> 6] |= 1u64 << (kind & 0o77);
        }

        let tables = Tables {
            lex_state_names: self.lex_states.iter().map(|l| l.name.clone()).collect(),
            default_lex_state: self.default_lex_state,
            lex_states: self
                .lex_states
                .iter()
                .map(|l| LexStateTable {
                    initial: l.initial.clone(),
                    empty_match: l.empty_match,
                })
                .collect(),
            states,
            next_states,
            bit_vectors: interner.vectors,
            non_ascii: interner.classes,
            kind_names: self.kinds.iter().map(|k| k.name.clone()).collect(),
            literal_images: self
                .kinds
                .iter()
                .map(|k| match &k.image {
                    Image::Literal(text) => text.clone(),
                    _ => String::new(),
                })
                .collect(),
            to_token,
            to_skip,
            to_special,
            to_more,
            new_lex_state: self.kinds.iter().map(|k| k.new_lex_state).collect(),
            eof_lex_state: self.eof_lex_state,
            keep_line_column: self.keep_line_column,
        };
        tables.validate()?;

        log::info!(
            "built tables: {} lexical states, {} kinds, {} automaton states, {} bit vectors, {} non-ASCII classes in {:?}",
            tables.lex_state_count(),
            tables.kind_count(),
            tables.states.len(),
            tables.bit_vectors.len(),
            tables.non_ascii.len(),
            t0.elapsed()
        );
        Ok(tables)
    }
}

// ------------------ encoding ------------------

struct EncodedSet {
    ascii: [u64; 2],
    // Low-byte vectors keyed by high byte, BMP above 127 only.
    blocks: BTreeMap<u8, BitVec256>,
    astral: Vec<(u32, u32)>,
}

fn set_bits(words: &mut [u64], lo: u32, hi: u32) {
    for bit in lo..=hi {
        words[(bit >> 6) as usize] |= 1u64 << (bit & 0o77);
    }
}

fn encode(set: &CharSet) -> EncodedSet {
    let mut ascii = [0u64; 2];
    let mut blocks: BTreeMap<u8, BitVec256> = BTreeMap::new();
    let mut astral = Vec::new();

    for &(lo, hi) in set.ranges() {
        if lo < 128 {
            set_bits(&mut ascii, lo, hi.min(127));
        }
        let (bmp_lo, bmp_hi) = (lo.max(128), hi.min(0xFFFF));
        if bmp_lo <= bmp_hi {
            for block in (bmp_lo >> 8)..=(bmp_hi >> 8) {
                let from = bmp_lo.max(block << 8) & 0xFF;
                let to = bmp_hi.min((block << 8) | 0xFF) & 0xFF;
                set_bits(blocks.entry(block as u8).or_default(), from, to);
            }
        }
        if hi > 0xFFFF {
            astral.push((lo.max(0x10000), hi));
        }
    }

    EncodedSet {
        ascii,
        blocks,
        astral,
    }
}

#[derive(Default)]
struct Interner {
    vectors: Vec<BitVec256>,
    vector_ids: HashMap<BitVec256, usize>,
    classes: Vec<NonAsciiClass>,
    class_ids: HashMap<NonAsciiClass, usize>,
}

impl Interner {
    fn vector(&mut self, v: BitVec256) -> usize {
        *self.vector_ids.entry(v).or_insert_with(|| {
            self.vectors.push(v);
            self.vectors.len() - 1
        })
    }

    // Whole 256-character blocks share one (high vector, all bits) pair.
    fn class(&mut self, enc: EncodedSet) -> Option<usize> {
        let mut class = NonAsciiClass {
            astral: enc.astral,
            ..Default::default()
        };
        let mut full: BitVec256 = [0; 4];
        let mut any_full = false;
        for (hi, lo_vec) in enc.blocks {
            if lo_vec == ALL_BITS && hi != 0 {
                set_bits(&mut full, hi as u32, hi as u32);
                any_full = true;
            } else {
                let id = self.vector(lo_vec);
                class.blocks.push((hi, id));
            }
        }
        if any_full {
            let hi_vec = self.vector(full);
            let lo_vec = self.vector(ALL_BITS);
            class.ranges.push((hi_vec, lo_vec));
        }
        if class.is_empty() {
            return None;
        }
        Some(*self.class_ids.entry(class.clone()).or_insert_with(|| {
            self.classes.push(class);
            self.classes.len() - 1
        }))
    }
}
