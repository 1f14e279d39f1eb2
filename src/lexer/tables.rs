// src/lexer/tables.rs
pub mod build;
pub mod grammar;
pub mod io;
pub mod nfa;
pub mod tokens;

// Re-exports to keep the external API flat.
pub use build::{CharSet, Piece, Repeat, TablesBuilder};
pub use grammar::calc_tables;
pub use io::{
    load_tables_bin_bytes, load_tables_file, load_tables_json_bytes, save_tables_bin,
    save_tables_json, write_tables_bin,
};
pub use nfa::{BitVec256, NfaState, NonAsciiClass};
pub use tokens::{EOF, TokenKind};

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{actions::TokenAction, error::TableError};

/// Entry point of one lexical state.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LexStateTable {
    /// States active before the first character of a token.
    pub initial: Vec<usize>,
    /// Kind matched by the empty string in this lexical state, if any.
    pub empty_match: Option<u32>,
}

/// Immutable tables produced by the grammar compiler. Shared read-only by
/// any number of lexers.
///
/// Only the builder and the loaders construct `Tables`, and both validate
/// them, so the scanning loop can index without checks. Deserializing goes
/// through the same validation.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "io::TablesDisk")]
pub struct Tables {
    pub(crate) lex_state_names: Vec<String>,
    pub(crate) default_lex_state: usize,
    pub(crate) lex_states: Vec<LexStateTable>,

    pub(crate) states: Vec<NfaState>,
    pub(crate) next_states: Vec<usize>,
    pub(crate) bit_vectors: Vec<BitVec256>,
    pub(crate) non_ascii: Vec<NonAsciiClass>,

    /// Display names indexed by kind, `"<EOF>"` first.
    pub(crate) kind_names: Vec<String>,
    /// Canonical spelling per kind, empty when the kind has none.
    pub(crate) literal_images: Vec<String>,
    pub(crate) to_token: Vec<u64>,
    pub(crate) to_skip: Vec<u64>,
    pub(crate) to_special: Vec<u64>,
    pub(crate) to_more: Vec<u64>,
    pub(crate) new_lex_state: Vec<Option<usize>>,
    pub(crate) eof_lex_state: Option<usize>,

    /// Whether tokens carry begin/end line and column.
    pub(crate) keep_line_column: bool,
}

#[inline]
pub(crate) fn bit_set(words: &[u64], kind: u32) -> bool {
    words
        .get((kind >> 6) as usize)
        .is_some_and(|w| w & (1u64 << (kind & 0o77)) != 0)
}

impl Tables {
    pub fn lex_states(&self) -> &[LexStateTable] {
        &self.lex_states
    }

    pub fn default_lex_state(&self) -> usize {
        self.default_lex_state
    }

    pub fn eof_lex_state(&self) -> Option<usize> {
        self.eof_lex_state
    }

    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    pub fn next_states(&self) -> &[usize] {
        &self.next_states
    }

    pub fn bit_vectors(&self) -> &[BitVec256] {
        &self.bit_vectors
    }

    pub fn non_ascii(&self) -> &[NonAsciiClass] {
        &self.non_ascii
    }

    pub fn keep_line_column(&self) -> bool {
        self.keep_line_column
    }

    pub fn kind_count(&self) -> usize {
        self.kind_names.len()
    }

    pub fn lex_state_count(&self) -> usize {
        self.lex_states.len()
    }

    pub fn lex_state_name(&self, lex_state: usize) -> &str {
        self.lex_state_names
            .get(lex_state)
            .map_or("<invalid>", String::as_str)
    }

    pub fn kind_name(&self, kind: u32) -> &str {
        self.kind_names
            .get(kind as usize)
            .map_or("<unknown>", String::as_str)
    }

    /// Literal spelling of `kind`, `None` if its image comes from the input.
    pub fn literal_image(&self, kind: u32) -> Option<&str> {
        self.literal_images
            .get(kind as usize)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Action class of `kind`. Kinds without a declared class are tokens.
    pub fn action_of(&self, kind: u32) -> TokenAction {
        if bit_set(&self.to_token, kind) {
            TokenAction::Token
        } else if bit_set(&self.to_more, kind) {
            TokenAction::More
        } else if bit_set(&self.to_special, kind) {
            TokenAction::Special
        } else if bit_set(&self.to_skip, kind) {
            TokenAction::Skip
        } else {
            TokenAction::Token
        }
    }

    pub fn new_lex_state(&self, kind: u32) -> Option<usize> {
        self.new_lex_state.get(kind as usize).copied().flatten()
    }

    #[inline]
    pub fn successors(&self, state: &NfaState) -> &[usize] {
        &self.next_states[state.next_start..state.next_start + state.next_len]
    }

    /// Whether `state` moves on character `c`.
    #[inline]
    pub fn can_move(&self, state: &NfaState, c: u32) -> bool {
        if c < 128 {
            nfa::ascii_move(&state.ascii, c)
        } else {
            match state.non_ascii {
                Some(class) => self.non_ascii[class].can_move(c, &self.bit_vectors),
                None => false,
            }
        }
    }

    /// Check every cross-reference once so the scanning loop can index
    /// without further checks.
    pub fn validate(&self) -> Result<(), TableError> {
        fn invalid(msg: String) -> Result<(), TableError> {
            Err(TableError::Invalid(msg))
        }

        let n_lex = self.lex_states.len();
        let n_states = self.states.len();
        let n_kinds = self.kind_names.len();
        let n_vectors = self.bit_vectors.len();

        if n_lex == 0 {
            return invalid("no lexical states".into());
        }
        if self.lex_state_names.len() != n_lex {
            return invalid(format!(
                "{} lexical state names for {n_lex} lexical states",
                self.lex_state_names.len()
            ));
        }
        if self.default_lex_state >= n_lex {
            return invalid(format!(
                "default lexical state {} out of range",
                self.default_lex_state
            ));
        }
        if n_kinds == 0 {
            return invalid("kind 0 (<EOF>) is not declared".into());
        }
        if self.literal_images.len() != n_kinds || self.new_lex_state.len() != n_kinds {
            return invalid(format!(
                "per-kind tables disagree: {n_kinds} names, {} literal images, {} lexical state switches",
                self.literal_images.len(),
                self.new_lex_state.len()
            ));
        }
        let words = n_kinds.div_ceil(64);
        for (name, bits) in [
            ("to_token", &self.to_token),
            ("to_skip", &self.to_skip),
            ("to_special", &self.to_special),
            ("to_more", &self.to_more),
        ] {
            if bits.len() != words {
                return invalid(format!("{name} has {} words, expected {words}", bits.len()));
            }
        }
        for (kind, target) in self.new_lex_state.iter().enumerate() {
            if let Some(target) = *target {
                if target >= n_lex {
                    return invalid(format!("kind {kind} switches to undefined lexical state {target}"));
                }
            }
        }
        if let Some(target) = self.eof_lex_state {
            if target >= n_lex {
                return invalid(format!("<EOF> switches to undefined lexical state {target}"));
            }
        }

        for (i, lex) in self.lex_states.iter().enumerate() {
            if let Some(&bad) = lex.initial.iter().find(|&&s| s >= n_states) {
                return invalid(format!("lexical state {i} starts in undefined state {bad}"));
            }
            match lex.empty_match {
                Some(0) => return invalid(format!("lexical state {i} matches <EOF> on empty input")),
                Some(kind) if kind as usize >= n_kinds => {
                    return invalid(format!("lexical state {i} matches undefined kind {kind}"));
                }
                _ => {}
            }
        }

        for (i, state) in self.states.iter().enumerate() {
            let end = state.next_start.checked_add(state.next_len);
            if end.is_none_or(|end| end > self.next_states.len()) {
                return invalid(format!("state {i} successor slice out of range"));
            }
            match state.kind {
                Some(0) => return invalid(format!("state {i} accepts <EOF>")),
                Some(kind) if kind as usize >= n_kinds => {
                    return invalid(format!("state {i} accepts undefined kind {kind}"));
                }
                _ => {}
            }
            if let Some(class) = state.non_ascii {
                if class >= self.non_ascii.len() {
                    return invalid(format!("state {i} uses undefined non-ASCII class {class}"));
                }
            }
        }
        if let Some(&bad) = self.next_states.iter().find(|&&s| s >= n_states) {
            return invalid(format!("next_states references undefined state {bad}"));
        }

        for (i, class) in self.non_ascii.iter().enumerate() {
            let vectors_ok = class.blocks.iter().all(|&(_, lo)| lo < n_vectors)
                && class
                    .ranges
                    .iter()
                    .all(|&(hi, lo)| hi < n_vectors && lo < n_vectors);
            if !vectors_ok {
                return invalid(format!("non-ASCII class {i} references undefined bit vector"));
            }
            if !class.blocks.windows(2).all(|w| w[0].0 < w[1].0) {
                return invalid(format!("non-ASCII class {i} blocks are not sorted"));
            }
            if !class.astral.iter().all(|&(lo, hi)| lo <= hi && lo > 0xFFFF)
                || !class.astral.windows(2).all(|w| w[0].1 < w[1].0)
            {
                return invalid(format!("non-ASCII class {i} has malformed supplementary ranges"));
            }
        }

        Ok(())
    }
}
