// src/lexer/states.rs
//! Active NFA state set with round-stamped deduplication.
//!
//! Every state remembers the round in which it was last inserted. Advancing
//! the round invalidates all stamps at once, so the set never needs clearing
//! between characters or tokens.

pub struct StateTracker {
    jjstate_set: Vec<usize>,
    pending: Vec<usize>,
    jjrounds: Vec<u32>,
    jjround: u32,
}

impl StateTracker {
    /// Buffers sized for an automaton of `state_count` states.
    pub fn new(state_count: usize) -> Self {
        Self::starting_at(state_count, 0)
    }

    /// Like `new`, with the round counter preset. Lets callers exercise the
    /// wraparound path.
    pub fn starting_at(state_count: usize, round: u32) -> Self {
        Self {
            jjstate_set: Vec::with_capacity(state_count),
            pending: Vec::with_capacity(state_count),
            jjrounds: vec![0; state_count],
            jjround: round,
        }
    }

    pub fn round(&self) -> u32 {
        self.jjround
    }

    /// Start a new round. Stamps of earlier rounds no longer count as members.
    pub fn reset_epoch(&mut self) {
        self.jjround = self.jjround.wrapping_add(1);
        if self.jjround == 0 {
            self.re_init_rounds();
        }
    }

    // After wrapping, a stale stamp could equal the new round; wipe them all.
    fn re_init_rounds(&mut self) {
        log::warn!("state round counter wrapped; resetting {} stamps", self.jjrounds.len());
        self.jjrounds.fill(0);
        self.jjround = 1;
    }

    /// Insert `state` into the pending set unless it was inserted this round.
    #[inline]
    pub fn add(&mut self, state: usize) {
        if self.jjrounds[state] != self.jjround {
            self.pending.push(state);
            self.jjrounds[state] = self.jjround;
        }
    }

    #[inline]
    pub fn add_pair(&mut self, state1: usize, state2: usize) {
        self.add(state1);
        self.add(state2);
    }

    /// Insert `table[start..=end]`.
    pub fn add_range(&mut self, table: &[usize], start: usize, end: usize) {
        for &state in &table[start..=end] {
            self.add(state);
        }
    }

    /// Make the pending set the active one.
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.jjstate_set, &mut self.pending);
        self.pending.clear();
    }

    /// Replace the active set with `initial` in a fresh round.
    pub fn seed(&mut self, initial: &[usize]) {
        self.pending.clear();
        self.reset_epoch();
        for &state in initial {
            self.add(state);
        }
        self.advance();
    }

    pub fn active(&self) -> &[usize] {
        &self.jjstate_set
    }

    pub fn len(&self) -> usize {
        self.jjstate_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jjstate_set.is_empty()
    }
}
