// src/lexer/tables/io.rs
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    time::Instant,
};

use serde::Deserialize;

use super::{LexStateTable, Tables, nfa::{BitVec256, NfaState, NonAsciiClass}};
use crate::lexer::error::TableError;

// -------------------- JSON --------------------

// Unchecked mirror of `Tables`; becomes `Tables` only after validation.
#[derive(Deserialize)]
pub(crate) struct TablesDisk {
    lex_state_names: Vec<String>,
    default_lex_state: usize,
    lex_states: Vec<LexStateTable>,
    states: Vec<NfaState>,
    next_states: Vec<usize>,
    bit_vectors: Vec<BitVec256>,
    non_ascii: Vec<NonAsciiClass>,
    kind_names: Vec<String>,
    literal_images: Vec<String>,
    to_token: Vec<u64>,
    to_skip: Vec<u64>,
    to_special: Vec<u64>,
    to_more: Vec<u64>,
    new_lex_state: Vec<Option<usize>>,
    eof_lex_state: Option<usize>,
    keep_line_column: bool,
}

impl TryFrom<TablesDisk> for Tables {
    type Error = TableError;

    fn try_from(d: TablesDisk) -> Result<Self, TableError> {
        let t = Tables {
            lex_state_names: d.lex_state_names,
            default_lex_state: d.default_lex_state,
            lex_states: d.lex_states,
            states: d.states,
            next_states: d.next_states,
            bit_vectors: d.bit_vectors,
            non_ascii: d.non_ascii,
            kind_names: d.kind_names,
            literal_images: d.literal_images,
            to_token: d.to_token,
            to_skip: d.to_skip,
            to_special: d.to_special,
            to_more: d.to_more,
            new_lex_state: d.new_lex_state,
            eof_lex_state: d.eof_lex_state,
            keep_line_column: d.keep_line_column,
        };
        t.validate()?;
        Ok(t)
    }
}

pub fn save_tables_json(path: &Path, t: &Tables) -> Result<(), TableError> {
    // Stream to disk to avoid a giant intermediate string.
    let mut w = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut w, t)?;
    w.flush()?;
    Ok(())
}

pub fn load_tables_json_bytes(data: &[u8]) -> Result<Tables, TableError> {
    let disk: TablesDisk = serde_json::from_slice(data)?;
    Tables::try_from(disk)
}

// -------------------- binary --------------------
//
//   magic "LXNFA001", then little-endian u32 fields unless noted:
//   flags (bit 0: keep_line_column), default lexical state, <EOF> switch
//   lexical states: count, then per state: name, empty match, initial states
//   kinds: count, then per kind: name, literal image, lexical state switch
//   action bitsets: word count, then to_token, to_skip, to_special, to_more (u64)
//   states: count, then per state: ascii mask (2 x u64), class, kind, next start, next len
//   next_states, bit vectors (4 x u64 each), non-ASCII classes
//
//   Strings are a u32 byte length plus UTF-8; absent options are u32::MAX.

const BIN_MAGIC: &[u8; 8] = b"LXNFA001";
const NONE: u32 = u32::MAX;

fn too_big(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("{what} exceeds u32::MAX"))
}

fn put_u32<W: Write>(w: &mut W, v: usize, what: &str) -> io::Result<()> {
    let v = u32::try_from(v).ok().filter(|&v| v != NONE).ok_or_else(|| too_big(what))?;
    w.write_all(&v.to_le_bytes())
}

fn put_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn put_opt<W: Write>(w: &mut W, v: Option<usize>, what: &str) -> io::Result<()> {
    match v {
        Some(v) => put_u32(w, v, what),
        None => w.write_all(&NONE.to_le_bytes()),
    }
}

fn put_str<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    put_u32(w, s.len(), "string length")?;
    w.write_all(s.as_bytes())
}

fn put_usizes<W: Write>(w: &mut W, vs: &[usize], what: &str) -> io::Result<()> {
    put_u32(w, vs.len(), what)?;
    vs.iter().try_for_each(|&v| put_u32(w, v, what))
}

fn put_pairs<W: Write>(w: &mut W, vs: &[(usize, usize)], what: &str) -> io::Result<()> {
    put_u32(w, vs.len(), what)?;
    vs.iter().try_for_each(|&(a, b)| {
        put_u32(w, a, what)?;
        put_u32(w, b, what)
    })
}

pub fn write_tables_bin<W: Write>(w: &mut W, t: &Tables) -> io::Result<()> {
    w.write_all(BIN_MAGIC)?;
    put_u32(w, t.keep_line_column as usize, "flags")?;
    put_u32(w, t.default_lex_state, "default lexical state")?;
    put_opt(w, t.eof_lex_state, "<EOF> lexical state")?;

    put_u32(w, t.lex_states.len(), "lexical state count")?;
    for (name, lex) in t.lex_state_names.iter().zip(&t.lex_states) {
        put_str(w, name)?;
        put_opt(w, lex.empty_match.map(|k| k as usize), "empty match kind")?;
        put_usizes(w, &lex.initial, "initial states")?;
    }

    put_u32(w, t.kind_names.len(), "kind count")?;
    for ((name, literal), switch) in t.kind_names.iter().zip(&t.literal_images).zip(&t.new_lex_state) {
        put_str(w, name)?;
        put_str(w, literal)?;
        put_opt(w, *switch, "lexical state switch")?;
    }

    put_u32(w, t.to_token.len(), "bitset words")?;
    for bits in [&t.to_token, &t.to_skip, &t.to_special, &t.to_more] {
        bits.iter().try_for_each(|&word| put_u64(w, word))?;
    }

    put_u32(w, t.states.len(), "state count")?;
    for s in &t.states {
        put_u64(w, s.ascii[0])?;
        put_u64(w, s.ascii[1])?;
        put_opt(w, s.non_ascii, "non-ASCII class")?;
        put_opt(w, s.kind.map(|k| k as usize), "state kind")?;
        put_u32(w, s.next_start, "next start")?;
        put_u32(w, s.next_len, "next len")?;
    }
    put_usizes(w, &t.next_states, "next_states")?;

    put_u32(w, t.bit_vectors.len(), "bit vector count")?;
    for v in &t.bit_vectors {
        v.iter().try_for_each(|&word| put_u64(w, word))?;
    }

    put_u32(w, t.non_ascii.len(), "class count")?;
    for class in &t.non_ascii {
        put_u32(w, class.blocks.len(), "blocks")?;
        for &(hi, vec) in &class.blocks {
            w.write_all(&[hi])?;
            put_u32(w, vec, "block vector")?;
        }
        put_pairs(w, &class.ranges, "ranges")?;
        let astral: Vec<(usize, usize)> =
            class.astral.iter().map(|&(lo, hi)| (lo as usize, hi as usize)).collect();
        put_pairs(w, &astral, "supplementary ranges")?;
    }
    Ok(())
}

pub fn save_tables_bin(path: &Path, t: &Tables) -> Result<(), TableError> {
    let instant = Instant::now();
    let mut w = BufWriter::new(File::create(path)?);
    write_tables_bin(&mut w, t)?;
    w.flush()?;
    log::info!(
        "saved tables to {} in {} ms",
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], TableError> {
        if self.buf.len() < n {
            return Err(TableError::Binary(format!("truncated {what}")));
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn u8(&mut self, what: &str) -> Result<u8, TableError> {
        Ok(self.take(1, what)?[0])
    }

    fn u32(&mut self, what: &str) -> Result<u32, TableError> {
        let mut le = [0u8; 4];
        le.copy_from_slice(self.take(4, what)?);
        Ok(u32::from_le_bytes(le))
    }

    fn u64(&mut self, what: &str) -> Result<u64, TableError> {
        let mut le = [0u8; 8];
        le.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(le))
    }

    fn usize(&mut self, what: &str) -> Result<usize, TableError> {
        Ok(self.u32(what)? as usize)
    }

    fn opt(&mut self, what: &str) -> Result<Option<u32>, TableError> {
        let v = self.u32(what)?;
        Ok((v != NONE).then_some(v))
    }

    /// Element count, rejected early when the rest of the buffer cannot hold
    /// `count` elements of at least `min_size` bytes.
    fn count(&mut self, min_size: usize, what: &str) -> Result<usize, TableError> {
        let n = self.usize(what)?;
        if n.saturating_mul(min_size) > self.buf.len() {
            return Err(TableError::Binary(format!("{what} count {n} exceeds remaining data")));
        }
        Ok(n)
    }

    fn string(&mut self, what: &str) -> Result<String, TableError> {
        let len = self.count(1, what)?;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| TableError::Binary(format!("{what} is not UTF-8")))
    }

    fn usizes(&mut self, what: &str) -> Result<Vec<usize>, TableError> {
        let n = self.count(4, what)?;
        (0..n).map(|_| self.usize(what)).collect()
    }

    fn pairs(&mut self, what: &str) -> Result<Vec<(u32, u32)>, TableError> {
        let n = self.count(8, what)?;
        (0..n).map(|_| Ok((self.u32(what)?, self.u32(what)?))).collect()
    }
}

pub fn load_tables_bin_bytes(data: &[u8]) -> Result<Tables, TableError> {
    if data.len() < BIN_MAGIC.len() || &data[..BIN_MAGIC.len()] != BIN_MAGIC {
        return Err(TableError::Binary("bad magic in tables .bin".into()));
    }
    let mut r = Reader {
        buf: &data[BIN_MAGIC.len()..],
    };

    let flags = r.u32("flags")?;
    let default_lex_state = r.usize("default lexical state")?;
    let eof_lex_state = r.opt("<EOF> lexical state")?.map(|v| v as usize);

    let n_lex = r.count(12, "lexical states")?;
    let mut lex_state_names = Vec::with_capacity(n_lex);
    let mut lex_states = Vec::with_capacity(n_lex);
    for _ in 0..n_lex {
        lex_state_names.push(r.string("lexical state name")?);
        let empty_match = r.opt("empty match kind")?;
        let initial = r.usizes("initial states")?;
        lex_states.push(LexStateTable {
            initial,
            empty_match,
        });
    }

    let n_kinds = r.count(12, "kinds")?;
    let mut kind_names = Vec::with_capacity(n_kinds);
    let mut literal_images = Vec::with_capacity(n_kinds);
    let mut new_lex_state = Vec::with_capacity(n_kinds);
    for _ in 0..n_kinds {
        kind_names.push(r.string("kind name")?);
        literal_images.push(r.string("literal image")?);
        new_lex_state.push(r.opt("lexical state switch")?.map(|v| v as usize));
    }

    let words = r.count(32, "bitset words")?;
    let mut bitsets: [Vec<u64>; 4] = Default::default();
    for bits in &mut bitsets {
        *bits = (0..words).map(|_| r.u64("action bitset")).collect::<Result<_, _>>()?;
    }
    let [to_token, to_skip, to_special, to_more] = bitsets;

    let n_states = r.count(32, "states")?;
    let mut states = Vec::with_capacity(n_states);
    for _ in 0..n_states {
        let ascii = [r.u64("ascii mask")?, r.u64("ascii mask")?];
        states.push(NfaState {
            ascii,
            non_ascii: r.opt("non-ASCII class")?.map(|v| v as usize),
            kind: r.opt("state kind")?,
            next_start: r.usize("next start")?,
            next_len: r.usize("next len")?,
        });
    }
    let next_states = r.usizes("next_states")?;

    let n_vectors = r.count(32, "bit vectors")?;
    let mut bit_vectors: Vec<BitVec256> = Vec::with_capacity(n_vectors);
    for _ in 0..n_vectors {
        let mut v = [0u64; 4];
        for word in &mut v {
            *word = r.u64("bit vector")?;
        }
        bit_vectors.push(v);
    }

    let n_classes = r.count(12, "non-ASCII classes")?;
    let mut non_ascii = Vec::with_capacity(n_classes);
    for _ in 0..n_classes {
        let n_blocks = r.count(5, "blocks")?;
        let blocks = (0..n_blocks)
            .map(|_| Ok((r.u8("block")?, r.usize("block vector")?)))
            .collect::<Result<Vec<_>, TableError>>()?;
        let ranges = r
            .pairs("ranges")?
            .into_iter()
            .map(|(hi, lo)| (hi as usize, lo as usize))
            .collect();
        let astral = r.pairs("supplementary ranges")?;
        non_ascii.push(NonAsciiClass {
            blocks,
            ranges,
            astral,
        });
    }

    if !r.buf.is_empty() {
        return Err(TableError::Binary(format!(
            "{} trailing bytes after tables",
            r.buf.len()
        )));
    }

    let t = Tables {
        lex_state_names,
        default_lex_state,
        lex_states,
        states,
        next_states,
        bit_vectors,
        non_ascii,
        kind_names,
        literal_images,
        to_token,
        to_skip,
        to_special,
        to_more,
        new_lex_state,
        eof_lex_state,
        keep_line_column: flags & 1 != 0,
    };
    t.validate()?;
    Ok(t)
}

/// Load tables from `path`: binary when the file starts with the binary
/// magic, JSON otherwise.
pub fn load_tables_file(path: &Path) -> Result<Tables, TableError> {
    let instant = Instant::now();
    let data = std::fs::read(path)?;
    let t = if data.starts_with(BIN_MAGIC) {
        load_tables_bin_bytes(&data)?
    } else {
        load_tables_json_bytes(&data)?
    };
    log::info!(
        "loaded tables from {} ({} states) in {} ms",
        path.display(),
        t.states.len(),
        instant.elapsed().as_millis()
    );
    Ok(t)
}
