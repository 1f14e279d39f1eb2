// src/bin/lex_file.rs
// Lex a file and print one line per token, specials included.
// Usage:
//   cargo run --bin lex_file -- input.calc
// Env:
//   LEX_TABLES=path     tables to use (JSON or binary); default is the bundled grammar
//   LEX_TAB_SIZE=n      tab stop for column numbers (default 1)
//   LEX_MAX_ERRORS=n    stop after this many lexical errors (default 20)

use std::{env, fs, path::Path};

use anyhow::{Context, Result, bail};
use nfalex::{
    lexer::{LexError, Lexer, StrCharStream, Tables, Token, tables::{calc_tables, load_tables_file}},
    util::{env_string, env_usize},
};

fn describe(t: &Tables, tok: &Token) -> String {
    let pos = tok
        .span
        .map(|s| format!("{}:{}-{}:{}", s.begin_line, s.begin_column, s.end_line, s.end_column))
        .unwrap_or_default();
    format!("{:<22} {:>15}  {:?}", t.kind_name(tok.kind), pos, tok.image)
}

fn main() -> Result<()> {
    let Some(input) = env::args().nth(1) else {
        bail!("usage: lex_file <input>");
    };
    let src = fs::read_to_string(&input).with_context(|| format!("failed to read {input}"))?;

    let loaded;
    let tables: &Tables = match env_string("LEX_TABLES") {
        Some(path) => {
            loaded = load_tables_file(Path::new(&path)).with_context(|| format!("failed to load {path}"))?;
            &loaded
        }
        None => calc_tables(),
    };
    let tab_size = env_usize("LEX_TAB_SIZE", 1);
    let max_errors = env_usize("LEX_MAX_ERRORS", 20);

    let mut lexer = Lexer::new(tables, StrCharStream::with_tab_size(&src, tab_size));
    let mut errors = 0usize;
    let mut count = 0usize;
    loop {
        match lexer.get_next_token() {
            Ok(tok) => {
                // Specials come most recent first.
                let specials: Vec<&Token> = tok.specials().collect();
                for sp in specials.iter().rev() {
                    println!("  {}", describe(tables, sp));
                }
                println!("{}", describe(tables, &tok));
                count += 1;
                if tok.is_eof() {
                    break;
                }
            }
            Err(e @ LexError::Lexical { .. }) => {
                eprintln!("[lex_file] {e}");
                errors += 1;
                if errors >= max_errors || lexer.resync().is_none() {
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    eprintln!("[lex_file] {count} tokens, {errors} lexical errors");
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
