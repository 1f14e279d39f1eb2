// src/bin/gen_tables.rs
// Build the bundled grammar's tables and write them as JSON and binary.
// Usage:
//   cargo run --bin gen_tables                  # writes tables/calc_tables.{json,bin}
//   cargo run --bin gen_tables -- /path/out     # writes /path/out.{json,bin}

use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use nfalex::lexer::tables::{grammar::build_calc_tables, save_tables_bin, save_tables_json};

fn main() -> Result<()> {
    let base = PathBuf::from(
        env::args()
            .nth(1)
            .unwrap_or_else(|| "tables/calc_tables".to_string()),
    );
    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    println!("[gen_tables] building calculator grammar tables…");
    let t = build_calc_tables()?;
    println!(
        "[gen_tables] {} lexical states, {} kinds, {} states, {} successor entries, {} bit vectors, {} non-ASCII classes",
        t.lex_state_count(),
        t.kind_count(),
        t.states().len(),
        t.next_states().len(),
        t.bit_vectors().len(),
        t.non_ascii().len()
    );

    let json = base.with_extension("json");
    save_tables_json(&json, &t).with_context(|| format!("failed to write {}", json.display()))?;
    println!("[gen_tables] wrote {}", json.display());

    let bin = base.with_extension("bin");
    save_tables_bin(&bin, &t).with_context(|| format!("failed to write {}", bin.display()))?;
    println!("[gen_tables] wrote {}", bin.display());
    Ok(())
}
