// src/bin/fuzz_lex.rs
// Generate random-but-valid inputs for the bundled grammar and check that
//   - every input lexes without error,
//   - token images plus their special tokens reproduce the input exactly,
//   - the parallel batch lexer agrees with sequential lexing.
// Env:
//   FUZZ_SEED=u64      RNG seed (default 42)
//   FUZZ_LEN=n         bytes per generated input (default 100000)
//   FUZZ_ITERS=n       number of inputs (default 8)
//   FUZZ_SAVE=1        write failing inputs to FUZZ_DIR (default "fuzz-cases")
//   FUZZ_INPUT=path    replay one saved input instead of fuzzing

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, bail};
use nfalex::{
    dev::gen_valid_source,
    lexer::{Token, lex_all_parallel, lex_str, tables::calc_tables},
    util::{env_flag_true, env_string, env_u64, env_usize},
};
use rand::{SeedableRng, rngs::StdRng};

// ------------------ checks ------------------

fn reassemble(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        let specials: Vec<&Token> = tok.specials().collect();
        for sp in specials.iter().rev() {
            out.push_str(&sp.image);
        }
        out.push_str(&tok.image);
    }
    out
}

fn first_difference(a: &str, b: &str) -> usize {
    a.bytes()
        .zip(b.bytes())
        .position(|(x, y)| x != y)
        .unwrap_or(a.len().min(b.len()))
}

fn run_once(label: &str, src: &str) -> Result<Vec<Token>> {
    let t0 = Instant::now();
    let tokens = lex_str(calc_tables(), src).with_context(|| format!("[{label}] lexing failed"))?;
    let ms = t0.elapsed().as_millis();

    let back = reassemble(&tokens);
    if back != src {
        let at = first_difference(&back, src);
        let lo = at.saturating_sub(32);
        bail!(
            "[{label}] round trip diverges at byte {at}: got {:?} want {:?}",
            back.get(lo..(at + 32).min(back.len())),
            src.get(lo..(at + 32).min(src.len()))
        );
    }
    eprintln!(
        "[{label}] {} bytes -> {} tokens in {ms} ms  OK",
        src.len(),
        tokens.len()
    );
    Ok(tokens)
}

fn save_case(dir: &Path, seed: u64, iter: usize, src: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("case_s{seed}_i{iter}_n{}.calc", src.len()));
    fs::write(&path, src).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

// ------------------ main ------------------

fn main() -> Result<()> {
    if let Some(path) = env_string("FUZZ_INPUT") {
        eprintln!("[replay] reading {path}");
        let src = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
        run_once("replay", &src)?;
        return Ok(());
    }

    let seed = env_u64("FUZZ_SEED", 42);
    let len = env_usize("FUZZ_LEN", 100_000);
    let iters = env_usize("FUZZ_ITERS", 8);
    let save = env_flag_true("FUZZ_SAVE", false);
    let dir = PathBuf::from(env_string("FUZZ_DIR").unwrap_or_else(|| "fuzz-cases".into()));

    eprintln!("[fuzz] len={len} iters={iters} seed={seed}");
    let mut rng = StdRng::seed_from_u64(seed);
    let inputs: Vec<String> = (0..iters).map(|_| gen_valid_source(&mut rng, len)).collect();

    let mut sequential = Vec::with_capacity(iters);
    for (i, src) in inputs.iter().enumerate() {
        match run_once(&format!("iter {i}"), src) {
            Ok(tokens) => sequential.push(tokens),
            Err(e) => {
                if save {
                    let path = save_case(&dir, seed, i, src)?;
                    eprintln!("[save] wrote {}", path.display());
                }
                return Err(e);
            }
        }
    }

    let t0 = Instant::now();
    let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
    let parallel = lex_all_parallel(calc_tables(), &refs);
    eprintln!("[fuzz] parallel batch of {iters} in {} ms", t0.elapsed().as_millis());
    for (i, (par, seq)) in parallel.into_iter().zip(&sequential).enumerate() {
        let par = par.with_context(|| format!("[iter {i}] parallel lexing failed"))?;
        if &par != seq {
            bail!("[iter {i}] parallel and sequential token streams differ");
        }
    }

    eprintln!("[fuzz] all iterations matched ✅");
    Ok(())
}
