// src/dev.rs
//! Random inputs for the bundled calculator grammar, shared by the fuzzer
//! binary and the tests.

use rand::Rng;

/// Random source of at least `target_len` bytes that lexes without errors:
/// comments and strings are always closed and a lone `/` is never followed
/// by `/` or `*`.
pub fn gen_valid_source<R: Rng>(rng: &mut R, target_len: usize) -> String {
    let mut out = String::with_capacity(target_len + target_len / 8);

    while out.len() < target_len {
        let roll = rng.random_range(0u32..100);

        match roll {
            0..=21 => push_ident(rng, &mut out),
            22..=33 => push_number(rng, &mut out),
            34..=48 => push_ws(rng, &mut out),
            49..=54 => push_line_comment(rng, &mut out),
            55..=61 => push_block_comment(rng, &mut out),
            62..=69 => push_string(rng, &mut out),
            70..=74 => push_keyword(rng, &mut out),
            75..=99 => push_operator(rng, &mut out),
            _ => unreachable!(),
        }
    }

    out.push('\n');
    out
}

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const WIDE_ALPHA: &[char] = &['λ', 'Ω', 'ж', 'Я', '中', '文', '𝑥', '𝔸'];

fn random_alpha<R: Rng>(rng: &mut R) -> char {
    if rng.random_bool(0.1) {
        WIDE_ALPHA[rng.random_range(0..WIDE_ALPHA.len())]
    } else {
        ALPHA[rng.random_range(0..ALPHA.len())] as char
    }
}

fn random_digit<R: Rng>(rng: &mut R) -> char {
    (b'0' + rng.random_range(0..10u8)) as char
}

fn push_ident<R: Rng>(rng: &mut R, out: &mut String) {
    let len = rng.random_range(1..=12);
    out.push(random_alpha(rng));
    for _ in 1..len {
        if rng.random_bool(0.6) {
            out.push(random_alpha(rng));
        } else {
            out.push(random_digit(rng));
        }
    }
}

fn push_number<R: Rng>(rng: &mut R, out: &mut String) {
    let len = rng.random_range(1..=8);
    for _ in 0..len {
        out.push(random_digit(rng));
    }
}

fn push_ws<R: Rng>(rng: &mut R, out: &mut String) {
    let opts: [char; 4] = [' ', '\t', '\r', '\n'];
    let len = rng.random_range(1..=8);
    for _ in 0..len {
        out.push(opts[rng.random_range(0..opts.len())]);
    }
}

fn push_line_comment<R: Rng>(rng: &mut R, out: &mut String) {
    out.push_str("//");
    const BODY: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789 +-*/()=;\"\\";
    let len = rng.random_range(0..=40);
    for _ in 0..len {
        out.push(BODY[rng.random_range(0..BODY.len())] as char);
    }
    out.push('\n');
}

fn push_block_comment<R: Rng>(rng: &mut R, out: &mut String) {
    out.push_str("/*");
    const BODY: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789 +-()=;\"\\";
    let chunks = rng.random_range(0..=15);
    for _ in 0..chunks {
        let k = rng.random_range(1..=8);
        for _ in 0..k {
            out.push(BODY[rng.random_range(0..BODY.len())] as char);
        }
        if rng.random_bool(0.2) {
            out.push('*');
        }
        if rng.random_bool(0.2) {
            out.push('\n');
        }
        if rng.random_bool(0.1) {
            out.push('ж');
        }
    }
    out.push_str("*/");
}

fn push_string<R: Rng>(rng: &mut R, out: &mut String) {
    out.push('"');
    const BODY: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789 +-*/()=;'\t";
    let len = rng.random_range(0..=20);
    for _ in 0..len {
        if rng.random_bool(0.1) {
            out.push('\\');
            out.push(['"', '\\', 'n', 't'][rng.random_range(0..4)]);
        } else if rng.random_bool(0.05) {
            out.push('中');
        } else {
            out.push(BODY[rng.random_range(0..BODY.len())] as char);
        }
    }
    out.push('"');
}

fn push_keyword<R: Rng>(rng: &mut R, out: &mut String) {
    let words = ["if", "else", "let"];
    out.push_str(words[rng.random_range(0..words.len())]);
    out.push(' ');
}

fn push_operator<R: Rng>(rng: &mut R, out: &mut String) {
    let ops = ["+", "++", "-", "*", "/", "=", "==", "(", ")", ";"];
    let op = ops[rng.random_range(0..ops.len())];
    out.push_str(op);
    if op == "/" || rng.random_bool(0.25) {
        out.push(' ');
    }
}
