// src/main.rs
use nfalex::lexer::{Lexer, StrCharStream, tables::calc_tables};

fn main() {
    // A tiny sample covering identifiers, numbers, strings, comments and symbols.
    let src = r#"
        let x = 12 + bar/* cmt */(7) // hello
        if x == 3 ( "multi\"part" ) else ( λ中 ++ 𝑥 ); # oops
    "#;

    let tables = calc_tables();
    let mut lexer = Lexer::new(tables, StrCharStream::new(src));
    println!("TOKENS:");
    loop {
        match lexer.get_next_token() {
            Ok(tok) => {
                for sp in tok.specials() {
                    println!("    (special) {} {:?}", tables.kind_name(sp.kind), sp.image);
                }
                println!("{}  {:?}  {:?}", tables.kind_name(tok.kind), tok.image, tok.span);
                if tok.is_eof() {
                    break;
                }
            }
            Err(e) => {
                eprintln!("lex error: {e}");
                if lexer.resync().is_none() {
                    break;
                }
            }
        }
    }
}
