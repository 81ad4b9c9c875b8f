//! Sums a '+'-separated list of integers with a hand-compiled grammar.
//!
//! Run with `RUST_LOG=lr=debug` to see the stack trace:
//! `cargo run --example calc -- 3 + 4 + 5`

use std::env;

use lr_runtime::{Parser, Reduced, SpecBuilder, Symbol};

fn main() {
    env_logger::init();

    let mut b = SpecBuilder::new();
    let eoi = b.end_of_input();
    let num = b.terminal("num");
    let plus = b.terminal("'+'");
    let expr = b.nonterminal("Expr", || 0i64);
    let term = b.nonterminal("Term", || 0i64);

    let sum = b.production(expr, &[expr, plus, term], |_, rhs| {
        Reduced::Replace(*rhs[0].value().unwrap() + *rhs[2].value().unwrap())
    });
    let promote = b.production(expr, &[term], |value, rhs| {
        *value = *rhs[0].value().unwrap();
        Reduced::UseDefault
    });
    let leaf = b.production(term, &[num], |_, rhs| {
        Reduced::Replace(*rhs[0].value().unwrap())
    });

    b.shift(0, num, 3).goto(0, expr, 1).goto(0, term, 2);
    b.shift(1, plus, 4).shift(1, eoi, 5);
    b.reduce(2, plus, promote).reduce(2, eoi, promote);
    b.reduce(3, plus, leaf).reduce(3, eoi, leaf);
    b.shift(4, num, 3).goto(4, term, 6);
    b.reduce(6, plus, sum).reduce(6, eoi, sum);
    let spec = b.build(expr);

    let mut parser = Parser::new(&spec).expect("deterministic tables");
    parser.set_verbose(true);

    for arg in env::args().skip(1) {
        let token = if arg == "+" {
            Symbol::Terminal(plus, 0)
        } else {
            match arg.parse() {
                Ok(n) => Symbol::Terminal(num, n),
                Err(err) => {
                    eprintln!("Err: {err} in {arg}");
                    return;
                }
            }
        };
        if let Err(err) = parser.token(token) {
            eprintln!("Err: {err}");
            return;
        }
    }
    match parser.eoi() {
        Ok(()) => {
            let start = parser.start().expect("accepted parse has a result");
            println!("{}", start[0].value().expect("start symbol carries a value"));
        }
        Err(err) => eprintln!("Err: {err}"),
    }
}
