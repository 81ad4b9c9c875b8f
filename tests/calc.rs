//! Drives hand-compiled grammars through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fallible_iterator::convert;

use lr_runtime::{
    CompiledSpec, Parser, ParserError, Reduced, SpecBuilder, Symbol, SymbolId,
};

/// `Expr -> Expr '+' Term | Term`, `Term -> num`, over `i64` values.
struct Calc {
    spec: CompiledSpec<i64>,
    num: SymbolId,
    plus: SymbolId,
    /// Total number of semantic handler invocations.
    reductions: Arc<AtomicUsize>,
}

fn calc() -> Calc {
    let reductions = Arc::new(AtomicUsize::new(0));
    let mut b = SpecBuilder::new();
    let eoi = b.end_of_input();
    let num = b.terminal("num");
    let plus = b.terminal("'+'");
    let expr = b.nonterminal("Expr", || 0);
    let term = b.nonterminal("Term", || 0);

    // Expr -> Expr '+' Term
    let counter = Arc::clone(&reductions);
    let sum = b.production(expr, &[expr, plus, term], move |_, rhs| {
        counter.fetch_add(1, Ordering::Relaxed);
        assert_eq!(rhs.len(), 3);
        Reduced::Replace(*rhs[0].value().unwrap() + *rhs[2].value().unwrap())
    });
    // Expr -> Term, mutating the placeholder instead of replacing it
    let counter = Arc::clone(&reductions);
    let promote = b.production(expr, &[term], move |value, rhs| {
        counter.fetch_add(1, Ordering::Relaxed);
        assert_eq!(rhs.len(), 1);
        *value = *rhs[0].value().unwrap();
        Reduced::UseDefault
    });
    // Term -> num
    let counter = Arc::clone(&reductions);
    let leaf = b.production(term, &[num], move |_, rhs| {
        counter.fetch_add(1, Ordering::Relaxed);
        assert_eq!(rhs.len(), 1);
        Reduced::Replace(*rhs[0].value().unwrap())
    });

    // SLR(1) tables for the grammar above, compiled by hand.
    b.shift(0, num, 3).goto(0, expr, 1).goto(0, term, 2);
    b.shift(1, plus, 4).shift(1, eoi, 5);
    b.reduce(2, plus, promote).reduce(2, eoi, promote);
    b.reduce(3, plus, leaf).reduce(3, eoi, leaf);
    b.shift(4, num, 3).goto(4, term, 6);
    b.reduce(6, plus, sum).reduce(6, eoi, sum);

    Calc {
        spec: b.build(expr),
        num,
        plus,
        reductions,
    }
}

/// `Opt -> <empty> | '!'`, with a recognizable placeholder value.
fn opt() -> (CompiledSpec<i64>, SymbolId) {
    let mut b = SpecBuilder::new();
    let eoi = b.end_of_input();
    let bang = b.terminal("'!'");
    let opt = b.nonterminal("Opt", || 42);

    let empty = b.production(opt, &[], |_, rhs| {
        assert!(rhs.is_empty());
        Reduced::UseDefault
    });
    let shrieked = b.production(opt, &[bang], |_, _| Reduced::Replace(1));

    b.reduce(0, eoi, empty).shift(0, bang, 2).goto(0, opt, 1);
    b.shift(1, eoi, 3);
    b.reduce(2, eoi, shrieked);

    (b.build(opt), bang)
}

#[test]
fn sums_a_valid_sentence() {
    let calc = calc();
    let mut parser = Parser::new(&calc.spec).unwrap();
    parser.token(Symbol::Terminal(calc.num, 3)).unwrap();
    parser.token(Symbol::Terminal(calc.plus, 0)).unwrap();
    parser.token(Symbol::Terminal(calc.num, 4)).unwrap();
    parser.eoi().unwrap();

    let start = parser.start().unwrap();
    assert_eq!(start.len(), 1);
    assert_eq!(
        calc.spec.descriptor_of(&start[0]),
        Some(calc.spec.start_symbol())
    );
    assert_eq!(start[0].value(), Some(&7));
}

#[test]
fn drives_a_fallible_token_source() {
    let calc = calc();
    let mut parser = Parser::new(&calc.spec).unwrap();
    let tokens = vec![
        Symbol::Terminal(calc.num, 3),
        Symbol::Terminal(calc.plus, 0),
        Symbol::Terminal(calc.num, 4),
        Symbol::Terminal(calc.plus, 0),
        Symbol::Terminal(calc.num, 5),
    ];
    let result = parser
        .parse(convert(tokens.into_iter().map(Ok::<_, ParserError>)))
        .unwrap();
    assert_eq!(result.into_value(), Some(12));
}

#[test]
fn one_handler_invocation_per_reduction() {
    let calc = calc();
    let mut parser = Parser::new(&calc.spec).unwrap();
    for token in [
        Symbol::Terminal(calc.num, 3),
        Symbol::Terminal(calc.plus, 0),
        Symbol::Terminal(calc.num, 4),
        Symbol::Terminal(calc.plus, 0),
        Symbol::Terminal(calc.num, 5),
    ] {
        parser.token(token).unwrap();
    }
    parser.eoi().unwrap();
    // 3 x Term->num, 1 x Expr->Term, 2 x Expr->Expr+Term
    assert_eq!(calc.reductions.load(Ordering::Relaxed), 6);
    assert_eq!(parser.into_start().unwrap()[0].value(), Some(&12));
}

#[test]
fn rejects_premature_end_of_input() {
    let calc = calc();
    let mut parser = Parser::new(&calc.spec).unwrap();
    parser.token(Symbol::Terminal(calc.num, 3)).unwrap();
    parser.token(Symbol::Terminal(calc.plus, 0)).unwrap();

    let err = parser.eoi().unwrap_err();
    let ParserError::UnexpectedToken { token } = err else {
        panic!("unexpected error type");
    };
    assert!(token.contains("EndOfInput"));
    assert_eq!(parser.start(), None);
}

#[test]
fn fails_at_the_first_invalid_token() {
    let calc = calc();

    // A leading '+' has no action in the initial state.
    let mut parser = Parser::new(&calc.spec).unwrap();
    assert!(matches!(
        parser.token(Symbol::Terminal(calc.plus, 0)),
        Err(ParserError::UnexpectedToken { .. })
    ));

    // 'num num' fails on the second token, not before, not after.
    let mut parser = Parser::new(&calc.spec).unwrap();
    parser.token(Symbol::Terminal(calc.num, 3)).unwrap();
    assert!(matches!(
        parser.token(Symbol::Terminal(calc.num, 4)),
        Err(ParserError::UnexpectedToken { .. })
    ));
}

#[test]
fn reset_restores_a_fresh_parser() {
    let calc = calc();
    let mut parser = Parser::new(&calc.spec).unwrap();

    // Mid-parse reset.
    parser.token(Symbol::Terminal(calc.num, 9)).unwrap();
    parser.reset();
    parser.token(Symbol::Terminal(calc.num, 3)).unwrap();
    parser.eoi().unwrap();
    assert_eq!(parser.start().unwrap()[0].value(), Some(&3));

    // Post-acceptance and post-error resets.
    parser.reset();
    assert_eq!(parser.start(), None);
    parser.token(Symbol::Terminal(calc.num, 1)).unwrap();
    assert!(parser.token(Symbol::Terminal(calc.num, 2)).is_err());
    parser.reset();
    parser.token(Symbol::Terminal(calc.num, 4)).unwrap();
    parser.token(Symbol::Terminal(calc.plus, 0)).unwrap();
    parser.token(Symbol::Terminal(calc.num, 5)).unwrap();
    parser.eoi().unwrap();
    assert_eq!(parser.start().unwrap()[0].value(), Some(&9));
}

#[test]
fn refuses_conflicted_specifications() {
    let mut b = SpecBuilder::<i64>::new();
    let num = b.terminal("num");
    let expr = b.nonterminal("Expr", || 0);
    let p = b.production(expr, &[num], |_, _| Reduced::UseDefault);
    b.shift(0, num, 1).reduce(0, num, p);
    let spec = b.build(expr);

    let Err(err) = Parser::new(&spec) else {
        panic!("conflicted specification was accepted");
    };
    assert_eq!(err, ParserError::Conflicts(1));
}

#[test]
fn rejects_symbols_from_a_foreign_registry() {
    let calc = calc();
    let mut foreign = SpecBuilder::<i64>::new();
    let mut last = foreign.end_of_input();
    for name in ["a", "b", "c", "d", "e", "f"] {
        last = foreign.terminal(name);
    }
    let mut parser = Parser::new(&calc.spec).unwrap();
    assert!(matches!(
        parser.token(Symbol::Terminal(last, 0)),
        Err(ParserError::UnknownSymbol { .. })
    ));
}

#[test]
fn empty_production_reduces_before_acceptance() {
    let (spec, _) = opt();
    let mut parser = Parser::new(&spec).unwrap();
    parser.eoi().unwrap();
    // The placeholder built for the zero-arity reduction is the result.
    assert_eq!(parser.start().unwrap()[0].value(), Some(&42));
}

#[test]
fn handler_replacement_overrides_the_placeholder() {
    let (spec, bang) = opt();
    let mut parser = Parser::new(&spec).unwrap();
    parser.token(Symbol::Terminal(bang, 0)).unwrap();
    parser.eoi().unwrap();
    assert_eq!(parser.start().unwrap()[0].value(), Some(&1));
}

#[test]
fn tracing_does_not_change_the_outcome() {
    let _ = env_logger::builder().is_test(true).try_init();
    let calc = calc();
    let mut parser = Parser::new(&calc.spec).unwrap();
    parser.set_verbose(true);
    assert!(parser.verbose());

    parser.token(Symbol::Terminal(calc.num, 3)).unwrap();
    parser.token(Symbol::Terminal(calc.plus, 0)).unwrap();
    parser.token(Symbol::Terminal(calc.num, 4)).unwrap();
    parser.eoi().unwrap();
    assert_eq!(parser.start().unwrap()[0].value(), Some(&7));
}
