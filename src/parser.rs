//! The LR stack automaton: shift/reduce decision loop, reduction engine
//! and the token-by-token feeding protocol.

use std::error;
use std::fmt;

use fallible_iterator::FallibleIterator;
use log::debug;

use crate::spec::{Action, CompiledSpec, Reduced, State};
use crate::symbol::{Symbol, SymbolId};

static TARGET: &str = "lr";

/// The parse stack: `(symbol, state)` pairs with the bottom sentinel at
/// slot 0. The state of the top pair is the automaton's current state.
///
/// A free-standing alias so the single-step functions below can be driven
/// per stack by a generalized multi-stack engine.
pub type Stack<V> = Vec<(Symbol<V>, State)>;

/// Grammar runtime errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The current state has no action for the incoming symbol. The only
    /// parse-time error; the parser must be reset before reuse.
    UnexpectedToken {
        /// Rendering of the offending symbol.
        token: String,
    },
    /// The specification reports unresolved conflicts and cannot be run
    /// deterministically.
    Conflicts(usize),
    /// The symbol was not built from this specification's registry; a
    /// configuration error, not a parse error.
    UnknownSymbol {
        /// Rendering of the foreign symbol.
        token: String,
    },
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { token } => write!(f, "unexpected token: {token}"),
            Self::Conflicts(n) => {
                write!(f, "specification has {n} unresolved conflict(s)")
            }
            Self::UnknownSymbol { token } => {
                write!(f, "symbol not registered by this specification: {token}")
            }
        }
    }
}

impl error::Error for ParserError {}

/// Deterministic LR parser.
///
/// Interprets the tables of a shared, read-only [`CompiledSpec`]. Input
/// is fed symbol by symbol via [`Parser::token`] and terminated via
/// [`Parser::eoi`]; [`Parser::start`] then holds the derivation result.
pub struct Parser<'s, V> {
    spec: &'s CompiledSpec<V>,
    stack: Stack<V>,
    start: Option<Vec<Symbol<V>>>,
    verbose: bool,
}

impl<'s, V: fmt::Debug> Parser<'s, V> {
    /// Build a parser over `spec`.
    ///
    /// Refuses a specification with unresolved conflicts; running those
    /// takes a generalized (multi-stack) engine.
    pub fn new(spec: &'s CompiledSpec<V>) -> Result<Self, ParserError> {
        if spec.conflicts() != 0 {
            return Err(ParserError::Conflicts(spec.conflicts()));
        }
        Ok(Parser {
            spec,
            stack: vec![(Symbol::Bottom, 0)],
            start: None,
            verbose: false,
        })
    }

    /// The specification this parser runs.
    pub fn spec(&self) -> &'s CompiledSpec<V> {
        self.spec
    }

    /// Parse results, populated only after a successful [`Parser::eoi`].
    ///
    /// Always a single element here; kept as a slice for symmetry with a
    /// generalized variant that can accept several derivations.
    pub fn start(&self) -> Option<&[Symbol<V>]> {
        self.start.as_deref()
    }

    /// Consume the parser and hand the results out by value.
    pub fn into_start(self) -> Option<Vec<Symbol<V>>> {
        self.start
    }

    /// Whether stack and action tracing is enabled.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Toggle stack and action tracing (`debug!` events under the `lr`
    /// target). Purely observational; off by default.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Drop any prior result and return to the initial state, behaving as
    /// a freshly constructed instance. Required after an error.
    pub fn reset(&mut self) {
        self.start = None;
        self.stack.clear();
        self.stack.push((Symbol::Bottom, 0));
    }

    /// Feed one classified terminal to the parser.
    ///
    /// Runs reductions until `token` can be shifted. On
    /// [`ParserError::UnexpectedToken`] the stack is left as it was at
    /// the failure point; call [`Parser::reset`] before reusing the
    /// instance.
    pub fn token(&mut self, token: Symbol<V>) -> Result<(), ParserError> {
        let Some(id) = self.spec.descriptor_of(&token) else {
            return Err(ParserError::UnknownSymbol {
                token: format!("{token:?}"),
            });
        };
        act(self.spec, &mut self.stack, token, id, self.verbose)
    }

    /// Signal end-of-input to the parser.
    ///
    /// Feeds the synthesized end-of-input terminal through the same path
    /// as [`Parser::token`]; once it has been shifted, the accepted start
    /// symbol becomes available via [`Parser::start`].
    pub fn eoi(&mut self) -> Result<(), ParserError> {
        self.token(Symbol::EndOfInput)?;

        // The decision loop returns only once the fed symbol was shifted.
        let (top, _) = self.stack.pop().expect("parse stack is never empty");
        assert!(
            matches!(top, Symbol::EndOfInput),
            "end-of-input sentinel not on top of the stack after acceptance"
        );
        if self.verbose {
            trace_stack(&self.stack);
            debug!(target: TARGET, "   --> accept");
        }
        #[cfg(feature = "extra_checks")]
        assert_eq!(
            self.stack.len(),
            2,
            "accepted stack must hold exactly the bottom sentinel and the start symbol"
        );

        let (accepted, _) = self.stack.pop().expect("parse stack is never empty");
        assert_eq!(
            self.spec.descriptor_of(&accepted),
            Some(self.spec.start_symbol()),
            "accepted symbol is not the designated start symbol"
        );
        self.start = Some(vec![accepted]);
        Ok(())
    }

    /// Drive a whole parse from a fallible token source: feed every
    /// symbol, signal end-of-input, and hand back the accepted start
    /// symbol by value.
    pub fn parse<I>(&mut self, mut tokens: I) -> Result<Symbol<V>, I::Error>
    where
        I: FallibleIterator<Item = Symbol<V>>,
        I::Error: From<ParserError>,
    {
        self.reset();
        while let Some(token) = tokens.next()? {
            self.token(token)?;
        }
        self.eoi()?;
        let mut start = self.start.take().expect("eoi populates the result");
        Ok(start.pop().expect("deterministic parse yields one result"))
    }
}

/// Run the decision loop for one incoming symbol over `stack`: zero or
/// more reductions, then the single shift that consumes `sym`.
///
/// Exactly one action per `(state, descriptor)` entry is expected here;
/// multi-action entries are the extension point for a generalized engine
/// forking one stack per action, and trip an assertion in this one.
pub fn act<V: fmt::Debug>(
    spec: &CompiledSpec<V>,
    stack: &mut Stack<V>,
    sym: Symbol<V>,
    id: SymbolId,
    verbose: bool,
) -> Result<(), ParserError> {
    if verbose {
        trace_stack(stack);
        debug!(target: TARGET, "INPUT: {sym:?}");
    }

    loop {
        let state = stack.last().expect("parse stack is never empty").1;
        let Some(actions) = spec.actions(state, id) else {
            return Err(ParserError::UnexpectedToken {
                token: format!("{sym:?}"),
            });
        };
        assert_eq!(
            actions.len(),
            1,
            "ambiguous actions in state {state} on {}",
            spec.name(id)
        );
        let action = actions[0];
        if verbose {
            debug!(target: TARGET, "   --> {action:?}");
        }
        match action {
            Action::Shift(next) => {
                stack.push((sym, next));
                return Ok(());
            }
            Action::Reduce(production) => {
                reduce(spec, stack, production);
                if verbose {
                    trace_stack(stack);
                }
            }
        }
    }
}

/// Apply one production to `stack`: pop its right-hand side, build the
/// left-hand side symbol, and push it with the goto state.
///
/// An empty right-hand side pops nothing. A missing goto entry means the
/// specification is malformed and panics rather than being reported as a
/// parse error.
pub fn reduce<V>(spec: &CompiledSpec<V>, stack: &mut Stack<V>, index: usize) {
    let production = spec.production(index);
    let arity = production.rhs().len();
    assert!(
        stack.len() > arity,
        "stack too short to reduce production {index}"
    );
    let rhs: Vec<Symbol<V>> = stack.drain(stack.len() - arity..).map(|(sym, _)| sym).collect();
    let result = apply_production(spec, index, rhs);

    let state = stack.last().expect("parse stack is never empty").1;
    let next = spec.goto(state, production.lhs()).unwrap_or_else(|| {
        panic!(
            "no goto from state {state} on {}; malformed specification",
            spec.name(production.lhs())
        )
    });
    stack.push((result, next));
}

/// Build the nonterminal for the production at `index` from its popped
/// right-hand side symbols.
///
/// Constructs the placeholder registered for the left-hand side, invokes
/// the semantic handler with it and `rhs` in original order, and keeps
/// the placeholder unless the handler replaces it.
pub fn apply_production<V>(
    spec: &CompiledSpec<V>,
    index: usize,
    rhs: Vec<Symbol<V>>,
) -> Symbol<V> {
    let production = spec.production(index);
    #[cfg(feature = "extra_checks")]
    assert_eq!(rhs.len(), production.rhs().len());

    let mut value = spec.placeholder(production.lhs());
    let value = match (production.handler)(&mut value, &rhs) {
        Reduced::Replace(replacement) => replacement,
        Reduced::UseDefault => value,
    };
    Symbol::Nonterminal(production.lhs(), value)
}

/// Render the stack as two aligned rows, symbols above states.
fn trace_stack<V: fmt::Debug>(stack: &Stack<V>) {
    if !log::log_enabled!(target: TARGET, log::Level::Debug) {
        return;
    }
    let mut symbols = String::new();
    let mut states = String::new();
    for (sym, state) in stack {
        let sym = format!("{sym:?} ");
        let state = format!("{state} ");
        let width = sym.len().max(state.len());
        symbols.push_str(&sym);
        states.push_str(&state);
        symbols.push_str(&" ".repeat(width - sym.len()));
        states.push_str(&" ".repeat(width - state.len()));
    }
    debug!(target: TARGET, "STACK: {symbols}");
    debug!(target: TARGET, "       {states}");
}
