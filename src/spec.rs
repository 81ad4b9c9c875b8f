//! Compiled grammar specification: symbol registry, productions, action
//! and goto tables.
//!
//! A [`CompiledSpec`] is immutable once built and is consumed read-only by
//! the parser, so one specification can back any number of concurrently
//! running parser instances. [`SpecBuilder`] only *records* tables that
//! were compiled elsewhere (by an external generator, or by hand in
//! tests); it performs no automaton construction and no conflict
//! resolution — it merely counts conflicts so the deterministic engine can
//! refuse the specification.

use indexmap::IndexMap;

use crate::symbol::{Symbol, SymbolId};

/// Automaton state number, assigned by the table generator.
/// The initial state is always 0.
pub type State = usize;

/// One entry in the action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Consume the incoming symbol and move to this state.
    Shift(State),
    /// Rewrite the top of the stack per the production at this index.
    Reduce(usize),
}

/// Outcome of a semantic handler.
pub enum Reduced<V> {
    /// Use this value for the new nonterminal.
    Replace(V),
    /// Keep the placeholder the handler was given, including any
    /// mutations the handler made to it.
    UseDefault,
}

// `Send + Sync` so one specification can back parser instances running on
// several threads at once.
type Handler<V> = Box<dyn Fn(&mut V, &[Symbol<V>]) -> Reduced<V> + Send + Sync>;
type Placeholder<V> = Box<dyn Fn() -> V + Send + Sync>;

/// A grammar rule together with its semantic handler.
///
/// The handler is invoked on reduction with a freshly constructed
/// placeholder value for the left-hand side and the popped right-hand
/// side symbols in original left-to-right order.
pub struct Production<V> {
    pub(crate) lhs: SymbolId,
    pub(crate) rhs: Vec<SymbolId>,
    pub(crate) handler: Handler<V>,
}

impl<V> Production<V> {
    /// Left-hand side nonterminal.
    pub fn lhs(&self) -> SymbolId {
        self.lhs
    }

    /// Right-hand side descriptors; may be empty.
    pub fn rhs(&self) -> &[SymbolId] {
        self.rhs.as_slice()
    }
}

enum SymbolKind<V> {
    Terminal,
    Nonterminal(Placeholder<V>),
}

struct SymbolInfo<V> {
    name: String,
    kind: SymbolKind<V>,
}

/// A precompiled grammar: registry, productions and the two tables.
pub struct CompiledSpec<V> {
    symbols: Vec<SymbolInfo<V>>,
    names: IndexMap<String, SymbolId>,
    productions: Vec<Production<V>>,
    /// state -> descriptor -> action set
    actions: Vec<IndexMap<SymbolId, Vec<Action>>>,
    /// state -> nonterminal descriptor -> next state
    gotos: Vec<IndexMap<SymbolId, State>>,
    start: SymbolId,
    conflicts: usize,
}

impl<V> CompiledSpec<V> {
    /// Descriptor of a runtime symbol instance.
    ///
    /// Total over symbols built from this specification's registry;
    /// `None` means the symbol belongs to some other registry (or is the
    /// bottom sentinel), which is a configuration error rather than a
    /// parse error.
    pub fn descriptor_of(&self, sym: &Symbol<V>) -> Option<SymbolId> {
        match sym {
            Symbol::Bottom => None,
            Symbol::EndOfInput => Some(SymbolId::EOI),
            Symbol::Terminal(id, _) => match self.info(*id)?.kind {
                SymbolKind::Terminal => Some(*id),
                SymbolKind::Nonterminal(_) => None,
            },
            Symbol::Nonterminal(id, _) => match self.info(*id)?.kind {
                SymbolKind::Nonterminal(_) => Some(*id),
                SymbolKind::Terminal => None,
            },
        }
    }

    /// Legal actions for `(state, descriptor)`; `None` or an empty set
    /// means "no legal transition".
    pub fn actions(&self, state: State, on: SymbolId) -> Option<&[Action]> {
        self.actions
            .get(state)?
            .get(&on)
            .map(Vec::as_slice)
            .filter(|a| !a.is_empty())
    }

    /// State reached after reducing to nonterminal `on` from `state`.
    ///
    /// Defined for every `(state, nonterminal)` pair a reduction can
    /// actually reach in a correctly compiled specification.
    pub fn goto(&self, state: State, on: SymbolId) -> Option<State> {
        self.gotos.get(state)?.get(&on).copied()
    }

    /// The production at `index`.
    ///
    /// Panics when `index` is out of range; action tables only ever refer
    /// to productions registered with the same builder.
    pub fn production(&self, index: usize) -> &Production<V> {
        &self.productions[index]
    }

    /// Descriptor of the designated start nonterminal, used only to
    /// validate the accepted symbol.
    pub fn start_symbol(&self) -> SymbolId {
        self.start
    }

    /// Number of unresolved (state, descriptor) conflicts recorded while
    /// the tables were assembled. Must be 0 for the deterministic engine.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// Registered name of a descriptor, for diagnostics.
    pub fn name(&self, id: SymbolId) -> &str {
        self.info(id).map_or("<unregistered>", |s| s.name.as_str())
    }

    /// Look a symbol kind up by its registered name.
    pub fn symbol_named(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    /// Construct the placeholder value for a nonterminal about to be
    /// built by a reduction.
    pub(crate) fn placeholder(&self, lhs: SymbolId) -> V {
        match self.info(lhs).map(|s| &s.kind) {
            Some(SymbolKind::Nonterminal(ctor)) => ctor(),
            _ => panic!("{} is not a registered nonterminal", self.name(lhs)),
        }
    }

    fn info(&self, id: SymbolId) -> Option<&SymbolInfo<V>> {
        self.symbols.get(id.index())
    }
}

/// Assembles a [`CompiledSpec`] from already-compiled data.
///
/// Symbol registration assigns ids; `shift`/`reduce`/`goto` record table
/// entries, growing the state-indexed tables on demand. Registering a
/// second distinct action for the same `(state, descriptor)` pair records
/// a conflict instead of resolving it.
pub struct SpecBuilder<V> {
    symbols: Vec<SymbolInfo<V>>,
    names: IndexMap<String, SymbolId>,
    productions: Vec<Production<V>>,
    actions: Vec<IndexMap<SymbolId, Vec<Action>>>,
    gotos: Vec<IndexMap<SymbolId, State>>,
    conflicts: usize,
}

impl<V> Default for SpecBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SpecBuilder<V> {
    /// An empty builder with only the end-of-input terminal registered.
    pub fn new() -> Self {
        let mut builder = SpecBuilder {
            symbols: Vec::new(),
            names: IndexMap::new(),
            productions: Vec::new(),
            actions: Vec::new(),
            gotos: Vec::new(),
            conflicts: 0,
        };
        let eoi = builder.register("<$>", SymbolKind::Terminal);
        assert_eq!(eoi, SymbolId::EOI);
        builder
    }

    /// Descriptor of the reserved end-of-input terminal `<$>`, for
    /// action entries on the accepting lookahead.
    pub fn end_of_input(&self) -> SymbolId {
        SymbolId::EOI
    }

    /// Register a terminal kind. Panics on a duplicate name.
    pub fn terminal(&mut self, name: &str) -> SymbolId {
        self.register(name, SymbolKind::Terminal)
    }

    /// Register a nonterminal kind with the constructor used for the
    /// reduction placeholder. Panics on a duplicate name.
    pub fn nonterminal(
        &mut self,
        name: &str,
        placeholder: impl Fn() -> V + Send + Sync + 'static,
    ) -> SymbolId {
        self.register(name, SymbolKind::Nonterminal(Box::new(placeholder)))
    }

    /// Record a production and return its index for `reduce` entries.
    pub fn production(
        &mut self,
        lhs: SymbolId,
        rhs: &[SymbolId],
        handler: impl Fn(&mut V, &[Symbol<V>]) -> Reduced<V> + Send + Sync + 'static,
    ) -> usize {
        self.productions.push(Production {
            lhs,
            rhs: rhs.to_vec(),
            handler: Box::new(handler),
        });
        self.productions.len() - 1
    }

    /// Record `Shift(to)` for `(state, on)`.
    pub fn shift(&mut self, state: State, on: SymbolId, to: State) -> &mut Self {
        self.action(state, on, Action::Shift(to))
    }

    /// Record `Reduce(production)` for `(state, on)`.
    pub fn reduce(&mut self, state: State, on: SymbolId, production: usize) -> &mut Self {
        assert!(
            production < self.productions.len(),
            "reduce entry refers to unregistered production {production}"
        );
        self.action(state, on, Action::Reduce(production))
    }

    /// Record the goto transition for `(state, on)`.
    pub fn goto(&mut self, state: State, on: SymbolId, to: State) -> &mut Self {
        if self.gotos.len() <= state {
            self.gotos.resize_with(state + 1, IndexMap::new);
        }
        let prev = self.gotos[state].insert(on, to);
        assert!(
            prev.map_or(true, |p| p == to),
            "contradictory goto entries for state {state}"
        );
        self
    }

    /// Freeze the tables. `start` is the designated start nonterminal.
    pub fn build(self, start: SymbolId) -> CompiledSpec<V> {
        CompiledSpec {
            symbols: self.symbols,
            names: self.names,
            productions: self.productions,
            actions: self.actions,
            gotos: self.gotos,
            start,
            conflicts: self.conflicts,
        }
    }

    fn register(&mut self, name: &str, kind: SymbolKind<V>) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).expect("registry overflow"));
        let prev = self.names.insert(name.to_owned(), id);
        assert!(prev.is_none(), "duplicate symbol name {name:?}");
        self.symbols.push(SymbolInfo {
            name: name.to_owned(),
            kind,
        });
        id
    }

    fn action(&mut self, state: State, on: SymbolId, action: Action) -> &mut Self {
        if self.actions.len() <= state {
            self.actions.resize_with(state + 1, IndexMap::new);
        }
        let set = self.actions[state].entry(on).or_default();
        if set.contains(&action) {
            return self;
        }
        if !set.is_empty() {
            // Left for a generalized engine to explore; the deterministic
            // one refuses specifications with a nonzero count.
            self.conflicts += 1;
        }
        set.push(action);
        self
    }
}
