//! Terminal and nonterminal instances, and the two stack sentinels.

use std::fmt;

/// Grammar-level identity of a symbol kind, used as the key into the
/// action and goto tables.
///
/// Ids are assigned densely by the specification registry; every
/// registered terminal or nonterminal kind maps to exactly one id.
/// Symbols cache their id at construction so the decision loop never
/// goes back to the registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    /// Reserved id of the end-of-input terminal `<$>`.
    pub(crate) const EOI: SymbolId = SymbolId(0);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value occupying one parse stack slot, generic over the semantic
/// value type `V` carried by tokens and built by reductions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol<V> {
    /// Bottom-of-stack marker; only ever present at slot 0.
    Bottom,
    /// End-of-input terminal, synthesized by [`Parser::eoi`].
    ///
    /// [`Parser::eoi`]: crate::Parser::eoi
    EndOfInput,
    /// A classified input token with its lexical payload.
    Terminal(SymbolId, V),
    /// Produced only by a reduction; carries the handler-assembled value.
    Nonterminal(SymbolId, V),
}

impl<V> Symbol<V> {
    /// Descriptor of this symbol; `None` for the bottom sentinel, which
    /// never takes part in a table lookup.
    pub fn id(&self) -> Option<SymbolId> {
        match self {
            Symbol::Bottom => None,
            Symbol::EndOfInput => Some(SymbolId::EOI),
            Symbol::Terminal(id, _) | Symbol::Nonterminal(id, _) => Some(*id),
        }
    }

    /// Semantic value, if this symbol carries one.
    pub fn value(&self) -> Option<&V> {
        match self {
            Symbol::Terminal(_, v) | Symbol::Nonterminal(_, v) => Some(v),
            _ => None,
        }
    }

    /// Consume the symbol and take its semantic value.
    pub fn into_value(self) -> Option<V> {
        match self {
            Symbol::Terminal(_, v) | Symbol::Nonterminal(_, v) => Some(v),
            _ => None,
        }
    }
}
