//! Selector chains and their evaluation.
//!
//! A selector chain filters and projects raw record values without knowing
//! their layout: each entry names a byte span by offset and size. The store
//! uses one engine for every database this way, whatever the value format.
//!
//! Offsets address the record **value**, never the key. Every span is
//! checked against the actual value length at evaluation time; a span that
//! does not fit makes the record a non-match.
//!
//! ```rust
//! use watchdb_core::selector::{evaluate, Projection, SelectorChain};
//!
//! let chain = SelectorChain::new()
//!     .filter(0, b"ab".to_vec())
//!     .project(2, 3);
//!
//! let outcome = evaluate(b"abcdef", &chain);
//! assert!(outcome.matches);
//! assert_eq!(outcome.projections, vec![Projection::Span(2..5)]);
//!
//! assert!(!evaluate(b"xxcdef", &chain).matches);
//! assert!(!evaluate(b"ab", &chain).matches);
//! ```

use std::ops::Range;

/// One entry of a selector chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Keep the record only if `value[offset..offset + operand.len()]`
    /// equals `operand` byte for byte.
    Filter {
        /// Start of the compared span within the value.
        offset: usize,
        /// Bytes the span must equal.
        operand: Vec<u8>,
    },
    /// Emit `value[offset..offset + size]` as a column aliasing the store.
    Project {
        /// Start of the projected span within the value.
        offset: usize,
        /// Length of the projected span.
        size: usize,
    },
    /// Emit an owned copy of the whole record (key and value) as a column.
    ProjectFull,
}

/// An ordered chain of selectors. The end of the chain is the end of the
/// vector; there is no terminator entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    /// Creates an empty chain, which matches every record and emits nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an equality filter.
    #[must_use]
    pub fn filter(mut self, offset: usize, operand: impl Into<Vec<u8>>) -> Self {
        self.selectors.push(Selector::Filter {
            offset,
            operand: operand.into(),
        });
        self
    }

    /// Appends a shallow projection of a value span.
    #[must_use]
    pub fn project(mut self, offset: usize, size: usize) -> Self {
        self.selectors.push(Selector::Project { offset, size });
        self
    }

    /// Appends a full, owned projection of the record.
    #[must_use]
    pub fn project_full(mut self) -> Self {
        self.selectors.push(Selector::ProjectFull);
        self
    }

    /// Appends an already built selector.
    pub fn push(&mut self, selector: Selector) {
        self.selectors.push(selector);
    }

    /// Returns the selectors in evaluation order.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Returns the number of selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Returns true if the chain has no selectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Returns true if any entry requests an owned copy of the record.
    #[must_use]
    pub fn loads_fully(&self) -> bool {
        self.selectors
            .iter()
            .any(|s| matches!(s, Selector::ProjectFull))
    }
}

impl FromIterator<Selector> for SelectorChain {
    fn from_iter<I: IntoIterator<Item = Selector>>(iter: I) -> Self {
        Self {
            selectors: iter.into_iter().collect(),
        }
    }
}

/// A column requested by a matching record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// A span of the value, already bounds-checked.
    Span(Range<usize>),
    /// The whole record.
    Full,
}

/// Result of evaluating a chain against one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalOutcome {
    /// Whether every filter passed and every span was in bounds.
    pub matches: bool,
    /// Columns in chain order. Always empty when `matches` is false.
    pub projections: Vec<Projection>,
}

impl EvalOutcome {
    fn rejected() -> Self {
        Self::default()
    }
}

/// Evaluates `chain` against a record value.
///
/// Entries run strictly in order. The first failing filter or out-of-bounds
/// span ends evaluation as a non-match, and projections gathered before it
/// are dropped.
#[must_use]
pub fn evaluate(value: &[u8], chain: &SelectorChain) -> EvalOutcome {
    let mut projections = Vec::new();

    for selector in &chain.selectors {
        match selector {
            Selector::Filter { offset, operand } => {
                let Some(span) = field(value, *offset, operand.len()) else {
                    return EvalOutcome::rejected();
                };
                if value[span] != operand[..] {
                    return EvalOutcome::rejected();
                }
            }
            Selector::Project { offset, size } => {
                let Some(span) = field(value, *offset, *size) else {
                    return EvalOutcome::rejected();
                };
                projections.push(Projection::Span(span));
            }
            Selector::ProjectFull => projections.push(Projection::Full),
        }
    }

    EvalOutcome {
        matches: true,
        projections,
    }
}

fn field(value: &[u8], offset: usize, size: usize) -> Option<Range<usize>> {
    let end = offset.checked_add(size)?;
    (end <= value.len()).then_some(offset..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_chain_matches_everything() {
        let outcome = evaluate(b"", &SelectorChain::new());
        assert!(outcome.matches);
        assert!(outcome.projections.is_empty());
    }

    #[test]
    fn filters_are_anded() {
        let chain = SelectorChain::new().filter(0, *b"a").filter(2, *b"c");
        assert!(evaluate(b"abc", &chain).matches);
        assert!(!evaluate(b"abx", &chain).matches);
        assert!(!evaluate(b"xbc", &chain).matches);
    }

    #[test]
    fn projections_do_not_reject() {
        let chain = SelectorChain::new().project(0, 2).project_full();
        let outcome = evaluate(b"abcd", &chain);
        assert!(outcome.matches);
        assert_eq!(
            outcome.projections,
            vec![Projection::Span(0..2), Projection::Full]
        );
    }

    #[test]
    fn projections_before_a_failing_filter_are_discarded() {
        let chain = SelectorChain::new()
            .project(0, 1)
            .project_full()
            .filter(1, *b"z");
        let outcome = evaluate(b"abc", &chain);
        assert!(!outcome.matches);
        assert!(outcome.projections.is_empty());
    }

    #[test]
    fn out_of_bounds_spans_fail_closed() {
        let value = [0u8; 16];
        assert!(!evaluate(&value, &SelectorChain::new().filter(10, [0u8; 7])).matches);
        assert!(!evaluate(&value, &SelectorChain::new().project(16, 1)).matches);
        assert!(!evaluate(&value, &SelectorChain::new().project(usize::MAX, 2)).matches);
        assert!(evaluate(&value, &SelectorChain::new().project(16, 0)).matches);
    }

    #[test]
    fn chain_reports_full_loads() {
        assert!(!SelectorChain::new().project(0, 1).loads_fully());
        assert!(SelectorChain::new().project_full().loads_fully());

        let chain: SelectorChain = vec![Selector::ProjectFull].into_iter().collect();
        assert_eq!(chain.len(), 1);
    }

    proptest! {
        #[test]
        fn evaluation_never_reads_out_of_bounds(
            value in prop::collection::vec(any::<u8>(), 0..64),
            offset in 0usize..96,
            size in 0usize..96,
        ) {
            let chain = SelectorChain::new()
                .filter(offset, vec![0u8; size])
                .project(offset, size);
            let outcome = evaluate(&value, &chain);
            if offset + size > value.len() {
                prop_assert!(!outcome.matches);
            }
            if !outcome.matches {
                prop_assert!(outcome.projections.is_empty());
            }
        }

        #[test]
        fn filter_on_own_bytes_matches(
            value in prop::collection::vec(any::<u8>(), 1..64),
            start in 0usize..64,
        ) {
            let start = start % value.len();
            let chain = SelectorChain::new().filter(start, value[start..].to_vec());
            prop_assert!(evaluate(&value, &chain).matches);
        }
    }
}
