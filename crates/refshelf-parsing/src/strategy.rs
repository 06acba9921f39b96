//! Ordered fallback tables.
//!
//! Both the section locator and the segmenter are a list of heuristics tried
//! in order until one succeeds. Keeping them as `(kind, fn)` tables means each
//! heuristic is an ordinary function that can be tested on its own, and the
//! order is visible in one place.

use std::fmt::Debug;

/// Run `table` in order and return the first successful output, tagged with
/// the strategy that produced it.
pub fn first_success<K, I, C, O>(
    table: &[(K, fn(&I, &C) -> Option<O>)],
    input: &I,
    ctx: &C,
) -> Option<(K, O)>
where
    K: Copy + Debug,
    I: ?Sized,
{
    table.iter().find_map(|(kind, run)| {
        let out = run(input, ctx)?;
        tracing::trace!(strategy = ?kind, "strategy succeeded");
        Some((*kind, out))
    })
}
