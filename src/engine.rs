//! The translation pipeline: parse, coerce, aggregate, translate, build,
//! merge.
//!
//! Operates on in-memory inputs only — text in, term tree out — so the
//! full pipeline is testable with synthetic data and no I/O. The working
//! table is created here and dropped on every exit path, including errors;
//! the caller's baseline is never mutated.

use tracing::debug;

use crate::aggregate;
use crate::coerce;
use crate::error::ConftreeError;
use crate::merge;
use crate::parse;
use crate::schema::Schema;
use crate::table::Table;
use crate::translate as translation_pass;
use crate::value::TermTree;

/// Translate `.conf` text into a nested term tree layered over `baseline`.
///
/// 1. Parse the text into ordered key/value pairs
/// 2. Coerce each pair through its schema mapping, filling defaults
/// 3. Aggregate wildcard matches and rewrite keys to their `to` paths
/// 4. Apply user translations in declaration order
/// 5. Build the nested tree and deep-merge it over the baseline
pub fn translate(
    schema: &Schema,
    conf: &str,
    baseline: &TermTree,
) -> Result<TermTree, ConftreeError> {
    let pairs = parse::parse(conf)?;
    debug!(settings = pairs.len(), "parsed .conf input");

    let mut table = Table::from_pairs(pairs);
    coerce::coerce(schema, &mut table)?;
    aggregate::aggregate(schema, &mut table)?;
    translation_pass::apply_translations(schema, &mut table)?;
    debug!(entries = table.len(), "pipeline complete; building tree");

    let built = merge::build_tree(table);
    Ok(merge::deep_merge(baseline.clone(), built))
}
