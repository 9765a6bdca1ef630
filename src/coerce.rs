//! The coercion pass: apply each mapping's datatype to the raw entries it
//! matches, and fill in defaults for absent keys.
//!
//! Mappings run in processing order (longest, most-literal keys first), so
//! a specific mapping claims an entry before an overlapping wildcard
//! mapping sees it. A claimed entry is never re-coerced. Complex mappings
//! match as prefixes and coerce their children to the binary shape — the
//! aggregation pass gives them structure later. Defaults apply only when
//! the key is absent, never when its value fails to parse.

use tracing::debug;

use crate::datatype::binary_shape;
use crate::error::ConftreeError;
use crate::schema::Schema;
use crate::table::{EntryValue, Table};

pub(crate) fn coerce(schema: &Schema, table: &mut Table) -> Result<(), ConftreeError> {
    for (index, mapping) in schema.processing_order() {
        if mapping.datatype().is_complex() {
            for entry in table.entries_mut() {
                if entry.claimed_by.is_none()
                    && entry.is_raw()
                    && mapping.key().match_prefix(&entry.key).is_some()
                {
                    if let EntryValue::Raw(raw) = &entry.value {
                        entry.value = EntryValue::Typed(binary_shape(raw));
                        entry.claimed_by = Some(index);
                    }
                }
            }
            continue;
        }

        for entry in table.entries_mut() {
            if entry.claimed_by.is_some() || !mapping.key().matches(&entry.key) {
                continue;
            }
            if let EntryValue::Raw(raw) = &entry.value {
                let setting = entry.key.to_string();
                let typed = mapping
                    .datatype()
                    .parse(raw, &setting, schema.customs())?;
                entry.value = EntryValue::Typed(typed);
                entry.claimed_by = Some(index);
            }
        }

        if mapping.key().is_concrete() && table.get(mapping.key()).is_none() {
            if let Some(default) = mapping.default() {
                debug!(key = %mapping.key(), "substituting default");
                table.insert_typed(mapping.key().clone(), default.clone(), index);
            }
        }
    }
    Ok(())
}
