//! Render a schema into an annotated default `.conf`.
//!
//! Each mapping becomes a block, in schema source order: its doc lines as
//! `#` comments, an allowed-values line for enums, any extra documentation
//! a custom type provides, and finally the setting itself — populated from
//! the default when there is one, commented out when there is not.

use crate::datatype::Datatype;
use crate::error::ConftreeError;
use crate::schema::Schema;

pub fn write_conf(schema: &Schema) -> Result<String, ConftreeError> {
    let mut out = String::new();
    for mapping in schema.mappings() {
        for line in mapping.doc() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
        match mapping.datatype() {
            Datatype::Enum(allowed) => {
                out.push_str("# Allowed values: ");
                out.push_str(&allowed.join(", "));
                out.push('\n');
            }
            Datatype::Custom { module, args } => {
                if let Some(handler) = schema.customs().get(module) {
                    if let Some(doc) = handler.to_doc(args) {
                        for line in doc.lines() {
                            out.push_str("# ");
                            out.push_str(line);
                            out.push('\n');
                        }
                    }
                }
            }
            _ => {}
        }
        match mapping.default() {
            Some(value) => {
                let formatted = mapping.datatype().format(value, schema.customs())?;
                out.push_str(&format!("{} = {}\n", mapping.key(), formatted));
            }
            None => {
                out.push_str(&format!("# {} =\n", mapping.key()));
            }
        }
        out.push('\n');
    }
    Ok(out)
}
