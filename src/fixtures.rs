#[cfg(test)]
pub mod test {
    use crate::datatype::Datatype;
    use crate::schema::{MappingDef, Schema, TranslationDef};
    use crate::value::TermValue;

    /// A representative schema exercising most mapping features: docs,
    /// defaults, enums, lists, a complex wildcard, and a translation.
    pub fn riak_schema() -> Schema {
        Schema::new(
            vec![
                MappingDef::new("node.name")
                    .default(TermValue::String("riak@127.0.0.1".into()))
                    .doc(&["Name of the node."]),
                MappingDef::new("ring.size")
                    .datatype(Datatype::Integer)
                    .default(TermValue::Int(64))
                    .doc(&["Number of partitions in the ring."]),
                MappingDef::new("storage.backend")
                    .datatype(Datatype::Enum(vec!["bitcask".into(), "leveldb".into()]))
                    .default(TermValue::Atom("bitcask".into()))
                    .doc(&["Storage engine for this node."]),
                MappingDef::new("cluster.members")
                    .datatype(Datatype::List(Box::new(Datatype::Ip)))
                    .doc(&["Peers to join on start-up."]),
                MappingDef::new("listener.http.*")
                    .to("http_listeners")
                    .datatype(Datatype::Complex)
                    .doc(&["HTTP endpoints, one per name."]),
                MappingDef::new("log.level")
                    .datatype(Datatype::Atom)
                    .default(TermValue::Atom("info".into()))
                    .doc(&["Log verbosity."]),
            ],
            vec![TranslationDef::two("log.level", |_m, (_leaf, value)| {
                let TermValue::Atom(level) = value else {
                    return Err("expected an atom".into());
                };
                match level.as_str() {
                    "debug" => Ok(TermValue::Int(7)),
                    "info" => Ok(TermValue::Int(6)),
                    "warning" => Ok(TermValue::Int(4)),
                    "error" => Ok(TermValue::Int(3)),
                    other => Err(format!("unknown level '{other}'")),
                }
            })],
        )
        .unwrap()
    }

    #[test]
    fn riak_schema_builds() {
        let schema = riak_schema();
        assert_eq!(schema.mappings().len(), 6);
        assert_eq!(schema.translations().len(), 1);
        assert!(schema.doc_for("ring.size").is_some());
    }
}
