//! Serializable schema document.
//!
//! Class definitions normally come from the replay's data tables, which this
//! workspace does not parse. A `SchemaDoc` is the pre-flattened form loaded
//! from JSON (or any serde format) instead.

use serde::{Deserialize, Serialize};

use crate::error::SchemaResult;
use crate::registry::{ClassRegistry, TableSpec};
use crate::prop::PropSpec;

/// A server class entry in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDoc {
    pub name: String,
    pub table: String,
}

/// Pre-flattened schema: classes in id order plus their tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaDoc {
    pub classes: Vec<ClassDoc>,
    pub tables: Vec<TableSpec>,
}

impl ClassRegistry {
    /// Builds a registry from a schema document.
    pub fn from_doc(doc: &SchemaDoc) -> SchemaResult<Self> {
        let mut builder = Self::builder();
        for class in &doc.classes {
            builder = builder.class(class.name.clone(), class.table.clone());
        }
        for table in &doc.tables {
            builder = builder.table(table.clone());
        }
        builder.build()
    }

    /// Converts the registry back into a schema document.
    #[must_use]
    pub fn to_doc(&self) -> SchemaDoc {
        SchemaDoc {
            classes: self
                .classes()
                .map(|class| ClassDoc {
                    name: class.name.clone(),
                    table: class.table_name.clone(),
                })
                .collect(),
            tables: self
                .tables()
                .map(|table| TableSpec {
                    name: table.name.clone(),
                    props: table
                        .props()
                        .iter()
                        .map(|prop| PropSpec {
                            owner: (prop.owner_table != table.name)
                                .then(|| prop.owner_table.clone()),
                            name: prop.name.clone(),
                            kind: prop.kind,
                            flags: prop.flags,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema_hash, ClassKind, FloatSpec, PropKind};

    #[test]
    fn doc_to_registry_preserves_layout() {
        let registry = ClassRegistry::builder()
            .class("CWorld", "DT_WORLD")
            .class("CTFPlayer", "DT_TFPlayer")
            .table(TableSpec::new("DT_WORLD").prop(PropSpec::new(
                "m_WorldMins",
                PropKind::Vector(FloatSpec::coord()),
            )))
            .table(
                TableSpec::new("DT_TFPlayer")
                    .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(10, true)))
                    .prop(PropSpec::new("m_szName", PropKind::String).flags(2)),
            )
            .build()
            .unwrap();

        let rebuilt = ClassRegistry::from_doc(&registry.to_doc()).unwrap();
        assert_eq!(schema_hash(&registry), schema_hash(&rebuilt));
        assert_eq!(rebuilt.class_by_name("CTFPlayer").unwrap().kind, ClassKind::Player);
    }

    #[test]
    fn doc_rejects_invalid_schema() {
        let doc = SchemaDoc {
            classes: vec![ClassDoc {
                name: "CWorld".to_string(),
                table: "DT_Missing".to_string(),
            }],
            tables: Vec::new(),
        };
        assert!(ClassRegistry::from_doc(&doc).is_err());
    }
}
