//! Domain models for requirements traceability.
//!
//! This module contains the core domain types: categorical attribute values
//! and their reconciliation rules, requirement entities and codes, the
//! requirement index with its chapter structure, and the configuration
//! schema the other types are validated against.

/// Categorical attribute values and reconciliation.
pub mod attribute;
pub use attribute::{AttributeValue, InvalidAttributeError, ParseMode};

mod category;
pub use category::{Category, UnknownCategoryError, PROGRESSION};

/// The requirement index and chapter structure.
pub mod index;
pub use index::{Chapter, RequirementIndex};

/// Requirement entities and codes.
pub mod requirement;
pub use requirement::{BuildError, Code, InvalidCodeError, Requirement};

/// Configuration: attribute schema and style tables.
pub mod schema;
pub use schema::{
    AttributeSpec, Config, ConfigError, ConfigurationError, Schema, StyleSheet, TopicStyle,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use super::{Category, Config, ParseMode, Requirement};

    /// Builds a requirement with the given code, category and links, plus
    /// any categorical attribute values supplied as `(name, raw)` pairs.
    pub fn requirement_with_attrs(
        config: &Config,
        code: &str,
        category: Category,
        links: &[&str],
        attrs: &[(&str, &str)],
    ) -> Requirement {
        let mut values: BTreeMap<String, String> = BTreeMap::new();
        values.insert("ID".to_string(), format!("id-{code}"));
        values.insert("CodeName".to_string(), code.to_string());
        values.insert("Requirement".to_string(), format!("{code} statement"));
        values.insert("Link".to_string(), links.join("\n"));
        for (name, raw) in attrs {
            values.insert((*name).to_string(), (*raw).to_string());
        }

        Requirement::from_row(&config.attributes, category, ParseMode::Lenient, &values)
            .expect("test requirement must build")
    }

    /// Builds a plain requirement with no categorical attributes.
    pub fn requirement(
        config: &Config,
        code: &str,
        category: Category,
        links: &[&str],
    ) -> Requirement {
        requirement_with_attrs(config, code, category, links, &[])
    }
}
