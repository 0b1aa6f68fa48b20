use crate::domain::{AttributeValue, Schema};

/// Resolves attribute values to render markers via the configured tables.
///
/// An attribute/order combination with no configured marker is a rendering
/// validity failure for that attribute only; callers log it and continue
/// without the marker.
#[derive(Debug, Clone, Copy)]
pub struct MarkerTable<'a> {
    schema: &'a Schema,
}

impl<'a> MarkerTable<'a> {
    /// Creates a marker table over the schema's marker configuration.
    #[must_use]
    pub const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// The marker for an attribute value.
    ///
    /// # Errors
    ///
    /// Returns [`UnrenderableAttribute`] when the value is invalid, the
    /// attribute has no marker table, or the table has no entry at the
    /// value's order.
    pub fn marker_for(&self, attribute: &AttributeValue) -> Result<&'a str, UnrenderableAttribute> {
        let unrenderable = || UnrenderableAttribute {
            name: attribute.name().to_string(),
            value: attribute.raw().to_string(),
        };

        let order = attribute.order().ok_or_else(unrenderable)?;
        let markers = self
            .schema
            .markers_for(attribute.name())
            .ok_or_else(unrenderable)?;
        markers
            .get(order)
            .map(String::as_str)
            .ok_or_else(unrenderable)
    }
}

/// An attribute that cannot be rendered as a marker. Non-fatal.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no marker configured for attribute '{name}' with value '{value}'")]
pub struct UnrenderableAttribute {
    /// The attribute name.
    pub name: String,
    /// The raw attribute value.
    pub value: String,
}
