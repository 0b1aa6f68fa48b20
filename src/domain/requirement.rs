use std::{borrow::Borrow, collections::BTreeMap, fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

use crate::domain::{
    attribute::{AttributeValue, InvalidAttributeError, ParseMode},
    schema::{ConfigurationError, Schema, ESSENTIAL_ATTRIBUTES},
    Category,
};

/// A validated requirement code: the unique, human-facing traceability key.
///
/// Codes are the graph key: links between requirements are expressed as code
/// strings, never as direct references, and are resolved against the index at
/// traversal time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Code(NonEmptyString);

impl Code {
    /// Creates a code from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCodeError`] if the string is empty.
    pub fn new(s: String) -> Result<Self, InvalidCodeError> {
        let non_empty = NonEmptyString::new(s).map_err(|_| InvalidCodeError)?;
        Ok(Self(non_empty))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Borrow<str> for Code {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Code {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Code {
    type Err = InvalidCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a requirement code is empty.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("requirement code must not be empty")]
pub struct InvalidCodeError;

/// A single traceable requirement.
///
/// Aggregates the mandatory free-text fields from one source row and one
/// [`AttributeValue`] per categorical schema attribute present in that row.
/// Immutable after construction; owned by the index for the lifetime of the
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    id: String,
    code: Code,
    text: String,
    full_text: String,
    links: Vec<String>,
    category: Category,
    attributes: Vec<AttributeValue>,
}

impl Requirement {
    /// Builds a requirement from the attribute-name → raw-value mapping
    /// extracted from one source row.
    ///
    /// The `Link` cell is split on newlines; a single empty split result is
    /// normalized to an empty link sequence. Categorical attributes are
    /// reconciled per [`AttributeValue::new`]; attributes absent from the row
    /// are simply omitted.
    ///
    /// # Errors
    ///
    /// - [`BuildError::Configuration`] if the schema does not mark all four
    ///   essential attributes as required (defensive check, independent of
    ///   the row data).
    /// - [`BuildError::MissingField`] if the row lacks an essential field.
    /// - [`BuildError::EmptyCode`] if the code cell is empty.
    /// - [`BuildError::Attribute`] if a categorical value cannot be
    ///   reconciled.
    pub fn from_row(
        schema: &Schema,
        category: Category,
        mode: ParseMode,
        values: &BTreeMap<String, String>,
    ) -> Result<Self, BuildError> {
        for name in ESSENTIAL_ATTRIBUTES {
            if !schema.get(name).is_some_and(|spec| spec.required) {
                return Err(BuildError::Configuration(
                    ConfigurationError::EssentialNotRequired(name),
                ));
            }
        }

        for name in ESSENTIAL_ATTRIBUTES {
            if !values.contains_key(name) {
                return Err(BuildError::MissingField(name));
            }
        }

        let id = values["ID"].clone();
        let code = Code::new(values["CodeName"].clone())?;
        let text = values["Requirement"].clone();
        let full_text = text.clone();
        let links = split_links(&values["Link"]);

        let mut attributes = Vec::new();
        for name in schema.categorical_names() {
            if let Some(raw) = values.get(name) {
                attributes.push(AttributeValue::new(schema, name, raw, mode)?);
            }
        }

        Ok(Self {
            id,
            code,
            text,
            full_text,
            links,
            category,
            attributes,
        })
    }

    /// The opaque row identity from the source table.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The unique requirement code.
    #[must_use]
    pub const fn code(&self) -> &Code {
        &self.code
    }

    /// The short requirement label.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The descriptive text. May equal [`Requirement::text`].
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Declared links toward the level below, as raw code strings.
    ///
    /// Targets are weak references; they may dangle and are resolved against
    /// the index at traversal time.
    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// The traceability level of this requirement.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// The categorical attributes present on this requirement.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|attr| attr.name() == name)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.code, self.text)
    }
}

fn split_links(cell: &str) -> Vec<String> {
    let links: Vec<String> = cell.split('\n').map(ToString::to_string).collect();
    if links.len() == 1 && links[0].is_empty() {
        Vec::new()
    } else {
        links
    }
}

/// Errors raised while building a [`Requirement`] from a source row.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The schema itself is unusable (aborts the run).
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The row lacks one of the essential fields.
    #[error("row is missing the essential attribute '{0}'")]
    MissingField(&'static str),

    /// The code cell is empty.
    #[error(transparent)]
    EmptyCode(#[from] InvalidCodeError),

    /// A categorical attribute value could not be reconciled.
    #[error(transparent)]
    Attribute(#[from] InvalidAttributeError),
}
