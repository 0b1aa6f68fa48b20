use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::Category;

/// The four attribute names every source row must provide.
///
/// These are checked twice: once against the configuration (they must be
/// marked `required`) and once against each parsed row.
pub const ESSENTIAL_ATTRIBUTES: [&str; 4] = ["ID", "CodeName", "Requirement", "Link"];

/// Configuration for a single requirement attribute.
///
/// Attributes come in two flavours. Free-text attributes (the essential
/// four) only carry column probes. Categorical attributes additionally carry
/// an ordered `values` vocabulary, and optionally a `default` for empty
/// cells, an `aliases` list parallel to the vocabulary, and a `markers` list
/// used when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Whether every row must provide this attribute.
    #[serde(default)]
    pub required: bool,

    /// Ordered vocabulary of admissible values, if the attribute is
    /// categorical. The index of a value in this list is its order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    /// Value adopted for empty cells in lenient mode. Only meaningful when
    /// `values` is present, and must be a member of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Accepted spellings, parallel to `values`: a raw cell matching
    /// `aliases[i]` resolves to `values[i]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,

    /// Render markers, parallel to `values`. May be shorter than the
    /// vocabulary; missing entries are a per-requirement rendering warning,
    /// not a configuration error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<String>>,

    /// Acceptable header spellings used to locate this attribute's column.
    #[serde(alias = "colNames")]
    pub col_names: Vec<String>,

    /// Human-readable description, shown in the rendered legend.
    #[serde(default)]
    pub description: String,
}

/// The configured attribute schema: one [`AttributeSpec`] per attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    attributes: BTreeMap<String, AttributeSpec>,
}

impl Schema {
    /// Looks up the spec for an attribute name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }

    /// The ordered vocabulary for a categorical attribute.
    ///
    /// Returns `None` both for unknown names and for free-text attributes.
    #[must_use]
    pub fn vocabulary(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name)?.values.as_deref()
    }

    /// The configured default value for empty cells, if any.
    #[must_use]
    pub fn default_for(&self, name: &str) -> Option<&str> {
        let spec = self.attributes.get(name)?;
        spec.values.as_ref()?;
        spec.default.as_deref()
    }

    /// The alias list parallel to the vocabulary, if configured.
    #[must_use]
    pub fn aliases_for(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name)?.aliases.as_deref()
    }

    /// The marker list parallel to the vocabulary, if configured.
    #[must_use]
    pub fn markers_for(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name)?.markers.as_deref()
    }

    /// The description of an attribute, if it is configured.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|spec| spec.description.as_str())
    }

    /// Names of categorical attributes (those with a vocabulary), in
    /// deterministic (sorted) order.
    pub fn categorical_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, spec)| spec.values.is_some())
            .map(|(name, _)| name.as_str())
    }

    /// Names of categorical attributes that carry a marker table.
    pub fn marker_attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, spec)| spec.values.is_some() && spec.markers.is_some())
            .map(|(name, _)| name.as_str())
    }

    /// Names of attributes marked as required.
    pub fn mandatory_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
    }

    /// Column probes for every configured attribute: attribute name paired
    /// with the acceptable header spellings.
    pub fn col_name_probes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attributes
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.col_names.as_slice()))
    }

    /// Checks the schema for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if any essential attribute is missing
    /// or not marked required, if a default value is not a member of its
    /// vocabulary, or if an alias list does not match its vocabulary length.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for name in ESSENTIAL_ATTRIBUTES {
            if !self.attributes.get(name).is_some_and(|spec| spec.required) {
                return Err(ConfigurationError::EssentialNotRequired(name));
            }
        }

        for (name, spec) in &self.attributes {
            let Some(values) = &spec.values else {
                continue;
            };

            if let Some(default) = &spec.default {
                if !values.contains(default) {
                    return Err(ConfigurationError::DefaultNotInVocabulary {
                        name: name.clone(),
                        value: default.clone(),
                    });
                }
            }

            if let Some(aliases) = &spec.aliases {
                if aliases.len() != values.len() {
                    return Err(ConfigurationError::AliasLengthMismatch {
                        name: name.clone(),
                        aliases: aliases.len(),
                        values: values.len(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Visual style applied to a rendered topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStyle {
    /// Fill colour, for example `#CC3333`.
    pub fill: String,
    /// Topic shape name.
    pub shape: String,
    /// Outline colour.
    #[serde(alias = "lineColor")]
    pub line_color: String,
    /// Outline width, for example `1pt`.
    #[serde(alias = "lineWidth")]
    pub line_width: String,
}

/// The configured style table, keyed by category name plus `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    styles: BTreeMap<String, TopicStyle>,
}

impl StyleSheet {
    /// The style id for a category, falling back to `unknown`.
    ///
    /// A fallback is logged as a warning rather than failing the render.
    #[must_use]
    pub fn style_id_for(&self, category: Category) -> &'static str {
        if self.styles.contains_key(category.as_str()) {
            category.as_str()
        } else {
            tracing::warn!("unknown category: {category}");
            "unknown"
        }
    }

    /// The style for a category, falling back to the `unknown` style.
    ///
    /// # Panics
    ///
    /// Panics if the sheet has no `unknown` entry. [`StyleSheet::validate`]
    /// rules this out for any sheet accepted at configuration time.
    #[must_use]
    pub fn style_for(&self, category: Category) -> &TopicStyle {
        self.styles
            .get(self.style_id_for(category))
            .expect("validated style sheets always carry an 'unknown' entry")
    }

    /// Iterates the configured styles in deterministic (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicStyle)> {
        self.styles.iter().map(|(name, style)| (name.as_str(), style))
    }

    /// Checks that the fallback style exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingUnknownStyle`] if no `unknown`
    /// entry is configured.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.styles.contains_key("unknown") {
            Ok(())
        } else {
            Err(ConfigurationError::MissingUnknownStyle)
        }
    }
}

/// The full tool configuration: attribute schema plus style table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The attribute schema.
    pub attributes: Schema,
    /// The topic style table.
    pub styles: StyleSheet,
}

impl Config {
    /// Loads and validates a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// fails [`Schema::validate`] / [`StyleSheet::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.attributes.validate()?;
        config.styles.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    /// The built-in configuration, used when no config file is supplied.
    fn default() -> Self {
        let config: Self = serde_yaml::from_str(DEFAULT_CONFIG)
            .expect("the built-in configuration must parse");
        config
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML for the expected shape.
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The file parsed but describes an unusable configuration.
    #[error(transparent)]
    Invalid(#[from] ConfigurationError),
}

/// A structurally invalid configuration. These abort startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// One of the four essential attributes is missing or not required.
    #[error(
        "essential attribute '{0}' must be configured as required ('ID', 'CodeName', \
         'Requirement' and 'Link' are all essential)"
    )]
    EssentialNotRequired(&'static str),

    /// A configured default is not a member of its vocabulary.
    #[error("attribute '{name}': default value '{value}' is not in the vocabulary")]
    DefaultNotInVocabulary {
        /// The attribute name.
        name: String,
        /// The offending default value.
        value: String,
    },

    /// An alias list does not line up with its vocabulary.
    #[error("attribute '{name}': {aliases} aliases configured for {values} vocabulary entries")]
    AliasLengthMismatch {
        /// The attribute name.
        name: String,
        /// Number of aliases configured.
        aliases: usize,
        /// Number of vocabulary entries configured.
        values: usize,
    },

    /// The style table is missing its `unknown` fallback entry.
    #[error("style table must define an 'unknown' fallback style")]
    MissingUnknownStyle,
}

const DEFAULT_CONFIG: &str = r##"
attributes:
  ID:
    required: true
    col_names: ["ID", "Id"]
    description: "Opaque row identity from the source table"
  CodeName:
    required: true
    col_names: ["Code Name", "CodeName", "Code"]
    description: "Unique requirement code, the traceability key"
  Requirement:
    required: true
    col_names: ["Requirement", "Requirement Text"]
    description: "The requirement statement"
  Link:
    required: true
    col_names: ["Link", "Links", "Linked Requirements"]
    description: "Codes of linked requirements at the next level down, one per line"
  Priority:
    required: false
    values: ["Low", "Medium", "High"]
    default: "Medium"
    aliases: ["l", "m", "h"]
    markers: ["priority-low", "priority-medium", "priority-high"]
    col_names: ["Priority"]
    description: "Relative implementation priority"
  Risk:
    required: false
    values: ["Low", "Medium", "High"]
    default: "Low"
    aliases: ["l", "m", "h"]
    markers: ["flag-green", "flag-yellow", "flag-red"]
    col_names: ["Risk"]
    description: "Risk carried by the requirement if implemented late or wrong"
  Difficulty:
    required: false
    values: ["Low", "Medium", "High"]
    default: "Low"
    aliases: ["easy", "moderate", "hard"]
    markers: ["gauge-low", "gauge-medium", "gauge-high"]
    col_names: ["Difficulty"]
    description: "Estimated implementation difficulty"
  SecurityDomain:
    required: false
    values: ["Public", "Internal", "Confidential"]
    default: "Internal"
    aliases: ["pub", "int", "conf"]
    markers: ["lock-open", "lock-half", "lock-closed"]
    col_names: ["Security Domain", "SecurityDomain", "Domain"]
    description: "Security classification of the requirement"

styles:
  business:
    fill: "#CC9933"
    shape: "rounded-rectangle"
    line_color: "#994C00"
    line_width: "2pt"
  user:
    fill: "#3399CC"
    shape: "rounded-rectangle"
    line_color: "#004C99"
    line_width: "2pt"
  system:
    fill: "#66CC66"
    shape: "rectangle"
    line_color: "#009900"
    line_width: "1pt"
  unknown:
    fill: "#CCCCCC"
    shape: "ellipse"
    line_color: "#666666"
    line_width: "1pt"
"##;
