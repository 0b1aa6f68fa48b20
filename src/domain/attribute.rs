use crate::domain::Schema;

/// How forgiving attribute reconciliation should be.
///
/// The mode is fixed when a value is constructed and never changes
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// An out-of-vocabulary value fails construction immediately.
    Strict,
    /// Out-of-vocabulary values are repaired where possible (see
    /// [`AttributeValue::new`]).
    #[default]
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    /// The value is a member of the vocabulary at the given index.
    Valid { value: String, order: usize },
    /// The attribute name is not categorical; the value cannot be resolved.
    Invalid,
}

/// A single categorical attribute of a requirement.
///
/// Holds the raw value as supplied by the source, the resolved vocabulary
/// member (when resolution succeeded), and the construction mode. Immutable
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    name: String,
    raw: String,
    resolution: Resolution,
    mode: ParseMode,
}

impl AttributeValue {
    /// Reconciles a raw cell value against the schema.
    ///
    /// An unrecognised attribute name yields a constructed-but-invalid value
    /// rather than an error, so callers can degrade gracefully and filter on
    /// [`AttributeValue::is_valid`] where it matters.
    ///
    /// For a recognised name the raw value must match a vocabulary entry
    /// exactly (case-sensitive). In [`ParseMode::Lenient`] an invalid value
    /// is repaired by, in order:
    ///
    /// 1. the configured default, when the trimmed lower-cased raw value is
    ///    empty;
    /// 2. a case-insensitive prefix match against the vocabulary;
    /// 3. the alias table, adopting the vocabulary entry at the alias
    ///    position.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAttributeError`] when the value cannot be resolved:
    /// immediately in strict mode, or after all three fallbacks fail in
    /// lenient mode.
    pub fn new(
        schema: &Schema,
        name: &str,
        raw: &str,
        mode: ParseMode,
    ) -> Result<Self, InvalidAttributeError> {
        let Some(vocabulary) = schema.vocabulary(name) else {
            return Ok(Self {
                name: name.to_string(),
                raw: raw.to_string(),
                resolution: Resolution::Invalid,
                mode,
            });
        };

        let resolved = Self::resolve(schema, name, raw, vocabulary, mode).ok_or_else(|| {
            InvalidAttributeError {
                name: name.to_string(),
                value: raw.to_string(),
            }
        })?;

        Ok(Self {
            name: name.to_string(),
            raw: raw.to_string(),
            resolution: resolved,
            mode,
        })
    }

    fn resolve(
        schema: &Schema,
        name: &str,
        raw: &str,
        vocabulary: &[String],
        mode: ParseMode,
    ) -> Option<Resolution> {
        if let Some(order) = vocabulary.iter().position(|entry| entry == raw) {
            return Some(Resolution::Valid {
                value: raw.to_string(),
                order,
            });
        }

        if mode == ParseMode::Strict {
            return None;
        }

        let lowered = raw.to_lowercase();

        if lowered.trim().is_empty() {
            if let Some(default) = schema.default_for(name) {
                let order = vocabulary.iter().position(|entry| entry == default)?;
                tracing::debug!("attribute '{name}': empty value defaulted to '{default}'");
                return Some(Resolution::Valid {
                    value: default.to_string(),
                    order,
                });
            }
        }

        for (order, entry) in vocabulary.iter().enumerate() {
            if lowered.starts_with(&entry.to_lowercase()) {
                tracing::debug!("attribute '{name}': '{raw}' resolved by prefix to '{entry}'");
                return Some(Resolution::Valid {
                    value: entry.clone(),
                    order,
                });
            }
        }

        if let Some(aliases) = schema.aliases_for(name) {
            if let Some(position) = aliases.iter().position(|alias| *alias == lowered) {
                let entry = vocabulary.get(position)?;
                tracing::debug!("attribute '{name}': '{raw}' resolved by alias to '{entry}'");
                return Some(Resolution::Valid {
                    value: entry.clone(),
                    order: position,
                });
            }
        }

        None
    }

    /// The attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw value as supplied by the source row.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The resolved vocabulary member, or `None` for an invalid attribute.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Valid { value, .. } => Some(value),
            Resolution::Invalid => None,
        }
    }

    /// The vocabulary index of the resolved value.
    ///
    /// This drives both sibling sorting and marker selection. `None` is the
    /// invalid sentinel.
    #[must_use]
    pub const fn order(&self) -> Option<usize> {
        match &self.resolution {
            Resolution::Valid { order, .. } => Some(*order),
            Resolution::Invalid => None,
        }
    }

    /// Whether the value resolved to a vocabulary member.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.resolution, Resolution::Valid { .. })
    }

    /// The construction mode.
    #[must_use]
    pub const fn mode(&self) -> ParseMode {
        self.mode
    }
}

/// A value that could not be reconciled with its attribute's vocabulary.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("the value '{value}' is not valid for attribute '{name}'")]
pub struct InvalidAttributeError {
    /// The attribute name.
    pub name: String,
    /// The offending raw value.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Config;

    fn schema() -> Schema {
        Config::default().attributes
    }

    #[test]
    fn exact_match_resolves_in_both_modes() {
        for mode in [ParseMode::Strict, ParseMode::Lenient] {
            let attr = AttributeValue::new(&schema(), "Priority", "High", mode).unwrap();
            assert_eq!(attr.value(), Some("High"));
            assert_eq!(attr.order(), Some(2));
            assert!(attr.is_valid());
        }
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        let err = AttributeValue::new(&schema(), "Priority", "HIGH!", ParseMode::Strict)
            .unwrap_err();
        assert_eq!(err.name, "Priority");
        assert_eq!(err.value, "HIGH!");
    }

    #[test]
    fn lenient_empty_value_adopts_default() {
        let attr = AttributeValue::new(&schema(), "Risk", "  ", ParseMode::Lenient).unwrap();
        assert_eq!(attr.value(), Some("Low"));
        assert_eq!(attr.order(), Some(0));
    }

    #[test]
    fn lenient_prefix_match_adopts_vocabulary_entry() {
        let attr =
            AttributeValue::new(&schema(), "Priority", "high priority", ParseMode::Lenient)
                .unwrap();
        assert_eq!(attr.value(), Some("High"));
        assert_eq!(attr.order(), Some(2));
        assert_eq!(attr.raw(), "high priority");
    }

    #[test]
    fn lenient_alias_adopts_entry_at_matching_position() {
        let attr = AttributeValue::new(&schema(), "Difficulty", "Hard", ParseMode::Lenient)
            .unwrap();
        assert_eq!(attr.value(), Some("High"));
        assert_eq!(attr.order(), Some(2));
    }

    #[test]
    fn strict_mode_rejects_repairable_values() {
        let err =
            AttributeValue::new(&schema(), "Priority", "high priority", ParseMode::Strict)
                .unwrap_err();
        assert_eq!(err.name, "Priority");
    }

    #[test]
    fn lenient_mode_fails_when_no_fallback_applies() {
        let err = AttributeValue::new(&schema(), "Priority", "tomorrow", ParseMode::Lenient)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "the value 'tomorrow' is not valid for attribute 'Priority'"
        );
    }

    #[test]
    fn unknown_attribute_name_constructs_invalid() {
        let attr = AttributeValue::new(&schema(), "Mood", "Sunny", ParseMode::Strict).unwrap();
        assert!(!attr.is_valid());
        assert_eq!(attr.order(), None);
        assert_eq!(attr.value(), None);
        assert_eq!(attr.raw(), "Sunny");
    }

    #[test]
    fn order_tracks_vocabulary_index() {
        let vocabulary = ["Low", "Medium", "High"];
        for (index, entry) in vocabulary.iter().enumerate() {
            let attr = AttributeValue::new(&schema(), "Priority", entry, ParseMode::Strict)
                .unwrap();
            assert_eq!(attr.order(), Some(index));
        }
    }
}
