use std::{fmt, str::FromStr};

/// The traceability level of a requirement.
///
/// Requirements form a fixed three-tier hierarchy. Traceability flows from
/// [`Category::Business`] at the top, through [`Category::User`], down to
/// [`Category::System`] at the bottom. Sources that cannot be assigned a
/// level are tagged [`Category::Unknown`] and rendered with a fallback style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Top-level business need.
    Business,
    /// Mid-level user requirement, derived from a business need.
    User,
    /// Bottom-level system requirement, implementing a user requirement.
    System,
    /// Source could not be assigned a level.
    Unknown,
}

/// The three real levels ordered bottom-up: system, user, business.
pub const PROGRESSION: [Category; 3] = [Category::System, Category::User, Category::Business];

impl Category {
    /// The category one level up in the hierarchy, if any.
    ///
    /// `System → User → Business`; the apex and [`Category::Unknown`] have no
    /// level above.
    #[must_use]
    pub const fn level_above(self) -> Option<Self> {
        match self {
            Self::System => Some(Self::User),
            Self::User => Some(Self::Business),
            Self::Business | Self::Unknown => None,
        }
    }

    /// The category one level down in the hierarchy, if any.
    #[must_use]
    pub const fn level_below(self) -> Option<Self> {
        match self {
            Self::Business => Some(Self::User),
            Self::User => Some(Self::System),
            Self::System | Self::Unknown => None,
        }
    }

    /// Maps a source file name to a category from its leading character.
    ///
    /// Matching is intentionally strict: `B`, `U` and `S` (upper-case) select
    /// a level, anything else is [`Category::Unknown`].
    #[must_use]
    pub fn from_source_name(name: &str) -> Self {
        match name.chars().next() {
            Some('B') => Self::Business,
            Some('U') => Self::User,
            Some('S') => Self::System,
            _ => Self::Unknown,
        }
    }

    /// The lower-case name used in configuration and rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::User => "user",
            Self::System => "system",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known category.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown category '{0}': expected 'business', 'user' or 'system'")]
pub struct UnknownCategoryError(String);

impl FromStr for Category {
    type Err = UnknownCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business" => Ok(Self::Business),
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            "unknown" => Ok(Self::Unknown),
            other => Err(UnknownCategoryError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_runs_bottom_up() {
        assert_eq!(
            PROGRESSION,
            [Category::System, Category::User, Category::Business]
        );
        assert_eq!(Category::System.level_above(), Some(Category::User));
        assert_eq!(Category::User.level_above(), Some(Category::Business));
        assert_eq!(Category::Business.level_above(), None);
        assert_eq!(Category::Business.level_below(), Some(Category::User));
        assert_eq!(Category::System.level_below(), None);
        assert_eq!(Category::Unknown.level_above(), None);
        assert_eq!(Category::Unknown.level_below(), None);
    }

    #[test]
    fn source_name_prefix_selects_category() {
        assert_eq!(
            Category::from_source_name("B-needs.tsv"),
            Category::Business
        );
        assert_eq!(Category::from_source_name("User.tsv"), Category::User);
        assert_eq!(Category::from_source_name("S01.tsv"), Category::System);
        // lower-case and unrelated prefixes are not levels
        assert_eq!(Category::from_source_name("b-needs.tsv"), Category::Unknown);
        assert_eq!(Category::from_source_name("notes.tsv"), Category::Unknown);
        assert_eq!(Category::from_source_name(""), Category::Unknown);
    }

    #[test]
    fn round_trips_through_display() {
        for category in [
            Category::Business,
            Category::User,
            Category::System,
            Category::Unknown,
        ] {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
    }
}
