use crate::domain::{AttributeValue, Requirement};

/// Attribute names making up the composite sort key, most significant first.
pub const SORT_ATTRIBUTES: [&str; 3] = ["Priority", "Risk", "Difficulty"];

/// Orders sibling requirements at one tree level.
///
/// The key is the sequence of vocabulary orders for `Priority`, `Risk` and
/// `Difficulty`, in that order, ascending. An attribute missing from a
/// requirement contributes no component, so its key is shorter and sorts
/// before longer keys with an equal prefix (`Vec` lexicographic order). The
/// sort is stable: ties keep their input order.
pub fn sort_siblings<'a>(mut requirements: Vec<&'a Requirement>) -> Vec<&'a Requirement> {
    requirements.sort_by_key(|requirement| composite_key(requirement));
    requirements
}

fn composite_key(requirement: &Requirement) -> Vec<usize> {
    SORT_ATTRIBUTES
        .iter()
        .filter_map(|name| requirement.attribute(name).and_then(AttributeValue::order))
        .collect()
}
