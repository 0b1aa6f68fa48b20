//! Requirements traceability maps from tabular sources.
//!
//! Requirements live at three levels (business → user → system) and declare
//! links toward the level below. This crate parses them out of tabular
//! source exports, validates and repairs their categorical attributes,
//! connects them into a traceability graph, and renders the graph as
//! hierarchical mind-map documents in both directions, with orphan and
//! missing-link diagnostics alongside.

/// Core domain types: attributes, requirements, categories, the index and
/// the configuration schema.
pub mod domain;
pub use domain::{
    AttributeValue, Category, Code, Config, ParseMode, Requirement, RequirementIndex,
};

/// Mind-map document model and the directional renderers.
pub mod render;
pub use render::{Document, RenderOptions, TreeRenderer};

/// Semantic duplicate scanning.
pub mod semantic;

/// Loading tabular sources from disk.
pub mod storage;

/// Link graph, traversal, sorting and diagnostics.
pub mod trace;
pub use trace::{Diagnostics, LinkGraph, TraceDirection, TraceNode, Traversal};
