//! Architecture Domain
//!
//! Input model for parsed architecture graphs and the Resource Normalizer
//! that turns them into billable, policy-evaluable resource nodes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ArchitectureGraph│  ← analyzer output (loosely typed labels)
//! └────────┬─────────┘
//!          │ normalize()
//! ┌────────▼─────────────┐
//! │NormalizedArchitecture│  ← resources + relationships + warnings
//! └──────────────────────┘
//! ```

pub mod models;
pub mod normalizer;
pub mod resource_type;

pub use models::{
    ArchitectureGraph, GraphMetadata, NormalizationWarning, NormalizedArchitecture, RawResource,
    RelationshipEdge, ResourceNode, SkuSpec, WarningKind,
};
pub use normalizer::{
    compact_label, is_relationship_label, normalize, resolve_label, Resolution, ResourceNormalizer,
};
pub use resource_type::CanonicalResourceType;
