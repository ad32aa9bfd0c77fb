use crate::resource_type::CanonicalResourceType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

// ============================================================================
// Analyzer input
// ============================================================================

/// Parsed architecture graph as produced by the external diagram analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureGraph {
    #[serde(default, alias = "components")]
    pub resources: Vec<RawResource>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// One entry of the analyzer's resource list. Labels are free-form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<SkuSpec>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// SKU as either a bare string or an ARM-style `{ "name": ... }` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkuSpec {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
    },
}

impl SkuSpec {
    pub fn name(&self) -> Option<&str> {
        match self {
            SkuSpec::Name(name) => Some(name.as_str()),
            SkuSpec::Object { name } => name.as_deref(),
        }
        .map(str::trim)
        .filter(|name| !name.is_empty())
    }
}

/// Directed edge between two resources. Never billed, never evaluated alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    #[serde(alias = "source")]
    pub source_id: String,
    #[serde(alias = "target")]
    pub target_id: String,
    #[serde(default, alias = "type")]
    pub kind: String,
}

impl RelationshipEdge {
    pub fn new(source_id: &str, target_id: &str, kind: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            kind: kind.to_string(),
        }
    }
}

// ============================================================================
// Normalized output
// ============================================================================

/// A billable, policy-evaluable resource with a resolved canonical type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: String,
    pub name: String,
    pub raw_type: String,
    pub canonical_type: CanonicalResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl ResourceNode {
    pub fn new(id: &str, canonical_type: CanonicalResourceType) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            raw_type: canonical_type.to_string(),
            canonical_type,
            sku: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_sku(mut self, sku: &str) -> Self {
        self.sku = Some(sku.to_string());
        self
    }

    pub fn with_property(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Looks up a dotted property path such as `networkAcls.defaultAction`.
    ///
    /// A leading `properties.` segment is accepted and ignored, so ARM-style
    /// paths resolve the same way as bare ones. Numeric segments index arrays.
    pub fn property(&self, path: &str) -> Option<&Value> {
        let path = path.strip_prefix("properties.").unwrap_or(path);
        let mut segments = path.split('.').filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        let mut current = self.properties.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Numeric property, accepting numbers or numeric strings.
    pub fn number(&self, path: &str) -> Option<f64> {
        match self.property(path)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// String property; numbers and booleans are rendered as text.
    pub fn text(&self, path: &str) -> Option<String> {
        match self.property(path)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarningKind {
    /// Entry named like a relationship was dropped from the resource list
    RelationshipDiscarded,
    /// Only a broad family (compute/storage/network) could be inferred
    FallbackBucket,
    /// No canonical type could be inferred
    Unresolved,
    /// Entry carried no type; its name was classified instead
    MissingType,
    /// Two entries resolved to the same id; the later one was renamed
    DuplicateId,
}

/// Non-fatal, per-node note produced while normalizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationWarning {
    pub node_id: String,
    pub raw_type: String,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedArchitecture {
    pub resources: Vec<ResourceNode>,
    pub relationships: Vec<RelationshipEdge>,
    pub warnings: Vec<NormalizationWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_hint: Option<String>,
}

impl NormalizedArchitecture {
    pub fn resource(&self, id: &str) -> Option<&ResourceNode> {
        self.resources.iter().find(|node| node.id == id)
    }

    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &NormalizationWarning> {
        self.warnings.iter().filter(move |warning| warning.kind == kind)
    }
}
