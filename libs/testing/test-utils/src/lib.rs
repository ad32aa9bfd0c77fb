//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for all domain crates:
//! - `GraphBuilder`: fluent construction of analyzer graphs
//! - `fixtures`: the reference architectures used across engine tests
//! - `TestDataBuilder`: deterministic test data generation
//! - `assertions`: custom assertion helpers
//!
//! # Usage
//!
//! ```rust
//! use test_utils::{GraphBuilder, TestDataBuilder};
//!
//! let builder = TestDataBuilder::from_test_name("my_test");
//! let graph = GraphBuilder::new()
//!     .resource("Key Vault", &builder.name("kv", "main"))
//!     .build();
//! assert_eq!(graph.resources.len(), 1);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use domain_architecture::{
    normalize, ArchitectureGraph, GraphMetadata, NormalizedArchitecture, RawResource,
    RelationshipEdge, SkuSpec,
};
use serde_json::{Map, Value};

/// Fluent builder for [`ArchitectureGraph`] inputs.
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    graph: ArchitectureGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource with a free-form type label and a name.
    pub fn resource(self, resource_type: &str, name: &str) -> Self {
        self.resource_with(resource_type, name, None, Value::Null)
    }

    /// Add a resource with an optional SKU and a JSON object of properties.
    ///
    /// Non-object `properties` values are ignored.
    pub fn resource_with(
        mut self,
        resource_type: &str,
        name: &str,
        sku: Option<&str>,
        properties: Value,
    ) -> Self {
        let properties = match properties {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.graph.resources.push(RawResource {
            id: None,
            name: Some(name.to_string()),
            resource_type: resource_type.to_string(),
            sku: sku.map(|sku| SkuSpec::Name(sku.to_string())),
            properties,
        });
        self
    }

    pub fn relationship(mut self, source: &str, target: &str, kind: &str) -> Self {
        self.graph
            .relationships
            .push(RelationshipEdge::new(source, target, kind));
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.graph.metadata = Some(GraphMetadata {
            region: Some(region.to_string()),
        });
        self
    }

    pub fn build(self) -> ArchitectureGraph {
        self.graph
    }

    /// Build and run the normalizer in one step.
    pub fn normalized(self) -> NormalizedArchitecture {
        normalize(&self.graph)
    }
}

/// Reference architectures shared by engine tests.
pub mod fixtures {
    use super::*;
    use serde_json::json;

    /// App Service at its default SKU, SQL S2 with 250 GB and a 100 GB
    /// Standard_LRS storage account doing 1M transactions a month.
    pub fn web_app_graph() -> ArchitectureGraph {
        GraphBuilder::new()
            .resource("App Service", "web")
            .resource_with("SQL Database", "orders-db", Some("S2"), json!({ "maxSizeGB": 250 }))
            .resource_with(
                "Storage Account",
                "assets",
                Some("Standard_LRS"),
                json!({ "storageGB": 100, "monthlyTransactions": 1_000_000 }),
            )
            .relationship("web", "orders-db", "database_connection")
            .relationship("web", "assets", "reads_static_assets")
            .build()
    }

    /// Key Vault with public network access and no ACLs.
    pub fn open_key_vault_graph() -> ArchitectureGraph {
        GraphBuilder::new()
            .resource_with(
                "Key Vault",
                "secrets",
                Some("standard"),
                json!({ "publicNetworkAccess": "Enabled" }),
            )
            .build()
    }

    /// Front Door forwarding to an App Service, with the edge also listed as a resource.
    pub fn forwarding_graph() -> ArchitectureGraph {
        GraphBuilder::new()
            .resource("Front Door", "edge")
            .resource("App Service", "web")
            .resource("forwarding", "edge-to-web")
            .relationship("edge", "web", "forwarding")
            .build()
    }

    /// A single entry no classifier recognizes.
    pub fn unknown_thing_graph() -> ArchitectureGraph {
        GraphBuilder::new()
            .resource("Unknown Azure Thing", "mystery")
            .build()
    }

    /// Fixed report timestamp so reports compare byte for byte.
    pub fn generated_at() -> DateTime<Utc> {
        TestDataBuilder::new(0).timestamp()
    }
}

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_estimate_scenario");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique name for testing
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("kv", "main"), "test-kv-7-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Deterministic timestamp within one day of 2024-01-01T00:00:00Z.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let offset = (self.seed % 86_400) as i64;
        Utc.timestamp_opt(1_704_067_200 + offset, 0)
            .single()
            .unwrap_or_else(|| panic!("seed {} produced an invalid timestamp", self.seed))
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that two floats agree within `tolerance`
    pub fn assert_close(actual: f64, expected: f64, tolerance: f64, context: &str) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{}: expected {} ± {}, got {}",
            context,
            expected,
            tolerance,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.timestamp(), builder2.timestamp());
        assert_eq!(builder1.name("vm", "test"), builder2.name("vm", "test"));
    }

    #[test]
    fn test_data_builder_from_name() {
        let builder1 = TestDataBuilder::from_test_name("my_test");
        let builder2 = TestDataBuilder::from_test_name("my_test");

        assert_eq!(builder1.name("kv", "a"), builder2.name("kv", "a"));
    }

    #[test]
    fn test_graph_builder_collects_entries() {
        let graph = GraphBuilder::new()
            .resource("App Service", "web")
            .relationship("web", "db", "database_connection")
            .region("westeurope")
            .build();

        assert_eq!(graph.resources.len(), 1);
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(
            graph.metadata.and_then(|m| m.region).as_deref(),
            Some("westeurope")
        );
    }

    #[test]
    fn test_fixtures_normalize_cleanly() {
        let normalized = normalize(&fixtures::web_app_graph());
        assert_eq!(normalized.resources.len(), 3);
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_assert_close_accepts_within_tolerance() {
        assertions::assert_close(1.0000001, 1.0, 1e-6, "close");
    }
}
