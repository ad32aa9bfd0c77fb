//! Resource Normalizer.
//!
//! Drops relationship entries that the analyzer listed as resources and
//! resolves loosely typed labels to [`CanonicalResourceType`] through an
//! ordered pipeline: exact compacted label, keyword heuristics, fallback
//! bucket. Nothing here fails; every doubt becomes a [`NormalizationWarning`].

use crate::models::{
    ArchitectureGraph, NormalizationWarning, NormalizedArchitecture, RawResource, ResourceNode,
    WarningKind,
};
use crate::resource_type::CanonicalResourceType;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument};

use CanonicalResourceType as T;

/// Relationship kinds the analyzer sometimes emits as resource entries.
const RELATIONSHIP_KINDS: &[&str] = &[
    "ingress",
    "forwarding",
    "internal_load_balancing",
    "database_connection",
    "telemetry",
    "monitoring",
    "data_access",
    "api_calls",
    "reads_writes_data",
    "reads_static_assets",
    "retrieves_secrets",
    "sends_telemetry",
    "sends_logs",
    "connects_to",
    "depends_on",
    "deployed_in",
    "integrated_with",
    "accessible_from",
    "routes_traffic_to",
    "forwards_traffic_to",
    "reverse_proxy",
    "storage_access",
    "secrets_access",
    "log_aggregation",
    "contains",
    "hosts",
];

/// Compacted labels (and ARM type names) with an unambiguous meaning.
const EXACT_LABELS: &[(&str, CanonicalResourceType)] = &[
    ("virtualmachine", T::VirtualMachine),
    ("vm", T::VirtualMachine),
    ("azurevm", T::VirtualMachine),
    ("azurevirtualmachine", T::VirtualMachine),
    ("microsoftcomputevirtualmachines", T::VirtualMachine),
    ("appservice", T::AppService),
    ("azureappservice", T::AppService),
    ("webapp", T::AppService),
    ("azurewebapp", T::AppService),
    ("website", T::AppService),
    ("microsoftwebsites", T::AppService),
    ("functions", T::FunctionApp),
    ("functionapp", T::FunctionApp),
    ("azurefunctions", T::FunctionApp),
    ("azurefunctionapp", T::FunctionApp),
    ("appserviceplan", T::AppServicePlan),
    ("serverfarm", T::AppServicePlan),
    ("microsoftwebserverfarms", T::AppServicePlan),
    ("sqldatabase", T::SqlDatabase),
    ("azuresqldatabase", T::SqlDatabase),
    ("azuresql", T::SqlDatabase),
    ("database", T::SqlDatabase),
    ("sqldb", T::SqlDatabase),
    ("microsoftsqlserversdatabases", T::SqlDatabase),
    ("cosmosdb", T::CosmosDb),
    ("azurecosmosdb", T::CosmosDb),
    ("microsoftdocumentdbdatabaseaccounts", T::CosmosDb),
    ("rediscache", T::RedisCache),
    ("azurecacheforredis", T::RedisCache),
    ("microsoftcacheredis", T::RedisCache),
    ("storageaccount", T::StorageAccount),
    ("azurestorageaccount", T::StorageAccount),
    ("azurestorage", T::StorageAccount),
    ("microsoftstoragestorageaccounts", T::StorageAccount),
    ("keyvault", T::KeyVault),
    ("azurekeyvault", T::KeyVault),
    ("microsoftkeyvaultvaults", T::KeyVault),
    ("applicationinsights", T::ApplicationInsights),
    ("azureapplicationinsights", T::ApplicationInsights),
    ("appinsights", T::ApplicationInsights),
    ("monitor", T::ApplicationInsights),
    ("azuremonitor", T::ApplicationInsights),
    ("microsoftinsightscomponents", T::ApplicationInsights),
    ("loganalytics", T::LogAnalytics),
    ("loganalyticsworkspace", T::LogAnalytics),
    ("microsoftoperationalinsightsworkspaces", T::LogAnalytics),
    ("frontdoor", T::FrontDoor),
    ("azurefrontdoor", T::FrontDoor),
    ("microsoftnetworkfrontdoors", T::FrontDoor),
    ("applicationgateway", T::ApplicationGateway),
    ("appgateway", T::ApplicationGateway),
    ("microsoftnetworkapplicationgateways", T::ApplicationGateway),
    ("loadbalancer", T::LoadBalancer),
    ("microsoftnetworkloadbalancers", T::LoadBalancer),
    ("virtualnetwork", T::VirtualNetwork),
    ("vnet", T::VirtualNetwork),
    ("microsoftnetworkvirtualnetworks", T::VirtualNetwork),
    ("subnet", T::Subnet),
    ("websubnet", T::Subnet),
    ("databasesubnet", T::Subnet),
    ("dbsubnet", T::Subnet),
    ("microsoftnetworkvirtualnetworkssubnets", T::Subnet),
    ("networksecuritygroup", T::NetworkSecurityGroup),
    ("nsg", T::NetworkSecurityGroup),
    ("microsoftnetworknetworksecuritygroups", T::NetworkSecurityGroup),
    ("publicip", T::PublicIp),
    ("publicipaddress", T::PublicIp),
    ("microsoftnetworkpublicipaddresses", T::PublicIp),
    ("containerregistry", T::ContainerRegistry),
    ("acr", T::ContainerRegistry),
    ("microsoftcontainerregistryregistries", T::ContainerRegistry),
    ("aks", T::KubernetesService),
    ("azurekubernetesservice", T::KubernetesService),
    ("microsoftcontainerservicemanagedclusters", T::KubernetesService),
    ("servicebus", T::ServiceBus),
    ("microsoftservicebusnamespaces", T::ServiceBus),
    ("eventhub", T::EventHub),
    ("eventhubs", T::EventHub),
    ("microsofteventhubnamespaces", T::EventHub),
    ("apimanagement", T::ApiManagement),
    ("microsoftapimanagementservice", T::ApiManagement),
    ("cdn", T::Cdn),
    ("microsoftcdnprofiles", T::Cdn),
    ("trafficmanager", T::TrafficManager),
    ("microsoftnetworktrafficmanagerprofiles", T::TrafficManager),
    ("backup", T::RecoveryServicesVault),
    ("recoveryservicesvault", T::RecoveryServicesVault),
    ("microsoftrecoveryservicesvaults", T::RecoveryServicesVault),
];

/// How a keyword is matched against a label.
#[derive(Debug, Clone, Copy)]
enum Keyword {
    /// Substring of the compacted label
    Fragment(&'static str),
    /// Whole word of the label (short abbreviations only)
    Token(&'static str),
}

use Keyword::{Fragment, Token};

/// Ordered: more specific keywords come first.
const HEURISTICS: &[(Keyword, CanonicalResourceType)] = &[
    (Fragment("serviceplan"), T::AppServicePlan),
    (Fragment("serverfarm"), T::AppServicePlan),
    (Fragment("function"), T::FunctionApp),
    (Fragment("subnet"), T::Subnet),
    (Fragment("securitygroup"), T::NetworkSecurityGroup),
    (Token("nsg"), T::NetworkSecurityGroup),
    (Fragment("frontdoor"), T::FrontDoor),
    (Fragment("applicationgateway"), T::ApplicationGateway),
    (Fragment("appgateway"), T::ApplicationGateway),
    (Token("appgw"), T::ApplicationGateway),
    (Token("waf"), T::ApplicationGateway),
    (Fragment("loadbalancer"), T::LoadBalancer),
    (Token("lb"), T::LoadBalancer),
    (Fragment("trafficmanager"), T::TrafficManager),
    (Fragment("virtualnetwork"), T::VirtualNetwork),
    (Fragment("vnet"), T::VirtualNetwork),
    (Fragment("publicip"), T::PublicIp),
    (Token("pip"), T::PublicIp),
    (Fragment("recoveryservices"), T::RecoveryServicesVault),
    (Fragment("backup"), T::RecoveryServicesVault),
    (Fragment("keyvault"), T::KeyVault),
    (Fragment("secret"), T::KeyVault),
    (Token("kv"), T::KeyVault),
    (Fragment("vault"), T::KeyVault),
    (Fragment("cosmos"), T::CosmosDb),
    (Fragment("nosql"), T::CosmosDb),
    (Fragment("redis"), T::RedisCache),
    (Fragment("cache"), T::RedisCache),
    (Fragment("sql"), T::SqlDatabase),
    (Fragment("database"), T::SqlDatabase),
    (Token("db"), T::SqlDatabase),
    (Fragment("storage"), T::StorageAccount),
    (Fragment("blob"), T::StorageAccount),
    (Fragment("insights"), T::ApplicationInsights),
    (Fragment("monitor"), T::ApplicationInsights),
    (Fragment("loganalytics"), T::LogAnalytics),
    (Fragment("analytics"), T::LogAnalytics),
    (Token("logs"), T::LogAnalytics),
    (Fragment("registry"), T::ContainerRegistry),
    (Token("acr"), T::ContainerRegistry),
    (Fragment("kubernetes"), T::KubernetesService),
    (Token("aks"), T::KubernetesService),
    (Token("k8s"), T::KubernetesService),
    (Fragment("servicebus"), T::ServiceBus),
    (Fragment("queue"), T::ServiceBus),
    (Fragment("eventhub"), T::EventHub),
    (Fragment("apimanagement"), T::ApiManagement),
    (Token("apim"), T::ApiManagement),
    (Token("cdn"), T::Cdn),
    (Fragment("virtualmachine"), T::VirtualMachine),
    (Token("vm"), T::VirtualMachine),
    (Token("vms"), T::VirtualMachine),
    (Fragment("appservice"), T::AppService),
    (Fragment("webapp"), T::AppService),
    (Fragment("website"), T::AppService),
];

/// Broad families, tried after every heuristic missed.
const FALLBACK_BUCKETS: &[(Keyword, CanonicalResourceType)] = &[
    (Fragment("network"), T::GenericNetwork),
    (Fragment("gateway"), T::GenericNetwork),
    (Fragment("firewall"), T::GenericNetwork),
    (Fragment("dns"), T::GenericNetwork),
    (Fragment("proxy"), T::GenericNetwork),
    (Fragment("route"), T::GenericNetwork),
    (Fragment("vpn"), T::GenericNetwork),
    (Fragment("endpoint"), T::GenericNetwork),
    (Fragment("bastion"), T::GenericNetwork),
    (Token("nat"), T::GenericNetwork),
    (Fragment("disk"), T::GenericStorage),
    (Fragment("file"), T::GenericStorage),
    (Fragment("share"), T::GenericStorage),
    (Fragment("bucket"), T::GenericStorage),
    (Fragment("archive"), T::GenericStorage),
    (Fragment("datalake"), T::GenericStorage),
    (Fragment("compute"), T::GenericCompute),
    (Fragment("server"), T::GenericCompute),
    (Fragment("container"), T::GenericCompute),
    (Fragment("worker"), T::GenericCompute),
    (Fragment("instance"), T::GenericCompute),
    (Fragment("scaleset"), T::GenericCompute),
    (Fragment("batch"), T::GenericCompute),
    (Fragment("host"), T::GenericCompute),
    (Token("app"), T::GenericCompute),
    (Token("api"), T::GenericCompute),
];

/// Outcome of resolving one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact(CanonicalResourceType),
    Heuristic(CanonicalResourceType),
    Fallback(CanonicalResourceType),
    Unresolved,
}

impl Resolution {
    pub fn canonical_type(&self) -> CanonicalResourceType {
        match self {
            Resolution::Exact(kind) | Resolution::Heuristic(kind) | Resolution::Fallback(kind) => {
                *kind
            }
            Resolution::Unresolved => CanonicalResourceType::Unknown,
        }
    }
}

/// Lowercases and strips everything but ASCII letters and digits.
pub fn compact_label(label: &str) -> String {
    label
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn tokens(label: &str) -> Vec<String> {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// True when the label names a relationship kind rather than a resource.
pub fn is_relationship_label(label: &str) -> bool {
    let key: String = label
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    !key.is_empty() && RELATIONSHIP_KINDS.contains(&key.as_str())
}

fn match_keywords(
    table: &[(Keyword, CanonicalResourceType)],
    compacted: &str,
    words: &[String],
) -> Option<CanonicalResourceType> {
    table.iter().find_map(|(keyword, kind)| {
        let hit = match keyword {
            Fragment(fragment) => compacted.contains(fragment),
            Token(token) => words.iter().any(|word| word == token),
        };
        hit.then_some(*kind)
    })
}

/// Resolves a free-form label through exact → heuristic → fallback.
pub fn resolve_label(label: &str) -> Resolution {
    let compacted = compact_label(label);
    if compacted.is_empty() {
        return Resolution::Unresolved;
    }

    if let Some((_, kind)) = EXACT_LABELS.iter().find(|(alias, _)| *alias == compacted) {
        return Resolution::Exact(*kind);
    }

    let words = tokens(label);
    if let Some(kind) = match_keywords(HEURISTICS, &compacted, &words) {
        return Resolution::Heuristic(kind);
    }
    if let Some(kind) = match_keywords(FALLBACK_BUCKETS, &compacted, &words) {
        return Resolution::Fallback(kind);
    }

    Resolution::Unresolved
}

/// Stateful pass over one graph: tracks ids and collects warnings.
#[derive(Debug, Default)]
pub struct ResourceNormalizer {
    seen_ids: HashSet<String>,
    warnings: Vec<NormalizationWarning>,
}

impl ResourceNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the normalizer and produces the normalized architecture.
    #[instrument(skip_all, fields(entries = graph.resources.len(), edges = graph.relationships.len()))]
    pub fn run(mut self, graph: &ArchitectureGraph) -> NormalizedArchitecture {
        let mut resources = Vec::with_capacity(graph.resources.len());

        for (index, raw) in graph.resources.iter().enumerate() {
            if let Some(node) = self.normalize_entry(index + 1, raw) {
                resources.push(node);
            }
        }

        let region_hint = graph
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.region.clone())
            .or_else(|| {
                resources
                    .iter()
                    .find_map(|node| node.text("location").or_else(|| node.text("region")))
            })
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty());

        info!(
            resources = resources.len(),
            warnings = self.warnings.len(),
            region_hint = region_hint.as_deref().unwrap_or("none"),
            "Normalized architecture graph"
        );

        NormalizedArchitecture {
            resources,
            relationships: graph.relationships.clone(),
            warnings: self.warnings,
            region_hint,
        }
    }

    fn normalize_entry(&mut self, position: usize, raw: &RawResource) -> Option<ResourceNode> {
        let raw_type = raw.resource_type.trim();
        let name = raw.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

        // A name only marks a relationship when the type says nothing more specific.
        let weak_type = !matches!(
            resolve_label(raw_type),
            Resolution::Exact(_) | Resolution::Heuristic(_)
        );
        if is_relationship_label(raw_type) || (weak_type && name.is_some_and(is_relationship_label)) {
            let id = self.peek_id(position, raw, name);
            debug!(id = %id, raw_type, "Skipping relationship entry");
            self.warn(
                &id,
                raw_type,
                WarningKind::RelationshipDiscarded,
                format!("'{id}' ({raw_type}) is a relationship, not a resource; excluded"),
            );
            return None;
        }

        let id = self.assign_id(position, raw, name);
        let display_name = name.map(str::to_string).unwrap_or_else(|| id.clone());

        let label = if raw_type.is_empty() {
            match name {
                Some(name) => {
                    self.warn(
                        &id,
                        raw_type,
                        WarningKind::MissingType,
                        format!("'{id}' has no type; classified from its name"),
                    );
                    name
                }
                None => "",
            }
        } else {
            raw_type
        };

        let mut canonical_type = match resolve_label(label) {
            Resolution::Exact(kind) | Resolution::Heuristic(kind) => kind,
            Resolution::Fallback(kind) => {
                self.warn(
                    &id,
                    raw_type,
                    WarningKind::FallbackBucket,
                    format!("'{label}' only matched the broad family {kind}; using a flat estimate"),
                );
                kind
            }
            Resolution::Unresolved => {
                self.warn(
                    &id,
                    raw_type,
                    WarningKind::Unresolved,
                    format!("'{label}' is not a recognized resource type"),
                );
                CanonicalResourceType::Unknown
            }
        };

        let properties: BTreeMap<_, _> = raw
            .properties
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if canonical_type == T::AppService
            && properties
                .get("kind")
                .and_then(|kind| kind.as_str())
                .is_some_and(|kind| kind.to_ascii_lowercase().contains("functionapp"))
        {
            canonical_type = T::FunctionApp;
        }

        let sku = raw
            .sku
            .as_ref()
            .and_then(|sku| sku.name().map(str::to_string))
            .or_else(|| sku_from_properties(&properties));

        debug!(id = %id, raw_type, canonical_type = %canonical_type, "Resolved resource");

        Some(ResourceNode {
            id,
            name: display_name,
            raw_type: raw_type.to_string(),
            canonical_type,
            sku,
            properties,
        })
    }

    fn peek_id(&self, position: usize, raw: &RawResource, name: Option<&str>) -> String {
        raw.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or(name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("resource-{position}"))
    }

    fn assign_id(&mut self, position: usize, raw: &RawResource, name: Option<&str>) -> String {
        let base = self.peek_id(position, raw, name);
        let id = if self.seen_ids.contains(&base) {
            let renamed = format!("{base}-{position}");
            self.warn(
                &renamed,
                raw.resource_type.trim(),
                WarningKind::DuplicateId,
                format!("id '{base}' already used; entry {position} renamed to '{renamed}'"),
            );
            renamed
        } else {
            base
        };
        self.seen_ids.insert(id.clone());
        id
    }

    fn warn(&mut self, node_id: &str, raw_type: &str, kind: WarningKind, message: String) {
        self.warnings.push(NormalizationWarning {
            node_id: node_id.to_string(),
            raw_type: raw_type.to_string(),
            kind,
            message,
        });
    }
}

fn sku_from_properties(properties: &BTreeMap<String, serde_json::Value>) -> Option<String> {
    let from_sku = properties.get("sku").and_then(|sku| match sku {
        serde_json::Value::String(name) => Some(name.clone()),
        serde_json::Value::Object(map) => map.get("name").and_then(|n| n.as_str()).map(str::to_string),
        _ => None,
    });
    from_sku
        .or_else(|| {
            properties
                .get("skuName")
                .and_then(|name| name.as_str())
                .map(str::to_string)
        })
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Normalizes an analyzer graph. Pure and infallible.
pub fn normalize(graph: &ArchitectureGraph) -> NormalizedArchitecture {
    ResourceNormalizer::new().run(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RelationshipEdge, SkuSpec};
    use serde_json::json;

    fn raw(resource_type: &str, name: Option<&str>) -> RawResource {
        RawResource {
            name: name.map(str::to_string),
            resource_type: resource_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_labels_ignore_case_spaces_and_punctuation() {
        assert_eq!(resolve_label("App Service"), Resolution::Exact(T::AppService));
        assert_eq!(resolve_label("app-service"), Resolution::Exact(T::AppService));
        assert_eq!(resolve_label("Microsoft.Web/sites"), Resolution::Exact(T::AppService));
        assert_eq!(
            resolve_label("Microsoft.KeyVault/vaults"),
            Resolution::Exact(T::KeyVault)
        );
        assert_eq!(resolve_label("SQLDatabase"), Resolution::Exact(T::SqlDatabase));
        assert_eq!(resolve_label("DB Subnet"), Resolution::Exact(T::Subnet));
    }

    #[test]
    fn test_heuristics_pick_the_most_specific_keyword() {
        assert_eq!(resolve_label("Orders SQL Server"), Resolution::Heuristic(T::SqlDatabase));
        assert_eq!(resolve_label("Premium Redis"), Resolution::Heuristic(T::RedisCache));
        assert_eq!(
            resolve_label("Web Tier Subnet"),
            Resolution::Heuristic(T::Subnet)
        );
        assert_eq!(resolve_label("Jump VM"), Resolution::Heuristic(T::VirtualMachine));
        assert_eq!(
            resolve_label("Recovery Services Backup Vault"),
            Resolution::Heuristic(T::RecoveryServicesVault)
        );
    }

    #[test]
    fn test_short_keywords_match_whole_words_only() {
        // "db" inside "dashboard" must not count as a database.
        assert_ne!(resolve_label("dashboard"), Resolution::Heuristic(T::SqlDatabase));
        assert_eq!(resolve_label("orders db"), Resolution::Heuristic(T::SqlDatabase));
    }

    #[test]
    fn test_fallback_buckets() {
        assert_eq!(resolve_label("Azure Firewall"), Resolution::Fallback(T::GenericNetwork));
        assert_eq!(resolve_label("Managed Disk"), Resolution::Fallback(T::GenericStorage));
        assert_eq!(resolve_label("Batch Pool"), Resolution::Fallback(T::GenericCompute));
    }

    #[test]
    fn test_unknown_label_is_unresolved() {
        assert_eq!(resolve_label("Unknown Azure Thing"), Resolution::Unresolved);
        assert_eq!(resolve_label(""), Resolution::Unresolved);
    }

    #[test]
    fn test_relationship_labels() {
        assert!(is_relationship_label("forwarding"));
        assert!(is_relationship_label("Routes Traffic To"));
        assert!(is_relationship_label("depends-on"));
        assert!(!is_relationship_label("Front Door"));
        assert!(!is_relationship_label(""));
    }

    #[test]
    fn test_relationship_entries_are_dropped_with_warning() {
        let graph = ArchitectureGraph {
            resources: vec![
                raw("App Service", Some("web")),
                raw("forwarding", Some("fd-to-web")),
                raw("", Some("ingress")),
                raw("Azure Firewall", Some("depends-on")),
            ],
            ..Default::default()
        };

        let normalized = normalize(&graph);

        assert_eq!(normalized.resources.len(), 1);
        assert_eq!(normalized.resources[0].id, "web");
        assert_eq!(
            normalized.warnings_of(WarningKind::RelationshipDiscarded).count(),
            3
        );
    }

    #[test]
    fn test_specific_type_keeps_resource_named_like_a_relationship() {
        let graph = ArchitectureGraph {
            resources: vec![
                raw("Application Insights", Some("monitoring")),
                raw("Storage Account", Some("ingress")),
            ],
            ..Default::default()
        };

        let normalized = normalize(&graph);

        let ids: Vec<_> = normalized.resources.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, vec!["monitoring", "ingress"]);
        assert_eq!(normalized.resources[0].canonical_type, T::ApplicationInsights);
        assert_eq!(
            normalized.warnings_of(WarningKind::RelationshipDiscarded).count(),
            0
        );
    }

    #[test]
    fn test_ids_fall_back_to_name_then_position() {
        let mut with_id = raw("Key Vault", Some("secrets"));
        with_id.id = Some("kv-01".into());
        let graph = ArchitectureGraph {
            resources: vec![with_id, raw("Key Vault", Some("vault")), raw("Key Vault", None)],
            ..Default::default()
        };

        let ids: Vec<_> = normalize(&graph)
            .resources
            .into_iter()
            .map(|node| node.id)
            .collect();
        assert_eq!(ids, vec!["kv-01", "vault", "resource-3"]);
    }

    #[test]
    fn test_duplicate_ids_are_renamed() {
        let graph = ArchitectureGraph {
            resources: vec![raw("VM", Some("app")), raw("VM", Some("app"))],
            ..Default::default()
        };

        let normalized = normalize(&graph);
        assert_eq!(normalized.resources[1].id, "app-2");
        assert_eq!(normalized.warnings_of(WarningKind::DuplicateId).count(), 1);
    }

    #[test]
    fn test_unknown_type_is_kept_with_warning() {
        let graph = ArchitectureGraph {
            resources: vec![raw("Unknown Azure Thing", Some("mystery"))],
            ..Default::default()
        };

        let normalized = normalize(&graph);
        assert_eq!(normalized.resources.len(), 1);
        assert_eq!(normalized.resources[0].canonical_type, T::Unknown);
        assert_eq!(normalized.warnings_of(WarningKind::Unresolved).count(), 1);
    }

    #[test]
    fn test_missing_type_classifies_by_name() {
        let graph = ArchitectureGraph {
            resources: vec![raw("", Some("Key Vault"))],
            ..Default::default()
        };

        let normalized = normalize(&graph);
        assert_eq!(normalized.resources[0].canonical_type, T::KeyVault);
        assert_eq!(normalized.warnings_of(WarningKind::MissingType).count(), 1);
    }

    #[test]
    fn test_function_app_detected_from_site_kind() {
        let mut site = raw("Microsoft.Web/sites", Some("jobs"));
        site.properties.insert("kind".into(), json!("functionapp,linux"));
        let graph = ArchitectureGraph {
            resources: vec![site],
            ..Default::default()
        };

        assert_eq!(normalize(&graph).resources[0].canonical_type, T::FunctionApp);
    }

    #[test]
    fn test_sku_taken_from_field_then_properties() {
        let mut explicit = raw("SQL Database", Some("orders"));
        explicit.sku = Some(SkuSpec::Name("S2".into()));
        let mut nested = raw("Storage Account", Some("assets"));
        nested
            .properties
            .insert("sku".into(), json!({ "name": "Standard_GRS" }));

        let graph = ArchitectureGraph {
            resources: vec![explicit, nested],
            ..Default::default()
        };
        let normalized = normalize(&graph);

        assert_eq!(normalized.resources[0].sku.as_deref(), Some("S2"));
        assert_eq!(normalized.resources[1].sku.as_deref(), Some("Standard_GRS"));
    }

    #[test]
    fn test_relationships_pass_through_untouched() {
        let graph = ArchitectureGraph {
            resources: vec![raw("Front Door", Some("fd")), raw("App Service", Some("web"))],
            relationships: vec![RelationshipEdge::new("fd", "web", "forwarding")],
            ..Default::default()
        };

        let normalized = normalize(&graph);
        assert_eq!(normalized.relationships, graph.relationships);
    }

    #[test]
    fn test_region_hint_prefers_metadata_then_location() {
        let mut located = raw("App Service", Some("web"));
        located.properties.insert("location".into(), json!("westeurope"));
        let graph = ArchitectureGraph {
            resources: vec![located],
            ..Default::default()
        };
        assert_eq!(normalize(&graph).region_hint.as_deref(), Some("westeurope"));

        let graph = ArchitectureGraph {
            metadata: Some(crate::models::GraphMetadata {
                region: Some("japaneast".into()),
            }),
            ..graph
        };
        assert_eq!(normalize(&graph).region_hint.as_deref(), Some("japaneast"));
    }

    #[test]
    fn test_region_hint_reads_region_property() {
        let mut regional = raw("App Service", Some("web"));
        regional.properties.insert("region".into(), json!(" uksouth "));
        let mut located = raw("Key Vault", Some("secrets"));
        located.properties.insert("location".into(), json!("westeurope"));

        let graph = ArchitectureGraph {
            resources: vec![regional.clone()],
            ..Default::default()
        };
        assert_eq!(normalize(&graph).region_hint.as_deref(), Some("uksouth"));

        // First resource that names either key wins.
        let graph = ArchitectureGraph {
            resources: vec![regional, located],
            ..Default::default()
        };
        assert_eq!(normalize(&graph).region_hint.as_deref(), Some("uksouth"));
    }
}
