use domain_architecture::{normalize, CanonicalResourceType, WarningKind};
use test_utils::{fixtures, GraphBuilder};

#[test]
fn test_forwarding_edge_never_becomes_a_resource() {
    let normalized = normalize(&fixtures::forwarding_graph());

    let ids: Vec<_> = normalized.resources.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["edge", "web"]);
    assert_eq!(normalized.relationships.len(), 1);
    assert_eq!(
        normalized
            .warnings_of(WarningKind::RelationshipDiscarded)
            .count(),
        1
    );
}

#[test]
fn test_web_app_fixture_resolves_every_type() {
    let normalized = normalize(&fixtures::web_app_graph());

    let types: Vec<_> = normalized
        .resources
        .iter()
        .map(|node| node.canonical_type)
        .collect();
    assert_eq!(
        types,
        vec![
            CanonicalResourceType::AppService,
            CanonicalResourceType::SqlDatabase,
            CanonicalResourceType::StorageAccount,
        ]
    );
    assert_eq!(normalized.resource("orders-db").and_then(|n| n.sku.as_deref()), Some("S2"));
}

#[test]
fn test_unknown_thing_is_retained_and_warned() {
    let normalized = normalize(&fixtures::unknown_thing_graph());

    assert_eq!(normalized.resources.len(), 1);
    assert!(normalized.resources[0].canonical_type.is_unknown());
    assert_eq!(normalized.warnings.len(), 1);
    assert_eq!(normalized.warnings[0].node_id, "mystery");
}

#[test]
fn test_normalize_is_deterministic() {
    let graph = GraphBuilder::new()
        .resource("Azure Firewall", "fw")
        .resource("Log Analytics", "logs")
        .resource("AKS", "cluster")
        .region("uksouth")
        .build();

    assert_eq!(normalize(&graph), normalize(&graph));
    assert_eq!(normalize(&graph).region_hint.as_deref(), Some("uksouth"));
}

#[test]
fn test_analyzer_json_is_accepted_as_is() {
    let graph = serde_json::from_str(
        r#"{
            "components": [
                { "name": "gw", "type": "Application Gateway", "sku": { "name": "WAF_Medium" } },
                { "name": "api", "type": "Microsoft.Web/sites", "properties": { "httpsOnly": true } }
            ],
            "relationships": [ { "source": "gw", "target": "api", "kind": "routes_traffic_to" } ],
            "metadata": { "region": "northeurope" }
        }"#,
    )
    .unwrap();

    let normalized = normalize(&graph);
    assert_eq!(normalized.resources[0].sku.as_deref(), Some("WAF_Medium"));
    assert_eq!(
        normalized.resources[1].canonical_type,
        CanonicalResourceType::AppService
    );
    assert_eq!(normalized.region_hint.as_deref(), Some("northeurope"));
}
