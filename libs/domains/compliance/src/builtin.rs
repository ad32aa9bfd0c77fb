//! Built-in Azure best-practice rules.

use crate::condition::{Condition, FieldTest};
use crate::models::{RuleCategory, Severity};
use crate::rule::PolicyRule;
use domain_architecture::CanonicalResourceType as T;
use serde_json::json;

pub const BUILTIN_CATALOG_VERSION: &str = "azure-baseline-2024.06";

const WEB_WORKLOADS: &[T] = &[T::AppService, T::FunctionApp];
const COMPUTE_WORKLOADS: &[T] = &[
    T::AppService,
    T::FunctionApp,
    T::VirtualMachine,
    T::KubernetesService,
];

pub fn builtin_rules() -> Vec<PolicyRule> {
    let mut rules = Vec::new();
    rules.extend(security_rules());
    rules.extend(networking_rules());
    rules.extend(monitoring_rules());
    rules.extend(governance_rules());
    rules.extend(availability_rules());
    rules
}

fn security_rules() -> Vec<PolicyRule> {
    use RuleCategory::Security;

    vec![
        PolicyRule::resource(
            "AZ-KV-001",
            "Key Vault network access must be restricted",
            Security,
            Severity::Violation,
            &[T::KeyVault],
            Condition::AnyOf(vec![
                Condition::equals("publicNetworkAccess", "Disabled"),
                Condition::equals("networkAcls.defaultAction", "Deny"),
            ]),
        )
        .message("Key Vault '{{resource_name}}' accepts traffic from all networks")
        .remediation(
            "Set networkAcls.defaultAction to Deny on '{{resource_name}}' and allow trusted Azure services, or disable public network access and use a private endpoint",
        )
        .fix("networkAcls.defaultAction", "Deny")
        .fix("networkAcls.bypass", "AzureServices"),
        PolicyRule::resource(
            "AZ-KV-002",
            "Key Vault soft delete must stay enabled",
            Security,
            Severity::Warning,
            &[T::KeyVault],
            Condition::negate(Condition::equals("enableSoftDelete", false)),
        )
        .message("Soft delete is disabled on Key Vault '{{resource_name}}'")
        .remediation("Enable soft delete with a 90 day retention on '{{resource_name}}'")
        .fix("enableSoftDelete", true)
        .fix("softDeleteRetentionInDays", 90),
        PolicyRule::resource(
            "AZ-KV-003",
            "Key Vault purge protection should be enabled",
            Security,
            Severity::Warning,
            &[T::KeyVault],
            Condition::equals("enablePurgeProtection", true),
        )
        .message("Purge protection is not enabled on Key Vault '{{resource_name}}'")
        .remediation("Enable purge protection on '{{resource_name}}'")
        .fix("enablePurgeProtection", true),
        PolicyRule::resource(
            "AZ-ST-001",
            "Storage accounts must only accept HTTPS traffic",
            Security,
            Severity::Violation,
            &[T::StorageAccount],
            Condition::negate(Condition::equals("supportsHttpsTrafficOnly", false)),
        )
        .message("Storage account '{{resource_name}}' allows unencrypted HTTP traffic")
        .remediation("Set supportsHttpsTrafficOnly to true on '{{resource_name}}'")
        .fix("supportsHttpsTrafficOnly", true),
        PolicyRule::resource(
            "AZ-ST-002",
            "Storage accounts should require TLS 1.2",
            Security,
            Severity::Warning,
            &[T::StorageAccount],
            Condition::equals("minimumTlsVersion", "TLS1_2"),
        )
        .message("Storage account '{{resource_name}}' does not enforce TLS 1.2")
        .remediation("Set minimumTlsVersion to TLS1_2 on '{{resource_name}}'")
        .fix("minimumTlsVersion", "TLS1_2"),
        PolicyRule::resource(
            "AZ-ST-003",
            "Storage accounts must not allow public blob access",
            Security,
            Severity::Violation,
            &[T::StorageAccount],
            Condition::negate(Condition::equals("allowBlobPublicAccess", true)),
        )
        .message("Storage account '{{resource_name}}' allows anonymous public blob access")
        .remediation("Set allowBlobPublicAccess to false on '{{resource_name}}'")
        .fix("allowBlobPublicAccess", false),
        PolicyRule::resource(
            "AZ-APP-001",
            "Web apps must only be accessible over HTTPS",
            Security,
            Severity::Violation,
            WEB_WORKLOADS,
            Condition::equals("httpsOnly", true),
        )
        .message("'{{resource_name}}' accepts plain HTTP requests")
        .remediation("Set httpsOnly to true on '{{resource_name}}'")
        .fix("httpsOnly", true),
        PolicyRule::resource(
            "AZ-APP-002",
            "Web apps should use TLS 1.2 or later",
            Security,
            Severity::Warning,
            WEB_WORKLOADS,
            Condition::field("siteConfig.minTlsVersion", FieldTest::NotIn(vec![json!("1.0"), json!("1.1")])),
        )
        .message("'{{resource_name}}' allows TLS versions below 1.2")
        .remediation("Set siteConfig.minTlsVersion to 1.2 on '{{resource_name}}'")
        .fix("siteConfig.minTlsVersion", "1.2"),
        PolicyRule::resource(
            "AZ-APP-003",
            "Web apps should disable plain FTP",
            Security,
            Severity::Warning,
            WEB_WORKLOADS,
            Condition::one_of("siteConfig.ftpsState", ["Disabled", "FtpsOnly"]),
        )
        .message("'{{resource_name}}' allows unencrypted FTP deployments")
        .remediation("Set siteConfig.ftpsState to Disabled on '{{resource_name}}'")
        .fix("siteConfig.ftpsState", "Disabled"),
        PolicyRule::resource(
            "AZ-ID-001",
            "Workloads should use a managed identity",
            Security,
            Severity::Warning,
            COMPUTE_WORKLOADS,
            Condition::exists("identity.type"),
        )
        .message("'{{resource_name}}' has no managed identity")
        .remediation("Assign a system-assigned managed identity to '{{resource_name}}' and grant it least-privilege roles")
        .fix("identity.type", "SystemAssigned"),
        PolicyRule::resource(
            "AZ-SQL-001",
            "SQL databases must keep transparent data encryption on",
            Security,
            Severity::Violation,
            &[T::SqlDatabase],
            Condition::negate(Condition::equals("transparentDataEncryption.state", "Disabled")),
        )
        .message("Transparent data encryption is disabled on '{{resource_name}}'")
        .remediation("Enable transparent data encryption on '{{resource_name}}'")
        .fix("transparentDataEncryption.state", "Enabled"),
        PolicyRule::resource(
            "AZ-SQL-002",
            "SQL databases should not be publicly reachable",
            Security,
            Severity::Warning,
            &[T::SqlDatabase],
            Condition::equals("publicNetworkAccess", "Disabled"),
        )
        .message("SQL database '{{resource_name}}' is reachable from public networks")
        .remediation("Disable public network access on '{{resource_name}}' and connect through a private endpoint")
        .fix("publicNetworkAccess", "Disabled"),
        PolicyRule::resource(
            "AZ-SQL-003",
            "SQL servers should require TLS 1.2",
            Security,
            Severity::Warning,
            &[T::SqlDatabase],
            Condition::field("minimalTlsVersion", FieldTest::NotIn(vec![json!("1.0"), json!("1.1")])),
        )
        .message("SQL database '{{resource_name}}' accepts TLS versions below 1.2")
        .remediation("Set minimalTlsVersion to 1.2 on '{{resource_name}}'")
        .fix("minimalTlsVersion", "1.2"),
        PolicyRule::resource(
            "AZ-VM-001",
            "Virtual machine disks should be encrypted",
            Security,
            Severity::Warning,
            &[T::VirtualMachine],
            Condition::AnyOf(vec![
                Condition::equals("securityProfile.encryptionAtHost", true),
                Condition::exists("storageProfile.osDisk.managedDisk.diskEncryptionSet.id"),
            ]),
        )
        .message("Disks of '{{resource_name}}' are not encrypted at host or with a disk encryption set")
        .remediation("Enable encryption at host on '{{resource_name}}'")
        .fix("securityProfile.encryptionAtHost", true),
        PolicyRule::companion(
            "AZ-SEC-001",
            "Compute workloads should keep secrets in Key Vault",
            Security,
            Severity::Warning,
            COMPUTE_WORKLOADS,
            &[T::KeyVault],
        )
        .message("No Key Vault found for {{affected_resources}}")
        .remediation("Add a Key Vault and move connection strings and keys out of application settings"),
    ]
}

fn networking_rules() -> Vec<PolicyRule> {
    use RuleCategory::Networking;

    vec![
        PolicyRule::companion(
            "AZ-NET-001",
            "Public endpoints should sit behind Front Door or Application Gateway",
            Networking,
            Severity::Warning,
            &[T::AppService, T::FunctionApp, T::ApiManagement],
            &[T::FrontDoor, T::ApplicationGateway],
        )
        .message("{{affected_resources}} exposed to the internet without a web application firewall in front")
        .remediation("Route public traffic through Azure Front Door or an Application Gateway with WAF enabled"),
        PolicyRule::companion(
            "AZ-NET-002",
            "Virtual networks should be protected by a network security group",
            Networking,
            Severity::Warning,
            &[T::VirtualMachine, T::VirtualNetwork, T::Subnet],
            &[T::NetworkSecurityGroup],
        )
        .message("No network security group protects {{affected_resources}}")
        .remediation("Add a network security group that allows only required inbound ports and denies the rest"),
        PolicyRule::resource(
            "AZ-AGW-001",
            "Application Gateway should enable WAF",
            Networking,
            Severity::Warning,
            &[T::ApplicationGateway],
            Condition::AnyOf(vec![
                Condition::like("sku", "WAF*"),
                Condition::equals("webApplicationFirewallConfiguration.enabled", true),
                Condition::exists("firewallPolicy.id"),
            ]),
        )
        .message("Application Gateway '{{resource_name}}' has no web application firewall")
        .remediation("Use a WAF_v2 SKU on '{{resource_name}}' or attach a firewall policy")
        .fix("webApplicationFirewallConfiguration.enabled", true),
        PolicyRule::resource(
            "AZ-RED-001",
            "Redis must not expose the non-TLS port",
            Networking,
            Severity::Violation,
            &[T::RedisCache],
            Condition::negate(Condition::equals("enableNonSslPort", true)),
        )
        .message("Redis cache '{{resource_name}}' exposes the non-TLS port 6379")
        .remediation("Set enableNonSslPort to false on '{{resource_name}}'")
        .fix("enableNonSslPort", false),
        PolicyRule::resource(
            "AZ-COS-001",
            "Cosmos DB should restrict network access",
            Networking,
            Severity::Warning,
            &[T::CosmosDb],
            Condition::AnyOf(vec![
                Condition::equals("publicNetworkAccess", "Disabled"),
                Condition::equals("isVirtualNetworkFilterEnabled", true),
                Condition::exists("ipRules[*].ipAddressOrRange"),
            ]),
        )
        .message("Cosmos DB account '{{resource_name}}' accepts traffic from all networks")
        .remediation("Enable virtual network filtering or IP rules on '{{resource_name}}'")
        .fix("isVirtualNetworkFilterEnabled", true),
    ]
}

fn monitoring_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule::companion(
            "AZ-MON-001",
            "Workloads should send telemetry to Application Insights or Log Analytics",
            RuleCategory::Monitoring,
            Severity::Warning,
            &[
                T::AppService,
                T::FunctionApp,
                T::VirtualMachine,
                T::KubernetesService,
                T::ApiManagement,
            ],
            &[T::ApplicationInsights, T::LogAnalytics],
        )
        .message("No monitoring workspace collects telemetry from {{affected_resources}}")
        .remediation("Add Application Insights or a Log Analytics workspace and enable diagnostic settings"),
    ]
}

fn governance_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule::resource(
            "AZ-GOV-001",
            "Resources should carry ownership tags",
            RuleCategory::Governance,
            Severity::Info,
            &[],
            Condition::exists("tags"),
        )
        .message("'{{resource_name}}' has no tags")
        .remediation("Tag '{{resource_name}}' with at least environment and owner")
        .fix("tags.environment", "{{environment}}")
        .fix("tags.managedBy", "architecture-review"),
    ]
}

fn availability_rules() -> Vec<PolicyRule> {
    use RuleCategory::Availability;

    vec![
        PolicyRule::resource(
            "AZ-AVL-001",
            "Storage should use zone- or geo-redundant replication",
            Availability,
            Severity::Info,
            &[T::StorageAccount],
            Condition::negate(Condition::like("sku", "*LRS")),
        )
        .message("Storage account '{{resource_name}}' keeps all copies in one datacenter")
        .remediation("Use ZRS or GRS replication for '{{resource_name}}' in production"),
        PolicyRule::resource(
            "AZ-AVL-002",
            "SQL databases should be zone redundant",
            Availability,
            Severity::Info,
            &[T::SqlDatabase],
            Condition::equals("zoneRedundant", true),
        )
        .message("SQL database '{{resource_name}}' is not zone redundant")
        .remediation("Enable zone redundancy on '{{resource_name}}' (Premium or Business Critical tiers)")
        .fix("zoneRedundant", true),
    ]
}
