use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Canonical resource type every analyzer label is resolved to.
///
/// Both catalogs are keyed by this enum. `Unknown` is kept in the graph so it
/// can be reported, but neither catalog has an entry for it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CanonicalResourceType {
    VirtualMachine,
    AppService,
    FunctionApp,
    AppServicePlan,
    SqlDatabase,
    CosmosDb,
    RedisCache,
    StorageAccount,
    KeyVault,
    ApplicationInsights,
    LogAnalytics,
    FrontDoor,
    ApplicationGateway,
    LoadBalancer,
    VirtualNetwork,
    Subnet,
    NetworkSecurityGroup,
    PublicIp,
    ContainerRegistry,
    KubernetesService,
    ServiceBus,
    EventHub,
    ApiManagement,
    Cdn,
    TrafficManager,
    RecoveryServicesVault,
    GenericCompute,
    GenericStorage,
    GenericNetwork,
    Unknown,
}

impl CanonicalResourceType {
    /// Azure Resource Manager type name, or `None` for buckets and `Unknown`.
    pub fn arm_type(&self) -> Option<&'static str> {
        use CanonicalResourceType::*;
        let arm = match self {
            VirtualMachine => "Microsoft.Compute/virtualMachines",
            AppService | FunctionApp => "Microsoft.Web/sites",
            AppServicePlan => "Microsoft.Web/serverfarms",
            SqlDatabase => "Microsoft.Sql/servers/databases",
            CosmosDb => "Microsoft.DocumentDB/databaseAccounts",
            RedisCache => "Microsoft.Cache/redis",
            StorageAccount => "Microsoft.Storage/storageAccounts",
            KeyVault => "Microsoft.KeyVault/vaults",
            ApplicationInsights => "Microsoft.Insights/components",
            LogAnalytics => "Microsoft.OperationalInsights/workspaces",
            FrontDoor => "Microsoft.Network/frontDoors",
            ApplicationGateway => "Microsoft.Network/applicationGateways",
            LoadBalancer => "Microsoft.Network/loadBalancers",
            VirtualNetwork => "Microsoft.Network/virtualNetworks",
            Subnet => "Microsoft.Network/virtualNetworks/subnets",
            NetworkSecurityGroup => "Microsoft.Network/networkSecurityGroups",
            PublicIp => "Microsoft.Network/publicIPAddresses",
            ContainerRegistry => "Microsoft.ContainerRegistry/registries",
            KubernetesService => "Microsoft.ContainerService/managedClusters",
            ServiceBus => "Microsoft.ServiceBus/namespaces",
            EventHub => "Microsoft.EventHub/namespaces",
            ApiManagement => "Microsoft.ApiManagement/service",
            Cdn => "Microsoft.Cdn/profiles",
            TrafficManager => "Microsoft.Network/trafficManagerProfiles",
            RecoveryServicesVault => "Microsoft.RecoveryServices/vaults",
            GenericCompute | GenericStorage | GenericNetwork | Unknown => return None,
        };
        Some(arm)
    }

    /// Fallback buckets used when only a broad family could be inferred.
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            CanonicalResourceType::GenericCompute
                | CanonicalResourceType::GenericStorage
                | CanonicalResourceType::GenericNetwork
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CanonicalResourceType::Unknown)
    }

    /// Types reachable from the internet without an extra hop.
    pub fn is_public_endpoint(&self) -> bool {
        matches!(
            self,
            CanonicalResourceType::AppService
                | CanonicalResourceType::FunctionApp
                | CanonicalResourceType::ApiManagement
        )
    }
}
