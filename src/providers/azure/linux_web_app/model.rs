use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_IP_RESTRICTION_PRIORITY: i64 = 65000;
pub const DEFAULT_TOKEN_REFRESH_EXTENSION_HOURS: f64 = 72.0;

/// Configuration of one `azurerm_linux_web_app`, as written by the user and as reconstructed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinuxWebAppModel {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub service_plan_id: String,
    pub app_settings: BTreeMap<String, String>,
    pub enabled: bool,
    pub https_only: bool,
    pub client_affinity_enabled: bool,
    pub site_config: Option<SiteConfigModel>,
    pub logs: Option<LogsModel>,
    pub auth_settings: Option<AuthSettingsModel>,
    pub backup: Option<BackupModel>,
    pub tags: BTreeMap<String, String>,

    // Computed
    pub id: String,
    pub kind: String,
    pub default_hostname: String,
    pub outbound_ip_addresses: String,
}

impl Default for LinuxWebAppModel {
    fn default() -> Self {
        Self {
            name: String::new(),
            resource_group_name: String::new(),
            location: String::new(),
            service_plan_id: String::new(),
            app_settings: BTreeMap::new(),
            enabled: true,
            https_only: false,
            client_affinity_enabled: false,
            site_config: None,
            logs: None,
            auth_settings: None,
            backup: None,
            tags: BTreeMap::new(),
            id: String::new(),
            kind: String::new(),
            default_hostname: String::new(),
            outbound_ip_addresses: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfigModel {
    pub always_on: bool,
    pub app_command_line: String,
    pub load_balancing_mode: String,
    pub ftps_state: String,
    pub http2_enabled: bool,
    pub minimum_tls_version: String,
    pub health_check_path: String,
    pub websockets_enabled: bool,
    pub application_stack: Option<ApplicationStackModel>,
    pub ip_restriction: Vec<IpRestrictionModel>,
    pub auto_heal: bool,
    pub auto_heal_setting: Option<AutoHealSettingModel>,

    // Computed
    pub linux_fx_version: String,
    pub detailed_error_logging: bool,
    pub virtual_application: Vec<VirtualApplicationModel>,
}

impl Default for SiteConfigModel {
    fn default() -> Self {
        Self {
            always_on: true,
            app_command_line: String::new(),
            load_balancing_mode: "LeastRequests".to_string(),
            ftps_state: "Disabled".to_string(),
            http2_enabled: false,
            minimum_tls_version: "1.2".to_string(),
            health_check_path: String::new(),
            websockets_enabled: false,
            application_stack: None,
            ip_restriction: Vec::new(),
            auto_heal: false,
            auto_heal_setting: None,
            linux_fx_version: String::new(),
            detailed_error_logging: false,
            virtual_application: Vec::new(),
        }
    }
}

/// At most one runtime may be set; Java uses all three `java_*` fields together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationStackModel {
    pub docker_image: String,
    pub docker_image_tag: String,
    pub dotnet_framework_version: String,
    pub java_server: String,
    pub java_server_version: String,
    pub java_version: String,
    pub node_version: String,
    pub php_version: String,
    pub python_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpRestrictionModel {
    pub ip_address: String,
    pub service_tag: String,
    pub virtual_network_subnet_id: String,
    pub name: String,
    pub priority: i64,
    pub action: String,
    pub headers: Option<IpRestrictionHeadersModel>,
}

impl Default for IpRestrictionModel {
    fn default() -> Self {
        Self {
            ip_address: String::new(),
            service_tag: String::new(),
            virtual_network_subnet_id: String::new(),
            name: String::new(),
            priority: DEFAULT_IP_RESTRICTION_PRIORITY,
            action: "Allow".to_string(),
            headers: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpRestrictionHeadersModel {
    pub x_azure_fdid: Vec<String>,
    pub x_fd_health_probe: Vec<String>,
    pub x_forwarded_for: Vec<String>,
    pub x_forwarded_host: Vec<String>,
}

impl IpRestrictionHeadersModel {
    pub fn is_empty(&self) -> bool {
        self.x_azure_fdid.is_empty()
            && self.x_fd_health_probe.is_empty()
            && self.x_forwarded_for.is_empty()
            && self.x_forwarded_host.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoHealSettingModel {
    pub trigger: Option<AutoHealTriggerModel>,
    pub action: Option<AutoHealActionModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoHealTriggerModel {
    pub requests: Option<RequestsTriggerModel>,
    pub slow_request: Option<SlowRequestTriggerModel>,
    pub status_code: Vec<StatusCodeTriggerModel>,
}

impl AutoHealTriggerModel {
    /// `status_code` is a set; keep it in one order so config and remote compare equal.
    pub fn sort_status_codes(&mut self) {
        self.status_code.sort_by(|a, b| {
            a.status_code_range
                .cmp(&b.status_code_range)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.sub_status.cmp(&b.sub_status))
                .then_with(|| a.win32_status.cmp(&b.win32_status))
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestsTriggerModel {
    pub count: i64,
    pub interval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowRequestTriggerModel {
    pub time_taken: String,
    pub interval: String,
    pub count: i64,
    pub path: String,
}

/// `status_code_range` is either a single code (`"500"`) or an inclusive range (`"400-404"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCodeTriggerModel {
    pub status_code_range: String,
    pub sub_status: Option<i64>,
    pub win32_status: Option<i64>,
    pub count: i64,
    pub interval: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoHealActionModel {
    pub action_type: String,
    pub minimum_process_execution_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualApplicationModel {
    pub virtual_path: String,
    pub physical_path: String,
    pub preload: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsModel {
    pub detailed_error_messages: bool,
    pub failed_request_tracing: bool,
    pub application_logs: Option<ApplicationLogsModel>,
    pub http_logs: Option<HttpLogsModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationLogsModel {
    pub file_system_level: String,
    pub azure_blob_storage: Option<ApplicationLogsBlobModel>,
}

impl Default for ApplicationLogsModel {
    fn default() -> Self {
        Self {
            file_system_level: "Off".to_string(),
            azure_blob_storage: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationLogsBlobModel {
    pub level: String,
    pub sas_url: String,
    pub retention_in_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpLogsModel {
    pub file_system: Option<HttpLogsFileSystemModel>,
    pub azure_blob_storage: Option<HttpLogsBlobModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpLogsFileSystemModel {
    pub retention_in_days: i64,
    pub retention_in_mb: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpLogsBlobModel {
    pub sas_url: String,
    pub retention_in_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettingsModel {
    pub enabled: bool,
    pub additional_login_parameters: BTreeMap<String, String>,
    pub allowed_external_redirect_urls: Vec<String>,
    pub default_provider: String,
    pub issuer: String,
    pub token_refresh_extension_hours: f64,
    pub token_store_enabled: bool,
    pub unauthenticated_client_action: String,
    pub active_directory: Option<ActiveDirectoryModel>,
    pub facebook: Option<FacebookModel>,
    pub google: Option<OAuthProviderModel>,
    pub microsoft: Option<OAuthProviderModel>,
    pub twitter: Option<TwitterModel>,
}

impl Default for AuthSettingsModel {
    fn default() -> Self {
        Self {
            enabled: false,
            additional_login_parameters: BTreeMap::new(),
            allowed_external_redirect_urls: Vec::new(),
            default_provider: String::new(),
            issuer: String::new(),
            token_refresh_extension_hours: DEFAULT_TOKEN_REFRESH_EXTENSION_HOURS,
            token_store_enabled: false,
            unauthenticated_client_action: String::new(),
            active_directory: None,
            facebook: None,
            google: None,
            microsoft: None,
            twitter: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveDirectoryModel {
    pub client_id: String,
    pub client_secret: String,
    pub allowed_audiences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacebookModel {
    pub app_id: String,
    pub app_secret: String,
    pub oauth_scopes: Vec<String>,
}

/// Shared shape of the Google and Microsoft account providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthProviderModel {
    pub client_id: String,
    pub client_secret: String,
    pub oauth_scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterModel {
    pub consumer_key: String,
    pub consumer_secret: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupModel {
    pub name: String,
    pub storage_account_url: String,
    pub enabled: bool,
    pub schedule: BackupScheduleModel,
}

impl Default for BackupModel {
    fn default() -> Self {
        Self {
            name: String::new(),
            storage_account_url: String::new(),
            enabled: true,
            schedule: BackupScheduleModel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupScheduleModel {
    pub frequency_interval: i64,
    pub frequency_unit: String,
    pub keep_at_least_one_backup: bool,
    pub retention_period_days: i64,
    pub start_time: String,
}

impl Default for BackupScheduleModel {
    fn default() -> Self {
        Self {
            frequency_interval: 0,
            frequency_unit: String::new(),
            keep_at_least_one_backup: false,
            retention_period_days: 30,
            start_time: String::new(),
        }
    }
}

/// Lowercase with spaces removed, e.g. `West Europe` becomes `westeurope`.
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
