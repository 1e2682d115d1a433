//! Conversion between the flat configuration model and the ARM request/response bodies.
//!
//! `expand_*` builds request bodies from configuration; `flatten_*` rebuilds configuration from
//! what ARM reports, so that a read immediately after a write yields the configuration back.

use std::collections::BTreeMap;

use super::model::{
    ActiveDirectoryModel, ApplicationLogsBlobModel, ApplicationLogsModel, ApplicationStackModel,
    AuthSettingsModel, AutoHealActionModel, AutoHealSettingModel, AutoHealTriggerModel,
    BackupModel, BackupScheduleModel, DEFAULT_TOKEN_REFRESH_EXTENSION_HOURS, FacebookModel,
    HttpLogsBlobModel, HttpLogsFileSystemModel, HttpLogsModel, IpRestrictionHeadersModel,
    IpRestrictionModel, LogsModel, OAuthProviderModel, RequestsTriggerModel, SiteConfigModel,
    SlowRequestTriggerModel, StatusCodeTriggerModel, TwitterModel, VirtualApplicationModel,
};
use crate::providers::azure::AzureError;
use crate::providers::azure::types::{
    ApplicationLogsConfig, AutoHealActions, AutoHealRules, AutoHealTriggers,
    AzureBlobStorageApplicationLogsConfig, AzureBlobStorageHttpLogsConfig, BackupRequest,
    BackupSchedule, EnabledConfig, FileSystemApplicationLogsConfig, FileSystemHttpLogsConfig,
    HttpLogsConfig, IpSecurityRestriction, RequestsBasedTrigger, SiteAuthSettings, SiteConfig,
    SiteLogsConfig, SlowRequestsBasedTrigger, StatusCodesBasedTrigger,
    StatusCodesRangeBasedTrigger,
};

const HEADER_AZURE_FDID: &str = "X-Azure-FDID";
const HEADER_FD_HEALTH_PROBE: &str = "X-FD-HealthProbe";
const HEADER_FORWARDED_FOR: &str = "X-Forwarded-For";
const HEADER_FORWARDED_HOST: &str = "X-Forwarded-Host";

const DOCKER_PREFIX: &str = "DOCKER";
const DOTNET_PREFIX: &str = "DOTNETCORE";
const NODE_PREFIX: &str = "NODE";
const PHP_PREFIX: &str = "PHP";
const PYTHON_PREFIX: &str = "PYTHON";

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn non_empty_vec(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

fn or_configured(remote: Option<&String>, configured: Option<&str>) -> String {
    match remote.filter(|s| !s.is_empty()) {
        Some(value) => value.clone(),
        None => configured.unwrap_or_default().to_string(),
    }
}

pub fn expand_site_config(model: &SiteConfigModel) -> Result<SiteConfig, AzureError> {
    let linux_fx_version = match &model.application_stack {
        Some(stack) => expand_linux_fx_version(stack)?,
        None => String::new(),
    };

    let auto_heal_rules = match &model.auto_heal_setting {
        Some(setting) => Some(expand_auto_heal(setting)?),
        None => None,
    };

    if model.auto_heal && auto_heal_rules.is_none() {
        return Err(AzureError::validation(
            "site_config.auto_heal_setting",
            "auto_heal_setting must be set when auto_heal is enabled",
        ));
    }

    Ok(SiteConfig {
        always_on: Some(model.always_on),
        linux_fx_version: Some(linux_fx_version),
        app_command_line: non_empty(&model.app_command_line),
        load_balancing: non_empty(&model.load_balancing_mode),
        ftps_state: non_empty(&model.ftps_state),
        http20_enabled: Some(model.http2_enabled),
        min_tls_version: non_empty(&model.minimum_tls_version),
        health_check_path: non_empty(&model.health_check_path),
        web_sockets_enabled: Some(model.websockets_enabled),
        ip_security_restrictions: Some(expand_ip_restrictions(&model.ip_restriction)?),
        auto_heal_enabled: Some(model.auto_heal),
        auto_heal_rules,
        ..Default::default()
    })
}

pub fn flatten_site_config(config: &SiteConfig) -> SiteConfigModel {
    let defaults = SiteConfigModel::default();
    let linux_fx_version = config.linux_fx_version.clone().unwrap_or_default();

    SiteConfigModel {
        always_on: config.always_on.unwrap_or(defaults.always_on),
        app_command_line: config.app_command_line.clone().unwrap_or_default(),
        load_balancing_mode: config
            .load_balancing
            .clone()
            .unwrap_or(defaults.load_balancing_mode),
        ftps_state: config.ftps_state.clone().unwrap_or(defaults.ftps_state),
        http2_enabled: config.http20_enabled.unwrap_or_default(),
        minimum_tls_version: config
            .min_tls_version
            .clone()
            .unwrap_or(defaults.minimum_tls_version),
        health_check_path: config.health_check_path.clone().unwrap_or_default(),
        websockets_enabled: config.web_sockets_enabled.unwrap_or_default(),
        application_stack: flatten_application_stack(&linux_fx_version),
        ip_restriction: flatten_ip_restrictions(
            config.ip_security_restrictions.as_deref().unwrap_or_default(),
        ),
        auto_heal: config.auto_heal_enabled.unwrap_or_default(),
        auto_heal_setting: config.auto_heal_rules.as_ref().and_then(flatten_auto_heal),
        linux_fx_version,
        detailed_error_logging: config.detailed_error_logging_enabled.unwrap_or_default(),
        virtual_application: config
            .virtual_applications
            .iter()
            .flatten()
            .map(|app| VirtualApplicationModel {
                virtual_path: app.virtual_path.clone().unwrap_or_default(),
                physical_path: app.physical_path.clone().unwrap_or_default(),
                preload: app.preload_enabled.unwrap_or_default(),
            })
            .collect(),
    }
}

/// Encodes the application stack as `RUNTIME|version`.
///
/// Java is `SERVER|serverVersion-javaVersion`, or `SERVER|javaVersion` when no server version
/// is given (e.g. `TOMCAT|9.0-java11`, `JAVA|11.0.9`). Docker is `DOCKER|image:tag`.
pub fn expand_linux_fx_version(stack: &ApplicationStackModel) -> Result<String, AzureError> {
    let java_set = !stack.java_server.is_empty()
        || !stack.java_version.is_empty()
        || !stack.java_server_version.is_empty();

    let set_count = [
        !stack.docker_image.is_empty(),
        !stack.dotnet_framework_version.is_empty(),
        java_set,
        !stack.node_version.is_empty(),
        !stack.php_version.is_empty(),
        !stack.python_version.is_empty(),
    ]
    .iter()
    .filter(|set| **set)
    .count();

    if set_count > 1 {
        return Err(AzureError::validation(
            "site_config.application_stack",
            "only one of docker_image, dotnet_framework_version, java_*, node_version, php_version or python_version may be set",
        ));
    }

    if !stack.docker_image.is_empty() {
        return Ok(if stack.docker_image_tag.is_empty() {
            format!("{}|{}", DOCKER_PREFIX, stack.docker_image)
        } else {
            format!(
                "{}|{}:{}",
                DOCKER_PREFIX, stack.docker_image, stack.docker_image_tag
            )
        });
    }
    if !stack.docker_image_tag.is_empty() {
        return Err(AzureError::validation(
            "site_config.application_stack.docker_image_tag",
            "docker_image_tag requires docker_image",
        ));
    }

    if java_set {
        if stack.java_server.is_empty() || stack.java_version.is_empty() {
            return Err(AzureError::validation(
                "site_config.application_stack.java_server",
                "java_server and java_version must be set together",
            ));
        }
        return Ok(if stack.java_server_version.is_empty() {
            format!("{}|{}", stack.java_server, stack.java_version)
        } else {
            format!(
                "{}|{}-{}",
                stack.java_server, stack.java_server_version, stack.java_version
            )
        });
    }

    let (prefix, version) = if !stack.dotnet_framework_version.is_empty() {
        (DOTNET_PREFIX, &stack.dotnet_framework_version)
    } else if !stack.node_version.is_empty() {
        (NODE_PREFIX, &stack.node_version)
    } else if !stack.php_version.is_empty() {
        (PHP_PREFIX, &stack.php_version)
    } else if !stack.python_version.is_empty() {
        (PYTHON_PREFIX, &stack.python_version)
    } else {
        return Ok(String::new());
    };

    Ok(format!("{}|{}", prefix, version))
}

pub fn flatten_application_stack(linux_fx_version: &str) -> Option<ApplicationStackModel> {
    let (runtime, version) = linux_fx_version.split_once('|')?;
    if version.is_empty() {
        return None;
    }

    let mut stack = ApplicationStackModel::default();
    match runtime.to_ascii_uppercase().as_str() {
        DOCKER_PREFIX => match version.rsplit_once(':') {
            Some((image, tag)) if !tag.contains('/') => {
                stack.docker_image = image.to_string();
                stack.docker_image_tag = tag.to_string();
            }
            _ => stack.docker_image = version.to_string(),
        },
        DOTNET_PREFIX => stack.dotnet_framework_version = version.to_string(),
        NODE_PREFIX => stack.node_version = version.to_string(),
        PHP_PREFIX => stack.php_version = version.to_string(),
        PYTHON_PREFIX => stack.python_version = version.to_string(),
        _ => {
            stack.java_server = runtime.to_string();
            match version.rsplit_once('-') {
                Some((server_version, java_version))
                    if java_version.starts_with("java") || java_version.starts_with("jre") =>
                {
                    stack.java_server_version = server_version.to_string();
                    stack.java_version = java_version.to_string();
                }
                _ => stack.java_version = version.to_string(),
            }
        }
    }
    Some(stack)
}

pub fn expand_ip_restrictions(
    restrictions: &[IpRestrictionModel],
) -> Result<Vec<IpSecurityRestriction>, AzureError> {
    restrictions
        .iter()
        .map(|r| {
            let sources = [
                !r.ip_address.is_empty(),
                !r.service_tag.is_empty(),
                !r.virtual_network_subnet_id.is_empty(),
            ]
            .iter()
            .filter(|set| **set)
            .count();
            if sources != 1 {
                return Err(AzureError::validation(
                    "site_config.ip_restriction",
                    "exactly one of ip_address, service_tag or virtual_network_subnet_id must be set",
                ));
            }

            let (ip_address, tag) = if !r.service_tag.is_empty() {
                (Some(r.service_tag.clone()), Some("ServiceTag".to_string()))
            } else {
                (non_empty(&r.ip_address), None)
            };

            Ok(IpSecurityRestriction {
                ip_address,
                vnet_subnet_resource_id: non_empty(&r.virtual_network_subnet_id),
                tag,
                action: non_empty(&r.action),
                priority: Some(r.priority),
                name: non_empty(&r.name),
                headers: r.headers.as_ref().and_then(expand_ip_restriction_headers),
            })
        })
        .collect()
}

fn expand_ip_restriction_headers(
    headers: &IpRestrictionHeadersModel,
) -> Option<BTreeMap<String, Vec<String>>> {
    let mut expanded = BTreeMap::new();
    for (name, values) in [
        (HEADER_AZURE_FDID, &headers.x_azure_fdid),
        (HEADER_FD_HEALTH_PROBE, &headers.x_fd_health_probe),
        (HEADER_FORWARDED_FOR, &headers.x_forwarded_for),
        (HEADER_FORWARDED_HOST, &headers.x_forwarded_host),
    ] {
        if !values.is_empty() {
            expanded.insert(name.to_string(), values.clone());
        }
    }
    if expanded.is_empty() { None } else { Some(expanded) }
}

/// Drops the platform-managed `Allow all` rule that ARM reports when no rules are configured.
pub fn flatten_ip_restrictions(restrictions: &[IpSecurityRestriction]) -> Vec<IpRestrictionModel> {
    restrictions
        .iter()
        .filter(|r| {
            !(r.name.as_deref() == Some("Allow all") && r.ip_address.as_deref() == Some("Any"))
        })
        .map(|r| {
            let is_service_tag = r.tag.as_deref() == Some("ServiceTag");
            let address = r.ip_address.clone().unwrap_or_default();
            IpRestrictionModel {
                ip_address: if is_service_tag { String::new() } else { address.clone() },
                service_tag: if is_service_tag { address } else { String::new() },
                virtual_network_subnet_id: r.vnet_subnet_resource_id.clone().unwrap_or_default(),
                name: r.name.clone().unwrap_or_default(),
                priority: r
                    .priority
                    .unwrap_or(super::model::DEFAULT_IP_RESTRICTION_PRIORITY),
                action: r.action.clone().unwrap_or_else(|| "Allow".to_string()),
                headers: r.headers.as_ref().and_then(flatten_ip_restriction_headers),
            }
        })
        .collect()
}

fn flatten_ip_restriction_headers(
    headers: &BTreeMap<String, Vec<String>>,
) -> Option<IpRestrictionHeadersModel> {
    let mut flattened = IpRestrictionHeadersModel::default();
    for (name, values) in headers {
        let target = if name.eq_ignore_ascii_case(HEADER_AZURE_FDID) {
            &mut flattened.x_azure_fdid
        } else if name.eq_ignore_ascii_case(HEADER_FD_HEALTH_PROBE) {
            &mut flattened.x_fd_health_probe
        } else if name.eq_ignore_ascii_case(HEADER_FORWARDED_FOR) {
            &mut flattened.x_forwarded_for
        } else if name.eq_ignore_ascii_case(HEADER_FORWARDED_HOST) {
            &mut flattened.x_forwarded_host
        } else {
            tracing::debug!(header = %name, "ignoring unsupported ip restriction header");
            continue;
        };
        target.extend(values.iter().cloned());
    }
    if flattened.is_empty() { None } else { Some(flattened) }
}

/// A `status_code_range` containing `-` becomes a `statusCodesRange` trigger; anything else
/// must be a single numeric status.
pub fn expand_auto_heal(setting: &AutoHealSettingModel) -> Result<AutoHealRules, AzureError> {
    let triggers = match &setting.trigger {
        Some(trigger) => {
            let mut status_codes = Vec::new();
            let mut status_codes_range = Vec::new();

            for status_code in &trigger.status_code {
                if status_code.status_code_range.contains('-') {
                    status_codes_range.push(StatusCodesRangeBasedTrigger {
                        status_codes: Some(status_code.status_code_range.clone()),
                        path: non_empty(&status_code.path),
                        count: Some(status_code.count),
                        time_interval: non_empty(&status_code.interval),
                    });
                } else {
                    let status = status_code.status_code_range.parse::<i64>().map_err(|_| {
                        AzureError::validation(
                            "site_config.auto_heal_setting.trigger.status_code.status_code_range",
                            format!(
                                "{:?} is neither a status code nor a range",
                                status_code.status_code_range
                            ),
                        )
                    })?;
                    status_codes.push(StatusCodesBasedTrigger {
                        status: Some(status),
                        sub_status: status_code.sub_status,
                        win32_status: status_code.win32_status,
                        count: Some(status_code.count),
                        time_interval: non_empty(&status_code.interval),
                        path: non_empty(&status_code.path),
                    });
                }
            }

            Some(AutoHealTriggers {
                requests: trigger.requests.as_ref().map(|r| RequestsBasedTrigger {
                    count: Some(r.count),
                    time_interval: non_empty(&r.interval),
                }),
                slow_requests: trigger
                    .slow_request
                    .as_ref()
                    .map(|r| SlowRequestsBasedTrigger {
                        time_taken: non_empty(&r.time_taken),
                        path: non_empty(&r.path),
                        count: Some(r.count),
                        time_interval: non_empty(&r.interval),
                    }),
                status_codes: if status_codes.is_empty() {
                    None
                } else {
                    Some(status_codes)
                },
                status_codes_range: if status_codes_range.is_empty() {
                    None
                } else {
                    Some(status_codes_range)
                },
            })
        }
        None => None,
    };

    Ok(AutoHealRules {
        triggers,
        actions: setting.action.as_ref().map(|a| AutoHealActions {
            action_type: non_empty(&a.action_type),
            min_process_execution_time: non_empty(&a.minimum_process_execution_time),
        }),
    })
}

pub fn flatten_auto_heal(rules: &AutoHealRules) -> Option<AutoHealSettingModel> {
    let trigger = rules.triggers.as_ref().map(|t| {
        let singles = t.status_codes.iter().flatten().map(|s| StatusCodeTriggerModel {
            status_code_range: s.status.map(|v| v.to_string()).unwrap_or_default(),
            sub_status: s.sub_status,
            win32_status: s.win32_status,
            count: s.count.unwrap_or_default(),
            interval: s.time_interval.clone().unwrap_or_default(),
            path: s.path.clone().unwrap_or_default(),
        });
        let ranges = t
            .status_codes_range
            .iter()
            .flatten()
            .map(|s| StatusCodeTriggerModel {
                status_code_range: s.status_codes.clone().unwrap_or_default(),
                sub_status: None,
                win32_status: None,
                count: s.count.unwrap_or_default(),
                interval: s.time_interval.clone().unwrap_or_default(),
                path: s.path.clone().unwrap_or_default(),
            });

        let mut trigger = AutoHealTriggerModel {
            requests: t.requests.as_ref().map(|r| RequestsTriggerModel {
                count: r.count.unwrap_or_default(),
                interval: r.time_interval.clone().unwrap_or_default(),
            }),
            slow_request: t.slow_requests.as_ref().map(|r| SlowRequestTriggerModel {
                time_taken: r.time_taken.clone().unwrap_or_default(),
                interval: r.time_interval.clone().unwrap_or_default(),
                count: r.count.unwrap_or_default(),
                path: r.path.clone().unwrap_or_default(),
            }),
            status_code: singles.chain(ranges).collect(),
        };
        trigger.sort_status_codes();
        trigger
    });

    let action = rules.actions.as_ref().map(|a| AutoHealActionModel {
        action_type: a.action_type.clone().unwrap_or_default(),
        minimum_process_execution_time: a.min_process_execution_time.clone().unwrap_or_default(),
    });

    if trigger.is_none() && action.is_none() {
        None
    } else {
        Some(AutoHealSettingModel { trigger, action })
    }
}

/// Every section is sent so that removing a block from configuration switches it off remotely.
pub fn expand_logs(logs: &LogsModel) -> SiteLogsConfig {
    let application_logs = logs.application_logs.clone().unwrap_or_default();
    let http_logs = logs.http_logs.clone().unwrap_or_default();

    SiteLogsConfig {
        application_logs: Some(ApplicationLogsConfig {
            file_system: Some(FileSystemApplicationLogsConfig {
                level: Some(application_logs.file_system_level.clone()),
            }),
            azure_blob_storage: application_logs.azure_blob_storage.as_ref().map(|blob| {
                AzureBlobStorageApplicationLogsConfig {
                    level: non_empty(&blob.level),
                    sas_url: Some(blob.sas_url.clone()),
                    retention_in_days: Some(blob.retention_in_days),
                }
            }),
        }),
        http_logs: Some(HttpLogsConfig {
            file_system: Some(match &http_logs.file_system {
                Some(fs) => FileSystemHttpLogsConfig {
                    retention_in_mb: Some(fs.retention_in_mb),
                    retention_in_days: Some(fs.retention_in_days),
                    enabled: Some(true),
                },
                None => FileSystemHttpLogsConfig {
                    enabled: Some(false),
                    ..Default::default()
                },
            }),
            azure_blob_storage: Some(match &http_logs.azure_blob_storage {
                Some(blob) => AzureBlobStorageHttpLogsConfig {
                    sas_url: Some(blob.sas_url.clone()),
                    retention_in_days: Some(blob.retention_in_days),
                    enabled: Some(true),
                },
                None => AzureBlobStorageHttpLogsConfig {
                    enabled: Some(false),
                    ..Default::default()
                },
            }),
        }),
        failed_requests_tracing: Some(EnabledConfig::new(logs.failed_request_tracing)),
        detailed_error_messages: Some(EnabledConfig::new(logs.detailed_error_messages)),
    }
}

/// Always yields a block, even when everything is switched off.
pub fn flatten_logs(config: &SiteLogsConfig) -> LogsModel {
    let application_logs = config.application_logs.as_ref().and_then(|app| {
        let file_system_level = app
            .file_system
            .as_ref()
            .and_then(|fs| fs.level.clone())
            .unwrap_or_else(|| "Off".to_string());
        let azure_blob_storage = app.azure_blob_storage.as_ref().and_then(|blob| {
            let sas_url = blob.sas_url.clone().filter(|s| !s.is_empty())?;
            Some(ApplicationLogsBlobModel {
                level: blob.level.clone().unwrap_or_default(),
                sas_url,
                retention_in_days: blob.retention_in_days.unwrap_or_default(),
            })
        });

        if file_system_level == "Off" && azure_blob_storage.is_none() {
            None
        } else {
            Some(ApplicationLogsModel {
                file_system_level,
                azure_blob_storage,
            })
        }
    });

    let http_logs = config.http_logs.as_ref().and_then(|http| {
        let file_system = http
            .file_system
            .as_ref()
            .filter(|fs| fs.enabled == Some(true))
            .map(|fs| HttpLogsFileSystemModel {
                retention_in_days: fs.retention_in_days.unwrap_or_default(),
                retention_in_mb: fs.retention_in_mb.unwrap_or_default(),
            });
        let azure_blob_storage = http
            .azure_blob_storage
            .as_ref()
            .filter(|blob| blob.enabled == Some(true))
            .and_then(|blob| {
                let sas_url = blob.sas_url.clone().filter(|s| !s.is_empty())?;
                Some(HttpLogsBlobModel {
                    sas_url,
                    retention_in_days: blob.retention_in_days.unwrap_or_default(),
                })
            });

        if file_system.is_none() && azure_blob_storage.is_none() {
            None
        } else {
            Some(HttpLogsModel {
                file_system,
                azure_blob_storage,
            })
        }
    });

    LogsModel {
        detailed_error_messages: enabled(&config.detailed_error_messages),
        failed_request_tracing: enabled(&config.failed_requests_tracing),
        application_logs,
        http_logs,
    }
}

fn enabled(config: &Option<EnabledConfig>) -> bool {
    config
        .as_ref()
        .and_then(|c| c.enabled)
        .unwrap_or_default()
}

pub fn expand_auth_settings(settings: &AuthSettingsModel) -> SiteAuthSettings {
    let additional_login_params: Vec<String> = settings
        .additional_login_parameters
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();

    let mut expanded = SiteAuthSettings {
        enabled: Some(settings.enabled),
        unauthenticated_client_action: non_empty(&settings.unauthenticated_client_action),
        token_store_enabled: Some(settings.token_store_enabled),
        allowed_external_redirect_urls: non_empty_vec(&settings.allowed_external_redirect_urls),
        default_provider: non_empty(&settings.default_provider),
        token_refresh_extension_hours: Some(settings.token_refresh_extension_hours),
        issuer: non_empty(&settings.issuer),
        additional_login_params: non_empty_vec(&additional_login_params),
        ..Default::default()
    };

    if let Some(aad) = &settings.active_directory {
        expanded.client_id = non_empty(&aad.client_id);
        expanded.client_secret = non_empty(&aad.client_secret);
        expanded.allowed_audiences = non_empty_vec(&aad.allowed_audiences);
    }
    if let Some(facebook) = &settings.facebook {
        expanded.facebook_app_id = non_empty(&facebook.app_id);
        expanded.facebook_app_secret = non_empty(&facebook.app_secret);
        expanded.facebook_oauth_scopes = non_empty_vec(&facebook.oauth_scopes);
    }
    if let Some(google) = &settings.google {
        expanded.google_client_id = non_empty(&google.client_id);
        expanded.google_client_secret = non_empty(&google.client_secret);
        expanded.google_oauth_scopes = non_empty_vec(&google.oauth_scopes);
    }
    if let Some(microsoft) = &settings.microsoft {
        expanded.microsoft_account_client_id = non_empty(&microsoft.client_id);
        expanded.microsoft_account_client_secret = non_empty(&microsoft.client_secret);
        expanded.microsoft_account_oauth_scopes = non_empty_vec(&microsoft.oauth_scopes);
    }
    if let Some(twitter) = &settings.twitter {
        expanded.twitter_consumer_key = non_empty(&twitter.consumer_key);
        expanded.twitter_consumer_secret = non_empty(&twitter.consumer_secret);
    }

    expanded
}

/// Secrets the API does not echo back keep the value from `configured`.
pub fn flatten_auth_settings(
    settings: &SiteAuthSettings,
    configured: Option<&AuthSettingsModel>,
) -> AuthSettingsModel {
    let additional_login_parameters = settings
        .additional_login_params
        .iter()
        .flatten()
        .map(|param| match param.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (param.clone(), String::new()),
        })
        .collect();

    let active_directory = settings
        .client_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|client_id| ActiveDirectoryModel {
            client_id: client_id.clone(),
            client_secret: or_configured(
                settings.client_secret.as_ref(),
                configured
                    .and_then(|c| c.active_directory.as_ref())
                    .map(|aad| aad.client_secret.as_str()),
            ),
            allowed_audiences: settings.allowed_audiences.clone().unwrap_or_default(),
        });

    let facebook = settings
        .facebook_app_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|app_id| FacebookModel {
            app_id: app_id.clone(),
            app_secret: or_configured(
                settings.facebook_app_secret.as_ref(),
                configured
                    .and_then(|c| c.facebook.as_ref())
                    .map(|f| f.app_secret.as_str()),
            ),
            oauth_scopes: settings.facebook_oauth_scopes.clone().unwrap_or_default(),
        });

    let google = settings
        .google_client_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|client_id| OAuthProviderModel {
            client_id: client_id.clone(),
            client_secret: or_configured(
                settings.google_client_secret.as_ref(),
                configured
                    .and_then(|c| c.google.as_ref())
                    .map(|g| g.client_secret.as_str()),
            ),
            oauth_scopes: settings.google_oauth_scopes.clone().unwrap_or_default(),
        });

    let microsoft = settings
        .microsoft_account_client_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|client_id| OAuthProviderModel {
            client_id: client_id.clone(),
            client_secret: or_configured(
                settings.microsoft_account_client_secret.as_ref(),
                configured
                    .and_then(|c| c.microsoft.as_ref())
                    .map(|m| m.client_secret.as_str()),
            ),
            oauth_scopes: settings
                .microsoft_account_oauth_scopes
                .clone()
                .unwrap_or_default(),
        });

    let twitter = settings
        .twitter_consumer_key
        .as_ref()
        .filter(|key| !key.is_empty())
        .map(|consumer_key| TwitterModel {
            consumer_key: consumer_key.clone(),
            consumer_secret: or_configured(
                settings.twitter_consumer_secret.as_ref(),
                configured
                    .and_then(|c| c.twitter.as_ref())
                    .map(|t| t.consumer_secret.as_str()),
            ),
        });

    AuthSettingsModel {
        enabled: settings.enabled.unwrap_or_default(),
        additional_login_parameters,
        allowed_external_redirect_urls: settings
            .allowed_external_redirect_urls
            .clone()
            .unwrap_or_default(),
        default_provider: settings.default_provider.clone().unwrap_or_default(),
        issuer: settings.issuer.clone().unwrap_or_default(),
        token_refresh_extension_hours: settings
            .token_refresh_extension_hours
            .unwrap_or(DEFAULT_TOKEN_REFRESH_EXTENSION_HOURS),
        token_store_enabled: settings.token_store_enabled.unwrap_or_default(),
        unauthenticated_client_action: settings
            .unauthenticated_client_action
            .clone()
            .unwrap_or_default(),
        active_directory,
        facebook,
        google,
        microsoft,
        twitter,
    }
}

pub fn expand_backup(backup: &BackupModel) -> Result<BackupRequest, AzureError> {
    if backup.name.is_empty() {
        return Err(AzureError::validation("backup.name", "must not be empty"));
    }
    if backup.storage_account_url.is_empty() {
        return Err(AzureError::validation(
            "backup.storage_account_url",
            "must not be empty",
        ));
    }
    if !matches!(backup.schedule.frequency_unit.as_str(), "Day" | "Hour") {
        return Err(AzureError::validation(
            "backup.schedule.frequency_unit",
            format!(
                "expected \"Day\" or \"Hour\", got {:?}",
                backup.schedule.frequency_unit
            ),
        ));
    }

    Ok(BackupRequest {
        backup_name: Some(backup.name.clone()),
        enabled: Some(backup.enabled),
        storage_account_url: Some(backup.storage_account_url.clone()),
        backup_schedule: Some(BackupSchedule {
            frequency_interval: Some(backup.schedule.frequency_interval),
            frequency_unit: Some(backup.schedule.frequency_unit.clone()),
            keep_at_least_one_backup: Some(backup.schedule.keep_at_least_one_backup),
            retention_period_in_days: Some(backup.schedule.retention_period_days),
            start_time: non_empty(&backup.schedule.start_time),
        }),
    })
}

pub fn flatten_backup(backup: &BackupRequest, configured: Option<&BackupModel>) -> BackupModel {
    let schedule = backup.backup_schedule.clone().unwrap_or_default();
    let defaults = BackupScheduleModel::default();

    BackupModel {
        name: backup.backup_name.clone().unwrap_or_default(),
        storage_account_url: or_configured(
            backup.storage_account_url.as_ref(),
            configured.map(|b| b.storage_account_url.as_str()),
        ),
        enabled: backup.enabled.unwrap_or(true),
        schedule: BackupScheduleModel {
            frequency_interval: schedule.frequency_interval.unwrap_or_default(),
            frequency_unit: schedule.frequency_unit.unwrap_or_default(),
            keep_at_least_one_backup: schedule.keep_at_least_one_backup.unwrap_or_default(),
            retention_period_days: schedule
                .retention_period_in_days
                .unwrap_or(defaults.retention_period_days),
            start_time: schedule.start_time.unwrap_or_default(),
        },
    }
}
