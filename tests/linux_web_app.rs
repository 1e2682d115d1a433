use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use azrm::providers::azure::linux_web_app::RESOURCE_TYPE;
use azrm::providers::azure::{
    AzureProvider, ClientOptions, CloudEnvironment, StaticTokenCredential, TransportOptions,
};
use azrm::output;
use azrm::terraform::{self, PlanAction, PlannedChange};
use azrm::{Context, Provider, ProviderError, Resource};
use serde_json::{Value, json};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const SITE_PATH: &str =
    "/subscriptions/sub/resourceGroups/acctestRG-1/providers/Microsoft.Web/sites/acctestWA-1";
const PLAN_1: &str =
    "/subscriptions/sub/resourceGroups/acctestRG-1/providers/Microsoft.Web/serverfarms/acctestASP-1";
const PLAN_2: &str =
    "/subscriptions/sub/resourceGroups/acctestRG-1/providers/Microsoft.Web/serverfarms/acctestASP-2";

#[derive(Default)]
struct SiteRecord {
    site: Value,
    web: Value,
    app_settings: Value,
    auth_settings: Value,
    logs: Value,
    backup: Option<Value>,
}

/// In-memory stand-in for the `Microsoft.Web/sites` endpoints.
#[derive(Clone, Default)]
struct FakeArm {
    sites: Arc<Mutex<HashMap<String, SiteRecord>>>,
    mutations: Arc<AtomicUsize>,
}

impl FakeArm {
    fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn remove(&self, site_path: &str) {
        self.sites.lock().unwrap().remove(site_path);
    }

    fn has_backup(&self, site_path: &str) -> bool {
        self.sites
            .lock()
            .unwrap()
            .get(site_path)
            .is_some_and(|r| r.backup.is_some())
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": {"code": "ResourceNotFound", "message": "not found"}
    }))
}

fn envelope(site_path: &str, section: &str, properties: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": format!("{}/config/{}", site_path, section),
        "name": section,
        "properties": properties,
    }))
}

fn object_or_empty(value: &Value) -> Value {
    if value.is_object() {
        value.clone()
    } else {
        json!({})
    }
}

impl Respond for FakeArm {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();
        let method = request.method.as_str().to_string();
        let (site_path, section) = match path.split_once("/config/") {
            Some((site, section)) => (site.to_string(), Some(section.to_string())),
            None => (path.clone(), None),
        };

        let is_list = section.as_deref().is_some_and(|s| s.ends_with("/list"));
        if method != "GET" && !is_list {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }

        let body: Value = request.body_json().unwrap_or(Value::Null);
        let mut sites = self.sites.lock().unwrap();

        let Some(section) = section else {
            return match method.as_str() {
                "GET" => match sites.get(&site_path) {
                    Some(record) => ResponseTemplate::new(200).set_body_json(record.site.clone()),
                    None => not_found(),
                },
                "PUT" => {
                    let record = sites.entry(site_path.clone()).or_default();
                    let mut site = body;
                    record.web = site["properties"]["siteConfig"].take();
                    if let Some(properties) = site["properties"].as_object_mut() {
                        properties.remove("siteConfig");
                    }
                    let name = site_path.rsplit('/').next().unwrap_or_default().to_string();
                    site["id"] = json!(site_path);
                    site["name"] = json!(name);
                    site["properties"]["defaultHostName"] =
                        json!(format!("{}.azurewebsites.net", name));
                    site["properties"]["outboundIpAddresses"] = json!("52.0.0.1,52.0.0.2");
                    site["properties"]["state"] = json!("Running");
                    record.site = site.clone();
                    ResponseTemplate::new(200).set_body_json(site)
                }
                "DELETE" => match sites.remove(&site_path) {
                    Some(_) => ResponseTemplate::new(200),
                    None => ResponseTemplate::new(204),
                },
                _ => ResponseTemplate::new(405),
            };
        };

        let Some(record) = sites.get_mut(&site_path) else {
            return not_found();
        };

        match (method.as_str(), section.as_str()) {
            ("GET", "web") => {
                let mut web = object_or_empty(&record.web);
                web["detailedErrorLoggingEnabled"] = record.logs["detailedErrorMessages"]["enabled"]
                    .as_bool()
                    .map(Value::Bool)
                    .unwrap_or(Value::Bool(false));
                web["virtualApplications"] = json!([{
                    "virtualPath": "/",
                    "physicalPath": "site\\wwwroot",
                    "preloadEnabled": false
                }]);
                envelope(&site_path, "web", web)
            }
            ("PUT", "appsettings") => {
                record.app_settings = body["properties"].clone();
                envelope(&site_path, "appsettings", record.app_settings.clone())
            }
            ("POST", "appsettings/list") => {
                envelope(&site_path, "appsettings", object_or_empty(&record.app_settings))
            }
            ("PUT", "authsettings") => {
                record.auth_settings = body["properties"].clone();
                envelope(&site_path, "authsettings", record.auth_settings.clone())
            }
            ("POST", "authsettings/list") => {
                let mut auth = object_or_empty(&record.auth_settings);
                if auth.get("enabled").is_none() {
                    auth["enabled"] = json!(false);
                }
                envelope(&site_path, "authsettings", auth)
            }
            ("PUT", "logs") => {
                record.logs = body["properties"].clone();
                envelope(&site_path, "logs", record.logs.clone())
            }
            ("GET", "logs") => envelope(&site_path, "logs", object_or_empty(&record.logs)),
            ("PUT", "backup") => {
                record.backup = Some(body["properties"].clone());
                envelope(&site_path, "backup", body["properties"].clone())
            }
            ("POST", "backup/list") => match &record.backup {
                Some(backup) => envelope(&site_path, "backup", backup.clone()),
                None => not_found(),
            },
            ("DELETE", "backup") => {
                record.backup = None;
                ResponseTemplate::new(200)
            }
            _ => ResponseTemplate::new(405),
        }
    }
}

async fn setup() -> (MockServer, FakeArm, AzureProvider) {
    let mock_server = MockServer::start().await;
    let fake = FakeArm::default();

    Mock::given(any())
        .respond_with(fake.clone())
        .mount(&mock_server)
        .await;

    let options = ClientOptions::new(
        "sub".to_string(),
        CloudEnvironment::Public,
        Arc::new(StaticTokenCredential::new("test_token")),
    )
    .with_endpoint(mock_server.uri())
    .with_transport(TransportOptions {
        max_retries: 1,
        retry_backoff: Duration::from_millis(10),
        poll_interval: Duration::from_millis(10),
    });
    let provider = AzureProvider::new(&options).unwrap();

    (mock_server, fake, provider)
}

fn base_config() -> Value {
    json!({
        "name": "acctestWA-1",
        "resource_group_name": "acctestRG-1",
        "location": "West Europe",
        "service_plan_id": PLAN_1,
        "app_settings": {"WEBSITES_ENABLE_APP_SERVICE_STORAGE": "false"}
    })
}

fn with(mut config: Value, key: &str, value: Value) -> Value {
    config[key] = value;
    config
}

async fn plan(
    provider: &AzureProvider,
    config: &Value,
    prior: Option<&Resource>,
) -> Result<PlannedChange, ProviderError> {
    terraform::refresh_and_plan(provider, &Context::background(), RESOURCE_TYPE, config, prior)
        .await
}

async fn apply(
    provider: &AzureProvider,
    config: &Value,
    prior: Option<&Resource>,
) -> Result<Resource, ProviderError> {
    let planned = plan(provider, config, prior).await?;
    let state = terraform::apply(provider, &Context::background(), &planned).await?;
    Ok(Resource::from_state(RESOURCE_TYPE, "test", state))
}

fn changed_paths(action: &PlanAction) -> Vec<&str> {
    action.changes().iter().map(|c| c.path.as_str()).collect()
}

#[tokio::test]
async fn test_create_reads_back_computed_attributes() {
    let (_server, _fake, provider) = setup().await;

    let resource = apply(&provider, &base_config(), None).await.unwrap();
    let state = &resource.attributes;

    assert_eq!(resource.resource_id, SITE_PATH);
    assert_eq!(state["location"], "westeurope");
    assert_eq!(state["kind"], "app,linux");
    assert_eq!(state["default_hostname"], "acctestWA-1.azurewebsites.net");
    assert_eq!(state["service_plan_id"], PLAN_1);
    assert_eq!(
        state["app_settings"]["WEBSITES_ENABLE_APP_SERVICE_STORAGE"],
        "false"
    );
    assert_eq!(
        state["site_config"]["virtual_application"]
            .as_array()
            .map(Vec::len),
        Some(1)
    );
    assert_eq!(state["backup"], Value::Null);
}

#[tokio::test]
async fn test_second_apply_is_a_noop() {
    let (_server, fake, provider) = setup().await;
    let config = with(
        base_config(),
        "site_config",
        json!({
            "application_stack": {
                "docker_image": "mcr.microsoft.com/appsvc/staticsite",
                "docker_image_tag": "latest"
            }
        }),
    );

    let resource = apply(&provider, &config, None).await.unwrap();
    assert_eq!(
        resource.attributes["site_config"]["linux_fx_version"],
        "DOCKER|mcr.microsoft.com/appsvc/staticsite:latest"
    );
    let mutations = fake.mutations();

    let planned = plan(&provider, &config, Some(&resource)).await.unwrap();
    assert_eq!(planned.action, PlanAction::NoOp, "{:?}", planned.action);

    let state = terraform::apply(&provider, &Context::background(), &planned)
        .await
        .unwrap();
    assert_eq!(state, resource.attributes);
    assert_eq!(fake.mutations(), mutations);
}

#[tokio::test]
async fn test_adding_backup_block_masks_storage_url() {
    let (_server, _fake, provider) = setup().await;
    let resource = apply(&provider, &base_config(), None).await.unwrap();

    let config = with(
        base_config(),
        "backup",
        json!({
            "name": "acctest",
            "storage_account_url": "https://acctestsa.blob.core.windows.net/backups?sv=2018-11-09&sig=addedsig",
            "schedule": {"frequency_interval": 1, "frequency_unit": "Day"}
        }),
    );
    let planned = plan(&provider, &config, Some(&resource)).await.unwrap();
    assert_eq!(changed_paths(&planned.action), vec!["backup"]);

    let table = output::plan_table(&planned).unwrap();
    assert!(table.contains("backup"));
    assert!(!table.contains("addedsig"), "{table}");
}

#[tokio::test]
async fn test_status_code_trigger_order_does_not_cause_drift() {
    let (_server, fake, provider) = setup().await;
    let config = with(
        base_config(),
        "site_config",
        json!({
            "auto_heal": true,
            "auto_heal_setting": {
                "trigger": {
                    "status_code": [
                        {"status_code_range": "400-404", "count": 10, "interval": "00:10:00"},
                        {"status_code_range": "500", "count": 10, "interval": "00:01:00"}
                    ]
                },
                "action": {
                    "action_type": "LogEvent",
                    "minimum_process_execution_time": "00:10:00"
                }
            }
        }),
    );

    let resource = apply(&provider, &config, None).await.unwrap();
    let mutations = fake.mutations();

    let planned = plan(&provider, &config, Some(&resource)).await.unwrap();
    assert_eq!(planned.action, PlanAction::NoOp, "{:?}", planned.action);

    terraform::apply(&provider, &Context::background(), &planned)
        .await
        .unwrap();
    assert_eq!(fake.mutations(), mutations);
}

#[tokio::test]
async fn test_detailed_error_logging_follows_logs_block() {
    let (_server, _fake, provider) = setup().await;

    let enabled = with(base_config(), "logs", json!({"detailed_error_messages": true}));
    let resource = apply(&provider, &enabled, None).await.unwrap();
    assert_eq!(resource.attributes["logs"]["detailed_error_messages"], true);
    assert_eq!(
        resource.attributes["site_config"]["detailed_error_logging"],
        true
    );

    let disabled = with(base_config(), "logs", json!({"detailed_error_messages": false}));
    let planned = plan(&provider, &disabled, Some(&resource)).await.unwrap();
    assert!(matches!(planned.action, PlanAction::Update(_)));
    assert_eq!(changed_paths(&planned.action), vec!["logs.detailed_error_messages"]);

    let resource = apply(&provider, &disabled, Some(&resource)).await.unwrap();
    assert_eq!(resource.attributes["logs"]["detailed_error_messages"], false);
    assert_eq!(
        resource.attributes["site_config"]["detailed_error_logging"],
        false
    );
}

#[tokio::test]
async fn test_unmanaged_web_app_requires_import() {
    let (_server, _fake, provider) = setup().await;
    apply(&provider, &base_config(), None).await.unwrap();

    let planned = plan(&provider, &base_config(), None).await.unwrap();
    assert_eq!(planned.action, PlanAction::Create);

    let err = terraform::apply(&provider, &Context::background(), &planned)
        .await
        .unwrap_err();
    match err {
        ProviderError::RequiresImport(id) => assert_eq!(id, SITE_PATH),
        other => panic!("expected RequiresImport, got {:?}", other),
    }
}

#[tokio::test]
async fn test_service_plan_switch_updates_in_place() {
    let (_server, fake, provider) = setup().await;
    let resource = apply(&provider, &base_config(), None).await.unwrap();

    let moved = with(base_config(), "service_plan_id", json!(PLAN_2));
    let planned = plan(&provider, &moved, Some(&resource)).await.unwrap();
    assert!(matches!(planned.action, PlanAction::Update(_)));
    assert_eq!(changed_paths(&planned.action), vec!["service_plan_id"]);

    let before = fake.mutations();
    let resource = apply(&provider, &moved, Some(&resource)).await.unwrap();
    assert_eq!(resource.attributes["service_plan_id"], PLAN_2);
    assert_eq!(resource.resource_id, SITE_PATH);
    assert!(fake.mutations() > before);
}

#[tokio::test]
async fn test_location_change_forces_replacement() {
    let (_server, _fake, provider) = setup().await;
    let resource = apply(&provider, &base_config(), None).await.unwrap();

    let relocated = with(base_config(), "location", json!("North Europe"));
    let planned = plan(&provider, &relocated, Some(&resource)).await.unwrap();
    match &planned.action {
        PlanAction::Replace(changes) => {
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].path, "location");
            assert!(changes[0].force_new);
        }
        other => panic!("expected Replace, got {:?}", other),
    }

    let resource = apply(&provider, &relocated, Some(&resource)).await.unwrap();
    assert_eq!(resource.attributes["location"], "northeurope");
}

#[tokio::test]
async fn test_out_of_band_deletion_plans_create() {
    let (_server, fake, provider) = setup().await;
    let resource = apply(&provider, &base_config(), None).await.unwrap();

    fake.remove(SITE_PATH);

    let observed = provider
        .read(&Context::background(), RESOURCE_TYPE, SITE_PATH, None)
        .await
        .unwrap();
    assert!(observed.is_none());

    let planned = plan(&provider, &base_config(), Some(&resource)).await.unwrap();
    assert_eq!(planned.action, PlanAction::Create);
    assert_eq!(planned.id, SITE_PATH);
}

#[tokio::test]
async fn test_removing_backup_block_deletes_backup_configuration() {
    let (_server, fake, provider) = setup().await;
    let config = with(
        base_config(),
        "backup",
        json!({
            "name": "acctest",
            "storage_account_url": "https://acctestsa.blob.core.windows.net/backups?sv=2018-11-09&sig=backupsig",
            "schedule": {"frequency_interval": 1, "frequency_unit": "Day"}
        }),
    );

    let resource = apply(&provider, &config, None).await.unwrap();
    assert!(fake.has_backup(SITE_PATH));
    assert_eq!(resource.attributes["backup"]["schedule"]["retention_period_days"], 30);

    let planned = plan(&provider, &config, Some(&resource)).await.unwrap();
    assert_eq!(planned.action, PlanAction::NoOp, "{:?}", planned.action);

    let without = base_config();
    let planned = plan(&provider, &without, Some(&resource)).await.unwrap();
    assert_eq!(changed_paths(&planned.action), vec!["backup"]);
    assert!(planned.action.changes()[0].sensitive);
    let table = output::plan_table(&planned).unwrap();
    assert!(!table.contains("backupsig"), "{table}");

    let resource = apply(&provider, &without, Some(&resource)).await.unwrap();
    assert!(!fake.has_backup(SITE_PATH));
    assert_eq!(resource.attributes["backup"], Value::Null);
}

#[tokio::test]
async fn test_destroy_tolerates_missing_web_app() {
    let (_server, fake, provider) = setup().await;
    apply(&provider, &base_config(), None).await.unwrap();

    let ctx = Context::background();
    terraform::destroy(&provider, &ctx, RESOURCE_TYPE, SITE_PATH)
        .await
        .unwrap();
    assert!(
        provider
            .read(&ctx, RESOURCE_TYPE, SITE_PATH, None)
            .await
            .unwrap()
            .is_none()
    );

    let before = fake.mutations();
    terraform::destroy(&provider, &ctx, RESOURCE_TYPE, SITE_PATH)
        .await
        .unwrap();
    assert_eq!(fake.mutations(), before + 1);
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected_before_any_call() {
    let (_server, fake, provider) = setup().await;

    let mut config = base_config();
    config["unknown_attribute"] = json!(true);
    config.as_object_mut().unwrap().remove("service_plan_id");

    match plan(&provider, &config, None).await {
        Err(ProviderError::InvalidConfig(message)) => {
            assert!(message.contains("unknown_attribute: unsupported attribute"));
            assert!(message.contains("service_plan_id: required attribute is missing"));
        }
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
    assert_eq!(fake.mutations(), 0);
}
