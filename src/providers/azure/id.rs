//! Azure resource identifiers.
//!
//! The canonical form is
//! `/subscriptions/{subscription}/resourceGroups/{group}/providers/{namespace}/{type}/{name}`
//! optionally followed by nested `/{type}/{name}` pairs. Fixed keys are matched
//! case-sensitively; `format` is the left inverse of `parse`.

use std::fmt;

use super::AzureError;

const SUBSCRIPTIONS: &str = "subscriptions";
const RESOURCE_GROUPS: &str = "resourceGroups";
const PROVIDERS: &str = "providers";

pub const WEB_NAMESPACE: &str = "Microsoft.Web";
pub const APP_CONFIGURATION_NAMESPACE: &str = "Microsoft.AppConfiguration";
pub const LOGIC_NAMESPACE: &str = "Microsoft.Logic";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_type: String,
    pub name: String,
    /// Nested `(type, name)` segments below the top-level resource.
    pub children: Vec<(String, String)>,
}

impl ResourceId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        provider: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            provider: provider.into(),
            resource_type: resource_type.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        self.children.push((resource_type.into(), name.into()));
        self
    }

    pub fn parse(input: &str) -> Result<Self, AzureError> {
        let segments = split_segments(input)?;

        if segments.len() < 8 {
            return Err(AzureError::malformed(
                input,
                format!("expected at least 8 segments, got {}", segments.len()),
            ));
        }
        if segments.len() % 2 != 0 {
            return Err(AzureError::malformed(
                input,
                "segments must come in key/value pairs",
            ));
        }

        expect_key(input, segments[0], SUBSCRIPTIONS)?;
        expect_key(input, segments[2], RESOURCE_GROUPS)?;
        expect_key(input, segments[4], PROVIDERS)?;

        let children = segments[8..]
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();

        Ok(Self {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            provider: segments[5].to_string(),
            resource_type: segments[6].to_string(),
            name: segments[7].to_string(),
            children,
        })
    }

    /// Full type path, e.g. `Microsoft.Web/sites/slots`.
    pub fn type_path(&self) -> String {
        let mut path = format!("{}/{}", self.provider, self.resource_type);
        for (child_type, _) in &self.children {
            path.push('/');
            path.push_str(child_type);
        }
        path
    }

    pub fn resource_group_id(&self) -> ResourceGroupId {
        ResourceGroupId::new(&self.subscription_id, &self.resource_group)
    }

    /// Innermost resource name.
    pub fn leaf_name(&self) -> &str {
        self.children
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or(&self.name)
    }

    fn expect_type(self, input: &str, provider: &str, types: &[&str]) -> Result<Self, AzureError> {
        if self.provider != provider {
            return Err(AzureError::malformed(
                input,
                format!("expected provider {provider:?}, got {:?}", self.provider),
            ));
        }
        let actual: Vec<&str> = std::iter::once(self.resource_type.as_str())
            .chain(self.children.iter().map(|(t, _)| t.as_str()))
            .collect();
        if actual != types {
            return Err(AzureError::malformed(
                input,
                format!("expected type {:?}, got {:?}", types.join("/"), actual.join("/")),
            ));
        }
        Ok(self)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{SUBSCRIPTIONS}/{}/{RESOURCE_GROUPS}/{}/{PROVIDERS}/{}/{}/{}",
            self.subscription_id, self.resource_group, self.provider, self.resource_type, self.name
        )?;
        for (child_type, child_name) in &self.children {
            write!(f, "/{child_type}/{child_name}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ResourceId {
    type Err = AzureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn split_segments(input: &str) -> Result<Vec<&str>, AzureError> {
    let rest = input
        .strip_prefix('/')
        .ok_or_else(|| AzureError::malformed(input, "must start with '/'"))?;
    let segments: Vec<&str> = rest.split('/').collect();
    if let Some(position) = segments.iter().position(|s| s.is_empty()) {
        return Err(AzureError::malformed(
            input,
            format!("segment {} is empty", position + 1),
        ));
    }
    Ok(segments)
}

fn expect_key(input: &str, actual: &str, expected: &str) -> Result<(), AzureError> {
    if actual == expected {
        Ok(())
    } else {
        Err(AzureError::malformed(
            input,
            format!("expected segment {expected:?}, got {actual:?}"),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub resource_group: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: &str, resource_group: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, AzureError> {
        let segments = split_segments(input)?;
        if segments.len() != 4 {
            return Err(AzureError::malformed(
                input,
                format!("expected 4 segments, got {}", segments.len()),
            ));
        }
        expect_key(input, segments[0], SUBSCRIPTIONS)?;
        expect_key(input, segments[2], RESOURCE_GROUPS)?;
        Ok(Self::new(segments[1], segments[3]))
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{SUBSCRIPTIONS}/{}/{RESOURCE_GROUPS}/{}",
            self.subscription_id, self.resource_group
        )
    }
}

/// `Microsoft.Web/sites`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebAppId {
    pub subscription_id: String,
    pub resource_group: String,
    pub site_name: String,
}

impl WebAppId {
    pub fn new(subscription_id: &str, resource_group: &str, site_name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            site_name: site_name.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, AzureError> {
        let id = ResourceId::parse(input)?.expect_type(input, WEB_NAMESPACE, &["sites"])?;
        Ok(Self::new(&id.subscription_id, &id.resource_group, &id.name))
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(
            &self.subscription_id,
            &self.resource_group,
            WEB_NAMESPACE,
            "sites",
            &self.site_name,
        )
    }
}

impl fmt::Display for WebAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource_id().fmt(f)
    }
}

/// `Microsoft.Web/serverfarms`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServicePlanId {
    pub subscription_id: String,
    pub resource_group: String,
    pub server_farm_name: String,
}

impl ServicePlanId {
    pub fn parse(input: &str) -> Result<Self, AzureError> {
        let id = ResourceId::parse(input)?.expect_type(input, WEB_NAMESPACE, &["serverfarms"])?;
        Ok(Self {
            subscription_id: id.subscription_id,
            resource_group: id.resource_group,
            server_farm_name: id.name,
        })
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(
            &self.subscription_id,
            &self.resource_group,
            WEB_NAMESPACE,
            "serverfarms",
            &self.server_farm_name,
        )
    }
}

impl fmt::Display for ServicePlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource_id().fmt(f)
    }
}

/// `Microsoft.AppConfiguration/configurationStores`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationStoreId {
    pub subscription_id: String,
    pub resource_group: String,
    pub configuration_store_name: String,
}

impl ConfigurationStoreId {
    pub fn parse(input: &str) -> Result<Self, AzureError> {
        let id = ResourceId::parse(input)?.expect_type(
            input,
            APP_CONFIGURATION_NAMESPACE,
            &["configurationStores"],
        )?;
        Ok(Self {
            subscription_id: id.subscription_id,
            resource_group: id.resource_group,
            configuration_store_name: id.name,
        })
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(
            &self.subscription_id,
            &self.resource_group,
            APP_CONFIGURATION_NAMESPACE,
            "configurationStores",
            &self.configuration_store_name,
        )
    }
}

impl fmt::Display for ConfigurationStoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource_id().fmt(f)
    }
}

/// `Microsoft.Logic/workflows`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowId {
    pub subscription_id: String,
    pub resource_group: String,
    pub workflow_name: String,
}

impl WorkflowId {
    pub fn parse(input: &str) -> Result<Self, AzureError> {
        let id = ResourceId::parse(input)?.expect_type(input, LOGIC_NAMESPACE, &["workflows"])?;
        Ok(Self {
            subscription_id: id.subscription_id,
            resource_group: id.resource_group,
            workflow_name: id.name,
        })
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(
            &self.subscription_id,
            &self.resource_group,
            LOGIC_NAMESPACE,
            "workflows",
            &self.workflow_name,
        )
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource_id().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str =
        "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/acctestRG-1/providers/Microsoft.Web/sites/acctestWA-1";

    #[test]
    fn test_parse_top_level_resource() {
        let id = ResourceId::parse(SITE).unwrap();
        assert_eq!(id.subscription_id, "00000000-0000-0000-0000-000000000000");
        assert_eq!(id.resource_group, "acctestRG-1");
        assert_eq!(id.provider, "Microsoft.Web");
        assert_eq!(id.resource_type, "sites");
        assert_eq!(id.name, "acctestWA-1");
        assert!(id.children.is_empty());
        assert_eq!(id.to_string(), SITE);
    }

    #[test]
    fn test_parse_nested_segments() {
        let input = format!("{SITE}/slots/staging/config/web");
        let id = ResourceId::parse(&input).unwrap();
        assert_eq!(
            id.children,
            vec![
                ("slots".to_string(), "staging".to_string()),
                ("config".to_string(), "web".to_string())
            ]
        );
        assert_eq!(id.type_path(), "Microsoft.Web/sites/slots/config");
        assert_eq!(id.leaf_name(), "web");
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_parse_rejects_missing_leading_slash() {
        let err = ResourceId::parse(&SITE[1..]).unwrap_err();
        assert!(matches!(err, AzureError::MalformedId { .. }));
    }

    #[test]
    fn test_parse_rejects_trailing_slash() {
        let err = ResourceId::parse(&format!("{SITE}/")).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_parse_rejects_wrong_casing() {
        let lower = SITE.replace("resourceGroups", "resourcegroups");
        let err = ResourceId::parse(&lower).unwrap_err();
        assert!(err.to_string().contains("resourceGroups"));
    }

    #[test]
    fn test_parse_rejects_odd_segment_count() {
        let err = ResourceId::parse(&format!("{SITE}/slots")).unwrap_err();
        assert!(err.to_string().contains("pairs"));
    }

    #[test]
    fn test_parse_rejects_short_id() {
        let err = ResourceId::parse("/subscriptions/abc/resourceGroups/rg").unwrap_err();
        assert!(err.to_string().contains("at least 8"));
    }

    #[test]
    fn test_resource_group_id_roundtrip() {
        let input = "/subscriptions/abc/resourceGroups/my-rg";
        let id = ResourceGroupId::parse(input).unwrap();
        assert_eq!(id.resource_group, "my-rg");
        assert_eq!(id.to_string(), input);
        assert!(ResourceGroupId::parse(SITE).is_err());
    }

    #[test]
    fn test_web_app_id_parse() {
        let id = WebAppId::parse(SITE).unwrap();
        assert_eq!(id.site_name, "acctestWA-1");
        assert_eq!(id.to_string(), SITE);
    }

    #[test]
    fn test_web_app_id_rejects_other_types() {
        let plan = SITE.replace("sites", "serverfarms");
        let err = WebAppId::parse(&plan).unwrap_err();
        assert!(err.to_string().contains("expected type"));

        let nested = format!("{SITE}/slots/staging");
        assert!(WebAppId::parse(&nested).is_err());
    }

    #[test]
    fn test_web_app_id_namespace_is_case_sensitive() {
        let lower = SITE.replace("Microsoft.Web", "microsoft.web");
        assert!(WebAppId::parse(&lower).is_err());
    }

    #[test]
    fn test_service_plan_id_parse() {
        let input = "/subscriptions/abc/resourceGroups/rg/providers/Microsoft.Web/serverfarms/plan1";
        let id = ServicePlanId::parse(input).unwrap();
        assert_eq!(id.server_farm_name, "plan1");
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_configuration_store_id_parse() {
        let input = "/subscriptions/abc/resourceGroups/rg/providers/Microsoft.AppConfiguration/configurationStores/store1";
        let id = ConfigurationStoreId::parse(input).unwrap();
        assert_eq!(id.configuration_store_name, "store1");
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_workflow_id_parse() {
        let input = "/subscriptions/abc/resourceGroups/rg/providers/Microsoft.Logic/workflows/flow1";
        let id = WorkflowId::parse(input).unwrap();
        assert_eq!(id.workflow_name, "flow1");
        assert_eq!(id.resource_id().resource_group_id().resource_group, "rg");
    }

    #[test]
    fn test_from_str() {
        let id: ResourceId = SITE.parse().unwrap();
        assert_eq!(id.name, "acctestWA-1");
    }
}
