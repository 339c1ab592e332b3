use crate::api::ApiClient;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use ocm_console_common::rbac::{AccessReviewRequest, AccessReviewResponse, ResourceAttributes};

/// Single access check as given on the command line
pub struct AccessCheck {
    pub group: String,
    pub resource: String,
    pub verb: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl AccessCheck {
    fn into_attributes(self) -> ResourceAttributes {
        ResourceAttributes {
            namespace: self.namespace,
            name: self.name,
            ..ResourceAttributes::new(&self.group, &self.resource, &self.verb)
        }
    }
}

pub async fn handle_can_i(check: AccessCheck, api: &ApiClient, format: OutputFormat) -> Result<()> {
    let request = AccessReviewRequest {
        checks: vec![check.into_attributes()],
    };
    let response: AccessReviewResponse = api.post("/api/access-reviews", &request).await?;

    match format {
        OutputFormat::Json => output::print_json(&response)?,
        OutputFormat::Yaml => output::print_yaml(&response)?,
        OutputFormat::Table => {
            println!("{}", output::yes_no(response.allowed));
            if let Some(error) = response.results.iter().find_map(|r| r.error.as_deref()) {
                output::print_warning(error);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_into_attributes() {
        let attributes = AccessCheck {
            group: String::new(),
            resource: "secrets".to_string(),
            verb: "get".to_string(),
            namespace: Some("c1".to_string()),
            name: None,
        }
        .into_attributes();

        assert_eq!(attributes.resource, "secrets");
        assert_eq!(attributes.verb, "get");
        assert_eq!(attributes.namespace.as_deref(), Some("c1"));
        assert!(attributes.name.is_none());
    }
}
