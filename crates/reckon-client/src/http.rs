use crate::api::{PlatformApi, Workspace};
use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reckon_core::config::PlatformConfig;
use reckon_core::errors::ConfigError;
use reckon_core::model::{
    Entity, EntityKind, MethodConfig, SubmissionDetail, SubmissionSummary, WorkflowMetadata,
};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const ENTITY_PAGE_SIZE: u32 = 1000;
const MAX_ERROR_BODY: usize = 512;

/// [`PlatformApi`] over the platform's REST interface.
pub struct HttpPlatform {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityPage {
    #[serde(default)]
    results: Vec<Entity>,
    result_metadata: PageMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMetadata {
    filtered_page_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttributeUpdate<'a> {
    op: &'static str,
    attribute_name: &'a str,
    add_update_attribute: &'a Value,
}

impl HttpPlatform {
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let token = config
            .resolved_access_token()
            .ok_or(ClientError::MissingCredentials)?;
        Self::new(config, token)
    }

    pub fn new(config: &PlatformConfig, token: String) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            ConfigError::General(format!("Invalid base_url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::General(format!(
                "base_url '{}' cannot hold a path",
                config.base_url
            ))
            .into());
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Transport {
                endpoint: config.base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            token,
            retry: RetryPolicy::from_config(config),
        })
    }

    fn endpoint(&self, workspace: &Workspace, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "workspaces",
                    workspace.namespace.as_str(),
                    workspace.name.as_str(),
                ])
                .extend(tail);
        }
        url
    }

    async fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<String> {
        let mut request = self
            .http
            .request(method, url.clone())
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| transport(url, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| transport(url, e))?;
        if !status.is_success() {
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                endpoint: url.path().to_string(),
                body: truncate(text),
            });
        }
        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let label = format!("GET {}", url.path());
        let text = self
            .retry
            .run(&label, || self.send(Method::GET, &url, None))
            .await?;
        serde_json::from_str(&text).map_err(|source| ClientError::Decode {
            endpoint: url.path().to_string(),
            source,
        })
    }
}

fn transport(url: &Url, e: reqwest::Error) -> ClientError {
    ClientError::Transport {
        endpoint: url.path().to_string(),
        message: e.to_string(),
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn list_submissions(&self, workspace: &Workspace) -> Result<Vec<SubmissionSummary>> {
        self.get_json(self.endpoint(workspace, &["submissions"])).await
    }

    async fn get_submission(
        &self,
        workspace: &Workspace,
        submission_id: &str,
    ) -> Result<SubmissionDetail> {
        self.get_json(self.endpoint(workspace, &["submissions", submission_id]))
            .await
    }

    async fn get_workflow_metadata(
        &self,
        workspace: &Workspace,
        submission_id: &str,
        workflow_id: &str,
    ) -> Result<WorkflowMetadata> {
        self.get_json(self.endpoint(
            workspace,
            &["submissions", submission_id, "workflows", workflow_id],
        ))
        .await
    }

    async fn get_method_config(
        &self,
        workspace: &Workspace,
        config_namespace: &str,
        config_name: &str,
    ) -> Result<MethodConfig> {
        self.get_json(self.endpoint(
            workspace,
            &["method_configs", config_namespace, config_name],
        ))
        .await
    }

    async fn list_entities(&self, workspace: &Workspace, kind: EntityKind) -> Result<Vec<Entity>> {
        let mut entities = Vec::new();
        let mut page = 1;
        loop {
            let mut url = self.endpoint(workspace, &["entityQuery", kind.as_str()]);
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("pageSize", &ENTITY_PAGE_SIZE.to_string());
            let batch: EntityPage = self.get_json(url).await?;
            entities.extend(batch.results);
            if page >= batch.result_metadata.filtered_page_count {
                break;
            }
            page += 1;
        }
        tracing::debug!(
            "Fetched {} {} entities from {}",
            entities.len(),
            kind,
            workspace
        );
        Ok(entities)
    }

    async fn update_entity_attributes(
        &self,
        workspace: &Workspace,
        kind: EntityKind,
        entity_id: &str,
        attributes: &BTreeMap<String, Value>,
    ) -> Result<()> {
        let url = self.endpoint(workspace, &["entities", kind.as_str(), entity_id]);
        let ops: Vec<AttributeUpdate<'_>> = attributes
            .iter()
            .map(|(name, value)| AttributeUpdate {
                op: "AddUpdateAttribute",
                attribute_name: name,
                add_update_attribute: value,
            })
            .collect();
        let body = serde_json::to_value(&ops).map_err(|source| ClientError::Decode {
            endpoint: url.path().to_string(),
            source,
        })?;
        let label = format!("PATCH {}", url.path());
        self.retry
            .run(&label, || self.send(Method::PATCH, &url, Some(&body)))
            .await?;
        Ok(())
    }
}
