//! HTTP client for the field-operations REST backend

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::{
    AssignProjectRequest, AssignTechnicianRequest, Checkpoint, Employee, EmployeeCreate,
    EmployeeUpdate, Issue, Project,
};
use shared::response::{CountResponse, ErrorBody, MessageResponse, Wrapped};

use crate::{ClientConfig, ClientError, ClientResult};

/// Backend operations the rest of the client is written against.
///
/// Object safe so stores and the matcher can hold `Arc<dyn FieldApi>`.
#[async_trait]
pub trait FieldApi: Send + Sync {
    async fn list_employees(&self) -> ClientResult<Vec<Employee>>;
    async fn create_employee(&self, payload: &EmployeeCreate) -> ClientResult<Employee>;
    async fn update_employee(&self, id: i64, payload: &EmployeeUpdate) -> ClientResult<Employee>;
    async fn delete_employee(&self, id: i64) -> ClientResult<()>;

    async fn list_projects(&self) -> ClientResult<Vec<Project>>;

    async fn list_issues(&self) -> ClientResult<Vec<Issue>>;
    async fn pending_issue_count(&self) -> ClientResult<u64>;
    async fn assign_technician(&self, request: &AssignTechnicianRequest) -> ClientResult<Issue>;

    async fn assign_project(
        &self,
        employee_id: i64,
        request: &AssignProjectRequest,
    ) -> ClientResult<MessageResponse>;

    async fn list_checkpoints(&self, project_id: i64) -> ClientResult<Vec<Checkpoint>>;
}

/// Network HTTP client
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl NetworkHttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(config.token.clone())),
        })
    }

    /// Set the authentication token
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// Swap the bearer token (login, impersonation, return to admin)
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    /// Get the current token
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self.authorize(self.client.post(&url).json(body)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(path);
        tracing::debug!(%url, "PUT");
        let response = self.authorize(self.client.put(&url).json(body)).send().await?;
        Self::handle_response(response).await
    }

    /// Make a DELETE request, ignoring any response body
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let url = self.url(path);
        tracing::debug!(%url, "DELETE");
        let response = self.authorize(self.client.delete(&url)).send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                _ => ClientError::Api {
                    status: status.as_u16(),
                    message: body.message,
                },
            });
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(text),
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(text)
            }
            _ => ClientError::Internal(text),
        })
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl FieldApi for NetworkHttpClient {
    async fn list_employees(&self) -> ClientResult<Vec<Employee>> {
        Ok(self.get::<Wrapped<Vec<Employee>>>("employees").await?.into_inner())
    }

    async fn create_employee(&self, payload: &EmployeeCreate) -> ClientResult<Employee> {
        Ok(self
            .post::<Wrapped<Employee>, _>("employees", payload)
            .await?
            .into_inner())
    }

    async fn update_employee(&self, id: i64, payload: &EmployeeUpdate) -> ClientResult<Employee> {
        Ok(self
            .put::<Wrapped<Employee>, _>(&format!("employees/{id}"), payload)
            .await?
            .into_inner())
    }

    async fn delete_employee(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("employees/{id}")).await
    }

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        Ok(self.get::<Wrapped<Vec<Project>>>("projects").await?.into_inner())
    }

    async fn list_issues(&self) -> ClientResult<Vec<Issue>> {
        Ok(self.get::<Wrapped<Vec<Issue>>>("issues").await?.into_inner())
    }

    async fn pending_issue_count(&self) -> ClientResult<u64> {
        Ok(self
            .get::<CountResponse>("issues/pending-count")
            .await?
            .value())
    }

    async fn assign_technician(&self, request: &AssignTechnicianRequest) -> ClientResult<Issue> {
        Ok(self
            .post::<Wrapped<Issue>, _>("issues/assign", request)
            .await?
            .into_inner())
    }

    async fn assign_project(
        &self,
        employee_id: i64,
        request: &AssignProjectRequest,
    ) -> ClientResult<MessageResponse> {
        self.post(&format!("employees/{employee_id}/assign-project"), request)
            .await
    }

    async fn list_checkpoints(&self, project_id: i64) -> ClientResult<Vec<Checkpoint>> {
        Ok(self
            .get::<Wrapped<Vec<Checkpoint>>>(&format!("projects/{project_id}/checkpoints"))
            .await?
            .into_inner())
    }
}
