//! # Typed API client
//!
//! Async wrapper over the ledger's REST API. Requests carry the session's
//! bearer token; a 401 triggers one shared refresh and a single retry.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::session::{Credentials, Session, TokenRefresher};
use shared::{
    AdminStatsResponse, AdminTableResponse, ChartsResponse, CreateTransactionRequest, EmployeePercentageResponse,
    EmployeeSheetResponse, ErrorResponse, ImportSheetRequest, ImportSheetResponse, LoginRequest, LoginResponse,
    PercentageHistoryResponse, RefreshRequest, RefreshResponse, SetEmployeePercentageRequest, SheetRow,
    Transaction, TransactionListRequest, UpdateCommentRequest, UserInfo, UserStatsResponse, Worker,
};

/// Query of the charts endpoint
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartsQuery {
    /// `all`, `specific` or `range`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub show_all: bool,
}

/// Query of the admin sheet view
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<Worker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<Worker>,
    /// `asc` or `desc`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkerQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    worker: Option<Worker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<NaiveDate>,
}

impl WorkerQuery {
    fn new(worker: Option<Worker>, range: &TransactionListRequest) -> Self {
        Self {
            worker,
            start_date: range.start_date,
            end_date: range.end_date,
        }
    }
}

/// Refreshes over `POST /api/auth/refresh`
struct HttpRefresher {
    http: reqwest::Client,
    base_url: String,
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<String> {
        let response = self
            .http
            .post(format!("{}/api/auth/refresh", self.base_url))
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<RefreshResponse>().await?.access_token)
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::new();
        let refresher = Arc::new(HttpRefresher {
            http: http.clone(),
            base_url: base_url.clone(),
        });

        Self {
            http,
            base_url,
            session: Session::new(refresher),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    // ---------------------------------------------------------------------
    // Authentication
    // ---------------------------------------------------------------------

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<UserInfo> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials);
        }

        let login: LoginResponse = check_status(response).await?.json().await?;
        self.session
            .set_credentials(Credentials {
                access_token: login.access_token,
                refresh_token: login.refresh_token,
            })
            .await;

        info!("Logged in as {}", login.user.username);
        Ok(login.user)
    }

    /// Drop the session and revoke its refresh token on the server
    pub async fn logout(&self) -> ClientResult<()> {
        let Some(credentials) = self.session.clear().await else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.url("/auth/logout"))
            .json(&RefreshRequest {
                refresh_token: credentials.refresh_token,
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> ClientResult<UserInfo> {
        self.get_json("/auth/me").await
    }

    // ---------------------------------------------------------------------
    // Services
    // ---------------------------------------------------------------------

    pub async fn list_transactions(&self, range: &TransactionListRequest) -> ClientResult<Vec<Transaction>> {
        self.get_query("/services", range).await
    }

    pub async fn create_transaction(&self, request: &CreateTransactionRequest) -> ClientResult<Transaction> {
        let response = self.execute(Method::POST, "/services", |b| b.json(request)).await?;
        Ok(response.json().await?)
    }

    pub async fn update_comment(&self, id: i64, comment: &str) -> ClientResult<Transaction> {
        let body = UpdateCommentRequest {
            comment: comment.to_string(),
        };
        let response = self
            .execute(Method::PUT, &format!("/services/{}/comment", id), |b| b.json(&body))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn delete_transaction(&self, id: i64) -> ClientResult<()> {
        self.execute(Method::DELETE, &format!("/services/{}", id), |b| b).await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    pub async fn employee_percentage(&self) -> ClientResult<EmployeePercentageResponse> {
        self.get_json("/settings/employee-percentage").await
    }

    pub async fn set_employee_percentage(
        &self,
        request: &SetEmployeePercentageRequest,
    ) -> ClientResult<EmployeePercentageResponse> {
        let response = self
            .execute(Method::PUT, "/settings/employee-percentage", |b| b.json(request))
            .await?;
        Ok(response.json().await?)
    }

    pub async fn percentage_history(&self) -> ClientResult<PercentageHistoryResponse> {
        self.get_json("/settings/employee-percentage/history").await
    }

    // ---------------------------------------------------------------------
    // Dashboard
    // ---------------------------------------------------------------------

    pub async fn admin_stats(&self) -> ClientResult<AdminStatsResponse> {
        self.get_json("/services/stats/admin").await
    }

    /// Stats of the caller's worker; admins name the worker
    pub async fn user_stats(&self, worker: Option<Worker>) -> ClientResult<UserStatsResponse> {
        let query = WorkerQuery::new(worker, &TransactionListRequest::default());
        self.get_query("/services/stats/user", &query).await
    }

    pub async fn sheet(&self, query: &SheetQuery) -> ClientResult<Vec<SheetRow>> {
        self.get_query("/dashboard/sheet", query).await
    }

    pub async fn employee_sheet(
        &self,
        worker: Option<Worker>,
        range: &TransactionListRequest,
    ) -> ClientResult<EmployeeSheetResponse> {
        self.get_query("/dashboard/sheet/mine", &WorkerQuery::new(worker, range))
            .await
    }

    pub async fn table(&self, range: &TransactionListRequest) -> ClientResult<AdminTableResponse> {
        self.get_query("/dashboard/table", range).await
    }

    pub async fn charts(&self, query: &ChartsQuery) -> ClientResult<ChartsResponse> {
        self.get_query("/dashboard/charts", query).await
    }

    pub async fn import_sheet(&self, request: &ImportSheetRequest) -> ClientResult<ImportSheetResponse> {
        let response = self.execute(Method::POST, "/import/sheet", |b| b.json(request)).await?;
        Ok(response.json().await?)
    }

    // ---------------------------------------------------------------------
    // Plumbing
    // ---------------------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.execute(Method::GET, path, |b| b).await?;
        Ok(response.json().await?)
    }

    async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.execute(Method::GET, path, |b| b.query(query)).await?;
        Ok(response.json().await?)
    }

    /// Send an authorized request, refreshing the access token once on 401
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> ClientResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let token = self.session.access_token().await.ok_or(ClientError::SessionExpired)?;
        debug!("{} {}", method, path);

        let response = self.send_with(&method, path, &token, &build).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        let token = self.session.refresh_after_unauthorized(&token).await?;
        let retried = self.send_with(&method, path, &token, &build).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("{} {} still unauthorized after refresh", method, path);
            self.session.clear().await;
            return Err(ClientError::SessionExpired);
        }
        check_status(retried).await
    }

    async fn send_with<F>(&self, method: &Method, path: &str, token: &str, build: &F) -> ClientResult<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let request = self.http.request(method.clone(), self.url(path)).bearer_auth(token);
        Ok(build(request).send().await?)
    }
}

/// Map error statuses onto [`ClientError`], reading the `{"error": ...}` body
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| status.to_string());

    Err(match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::UNAUTHORIZED => ClientError::SessionExpired,
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        s if s.is_server_error() => ClientError::TransientNetwork(message),
        _ => ClientError::Decode(format!("{}: {}", status, message)),
    })
}
