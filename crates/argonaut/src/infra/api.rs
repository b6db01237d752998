//! Upstream control-plane client: REST calls plus the SSE streams the
//! watch pipeline subscribes to.
//!
//! [`ApiClient`] is the seam the rest of the app programs against; it is
//! object-safe so reconcilers hold it as `Arc<dyn ApiClient>` and tests
//! mock it.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::app::{App, HealthStatus, SyncStatus};
use crate::domain::rollback::RollbackRow;
use crate::domain::server::Server;
use crate::domain::tree::ResourceNode;
use crate::errors::AppError;
use crate::infra::watch::WatchEvent;

/// Deadline applied to every unary call; streams have none.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Label carrying the owning application set, when present.
const APPLICATION_SET_LABEL: &str = "argocd.argoproj.io/application-set-name";

/// Boxed async result used by [`ApiClient`] trait methods.
pub type ApiFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Stream of classified application watch events.
pub type AppEventStream = Pin<Box<dyn Stream<Item = Result<WatchEvent, AppError>> + Send>>;

/// Stream of full resource-forest snapshots for one application.
pub type TreeSnapshotStream = Pin<Box<dyn Stream<Item = Result<Vec<ResourceNode>, AppError>> + Send>>;

/// Live and desired manifests for one application, pre-formatting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagedManifests {
    pub live: String,
    pub desired: String,
}

/// Deployment history plus the currently deployed revision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentHistory {
    pub rows: Vec<RollbackRow>,
    pub current_revision: Option<String>,
}

/// Commit metadata for one revision.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevisionMeta {
    pub author: Option<String>,
    pub date: Option<String>,
    pub message: Option<String>,
}

/// Options for a sync request.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncOptions {
    pub prune: bool,
}

/// Options for a rollback request.
#[derive(Clone, Copy, Debug, Default)]
pub struct RollbackOptions {
    pub prune: bool,
    pub dry_run: bool,
}

/// Options for an application delete.
#[derive(Clone, Debug, Default)]
pub struct DeleteOptions {
    pub cascade: bool,
    pub propagation: String,
}

/// TLS trust material taken from the command line.
#[derive(Clone, Debug, Default)]
pub struct TlsOptions {
    pub ca_cert: Option<PathBuf>,
    pub ca_path: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_cert_key: Option<PathBuf>,
}

/// Capabilities the UI requires from the upstream server.
#[cfg_attr(test, mockall::automock)]
pub trait ApiClient: Send + Sync {
    /// Lists all applications visible to the current token.
    fn list_applications(&self) -> ApiFuture<Result<Vec<App>, AppError>>;

    /// Opens the application watch stream.
    fn watch_applications(&self) -> ApiFuture<Result<AppEventStream, AppError>>;

    /// Fetches the current resource forest for one application.
    fn get_resource_tree(&self, app_name: String)
    -> ApiFuture<Result<Vec<ResourceNode>, AppError>>;

    /// Opens the resource-tree stream for one application.
    fn watch_resource_tree(&self, app_name: String)
    -> ApiFuture<Result<TreeSnapshotStream, AppError>>;

    /// Fetches live and desired manifests for diffing.
    fn get_managed_manifests(&self, app_name: String)
    -> ApiFuture<Result<ManagedManifests, AppError>>;

    /// Requests a sync.
    fn sync(&self, app_name: String, options: SyncOptions) -> ApiFuture<Result<(), AppError>>;

    /// Fetches deployment history for the rollback overlay.
    fn get_deployment_history(
        &self,
        app_name: String,
    ) -> ApiFuture<Result<DeploymentHistory, AppError>>;

    /// Fetches commit metadata for one revision.
    fn get_revision_metadata(
        &self,
        app_name: String,
        revision: String,
    ) -> ApiFuture<Result<RevisionMeta, AppError>>;

    /// Requests a rollback to the given history id.
    fn rollback(
        &self,
        app_name: String,
        id: i64,
        options: RollbackOptions,
    ) -> ApiFuture<Result<(), AppError>>;

    /// Deletes an application.
    fn delete_application(
        &self,
        app_name: String,
        options: DeleteOptions,
    ) -> ApiFuture<Result<(), AppError>>;

    /// Validates the current token.
    fn get_user_info(&self) -> ApiFuture<Result<(), AppError>>;
}

/// HTTP implementation of [`ApiClient`].
pub struct ArgoClient {
    base_url: String,
    /// Client with the unary deadline applied.
    client: reqwest::Client,
    /// Client without a deadline, for streaming endpoints.
    stream_client: reqwest::Client,
}

impl ArgoClient {
    /// Builds clients for the given server with the supplied trust material.
    ///
    /// # Errors
    /// Returns [`AppError::Fatal`] when certificates cannot be read or the
    /// HTTP client cannot be constructed.
    pub fn new(server: &Server, tls: &TlsOptions) -> Result<Self, AppError> {
        let base_url = normalize_base_url(&server.base_url);
        let client = Self::builder(server, tls)?
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Fatal(format!("http client: {e}")))?;
        let stream_client = Self::builder(server, tls)?
            .build()
            .map_err(|e| AppError::Fatal(format!("http client: {e}")))?;

        Ok(Self {
            base_url,
            client,
            stream_client,
        })
    }

    fn builder(server: &Server, tls: &TlsOptions) -> Result<reqwest::ClientBuilder, AppError> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if server.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        for path in ca_cert_paths(tls)? {
            let pem = std::fs::read(&path)
                .map_err(|e| AppError::Fatal(format!("read {}: {e}", path.display())))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| AppError::Fatal(format!("parse {}: {e}", path.display())))?;
            builder = builder.add_root_certificate(cert);
        }
        if let (Some(cert), Some(key)) = (&tls.client_cert, &tls.client_cert_key) {
            let mut pem = std::fs::read(cert)
                .map_err(|e| AppError::Fatal(format!("read {}: {e}", cert.display())))?;
            let key_pem = std::fs::read(key)
                .map_err(|e| AppError::Fatal(format!("read {}: {e}", key.display())))?;
            pem.extend_from_slice(&key_pem);
            let identity = reqwest::Identity::from_pem(&pem)
                .map_err(|e| AppError::Fatal(format!("client identity: {e}")))?;
            builder = builder.identity(identity);
        }
        if let Some(token) = &server.token {
            let mut headers = reqwest::header::HeaderMap::new();
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AppError::Fatal(format!("auth header: {e}")))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        Ok(builder)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn normalize_base_url(raw: &str) -> String {
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    with_scheme.trim_end_matches('/').to_string()
}

fn ca_cert_paths(tls: &TlsOptions) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::new();
    if let Some(cert) = &tls.ca_cert {
        paths.push(cert.clone());
    }
    if let Some(dir) = &tls.ca_path {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| AppError::Fatal(format!("read {}: {e}", dir.display())))?;
        for entry in entries.flatten() {
            if entry.path().is_file() {
                paths.push(entry.path());
            }
        }
    }

    Ok(paths)
}

fn map_transport_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() || err.is_connect() {
        return AppError::Connection(err.to_string());
    }

    AppError::Api(err.to_string())
}

async fn ensure_ok(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AppError::AuthRequired(if body.is_empty() {
            status.to_string()
        } else {
            body
        }));
    }

    Err(AppError::Api(format!("{status}: {body}")))
}

// Wire types for the upstream JSON payloads. Unknown fields are ignored
// everywhere so server upgrades do not break decoding.

#[derive(Debug, Deserialize)]
struct WireAppList {
    items: Option<Vec<WireApp>>,
}

#[derive(Debug, Deserialize)]
struct WireApp {
    metadata: WireMetadata,
    #[serde(default)]
    spec: WireSpec,
    #[serde(default)]
    status: WireAppStatus,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    name: String,
    namespace: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireSpec {
    project: Option<String>,
    #[serde(default)]
    destination: WireDestination,
}

#[derive(Debug, Default, Deserialize)]
struct WireDestination {
    server: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireAppStatus {
    sync: Option<WireSyncStatus>,
    health: Option<WireHealthStatus>,
    history: Option<Vec<WireHistoryEntry>>,
}

#[derive(Debug, Deserialize)]
struct WireSyncStatus {
    status: Option<String>,
    revision: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireHealthStatus {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHistoryEntry {
    id: i64,
    revision: Option<String>,
    deployed_at: Option<String>,
    source: Option<WireHistorySource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHistorySource {
    repo_url: Option<String>,
    path: Option<String>,
    target_revision: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireWatchFrame {
    result: Option<WireWatchResult>,
}

#[derive(Debug, Deserialize)]
struct WireWatchResult {
    #[serde(rename = "type")]
    kind: Option<String>,
    application: Option<WireApp>,
}

#[derive(Debug, Deserialize)]
struct WireTreeFrame {
    result: Option<WireTree>,
}

#[derive(Debug, Default, Deserialize)]
struct WireTree {
    nodes: Option<Vec<WireTreeNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTreeNode {
    uid: Option<String>,
    group: Option<String>,
    version: Option<String>,
    kind: Option<String>,
    name: Option<String>,
    namespace: Option<String>,
    #[serde(default)]
    parent_refs: Vec<WireParentRef>,
    health: Option<WireHealthStatus>,
}

#[derive(Debug, Deserialize)]
struct WireParentRef {
    uid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireManagedResources {
    items: Option<Vec<WireManagedResource>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireManagedResource {
    kind: Option<String>,
    name: Option<String>,
    live_state: Option<String>,
    target_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRevisionMeta {
    author: Option<String>,
    date: Option<String>,
    message: Option<String>,
}

impl WireApp {
    fn into_domain(self) -> App {
        let application_set = self.metadata.labels.get(APPLICATION_SET_LABEL).cloned();

        App {
            name: self.metadata.name,
            sync: self
                .status
                .sync
                .as_ref()
                .and_then(|s| s.status.as_deref())
                .map_or(SyncStatus::Unknown, SyncStatus::parse),
            health: self
                .status
                .health
                .as_ref()
                .and_then(|h| h.status.as_deref())
                .map_or(HealthStatus::Unknown, HealthStatus::parse),
            namespace: self.spec.destination.namespace.clone(),
            app_namespace: self.metadata.namespace,
            project: self.spec.project,
            cluster: self
                .spec
                .destination
                .name
                .clone()
                .or(self.spec.destination.server),
            application_set,
        }
    }
}

impl WireTreeNode {
    fn into_domain(self) -> Option<ResourceNode> {
        Some(ResourceNode {
            uid: self.uid?,
            group: self.group.unwrap_or_default(),
            version: self.version.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            namespace: self.namespace,
            parent_uids: self.parent_refs.into_iter().filter_map(|p| p.uid).collect(),
            health: self.health.and_then(|h| h.status),
            status: None,
        })
    }
}

fn decode_watch_frame(data: &str) -> Option<WatchEvent> {
    let frame: WireWatchFrame = match serde_json::from_str(data) {
        Ok(frame) => frame,
        Err(e) => return Some(WatchEvent::ApiError(format!("watch decode: {e}"))),
    };
    let result = frame.result?;
    let app = result.application?;
    match result.kind.as_deref() {
        Some("DELETED") => Some(WatchEvent::AppDeleted(app.metadata.name)),
        _ => Some(WatchEvent::AppUpdated(app.into_domain())),
    }
}

fn decode_tree_frame(data: &str) -> Result<Vec<ResourceNode>, AppError> {
    let frame: WireTreeFrame =
        serde_json::from_str(data).map_err(|e| AppError::Api(format!("tree decode: {e}")))?;

    Ok(frame
        .result
        .unwrap_or_default()
        .nodes
        .unwrap_or_default()
        .into_iter()
        .filter_map(WireTreeNode::into_domain)
        .collect())
}

fn decode_tree_body(data: &str) -> Result<Vec<ResourceNode>, AppError> {
    let tree: WireTree =
        serde_json::from_str(data).map_err(|e| AppError::Api(format!("tree decode: {e}")))?;

    Ok(tree
        .nodes
        .unwrap_or_default()
        .into_iter()
        .filter_map(WireTreeNode::into_domain)
        .collect())
}

fn history_into_domain(history: Vec<WireHistoryEntry>) -> Vec<RollbackRow> {
    let mut rows: Vec<RollbackRow> = history
        .into_iter()
        .map(|entry| RollbackRow {
            id: entry.id,
            revision: entry.revision.unwrap_or_default(),
            deployed_at: entry.deployed_at.unwrap_or_default(),
            source: entry
                .source
                .map(|source| {
                    let repo = source.repo_url.unwrap_or_default();
                    let path = source.path.unwrap_or_default();
                    let target = source.target_revision.unwrap_or_default();
                    format!("{repo} {path} {target}").trim().to_string()
                })
                .unwrap_or_default(),
            author: None,
            date: None,
            message: None,
            meta_error: None,
        })
        .collect();
    // Newest deployment first.
    rows.sort_by(|a, b| b.id.cmp(&a.id));

    rows
}

impl ApiClient for ArgoClient {
    fn list_applications(&self) -> ApiFuture<Result<Vec<App>, AppError>> {
        let request = self.client.get(self.url("/api/v1/applications"));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let list: WireAppList = ensure_ok(response)
                .await?
                .json()
                .await
                .map_err(|e| AppError::Api(format!("decode applications: {e}")))?;

            Ok(list
                .items
                .unwrap_or_default()
                .into_iter()
                .map(WireApp::into_domain)
                .collect())
        })
    }

    fn watch_applications(&self) -> ApiFuture<Result<AppEventStream, AppError>> {
        let request = self.stream_client.get(self.url("/api/v1/stream/applications"));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let response = ensure_ok(response).await?;
            let stream = response
                .bytes_stream()
                .map_err(std::io::Error::other)
                .eventsource()
                .filter_map(|item| async move {
                    match item {
                        Ok(event) => decode_watch_frame(&event.data).map(Ok),
                        Err(e) => Some(Err(AppError::TransientStream(e.to_string()))),
                    }
                });

            Ok(Box::pin(stream) as AppEventStream)
        })
    }

    fn get_resource_tree(
        &self,
        app_name: String,
    ) -> ApiFuture<Result<Vec<ResourceNode>, AppError>> {
        let request = self
            .client
            .get(self.url(&format!("/api/v1/applications/{app_name}/resource-tree")));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let body = ensure_ok(response)
                .await?
                .text()
                .await
                .map_err(|e| AppError::Api(format!("read tree: {e}")))?;

            decode_tree_body(&body)
        })
    }

    fn watch_resource_tree(
        &self,
        app_name: String,
    ) -> ApiFuture<Result<TreeSnapshotStream, AppError>> {
        let request = self.stream_client.get(self.url(&format!(
            "/api/v1/stream/applications/{app_name}/resource-tree"
        )));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let response = ensure_ok(response).await?;
            let stream = response
                .bytes_stream()
                .map_err(std::io::Error::other)
                .eventsource()
                .map(|item| match item {
                    Ok(event) => decode_tree_frame(&event.data),
                    Err(e) => Err(AppError::TransientStream(e.to_string())),
                });

            Ok(Box::pin(stream) as TreeSnapshotStream)
        })
    }

    fn get_managed_manifests(
        &self,
        app_name: String,
    ) -> ApiFuture<Result<ManagedManifests, AppError>> {
        let request = self
            .client
            .get(self.url(&format!("/api/v1/applications/{app_name}/managed-resources")));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let resources: WireManagedResources = ensure_ok(response)
                .await?
                .json()
                .await
                .map_err(|e| AppError::Api(format!("decode managed resources: {e}")))?;

            let mut live = String::new();
            let mut desired = String::new();
            for item in resources.items.unwrap_or_default() {
                let header = format!(
                    "# {} {}\n",
                    item.kind.as_deref().unwrap_or("?"),
                    item.name.as_deref().unwrap_or("?")
                );
                live.push_str(&header);
                live.push_str(item.live_state.as_deref().unwrap_or(""));
                live.push('\n');
                desired.push_str(&header);
                desired.push_str(item.target_state.as_deref().unwrap_or(""));
                desired.push('\n');
            }

            Ok(ManagedManifests { live, desired })
        })
    }

    fn sync(&self, app_name: String, options: SyncOptions) -> ApiFuture<Result<(), AppError>> {
        let request = self
            .client
            .post(self.url(&format!("/api/v1/applications/{app_name}/sync")))
            .json(&serde_json::json!({ "prune": options.prune }));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            ensure_ok(response).await?;

            Ok(())
        })
    }

    fn get_deployment_history(
        &self,
        app_name: String,
    ) -> ApiFuture<Result<DeploymentHistory, AppError>> {
        let request = self
            .client
            .get(self.url(&format!("/api/v1/applications/{app_name}")));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let app: WireApp = ensure_ok(response)
                .await?
                .json()
                .await
                .map_err(|e| AppError::Api(format!("decode application: {e}")))?;

            Ok(DeploymentHistory {
                current_revision: app.status.sync.and_then(|s| s.revision),
                rows: history_into_domain(app.status.history.unwrap_or_default()),
            })
        })
    }

    fn get_revision_metadata(
        &self,
        app_name: String,
        revision: String,
    ) -> ApiFuture<Result<RevisionMeta, AppError>> {
        let request = self.client.get(self.url(&format!(
            "/api/v1/applications/{app_name}/revisions/{revision}/metadata"
        )));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            let meta: WireRevisionMeta = ensure_ok(response)
                .await?
                .json()
                .await
                .map_err(|e| AppError::Api(format!("decode revision metadata: {e}")))?;

            Ok(RevisionMeta {
                author: meta.author,
                date: meta.date,
                message: meta.message,
            })
        })
    }

    fn rollback(
        &self,
        app_name: String,
        id: i64,
        options: RollbackOptions,
    ) -> ApiFuture<Result<(), AppError>> {
        let request = self
            .client
            .post(self.url(&format!("/api/v1/applications/{app_name}/rollback")))
            .json(&serde_json::json!({
                "id": id,
                "prune": options.prune,
                "dryRun": options.dry_run,
            }));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            ensure_ok(response).await?;

            Ok(())
        })
    }

    fn delete_application(
        &self,
        app_name: String,
        options: DeleteOptions,
    ) -> ApiFuture<Result<(), AppError>> {
        let request = self
            .client
            .delete(self.url(&format!("/api/v1/applications/{app_name}")))
            .query(&[
                ("cascade", options.cascade.to_string()),
                ("propagationPolicy", options.propagation),
            ]);
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;
            ensure_ok(response).await?;

            Ok(())
        })
    }

    fn get_user_info(&self) -> ApiFuture<Result<(), AppError>> {
        let request = self.client.get(self.url("/api/v1/session/userinfo"));
        Box::pin(async move {
            let response = request.send().await.map_err(|e| map_transport_error(&e))?;

            #[derive(Deserialize)]
            #[serde(rename_all = "camelCase")]
            struct UserInfo {
                logged_in: Option<bool>,
            }
            let info: UserInfo = ensure_ok(response)
                .await?
                .json()
                .await
                .map_err(|e| AppError::Api(format!("decode userinfo: {e}")))?;
            if info.logged_in == Some(false) {
                return Err(AppError::AuthRequired("not logged in".to_string()));
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_adds_scheme_and_strips_slash() {
        // Assert
        assert_eq!(
            normalize_base_url("argocd.example.com/"),
            "https://argocd.example.com"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8080"),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_decode_watch_frame_maps_modified_to_update() {
        // Arrange
        let data = r#"{"result":{"type":"MODIFIED","application":{
            "metadata":{"name":"web","labels":{"argocd.argoproj.io/application-set-name":"fleet"}},
            "spec":{"project":"platform","destination":{"name":"prod","namespace":"frontend"}},
            "status":{"sync":{"status":"OutOfSync"},"health":{"status":"Degraded"}}}}}"#;

        // Act
        let event = decode_watch_frame(data).expect("no event decoded");

        // Assert
        let WatchEvent::AppUpdated(app) = event else {
            panic!("expected an update");
        };
        assert_eq!(app.name, "web");
        assert_eq!(app.sync, SyncStatus::OutOfSync);
        assert_eq!(app.health, HealthStatus::Degraded);
        assert_eq!(app.cluster.as_deref(), Some("prod"));
        assert_eq!(app.application_set.as_deref(), Some("fleet"));
    }

    #[test]
    fn test_decode_watch_frame_maps_deleted_to_delete() {
        // Arrange
        let data = r#"{"result":{"type":"DELETED","application":{"metadata":{"name":"web"}}}}"#;

        // Act
        let event = decode_watch_frame(data).expect("no event decoded");

        // Assert
        assert_eq!(event, WatchEvent::AppDeleted("web".to_string()));
    }

    #[test]
    fn test_decode_watch_frame_surfaces_garbage_as_api_error() {
        // Act
        let event = decode_watch_frame("not json").expect("no event decoded");

        // Assert
        assert!(matches!(event, WatchEvent::ApiError(_)));
    }

    #[test]
    fn test_decode_tree_body_skips_nodes_without_uid() {
        // Arrange
        let data = r#"{"nodes":[
            {"uid":"1","kind":"Deployment","name":"web","group":"apps","version":"v1",
             "parentRefs":[{"uid":"0"}]},
            {"kind":"Orphan","name":"no-uid"}
        ]}"#;

        // Act
        let nodes = decode_tree_body(data).expect("decode failed");

        // Assert
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].uid, "1");
        assert_eq!(nodes[0].parent_uids, vec!["0".to_string()]);
    }

    #[test]
    fn test_history_rows_sorted_newest_first() {
        // Arrange
        let history = vec![
            WireHistoryEntry {
                id: 1,
                revision: Some("aaa".to_string()),
                deployed_at: Some("2026-01-01".to_string()),
                source: None,
            },
            WireHistoryEntry {
                id: 3,
                revision: Some("ccc".to_string()),
                deployed_at: Some("2026-03-01".to_string()),
                source: None,
            },
        ];

        // Act
        let rows = history_into_domain(history);

        // Assert
        assert_eq!(rows[0].id, 3);
        assert_eq!(rows[1].id, 1);
    }
}
