//! HTTP 中间件
//! 应用状态与请求追踪

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    error::AppError,
    repository::Storage,
    services::{AuthService, ProfileService, TaskService},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务在启动时构造一次，之后所有请求共享。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// 仅 PostgreSQL 后端存在
    pub db: Option<sqlx::PgPool>,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub profile_service: Arc<ProfileService>,
    pub task_service: Arc<TaskService>,
}

impl AppState {
    /// 组装服务；JWT 密钥无效时直接失败
    pub fn build(config: AppConfig, storage: Storage) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);

        let auth_service = Arc::new(AuthService::new(
            storage.accounts.clone(),
            jwt_service.clone(),
        ));
        let profile_service = Arc::new(ProfileService::new(
            storage.accounts.clone(),
            storage.tasks.clone(),
        ));
        let task_service = Arc::new(TaskService::new(
            storage.accounts.clone(),
            storage.tasks.clone(),
        ));

        Ok(Self {
            config,
            db: storage.pool,
            jwt_service,
            auth_service,
            profile_service,
            task_service,
        })
    }
}

tokio::task_local! {
    /// 当前请求的 request_id，错误响应体复用它
    static REQUEST_ID: String;
}

/// 当前请求的 request_id（不在请求追踪范围内时为 None）
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();
    let request_id_for_scope = request_id.clone();

    let method = req.method().clone();
    // 只记录路径，查询串里可能有搜索词
    let path = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let tracked = async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 标签取值保持有限集合
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span);

    REQUEST_ID.scope(request_id_for_scope, tracked).await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
