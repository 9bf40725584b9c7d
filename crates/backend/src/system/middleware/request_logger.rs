use axum::body::Body;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Middleware для логирования HTTP запросов
///
/// Пишет в tracing: метод, путь, статус, длительность (ms), размер ответа.
/// 5xx уходят уровнем `warn`, остальные `info`.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis() as u64;
    // Тело не буферизуем: размер берём из Content-Length, если он есть
    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, duration_ms, size, "request failed");
    } else {
        tracing::info!(%method, %path, status, duration_ms, size, "request");
    }
    response
}
