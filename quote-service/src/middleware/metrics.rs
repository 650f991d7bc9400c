use axum::{extract::Request, middleware::Next, response::Response};

use crate::services::metrics::{ERRORS_TOTAL, HTTP_REQUESTS_TOTAL};

/// Count every HTTP request by route and status, and errors by class.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let status = response.status();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[path.as_str(), status.as_str()])
        .inc();
    if status.is_client_error() {
        ERRORS_TOTAL.with_label_values(&["client"]).inc();
    } else if status.is_server_error() {
        ERRORS_TOTAL.with_label_values(&["server"]).inc();
    }

    response
}
