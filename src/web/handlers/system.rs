use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use crate::web::models::StatusResponse;
use crate::web::server::AppState;

/// Report model facts, uptime and cache usage
pub async fn get_status(data: web::Data<AppState>) -> impl Responder {
    let cached_predictions = match &data.cache {
        Some(cache) => cache.lock().await.len(),
        None => 0,
    };

    let response = StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: data.started_at,
        uptime_seconds: (Utc::now() - data.started_at).num_seconds(),
        model: data.model.summary().clone(),
        cache_capacity: data.cache_capacity,
        cached_predictions,
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{test, web, App};
    use serde_json::Value;

    use crate::web::model::tests::trained;
    use crate::web::server::{configure, AppState};

    #[actix_web::test]
    async fn test_status_reports_model() {
        let data = web::Data::new(AppState::new(Arc::new(trained()), 8));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::get().uri("/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"]["classifier"], "LinearSVC");
        assert_eq!(body["model"]["training_size"], 30);
        assert_eq!(body["cache_capacity"], 8);
        assert_eq!(body["cached_predictions"], 0);
        // RFC 3339 timestamp, e.g. 2019-06-24T01:14:45.123Z
        let started = body["started_at"].as_str().unwrap();
        assert!(started.parse::<chrono::DateTime<chrono::Utc>>().is_ok());
    }
}
