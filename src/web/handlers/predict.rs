use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{debug, warn};

use crate::web::model::{Prediction, PredictError};
use crate::web::models::{PredictResponse, Slot};
use crate::web::server::AppState;

/// First `message` query parameter; a missing or unparsable query reads as empty
fn message_param(req: &HttpRequest) -> String {
    web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .ok()
        .and_then(|query| {
            query
                .into_inner()
                .into_iter()
                .find(|(key, _)| key == "message")
                .map(|(_, value)| value)
        })
        .unwrap_or_default()
}

/// Response for `message`; `outcome` is `None` when nothing was classified
pub fn build_response(message: String, outcome: Option<Result<Prediction, PredictError>>) -> PredictResponse {
    let mut response = PredictResponse { message, ..PredictResponse::default() };
    match outcome {
        Some(Ok(prediction)) => {
            response.predict = Slot::Filled(vec![prediction.label.as_str().to_string()]);
            response.predict_proba = Slot::Filled(vec![prediction.probabilities]);
        }
        Some(Err(e)) => {
            warn!("Prediction failed: {}", e);
            response.error = format!("{} {}", e.kind(), e);
        }
        None => {}
    }
    response
}

async fn classify(data: &AppState, message: &str) -> Result<Prediction, PredictError> {
    let cache = match &data.cache {
        Some(cache) => cache,
        None => return data.model.predict(message),
    };

    if let Some(hit) = cache.lock().await.get(message) {
        debug!("Prediction cache hit");
        return Ok(*hit);
    }
    let prediction = data.model.predict(message)?;
    cache.lock().await.put(message.to_string(), prediction);
    Ok(prediction)
}

/// Classify the `message` query parameter
pub async fn predict(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let message = message_param(&req);
    let outcome = if message.is_empty() {
        None
    } else {
        Some(classify(&data, &message).await)
    };

    HttpResponse::Ok().json(build_response(message, outcome))
}
