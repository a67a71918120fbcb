use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use super::models::AppState;

/// Liveness probe; also reports which node answered and its height.
#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let length = state.chain.lock().expect("mutex poisoned").len();
    HttpResponse::Ok().json(json!({
        "status": "up",
        "node_id": state.node_id,
        "length": length,
    }))
}
