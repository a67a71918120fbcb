use actix_web::{HttpResponse, Responder, post, web};
use log::debug;

use super::models::{AppState, NewTxRequest, NewTxResponse};

/// Queue a transaction for the next mined block.
#[post("/transactions/new/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        sender,
        receiver,
        amount,
    } = body.into_inner();
    if sender.trim().is_empty() || receiver.trim().is_empty() {
        return HttpResponse::BadRequest().body("sender and receiver required");
    }

    let index = {
        let mut chain = state.chain.lock().expect("mutex poisoned");
        let index = chain.submit_transaction(sender, receiver, amount);
        debug!(
            "POST /transactions/new/ - queued for block {} (pending={})",
            index,
            chain.pending().len()
        );
        index
    };

    HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to block {index}"),
        index,
    })
}
