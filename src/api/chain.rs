use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AppState, ChainResponse, MineResponse, ValidateResponse};
use crate::pow::{Sequential, find_proof};
use crate::transaction::{MINING_REWARD, Transaction};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        chain: &chain,
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ValidateResponse {
        valid: chain.validate(),
        length: chain.len(),
    })
}

/// Mine a new block:
/// - brute-force the next proof off the request thread
/// - reward this node with a coinbase transaction
/// - seal the pending transactions into the block
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let last_proof = {
        let chain = state.chain.lock().expect("mutex poisoned");
        match chain.last_block() {
            Some(block) => block.proof(),
            None => return HttpResponse::InternalServerError().body("missing genesis block"),
        }
    };

    // PoW without holding the chain lock
    let proof = match web::block(move || find_proof(&mut Sequential::new(), last_proof)).await {
        Ok(Ok(proof)) => proof,
        Ok(Err(err)) => return HttpResponse::InternalServerError().body(err.to_string()),
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };

    let mut chain = state.chain.lock().expect("mutex poisoned");

    // The head may have moved (consensus) while we were searching.
    if let Err(err) = chain.validate_append(proof) {
        warn!("MINER - stale proof {proof}: {err}");
        return HttpResponse::Conflict().body(err.to_string());
    }
    chain.push_transaction(Transaction::coinbase(state.node_id.clone(), MINING_REWARD));

    let index = chain.len();
    let block = match chain.mine(proof) {
        Ok(block) => block,
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };
    info!(
        "MINER - sealed block #{} (proof={}, txs={})",
        index,
        block.proof(),
        block.transactions().len()
    );
    HttpResponse::Ok().json(MineResponse {
        message: "New Block Forged",
        index,
        proof: block.proof(),
        prev_hash: block.prev_hash(),
        block,
    })
}
