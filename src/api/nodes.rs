use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::models::{
    AppState, PeerChainResponse, RegisterNodesRequest, RegisterNodesResponse, ResolveResponse,
};
use crate::blockchain::{Chain, resolve};
use crate::error::{Error, Result};

/// Register peer nodes (e.g. `http://192.168.0.5:5000`).
#[post("/nodes/register/")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    let addrs: Vec<String> = body.nodes.iter().filter_map(|n| normalize_peer(n)).collect();
    if addrs.is_empty() {
        return HttpResponse::BadRequest().body("Please supply a valid list of nodes");
    }

    let total_nodes = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        peers.extend(addrs);
        peers.iter().cloned().collect::<Vec<_>>()
    };
    info!("NODES - {} peer(s) registered", total_nodes.len());

    HttpResponse::Created().json(RegisterNodesResponse {
        message: "New nodes have been added",
        total_nodes,
    })
}

/// Replace our chain by the longest valid chain among our peers.
#[get("/nodes/resolve/")]
pub async fn resolve_conflicts(state: web::Data<AppState>) -> impl Responder {
    let peers: Vec<String> = {
        let peers = state.peers.lock().expect("mutex poisoned");
        peers.iter().cloned().collect()
    };

    let mut candidates = Vec::with_capacity(peers.len());
    for peer in &peers {
        candidates.push(fetch_chain(&state.http, peer).await);
    }

    let mut chain = state.chain.lock().expect("mutex poisoned");
    let (chosen, replaced) = resolve(chain.clone(), candidates);
    *chain = chosen;

    HttpResponse::Ok().json(ResolveResponse {
        message: if replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        },
        replaced,
        length: chain.len(),
    })
}

/// Download a peer's chain. Transport failures become
/// [`Error::PeerUnreachable`]; a malformed body is an [`Error::Structure`].
pub async fn fetch_chain(client: &reqwest::Client, peer: &str) -> Result<Chain> {
    let unreachable = |reason: String| Error::PeerUnreachable {
        peer: peer.to_string(),
        reason,
    };

    let url = format!("http://{peer}/api/v1/chain/");
    debug!("NODES - fetching {url}");
    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| unreachable(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(unreachable(format!("HTTP {}", resp.status())));
    }
    let parsed: PeerChainResponse = resp.json().await.map_err(|e| {
        if e.is_decode() {
            Error::Structure(e.to_string())
        } else {
            unreachable(e.to_string())
        }
    })?;
    if parsed.length != parsed.chain.len() {
        return Err(Error::Structure(format!(
            "peer {peer} reported length {} for {} blocks",
            parsed.length,
            parsed.chain.len()
        )));
    }
    Ok(parsed.chain)
}

/// Reduce an address to its `host[:port]` part.
fn normalize_peer(addr: &str) -> Option<String> {
    let addr = addr.trim().trim_end_matches('/');
    if addr.is_empty() {
        return None;
    }
    match reqwest::Url::parse(addr) {
        Ok(url) if url.has_host() => {
            let host = url.host_str()?;
            Some(match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        }
        // Bare "host:port" has no scheme
        _ => Some(addr.to_string()),
    }
}
