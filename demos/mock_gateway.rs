//! Stand-in reader gateway for trying the proxy without hardware.
//!
//! ```text
//! cargo run --example mock_gateway
//! cargo run -- --port 4001
//! cargo run --bin reader-cli -- 1:APDU:00A4040300 2:RESET
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{extract::Query, http::HeaderMap, routing::get, Router};

async fn basic(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> String {
    let token = headers
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<none>");
    println!("GET {:?} (token: {})", params, token);

    if params.get("reset").map(String::as_str) == Some("1") {
        "null\n3B8F8001804F0CA000000306030001000000006A\n".to_string()
    } else if let Some(apdu) = params.get("apdu") {
        if apdu.starts_with("00A4") {
            "9000\n".to_string()
        } else {
            "6D00\n".to_string()
        }
    } else {
        "null\n".to_string()
    }
}

#[tokio::main]
async fn main() {
    let app = Router::new().route("/api/v1/basic", get(basic));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Mock reader gateway listening on http://{}/api/v1/basic", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
