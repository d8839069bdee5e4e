use axum::body::{self, Body};
use serde::de::DeserializeOwned;

/// Reads a whole response body. Panics and fails the test if the body can't be read.
pub async fn read_body_bytes(response_body: Body) -> Vec<u8> {
    body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!")
        .to_vec()
}

/// Reads a response body and deserializes it as JSON into the requested type. Panics and fails
/// the test if either step fails.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: Body) -> T {
    let bytes = read_body_bytes(response_body).await;

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse response body as JSON! Error: {err}, received body: {:?}",
            String::from_utf8_lossy(&bytes)
        )
    })
}
