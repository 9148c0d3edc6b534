//! API Client

use serde::Serialize;

/// One card of the three-card spread, as the server expects it
#[derive(Clone, Debug, Serialize)]
pub struct SpreadCard {
    pub position: String,
    #[serde(rename = "cardName")]
    pub card_name: String,
    #[serde(rename = "isReversed")]
    pub reversed: bool,
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Fetch the authoritative coin balance
pub async fn fetch_balance(token: &str) -> Result<u64, String> {
    let response = reqwest::Client::new()
        .get("/api/balance")
        .header("Authorization", bearer(token))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        let data: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(data["coins"].as_u64().unwrap_or(0))
    } else {
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(data["error"].as_str().unwrap_or("Request failed").to_string())
    }
}

/// Request a reading. The server debits the reading cost before it starts
/// streaming, so an insufficient balance comes back as an error with no
/// text.
pub async fn request_fortune(
    token: &str,
    question: &str,
    cards: &[SpreadCard],
) -> Result<String, String> {
    let body = serde_json::json!({
        "question": question,
        "cards": cards,
    });

    let response = reqwest::Client::new()
        .post("/api/fortune")
        .header("Authorization", bearer(token))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.text().await.map_err(|e| e.to_string())
    } else {
        let data: serde_json::Value = response.json().await.unwrap_or_default();
        Err(data["error"]
            .as_str()
            .unwrap_or("The cards are silent right now")
            .to_string())
    }
}

/// Create a Stripe checkout session for a coin pack; returns the hosted
/// checkout URL to redirect to
pub async fn create_checkout(price_id: &str, uid: &str) -> Result<String, String> {
    let body = serde_json::json!({
        "priceId": price_id,
        "uid": uid,
    });

    let response = reqwest::Client::new()
        .post("/api/checkout")
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        let data: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(data["url"].as_str().unwrap_or("").to_string())
    } else {
        Err("Failed to create checkout".into())
    }
}
