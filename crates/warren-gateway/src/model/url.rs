use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateUrlRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct CreateUrlResponse {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
}
