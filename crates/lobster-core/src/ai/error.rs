use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request to the generation API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("could not decode the generation response: {0}")]
    Decode(#[from] serde_json::Error),
}
