/// Errors from turning an encoded payload into a [`PixelBuffer`](crate::PixelBuffer).
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    EmptyPayload,
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors from loading adjustment parameters out of a key-value document.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("invalid parameter document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parameter document must be a JSON object")]
    NotAnObject,
    #[error("parameter `{key}` must be {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
    },
}
