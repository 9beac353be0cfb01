use multiindex::{MultiindexError, Page};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub message: String,
    pub status: AvailabilityStatus,
}

impl AvailabilityResponse {
    pub fn available(message: impl Into<String>) -> Self {
        AvailabilityResponse {
            message: message.into(),
            status: AvailabilityStatus::Available,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        AvailabilityResponse {
            message: message.into(),
            status: AvailabilityStatus::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResponse {
    pub message: String,
}

impl SavedResponse {
    pub fn saved() -> Self {
        SavedResponse {
            message: "Saved".to_string(),
        }
    }
}

/// Body of `POST /store`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRequest {
    pub url: String,
    pub title: String,
    pub text: String,
}

impl StoreRequest {
    /// Parse and validate a store payload: a JSON object whose `url`, `title`
    /// and `text` members are all strings. Extra members are ignored.
    pub fn from_json(body: &[u8]) -> Result<Self, MultiindexError> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let obj = value
            .as_object()
            .ok_or_else(|| MultiindexError::Json("expected a JSON object".to_string()))?;

        let field = |name: &str| -> Result<String, MultiindexError> {
            obj.get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| MultiindexError::MissingField(name.to_string()))
        };

        Ok(StoreRequest {
            url: field("url")?,
            title: field("title")?,
            text: field("text")?,
        })
    }

    pub fn into_page(self) -> Page {
        Page::new(self.url, self.title, self.text)
    }
}
