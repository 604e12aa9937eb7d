use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_HEADER: &str = "x-user-id";
pub const DEVICE_HEADER: &str = "x-device-id";
const DEFAULT_DEVICE: &str = "default";

/// Who is making the request. The session itself is owned by the hosted
/// auth provider; by the time a request reaches us it carries the user id
/// it resolved to, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub device: String,
}

impl Viewer {
    pub fn anonymous(device: impl Into<String>) -> Self {
        Self {
            user_id: None,
            device: device.into(),
        }
    }

    pub fn require_user(&self) -> Result<&str, AppError> {
        self.user_id.as_deref().ok_or(AppError::Unauthorized)
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer {
            user_id: header(parts, USER_HEADER),
            device: header(parts, DEVICE_HEADER).unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
        })
    }
}
