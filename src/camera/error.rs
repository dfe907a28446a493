use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a camera backend, before classification.
///
/// `name` follows the platform's own error naming (for browser media
/// devices: `NotAllowedError`, `NotFoundError`, `NotReadableError`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFailure {
    pub name: String,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Recoverable acquisition failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionErrorKind {
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    Unknown,
}

impl AcquisitionErrorKind {
    /// Map a platform failure name onto a category.
    pub fn classify(failure_name: &str) -> Self {
        match failure_name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" | "PermissionDenied" => {
                AcquisitionErrorKind::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError"
            | "ConstraintNotSatisfiedError" | "DeviceNotFound" => {
                AcquisitionErrorKind::DeviceNotFound
            }
            "NotReadableError" | "TrackStartError" | "AbortError" | "DeviceBusy" => {
                AcquisitionErrorKind::DeviceBusy
            }
            _ => AcquisitionErrorKind::Unknown,
        }
    }

    /// User-facing explanation for this category.
    pub fn user_message(&self) -> &'static str {
        match self {
            AcquisitionErrorKind::PermissionDenied => {
                "Camera permission was denied. Please allow camera access to use AR features."
            }
            AcquisitionErrorKind::DeviceNotFound => "No camera was found on this device.",
            AcquisitionErrorKind::DeviceBusy => {
                "The camera is being used by another app. Close it and try again."
            }
            AcquisitionErrorKind::Unknown => {
                "We couldn't access your camera. Please check your settings."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionErrorKind::PermissionDenied => "permission_denied",
            AcquisitionErrorKind::DeviceNotFound => "device_not_found",
            AcquisitionErrorKind::DeviceBusy => "device_busy",
            AcquisitionErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AcquisitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified acquisition failure. All categories are retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category}: {message}")]
pub struct AcquisitionError {
    pub category: AcquisitionErrorKind,
    pub message: String,
}

impl AcquisitionError {
    pub fn new(category: AcquisitionErrorKind, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    /// Error carrying the category's user-facing copy.
    pub fn of_kind(category: AcquisitionErrorKind) -> Self {
        Self::new(category, category.user_message())
    }

    /// A second request issued while one is still pending.
    pub fn already_in_flight() -> Self {
        Self::new(
            AcquisitionErrorKind::DeviceBusy,
            "A camera request is already in progress.",
        )
    }

    /// The stream went away before its first frame decoded.
    pub fn never_ready() -> Self {
        Self::new(
            AcquisitionErrorKind::Unknown,
            "The camera stopped before showing any video. Please try again.",
        )
    }
}

impl From<DeviceFailure> for AcquisitionError {
    fn from(failure: DeviceFailure) -> Self {
        let category = AcquisitionErrorKind::classify(&failure.name);
        tracing::debug!("[camera] Classified '{}' as {}", failure, category);
        Self::of_kind(category)
    }
}
