//! Access control seam
//!
//! The gateway asks an `AccessGate` whether a principal may watch a video before
//! any key is resolved. Deployments plug their authorization layer in here; the
//! gateway itself never changes when real rules land.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Principal, VideoRecord};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    /// Why access was refused (or granted, when the gate wants to say so).
    pub reason: Option<String>,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    /// Turn a refusal into `AppError::Forbidden`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.allowed {
            Ok(())
        } else {
            Err(AppError::forbidden(
                self.reason.unwrap_or_else(|| "access denied".to_string()),
            ))
        }
    }
}

/// Capability check consulted for every catalog-backed stream request.
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn check(
        &self,
        principal: &Principal,
        video: &VideoRecord,
    ) -> Result<AccessDecision, AppError>;
}

/// Grants every request.
pub struct AllowAll;

#[async_trait]
impl AccessGate for AllowAll {
    async fn check(
        &self,
        _principal: &Principal,
        _video: &VideoRecord,
    ) -> Result<AccessDecision, AppError> {
        Ok(AccessDecision::allow())
    }
}

/// Refuses every request.
pub struct DenyAll;

#[async_trait]
impl AccessGate for DenyAll {
    async fn check(
        &self,
        _principal: &Principal,
        _video: &VideoRecord,
    ) -> Result<AccessDecision, AppError> {
        Ok(AccessDecision::deny("access to this video is disabled"))
    }
}
