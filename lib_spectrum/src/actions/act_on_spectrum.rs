//! # ActOnSpectrum
//!
//! Fires the operator action at most once at a time. The request is a plain GET
//! without a body and the response body is ignored. Clients built by
//! [`ActionTrigger::for_backend`] never retry, so one click is one action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Method;
use thiserror::Error;

use crate::retrieve::ky_http::{ApiClient, ApiClientOptions};

/// Endpoint receiving the operator action.
pub const ACTION_ENDPOINT: &str = "ActOnSpectrum";

/// Errors raised while sending the action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The backend URL could not be used to build a client.
    #[error("Invalid action endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request never produced an HTTP response.
    #[error("Action request failed: {0}")]
    Request(String),
}

/// Result of a trigger attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The vehicle does not ask for an action; nothing was sent.
    NotRequired,
    /// Another request is still pending; nothing was sent.
    AlreadyInFlight,
    /// The backend accepted the action.
    Completed {
        /// HTTP status.
        status: u16,
    },
    /// The backend answered with a non-2xx status.
    Rejected {
        /// HTTP status.
        status: u16,
        /// Response body, if any.
        body: Option<String>,
    },
}

/// Clears the in-flight flag when the request finishes, whatever the outcome.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Sends `GET <base>/<endpoint>`. Clones share the in-flight flag.
#[derive(Clone)]
pub struct ActionTrigger {
    client: ApiClient,
    endpoint: String,
    in_flight: Arc<AtomicBool>,
}

impl ActionTrigger {
    /// Trigger sending to `endpoint` through `client`.
    pub fn new(client: ApiClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Trigger for `ActOnSpectrum` on the backend at `base_url`, without retries.
    pub fn for_backend(base_url: &str) -> Result<Self, ActionError> {
        let options = ApiClientOptions {
            max_retries: 0,
            ..ApiClientOptions::default()
        };
        let client = ApiClient::with_options(base_url, None, options)
            .map_err(|e| ActionError::InvalidEndpoint(format!("{e:#}")))?;
        Ok(Self::new(client, ACTION_ENDPOINT))
    }

    /// Endpoint the action is sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True while a request is pending.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the action control should be clickable.
    pub fn is_enabled(&self, action_required: bool) -> bool {
        action_required && !self.is_in_flight()
    }

    /// Sends the action if the vehicle requires it and nothing is pending.
    ///
    /// # Errors
    /// Only transport failures are errors. A non-2xx answer is
    /// [`ActionOutcome::Rejected`]; the in-flight flag is cleared in every case.
    pub async fn trigger(&self, action_required: bool) -> Result<ActionOutcome, ActionError> {
        if !action_required {
            tracing::debug!("Action not required, ignoring trigger");
            return Ok(ActionOutcome::NotRequired);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Action already in flight, ignoring trigger");
            return Ok(ActionOutcome::AlreadyInFlight);
        };

        tracing::info!(endpoint = %self.endpoint, "Sending operator action");
        let resp = self
            .client
            .request_text::<()>(Method::GET, &self.endpoint, None, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Operator action failed");
                ActionError::Request(format!("{e:#}"))
            })?;

        if resp.success {
            tracing::info!(status = resp.status, "Operator action accepted");
            Ok(ActionOutcome::Completed { status: resp.status })
        } else {
            tracing::warn!(status = resp.status, "Operator action rejected");
            Ok(ActionOutcome::Rejected {
                status: resp.status,
                body: resp.error_body.filter(|b| !b.is_empty()),
            })
        }
    }
}
