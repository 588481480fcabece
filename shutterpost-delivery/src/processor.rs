//! The delivery processor: one logical attempt per call
//!
//! A cycle claims at most one eligible job, resolves its destination,
//! dispatches it to the channel provider, and applies the retry or terminal
//! state transition. Every attempt, however it fails, produces exactly one
//! audit log entry; nothing in here throws past the cycle boundary except
//! store errors, which the scheduler logs and survives.

use std::{sync::Arc, time::Instant};

use shutterpost_store::{
    DeliveryJob, DeliveryJobId, DeliveryLogEntry, DeliveryLogId, DeliveryMethod, DeliveryStatus,
    JobPatch, LogOutcome, RecordStore, now_millis,
};
use tracing::{debug, info, warn};

use crate::{
    contact::ContactDirectory,
    error::{DeliveryError, PreconditionError},
    provider::{OutboundMessage, ProviderRegistry, SendResult, validate_media_url},
    retry::RetryPolicy,
};

/// What a single processing cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No eligible job in the queue
    Idle,
    /// Another worker claimed the job first; nothing was changed or logged
    ClaimLost,
    /// One attempt ran and the job transitioned to `status`
    Processed {
        job_id: DeliveryJobId,
        status: DeliveryStatus,
    },
}

/// Processor for draining the delivery queue one job at a time
#[derive(Debug)]
pub struct DeliveryProcessor {
    store: Arc<dyn RecordStore>,
    providers: Arc<ProviderRegistry>,
    directory: Arc<dyn ContactDirectory>,
    retry: RetryPolicy,
}

impl DeliveryProcessor {
    /// Create a processor over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        providers: Arc<ProviderRegistry>,
        directory: Arc<dyn ContactDirectory>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            providers,
            directory,
            retry,
        }
    }

    /// The configured retry policy
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one processing cycle: claim, attempt, transition, log.
    ///
    /// # Errors
    /// Only record-store failures propagate; provider and precondition
    /// failures are folded into the job's state transition.
    pub async fn process_next(&self) -> Result<CycleOutcome, DeliveryError> {
        let now = now_millis();

        let Some(job) = self.store.find_next_eligible(now).await? else {
            return Ok(CycleOutcome::Idle);
        };

        // The atomic claim is the only cross-instance safety mechanism:
        // another scheduler may have been handed the same job.
        if !self.store.claim(&job.id).await? {
            debug!(job_id = %job.id, "Lost claim race, skipping");
            return Ok(CycleOutcome::ClaimLost);
        }

        let result = self.attempt(&job).await;
        let status = self.transition(&job, &result).await?;

        Ok(CycleOutcome::Processed {
            job_id: job.id,
            status,
        })
    }

    /// Resolve and dispatch one claimed job, folding every failure into the
    /// normalized result shape.
    async fn attempt(&self, job: &DeliveryJob) -> SendResult {
        let started = Instant::now();

        match self.resolve_and_send(job).await {
            Ok(result) => result,
            Err(error) => {
                let elapsed_ms =
                    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!(
                    job_id = %job.id,
                    method = %job.method,
                    error_code = error.error_code(),
                    error = %error,
                    "Delivery attempt failed"
                );
                SendResult::from_error(job.method.as_str(), &error, elapsed_ms)
            }
        }
    }

    async fn resolve_and_send(&self, job: &DeliveryJob) -> Result<SendResult, DeliveryError> {
        match job.method {
            // Hand-delivered; nothing to dispatch
            DeliveryMethod::Manual => {
                return Ok(SendResult::success("manual", None, None, 0));
            }
            DeliveryMethod::Maintenance => {
                return Err(DeliveryError::MissingProvider(job.method));
            }
            DeliveryMethod::Email | DeliveryMethod::Sms | DeliveryMethod::Mms => {}
        }

        let contact = self
            .directory
            .customer(&job.customer_id)
            .await?
            .ok_or_else(|| PreconditionError::CustomerNotFound(job.customer_id.clone()))?;

        let recipient = match job.method {
            DeliveryMethod::Email => contact.email,
            DeliveryMethod::Sms | DeliveryMethod::Mms => contact.phone,
            DeliveryMethod::Manual | DeliveryMethod::Maintenance => None,
        }
        .ok_or_else(|| PreconditionError::NoContact {
            customer_id: job.customer_id.clone(),
            method: job.method,
        })?;

        let media_url = self.directory.session_share_url(&job.session_id).await?;
        if let Some(url) = &media_url {
            validate_media_url(url)?;
        }

        let provider = self
            .providers
            .get(job.method)
            .ok_or(DeliveryError::MissingProvider(job.method))?;

        let body = media_url.as_ref().map_or_else(
            || "Your photos are ready!".to_string(),
            |url| format!("Your photos are ready! View them here: {url}"),
        );

        provider
            .send(&OutboundMessage {
                recipient,
                body,
                media_url,
            })
            .await
    }

    /// Apply the retry/terminal state transition for one completed attempt
    /// and append its audit record.
    async fn transition(
        &self,
        job: &DeliveryJob,
        result: &SendResult,
    ) -> Result<DeliveryStatus, DeliveryError> {
        let attempt = job.attempt + 1;
        let now = now_millis();

        let (status, patch) = if result.success {
            info!(job_id = %job.id, method = %job.method, attempt, "Delivery sent");
            (
                DeliveryStatus::Sent,
                JobPatch {
                    status: Some(DeliveryStatus::Sent),
                    attempt: Some(attempt),
                    sent_at: Some(now),
                    next_retry_at: Some(None),
                    last_error: None,
                },
            )
        } else if !self.retry.should_retry(attempt) {
            let last_error = result
                .error_message
                .clone()
                .or_else(|| result.error_code.clone());
            warn!(
                job_id = %job.id,
                method = %job.method,
                attempt,
                "Delivery failed terminally, attempt budget exhausted"
            );
            (
                DeliveryStatus::Failed,
                JobPatch {
                    status: Some(DeliveryStatus::Failed),
                    attempt: Some(attempt),
                    sent_at: None,
                    next_retry_at: Some(None),
                    last_error,
                },
            )
        } else {
            let next_retry_at = self.retry.next_retry_at(attempt, now);
            debug!(
                job_id = %job.id,
                attempt,
                retry_in_secs = self.retry.backoff_for(attempt),
                "Delivery failed, scheduling retry"
            );
            (
                DeliveryStatus::Pending,
                JobPatch {
                    status: Some(DeliveryStatus::Pending),
                    attempt: Some(attempt),
                    sent_at: None,
                    next_retry_at: Some(Some(next_retry_at)),
                    last_error: None,
                },
            )
        };

        self.store.update_job(&job.id, patch).await?;
        self.store
            .append_log(log_entry(job, attempt, result, now))
            .await?;

        Ok(status)
    }
}

fn log_entry(
    job: &DeliveryJob,
    attempt: u32,
    result: &SendResult,
    created_at: u64,
) -> DeliveryLogEntry {
    DeliveryLogEntry {
        id: DeliveryLogId::generate(),
        delivery_id: job.id.clone(),
        session_id: job.session_id.clone(),
        customer_id: job.customer_id.clone(),
        method: job.method,
        outcome: if result.success {
            LogOutcome::Sent
        } else {
            LogOutcome::Failed
        },
        attempt,
        created_at,
        provider: result.provider.clone(),
        response_code: result.status,
        processing_time_ms: result.processing_time_ms,
        response_data: result.raw_response.clone(),
    }
}
