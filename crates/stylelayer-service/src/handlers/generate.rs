//! Generation request handler: deduct, submit, poll, resolve.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use stylelayer_core::{ExtractType, GenerationId, CREDITS_PER_GENERATION};
use stylelayer_store::{NewGeneration, StoreError};

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::state::AppState;
use crate::vision::{GenerationResult, PollOutcome, VisionClient};

// ============================================================================
// Constants
// ============================================================================

/// Inline base64 results larger than this (decoded) are refused.
const MAX_INLINE_RESULT_BYTES: usize = 4 * 1024 * 1024;

/// Generation request body.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Public URL of the source image.
    pub image_url: String,
    /// Extraction type to apply.
    pub layout_style: ExtractType,
    /// Free-text target, required when `layout_style` is `custom`.
    pub custom_target: Option<String>,
}

/// Generation response.
///
/// Expected failures after the charge (submission failure, timeout, lost
/// task) come back as 200 with `ok: false` and a stable `reason`; the
/// credits have already been refunded by then.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Whether a result was produced.
    pub ok: bool,
    /// The task id, present whenever credits were charged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    /// Result URL (or data URL for inline payloads) on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    /// Stable failure reason on `ok: false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GenerateResponse {
    fn success(id: &GenerationId, result_url: String) -> Self {
        Self {
            ok: true,
            generation_id: Some(id.to_string()),
            result_url: Some(result_url),
            reason: None,
        }
    }

    fn failure(id: &GenerationId, reason: &str) -> Self {
        Self {
            ok: false,
            generation_id: Some(id.to_string()),
            result_url: None,
            reason: Some(reason.to_string()),
        }
    }
}

/// `POST /api/generate` - run one generation end to end.
///
/// Charges 1 credit up front inside the admission transaction, then
/// submits and polls the vision task. Every non-success outcome after the
/// charge flows through the refund path exactly once.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if !request.image_url.starts_with("http") {
        return Err(ApiError::BadRequest("image_url must be a public URL".into()));
    }

    let prompt = build_prompt(&request)?;

    let vision = state
        .vision
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("generation service is not configured".into()))?
        .clone();

    let task = state
        .store
        .reserve_generation(&NewGeneration {
            identity_id: session.user.identity_id.clone(),
            kind: request.layout_style.as_str().to_string(),
            original_url: request.image_url.clone(),
            prompt_used: prompt.clone(),
            cost: CREDITS_PER_GENERATION,
        })
        .await
        .map_err(|e| match e {
            StoreError::InsufficientCredits { balance, required } => {
                ApiError::InsufficientCredits { balance, required }
            }
            other => ApiError::from(other),
        })?;

    let task_id = match vision.submit_task(&request.image_url, &prompt).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(generation_id = %task.id, error = %e, "Task submission failed");
            refund(&state, &task.id).await;
            return Ok(Json(GenerateResponse::failure(&task.id, "submission_failed")));
        }
    };

    match poll_until_done(&state, &vision, &task_id).await {
        Ok(Some(result)) => resolve(&state, &task.id, result).await,
        Ok(None) => {
            tracing::warn!(generation_id = %task.id, "Generation timed out");
            refund(&state, &task.id).await;
            Ok(Json(GenerateResponse::failure(&task.id, "timeout")))
        }
        Err(reason) => {
            tracing::warn!(generation_id = %task.id, reason, "Generation failed");
            refund(&state, &task.id).await;
            Ok(Json(GenerateResponse::failure(&task.id, reason)))
        }
    }
}

/// Poll the vision task until it finishes, is lost, or the attempt budget
/// runs out. `Ok(None)` means timeout.
async fn poll_until_done(
    state: &AppState,
    vision: &VisionClient,
    task_id: &str,
) -> Result<Option<GenerationResult>, &'static str> {
    let interval = Duration::from_millis(state.config.vision_poll_interval_ms);

    for attempt in 0..state.config.vision_poll_attempts {
        if attempt > 0 {
            tokio::time::sleep(interval).await;
        }

        match vision.get_result(task_id).await {
            Ok(PollOutcome::Done(result)) => return Ok(Some(result)),
            Ok(PollOutcome::InProgress) => {}
            Ok(PollOutcome::Gone) => return Err("task_lost"),
            Err(e) => {
                tracing::warn!(task_id, error = %e, "Result poll failed");
                return Err("generation_failed");
            }
        }
    }

    Ok(None)
}

/// Finalise a finished task: enforce the inline-size cap, record the
/// result and report success.
async fn resolve(
    state: &AppState,
    id: &GenerationId,
    result: GenerationResult,
) -> Result<Json<GenerateResponse>, ApiError> {
    let result_url = match result {
        GenerationResult::Url(url) => url,
        GenerationResult::Inline(b64) => {
            // Ballpark decoded size; 3 bytes per 4 base64 chars.
            if b64.len() / 4 * 3 > MAX_INLINE_RESULT_BYTES {
                tracing::warn!(generation_id = %id, encoded_len = b64.len(), "Inline result too large");
                refund(state, id).await;
                return Ok(Json(GenerateResponse::failure(id, "result_too_large")));
            }
            format!("data:image/png;base64,{b64}")
        }
    };

    let completed = state.store.complete_generation(id, &result_url).await?;
    if !completed {
        // The task left PENDING some other way; do not report a result
        // the ledger does not back.
        tracing::warn!(generation_id = %id, "Task was no longer pending at completion");
        return Ok(Json(GenerateResponse::failure(id, "generation_failed")));
    }

    tracing::info!(generation_id = %id, "Generation completed");
    Ok(Json(GenerateResponse::success(id, result_url)))
}

/// Refund a failed task, logging rather than surfacing storage errors so
/// the caller still receives the failure reason.
async fn refund(state: &AppState, id: &GenerationId) {
    match state.store.fail_and_refund_generation(id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(generation_id = %id, "Refund skipped, task already terminal");
        }
        Err(e) => {
            tracing::error!(generation_id = %id, error = %e, "Refund failed");
        }
    }
}

fn build_prompt(request: &GenerateRequest) -> Result<String, ApiError> {
    if let Some(preset) = request.layout_style.preset_prompt() {
        return Ok(preset.to_string());
    }

    let target = request
        .custom_target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("custom_target is required for custom layout_style".into())
        })?;

    Ok(format!(
        "Extract the {target} from the image, front view, on a clean white background."
    ))
}
