use crate::clipboard_fallback::inject_clipboard_fallback;
use crate::direct::inject_direct;
use dictate_foundation::error::InjectionError;
use dictate_telemetry::PipelineMetrics;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// The method that successfully delivered the text (spec §4.6 `InjectOutcome`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionMethod {
    Direct,
    ClipboardFallback,
}

pub type InjectOutcome = Result<InjectionMethod, InjectionError>;

/// Tries the direct keyboard-event method first, falling back to
/// clipboard+paste on failure (spec §4.6). Both paths wait out the
/// modifier-release delay before firing, so there is no separate
/// "wait for focus" step here.
pub async fn inject_text(text: &str, metrics: &Arc<PipelineMetrics>) -> InjectOutcome {
    metrics.mark_stage_active(dictate_telemetry::PipelineStage::Injection);

    match inject_direct(text).await {
        Ok(()) => {
            metrics.injection_direct_success.fetch_add(1, Ordering::Relaxed);
            Ok(InjectionMethod::Direct)
        }
        Err(direct_err) => {
            tracing::warn!("direct injection failed, falling back to clipboard: {direct_err}");
            match inject_clipboard_fallback(text).await {
                Ok(()) => {
                    metrics
                        .injection_clipboard_fallback
                        .fetch_add(1, Ordering::Relaxed);
                    Ok(InjectionMethod::ClipboardFallback)
                }
                Err(fallback_err) => {
                    metrics.injection_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!("clipboard fallback also failed: {fallback_err}");
                    Err(InjectionError::AllMethodsFailed)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_text_succeeds_via_direct() {
        let metrics = Arc::new(PipelineMetrics::default());
        let outcome = inject_text("", &metrics).await;
        assert_eq!(outcome.unwrap(), InjectionMethod::Direct);
    }
}
