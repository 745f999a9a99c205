use dictate_foundation::error::InjectionError;
use enigo::{Enigo, Keyboard, Settings};
use std::time::Duration;

/// Delay before firing, to let the hotkey's own modifier keys finish
/// releasing (spec §4.6: "a delay on the order of one human key-release
/// cycle (500-700ms) is acceptable and SHOULD be implemented").
pub const MODIFIER_RELEASE_DELAY: Duration = Duration::from_millis(600);

/// Types `text` as a single logical keyboard event via `enigo`'s `text()`
/// call — never a per-character loop, which is what spec §4.6 explicitly
/// forbids (it interacts badly with Caps Lock and held modifiers).
pub async fn inject_direct(text: &str) -> Result<(), InjectionError> {
    if text.is_empty() {
        return Ok(());
    }
    tokio::time::sleep(MODIFIER_RELEASE_DELAY).await;

    let text = text.to_string();
    tokio::task::spawn_blocking(move || {
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| InjectionError::DirectFailed(e.to_string()))?;
        enigo
            .text(&text)
            .map_err(|e| InjectionError::DirectFailed(e.to_string()))
    })
    .await
    .map_err(|e| InjectionError::DirectFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_text_is_a_no_op() {
        assert!(inject_direct("").await.is_ok());
    }
}
