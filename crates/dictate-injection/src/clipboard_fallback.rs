use crate::direct::MODIFIER_RELEASE_DELAY;
use dictate_foundation::env::{is_wayland, is_x11};
use dictate_foundation::error::InjectionError;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// spec §4.6 fallback: write `text` to the clipboard, then issue a
/// platform-native paste combination.
pub async fn inject_clipboard_fallback(text: &str) -> Result<(), InjectionError> {
    if text.is_empty() {
        return Ok(());
    }
    write_clipboard(text).await?;
    tokio::time::sleep(MODIFIER_RELEASE_DELAY).await;
    trigger_paste().await
}

/// Passes `text` over the clipboard tool's stdin rather than a command-line
/// argument or shell string, so arbitrarily-quoted transcribed text can
/// never be interpreted by a shell (spec §4.6: "immune to quoting/escaping
/// injection attacks").
async fn write_clipboard(text: &str) -> Result<(), InjectionError> {
    let (program, args): (&str, &[&str]) = if is_wayland() {
        ("wl-copy", &[])
    } else if is_x11() {
        ("xclip", &["-selection", "clipboard"])
    } else {
        return Err(InjectionError::ClipboardWriteFailed(
            "no supported display protocol".to_string(),
        ));
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| InjectionError::ClipboardWriteFailed(e.to_string()))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| InjectionError::ClipboardWriteFailed("no stdin pipe".to_string()))?;
    stdin
        .write_all(text.as_bytes())
        .await
        .map_err(|e| InjectionError::ClipboardWriteFailed(e.to_string()))?;
    drop(stdin);

    child
        .wait()
        .await
        .map_err(|e| InjectionError::ClipboardWriteFailed(e.to_string()))?;
    Ok(())
}

async fn trigger_paste() -> Result<(), InjectionError> {
    tokio::task::spawn_blocking(|| {
        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| InjectionError::DirectFailed(e.to_string()))?;
        enigo
            .key(Key::Control, Direction::Press)
            .map_err(|e| InjectionError::DirectFailed(e.to_string()))?;
        enigo
            .key(Key::Unicode('v'), Direction::Click)
            .map_err(|e| InjectionError::DirectFailed(e.to_string()))?;
        enigo
            .key(Key::Control, Direction::Release)
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
        assert!(inject_clipboard_fallback("").await.is_ok());
    }
}
