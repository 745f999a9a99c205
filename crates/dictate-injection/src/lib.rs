//! Text injection (C6): delivers the final transcript as a single logical
//! keyboard event, falling back to clipboard+paste on failure.

pub mod clipboard_fallback;
pub mod direct;
pub mod injector;

pub use injector::{inject_text, InjectOutcome, InjectionMethod};
