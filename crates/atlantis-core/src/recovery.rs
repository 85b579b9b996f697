//! Panic containment for request handlers.
//!
//! [`catch_panics`] wraps a request future so that a panic anywhere inside it
//! is returned as a [`Panicked`] value instead of unwinding into the caller.
//! Requires `panic = "unwind"` (the default profile setting).
//!
//! The panic message alone rarely says where things went wrong, so a process
//! wide panic hook records the panic location and a backtrace in a
//! thread-local. `catch_unwind` observes the panic on the thread that raised
//! it, which is where [`Panicked::from_payload`] picks the record up.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Once;

use futures::FutureExt;

/// Maximum number of backtrace frames kept in a panic report.
pub const MAX_BACKTRACE_FRAMES: usize = 16;

/// Frames from the panic machinery itself, skipped at the top of a backtrace.
const MACHINERY_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "rust_begin_unwind",
    "__rust",
    "<alloc::boxed::Box",
    "atlantis_core::recovery::",
];

#[derive(Debug, Clone, Default)]
struct PanicSite {
    location: Option<String>,
    backtrace: Option<String>,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the hook that records panic sites. Idempotent; the previously
/// installed hook still runs after the site is recorded.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let site = PanicSite {
                location: info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
                backtrace: trim_backtrace(&Backtrace::force_capture().to_string()),
            };
            LAST_PANIC.with(|cell| *cell.borrow_mut() = Some(site));
            previous(info);
        }));
    });
}

/// Drop the panic machinery frames and keep at most
/// [`MAX_BACKTRACE_FRAMES`] frames. `None` when no symbolized frame is left.
fn trim_backtrace(rendered: &str) -> Option<String> {
    let mut frames: Vec<Vec<&str>> = Vec::new();
    for line in rendered.lines() {
        if frame_symbol(line).is_some() {
            frames.push(vec![line]);
        } else if let Some(frame) = frames.last_mut() {
            frame.push(line);
        }
    }

    let kept: Vec<String> = frames
        .iter()
        .skip_while(|frame| {
            let symbol = frame_symbol(frame[0]).unwrap_or_default();
            MACHINERY_PREFIXES.iter().any(|p| symbol.starts_with(p))
        })
        .take(MAX_BACKTRACE_FRAMES)
        .map(|frame| frame.join("\n"))
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("\n"))
    }
}

/// Symbol of a `  N: symbol` frame header line.
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.trim_start().split_once(": ")?;
    (!index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())).then_some(symbol)
}

/// A panic caught at a request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panicked {
    pub message: String,
    /// `file:line:column` of the panic, when the hook recorded it.
    pub location: Option<String>,
    /// Trimmed backtrace, when the hook recorded one.
    pub backtrace: Option<String>,
}

impl Panicked {
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let site = LAST_PANIC.with(|cell| cell.borrow_mut().take()).unwrap_or_default();
        Self {
            message,
            location: site.location,
            backtrace: site.backtrace,
        }
    }

    /// Comment body posted to the pull request.
    pub fn comment(&self) -> String {
        let mut body = format!(
            "**Error: internal panic. This is a bug.**\n```\n{}",
            self.message
        );
        if let Some(location) = &self.location {
            body.push_str(&format!("\n\nat {location}"));
        }
        if let Some(backtrace) = &self.backtrace {
            body.push_str(&format!("\n\nstack trace:\n{backtrace}"));
        }
        body.push_str("\n```");
        body
    }
}

impl std::fmt::Display for Panicked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "internal panic: {}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

/// Drive `fut` to completion, converting a panic into `Err(Panicked)`.
pub async fn catch_panics<F>(fut: F) -> Result<F::Output, Panicked>
where
    F: Future,
{
    install_panic_hook();
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(Panicked::from_payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_output() {
        let out = catch_panics(async { 42 }).await;
        assert_eq!(out, Ok(42));
    }

    #[tokio::test]
    async fn test_catches_str_panic() {
        let out = catch_panics(async {
            panic!("OMG PANIC!!!");
        })
        .await;
        let panicked: Panicked = out.unwrap_err();
        assert_eq!(panicked.message, "OMG PANIC!!!");
        assert!(panicked.comment().starts_with("**Error: internal panic. This is a bug.**\n```\nOMG PANIC!!!"));
        assert!(panicked.comment().ends_with("\n```"));
    }

    #[tokio::test]
    async fn test_records_panic_location() {
        let line = line!() + 2;
        let out: Result<(), Panicked> = catch_panics(async {
            panic!("where am I");
        })
        .await;
        let panicked = out.unwrap_err();

        let location = panicked.location.clone().expect("location recorded");
        assert!(
            location.contains(&format!("recovery.rs:{line}:")),
            "unexpected location {location:?}"
        );
        assert!(panicked.comment().contains(&format!("at {location}")));
        assert!(panicked.to_string().contains("recovery.rs:"));
    }

    #[tokio::test]
    async fn test_catches_formatted_panic() {
        let n = 3;
        let out: Result<(), Panicked> = catch_panics(async move {
            panic!("index {n} out of range");
        })
        .await;
        assert_eq!(out.unwrap_err().message, "index 3 out of range");
    }

    #[tokio::test]
    async fn test_unknown_payload() {
        let out: Result<(), Panicked> = catch_panics(async {
            std::panic::panic_any(17_u8);
        })
        .await;
        assert_eq!(out.unwrap_err().message, "Unknown panic");
    }

    #[test]
    fn test_trim_backtrace_skips_machinery_and_caps_frames() {
        let mut rendered = String::from(
            "   0: std::backtrace::Backtrace::force_capture\n             at /rustc/library/std/src/backtrace.rs:312:13\n   1: core::panicking::panic_fmt\n",
        );
        for i in 2..40 {
            rendered.push_str(&format!(
                "  {i}: atlantis_core::fakes::frame_{i}\n             at ./src/fakes.rs:{i}:1\n"
            ));
        }

        let trimmed = trim_backtrace(&rendered).expect("frames kept");
        assert!(trimmed.trim_start().starts_with("2: atlantis_core::fakes::frame_2"));
        assert!(trimmed.contains("./src/fakes.rs:2:1"));
        assert!(!trimmed.contains("force_capture"));
        assert_eq!(
            trimmed.lines().filter(|l| l.contains("atlantis_core::fakes::frame_")).count(),
            MAX_BACKTRACE_FRAMES
        );
    }

    #[test]
    fn test_trim_backtrace_without_frames() {
        assert_eq!(trim_backtrace("disabled backtrace"), None);
    }
}
