//! Cooperative cancellation
//!
//! A [`CancellationContext`] is a cheap, cloneable handle to a shared flag. The
//! issuer of an operation keeps one clone and hands another to the operation;
//! the operation polls [`CancellationContext::is_cancelled`] at the points where
//! it can unwind safely. Nothing is ever interrupted forcibly.
//!
//! Three flavours exist:
//!
//! - **Null** (`CancellationContext::default()`): governs nothing. Callers treat
//!   it as "don't check cancellation" and may pick a blocking code path.
//! - **Background** ([`CancellationContext::background`]): governs an operation
//!   but can never be cancelled.
//! - **Cancellable** ([`CancellationContext::new`]): the usual case.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
struct Flag {
    cancelled: AtomicBool,
    cancellable: bool,
}

/// Shared cooperative cancellation token
#[derive(Debug, Clone, Default)]
pub struct CancellationContext {
    flag: Option<Arc<Flag>>,
}

impl CancellationContext {
    /// Create a fresh, active, cancellable context
    pub fn new() -> Self {
        Self {
            flag: Some(Arc::new(Flag {
                cancelled: AtomicBool::new(false),
                cancellable: true,
            })),
        }
    }

    /// A context that is permanently active
    pub fn background() -> Self {
        Self {
            flag: Some(Arc::new(Flag {
                cancelled: AtomicBool::new(false),
                cancellable: false,
            })),
        }
    }

    /// Request cancellation.
    ///
    /// Safe from any thread, any number of times, including after the governed
    /// operation finished. Returns `true` only for the call that performed the
    /// Active -> Cancelled transition.
    pub fn cancel(&self) -> bool {
        match &self.flag {
            Some(flag) if flag.cancellable => !flag.cancelled.swap(true, Ordering::AcqRel),
            _ => false,
        }
    }

    /// Non-blocking poll of the current state
    pub fn is_cancelled(&self) -> bool {
        self.flag
            .as_ref()
            .is_some_and(|flag| flag.cancelled.load(Ordering::Acquire))
    }

    /// True when no operation is governed by this context
    pub fn is_null(&self) -> bool {
        self.flag.is_none()
    }
}
