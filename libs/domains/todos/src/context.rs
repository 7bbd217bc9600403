use tokio_util::sync::{CancellationToken, DropGuard};

/// Per-call state threaded from a listener through the handler into the store.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Correlation id from `x-request-id`, when the listener has one.
    pub request_id: Option<String>,
    /// Cancelled when the caller goes away or the process is force-stopped.
    pub cancel: CancellationToken,
}

impl CallContext {
    /// Context for one call, cancelled whenever `parent` is.
    pub fn child_of(parent: &CancellationToken, request_id: Option<String>) -> Self {
        Self {
            request_id,
            cancel: parent.child_token(),
        }
    }

    /// Context with its own root token, for callers without a lifecycle.
    pub fn detached() -> Self {
        Self {
            request_id: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel this call's token when the returned guard is dropped.
    ///
    /// Listeners hold the guard for the duration of the call future so a
    /// dropped future (client disconnect) marks the token cancelled.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_follows_parent() {
        let root = CancellationToken::new();
        let ctx = CallContext::child_of(&root, Some("abc".into()));
        assert_eq!(ctx.request_id(), "abc");
        assert!(!ctx.cancel.is_cancelled());

        root.cancel();
        assert!(ctx.cancel.is_cancelled());
    }

    #[test]
    fn test_guard_cancels_only_the_call() {
        let root = CancellationToken::new();
        let ctx = CallContext::child_of(&root, None);
        drop(ctx.cancel_on_drop());

        assert!(ctx.cancel.is_cancelled());
        assert!(!root.is_cancelled());
        assert_eq!(ctx.request_id(), "-");
    }
}
