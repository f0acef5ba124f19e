use tokio_util::sync::CancellationToken;

/// Per-call context threaded through the provider chain: carries the
/// cancellation signal a caller (scheduler, decorator sleep loop) can
/// use to abort in-flight work without a dedicated timeout per layer.
#[derive(Clone, Default)]
pub struct FetchCtx {
    cancel: CancellationToken,
}

impl FetchCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
