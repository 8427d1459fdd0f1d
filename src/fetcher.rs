use std::{fmt, future::Future, pin::Pin};

use crate::{error::AppResult, response::ApiResponse};

type Pending<T> = Pin<Box<dyn Future<Output = AppResult<ApiResponse<T>>> + Send>>;
type Operation<T, D> = Box<dyn FnMut(&D) -> Pending<T> + Send>;

/// Remote data bound to a view: `data`, `loading`, `error` and `refetch`.
///
/// The operation runs on first use and again whenever the declared dependencies change;
/// it receives the current dependencies so it can build its request from them.
/// A failure keeps whatever data was loaded before.
pub struct Resource<T, D = ()> {
    operation: Operation<T, D>,
    deps: D,
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    started: bool,
}

impl<T: fmt::Debug, D: fmt::Debug> fmt::Debug for Resource<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("deps", &self.deps)
            .field("data", &self.data)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Resource<T, ()> {
    pub fn new<F, Fut>(mut operation: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<ApiResponse<T>>> + Send + 'static,
    {
        Self::with_deps(move |_: &()| operation(), ())
    }
}

impl<T: 'static, D: PartialEq + 'static> Resource<T, D> {
    pub fn with_deps<F, Fut>(mut operation: F, deps: D) -> Self
    where
        F: FnMut(&D) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<ApiResponse<T>>> + Send + 'static,
    {
        Self {
            operation: Box::new(move |deps: &D| -> Pending<T> { Box::pin(operation(deps)) }),
            deps,
            data: None,
            loading: true,
            error: None,
            started: false,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Runs the operation unless it has already run once.
    pub async fn ensure_loaded(&mut self) -> AppResult<()> {
        if self.started {
            return Ok(());
        }
        self.refetch().await
    }

    /// Replaces the dependencies and reruns the operation if they changed.
    pub async fn set_deps(&mut self, deps: D) -> AppResult<()> {
        if self.started && self.deps == deps {
            return Ok(());
        }
        self.deps = deps;
        self.refetch().await
    }

    /// Reruns the same operation. The error is also kept for display.
    pub async fn refetch(&mut self) -> AppResult<()> {
        self.started = true;
        self.loading = true;
        self.error = None;

        let result = (self.operation)(&self.deps).await.and_then(ApiResponse::into_data);
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(error = %err, "resource fetch failed");
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }
}
