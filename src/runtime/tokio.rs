use super::Runtime;

/// The [Runtime] implementation backed by Tokio's [tokio::task::spawn_blocking].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRuntime;

impl Runtime for TokioRuntime {
    async fn spawn_blocking<F, O>(function: F) -> Result<O, std::io::Error>
    where
        F: FnOnce() -> O + Send + 'static,
        O: Send + 'static,
    {
        match tokio::task::spawn_blocking(function).await {
            Ok(output) => Ok(output),
            Err(_) => Err(std::io::Error::other("The blocking walk task panicked or was cancelled")),
        }
    }
}
