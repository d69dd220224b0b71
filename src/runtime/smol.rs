use super::Runtime;

/// The [Runtime] implementation backed by the thread-pool of the "blocking" crate, which is what Smol's
/// own blocking operations (async-fs, async-process) run on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmolRuntime;

impl Runtime for SmolRuntime {
    async fn spawn_blocking<F, O>(function: F) -> Result<O, std::io::Error>
    where
        F: FnOnce() -> O + Send + 'static,
        O: Send + 'static,
    {
        Ok(blocking::unblock(function).await)
    }
}
