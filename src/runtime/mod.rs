//! Bridges that run the blocking walker on an async runtime's blocking thread-pool.

use std::{future::Future, path::PathBuf};

use crate::walk::{TraversalOptions, VisitedSet, WalkAction, WalkError, walk};

#[cfg(feature = "tokio-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-runtime")))]
pub mod tokio;

#[cfg(feature = "smol-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "smol-runtime")))]
pub mod smol;

/// An async runtime able to offload blocking work. Implementations are provided for Tokio and for
/// the "blocking" thread-pool used by Smol, and third-party runtimes can implement it too.
pub trait Runtime: 'static {
    /// Run the function on a thread where blocking is permitted. An error is returned if the function
    /// couldn't be run to completion (for example, because it panicked).
    fn spawn_blocking<F, O>(function: F) -> impl Future<Output = Result<O, std::io::Error>> + Send
    where
        F: FnOnce() -> O + Send + 'static,
        O: Send + 'static;
}

/// Perform a [walk] of the host filesystem on the [Runtime]'s blocking thread-pool. The [VisitedSet] is moved
/// into the blocking task and handed back alongside the walk's result, whether or not the walk succeeded, so
/// that it can be reused for the next walk. After a failed walk it still holds every entry entered before the
/// failure. The outer [Result] reports failures of the blocking task itself, in which case the set is lost.
pub async fn walk_blocking<R, A>(
    path: PathBuf,
    options: TraversalOptions,
    mut visited: VisitedSet,
    action: A,
) -> Result<(VisitedSet, Result<(), WalkError>), std::io::Error>
where
    R: Runtime,
    A: WalkAction + Send + 'static,
{
    R::spawn_blocking(move || {
        let result = walk(&path, options, &mut visited, action);
        (visited, result)
    })
    .await
}
