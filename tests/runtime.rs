use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_io::block_on;
use owntools::{
    runtime::{smol::SmolRuntime, tokio::TokioRuntime, walk_blocking},
    walk::{TraversalOptions, VisitControl, VisitedSet, WalkError},
};
use test_framework::{TmpRoot, get_tmp_path};


fn recording_action(
    walk_list: &Arc<Mutex<Vec<PathBuf>>>,
) -> impl FnMut(&std::path::Path, &owntools::fs::StatInfo) -> Result<VisitControl, std::io::Error> + Send + 'static {
    let walk_list = walk_list.clone();
    move |path, _| {
        walk_list.lock().unwrap().push(path.to_owned());
        Ok(VisitControl::Continue)
    }
}

#[tokio::test]
async fn tokio_walk_returns_visited_set_for_reuse() {
    let root = TmpRoot::with_basic_tree();
    let walk_list = Arc::new(Mutex::new(Vec::new()));

    let (visited, result) = walk_blocking::<TokioRuntime, _>(
        root.path("files/A/C"),
        TraversalOptions::recursive(),
        VisitedSet::new(),
        recording_action(&walk_list),
    )
    .await
    .unwrap();
    result.unwrap();
    assert_eq!(visited.len(), 2);

    let (visited, result) = walk_blocking::<TokioRuntime, _>(
        root.path("files"),
        TraversalOptions::recursive(),
        visited,
        recording_action(&walk_list),
    )
    .await
    .unwrap();
    result.unwrap();
    assert_eq!(visited.len(), 10);
    assert_eq!(walk_list.lock().unwrap().len(), 10);
    assert_eq!(walk_list.lock().unwrap().last(), Some(&root.path("files")));
}

#[tokio::test]
async fn tokio_walk_propagates_walk_errors() {
    let (visited, result) = walk_blocking::<TokioRuntime, _>(
        get_tmp_path(),
        TraversalOptions::recursive(),
        VisitedSet::new(),
        |_: &std::path::Path, _: &owntools::fs::StatInfo| Ok(VisitControl::Continue),
    )
    .await
    .unwrap();
    assert!(matches!(result, Err(WalkError::Stat { .. })));
    assert!(visited.is_empty());
}

#[tokio::test]
async fn tokio_walk_returns_visited_set_after_failure() {
    let root = TmpRoot::with_basic_tree();
    let walk_list = Arc::new(Mutex::new(Vec::new()));
    let failing_path = root.path("files/A/C");

    let failing_action = {
        let walk_list = walk_list.clone();
        move |path: &std::path::Path, _: &owntools::fs::StatInfo| {
            walk_list.lock().unwrap().push(path.to_owned());
            if path == failing_path {
                return Err(std::io::Error::other("action failed"));
            }
            Ok(VisitControl::Continue)
        }
    };

    let (visited, result) = walk_blocking::<TokioRuntime, _>(
        root.path("files"),
        TraversalOptions::recursive(),
        VisitedSet::new(),
        failing_action,
    )
    .await
    .unwrap();
    assert!(matches!(result, Err(WalkError::Action { ref path, .. }) if *path == root.path("files/A/C")));
    assert_eq!(walk_list.lock().unwrap().len(), 6);
    // files, files/A and the six entries the action was called on
    assert_eq!(visited.len(), 8);

    walk_list.lock().unwrap().clear();
    for already_entered in ["files", "files/A/C"] {
        let (_, result) = walk_blocking::<TokioRuntime, _>(
            root.path(already_entered),
            TraversalOptions::recursive(),
            visited.clone(),
            recording_action(&walk_list),
        )
        .await
        .unwrap();
        result.unwrap();
    }
    assert!(walk_list.lock().unwrap().is_empty());

    let (visited, result) = walk_blocking::<TokioRuntime, _>(
        root.path("files/A/y"),
        TraversalOptions::recursive(),
        visited,
        recording_action(&walk_list),
    )
    .await
    .unwrap();
    result.unwrap();
    assert_eq!(visited.len(), 9);
    assert_eq!(*walk_list.lock().unwrap(), vec![root.path("files/A/y")]);
}

#[test]
fn smol_walk_visits_tree() {
    let root = TmpRoot::with_basic_tree();
    let walk_list = Arc::new(Mutex::new(Vec::new()));

    let (visited, result) = block_on(walk_blocking::<SmolRuntime, _>(
        root.path("files"),
        TraversalOptions::recursive().with_depth_first(true),
        VisitedSet::new(),
        recording_action(&walk_list),
    ))
    .unwrap();
    result.unwrap();

    assert_eq!(visited.len(), 10);
    assert_eq!(walk_list.lock().unwrap().first(), Some(&root.path("files")));
}
