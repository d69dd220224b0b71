//! A symlink-aware recursive filesystem walker with (device, inode) based cycle and duplicate suppression,
//! supporting both pre-order (with pruning) and post-order visits.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use crate::fs::{DirChild, FileIdentity, StatInfo, SystemFilesystem, WalkFilesystem};

/// Which symlinks a recursive walk dereferences, mirroring the -P, -H and -L flags of chown(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymlinkPolicy {
    /// Never follow symlinks (-P).
    #[default]
    Physical,
    /// Follow only a symlink given as the root of the walk (-H).
    CommandLine,
    /// Follow every symlink (-L).
    Logical,
}

/// The options of a walk. A child is always visited with options derived via [TraversalOptions::for_child],
/// so [TraversalOptions::follow_top_symlink] only applies to the entry a walk (or a child visit) starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraversalOptions {
    /// Whether to descend into directories at all.
    pub recurse: bool,
    /// Visit a directory before its children (pre-order) instead of after them (post-order). Only pre-order
    /// visits can prune a directory's children by returning [VisitControl::Prune].
    pub depth_first: bool,
    /// Whether to dereference the entry the walk starts at if it is a symlink.
    pub follow_top_symlink: bool,
    /// The [TraversalOptions::follow_top_symlink] value given to every child.
    pub follow_child_symlinks: bool,
    /// Visit the children of a directory in ascending byte order of their names rather than in the
    /// order the filesystem lists them.
    pub sort_entries: bool,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            recurse: false,
            depth_first: false,
            follow_top_symlink: false,
            follow_child_symlinks: false,
            sort_entries: true,
        }
    }
}

impl TraversalOptions {
    /// The default options with recursion enabled (-R).
    pub fn recursive() -> Self {
        Self {
            recurse: true,
            ..Default::default()
        }
    }

    pub fn with_symlink_policy(self, policy: SymlinkPolicy) -> Self {
        let (follow_top_symlink, follow_child_symlinks) = match policy {
            SymlinkPolicy::Physical => (false, false),
            SymlinkPolicy::CommandLine => (true, false),
            SymlinkPolicy::Logical => (true, true),
        };

        Self {
            follow_top_symlink,
            follow_child_symlinks,
            ..self
        }
    }

    pub fn with_depth_first(self, depth_first: bool) -> Self {
        Self { depth_first, ..self }
    }

    pub fn with_sort_entries(self, sort_entries: bool) -> Self {
        Self { sort_entries, ..self }
    }

    /// The options a child of the current entry is visited with.
    #[inline]
    pub fn for_child(&self) -> Self {
        Self {
            follow_top_symlink: self.follow_child_symlinks,
            ..*self
        }
    }
}

/// What a walk should do after a pre-order visit of a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitControl {
    /// Descend into the directory's children.
    #[default]
    Continue,
    /// Skip the directory's children. Ignored for post-order visits and non-directories.
    Prune,
}

/// Implemented by every closure that can serve as the action of a walk. Returning an error from the action
/// aborts the walk with [WalkError::Action].
pub trait WalkAction: FnMut(&Path, &StatInfo) -> Result<VisitControl, std::io::Error> {}

impl<F> WalkAction for F where F: FnMut(&Path, &StatInfo) -> Result<VisitControl, std::io::Error> {}

/// The set of [FileIdentity]s a walk has already visited. Sharing one [VisitedSet] across several walks
/// extends the duplicate suppression across all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedSet(HashSet<FileIdentity>);

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the identity, returning false if it was already present.
    pub fn insert(&mut self, identity: FileIdentity) -> bool {
        self.0.insert(identity)
    }

    pub fn contains(&self, identity: &FileIdentity) -> bool {
        self.0.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An error that aborts a walk. Duplicate and cyclic entries are never errors.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("Stat-ing {} failed: {source}", .path.display())]
    Stat { path: PathBuf, source: std::io::Error },
    #[error("Reading the directory {} failed: {source}", .path.display())]
    ReadDir { path: PathBuf, source: std::io::Error },
    #[error("The walk action failed on {}: {source}", .path.display())]
    Action { path: PathBuf, source: std::io::Error },
}

impl WalkError {
    /// The path of the entry the walk failed on.
    pub fn path(&self) -> &Path {
        match self {
            WalkError::Stat { path, .. } | WalkError::ReadDir { path, .. } | WalkError::Action { path, .. } => path,
        }
    }

    /// The underlying I/O error.
    pub fn io_error(&self) -> &std::io::Error {
        match self {
            WalkError::Stat { source, .. } | WalkError::ReadDir { source, .. } | WalkError::Action { source, .. } => {
                source
            }
        }
    }
}

/// Walk the host filesystem starting at the given [Path]. See [walk_with].
pub fn walk(
    path: &Path,
    options: TraversalOptions,
    visited: &mut VisitedSet,
    action: impl FnMut(&Path, &StatInfo) -> Result<VisitControl, std::io::Error>,
) -> Result<(), WalkError> {
    walk_with(&SystemFilesystem, path, options, visited, action)
}

/// Walk the given [WalkFilesystem] starting at the given [Path], invoking the action on every entry at most once.
///
/// Each entry is stat-ed (following symlinks only if the options say so for that entry), skipped if its
/// [FileIdentity] is already in the [VisitedSet] and recorded otherwise. Non-directories, and every entry when
/// not recursing, are visited exactly once. Directories are visited before or after their children depending
/// on [TraversalOptions::depth_first]. Any stat, listing or action error aborts the walk.
///
/// The walk keeps its pending entries on an explicit heap-allocated stack, so the depth of the tree isn't limited
/// by the call stack. [walk_recursive_with] is the natively recursive equivalent with identical visit order.
pub fn walk_with<Fs, A>(
    fs: &Fs,
    path: &Path,
    options: TraversalOptions,
    visited: &mut VisitedSet,
    mut action: A,
) -> Result<(), WalkError>
where
    Fs: WalkFilesystem,
    A: FnMut(&Path, &StatInfo) -> Result<VisitControl, std::io::Error>,
{
    enum Step {
        Enter { path: PathBuf, options: TraversalOptions },
        Leave { path: PathBuf, stat: StatInfo },
    }

    let mut stack = vec![Step::Enter {
        path: path.to_owned(),
        options,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter { path, options } => {
                let Entered::Descend { stat, children } = enter(fs, &path, &options, visited, &mut action)? else {
                    continue;
                };

                let child_options = options.for_child();

                if !options.depth_first {
                    stack.push(Step::Leave { path, stat });
                }

                // reversed so that the first child is popped first
                stack.extend(children.into_iter().rev().map(|child| Step::Enter {
                    path: child.path,
                    options: child_options,
                }));
            }
            Step::Leave { path, stat } => visit(&mut action, &path, &stat)?,
        }
    }

    Ok(())
}

/// The natively recursive variant of [walk_with], bounded by the call stack's depth.
pub fn walk_recursive_with<Fs, A>(
    fs: &Fs,
    path: &Path,
    options: TraversalOptions,
    visited: &mut VisitedSet,
    mut action: A,
) -> Result<(), WalkError>
where
    Fs: WalkFilesystem,
    A: FnMut(&Path, &StatInfo) -> Result<VisitControl, std::io::Error>,
{
    walk_recursive_inner(fs, path, options, visited, &mut action)
}

fn walk_recursive_inner<Fs: WalkFilesystem, A: WalkAction>(
    fs: &Fs,
    path: &Path,
    options: TraversalOptions,
    visited: &mut VisitedSet,
    action: &mut A,
) -> Result<(), WalkError> {
    let Entered::Descend { stat, children } = enter(fs, path, &options, visited, action)? else {
        return Ok(());
    };

    let child_options = options.for_child();
    for child in children {
        walk_recursive_inner(fs, &child.path, child_options, visited, action)?;
    }

    if !options.depth_first {
        visit(action, path, &stat)?;
    }

    Ok(())
}

enum Entered {
    Done,
    Descend { stat: StatInfo, children: Vec<DirChild> },
}

// Everything that happens on reaching an entry: stat, dedup, the non-recursive or pre-order visit, and the
// listing of children that remain to be descended into.
fn enter<Fs: WalkFilesystem, A: WalkAction>(
    fs: &Fs,
    path: &Path,
    options: &TraversalOptions,
    visited: &mut VisitedSet,
    action: &mut A,
) -> Result<Entered, WalkError> {
    let stat = fs
        .stat(path, options.follow_top_symlink)
        .map_err(|source| WalkError::Stat {
            path: path.to_owned(),
            source,
        })?;

    if !visited.insert(stat.identity()) {
        tracing::debug!(path = %path.display(), identity = ?stat.identity(), "Skipping already visited entry");
        return Ok(Entered::Done);
    }

    if !(options.recurse && stat.is_dir()) {
        visit(action, path, &stat)?;
        return Ok(Entered::Done);
    }

    if options.depth_first && action_visit(action, path, &stat)? == VisitControl::Prune {
        tracing::debug!(path = %path.display(), "Pruned directory");
        return Ok(Entered::Done);
    }

    let mut children = fs.read_dir(path).map_err(|source| WalkError::ReadDir {
        path: path.to_owned(),
        source,
    })?;

    if options.sort_entries {
        children.sort_by(|a, b| a.name.cmp(&b.name));
    }

    Ok(Entered::Descend { stat, children })
}

#[inline]
fn visit<A: WalkAction>(action: &mut A, path: &Path, stat: &StatInfo) -> Result<(), WalkError> {
    action_visit(action, path, stat).map(|_| ())
}

fn action_visit<A: WalkAction>(action: &mut A, path: &Path, stat: &StatInfo) -> Result<VisitControl, WalkError> {
    tracing::trace!(path = %path.display(), kind = ?stat.kind, "Visiting entry");
    action(path, stat).map_err(|source| WalkError::Action {
        path: path.to_owned(),
        source,
    })
}
