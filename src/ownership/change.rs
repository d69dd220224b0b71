use std::path::{Path, PathBuf};

use crate::{
    fs::StatInfo,
    syscall,
    walk::{TraversalOptions, VisitControl},
};

use super::OwnerSpec;

/// The paths whose ownership an [OwnershipChange] action has modified, in visit order.
pub type ChangedPaths = Vec<PathBuf>;

/// Applies a resolved [OwnerSpec] to walked entries, issuing a chown only for entries whose current owner
/// differs from the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipChange {
    pub spec: OwnerSpec,
    /// Whether to change the owner of a symlink's target (chown) rather than of the symlink itself (lchown).
    pub dereference: bool,
}

impl OwnershipChange {
    pub fn new(spec: OwnerSpec, dereference: bool) -> Self {
        Self { spec, dereference }
    }

    /// Derive the dereferencing behavior the way chown(1) does: an explicit no-dereference request ("-h"),
    /// or a recursive walk that doesn't follow its top symlink, both operate on symlinks themselves.
    pub fn for_options(spec: OwnerSpec, options: &TraversalOptions, no_dereference: bool) -> Self {
        let dereference = !no_dereference && !(options.recurse && !options.follow_top_symlink);
        Self { spec, dereference }
    }

    /// Change the owner of the given entry if needed, returning whether a change was issued.
    pub fn apply(&self, path: &Path, stat: &StatInfo) -> Result<bool, std::io::Error> {
        if !self.spec.differs_from(stat.uid, stat.gid) {
            return Ok(false);
        }

        syscall::chown(path, self.spec.uid, self.spec.gid, self.dereference)?;
        tracing::debug!(path = %path.display(), owner = %self.spec, dereference = self.dereference, "Changed owner");
        Ok(true)
    }

    /// Wrap this [OwnershipChange] into a walk action that records every changed path into the given
    /// [ChangedPaths]. The action never prunes.
    pub fn action(
        self,
        changed_paths: &mut ChangedPaths,
    ) -> impl FnMut(&Path, &StatInfo) -> Result<VisitControl, std::io::Error> + '_ {
        move |path, stat| {
            if self.apply(path, stat)? {
                changed_paths.push(path.to_owned());
            }

            Ok(VisitControl::Continue)
        }
    }
}
