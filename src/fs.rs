use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::syscall::{self, RawStat};

/// The (device, inode) pair of a filesystem object. Two entries with an equal [FileIdentity] are the same
/// object, reached either through a hard link or through a symlink cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity {
    pub device_id: u64,
    pub inode: u64,
}

/// The type of a filesystem entry as reported by stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Directory,
    Symlink,
    Regular,
    Other,
}

/// The result of a stat call on a visited entry. When the entry was stat-ed following symlinks, this
/// describes the symlink's target, otherwise the symlink itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInfo {
    pub device_id: u64,
    pub inode: u64,
    pub kind: FileKind,
    pub uid: u32,
    pub gid: u32,
    /// The raw st_mode, including both the type and permission bits.
    pub mode: u32,
}

impl StatInfo {
    #[inline]
    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            device_id: self.device_id,
            inode: self.inode,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    pub(crate) fn from_raw(raw: RawStat) -> Self {
        Self {
            device_id: raw.dev,
            inode: raw.ino,
            kind: raw.kind,
            uid: raw.uid,
            gid: raw.gid,
            mode: raw.mode,
        }
    }
}

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    /// The entry's file name, used for ordering.
    pub name: OsString,
    /// The entry's path, being the listed directory's path joined with the name.
    pub path: PathBuf,
}

/// The stat and listing capability the walker needs from the host. [SystemFilesystem] is the
/// implementation backed by the selected syscall backend, while custom implementations can be
/// used to walk virtual trees.
pub trait WalkFilesystem {
    fn stat(&self, path: &Path, follow_symlinks: bool) -> Result<StatInfo, std::io::Error>;

    fn read_dir(&self, path: &Path) -> Result<Vec<DirChild>, std::io::Error>;
}

impl<F: WalkFilesystem + ?Sized> WalkFilesystem for &F {
    fn stat(&self, path: &Path, follow_symlinks: bool) -> Result<StatInfo, std::io::Error> {
        (**self).stat(path, follow_symlinks)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirChild>, std::io::Error> {
        (**self).read_dir(path)
    }
}

/// A [WalkFilesystem] that stats through the syscall backend and lists through the blocking
/// [std::fs::read_dir], meaning it should never be called directly from an async context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFilesystem;

impl WalkFilesystem for SystemFilesystem {
    fn stat(&self, path: &Path, follow_symlinks: bool) -> Result<StatInfo, std::io::Error> {
        syscall::stat(path, follow_symlinks).map(StatInfo::from_raw)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirChild>, std::io::Error> {
        let mut children = Vec::new();

        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            children.push(DirChild {
                name: entry.file_name(),
                path: entry.path(),
            });
        }

        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        os::unix::fs::PermissionsExt,
        path::{Path, PathBuf},
    };

    use super::{FileKind, SystemFilesystem, WalkFilesystem};

    fn tmp_dir() -> PathBuf {
        let path = std::env::temp_dir().join(format!("owntools-fs-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir(&path).unwrap();
        path
    }

    #[test]
    fn system_filesystem_decodes_file_kinds() {
        let dir = tmp_dir();
        std::fs::File::create(dir.join("file")).unwrap();
        std::os::unix::fs::symlink("file", dir.join("link")).unwrap();

        let fs = SystemFilesystem;
        assert_eq!(fs.stat(&dir, false).unwrap().kind, FileKind::Directory);
        assert_eq!(fs.stat(&dir.join("file"), false).unwrap().kind, FileKind::Regular);
        assert_eq!(fs.stat(&dir.join("link"), false).unwrap().kind, FileKind::Symlink);
        assert!(fs.stat(&dir.join("link"), false).unwrap().is_symlink());
        assert_eq!(fs.stat(&dir.join("link"), true).unwrap().kind, FileKind::Regular);
        assert_eq!(fs.stat(Path::new("/dev/null"), true).unwrap().kind, FileKind::Other);

        let stat = fs.stat(&dir, false).unwrap();
        assert!(stat.is_dir());
        assert_eq!(stat.identity().inode, stat.inode);
        assert_eq!(stat.mode & 0o7777, std::fs::metadata(&dir).unwrap().permissions().mode() & 0o7777);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
