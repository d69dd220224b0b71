//! The syscall backend: stat/lstat and chown/lchown over either `nix` or `rustix`, selected by the
//! `nix-syscall-backend` and `rustix-syscall-backend` features (rustix wins when both are enabled).
//! Every function maps the backend's error type into [std::io::Error].

use crate::fs::FileKind;

/// The raw fields of a stat call that the rest of the crate consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawStat {
    pub dev: u64,
    pub ino: u64,
    pub kind: FileKind,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

#[cfg(all(feature = "nix-syscall-backend", not(feature = "rustix-syscall-backend")))]
mod imp_nix {
    use std::path::Path;

    use nix::{
        fcntl::AtFlags,
        sys::stat::{FileStat, SFlag},
        unistd::{Gid, Uid},
    };

    use super::{FileKind, RawStat};

    #[inline]
    pub fn stat(path: &Path, follow_symlinks: bool) -> Result<RawStat, std::io::Error> {
        let file_stat = if follow_symlinks {
            nix_op(nix::sys::stat::stat(path))?
        } else {
            nix_op(nix::sys::stat::lstat(path))?
        };

        Ok(to_raw_stat(&file_stat))
    }

    #[inline]
    pub fn chown(path: &Path, uid: Option<u32>, gid: Option<u32>, follow_symlinks: bool) -> Result<(), std::io::Error> {
        let uid = uid.map(Uid::from_raw);
        let gid = gid.map(Gid::from_raw);

        if follow_symlinks {
            nix_op(nix::unistd::chown(path, uid, gid))
        } else {
            nix_op(nix::unistd::fchownat(None, path, uid, gid, AtFlags::AT_SYMLINK_NOFOLLOW))
        }
    }

    fn to_raw_stat(file_stat: &FileStat) -> RawStat {
        let file_type = SFlag::from_bits_truncate(file_stat.st_mode) & SFlag::S_IFMT;
        let kind = if file_type == SFlag::S_IFDIR {
            FileKind::Directory
        } else if file_type == SFlag::S_IFLNK {
            FileKind::Symlink
        } else if file_type == SFlag::S_IFREG {
            FileKind::Regular
        } else {
            FileKind::Other
        };

        RawStat {
            dev: file_stat.st_dev as u64,
            ino: file_stat.st_ino as u64,
            kind,
            mode: file_stat.st_mode as u32,
            uid: file_stat.st_uid as u32,
            gid: file_stat.st_gid as u32,
        }
    }

    #[inline(always)]
    fn nix_op<T>(result: Result<T, nix::Error>) -> Result<T, std::io::Error> {
        result.map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))
    }
}

#[cfg(feature = "rustix-syscall-backend")]
mod imp_rustix {
    use std::path::Path;

    use rustix::fs::{AtFlags, CWD, FileType, Gid, Stat, Uid};

    use super::{FileKind, RawStat};

    #[inline]
    pub fn stat(path: &Path, follow_symlinks: bool) -> Result<RawStat, std::io::Error> {
        let stat = if follow_symlinks {
            rustix_op(rustix::fs::stat(path))?
        } else {
            rustix_op(rustix::fs::lstat(path))?
        };

        Ok(to_raw_stat(&stat))
    }

    #[inline]
    pub fn chown(path: &Path, uid: Option<u32>, gid: Option<u32>, follow_symlinks: bool) -> Result<(), std::io::Error> {
        let flags = if follow_symlinks {
            AtFlags::empty()
        } else {
            AtFlags::SYMLINK_NOFOLLOW
        };

        rustix_op(rustix::fs::chownat(
            CWD,
            path,
            uid.map(|uid| unsafe { Uid::from_raw(uid) }),
            gid.map(|gid| unsafe { Gid::from_raw(gid) }),
            flags,
        ))
    }

    fn to_raw_stat(stat: &Stat) -> RawStat {
        let kind = match FileType::from_raw_mode(stat.st_mode as _) {
            FileType::Directory => FileKind::Directory,
            FileType::Symlink => FileKind::Symlink,
            FileType::RegularFile => FileKind::Regular,
            _ => FileKind::Other,
        };

        RawStat {
            dev: stat.st_dev as u64,
            ino: stat.st_ino as u64,
            kind,
            mode: stat.st_mode as u32,
            uid: stat.st_uid as u32,
            gid: stat.st_gid as u32,
        }
    }

    #[inline(always)]
    fn rustix_op<T>(result: Result<T, rustix::io::Errno>) -> Result<T, std::io::Error> {
        result.map_err(|errno| std::io::Error::from_raw_os_error(errno.raw_os_error()))
    }
}

#[cfg(feature = "rustix-syscall-backend")]
pub(crate) use imp_rustix::*;

#[cfg(all(feature = "nix-syscall-backend", not(feature = "rustix-syscall-backend")))]
pub(crate) use imp_nix::*;

#[cfg(not(any(feature = "nix-syscall-backend", feature = "rustix-syscall-backend")))]
compile_error!("owntools requires either the \"nix-syscall-backend\" or the \"rustix-syscall-backend\" feature");
