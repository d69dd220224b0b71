use std::collections::HashMap;

/// A trait providing the passwd/group lookups consulted when resolving an ownership specifier. Every
/// lookup returns [None] when no matching identity record exists.
pub trait IdentityResolver {
    /// Look up the UID of the user with the given name.
    fn user_name_to_uid(&self, name: &str) -> Option<u32>;

    /// Look up the GID of the group with the given name.
    fn group_name_to_gid(&self, name: &str) -> Option<u32>;

    /// Look up the primary GID of the user with the given UID.
    fn uid_to_primary_gid(&self, uid: u32) -> Option<u32>;

    /// Look up both the UID and the primary GID of the user with the given name. The default
    /// implementation chains [IdentityResolver::user_name_to_uid] and [IdentityResolver::uid_to_primary_gid],
    /// implementors with direct access to the user's record should override it.
    fn user_record_by_name(&self, name: &str) -> Option<(u32, u32)> {
        let uid = self.user_name_to_uid(name)?;
        let gid = self.uid_to_primary_gid(uid)?;
        Some((uid, gid))
    }
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn user_name_to_uid(&self, name: &str) -> Option<u32> {
        (**self).user_name_to_uid(name)
    }

    fn group_name_to_gid(&self, name: &str) -> Option<u32> {
        (**self).group_name_to_gid(name)
    }

    fn uid_to_primary_gid(&self, uid: u32) -> Option<u32> {
        (**self).uid_to_primary_gid(uid)
    }

    fn user_record_by_name(&self, name: &str) -> Option<(u32, u32)> {
        (**self).user_record_by_name(name)
    }
}

/// An [IdentityResolver] backed by in-memory mappings instead of the host's user database. Useful when
/// resolving ownership for a foreign root filesystem (a container image or a VM's rootfs) whose
/// passwd and group files have been parsed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingIdentityResolver {
    users: HashMap<String, u32>,
    groups: HashMap<String, u32>,
    primary_groups: HashMap<u32, u32>,
}

impl MappingIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with its UID and primary GID.
    pub fn user(mut self, name: impl Into<String>, uid: u32, primary_gid: u32) -> Self {
        self.users.insert(name.into(), uid);
        self.primary_groups.insert(uid, primary_gid);
        self
    }

    /// Register a group with its GID.
    pub fn group(mut self, name: impl Into<String>, gid: u32) -> Self {
        self.groups.insert(name.into(), gid);
        self
    }
}

impl IdentityResolver for MappingIdentityResolver {
    fn user_name_to_uid(&self, name: &str) -> Option<u32> {
        self.users.get(name).copied()
    }

    fn group_name_to_gid(&self, name: &str) -> Option<u32> {
        self.groups.get(name).copied()
    }

    fn uid_to_primary_gid(&self, uid: u32) -> Option<u32> {
        self.primary_groups.get(&uid).copied()
    }
}

/// An [IdentityResolver] that queries the host's user database via getpwnam_r, getpwuid_r and getgrnam_r.
/// Lookup errors (as opposed to missing records) are logged and treated as missing records.
#[cfg(feature = "nix-syscall-backend")]
#[cfg_attr(docsrs, doc(cfg(feature = "nix-syscall-backend")))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentityResolver;

#[cfg(feature = "nix-syscall-backend")]
impl SystemIdentityResolver {
    fn user_by_name(name: &str) -> Option<nix::unistd::User> {
        match nix::unistd::User::from_name(name) {
            Ok(user) => user,
            Err(errno) => {
                tracing::debug!(name, %errno, "Looking up user by name failed");
                None
            }
        }
    }
}

#[cfg(feature = "nix-syscall-backend")]
impl IdentityResolver for SystemIdentityResolver {
    fn user_name_to_uid(&self, name: &str) -> Option<u32> {
        Self::user_by_name(name).map(|user| user.uid.as_raw())
    }

    fn group_name_to_gid(&self, name: &str) -> Option<u32> {
        match nix::unistd::Group::from_name(name) {
            Ok(group) => group.map(|group| group.gid.as_raw()),
            Err(errno) => {
                tracing::debug!(name, %errno, "Looking up group by name failed");
                None
            }
        }
    }

    fn uid_to_primary_gid(&self, uid: u32) -> Option<u32> {
        match nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(uid)) {
            Ok(user) => user.map(|user| user.gid.as_raw()),
            Err(errno) => {
                tracing::debug!(uid, %errno, "Looking up user by UID failed");
                None
            }
        }
    }

    fn user_record_by_name(&self, name: &str) -> Option<(u32, u32)> {
        Self::user_by_name(name).map(|user| (user.uid.as_raw(), user.gid.as_raw()))
    }
}
