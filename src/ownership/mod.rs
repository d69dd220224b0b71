//! Resolution of `chown`-style ownership specifiers ("user", ":group", "user:group", "user:") into numeric
//! IDs, and the action that applies the resolved ownership to walked entries.

mod change;
mod identity;

pub use change::{ChangedPaths, OwnershipChange};
#[cfg(feature = "nix-syscall-backend")]
pub use identity::SystemIdentityResolver;
pub use identity::{IdentityResolver, MappingIdentityResolver};

/// A resolved ownership pair. [None] on either side means that side of the ownership is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OwnerSpec {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl OwnerSpec {
    pub fn new(uid: Option<u32>, gid: Option<u32>) -> Self {
        Self { uid, gid }
    }

    /// Returns the pair in the chown(2) convention, where -1 stands for "unchanged".
    pub fn as_raw(&self) -> (i64, i64) {
        (
            self.uid.map(i64::from).unwrap_or(-1),
            self.gid.map(i64::from).unwrap_or(-1),
        )
    }

    /// Whether an entry with the given owner would be modified by applying this [OwnerSpec].
    pub fn differs_from(&self, uid: u32, gid: u32) -> bool {
        self.uid.is_some_and(|spec_uid| spec_uid != uid) || self.gid.is_some_and(|spec_gid| spec_gid != gid)
    }
}

impl std::fmt::Display for OwnerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.uid, self.gid) {
            (Some(uid), Some(gid)) => write!(f, "{uid}:{gid}"),
            (Some(uid), None) => write!(f, "{uid}"),
            (None, Some(gid)) => write!(f, ":{gid}"),
            (None, None) => Ok(()),
        }
    }
}

/// An error that can occur when resolving an ownership specifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("unknown user/group '{0}'")]
    UnknownIdentity(String),
}

/// Resolve an ownership specifier into an [OwnerSpec] using the given [IdentityResolver].
///
/// The user and group are separated by the first ':' or, when the specifier has none, by the first '.'
/// (an undocumented form both coreutils and busybox accept). Numeric tokens are taken verbatim without
/// checking that an identity with that ID exists, and "-1" leaves that side unchanged like the chown(2)
/// argument it stands for. A trailing separator ("user:") selects the user's primary group; for a
/// numeric user without a passwd record the UID itself is used as the GID, as busybox does.
pub fn resolve(spec: &str, resolver: &impl IdentityResolver) -> Result<OwnerSpec, ResolveError> {
    let Some(separator_idx) = spec.find(':').or_else(|| spec.find('.')) else {
        return Ok(OwnerSpec {
            uid: resolve_id(spec, |name| resolver.user_name_to_uid(name))?,
            gid: None,
        });
    };

    let user = &spec[..separator_idx];
    let group = &spec[(separator_idx + 1)..];

    if separator_idx == 0 {
        return Ok(OwnerSpec {
            uid: None,
            gid: resolve_id(group, |name| resolver.group_name_to_gid(name))?,
        });
    }

    if !group.is_empty() {
        let uid = resolve_id(user, |name| resolver.user_name_to_uid(name))?;
        let gid = resolve_id(group, |name| resolver.group_name_to_gid(name))?;
        return Ok(OwnerSpec::new(uid, gid));
    }

    match parse_numeric_id(user) {
        Some(uid) => {
            let gid = uid.map(|uid| resolver.uid_to_primary_gid(uid).unwrap_or(uid));
            Ok(OwnerSpec::new(uid, gid))
        }
        None => {
            let (uid, gid) = resolver
                .user_record_by_name(user)
                .ok_or_else(|| ResolveError::UnknownIdentity(user.to_owned()))?;
            Ok(OwnerSpec::new(Some(uid), Some(gid)))
        }
    }
}

/// Resolve a `chgrp`-style group operand, which is equivalent to resolving ":group".
pub fn resolve_group(group: &str, resolver: &impl IdentityResolver) -> Result<OwnerSpec, ResolveError> {
    resolve(&format!(":{group}"), resolver)
}

fn resolve_id(token: &str, lookup: impl FnOnce(&str) -> Option<u32>) -> Result<Option<u32>, ResolveError> {
    if let Some(id) = parse_numeric_id(token) {
        return Ok(id);
    }

    lookup(token)
        .map(Some)
        .ok_or_else(|| ResolveError::UnknownIdentity(token.to_owned()))
}

// Some(None) for "-1", Some(Some(id)) for an ID in range. Any other token, including other negative
// or out-of-range numbers, goes to name lookup.
fn parse_numeric_id(token: &str) -> Option<Option<u32>> {
    match token.parse::<i64>().ok()? {
        -1 => Some(None),
        id => u32::try_from(id).ok().map(Some),
    }
}
