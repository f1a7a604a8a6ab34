//! Local user to Zammad user mapping

use crate::config::IdentityConfig;
use nix::unistd::{Uid, User};
use std::collections::HashMap;
use tracing::debug;

/// Resolves the uid of a writing process to a Zammad user id
#[derive(Debug, Clone)]
pub struct IdentityMapper {
    users: HashMap<String, u64>,
    fallback: u64,
}

impl IdentityMapper {
    pub fn new(config: &IdentityConfig) -> Self {
        IdentityMapper {
            users: config.users.clone(),
            fallback: config.fallback_user_id,
        }
    }

    /// Zammad user id for a local uid
    pub fn resolve(&self, uid: u32) -> u64 {
        match User::from_uid(Uid::from_raw(uid)) {
            Ok(Some(user)) => self.resolve_name(&user.name),
            Ok(None) => {
                debug!("uid {} has no passwd entry", uid);
                self.fallback
            }
            Err(e) => {
                debug!("uid {} lookup failed: {}", uid, e);
                self.fallback
            }
        }
    }

    /// Zammad user id for a local account name
    pub fn resolve_name(&self, name: &str) -> u64 {
        self.users.get(name).copied().unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> u64 {
        self.fallback
    }
}
