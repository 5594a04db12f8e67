// src/privilege.rs

//! Caller privilege tier
//!
//! Detected once at startup and handed to the components that care, so
//! tests can run privileged code paths without being root.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    User,
    Root,
}

impl Privilege {
    /// Privilege of the running process, based on the effective uid
    pub fn current() -> Self {
        if nix::unistd::geteuid().is_root() {
            Privilege::Root
        } else {
            Privilege::User
        }
    }

    pub fn is_root(&self) -> bool {
        *self == Privilege::Root
    }

    /// Fail with `PermissionDenied` unless running privileged
    pub fn require_root(&self, operation: &str) -> Result<()> {
        if self.is_root() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(operation.to_string()))
        }
    }
}
