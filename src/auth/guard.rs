//! Ownership and visibility checks for articles and simulations.
//!
//! Two fixed rules:
//! - a resource may be read if it is public, or if the caller owns it;
//! - a resource may be updated or deleted only by its owner.
//!
//! Handlers look the resource up first and return `NotFound` when it is
//! missing; these predicates only ever see resources that exist.

use crate::db::turso::{Article, Simulation, User};
use crate::types::{AppError, Result};

/// A resource with an optional owner and a public/private flag.
pub trait Guarded {
    /// Id of the owning user, if any.
    fn owner_id(&self) -> Option<i64>;

    /// Whether anyone (including anonymous callers) may read the resource.
    fn is_public(&self) -> bool;
}

impl Guarded for Article {
    fn owner_id(&self) -> Option<i64> {
        self.author_id
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

impl Guarded for Simulation {
    fn owner_id(&self) -> Option<i64> {
        self.owner_id
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

fn is_owner<R: Guarded + ?Sized>(resource: &R, identity: Option<&User>) -> bool {
    match (resource.owner_id(), identity) {
        (Some(owner), Some(user)) => owner == user.id,
        _ => false,
    }
}

/// Read is allowed for public resources, and for private ones to their owner.
pub fn can_read<R: Guarded + ?Sized>(resource: &R, identity: Option<&User>) -> bool {
    resource.is_public() || is_owner(resource, identity)
}

/// Write (update or delete) is allowed only to the owner. Ownerless resources
/// are never writable.
pub fn can_write<R: Guarded + ?Sized>(resource: &R, identity: Option<&User>) -> bool {
    is_owner(resource, identity)
}

pub fn ensure_readable<R: Guarded + ?Sized>(
    resource: &R,
    identity: Option<&User>,
    what: &str,
) -> Result<()> {
    if can_read(resource, identity) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("This {} is private", what)))
    }
}

pub fn ensure_writable<R: Guarded + ?Sized>(
    resource: &R,
    identity: Option<&User>,
    what: &str,
) -> Result<()> {
    if can_write(resource, identity) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Not authorized to modify this {}",
            what
        )))
    }
}
