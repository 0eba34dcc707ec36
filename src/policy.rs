//! Ownership policy: a single capability check shared by every record kind.
//!
//! Reads are open to any authenticated caller; mutate/delete is allowed only
//! to the identity that created the record. No roles, no delegation, no
//! transfer.

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Any stored record that carries an owner reference.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

/// `Ok` iff the caller owns the record; `Forbidden` otherwise.
pub fn ensure_owner<R: Owned>(user: &AuthUser, record: &R) -> Result<(), ApiError> {
    if record.owner_id() == user.id {
        Ok(())
    } else {
        Err(ApiError::forbidden("You do not own this record"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rec {
        owner_id: i64,
    }

    impl Owned for Rec {
        fn owner_id(&self) -> i64 {
            self.owner_id
        }
    }

    fn user(id: i64) -> AuthUser {
        AuthUser {
            id,
            username: format!("user{}", id),
        }
    }

    #[test]
    fn owner_may_mutate() {
        assert!(ensure_owner(&user(7), &Rec { owner_id: 7 }).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let err = ensure_owner(&user(8), &Rec { owner_id: 7 }).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }
}
