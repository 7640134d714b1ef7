//! Who may see and change which school records.
//!
//! Pure functions over a [`Caller`]; no I/O. Storage backends receive the
//! [`Visibility`] predicate and decide how to apply it.

use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{Role, UserId};

/// A verified identity plus its stored role, attached by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_employee(&self) -> bool {
        self.role == Some(Role::Employee)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(AuthUser),
}

impl Caller {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Caller::Anonymous => None,
            Caller::User(user) => Some(user),
        }
    }
}

/// Which school records a caller may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    OwnedBy(UserId),
}

impl Visibility {
    pub fn admits(&self, owner: &str) -> bool {
        match self {
            Visibility::All => true,
            Visibility::OwnedBy(id) => id == owner,
        }
    }

    /// Filter-language predicate over the `schools` table.
    pub fn to_filter(&self) -> Value {
        match self {
            Visibility::All => json!({}),
            Visibility::OwnedBy(id) => json!({ "created_by": id }),
        }
    }
}

/// Employees see their own schools; everyone else (including signed-in
/// users without a role row) sees the public directory.
pub fn visibility(caller: &Caller) -> Visibility {
    match caller {
        Caller::User(user) if user.is_employee() => Visibility::OwnedBy(user.id.clone()),
        _ => Visibility::All,
    }
}

pub fn can_read(caller: &Caller, owner: &str) -> bool {
    visibility(caller).admits(owner)
}

pub fn can_modify(user: &AuthUser, owner: &str) -> bool {
    match user.role {
        Some(Role::Admin) => true,
        Some(Role::Employee) => user.id == owner,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Option<Role>) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: Some(format!("{id}@schools.ge")),
            role,
        }
    }

    #[test]
    fn employees_only_see_their_own() {
        let a = Caller::User(user("emp-a", Some(Role::Employee)));
        assert_eq!(visibility(&a), Visibility::OwnedBy("emp-a".into()));
        assert!(can_read(&a, "emp-a"));
        assert!(!can_read(&a, "emp-b"));
    }

    #[test]
    fn public_admin_and_roleless_see_everything() {
        for caller in [
            Caller::Anonymous,
            Caller::User(user("root", Some(Role::Admin))),
            Caller::User(user("nobody", None)),
        ] {
            assert_eq!(visibility(&caller), Visibility::All);
            assert!(can_read(&caller, "emp-b"));
        }
    }

    #[test]
    fn modification_requires_admin_or_ownership() {
        assert!(can_modify(&user("root", Some(Role::Admin)), "emp-b"));
        assert!(can_modify(&user("emp-b", Some(Role::Employee)), "emp-b"));
        assert!(!can_modify(&user("emp-a", Some(Role::Employee)), "emp-b"));
        assert!(!can_modify(&user("emp-b", None), "emp-b"));
    }

    #[test]
    fn visibility_renders_filter() {
        assert_eq!(Visibility::All.to_filter(), json!({}));
        assert_eq!(
            Visibility::OwnedBy("u1".into()).to_filter(),
            json!({ "created_by": "u1" })
        );
    }
}
