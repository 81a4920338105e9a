//! Role and ownership rules.
//!
//! Every check takes the acting user and whatever it needs to know about the
//! target, and answers allow or deny. Handlers translate [`AccessDenied`]
//! into a 403 response.

use thiserror::Error;

use crate::types::{UserId, UserRole};

/// The authenticated user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: UserRole,
}

impl Actor {
    #[must_use]
    pub const fn new(id: UserId, role: UserRole) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Why an action was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("this action requires one of the roles: {0}")]
    Role(String),
    #[error("you can only access your own account")]
    NotSelf,
    #[error("administrators cannot modify their own account through this endpoint")]
    AdminSelf,
    #[error("you do not own this comercio")]
    NotOwner,
    #[error("you already have a registered comercio")]
    AlreadyOwnsComercio,
    #[error("an account with {owned} comercio(s) cannot have the role {role}")]
    RoleKeepsComercios { role: UserRole, owned: i64 },
}

/// Require the actor to hold one of `allowed`.
///
/// # Errors
///
/// Returns [`AccessDenied::Role`] listing the accepted roles.
pub fn require_role(actor: &Actor, allowed: &[UserRole]) -> Result<(), AccessDenied> {
    if allowed.contains(&actor.role) {
        return Ok(());
    }
    let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
    Err(AccessDenied::Role(names.join(", ")))
}

/// Admins can view anyone; everyone else only themselves.
///
/// # Errors
///
/// Returns [`AccessDenied::NotSelf`] otherwise.
pub fn view_user(actor: &Actor, target: UserId) -> Result<(), AccessDenied> {
    if actor.is_admin() || actor.id == target {
        Ok(())
    } else {
        Err(AccessDenied::NotSelf)
    }
}

/// Admins manage other accounts but go through the self-service endpoints
/// for their own. Non-admins may only touch themselves.
fn modify_user(actor: &Actor, target: UserId) -> Result<(), AccessDenied> {
    match (actor.is_admin(), actor.id == target) {
        (true, true) => Err(AccessDenied::AdminSelf),
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err(AccessDenied::NotSelf),
    }
}

/// # Errors
///
/// See [`AccessDenied::AdminSelf`] and [`AccessDenied::NotSelf`].
pub fn update_user(actor: &Actor, target: UserId) -> Result<(), AccessDenied> {
    modify_user(actor, target)
}

/// # Errors
///
/// See [`AccessDenied::AdminSelf`] and [`AccessDenied::NotSelf`].
pub fn delete_user(actor: &Actor, target: UserId) -> Result<(), AccessDenied> {
    modify_user(actor, target)
}

/// Admins manage any comercio; others only the one they own.
///
/// # Errors
///
/// Returns [`AccessDenied::NotOwner`].
pub fn manage_comercio(actor: &Actor, owner: UserId) -> Result<(), AccessDenied> {
    if actor.is_admin() || actor.id == owner {
        Ok(())
    } else {
        Err(AccessDenied::NotOwner)
    }
}

/// Products follow the ownership of their comercio.
///
/// # Errors
///
/// Returns [`AccessDenied::NotOwner`].
pub fn manage_product(actor: &Actor, comercio_owner: UserId) -> Result<(), AccessDenied> {
    manage_comercio(actor, comercio_owner)
}

/// Admins may register any number of comercios. Clientes and emprendedores
/// may own one.
///
/// # Errors
///
/// Returns [`AccessDenied::AlreadyOwnsComercio`] for a second registration.
pub fn register_comercio(actor: &Actor, owned: i64) -> Result<(), AccessDenied> {
    if actor.is_admin() || owned == 0 {
        Ok(())
    } else {
        Err(AccessDenied::AlreadyOwnsComercio)
    }
}

/// Whether an account owning `owned` comercios may switch to `role`.
///
/// Admins keep any number, emprendedores at most one, clientes none.
///
/// # Errors
///
/// Returns [`AccessDenied::RoleKeepsComercios`] when the new role would
/// break the ownership limit.
pub fn change_role(role: UserRole, owned: i64) -> Result<(), AccessDenied> {
    let allowed = match role {
        UserRole::Admin => true,
        UserRole::Emprendedor => owned <= 1,
        UserRole::Cliente => owned == 0,
    };
    if allowed {
        Ok(())
    } else {
        Err(AccessDenied::RoleKeepsComercios { role, owned })
    }
}

/// Which profile fields a role may change.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatableUserFields {
    pub names: bool,
    pub email: bool,
    pub phone: bool,
    pub role: bool,
    pub icon: bool,
}

impl UpdatableUserFields {
    #[must_use]
    pub const fn for_role(role: UserRole) -> Self {
        let admin = role.is_admin();
        Self {
            names: admin,
            email: admin,
            phone: true,
            role: admin,
            icon: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: UserRole) -> Actor {
        Actor::new(UserId::generate(), role)
    }

    #[test]
    fn test_require_role() {
        let cliente = actor(UserRole::Cliente);
        assert!(require_role(&cliente, &[UserRole::Cliente, UserRole::Admin]).is_ok());
        assert_eq!(
            require_role(&cliente, &[UserRole::Emprendedor, UserRole::Admin]),
            Err(AccessDenied::Role("emprendedor, admin".to_owned()))
        );
    }

    #[test]
    fn test_view_user() {
        let admin = actor(UserRole::Admin);
        let cliente = actor(UserRole::Cliente);
        assert!(view_user(&admin, cliente.id).is_ok());
        assert!(view_user(&admin, admin.id).is_ok());
        assert!(view_user(&cliente, cliente.id).is_ok());
        assert_eq!(view_user(&cliente, admin.id), Err(AccessDenied::NotSelf));
    }

    #[test]
    fn test_admin_cannot_modify_self_through_admin_endpoints() {
        let admin = actor(UserRole::Admin);
        assert_eq!(update_user(&admin, admin.id), Err(AccessDenied::AdminSelf));
        assert_eq!(delete_user(&admin, admin.id), Err(AccessDenied::AdminSelf));
        assert!(delete_user(&admin, UserId::generate()).is_ok());
    }

    #[test]
    fn test_non_admin_only_modifies_self() {
        let emprendedor = actor(UserRole::Emprendedor);
        assert!(update_user(&emprendedor, emprendedor.id).is_ok());
        assert_eq!(
            update_user(&emprendedor, UserId::generate()),
            Err(AccessDenied::NotSelf)
        );
    }

    #[test]
    fn test_manage_comercio_and_product() {
        let owner = actor(UserRole::Emprendedor);
        let other = actor(UserRole::Emprendedor);
        let admin = actor(UserRole::Admin);
        assert!(manage_comercio(&owner, owner.id).is_ok());
        assert!(manage_comercio(&admin, owner.id).is_ok());
        assert_eq!(manage_product(&other, owner.id), Err(AccessDenied::NotOwner));
    }

    #[test]
    fn test_register_comercio_limit() {
        assert!(register_comercio(&actor(UserRole::Cliente), 0).is_ok());
        assert_eq!(
            register_comercio(&actor(UserRole::Emprendedor), 1),
            Err(AccessDenied::AlreadyOwnsComercio)
        );
        assert!(register_comercio(&actor(UserRole::Admin), 5).is_ok());
    }

    #[test]
    fn test_change_role_respects_ownership() {
        assert!(change_role(UserRole::Admin, 3).is_ok());
        assert!(change_role(UserRole::Emprendedor, 1).is_ok());
        assert!(change_role(UserRole::Cliente, 0).is_ok());
        assert_eq!(
            change_role(UserRole::Emprendedor, 2),
            Err(AccessDenied::RoleKeepsComercios {
                role: UserRole::Emprendedor,
                owned: 2
            })
        );
        assert!(change_role(UserRole::Cliente, 1).is_err());
    }

    #[test]
    fn test_updatable_fields() {
        let admin = UpdatableUserFields::for_role(UserRole::Admin);
        assert!(admin.names && admin.email && admin.role);
        let cliente = UpdatableUserFields::for_role(UserRole::Cliente);
        assert!(cliente.phone && cliente.icon);
        assert!(!cliente.names && !cliente.email && !cliente.role);
    }
}
