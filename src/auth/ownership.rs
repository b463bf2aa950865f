use uuid::Uuid;

use super::Principal;
use crate::database::models::Role;

/// Mutations on a mission (and creation of children under it) are allowed for
/// its owner and for any commander. Callers must confirm the mission exists first.
pub fn is_owner_or_commander(owner_id: Option<Uuid>, principal: &Principal) -> bool {
    owner_id == Some(principal.id) || principal.role == Role::Commander
}

/// Check ownership, producing the denial message for `action` on `resource_id`.
pub fn ensure_owner_or_commander(
    owner_id: Option<Uuid>,
    principal: &Principal,
    action: &str,
    resource_id: Uuid,
) -> Result<(), String> {
    if is_owner_or_commander(owner_id, principal) {
        Ok(())
    } else {
        Err(format!(
            "User {} does not have permission to {} {}.",
            principal.id, action, resource_id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::principal;

    #[test]
    fn owner_may_mutate() {
        let owner = principal(Role::User);
        assert!(is_owner_or_commander(Some(owner.id), &owner));
    }

    #[test]
    fn commander_outranks_ownership() {
        let commander = principal(Role::Commander);
        assert!(is_owner_or_commander(Some(Uuid::new_v4()), &commander));
        assert!(is_owner_or_commander(None, &commander));
    }

    #[test]
    fn others_are_denied_with_named_resource() {
        let pilot = principal(Role::Pilot);
        let mission_id = Uuid::new_v4();
        let err = ensure_owner_or_commander(
            Some(Uuid::new_v4()),
            &pilot,
            "create an incident for mission",
            mission_id,
        )
        .unwrap_err();
        assert_eq!(
            err,
            format!(
                "User {} does not have permission to create an incident for mission {}.",
                pilot.id, mission_id
            )
        );
        assert!(!is_owner_or_commander(None, &pilot));
    }
}
