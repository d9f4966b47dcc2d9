use sqlx::FromRow;

use crate::models::{Account, Role};

/// Ownership keys of a guest row, re-fetched from the store at mutation
/// time. `house_manager_id` comes from the joined house row and is `None`
/// when the house no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct GuestOwnership {
    pub marketer_id: Option<i64>,
    pub house_manager_id: Option<i64>,
}

/// The single authorization predicate consulted by every guest mutation
/// path. Admins may touch any row; marketers only rows they originated;
/// managers only rows attached to one of their houses.
pub fn can_touch_guest(caller: &Account, ownership: &GuestOwnership) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::Marketing => ownership.marketer_id == Some(caller.id),
        Role::Manager => ownership.house_manager_id == Some(caller.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(id: i64, role: Role) -> Account {
        Account {
            id,
            full_name: format!("Tài khoản {id}"),
            phone_number: format!("09000000{id:02}"),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admin_touches_everything() {
        let admin = account(1, Role::Admin);
        let ownership = GuestOwnership {
            marketer_id: Some(42),
            house_manager_id: Some(43),
        };
        assert!(can_touch_guest(&admin, &ownership));
        let orphan = GuestOwnership {
            marketer_id: None,
            house_manager_id: None,
        };
        assert!(can_touch_guest(&admin, &orphan));
    }

    #[test]
    fn marketer_only_touches_own_rows() {
        let marketer = account(7, Role::Marketing);
        let own = GuestOwnership {
            marketer_id: Some(7),
            house_manager_id: Some(9),
        };
        let other = GuestOwnership {
            marketer_id: Some(8),
            house_manager_id: Some(7),
        };
        assert!(can_touch_guest(&marketer, &own));
        assert!(!can_touch_guest(&marketer, &other));
        let unattributed = GuestOwnership {
            marketer_id: None,
            house_manager_id: Some(7),
        };
        assert!(!can_touch_guest(&marketer, &unattributed));
    }

    #[test]
    fn manager_only_touches_rows_in_own_houses() {
        let manager = account(9, Role::Manager);
        let own = GuestOwnership {
            marketer_id: Some(7),
            house_manager_id: Some(9),
        };
        let other = GuestOwnership {
            marketer_id: Some(9),
            house_manager_id: Some(10),
        };
        assert!(can_touch_guest(&manager, &own));
        assert!(!can_touch_guest(&manager, &other));
    }
}
