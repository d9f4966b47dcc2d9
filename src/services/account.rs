use std::collections::BTreeMap;

use sqlx::SqlitePool;

use super::{ActionResult, DataResult};
use crate::db;
use crate::models::{Account, Role};

/// Phone-number lookup used by login. Empty result is not an error.
pub async fn get_account_by_phone(pool: &SqlitePool, phone: &str) -> Option<Account> {
    match db::account::by_phone(pool, phone).await {
        Ok(account) => account,
        Err(err) => {
            log::error!("Error fetching account by phone: {}", err);
            None
        }
    }
}

pub async fn create_account(
    pool: &SqlitePool,
    full_name: &str,
    phone_number: &str,
    role: Role,
) -> DataResult<Account> {
    if get_account_by_phone(pool, phone_number).await.is_some() {
        return DataResult::err("Số điện thoại đã được sử dụng");
    }

    match db::account::insert(pool, full_name, phone_number, role).await {
        Ok(account) => DataResult::ok(account, "Tạo tài khoản thành công"),
        Err(err) => {
            log::error!("Error creating account: {}", err);
            DataResult::err("Lỗi khi tạo tài khoản")
        }
    }
}

pub async fn get_all_accounts(pool: &SqlitePool) -> DataResult<Vec<Account>> {
    match db::account::all(pool).await {
        Ok(accounts) => DataResult::ok(accounts, "Danh sách tài khoản đã được lấy thành công"),
        Err(err) => {
            log::error!("Error fetching accounts: {}", err);
            DataResult::err("Không có tài khoản nào hoặc lỗi khi lấy dữ liệu")
        }
    }
}

pub async fn update_account(
    pool: &SqlitePool,
    account_id: i64,
    full_name: &str,
    phone_number: &str,
    role: Role,
) -> DataResult<Account> {
    match db::account::update(pool, account_id, full_name, phone_number, role).await {
        Ok(account) => DataResult::ok(account, "Cập nhật tài khoản thành công"),
        Err(err) => {
            log::error!("Error updating account: {}", err);
            DataResult::err("Lỗi khi cập nhật tài khoản")
        }
    }
}

pub async fn delete_account(pool: &SqlitePool, account_id: i64) -> ActionResult {
    match db::account::delete(pool, account_id).await {
        Ok(()) => ActionResult::ok("Xóa tài khoản thành công"),
        Err(err) => {
            log::error!("Error deleting account: {}", err);
            ActionResult::err("Lỗi khi xóa tài khoản")
        }
    }
}

/// id → full name of accounts with role Quản lý, for the house console's
/// manager dropdown.
pub async fn managers_name_map(pool: &SqlitePool) -> DataResult<BTreeMap<i64, String>> {
    match db::account::by_role(pool, Role::Manager).await {
        Ok(managers) => {
            let map = managers
                .into_iter()
                .map(|a| (a.id, a.full_name))
                .collect::<BTreeMap<_, _>>();
            DataResult::ok(map, "Danh sách quản lý đã được lấy thành công")
        }
        Err(err) => {
            log::error!("Error fetching managers: {}", err);
            DataResult::err("Lỗi khi lấy dữ liệu quản lý")
        }
    }
}

/// id → full name of accounts with role Marketing, for filters and the
/// admin's marketer dropdown on the guest form.
pub async fn marketers_name_map(pool: &SqlitePool) -> DataResult<BTreeMap<i64, String>> {
    match db::account::by_role(pool, Role::Marketing).await {
        Ok(marketers) => {
            let map = marketers
                .into_iter()
                .map(|a| (a.id, a.full_name))
                .collect::<BTreeMap<_, _>>();
            DataResult::ok(map, "Lấy dữ liệu nhân viên marketing thành công")
        }
        Err(err) => {
            log::error!("Error fetching marketers: {}", err);
            DataResult::err("Lỗi khi lấy dữ liệu nhân viên marketing")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil;

    #[tokio::test]
    async fn create_then_lookup_by_phone() {
        let pool = testutil::pool().await;

        let created = create_account(&pool, "Nguyen Van A", "0901234567", Role::Marketing).await;
        let account = created.data.expect("account created");
        assert_eq!(created.message, "Tạo tài khoản thành công");
        assert_eq!(account.full_name, "Nguyen Van A");
        assert_eq!(account.role, Role::Marketing);

        let found = get_account_by_phone(&pool, "0901234567").await;
        assert_eq!(found.map(|a| a.id), Some(account.id));

        let missing = get_account_by_phone(&pool, "0000000000").await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected() {
        let pool = testutil::pool().await;
        testutil::account(&pool, "Nguyen Van A", "0901234567", Role::Marketing).await;

        let second = create_account(&pool, "Tran Van B", "0901234567", Role::Manager).await;
        assert!(second.data.is_none());
        assert_eq!(second.message, "Số điện thoại đã được sử dụng");

        let all = get_all_accounts(&pool).await.data.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn name_maps_are_role_filtered() {
        let pool = testutil::pool().await;
        let mkt = testutil::account(&pool, "Mkt", "0901", Role::Marketing).await;
        let mgr = testutil::account(&pool, "Mgr", "0902", Role::Manager).await;
        testutil::account(&pool, "Adm", "0903", Role::Admin).await;

        let marketers = marketers_name_map(&pool).await.data.unwrap();
        assert_eq!(marketers.len(), 1);
        assert_eq!(marketers.get(&mkt.id).map(String::as_str), Some("Mkt"));

        let managers = managers_name_map(&pool).await.data.unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers.get(&mgr.id).map(String::as_str), Some("Mgr"));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let pool = testutil::pool().await;
        let account = testutil::account(&pool, "Cu", "0901", Role::Marketing).await;

        let updated = update_account(&pool, account.id, "Moi", "0902", Role::Manager).await;
        let updated = updated.data.unwrap();
        assert_eq!(updated.full_name, "Moi");
        assert_eq!(updated.role, Role::Manager);

        let deleted = delete_account(&pool, account.id).await;
        assert!(deleted.success);
        assert!(get_account_by_phone(&pool, "0902").await.is_none());
    }
}
