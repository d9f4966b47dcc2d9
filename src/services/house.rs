use std::collections::BTreeMap;

use sqlx::SqlitePool;

use super::{ActionResult, DataResult};
use crate::db;
use crate::models::{House, HouseDetails};

pub async fn get_all_houses(pool: &SqlitePool) -> DataResult<Vec<HouseDetails>> {
    match db::house::all_with_manager(pool).await {
        Ok(houses) => DataResult::ok(houses, "Danh sách nhà đã được lấy thành công"),
        Err(err) => {
            log::error!("Error fetching houses: {}", err);
            DataResult::err("Không có nhà nào hoặc lỗi khi lấy dữ liệu")
        }
    }
}

pub async fn create_house(pool: &SqlitePool, manager_id: i64, address: &str) -> DataResult<House> {
    match db::house::insert(pool, manager_id, address).await {
        Ok(house) => DataResult::ok(house, "Tạo nhà thành công"),
        Err(err) => {
            log::error!("Error creating house: {}", err);
            DataResult::err("Lỗi khi tạo nhà")
        }
    }
}

pub async fn update_house(
    pool: &SqlitePool,
    house_id: i64,
    manager_id: i64,
    address: &str,
) -> DataResult<House> {
    match db::house::update(pool, house_id, manager_id, address).await {
        Ok(house) => DataResult::ok(house, "Cập nhật nhà thành công"),
        Err(err) => {
            log::error!("Error updating house: {}", err);
            DataResult::err("Lỗi khi cập nhật nhà")
        }
    }
}

pub async fn delete_house(pool: &SqlitePool, house_id: i64) -> ActionResult {
    match db::house::delete(pool, house_id).await {
        Ok(()) => ActionResult::ok("Xóa nhà thành công"),
        Err(err) => {
            log::error!("Error deleting house: {}", err);
            ActionResult::err("Lỗi khi xóa nhà")
        }
    }
}

/// id → address map for dropdowns. When `manager_id` is set only that
/// manager's houses are listed (the manager-facing guest form).
pub async fn house_address_map(
    pool: &SqlitePool,
    manager_id: Option<i64>,
) -> DataResult<BTreeMap<i64, String>> {
    let houses = match manager_id {
        Some(id) => db::house::by_manager(pool, id).await,
        None => db::house::all(pool).await,
    };
    match houses {
        Ok(houses) => {
            let map = houses
                .into_iter()
                .map(|h| (h.id, h.address))
                .collect::<BTreeMap<_, _>>();
            DataResult::ok(map, "Danh sách nhà đã được lấy thành công")
        }
        Err(err) => {
            log::error!("Error fetching house addresses: {}", err);
            DataResult::err("Không có nhà nào hoặc lỗi khi lấy dữ liệu")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::testutil;

    #[tokio::test]
    async fn crud_round_trip() {
        let pool = testutil::pool().await;
        let manager = testutil::account(&pool, "Quan Ly", "0909", Role::Manager).await;

        let created = create_house(&pool, manager.id, "12 Le Loi").await;
        let house = created.data.expect("house created");
        assert_eq!(created.message, "Tạo nhà thành công");

        let listed = get_all_houses(&pool).await.data.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].manager_name.as_deref(), Some("Quan Ly"));

        let updated = update_house(&pool, house.id, manager.id, "34 Hai Ba Trung").await;
        assert_eq!(updated.data.unwrap().address, "34 Hai Ba Trung");

        let deleted = delete_house(&pool, house.id).await;
        assert!(deleted.success);
        assert!(get_all_houses(&pool).await.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn address_map_can_filter_by_manager() {
        let pool = testutil::pool().await;
        let m1 = testutil::account(&pool, "M1", "0901", Role::Manager).await;
        let m2 = testutil::account(&pool, "M2", "0902", Role::Manager).await;
        let h1 = testutil::house(&pool, m1.id, "1 Nguyen Hue").await;
        testutil::house(&pool, m2.id, "2 Nguyen Hue").await;

        let all = house_address_map(&pool, None).await.data.unwrap();
        assert_eq!(all.len(), 2);

        let only_m1 = house_address_map(&pool, Some(m1.id)).await.data.unwrap();
        assert_eq!(only_m1.len(), 1);
        assert!(only_m1.contains_key(&h1.id));
    }
}
