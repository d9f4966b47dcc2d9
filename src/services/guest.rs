use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use super::{ActionResult, DataResult};
use crate::access::can_touch_guest;
use crate::db;
use crate::db::guest::{GuestPatch, NewGuest};
use crate::models::{Account, Guest, GuestDetails, GuestStatus, Role};
use crate::stats::{self, StatusBreakdown};

/// Role-filtered guest listing, newest first. Marketing sees only its own
/// rows; a manager sees the rows of their houses (or an empty result with an
/// explicit message when they own none); admins see everything.
pub async fn get_guests_with_details(
    pool: &SqlitePool,
    caller: &Account,
) -> DataResult<Vec<GuestDetails>> {
    let fetched = match caller.role {
        Role::Marketing => db::guest::by_marketer_with_details(pool, caller.id).await,
        Role::Manager => {
            let houses = match db::house::by_manager(pool, caller.id).await {
                Ok(houses) => houses,
                Err(err) => {
                    log::error!("Error fetching manager houses: {}", err);
                    return DataResult::err("Lỗi khi lấy dữ liệu khách");
                }
            };
            if houses.is_empty() {
                return DataResult::ok(Vec::new(), "Không tìm thấy nhà nào");
            }
            let house_ids = houses.iter().map(|h| h.id).collect::<Vec<_>>();
            db::guest::by_houses_with_details(pool, &house_ids).await
        }
        Role::Admin => db::guest::all_with_details(pool).await,
    };

    match fetched {
        Ok(guests) => {
            let message = if guests.is_empty() {
                "Không tìm thấy khách nào"
            } else {
                "Lấy dữ liệu khách thành công"
            };
            DataResult::ok(guests, message)
        }
        Err(err) => {
            log::error!("Error fetching guests: {}", err);
            DataResult::err("Lỗi khi lấy dữ liệu khách")
        }
    }
}

/// Guest form payload, shared by create and edit.
#[derive(Debug, Clone, Default)]
pub struct GuestInput {
    pub marketer_id: Option<i64>,
    pub house_id: Option<i64>,
    pub guest_name: String,
    pub guest_phone_number: String,
    pub view_date: Option<DateTime<Utc>>,
    pub status: GuestStatus,
    pub admin_note: String,
    pub manager_note: String,
}

impl GuestInput {
    fn is_incomplete(&self) -> bool {
        self.guest_name.trim().is_empty()
            || self.guest_phone_number.trim().is_empty()
            || self.house_id.is_none()
    }
}

enum UpdateFailure {
    NotFound,
    Denied,
    Store,
}

/// The one path every guest mutation goes through: re-fetch the ownership
/// keys, consult the authorization predicate, strip marketer reassignment
/// for non-admins, then apply the patch.
async fn authorized_update(
    pool: &SqlitePool,
    caller: &Account,
    guest_id: i64,
    mut patch: GuestPatch,
) -> Result<Guest, UpdateFailure> {
    let ownership = match db::guest::ownership(pool, guest_id).await {
        Ok(Some(ownership)) => ownership,
        Ok(None) => return Err(UpdateFailure::NotFound),
        Err(err) => {
            log::error!("Error fetching guest ownership: {}", err);
            return Err(UpdateFailure::Store);
        }
    };
    if !can_touch_guest(caller, &ownership) {
        return Err(UpdateFailure::Denied);
    }
    if caller.role != Role::Admin {
        // Only admins may reassign the originating marketer.
        patch.marketer_id = None;
    }
    db::guest::update(pool, guest_id, &patch)
        .await
        .map_err(|err| {
            log::error!("Error updating guest: {}", err);
            UpdateFailure::Store
        })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Create a guest, or merge into the existing row when the phone number is
/// already known anywhere in the full, unfiltered set. The merge marks the
/// row Đã chốt and keeps the original marketer/house attribution so the
/// performance credit stays with whoever originated the lead.
pub async fn create_guest(
    pool: &SqlitePool,
    caller: &Account,
    input: &GuestInput,
) -> DataResult<Guest> {
    if input.is_incomplete() {
        return DataResult::err("Vui lòng điền đầy đủ thông tin");
    }
    let phone = input.guest_phone_number.trim();

    let all = match db::guest::all_with_details(pool).await {
        Ok(all) => all,
        Err(err) => {
            log::error!("Error fetching guests for duplicate check: {}", err);
            return DataResult::err("Không thể thêm khách");
        }
    };

    if let Some(existing) = all.iter().find(|g| g.guest_phone_number == phone) {
        let patch = GuestPatch {
            status: Some(GuestStatus::Closed),
            guest_name: Some(input.guest_name.trim().to_owned()),
            // New input wins only where it is present; marketer_id and
            // house_id are deliberately left out of the patch.
            view_date: input.view_date.map(Some),
            admin_note: non_empty(&input.admin_note),
            manager_note: non_empty(&input.manager_note),
            ..GuestPatch::default()
        };
        return match authorized_update(pool, caller, existing.id, patch).await {
            Ok(guest) => {
                let credited = existing
                    .marketer_name
                    .as_deref()
                    .unwrap_or("nhân viên marketing");
                DataResult::ok(
                    guest,
                    format!(
                        "Khách hàng đã tồn tại với số điện thoại này. \
                         Đã cập nhật trạng thái thành \"Đã chốt\" và tính KPI cho {credited} ban đầu."
                    ),
                )
            }
            Err(UpdateFailure::Denied) => DataResult::err("Không có quyền cập nhật khách hàng này"),
            Err(UpdateFailure::NotFound) | Err(UpdateFailure::Store) => {
                DataResult::err("Không thể cập nhật")
            }
        };
    }

    let marketer_id = match caller.role {
        Role::Marketing => Some(caller.id),
        Role::Manager => None,
        Role::Admin => input.marketer_id,
    };
    let new = NewGuest {
        marketer_id,
        house_id: input.house_id.unwrap_or_default(),
        guest_name: input.guest_name.trim().to_owned(),
        guest_phone_number: phone.to_owned(),
        view_date: input.view_date,
        status: input.status,
        admin_note: input.admin_note.trim().to_owned(),
        manager_note: input.manager_note.trim().to_owned(),
    };
    match db::guest::insert(pool, &new).await {
        Ok(guest) => DataResult::ok(guest, "Thêm khách thành công"),
        Err(err) => {
            log::error!("Error creating guest: {}", err);
            DataResult::err("Không thể thêm khách")
        }
    }
}

pub async fn update_guest(
    pool: &SqlitePool,
    caller: &Account,
    guest_id: i64,
    input: &GuestInput,
) -> DataResult<Guest> {
    if input.is_incomplete() {
        return DataResult::err("Vui lòng điền đầy đủ thông tin");
    }
    let patch = GuestPatch {
        marketer_id: Some(input.marketer_id),
        house_id: input.house_id,
        guest_name: Some(input.guest_name.trim().to_owned()),
        guest_phone_number: Some(input.guest_phone_number.trim().to_owned()),
        view_date: Some(input.view_date),
        status: Some(input.status),
        admin_note: Some(input.admin_note.trim().to_owned()),
        manager_note: Some(input.manager_note.trim().to_owned()),
    };
    match authorized_update(pool, caller, guest_id, patch).await {
        Ok(guest) => DataResult::ok(guest, "Cập nhật thành công"),
        Err(UpdateFailure::Denied) => DataResult::err("Không có quyền cập nhật khách hàng này"),
        Err(UpdateFailure::NotFound) | Err(UpdateFailure::Store) => {
            DataResult::err("Không thể cập nhật")
        }
    }
}

pub async fn delete_guest(pool: &SqlitePool, caller: &Account, guest_id: i64) -> ActionResult {
    let ownership = match db::guest::ownership(pool, guest_id).await {
        Ok(Some(ownership)) => ownership,
        Ok(None) => return ActionResult::err("Không thể xóa khách"),
        Err(err) => {
            log::error!("Error fetching guest ownership: {}", err);
            return ActionResult::err("Không thể xóa khách");
        }
    };
    if !can_touch_guest(caller, &ownership) {
        return ActionResult::err("Không có quyền xóa khách hàng này");
    }
    match db::guest::delete(pool, guest_id).await {
        Ok(()) => ActionResult::ok("Xóa khách thành công"),
        Err(err) => {
            log::error!("Error deleting guest: {}", err);
            ActionResult::err("Không thể xóa khách")
        }
    }
}

/// Per-marketer status breakdown for the caller's visible guests created in
/// the given window.
pub async fn stats_by_marketer(
    pool: &SqlitePool,
    caller: &Account,
    from: NaiveDate,
    to: NaiveDate,
) -> DataResult<Vec<StatusBreakdown>> {
    match get_guests_with_details(pool, caller).await.data {
        Some(rows) => {
            let windowed = stats::window(&rows, Some(from), Some(to));
            DataResult::ok(
                stats::breakdown_by_marketer(&windowed),
                "Lấy dữ liệu phân tích thành công",
            )
        }
        None => DataResult::err("Lỗi khi lấy dữ liệu phân tích"),
    }
}

/// Per-manager (of the guest's house) breakdown, same window and visibility.
pub async fn stats_by_manager(
    pool: &SqlitePool,
    caller: &Account,
    from: NaiveDate,
    to: NaiveDate,
) -> DataResult<Vec<StatusBreakdown>> {
    match get_guests_with_details(pool, caller).await.data {
        Some(rows) => {
            let windowed = stats::window(&rows, Some(from), Some(to));
            DataResult::ok(
                stats::breakdown_by_manager(&windowed),
                "Lấy dữ liệu phân tích thành công",
            )
        }
        None => DataResult::err("Lỗi khi lấy dữ liệu phân tích"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::House;
    use crate::services::testutil;

    struct Fixture {
        pool: SqlitePool,
        admin: Account,
        marketer_a: Account,
        marketer_b: Account,
        manager: Account,
        idle_manager: Account,
        house: House,
    }

    async fn fixture() -> Fixture {
        let pool = testutil::pool().await;
        let admin = testutil::account(&pool, "Admin", "0900000001", Role::Admin).await;
        let marketer_a = testutil::account(&pool, "Mkt A", "0900000002", Role::Marketing).await;
        let marketer_b = testutil::account(&pool, "Mkt B", "0900000003", Role::Marketing).await;
        let manager = testutil::account(&pool, "Mgr", "0900000004", Role::Manager).await;
        let idle_manager = testutil::account(&pool, "Mgr 2", "0900000005", Role::Manager).await;
        let house = testutil::house(&pool, manager.id, "12 Le Loi").await;
        Fixture {
            pool,
            admin,
            marketer_a,
            marketer_b,
            manager,
            idle_manager,
            house,
        }
    }

    fn input(fx: &Fixture, name: &str, phone: &str) -> GuestInput {
        GuestInput {
            marketer_id: None,
            house_id: Some(fx.house.id),
            guest_name: name.to_owned(),
            guest_phone_number: phone.to_owned(),
            view_date: None,
            status: GuestStatus::New,
            admin_note: String::new(),
            manager_note: String::new(),
        }
    }

    #[tokio::test]
    async fn create_requires_all_fields() {
        let fx = fixture().await;
        let mut incomplete = input(&fx, "Tran B", "0909999999");
        incomplete.house_id = None;

        let result = create_guest(&fx.pool, &fx.admin, &incomplete).await;
        assert!(result.data.is_none());
        assert_eq!(result.message, "Vui lòng điền đầy đủ thông tin");
        let all = db::guest::all_with_details(&fx.pool).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn marketing_create_forces_own_attribution() {
        let fx = fixture().await;
        let mut submitted = input(&fx, "Tran B", "0909999999");
        submitted.marketer_id = Some(fx.marketer_b.id);

        let created = create_guest(&fx.pool, &fx.marketer_a, &submitted).await;
        assert_eq!(created.data.unwrap().marketer_id, Some(fx.marketer_a.id));
    }

    #[tokio::test]
    async fn manager_create_leaves_marketer_unset() {
        let fx = fixture().await;
        let mut submitted = input(&fx, "Tran B", "0909999999");
        submitted.marketer_id = Some(fx.marketer_a.id);

        let created = create_guest(&fx.pool, &fx.manager, &submitted).await;
        assert_eq!(created.data.unwrap().marketer_id, None);
    }

    #[tokio::test]
    async fn duplicate_phone_merges_and_keeps_attribution() {
        let fx = fixture().await;
        let first = create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "Tran B", "0909999999"))
            .await
            .data
            .unwrap();
        assert_eq!(first.status, GuestStatus::New);

        let second_house = testutil::house(&fx.pool, fx.manager.id, "99 Vo Van Tan").await;
        let mut resubmit = input(&fx, "Tran Van B", "0909999999");
        resubmit.house_id = Some(second_house.id);
        resubmit.marketer_id = Some(fx.marketer_b.id);
        resubmit.status = GuestStatus::Closed;

        let merged = create_guest(&fx.pool, &fx.admin, &resubmit).await;
        let merged_guest = merged.data.unwrap();
        assert!(merged.message.contains("Mkt A"));

        let all = db::guest::all_with_details(&fx.pool).await.unwrap();
        assert_eq!(all.len(), 1, "merge must never produce a second row");
        assert_eq!(merged_guest.id, first.id);
        assert_eq!(merged_guest.status, GuestStatus::Closed);
        assert_eq!(merged_guest.marketer_id, Some(fx.marketer_a.id));
        assert_eq!(merged_guest.house_id, fx.house.id);
        assert_eq!(merged_guest.guest_name, "Tran Van B");
    }

    #[tokio::test]
    async fn duplicate_merge_by_non_owner_is_denied() {
        let fx = fixture().await;
        create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "Tran B", "0909999999")).await;

        let result =
            create_guest(&fx.pool, &fx.marketer_b, &input(&fx, "Tran C", "0909999999")).await;
        assert!(result.data.is_none());
        assert_eq!(result.message, "Không có quyền cập nhật khách hàng này");

        let all = db::guest::all_with_details(&fx.pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, GuestStatus::New);
        assert_eq!(all[0].guest_name, "Tran B");
    }

    #[tokio::test]
    async fn merge_keeps_existing_notes_when_input_empty() {
        let fx = fixture().await;
        let mut first = input(&fx, "Tran B", "0909999999");
        first.admin_note = "ghi chú cũ".to_owned();
        create_guest(&fx.pool, &fx.admin, &first).await;

        let resubmit = input(&fx, "Tran B", "0909999999");
        let merged = create_guest(&fx.pool, &fx.admin, &resubmit).await;
        assert_eq!(merged.data.unwrap().admin_note, "ghi chú cũ");
    }

    #[tokio::test]
    async fn listing_is_role_filtered() {
        let fx = fixture().await;
        create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "KH 1", "0911111111")).await;
        create_guest(&fx.pool, &fx.marketer_b, &input(&fx, "KH 2", "0922222222")).await;
        create_guest(&fx.pool, &fx.manager, &input(&fx, "KH 3", "0933333333")).await;

        let admin_view = get_guests_with_details(&fx.pool, &fx.admin).await;
        assert_eq!(admin_view.data.unwrap().len(), 3);
        assert_eq!(admin_view.message, "Lấy dữ liệu khách thành công");

        let a_view = get_guests_with_details(&fx.pool, &fx.marketer_a)
            .await
            .data
            .unwrap();
        assert_eq!(a_view.len(), 1);
        assert!(a_view.iter().all(|g| g.marketer_id == Some(fx.marketer_a.id)));

        // All three guests sit in the manager's only house.
        let mgr_view = get_guests_with_details(&fx.pool, &fx.manager)
            .await
            .data
            .unwrap();
        assert_eq!(mgr_view.len(), 3);
        assert!(mgr_view.iter().all(|g| g.house_id == fx.house.id));

        let idle_view = get_guests_with_details(&fx.pool, &fx.idle_manager).await;
        assert_eq!(idle_view.message, "Không tìm thấy nhà nào");
        assert!(idle_view.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_by_non_owner_is_denied_and_row_unchanged() {
        let fx = fixture().await;
        let guest = create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "KH 1", "0911111111"))
            .await
            .data
            .unwrap();

        let mut attempt = input(&fx, "Đổi tên", "0911111111");
        attempt.status = GuestStatus::NotClosed;
        let result = update_guest(&fx.pool, &fx.marketer_b, guest.id, &attempt).await;
        assert!(result.data.is_none());
        assert_eq!(result.message, "Không có quyền cập nhật khách hàng này");

        let row = db::guest::by_id(&fx.pool, guest.id).await.unwrap().unwrap();
        assert_eq!(row.guest_name, "KH 1");
        assert_eq!(row.status, GuestStatus::New);
        assert_eq!(row.updated_at, guest.updated_at);
    }

    #[tokio::test]
    async fn non_admin_update_cannot_reassign_marketer() {
        let fx = fixture().await;
        let guest = create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "KH 1", "0911111111"))
            .await
            .data
            .unwrap();

        let mut attempt = input(&fx, "KH 1", "0911111111");
        attempt.marketer_id = Some(fx.marketer_b.id);
        attempt.status = GuestStatus::InProgress;
        let updated = update_guest(&fx.pool, &fx.marketer_a, guest.id, &attempt)
            .await
            .data
            .unwrap();
        assert_eq!(updated.marketer_id, Some(fx.marketer_a.id));
        assert_eq!(updated.status, GuestStatus::InProgress);

        let mut admin_attempt = input(&fx, "KH 1", "0911111111");
        admin_attempt.marketer_id = Some(fx.marketer_b.id);
        let reassigned = update_guest(&fx.pool, &fx.admin, guest.id, &admin_attempt)
            .await
            .data
            .unwrap();
        assert_eq!(reassigned.marketer_id, Some(fx.marketer_b.id));
    }

    #[tokio::test]
    async fn delete_is_ownership_checked() {
        let fx = fixture().await;
        let guest = create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "KH 1", "0911111111"))
            .await
            .data
            .unwrap();

        let denied = delete_guest(&fx.pool, &fx.marketer_b, guest.id).await;
        assert!(!denied.success);
        assert_eq!(denied.message, "Không có quyền xóa khách hàng này");
        assert!(db::guest::by_id(&fx.pool, guest.id).await.unwrap().is_some());

        let allowed = delete_guest(&fx.pool, &fx.marketer_a, guest.id).await;
        assert!(allowed.success);
        assert!(db::guest::by_id(&fx.pool, guest.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn manager_can_touch_guests_in_own_houses() {
        let fx = fixture().await;
        let guest = create_guest(&fx.pool, &fx.marketer_a, &input(&fx, "KH 1", "0911111111"))
            .await
            .data
            .unwrap();

        let mut edit = input(&fx, "KH 1 sửa", "0911111111");
        edit.manager_note = "đã gọi lại".to_owned();
        let updated = update_guest(&fx.pool, &fx.manager, guest.id, &edit)
            .await
            .data
            .unwrap();
        assert_eq!(updated.manager_note, "đã gọi lại");

        let denied = update_guest(&fx.pool, &fx.idle_manager, guest.id, &edit).await;
        assert_eq!(denied.message, "Không có quyền cập nhật khách hàng này");
    }
}
