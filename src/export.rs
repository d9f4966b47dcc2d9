//! Excel workbooks for the guest list and the statistics tables. Sheet
//! names, headers, column widths, and filename formats follow the original
//! back-office exports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::models::{GuestDetails, GuestStatus};
use crate::stats::StatusBreakdown;

const GUEST_HEADERS: [&str; 11] = [
    "STT",
    "Tên khách hàng",
    "Số điện thoại",
    "Marketing",
    "Nhà",
    "Ngày xem",
    "Trạng thái",
    "Ghi chú Admin",
    "Ghi chú Quản lý",
    "Ngày tạo",
    "Ngày cập nhật",
];
const GUEST_WIDTHS: [f64; 11] = [5.0, 20.0, 15.0, 20.0, 30.0, 18.0, 15.0, 30.0, 30.0, 18.0, 18.0];

const STATS_WIDTHS: [f64; 8] = [5.0, 25.0, 10.0, 10.0, 15.0, 15.0, 12.0, 10.0];

fn fmt_datetime(value: DateTime<Utc>) -> String {
    value.format("%d/%m/%Y %H:%M").to_string()
}

fn write_headers(
    sheet: &mut Worksheet,
    headers: &[&str],
    widths: &[f64],
) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (col, width) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    Ok(())
}

/// One sheet holding the currently filtered guest list, one row per guest.
pub fn guest_list_workbook(guests: &[GuestDetails]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Danh sách khách hàng")?;
    write_headers(sheet, &GUEST_HEADERS, &GUEST_WIDTHS)?;

    for (i, guest) in guests.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_number(row, 0, (i + 1) as f64)?;
        sheet.write_string(row, 1, &guest.guest_name)?;
        sheet.write_string(row, 2, &guest.guest_phone_number)?;
        sheet.write_string(row, 3, guest.marketer_name.as_deref().unwrap_or(""))?;
        sheet.write_string(row, 4, guest.house_address.as_deref().unwrap_or(""))?;
        sheet.write_string(
            row,
            5,
            &guest.view_date.map(fmt_datetime).unwrap_or_default(),
        )?;
        sheet.write_string(row, 6, guest.status.label())?;
        sheet.write_string(row, 7, &guest.admin_note)?;
        sheet.write_string(row, 8, &guest.manager_note)?;
        sheet.write_string(row, 9, &fmt_datetime(guest.created_at))?;
        sheet.write_string(row, 10, &fmt_datetime(guest.updated_at))?;
    }

    workbook.save_to_buffer()
}

pub fn guest_list_filename(now: DateTime<Utc>) -> String {
    format!(
        "Danh_sach_khach_hang_{}.xlsx",
        now.format("%d-%m-%Y_%H-%M")
    )
}

fn write_stats_sheet(
    sheet: &mut Worksheet,
    name: &str,
    subject_header: &str,
    rows: &[StatusBreakdown],
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;
    let mut headers = vec!["STT", subject_header];
    headers.extend(GuestStatus::ALL.iter().map(|s| s.label()));
    headers.push("Tổng");
    write_headers(sheet, &headers, &STATS_WIDTHS)?;

    for (i, stat) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_number(row, 0, (i + 1) as f64)?;
        sheet.write_string(row, 1, &stat.name)?;
        for (col, count) in stat.counts.iter().enumerate() {
            sheet.write_number(row, (col + 2) as u16, f64::from(*count))?;
        }
        sheet.write_number(row, 7, f64::from(stat.total))?;
    }
    Ok(())
}

/// Statistics workbook with one sheet per visible table: the marketer
/// breakdown and/or the manager breakdown, depending on the caller's role.
pub fn stats_workbook(
    marketer_stats: Option<&[StatusBreakdown]>,
    manager_stats: Option<&[StatusBreakdown]>,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    if let Some(rows) = marketer_stats {
        let sheet = workbook.add_worksheet();
        write_stats_sheet(sheet, "Thống kê Marketing", "Nhân viên Marketing", rows)?;
    }
    if let Some(rows) = manager_stats {
        let sheet = workbook.add_worksheet();
        write_stats_sheet(sheet, "Thống kê Quản lý", "Quản lý", rows)?;
    }
    workbook.save_to_buffer()
}

pub fn stats_filename(from: NaiveDate, to: NaiveDate) -> String {
    format!(
        "Thong_ke_khach_hang_{}_den_{}.xlsx",
        from.format("%d-%m-%Y"),
        to.format("%d-%m-%Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filenames_embed_timestamps() {
        let now = Utc.with_ymd_and_hms(2025, 6, 11, 14, 30, 0).unwrap();
        assert_eq!(
            guest_list_filename(now),
            "Danh_sach_khach_hang_11-06-2025_14-30.xlsx"
        );
        let from = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(
            stats_filename(from, to),
            "Thong_ke_khach_hang_09-06-2025_den_15-06-2025.xlsx"
        );
    }

    #[test]
    fn guest_workbook_builds_for_empty_and_filled_lists() {
        assert!(!guest_list_workbook(&[]).unwrap().is_empty());

        let guest = GuestDetails {
            id: 1,
            marketer_id: Some(1),
            house_id: 1,
            guest_name: "Tran B".to_owned(),
            guest_phone_number: "0909999999".to_owned(),
            view_date: Some(Utc.with_ymd_and_hms(2025, 6, 12, 9, 0, 0).unwrap()),
            status: GuestStatus::Closed,
            admin_note: "ghi chú".to_owned(),
            manager_note: String::new(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 12, 9, 0, 0).unwrap(),
            marketer_name: Some("Mkt A".to_owned()),
            house_address: Some("12 Le Loi".to_owned()),
            house_manager_id: Some(9),
            house_manager_name: Some("Mgr".to_owned()),
        };
        assert!(!guest_list_workbook(&[guest]).unwrap().is_empty());
    }

    #[test]
    fn stats_workbook_builds_per_visibility() {
        let rows = vec![StatusBreakdown {
            key_id: 1,
            name: "Mkt A".to_owned(),
            counts: [1, 2, 0, 0, 0],
            total: 3,
        }];
        assert!(!stats_workbook(Some(&rows), None).unwrap().is_empty());
        assert!(!stats_workbook(Some(&rows), Some(&rows)).unwrap().is_empty());
    }
}
