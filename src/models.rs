use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Staff roles. Stored and displayed as the fixed Vietnamese labels, which
/// double as the values kept in the `role` column.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
pub enum Role {
    #[serde(rename = "Marketing")]
    #[sqlx(rename = "Marketing")]
    Marketing,
    #[serde(rename = "Quản lý")]
    #[sqlx(rename = "Quản lý")]
    Manager,
    #[serde(rename = "Quản trị viên")]
    #[sqlx(rename = "Quản trị viên")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Marketing, Role::Manager, Role::Admin];

    pub fn label(self) -> &'static str {
        match self {
            Role::Marketing => "Marketing",
            Role::Manager => "Quản lý",
            Role::Admin => "Quản trị viên",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.label() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Guest lead lifecycle. Same storage scheme as [`Role`]: the variant is the
/// stable internal code, the label is both the display string and the stored
/// value.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
pub enum GuestStatus {
    #[default]
    #[serde(rename = "Mới")]
    #[sqlx(rename = "Mới")]
    New,
    #[serde(rename = "Đã chốt")]
    #[sqlx(rename = "Đã chốt")]
    Closed,
    #[serde(rename = "Chuẩn bị xem")]
    #[sqlx(rename = "Chuẩn bị xem")]
    ViewingScheduled,
    #[serde(rename = "Đang chăm sóc")]
    #[sqlx(rename = "Đang chăm sóc")]
    InProgress,
    #[serde(rename = "Không chốt")]
    #[sqlx(rename = "Không chốt")]
    NotClosed,
}

impl GuestStatus {
    /// Fixed legend order used by the statistics tables and exports. Charts
    /// and breakdown rows always carry all five entries, absent ones as 0.
    pub const ALL: [GuestStatus; 5] = [
        GuestStatus::New,
        GuestStatus::Closed,
        GuestStatus::ViewingScheduled,
        GuestStatus::InProgress,
        GuestStatus::NotClosed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GuestStatus::New => "Mới",
            GuestStatus::Closed => "Đã chốt",
            GuestStatus::ViewingScheduled => "Chuẩn bị xem",
            GuestStatus::InProgress => "Đang chăm sóc",
            GuestStatus::NotClosed => "Không chốt",
        }
    }

    /// Badge color used by the templates, matching the original UI mapping.
    pub fn color(self) -> &'static str {
        match self {
            GuestStatus::New => "teal",
            GuestStatus::Closed => "green",
            GuestStatus::ViewingScheduled => "blue",
            GuestStatus::InProgress => "orange",
            GuestStatus::NotClosed => "red",
        }
    }

    /// Position in [`GuestStatus::ALL`], used to index count arrays.
    pub fn legend_index(self) -> usize {
        match self {
            GuestStatus::New => 0,
            GuestStatus::Closed => 1,
            GuestStatus::ViewingScheduled => 2,
            GuestStatus::InProgress => 3,
            GuestStatus::NotClosed => 4,
        }
    }
}

impl fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GuestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GuestStatus::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| format!("unknown guest status: {s}"))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub full_name: String,
    pub phone_number: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct House {
    pub id: i64,
    pub manager_id: i64,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// House row joined with its manager's name, for the house console.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct HouseDetails {
    pub id: i64,
    pub manager_id: i64,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub manager_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Guest {
    pub id: i64,
    pub marketer_id: Option<i64>,
    pub house_id: i64,
    pub guest_name: String,
    pub guest_phone_number: String,
    pub view_date: Option<DateTime<Utc>>,
    pub status: GuestStatus,
    pub admin_note: String,
    pub manager_note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Guest row joined with the display fields the list, filters, and
/// statistics need: marketer name, house address, and the house's manager.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct GuestDetails {
    pub id: i64,
    pub marketer_id: Option<i64>,
    pub house_id: i64,
    pub guest_name: String,
    pub guest_phone_number: String,
    pub view_date: Option<DateTime<Utc>>,
    pub status: GuestStatus,
    pub admin_note: String,
    pub manager_note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub marketer_name: Option<String>,
    pub house_address: Option<String>,
    pub house_manager_id: Option<i64>,
    pub house_manager_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.label().parse::<Role>().unwrap(), role);
        }
        assert!("Nhân viên".parse::<Role>().is_err());
    }

    #[test]
    fn status_labels_round_trip() {
        for status in GuestStatus::ALL {
            assert_eq!(status.label().parse::<GuestStatus>().unwrap(), status);
        }
        assert!("Không xem".parse::<GuestStatus>().is_err());
    }

    #[test]
    fn legend_index_matches_legend_order() {
        for (i, status) in GuestStatus::ALL.into_iter().enumerate() {
            assert_eq!(status.legend_index(), i);
        }
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&GuestStatus::Closed).unwrap();
        assert_eq!(json, "\"Đã chốt\"");
    }
}
