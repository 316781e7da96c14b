use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StayKind {
    Booking,
    Reservation,
}

impl StayKind {
    pub fn label_prefix(&self) -> &'static str {
        match self {
            StayKind::Booking => "B",
            StayKind::Reservation => "R",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StayKind::Booking => "booking",
            StayKind::Reservation => "reservation",
        }
    }
}

/// A booking or reservation occupying one or more rooms over a
/// half-open date interval `[checkin_date, checkout_date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stay {
    pub id: u64,
    pub kind: StayKind,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub room_numbers: Vec<u32>,
}

impl Stay {
    /// Occupancy includes the check-in day and excludes the check-out
    /// day; the check-out day may be the check-in day of another stay.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.checkin_date <= date && date < self.checkout_date
    }

    pub fn occupies_room(&self, number: u32) -> bool {
        self.room_numbers.contains(&number)
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.kind.label_prefix(), self.id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomCategory {
    Single,
    Double,
    Family,
}

impl RoomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomCategory::Single => "single",
            RoomCategory::Double => "double",
            RoomCategory::Family => "family",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RoomCategory::Single => "Single",
            RoomCategory::Double => "Double",
            RoomCategory::Family => "Family",
        }
    }

    /// Display order of the category groups in the grid.
    pub const GROUP_ORDER: [RoomCategory; 3] = [
        RoomCategory::Single,
        RoomCategory::Double,
        RoomCategory::Family,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "single" => Some(RoomCategory::Single),
            "double" => Some(RoomCategory::Double),
            "family" => Some(RoomCategory::Family),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub number: String,
    #[serde(rename = "type")]
    pub category: RoomCategory,
    #[serde(rename = "isActive")]
    pub active: bool,
}

/// Booking record as the upstream endpoint ships it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: u64,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_room_list")]
    pub room_num: Vec<u32>,
}

/// Reservation record as the upstream endpoint ships it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub reservation_id: u64,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_room_list")]
    pub room_num: Vec<u32>,
}

impl BookingRecord {
    pub fn into_stay(self) -> Option<Stay> {
        into_stay(
            self.booking_id,
            StayKind::Booking,
            self.checkin_date,
            self.checkout_date,
            self.room_num,
        )
    }
}

impl ReservationRecord {
    pub fn into_stay(self) -> Option<Stay> {
        into_stay(
            self.reservation_id,
            StayKind::Reservation,
            self.checkin_date,
            self.checkout_date,
            self.room_num,
        )
    }
}

fn into_stay(
    id: u64,
    kind: StayKind,
    checkin_date: NaiveDate,
    checkout_date: NaiveDate,
    room_numbers: Vec<u32>,
) -> Option<Stay> {
    if checkin_date >= checkout_date {
        warn!(
            kind = kind.as_str(),
            id,
            checkin = %checkin_date,
            checkout = %checkout_date,
            "skipping stay with non-positive night count"
        );
        return None;
    }

    Some(Stay {
        id,
        kind,
        checkin_date,
        checkout_date,
        room_numbers,
    })
}

/// Upstream sometimes ships `room_num` as something other than an
/// array; such a record can never match a room, but it must not take
/// the whole snapshot down. Non-numeric entries are dropped.
fn lenient_room_list<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| item.as_u64().and_then(|n| u32::try_from(n).ok()))
        .collect())
}

/// Immutable pair of stay collections used for one render cycle. A new
/// snapshot replaces the old one wholesale; nothing mutates in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub bookings: Vec<Stay>,
    pub reservations: Vec<Stay>,
}

impl Snapshot {
    /// Sorts each collection by id so that same-kind overlap resolution
    /// is deterministic (lowest id wins), and logs every overlapping
    /// pair — upstream data is supposed to never produce them.
    pub fn new(mut bookings: Vec<Stay>, mut reservations: Vec<Stay>) -> Self {
        bookings.sort_by_key(|s| s.id);
        reservations.sort_by_key(|s| s.id);
        let snapshot = Self {
            bookings,
            reservations,
        };
        snapshot.audit_overlaps();
        snapshot
    }

    pub fn stays(&self) -> impl Iterator<Item = &Stay> {
        self.bookings.iter().chain(self.reservations.iter())
    }

    fn audit_overlaps(&self) {
        audit_collection(&self.bookings);
        audit_collection(&self.reservations);
    }
}

fn audit_collection(stays: &[Stay]) {
    for (idx, a) in stays.iter().enumerate() {
        for b in &stays[idx + 1..] {
            let shared_room = a
                .room_numbers
                .iter()
                .copied()
                .find(|num| b.occupies_room(*num));
            let Some(room) = shared_room else {
                continue;
            };

            let intervals_overlap =
                a.checkin_date < b.checkout_date && b.checkin_date < a.checkout_date;
            if intervals_overlap {
                warn!(
                    kind = a.kind.as_str(),
                    first = a.id,
                    second = b.id,
                    room,
                    "overlapping stays of the same kind; lowest id wins"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{BookingRecord, Snapshot, Stay, StayKind};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn wire_record_parses_reference_shape() {
        let raw = r#"{
            "booking_id": 5,
            "checkin_date": "2024-01-10",
            "checkout_date": "2024-01-13",
            "room_num": [101, 204]
        }"#;

        let record: BookingRecord = serde_json::from_str(raw).expect("parse");
        let stay = record.into_stay().expect("valid stay");
        assert_eq!(stay.id, 5);
        assert_eq!(stay.kind, StayKind::Booking);
        assert_eq!(stay.room_numbers, vec![101, 204]);
    }

    #[test]
    fn missing_or_non_array_room_num_yields_empty_list() {
        let missing = r#"{
            "booking_id": 1,
            "checkin_date": "2024-01-10",
            "checkout_date": "2024-01-13"
        }"#;
        let record: BookingRecord = serde_json::from_str(missing).expect("parse");
        assert!(record.room_num.is_empty());

        let scalar = r#"{
            "booking_id": 2,
            "checkin_date": "2024-01-10",
            "checkout_date": "2024-01-13",
            "room_num": 101
        }"#;
        let record: BookingRecord = serde_json::from_str(scalar).expect("parse");
        assert!(record.room_num.is_empty());
    }

    #[test]
    fn zero_night_stay_is_rejected() {
        let record = BookingRecord {
            booking_id: 3,
            checkin_date: day(2024, 1, 10),
            checkout_date: day(2024, 1, 10),
            room_num: vec![101],
        };
        assert!(record.into_stay().is_none());
    }

    #[test]
    fn snapshot_sorts_each_collection_by_id() {
        let stay = |id| Stay {
            id,
            kind: StayKind::Booking,
            checkin_date: day(2024, 1, 10),
            checkout_date: day(2024, 1, 11),
            room_numbers: vec![id as u32],
        };

        let snapshot = Snapshot::new(vec![stay(9), stay(2), stay(5)], vec![]);
        let ids: Vec<u64> = snapshot.bookings.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }
}
