use chrono::NaiveDate;
use frontdesk_core::calendar::date_window;
use frontdesk_core::datastore::DataStore;
use frontdesk_core::filter::RoomFilter;
use frontdesk_core::grid::{CellState, project};
use frontdesk_core::stay::StayKind;
use tempfile::tempdir;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

#[test]
fn datastore_seeds_and_projects_a_grid() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");

    // A fresh store has the seeded room inventory and no stays.
    let rooms = store.load_rooms().expect("load rooms");
    assert_eq!(rooms.len(), 10);
    assert!(rooms.iter().all(|r| r.active));

    std::fs::write(
        temp.path().join("bookings.json"),
        r#"[
            {"booking_id": 5, "checkin_date": "2024-01-10", "checkout_date": "2024-01-13", "room_num": [101]},
            {"booking_id": 6, "checkin_date": "2024-01-12", "checkout_date": "2024-01-12", "room_num": [204]}
        ]"#,
    )
    .expect("write bookings");
    std::fs::write(
        temp.path().join("reservations.json"),
        r#"[
            {"reservation_id": 2, "checkin_date": "2024-01-11", "checkout_date": "2024-01-14", "room_num": [101, 510]}
        ]"#,
    )
    .expect("write reservations");

    let snapshot = store.load_snapshot().expect("load snapshot");
    // The zero-night booking 6 is dropped at load time.
    assert_eq!(snapshot.bookings.len(), 1);
    assert_eq!(snapshot.reservations.len(), 1);

    let today = day(2024, 1, 12);
    let window = date_window(today, 23, 3, today);
    let grid = project(&rooms, &window, &snapshot, &RoomFilter::default());

    // Booking 5 wins room 101 where the reservation overlaps it.
    assert_eq!(
        grid.cell("101", day(2024, 1, 10)),
        Some(&CellState::OccupiedStart {
            kind: StayKind::Booking,
            stay_id: 5,
            span: 3,
        })
    );
    assert_eq!(
        grid.cell("101", day(2024, 1, 11)),
        Some(&CellState::Occupied(StayKind::Booking))
    );
    // After checkout the reservation shows through as a continuation,
    // since its own check-in column resolved to the booking.
    assert_eq!(
        grid.cell("101", day(2024, 1, 13)),
        Some(&CellState::Occupied(StayKind::Reservation))
    );
    assert_eq!(grid.cell("101", day(2024, 1, 14)), Some(&CellState::Empty));

    // Room 510 sees the reservation from its own check-in.
    assert_eq!(
        grid.cell("510", day(2024, 1, 11)),
        Some(&CellState::OccupiedStart {
            kind: StayKind::Reservation,
            stay_id: 2,
            span: 3,
        })
    );

    // Room 204 stays empty: its only record was invalid.
    assert_eq!(grid.cell("204", day(2024, 1, 12)), Some(&CellState::Empty));
}

#[test]
fn search_filter_narrows_projected_rows() {
    let temp = tempdir().expect("tempdir");
    let store = DataStore::open(temp.path()).expect("open datastore");

    let rooms = store.load_rooms().expect("load rooms");
    let snapshot = store.load_snapshot().expect("load snapshot");
    let today = day(2024, 1, 12);
    let window = date_window(today, 23, 3, today);

    let filter = RoomFilter::parse(&["70".to_string()]).expect("parse filter");
    let grid = project(&rooms, &window, &snapshot, &filter);

    let numbers: Vec<&str> = grid.rows.iter().map(|r| r.room.number.as_str()).collect();
    assert_eq!(numbers, ["701"]);

    let filter = RoomFilter::parse(&["type:double".to_string()]).expect("parse filter");
    let grid = project(&rooms, &window, &snapshot, &filter);
    assert_eq!(grid.rows.len(), 4);
}
