use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::CalendarDay;
use crate::filter::RoomFilter;
use crate::resolver;
use crate::stay::{Room, RoomCategory, Snapshot, Stay, StayKind};

/// Render-ready classification of one (room, date) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    /// No stay covers the cell.
    Empty,
    /// Inside a stay's interval but not its check-in column; tinted,
    /// no label, and never assigned a span.
    Occupied(StayKind),
    /// The stay's check-in column. Carries the label id and the span
    /// clipped to the visible window.
    OccupiedStart {
        kind: StayKind,
        stay_id: u64,
        span: usize,
    },
}

/// How many consecutive window columns the stay's bar covers, starting
/// at its check-in column.
///
/// Walks the ordered window forward from the check-in date's position,
/// counting entries that still fall inside `[checkin, checkout)`. The
/// count is therefore clipped to the window: a bar can never be asked
/// to render past the last visible column. Returns 0 when the check-in
/// date is not a window column (the stay entered before the visible
/// range and must not be drawn as starting here).
pub fn span_length(stay: &Stay, start: NaiveDate, window: &[CalendarDay]) -> usize {
    let Some(pos) = window.iter().position(|day| day.date == start) else {
        return 0;
    };

    window[pos..]
        .iter()
        .take_while(|day| stay.covers(day.date))
        .count()
}

/// One grid row: a room and its per-column cell states, aligned with
/// the window the grid was projected against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRow {
    pub room: Room,
    pub cells: Vec<CellState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub window: Vec<CalendarDay>,
    pub rows: Vec<RoomRow>,
}

impl Grid {
    /// Cell classification for a room number and date, if both are in
    /// the projected grid.
    pub fn cell(&self, room_number: &str, date: NaiveDate) -> Option<&CellState> {
        let row = self.rows.iter().find(|r| r.room.number == room_number)?;
        let col = self.window.iter().position(|day| day.date == date)?;
        row.cells.get(col)
    }
}

/// Projects the full occupancy grid: rooms are filtered, grouped by
/// category in display order, and every (room, date) cell classified.
///
/// The span calculator runs only for start cells; continuation cells
/// carry no span by construction.
#[tracing::instrument(skip_all, fields(rooms = rooms.len(), days = window.len()))]
pub fn project(
    rooms: &[Room],
    window: &[CalendarDay],
    snapshot: &Snapshot,
    filter: &RoomFilter,
) -> Grid {
    let mut rows = Vec::new();

    for category in RoomCategory::GROUP_ORDER {
        let mut group: Vec<&Room> = rooms
            .iter()
            .filter(|room| room.category == category && filter.matches(room))
            .collect();
        group.sort_by(|a, b| a.number.cmp(&b.number));

        for room in group {
            rows.push(RoomRow {
                room: room.clone(),
                cells: project_row(room, window, snapshot),
            });
        }
    }

    debug!(rows = rows.len(), "projected grid");
    Grid {
        window: window.to_vec(),
        rows,
    }
}

fn project_row(room: &Room, window: &[CalendarDay], snapshot: &Snapshot) -> Vec<CellState> {
    window
        .iter()
        .map(|day| {
            let Some(occ) = resolver::resolve(snapshot, &room.number, day.date) else {
                return CellState::Empty;
            };

            if occ.stay.checkin_date == day.date {
                CellState::OccupiedStart {
                    kind: occ.kind,
                    stay_id: occ.stay.id,
                    span: span_length(occ.stay, day.date, window),
                }
            } else {
                CellState::Occupied(occ.kind)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{CellState, project, span_length};
    use crate::calendar::date_window;
    use crate::filter::RoomFilter;
    use crate::stay::{Room, RoomCategory, Snapshot, Stay, StayKind};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn booking(id: u64, checkin: NaiveDate, checkout: NaiveDate, rooms: &[u32]) -> Stay {
        Stay {
            id,
            kind: StayKind::Booking,
            checkin_date: checkin,
            checkout_date: checkout,
            room_numbers: rooms.to_vec(),
        }
    }

    fn room(number: &str, category: RoomCategory) -> Room {
        Room {
            id: number.to_string(),
            number: number.to_string(),
            category,
            active: true,
        }
    }

    #[test]
    fn span_counts_nights_within_window() {
        let stay = booking(1, day(2024, 6, 28), day(2024, 6, 30), &[101]);
        let window = date_window(day(2024, 6, 28), 23, 3, day(2024, 6, 28));

        assert_eq!(span_length(&stay, day(2024, 6, 28), &window), 2);
    }

    #[test]
    fn span_clips_to_truncated_window() {
        let stay = booking(1, day(2024, 6, 28), day(2024, 6, 30), &[101]);
        // Window ends right after 06-28.
        let window = date_window(day(2024, 6, 28), 4, 3, day(2024, 6, 28));
        assert_eq!(window.last().map(|d| d.date), Some(day(2024, 6, 28)));

        assert_eq!(span_length(&stay, day(2024, 6, 28), &window), 1);
    }

    #[test]
    fn span_is_zero_when_start_precedes_window() {
        let stay = booking(1, day(2024, 6, 20), day(2024, 6, 30), &[101]);
        let window = date_window(day(2024, 6, 28), 23, 3, day(2024, 6, 28));

        assert_eq!(span_length(&stay, day(2024, 6, 20), &window), 0);
    }

    #[test]
    fn stay_entering_from_before_window_has_no_start_cell() {
        let snapshot = Snapshot::new(
            vec![booking(1, day(2024, 6, 20), day(2024, 6, 27), &[101])],
            vec![],
        );
        let window = date_window(day(2024, 6, 28), 23, 3, day(2024, 6, 28));
        let rooms = [room("101", RoomCategory::Single)];

        let grid = project(&rooms, &window, &snapshot, &RoomFilter::default());

        // 06-25 and 06-26 are visible continuation cells, 06-27 is free.
        assert_eq!(
            grid.cell("101", day(2024, 6, 25)),
            Some(&CellState::Occupied(StayKind::Booking))
        );
        assert_eq!(
            grid.cell("101", day(2024, 6, 26)),
            Some(&CellState::Occupied(StayKind::Booking))
        );
        assert_eq!(grid.cell("101", day(2024, 6, 27)), Some(&CellState::Empty));
        assert!(
            grid.rows[0]
                .cells
                .iter()
                .all(|cell| !matches!(cell, CellState::OccupiedStart { .. }))
        );
    }

    #[test]
    fn start_cells_never_follow_their_own_stay() {
        let snapshot = Snapshot::new(
            vec![
                booking(1, day(2024, 6, 10), day(2024, 6, 13), &[101]),
                booking(2, day(2024, 6, 13), day(2024, 6, 15), &[101]),
            ],
            vec![],
        );
        let window = date_window(day(2024, 6, 10), 23, 3, day(2024, 6, 10));
        let rooms = [room("101", RoomCategory::Single)];

        let grid = project(&rooms, &window, &snapshot, &RoomFilter::default());
        let row = &grid.rows[0];

        for (idx, cell) in row.cells.iter().enumerate() {
            let CellState::OccupiedStart { stay_id, .. } = cell else {
                continue;
            };
            if idx == 0 {
                continue;
            }
            match &row.cells[idx - 1] {
                CellState::OccupiedStart { stay_id: prev, .. } => {
                    assert_ne!(prev, stay_id)
                }
                CellState::Occupied(_) | CellState::Empty => {}
            }
        }
    }

    #[test]
    fn filterless_projection_equals_empty_filter() {
        let snapshot = Snapshot::new(
            vec![booking(5, day(2024, 1, 10), day(2024, 1, 13), &[101])],
            vec![],
        );
        let window = date_window(day(2024, 1, 10), 23, 3, day(2024, 1, 10));
        let rooms = [
            room("101", RoomCategory::Single),
            room("202", RoomCategory::Double),
        ];

        let explicit = RoomFilter::parse(&["category:all".to_string()]).expect("parse");
        let defaulted = project(&rooms, &window, &snapshot, &RoomFilter::default());
        let filtered = project(&rooms, &window, &snapshot, &explicit);

        assert_eq!(defaulted, filtered);
    }

    #[test]
    fn rows_group_by_category_then_number() {
        let snapshot = Snapshot::default();
        let window = date_window(day(2024, 1, 10), 5, 3, day(2024, 1, 10));
        let rooms = [
            room("701", RoomCategory::Family),
            room("102", RoomCategory::Double),
            room("510", RoomCategory::Single),
            room("101", RoomCategory::Single),
        ];

        let grid = project(&rooms, &window, &snapshot, &RoomFilter::default());
        let order: Vec<&str> = grid.rows.iter().map(|r| r.room.number.as_str()).collect();
        assert_eq!(order, ["101", "510", "102", "701"]);
    }

    #[test]
    fn end_to_end_room_101_scenario() {
        let snapshot = Snapshot::new(
            vec![booking(5, day(2024, 1, 10), day(2024, 1, 13), &[101])],
            vec![],
        );
        let window = date_window(day(2024, 1, 12), 23, 3, day(2024, 1, 12));
        let rooms = [room("101", RoomCategory::Single)];

        let grid = project(&rooms, &window, &snapshot, &RoomFilter::default());

        assert_eq!(grid.cell("101", day(2024, 1, 9)), Some(&CellState::Empty));
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
        assert_eq!(
            grid.cell("101", day(2024, 1, 12)),
            Some(&CellState::Occupied(StayKind::Booking))
        );
        assert_eq!(grid.cell("101", day(2024, 1, 13)), Some(&CellState::Empty));
    }
}
