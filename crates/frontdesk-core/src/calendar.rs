use chrono::{Datelike, Duration, NaiveDate};

/// One column of the grid. Derived from the window anchor, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_of_month: u32,
    pub is_today: bool,
}

impl CalendarDay {
    /// Canonical fixed-width `YYYY-MM-DD` key used for interval
    /// comparisons and cell lookups.
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Generates the ordered day window `[anchor - lead, anchor - lead + days - 1]`,
/// oldest first. `is_today` is computed per entry against `today` (the real
/// current date in the property timezone), not against the anchor, so a
/// navigated window flags at most one column.
pub fn date_window(
    anchor: NaiveDate,
    days: usize,
    lead: usize,
    today: NaiveDate,
) -> Vec<CalendarDay> {
    let start = anchor - Duration::days(lead as i64);

    (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            CalendarDay {
                date,
                day_name: date.format("%a").to_string(),
                day_of_month: date.day(),
                is_today: date == today,
            }
        })
        .collect()
}

/// Header label for the window anchor, e.g. `June 2024`.
pub fn month_label(anchor: NaiveDate) -> String {
    anchor.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{date_window, month_label};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn window_spans_lead_before_anchor_to_tail_after() {
        let anchor = day(2024, 3, 1);
        let window = date_window(anchor, 23, 3, anchor);

        assert_eq!(window.len(), 23);
        assert_eq!(window[0].date, day(2024, 2, 27));
        assert_eq!(window[22].date, day(2024, 3, 20));
    }

    #[test]
    fn dates_are_unique_and_strictly_increasing() {
        let window = date_window(day(2023, 12, 25), 23, 3, day(2023, 12, 25));

        for pair in window.windows(2) {
            assert!(pair[0].date < pair[1].date);
            assert!(pair[0].iso() < pair[1].iso());
        }
    }

    #[test]
    fn window_rolls_over_year_boundary() {
        let window = date_window(day(2023, 12, 30), 23, 3, day(2023, 12, 30));

        assert_eq!(window[0].date, day(2023, 12, 27));
        assert_eq!(window[22].date, day(2024, 1, 18));
    }

    #[test]
    fn leap_day_is_included_in_february_window() {
        let window = date_window(day(2024, 2, 27), 23, 3, day(2024, 2, 27));

        assert!(window.iter().any(|d| d.date == day(2024, 2, 29)));
        assert_eq!(window[22].date, day(2024, 3, 17));
    }

    #[test]
    fn exactly_one_today_iff_today_in_window() {
        let anchor = day(2024, 6, 10);
        let today = day(2024, 6, 12);

        let window = date_window(anchor, 23, 3, today);
        assert_eq!(window.iter().filter(|d| d.is_today).count(), 1);

        // Navigated far away: today falls outside, nothing is flagged.
        let navigated = date_window(day(2024, 9, 10), 23, 3, today);
        assert_eq!(navigated.iter().filter(|d| d.is_today).count(), 0);
    }

    #[test]
    fn month_label_formats_anchor() {
        assert_eq!(month_label(day(2024, 6, 3)), "June 2024");
    }
}
