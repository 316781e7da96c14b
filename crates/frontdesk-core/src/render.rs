use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::grid::{CellState, Grid, RoomRow};
use crate::stay::{Room, RoomCategory, Snapshot, StayKind};

const ROOM_COL_WIDTH: usize = 10;
const CELL_WIDTH: usize = 4;

const BOOKING_COLOR: &str = "32";
const RESERVATION_COLOR: &str = "34";
const TODAY_COLOR: &str = "32";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, grid))]
    pub fn print_grid(&mut self, grid: &Grid, month_label: &str) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{month_label}")?;
        writeln!(out)?;

        // Two header lines: weekday names, then day-of-month numbers
        // with the real today highlighted.
        let mut names = format!("{:<width$}", "", width = ROOM_COL_WIDTH);
        let mut numbers = format!("{:<width$}", "Rooms", width = ROOM_COL_WIDTH);
        for day in &grid.window {
            names.push_str(&format!("{:<CELL_WIDTH$}", day.day_name));
            let number = format!("{:<CELL_WIDTH$}", day.day_of_month);
            if day.is_today {
                numbers.push_str(&self.paint(&number, TODAY_COLOR));
            } else {
                numbers.push_str(&number);
            }
        }
        writeln!(out, "{names}")?;
        writeln!(out, "{numbers}")?;

        let mut current_group: Option<RoomCategory> = None;
        for row in &grid.rows {
            if current_group != Some(row.room.category) {
                current_group = Some(row.room.category);
                writeln!(out, "── {}", row.room.category.title())?;
            }

            writeln!(out, "{}", self.render_row_line(row))?;
        }

        if grid.rows.is_empty() {
            writeln!(out, "(no rooms match the current filter)")?;
        }

        Ok(())
    }

    fn render_row_line(&self, row: &RoomRow) -> String {
        let mut line = format!("{:<width$}", row.room.number, width = ROOM_COL_WIDTH);

        let mut skip = 0usize;
        for cell in &row.cells {
            if skip > 0 {
                skip -= 1;
                continue;
            }

            match cell {
                CellState::Empty => {
                    line.push_str(&format!("{:<CELL_WIDTH$}", "·"));
                }
                CellState::Occupied(kind) => {
                    let fill = fill_char(*kind).to_string().repeat(CELL_WIDTH);
                    line.push_str(&self.paint(&fill, kind_color(*kind)));
                }
                CellState::OccupiedStart {
                    kind,
                    stay_id,
                    span,
                } => {
                    // A projected start cell always has span >= 1.
                    let columns = (*span).max(1);
                    let width = columns * CELL_WIDTH;
                    let label = format!("{}-{}", kind.label_prefix(), stay_id);
                    let bar = fit_to_width(&label, width);
                    line.push_str(&self.paint(&bar, kind_color(*kind)));
                    skip = columns - 1;
                }
            }
        }

        line
    }

    #[tracing::instrument(skip(self, rooms))]
    pub fn print_rooms(&mut self, rooms: &[Room]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Number".to_string(),
            "Type".to_string(),
            "Active".to_string(),
        ];

        let rows = rooms
            .iter()
            .map(|room| {
                vec![
                    room.number.clone(),
                    room.category.as_str().to_string(),
                    if room.active { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, snapshot))]
    pub fn print_stays(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "Label".to_string(),
            "Kind".to_string(),
            "Check-in".to_string(),
            "Check-out".to_string(),
            "Rooms".to_string(),
        ];

        let rows = snapshot
            .stays()
            .map(|stay| {
                let rooms = stay
                    .room_numbers
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");

                vec![
                    self.paint(&stay.label(), kind_color(stay.kind)),
                    stay.kind.as_str().to_string(),
                    stay.checkin_date.format("%Y-%m-%d").to_string(),
                    stay.checkout_date.format("%Y-%m-%d").to_string(),
                    rooms,
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_legend(&mut self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out)?;
        writeln!(
            out,
            "{} booking (B-id)   {} reservation (R-id)   · free   {}/{} run without visible start",
            self.paint("██", BOOKING_COLOR),
            self.paint("▒▒", RESERVATION_COLOR),
            fill_char(StayKind::Booking),
            fill_char(StayKind::Reservation),
        )?;

        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn kind_color(kind: StayKind) -> &'static str {
    match kind {
        StayKind::Booking => BOOKING_COLOR,
        StayKind::Reservation => RESERVATION_COLOR,
    }
}

/// Fill for occupied cells whose bar started before the visible window.
fn fill_char(kind: StayKind) -> char {
    match kind {
        StayKind::Booking => '█',
        StayKind::Reservation => '▒',
    }
}

/// Pads or truncates to an exact display width so spanned bars always
/// line up with their columns.
fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }

    out.push_str(&" ".repeat(width - used));
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::fit_to_width;

    #[test]
    fn bars_are_padded_or_truncated_to_column_width() {
        assert_eq!(fit_to_width("B-5", 8), "B-5     ");
        assert_eq!(fit_to_width("R-123456789", 4), "R-12");
        assert_eq!(fit_to_width("", 4), "    ");
    }
}
