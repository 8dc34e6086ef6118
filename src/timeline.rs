//! Gantt-style layout of tracking-job history markers.
//!
//! Markers sit on a day-indexed pixel grid. Markers whose pixel ranges would
//! collide are stacked into lanes: processing markers in date order, each
//! one takes the lowest lane whose last marker ends strictly left of it.

use chrono::NaiveDate;
use serde::Serialize;

use crate::format::parse_date;
use crate::tracking::{HistoryItem, HistoryStatus, TrackingJob};

/// Pixel geometry of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    /// Width of one day column
    pub cell_width: i64,
    /// Width of a marker including its label
    pub marker_width: i64,
    pub lane_height: i64,
    /// Space above and below the lanes of a job row
    pub row_padding: i64,
}

impl Default for GridSettings {
    fn default() -> Self {
        GridSettings {
            cell_width: 40,
            marker_width: 120,
            lane_height: 28,
            row_padding: 12,
        }
    }
}

/// A history marker with its computed position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedMarker {
    pub id: String,
    pub title: String,
    pub status: HistoryStatus,
    pub date: NaiveDate,
    pub left: i64,
    /// `left + marker_width`
    pub right: i64,
    pub lane: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowLayout {
    pub markers: Vec<PlacedMarker>,
    pub lane_count: usize,
    pub height: i64,
}

/// Position one marker per dated event and pack them into lanes.
///
/// Events whose date cannot be parsed are skipped. Events with equal dates
/// keep their input order.
///
/// # Arguments
/// * `start` - Date of the chart's first column
/// * `events` - History items of one tracked job
/// * `grid` - Column and marker widths, lane and row heights
///
/// # Returns
/// * `RowLayout` - Markers with their pixel offsets and lanes, plus the row height
pub fn layout_row(start: NaiveDate, events: &[HistoryItem], grid: &GridSettings) -> RowLayout {
    let mut dated: Vec<(NaiveDate, &HistoryItem)> = events
        .iter()
        .filter_map(|event| parse_date(&event.date).map(|date| (date, event)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut lane_ends: Vec<i64> = Vec::new();
    let mut markers = Vec::with_capacity(dated.len());

    for (date, event) in dated {
        let left = (date - start).num_days() * grid.cell_width;
        let right = left + grid.marker_width;
        let lane = assign_lane(&mut lane_ends, left, right);
        markers.push(PlacedMarker {
            id: event.id.clone(),
            title: event.title.clone(),
            status: event.status,
            date,
            left,
            right,
            lane,
        });
    }

    let lane_count = lane_ends.len();
    RowLayout {
        markers,
        lane_count,
        height: row_height(lane_count, grid),
    }
}

/// First lane whose right edge is strictly left of `left`, or a new lane.
pub fn assign_lane(lane_ends: &mut Vec<i64>, left: i64, right: i64) -> usize {
    match lane_ends.iter().position(|&end| end < left) {
        Some(lane) => {
            lane_ends[lane] = right;
            lane
        }
        None => {
            lane_ends.push(right);
            lane_ends.len() - 1
        }
    }
}

pub fn row_height(lane_count: usize, grid: &GridSettings) -> i64 {
    2 * grid.row_padding + lane_count.max(1) as i64 * grid.lane_height
}

/// The date window covered by a set of jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ChartWindow {
    /// Earliest start/history date to latest target/history date. `None`
    /// when no job carries a usable date.
    pub fn for_jobs(jobs: &[TrackingJob]) -> Option<Self> {
        let mut start: Option<NaiveDate> = None;
        let mut end: Option<NaiveDate> = None;
        let mut extend = |date: NaiveDate| {
            start = Some(start.map_or(date, |s| s.min(date)));
            end = Some(end.map_or(date, |e| e.max(date)));
        };
        for job in jobs {
            for text in [&job.start_date, &job.target_date] {
                if let Some(date) = parse_date(text) {
                    extend(date);
                }
            }
            for item in &job.history {
                if let Some(date) = parse_date(&item.date) {
                    extend(date);
                }
            }
        }
        Some(ChartWindow {
            start: start?,
            end: end?,
        })
    }

    /// Number of day columns, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub job_id: String,
    pub client_name: String,
    pub service_name: String,
    #[serde(flatten)]
    pub layout: RowLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub grid: GridSettings,
    pub window: Option<ChartWindow>,
    /// Width of the whole grid; markers near the end may extend past it
    pub width: i64,
    pub rows: Vec<JobRow>,
}

/// Lay out every job on one shared grid.
pub fn chart(jobs: &[TrackingJob], grid: GridSettings) -> Chart {
    let Some(window) = ChartWindow::for_jobs(jobs) else {
        return Chart {
            grid,
            window: None,
            width: 0,
            rows: Vec::new(),
        };
    };

    let rows = jobs
        .iter()
        .map(|job| JobRow {
            job_id: job.id.clone(),
            client_name: job.client_name.clone(),
            service_name: job.service_name.clone(),
            layout: layout_row(window.start, &job.history, &grid),
        })
        .collect();

    Chart {
        grid,
        window: Some(window),
        width: window.days() * grid.cell_width,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, date: &str) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            date: date.to_string(),
            title: id.to_uppercase(),
            ..HistoryItem::default()
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn spaced_events_share_one_lane() {
        // 120px markers on a 40px grid need more than 3 days between them
        let events = vec![
            event("a", "2024-03-01"),
            event("b", "2024-03-05"),
            event("c", "2024-03-09"),
        ];
        let row = layout_row(start(), &events, &GridSettings::default());
        assert_eq!(row.lane_count, 1);
        assert!(row.markers.iter().all(|m| m.lane == 0));
        assert_eq!(row.markers[1].left, 160);
        assert_eq!(row.markers[1].right, 280);
        assert_eq!(row.height, 2 * 12 + 28);
    }

    #[test]
    fn touching_markers_stack() {
        // b starts exactly where a ends, so it cannot share the lane
        let events = vec![event("a", "2024-03-01"), event("b", "2024-03-04")];
        let row = layout_row(start(), &events, &GridSettings::default());
        assert_eq!(row.markers[0].right, row.markers[1].left);
        assert_eq!(row.markers[1].lane, 1);
        assert_eq!(row.lane_count, 2);
    }

    #[test]
    fn lowest_free_lane_is_reused() {
        let events = vec![
            event("c", "2024-03-05T10:00:00.000Z"),
            event("a", "2024-03-01T08:00:00.000Z"),
            event("b", "2024-03-02"),
        ];
        let row = layout_row(start(), &events, &GridSettings::default());
        let lanes: Vec<(&str, usize)> =
            row.markers.iter().map(|m| (m.id.as_str(), m.lane)).collect();
        assert_eq!(lanes, vec![("a", 0), ("b", 1), ("c", 0)]);
        assert_eq!(row.lane_count, 2);
    }

    #[test]
    fn empty_row_keeps_one_lane_height() {
        let row = layout_row(start(), &[event("x", "tidak ada")], &GridSettings::default());
        assert!(row.markers.is_empty());
        assert_eq!(row.lane_count, 0);
        assert_eq!(row.height, row_height(1, &GridSettings::default()));
    }

    #[test]
    fn window_spans_all_jobs() {
        let jobs = vec![
            TrackingJob {
                start_date: "2024-03-04".to_string(),
                target_date: "2024-03-20".to_string(),
                history: vec![event("a", "2024-03-02T01:00:00.000Z")],
                ..TrackingJob::default()
            },
            TrackingJob {
                start_date: "2024-03-10".to_string(),
                history: vec![event("b", "2024-03-25")],
                ..TrackingJob::default()
            },
        ];
        let window = ChartWindow::for_jobs(&jobs).unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
        assert_eq!(window.days(), 24);

        let chart = chart(&jobs, GridSettings::default());
        assert_eq!(chart.width, 24 * 40);
        assert_eq!(chart.rows[1].layout.markers[0].left, 23 * 40);
    }

    #[test]
    fn no_dates_no_window() {
        assert!(ChartWindow::for_jobs(&[TrackingJob::default()]).is_none());
        assert!(chart(&[], GridSettings::default()).rows.is_empty());
    }
}
