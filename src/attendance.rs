//! Employee attendance and meal allowance per pay period.
//!
//! A pay period runs from the day after the previous month's payday up to
//! and including this month's payday. Weekdays count as present and
//! weekends as off unless an override says otherwise.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::store::{JsonStore, Record, now_iso, uuid_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Hadir,
    Sakit,
    Izin,
    Libur,
}

impl AttendanceStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Hadir" => Some(AttendanceStatus::Hadir),
            "Sakit" => Some(AttendanceStatus::Sakit),
            "Izin" => Some(AttendanceStatus::Izin),
            "Libur" => Some(AttendanceStatus::Libur),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// Day of the month salaries are paid
    pub payday_date: u32,
    /// Paid per day present
    pub meal_allowance: i64,
    pub created_at: String,
    /// `YYYY-MM-DD` → status, only for days differing from the default
    pub attendance_overrides: BTreeMap<String, AttendanceStatus>,
    /// `YYYY-MM-DD` → `HH:MM`
    pub entry_times: BTreeMap<String, String>,
}

impl Default for Employee {
    fn default() -> Self {
        Employee {
            id: String::new(),
            name: String::new(),
            payday_date: 25,
            meal_allowance: 0,
            created_at: String::new(),
            attendance_overrides: BTreeMap::new(),
            entry_times: BTreeMap::new(),
        }
    }
}

impl Record for Employee {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Employee {
    pub fn status_on(&self, date: NaiveDate) -> AttendanceStatus {
        if let Some(status) = self.attendance_overrides.get(&date_key(date)) {
            return *status;
        }
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => AttendanceStatus::Libur,
            _ => AttendanceStatus::Hadir,
        }
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Day `day` of `year`/`month`, rolling over into following months when
/// the month is shorter (day 31 of April is May 1st).
fn day_with_overflow(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first.checked_add_signed(Duration::days(i64::from(day) - 1))
}

/// First and last day of the pay period ending in `month` of `year`.
///
/// The period runs from the day after payday in the previous month up to
/// payday itself. Days past the end of a short month roll into the next.
///
/// # Arguments
/// * `year` - Year of the closing month
/// * `month` - Closing month, `1..=12`
/// * `payday` - Day of the month the period closes on
///
/// # Returns
/// * `Result<(NaiveDate, NaiveDate)>` - Inclusive start and end dates, or an
///   invalid-input error for a bad month
pub fn pay_period(year: i32, month: u32, payday: u32) -> Result<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(AppError::invalid(format!("invalid month {}", month)));
    }
    let (prev_year, prev_month) = if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    };
    let start = day_with_overflow(prev_year, prev_month, payday + 1);
    let end = day_with_overflow(year, month, payday);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::invalid(format!("no pay period for {}-{}", year, month))),
    }
}

/// Every date of the pay period, in order.
pub fn period_dates(year: i32, month: u32, payday: u32) -> Result<Vec<NaiveDate>> {
    let (start, end) = pay_period(year, month, payday)?;
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_days: usize,
    pub work_days: usize,
    pub total_allowance: i64,
}

/// Everything the monthly attendance sheet shows for one employee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub employee_id: String,
    pub employee_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayEntry>,
    pub summary: Summary,
    /// Mon–Fri rows; `None` marks weekdays outside the period
    pub weeks: Vec<[Option<NaiveDate>; 5]>,
    /// Days present per weekday column, Monday first
    pub column_totals: [usize; 5],
}

pub fn day_entries(employee: &Employee, dates: &[NaiveDate]) -> Vec<DayEntry> {
    dates
        .iter()
        .map(|&date| DayEntry {
            date,
            status: employee.status_on(date),
            entry_time: employee.entry_times.get(&date_key(date)).cloned(),
        })
        .collect()
}

pub fn summarize(employee: &Employee, days: &[DayEntry]) -> Summary {
    let work_days = days
        .iter()
        .filter(|d| d.status == AttendanceStatus::Hadir)
        .count();
    Summary {
        total_days: days.len(),
        work_days,
        total_allowance: employee.meal_allowance.saturating_mul(work_days as i64),
    }
}

/// Group the period into Monday–Friday rows for printing.
pub fn weekly_grid(dates: &[NaiveDate]) -> Vec<[Option<NaiveDate>; 5]> {
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return Vec::new();
    };
    let mut monday = first.week(Weekday::Mon).first_day();
    let mut weeks = Vec::new();
    while monday <= last {
        let mut row = [None; 5];
        for (offset, slot) in row.iter_mut().enumerate() {
            let day = monday + Duration::days(offset as i64);
            if day >= first && day <= last {
                *slot = Some(day);
            }
        }
        weeks.push(row);
        monday += Duration::days(7);
    }
    weeks
}

fn column_totals(days: &[DayEntry]) -> [usize; 5] {
    let mut totals = [0; 5];
    for day in days.iter().filter(|d| d.status == AttendanceStatus::Hadir) {
        let index = day.date.weekday().num_days_from_monday() as usize;
        if index < 5 {
            totals[index] += 1;
        }
    }
    totals
}

pub fn monthly_report(employee: &Employee, year: i32, month: u32) -> Result<MonthlyReport> {
    let (start, end) = pay_period(year, month, employee.payday_date)?;
    let dates = period_dates(year, month, employee.payday_date)?;
    let days = day_entries(employee, &dates);
    Ok(MonthlyReport {
        employee_id: employee.id.clone(),
        employee_name: employee.name.clone(),
        start,
        end,
        summary: summarize(employee, &days),
        weeks: weekly_grid(&dates),
        column_totals: column_totals(&days),
        days,
    })
}

pub fn save_employee(store: &JsonStore<Employee>, mut employee: Employee) -> Result<Employee> {
    if employee.name.trim().is_empty() {
        return Err(AppError::invalid("employee name is required"));
    }
    if !(1..=31).contains(&employee.payday_date) {
        return Err(AppError::invalid("payday must be between 1 and 31"));
    }
    if employee.meal_allowance < 0 {
        return Err(AppError::invalid("meal allowance cannot be negative"));
    }
    if employee.id.trim().is_empty() {
        employee.id = uuid_id();
    }
    if employee.created_at.is_empty() {
        employee.created_at = now_iso();
    }
    store.save(employee)
}

fn parse_key(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::invalid(format!("invalid date {:?}", date)))
}

/// Record a status for one day. `Hadir` clears the override so the file only
/// holds exceptions.
pub fn update_attendance(
    store: &JsonStore<Employee>,
    employee_id: &str,
    date: &str,
    status: AttendanceStatus,
) -> Result<Employee> {
    let key = date_key(parse_key(date)?);
    store.update(|employees| {
        let employee = employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| AppError::not_found("employee", employee_id))?;
        match status {
            AttendanceStatus::Hadir => {
                employee.attendance_overrides.remove(&key);
            }
            other => {
                employee.attendance_overrides.insert(key, other);
            }
        }
        Ok(employee.clone())
    })
}

/// Record the arrival time (`HH:MM`) for one day; an empty time clears it.
pub fn set_entry_time(
    store: &JsonStore<Employee>,
    employee_id: &str,
    date: &str,
    time: &str,
) -> Result<Employee> {
    let key = date_key(parse_key(date)?);
    let time = time.trim();
    if !time.is_empty() && chrono::NaiveTime::parse_from_str(time, "%H:%M").is_err() {
        return Err(AppError::invalid(format!("invalid time {:?}", time)));
    }
    store.update(|employees| {
        let employee = employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| AppError::not_found("employee", employee_id))?;
        if time.is_empty() {
            employee.entry_times.remove(&key);
        } else {
            employee.entry_times.insert(key, time.to_string());
        }
        Ok(employee.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn march_2024_period_crosses_leap_day() {
        let dates = period_dates(2024, 3, 18).unwrap();
        assert_eq!(dates.first(), Some(&ymd(2024, 2, 19)));
        assert_eq!(dates.last(), Some(&ymd(2024, 3, 18)));
        assert_eq!(dates.len(), 29);
        assert!(dates.contains(&ymd(2024, 2, 29)));
    }

    #[test]
    fn january_reaches_back_into_december() {
        let (start, end) = pay_period(2024, 1, 25).unwrap();
        assert_eq!(start, ymd(2023, 12, 26));
        assert_eq!(end, ymd(2024, 1, 25));
    }

    #[test]
    fn payday_overflows_short_months() {
        // payday 31: April has 30 days so the period ends on May 1st, and
        // starts on "March 32nd"
        let (start, end) = pay_period(2024, 4, 31).unwrap();
        assert_eq!(start, ymd(2024, 4, 1));
        assert_eq!(end, ymd(2024, 5, 1));
    }

    #[test]
    fn periods_have_no_duplicates_and_span_the_window() {
        for month in 1..=12 {
            for payday in 1..=31 {
                let (start, end) = pay_period(2023, month, payday).unwrap();
                let dates = period_dates(2023, month, payday).unwrap();
                let mut unique = dates.clone();
                unique.dedup();
                assert_eq!(unique.len(), dates.len());
                assert_eq!(dates.len() as i64, (end - start).num_days() + 1);
                assert!(dates.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
            }
        }
    }

    #[test]
    fn weekends_default_to_libur_and_overrides_win() {
        let mut employee = Employee {
            meal_allowance: 25_000,
            ..Employee::default()
        };
        // 2024-03-16 is a Saturday, 2024-03-18 a Monday
        assert_eq!(employee.status_on(ymd(2024, 3, 16)), AttendanceStatus::Libur);
        assert_eq!(employee.status_on(ymd(2024, 3, 18)), AttendanceStatus::Hadir);

        employee
            .attendance_overrides
            .insert("2024-03-18".to_string(), AttendanceStatus::Sakit);
        assert_eq!(employee.status_on(ymd(2024, 3, 18)), AttendanceStatus::Sakit);
    }

    #[test]
    fn summary_counts_weekdays_present() {
        let mut employee = Employee {
            payday_date: 18,
            meal_allowance: 25_000,
            ..Employee::default()
        };
        // Feb 19 – Mar 18 2024 has 21 weekdays
        let report = monthly_report(&employee, 2024, 3).unwrap();
        assert_eq!(report.summary.total_days, 29);
        assert_eq!(report.summary.work_days, 21);
        assert_eq!(report.summary.total_allowance, 525_000);

        employee
            .attendance_overrides
            .insert("2024-03-01".to_string(), AttendanceStatus::Izin);
        let report = monthly_report(&employee, 2024, 3).unwrap();
        assert_eq!(report.summary.work_days, 20);
        // March 1st 2024 is a Friday
        assert_eq!(report.column_totals, [5, 4, 4, 4, 3]);
    }

    #[test]
    fn weekly_grid_pads_outside_days() {
        // Wed 2024-02-21 .. Tue 2024-03-05
        let dates: Vec<NaiveDate> = ymd(2024, 2, 21)
            .iter_days()
            .take_while(|d| *d <= ymd(2024, 3, 5))
            .collect();
        let weeks = weekly_grid(&dates);
        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[0][0], None);
        assert_eq!(weeks[0][2], Some(ymd(2024, 2, 21)));
        assert_eq!(weeks[2][1], Some(ymd(2024, 3, 5)));
        assert_eq!(weeks[2][2], None);
    }

    #[test]
    fn hadir_clears_override() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "laporan-karyawan.json");
        let employee = save_employee(
            &store,
            Employee {
                name: "Dewi".to_string(),
                payday_date: 18,
                meal_allowance: 20_000,
                ..Employee::default()
            },
        )
        .unwrap();

        let e = update_attendance(&store, &employee.id, "2024-03-04", AttendanceStatus::Sakit).unwrap();
        assert_eq!(e.attendance_overrides.len(), 1);
        let e = update_attendance(&store, &employee.id, "2024-03-04", AttendanceStatus::Hadir).unwrap();
        assert!(e.attendance_overrides.is_empty());

        let e = set_entry_time(&store, &employee.id, "2024-03-04", "07:45").unwrap();
        assert_eq!(e.entry_times["2024-03-04"], "07:45");
        let e = set_entry_time(&store, &employee.id, "2024-03-04", "").unwrap();
        assert!(e.entry_times.is_empty());

        assert!(matches!(
            update_attendance(&store, "nobody", "2024-03-04", AttendanceStatus::Izin),
            Err(AppError::NotFound { .. })
        ));
        assert!(set_entry_time(&store, &employee.id, "2024-03-04", "7 pagi").is_err());
    }
}
