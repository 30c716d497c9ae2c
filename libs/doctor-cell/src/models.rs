use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use appointment_cell::{Appointment, AppointmentStatus};
use shared_models::error::AppError;

pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// `HH:MM` on the wire; seconds are accepted on input and dropped.
mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }
}

// ==============================================================================
// WEEKLY TEMPLATE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    #[serde(with = "hh_mm")]
    pub start: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end: NaiveTime,
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl TimeBlock {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn hours(start: u32, end: u32) -> Self {
        Self::new(at(start), at(end))
    }

    /// Half-open: blocks that only touch do not overlap.
    pub fn overlaps(&self, other: &TimeBlock) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl Default for TimeBlock {
    /// What "add block" inserts.
    fn default() -> Self {
        Self::hours(9, 13)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySchedule {
    /// 0 = Sunday.
    pub id: u32,
    pub name: &'static str,
    pub active: bool,
    pub blocks: Vec<TimeBlock>,
}

const DAY_NAMES: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTemplate {
    pub days: Vec<DaySchedule>,
}

impl Default for WeeklyTemplate {
    fn default() -> Self {
        let days = DAY_NAMES
            .iter()
            .enumerate()
            .map(|(id, name)| {
                let (active, block) = match id {
                    1..=4 => (true, TimeBlock::hours(9, 17)),
                    5 => (true, TimeBlock::hours(9, 12)),
                    _ => (false, TimeBlock::hours(9, 17)),
                };
                DaySchedule {
                    id: id as u32,
                    name,
                    active,
                    blocks: vec![block],
                }
            })
            .collect();
        Self { days }
    }
}

impl WeeklyTemplate {
    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        let id = weekday.num_days_from_sunday();
        self.days.iter().find(|d| d.id == id)
    }

    fn day_mut(&mut self, id: u32) -> Result<&mut DaySchedule, AppError> {
        self.days
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Unknown day {}", id)))
    }

    /// Returns the day's new active flag.
    pub fn toggle(&mut self, id: u32) -> Result<bool, AppError> {
        let day = self.day_mut(id)?;
        day.active = !day.active;
        Ok(day.active)
    }

    pub fn add_block(&mut self, id: u32) -> Result<(), AppError> {
        self.day_mut(id)?.blocks.push(TimeBlock::default());
        Ok(())
    }

    pub fn set_block(&mut self, id: u32, index: usize, block: TimeBlock) -> Result<(), AppError> {
        let day = self.day_mut(id)?;
        let slot = day
            .blocks
            .get_mut(index)
            .ok_or_else(|| AppError::NotFound(format!("{} has no block {}", day.name, index)))?;
        *slot = block;
        Ok(())
    }

    pub fn remove_block(&mut self, id: u32, index: usize) -> Result<TimeBlock, AppError> {
        let day = self.day_mut(id)?;
        if index >= day.blocks.len() {
            return Err(AppError::NotFound(format!("{} has no block {}", day.name, index)));
        }
        Ok(day.blocks.remove(index))
    }
}

// ==============================================================================
// GENERATION REQUEST
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_duration() -> u32 {
    DEFAULT_SLOT_MINUTES
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOutcome {
    pub created: usize,
}

// ==============================================================================
// CALENDAR
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    /// `YYYY-MM-DDTHH:MM:SS`
    pub start: String,
    pub class_name: AppointmentStatus,
    pub appointment: Appointment,
}

impl From<&Appointment> for CalendarEvent {
    fn from(apt: &Appointment) -> Self {
        Self {
            title: format!("{} ({})", apt.patient_name, apt.status),
            start: format!("{}T{}", apt.appointment_date, apt.appointment_time),
            class_name: apt.status,
            appointment: apt.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub events: Vec<CalendarEvent>,
    pub today: Vec<Appointment>,
    pub template: WeeklyTemplate,
}
