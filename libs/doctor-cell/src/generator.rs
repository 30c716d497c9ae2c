//! Expands a weekly template over a date range into bookable slots.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use thiserror::Error;

use shared_models::doctor::DoctorSlot;
use shared_models::error::AppError;

use crate::models::{DaySchedule, ScheduleRequest, TimeBlock, WeeklyTemplate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Please select start and end dates")]
    MissingDates,
    #[error("Start date must be before end date")]
    StartAfterEnd,
    #[error("Slot duration must be greater than zero")]
    ZeroDuration,
    #[error("Time blocks overlap on {day}. Please correct them.")]
    Overlap { day: String },
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

fn check_overlaps(day: &DaySchedule) -> Result<(), ScheduleError> {
    for (i, first) in day.blocks.iter().enumerate() {
        if day.blocks[i + 1..].iter().any(|second| first.overlaps(second)) {
            return Err(ScheduleError::Overlap { day: day.name.to_string() });
        }
    }
    Ok(())
}

/// Consecutive slots from the block start; a trailing partial slot is dropped.
fn block_slots(block: &TimeBlock, minutes: u32) -> Vec<(NaiveTime, NaiveTime)> {
    let step = Duration::minutes(i64::from(minutes));
    let mut slots = Vec::new();
    let mut current = block.start;

    while current < block.end {
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 || next > block.end {
            break;
        }
        slots.push((current, next));
        current = next;
    }
    slots
}

/// Every active day in the inclusive range is checked for overlapping
/// blocks before any of its slots count; one bad day fails the whole run.
/// An empty result is not an error.
pub fn generate_slots(
    template: &WeeklyTemplate,
    request: &ScheduleRequest,
    doctor_id: i64,
) -> Result<Vec<DoctorSlot>, ScheduleError> {
    let (Some(start), Some(end)) = (request.start_date, request.end_date) else {
        return Err(ScheduleError::MissingDates);
    };
    if start > end {
        return Err(ScheduleError::StartAfterEnd);
    }
    if request.duration == 0 {
        return Err(ScheduleError::ZeroDuration);
    }

    let mut slots = Vec::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        let Some(day) = template.day(date.weekday()).filter(|d| d.active) else {
            continue;
        };
        check_overlaps(day)?;

        for block in &day.blocks {
            slots.extend(
                block_slots(block, request.duration)
                    .into_iter()
                    .map(|(from, to)| slot(doctor_id, date, from, to)),
            );
        }
    }
    Ok(slots)
}

fn slot(doctor_id: i64, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> DoctorSlot {
    DoctorSlot {
        id: None,
        doctor_id,
        available_date: date,
        start_time: start.format("%H:%M").to_string(),
        end_time: end.format("%H:%M").to_string(),
        is_booked: false,
    }
}
