use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingResult<Self> {
        if end <= start {
            return Err(BookingError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Boundary-touching windows do not overlap.
    pub fn overlaps(&self, existing: &TimeWindow) -> bool {
        (existing.start <= self.start && existing.end > self.start)
            || (existing.start < self.end && existing.end >= self.end)
            || (existing.start >= self.start && existing.end <= self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Which free slots a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFilter {
    /// Slots starting strictly after "now".
    Upcoming,
    /// Slots starting on this UTC calendar date.
    On(NaiveDate),
    /// Slots starting on any UTC date in the inclusive range.
    Between(NaiveDate, NaiveDate),
}

impl SlotFilter {
    pub fn from_query(query: &TimeSlotQuery) -> BookingResult<Self> {
        match (query.date, query.start_date, query.end_date) {
            (Some(date), _, _) => Ok(SlotFilter::On(date)),
            (None, Some(from), Some(to)) if from > to => Err(BookingError::Validation(
                "start_date must not be after end_date".to_string(),
            )),
            (None, Some(from), Some(to)) => Ok(SlotFilter::Between(from, to)),
            _ => Ok(SlotFilter::Upcoming),
        }
    }

    pub fn matches(&self, start_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let day = start_time.date_naive();
        match *self {
            SlotFilter::Upcoming => start_time > now,
            SlotFilter::On(date) => day == date,
            SlotFilter::Between(from, to) => from <= day && day <= to,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSlotQuery {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimeSlotRequest {
    pub service_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindowRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateTimeSlotsRequest {
    pub service_id: Uuid,
    pub slots: Vec<TimeWindowRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotResponse {
    pub message: String,
    pub time_slot: TimeSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotsResponse {
    pub time_slots: Vec<TimeSlot>,
}
