//! Business rating aggregate.
//!
//! The aggregate is always recomputed from the full review set of a
//! business; there is no running average to drift out of sync.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{BookingError, BookingResult};

/// Matches the `NUMERIC(3,2)` column the rating is stored in.
pub const RATING_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub rating: Decimal,
    pub total_reviews: i32,
}

impl RatingSummary {
    /// Fails only when the review count does not fit the `INTEGER` column.
    pub fn from_ratings(ratings: &[i32]) -> BookingResult<Self> {
        let total_reviews =
            i32::try_from(ratings.len()).map_err(|err| BookingError::Internal(Box::new(err)))?;
        if total_reviews == 0 {
            return Ok(Self {
                rating: Decimal::ZERO,
                total_reviews,
            });
        }

        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let rating = (Decimal::from(sum) / Decimal::from(total_reviews)).round_dp(RATING_SCALE);

        Ok(Self {
            rating,
            total_reviews,
        })
    }
}
