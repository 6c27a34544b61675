//! SM-2 spaced repetition scheduling
//!
//! Review intervals grow with consecutive correct answers and shrink the
//! ease factor on poor ones. Quality grades run 0..=5; a grade of 3 or
//! better counts as a correct recall.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// First interval after a correct answer (days)
pub const INITIAL_INTERVAL_DAYS: i64 = 1;
/// Second interval after two consecutive correct answers (days)
pub const SECOND_INTERVAL_DAYS: i64 = 6;
/// Starting ease factor for new items
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
/// Ease factor floor
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Items unpracticed for this many days count as low-frequency
pub const LOW_FREQUENCY_DAYS: i64 = 7;

/// Per-item spaced repetition state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrsRecord {
    pub ease_factor: f64,
    pub interval_days: i64,
    pub repetitions: i64,
    pub next_review: DateTime<Utc>,
    pub last_review: Option<DateTime<Utc>>,
}

impl Default for SrsRecord {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: INITIAL_INTERVAL_DAYS,
            repetitions: 0,
            next_review: Utc::now(),
            last_review: None,
        }
    }
}

/// Review urgency derived from how overdue an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewPriority {
    High,
    Normal,
    Low,
}

/// Apply one review outcome to an SRS record.
///
/// Quality is clamped to 0..=5. On a correct answer (quality >= 3) the
/// interval progresses 1 -> 6 -> round(interval * ease); the ease factor
/// moves by the SM-2 delta and never drops below [`MIN_EASE_FACTOR`].
/// On an incorrect answer repetitions reset and the item comes back
/// tomorrow with the ease factor untouched.
pub fn apply_review(record: &SrsRecord, quality: i32) -> SrsRecord {
    let quality = quality.clamp(0, 5);
    let now = Utc::now();

    let mut ease_factor = record.ease_factor;
    let mut interval_days = record.interval_days;
    let mut repetitions = record.repetitions;

    if quality >= 3 {
        interval_days = match repetitions {
            0 => INITIAL_INTERVAL_DAYS,
            1 => SECOND_INTERVAL_DAYS,
            _ => (interval_days as f64 * ease_factor).round() as i64,
        };
        repetitions += 1;

        let q = quality as f64;
        let adjusted = ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
        ease_factor = round2(adjusted).max(MIN_EASE_FACTOR);
    } else {
        repetitions = 0;
        interval_days = INITIAL_INTERVAL_DAYS;
    }

    SrsRecord {
        ease_factor,
        interval_days,
        repetitions,
        next_review: now + Duration::days(interval_days),
        last_review: Some(now),
    }
}

/// Map an accuracy percentage (0..=100) to an SM-2 quality grade
pub fn quality_from_accuracy(accuracy: f64) -> i32 {
    if accuracy >= 95.0 {
        5
    } else if accuracy >= 85.0 {
        4
    } else if accuracy >= 70.0 {
        3
    } else if accuracy >= 50.0 {
        2
    } else if accuracy >= 25.0 {
        1
    } else {
        0
    }
}

/// Map a response time to a quality grade.
///
/// Incorrect answers grade 1..=2 depending on speed (a fast wrong answer
/// still shows partial recall). Correct answers grade by the ratio of
/// response time to `expected_ms`.
pub fn quality_from_response_time(response_ms: u64, correct: bool, expected_ms: u64) -> i32 {
    if !correct {
        return if response_ms <= expected_ms { 2 } else { 1 };
    }
    let ratio = response_ms as f64 / expected_ms as f64;
    if ratio <= 0.5 {
        5
    } else if ratio <= 1.0 {
        4
    } else {
        3
    }
}

/// Review priority from the due date: more than a week overdue is high,
/// due today or earlier is normal, anything future is low.
pub fn review_priority(next_review: DateTime<Utc>, now: DateTime<Utc>) -> ReviewPriority {
    let days_until_due = (next_review - now).num_days();
    if days_until_due < -LOW_FREQUENCY_DAYS {
        ReviewPriority::High
    } else if days_until_due <= 0 {
        ReviewPriority::Normal
    } else {
        ReviewPriority::Low
    }
}

/// Whether an item qualifies for a low-frequency refresh: never practiced,
/// or untouched for at least [`LOW_FREQUENCY_DAYS`].
pub fn is_low_frequency(last_practiced: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_practiced {
        None => true,
        Some(last) => (now - last).num_days() >= LOW_FREQUENCY_DAYS,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ease: f64, interval: i64, reps: i64) -> SrsRecord {
        SrsRecord {
            ease_factor: ease,
            interval_days: interval,
            repetitions: reps,
            next_review: Utc::now(),
            last_review: None,
        }
    }

    #[test]
    fn first_correct_review_schedules_one_day() {
        let updated = apply_review(&SrsRecord::default(), 4);
        assert_eq!(updated.interval_days, 1);
        assert_eq!(updated.repetitions, 1);
        assert!(updated.last_review.is_some());
    }

    #[test]
    fn second_correct_review_schedules_six_days() {
        let updated = apply_review(&record(2.5, 1, 1), 4);
        assert_eq!(updated.interval_days, 6);
        assert_eq!(updated.repetitions, 2);
    }

    #[test]
    fn later_reviews_multiply_by_ease_factor() {
        let updated = apply_review(&record(2.5, 6, 2), 4);
        assert_eq!(updated.interval_days, 15); // round(6 * 2.5)
        assert_eq!(updated.repetitions, 3);
    }

    #[test]
    fn perfect_recall_raises_ease_factor() {
        let updated = apply_review(&record(2.5, 6, 2), 5);
        assert_eq!(updated.ease_factor, 2.6);
    }

    #[test]
    fn hesitant_recall_lowers_ease_factor() {
        let updated = apply_review(&record(2.5, 6, 2), 3);
        // 2.5 + (0.1 - 2 * (0.08 + 2 * 0.02)) = 2.36
        assert_eq!(updated.ease_factor, 2.36);
    }

    #[test]
    fn ease_factor_never_drops_below_floor() {
        let updated = apply_review(&record(1.3, 6, 2), 3);
        assert_eq!(updated.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn incorrect_answer_resets_repetitions_and_interval() {
        let updated = apply_review(&record(2.2, 30, 5), 1);
        assert_eq!(updated.repetitions, 0);
        assert_eq!(updated.interval_days, 1);
        assert_eq!(updated.ease_factor, 2.2); // unchanged on failure
    }

    #[test]
    fn quality_clamps_out_of_range_grades() {
        let updated = apply_review(&SrsRecord::default(), 9);
        assert_eq!(updated.repetitions, 1);
        let failed = apply_review(&record(2.5, 6, 2), -3);
        assert_eq!(failed.repetitions, 0);
    }

    #[test]
    fn accuracy_maps_to_quality_bands() {
        assert_eq!(quality_from_accuracy(97.0), 5);
        assert_eq!(quality_from_accuracy(85.0), 4);
        assert_eq!(quality_from_accuracy(72.5), 3);
        assert_eq!(quality_from_accuracy(50.0), 2);
        assert_eq!(quality_from_accuracy(30.0), 1);
        assert_eq!(quality_from_accuracy(10.0), 0);
    }

    #[test]
    fn response_time_maps_to_quality() {
        assert_eq!(quality_from_response_time(2000, true, 5000), 5);
        assert_eq!(quality_from_response_time(4000, true, 5000), 4);
        assert_eq!(quality_from_response_time(9000, true, 5000), 3);
        assert_eq!(quality_from_response_time(3000, false, 5000), 2);
        assert_eq!(quality_from_response_time(8000, false, 5000), 1);
    }

    #[test]
    fn priority_tracks_overdue_days() {
        let now = Utc::now();
        assert_eq!(
            review_priority(now - Duration::days(10), now),
            ReviewPriority::High
        );
        assert_eq!(
            review_priority(now - Duration::days(2), now),
            ReviewPriority::Normal
        );
        assert_eq!(
            review_priority(now + Duration::days(3), now),
            ReviewPriority::Low
        );
    }

    #[test]
    fn low_frequency_covers_unpracticed_items() {
        let now = Utc::now();
        assert!(is_low_frequency(None, now));
        assert!(is_low_frequency(Some(now - Duration::days(8)), now));
        assert!(!is_low_frequency(Some(now - Duration::days(2)), now));
    }
}
