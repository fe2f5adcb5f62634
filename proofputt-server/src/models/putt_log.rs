//! Putt log processing for sessions the desktop tracker submits whole
//!
//! The tracker logs one entry per classified putt with the frame time in
//! seconds since the session began. Entries classified as anything other
//! than MAKE or MISS are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CategoryCounts, SessionCounts, SessionMetrics, ValidationError};

/// Largest putt log accepted in one submission
pub const MAX_PUTT_LOG_ENTRIES: usize = 50_000;

/// Makes counted by fastest-21
const FASTEST_RUN: usize = 21;

/// Window for most-makes, inclusive
const MAKES_WINDOW_SECS: f64 = 60.0;

/// Streak lengths tallied in `streaks_over`
const STREAK_THRESHOLDS: [u32; 7] = [3, 7, 10, 15, 21, 50, 100];

const MISS_CATEGORIES: [&str; 3] = ["CATCH", "TIMEOUT", "RETURN"];

/// One tracker log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuttLogEntry {
    pub classification: String,
    #[serde(default)]
    pub detailed_classification: String,
    /// Seconds since session start
    pub current_frame_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Make,
    Miss,
}

impl Classification {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            s if s.eq_ignore_ascii_case("MAKE") => Some(Self::Make),
            s if s.eq_ignore_ascii_case("MISS") => Some(Self::Miss),
            _ => None,
        }
    }
}

impl PuttLogEntry {
    pub fn classification(&self) -> Option<Classification> {
        Classification::parse(&self.classification)
    }
}

/// Keep only MAKE and MISS entries.
pub fn classified(entries: Vec<PuttLogEntry>) -> Vec<PuttLogEntry> {
    entries
        .into_iter()
        .filter(|e| e.classification().is_some())
        .collect()
}

/// Statistics computed from a putt log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub total_putts: u32,
    pub total_makes: u32,
    pub total_misses: u32,
    pub best_streak: u32,
    pub fastest_21_makes: Option<f64>,
    pub most_makes_in_60_seconds: u32,
    /// Seconds; the latest frame time in the log
    pub session_duration: f64,
    pub putts_per_minute: f64,
    pub makes_per_minute: f64,
    pub make_percentage: f64,
    pub makes_by_category: CategoryCounts,
    pub misses_by_category: CategoryCounts,
    /// Completed runs of makes at least as long as each threshold
    pub streaks_over: BTreeMap<u32, u32>,
}

impl SessionReport {
    /// Compute statistics over a log. Unclassified entries are skipped.
    pub fn from_entries(entries: &[PuttLogEntry]) -> Result<Self, ValidationError> {
        if entries.len() > MAX_PUTT_LOG_ENTRIES {
            return Err(ValidationError::OutOfRange {
                field: "putt_log_entries",
                reason: "has more entries than one session can hold",
            });
        }

        let mut makes = 0u32;
        let mut misses = 0u32;
        let mut streak = 0u32;
        let mut runs = Vec::new();
        let mut duration = 0.0f64;
        let mut make_times = Vec::new();
        let mut makes_by_category = CategoryCounts::new();
        let mut misses_by_category: CategoryCounts =
            MISS_CATEGORIES.iter().map(|c| (c.to_string(), 0)).collect();

        for entry in entries {
            let Some(kind) = entry.classification() else {
                continue;
            };
            let time = entry.current_frame_time;
            if !time.is_finite() || time < 0.0 {
                return Err(ValidationError::OutOfRange {
                    field: "current_frame_time",
                    reason: "must be a non-negative number of seconds",
                });
            }
            duration = duration.max(time);

            match kind {
                Classification::Make => {
                    makes += 1;
                    streak += 1;
                    make_times.push(time);
                    let category = make_category(&entry.detailed_classification);
                    if !category.is_empty() {
                        *makes_by_category.entry(category.to_owned()).or_insert(0) += 1;
                    }
                }
                Classification::Miss => {
                    misses += 1;
                    runs.push(streak);
                    streak = 0;
                    if let Some(category) = miss_category(&entry.detailed_classification) {
                        *misses_by_category.entry(category.to_owned()).or_insert(0) += 1;
                    }
                }
            }
        }
        runs.push(streak);

        make_times.sort_by(f64::total_cmp);
        let metrics = SessionMetrics::derive(makes, misses, duration);

        Ok(Self {
            total_putts: makes + misses,
            total_makes: makes,
            total_misses: misses,
            best_streak: runs.iter().copied().max().unwrap_or(0),
            fastest_21_makes: fastest_run(&make_times, FASTEST_RUN),
            most_makes_in_60_seconds: most_in_window(&make_times, MAKES_WINDOW_SECS),
            session_duration: metrics.session_duration,
            putts_per_minute: metrics.putts_per_minute,
            makes_per_minute: metrics.makes_per_minute,
            make_percentage: metrics.make_percentage,
            makes_by_category,
            misses_by_category,
            streaks_over: STREAK_THRESHOLDS
                .iter()
                .map(|&t| (t, runs.iter().filter(|&&r| r >= t).count() as u32))
                .collect(),
        })
    }

    pub fn counts(&self) -> SessionCounts {
        SessionCounts {
            makes: self.total_makes,
            misses: self.total_misses,
            best_streak: self.best_streak,
            fastest_21_makes: self.fastest_21_makes,
            most_makes_in_60_seconds: Some(self.most_makes_in_60_seconds),
        }
    }
}

/// "MAKE - TOP" -> "TOP"
fn make_category(detailed: &str) -> &str {
    let trimmed = detailed.trim();
    trimmed.strip_prefix("MAKE - ").unwrap_or(trimmed).trim()
}

fn miss_category(detailed: &str) -> Option<&'static str> {
    let upper = detailed.to_ascii_uppercase();
    MISS_CATEGORIES.into_iter().find(|c| upper.contains(c))
}

/// Shortest span covering `run` consecutive makes. Expects sorted times.
/// Spans of zero are ignored.
fn fastest_run(times: &[f64], run: usize) -> Option<f64> {
    if run == 0 || times.len() < run {
        return None;
    }
    times
        .windows(run)
        .map(|w| w[run - 1] - w[0])
        .filter(|span| *span > 0.0)
        .min_by(f64::total_cmp)
}

/// Most makes starting at any make and ending within `window` seconds of
/// it. Expects sorted times.
fn most_in_window(times: &[f64], window: f64) -> u32 {
    let mut best = 0;
    let mut end = 0;
    for (start, first) in times.iter().enumerate() {
        end = end.max(start);
        while end < times.len() && times[end] - first <= window {
            end += 1;
        }
        best = best.max(end - start);
    }
    best as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(at: f64) -> PuttLogEntry {
        PuttLogEntry {
            classification: "MAKE".into(),
            detailed_classification: "MAKE - TOP".into(),
            current_frame_time: at,
        }
    }

    fn miss(at: f64, detail: &str) -> PuttLogEntry {
        PuttLogEntry {
            classification: "MISS".into(),
            detailed_classification: detail.into(),
            current_frame_time: at,
        }
    }

    fn makes_every(secs: f64, n: usize) -> Vec<PuttLogEntry> {
        (1..=n).map(|i| make(i as f64 * secs)).collect()
    }

    #[test]
    fn counts_and_rates() {
        let log = vec![
            make(10.0),
            make(20.0),
            miss(30.0, "MISS - RETURN"),
            make(40.0),
            miss(60.0, "MISS - CATCH"),
        ];
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.total_putts, 5);
        assert_eq!(report.total_makes, 3);
        assert_eq!(report.total_misses, 2);
        assert_eq!(report.best_streak, 2);
        assert_eq!(report.session_duration, 60.0);
        assert_eq!(report.putts_per_minute, 5.0);
        assert_eq!(report.make_percentage, 60.0);
        assert_eq!(report.makes_by_category["TOP"], 3);
        assert_eq!(report.misses_by_category["RETURN"], 1);
        assert_eq!(report.misses_by_category["CATCH"], 1);
        assert_eq!(report.misses_by_category["TIMEOUT"], 0);
    }

    #[test]
    fn fewer_than_21_makes_has_no_fastest() {
        let report = SessionReport::from_entries(&makes_every(2.0, 20)).unwrap();
        assert_eq!(report.fastest_21_makes, None);
        assert!(report.counts().validate().is_ok());
    }

    #[test]
    fn fastest_21_takes_the_tightest_window() {
        let mut log = makes_every(5.0, 21);
        // A quicker burst of 21 later on.
        log.extend((0..21).map(|i| make(200.0 + i as f64)));
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.fastest_21_makes, Some(20.0));
        assert!(report.counts().validate().is_ok());
    }

    #[test]
    fn simultaneous_makes_do_not_count_as_zero_seconds() {
        let log: Vec<_> = (0..21).map(|_| make(7.0)).collect();
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.fastest_21_makes, None);
    }

    #[test]
    fn sixty_second_window_is_inclusive() {
        let log = vec![make(0.0), make(30.0), make(60.0), make(60.5)];
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.most_makes_in_60_seconds, 3);

        let log = vec![make(0.0), make(60.001)];
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.most_makes_in_60_seconds, 1);
    }

    #[test]
    fn out_of_order_log_is_sorted_for_windows() {
        let log = vec![make(100.0), make(10.0), make(130.0), make(150.0)];
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.most_makes_in_60_seconds, 3);
        assert_eq!(report.session_duration, 150.0);
    }

    #[test]
    fn streak_still_open_at_end_counts() {
        let mut log = vec![make(1.0), miss(2.0, "MISS - TIMEOUT")];
        log.extend(makes_every(3.0, 7));
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.best_streak, 7);
        assert_eq!(report.streaks_over[&3], 1);
        assert_eq!(report.streaks_over[&7], 1);
        assert_eq!(report.streaks_over[&10], 0);
    }

    #[test]
    fn unclassified_entries_are_skipped() {
        let log = vec![
            make(1.0),
            PuttLogEntry {
                classification: "BALL_IN_MOTION".into(),
                detailed_classification: String::new(),
                current_frame_time: 900.0,
            },
        ];
        let report = SessionReport::from_entries(&log).unwrap();
        assert_eq!(report.total_putts, 1);
        assert_eq!(report.session_duration, 1.0);
        assert_eq!(classified(log).len(), 1);
    }

    #[test]
    fn empty_log() {
        let report = SessionReport::from_entries(&[]).unwrap();
        assert_eq!(report.total_putts, 0);
        assert_eq!(report.best_streak, 0);
        assert_eq!(report.most_makes_in_60_seconds, 0);
        assert_eq!(report.putts_per_minute, 0.0);
    }

    #[test]
    fn negative_frame_time_is_rejected() {
        let err = SessionReport::from_entries(&[make(-1.0)]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { field: "current_frame_time", .. }
        ));
    }

    #[test]
    fn make_category_strips_prefix() {
        assert_eq!(make_category("MAKE - LEFT"), "LEFT");
        assert_eq!(make_category("  MAKE - RIGHT "), "RIGHT");
        assert_eq!(make_category("TOP"), "TOP");
        assert_eq!(miss_category("miss - ball caught"), None);
        assert_eq!(miss_category("MISS - CATCH"), Some("CATCH"));
    }
}
