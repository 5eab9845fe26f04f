use chrono::NaiveDate;

use crate::store::schema::{ReviewStats, ReviewStatsData};

/// Rounded percentage of `correct` over `attempts`, 0 when nothing was attempted.
pub fn accuracy_percent(correct: u32, attempts: u32) -> u32 {
    if attempts == 0 {
        return 0;
    }
    ((correct as f64 / attempts as f64) * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Daily rollover for the "reviewed today" counter.
///
/// Returns the date to store and the count that is valid for `today`.
pub fn roll_over_day(stored: Option<NaiveDate>, today: NaiveDate, prior: u32) -> (NaiveDate, u32) {
    match stored {
        Some(date) if date == today => (today, prior),
        _ => (today, 0),
    }
}

impl ReviewStats {
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.total_correct, self.total_attempts)
    }
}

impl ReviewStatsData {
    /// Bring `today_reviewed` and the stored date up to `today`.
    /// Returns true if the counter was reset.
    pub fn refresh_day(&mut self, today: NaiveDate) -> bool {
        let (date, count) =
            roll_over_day(self.last_review_date, today, self.review_stats.today_reviewed);
        let changed = self.last_review_date != Some(date);
        if changed {
            log::info!(
                "review day rolled over to {date} (was {:?}, {} reviewed)",
                self.last_review_date,
                self.review_stats.today_reviewed
            );
        }
        self.last_review_date = Some(date);
        self.review_stats.today_reviewed = count;
        changed
    }

    /// Count one submitted review answer.
    pub fn record_answer(&mut self, correct: bool, newly_mastered: bool, today: NaiveDate) {
        self.refresh_day(today);

        let stats = &mut self.review_stats;
        stats.total_attempts += 1;
        stats.total_reviewed += 1;
        stats.today_reviewed += 1;
        if correct {
            stats.total_correct += 1;
        }
        if newly_mastered {
            stats.mastered_count += 1;
        }
    }
}
