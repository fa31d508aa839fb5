//! Care-phase clock.
//!
//! Maps a local wall-clock time to Morning/Day/Night and to the instants the
//! forecast window is truncated at. Night wraps past midnight and always
//! ends at the next Day start.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use common::config::PhaseSchedule;

use crate::types::{CarePhase, PhaseWindow};

#[derive(Debug, Clone, Copy)]
pub struct CarePhaseClock {
    schedule: PhaseSchedule,
}

impl CarePhaseClock {
    pub fn new(schedule: PhaseSchedule) -> Self {
        Self { schedule }
    }

    /// Phase containing a local time of day.
    pub fn phase_at(&self, time: NaiveTime) -> CarePhase {
        let s = &self.schedule;
        if time < s.morning_start || time >= s.night_start {
            CarePhase::Night
        } else if time < s.day_start {
            CarePhase::Morning
        } else {
            CarePhase::Day
        }
    }

    /// Locate `now` (in the stable's time zone) within the schedule.
    pub fn locate<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> PhaseWindow {
        let tz = now.timezone();
        let today = now.date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        let time = now.time();
        let s = &self.schedule;

        let phase = self.phase_at(time);
        let (normal_end, conservative_end) = match phase {
            CarePhase::Morning => (
                local_instant(&tz, today, s.day_start),
                local_instant(&tz, tomorrow, s.day_start),
            ),
            CarePhase::Day => {
                let end = local_instant(&tz, today, s.night_start);
                (end, end)
            }
            CarePhase::Night => {
                let end = if time >= s.night_start {
                    local_instant(&tz, tomorrow, s.day_start)
                } else {
                    local_instant(&tz, today, s.day_start)
                };
                (end, end)
            }
        };

        PhaseWindow {
            phase,
            now: now.with_timezone(&Utc),
            normal_end,
            conservative_end,
        }
    }
}

/// Resolve a local date/time to an instant. Ambiguous times (DST fall-back)
/// take the earlier instant; nonexistent ones (spring-forward) move an hour
/// later.
fn local_instant<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(naive + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
