use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Local, NaiveDateTime, NaiveTime, TimeZone,
    Weekday,
};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The machine's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// The weekly match slot: a weekday and a local kickoff time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSchedule {
    weekday: Weekday,
    kickoff: NaiveTime,
}

impl MatchSchedule {
    pub fn new(weekday: Weekday, kickoff: NaiveTime) -> Self {
        Self { weekday, kickoff }
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn kickoff(&self) -> NaiveTime {
        self.kickoff
    }

    pub fn is_match_day<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        now.weekday() == self.weekday
    }

    /// Next kickoff strictly after `now`, in `now`'s local wall time.
    ///
    /// On match day once kickoff has passed (or is exactly now) this rolls over
    /// to the following week.
    pub fn next_match_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> NaiveDateTime {
        let local = now.naive_local();
        let days_ahead = (self.weekday.num_days_from_sunday() + 7
            - local.weekday().num_days_from_sunday())
            % 7;
        let target = (local.date() + Days::new(u64::from(days_ahead))).and_time(self.kickoff);
        if target <= local {
            target + Duration::days(7)
        } else {
            target
        }
    }

    /// Always positive. Computed on local wall time, so a DST shift in between
    /// is off by the shift.
    pub fn time_until_next_match<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        self.next_match_after(now) - now.naive_local()
    }
}
