use chrono::Local;

use libris_types::LoanDate;

/// Source of "today" for loan operations.
pub trait Clock: Send + Sync {
    fn today(&self) -> LoanDate;
}

/// The local calendar date of the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> LoanDate {
        LoanDate::from_naive(Local::now().date_naive())
    }
}

/// A clock pinned to one date. Used by tests and for back-dated entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(LoanDate);

impl FixedClock {
    pub fn new(today: LoanDate) -> Self {
        Self(today)
    }

    /// The same clock moved `days` forward.
    pub fn advanced(&self, days: u32) -> Option<Self> {
        self.0.checked_add_days(days).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> LoanDate {
        self.0
    }
}
