//! Overdue fine rule.
//!
//! A loan may be kept for [`LOAN_PERIOD_DAYS`] whole calendar days. Each day
//! beyond that costs [`FINE_PER_DAY`] currency units. The fine is assessed
//! once, on the return date, and is never recomputed.

use serde::Serialize;

use libris_types::LoanDate;

/// Days a book may be kept without a fine.
pub const LOAN_PERIOD_DAYS: u32 = 14;

/// Currency units charged per day beyond the loan period.
pub const FINE_PER_DAY: u32 = 1;

/// The fine owed for a loan returned on a given date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FineAssessment {
    /// Whole days between issue and return (negative if returned "before" issue).
    pub loan_days: i64,
    /// Days beyond the loan period; zero when on time.
    pub late_days: u32,
    pub fine: u32,
}

impl FineAssessment {
    pub fn assess(issued: LoanDate, returned: LoanDate) -> Self {
        let loan_days = returned.days_since(&issued);
        let overdue = loan_days.saturating_sub(i64::from(LOAN_PERIOD_DAYS)).max(0);
        let late_days = u32::try_from(overdue).unwrap_or(u32::MAX);
        Self {
            loan_days,
            late_days,
            fine: late_days.saturating_mul(FINE_PER_DAY),
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.late_days > 0
    }
}

/// Last day a loan issued on `issued` can be returned without a fine.
pub fn due_date(issued: LoanDate) -> Option<LoanDate> {
    issued.checked_add_days(LOAN_PERIOD_DAYS)
}
