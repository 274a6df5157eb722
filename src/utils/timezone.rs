use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Current time in the given business timezone
pub fn business_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// The business-local calendar date, used for expiry/MFG date checks
pub fn business_today(tz: Tz) -> NaiveDate {
    business_now(tz).date_naive()
}
