//! Exchange calendar gate and commission model.

use crate::domain::Money;
use crate::params::{CommissionType, HostParams};
use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// Regular-trading-hours gate.
///
/// When `market_hours_only` is off the calendar admits every timestamp.
/// Otherwise a bar passes iff its timestamp falls on a weekday between 09:30
/// (inclusive) and 16:00 (exclusive) in the configured exchange timezone.
/// Exchange holidays are not modeled.
#[derive(Debug, Clone)]
pub struct ExchangeCalendar {
    enabled: bool,
    tz: Tz,
}

impl ExchangeCalendar {
    pub fn from_params(params: &HostParams) -> Self {
        Self {
            enabled: params.market_hours_only,
            tz: params.timezone(),
        }
    }

    pub fn is_within_market_hours(&self, timestamp_ns: i64) -> bool {
        if !self.enabled {
            return true;
        }

        let utc = DateTime::<Utc>::from_timestamp_nanos(timestamp_ns);
        let local = utc.with_timezone(&self.tz);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        let open = NaiveTime::from_hms_opt(9, 30, 0).expect("valid time");
        let close = NaiveTime::from_hms_opt(16, 0, 0).expect("valid time");
        let t = NaiveTime::from_hms_opt(local.hour(), local.minute(), local.second())
            .expect("valid time");
        t >= open && t < close
    }
}

/// Commission for filling `quantity` at `price`. Missing configuration means
/// zero commission.
pub fn commission_for(quantity: f64, price: Money, params: &HostParams) -> Money {
    let rate = params.commission.unwrap_or(0.0);
    let Some(commission_type) = params.commission_type else {
        return Money::ZERO;
    };
    if rate == 0.0 {
        return Money::ZERO;
    }

    match commission_type {
        CommissionType::PerShare => Money::from_f64(rate) * quantity,
        CommissionType::Percentage => price * quantity * rate,
        CommissionType::Flat => Money::from_f64(rate),
    }
}
