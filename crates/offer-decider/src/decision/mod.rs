//! Pure accept/reject engine for a single delivery offer.
//!
//! Given the driver's shift state and an offer, [`evaluate_offer`] works out how many dollars the
//! offer must net to keep the shift average at target over the time it consumes, and compares that
//! against the offer's payout after variable trip cost. Numeric inputs are clamped rather than
//! rejected; the only failure is a malformed `HH:MM` time.

mod clock;
mod inputs;
pub(crate) mod rules;

pub use clock::ClockTime;
pub use inputs::{OfferContext, ShiftContext, TripExtras};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rules::{net_payout, non_negative, offer_span, required_dollars, round_cents};

/// The engine's only rejectable input condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("invalid time '{0}': expected HH:MM in 24-hour format")]
    InvalidTimeFormat(String),
}

/// Verdict and projected figures for one offer. Dollar amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub net_payout: f64,
    pub required_dollars: f64,
    pub accept: bool,
    pub projected_gross_per_hour: f64,
    pub projected_net_per_hour: f64,
    /// Offer duration the rates were computed over, buffer included, never below one minute.
    pub duration_minutes: u32,
    pub crosses_midnight: bool,
    /// Finish instant with the local offset, only present when the offer runs past midnight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_timestamp: Option<DateTime<Local>>,
}

impl DecisionResult {
    pub fn verdict(&self) -> &'static str {
        if self.accept {
            "ACCEPT"
        } else {
            "REJECT"
        }
    }

    pub fn summary(&self) -> String {
        let comparison = if self.accept { ">=" } else { "<" };
        format!(
            "{}: nets ${:.2} {} ${:.2} required over {} min",
            self.verdict().to_ascii_lowercase(),
            self.net_payout,
            comparison,
            self.required_dollars,
            self.duration_minutes
        )
    }
}

/// Evaluates an offer, anchoring any midnight-crossing finish to today's local date.
pub fn evaluate_offer(
    shift: &ShiftContext,
    offer: &OfferContext,
) -> Result<DecisionResult, DecisionError> {
    evaluate_offer_on(shift, offer, Local::now().date_naive())
}

/// Evaluates an offer with an explicit calendar date for the shift start.
pub fn evaluate_offer_on(
    shift: &ShiftContext,
    offer: &OfferContext,
    anchor_date: NaiveDate,
) -> Result<DecisionResult, DecisionError> {
    let start = ClockTime::parse(&shift.shift_start)?;
    let finish = ClockTime::parse(&offer.projected_finish)?;

    let target = non_negative(shift.target_rate_per_hour);
    let earned = non_negative(shift.earned_so_far);
    let payout = non_negative(offer.payout);
    let miles = non_negative(offer.extras.miles);
    let cost_per_mile = non_negative(offer.extras.cost_per_mile);
    let buffer = non_negative(offer.extras.buffer_minutes).floor();

    let span = offer_span(start, finish, buffer);
    let hours = span.hours();

    let net = net_payout(payout, miles, cost_per_mile);
    let required = required_dollars(target, hours, earned);
    let accept = net >= required;

    let projected_gross_per_hour = (earned + payout) / hours;
    let projected_net_per_hour = (earned + net) / hours;

    let finish_timestamp = if span.crosses_midnight {
        Duration::try_minutes(span.minutes as i64)
            .and_then(|elapsed| {
                anchor_date
                    .and_time(start.to_naive_time())
                    .checked_add_signed(elapsed)
            })
            .and_then(local_instant)
    } else {
        None
    };

    debug!(
        %start,
        %finish,
        duration_minutes = span.minutes,
        net,
        required,
        accept,
        "offer evaluated"
    );

    Ok(DecisionResult {
        net_payout: round_cents(net),
        required_dollars: round_cents(required),
        accept,
        projected_gross_per_hour: round_cents(projected_gross_per_hour),
        projected_net_per_hour: round_cents(projected_net_per_hour),
        duration_minutes: span.minutes as u32,
        crosses_midnight: span.crosses_midnight,
        finish_timestamp,
    })
}

/// Resolves a wall-clock time to a local instant. Times skipped by a DST jump move forward an hour.
fn local_instant(wall_clock: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&wall_clock).earliest().or_else(|| {
        let shifted = wall_clock.checked_add_signed(Duration::try_hours(1)?)?;
        Local.from_local_datetime(&shifted).earliest()
    })
}
