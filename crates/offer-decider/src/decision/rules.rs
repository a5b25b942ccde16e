use super::clock::{ClockTime, MINUTES_PER_DAY};

pub(crate) const MINIMUM_DURATION_MINUTES: f64 = 1.0;

/// Normalizes a numeric input: negatives and non-finite values become zero.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Rounds half away from zero to whole cents. Overflowed figures saturate at `f64::MAX`.
pub(crate) fn round_cents(value: f64) -> f64 {
    let value = value.clamp(f64::MIN, f64::MAX);
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

pub(crate) struct OfferSpan {
    pub minutes: f64,
    pub crosses_midnight: bool,
}

impl OfferSpan {
    pub fn hours(&self) -> f64 {
        self.minutes / 60.0
    }
}

/// Time the offer consumes, from shift start to projected finish plus buffer.
pub(crate) fn offer_span(start: ClockTime, finish: ClockTime, buffer_minutes: f64) -> OfferSpan {
    let start = f64::from(start.minutes_since_midnight());
    let mut finish = f64::from(finish.minutes_since_midnight());

    let crosses_midnight = finish < start;
    if crosses_midnight {
        finish += f64::from(MINUTES_PER_DAY);
    }

    let minutes = (finish - start + buffer_minutes).max(MINIMUM_DURATION_MINUTES);
    OfferSpan {
        minutes,
        crosses_midnight,
    }
}

pub(crate) fn net_payout(payout: f64, miles: f64, cost_per_mile: f64) -> f64 {
    (payout - miles * cost_per_mile).max(0.0)
}

pub(crate) fn required_dollars(target_rate_per_hour: f64, hours: f64, earned_so_far: f64) -> f64 {
    (target_rate_per_hour * hours - earned_so_far).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(raw: &str) -> ClockTime {
        ClockTime::parse(raw).expect("valid clock time")
    }

    #[test]
    fn non_negative_zeroes_negative_and_non_finite() {
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(f64::INFINITY), 0.0);
        assert_eq!(non_negative(4.25), 4.25);
    }

    #[test]
    fn span_never_drops_below_one_minute() {
        let span = offer_span(clock("12:00"), clock("12:00"), 0.0);
        assert_eq!(span.minutes, 1.0);
        assert!(!span.crosses_midnight);
    }

    #[test]
    fn span_wraps_past_midnight() {
        let span = offer_span(clock("23:30"), clock("00:15"), 15.0);
        assert_eq!(span.minutes, 60.0);
        assert!(span.crosses_midnight);
        assert_eq!(span.hours(), 1.0);
    }

    #[test]
    fn rounds_half_up_to_cents() {
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(10.0 / 3.0), 3.33);
        assert_eq!(round_cents(0.125), 0.13);
    }

    #[test]
    fn rounding_keeps_huge_figures_finite() {
        assert_eq!(round_cents(1e307), 1e307);
        assert_eq!(round_cents(f64::INFINITY), f64::MAX);
        assert_eq!(round_cents(f64::MAX * 2.0), f64::MAX);
    }
}
