use serde::{Deserialize, Serialize};

/// The driver's running shift state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftContext {
    /// Desired shift average in dollars per hour.
    pub target_rate_per_hour: f64,
    /// Time of day the shift began, `HH:MM`.
    pub shift_start: String,
    #[serde(default)]
    pub earned_so_far: f64,
}

/// The offer under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferContext {
    /// Gross dollars offered.
    pub payout: f64,
    /// Time of day the driver expects to be done with this offer, `HH:MM`.
    pub projected_finish: String,
    #[serde(flatten)]
    pub extras: TripExtras,
}

/// Optional trip costs and padding applied to an offer.
///
/// Every field falls back to the matching `DEFAULT_*` constant when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripExtras {
    #[serde(default = "TripExtras::default_miles")]
    pub miles: f64,
    #[serde(default = "TripExtras::default_cost_per_mile")]
    pub cost_per_mile: f64,
    /// Parking and hand-off time added to the offer's duration. Fractions are floored.
    #[serde(default = "TripExtras::default_buffer_minutes")]
    pub buffer_minutes: f64,
}

impl TripExtras {
    pub const DEFAULT_MILES: f64 = 0.0;
    pub const DEFAULT_COST_PER_MILE: f64 = 0.0;
    pub const DEFAULT_BUFFER_MINUTES: f64 = 0.0;

    fn default_miles() -> f64 {
        Self::DEFAULT_MILES
    }

    fn default_cost_per_mile() -> f64 {
        Self::DEFAULT_COST_PER_MILE
    }

    fn default_buffer_minutes() -> f64 {
        Self::DEFAULT_BUFFER_MINUTES
    }
}

impl Default for TripExtras {
    fn default() -> Self {
        Self {
            miles: Self::DEFAULT_MILES,
            cost_per_mile: Self::DEFAULT_COST_PER_MILE,
            buffer_minutes: Self::DEFAULT_BUFFER_MINUTES,
        }
    }
}
