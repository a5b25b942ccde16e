//! Accept/reject decisions for delivery offers against a target hourly rate.
//!
//! [`decision`] holds the pure engine. The remaining modules are the plumbing a driver-facing app
//! needs around it: stored settings and drafts, query-string overrides, an HTTP router, and the
//! configuration, logging and error types shared with the service binary.

pub mod config;
pub mod decision;
pub mod error;
pub mod params;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use decision::{
    evaluate_offer, evaluate_offer_on, DecisionError, DecisionResult, OfferContext, ShiftContext,
    TripExtras,
};
