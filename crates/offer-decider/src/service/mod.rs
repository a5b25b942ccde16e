//! Input assembly and actions around the decision engine.
//!
//! The service merges built-in defaults, stored shift settings, the session draft and any query
//! overrides into engine inputs, then runs [`evaluate_offer`]. It also owns the two user actions
//! of the calculator: recording an accepted offer and resetting the draft.

pub mod router;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decision::rules::{non_negative, round_cents};
use crate::decision::{
    evaluate_offer, evaluate_offer_on, DecisionError, DecisionResult, OfferContext, ShiftContext,
    TripExtras,
};
use crate::params::QueryOverrides;
use crate::storage::{DraftStore, KeyValueStore, OfferDraft, SettingsStore, ShiftSettings};

/// Fallbacks for shift values the driver has not stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftDefaults {
    pub target_rate_per_hour: f64,
    pub shift_start: String,
    pub earned_so_far: f64,
    pub cost_per_mile: f64,
}

impl ShiftDefaults {
    pub const TARGET_RATE_PER_HOUR: f64 = 25.0;
    pub const SHIFT_START: &'static str = "09:00";
    pub const EARNED_SO_FAR: f64 = 0.0;
    pub const COST_PER_MILE: f64 = TripExtras::DEFAULT_COST_PER_MILE;
}

impl Default for ShiftDefaults {
    fn default() -> Self {
        Self {
            target_rate_per_hour: Self::TARGET_RATE_PER_HOUR,
            shift_start: Self::SHIFT_START.to_string(),
            earned_so_far: Self::EARNED_SO_FAR,
            cost_per_mile: Self::COST_PER_MILE,
        }
    }
}

/// Engine inputs after defaults, stored values and overrides have been layered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedInputs {
    pub shift: ShiftContext,
    pub offer: OfferContext,
}

impl ResolvedInputs {
    pub fn resolve(defaults: &ShiftDefaults, settings: &ShiftSettings, draft: &OfferDraft) -> Self {
        let shift = ShiftContext {
            target_rate_per_hour: settings
                .target_rate_per_hour
                .unwrap_or(defaults.target_rate_per_hour),
            shift_start: settings
                .shift_start
                .clone()
                .unwrap_or_else(|| defaults.shift_start.clone()),
            earned_so_far: settings.earned_so_far.unwrap_or(defaults.earned_so_far),
        };

        // An unset finish stays empty so the engine reports it as an invalid time.
        let offer = OfferContext {
            payout: draft.payout.unwrap_or(0.0),
            projected_finish: draft.projected_finish.clone().unwrap_or_default(),
            extras: TripExtras {
                miles: draft.miles.unwrap_or(TripExtras::DEFAULT_MILES),
                cost_per_mile: settings.cost_per_mile.unwrap_or(defaults.cost_per_mile),
                buffer_minutes: draft
                    .buffer_minutes
                    .unwrap_or(TripExtras::DEFAULT_BUFFER_MINUTES),
            },
        };

        Self { shift, offer }
    }

    /// Query string reproducing these inputs, for sharing or reloading the same offer.
    pub fn share_query(&self) -> String {
        QueryOverrides {
            payout: Some(self.offer.payout),
            finish: Some(self.offer.projected_finish.clone()),
            miles: Some(self.offer.extras.miles),
            cpm: Some(self.offer.extras.cost_per_mile),
            target: Some(self.shift.target_rate_per_hour),
            start: Some(self.shift.shift_start.clone()),
            earned: Some(self.shift.earned_so_far),
            buffer: Some(self.offer.extras.buffer_minutes),
        }
        .to_query_string()
    }
}

/// Evaluation response pairing the inputs used with the engine's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub inputs: ResolvedInputs,
    pub decision: DecisionResult,
}

/// Outcome of the "I accepted" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedOffer {
    pub evaluation: Evaluation,
    pub earned_so_far: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Decision(#[from] DecisionError),
}

/// Calculator service over a persistent settings backend `P` and a session backend `S`.
pub struct DeciderService<P, S> {
    settings: SettingsStore<P>,
    drafts: DraftStore<S>,
    defaults: ShiftDefaults,
}

impl<P, S> DeciderService<P, S>
where
    P: KeyValueStore + 'static,
    S: KeyValueStore + 'static,
{
    pub fn new(persistent: Arc<P>, session: Arc<S>) -> Self {
        Self::with_defaults(persistent, session, ShiftDefaults::default())
    }

    pub fn with_defaults(persistent: Arc<P>, session: Arc<S>, defaults: ShiftDefaults) -> Self {
        Self {
            settings: SettingsStore::new(persistent),
            drafts: DraftStore::new(session),
            defaults,
        }
    }

    pub fn defaults(&self) -> &ShiftDefaults {
        &self.defaults
    }

    pub fn settings(&self) -> ShiftSettings {
        self.settings.load()
    }

    pub fn update_settings(&self, changes: ShiftSettings) -> ShiftSettings {
        self.settings.update(changes)
    }

    pub fn reset_settings(&self) {
        self.settings.clear();
    }

    pub fn draft(&self) -> OfferDraft {
        self.drafts.load()
    }

    pub fn update_draft(&self, changes: OfferDraft) -> OfferDraft {
        self.drafts.update(changes)
    }

    /// Clears the in-progress offer.
    pub fn reset_offer(&self) {
        self.drafts.clear();
    }

    pub fn current_inputs(&self, overrides: &QueryOverrides) -> ResolvedInputs {
        self.inputs_over(self.settings.load(), overrides)
    }

    fn inputs_over(
        &self,
        mut settings: ShiftSettings,
        overrides: &QueryOverrides,
    ) -> ResolvedInputs {
        let mut draft = self.drafts.load();
        overrides.apply(&mut settings, &mut draft);
        ResolvedInputs::resolve(&self.defaults, &settings, &draft)
    }

    pub fn evaluate(&self, overrides: &QueryOverrides) -> Result<Evaluation, ServiceError> {
        let inputs = self.current_inputs(overrides);
        let decision = evaluate_offer(&inputs.shift, &inputs.offer)?;
        Ok(Evaluation { inputs, decision })
    }

    pub fn evaluate_on(
        &self,
        overrides: &QueryOverrides,
        anchor_date: NaiveDate,
    ) -> Result<Evaluation, ServiceError> {
        let inputs = self.current_inputs(overrides);
        let decision = evaluate_offer_on(&inputs.shift, &inputs.offer, anchor_date)?;
        Ok(Evaluation { inputs, decision })
    }

    /// Records the current offer as taken: its net payout is credited to the shift's earnings and
    /// the draft is cleared. Accepting is allowed regardless of the verdict.
    ///
    /// The evaluation and the credit run under the settings write lock, so concurrent accepts each
    /// add their payout.
    pub fn accept_offer(&self, overrides: &QueryOverrides) -> Result<AcceptedOffer, ServiceError> {
        let (evaluation, earned_so_far) = self.settings.modify(|settings| {
            let inputs = self.inputs_over(settings.clone(), overrides);
            let decision = evaluate_offer(&inputs.shift, &inputs.offer)?;
            let earned_so_far =
                round_cents(non_negative(inputs.shift.earned_so_far) + decision.net_payout);
            settings.earned_so_far = Some(earned_so_far);
            Ok::<_, ServiceError>((Evaluation { inputs, decision }, earned_so_far))
        })?;
        self.drafts.clear();

        info!(
            net_payout = evaluation.decision.net_payout,
            earned_so_far,
            verdict = evaluation.decision.verdict(),
            "offer recorded as accepted"
        );

        Ok(AcceptedOffer {
            evaluation,
            earned_so_far,
        })
    }
}
