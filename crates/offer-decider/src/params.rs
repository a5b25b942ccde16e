//! Query-string input channel (`?payout=12&finish=13:00&cpm=0.5`).
//!
//! Recognised parameters: `payout`, `finish`, `miles`, `cpm`, `target`, `start`, `earned`,
//! `buffer`. Present values override stored and default inputs. Numbers that fail to parse count
//! as zero; empty values are ignored.

use serde::Serialize;
use url::form_urlencoded;
use url::Url;

use crate::storage::{OfferDraft, ShiftSettings};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<f64>,
}

fn lenient_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

impl QueryOverrides {
    /// Parses a raw query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    /// Parses the query portion of a full link.
    pub fn from_url(link: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(link)?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    {
        let mut overrides = Self::default();
        for (name, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.as_ref() {
                "payout" => overrides.payout = Some(lenient_number(value)),
                "finish" => overrides.finish = Some(value.to_string()),
                "miles" => overrides.miles = Some(lenient_number(value)),
                "cpm" => overrides.cpm = Some(lenient_number(value)),
                "target" => overrides.target = Some(lenient_number(value)),
                "start" => overrides.start = Some(value.to_string()),
                "earned" => overrides.earned = Some(lenient_number(value)),
                "buffer" => overrides.buffer = Some(lenient_number(value)),
                _ => {}
            }
        }
        overrides
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays the present parameters onto loaded settings and draft.
    pub fn apply(&self, settings: &mut ShiftSettings, draft: &mut OfferDraft) {
        settings.merge(ShiftSettings {
            target_rate_per_hour: self.target,
            shift_start: self.start.clone(),
            earned_so_far: self.earned,
            cost_per_mile: self.cpm,
        });
        draft.merge(OfferDraft {
            payout: self.payout,
            projected_finish: self.finish.clone(),
            miles: self.miles,
            buffer_minutes: self.buffer,
        });
    }

    /// Renders the present parameters back into a query string, in a stable order.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let numbers = [
            ("payout", self.payout),
            ("miles", self.miles),
            ("cpm", self.cpm),
            ("target", self.target),
            ("earned", self.earned),
            ("buffer", self.buffer),
        ];
        if let Some(finish) = &self.finish {
            serializer.append_pair("finish", finish);
        }
        if let Some(start) = &self.start {
            serializer.append_pair("start", start);
        }
        for (name, value) in numbers {
            if let Some(value) = value {
                serializer.append_pair(name, &value.to_string());
            }
        }
        serializer.finish()
    }
}
