use crate::infra::{build_service, parse_clock};
use clap::Args;
use offer_decider::config::AppConfig;
use offer_decider::error::AppError;
use offer_decider::params::QueryOverrides;
use offer_decider::service::Evaluation;
use offer_decider::storage::ShiftSettings;

#[derive(Args, Debug, Default)]
pub(crate) struct OfferArgs {
    /// Offer link or query string (`?payout=..&finish=..`); flags below take precedence
    #[arg(long)]
    pub(crate) link: Option<String>,
    /// Gross payout of the offer in dollars
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) payout: Option<f64>,
    /// Projected finish time for the offer (HH:MM, 24-hour)
    #[arg(long, value_parser = parse_clock)]
    pub(crate) finish: Option<String>,
    /// Miles driven for the offer
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) miles: Option<f64>,
    /// Buffer minutes for parking and hand-off
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) buffer: Option<f64>,
    /// Override the stored target rate ($/hour) for this evaluation
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) target: Option<f64>,
    /// Override the stored shift start (HH:MM)
    #[arg(long, value_parser = parse_clock)]
    pub(crate) start: Option<String>,
    /// Override the stored earnings so far
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) earned: Option<f64>,
    /// Override the stored cost per mile
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) cpm: Option<f64>,
    /// Print the evaluation as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl OfferArgs {
    pub(crate) fn overrides(&self) -> Result<QueryOverrides, AppError> {
        let mut overrides = match self.link.as_deref() {
            Some(link) if link.contains("://") => QueryOverrides::from_url(link)?,
            Some(query) => QueryOverrides::from_query(query),
            None => QueryOverrides::default(),
        };

        overrides.payout = self.payout.or(overrides.payout);
        overrides.finish = self.finish.clone().or(overrides.finish);
        overrides.miles = self.miles.or(overrides.miles);
        overrides.cpm = self.cpm.or(overrides.cpm);
        overrides.target = self.target.or(overrides.target);
        overrides.start = self.start.clone().or(overrides.start);
        overrides.earned = self.earned.or(overrides.earned);
        overrides.buffer = self.buffer.or(overrides.buffer);

        Ok(overrides)
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct SettingsArgs {
    /// Target shift average in dollars per hour
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) target: Option<f64>,
    /// Shift start time (HH:MM, 24-hour)
    #[arg(long, value_parser = parse_clock)]
    pub(crate) start: Option<String>,
    /// Dollars earned so far this shift
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) earned: Option<f64>,
    /// Variable cost per mile in dollars
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) cpm: Option<f64>,
}

impl From<SettingsArgs> for ShiftSettings {
    fn from(args: SettingsArgs) -> Self {
        ShiftSettings {
            target_rate_per_hour: args.target,
            shift_start: args.start,
            earned_so_far: args.earned,
            cost_per_mile: args.cpm,
        }
    }
}

pub(crate) fn run_evaluate(config: &AppConfig, args: OfferArgs) -> Result<(), AppError> {
    let service = build_service(&config.storage);
    let evaluation = service.evaluate(&args.overrides()?)?;

    if args.json {
        print_json(&evaluation)?;
    } else {
        print!("{}", render_evaluation(&evaluation));
    }
    Ok(())
}

pub(crate) fn run_accept(config: &AppConfig, args: OfferArgs) -> Result<(), AppError> {
    let service = build_service(&config.storage);
    let accepted = service.accept_offer(&args.overrides()?)?;

    if args.json {
        print_json(&accepted)?;
    } else {
        print!("{}", render_evaluation(&accepted.evaluation));
        println!("Recorded. Earned so far this shift: ${:.2}", accepted.earned_so_far);
    }
    Ok(())
}

pub(crate) fn run_show_settings(config: &AppConfig) -> Result<(), AppError> {
    let service = build_service(&config.storage);
    let settings = service.settings();
    let defaults = service.defaults();

    println!("Shift settings ({})", config.storage.data_dir.display());
    println!(
        "- target rate: {}",
        describe_money(settings.target_rate_per_hour, defaults.target_rate_per_hour, "/h")
    );
    println!(
        "- shift start: {}",
        settings
            .shift_start
            .clone()
            .unwrap_or_else(|| format!("{} (default)", defaults.shift_start))
    );
    println!(
        "- earned so far: {}",
        describe_money(settings.earned_so_far, defaults.earned_so_far, "")
    );
    println!(
        "- cost per mile: {}",
        describe_money(settings.cost_per_mile, defaults.cost_per_mile, "/mi")
    );
    Ok(())
}

pub(crate) fn run_set_settings(config: &AppConfig, args: SettingsArgs) -> Result<(), AppError> {
    let service = build_service(&config.storage);
    let updated = service.update_settings(args.into());
    print_json(&updated)
}

pub(crate) fn run_reset_settings(config: &AppConfig) -> Result<(), AppError> {
    build_service(&config.storage).reset_settings();
    println!("Shift settings cleared.");
    Ok(())
}

fn describe_money(stored: Option<f64>, default: f64, unit: &str) -> String {
    match stored {
        Some(value) => format!("${value:.2}{unit}"),
        None => format!("${default:.2}{unit} (default)"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn render_evaluation(evaluation: &Evaluation) -> String {
    let Evaluation { inputs, decision } = evaluation;
    let mut out = String::new();

    out.push_str(&format!("Decision: {}\n", decision.verdict()));
    out.push_str(&format!(
        "- required >= ${:.2} | offered ${:.2} | net ${:.2}\n",
        decision.required_dollars, inputs.offer.payout, decision.net_payout
    ));
    out.push_str(&format!(
        "- projected average: ${:.2}/h gross | ${:.2}/h net over {} min\n",
        decision.projected_gross_per_hour,
        decision.projected_net_per_hour,
        decision.duration_minutes
    ));
    match decision.finish_timestamp {
        Some(finish) => out.push_str(&format!(
            "- finish: {} (after midnight)\n",
            finish.format("%a %Y-%m-%d %H:%M")
        )),
        None => out.push_str(&format!("- finish: {}\n", inputs.offer.projected_finish)),
    }
    out.push_str(&format!("- link: ?{}\n", inputs.share_query()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use offer_decider::service::DeciderService;
    use offer_decider::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn flags_take_precedence_over_link_parameters() {
        let args = OfferArgs {
            link: Some("https://decider.local/?payout=9&finish=13:00&miles=2".to_string()),
            payout: Some(14.0),
            ..OfferArgs::default()
        };

        let overrides = args.overrides().expect("overrides build");
        assert_eq!(overrides.payout, Some(14.0));
        assert_eq!(overrides.finish.as_deref(), Some("13:00"));
        assert_eq!(overrides.miles, Some(2.0));
    }

    #[test]
    fn bare_query_strings_are_accepted_as_links() {
        let args = OfferArgs {
            link: Some("?cpm=0.3&buffer=5".to_string()),
            ..OfferArgs::default()
        };

        let overrides = args.overrides().expect("overrides build");
        assert_eq!(overrides.cpm, Some(0.3));
        assert_eq!(overrides.buffer, Some(5.0));
    }

    #[test]
    fn broken_links_are_reported() {
        let args = OfferArgs {
            link: Some("https://exa mple.com/?payout=1".to_string()),
            ..OfferArgs::default()
        };
        assert!(matches!(args.overrides(), Err(AppError::InvalidLink(_))));
    }

    #[test]
    fn render_shows_verdict_and_next_day_finish() {
        let service =
            DeciderService::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        let overrides =
            QueryOverrides::from_query("target=10&start=23:30&payout=10&finish=00:15&buffer=15");
        let evaluation = service
            .evaluate_on(
                &overrides,
                NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
            )
            .expect("evaluates");

        let rendered = render_evaluation(&evaluation);
        assert!(rendered.starts_with("Decision: ACCEPT\n"));
        assert!(rendered.contains("required >= $10.00 | offered $10.00 | net $10.00"));
        assert!(rendered.contains("finish: Sat 2025-03-15 00:30 (after midnight)"));
    }
}
