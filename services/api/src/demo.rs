use crate::infra::{build_service, read_submission};
use clap::Args;
use intel_audit::config::AppConfig;
use intel_audit::error::AppError;
use intel_audit::telemetry;
use intel_audit::workflows::assessment::{
    AssessmentOutcome, AssessmentResponse, AssessmentSubmission, CategoryId,
};
use intel_audit::workflows::intelligence::report::group_thousands;
use intel_audit::workflows::intelligence::{
    import_from_path, InMemoryPatternStore, IntelligenceConfig, IntelligenceService,
    MarketReport, RetryPolicy,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding either a submission or a bare `{"q1": "...", ...}` answer map
    pub(crate) file: PathBuf,
    /// Print the outcome as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV export with company_name,industry,team_size,q1..q8 columns
    pub(crate) file: PathBuf,
    /// Print the market report once the import finishes
    #[arg(long)]
    pub(crate) report: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of sample audits to submit
    #[arg(long, default_value_t = 24)]
    pub(crate) assessments: usize,
    /// Override the trend analysis batch size
    #[arg(long)]
    pub(crate) batch_size: Option<u64>,
    /// Print the final report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let submission = read_submission(&args.file)?;
    let outcome = intel_audit::workflows::assessment::analyze(&submission.responses);
    let cost = outcome.estimated_monthly_cost(config.intelligence.hourly_cost_rate);

    if args.json {
        let payload = json!({
            "outcome": outcome,
            "urgency": outcome.urgency(),
            "estimated_monthly_cost": cost,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        render_outcome(&outcome, cost, &config.intelligence.currency);
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_service(&config)?;

    if config.storage.database_path.is_none() {
        println!("Note: APP_DATABASE_PATH is unset; imported history lasts only for this run");
    }

    let summary = import_from_path(&*service, &args.file)?;
    println!(
        "Imported {} of {} rows ({} without answers skipped, {} not recorded)",
        summary.imported, summary.rows, summary.skipped, summary.unrecorded
    );
    println!(
        "Trend analysis produced {} insight(s)",
        summary.insights_generated
    );

    if args.report {
        let report = service.generate_report()?;
        render_report(&report, &config.intelligence.currency);
    }
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_service(&config)?;
    let report = service.generate_report()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report, &config.intelligence.currency);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mut config = IntelligenceConfig::default();
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    let service = IntelligenceService::new(
        Arc::new(InMemoryPatternStore::new()),
        config,
        RetryPolicy::none(),
    );
    let currency = service.config().currency.clone();

    println!("Intelligence audit demo");
    for submission in sample_submissions(args.assessments) {
        let company = submission.company_name.clone().unwrap_or_default();
        let industry = submission.industry.clone().unwrap_or_default();
        let receipt = service.submit(submission);
        println!(
            "- #{:>3} {} ({}): score {} [{}], top zone {}",
            receipt.assessment_id.unwrap_or_default(),
            company,
            industry,
            receipt.outcome.waste_score,
            receipt.urgency.label(),
            receipt.outcome.top_zone.unwrap_or("none")
        );
        if receipt.insights_generated > 0 {
            println!(
                "    trend analysis produced {} insight(s)",
                receipt.insights_generated
            );
        }
    }

    let insights = service.store().insights();
    if insights.is_empty() {
        println!("\nInsight log: empty (no batch boundary reached)");
    } else {
        println!("\nInsight log");
        for insight in insights {
            println!("- [{:.2}] {}", insight.confidence, insight.text);
        }
    }

    let report = service.generate_report()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        render_report(&report, &currency);
    }
    Ok(())
}

pub(crate) fn render_outcome(outcome: &AssessmentOutcome, cost: u64, currency: &str) {
    println!(
        "Waste score: {}/100 ({})",
        outcome.waste_score,
        outcome.urgency().label()
    );
    println!("Hours wasted per month: {}", outcome.total_hours_wasted);
    println!("Estimated monthly cost: {} {}", currency, group_thousands(cost));

    if outcome.waste_zones.is_empty() {
        println!("\nWaste zones: none");
        return;
    }

    println!("\nWaste zones (highest ROI first)");
    for zone in &outcome.waste_zones {
        println!(
            "- {} [{}]: score {}, {} h/month, ROI {}%",
            zone.name,
            zone.complexity.label(),
            zone.score,
            zone.time_wasted,
            zone.roi
        );
        println!("    {}", zone.recommendation);
    }

    let quick_wins: Vec<&str> = outcome.quick_wins.iter().map(|zone| zone.name).collect();
    if !quick_wins.is_empty() {
        println!("Quick wins: {}", quick_wins.join(", "));
    }
}

pub(crate) fn render_report(report: &MarketReport, currency: &str) {
    println!("Market intelligence ({})", report.period);
    println!(
        "Audits analyzed: {} | average waste score {:.1}",
        report.total_audits, report.avg_waste_score
    );
    if report.is_empty() {
        println!("No audits recorded yet.");
        return;
    }

    println!("\nTop waste zones");
    for zone in &report.top_waste_zones {
        println!(
            "- {}: {} occurrences, avg score {:.1}",
            zone.zone, zone.frequency, zone.avg_score
        );
    }

    if report.market_opportunities.is_empty() {
        println!("\nMarket opportunities: none yet");
    } else {
        println!("\nMarket opportunities");
        for opportunity in &report.market_opportunities {
            println!(
                "- {}: {} companies, avg pain {:.1}, {} {} potential",
                opportunity.opportunity,
                opportunity.market_size,
                opportunity.avg_pain,
                currency,
                group_thousands(opportunity.potential_revenue)
            );
        }
    }

    if !report.insights.is_empty() {
        println!("\nRecent insights");
        for insight in &report.insights {
            println!("- [{:.0}%] {}", insight.confidence * 100.0, insight.text);
        }
    }

    for recommendation in &report.recommendations {
        println!("\n{}", recommendation);
    }
}

const SAMPLE_AUDITS: [(&str, &str, &[(CategoryId, &str)]); 6] = [
    (
        "Savanna Freight",
        "Logistics",
        &[
            (CategoryId::Q1, "We repeatedly answer the same questions every day"),
            (CategoryId::Q4, "Manual work to combine multiple sources"),
            (CategoryId::Q7, "Repetitive copy and paste of the same thing"),
        ],
    ),
    (
        "Mara Outfitters",
        "Retail",
        &[
            (CategoryId::Q2, "Same metrics and reports every week in a spreadsheet"),
            (CategoryId::Q3, "We search and look up stock for minutes"),
        ],
    ),
    (
        "Tana Clinics",
        "Healthcare",
        &[
            (
                CategoryId::Q5,
                "If the claim is complete then we check and verify before we approve",
            ),
            (CategoryId::Q8, "Only one person knows, it is all in her head"),
        ],
    ),
    (
        "Kilima Capital",
        "Finance",
        &[
            (CategoryId::Q2, "Dashboard and reports rebuilt by hand"),
            (CategoryId::Q4, "We compile figures from multiple sources"),
            (CategoryId::Q6, "Frustrated, there must be a better way"),
        ],
    ),
    (
        "Pwani Haulage",
        "Logistics",
        &[
            (CategoryId::Q7, "Copy paste with no thinking required"),
            (CategoryId::Q3, "Time lost trying to find documents"),
        ],
    ),
    (
        "Rift Grocers",
        "Retail",
        &[
            (CategoryId::Q1, "Constantly, daily"),
            (CategoryId::Q7, "Repetitive data entry"),
        ],
    ),
];

fn sample_submissions(count: usize) -> Vec<AssessmentSubmission> {
    SAMPLE_AUDITS
        .iter()
        .cycle()
        .take(count)
        .map(|(company, industry, answers)| {
            let responses = answers
                .iter()
                .fold(AssessmentResponse::new(), |responses, (category, text)| {
                    responses.with_answer(*category, *text)
                });
            AssessmentSubmission::new(responses)
                .with_company(*company)
                .with_industry(*industry)
        })
        .collect()
}
