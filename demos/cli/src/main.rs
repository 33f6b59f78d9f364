use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use booking_core::{
    build_dashboard, query_store, resolve_period, round_minor, service_breakdown,
    AnalyticsConfig, AppointmentFilters, Decimal, PageRequest, Period, PeriodKey, RecordStore,
    ReportingClock, SortOrder, StatusFilter,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "booking-cli",
    about = "Booking analytics over an export of appointment rows."
)]
struct Cli {
    /// Path to the JSON rows export.
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file with analytics settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reporting timezone, overrides the config file.
    #[arg(long, global = true)]
    timezone: Option<Tz>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KPIs, daily series, top services and upcoming agenda.
    Dashboard {
        #[command(flatten)]
        scope: Scope,
        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Per-service count and revenue over the period.
    Services {
        #[command(flatten)]
        scope: Scope,
    },
    /// Filtered, paginated appointment listing.
    List {
        #[arg(short, long)]
        business: String,
        /// `All` or one appointment status.
        #[arg(long, default_value = "All")]
        status: StatusFilter,
        #[arg(long)]
        search: Option<String>,
        /// First local day included (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last local day included (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        oldest_first: bool,
    },
}

#[derive(Args, Debug)]
struct Scope {
    #[arg(short, long)]
    business: Option<String>,
    /// Preset label such as "Last 7 days" or "this-month".
    #[arg(long, default_value = "Last 30 days", conflicts_with = "days")]
    period: PeriodKey,
    /// Trailing window of this many days instead of a preset.
    #[arg(long)]
    days: Option<u32>,
}

impl Scope {
    fn period(&self) -> Period {
        match self.days {
            Some(days) => Period::LastDays(days),
            None => self.period.into(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("booking=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let input = cli.input.as_path();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(timezone) = cli.timezone {
        config.timezone = timezone;
    }

    let data = std::fs::read_to_string(input)
        .with_context(|| format!("could not read rows file {input:?}"))?;
    let store = booking_rows::load_store_str(&data)
        .with_context(|| format!("could not decode rows from {input:?}"))?;
    tracing::info!(rows = store.len(), timezone = %config.timezone, "loaded appointment rows");

    let clock = ReportingClock::system(config.timezone);

    match cli.command {
        Command::Dashboard { scope, json } => {
            let dashboard = build_dashboard(
                &store,
                scope.business.as_deref(),
                scope.period(),
                &clock,
                &config,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
                return Ok(());
            }

            let kpis = &dashboard.kpis;
            let digits = config.currency_minor_digits;
            println!(
                "Period: {} ({} to {})\nActive: {} ({:+})\nBooked: {} ({:+})\nRescheduled: {} ({:+})\nRevenue: {} ({})",
                dashboard.period.label,
                dashboard.period.first_day,
                dashboard.period.last_day,
                kpis.current.active_count,
                kpis.delta.active_count,
                kpis.current.booked_count,
                kpis.delta.booked_count,
                kpis.current.rescheduled_count,
                kpis.delta.rescheduled_count,
                money(kpis.current.revenue_total, digits),
                signed_money(kpis.delta.revenue_total, digits),
            );
            for group in &dashboard.top_by_revenue {
                println!("  {:<24} {:>10}", group.key, money(group.value, digits));
            }
            println!("Upcoming appointments: {}", dashboard.upcoming.len());
        }
        Command::Services { scope } => {
            let digits = config.currency_minor_digits;
            let Some(business) = scope.business.as_deref() else {
                bail!("--business is required for the service breakdown");
            };
            let resolved = resolve_period(scope.period(), &clock)?;
            let records = store.fetch_window(business, &resolved.current)?;
            for summary in service_breakdown(&records, &resolved.current) {
                println!(
                    "{:<24} {:>6} {:>10}",
                    summary.service,
                    summary.count,
                    money(summary.revenue, digits)
                );
            }
        }
        Command::List {
            business,
            status,
            search,
            start,
            end,
            limit,
            offset,
            oldest_first,
        } => {
            let filters = AppointmentFilters {
                start: start.map(|day| clock.start_of_day(day)),
                end_exclusive: end
                    .and_then(|day| day.succ_opt())
                    .map(|day| clock.start_of_day(day)),
                status,
                search,
                order: if oldest_first {
                    SortOrder::OldestFirst
                } else {
                    SortOrder::NewestFirst
                },
            };
            let page = PageRequest {
                limit: limit.unwrap_or(config.page_limit),
                offset,
            };
            let result = query_store(&store, &business, &filters, page)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&booking_rows::page_to_value(&result))?
            );
        }
    }

    Ok(())
}

/// Amount rounded to `digits` places and printed with exactly that many.
fn money(amount: Decimal, digits: u32) -> String {
    format!("{:.*}", digits as usize, round_minor(amount, digits))
}

fn signed_money(amount: Decimal, digits: u32) -> String {
    format!("{:+.*}", digits as usize, round_minor(amount, digits))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalyticsConfig> {
    let Some(path) = path else {
        return Ok(AnalyticsConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config file {path:?}"))
}
