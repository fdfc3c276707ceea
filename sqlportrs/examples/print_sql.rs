use std::env;

use sqlport::{
    timezone::TimeZoneContext, Dialect, MetricKind, ScopeFilter, StatisticBuilder,
    StatisticQuery, SqlportConfig,
};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql <dialect> <metric> [app_id] [timezone] [start] [end]");
    eprintln!(
        "Example: cargo run --example print_sql -- oracle daily-messages app-1 Asia/Shanghai \"2024-01-01 00:00\" \"2024-01-08 00:00\""
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let config = SqlportConfig::load_default();
    let dialect: Dialect = args[0].parse()?;
    let metric: MetricKind = args[1].parse()?;
    let app_id = args.get(2).map(String::as_str).unwrap_or("app-1");
    let timezone = args
        .get(3)
        .cloned()
        .unwrap_or_else(|| config.defaults.timezone.clone());

    let context = TimeZoneContext::new(&timezone)?;
    let range = context.range(
        args.get(4).map(String::as_str),
        args.get(5).map(String::as_str),
    )?;

    let query = StatisticQuery::new(metric, ScopeFilter::new("app_id", app_id))
        .with_timezone(timezone)
        .with_range(range);
    let built = StatisticBuilder::from_config(&config.statistics).build(&query, dialect)?;

    println!("{}", built.sql);
    println!("{}", serde_json::to_string_pretty(&built.params)?);
    Ok(())
}
