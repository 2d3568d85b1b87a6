//! # sqlshape CLI
//!
//! An interactive shell that fingerprints SELECT statements and shows the
//! plans the two-level cache serves for them.

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use tracing_subscriber::EnvFilter;

use sqlshape::{CacheMetrics, PlannerConfig, QueryPlan, QueryPlanner, Result};

const USAGE: &str = "usage: sqlshape [--config FILE] [--no-cache]";

struct Args {
    config: Option<String>,
    no_cache: bool,
}

fn parse_args() -> std::result::Result<Args, String> {
    let mut args = Args {
        config: None,
        no_cache: false,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => match iter.next() {
                Some(path) => args.config = Some(path),
                None => return Err("--config needs a file argument".to_string()),
            },
            "--no-cache" => args.no_cache = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => PlannerConfig::from_json_file(path)?,
        None => PlannerConfig::default(),
    };
    if args.no_cache {
        config.cache.enabled = false;
    }
    Ok(config)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };
    let planner = match load_config(&args) {
        Ok(config) => QueryPlanner::with_config(config),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    println!("sqlshape v{}", env!("CARGO_PKG_VERSION"));
    println!("Enter \".help\" for usage hints.");
    if !planner.config().cache.enabled {
        println!("Plan caching is disabled.");
    }
    if !planner.config().dedup_subqueries {
        println!("Repeated subqueries are looked up once per occurrence.");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut sql_buffer = String::new();

    loop {
        let prompt = if sql_buffer.is_empty() {
            "sqlshape> "
        } else {
            "    ...> "
        };
        print!("{prompt}");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(_) => break,
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if sql_buffer.is_empty() && trimmed.starts_with('.') {
            if !handle_dot_command(trimmed, &planner) {
                break;
            }
            continue;
        }

        sql_buffer.push_str(&line);
        if !sql_buffer.trim_end().ends_with(';') {
            continue;
        }

        let sql = std::mem::take(&mut sql_buffer);
        match planner.plan_script(&sql) {
            Ok(plans) => plans.iter().for_each(print_plan),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    println!();
}

fn print_plan(plan: &QueryPlan) {
    println!("Fingerprint: {}", plan.fingerprint);
    if !plan.literals.is_empty() {
        println!("Literals:    {}", plan.literals.join(", "));
    }
    for (i, sub) in plan.subqueries.iter().enumerate() {
        let source = if sub.cached { "cached" } else { "generated" };
        println!("Subquery {}:  {} ({source})", i + 1, sub.fingerprint);
    }
    match serde_json::to_string_pretty(plan.plan.as_ref()) {
        Ok(json) => println!("Plan:\n{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
    println!("Cache hits:  {}", plan.cache_hits);
}

fn print_metrics(name: &str, metrics: &CacheMetrics) {
    println!(
        "{name:<10} requests={} hits={} misses={} hit_ratio={:.2}%",
        metrics.requests,
        metrics.hits,
        metrics.misses,
        metrics.hit_ratio() * 100.0
    );
}

/// Returns false when the shell should exit.
fn handle_dot_command(cmd: &str, planner: &QueryPlanner) -> bool {
    let command = cmd
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match command.as_str() {
        ".help" => {
            println!(".help              Show this help");
            println!(".metrics           Show cache metrics and total complexity");
            println!(".quit              Exit this program");
            println!(".exit              Exit this program");
            println!("Statements end with ';'. Only SELECT is accepted.");
        }
        ".metrics" => {
            print_metrics("queries", &planner.query_metrics());
            print_metrics("subqueries", &planner.subquery_metrics());
            println!("complexity {}", planner.total_complexity());
        }
        ".quit" | ".exit" => return false,
        _ => {
            eprintln!("Error: unknown command: {command}");
            eprintln!("Use .help for a list of commands.");
        }
    }
    true
}
