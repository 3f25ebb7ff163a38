use chrono::Utc;
use clap::{Parser, Subcommand};
use horizon::query::{AggregationEngine, AggregationRequest, QueryWindow};
use horizon::range::{
    compute_range_from_custom, compute_range_from_preset, lookup, preset_window, registry,
};
use horizon::time::{format_for_display, format_iso, parse_timezone, Resolution};

#[derive(Parser)]
#[command(name = "horizon-cli")]
#[command(version, about = "Resolve time windows and aggregate the synthetic series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// IANA timezone used to read offset-less dates and to snap windows
    #[arg(long, short = 't', global = true, env = "HORIZON_TIMEZONE", default_value = "UTC")]
    timezone: String,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the preset registry
    Presets,
    /// Resolve a preset window ending at an anchor
    Range {
        /// Preset key (1w, 1m, 3m, 6m, 1y)
        #[arg(long, short = 'p')]
        preset: String,
        /// End anchor, defaults to now
        #[arg(long, short = 'a')]
        anchor: Option<String>,
        /// Resolution, defaults to the preset's default
        #[arg(long, short = 'r')]
        resolution: Option<Resolution>,
    },
    /// Snap an explicit range to a resolution
    Custom {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, short = 'r', default_value = "day")]
        resolution: Resolution,
    },
    /// Aggregate the synthetic series over a window
    Aggregate {
        #[arg(long, short = 's')]
        start: String,
        #[arg(long, short = 'e')]
        end: String,
        #[arg(long, short = 'r')]
        resolution: String,
        /// Snap the window to the resolution before aggregating
        #[arg(long)]
        align: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tz = parse_timezone(&cli.timezone)?;

    match cli.command {
        Commands::Presets => {
            let entries = registry();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    let allowed: Vec<&str> = entry.allowed_resolutions.iter().map(|r| r.as_str()).collect();
                    println!(
                        "{:<7} {:<9} {:<32} default={:<6} allowed={}",
                        entry.key,
                        entry.label,
                        entry.description,
                        entry.default_resolution,
                        allowed.join(",")
                    );
                }
            }
        }
        Commands::Range {
            preset,
            anchor,
            resolution,
        } => {
            let definition = lookup(&preset)?;
            let resolution = resolution.unwrap_or(definition.default_resolution);
            let range = match anchor {
                Some(anchor) => compute_range_from_preset(&preset, &anchor, resolution, tz)?,
                None => preset_window(definition, &Utc::now().with_timezone(&tz), resolution)?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&range)?);
            } else {
                println!("{} -> {}", format_iso(&range.start_date), format_iso(&range.end_date));
            }
        }
        Commands::Custom { from, to, resolution } => {
            let range = compute_range_from_custom(&from, &to, resolution, tz)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&range)?);
            } else {
                println!("{} -> {}", format_iso(&range.start_date), format_iso(&range.end_date));
            }
        }
        Commands::Aggregate {
            start,
            end,
            resolution,
            align,
        } => {
            let mut window = AggregationRequest::new(&start, &end, &resolution).validate(tz)?;
            if align {
                window = QueryWindow::aligned(&window.start_date, &window.end_date, window.resolution)?;
            }

            let result = AggregationEngine::default().execute(&window)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} buckets from {} hourly points",
                    result.metadata.total_buckets, result.metadata.total_hourly_points
                );
                for bucket in &result.buckets {
                    println!(
                        "{:<18} {:<14} {:>6}",
                        bucket.label,
                        format_for_display(&bucket.timestamp, window.resolution),
                        bucket.value
                    );
                }
            }
        }
    }

    Ok(())
}
