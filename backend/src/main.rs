//! Evalboard CLI - Unified view over ENEM and SAEB essay evaluations
//!
//! # Main Commands
//!
//! ```bash
//! evalboard serve                         # Start HTTP server (port 3000)
//! evalboard view input.csv --group-by school_name
//! evalboard summary input.csv --exam saeb_9
//! evalboard export input.csv --city Recife --sort final:desc
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! evalboard parse input.csv               # Typed raw rows as JSON
//! evalboard normalize input.csv           # Canonical evaluations as JSON
//! ```

use clap::{Args, Parser, Subcommand};
use evalboard::{
    aggregate, default_sort, export_file_name, load_csv, parse_csv_file_auto, to_csv,
    ExamFilter, Field, Filters, ServerConfig, SortRule, ViewController, ViewState,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "evalboard")]
#[command(about = "Normalize, filter and summarize essay evaluation records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output typed rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize a CSV file into canonical evaluations
    Normalize {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Filter, sort and group evaluations
    View {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Print the derived view as JSON
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summary statistics of the visible rows
    Summary {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Export the visible rows as CSV
    Export {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Output file (default: evaluations_export_<today>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: EVALBOARD_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// CSV file loaded at start (default: EVALBOARD_DATA)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

/// Search, filter, sort and grouping flags shared by the view commands.
#[derive(Args, Debug)]
struct ViewArgs {
    /// Case-insensitive text over student, school, city and class
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    city: Option<String>,

    #[arg(long)]
    school: Option<String>,

    #[arg(long)]
    class: Option<String>,

    /// all, enem, saeb or saeb_6 .. saeb_9
    #[arg(long, default_value = "all")]
    exam: ExamFilter,

    /// First month (YYYY-MM)
    #[arg(long)]
    from: Option<String>,

    /// Last month (YYYY-MM)
    #[arg(long)]
    to: Option<String>,

    /// field[:asc|desc], repeat for secondary keys (default: essay_date:desc)
    #[arg(long = "sort")]
    sort: Vec<SortRule>,

    /// Field to group rows by
    #[arg(long)]
    group_by: Option<Field>,
}

impl ViewArgs {
    fn into_state(self) -> ViewState {
        ViewState {
            search: self.search.unwrap_or_default(),
            filters: Filters {
                city: self.city,
                school: self.school,
                class: self.class,
                exam: self.exam,
                start_month: self.from,
                end_month: self.to,
            },
            sort: if self.sort.is_empty() { default_sort() } else { self.sort },
            group_by: self.group_by,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Normalize { input, output } => cmd_normalize(&input, output.as_deref()),

        Commands::View {
            input,
            view,
            json,
            output,
        } => cmd_view(&input, view, json, output.as_deref()),

        Commands::Summary { input, view } => cmd_summary(&input, view),

        Commands::Export {
            input,
            view,
            output,
        } => cmd_export(&input, view, output),

        Commands::Serve { port, data } => cmd_serve(port, data).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("⚠️  Logging disabled: {}", e);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_normalize(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_csv(input)?;

    let json = serde_json::to_string_pretty(&loaded.evaluations)?;
    write_output(&json, output)?;

    Ok(())
}

fn load_controller(
    input: &Path,
    view: ViewArgs,
) -> Result<ViewController, Box<dyn std::error::Error>> {
    let loaded = load_csv(input)?;
    let rows = loaded.evaluations.into_iter().map(Arc::new).collect();
    Ok(ViewController::with_state(rows, view.into_state()))
}

fn cmd_view(
    input: &Path,
    view: ViewArgs,
    json: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = load_controller(input, view)?;
    let derived = controller.derived();

    let content = if json {
        serde_json::to_string_pretty(derived)?
    } else {
        let mut lines = Vec::new();
        for group in &derived.groups {
            lines.push(format!("== {} ({}) ==", group.title, group.rows.len()));
            for row in &group.rows {
                lines.push(format!(
                    "{:<24} {:<24} {:<12} {:<10} {:>6}{}",
                    row.student_name,
                    row.school_name,
                    row.class_name,
                    row.essay_date,
                    row.text(Field::Final),
                    if row.meta.is_annulled { "  (annulled)" } else { "" }
                ));
            }
        }
        lines.push(String::new());
        lines.push(format_summary(&derived.aggregates));
        lines.join("\n")
    };

    eprintln!(
        "🔎 {} of {} evaluations visible",
        derived.sorted.len(),
        controller.dataset().len()
    );
    write_output(&content, output)?;

    Ok(())
}

fn cmd_summary(input: &Path, view: ViewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let controller = load_controller(input, view)?;
    let aggregates = aggregate(controller.export_rows());

    eprintln!("📊 {} evaluations", controller.export_rows().len());
    if aggregates.is_empty() {
        eprintln!("   No rows match the current filters.");
        return Ok(());
    }
    println!("{}", format_summary(&aggregates));

    Ok(())
}

fn cmd_export(
    input: &Path,
    view: ViewArgs,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = load_controller(input, view)?;
    let csv = to_csv(controller.export_rows())?;

    let path = output
        .unwrap_or_else(|| PathBuf::from(export_file_name(chrono::Local::now().date_naive())));
    fs::write(&path, csv)?;
    eprintln!(
        "💾 Exported {} rows to: {}",
        controller.export_rows().len(),
        path.display()
    );

    Ok(())
}

async fn cmd_serve(
    port: Option<u16>,
    data: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?.with_port(port).with_data(data);
    evalboard::server::start_server(config).await?;
    Ok(())
}

fn format_summary(aggregates: &evalboard::Aggregates) -> String {
    Field::ALL
        .iter()
        .filter_map(|field| aggregates.get(field).map(|s| (field, s)))
        .map(|(field, s)| format!("{:<14} {:<9} {}", field.key(), s.label, s.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
