use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use serde_json::{json, Value};
use std::io::{self, Read};
use std::sync::Once;
use tfscope::analysis::{self, AnalysisResult};
use tfscope::input::{InputLimits, DEFAULT_MAX_BYTES};
use tfscope::level::Level;
use tfscope::parser::LogEntry;
use tfscope::query::{self, EntryQuery};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum View {
    Full,
    Summary,
    Errors,
    Gantt,
    Logs,
}

#[derive(Parser, Debug)]
#[command(name = "tfscope", version, about = "Terraform execution log analysis")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Which part of the analysis to print
    #[arg(long = "only", value_enum, default_value_t = View::Full)]
    only: View,

    /// Reject inputs larger than this many bytes
    #[arg(long = "max-bytes", default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: usize,

    /// Length of the top resource/provider lists (when --only summary)
    #[arg(long = "top", default_value_t = 6)]
    top: usize,

    // Logs view flags (when --only logs)
    #[arg(long = "level", value_parser = parse_level)] level: Vec<Level>,
    #[arg(long = "search")] search: Option<String>,
    #[arg(long = "start")] start: Option<String>,
    #[arg(long = "end")] end: Option<String>,
    #[arg(long = "context-index")] context_index: Option<usize>,
    #[arg(long = "before", short = 'B', default_value_t = 0)] before: usize,
    #[arg(long = "after", short = 'A', default_value_t = 0)] after: usize,

    /// Single-line JSON instead of pretty-printed
    #[arg(long = "compact", default_value_t = false)]
    compact: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(long = "verbose", short = 'v', default_value_t = false)]
    verbose: bool,
}

fn parse_level(s: &str) -> Result<Level, tfscope::level::UnknownLevel> {
    s.parse()
}

fn parse_bound(flag: &str, value: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .with_context(|| format!("{flag} expects an RFC3339 timestamp, got `{s}`"))
        })
        .transpose()
}

fn read_input(path: &str) -> anyhow::Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf).context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("reading {path}"))
    }
}

fn entry_row(index: usize, entry: &LogEntry) -> Value {
    json!({
        "index": index,
        "timestamp": entry.timestamp.as_ref().map(|t| t.to_string()),
        "level": entry.level,
        "section": entry.section,
        "text": entry.display_text,
    })
}

fn render(cli: &Cli, filter: &EntryQuery, result: &AnalysisResult) -> anyhow::Result<Value> {
    let value = match cli.only {
        View::Full => serde_json::to_value(result)?,
        View::Summary => serde_json::to_value(result.summary(cli.top))?,
        View::Errors => serde_json::to_value(&result.errors)?,
        View::Gantt => serde_json::to_value(result.gantt())?,
        View::Logs => {
            let rows = match cli.context_index {
                Some(index) => query::context(result, index, cli.before, cli.after),
                None => filter.run(result),
            };
            Value::Array(rows.into_iter().map(|(i, e)| entry_row(i, e)).collect())
        }
    };
    Ok(value)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    init_parallelism();

    // Default to stdin if no input specified
    let inputs = if cli.input.is_empty() { vec!["-".to_string()] } else { cli.input.clone() };
    if inputs.iter().filter(|p| p.as_str() == "-").count() > 1 {
        bail!("stdin (`-`) can only be read once");
    }

    let limits = InputLimits { max_bytes: cli.max_bytes };
    let filter = EntryQuery {
        levels: cli.level.clone(),
        search: cli.search.clone(),
        start: parse_bound("--start", cli.start.as_deref())?,
        end: parse_bound("--end", cli.end.as_deref())?,
    };

    // One independent engine call per input.
    let rendered: Vec<anyhow::Result<Value>> = inputs
        .par_iter()
        .map(|path| {
            let bytes = read_input(path)?;
            debug!(file = %path, bytes = bytes.len(), "analysing");
            let result = analysis::analyze_bytes(&bytes, &limits).with_context(|| format!("cannot analyse {path}"))?;
            if result.entries.is_empty() {
                warn!(file = %path, "no log entries found");
            }
            render(&cli, &filter, &result)
        })
        .collect();

    let mut outputs = Vec::with_capacity(rendered.len());
    for (path, value) in inputs.iter().zip(rendered) {
        outputs.push((path, value?));
    }
    let doc = match outputs.len() {
        1 => outputs.remove(0).1,
        _ => Value::Array(
            outputs
                .into_iter()
                .map(|(path, result)| json!({ "file": path, "result": result }))
                .collect(),
        ),
    };

    if cli.compact {
        println!("{}", serde_json::to_string(&doc)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    }
    Ok(())
}
