mod llm;

use calendar_sim::{
    format_float, CalendarBuilder, CalendarConfig, CalendarRequest, Period, QualityScorer,
};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calendar-sim", about = "Organic discussion calendar simulator")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one period of posts and comment threads.
    Generate(GenerateArgs),
    /// Re-score an existing period.
    Score(ScoreArgs),
    /// Write the default configuration.
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// Request JSON: company context, personas, forums, topics, posts per period.
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    period: Option<u32>,
    /// Period JSON from the previous run, used to vary topics.
    #[arg(long)]
    previous: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct ScoreArgs {
    #[arg(long)]
    calendar: PathBuf,
    /// Request JSON providing the persona roster.
    #[arg(long)]
    input: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/calendar.toml")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args, cli.config).await,
        Command::Score(args) => run_score(args, cli.config),
        Command::InitConfig(args) => CalendarConfig::default()
            .write(&args.path)
            .map(|_| println!("Wrote default configuration to {}", args.path.display()))
            .map_err(|err| err.to_string()),
    }
}

async fn run_generate(args: GenerateArgs, config_path: Option<PathBuf>) -> Result<(), String> {
    let (config, _) = CalendarConfig::load(config_path).map_err(|err| err.to_string())?;
    let mut request: CalendarRequest = read_json(&args.input)?;
    if let Some(period) = args.period {
        request.period_index = period;
    }
    request.validate().map_err(|err| err.to_string())?;

    let previous: Option<Period> = match args.previous.as_deref() {
        Some(path) => Some(read_json(path)?),
        None => None,
    };

    let client = llm::LlmClient::from_env(args.model)
        .ok_or_else(|| "OPENAI_API_KEY is not set".to_string())?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let period = CalendarBuilder::new(&client, &config)
        .build(&request, previous.as_ref(), Local::now().date_naive(), &mut rng)
        .await
        .map_err(|err| err.to_string())?;

    print_summary(&period, args.details);

    let payload = serde_json::to_string_pretty(&period)
        .map_err(|err| format!("failed to serialize calendar: {}", err))?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, payload)
                .map_err(|err| format!("failed to write {}: {}", path.display(), err))?;
            eprintln!("Calendar written to {}", path.display());
        }
        None => println!("{}", payload),
    }
    Ok(())
}

fn run_score(args: ScoreArgs, config_path: Option<PathBuf>) -> Result<(), String> {
    let (config, _) = CalendarConfig::load(config_path).map_err(|err| err.to_string())?;
    let request: CalendarRequest = read_json(&args.input)?;
    let mut period: Period = read_json(&args.calendar)?;

    period.quality = QualityScorer::new(config.quality).score(&period.posts, &request.personas);
    print_summary(&period, false);
    Ok(())
}

fn print_summary(period: &Period, details: bool) {
    let quality = &period.quality;
    eprintln!(
        "Period {}: {} to {} | {} posts | {} comments",
        period.period_index,
        period.start_date,
        period.end_date,
        period.posts.len(),
        period.comment_count()
    );
    eprintln!("Quality score: {}/10", format_float(quality.overall, 1));
    eprintln!(
        "Metrics: naturalness {} | persona variety {} | timing {} | diversity {} | anti-spam {}",
        format_float(quality.naturalness, 1),
        format_float(quality.persona_variety, 1),
        format_float(quality.timing_realism, 1),
        format_float(quality.content_diversity, 1),
        format_float(quality.anti_spam, 1)
    );

    if details {
        for post in &period.posts {
            eprintln!(
                "\n[{}] {} {} by {} ({})",
                post.id, post.posted_at, post.forum, post.author, post.topic_ids.join(", ")
            );
            eprintln!("  {}", post.title);
            for comment in &post.comments {
                let indent = if comment.parent_id.is_some() { "    " } else { "  " };
                eprintln!(
                    "{}+{}m {}: {}",
                    indent, comment.delay_minutes, comment.author, comment.text
                );
            }
        }
    }

    if !quality.warnings.is_empty() {
        eprintln!("\nWarnings:");
        for warning in &quality.warnings {
            eprintln!("- {}", warning);
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    serde_json::from_str(&data).map_err(|err| format!("failed to parse {}: {}", path.display(), err))
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
