mod bedrock;
mod config;
mod output;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use bedrock::{
    BedrockClient, GenerationRequest, JobOutcome, RequestOverrides, Storyboard, DEFAULT_PROMPT,
};
use config::{ConfigError, ImageQuality, Settings};
use output::{EnvProvision, OutputDir};

/// Parse and validate a clip duration in milliseconds (1-120000)
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid duration in milliseconds", s))?;
    if !(1..=120_000).contains(&ms) {
        return Err(format!(
            "Duration must be between 1 and 120000 milliseconds, got {}",
            ms
        ));
    }
    Ok(ms)
}

/// Parse image quality (standard, premium)
fn parse_quality(s: &str) -> Result<ImageQuality, String> {
    ImageQuality::parse(s)
}

/// Parse and validate the overall wait timeout in seconds (1-3600)
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of seconds", s))?;
    if !(1..=3600).contains(&secs) {
        return Err(format!(
            "Timeout must be between 1 and 3600 seconds, got {}",
            secs
        ));
    }
    Ok(secs)
}

/// Parse and validate the poll interval in seconds (1-60)
fn parse_poll_secs(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of seconds", s))?;
    if !(1..=60).contains(&secs) {
        return Err(format!(
            "Poll interval must be between 1 and 60 seconds, got {}",
            secs
        ));
    }
    Ok(secs)
}

/// nova-clip: generate short video clips with Amazon Bedrock
#[derive(Parser)]
#[command(name = "nova-clip")]
#[command(version, about = "Generate short video clips with Amazon Bedrock")]
#[command(after_help = "EXAMPLES:
    # One-time setup: create the output directory and a .env template
    nova-clip setup

    # Verify credentials and effective defaults
    nova-clip check-config

    # Generate a clip from a single prompt
    nova-clip generate --prompt \"a cat on a skateboard\"

    # Generate a multi-shot clip from a storyboard directory
    nova-clip storyboard --storyboard-dir ./shots

ENVIRONMENT:
    AWS_ACCESS_KEY_ID        Required. AWS access key id.
    AWS_SECRET_ACCESS_KEY    Required. AWS secret access key.
    AWS_REGION               Region (default: us-east-1).
    DEFAULT_MODEL_ID         Video model id (default: amazon.nova.video-1080p).
    DEFAULT_DURATION         Clip duration in ms (default: 5000).
    DEFAULT_IMAGE_QUALITY    standard or premium (default: standard).
    OUTPUT_DIR               Where assets are saved (default: ./output).

Variables can also live in a .env file; live environment wins.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by the two generation subcommands.
#[derive(Args)]
struct GenerationArgs {
    /// Bedrock video model id (default: from DEFAULT_MODEL_ID)
    #[arg(long, short = 'm')]
    model_id: Option<String>,

    /// Clip duration in milliseconds (default: from DEFAULT_DURATION)
    #[arg(long, short = 'd', value_parser = parse_duration_ms)]
    duration: Option<u64>,

    /// Image quality: standard or premium (default: from DEFAULT_IMAGE_QUALITY)
    #[arg(long, short = 'q', value_parser = parse_quality)]
    quality: Option<ImageQuality>,

    /// Explicit generation seed (default: derived from the prompt text)
    #[arg(long)]
    seed: Option<u32>,

    /// AWS region (default: from AWS_REGION)
    #[arg(long, short = 'r')]
    region: Option<String>,

    /// Directory to save the video and thumbnail into (default: from OUTPUT_DIR)
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Maximum seconds to wait for the job to finish (default: 300)
    #[arg(long, value_parser = parse_timeout_secs)]
    timeout_secs: Option<u64>,

    /// Seconds between job status polls (default: 5)
    #[arg(long, value_parser = parse_poll_secs)]
    poll_interval_secs: Option<u64>,

    /// Print the asset URLs without downloading them
    #[arg(long)]
    no_download: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video clip from a single text prompt
    #[command(after_help = "EXAMPLES:
    nova-clip generate
    nova-clip generate --prompt \"a cat on a skateboard\"
    nova-clip generate -p \"city at night\" --duration 8000 -q premium")]
    Generate {
        /// Text prompt describing the video (default: a sample prompt)
        #[arg(long, short = 'p')]
        prompt: Option<String>,

        #[command(flatten)]
        args: GenerationArgs,
    },

    /// Generate a multi-shot video clip from a storyboard directory
    ///
    /// The directory must contain a storyboard.toml manifest with one
    /// [[shot]] table per shot. Without --storyboard-dir a built-in
    /// four-shot sample storyboard is used.
    #[command(after_help = "EXAMPLES:
    nova-clip storyboard
    nova-clip storyboard --storyboard-dir ./shots

MANIFEST (storyboard.toml):
    [[shot]]
    prompt = \"A cat waking up in a sunny room\"
    image = \"01.png\"        # optional, relative to the directory
    duration_ms = 1500        # optional, defaults to DEFAULT_DURATION")]
    Storyboard {
        /// Directory containing a storyboard.toml manifest
        #[arg(long, short = 's')]
        storyboard_dir: Option<PathBuf>,

        #[command(flatten)]
        args: GenerationArgs,
    },

    /// Print the effective configuration and credential status
    CheckConfig,

    /// Create the output directory and provision a .env template
    Setup,
}

/// Guidance for configuration failures, mirroring what check-config prints.
fn config_error_guidance(error: &ConfigError) -> String {
    match error {
        ConfigError::MissingField { name } => format!(
            "{} is not set.\n\n\
            Add your AWS credentials to a .env file in this directory:\n\
                echo '{}=...' >> .env\n\n\
            Or export them in your shell. Run 'nova-clip setup' to create\n\
            a .env template, and 'nova-clip check-config' to verify.",
            name, name
        ),
        other => other.to_string(),
    }
}

/// Load settings and apply CLI-level region/output overrides.
fn load_settings(args: &GenerationArgs) -> Result<Settings, String> {
    let mut settings = Settings::load().map_err(|e| config_error_guidance(&e))?;
    if let Some(ref region) = args.region {
        settings.region = region.clone();
    }
    if let Some(ref output_dir) = args.output_dir {
        settings.output_dir = output_dir.clone();
    }
    Ok(settings)
}

fn request_overrides(args: &GenerationArgs) -> RequestOverrides {
    RequestOverrides {
        model_id: args.model_id.clone(),
        duration_ms: args.duration,
        quality: args.quality,
        seed: args.seed,
    }
}

/// Submit a request, wait for the job, and download the results.
fn run_job(
    request: GenerationRequest,
    settings: &Settings,
    args: &GenerationArgs,
) -> Result<(), String> {
    let poll_interval = args
        .poll_interval_secs
        .map(Duration::from_secs)
        .unwrap_or(bedrock::DEFAULT_POLL_INTERVAL);
    let wait_timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(bedrock::DEFAULT_WAIT_TIMEOUT);
    let client = BedrockClient::new(settings)
        .map_err(|e| bedrock::describe(&e))?
        .with_wait(poll_interval, wait_timeout);

    if let Err(e) = bedrock::setup_interrupt_handler() {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;

    rt.block_on(async {
        println!("Submitting job to model {}...", request.model_id);
        let result = client
            .submit_and_wait(&request)
            .await
            .map_err(|e| bedrock::describe(&e))?;

        match result.status {
            JobOutcome::Succeeded => {
                println!("Job {} succeeded.", result.job_id);
                match result.video_uri {
                    Some(ref uri) => println!("Video URI: {}", uri),
                    None => println!("The service reported success but returned no video URI."),
                }
                if let Some(ref uri) = result.thumbnail_uri {
                    println!("Thumbnail URI: {}", uri);
                }

                if !args.no_download {
                    let out = OutputDir::new(settings.output_dir.clone());
                    out.ensure_exists().map_err(|e| {
                        format!(
                            "Failed to create output directory '{}': {}",
                            out.root().display(),
                            e
                        )
                    })?;

                    if let Some(ref uri) = result.video_uri {
                        let dest = out.video_path(request.task_type, &result.job_id);
                        client
                            .download(uri, &dest)
                            .await
                            .map_err(|e| bedrock::describe(&e))?;
                        println!("Video saved to {}", dest.display());
                    }
                    if let Some(ref uri) = result.thumbnail_uri {
                        let dest = out.thumbnail_path(request.task_type, &result.job_id);
                        client
                            .download(uri, &dest)
                            .await
                            .map_err(|e| bedrock::describe(&e))?;
                        println!("Thumbnail saved to {}", dest.display());
                    }
                }

                Ok(())
            }
            JobOutcome::Failed => {
                let detail = result
                    .error_detail
                    .unwrap_or_else(|| "no error detail".to_string());
                Err(format!(
                    "Generation job {} failed: {}",
                    result.job_id, detail
                ))
            }
            JobOutcome::InProgress => Err(format!(
                "Generation job {} is still in progress; re-run with a longer --timeout-secs",
                result.job_id
            )),
        }
    })
}

/// Run the generate subcommand with a single prompt.
fn run_generate(prompt: Option<String>, args: &GenerationArgs) -> Result<(), String> {
    let settings = load_settings(args)?;
    let prompt = prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    let request = GenerationRequest::from_prompt(&prompt, &request_overrides(args), &settings)
        .map_err(|e| e.to_string())?;

    println!("Generating video for: \"{}\"", prompt);
    run_job(request, &settings, args)
}

/// Run the storyboard subcommand.
fn run_storyboard(storyboard_dir: Option<PathBuf>, args: &GenerationArgs) -> Result<(), String> {
    let settings = load_settings(args)?;

    let storyboard = match storyboard_dir {
        Some(ref dir) => {
            println!("Loading storyboard from {}", dir.display());
            Storyboard::load_dir(dir).map_err(|e| e.to_string())?
        }
        None => {
            println!("No storyboard directory given, using the built-in sample storyboard.");
            Storyboard::default_sequence()
        }
    };

    println!("Generating video from {} shots", storyboard.len());
    let request =
        GenerationRequest::from_storyboard(storyboard, &request_overrides(args), &settings)
            .map_err(|e| e.to_string())?;

    run_job(request, &settings, args)
}

/// Run the check-config subcommand.
fn run_check_config() -> Result<(), String> {
    println!("nova-clip configuration\n");

    match Settings::load() {
        Ok(settings) => {
            settings.print_summary();
            println!("\nAWS credentials: configured");
            Ok(())
        }
        Err(error) => {
            let missing = config::missing_credentials();
            if !missing.is_empty() {
                println!("AWS credentials: NOT configured ({})", missing.join(", "));
                println!();
            }
            Err(config_error_guidance(&error))
        }
    }
}

/// Run the setup subcommand.
fn run_setup() -> Result<(), String> {
    let output_dir = std::env::var(config::OUTPUT_DIR_ENV)
        .unwrap_or_else(|_| config::DEFAULT_OUTPUT_DIR.to_string());
    let out = OutputDir::new(PathBuf::from(&output_dir));
    out.ensure_exists()
        .map_err(|e| format!("Failed to create output directory '{}': {}", output_dir, e))?;
    println!("Output directory ready: {}", out.root().display());

    match output::provision_env_file(Path::new("."))
        .map_err(|e| format!("Failed to write .env file: {}", e))?
    {
        EnvProvision::Created(path) => {
            println!("Created {} from the template.", path.display());
            println!("Edit it to add your AWS credentials, then run 'nova-clip check-config'.");
        }
        EnvProvision::AlreadyExists(path) => {
            println!("{} already exists, leaving it untouched.", path.display());
        }
    }

    Ok(())
}

fn main() {
    // Load .env before reading any configuration
    config::load_dotenv();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { prompt, args } => run_generate(prompt, &args),
        Commands::Storyboard {
            storyboard_dir,
            args,
        } => run_storyboard(storyboard_dir, &args),
        Commands::CheckConfig => run_check_config(),
        Commands::Setup => run_setup(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
