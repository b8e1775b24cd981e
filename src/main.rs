// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use vidsub::app_config::{self, Config};
use vidsub::app_controller::Controller;
use vidsub::backend::AsrModelSize;
use vidsub::language_utils;
use vidsub::session::{Job, MediaState, SubtitleTextState};

/// CLI Wrapper for AsrModelSize to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl From<CliModelSize> for AsrModelSize {
    fn from(cli_size: CliModelSize) -> Self {
        match cli_size {
            CliModelSize::Tiny => AsrModelSize::Tiny,
            CliModelSize::Base => AsrModelSize::Base,
            CliModelSize::Small => AsrModelSize::Small,
            CliModelSize::Medium => AsrModelSize::Medium,
            CliModelSize::Large => AsrModelSize::Large,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a video and process it into subtitles
    Process {
        /// Video file to upload
        #[arg(value_name = "VIDEO")]
        video: PathBuf,

        /// Language spoken in the video (e.g., 'english')
        #[arg(short, long)]
        input_language: String,

        /// Subtitle language to generate; repeat for several
        #[arg(short, long = "target-language", required = true)]
        target_languages: Vec<String>,

        /// ASR model size
        #[arg(short, long, value_enum)]
        model_size: Option<CliModelSize>,

        /// Preview the result right after processing
        #[arg(long)]
        preview: bool,
    },

    /// Load the processed video of a job and show the selected subtitles
    Preview {
        /// Job identifier
        job_id: String,

        /// Language spoken in the video
        #[arg(short, long, default_value = "")]
        input_language: String,

        /// Subtitle languages of the job, in order
        #[arg(short, long = "target-language")]
        target_languages: Vec<String>,

        /// Language to select ('none' for no subtitles)
        #[arg(short, long)]
        select: Option<String>,
    },

    /// Download the processed video of a job
    Download {
        /// Job identifier
        job_id: String,

        /// Output directory (defaults to the configured download directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the summaries generated for a job
    Summaries {
        /// Job identifier
        job_id: String,
    },

    /// Generate shell completions for vidsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// vidsub - Subtitle pipeline preview client
///
/// Uploads videos to the transcription/translation pipeline, previews the
/// processed result with subtitle tracks and downloads it.
#[derive(Parser, Debug)]
#[command(name = "vidsub")]
#[command(version)]
#[command(about = "Preview and download videos processed by the subtitle pipeline")]
#[command(long_about = "vidsub uploads videos to the subtitle pipeline and consumes its results.

EXAMPLES:
    vidsub process talk.mp4 -i english -t arabic -t french   # Upload and process
    vidsub preview <JOB_ID> -i english -t arabic -t french -s french
    vidsub download <JOB_ID> -o ./out                          # Save the processed video
    vidsub summaries <JOB_ID>                                  # Print summaries
    vidsub completions bash > vidsub.bash                      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set with set_max_level below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "vidsub", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());
    config.validate()?;

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Process { video, input_language, target_languages, model_size, preview } => {
            let job = controller
                .submit(video, input_language, target_languages, model_size.map(Into::into))
                .await?;
            println!("Job ID: {}", job.id);
            if preview {
                run_preview(&controller, job, None).await?;
            }
        }
        Commands::Preview { job_id, input_language, target_languages, select } => {
            let job = Job::new(job_id, input_language, target_languages);
            run_preview(&controller, job, select).await?;
        }
        Commands::Download { job_id, output_dir } => {
            let outcome = controller.download(&job_id, output_dir).await?;
            println!("{} ({} bytes) saved to {}", outcome.filename, outcome.size, outcome.saved_to.display());
        }
        Commands::Summaries { job_id } => {
            let summaries = controller.summaries(&job_id).await?;
            if summaries.is_empty() {
                warn!("No summaries available for job {}", job_id);
            }
            for summary in summaries {
                println!("[{}]\n{}\n", language_utils::get_language_name(&summary.language), summary.text_content);
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn run_preview(controller: &Controller, job: Job, selection: Option<String>) -> Result<()> {
    let job_id = job.id.clone();
    let report = controller.preview(job, selection).await?;

    match &report.media {
        MediaState::Ready(handle) => {
            info!("Processed video for job {} ready ({} bytes)", job_id, handle.size);
        }
        MediaState::Error(message) => {
            println!("Failed to load video: {}", message);
            return Ok(());
        }
        _ => {}
    }

    if report.active_tracks.is_empty() {
        println!("Active subtitle track: none");
    } else {
        for code in &report.active_tracks {
            println!("Active subtitle track: {}", language_utils::get_language_name(code));
        }
    }

    match &report.subtitle_text {
        SubtitleTextState::Idle => println!("No subtitle file loaded."),
        other => {
            if let Some(text) = other.display_text() {
                println!("{}", text);
            }
        }
    }
    Ok(())
}
