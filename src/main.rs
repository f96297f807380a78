use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use towebp::config::{self, AppConfig};
use towebp::convert::{ConvertOptions, Converter};
use towebp::exif::{ExifPolicy, extract_exif};
use towebp::export::{DirectorySink, export_archive, export_multiple, export_names};
use towebp::imaging::{AspectRatio, KamadakReader, ResizeSettings, RustBackend, parse_box};
use towebp::metadata::{self, ImageMetadata};
use towebp::naming::SystemClock;
use towebp::output;
use towebp::session::{Session, collect_paths, load_supported};
use towebp::store::MetadataStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "towebp")]
#[command(about = "Convert PNG, AVIF, JPEG and GIF images to WebP")]
#[command(long_about = "\
Convert PNG, AVIF, JPEG and GIF images to WebP

Files are converted one at a time. A file that fails to convert is reported
and skipped; the rest of the batch carries on.

EXIF policies:
  strip     drop all EXIF data (default)
  preserve  keep camera, exposure, size, orientation and date fields
  sanitize  like preserve, without GPS location and capture timestamps

Output names:
  IMG_001.png                      → IMG_001.webp
  --name trip --number             → trip_1.webp, trip_2.webp, ...
  --number --date --time           → IMG_001_1_2024-06-01_09-05-07.webp

Settings are read from ./towebp.toml when present; flags override them.
Run 'towebp gen-config' to generate a documented towebp.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./towebp.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert images (files or directories) to WebP
    Convert(ConvertArgs),
    /// Show the readable EXIF summary of an image
    Exif {
        /// Image file
        file: PathBuf,
    },
    /// Manage the saved metadata applied with --saved-metadata
    Metadata {
        #[command(subcommand)]
        action: MetadataAction,
    },
    /// Print a stock towebp.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Input files or directories
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Descend into subdirectories of directory inputs
    #[arg(short, long)]
    recursive: bool,

    /// WebP quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=100))]
    quality: Option<u32>,

    /// Resize to fit a box, e.g. 1920x1080
    #[arg(long, value_name = "WxH", value_parser = parse_box)]
    resize: Option<(u32, u32)>,

    /// Resize mode: preserve, free or square
    #[arg(long, value_name = "MODE")]
    aspect: Option<AspectRatio>,

    /// EXIF policy: preserve, strip or sanitize
    #[arg(long, value_name = "POLICY")]
    exif: Option<ExifPolicy>,

    /// Custom base name for every output file
    #[arg(long)]
    name: Option<String>,

    /// Append the 1-based batch position
    #[arg(long)]
    number: bool,

    /// Append the current date (YYYY-MM-DD)
    #[arg(long)]
    date: bool,

    /// Append the current time (HH-MM-SS)
    #[arg(long)]
    time: bool,

    #[command(flatten)]
    metadata: MetadataArgs,

    /// Start from the saved metadata (flags still override it)
    #[arg(long)]
    saved_metadata: bool,

    /// Output directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Bundle all results into one ZIP archive
    #[arg(long)]
    zip: bool,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(clap::Args, Clone, Default)]
struct MetadataArgs {
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    copyright: Option<String>,
    /// Keyword (repeatable)
    #[arg(long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,
}

impl MetadataArgs {
    fn to_metadata(&self) -> ImageMetadata {
        ImageMetadata {
            author: self.author.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            copyright: self.copyright.clone(),
            keywords: self.keywords.clone(),
        }
    }
}

#[derive(Subcommand)]
enum MetadataAction {
    /// Print the saved metadata
    Show,
    /// Save metadata for later runs
    Save(MetadataArgs),
    /// Delete the saved metadata
    Clear,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Convert(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_overrides(&mut config, &args);
            config.validate()?;
            run_convert(&config, &args)?;
        }
        Command::Exif { file } => {
            let bytes = std::fs::read(&file)?;
            let name = file.display().to_string();
            let exif = extract_exif(&KamadakReader, &bytes, &name);
            output::print_exif_output(&name, exif.as_ref());
        }
        Command::Metadata { action } => {
            let store = MetadataStore::open_default()?;
            match action {
                MetadataAction::Show => {
                    let saved = store.load()?.unwrap_or_default();
                    output::print_metadata(&saved);
                }
                MetadataAction::Save(args) => {
                    let cleaned = checked_metadata(&args.to_metadata())?;
                    store.save(&cleaned)?;
                    output::print_metadata(&cleaned);
                    println!("Saved to {}", store.path().display());
                }
                MetadataAction::Clear => {
                    store.clear()?;
                    println!("Cleared {}", store.path().display());
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings only, or debug for this crate with `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "towebp=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Unvalidated; the caller validates after applying flags.
fn load_config(path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    match path {
        Some(path) if !path.exists() => Err(config::ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        ))),
        Some(path) => config::read_config_file(path),
        None => config::read_config_file(Path::new(config::CONFIG_FILE_NAME)),
    }
}

/// Command-line flags override the config file.
fn apply_overrides(config: &mut AppConfig, args: &ConvertArgs) {
    if let Some(quality) = args.quality {
        config.conversion.quality = quality;
    }
    if let Some(policy) = args.exif {
        config.conversion.exif = policy;
    }
    if let Some((width, height)) = args.resize {
        let aspect = args.aspect.unwrap_or(config.resize.aspect_ratio);
        config.resize = ResizeSettings::to_box(width, height, aspect);
    } else if let Some(aspect) = args.aspect {
        config.resize.aspect_ratio = aspect;
    }
    if let Some(name) = &args.name {
        config.naming.custom_name = name.clone();
    }
    config.naming.add_number |= args.number;
    config.naming.add_date |= args.date;
    config.naming.add_time |= args.time;
    if let Some(dir) = &args.out_dir {
        config.export.out_dir = dir.display().to_string();
    }
    config.export.zip |= args.zip;
}

/// Clean user metadata and reject it when any field breaks a limit.
fn checked_metadata(raw: &ImageMetadata) -> Result<ImageMetadata, Box<dyn std::error::Error>> {
    let cleaned = metadata::clean(raw);
    let issues = metadata::validate(&cleaned);
    if issues.is_empty() {
        return Ok(cleaned);
    }
    for issue in &issues {
        eprintln!("{}", issue);
    }
    Err(format!("{} metadata field(s) invalid", issues.len()).into())
}

fn run_convert(config: &AppConfig, args: &ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let paths = collect_paths(&args.inputs, args.recursive)?;
    let (files, selection) = load_supported(paths)?;
    let mut session = Session::new();
    session.add_files(files);
    if let Some(message) = selection.message() {
        eprintln!("{}", message);
    }
    if session.selected().is_empty() {
        return Err("no supported images to convert".into());
    }

    let mut user = args.metadata.to_metadata();
    if args.saved_metadata {
        let store = MetadataStore::open_default()?;
        if let Some(saved) = store.load()? {
            user = metadata::merge(&user, &saved);
        }
    }
    let user = checked_metadata(&user)?;

    let options = ConvertOptions {
        quality: config.quality(),
        resize: config.resize.enabled.then_some(config.resize),
        metadata: (!user.is_empty()).then_some(user),
        settings: Some(config.conversion_settings()),
    };

    let backend = RustBackend::new();
    let converter = Converter::new(&backend);
    let names: Vec<String> = session
        .selected()
        .iter()
        .map(|f| f.file.name.clone())
        .collect();
    let run = session.convert(&converter, &options, |progress| {
        let name = names
            .get(progress.completed - 1)
            .map(String::as_str)
            .unwrap_or("");
        println!("{}", output::format_progress(progress, name));
    });
    println!();

    let images = session.converted();
    let export = export_names(images, Some(&config.naming), &SystemClock);
    output::print_convert_output(images, &export, &run.skipped, run.cancelled);

    let mut sink = DirectorySink::new(&config.export.out_dir);
    if config.export.zip {
        if let Some(archive) = export_archive(images, &export, &mut sink, &SystemClock)? {
            println!("Archive \u{2192} {}", sink.dir().join(archive).display());
        }
    } else {
        export_multiple(
            images,
            &export,
            &mut sink,
            Duration::from_millis(config.export.stagger_ms),
        )?;
        if !images.is_empty() {
            println!(
                "Exported {} files \u{2192} {}",
                sink.written().len(),
                sink.dir().display()
            );
        }
    }

    if let Some(path) = &args.report {
        let report = output::build_report(images, &export, &run.skipped, run.cancelled);
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("Report \u{2192} {}", path.display());
    }

    Ok(())
}
