use adaptive_gallery::catalog::{self, CatalogQuery, PageMode, SortOrder};
use adaptive_gallery::config::{self, GalleryConfig};
use adaptive_gallery::gallery::Gallery;
use adaptive_gallery::imaging::RustBackend;
use adaptive_gallery::source::DefaultSource;
use adaptive_gallery::{output, render, scan};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adaptive-gallery")]
#[command(version)]
#[command(about = "Adaptive image gallery for product catalogs")]
#[command(long_about = "\
Adaptive image gallery for product catalogs

Every image is fetched and decoded once, then turned into a grid thumbnail
(fitted into a square box) and a bounded lightbox preview. Results are kept
in a bounded cache for the lifetime of the gallery.

Typical flow:

  adaptive-gallery scan --source catalog/      # catalog/ → descriptors.json
  adaptive-gallery check                        # duplicate ids, empty fields
  adaptive-gallery build --source catalog/      # → dist/index.html + images/

Descriptor list format (JSON array):

  [{ \"id\": \"oak\", \"url\": \"products/oak.jpg\", \"name\": \"Oak Panel\", \"size\": 52311 }]

URLs may be http(s)://, file:// or paths relative to --source.

Run 'adaptive-gallery gen-config' to generate a documented config file.")]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "gallery.toml", global = true)]
    config: PathBuf,

    /// Descriptor list JSON
    #[arg(long, default_value = "descriptors.json", global = true)]
    descriptors: PathBuf,

    /// Root directory for relative source URLs
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory for the rendered page
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Catalog view flags.
#[derive(clap::Args, Clone)]
struct ListArgs {
    /// Case-insensitive match on name or URL
    #[arg(long, default_value = "")]
    search: String,

    /// name, name-desc, size, size-desc, dimensions, dimensions-desc
    #[arg(long, default_value = "name")]
    sort: SortOrder,

    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Show every page up to --page instead of just that page
    #[arg(long)]
    infinite: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Walk --source for images and write the descriptor list
    Scan,
    /// Filter, sort and page through the descriptor list
    List(ListArgs),
    /// Process every descriptor into thumbnail + preview
    Process,
    /// Process, then render the static gallery page into --output
    Build {
        /// Page title
        #[arg(long, default_value = "Gallery")]
        title: String,
    },
    /// Validate the descriptor list
    Check,
    /// Save the original of one image under its display name
    Download {
        id: String,
        /// Target directory
        #[arg(long, default_value = "downloads")]
        dir: PathBuf,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Command::Scan => {
            let descriptors = scan::scan(&cli.source)?;
            catalog::save_descriptors(&cli.descriptors, &descriptors)?;
            output::print_scan_output(&descriptors);
            println!("Wrote {}", cli.descriptors.display());
        }
        Command::List(args) => {
            let config = config::load_config(&cli.config)?;
            let descriptors = catalog::load_descriptors(&cli.descriptors)?;
            let mode = if args.infinite {
                PageMode::Infinite
            } else {
                PageMode::Paged
            };
            let query = CatalogQuery {
                search: args.search.clone(),
                sort: args.sort,
                page: args.page.saturating_sub(1),
                per_page: config.catalog.per_page,
                mode,
            };
            let page = query.apply(&descriptors);
            for line in output::format_catalog_page(&page, args.sort, mode, query.per_page) {
                println!("{}", line);
            }
        }
        Command::Process => {
            let config = config::load_config(&cli.config)?;
            let gallery = run_gallery(&cli, &config)?;
            println!("Cache: {}", gallery.cache_stats());
        }
        Command::Build { title } => {
            let config = config::load_config(&cli.config)?;
            println!("==> Processing {}", cli.descriptors.display());
            let gallery = run_gallery(&cli, &config)?;
            println!("Cache: {}", gallery.cache_stats());

            println!("==> Rendering → {}", cli.output.display());
            let summary = render::render_gallery(&gallery, &cli.output, title)?;
            output::print_render_output(&summary);
        }
        Command::Check => {
            let descriptors = catalog::load_descriptors(&cli.descriptors)?;
            let issues = catalog::check_descriptors(&descriptors);
            output::print_check_output(&descriptors, &issues);
            if !issues.is_empty() {
                return Err(format!("{} problem(s) in {}", issues.len(), cli.descriptors.display()).into());
            }
        }
        Command::Download { id, dir } => {
            let config = config::load_config(&cli.config)?;
            let descriptors = catalog::load_descriptors(&cli.descriptors)?;
            let source = DefaultSource::new(&cli.source, config.source.timeout())?;
            let gallery = Gallery::new(descriptors, RustBackend::new(), source, &config);
            let path = gallery.download(id, dir)?;
            println!("Saved {}", path.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Load descriptors and process all of them eagerly, printing progress.
fn run_gallery(
    cli: &Cli,
    config: &GalleryConfig,
) -> Result<Gallery<RustBackend, DefaultSource>, Box<dyn std::error::Error>> {
    init_thread_pool(&config.processing);
    let descriptors = catalog::load_descriptors(&cli.descriptors)?;
    let source = DefaultSource::new(&cli.source, config.source.timeout())?;

    let config = config.for_batch(descriptors.len());

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_gallery_event(&event) {
                println!("{}", line);
            }
        }
    });

    let gallery = Gallery::new(descriptors, RustBackend::new(), source, &config).with_events(tx);
    let summary = gallery.mount();
    // Closes the event channel; the cache stays readable
    gallery.teardown();
    printer.join().map_err(|_| "output thread panicked")?;

    info!(processed = summary.processed, failed = summary.failed, "gallery processed");
    Ok(gallery)
}
