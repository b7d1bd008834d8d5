use clap::{Parser, Subcommand};
use sharecard::background::generator;
use sharecard::background::prompt::build_prompt;
use sharecard::cache::compute_key;
use sharecard::pipeline::Pipeline;
use sharecard::style::select_style;
use sharecard::types::ContentItem;
use sharecard::{config, output, types};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("SHARECARD_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("SHARECARD_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sharecard")]
#[command(about = "Illustrated social-share images for tutorial series")]
#[command(long_about = "\
Illustrated social-share images for tutorial series

Each item (title, series, identifier) becomes one JPEG: an AI illustration
in a style picked from the identifier, a legibility gradient, and the title,
series badge and branding on top. Backgrounds are cached by content identity,
so re-running over unchanged items makes no generation calls.

Items file (JSON):

  [
    { \"title\": \"Mastering Arrays\", \"series\": \"php-basics\", \"identifier\": \"06\" },
    { \"title\": \"Series Overview\", \"series\": \"php-basics\", \"identifier\": \"overview\" }
  ]

Output layout:

  share/
  ├── .cache/
  │   ├── manifest.json            # cache key → background file
  │   └── bg-<sha256>.png          # generation-size backgrounds
  └── php-basics/
      ├── php-basics-06.jpg
      └── php-basics-overview.jpg

When generation fails or --offline is given, backgrounds fall back to a
gradient in the series colours. Set the API key variable named in the config
(GEMINI_API_KEY by default) to enable generation.

Run 'sharecard gen-config' to generate a documented sharecard.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Debug logging (otherwise RUST_LOG, default info)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct GenerateArgs {
    /// JSON file with the items to render
    #[arg(long)]
    items: PathBuf,

    /// Output root for images and the background cache
    #[arg(long, default_value = "share")]
    output: PathBuf,

    /// Ignore cached backgrounds and regenerate every one
    #[arg(long)]
    force: bool,

    /// Never call the image generator; use gradient backgrounds on cache misses
    #[arg(long)]
    offline: bool,
}

#[derive(clap::Args, Clone)]
struct PreviewArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    series: String,
    #[arg(long)]
    identifier: String,
}

#[derive(Subcommand)]
enum Command {
    /// Render share images for every item in a batch
    Generate(GenerateArgs),
    /// Show the style, cache key and prompt for one item without generating
    Preview(PreviewArgs),
    /// Print a stock sharecard.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate(args) => {
            let config = config::load_config(&cli.config)?;
            let items = types::read_items(&args.items)?;
            let generator = generator::from_config(&config.generator, args.offline)?;
            let pipeline =
                Pipeline::new(&config, generator.as_ref(), &args.output).force(args.force);

            println!(
                "==> Generating {} share images → {}",
                items.len(),
                args.output.display()
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_item_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = pipeline.run_batch(&items, Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            output::print_summary(&result?);
        }
        Command::Preview(args) => {
            let config = config::load_config(&cli.config)?;
            let series = config
                .series(&args.series)
                .ok_or_else(|| format!("unknown series {:?}", args.series))?;
            let item = ContentItem::new(args.title, args.series, args.identifier);
            let style = select_style(&item.title, &item.identifier);
            let key = compute_key(&item.title, &item.series, &item.identifier);
            let prompt = build_prompt(&style, &series, config.generation_size());
            output::print_preview(&item, &style, &key, &prompt);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Tracing to stderr so stdout stays the operator-facing report.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
