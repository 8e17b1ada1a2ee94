use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use docmeta_cli::{default_output_path, guess_content_type};
use docmeta_core::{
    DocumentImporter, ImportResponse, ImportStatus, ImporterConfig, Metadata, AVAILABLE_HANDLERS,
    DOC_CONTENT_TYPE,
};

#[derive(Parser)]
#[command(name = "docmeta")]
#[command(about = "Run a document metadata handler pipeline over a file")]
struct Args {
    /// Path to the document to import
    #[arg(short, long, required_unless_present = "show_handlers")]
    input: Option<String>,

    /// Path to the pipeline config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON file with the initial metadata (field -> value or list of values)
    #[arg(short, long)]
    metadata: Option<String>,

    /// Document reference (defaults to the input path)
    #[arg(short, long)]
    reference: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Time every handler and print a summary
    #[arg(long)]
    profile: bool,

    /// List the configured pipeline (or every available handler) and exit
    #[arg(long)]
    show_handlers: bool,

    /// Debug logging from the handlers (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    println!("🦀 Docmeta Document Importer");

    let config = match &args.config {
        Some(path) => {
            let config = ImporterConfig::load_from_file(path)?;
            println!("📋 Loaded config from: {} ({} handlers)", path, config.handler_count());
            config
        }
        None => {
            println!("📋 Using default config (no handlers)");
            ImporterConfig::default()
        }
    };

    if args.show_handlers {
        show_handlers(&config, args.config.is_some());
        return Ok(());
    }

    // clap only lets a missing input through with --show-handlers
    let Some(input) = args.input.as_deref() else {
        return Ok(());
    };

    // Check if input file exists
    if !Path::new(input).exists() {
        println!("⚠️  Input document not found at: {}", input);
        println!("   Please check the file path.");
        std::process::exit(1);
    }

    let content = std::fs::read(input).with_context(|| format!("Failed to read input {}", input))?;
    let mut metadata = load_metadata(args.metadata.as_deref())?;
    if !metadata.contains(DOC_CONTENT_TYPE) {
        if let Some(content_type) = guess_content_type(Path::new(input)) {
            metadata.set(DOC_CONTENT_TYPE, vec![content_type.to_string()]);
        }
    }
    let reference = args.reference.clone().unwrap_or_else(|| input.to_string());

    println!("📄 Importing: {}", reference);

    let importer = DocumentImporter::new(config).with_profiling(args.profile);
    match importer.import_document(&reference, content, metadata) {
        Ok(response) => {
            print_outcome(&response);

            let output_path = args
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(input, args.config.as_deref()));
            save_response(&response, &output_path)?;
        }
        Err(e) => {
            eprintln!("❌ Import failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_metadata(path: Option<&str>) -> Result<Metadata> {
    let Some(path) = path else {
        return Ok(Metadata::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file {}", path))?;
    let metadata: Metadata = serde_json::from_str(&json)
        .with_context(|| format!("Invalid metadata file {}", path))?;
    println!("🏷️  Loaded {} metadata fields from: {}", metadata.len(), path);
    Ok(metadata)
}

fn show_handlers(config: &ImporterConfig, configured: bool) {
    if configured {
        println!("\n🔗 Configured pipeline (parser: {:?}):", config.parser);
        for (i, (phase, kind, name)) in config.describe().into_iter().enumerate() {
            println!("  {:>2}. {:<11} {:<12} {}", i + 1, phase, kind, name);
        }
        return;
    }

    println!("\n📋 Available handlers:");
    for (kind, name) in AVAILABLE_HANDLERS {
        println!("  {:<12} {}", kind, name);
    }

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i page.html -c pipeline.yaml");
    println!("  cargo run -- -i rows.csv -c csv.yaml -m initial.json -o out.json");
    println!("  cargo run -- -c pipeline.yaml --show-handlers");
}

fn print_outcome(response: &ImportResponse) {
    let documents = response.flatten();
    let accepted = documents.iter().filter(|d| d.status.is_accepted()).count();

    match &response.status {
        ImportStatus::Accepted => println!("✅ Document accepted"),
        ImportStatus::Rejected { filter } => println!("🚫 Document rejected by {}", filter),
    }
    println!("📊 Import metrics:");
    println!("   - Metadata fields: {}", response.metadata.len());
    println!("   - Content characters: {}", response.content_text().chars().count());
    println!("   - Child documents: {} ({} accepted overall)", documents.len() - 1, accepted);
}

fn save_response(response: &ImportResponse, output_path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(response)?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write output {}", output_path))?;
    println!("💾 Results saved to: {}", output_path);
    Ok(())
}
