use anyhow::{Context, Result, anyhow};
use clap::Parser;
use dbv::config::{Config, OutputFormat, parse_name_list};
use dbv::logging::{LogFormat, init_logging};
use dbv::render::render;
use dbv::schema::Schema;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;

/// Inspect a database and render its schema as an ER diagram
#[derive(Parser, Debug)]
#[command(name = "dbv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Database URL (postgres://... or sqlite://path)
    #[arg(short, long)]
    database_url: Option<String>,

    /// Output format: mermaid, plantuml, graphviz
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Output file (use - for stdout; default: schema.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include views
    #[arg(short = 'v', long)]
    include_views: bool,

    /// Tables to exclude (comma-separated)
    #[arg(short, long)]
    exclude_tables: Option<String>,

    /// Only include these tables (comma-separated)
    #[arg(short, long)]
    include_tables: Option<String>,

    /// Namespace to inspect on catalog backends (default: public)
    #[arg(short, long)]
    namespace: Option<String>,

    /// YAML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    /// Set log format
    #[arg(long, value_parser = LogFormat::variants().to_vec())]
    log_format: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(output) = self.output {
            config.output.file = Some(output);
        }
        if self.include_views {
            config.schema.include_views = true;
        }
        if let Some(list) = self.include_tables {
            config.schema.include_tables = parse_name_list(&list);
        }
        if let Some(list) = self.exclude_tables {
            config.schema.exclude_tables = parse_name_list(&list);
        }
        if let Some(namespace) = self.namespace {
            config.schema.namespace = Some(namespace);
        }

        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level.as_deref(), cli.log_format.as_deref()) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli) {
        match e.downcast_ref::<dbv::Error>() {
            Some(err) => eprintln!("{}", err.format_detailed()),
            None => eprintln!("Error: {:#}", e),
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    if config.database.url.trim().is_empty() {
        return Err(anyhow!("No database URL given; pass --database-url or set database.url"));
    }
    config.validate()?;

    let schema = dbv::extract(&config.database.url, &config.schema)?;
    let document = render(&schema, config.output.format);

    let file = config.output.resolved_file();
    if file == Path::new("-") {
        io::stdout()
            .write_all(document.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    write_document(&file, &document)?;
    print_summary(&file, config.output.format, &schema);
    Ok(())
}

fn write_document(path: &Path, document: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, document).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = document.len(), "Diagram written");
    Ok(())
}

fn print_summary(path: &Path, format: OutputFormat, schema: &Schema) {
    println!("Schema diagram written to {}", path.display());
    println!("  Format:        {}", format);
    println!("  Tables:        {}", schema.tables.len());
    if !schema.views.is_empty() {
        println!("  Views:         {}", schema.views.len());
    }
    println!("  Relationships: {}", schema.foreign_keys.len());
}
