use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oas_jsonschema_core::{
    to_json_schema, NormalizeOptions, Oas, ParameterSchemaOptions, ResponseSchemaOptions,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "oas-jsonschema")]
#[command(about = "Dereference OpenAPI documents and project their operations into JSON Schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a single OpenAPI schema into JSON Schema
    Normalize {
        /// Input schema file
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop readOnly properties
        #[arg(long)]
        hide_read_only: bool,

        /// Drop writeOnly properties
        #[arg(long)]
        hide_write_only: bool,

        /// Append enum values to each description
        #[arg(long)]
        enums_in_description: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Inline every local $ref in an OpenAPI document
    Dereference {
        /// Input OpenAPI document
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Group an operation's parameters and request body into schema bundles
    Params {
        /// Input OpenAPI document
        input: PathBuf,

        /// Path template, e.g. /pets/{petId}
        #[arg(long)]
        path: String,

        /// HTTP method
        #[arg(short, long)]
        method: String,

        /// Keep deprecated properties inline
        #[arg(long)]
        retain_deprecated: bool,

        /// Merge every non-body bundle into one metadata bundle
        #[arg(long)]
        merge_metadata: bool,

        /// Attach components when discriminator mappings reference them
        #[arg(long)]
        include_discriminator_refs: bool,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Project one response of an operation into schema bundles
    Response {
        /// Input OpenAPI document
        input: PathBuf,

        /// Path template, e.g. /pets/{petId}
        #[arg(long)]
        path: String,

        /// HTTP method
        #[arg(short, long)]
        method: String,

        /// Status code, e.g. 200 or default
        #[arg(short, long)]
        status: String,

        /// Attach components when discriminator mappings reference them
        #[arg(long)]
        include_discriminator_refs: bool,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Find the operation a request URL addresses
    Match {
        /// Input OpenAPI document
        input: PathBuf,

        /// Full request URL
        url: String,

        /// HTTP method
        #[arg(short, long, default_value = "get")]
        method: String,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Normalize {
            input,
            output,
            hide_read_only,
            hide_write_only,
            enums_in_description,
            format,
        } => {
            let schema = read_json(&input)?;
            let options = NormalizeOptions {
                hide_read_only_properties: hide_read_only,
                hide_write_only_properties: hide_write_only,
                add_enums_to_descriptions: enums_in_description,
                ..NormalizeOptions::default()
            };
            write_json(&to_json_schema(&schema, &options), output.as_ref(), format)?;
        }
        Commands::Dereference {
            input,
            output,
            format,
        } => {
            let oas = load_document(&input)?;
            let api = oas.dereference().await.context("Dereference failed")?;
            write_json(api.as_ref(), output.as_ref(), format)?;
        }
        Commands::Params {
            input,
            path,
            method,
            retain_deprecated,
            merge_metadata,
            include_discriminator_refs,
            output,
            format,
        } => {
            let oas = load_document(&input)?;
            oas.dereference().await.context("Dereference failed")?;
            let operation = oas.get_operation(&path, &method)?;

            let options = ParameterSchemaOptions {
                retain_deprecated_properties: retain_deprecated,
                merge_into_body_and_metadata: merge_metadata,
                include_discriminator_mapping_refs: include_discriminator_refs,
                ..ParameterSchemaOptions::default()
            };
            let bundles = operation
                .parameters_as_json_schema(&options)
                .unwrap_or_default();
            write_json(&bundles, output.as_ref(), format)?;
        }
        Commands::Response {
            input,
            path,
            method,
            status,
            include_discriminator_refs,
            output,
            format,
        } => {
            let oas = load_document(&input)?;
            oas.dereference().await.context("Dereference failed")?;
            let operation = oas.get_operation(&path, &method)?;

            let options = ResponseSchemaOptions {
                include_discriminator_mapping_refs: include_discriminator_refs,
            };
            let Some(bundles) = operation.response_as_json_schema(&status, &options) else {
                bail!("No response schema for status {status} of {method} {path}");
            };
            write_json(&bundles, output.as_ref(), format)?;
        }
        Commands::Match {
            input,
            url,
            method,
            output,
            format,
        } => {
            let oas = load_document(&input)?;
            let Some(found) = oas.find_operation(&url, &method) else {
                bail!("No operation matches {method} {url}");
            };
            write_json(&found, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse JSON from: {}", path.display()))
}

fn load_document(path: &Path) -> Result<Oas> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    Oas::from_json(&text)
        .with_context(|| format!("Failed to load OpenAPI document from: {}", path.display()))
}

fn write_json<T: serde::Serialize + ?Sized>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
