// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};

mod payload;

use crate::payload::{parse_payload, PayloadEncoding};
use lorabin_app::{init_logging, ConfigFile, DecodeConfig, LorabinConfig};
use lorabin_core::{
    Decoder, FlagWidth, ParseOptions, PayloadDecoder, Template, TypeDescriptor,
    UnknownTypePolicy,
};

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - ", env!("CARGO_PKG_DESCRIPTION"));

#[derive(Debug, Parser)]
#[command(
    name = "lorabin",
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION
)]
struct Cli {
    /// Payload text, or '-' to read it from stdin
    #[arg(
        value_name = "PAYLOAD",
        required_unless_present_any = ["print_config", "layout"]
    )]
    payload: Option<String>,
    /// Encoding of the payload text
    #[arg(short = 'e', long = "encoding", value_enum, default_value_t = PayloadEncoding::Hex)]
    encoding: PayloadEncoding,
    /// JSON field template, e.g. '{"id":14,"temp":14.1,"ok":true}'
    #[arg(short = 't', long = "template", conflicts_with = "template_file")]
    template: Option<String>,
    /// Read the JSON field template from a file
    #[arg(long = "template-file", value_name = "PATH")]
    template_file: Option<PathBuf>,
    /// Width of the trailing boolean flag region (0, 1, 2, 4 or 8 bytes)
    #[arg(short = 'f', long = "flag-bytes")]
    flag_bytes: Option<u64>,
    /// Fail on template fields with unrecognized type markers
    #[arg(long = "strict")]
    strict: bool,
    /// Path to a lorabin.toml configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
    /// Pretty-print the decoded JSON record
    #[arg(long = "pretty")]
    pretty: bool,
    /// Print the field layout of the template instead of decoding
    #[arg(long = "layout")]
    layout: bool,
    /// Print an example configuration file and exit
    #[arg(long = "print-config")]
    print_config: bool,
}

fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", LorabinConfig::example_toml());
        return Ok(());
    }

    let (cfg, cfg_path) = match &cli.config {
        Some(path) => (LorabinConfig::load_from_file(path)?, Some(path.clone())),
        None => LorabinConfig::load_from_default_paths()?,
    };

    init_logging(
        cli.log_level
            .as_deref()
            .or(cfg.general.log_level.as_deref()),
    );
    if let Some(path) = &cfg_path {
        info!("Loaded configuration from {}", path.display());
    }

    let options = parse_options(&cli, &cfg.decode)?;
    let schema = resolve_schema(&cli, cfg.decode.template.as_deref())?;
    let decoder = Decoder::from_schema(&schema, &options)?;

    if cli.layout {
        print!("{}", render_layout(decoder.template()));
        return Ok(());
    }

    let text = match cli.payload.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(text) => text.to_string(),
        None => return Err("No payload given".into()),
    };
    let bytes = parse_payload(&text, cli.encoding)?;
    debug!("Payload: {} bytes", bytes.len());

    let record = decoder.decode(&bytes)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{}", json);
    Ok(())
}

/// Config decode options with CLI overrides applied.
fn parse_options(cli: &Cli, cfg: &DecodeConfig) -> DynResult<ParseOptions> {
    let mut options = cfg.parse_options()?;
    if let Some(n) = cli.flag_bytes {
        options.flag_width = FlagWidth::try_from(n)?;
    }
    if cli.strict {
        options.unknown_types = UnknownTypePolicy::Strict;
    }
    Ok(options)
}

/// Pick the template from the CLI, a template file, or the config, in that order.
fn resolve_schema(cli: &Cli, configured: Option<&str>) -> DynResult<String> {
    if let Some(schema) = &cli.template {
        return Ok(schema.clone());
    }
    if let Some(path) = &cli.template_file {
        let schema = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read template {}: {}", path.display(), e))?;
        return Ok(schema);
    }
    let schema =
        configured.ok_or("No template given (use --template, --template-file or config)")?;
    Ok(schema.to_string())
}

/// One line per field: main-region offset, type and name, then the flag region.
fn render_layout(template: &Template) -> String {
    let mut out = String::new();
    let mut bit = 0;
    for (field, (_, offset)) in template.fields().iter().zip(template.offsets()) {
        let at = match field.kind {
            TypeDescriptor::Boolean => {
                bit += 1;
                format!("bit {:>2}", bit - 1)
            }
            _ => format!("{:>6}", offset),
        };
        out.push_str(&format!("{}  {:<12} {}\n", at, field.kind.to_string(), field.key));
    }
    out.push_str(&format!(
        "{} payload bytes + {} flag bytes\n",
        template.payload_width(),
        template.flag_width()
    ));
    out
}
