use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use preserve_blank_lines::config::{ENV_HEIGHT_PER_BLANK, ENV_MAX_BLANKS, ENV_UNIT};
use preserve_blank_lines::{
    BlankLineOptions, BlankRunTransformer, Config, ConfigSources, PreprocessorChain,
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Parser)]
#[command(
    name = "preserve-blank-lines",
    version,
    about = "Turn extra blank lines in Markdown into sized spacers",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true, help = "Config file path")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Profile name")]
    profile: Option<String>,

    #[arg(long, global = true, help = "Read extension options from an mkdocs.yml")]
    mkdocs: Option<PathBuf>,

    #[arg(long, global = true, help = "Units of height per extra blank line")]
    height_per_blank: Option<String>,

    #[arg(long, global = true, help = "CSS unit (em, rem, px, ...)")]
    unit: Option<String>,

    #[arg(long, global = true, help = "Maximum blank lines counted per run")]
    max_blanks: Option<String>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Verbose logging")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Transform one Markdown document
    Process {
        #[arg(help = "Input file (stdin when omitted)")]
        input: Option<PathBuf>,
        #[arg(short, long, help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,
    },
    /// Transform and render one document to HTML
    Render {
        #[arg(help = "Input file (stdin when omitted)")]
        input: Option<PathBuf>,
        #[arg(short, long, help = "Output file (stdout when omitted)")]
        output: Option<PathBuf>,
    },
    /// Copy a docs tree and transform every Markdown file in the copy
    Batch {
        #[arg(long, help = "Source directory [default: docs]")]
        src: Option<PathBuf>,
        #[arg(long, help = "Destination directory, replaced if present [default: docs_temp]")]
        dst: Option<PathBuf>,
        #[arg(long, value_delimiter = ',', help = "Markdown extensions [default: md]")]
        extensions: Option<Vec<String>>,
        #[arg(long, help = "Pretty-print JSON report")]
        pretty: bool,
    },
    Config(ConfigCommand),
}

#[derive(Parser)]
struct ConfigCommand {
    #[command(subcommand)]
    subcommand: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    Init {
        #[arg(long)]
        global: bool,
    },
    Show,
    Path {
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let sources = ConfigSources {
        config_path: cli.config.as_deref(),
        profile: cli.profile.as_deref(),
        mkdocs_path: cli.mkdocs.as_deref(),
        overrides: BlankLineOptions::from_strings(cli.height_per_blank, cli.unit, cli.max_blanks),
    };

    match cli.command {
        Command::Config(cmd) => handle_config(cmd, sources),
        Command::Process { input, output } => {
            let config = Config::load(sources)?;
            let transformer = BlankRunTransformer::new(config.settings());
            let text = read_input(input.as_deref()).await?;
            let (result, spacers) = transformer.transform_counted(&text);
            tracing::info!("Inserted {} spacers", spacers);
            write_output(output.as_deref(), &result).await
        }
        Command::Render { input, output } => {
            let config = Config::load(sources)?;
            let chain = PreprocessorChain::with_blank_lines(BlankRunTransformer::new(
                config.settings(),
            ));
            let text = read_input(input.as_deref()).await?;
            let html = preserve_blank_lines::render_html(&text, &chain);
            write_output(output.as_deref(), &html).await
        }
        Command::Batch {
            src,
            dst,
            extensions,
            pretty,
        } => {
            let config = Config::load(sources)?;
            let mut options = config.batch_options();
            if let Some(src) = src {
                options.src_dir = src;
            }
            if let Some(dst) = dst {
                options.dst_dir = dst;
            }
            if let Some(extensions) = extensions.filter(|e| !e.is_empty()) {
                options.extensions = extensions;
            }

            let report = preserve_blank_lines::process_tree(&options, config.settings()).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);
            Ok(())
        }
    }
}

fn handle_config(cmd: ConfigCommand, sources: ConfigSources<'_>) -> Result<()> {
    match cmd.subcommand {
        ConfigSubcommand::Init { global } => {
            let path = Config::init_config(global)?;
            println!("Created config file: {:?}", path);
            Ok(())
        }
        ConfigSubcommand::Show => {
            let config = Config::load(sources)?;
            let settings = config.settings();
            println!("# Effective settings");
            println!("# height_per_blank = {}", settings.height_per_blank());
            println!("# unit = {:?}", settings.unit());
            println!("# max_blanks = {}", settings.max_blanks());
            println!();
            println!("{}", toml::to_string_pretty(&config)?);

            println!("# Environment variables:");
            for key in [ENV_HEIGHT_PER_BLANK, ENV_UNIT, ENV_MAX_BLANKS] {
                println!(
                    "#   {}: {}",
                    key,
                    std::env::var(key).unwrap_or_else(|_| "(not set)".to_string())
                );
            }
            Ok(())
        }
        ConfigSubcommand::Path { global } => {
            let path = if global {
                Config::global_config_path()
            } else {
                Config::project_config_path().or_else(Config::global_config_path)
            };

            let path = path.ok_or_else(|| anyhow::anyhow!("Config file not found"))?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path)),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

async fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write {:?}", path)),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(content.as_bytes()).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}
