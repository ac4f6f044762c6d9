use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "ghostbridge",
    version,
    about = "Stand up a ghost bridge and print its bootstrap values"
)]
pub struct Cli {
    /// Tracing filter, e.g. "info" or "ghostbridge=debug"
    #[arg(long, env = "GHOSTBRIDGE_LOG", default_value = "info")]
    pub log_level: String,

    /// How to print the bootstrap values
    #[arg(long, env = "GHOSTBRIDGE_FORMAT", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single JSON object: {"port", "cert", "token"}
    Json,
    /// Human-readable lines followed by the PEM block
    Text,
}
