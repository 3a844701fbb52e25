use clap::{Parser, Subcommand};
use trace_logger::trace::{decode, encode};

#[derive(Parser)]
#[command(name = "traceparent")]
#[command(about = "Generate and inspect W3C traceparent values", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh traceparent
    New {
        /// Set the sampled flag
        #[arg(short, long)]
        sampled: bool,
    },
    /// Decode a traceparent into its parts
    Decode {
        value: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::New { sampled } => {
            println!("{}", encode(sampled));
        }
        Commands::Decode { value } => match decode(&value) {
            Some(trace) => println!("{}", serde_json::to_string_pretty(&trace)?),
            None => {
                eprintln!("Error: '{}' is not a traceparent", value);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
