use clap::Parser;

use growthsim::api::cli::{Cli, Command, run_simulate};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = growthsim::logging::init_logging(&cli.log_level) {
        eprintln!("Logging setup failed: {e}");
    }

    match cli.command {
        Command::Serve { port } => {
            if let Err(e) = growthsim::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Simulate(args) => match run_simulate(&args) {
            Ok(output) => print!("{output}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(2);
            }
        },
    }
}
