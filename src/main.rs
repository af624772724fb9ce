use clap::Parser;
use cursus::{error::run_with_error_handler, run};

/// Plays a course in the terminal and keeps progress in sync with the backend.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Course to open
    #[arg(long)]
    course: u64,
}

#[tokio::main]
#[tracing::instrument]
async fn main() {
    let args = Args::parse();
    run_with_error_handler(async || run(args.course).await).await;

    // the blocking stdin read can't be cancelled and would hold runtime shutdown
    std::process::exit(0);
}
