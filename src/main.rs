use clap::Parser;
use code_docgen::{
    analyzer::RetryingAnalyzer, config::Config, llm::get_llm, pipeline::document_archive,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::Write;
use std::{io, path::PathBuf};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Generate markdown documentation for a zipped project", long_about = None)]
struct Args {
    /// Zip archive containing the project
    archive: PathBuf,

    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[clap(short, long)]
    llm_provider: Option<String>,

    /// Markdown file to write, overriding the configured output location
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[clap(short, long)]
    yes: bool,

    /// Also print each file's documentation to stdout
    #[clap(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let config = Config::load_or_default(&args.config)?;

    // The CLI flag wins over LLM_PROVIDER and the config file
    let llm = get_llm(&config, args.llm_provider.as_deref())?;

    println!("Starting documentation task");
    println!("Using LLM model: {}", llm.model_name());
    println!("Archive to document: {}", args.archive.display());

    if !args.yes {
        print!("Do you want to proceed? (y/n): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim().to_lowercase() != "y" {
            warn!("User aborted the operation");
            return Ok(());
        }
    }

    let analyzer = RetryingAnalyzer::new(llm, &config);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let run = document_archive(&args.archive, &analyzer, &config, args.output, &pb).await?;
    pb.finish_with_message("Analysis complete");

    if args.print {
        for entry in &run.entries {
            println!("## Documentation for: {}\n", entry.path.display());
            println!("{}\n", entry.result.text());
        }
    }

    match run.output {
        Some(path) => {
            info!("Documentation for {} is ready", run.project_name);
            println!("You can find the documentation at: {}", path.display());
        }
        None => warn!("The archive contained no files to document"),
    }

    Ok(())
}
