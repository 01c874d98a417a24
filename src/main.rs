use clap::Parser;
use redub::cli::{Cli, Command};
use redub::subtitle;
use redub::workspace::MediaFile;
use redub::{RedubEngine, RedubResult};

fn main() {
    redub::logging::init();

    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run() -> RedubResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Dub(args) => {
            let request = args.to_request()?;
            let engine = RedubEngine::new();
            let report = engine.dub(request)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "dubbed {} segments -> {}",
                    report.segments.len(),
                    report.output_path
                );
            }
            Ok(())
        }
        Command::Parse(args) => {
            let file = MediaFile::new(&args.subtitles);
            let table = subtitle::read_segments(&file, &args.language)?;
            println!("{}", serde_json::to_string_pretty(&table.to_rows())?);
            Ok(())
        }
        Command::Backends => {
            println!(
                "{}",
                serde_json::to_string_pretty(&redub::backend::diagnostics())?
            );
            Ok(())
        }
    }
}
