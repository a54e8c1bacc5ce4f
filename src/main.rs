mod cli;
mod config;
mod domain;
mod infra;
mod report;
mod workflows;

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::LevelFilter;

use cli::Cli;
use config::GrabberConfig;
use infra::nfo::NfoReader;
use infra::opensubtitles::OpenSubtitlesClient;
use infra::release_parser::ReleaseNameParser;
use infra::scanner;
use workflows::batch::BatchRunner;
use workflows::grabber::SubtitleGrabber;
use workflows::matchers::FilenameMatcher;

fn init_logger() {
    if std::env::var("RUST_LOG").is_ok() {
        Builder::from_env(Env::default()).init();
    } else {
        Builder::new()
            .filter_level(LevelFilter::Warn)
            .filter_module("subsgrab", LevelFilter::Info)
            .init();
    }
}

fn main() {
    init_logger();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.directory.is_dir() {
        bail!("Not a directory: {}", cli.directory.display());
    }

    let mut config = GrabberConfig::new(cli.languages.0.clone());
    println!("\nGrabbing subtitles for media at {}", cli.directory.display());

    let assets = scanner::discover_assets(&cli.directory, &config.subtitle_extension)?;
    if assets.is_empty() {
        println!("No nfo files found under {}", cli.directory.display());
        return Ok(());
    }

    let settings = config::load_settings()?;
    config.fetch_all_languages = cli.all_languages || settings.fetch_all_languages;
    config.multi_file_support = cli.multi_file || settings.multi_file_support;

    let mut client = OpenSubtitlesClient::new(settings.credentials);
    client.login()?;

    println!("Languages: {}", cli.languages.names().join(", "));

    let grabber = SubtitleGrabber::new(
        client,
        NfoReader,
        FilenameMatcher::new(ReleaseNameParser),
        config,
    );
    let mut runner = BatchRunner::new(grabber);
    let report = runner.run(&assets, report::print_outcome);
    report::print_summary(&report);

    Ok(())
}
