/// Panorama to point cloud converter main entry point
mod cli;

use clap::Parser;
use cli::Args;
use pano_point_cloud::{ConversionReport, PanoramaConverter, PipelineError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pano_point_cloud=info,pano2points=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {} stage failed: {}", err.kind(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ConversionReport, PipelineError> {
    let config = args.into_config()?;
    let converter = PanoramaConverter::new(config)?;
    converter.convert()
}

fn print_summary(report: &ConversionReport) {
    println!(
        "Generated {} points ({} candidates at {}x{})",
        report.point_count, report.candidate_points, report.width, report.height
    );
    println!("Point cloud saved to: {}", report.output.display());

    if let Some(preview) = &report.preview {
        println!("Dither preview saved to: {}", preview.display());
    }
    if let Some(metadata) = &report.metadata {
        println!("Run metadata saved to: {}", metadata.display());
    }
}
