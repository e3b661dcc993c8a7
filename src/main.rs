mod core;

use anyhow::Result;
use clap::Parser;

use crate::core::params;
use crate::core::pipeline::FlowPipeline;
use crate::core::sink::VideoSink;
use crate::core::source::VideoSource;

const APP_NAME: &str = "flowtrace";

#[derive(Parser)]
#[command(
    name = "flowtrace",
    version,
    about = "Annotates a video with sparse Lucas-Kanade optical flow vectors"
)]
struct Cli {
    /// Input video file
    input: String,
    /// Output video file
    #[arg(default_value = params::DEFAULT_OUTPUT)]
    output: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors go to stderr with status 1; --help and --version
            // stay on stdout with status 0.
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(err) = run(&cli) {
        eprintln!("{}: {:#}", APP_NAME, err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // 1. Open the input and copy its parameters to the output
    let mut source = VideoSource::open(&cli.input)?;
    let meta = *source.meta();
    println!(
        "Opened {} ({}x{} @ {:.2} fps)",
        cli.input, meta.width, meta.height, meta.fps
    );
    let mut sink = VideoSink::create(&cli.output, &meta)?;

    // 2. Read, annotate, write until end of stream
    let mut pipeline = FlowPipeline::new(&meta)?;
    let stats = pipeline.run(&mut source, &mut sink)?;
    sink.finish()?;

    println!(
        "Wrote {} frames ({} flow vectors) to {}",
        stats.frames_written, stats.vectors_drawn, cli.output
    );
    Ok(())
}
