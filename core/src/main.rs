mod args;
mod backend;
mod commands;
mod helper;
mod options;
mod presenter;
mod throttle;

use std::error::Error;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use args::Args;
use backend::EngineLauncher;
use clap::Parser;
use helper::{Helper, HelperEvent};
use log::{error, info, LevelFilter};
use presenter::ConsolePresenter;
use simplelog::{CombinedLogger, Config, SharedLogger, SimpleLogger, WriteLogger};
use vision::{
    BoardDetector, BoardMonitor, ImageFileSource, MarkupDetector, MarkupFileSource,
    PatternLibrary, SnapshotSource, TemplateDetector,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;
    if let Err(e) = run(&args) {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let (detector, source) = snapshot_pipeline(args)?;

    let mut helper = Helper::new(
        args.helper_options()?,
        Box::new(EngineLauncher::new(args.engine_settings())),
        Box::new(ConsolePresenter::stdout()),
    );
    helper.start()?;

    let events = helper.sender();
    let interrupt = events.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(HelperEvent::Shutdown);
    })?;
    commands::spawn_console(events)?;

    let mut monitor = BoardMonitor::start(
        detector,
        source,
        vec![helper.board_listener()],
        Duration::from_millis(args.poll_ms),
    )?;
    info!("Watching for boards");

    helper.run();

    monitor.stop();
    helper.shutdown();
    Ok(())
}

type Pipeline = (Box<dyn BoardDetector>, Box<dyn SnapshotSource>);

fn snapshot_pipeline(args: &Args) -> Result<Pipeline, Box<dyn Error>> {
    if let Some(image) = &args.image {
        let patterns = Arc::new(PatternLibrary::load(&args.patterns)?);
        info!("Loaded {} piece patterns", patterns.pieces().len());
        let detector = TemplateDetector::new(patterns, args.detector_settings());
        return Ok((Box::new(detector), Box::new(ImageFileSource::new(image))));
    }
    if let Some(markup) = &args.markup {
        return Ok((
            Box::new(MarkupDetector::new()),
            Box::new(MarkupFileSource::new(markup)),
        ));
    }
    Err("Either --image or --markup is required".into())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![SimpleLogger::new(
        args.log_level.into(),
        Config::default(),
    )];
    if let Some(log_file) = &args.log_file {
        loggers.push(WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        ));
    }
    CombinedLogger::init(loggers)?;

    Ok(args)
}
