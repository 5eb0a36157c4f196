use std::{
    io,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::Parser;
use log::{error, info, warn};
use rtrb::RingBuffer;
use sonifier::{
    config::{Cli, SonifierConfig},
    constants::CONTROL_QUEUE_CAPACITY,
    control::terminal::spawn_terminal_surface,
    device_manager::open_sink,
    error::PipelineError,
    event_loop::EventLoop,
    hwif::LineChannel,
    source::process::ProcessSource,
};

fn main() -> ExitCode {
    // stderr belongs to the hwif channel
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let config = match Cli::try_parse() {
        Ok(cli) => cli.into_config(),
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            error!("{}", e.render());
            return ExitCode::FAILURE;
        }
    };

    let status = match run(&config) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    };
    info!("exiting with status {status}");
    ExitCode::from(status)
}

fn run(config: &SonifierConfig) -> Result<(), PipelineError> {
    let sink = open_sink(config)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = Arc::clone(&interrupt);
        if let Err(e) = ctrlc::set_handler(move || interrupt.store(true, Ordering::Relaxed)) {
            warn!("failed to install signal handler: {e}");
        }
    }

    let (producer, consumer) = RingBuffer::new(CONTROL_QUEUE_CAPACITY);
    // Detached: it blocks on stdin and ends with the process.
    spawn_terminal_surface(io::BufReader::new(io::stdin()), producer)
        .map_err(PipelineError::Surface)?;

    let source = ProcessSource::new(config.source.clone(), config.source_args.clone());
    info!(
        "source {} {}, channel {}, gain {:.1}{}",
        config.source.display(),
        config.source_args.join(" "),
        config.initial_channel,
        config.initial_gain.value(),
        if config.gain_control { "" } else { " (fixed)" }
    );

    let mut event_loop = EventLoop::new(config, source, sink, LineChannel::stderr(), consumer)
        .with_interrupt(interrupt);
    event_loop.run()
}
