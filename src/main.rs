mod app;
mod camera;
mod config;
mod event;
mod headless;
mod tileset;
mod viewport;


use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{Receiver, select, unbounded};

use app::App;
use config::EngineConfig;
use event::Event;
use headless::{HeadlessBackend, JsonLinesTransport, ScriptMsg, parse_script_line};
use tileset::Tileset;

#[derive(Debug, Parser)]
#[command(
    name = "sweep",
    about = "Headless driver for the infinite-canvas tile viewport",
    version
)]
struct Cli {
    /// Engine tuning (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile atlas offsets (JSON object of id -> [x, y]).
    #[arg(long)]
    tileset: PathBuf,

    /// Replay script, one action batch or input op per line. `-` reads stdin.
    #[arg(long, default_value = "-")]
    actions: String,

    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Frames to run after the script ends.
    #[arg(long, default_value_t = 1)]
    frames: u64,

    #[arg(long, default_value_t = 800)]
    width: i32,

    #[arg(long, default_value_t = 600)]
    height: i32,

    /// Drive frames from the wall clock instead of the script's `wait` ops.
    #[arg(long)]
    realtime: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("sweep: cannot initialise logging: {}", e);
        std::process::exit(2);
    }
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("sweep: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            simplelog::WriteLogger::init(
                simplelog::LevelFilter::Debug,
                simplelog::Config::default(),
                file,
            )?;
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Stderr)
                .init();
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let cfg = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let tileset = Tileset::from_path(&cli.tileset, cfg.texture_size)?;
    let frame_ms = cfg.frame_ms;
    let backend = HeadlessBackend::new(cli.width, cli.height);
    let transport = JsonLinesTransport::new(io::stdout().lock());
    let mut app = App::new(cfg, tileset, backend, transport);

    let rx = spawn_reader(&cli.actions)?;
    app.push(Event::Connected);

    let mut now_ms = if cli.realtime {
        run_realtime(&mut app, &rx, frame_ms)
    } else {
        run_replay(&mut app, &rx, frame_ms)
    };
    for _ in 0..cli.frames {
        app.frame(now_ms);
        now_ms += frame_ms;
    }

    let pool = app.pool.stats();
    log::info!(
        target: "events",
        "done: {} frames, {} actions applied, {} rejected, {} taps dropped, {} messages; pool {:?}",
        app.stats.frames,
        app.stats.actions_applied,
        app.stats.actions_rejected,
        app.stats.taps_dropped,
        app.stats.messages_sent,
        pool
    );
    log::debug!(target: "events", "events by label: {:?}", app.events_by_label());
    log::debug!(target: "events", "visible chunks: {:?}", app.backend.visible_labels());
    app.backend.log_summary();
    Ok(())
}

type HeadlessApp<'a> = App<HeadlessBackend, JsonLinesTransport<io::StdoutLock<'a>>>;

/// Reads the script on its own thread; parsed lines arrive over the channel.
fn spawn_reader(source: &str) -> Result<Receiver<ScriptMsg>, Box<dyn Error>> {
    let reader: Box<dyn BufRead + Send> = if source == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(source)?))
    };
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("sweep-reader".into())
        .spawn(move || {
            for (n, line) in reader.lines().enumerate() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        log::warn!(target: "stream", "read failed after line {}: {}", n, e);
                        break;
                    }
                };
                match parse_script_line(&line) {
                    Ok(Some(msg)) => {
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!(target: "stream", "line {}: {}", n + 1, e),
                }
            }
        })?;
    Ok(rx)
}

/// Feeds one script message into the app. Returns the virtual time to let pass.
fn dispatch(app: &mut HeadlessApp<'_>, msg: ScriptMsg, now_ms: u64) -> u64 {
    match msg {
        ScriptMsg::Batch { actions, rejected } => {
            app.push(Event::ActionsReceived { actions, rejected });
        }
        ScriptMsg::Pointer(input) => {
            app.push(Event::Pointer { input, time_ms: now_ms });
        }
        ScriptMsg::Resize { width, height } => app.backend.set_size(width, height),
        ScriptMsg::Connect => {
            app.push(Event::Connected);
        }
        ScriptMsg::Wait { ms } => return ms,
    }
    0
}

// Deterministic: frames advance only on `wait` ops, in fixed steps.
fn run_replay(app: &mut HeadlessApp<'_>, rx: &Receiver<ScriptMsg>, frame_ms: u64) -> u64 {
    let mut now_ms = 0;
    while let Ok(msg) = rx.recv() {
        let wait = dispatch(app, msg, now_ms);
        for _ in 0..wait.div_ceil(frame_ms) {
            app.frame(now_ms);
            now_ms += frame_ms;
        }
    }
    now_ms
}

fn run_realtime(app: &mut HeadlessApp<'_>, rx: &Receiver<ScriptMsg>, frame_ms: u64) -> u64 {
    let start = Instant::now();
    let ticker = crossbeam_channel::tick(Duration::from_millis(frame_ms));
    let elapsed = |start: Instant| start.elapsed().as_millis() as u64;
    loop {
        select! {
            recv(rx) -> msg => match msg {
                Ok(msg) => {
                    dispatch(app, msg, elapsed(start));
                }
                Err(_) => break,
            },
            recv(ticker) -> _ => app.frame(elapsed(start)),
        }
    }
    elapsed(start)
}
