use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Args, Parser, Subcommand};
use colorsum_contracts::chat::{parse_intent, Intent, CHAT_HELP_COMMANDS};
use colorsum_contracts::events::EventSink;
use colorsum_contracts::export::ExportFormat;
use colorsum_contracts::palette::{PaletteColor, PaletteResult};
use colorsum_contracts::params::{ParameterModel, MAX_SIDE_STEP};
use colorsum_engine::acquisition::{format_megabytes, DEFAULT_MAX_UPLOAD_BYTES};
use colorsum_engine::{
    non_empty_env, AcquisitionPolicy, ClientConfig, PaletteService, PreviewResourceManager,
    Session, SessionState, SummarizationClient, SummarizeError,
};

#[derive(Debug, Parser)]
#[command(
    name = "colorsum",
    version,
    about = "Summarize an image into its dominant color palette"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session: pick an image, tune knobs, submit, export.
    Chat(ChatArgs),
    /// One-shot: summarize a single image and write the exports.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// Palette service endpoint (default: $COLORSUM_API_URL or the local dev server)
    #[arg(long)]
    api_url: Option<String>,
    /// Request timeout in seconds (default: $COLORSUM_TIMEOUT_S or 120)
    #[arg(long)]
    timeout_s: Option<f64>,
    /// Largest accepted image in MiB (default: $COLORSUM_MAX_UPLOAD_MB or 10)
    #[arg(long)]
    max_upload_mb: Option<f64>,
    /// Number of colors to extract, 3-12
    #[arg(long, default_value = "6")]
    k: String,
    /// Longest side the service resizes to, 128-2048
    #[arg(long, default_value = "512")]
    max_side: String,
    /// Directory exports are written to
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Append session events as JSON lines to this file
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[arg(long)]
    image: PathBuf,
    /// json, css or all
    #[arg(long, default_value = "all")]
    format: String,
    #[command(flatten)]
    session: SessionArgs,
}

/// Everything the worker thread or stdin reader can hand to the session.
enum UiEvent {
    Line(String),
    InputClosed,
    Completed(Result<PaletteResult, SummarizeError>),
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("colorsum error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Run(args) => run_once(args),
    }
}

fn build_session(args: &SessionArgs) -> Session {
    let mut params = ParameterModel::new();
    params.set_color_count(&args.k);
    params.set_max_side(&args.max_side);
    let events = match &args.events {
        Some(path) => EventSink::to_file(path),
        None => EventSink::disabled(),
    };
    Session::new(
        params,
        AcquisitionPolicy::new(max_upload_bytes(args.max_upload_mb)),
        PreviewResourceManager::new(),
        events,
    )
}

fn client_config(args: &SessionArgs) -> ClientConfig {
    ClientConfig::from_env()
        .with_endpoint(args.api_url.as_deref())
        .with_timeout_s(args.timeout_s)
}

fn max_upload_bytes(cli_mb: Option<f64>) -> u64 {
    cli_mb
        .or_else(|| {
            non_empty_env("COLORSUM_MAX_UPLOAD_MB").and_then(|value| value.parse::<f64>().ok())
        })
        .filter(|value| value.is_finite() && *value > 0.0)
        .map(|mb| (mb * 1024.0 * 1024.0) as u64)
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let config = client_config(&args.session);
    let service: Arc<dyn PaletteService> = Arc::new(SummarizationClient::new(&config)?);
    let out_dir = args.session.out.clone();
    let mut session = build_session(&args.session);

    let (tx, rx) = mpsc::channel::<UiEvent>();
    spawn_stdin_reader(tx.clone());

    println!(
        "Colorsum started against {}. Type /help for commands, or drop an image path.",
        config.endpoint
    );
    prompt()?;

    while let Ok(event) = rx.recv() {
        match event {
            UiEvent::InputClosed => break,
            UiEvent::Completed(outcome) => {
                session.complete(outcome);
                if let SessionState::Success(palette) = session.state() {
                    print_palette(palette);
                }
                print_notices(&mut session);
                prompt()?;
            }
            UiEvent::Line(line) => {
                let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
                if intent.action == "noop" {
                    prompt()?;
                    continue;
                }
                if intent.action == "quit" {
                    break;
                }
                handle_intent(&intent, &mut session, &service, &tx, &out_dir);
                print_notices(&mut session);
                prompt()?;
            }
        }
    }

    session.finish();
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<UiEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        loop {
            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(UiEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    eprintln!("colorsum: stdin read failed: {err}");
                    break;
                }
            }
        }
        let _ = tx.send(UiEvent::InputClosed);
    });
}

fn handle_intent(
    intent: &Intent,
    session: &mut Session,
    service: &Arc<dyn PaletteService>,
    tx: &mpsc::Sender<UiEvent>,
    out_dir: &Path,
) {
    match intent.action.as_str() {
        "help" => {
            println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
        }
        "set_color_count" => {
            session.set_color_count(intent.arg_str("value").unwrap_or_default());
            println!(
                "Colors set to '{}' (sending k={})",
                session.params().color_count_input(),
                session.params().effective().color_count
            );
        }
        "set_max_side" => {
            session.set_max_side(intent.arg_str("value").unwrap_or_default());
            println!(
                "Max side set to '{}' (sending max_side={}, step {MAX_SIDE_STEP})",
                session.params().max_side_input(),
                session.params().effective().max_side
            );
        }
        "select_image" => match intent.arg_str("path").filter(|path| !path.is_empty()) {
            Some(path) => {
                if session.select_image(Path::new(path)).is_ok() {
                    print_selection(session);
                }
            }
            None => println!("/open requires a path"),
        },
        "drop_files" => {
            let files: Vec<PathBuf> = intent
                .arg_list("paths")
                .into_iter()
                .map(PathBuf::from)
                .collect();
            if files.is_empty() {
                println!("/drop requires a path");
                return;
            }
            let previous = session.preview().map(|handle| handle.id());
            session.drag_enter();
            session.drop_files(&files);
            if session.preview().map(|handle| handle.id()) != previous {
                print_selection(session);
            }
        }
        "copy_color" => {
            let raw = intent.arg_str("value").unwrap_or_default();
            let palette = session.exportable_palette().map(Vec::as_slice).unwrap_or_default();
            match pick_color(palette, raw) {
                Ok(color) => {
                    print!("{}", osc52_copy_sequence(&color.hex));
                    println!("Copied {}", color.hex);
                }
                Err(err) => println!("{err}"),
            }
        }
        "clear_image" => {
            session.clear_image();
            println!("Selection cleared.");
        }
        "submit" => {
            let Ok(payload) = session.begin_submit() else {
                return;
            };
            println!(
                "Summarizing {} (k={}, max_side={})...",
                payload.file_name, payload.params.color_count, payload.params.max_side
            );
            let service = Arc::clone(service);
            let tx = tx.clone();
            thread::spawn(move || {
                let outcome = service.summarize(payload);
                let _ = tx.send(UiEvent::Completed(outcome));
            });
        }
        "status" => print_status(session),
        "export" => {
            let format = intent.arg_str("format").unwrap_or("all");
            let targets = match export_targets(format, intent.arg_str("path"), out_dir) {
                Ok(targets) => targets,
                Err(err) => {
                    println!("{err}");
                    return;
                }
            };
            for (format, path) in targets {
                match session.export(format, &path) {
                    Ok(written) => println!("Wrote {}", written.display()),
                    Err(err) => {
                        println!("Export failed: {err:#}");
                        break;
                    }
                }
            }
        }
        "unknown" => {
            println!(
                "Unknown command: /{}",
                intent.arg_str("command").unwrap_or_default()
            );
        }
        _ => {}
    }
}

/// Resolves `/export` arguments to concrete files. With `all`, a path is a directory.
fn export_targets(
    format: &str,
    path: Option<&str>,
    out_dir: &Path,
) -> Result<Vec<(ExportFormat, PathBuf)>> {
    let formats: Vec<ExportFormat> = if format.eq_ignore_ascii_case("all") {
        ExportFormat::ALL.to_vec()
    } else {
        match ExportFormat::parse(format) {
            Some(format) => vec![format],
            None => bail!("Unknown export format '{format}' (use json, css or all)"),
        }
    };

    let single_file = formats.len() == 1
        && path.is_some_and(|raw| {
            !raw.ends_with('/') && !raw.ends_with(std::path::MAIN_SEPARATOR) && !Path::new(raw).is_dir()
        });
    Ok(formats
        .into_iter()
        .map(|format| {
            let target = match path {
                Some(raw) if single_file => PathBuf::from(raw),
                Some(raw) => Path::new(raw).join(format.file_name()),
                None => out_dir.join(format.file_name()),
            };
            (format, target)
        })
        .collect())
}

/// Resolves a 1-based rank from `/copy` against the exportable palette.
fn pick_color<'a>(palette: &'a [PaletteColor], raw: &str) -> Result<&'a PaletteColor> {
    if palette.is_empty() {
        bail!("No palette yet; submit an image first.");
    }
    let rank = raw.trim().parse::<usize>().unwrap_or(0);
    match rank.checked_sub(1).and_then(|idx| palette.get(idx)) {
        Some(color) => Ok(color),
        None => bail!("/copy takes a rank from 1 to {}", palette.len()),
    }
}

/// Terminal clipboard write (OSC 52), understood by most modern emulators.
fn osc52_copy_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", BASE64.encode(text))
}

fn run_once(args: RunArgs) -> Result<i32> {
    let targets = export_targets(&args.format, None, &args.session.out)?;
    let client = SummarizationClient::new(&client_config(&args.session))?;
    let mut session = build_session(&args.session);

    let selected = session.select_image(&args.image).is_ok();
    if !selected || session.submit_with(&client).is_err() {
        print_notices(&mut session);
        session.finish();
        return Ok(1);
    }

    let palette = match session.state() {
        SessionState::Success(palette) => Some(palette.clone()),
        _ => None,
    };
    let code = match palette {
        Some(palette) => {
            print_palette(&palette);
            for (format, path) in &targets {
                let written = session.export(*format, path)?;
                println!("Wrote {}", written.display());
            }
            0
        }
        None => {
            print_notices(&mut session);
            2
        }
    };
    session.finish();
    Ok(code)
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn print_notices(session: &mut Session) {
    for notice in session.take_notices() {
        println!("[!] {}", notice.message());
    }
}

fn print_selection(session: &Session) {
    let Some(image) = session.image() else {
        return;
    };
    println!(
        "Selected {} ({}, {})",
        image.display_name(),
        image.media_type(),
        format_megabytes(image.size())
    );
    if let Some(preview) = session.preview() {
        println!("Preview: {}", preview.path().display());
    }
}

fn print_status(session: &Session) {
    let effective = session.params().effective();
    let state = match session.state() {
        SessionState::Failure(info) => format!("failure ({})", info.message),
        SessionState::Success(palette) => format!("success ({} colors)", palette.len()),
        other => other.name().to_string(),
    };
    println!("State: {state}");
    println!(
        "Image: {}",
        session
            .image()
            .map(|image| image.display_name().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!(
        "Colors: '{}' -> {}  Max side: '{}' -> {}",
        session.params().color_count_input(),
        effective.color_count,
        session.params().max_side_input(),
        effective.max_side
    );
    println!(
        "Submit: {}  Export: {}",
        if session.can_submit() { "ready" } else { "busy" },
        if session.can_export() { "ready" } else { "nothing yet" }
    );
}

fn print_palette(palette: &[PaletteColor]) {
    print!("{}", render_palette_table(palette));
}

fn render_palette_table(palette: &[PaletteColor]) -> String {
    if palette.is_empty() {
        return "No colors returned.\n".to_string();
    }
    let mut out = format!("{:<3} {:<8} {:<14} {:>6}\n", "#", "HEX", "RGB", "%");
    for (idx, color) in palette.iter().enumerate() {
        out.push_str(&format!(
            "{:<3} {:<8} {:<14} {:>6.2}\n",
            idx + 1,
            color.hex,
            color.rgb_text(),
            color.percent
        ));
    }
    out
}
