//! guia – export generated guides to PDF, copy them as widgets, or run the
//! render service.
//!
//! Usage:
//!   guia export <fragment.html> [--remote] [--landscape] [--out DIR]
//!   guia copy <fragment.html>
//!   guia normalize <fragment.html> [--landscape]
//!   guia serve [--bind ADDR]
//!
//! Client settings come from `GUIA_API_URL`, `GUIA_ORIGIN`,
//! `GUIA_TIMEOUT_SECS`, `GUIA_RATE_LIMIT_COOLDOWN_SECS` and `GUIA_DOWNLOAD_DIR`;
//! the service reads `GUIA_BIND`, `GUIA_RATE_LIMIT_MAX` and
//! `GUIA_RATE_LIMIT_WINDOW_SECS`.

use std::{env, path::{Path, PathBuf}, process};

use guia_export::clipboard::{CopyTracker, SystemClipboard};
use guia_export::config::{ExportConfig, ServerConfig};
use guia_export::content::{ContentSource, FileContent};
use guia_export::download::DirectorySink;
use guia_export::local::LocalExporter;
use guia_export::normalize::{normalize_with, ShellOptions};
use guia_export::remote::RemoteExporter;
use guia_export::{server, ExportController, ExportService, ExportStrategy, Orientation};

/// Parsed command line.
struct Args {
    command: String,
    input: Option<PathBuf>,
    remote: bool,
    landscape: bool,
    out: Option<PathBuf>,
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let prog = argv.first().map(String::as_str).unwrap_or("guia").to_string();
    let args = parse_args(&prog, &argv);

    match args.command.as_str() {
        "export" => export(&prog, args).await,
        "copy" => copy(&prog, args).await,
        "normalize" => print_normalized(&prog, args).await,
        "serve" => serve(args).await,
        other => {
            eprintln!("Unknown command: {other}");
            print_usage(&prog);
            process::exit(1);
        }
    }
}

fn parse_args(prog: &str, argv: &[String]) -> Args {
    let mut args = Args {
        command: String::new(),
        input: None,
        remote: false,
        landscape: false,
        out: None,
        bind: None,
    };
    let mut iter = argv.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--remote" | "-r" => args.remote = true,
            "--landscape" | "-l" => args.landscape = true,
            "--out" | "-o" => match iter.next() {
                Some(v) => args.out = Some(PathBuf::from(v)),
                None => {
                    eprintln!("Error: --out needs a directory.");
                    process::exit(1);
                }
            },
            "--bind" | "-b" => match iter.next() {
                Some(v) => args.bind = Some(v.clone()),
                None => {
                    eprintln!("Error: --bind needs an address.");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(prog);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(prog);
                process::exit(1);
            }
            word => {
                if args.command.is_empty() {
                    args.command = word.to_string();
                } else if args.input.is_none() {
                    args.input = Some(PathBuf::from(word));
                } else {
                    eprintln!("Unexpected argument: {word}");
                    print_usage(prog);
                    process::exit(1);
                }
            }
        }
    }
    if args.command.is_empty() {
        print_usage(prog);
        process::exit(1);
    }
    args
}

fn orientation(args: &Args) -> Orientation {
    if args.landscape {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    }
}

fn require_input(prog: &str, args: &Args) -> PathBuf {
    match &args.input {
        Some(p) => p.clone(),
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(prog);
            process::exit(1);
        }
    }
}

async fn read_fragment(path: &Path) -> String {
    match FileContent::new(path).generate("").await {
        Ok(html) => html,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn export(prog: &str, args: Args) {
    let input = require_input(prog, &args);
    let mut config = match ExportConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error in configuration: {e}");
            process::exit(1);
        }
    };
    if let Some(out) = &args.out {
        config.download_dir = out.clone();
    }
    if let Err(e) = std::fs::create_dir_all(&config.download_dir) {
        eprintln!("Error creating '{}': {e}", config.download_dir.display());
        process::exit(1);
    }

    let remote = match RemoteExporter::new(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error in configuration: {e}");
            process::exit(1);
        }
    };
    let service = ExportService::new(LocalExporter::forge(), remote);
    let controller = ExportController::new(service, DirectorySink::new(&config.download_dir));

    let strategy = if args.remote {
        ExportStrategy::Remote
    } else {
        ExportStrategy::Local
    };
    let source = FileContent::new(&input);
    match controller
        .generate_and_export(&source, "", orientation(&args), strategy)
        .await
    {
        Ok(delivered) => {
            let shown = delivered
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or(delivered.filename);
            eprintln!("Wrote '{shown}' ({} bytes)", delivered.len);
        }
        Err(e) => {
            eprintln!("Error exporting PDF: {e}");
            if e.is_retryable() {
                eprintln!("Try again in a moment.");
            }
            process::exit(1);
        }
    }
}

async fn copy(prog: &str, args: Args) {
    let input = require_input(prog, &args);
    let fragment = read_fragment(&input).await;
    let tracker = CopyTracker::new(SystemClipboard);
    if tracker.copy_fragment(&fragment) {
        eprintln!("Widget copied to the clipboard.");
    } else {
        eprintln!("Error: could not copy to the clipboard.");
        process::exit(1);
    }
}

async fn print_normalized(prog: &str, args: Args) {
    let input = require_input(prog, &args);
    let fragment = read_fragment(&input).await;
    let document = normalize_with(&fragment, &ShellOptions::for_orientation(orientation(&args)));
    println!("{}", document.html());
}

async fn serve(args: Args) {
    let mut config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error in configuration: {e}");
            process::exit(1);
        }
    };
    if let Some(bind) = &args.bind {
        match bind.parse() {
            Ok(addr) => config.bind = addr,
            Err(e) => {
                eprintln!("Error: invalid bind address '{bind}': {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = server::serve(config).await {
        eprintln!("Error running render service: {e}");
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("guia – export generated guides to PDF");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} export <fragment.html> [--remote] [--landscape] [--out DIR]");
    eprintln!("  {prog} copy <fragment.html>");
    eprintln!("  {prog} normalize <fragment.html> [--landscape]");
    eprintln!("  {prog} serve [--bind ADDR]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --remote, -r      Render through the render service instead of locally");
    eprintln!("  --landscape, -l   Landscape pages (remote only; local output is portrait)");
    eprintln!("  --out, -o         Download directory (default: GUIA_DOWNLOAD_DIR or .)");
    eprintln!("  --bind, -b        Service listen address (default: GUIA_BIND or 0.0.0.0:8001)");
    eprintln!("  --help            Print this message");
}
