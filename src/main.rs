use anyhow::{Context, Result, bail};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use dreamweb_config::DreamwebConfig;
use dreamweb_ir::Node;
use dreamweb_scene::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PUMP_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let config = DreamwebConfig::load();
    init_logging(&config.log.filter);

    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        eprintln!("Usage: dreamweb <tree.json> [--out <file>] [--follow]");
        bail!("missing <tree.json>");
    }

    let input = PathBuf::from(args.remove(0));
    let mut out: Option<PathBuf> = None;
    let mut follow = false;
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                if i + 1 >= args.len() {
                    bail!("--out expects a path");
                }
                out = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--follow" => {
                follow = true;
                i += 1;
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    let source = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let tree = Node::from_json_str(&source)
        .with_context(|| format!("{} is not a component tree", input.display()))?;

    let mut runtime = Runtime::from_config(&config).context("failed to start runtime")?;
    runtime.render(tree)?;
    info!(nodes = runtime.tree().map_or(0, Node::count), "initial render");
    write_page(&runtime, out.as_ref())?;

    if !follow {
        runtime.api_mut().wait(Duration::from_secs(30));
        return Ok(());
    }

    // Re-emit the page whenever a reload lands or a call settles.
    loop {
        let report = runtime.pump(Instant::now())?;
        for notification in runtime.notifications() {
            info!(?notification, "notification");
        }
        if report.reloads > 0 || !report.completed.is_empty() || report.toasts_removed > 0 {
            write_page(&runtime, out.as_ref())?;
        }
        thread::sleep(PUMP_INTERVAL);
    }
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_page(runtime: &Runtime, out: Option<&PathBuf>) -> Result<()> {
    let page = runtime.to_page();
    match out {
        Some(path) => {
            fs::write(path, page).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "page written");
        }
        None => println!("{page}"),
    }
    Ok(())
}
