use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use tour_guide::config::{RunnerConfig, WidgetConfig};
use tour_guide::store::{FileStore, MemoryStore};
use tour_guide::tour::{TourMachine, TourPhase};
use tour_guide::widget::{TourGuide, TourRouteState, WidgetDeps, tour_routes};

const HELP: &str = "Commands: next, back, goto <n>, skip, complete, pause, resume, \
restart, action, start, stop, status, help, quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let runner = RunnerConfig::from_env()?;
    let widget_config = WidgetConfig::from_env().context("reading TOUR_GUIDE_* settings")?;

    eprintln!("🧭 Tour Guide v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Tour: {}", widget_config.tour_id);
    eprintln!("   State: {}", runner.state_dir.display());
    match &widget_config.endpoint {
        Some(endpoint) => eprintln!("   Backend: {}", endpoint),
        None => eprintln!("   Backend: none (local tour definition)"),
    }

    // ── Storage ──────────────────────────────────────────────────────────
    let durable = FileStore::open(runner.state_dir.clone()).with_context(|| {
        format!("opening state directory {}", runner.state_dir.display())
    })?;
    let deps = WidgetDeps::new(Arc::new(durable), Arc::new(MemoryStore::new()));

    // ── Widget ───────────────────────────────────────────────────────────
    let mut guide = TourGuide::new(deps);
    guide.init(widget_config).await?;
    let guide = Arc::new(Mutex::new(guide));

    // ── Control server ───────────────────────────────────────────────────
    if let Some(port) = runner.http_port {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
            .await
            .with_context(|| format!("binding control port {port}"))?;
        let app = tour_routes(TourRouteState {
            guide: Arc::clone(&guide),
        });
        eprintln!("   Control API: http://0.0.0.0:{}/api/tour/status", port);
        tokio::spawn(async move {
            tracing::info!(port, "Tour control server started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Control server stopped: {}", e);
            }
        });
    }

    eprintln!("   {}\n", HELP);
    print_current(&*guide.lock().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        if matches!(line, "quit" | "exit" | "/quit") {
            break;
        }

        let mut guide = guide.lock().await;
        match run_command(&mut guide, line) {
            Ok(true) => print_current(&guide),
            Ok(false) => eprintln!("(nothing changed)"),
            Err(e) => eprintln!("Error: {}", e),
        }
        eprint!("> ");
    }

    if let Ok(app) = guide.lock().await.app_mut() {
        app.destroy();
    }
    Ok(())
}

/// Apply one typed command. Returns whether the tour changed.
fn run_command(guide: &mut TourGuide, line: &str) -> anyhow::Result<bool> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();

    match command {
        "start" => return Ok(guide.start()?),
        "stop" => return Ok(guide.stop()?),
        "help" => {
            eprintln!("{}", HELP);
            return Ok(false);
        }
        "status" => {
            let snapshot = guide.app()?.snapshot()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(false);
        }
        _ => {}
    }

    let machine = guide.app_mut()?.machine_mut()?;
    let changed = match command {
        "next" | "n" => machine.advance(),
        "back" | "b" => machine.retreat(),
        "goto" => machine.go_to(parse_step_number(parts.next())?),
        "skip" => machine.skip(),
        "complete" => machine.complete(),
        "pause" => machine.pause(),
        "resume" => machine.resume(),
        "restart" => machine.restart(),
        "action" => machine.trigger_action(),
        other => anyhow::bail!("unknown command '{other}'. {HELP}"),
    };
    Ok(changed)
}

/// Steps are numbered from 1 at the prompt; returns the 0-based index.
fn parse_step_number(arg: Option<&str>) -> anyhow::Result<usize> {
    let number: usize = arg
        .context("usage: goto <step number>")?
        .parse()
        .context("step number must be a positive integer")?;
    anyhow::ensure!(number >= 1, "usage: goto <step number> (steps start at 1)");
    Ok(number - 1)
}

fn print_current(guide: &TourGuide) {
    let Ok(machine) = guide.app().and_then(|app| app.machine()) else {
        println!("(tour not started; type `start`)");
        return;
    };
    println!("{}", render(machine));
}

fn render(machine: &TourMachine) -> String {
    let config = machine.config();
    let state = machine.state();
    match machine.phase() {
        TourPhase::Finished => format!(
            "── {} ── finished ({} of {} steps done). Type `restart` to go again.",
            config.name(),
            state.completed_steps.len(),
            config.step_count()
        ),
        phase => {
            let Some(step) = machine.current_step() else {
                return format!("── {} ──", config.name());
            };
            let mut out = format!(
                "── {} ── step {}/{} ({:.0}%){}\n{}\n{}",
                config.name(),
                state.current_step_index + 1,
                config.step_count(),
                machine.progress(),
                if phase == TourPhase::Paused { " [paused]" } else { "" },
                step.title,
                step.description,
            );
            if let Some(target) = &step.target {
                out.push_str(&format!("\n  → points at {target} ({})", step.placement()));
            }
            if let Some(action) = &step.action {
                out.push_str(&format!("\n  [{}] (type `action`)", action.label));
            }
            out
        }
    }
}
