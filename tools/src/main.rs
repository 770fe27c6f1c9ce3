//! map-runner: headless runner for the live map viewer.
//!
//! Usage:
//!   map-runner --seed 12345 --ticks 30 --config data/viewer.json
//!   map-runner --follow 7 --access-token pk.xxx
//!   map-runner --ipc-mode

use anyhow::Result;
use livemap_core::{
    config::ViewerConfig,
    feed::FeedState,
    map_view::Activation,
    search::{Header, ListItem},
    surface::HeadlessMap,
    types::{EntityId, LatLng, Millis},
    LiveMapApp,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Advance { ms: Millis },
    Follow { id: EntityId },
    Unfollow,
    Search { query: String },
    Select { id: EntityId },
    ClickMarker { id: EntityId },
    ClickBackground,
    ClosePopup,
    Quit,
}

#[derive(serde::Serialize)]
struct ViewState {
    now_ms: Millis,
    feed: &'static str,
    ticks: u64,
    total_label: String,
    followed_id: Option<EntityId>,
    popup_id: Option<EntityId>,
    popup_html: Option<String>,
    camera: Option<LatLng>,
    markers: usize,
    header: Header,
    empty_message: Option<String>,
    items: Vec<ListItem>,
}

type App = LiveMapApp<HeadlessMap>;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let ticks = parse_arg(&args, "--ticks", 10u64);
    let config_path = string_arg(&args, "--config").unwrap_or("data/viewer.json");

    let base = if Path::new(config_path).exists() {
        ViewerConfig::load(config_path)?
    } else {
        log::warn!("{config_path} not found, using built-in defaults");
        ViewerConfig::default()
    };
    let mut config = base.apply_env();
    config.seed = parse_arg(&args, "--seed", config.seed);
    if let Some(token) = string_arg(&args, "--access-token") {
        config.map.access_token = Some(token.to_string());
    }
    config.validate()?;

    if !ipc_mode {
        println!("Live map viewer: map-runner");
        println!("  seed:      {}", config.seed);
        println!("  ticks:     {ticks}");
        println!("  entities:  {}", config.simulation.entity_count);
        println!("  config:    {config_path}");
        println!();
    }

    let interval = config.simulation.update_interval_ms;
    let mut app = App::new(config);
    if app.mount(HeadlessMap::new) == Activation::Degraded && !ipc_mode {
        println!("  (no access token: map not drawn, set --access-token or LIVEMAP_ACCESS_TOKEN)");
        println!();
    }
    if let Some(id) = string_arg(&args, "--follow") {
        app.follow(id);
    }

    if ipc_mode {
        run_ipc_loop(&mut app)?;
    } else {
        app.advance(interval.saturating_mul(ticks));
        print_summary(&app);
    }

    app.unmount();
    Ok(())
}

fn run_ipc_loop(app: &mut App) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("ipc: rejected command: {e}");
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        if let IpcCommand::Quit = cmd {
            break;
        }
        match handle_command(app, cmd) {
            Ok(()) => writeln!(stdout, "{}", serde_json::to_string(&build_view_state(app))?)?,
            Err(e) => write_error(&mut stdout, &e.to_string())?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(app: &mut App, cmd: IpcCommand) -> Result<()> {
    match cmd {
        IpcCommand::GetState | IpcCommand::Quit => {}
        IpcCommand::Advance { ms } => {
            app.advance(ms);
        }
        IpcCommand::Follow { id } => app.follow(&id),
        IpcCommand::Unfollow => app.unfollow(),
        IpcCommand::Search { query } => app.set_query(query),
        IpcCommand::Select { id } => app.select(&id),
        IpcCommand::ClickMarker { id } => {
            if !app.click_marker(&id) {
                anyhow::bail!("no marker for id {id}");
            }
        }
        IpcCommand::ClickBackground => {
            let at = app
                .view()
                .with_surface(|map| map.camera())
                .ok_or_else(|| anyhow::anyhow!("map not created"))?;
            app.click_background(at);
        }
        IpcCommand::ClosePopup => {
            if !app.press_popup_close() {
                anyhow::bail!("no popup open");
            }
        }
    }
    Ok(())
}

fn build_view_state(app: &App) -> ViewState {
    let state = app.state();
    let search = app.search();
    let feed = match app.feed().state() {
        FeedState::Idle => "idle",
        FeedState::Running => "running",
        FeedState::Stopped => "stopped",
    };
    ViewState {
        now_ms: app.now(),
        feed,
        ticks: app.feed().ticks(),
        total_label: search.total_label(state),
        followed_id: state.followed_id(),
        popup_id: app.view().active_popup_id(),
        popup_html: app
            .view()
            .with_surface(|map| map.popup().map(|p| p.html.clone()))
            .flatten(),
        camera: app.view().with_surface(|map| map.camera()),
        markers: app.view().marker_count(),
        header: search.header(state),
        empty_message: search.empty_message(state),
        items: search.items(state),
    }
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(out, "{err_json}")?;
    out.flush()?;
    Ok(())
}

fn print_summary(app: &App) {
    let state = app.state();
    println!("=== RUN SUMMARY ===");
    println!("  virtual time:   {}ms", app.now());
    println!("  updates:        {}", app.feed().ticks());
    println!("  {}", app.search().total_label(state));
    println!("  markers:        {}", app.view().marker_count());

    if let Some(camera) = app.view().with_surface(|map| map.camera()) {
        println!("  camera:         ({:.5}, {:.5})", camera.lat, camera.lng);
    }

    println!();
    println!("=== FOLLOW ===");
    match (state.followed_id(), state.followed_entity()) {
        (Some(_), Some(entity)) => {
            println!("  following:      {} ({})", entity.display_name, entity.truncated_id());
            println!("  position:       ({:.5}, {:.5})", entity.latitude, entity.longitude);
            println!("  speed class:    {}", entity.speed_class);
        }
        (Some(id), None) => println!("  waiting for {id} to appear"),
        _ => println!("  (not following)"),
    }

    println!();
    println!("=== FIRST ENTITIES ===");
    for item in app.search().items(state).iter().take(5) {
        println!("  {:<12} {:<28} {}", item.short_id, item.name, if item.followed { "*" } else { "" });
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
