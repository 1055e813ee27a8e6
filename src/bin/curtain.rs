use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use curtain::{
    CursorConfig, Page, Phase, Point, PointerState, Runtime, ScrollBinding, ScrollRange, Scope, Site,
    SiteConfig, TimelineOptions, pages,
};

#[derive(Parser, Debug)]
#[command(name = "curtain", version)]
struct Cli {
    /// Site configuration JSON. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a page transition and print the phase trace as JSON.
    Transition(TransitionArgs),
    /// Print scroll-bound progress and pin state for a gallery.
    Scroll(ScrollArgs),
    /// Print cursor follower positions for a fixed pointer.
    Cursor(CursorArgs),
    /// Print a page's intro schedule as JSON.
    Schedule(ScheduleArgs),
}

#[derive(Parser, Debug)]
struct TransitionArgs {
    /// Route the site starts on.
    #[arg(long, default_value = "/")]
    from: String,

    /// Route to navigate to.
    #[arg(long)]
    to: String,

    /// Simulated display refresh rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Give up after this many simulated seconds.
    #[arg(long, default_value_t = 10.0)]
    max_secs: f64,
}

#[derive(Parser, Debug)]
struct ScrollArgs {
    /// Number of cards in the gallery.
    #[arg(long)]
    items: usize,

    /// Viewport height in px.
    #[arg(long)]
    viewport: f64,

    /// Scroll offset in px.
    #[arg(long)]
    offset: f64,

    /// Document offset of the pinned trigger.
    #[arg(long, default_value_t = 0.0)]
    top: f64,
}

#[derive(Parser, Debug)]
struct CursorArgs {
    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,

    /// Frames to simulate.
    #[arg(long, default_value_t = 10)]
    frames: u32,
}

#[derive(Parser, Debug)]
struct ScheduleArgs {
    /// Page route, e.g. `/subject`.
    #[arg(long)]
    page: String,
}

#[derive(serde::Serialize)]
struct PhaseMark {
    t: f64,
    phase: Phase,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => SiteConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => SiteConfig::default(),
    };

    match cli.cmd {
        Command::Transition(args) => cmd_transition(config, args),
        Command::Scroll(args) => cmd_scroll(&config, args),
        Command::Cursor(args) => cmd_cursor(&config.cursor, args),
        Command::Schedule(args) => cmd_schedule(config, args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_transition(config: SiteConfig, args: TransitionArgs) -> anyhow::Result<()> {
    if args.fps == 0 {
        anyhow::bail!("--fps must be > 0");
    }
    let rt = Runtime::init(config).context("init runtime")?;
    let mut site = Site::open(rt, &args.from).context("open site")?;

    let outcome = site.navigate(&args.to);
    let dt = 1.0 / f64::from(args.fps);
    let mut t = 0.0;
    let mut trace = vec![PhaseMark {
        t,
        phase: site.phase(),
    }];

    while t < args.max_secs && site.orchestrator().is_busy() {
        site.frame(dt);
        t += dt;
        let phase = if site.orchestrator().is_busy() {
            site.phase()
        } else {
            site.orchestrator()
                .last_session()
                .map_or(site.phase(), |s| s.phase())
        };
        if trace.last().map(|m| m.phase) != Some(phase) {
            trace.push(PhaseMark { t, phase });
        }
    }

    let out = serde_json::json!({
        "outcome": outcome,
        "route": site.current_route(),
        "navigations": site.history(),
        "trace": trace,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_scroll(config: &SiteConfig, args: ScrollArgs) -> anyhow::Result<()> {
    let range = ScrollRange::for_items(args.top, args.viewport, args.items);
    let mut binding = ScrollBinding::new(range, 0.0, config.gallery.pin);
    binding.update_scroll(args.offset);

    let out = serde_json::json!({
        "range": range,
        "progress": binding.progress(),
        "pinned": binding.is_pinned(),
        "pin_offset": binding.pin_offset(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_cursor(config: &CursorConfig, args: CursorArgs) -> anyhow::Result<()> {
    let mut state = PointerState::new(config).context("cursor config")?;
    state.on_move(Point::new(args.x, args.y));
    let frames: Vec<_> = (0..args.frames).map(|_| state.tick()).collect();
    println!("{}", serde_json::to_string_pretty(&frames)?);
    Ok(())
}

fn cmd_schedule(config: SiteConfig, args: ScheduleArgs) -> anyhow::Result<()> {
    let page = Page::from_route(&args.page)?;
    let intro = config.intro.clone();
    let rt = Runtime::init(config).context("init runtime")?;

    let mut scope = Scope::new("schedule");
    let mut stage = rt.stage().borrow_mut();
    let root = pages::build_scene(&mut stage, None, page);
    let steps = pages::intro_script(page, &intro);
    let options = TimelineOptions::default()
        .delay(intro.delay)
        .seed(rt.next_seed());
    let tl = pages::intro_timeline(&mut stage, root, &steps, options, &mut scope, rt.stage())?;

    let entries: Vec<_> = tl
        .schedule()
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "target": e.target,
                "text": stage.text(e.target),
                "start": e.start + intro.delay,
                "duration": e.duration,
            })
        })
        .collect();
    let out = serde_json::json!({
        "page": page,
        "duration": tl.total_duration(),
        "entries": entries,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    drop(stage);
    scope.teardown();
    Ok(())
}
