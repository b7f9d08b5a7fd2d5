use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use fived::{
    AppContext, BackendKind, Config, EffectPreset, MemorySurface, PanelWindow, Rect,
    RenderStrategy, SurfaceHandle, Theme, Window as _, WindowHandle,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fived", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the demo window to a PNG.
    Frame(FrameArgs),
    /// Simulate frames through the render optimizer and print its stats as JSON.
    Optimize(OptimizeArgs),
    /// Print every effect preset and its settings as JSON.
    Presets,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Backend to use; overrides the config file and `FIVED_BACKEND`.
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Effect preset applied over the whole frame.
    #[arg(long, default_value = "none")]
    preset: EffectPreset,

    /// Optional JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct OptimizeArgs {
    #[arg(long, default_value_t = 24)]
    elements: usize,

    #[arg(long, default_value_t = 600)]
    frames: u64,

    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Optional JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Auto,
    Software,
    Gpu,
}

impl From<BackendChoice> for BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Auto => BackendKind::Auto,
            BackendChoice::Software => BackendKind::Software,
            BackendChoice::Gpu => BackendKind::Gpu,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Optimize(args) => cmd_optimize(args),
        Command::Presets => cmd_presets(),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_json_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => Config::default(),
    };
    config
        .with_env_overrides()
        .context("apply environment overrides")
}

fn demo_window(width: u32, height: u32, preset: EffectPreset) -> PanelWindow {
    let mut window = PanelWindow::new(WindowHandle(1), width, height, Theme::default());
    let w = width as i32;
    let h = height as i32;
    let gap = 16;
    let col = (w - gap * 3) / 2;

    window.add_panel("header", Rect::new(gap, gap, w - gap, gap + 56), "5D GUI");
    window.add_panel(
        "sidebar",
        Rect::new(gap, gap * 2 + 56, gap + col, h - gap),
        "Layers",
    );
    let preview = window.add_panel(
        "preview",
        Rect::new(gap * 2 + col, gap * 2 + 56, w - gap, h - gap),
        "Preview",
    );
    preview.fill = Theme::default().accent.with_alpha(200);
    window.preset = preset;
    window
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(choice) = args.backend {
        config.backend = choice.into();
    }

    let mut ctx = AppContext::new(config);
    ctx.register_window_created(|handle| tracing::info!(?handle, "window created"));

    let surface = MemorySurface::new(args.width, args.height);
    let mut backend = ctx.create_window_backend(SurfaceHandle::new(surface.clone()));
    anyhow::ensure!(
        backend.is_initialized(),
        "no backend could initialize a {}x{} surface",
        args.width,
        args.height
    );

    let mut window = demo_window(args.width, args.height, args.preset);
    ctx.notify_window_created(window.handle());
    anyhow::ensure!(
        window.render(backend.as_mut(), ctx.optimizer_mut()),
        "backend refused to start a frame"
    );
    backend.shutdown();

    let frame = surface
        .last_frame()
        .context("backend finished without presenting a frame")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({:?} backend)",
        args.out.display(),
        backend.kind()
    );
    Ok(())
}

/// SplitMix64 step; deterministic across platforms.
fn mix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn unit(state: &mut u64) -> f64 {
    (mix64(state) >> 11) as f64 / (1u64 << 53) as f64
}

fn cmd_optimize(args: OptimizeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut ctx = AppContext::new(config);
    let mut rng = args.seed;

    const SCREEN: (i32, i32) = (1920, 1080);
    let screen_area = f64::from(SCREEN.0 * SCREEN.1);
    let mut elements = Vec::with_capacity(args.elements);
    for i in 0..args.elements {
        let w = 40 + (mix64(&mut rng) % 600) as i32;
        let h = 20 + (mix64(&mut rng) % 400) as i32;
        let x = (mix64(&mut rng) % (SCREEN.0 - w).max(1) as u64) as i32;
        let y = (mix64(&mut rng) % (SCREEN.1 - h).max(1) as u64) as i32;
        let bounds = Rect::new(x, y, x + w, y + h);
        // Per-element churn and cost in ms at full detail.
        let churn = unit(&mut rng) * 0.6;
        let cost = 0.5 + unit(&mut rng) * 14.0;
        let id = format!("element-{i}");

        let optimizer = ctx.optimizer_mut();
        optimizer.register_element(&id, bounds);
        optimizer.update_screen_coverage(&id, bounds.area() as f64 / screen_area);
        optimizer.set_animated(&id, i % 11 == 0);
        elements.push((id, churn, cost));
    }

    for _ in 0..args.frames {
        for (id, churn, cost) in &elements {
            let optimizer = ctx.optimizer_mut();
            let changed = unit(&mut rng) < *churn;
            if changed {
                optimizer.mark_element_changed(id);
            }
            let jitter = 0.8 + unit(&mut rng) * 0.4;
            let ms = match optimizer.get_optimal_strategy(id) {
                RenderStrategy::FullRender | RenderStrategy::LodHigh => cost * jitter,
                RenderStrategy::LodMedium => cost * 0.5 * jitter,
                RenderStrategy::LodLow => cost * 0.25 * jitter,
                RenderStrategy::CachedRender if changed => {
                    optimizer.record_cache_miss(id);
                    cost * 1.1 * jitter
                }
                RenderStrategy::CachedRender => {
                    optimizer.record_cache_hit(id);
                    0.2 * jitter
                }
                RenderStrategy::SkipRender => 0.0,
            };
            optimizer.record_render_metrics(id, ms, true);
        }
        ctx.optimizer_mut().decay_metrics(0.999);
    }

    let report = serde_json::json!({
        "stats": ctx.optimizer().get_stats(),
        "model": ctx.optimizer().model(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize optimizer report")?
    );
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    let presets: serde_json::Map<String, serde_json::Value> = EffectPreset::ALL
        .iter()
        .map(|p| -> Result<_, serde_json::Error> {
            Ok((p.name().to_string(), serde_json::to_value(p.settings())?))
        })
        .collect::<Result<_, _>>()
        .context("serialize presets")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&presets).context("serialize presets")?
    );
    Ok(())
}
