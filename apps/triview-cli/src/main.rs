use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use triview_assets::ShaderSources;
use triview_common::{DemoConfig, DemoKind};
use triview_input::{Key, ScriptedInput, WalkKeys, walk_delta, walk_offset};
use triview_render::{LoopState, RecordingSurface, RenderLoop};
use triview_tools::{NOMINAL_FRAME_MS, SceneInspector};

#[derive(Parser)]
#[command(name = "triview-cli", about = "Headless tools for the triangle demos")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the per-demo defaults
    Info,
    /// Run a demo against a recording GPU surface and print the scene state
    Simulate {
        /// Demo to run
        #[arg(short, long, default_value = "spin")]
        demo: DemoKind,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Simulated time per frame in milliseconds
        #[arg(long, default_value_t = NOMINAL_FRAME_MS)]
        frame_ms: f32,
        /// Keys held for the whole run, e.g. "wd"
        #[arg(long, default_value = "")]
        hold: String,
        /// Horizontal cursor offset from the window center each frame
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        look: f64,
        /// Print the scene every N frames (0 prints only the final state)
        #[arg(long, default_value = "0")]
        every: u64,
        /// YAML or JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Read shaders from the configured paths instead of the built-in pair
        #[arg(long)]
        disk_shaders: bool,
    },
    /// Print the WASD direction table
    Walk {
        /// Camera yaw in degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw: f32,
    },
}

fn parse_keys(hold: &str) -> anyhow::Result<Vec<Key>> {
    hold.chars()
        .map(|c| match c.to_ascii_lowercase() {
            'w' => Ok(Key::W),
            'a' => Ok(Key::A),
            's' => Ok(Key::S),
            'd' => Ok(Key::D),
            other => bail!("unsupported key '{other}' (expected w, a, s or d)"),
        })
        .collect()
}

fn print_state(render_loop: &RenderLoop) {
    if let Some(scene) = render_loop.scene() {
        println!("frame {:>5}: {}", render_loop.frames(), SceneInspector::summary(scene));
    } else if let Some(pair) = render_loop.pair() {
        let [first, second] = SceneInspector::pair_angles(pair);
        println!(
            "frame {:>5}: pair angles first={first:.2} second={second:.2}",
            render_loop.frames()
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn simulate(
    demo: DemoKind,
    frames: u64,
    frame_ms: f32,
    hold: &str,
    look: f64,
    every: u64,
    config: Option<PathBuf>,
    disk_shaders: bool,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => DemoConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DemoConfig::for_demo(demo),
    };
    config.demo = demo;
    let shaders = if disk_shaders {
        ShaderSources::load(&config.vertex_shader, &config.fragment_shader)?
    } else {
        ShaderSources::builtin()
    };
    let keys = parse_keys(hold)?;
    tracing::debug!(?keys, look, "scripted input");

    let (cx, cy) = (config.width as f64 / 2.0, config.height as f64 / 2.0);
    let step = Duration::from_secs_f32(frame_ms.max(0.0) / 1000.0);

    let mut surface = RecordingSurface::new();
    let mut input = ScriptedInput::with_cursor(cx, cy);
    for key in keys {
        input.press(key);
    }

    let mut render_loop = RenderLoop::new(config);
    render_loop.init(&mut surface, &shaders)?;
    println!("Simulating {demo} for {frames} frames at {frame_ms} ms/frame");

    for _ in 0..frames {
        input.advance(step);
        if look != 0.0 {
            input.move_cursor(cx + look, cy);
        }
        if render_loop.frame(&mut surface, &mut input)? != LoopState::Running {
            break;
        }
        if every > 0 && render_loop.frames() % every == 0 {
            print_state(&render_loop);
        }
    }

    print_state(&render_loop);
    if let Some(title) = input.title() {
        println!("Window title: {title}");
    }
    println!("Rate: {:.3}", render_loop.rate());

    render_loop.shutdown(&mut surface)?;
    println!(
        "Presented {} frames, {} commands, {} live resources, {} stale deletes",
        surface.frames_presented(),
        surface.commands().len(),
        surface.live_resources(),
        surface.stale_deletes()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("triview-cli v{}", env!("CARGO_PKG_VERSION"));
            for kind in DemoKind::ALL {
                let config = DemoConfig::for_demo(kind);
                let projection = match config.fov_degrees() {
                    Some(fov) => format!("{fov} deg fovy, {}..{}", config.near, config.far),
                    None => "depth remap".to_string(),
                };
                println!(
                    "{:<11} {}x{}  projection: {projection}  title: \"{}\"",
                    kind.name(),
                    config.width,
                    config.height,
                    config.title()
                );
            }
        }
        Commands::Simulate {
            demo,
            frames,
            frame_ms,
            hold,
            look,
            every,
            config,
            disk_shaders,
        } => simulate(
            demo,
            frames,
            frame_ms,
            &hold,
            look,
            every,
            config,
            disk_shaders,
        )?,
        Commands::Walk { yaw } => {
            println!("Walk directions at yaw {yaw} deg (rate 1.0)");
            for bits in 0..16u8 {
                let keys = WalkKeys::from_bits(bits);
                let label: String = [
                    (WalkKeys::FORWARD, 'W'),
                    (WalkKeys::LEFT, 'A'),
                    (WalkKeys::BACK, 'S'),
                    (WalkKeys::RIGHT, 'D'),
                ]
                .into_iter()
                .map(|(bit, c)| if bits & bit != 0 { c } else { '-' })
                .collect();
                match (walk_offset(keys), walk_delta(keys, yaw, 1.0)) {
                    (Some(offset), Some(delta)) => println!(
                        "{bits:>2} {label}  offset {offset:>5}  delta ({:.3}, {:.3}, {:.3})",
                        delta.x, delta.y, delta.z
                    ),
                    _ => println!("{bits:>2} {label}  no movement"),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_parse() {
        assert_eq!(parse_keys("wD").unwrap(), vec![Key::W, Key::D]);
        assert!(parse_keys("").unwrap().is_empty());
        assert!(parse_keys("q").is_err());
    }

    #[test]
    fn simulate_runs_every_demo() {
        for kind in DemoKind::ALL {
            simulate(kind, 5, 16.667, "w", 2.0, 0, None, false).unwrap();
        }
    }
}
