mod heightfield;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glam::Vec3;
use terrastream_common::FlyCamera;
use terrastream_mesh::GeneratorPool;
use terrastream_render::{DebugTextRenderer, DrawMode, RenderView, TerrainRenderer};
use terrastream_stream::{
    MAX_ADDRESSABLE_DEPTH, MAX_TREE_DEPTH, NodeId, StreamConfig, TerrainStreamer,
};
use terrastream_tools::TreeInspector;
use tracing_subscriber::EnvFilter;

use crate::heightfield::Heightfield;

#[derive(Parser)]
#[command(name = "terrastream-cli", about = "CLI tool for terrain streaming")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Fly a camera east over demo terrain and report streaming progress
    Simulate(SimulateArgs),
    /// Pack node address fields into a node id
    Encode {
        #[arg(allow_hyphen_values = true)]
        base_x: i16,
        #[arg(allow_hyphen_values = true)]
        base_z: i16,
        #[arg(allow_hyphen_values = true)]
        base_y: i16,
        #[arg(default_value = "0")]
        depth: u8,
        #[arg(default_value = "0")]
        sub_x: u8,
        #[arg(default_value = "0")]
        sub_y: u8,
        #[arg(default_value = "0")]
        sub_z: u8,
    },
    /// Unpack a node id (hex with 0x, or decimal)
    Decode { id: String },
}

#[derive(Args)]
struct SimulateArgs {
    /// Number of ticks to simulate
    #[arg(short, long, default_value = "600")]
    ticks: u64,
    /// Camera speed in world units per second
    #[arg(short, long, default_value = "400")]
    speed: f32,
    /// Camera altitude
    #[arg(long, default_value = "512")]
    altitude: f32,
    /// JSON stream config; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Mesh worker threads (defaults to the generator count)
    #[arg(long)]
    threads: Option<usize>,
    /// Build meshes synchronously on the calling thread
    #[arg(long)]
    inline: bool,
    /// Sleep between ticks, in milliseconds
    #[arg(long, default_value = "0")]
    frame_ms: u64,
    /// Print stats every N ticks
    #[arg(long, default_value = "100")]
    every: u64,
    /// Draw roots only
    #[arg(long)]
    low_detail: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("terrastream-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", terrastream_common::crate_info());
            println!("mesh: {}", terrastream_mesh::crate_info());
            println!("stream: {}", terrastream_stream::crate_info());
            println!("render: {}", terrastream_render::crate_info());
            println!("tools: {}", terrastream_tools::crate_info());
            println!(
                "node ids: max depth field {MAX_TREE_DEPTH}, addressable depth {MAX_ADDRESSABLE_DEPTH}"
            );
        }
        Commands::Simulate(args) => simulate(&args)?,
        Commands::Encode {
            base_x,
            base_z,
            base_y,
            depth,
            sub_x,
            sub_y,
            sub_z,
        } => {
            anyhow::ensure!(
                depth <= MAX_TREE_DEPTH,
                "depth {depth} exceeds the maximum of {MAX_TREE_DEPTH}"
            );
            let limit = 1u16 << depth.min(MAX_ADDRESSABLE_DEPTH);
            anyhow::ensure!(
                [sub_x, sub_y, sub_z].iter().all(|&s| u16::from(s) < limit),
                "sub coordinates must be below {limit} at depth {depth}"
            );
            let id = NodeId::encode(base_x, base_z, base_y, depth, sub_x, sub_y, sub_z);
            println!("{id}");
        }
        Commands::Decode { id } => {
            let id: NodeId = id.parse().with_context(|| format!("invalid node id {id:?}"))?;
            println!("{id} = {}", id.decode());
            if let Some(parent) = id.parent() {
                println!("parent: {parent}");
            }
        }
    }

    Ok(())
}

fn simulate(args: &SimulateArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => StreamConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StreamConfig::default(),
    };

    let builder = Arc::new(Heightfield::default());
    let pool = if args.inline {
        GeneratorPool::with_inline(config.generator_count, builder)
    } else {
        let workers = GeneratorPool::worker_threads(args.threads.unwrap_or(config.generator_count))?;
        GeneratorPool::with_async(config.generator_count, builder, workers)
    };
    let mut streamer = TerrainStreamer::new(config, pool)?;

    let mut camera = FlyCamera {
        position: Vec3::new(0.0, args.altitude, 0.0),
        speed: args.speed,
        ..FlyCamera::default()
    };
    let dt = 1.0 / 60.0;
    let renderer = DebugTextRenderer::new();
    let mode = if args.low_detail {
        DrawMode::LowDetail
    } else {
        DrawMode::Full
    };

    let ticks = args.ticks;
    println!(
        "Simulating {ticks} ticks at {} units/s ({})",
        args.speed,
        if args.inline { "inline" } else { "async" }
    );
    let every = args.every.max(1);
    for tick in 1..=ticks {
        camera.advance(dt);
        let view = camera.snapshot();
        streamer.tick(&view);

        if tick % every == 0 || tick == ticks {
            println!("tick {tick}: {}", streamer.stats());
            let mut render_view = RenderView::new(view);
            render_view.mode = mode;
            print!("{}", renderer.render(&streamer, &render_view));
        }
        if args.frame_ms > 0 {
            std::thread::sleep(Duration::from_millis(args.frame_ms));
        }
    }

    print!("{}", TreeInspector::summary(&streamer));
    Ok(())
}
