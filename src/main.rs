// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use frameflow::buffers::{BufferPool, ImageBuffer, ImageDesc, PixelFormat};
use frameflow::config::{load_and_validate_config, EngineConfig, SchedulingMode};
use frameflow::engine::{GraphExecutor, PipelinedExecutor};
use frameflow::graph::{Graph, ParamIndex, PortDirection, SlotBinding};
use frameflow::perf::{PerfRecorder, PerfScope};
use frameflow::stages::{AffineWarp, ChannelExtract};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => load_and_validate_config(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading {path}"))?,
        None => {
            serde_yaml::from_str::<EngineConfig>("mode: pipelined").expect("built-in defaults parse")
        }
    };

    println!("frameflow demo");
    println!("  mode: {:?}", config.mode);
    println!("  frame: {}x{} rgb", config.frame.width, config.frame.height);
    println!("  frames: {}", config.frames);

    let (graph, input, output) = build_pipeline(&config)?;

    let start = Instant::now();
    let perf = match config.mode {
        SchedulingMode::SingleShot => run_single_shot(graph, &config).await?,
        SchedulingMode::Pipelined => run_pipelined(graph, input, output, &config).await?,
    };
    let elapsed = start.elapsed();

    println!("\nprocessed {} frames in {elapsed:?}", config.frames);
    print_perf(&perf);
    Ok(())
}

/// Channel extract feeding an affine warp through one virtual buffer, with
/// the RGB source and the grayscale result promoted to graph parameters.
fn build_pipeline(config: &EngineConfig) -> anyhow::Result<(Graph, ParamIndex, ParamIndex)> {
    let (w, h) = (config.frame.width, config.frame.height);

    let warp = AffineWarp::new(w, h);
    let radians = config.rotation_degrees.to_radians();
    warp.set_matrix(AffineWarp::rotation_matrix(w, h, radians));

    let mut graph = Graph::new();
    let mid = graph.virtual_buffer(ImageDesc::new(w, h, PixelFormat::Gray8))?;
    let extract = graph.add_stage(
        Arc::new(ChannelExtract::new(w, h, config.channel.into())),
        vec![SlotBinding::Unbound],
        vec![SlotBinding::Virtual(mid)],
    )?;
    let warp = graph.add_stage(
        Arc::new(warp),
        vec![SlotBinding::Virtual(mid)],
        vec![SlotBinding::Unbound],
    )?;
    let input = graph.promote_parameter(extract, PortDirection::Input, 0)?;
    let output = graph.promote_parameter(warp, PortDirection::Output, 0)?;
    graph.verify()?;
    Ok((graph, input, output))
}

/// Writes a recognizable per-frame gradient so successive frames differ.
fn render_frame(buf: &mut ImageBuffer, frame: usize) {
    for (i, px) in buf.as_bytes_mut().chunks_exact_mut(3).enumerate() {
        px[0] = frame as u8;
        px[1] = (i % 251) as u8;
        px[2] = (frame * 3) as u8;
    }
}

async fn run_single_shot(
    mut graph: Graph,
    config: &EngineConfig,
) -> anyhow::Result<Arc<PerfRecorder>> {
    let executor = GraphExecutor::new();
    let src_desc = ImageDesc::new(config.frame.width, config.frame.height, PixelFormat::Rgb8);
    let dst_desc = ImageDesc::new(config.frame.width, config.frame.height, PixelFormat::Gray8);

    let mut params = vec![ImageBuffer::new(src_desc), ImageBuffer::new(dst_desc)];
    for frame in 0..config.frames {
        render_frame(&mut params[0], frame);
        executor.execute(&mut graph, &mut params).await?;
    }
    Ok(executor.perf_handle())
}

/// Continuous execution with a small recycled buffer pool per parameter,
/// keeping the refill work of frame N+1 overlapped with the execution of
/// frame N.
async fn run_pipelined(
    graph: Graph,
    input: ParamIndex,
    output: ParamIndex,
    config: &EngineConfig,
) -> anyhow::Result<Arc<PerfRecorder>> {
    let src_desc = ImageDesc::new(config.frame.width, config.frame.height, PixelFormat::Rgb8);
    let dst_desc = ImageDesc::new(config.frame.width, config.frame.height, PixelFormat::Gray8);

    let depth = config.pipeline.get_queue_depth();
    let pipeline = PipelinedExecutor::start(graph, config.pipeline.options())?;

    // Prime every queue up to its depth, then recycle.
    let primed = depth.min(config.frames);
    let mut sources = BufferPool::new(src_desc, primed).into_buffers();
    for (frame, src) in sources.iter_mut().enumerate() {
        render_frame(src, frame);
    }
    pipeline.enqueue_ready(input, &mut sources).await?;
    pipeline
        .enqueue_ready(output, &mut BufferPool::new(dst_desc, primed).into_buffers())
        .await?;

    for frame in primed..config.frames {
        let mut done_in = pipeline.dequeue_done(input, 1).await?;
        let mut src = done_in.remove(0);
        render_frame(&mut src, frame);
        pipeline.enqueue_ready(input, &mut vec![src]).await?;

        let mut done_out = pipeline.dequeue_done(output, 1).await?;
        // A real consumer would hand the grayscale frame off here.
        let result = done_out.remove(0);
        pipeline.enqueue_ready(output, &mut vec![result]).await?;
    }

    pipeline.wait().await;
    let remaining = pipeline.check_done(output).await?;
    pipeline.dequeue_done(output, remaining).await?;
    if let Some(err) = pipeline.take_error().await {
        return Err(err.into());
    }

    let perf = pipeline.perf_handle();
    pipeline.shutdown().await?;
    Ok(perf)
}

fn print_perf(perf: &PerfRecorder) {
    if let Some(snap) = perf.snapshot(PerfScope::Graph) {
        println!(
            "graph: count={} avg={:?} min={:?} max={:?} total={:?}",
            snap.count, snap.avg, snap.min, snap.max, snap.sum
        );
    }
    // Stage scopes follow insertion order: extract first, then warp.
    for idx in 0.. {
        match perf.snapshot(PerfScope::stage(idx)) {
            Some(snap) => println!(
                "  stage {idx}: count={} avg={:?} min={:?} max={:?}",
                snap.count, snap.avg, snap.min, snap.max
            ),
            None => break,
        }
    }
}
