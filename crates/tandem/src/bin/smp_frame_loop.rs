//! # SMP Frame Loop
//!
//! Runs the front end / renderer handoff for a fixed number of frames on a
//! simulated context and driver, then prints handoff statistics.
//!
//! ```bash
//! # defaults: 600 frames, native (simulated) driver
//! ./smp_frame_loop
//!
//! # with a config file and debug logging
//! RUST_LOG=debug ./smp_frame_loop tandem.toml
//! ```

use std::sync::atomic::Ordering;

use tandem::core::{HandoffCoordinator, OsThreadSpawner};
use tandem::gl::gl::{
    GL_BLEND, GL_COLOR_BUFFER_BIT, GL_DEPTH_BUFFER_BIT, GL_DEPTH_TEST, GL_LEQUAL,
    GL_ONE_MINUS_SRC_ALPHA, GL_SRC_ALPHA, GL_TEXTURE0_ARB, GL_TRIANGLES, GL_UNSIGNED_SHORT,
};
use tandem::gl::{
    init_gl, init_null, select_backend, BackendKind, GraphicsBackend, PfdFlags,
    PixelFormatDescriptor, PixelType, PlatformInfo, Surface, WindowFrame,
};
use tandem::sim::resolve_all;
use tandem::{
    FrameLoop, RenderCommand, SimulatedContext, SimulatedDriver, TandemConfig, TandemResult,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const WINDOW_FRAME: WindowFrame = WindowFrame { left: 3, top: 22, right: 3, bottom: 3 };

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => TandemConfig::from_file(path),
        None => Ok(TandemConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("smp_frame_loop: {err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&config) {
        eprintln!("smp_frame_loop: {err}");
        std::process::exit(1);
    }
}

fn run(config: &TandemConfig) -> TandemResult<()> {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    TANDEM SMP FRAME LOOP");
    println!("═══════════════════════════════════════════════════════════════════");
    println!();

    let desktop = config.simulation.desktop();
    let driver = SimulatedDriver::new();
    let counters = driver.counters();

    let native: Box<dyn GraphicsBackend> = Box::new(driver);
    let mut backend =
        select_backend(config.platform.backend, Some(native), config.platform.log_target()?)?;

    let platform = match config.platform.backend {
        BackendKind::Native => {
            let formats = simulated_pixel_formats(desktop.color_bits);
            let surface = Surface {
                pixel_formats: &formats,
                frame: WINDOW_FRAME,
                lookup: &resolve_all,
            };
            init_gl(&config.platform, &desktop, &surface, &mut *backend)?
        }
        BackendKind::Null => init_null(&config.platform, &desktop, WINDOW_FRAME)?,
    };
    print_platform(&platform);

    let context = match config.simulation.bind_failure_every {
        Some(n) => SimulatedContext::failing_every(n),
        None => SimulatedContext::new(),
    };
    let handoff = HandoffCoordinator::new(context, config.handoff.clone())?;

    let mut frame_loop = FrameLoop::start(handoff, backend, &OsThreadSpawner)?;
    for frame in 0..config.frames {
        frame_loop.submit(build_frame(frame, &platform))?;
    }
    info!(frames = frame_loop.frame_count(), "all frames submitted");

    let handoff = std::sync::Arc::clone(frame_loop.handoff());
    let front_end = frame_loop.stats().clone();
    let render = frame_loop.shutdown()?;
    let sync = handoff.stats();

    println!();
    front_end.print_summary();
    println!();
    println!("┌─ RENDERER ───────────────────────────────────────────────────────┐");
    println!("│ Frames Rendered:    {}", render.frames_rendered);
    println!("│ Frames Skipped:     {}", render.frames_skipped);
    println!("│ Commands Executed:  {}", render.commands_executed);
    println!("│ Draw Calls:         {}", counters.draws.load(Ordering::Relaxed));
    println!("│ Indices:            {}", counters.indices.load(Ordering::Relaxed));
    println!("│ GL Errors:          {}", render.gl_errors);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ HANDOFF ────────────────────────────────────────────────────────┐");
    println!("│ Handoffs:           {}", sync.handoffs);
    println!("│ Bind Failures:      {}", sync.bind_failures);
    println!("│ Unbind Failures:    {}", sync.unbind_failures);
    println!("│ Aborted Cycles:     {}", sync.aborted_cycles);
    println!("│ Injected Failures:  {}", handoff.context().failed_binds());
    println!("│ Ownership Errors:   {}", handoff.context().violations());
    println!("└──────────────────────────────────────────────────────────────────┘");

    Ok(())
}

/// Formats a typical consumer driver reports: one software format, then
/// hardware formats at 16 and desktop depth.
fn simulated_pixel_formats(desktop_color_bits: u8) -> Vec<PixelFormatDescriptor> {
    let window = PfdFlags::DRAW_TO_WINDOW | PfdFlags::SUPPORT_OPENGL | PfdFlags::DOUBLEBUFFER;
    let pfd = |flags, color_bits, depth_bits, stencil_bits| PixelFormatDescriptor {
        flags,
        pixel_type: PixelType::Rgba,
        color_bits,
        depth_bits,
        stencil_bits,
    };
    vec![
        pfd(window | PfdFlags::GENERIC_FORMAT, desktop_color_bits, 32, 8),
        pfd(window, 16, 16, 0),
        pfd(window, desktop_color_bits, 24, 0),
        pfd(window, desktop_color_bits, 24, 8),
        pfd(window | PfdFlags::STEREO, desktop_color_bits, 24, 8),
    ]
}

fn build_frame(frame: u64, platform: &PlatformInfo) -> Vec<RenderCommand> {
    let width = i32::try_from(platform.mode.width).unwrap_or(i32::MAX);
    let height = i32::try_from(platform.mode.height).unwrap_or(i32::MAX);
    let batches = 4 + frame % 8;

    let mut commands = vec![
        RenderCommand::Comment(format!("*** frame {frame} ***\n")),
        RenderCommand::SetViewport { x: 0, y: 0, width, height },
        RenderCommand::ClearColor([0.0, 0.0, 0.0, 1.0]),
        RenderCommand::Clear(GL_COLOR_BUFFER_BIT | GL_DEPTH_BUFFER_BIT),
        RenderCommand::Enable(GL_DEPTH_TEST),
        RenderCommand::DepthFunc(GL_LEQUAL),
        RenderCommand::DepthMask(true),
    ];

    for batch in 0..batches {
        if batch == batches / 2 {
            commands.push(RenderCommand::Enable(GL_BLEND));
            commands.push(RenderCommand::BlendFunc(GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA));
            commands.push(RenderCommand::DepthMask(false));
        }
        let quads: u16 = 16;
        let indices: Vec<u8> = (0..quads * 6).flat_map(u16::to_le_bytes).collect();
        commands.push(RenderCommand::BindTexture {
            unit: GL_TEXTURE0_ARB,
            texture: u32::try_from(batch + 1).unwrap_or(u32::MAX),
        });
        commands.push(RenderCommand::DrawElements {
            mode: GL_TRIANGLES,
            index_type: GL_UNSIGNED_SHORT,
            count: i32::from(quads) * 6,
            indices,
        });
    }

    commands
}

fn print_platform(platform: &PlatformInfo) {
    println!("┌─ PLATFORM ───────────────────────────────────────────────────────┐");
    println!(
        "│ Mode:               {}x{} ({})",
        platform.mode.width,
        platform.mode.height,
        if platform.mode.fullscreen { "fullscreen" } else { "windowed" }
    );
    println!(
        "│ Window:             {},{} {}x{}",
        platform.window.x, platform.window.y, platform.window.width, platform.window.height
    );
    match &platform.pixel_format {
        Some(format) => println!(
            "│ Pixel Format:       #{} color {} depth {} stencil {}",
            format.index,
            format.descriptor.color_bits,
            format.descriptor.depth_bits,
            format.descriptor.stencil_bits
        ),
        None => println!("│ Pixel Format:       none (no GL)"),
    }
    if !platform.driver.renderer.is_empty() {
        println!("│ Driver:             {} / {}", platform.driver.vendor, platform.driver.renderer);
    }
    println!("│ Texture Units:      {}", platform.capabilities.texture_units);
    println!("└──────────────────────────────────────────────────────────────────┘");
}
