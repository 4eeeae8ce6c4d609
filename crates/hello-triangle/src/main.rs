use anyhow::Result;

use hello_triangle_engine::device::GpuInit;
use hello_triangle_engine::logging::{init_logging, LoggingConfig};
use hello_triangle_engine::render::Renderer;
use hello_triangle_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig::default();
    log::info!(
        "starting \"{}\" ({}x{})",
        config.title,
        config.initial_size.width,
        config.initial_size.height
    );

    Runtime::run(config, GpuInit::default(), |view| Renderer::new(view))?;

    log::info!("bye");
    Ok(())
}
