/// ARM3D Terminal Demo - Jointed Robot Arm
///
/// Renders the articulated arm with the terminal-based ASCII rasterizer.
/// Usage: arm3d-terminal [config.json]
/// Controls:
///   - Left/Right: Rotate arm1 around the vertical axis
///   - Up/Down: Bend arm2 at the elbow
///   - A/D: Rotate the palm
///   - W/S: Open and close the fingers
///   - Q/ESC: Quit

use anyhow::Context;
use arm3d_core::ArmConfig;
use arm3d_terminal::{init_logging, LoggingConfig, TerminalApp};
use std::env;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    println!("ARM3D Terminal Renderer - Loading...");

    let config = match env::args().nth(1) {
        Some(path) => ArmConfig::load(&path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => ArmConfig::default(),
    };
    log::info!("starting {:?} arm", config.kind);

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    // Run the terminal app
    let mut app = TerminalApp::new(config)?;
    app.run()?;

    println!("Thank you for using ARM3D Terminal Renderer!");
    Ok(())
}
