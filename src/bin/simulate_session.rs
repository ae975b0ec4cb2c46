use planar_ar::{ArConfig, ArRuntime, LayerRegistry};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("[simulate] error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match env::args().nth(1).map(PathBuf::from) {
        Some(path) => ArConfig::load(&path)?,
        None => ArConfig::simulated(),
    };
    let frames = config.max_frames.max(1);
    let delta_seconds = config.target_frame_time;

    let mut runtime = ArRuntime::new(config, &LayerRegistry::with_defaults(), None)?;
    for _ in 0..frames {
        runtime.tick(delta_seconds)?;
        if let Some(telemetry) = runtime.telemetry() {
            println!("{}", telemetry.to_json()?);
        }
    }

    println!(
        "[simulate] {} planes, {} nodes",
        runtime.world().scene().planes().count(),
        runtime.world().scene().len()
    );
    runtime.shutdown();
    Ok(())
}
