//! Level validator
//!
//! Checks that every level of a pack can be completed. Validates the built-in
//! levels, or the JSON level pack given as the first argument.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use ricochet::SimTuning;
    use ricochet::level::{builtin_levels, load_levels};
    use ricochet::validator::{SweepConfig, validate_all};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Ricochet level validator starting...");

    let levels = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => match load_levels(&path) {
            Ok(levels) => levels,
            Err(e) => {
                log::error!("Cannot load {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        None => builtin_levels(),
    };

    let tuning = SimTuning::load();
    let catalog = validate_all(&levels, &tuning, &SweepConfig::default());

    if catalog.all_solvable() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// The validator only runs natively; wasm builds embed the library instead
#[cfg(target_arch = "wasm32")]
fn main() {}
