//! Bezier Particles headless runner
//!
//! Runs a preset without a window and logs what the kernel does. The pointer
//! is simulated as a point orbiting the origin.
//!
//! Usage: `bezier-particles [rain|curve|bluenoise] [ticks]`

use glam::Vec2;

use bezier_particles::consts::DEFAULT_DT;
use bezier_particles::sim::{ParticleSystem, TickInput, TickReport};
use bezier_particles::{Preset, Settings};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let preset = match args.next() {
        Some(name) => match Preset::from_str(&name) {
            Some(preset) => preset,
            None => {
                log::error!("Unknown preset '{}', expected rain, curve or bluenoise", name);
                std::process::exit(2);
            }
        },
        None => Preset::default(),
    };
    let ticks: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(600);

    log::info!("Bezier Particles (native) starting: {} for {} ticks", preset.as_str(), ticks);

    let mut system = match ParticleSystem::new(Settings::from_preset(preset)) {
        Ok(system) => system,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let ticks_per_second = (1.0 / DEFAULT_DT).round() as u64;
    let mut window = TickReport::default();

    for n in 0..ticks {
        let time = n as f32 * DEFAULT_DT;
        let input = TickInput {
            target: Some(0.6 * Vec2::new((time * 0.7).cos(), (time * 1.1).sin())),
            ..Default::default()
        };
        let report = system.tick(&input, DEFAULT_DT);

        window.spawned += report.spawned;
        window.expired += report.expired;
        window.out_of_bounds += report.out_of_bounds;
        window.collisions += report.collisions;
        window.spawn_skipped += report.spawn_skipped;

        if (n + 1) % ticks_per_second == 0 {
            let draw = system.draw_list();
            log::info!(
                "t={:>5.1}s alive={:>4} spawned={:>3} expired={:>3} out={:>3} hits={:>3} skipped={:>3} line_verts={}",
                time + DEFAULT_DT,
                system.len(),
                window.spawned,
                window.expired,
                window.out_of_bounds,
                window.collisions,
                window.spawn_skipped,
                draw.line_vertices().len()
            );
            window = TickReport::default();
        }
    }

    println!("{} particles alive after {} ticks", system.len(), system.time_ticks());
}
