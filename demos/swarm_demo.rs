//! Demonstration of the particle swarm core.
//!
//! Run with: cargo run --example swarm_demo

use glam::Vec3;
use std::sync::mpsc::channel;
use swarm_sim::render_bridge::{frame_to_instance_buffer, parse_instance_count};
use swarm_sim::{Notification, SwarmConfig, SwarmSim};

fn main() {
    println!("=== Swarm Sim - Demo ===\n");

    let config = SwarmConfig {
        capacity: 256,
        ..Default::default()
    };
    let (tx, rx) = channel();
    let mut sim = SwarmSim::with_sink(config, tx);

    let spawned = sim.spawn_scattered(200, Vec3::new(0.0, 2.0, 0.0), 15.0);
    println!("Spawned {spawned} agents");
    let registered = rx.try_iter().filter(|n| matches!(n, Notification::Registered { .. })).count();
    println!("Health collaborator received {registered} registrations\n");

    // Player walks a slow circle through the swarm
    println!("Running simulation for 300 ticks (5 seconds at 60 ticks/sec)...\n");
    let mut contacts = 0;
    let mut removed = 0;
    for tick in 0..300 {
        let t = tick as f32 / 60.0;
        let player = Vec3::new(t.cos() * 8.0, 0.0, t.sin() * 8.0);

        // Shoot whatever is under the crosshair every half second
        if tick % 30 == 0 {
            if let Some(id) = sim.identifier_for_render_index(tick % sim.active_count().max(1)) {
                let outcome = sim.notify_damage(id, 2.5);
                println!("  hit {id}: {outcome:?}");
            }
        }

        sim.tick(1.0 / 60.0, player);

        for notification in rx.try_iter() {
            match notification {
                Notification::PlayerContact { .. } => contacts += 1,
                Notification::Removed { .. } => removed += 1,
                Notification::Registered { .. } => {}
            }
        }

        if (tick + 1) % 60 == 0 {
            print_summary(&sim);
        }
    }

    println!("\nPlayer was struck {contacts} times, {removed} agents removed");

    let buffer = frame_to_instance_buffer(&sim.render_frame());
    println!(
        "Instance buffer: {} instances, {} floats",
        parse_instance_count(&buffer).unwrap_or(0),
        buffer.len()
    );
}

fn print_summary(sim: &SwarmSim) {
    let frame = sim.render_frame();
    let count = |state: &str| frame.agents.iter().filter(|a| a.state == state).count();
    println!(
        "--- Tick {} (t={:.1}s) --- active={} idle={} orbit={} attack={} dying={}",
        frame.tick,
        frame.time,
        frame.agents.len(),
        count("Idle"),
        count("Orbit"),
        count("Attack"),
        count("Dying"),
    );
}
