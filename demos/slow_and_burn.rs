//! Slow and burn example: timed effects driven by a fixed step
//!
//! This example demonstrates:
//! - A unique slow built from a lifetime and a temporary modifier
//! - A periodic burn carrying its remainder between steps
//! - Driving an entity with the immediate commit policy
//!
//! Run with `RUST_LOG=zzeffect=debug` to see effect lifecycle logs.

use zzeffect::*;

const STEP: f64 = 0.25;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = StatConfig::new()
        .with(StatTag::Health, 100.0)
        .with(StatTag::MoveSpeed, 8.0);
    let mut entity = StatEntity::new(&config, CommitPolicy::Immediate);

    let slow = || {
        EffectSpec::create(EffectType::Slow)
            .unique(true)
            .handler(LifetimeHandler::new(1.5))
            .handler(TemporaryModifierHandler::new(
                StatTag::MoveSpeed,
                ModifierKind::Multiplicative,
                0.5,
            ))
    };
    let mut burn = Some(
        EffectSpec::create(EffectType::Burn)
            .handler(LifetimeHandler::new(3.0))
            .handler(PeriodicHandler::new(StatTag::Health, 0.6, -4.0)),
    );

    let mut burn_id = EffectId::NONE;
    for frame in 0..16 {
        let time = frame as f64 * STEP;
        entity.step(STEP, |manager| {
            if let Some(burn) = burn.take() {
                manager.add_effect(slow());
                burn_id = manager.add_effect(burn);
            }
            if frame == 2 && manager.add_effect(slow()).is_none() {
                println!("t={time:.2}: slow already active, reapply rejected");
            }
        });

        println!(
            "t={:.2}: health {:>6.2}  move_speed {:>5.2}  effects {}",
            time + STEP,
            entity.stats().final_value(StatTag::Health),
            entity.stats().final_value(StatTag::MoveSpeed),
            entity.manager().active_effect_count(),
        );
    }

    println!(
        "\nburn {} still active: {}",
        burn_id,
        entity.manager().is_active(burn_id)
    );
}
