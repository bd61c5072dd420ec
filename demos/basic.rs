//! Basic example: staged writes, commit and modifier composition
//!
//! This example demonstrates:
//! - Building a stat store from configuration
//! - Applying an instant effect and committing it
//! - Composing modifiers and reading a breakdown

use zzeffect::*;

fn main() -> Result<(), StatError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = StatConfig::from_json(
        r#"{"entries":[
            {"tag":"health","base_value":100.0},
            {"tag":"damage","base_value":20.0}
        ]}"#,
    )?;
    let mut manager = EffectManager::new(&config);

    manager.stats_mut().subscribe(|event, _| {
        println!(
            "  changed {}: base {:.2} -> {:.2}, final {:.2} -> {:.2}",
            event.tag, event.old_base, event.new_base, event.old_final, event.new_final
        );
    });

    println!("Taking 30 damage:");
    manager.add_effect(
        EffectSpec::create(EffectType::Damage).handler(InstantHandler::new(StatTag::Health, -30.0)),
    );
    println!(
        "  before commit: health = {:.2}",
        manager.stats().try_base_value(StatTag::Health)?
    );
    manager.stats_mut().apply_pending_changes();
    println!(
        "  after commit:  health = {:.2}",
        manager.stats().try_base_value(StatTag::Health)?
    );

    println!("\nRegistering damage modifiers:");
    manager.add_modifier(Modifier::multiplicative(StatTag::Damage, 1.2));
    println!("  - 20% bonus multiplier");
    manager.add_modifier(Modifier::additive(StatTag::Damage, 10.0));
    println!("  - Item bonus: +10");
    manager.tick(0.02);

    if let Some(breakdown) = manager.breakdown(StatTag::Damage) {
        println!("\n=== Damage Breakdown ===");
        println!("Base: {:.2}", breakdown.base);
        for (desc, value) in &breakdown.steps {
            println!("  {}: {:.2}", desc, value);
        }
        println!("Final: {:.2}", breakdown.value);
    }

    println!(
        "\nCalculation: (20 + 10) * 1.2 = {:.2}",
        manager.stats().try_final_value(StatTag::Damage)?
    );

    Ok(())
}
