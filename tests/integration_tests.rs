use std::sync::{Arc, Mutex};
use zzeffect::*;

fn player_config() -> StatConfig {
    StatConfig::new()
        .with(StatTag::Level, 1.0)
        .with(StatTag::Exp, 0.0)
        .with(StatTag::Health, 100.0)
        .with(StatTag::MoveSpeed, 10.0)
        .with(StatTag::FireInterval, 0.5)
        .with(StatTag::Damage, 20.0)
}

fn record_events(store: &mut StatStore) -> Arc<Mutex<Vec<StatChangedEvent>>> {
    let events: Arc<Mutex<Vec<StatChangedEvent>>> = Arc::default();
    let sink = Arc::clone(&events);
    store.subscribe(move |event, _| sink.lock().unwrap().push(*event));
    events
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Instant damage is staged, then committed with a single notification.
#[test]
fn test_instant_damage_commit() {
    let mut manager = EffectManager::new(&StatConfig::new().with(StatTag::Health, 100.0));
    let events = record_events(manager.stats_mut());

    let id = manager.add_effect(
        EffectSpec::create(EffectType::Damage).handler(InstantHandler::new(StatTag::Health, -30.0)),
    );
    assert!(!id.is_none());
    assert_eq!(manager.stats().base_value(StatTag::Health), 100.0);

    assert_eq!(manager.stats_mut().apply_pending_changes(), 1);
    assert_eq!(manager.stats().base_value(StatTag::Health), 70.0);
    assert_eq!(manager.stats().final_value(StatTag::Health), 70.0);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tag, StatTag::Health);
    assert_eq!(events[0].old_base, 100.0);
    assert_eq!(events[0].new_base, 70.0);
    assert_eq!(events[0].old_final, 100.0);
    assert_eq!(events[0].new_final, 70.0);
}

/// A unique slow halves move speed for its lifetime, then reverts.
#[test]
fn test_slow_with_lifetime() {
    let mut manager = EffectManager::new(&player_config());
    let slow = || {
        EffectSpec::create(EffectType::Slow)
            .unique(true)
            .handler(LifetimeHandler::new(2.0))
            .handler(TemporaryModifierHandler::new(
                StatTag::MoveSpeed,
                ModifierKind::Multiplicative,
                0.5,
            ))
    };
    let id = manager.add_effect(slow());
    assert_eq!(manager.modifier_count(), 1);

    manager.tick(1.0);
    assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 5.0);
    assert_eq!(manager.stats().base_value(StatTag::MoveSpeed), 10.0);

    // Reapplying while active does not refresh or stack.
    assert!(manager.add_effect(slow()).is_none());
    assert_eq!(manager.modifier_count(), 1);

    manager.tick(1.0);
    assert!(!manager.is_active(id));
    assert_eq!(manager.modifier_count(), 0);
    assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 10.0);

    // Once expired, a new slow is accepted.
    assert!(!manager.add_effect(slow()).is_none());
}

/// The second unique buff of a frame is rejected and its handlers never run.
#[test]
fn test_duplicate_unique_buff() {
    let mut manager = EffectManager::new(&player_config());

    let first = manager.add_effect(
        EffectSpec::create(EffectType::Buff)
            .unique(true)
            .handler(InstantHandler::new(StatTag::Damage, 5.0).without_auto_end()),
    );
    let second = manager.add_effect(
        EffectSpec::create(EffectType::Buff)
            .unique(true)
            .handler(InstantHandler::new(StatTag::Health, 50.0))
            .handler(TemporaryModifierHandler::new(
                StatTag::Damage,
                ModifierKind::Override,
                999.0,
            )),
    );

    assert!(!first.is_none());
    assert_eq!(second, EffectId::NONE);
    assert_eq!(manager.effect_count(EffectType::Buff), 1);
    assert_eq!(manager.modifier_count(), 0);

    manager.tick(0.1);
    manager.stats_mut().apply_pending_changes();
    assert_eq!(manager.stats().base_value(StatTag::Damage), 25.0);
    assert_eq!(manager.stats().base_value(StatTag::Health), 100.0);
    assert_eq!(manager.stats().final_value(StatTag::Damage), 25.0);
}

/// Additive and multiplicative modifiers compose by kind, not add order.
#[test]
fn test_modifier_kind_order() {
    for additive_first in [true, false] {
        let mut manager = EffectManager::new(&player_config());
        let add = Modifier::additive(StatTag::Health, 10.0);
        let mul = Modifier::multiplicative(StatTag::Health, 1.2);
        if additive_first {
            manager.add_modifier(add);
            manager.add_modifier(mul);
        } else {
            manager.add_modifier(mul);
            manager.add_modifier(add);
        }

        manager.tick(0.0);
        assert!(approx(manager.stats().final_value(StatTag::Health), 132.0));

        let breakdown = manager.breakdown(StatTag::Health).unwrap();
        assert_eq!(breakdown.steps[0].0, "+10.00");
        assert_eq!(breakdown.steps[1].0, "×1.20");
        assert!(approx(breakdown.value, 132.0));
    }
}

/// A periodic handler carries the remainder between applications.
#[test]
fn test_periodic_carries_remainder() {
    let mut manager = EffectManager::new(&player_config());
    manager.add_effect(
        EffectSpec::create(EffectType::Burn).handler(PeriodicHandler::new(StatTag::Health, 1.0, -5.0)),
    );

    let step = |manager: &mut EffectManager, dt: f64| {
        manager.tick(dt);
        manager.stats_mut().apply_pending_changes();
        manager.stats().base_value(StatTag::Health)
    };

    assert_eq!(step(&mut manager, 0.4), 100.0);
    assert_eq!(step(&mut manager, 0.4), 100.0);
    assert_eq!(step(&mut manager, 0.4), 95.0);
    // 0.2 carried over: 0.8 more completes the next interval.
    assert_eq!(step(&mut manager, 0.8), 90.0);
    assert_eq!(step(&mut manager, 0.4), 90.0);
}

/// A safe removal with the wrong type leaves the effect running.
#[test]
fn test_safe_remove_wrong_type() {
    let mut manager = EffectManager::new(&player_config());
    let id = manager.add_effect(
        EffectSpec::create(EffectType::Burn).handler(PeriodicHandler::new(StatTag::Health, 1.0, -5.0)),
    );

    assert!(!manager.safe_remove_effect(id, EffectType::Freeze));
    assert!(manager.is_active(id));

    manager.tick(1.0);
    manager.stats_mut().apply_pending_changes();
    assert_eq!(manager.stats().base_value(StatTag::Health), 95.0);

    assert!(manager.safe_remove_effect(id, EffectType::Burn));
    assert!(!manager.safe_remove_effect(id, EffectType::Burn));
    manager.tick(1.0);
    manager.stats_mut().apply_pending_changes();
    assert_eq!(manager.stats().base_value(StatTag::Health), 95.0);
}

/// With no effects, every configured stat reads back its configured base.
#[test]
fn test_config_round_trip() {
    let config = player_config();
    let mut manager = EffectManager::new(&config);
    manager.tick(0.02);
    manager.stats_mut().apply_pending_changes();

    for entry in config.entries() {
        assert_eq!(manager.stats().base_value(entry.tag), entry.base_value);
        assert_eq!(manager.stats().final_value(entry.tag), entry.base_value);
    }
    assert_eq!(manager.stats().all_stat_tags().len(), config.len());
}

/// Configuration loaded from JSON behaves like configuration built in code.
#[test]
fn test_json_config() {
    let json = r#"{
        "entries": [
            { "tag": "health", "base_value": 80.0 },
            { "tag": "move_speed", "base_value": 6.0 },
            { "tag": "health", "base_value": 1.0 }
        ]
    }"#;
    let config = StatConfig::from_json(json).unwrap();
    let manager = EffectManager::new(&config);

    // First entry wins over the duplicate.
    assert_eq!(manager.stats().base_value(StatTag::Health), 80.0);
    assert_eq!(manager.stats().base_value(StatTag::MoveSpeed), 6.0);
    assert!(!manager.stats().contains(StatTag::Level));
}

/// Base writes accumulate within a window; final follows on commit.
#[test]
fn test_modifications_accumulate_before_commit() {
    let mut manager = EffectManager::new(&player_config());
    manager.add_modifier(Modifier::multiplicative(StatTag::Damage, 2.0));
    manager.tick(0.0);
    assert_eq!(manager.stats().final_value(StatTag::Damage), 40.0);

    for _ in 0..3 {
        manager.add_effect(
            EffectSpec::create(EffectType::Pickup).handler(InstantHandler::new(StatTag::Damage, 1.0)),
        );
    }
    let events = record_events(manager.stats_mut());
    assert_eq!(manager.stats_mut().apply_pending_changes(), 1);

    assert_eq!(manager.stats().base_value(StatTag::Damage), 23.0);
    assert_eq!(manager.stats().final_value(StatTag::Damage), 46.0);
    assert_eq!(events.lock().unwrap().len(), 1);
}

/// Modifier recomposition is visible the same tick; base writes the next commit.
#[test]
fn test_modifier_is_visible_before_base_commit() {
    let mut manager = EffectManager::new(&player_config());
    manager.add_effect(
        EffectSpec::create(EffectType::SpeedBuff)
            .handler(InstantHandler::new(StatTag::MoveSpeed, 2.0).without_auto_end())
            .handler(TemporaryModifierHandler::new(
                StatTag::MoveSpeed,
                ModifierKind::Additive,
                3.0,
            )),
    );

    manager.tick(0.02);
    assert_eq!(manager.stats().base_value(StatTag::MoveSpeed), 10.0);
    assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 13.0);

    manager.stats_mut().apply_pending_changes();
    assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 15.0);
}

/// Several temporary modifiers on one stat unwind in any expiry order.
#[test]
fn test_overlapping_temporary_modifiers() {
    let mut manager = EffectManager::new(&player_config());
    let short = manager.add_effect(
        EffectSpec::create(EffectType::Buff)
            .handler(LifetimeHandler::new(1.0))
            .handler(TemporaryModifierHandler::new(
                StatTag::FireInterval,
                ModifierKind::Multiplicative,
                0.5,
            )),
    );
    let long = manager.add_effect(
        EffectSpec::create(EffectType::Buff)
            .handler(LifetimeHandler::new(3.0))
            .handler(TemporaryModifierHandler::new(
                StatTag::FireInterval,
                ModifierKind::Additive,
                0.5,
            )),
    );

    manager.tick(0.5);
    assert_eq!(manager.stats().final_value(StatTag::FireInterval), 0.5);

    manager.tick(0.5);
    assert!(!manager.is_active(short));
    assert_eq!(manager.stats().final_value(StatTag::FireInterval), 1.0);

    manager.tick(2.0);
    assert!(!manager.is_active(long));
    assert_eq!(manager.stats().final_value(StatTag::FireInterval), 0.5);
}

/// An override replaces everything composed before it.
#[test]
fn test_override_wins() {
    let mut manager = EffectManager::new(&player_config());
    manager.add_effect(
        EffectSpec::create(EffectType::Freeze)
            .unique(true)
            .handler(LifetimeHandler::new(1.0))
            .handler(TemporaryModifierHandler::new(
                StatTag::MoveSpeed,
                ModifierKind::Override,
                0.0,
            )),
    );
    manager.add_modifier(Modifier::additive(StatTag::MoveSpeed, 5.0));
    manager.add_modifier(Modifier::multiplicative(StatTag::MoveSpeed, 3.0));

    manager.tick(0.5);
    assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 0.0);

    manager.tick(0.5);
    assert_eq!(manager.stats().final_value(StatTag::MoveSpeed), 45.0);
}

/// Unknown stats read as zero and ignore writes without panicking.
#[test]
fn test_unconfigured_stat_access() {
    let mut manager = EffectManager::new(&StatConfig::new().with(StatTag::Health, 10.0));
    assert_eq!(manager.stats().final_value(StatTag::GarlicBullet), 0.0);

    manager.add_effect(
        EffectSpec::create(EffectType::Pickup).handler(InstantHandler::new(StatTag::GarlicBullet, 1.0)),
    );
    manager.add_modifier(Modifier::additive(StatTag::GarlicBullet, 1.0));
    manager.tick(0.1);
    assert_eq!(manager.stats_mut().apply_pending_changes(), 0);
    assert_eq!(manager.stats().base_value(StatTag::GarlicBullet), 0.0);
    assert_eq!(
        manager.stats().try_base_value(StatTag::GarlicBullet),
        Err(StatError::UnknownStat(StatTag::GarlicBullet))
    );
    assert!(manager.breakdown(StatTag::GarlicBullet).is_none());
}

/// Deferred commit through the entity driver.
#[test]
fn test_entity_deferred_commit() {
    let mut entity = StatEntity::new(&player_config(), CommitPolicy::Deferred);
    let events = record_events(entity.stats_mut());

    for _ in 0..4 {
        entity.step(0.25, |manager| {
            manager.add_effect(
                EffectSpec::create(EffectType::AreaDamage)
                    .handler(InstantHandler::new(StatTag::Health, -1.0)),
            );
        });
    }
    assert_eq!(entity.stats().base_value(StatTag::Health), 100.0);
    assert!(events.lock().unwrap().is_empty());

    assert_eq!(entity.commit(), 1);
    assert_eq!(entity.stats().base_value(StatTag::Health), 96.0);
    assert_eq!(events.lock().unwrap().len(), 1);
}
