//! Stat and effect tag module.
//!
//! Provides the closed `StatTag` and `EffectType` enums. Both display and
//! parse as snake_case so they can be named in configuration files and logs.

use serde::{Deserialize, Serialize};

/// Attribute kinds an entity can own.
///
/// Each entity is configured with at most one record per tag. Reading or
/// writing a tag the entity was not configured with is a warned no-op.
///
/// # Examples
///
/// ```rust
/// use zzeffect::StatTag;
///
/// let tag: StatTag = "move_speed".parse().unwrap();
/// assert_eq!(tag, StatTag::MoveSpeed);
/// assert_eq!(StatTag::FireInterval.to_string(), "fire_interval");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatTag {
    Level,
    Exp,
    Health,
    MoveSpeed,
    /// Seconds between shots.
    FireInterval,
    Damage,
    // Ammo counters, one per weapon.
    AnchovyBullet,
    SausageBullet,
    GarlicBullet,
    FlyingFishRoeBullet,
    ChiliPepperAndTunaBullet,
}

impl StatTag {
    /// Get the snake_case name of this tag.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zzeffect::StatTag;
    ///
    /// assert_eq!(StatTag::Health.as_str(), "health");
    /// ```
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

/// Type tag of an effect.
///
/// Uniqueness is checked per type, and safe removal requires the caller to
/// present the type it expects the id to resolve to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectType {
    Test,
    Damage,
    Heal,
    Slow,
    Stun,
    Freeze,
    Burn,
    Buff,
    /// Damage zone applied while an entity stands inside it.
    AreaDamage,
    SpeedBuff,
    /// Consumable pickups (food, ammo crates).
    Pickup,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_stat_tag_parse_roundtrip() {
        for tag in StatTag::iter() {
            let parsed: StatTag = tag.as_str().parse().unwrap();
            assert_eq!(parsed, tag);
        }
    }

    #[test]
    fn test_stat_tag_parse_case_insensitive() {
        let tag: StatTag = "HEALTH".parse().unwrap();
        assert_eq!(tag, StatTag::Health);
        assert!("mana".parse::<StatTag>().is_err());
    }

    #[test]
    fn test_stat_tag_serde_matches_display() {
        let json = serde_json::to_string(&StatTag::ChiliPepperAndTunaBullet).unwrap();
        assert_eq!(json, "\"chili_pepper_and_tuna_bullet\"");
    }

    #[test]
    fn test_effect_type_display() {
        assert_eq!(EffectType::AreaDamage.to_string(), "area_damage");
        assert_eq!("speed_buff".parse::<EffectType>().unwrap(), EffectType::SpeedBuff);
    }
}
