//! Progression tables: skill levels, player levels, mana capacity, and the
//! attack rating fed to the combat cost formula.

use manaloop_core::cost::attack_power;
use manaloop_core::WorldState;

use crate::domain::{Progress, Village};

/// Skill name constants, as stored in [`Progress::skills`].
pub mod skills {
    /// Trained on the scarecrow; feeds the attack rating.
    pub const HAND_TO_HAND: &str = "HandToHand";
    /// Caps how much of the body attribute counts toward attack.
    pub const BODY_CONTROL: &str = "BodyControl";
    /// Scales firefly mana refills.
    pub const FIREFLY_FRIEND: &str = "FireflyFriend";
    /// Grown by burning hats at the bonfire.
    pub const VILLAGER_AFFINITY: &str = "VillagerAffinity";
    /// Grown by burning teeth at the bonfire.
    pub const BEAST_AFFINITY: &str = "BeastAffinity";
    /// Grown by burning tails at the bonfire; scales critter XP.
    pub const CRITTER_AFFINITY: &str = "CritterAffinity";
    /// Grown by burning rodents at the bonfire; scales rat XP.
    pub const RODENT_AFFINITY: &str = "RodentAffinity";
}

/// Item name constants, as stored in [`crate::domain::RunState::inventory`].
pub mod items {
    /// Drunk automatically when mana runs low.
    pub const POTION: &str = "s_potion";
    /// Dropped by the cave; the old man trades one for a potion.
    pub const BAT: &str = "bat";
    /// Dropped by rats; burnable at the bonfire.
    pub const RODENT: &str = "rodent";
    /// Dropped by critters; burnable at the bonfire.
    pub const TAIL: &str = "tail";
    /// Burnable at the bonfire.
    pub const TOOTH: &str = "tooth";
    /// Burnable at the bonfire.
    pub const HAT: &str = "hat";
    /// Harvested from the field.
    pub const CARROT: &str = "carrot";
}

/// XP needed to leave each level, shared by skills and the player level.
pub const XP_THRESHOLDS: [f64; 60] = [
    150.0, 450.0, 900.0, 1500.0, 2250.0, 3150.0, 4200.0, 5400.0, 6750.0, 8250.0, 9900.0, 11700.0,
    13650.0, 15750.0, 18000.0, 20400.0, 22950.0, 25650.0, 28500.0, 31500.0, 34650.0, 37950.0,
    41400.0, 45000.0, 48750.0, 52650.0, 56700.0, 60900.0, 65250.0, 69750.0, 74400.0, 79200.0,
    84150.0, 89250.0, 94500.0, 99900.0, 105450.0, 111150.0, 117000.0, 123000.0, 129150.0,
    135450.0, 141900.0, 148500.0, 155250.0, 162150.0, 169200.0, 176400.0, 183750.0, 191250.0,
    198900.0, 206700.0, 214650.0, 222750.0, 231000.0, 239400.0, 247950.0, 256650.0, 265500.0,
    274500.0,
];

/// The level reached at `xp` points; saturates at the table's end.
#[must_use]
pub fn threshold_level(xp: f64) -> u32 {
    XP_THRESHOLDS
        .iter()
        .position(|threshold| xp < *threshold)
        .unwrap_or(XP_THRESHOLDS.len()) as u32
}

/// The trained level of `skill`.
#[must_use]
pub fn skill_level(progress: &Progress, skill: &str) -> u32 {
    threshold_level(progress.skill_xp(skill))
}

/// The player level earned at `xp` points.
#[must_use]
pub fn player_level(xp: f64) -> u32 {
    threshold_level(xp)
}

/// Maximum mana at a given spirit attribute: `500 + spirit * 200`.
#[must_use]
pub fn max_mana(spirit: u32) -> f64 {
    500.0 + f64::from(spirit) * 200.0
}

/// The attack rating dividing combat costs: base attack 1, no weapon, the
/// body attribute capped by the BodyControl skill, plus HandToHand.
#[must_use]
pub fn attack_rating(world: &WorldState<Village>) -> f64 {
    let progress = &world.global.persistent;
    let body = f64::from(world.global.loop_data.stats.body);
    let body_control = f64::from(skill_level(progress, skills::BODY_CONTROL));
    let hand_to_hand = f64::from(skill_level(progress, skills::HAND_TO_HAND));
    attack_power(1.0, body, 0.0, body_control, hand_to_hand)
}
