use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct EntranceRandoSettings {
    pub randomize_dungeon_entrances: bool,
    pub randomize_miniboss_entrances: bool,
    pub randomize_boss_entrances: bool,
    pub randomize_secret_cave_entrances: bool,
    pub randomize_secret_cave_inner_entrances: bool,
    pub mix_entrances: MixEntrances,
    pub race_mode: bool,
    pub progression_dungeons: bool,
    pub progression_puzzle_secret_caves: bool,
    pub progression_combat_secret_caves: bool,
    pub progression_savage_labyrinth: bool,
    /// When set, the only locations reachable at the start of the game are
    /// behind dungeon/cave entrances, so a safety entrance must be chosen.
    pub dungeons_and_caves_only_start: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MixEntrances {
    #[default]
    Separate,
    Mixed,
}

impl EntranceRandoSettings {
    pub fn is_enabled(&self) -> bool {
        self.randomize_dungeon_entrances
            || self.randomize_miniboss_entrances
            || self.randomize_boss_entrances
            || self.randomize_secret_cave_entrances
            || self.randomize_secret_cave_inner_entrances
    }

    /// Nesting chains of length > 1 are only possible when at least one of
    /// the nested categories is randomized.
    pub fn nesting_enabled(&self) -> bool {
        self.randomize_miniboss_entrances
            || self.randomize_boss_entrances
            || self.randomize_secret_cave_inner_entrances
    }

    pub fn any_progression_caves(&self) -> bool {
        self.progression_puzzle_secret_caves
            || self.progression_combat_secret_caves
            || self.progression_savage_labyrinth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_json() {
        let settings: EntranceRandoSettings = serde_json::from_str(
            r#"{
                "randomize_dungeon_entrances": true,
                "randomize_miniboss_entrances": false,
                "randomize_boss_entrances": false,
                "randomize_secret_cave_entrances": true,
                "randomize_secret_cave_inner_entrances": false,
                "mix_entrances": "Mixed",
                "race_mode": true,
                "progression_dungeons": true,
                "progression_puzzle_secret_caves": false,
                "progression_combat_secret_caves": false,
                "progression_savage_labyrinth": false,
                "dungeons_and_caves_only_start": false
            }"#,
        )
        .unwrap();
        assert!(settings.is_enabled());
        assert!(!settings.nesting_enabled());
        assert_eq!(settings.mix_entrances, MixEntrances::Mixed);
    }

    #[test]
    fn test_default_settings_disabled() {
        let settings = EntranceRandoSettings::default();
        assert!(!settings.is_enabled());
        assert!(!settings.any_progression_caves());
    }
}
