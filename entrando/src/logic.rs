//! Interfaces to the item-placement/progression collaborators. The entrance
//! randomizer only queries which locations could hold required progress; the
//! progression engine itself lives elsewhere.

use hashbrown::{HashMap, HashSet};

pub trait ProgressionLogic {
    /// Every item location name known to the logic.
    fn item_locations(&self) -> Vec<String>;

    /// The subset of the given locations that could hold required progress
    /// under the current settings.
    fn filter_locations_for_progression(&self, location_names: &[String]) -> Vec<String>;

    fn is_dungeon_or_cave(&self, location_name: &str) -> bool;

    /// The zone prefix of a location name (e.g. "Forbidden Woods" for
    /// "Forbidden Woods - Mothula Miniboss Room").
    fn location_zone_name(&self, location_name: &str) -> String;

    /// Called after all pools are assigned so the logic can rebuild any
    /// reachability structures that depend on entrance connections.
    fn update_entrance_connection_macros(&mut self, connections: &HashMap<String, String>);
}

/// Race-mode boss reward data: which critical destinations are required this
/// seed and which are banned (must never hold required progress).
#[derive(Clone, Debug, Default)]
pub struct BossRewards {
    pub required_bosses: Vec<String>,
    pub banned_bosses: Vec<String>,
    pub required_dungeons: Vec<String>,
    pub banned_dungeons: Vec<String>,
    pub banned_locations: HashSet<String>,
}
