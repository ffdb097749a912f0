use hashbrown::{HashMap, HashSet};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use entrando_game::{data, Catalog, Category, EntranceId, ExitId};

use crate::helpers::weighted_choice;
use crate::logic::{BossRewards, ProgressionLogic};
use crate::settings::{EntranceRandoSettings, MixEntrances};

const BOSS_ARENA_SUFFIX: &str = " Boss Arena";
const MINIBOSS_ARENA_SUFFIX: &str = " Miniboss Arena";

/// Fatal failures of a single randomization attempt. None of these are
/// retried internally: `NoCategoriesEnabled` and `InsufficientIslandEntrances`
/// mean the selected options cannot be satisfied, `NoValidExit` means this
/// seed painted itself into a corner (a caller may retry with a new seed),
/// and `EntranceLoop`/`InvariantViolation` indicate an engine defect.
#[derive(Debug, Error)]
pub enum EntranceRandoError {
    #[error("An invalid combination of entrance randomizer options was selected")]
    NoCategoriesEnabled,
    #[error("Not enough island entrances for {needed} nonprogress exits ({available} available)")]
    InsufficientIslandEntrances { needed: usize, available: usize },
    #[error("No valid exits to place for entrance: {0}")]
    NoValidExit(String),
    #[error("Entrances are in an infinite loop: {0}")]
    EntranceLoop(String),
    #[error("Entrance randomization invariant violated: {0}")]
    InvariantViolation(String),
}

/// The entrance/exit assignment being built. Both directions are updated
/// atomically, so the inverse-map invariant holds structurally at every
/// point of the algorithm.
#[derive(Clone, Default)]
pub struct EntranceBijection {
    entrance_to_exit: HashMap<EntranceId, ExitId>,
    exit_to_entrance: HashMap<ExitId, EntranceId>,
}

impl EntranceBijection {
    pub fn insert(&mut self, entrance: EntranceId, exit: ExitId) {
        let prev_exit = self.entrance_to_exit.insert(entrance, exit);
        let prev_entrance = self.exit_to_entrance.insert(exit, entrance);
        assert!(
            prev_exit.is_none() && prev_entrance.is_none(),
            "Entrance connection inserted twice"
        );
    }

    pub fn remove_by_entrance(&mut self, entrance: EntranceId) -> Option<ExitId> {
        let exit = self.entrance_to_exit.remove(&entrance)?;
        let back = self.exit_to_entrance.remove(&exit);
        assert_eq!(back, Some(entrance));
        Some(exit)
    }

    pub fn exit_for_entrance(&self, entrance: EntranceId) -> Option<ExitId> {
        self.entrance_to_exit.get(&entrance).copied()
    }

    pub fn entrance_for_exit(&self, exit: ExitId) -> Option<EntranceId> {
        self.exit_to_entrance.get(&exit).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntranceId, ExitId)> + '_ {
        self.entrance_to_exit.iter().map(|(&en, &ex)| (en, ex))
    }

    pub fn len(&self) -> usize {
        self.entrance_to_exit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrance_to_exit.is_empty()
    }
}

/// One independent randomization pool: these entrances and exits are
/// assigned jointly, disjoint from every other pool in the run.
#[derive(Clone, Debug, Default)]
pub struct EntrancePool {
    pub entrances: Vec<EntranceId>,
    pub exits: Vec<ExitId>,
}

pub struct EntranceRandomizer<'a, L: ProgressionLogic> {
    pub catalog: &'a Catalog,
    pub settings: &'a EntranceRandoSettings,
    pub boss_rewards: &'a BossRewards,
    logic: &'a mut L,
    connections: EntranceBijection,
    item_location_to_exit: HashMap<String, ExitId>,
    exit_to_item_location_names: HashMap<ExitId, Vec<String>>,
    entrances_with_no_requirements: HashSet<EntranceId>,
    exits_with_no_requirements: HashSet<ExitId>,
    nested_entrance_paths: Vec<Vec<String>>,
    safety_entrance: Option<EntranceId>,
    race_mode_banned_exits: HashSet<ExitId>,
    // Carried across pools within a run so a later pool cannot reuse an
    // island that already received a banned dungeon or boss.
    islands_with_a_banned_exit: HashSet<String>,
}

impl<'a, L: ProgressionLogic> EntranceRandomizer<'a, L> {
    pub fn new(
        catalog: &'a Catalog,
        settings: &'a EntranceRandoSettings,
        boss_rewards: &'a BossRewards,
        logic: &'a mut L,
    ) -> anyhow::Result<Self> {
        let mut overrides: HashMap<String, ExitId> = HashMap::new();
        for &(location_name, exit_name) in data::ITEM_LOCATION_TO_EXIT_OVERRIDES {
            overrides.insert(location_name.to_string(), catalog.exit_id(exit_name)?);
        }

        let mut item_location_to_exit: HashMap<String, ExitId> = HashMap::new();
        let mut exit_to_item_location_names: HashMap<ExitId, Vec<String>> = HashMap::new();
        for location_name in logic.item_locations() {
            let Some(exit) = zone_exit_for_item_location(catalog, &*logic, &overrides, &location_name)
            else {
                continue;
            };
            item_location_to_exit.insert(location_name.clone(), exit);
            exit_to_item_location_names.entry(exit).or_default().push(location_name);
        }

        let mut entrances_with_no_requirements: HashSet<EntranceId> = HashSet::new();
        if settings.progression_dungeons {
            for name in data::DUNGEON_ENTRANCE_NAMES_WITH_NO_REQUIREMENTS {
                entrances_with_no_requirements.insert(catalog.entrance_id(name)?);
            }
        }
        if settings.any_progression_caves() {
            for name in data::SECRET_CAVE_ENTRANCE_NAMES_WITH_NO_REQUIREMENTS {
                entrances_with_no_requirements.insert(catalog.entrance_id(name)?);
            }
        }

        let mut exits_with_no_requirements: HashSet<ExitId> = HashSet::new();
        if settings.progression_dungeons {
            for name in data::DUNGEON_EXIT_NAMES_WITH_NO_REQUIREMENTS {
                exits_with_no_requirements.insert(catalog.exit_id(name)?);
            }
        }
        if settings.progression_puzzle_secret_caves {
            for name in data::PUZZLE_SECRET_CAVE_EXIT_NAMES_WITH_NO_REQUIREMENTS {
                exits_with_no_requirements.insert(catalog.exit_id(name)?);
            }
        }
        if settings.progression_combat_secret_caves {
            for name in data::COMBAT_SECRET_CAVE_EXIT_NAMES_WITH_NO_REQUIREMENTS {
                exits_with_no_requirements.insert(catalog.exit_id(name)?);
            }
        }
        // No need to check progression_savage_labyrinth: neither of the items
        // inside Savage is requirement-free.

        let mut connections = EntranceBijection::default();
        for &(entrance, exit) in &catalog.vanilla_connections {
            connections.insert(entrance, exit);
        }

        Ok(EntranceRandomizer {
            catalog,
            settings,
            boss_rewards,
            logic,
            connections,
            item_location_to_exit,
            exit_to_item_location_names,
            entrances_with_no_requirements,
            exits_with_no_requirements,
            nested_entrance_paths: vec![],
            safety_entrance: None,
            race_mode_banned_exits: HashSet::new(),
            islands_with_a_banned_exit: HashSet::new(),
        })
    }

    pub fn randomize<R: Rng>(&mut self, rng: &mut R) -> Result<(), EntranceRandoError> {
        let pools = self.entrance_pools()?;
        info!("Randomizing {} entrance pool(s)", pools.len());
        self.islands_with_a_banned_exit.clear();
        for pool in &pools {
            self.randomize_one_pool(pool, rng)?;
        }
        self.finalize()
    }

    /// Groups the enabled categories into independent pools: the dungeon
    /// family and the cave family stay disjoint in `Separate` mode, and merge
    /// into one pool otherwise.
    pub fn entrance_pools(&self) -> Result<Vec<EntrancePool>, EntranceRandoError> {
        let s = self.settings;
        let any_dungeons = s.randomize_dungeon_entrances
            || s.randomize_miniboss_entrances
            || s.randomize_boss_entrances;
        let any_caves =
            s.randomize_secret_cave_entrances || s.randomize_secret_cave_inner_entrances;
        if !any_dungeons && !any_caves {
            return Err(EntranceRandoError::NoCategoriesEnabled);
        }
        if s.mix_entrances == MixEntrances::Separate && any_dungeons && any_caves {
            Ok(vec![
                self.one_pool(
                    s.randomize_dungeon_entrances,
                    s.randomize_miniboss_entrances,
                    s.randomize_boss_entrances,
                    false,
                    false,
                ),
                self.one_pool(
                    false,
                    false,
                    false,
                    s.randomize_secret_cave_entrances,
                    s.randomize_secret_cave_inner_entrances,
                ),
            ])
        } else {
            Ok(vec![self.one_pool(
                s.randomize_dungeon_entrances,
                s.randomize_miniboss_entrances,
                s.randomize_boss_entrances,
                s.randomize_secret_cave_entrances,
                s.randomize_secret_cave_inner_entrances,
            )])
        }
    }

    fn one_pool(
        &self,
        dungeons: bool,
        minibosses: bool,
        bosses: bool,
        caves: bool,
        inner_caves: bool,
    ) -> EntrancePool {
        let catalog = self.catalog;
        let mut pool = EntrancePool::default();
        if dungeons {
            // The Forsaken Fortress pair stays out of randomization entirely.
            pool.entrances.extend(
                catalog
                    .category_entrances(Category::Dungeon)
                    .iter()
                    .copied()
                    .filter(|&en| en != catalog.fixed_entrance_id),
            );
            pool.exits.extend(
                catalog
                    .category_exits(Category::Dungeon)
                    .iter()
                    .copied()
                    .filter(|&ex| ex != catalog.fixed_exit_id),
            );
        }
        if minibosses {
            pool.entrances.extend(catalog.category_entrances(Category::Miniboss));
            pool.exits.extend(catalog.category_exits(Category::Miniboss));
        }
        if bosses {
            pool.entrances.extend(catalog.category_entrances(Category::Boss));
            pool.exits.extend(catalog.category_exits(Category::Boss));
        }
        if caves {
            pool.entrances.extend(catalog.category_entrances(Category::SecretCave));
            pool.exits.extend(catalog.category_exits(Category::SecretCave));
        }
        if inner_caves {
            pool.entrances.extend(catalog.category_entrances(Category::InnerCave));
            pool.exits.extend(catalog.category_exits(Category::InnerCave));
        }
        pool
    }

    fn randomize_one_pool<R: Rng>(
        &mut self,
        pool: &EntrancePool,
        rng: &mut R,
    ) -> Result<(), EntranceRandoError> {
        let catalog = self.catalog;
        for &entrance in &pool.entrances {
            self.connections.remove_by_entrance(entrance);
        }
        for &exit in &pool.exits {
            assert!(self.connections.entrance_for_exit(exit).is_none());
        }

        let doing_dungeons = pool
            .exits
            .iter()
            .any(|&ex| catalog.exit(ex).category == Category::Dungeon);
        let doing_caves = pool
            .exits
            .iter()
            .any(|&ex| catalog.exit(ex).category == Category::SecretCave);

        let mut relevant_entrances = pool.entrances.clone();
        relevant_entrances.shuffle(rng);

        self.race_mode_banned_exits.clear();
        if self.settings.race_mode {
            for &ex in &pool.exits {
                let exit = catalog.exit(ex);
                let banned = match exit.category {
                    Category::Boss => exit
                        .unique_name
                        .strip_suffix(BOSS_ARENA_SUFFIX)
                        .is_some_and(|boss| {
                            self.boss_rewards.banned_bosses.iter().any(|b| b == boss)
                        }),
                    Category::Dungeon => self
                        .boss_rewards
                        .banned_dungeons
                        .iter()
                        .any(|d| d == &exit.unique_name),
                    Category::Miniboss => exit
                        .unique_name
                        .strip_suffix(MINIBOSS_ARENA_SUFFIX)
                        .is_some_and(|dungeon| {
                            self.boss_rewards.banned_dungeons.iter().any(|d| d == dungeon)
                        }),
                    _ => false,
                };
                if banned {
                    self.race_mode_banned_exits.insert(ex);
                }
            }
        }

        // If the player can't reach any item location at the start except
        // through these entrances, one requirement-free entrance is chosen up
        // front and later guaranteed to lead to a requirement-free exit.
        let doing_progress_entrances = self.settings.dungeons_and_caves_only_start
            && ((doing_dungeons && self.settings.progression_dungeons)
                || (doing_caves && self.settings.any_progression_caves()));
        self.safety_entrance = None;
        if doing_progress_entrances {
            let possible_safety_entrances: Vec<EntranceId> = relevant_entrances
                .iter()
                .copied()
                .filter(|en| self.entrances_with_no_requirements.contains(en))
                .collect();
            self.safety_entrance = possible_safety_entrances.choose(rng).copied();
        }

        // Terminal exits are computed per-pool rather than globally, so that
        // e.g. Ice Ring Isle counts as terminal when its inner cave is not
        // being randomized.
        let non_terminal_exits: HashSet<ExitId> = relevant_entrances
            .iter()
            .filter_map(|&en| catalog.entrance(en).nested_in)
            .collect();
        let terminal_exits: HashSet<ExitId> = pool
            .exits
            .iter()
            .copied()
            .filter(|ex| !non_terminal_exits.contains(ex))
            .collect();

        let mut remaining_entrances = relevant_entrances;
        let mut remaining_exits = pool.exits.clone();
        let (nonprogress_entrances, nonprogress_exits) =
            self.split_nonprogress(&remaining_entrances, &remaining_exits)?;
        if !nonprogress_entrances.is_empty() {
            remaining_entrances.retain(|en| !nonprogress_entrances.contains(en));
            remaining_exits.retain(|ex| !nonprogress_exits.contains(ex));
            self.assign_exits(&nonprogress_entrances, &nonprogress_exits, &terminal_exits, rng)?;
        }
        self.assign_exits(&remaining_entrances, &remaining_exits, &terminal_exits, rng)
    }

    /// Splits a pool into a sub-pool that provably cannot hold required
    /// progress and the progress-relevant remainder, so the two can be
    /// assigned independently without ever connecting to each other.
    fn split_nonprogress(
        &self,
        relevant_entrances: &[EntranceId],
        relevant_exits: &[ExitId],
    ) -> Result<(Vec<EntranceId>, Vec<ExitId>), EntranceRandoError> {
        let catalog = self.catalog;
        let mut nonprogress_exits: Vec<ExitId> = vec![];
        for &ex in relevant_exits {
            let locations = match self.exit_to_item_location_names.get(&ex) {
                Some(locations) if !locations.is_empty() => locations,
                _ => {
                    return Err(EntranceRandoError::InvariantViolation(format!(
                        "Exit has no associated item locations: {}",
                        catalog.exit(ex).unique_name
                    )))
                }
            };
            // Banned race mode locations still technically count as progress
            // locations, so they are filtered out separately first.
            let nonbanned: Vec<String> = locations
                .iter()
                .filter(|loc| !self.boss_rewards.banned_locations.contains(loc.as_str()))
                .cloned()
                .collect();
            if self.logic.filter_locations_for_progression(&nonbanned).is_empty() {
                nonprogress_exits.push(ex);
            }
        }
        let nonprogress_exit_set: HashSet<ExitId> = nonprogress_exits.iter().copied().collect();

        // Every nested entrance whose enclosing exit is nonprogress comes
        // along for free; island entrances are drawn to make up the rest.
        let mut nonprogress_entrances: Vec<EntranceId> = relevant_entrances
            .iter()
            .copied()
            .filter(|&en| {
                catalog
                    .entrance(en)
                    .nested_in
                    .is_some_and(|ex| nonprogress_exit_set.contains(&ex))
            })
            .collect();

        let mut possible_island_entrances: Vec<EntranceId> = relevant_entrances
            .iter()
            .copied()
            .filter(|&en| catalog.entrance(en).island_name.is_some())
            .collect();
        if let Some(safety) = self.safety_entrance {
            // The safety entrance must stay in the progress sub-pool, or the
            // item randomizer would have nowhere to put items at the start.
            possible_island_entrances.retain(|&en| en != safety);
            if self.settings.race_mode {
                // Also exclude anything sharing the safety entrance's island,
                // so a banned and a required dungeon can't end up together.
                let safety_island = catalog.entrance(safety).island_name.clone();
                possible_island_entrances
                    .retain(|&en| catalog.entrance(en).island_name != safety_island);
            }
        }

        let num_island_entrances_needed =
            nonprogress_exits.len().saturating_sub(nonprogress_entrances.len());
        if num_island_entrances_needed > possible_island_entrances.len() {
            return Err(EntranceRandoError::InsufficientIslandEntrances {
                needed: num_island_entrances_needed,
                available: possible_island_entrances.len(),
            });
        }
        // The entrance list is already shuffled, so taking from the front is
        // the same as drawing randomly.
        nonprogress_entrances.extend(possible_island_entrances.drain(..num_island_entrances_needed));

        assert_eq!(nonprogress_entrances.len(), nonprogress_exits.len());
        Ok((nonprogress_entrances, nonprogress_exits))
    }

    fn assign_exits<R: Rng>(
        &mut self,
        relevant_entrances: &[EntranceId],
        relevant_exits: &[ExitId],
        terminal_exits: &HashSet<ExitId>,
        rng: &mut R,
    ) -> Result<(), EntranceRandoError> {
        let catalog = self.catalog;
        let mut remaining_entrances = relevant_entrances.to_vec();
        let mut remaining_exits = relevant_exits.to_vec();

        let doing_banned = relevant_exits
            .iter()
            .any(|ex| self.race_mode_banned_exits.contains(ex));

        if !doing_banned
            && self.settings.race_mode
            && relevant_exits
                .iter()
                .any(|&ex| catalog.exit(ex).category == Category::SecretCave)
        {
            // Islands with more than one entrance must be resolved early:
            // once one of their entrances hosts a banned dungeon, the other
            // may only take a small set of exits, and leaving it for last
            // can back the algorithm into a corner.
            let mut entrances_not_on_unique_islands: Vec<EntranceId> = vec![];
            for &en in relevant_entrances {
                let Some(island) = &catalog.entrance(en).island_name else {
                    continue;
                };
                if self.islands_with_a_banned_exit.contains(island) {
                    // Already compromised by an earlier sub-pool pass.
                    entrances_not_on_unique_islands.push(en);
                    continue;
                }
                if relevant_entrances.iter().any(|&other| {
                    other != en && catalog.entrance(other).island_name.as_ref() == Some(island)
                }) {
                    entrances_not_on_unique_islands.push(en);
                }
            }
            remaining_entrances.retain(|en| !entrances_not_on_unique_islands.contains(en));
            let mut reordered = entrances_not_on_unique_islands;
            reordered.extend(remaining_entrances);
            remaining_entrances = reordered;
        }

        if let Some(safety) = self.safety_entrance {
            // The safety entrance must go first, before the requirement-free
            // exits are used up by other entrances.
            if let Some(pos) = remaining_entrances.iter().position(|&en| en == safety) {
                remaining_entrances.remove(pos);
                remaining_entrances.insert(0, safety);
            }
        }

        while !remaining_entrances.is_empty() {
            // Skip entrances whose chain back to the sea passes through a
            // still-undecided exit; connecting those now could commit an exit
            // behind an entrance with no confirmed way back out.
            let mut possible_remaining_entrances: Vec<EntranceId> = vec![];
            for &en in &remaining_entrances {
                if self.outermost_entrance(en)?.is_some() {
                    possible_remaining_entrances.push(en);
                }
            }
            let Some(&zone_entrance) = possible_remaining_entrances.first() else {
                return Err(EntranceRandoError::InvariantViolation(
                    "No remaining entrance has a resolved path back to the sea".to_string(),
                ));
            };
            let num_other_resolvable = possible_remaining_entrances.len() - 1;
            remaining_entrances.retain(|&en| en != zone_entrance);

            let mut possible_remaining_exits: Vec<ExitId> =
                if Some(zone_entrance) == self.safety_entrance {
                    remaining_exits
                        .iter()
                        .copied()
                        .filter(|ex| self.exits_with_no_requirements.contains(ex))
                        .collect()
                } else {
                    remaining_exits.clone()
                };

            if num_other_resolvable == 0 && !remaining_entrances.is_empty() {
                // This is the last entrance exits can currently be attached
                // to. A terminal exit here would not create a new entrance,
                // stranding everything still queued.
                possible_remaining_exits.retain(|ex| !terminal_exits.contains(ex));
            }

            let entrance_island = catalog.entrance(zone_entrance).island_name.as_deref();
            if self.settings.race_mode && !doing_banned {
                if let Some(island) = entrance_island {
                    if self.islands_with_a_banned_exit.contains(island) {
                        // Race mode markers only name the island a required
                        // dungeon is on, not which of its entrances to take,
                        // so an island with a banned dungeon may only receive
                        // terminal, non-boss exits from here on.
                        possible_remaining_exits.retain(|&ex| {
                            catalog.exit(ex).category != Category::Boss
                                && terminal_exits.contains(&ex)
                        });
                    }
                }
            }

            if possible_remaining_exits.is_empty() {
                return Err(EntranceRandoError::NoValidExit(
                    catalog.entrance(zone_entrance).entrance_name.clone(),
                ));
            }

            // When caves are mixed in with nested dungeons the cave count
            // overpowers the dungeon count, so the draw is weighted by
            // category: boss entrances usually lead to a nested dungeon or a
            // boss, island entrances to a cave or a dungeon.
            let is_dungeon = |ex: ExitId| catalog.exit(ex).category == Category::Dungeon;
            let is_miniboss = |ex: ExitId| catalog.exit(ex).category == Category::Miniboss;
            let is_boss = |ex: ExitId| catalog.exit(ex).category == Category::Boss;
            let is_cave = |ex: ExitId| catalog.exit(ex).category == Category::SecretCave;
            let zone_exit = match catalog.entrance(zone_entrance).category {
                Category::Boss => weighted_choice(
                    rng,
                    &possible_remaining_exits,
                    &[(7, &is_dungeon as &dyn Fn(ExitId) -> bool), (3, &is_boss)],
                ),
                Category::Miniboss => weighted_choice(
                    rng,
                    &possible_remaining_exits,
                    &[(10, &is_dungeon as &dyn Fn(ExitId) -> bool), (5, &is_miniboss)],
                ),
                _ => weighted_choice(
                    rng,
                    &possible_remaining_exits,
                    &[(7, &is_cave as &dyn Fn(ExitId) -> bool), (3, &is_dungeon)],
                ),
            };

            remaining_exits.retain(|&ex| ex != zone_exit);
            self.connections.insert(zone_entrance, zone_exit);
            debug!(
                "{} -> {}",
                catalog.entrance(zone_entrance).entrance_name,
                catalog.exit(zone_exit).unique_name
            );

            if self.race_mode_banned_exits.contains(&zone_exit)
                && matches!(
                    catalog.exit(zone_exit).category,
                    Category::Dungeon | Category::Boss
                )
            {
                if let Some(island) = entrance_island {
                    self.islands_with_a_banned_exit.insert(island.to_string());
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), EntranceRandoError> {
        let catalog = self.catalog;

        // The fixed pair must have survived untouched in every configuration.
        let fixed_entrance = catalog.fixed_entrance_id;
        let fixed_exit = catalog.fixed_exit_id;
        if self.connections.exit_for_entrance(fixed_entrance) != Some(fixed_exit)
            || self.connections.entrance_for_exit(fixed_exit) != Some(fixed_entrance)
        {
            return Err(EntranceRandoError::InvariantViolation(format!(
                "{} no longer leads to {}",
                catalog.entrance(fixed_entrance).entrance_name,
                catalog.exit(fixed_exit).unique_name,
            )));
        }

        // Path data for the spoiler report: for each exit at the end of a
        // chain, the full outer-to-inner list of entrance names leading into
        // it. Non-terminal exits are skipped here (globally, not per-pool,
        // since this describes the finished world).
        let non_terminal_exits: HashSet<ExitId> = catalog
            .entrances()
            .filter_map(|(_, en)| en.nested_in)
            .collect();
        let mut paths: Vec<Vec<String>> = vec![];
        for (ex_id, exit) in catalog.exits() {
            if non_terminal_exits.contains(&ex_id) {
                continue;
            }
            let Some(entrance) = self.connections.entrance_for_exit(ex_id) else {
                return Err(EntranceRandoError::InvariantViolation(format!(
                    "Exit was never assigned an entrance: {}",
                    exit.unique_name
                )));
            };
            let Some(entrance_path) = self.path_to_entrance(entrance)? else {
                return Err(EntranceRandoError::InvariantViolation(format!(
                    "Exit has no resolved path back to the sea: {}",
                    exit.unique_name
                )));
            };
            let mut path: Vec<String> = vec![exit.unique_name.clone()];
            path.extend(
                entrance_path
                    .iter()
                    .map(|&en| catalog.entrance(en).entrance_name.clone()),
            );
            path.reverse();
            paths.push(path);
        }
        self.nested_entrance_paths = paths;

        let connections = self.entrance_connections();
        self.logic.update_entrance_connection_macros(&connections);

        if self.settings.race_mode {
            let mut banned_islands: HashSet<String> = HashSet::new();
            for boss_name in &self.boss_rewards.banned_bosses {
                banned_islands.insert(self.entrance_zone_for_boss(boss_name)?);
            }
            let mut required_islands: HashSet<String> = HashSet::new();
            for boss_name in &self.boss_rewards.required_bosses {
                required_islands.insert(self.entrance_zone_for_boss(boss_name)?);
            }
            let mut overlap: Vec<&str> = banned_islands
                .intersection(&required_islands)
                .map(|s| s.as_str())
                .collect();
            if !overlap.is_empty() {
                overlap.sort_unstable();
                return Err(EntranceRandoError::InvariantViolation(format!(
                    "Islands host both a banned and a required boss: {}",
                    overlap.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Walks the nesting chain from the given entrance toward the sea,
    /// returning the entrances seen from innermost to outermost. `Ok(None)`
    /// means the chain passes through a still-undecided exit.
    pub fn path_to_entrance(
        &self,
        entrance: EntranceId,
    ) -> Result<Option<Vec<EntranceId>>, EntranceRandoError> {
        let mut seen_entrances: Vec<EntranceId> = vec![];
        let mut current = entrance;
        while let Some(nested_in) = self.catalog.entrance(current).nested_in {
            if seen_entrances.contains(&current) {
                let path = seen_entrances
                    .iter()
                    .map(|&en| self.catalog.entrance(en).entrance_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(EntranceRandoError::EntranceLoop(path));
            }
            seen_entrances.push(current);
            match self.connections.entrance_for_exit(nested_in) {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
        seen_entrances.push(current);
        Ok(Some(seen_entrances))
    }

    /// The island-anchored entrance at the root of the given entrance's
    /// nesting chain, or `None` while the chain is still undecided.
    pub fn outermost_entrance(
        &self,
        entrance: EntranceId,
    ) -> Result<Option<EntranceId>, EntranceRandoError> {
        Ok(self.path_to_entrance(entrance)?.and_then(|path| path.last().copied()))
    }

    pub fn outermost_entrance_for_exit(
        &self,
        exit: ExitId,
    ) -> Result<Option<EntranceId>, EntranceRandoError> {
        match self.connections.entrance_for_exit(exit) {
            Some(entrance) => self.outermost_entrance(entrance),
            None => Ok(None),
        }
    }

    /// The finished entrance-name to exit-name mapping, covering the entire
    /// catalog. This is the artifact the stage-patching side consumes.
    pub fn entrance_connections(&self) -> HashMap<String, String> {
        self.connections
            .iter()
            .map(|(en, ex)| {
                (
                    self.catalog.entrance(en).entrance_name.clone(),
                    self.catalog.exit(ex).unique_name.clone(),
                )
            })
            .collect()
    }

    pub fn exit_for_entrance(&self, entrance: EntranceId) -> Option<ExitId> {
        self.connections.exit_for_entrance(entrance)
    }

    pub fn entrance_for_exit(&self, exit: ExitId) -> Option<EntranceId> {
        self.connections.entrance_for_exit(exit)
    }

    pub fn nested_entrance_paths(&self) -> &[Vec<String>] {
        &self.nested_entrance_paths
    }

    pub fn safety_entrance(&self) -> Option<EntranceId> {
        self.safety_entrance
    }

    /// The island a boss's arena ended up on, following the nesting chain
    /// out to the sea.
    pub fn entrance_zone_for_boss(&self, boss_name: &str) -> Result<String, EntranceRandoError> {
        let arena_name = format!("{boss_name}{BOSS_ARENA_SUFFIX}");
        let exit = self.catalog.exit_id(&arena_name).map_err(|_| {
            EntranceRandoError::InvariantViolation(format!("Unknown boss arena: {arena_name}"))
        })?;
        let Some(entrance) = self.outermost_entrance_for_exit(exit)? else {
            return Err(EntranceRandoError::InvariantViolation(format!(
                "Boss arena has no resolved outermost entrance: {arena_name}"
            )));
        };
        island_name_of(self.catalog, entrance)
    }

    /// The island (or plain zone) a given item location is reachable from.
    /// For locations outside the entrance system this is just the zone name.
    pub fn entrance_zone_for_item_location(
        &self,
        location_name: &str,
    ) -> Result<String, EntranceRandoError> {
        let zone_name = self.logic.location_zone_name(location_name);
        if !self.logic.is_dungeon_or_cave(location_name)
            || data::NON_RANDOMIZED_ZONES.contains(&zone_name.as_str())
        {
            return Ok(zone_name);
        }
        let Some(&exit) = self.item_location_to_exit.get(location_name) else {
            return Err(EntranceRandoError::InvariantViolation(format!(
                "Could not determine entrance zone for item location: {location_name}"
            )));
        };
        let Some(entrance) = self.outermost_entrance_for_exit(exit)? else {
            return Err(EntranceRandoError::InvariantViolation(format!(
                "Item location has no resolved outermost entrance: {location_name}"
            )));
        };
        island_name_of(self.catalog, entrance)
    }
}

fn island_name_of(catalog: &Catalog, entrance: EntranceId) -> Result<String, EntranceRandoError> {
    match &catalog.entrance(entrance).island_name {
        Some(island) => Ok(island.clone()),
        None => Err(EntranceRandoError::InvariantViolation(format!(
            "Outermost entrance is not anchored on an island: {}",
            catalog.entrance(entrance).entrance_name
        ))),
    }
}

fn zone_exit_for_item_location<L: ProgressionLogic>(
    catalog: &Catalog,
    logic: &L,
    overrides: &HashMap<String, ExitId>,
    location_name: &str,
) -> Option<ExitId> {
    if !logic.is_dungeon_or_cave(location_name) {
        return None;
    }
    let zone_name = logic.location_zone_name(location_name);
    if data::NON_RANDOMIZED_ZONES.contains(&zone_name.as_str()) {
        return None;
    }
    if let Some(&exit) = overrides.get(location_name) {
        return Some(exit);
    }
    catalog
        .exits()
        .find(|(_, exit)| exit.zone_name.as_deref() == Some(zone_name.as_str()))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct TestLogic {
        locations: Vec<String>,
        progress_locations: HashSet<String>,
        macros_updated: bool,
    }

    impl TestLogic {
        fn new(catalog: &Catalog, progress: Option<HashSet<String>>) -> TestLogic {
            let locations = test_locations(catalog);
            let progress_locations = match progress {
                Some(set) => set,
                None => locations.iter().cloned().collect(),
            };
            TestLogic {
                locations,
                progress_locations,
                macros_updated: false,
            }
        }
    }

    impl ProgressionLogic for TestLogic {
        fn item_locations(&self) -> Vec<String> {
            self.locations.clone()
        }

        fn filter_locations_for_progression(&self, location_names: &[String]) -> Vec<String> {
            location_names
                .iter()
                .filter(|loc| self.progress_locations.contains(loc.as_str()))
                .cloned()
                .collect()
        }

        fn is_dungeon_or_cave(&self, _location_name: &str) -> bool {
            true
        }

        fn location_zone_name(&self, location_name: &str) -> String {
            location_name.split(" - ").next().unwrap().to_string()
        }

        fn update_entrance_connection_macros(&mut self, _connections: &HashMap<String, String>) {
            self.macros_updated = true;
        }
    }

    /// One location per zone-named exit, plus the override locations for the
    /// exits (arenas, inner caves) that have no zone name of their own.
    fn test_locations(catalog: &Catalog) -> Vec<String> {
        let mut locations: Vec<String> = data::ITEM_LOCATION_TO_EXIT_OVERRIDES
            .iter()
            .map(|&(loc, _)| loc.to_string())
            .collect();
        for (_, exit) in catalog.exits() {
            if let Some(zone) = &exit.zone_name {
                locations.push(format!("{zone} - Chest"));
            }
        }
        locations
    }

    fn all_on() -> EntranceRandoSettings {
        EntranceRandoSettings {
            randomize_dungeon_entrances: true,
            randomize_miniboss_entrances: true,
            randomize_boss_entrances: true,
            randomize_secret_cave_entrances: true,
            randomize_secret_cave_inner_entrances: true,
            mix_entrances: MixEntrances::Mixed,
            ..Default::default()
        }
    }

    struct RunOutcome {
        result: Result<(), EntranceRandoError>,
        connections: HashMap<String, String>,
        paths: Vec<Vec<String>>,
        safety_exit: Option<String>,
        boss_islands: HashMap<String, String>,
        macros_updated: bool,
    }

    fn run_seed(
        settings: &EntranceRandoSettings,
        rewards: &BossRewards,
        progress: Option<HashSet<String>>,
        seed: u64,
    ) -> RunOutcome {
        let _ = env_logger::builder().is_test(true).try_init();
        let catalog = Catalog::vanilla().unwrap();
        let mut logic = TestLogic::new(&catalog, progress);
        let mut randomizer =
            EntranceRandomizer::new(&catalog, settings, rewards, &mut logic).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let result = randomizer.randomize(&mut rng);
        let safety_exit = randomizer.safety_entrance().and_then(|en| {
            randomizer
                .exit_for_entrance(en)
                .map(|ex| catalog.exit(ex).unique_name.clone())
        });
        let mut boss_islands = HashMap::new();
        if result.is_ok() {
            for boss in rewards.banned_bosses.iter().chain(&rewards.required_bosses) {
                boss_islands.insert(
                    boss.clone(),
                    randomizer.entrance_zone_for_boss(boss).unwrap(),
                );
            }
        }
        let connections = randomizer.entrance_connections();
        let paths = randomizer.nested_entrance_paths().to_vec();
        RunOutcome {
            result,
            connections,
            paths,
            safety_exit,
            boss_islands,
            macros_updated: logic.macros_updated,
        }
    }

    #[test]
    fn test_bijection_round_trip() {
        let mut bijection = EntranceBijection::default();
        bijection.insert(3, 7);
        bijection.insert(4, 9);
        assert_eq!(bijection.exit_for_entrance(3), Some(7));
        assert_eq!(bijection.entrance_for_exit(9), Some(4));
        assert_eq!(bijection.remove_by_entrance(3), Some(7));
        assert_eq!(bijection.entrance_for_exit(7), None);
        assert_eq!(bijection.len(), 1);
        assert!(!bijection.is_empty());
    }

    #[test]
    fn test_no_categories_enabled() {
        let settings = EntranceRandoSettings::default();
        let rewards = BossRewards::default();
        let outcome = run_seed(&settings, &rewards, None, 0);
        assert!(matches!(
            outcome.result,
            Err(EntranceRandoError::NoCategoriesEnabled)
        ));
        assert!(!outcome.macros_updated);
    }

    #[test]
    fn test_dungeon_only_always_succeeds() {
        let settings = EntranceRandoSettings {
            randomize_dungeon_entrances: true,
            ..Default::default()
        };
        let rewards = BossRewards::default();
        for seed in 0..20 {
            let outcome = run_seed(&settings, &rewards, None, seed);
            outcome.result.unwrap();
            assert_eq!(outcome.connections.len(), 38);
            let exits: HashSet<&String> = outcome.connections.values().collect();
            assert_eq!(exits.len(), 38);
            assert_eq!(
                outcome.connections["Dungeon Entrance in Forsaken Fortress Sector"],
                "Forsaken Fortress"
            );
            // Categories that weren't randomized keep their vanilla exits.
            assert_eq!(
                outcome.connections["Miniboss Entrance in Forbidden Woods"],
                "Forbidden Woods Miniboss Arena"
            );
            assert_eq!(
                outcome.connections["Secret Cave Entrance on Outset Island"],
                "Savage Labyrinth"
            );
        }
    }

    #[test]
    fn test_mixed_pool_bijection_and_paths() {
        let settings = all_on();
        let rewards = BossRewards::default();
        let catalog = Catalog::vanilla().unwrap();
        let mut successes = 0;
        for seed in 0..10 {
            let outcome = run_seed(&settings, &rewards, None, seed);
            if outcome.result.is_err() {
                continue;
            }
            successes += 1;
            assert!(outcome.macros_updated);
            assert_eq!(outcome.connections.len(), 38);
            let exits: HashSet<&String> = outcome.connections.values().collect();
            assert_eq!(exits.len(), 38);
            assert_eq!(
                outcome.connections["Dungeon Entrance in Forsaken Fortress Sector"],
                "Forsaken Fortress"
            );
            // One path per exit that no entrance nests inside: 4 miniboss
            // arenas, 6 boss arenas, 2 inner caves, and 18 of the 20 caves.
            assert_eq!(outcome.paths.len(), 30);
            for path in &outcome.paths {
                assert!(path.len() >= 2);
                let first = catalog.entrance_id(&path[0]).unwrap();
                assert!(catalog.entrance(first).island_name.is_some());
                assert!(catalog.exit_id(path.last().unwrap()).is_ok());
                for name in &path[1..path.len() - 1] {
                    let en = catalog.entrance_id(name).unwrap();
                    assert!(catalog.entrance(en).is_nested());
                }
            }
        }
        assert!(successes > 0);
    }

    #[test]
    fn test_separate_pools_keep_families_apart() {
        let settings = EntranceRandoSettings {
            randomize_dungeon_entrances: true,
            randomize_boss_entrances: true,
            randomize_secret_cave_entrances: true,
            ..Default::default()
        };
        let rewards = BossRewards::default();
        let dungeon_exits = [
            "Dragon Roost Cavern",
            "Forbidden Woods",
            "Tower of the Gods",
            "Earth Temple",
            "Wind Temple",
        ];
        for seed in 0..10 {
            let outcome = run_seed(&settings, &rewards, None, seed);
            outcome.result.unwrap();
            for (entrance_name, exit_name) in &outcome.connections {
                if entrance_name.starts_with("Secret Cave Entrance") {
                    assert!(!exit_name.ends_with("Boss Arena"));
                    assert!(!dungeon_exits.contains(&exit_name.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_safety_entrance_gets_requirement_free_exit() {
        let settings = EntranceRandoSettings {
            randomize_dungeon_entrances: true,
            dungeons_and_caves_only_start: true,
            progression_dungeons: true,
            ..Default::default()
        };
        let rewards = BossRewards::default();
        for seed in 0..10 {
            let outcome = run_seed(&settings, &rewards, None, seed);
            outcome.result.unwrap();
            // Dragon Roost Island has the only requirement-free dungeon
            // entrance, and Dragon Roost Cavern is the only requirement-free
            // dungeon exit, so the safety pairing is forced.
            assert_eq!(outcome.safety_exit.as_deref(), Some("Dragon Roost Cavern"));
            assert_eq!(
                outcome.connections["Dungeon Entrance on Dragon Roost Island"],
                "Dragon Roost Cavern"
            );
        }
    }

    #[test]
    fn test_nonprogress_split_covers_cave_exits() {
        let catalog = Catalog::vanilla().unwrap();
        let mut cave_locations: HashSet<String> = HashSet::new();
        for (_, exit) in catalog.exits() {
            if exit.category == Category::SecretCave {
                if let Some(zone) = &exit.zone_name {
                    cave_locations.insert(format!("{zone} - Chest"));
                }
            }
        }
        cave_locations.insert("Pawprint Isle - Wizzrobe Cave".to_string());
        cave_locations.insert("Ice Ring Isle - Inner Cave - Chest".to_string());
        cave_locations.insert("Cliff Plateau Isles - Highest Isle".to_string());
        let progress: HashSet<String> = test_locations(&catalog)
            .into_iter()
            .filter(|loc| !cave_locations.contains(loc))
            .collect();

        let settings = all_on();
        let rewards = BossRewards::default();
        let mut logic = TestLogic::new(&catalog, Some(progress));
        let randomizer =
            EntranceRandomizer::new(&catalog, &settings, &rewards, &mut logic).unwrap();
        let pools = randomizer.entrance_pools().unwrap();
        assert_eq!(pools.len(), 1);
        let (nonprogress_entrances, nonprogress_exits) = randomizer
            .split_nonprogress(&pools[0].entrances, &pools[0].exits)
            .unwrap();
        assert_eq!(nonprogress_entrances.len(), nonprogress_exits.len());
        assert_eq!(nonprogress_exits.len(), 22);
        for &ex in &nonprogress_exits {
            assert!(matches!(
                catalog.exit(ex).category,
                Category::SecretCave | Category::InnerCave
            ));
        }
        // Both inner cave entrances ride along with their enclosing exits.
        for name in [
            "Inner Entrance in Ice Ring Isle Secret Cave",
            "Inner Entrance in Cliff Plateau Isles Secret Cave",
        ] {
            let en = catalog.entrance_id(name).unwrap();
            assert!(nonprogress_entrances.contains(&en));
        }
    }

    #[test]
    fn test_exit_without_item_locations_is_reported() {
        let catalog = Catalog::vanilla().unwrap();
        let settings = all_on();
        let rewards = BossRewards::default();
        // A logic collaborator that knows no item locations at all leaves
        // every exit without location data.
        let mut logic = TestLogic {
            locations: vec![],
            progress_locations: HashSet::new(),
            macros_updated: false,
        };
        let mut randomizer =
            EntranceRandomizer::new(&catalog, &settings, &rewards, &mut logic).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = randomizer.randomize(&mut rng).unwrap_err();
        assert!(matches!(err, EntranceRandoError::InvariantViolation(_)));
    }

    #[test]
    fn test_insufficient_island_entrances() {
        let settings = all_on();
        let rewards = BossRewards::default();
        // Nothing counts as progress, so all 37 randomized exits need
        // nonprogress entrances and the 25 islands run out.
        let outcome = run_seed(&settings, &rewards, Some(HashSet::new()), 0);
        assert!(matches!(
            outcome.result,
            Err(EntranceRandoError::InsufficientIslandEntrances { .. })
        ));
    }

    #[test]
    fn test_path_cycle_detected() {
        let catalog = Catalog::vanilla().unwrap();
        let settings = all_on();
        let rewards = BossRewards::default();
        let mut logic = TestLogic::new(&catalog, None);
        let mut randomizer =
            EntranceRandomizer::new(&catalog, &settings, &rewards, &mut logic).unwrap();
        let fw_entrance = catalog
            .entrance_id("Dungeon Entrance in Forest Haven Sector")
            .unwrap();
        let fw_exit = catalog.exit_id("Forbidden Woods").unwrap();
        let miniboss_entrance = catalog
            .entrance_id("Miniboss Entrance in Forbidden Woods")
            .unwrap();
        randomizer.connections.remove_by_entrance(fw_entrance);
        randomizer.connections.remove_by_entrance(miniboss_entrance);
        // Point Forbidden Woods at its own miniboss entrance.
        randomizer.connections.insert(miniboss_entrance, fw_exit);
        let err = randomizer.path_to_entrance(miniboss_entrance).unwrap_err();
        assert!(matches!(err, EntranceRandoError::EntranceLoop(_)));
    }

    #[test]
    fn test_path_through_undecided_exit() {
        let catalog = Catalog::vanilla().unwrap();
        let settings = all_on();
        let rewards = BossRewards::default();
        let mut logic = TestLogic::new(&catalog, None);
        let mut randomizer =
            EntranceRandomizer::new(&catalog, &settings, &rewards, &mut logic).unwrap();
        let fw_entrance = catalog
            .entrance_id("Dungeon Entrance in Forest Haven Sector")
            .unwrap();
        randomizer.connections.remove_by_entrance(fw_entrance);
        let miniboss_entrance = catalog
            .entrance_id("Miniboss Entrance in Forbidden Woods")
            .unwrap();
        assert!(randomizer
            .path_to_entrance(miniboss_entrance)
            .unwrap()
            .is_none());
        // Other chains are unaffected by the undecided exit.
        let boss_entrance = catalog
            .entrance_id("Boss Entrance in Dragon Roost Cavern")
            .unwrap();
        let path = randomizer.path_to_entrance(boss_entrance).unwrap().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(
            *path.last().unwrap(),
            catalog
                .entrance_id("Dungeon Entrance on Dragon Roost Island")
                .unwrap()
        );
    }

    #[test]
    fn test_race_mode_keeps_banned_and_required_bosses_apart() {
        let mut settings = all_on();
        settings.race_mode = true;
        settings.progression_dungeons = true;
        settings.progression_puzzle_secret_caves = true;
        settings.progression_combat_secret_caves = true;
        let to_strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let rewards = BossRewards {
            required_bosses: to_strings(&[
                "Kalle Demos",
                "Gohdan",
                "Helmaroc King",
                "Jalhalla",
                "Molgera",
            ]),
            banned_bosses: to_strings(&["Gohma"]),
            required_dungeons: to_strings(&[
                "Forbidden Woods",
                "Tower of the Gods",
                "Earth Temple",
                "Wind Temple",
            ]),
            banned_dungeons: to_strings(&["Dragon Roost Cavern"]),
            banned_locations: [
                "Dragon Roost Cavern - Chest",
                "Dragon Roost Cavern - Gohma Heart Container",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        };
        let mut successes = 0;
        for seed in 0..30 {
            let outcome = run_seed(&settings, &rewards, None, seed);
            if outcome.result.is_err() {
                continue;
            }
            successes += 1;
            let banned_island = &outcome.boss_islands["Gohma"];
            for boss in &rewards.required_bosses {
                assert_ne!(
                    &outcome.boss_islands[boss], banned_island,
                    "seed {seed} put a required boss on the banned island"
                );
            }
        }
        assert!(successes > 0);
    }
}
