pub mod data;

use anyhow::{bail, ensure, Context, Result};
use hashbrown::HashMap;
use log::info;
use serde::{Deserialize, Serialize};

pub type EntranceId = usize; // Index into Catalog.entrances
pub type ExitId = usize; // Index into Catalog.exits
pub type RoomNum = usize;
pub type SpawnId = usize;
pub type SclsExitIndex = usize; // Index into a room's stage-transition (SCLS) table

/// Which family of zones an entrance or exit belongs to. Determines pool
/// membership and the weights used when drawing an exit for an entrance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Dungeon,
    Miniboss,
    Boss,
    SecretCave,
    InnerCave,
}

/// A point the player can walk into. Either anchored directly on an island
/// (island entrance) or reachable only through another zone's exit (nested
/// entrance) - never both, never neither. The two constructors on
/// `CatalogBuilder` make this structural.
#[derive(Clone, Debug)]
pub struct ZoneEntrance {
    pub stage_name: String,
    pub room_num: RoomNum,
    pub scls_exit_index: Option<SclsExitIndex>,
    pub spawn_id: Option<SpawnId>,
    pub entrance_name: String,
    pub island_name: Option<String>,
    pub warp_out_stage_name: Option<String>,
    pub warp_out_room_num: Option<RoomNum>,
    pub warp_out_spawn_id: Option<SpawnId>,
    pub nested_in: Option<ExitId>,
    pub category: Category,
}

impl ZoneEntrance {
    pub fn is_nested(&self) -> bool {
        self.nested_in.is_some()
    }
}

/// A destination area entered via some entrance, with its own return
/// transition back out.
#[derive(Clone, Debug)]
pub struct ZoneExit {
    pub stage_name: String,
    pub room_num: RoomNum,
    pub scls_exit_index: Option<SclsExitIndex>,
    pub spawn_id: Option<SpawnId>,
    pub unique_name: String,
    pub boss_stage_name: Option<String>,
    pub zone_name: Option<String>,
    pub category: Category,
}

/// Read-only registry of every entrance and exit, built once at startup.
/// All other components refer to records through `EntranceId`/`ExitId`
/// handles resolved here.
pub struct Catalog {
    entrances: Vec<ZoneEntrance>,
    exits: Vec<ZoneExit>,
    entrance_ids_by_name: HashMap<String, EntranceId>,
    exit_ids_by_name: HashMap<String, ExitId>,
    entrance_ids_by_category: HashMap<Category, Vec<EntranceId>>,
    exit_ids_by_category: HashMap<Category, Vec<ExitId>>,
    /// Entrance/exit pairings used when a set is not randomized.
    pub vanilla_connections: Vec<(EntranceId, ExitId)>,
    /// The Forsaken Fortress pair, which must keep its vanilla connection in
    /// every configuration.
    pub fixed_entrance_id: EntranceId,
    pub fixed_exit_id: ExitId,
}

impl Catalog {
    pub fn entrance(&self, id: EntranceId) -> &ZoneEntrance {
        &self.entrances[id]
    }

    pub fn exit(&self, id: ExitId) -> &ZoneExit {
        &self.exits[id]
    }

    pub fn entrance_id(&self, name: &str) -> Result<EntranceId> {
        self.entrance_ids_by_name
            .get(name)
            .copied()
            .with_context(|| format!("Unknown entrance name: {name}"))
    }

    pub fn exit_id(&self, name: &str) -> Result<ExitId> {
        self.exit_ids_by_name
            .get(name)
            .copied()
            .with_context(|| format!("Unknown exit name: {name}"))
    }

    pub fn num_entrances(&self) -> usize {
        self.entrances.len()
    }

    pub fn num_exits(&self) -> usize {
        self.exits.len()
    }

    pub fn entrances(&self) -> impl Iterator<Item = (EntranceId, &ZoneEntrance)> {
        self.entrances.iter().enumerate()
    }

    pub fn exits(&self) -> impl Iterator<Item = (ExitId, &ZoneExit)> {
        self.exits.iter().enumerate()
    }

    pub fn category_entrances(&self, category: Category) -> &[EntranceId] {
        self.entrance_ids_by_category
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn category_exits(&self, category: Category) -> &[ExitId] {
        self.exit_ids_by_category
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Incrementally validating builder for `Catalog`. Nested entrances refer to
/// their enclosing exit by name, so an exit must be registered before any
/// entrance nested inside it; this keeps the nesting graph acyclic at the
/// record level (cycles can still be formed by connections, which the
/// randomizer checks separately).
#[derive(Default)]
pub struct CatalogBuilder {
    entrances: Vec<ZoneEntrance>,
    exits: Vec<ZoneExit>,
    entrance_ids_by_name: HashMap<String, EntranceId>,
    exit_ids_by_name: HashMap<String, ExitId>,
    vanilla_connections: Vec<(EntranceId, ExitId)>,
}

impl CatalogBuilder {
    pub fn island_entrance(
        &mut self,
        category: Category,
        stage_name: &str,
        room_num: RoomNum,
        scls_exit_index: Option<SclsExitIndex>,
        spawn_id: Option<SpawnId>,
        entrance_name: &str,
        island_name: &str,
        warp_out: (&str, RoomNum, SpawnId),
    ) -> Result<EntranceId> {
        self.add_entrance(ZoneEntrance {
            stage_name: stage_name.to_string(),
            room_num,
            scls_exit_index,
            spawn_id,
            entrance_name: entrance_name.to_string(),
            island_name: Some(island_name.to_string()),
            warp_out_stage_name: Some(warp_out.0.to_string()),
            warp_out_room_num: Some(warp_out.1),
            warp_out_spawn_id: Some(warp_out.2),
            nested_in: None,
            category,
        })
    }

    pub fn nested_entrance(
        &mut self,
        category: Category,
        stage_name: &str,
        room_num: RoomNum,
        scls_exit_index: Option<SclsExitIndex>,
        spawn_id: Option<SpawnId>,
        entrance_name: &str,
        nested_in: &str,
    ) -> Result<EntranceId> {
        let nested_id = self
            .exit_ids_by_name
            .get(nested_in)
            .copied()
            .with_context(|| {
                format!("Entrance {entrance_name} is nested in unknown exit: {nested_in}")
            })?;
        self.add_entrance(ZoneEntrance {
            stage_name: stage_name.to_string(),
            room_num,
            scls_exit_index,
            spawn_id,
            entrance_name: entrance_name.to_string(),
            island_name: None,
            warp_out_stage_name: None,
            warp_out_room_num: None,
            warp_out_spawn_id: None,
            nested_in: Some(nested_id),
            category,
        })
    }

    fn add_entrance(&mut self, entrance: ZoneEntrance) -> Result<EntranceId> {
        ensure!(
            entrance.island_name.is_some() != entrance.nested_in.is_some(),
            "Entrance {} must be an island entrance XOR a nested entrance",
            entrance.entrance_name
        );
        let id = self.entrances.len();
        if self
            .entrance_ids_by_name
            .insert(entrance.entrance_name.clone(), id)
            .is_some()
        {
            bail!("Duplicate entrance name: {}", entrance.entrance_name);
        }
        self.entrances.push(entrance);
        Ok(id)
    }

    pub fn exit(
        &mut self,
        category: Category,
        stage_name: &str,
        room_num: RoomNum,
        scls_exit_index: Option<SclsExitIndex>,
        spawn_id: Option<SpawnId>,
        unique_name: &str,
        boss_stage_name: Option<&str>,
        zone_name: Option<&str>,
    ) -> Result<ExitId> {
        let id = self.exits.len();
        if self.exit_ids_by_name.insert(unique_name.to_string(), id).is_some() {
            bail!("Duplicate exit name: {unique_name}");
        }
        self.exits.push(ZoneExit {
            stage_name: stage_name.to_string(),
            room_num,
            scls_exit_index,
            spawn_id,
            unique_name: unique_name.to_string(),
            boss_stage_name: boss_stage_name.map(str::to_string),
            zone_name: zone_name.map(str::to_string),
            category,
        });
        Ok(id)
    }

    pub fn connect_vanilla(&mut self, entrance_name: &str, exit_name: &str) -> Result<()> {
        let entrance_id = self
            .entrance_ids_by_name
            .get(entrance_name)
            .copied()
            .with_context(|| format!("Unknown entrance name: {entrance_name}"))?;
        let exit_id = self
            .exit_ids_by_name
            .get(exit_name)
            .copied()
            .with_context(|| format!("Unknown exit name: {exit_name}"))?;
        self.vanilla_connections.push((entrance_id, exit_id));
        Ok(())
    }

    pub fn build(self, fixed_entrance_name: &str, fixed_exit_name: &str) -> Result<Catalog> {
        let fixed_entrance_id = self
            .entrance_ids_by_name
            .get(fixed_entrance_name)
            .copied()
            .with_context(|| format!("Unknown entrance name: {fixed_entrance_name}"))?;
        let fixed_exit_id = self
            .exit_ids_by_name
            .get(fixed_exit_name)
            .copied()
            .with_context(|| format!("Unknown exit name: {fixed_exit_name}"))?;
        ensure!(
            self.vanilla_connections.len() == self.entrances.len()
                && self.vanilla_connections.len() == self.exits.len(),
            "Vanilla connections must cover every entrance and exit exactly once"
        );

        let mut entrance_ids_by_category: HashMap<Category, Vec<EntranceId>> = HashMap::new();
        for (id, entrance) in self.entrances.iter().enumerate() {
            entrance_ids_by_category
                .entry(entrance.category)
                .or_default()
                .push(id);
        }
        let mut exit_ids_by_category: HashMap<Category, Vec<ExitId>> = HashMap::new();
        for (id, exit) in self.exits.iter().enumerate() {
            exit_ids_by_category.entry(exit.category).or_default().push(id);
        }

        info!(
            "Built entrance catalog: {} entrances, {} exits",
            self.entrances.len(),
            self.exits.len()
        );
        Ok(Catalog {
            entrances: self.entrances,
            exits: self.exits,
            entrance_ids_by_name: self.entrance_ids_by_name,
            exit_ids_by_name: self.exit_ids_by_name,
            entrance_ids_by_category,
            exit_ids_by_category,
            vanilla_connections: self.vanilla_connections,
            fixed_entrance_id,
            fixed_exit_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_catalog_counts() {
        let catalog = Catalog::vanilla().unwrap();
        assert_eq!(catalog.num_entrances(), 38);
        assert_eq!(catalog.num_exits(), 38);
        assert_eq!(catalog.vanilla_connections.len(), 38);
        assert_eq!(catalog.category_entrances(Category::Dungeon).len(), 6);
        assert_eq!(catalog.category_entrances(Category::Miniboss).len(), 4);
        assert_eq!(catalog.category_entrances(Category::Boss).len(), 6);
        assert_eq!(catalog.category_entrances(Category::SecretCave).len(), 20);
        assert_eq!(catalog.category_entrances(Category::InnerCave).len(), 2);
    }

    #[test]
    fn test_island_xor_nested() {
        let catalog = Catalog::vanilla().unwrap();
        for (_, entrance) in catalog.entrances() {
            assert!(entrance.island_name.is_some() != entrance.nested_in.is_some());
        }
    }

    #[test]
    fn test_fixed_pair_is_forsaken_fortress() {
        let catalog = Catalog::vanilla().unwrap();
        assert_eq!(
            catalog.entrance(catalog.fixed_entrance_id).entrance_name,
            "Dungeon Entrance in Forsaken Fortress Sector"
        );
        assert_eq!(catalog.exit(catalog.fixed_exit_id).unique_name, "Forsaken Fortress");
        assert!(catalog
            .vanilla_connections
            .contains(&(catalog.fixed_entrance_id, catalog.fixed_exit_id)));
    }

    #[test]
    fn test_unknown_name_lookup_fails() {
        let catalog = Catalog::vanilla().unwrap();
        assert!(catalog.entrance_id("Dungeon Entrance on Atlantis").is_err());
        assert!(catalog.exit_id("Atlantis").is_err());
    }

    #[test]
    fn test_duplicate_entrance_name_rejected() {
        let mut builder = CatalogBuilder::default();
        builder
            .island_entrance(
                Category::Dungeon,
                "Adanmae",
                0,
                Some(2),
                Some(2),
                "Dungeon Entrance on Dragon Roost Island",
                "Dragon Roost Island",
                ("sea", 13, 211),
            )
            .unwrap();
        let result = builder.island_entrance(
            Category::Dungeon,
            "Adanmae",
            0,
            Some(2),
            Some(2),
            "Dungeon Entrance on Dragon Roost Island",
            "Dragon Roost Island",
            ("sea", 13, 211),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_entrance_requires_known_exit() {
        let mut builder = CatalogBuilder::default();
        let result = builder.nested_entrance(
            Category::Miniboss,
            "kindan",
            9,
            Some(0),
            Some(1),
            "Miniboss Entrance in Forbidden Woods",
            "Forbidden Woods",
        );
        assert!(result.is_err());
    }
}
