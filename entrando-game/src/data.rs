//! Static entrance/exit records. This is fixed input data describing the
//! vanilla game world, not algorithmic content.

use anyhow::Result;

use crate::{Catalog, CatalogBuilder, Category};

/// Entrances known to be reachable with no items, per enabled progression
/// category. Used to pick the safety entrance.
pub const DUNGEON_ENTRANCE_NAMES_WITH_NO_REQUIREMENTS: &[&str] =
    &["Dungeon Entrance on Dragon Roost Island"];
pub const SECRET_CAVE_ENTRANCE_NAMES_WITH_NO_REQUIREMENTS: &[&str] = &[
    "Secret Cave Entrance on Pawprint Isle",
    "Secret Cave Entrance on Cliff Plateau Isles",
];

pub const DUNGEON_EXIT_NAMES_WITH_NO_REQUIREMENTS: &[&str] = &["Dragon Roost Cavern"];
pub const PUZZLE_SECRET_CAVE_EXIT_NAMES_WITH_NO_REQUIREMENTS: &[&str] = &[
    "Pawprint Isle Chuchu Cave",
    "Ice Ring Isle Secret Cave",
    // Technically this has requirements, but it's just Wind Waker+Wind's Requiem.
    "Bird's Peak Rock Secret Cave",
    "Diamond Steppe Island Warp Maze Cave",
];
pub const COMBAT_SECRET_CAVE_EXIT_NAMES_WITH_NO_REQUIREMENTS: &[&str] =
    &["Rock Spire Isle Secret Cave"];

/// Item locations whose owning exit cannot be determined from the zone name
/// alone (miniboss rooms, heart containers, and exits without a zone name).
pub const ITEM_LOCATION_TO_EXIT_OVERRIDES: &[(&str, &str)] = &[
    ("Forbidden Woods - Mothula Miniboss Room", "Forbidden Woods Miniboss Arena"),
    ("Tower of the Gods - Darknut Miniboss Room", "Tower of the Gods Miniboss Arena"),
    ("Earth Temple - Stalfos Miniboss Room", "Earth Temple Miniboss Arena"),
    ("Wind Temple - Wizzrobe Miniboss Room", "Wind Temple Miniboss Arena"),
    ("Dragon Roost Cavern - Gohma Heart Container", "Gohma Boss Arena"),
    ("Forbidden Woods - Kalle Demos Heart Container", "Kalle Demos Boss Arena"),
    ("Tower of the Gods - Gohdan Heart Container", "Gohdan Boss Arena"),
    ("Forsaken Fortress - Helmaroc King Heart Container", "Helmaroc King Boss Arena"),
    ("Earth Temple - Jalhalla Heart Container", "Jalhalla Boss Arena"),
    ("Wind Temple - Molgera Heart Container", "Molgera Boss Arena"),
    ("Pawprint Isle - Wizzrobe Cave", "Pawprint Isle Wizzrobe Cave"),
    ("Ice Ring Isle - Inner Cave - Chest", "Ice Ring Isle Inner Cave"),
    ("Cliff Plateau Isles - Highest Isle", "Cliff Plateau Isles Inner Cave"),
];

/// Zones that the logic counts as dungeon locations but that have no
/// randomizable entrance.
pub const NON_RANDOMIZED_ZONES: &[&str] = &["Hyrule", "Ganon's Tower", "Mailbox"];

const VANILLA_CONNECTIONS: &[(&str, &str)] = &[
    ("Dungeon Entrance on Dragon Roost Island", "Dragon Roost Cavern"),
    ("Dungeon Entrance in Forest Haven Sector", "Forbidden Woods"),
    ("Dungeon Entrance in Tower of the Gods Sector", "Tower of the Gods"),
    ("Dungeon Entrance in Forsaken Fortress Sector", "Forsaken Fortress"),
    ("Dungeon Entrance on Headstone Island", "Earth Temple"),
    ("Dungeon Entrance on Gale Isle", "Wind Temple"),
    ("Miniboss Entrance in Forbidden Woods", "Forbidden Woods Miniboss Arena"),
    ("Miniboss Entrance in Tower of the Gods", "Tower of the Gods Miniboss Arena"),
    ("Miniboss Entrance in Earth Temple", "Earth Temple Miniboss Arena"),
    ("Miniboss Entrance in Wind Temple", "Wind Temple Miniboss Arena"),
    ("Boss Entrance in Dragon Roost Cavern", "Gohma Boss Arena"),
    ("Boss Entrance in Forbidden Woods", "Kalle Demos Boss Arena"),
    ("Boss Entrance in Tower of the Gods", "Gohdan Boss Arena"),
    ("Boss Entrance in Forsaken Fortress", "Helmaroc King Boss Arena"),
    ("Boss Entrance in Earth Temple", "Jalhalla Boss Arena"),
    ("Boss Entrance in Wind Temple", "Molgera Boss Arena"),
    ("Secret Cave Entrance on Outset Island", "Savage Labyrinth"),
    ("Secret Cave Entrance on Dragon Roost Island", "Dragon Roost Island Secret Cave"),
    ("Secret Cave Entrance on Fire Mountain", "Fire Mountain Secret Cave"),
    ("Secret Cave Entrance on Ice Ring Isle", "Ice Ring Isle Secret Cave"),
    ("Secret Cave Entrance on Private Oasis", "Cabana Labyrinth"),
    ("Secret Cave Entrance on Needle Rock Isle", "Needle Rock Isle Secret Cave"),
    ("Secret Cave Entrance on Angular Isles", "Angular Isles Secret Cave"),
    ("Secret Cave Entrance on Boating Course", "Boating Course Secret Cave"),
    ("Secret Cave Entrance on Stone Watcher Island", "Stone Watcher Island Secret Cave"),
    ("Secret Cave Entrance on Overlook Island", "Overlook Island Secret Cave"),
    ("Secret Cave Entrance on Bird's Peak Rock", "Bird's Peak Rock Secret Cave"),
    ("Secret Cave Entrance on Pawprint Isle", "Pawprint Isle Chuchu Cave"),
    ("Secret Cave Entrance on Pawprint Isle Side Isle", "Pawprint Isle Wizzrobe Cave"),
    ("Secret Cave Entrance on Diamond Steppe Island", "Diamond Steppe Island Warp Maze Cave"),
    ("Secret Cave Entrance on Bomb Island", "Bomb Island Secret Cave"),
    ("Secret Cave Entrance on Rock Spire Isle", "Rock Spire Isle Secret Cave"),
    ("Secret Cave Entrance on Shark Island", "Shark Island Secret Cave"),
    ("Secret Cave Entrance on Cliff Plateau Isles", "Cliff Plateau Isles Secret Cave"),
    ("Secret Cave Entrance on Horseshoe Island", "Horseshoe Island Secret Cave"),
    ("Secret Cave Entrance on Star Island", "Star Island Secret Cave"),
    ("Inner Entrance in Ice Ring Isle Secret Cave", "Ice Ring Isle Inner Cave"),
    ("Inner Entrance in Cliff Plateau Isles Secret Cave", "Cliff Plateau Isles Inner Cave"),
];

impl Catalog {
    /// Builds the full catalog of vanilla entrance/exit records.
    pub fn vanilla() -> Result<Catalog> {
        let mut b = CatalogBuilder::default();
        add_dungeons(&mut b)?;
        add_minibosses(&mut b)?;
        add_bosses(&mut b)?;
        add_secret_caves(&mut b)?;
        add_inner_caves(&mut b)?;
        for &(entrance_name, exit_name) in VANILLA_CONNECTIONS {
            b.connect_vanilla(entrance_name, exit_name)?;
        }
        b.build("Dungeon Entrance in Forsaken Fortress Sector", "Forsaken Fortress")
    }
}

fn add_dungeons(b: &mut CatalogBuilder) -> Result<()> {
    let c = Category::Dungeon;
    b.island_entrance(c, "Adanmae", 0, Some(2), Some(2), "Dungeon Entrance on Dragon Roost Island", "Dragon Roost Island", ("sea", 13, 211))?;
    b.island_entrance(c, "sea", 41, Some(6), Some(6), "Dungeon Entrance in Forest Haven Sector", "Forest Haven", ("Omori", 0, 215))?;
    b.island_entrance(c, "sea", 26, Some(0), Some(2), "Dungeon Entrance in Tower of the Gods Sector", "Tower of the Gods Sector", ("sea", 26, 1))?;
    b.island_entrance(c, "sea", 1, None, None, "Dungeon Entrance in Forsaken Fortress Sector", "Forsaken Fortress Sector", ("sea", 1, 0))?;
    b.island_entrance(c, "Edaichi", 0, Some(0), Some(1), "Dungeon Entrance on Headstone Island", "Headstone Island", ("sea", 45, 229))?;
    b.island_entrance(c, "Ekaze", 0, Some(0), Some(1), "Dungeon Entrance on Gale Isle", "Gale Isle", ("sea", 4, 232))?;

    b.exit(c, "M_NewD2", 0, Some(0), Some(0), "Dragon Roost Cavern", Some("M_DragB"), Some("Dragon Roost Cavern"))?;
    b.exit(c, "kindan", 0, Some(0), Some(0), "Forbidden Woods", Some("kinBOSS"), Some("Forbidden Woods"))?;
    b.exit(c, "Siren", 0, Some(1), Some(0), "Tower of the Gods", Some("SirenB"), Some("Tower of the Gods"))?;
    b.exit(c, "sea", 1, None, None, "Forsaken Fortress", Some("M2tower"), Some("Forsaken Fortress"))?;
    b.exit(c, "M_Dai", 0, Some(0), Some(0), "Earth Temple", Some("M_DaiB"), Some("Earth Temple"))?;
    b.exit(c, "kaze", 15, Some(0), Some(15), "Wind Temple", Some("kazeB"), Some("Wind Temple"))?;
    Ok(())
}

fn add_minibosses(b: &mut CatalogBuilder) -> Result<()> {
    let c = Category::Miniboss;
    b.nested_entrance(c, "kindan", 9, Some(0), Some(1), "Miniboss Entrance in Forbidden Woods", "Forbidden Woods")?;
    b.nested_entrance(c, "Siren", 14, Some(0), Some(1), "Miniboss Entrance in Tower of the Gods", "Tower of the Gods")?;
    b.nested_entrance(c, "M_Dai", 7, Some(0), Some(9), "Miniboss Entrance in Earth Temple", "Earth Temple")?;
    b.nested_entrance(c, "kaze", 2, Some(3), Some(20), "Miniboss Entrance in Wind Temple", "Wind Temple")?;

    b.exit(c, "kinMB", 10, Some(0), Some(0), "Forbidden Woods Miniboss Arena", None, None)?;
    b.exit(c, "SirenMB", 23, Some(0), Some(0), "Tower of the Gods Miniboss Arena", None, None)?;
    b.exit(c, "M_DaiMB", 12, Some(0), Some(0), "Earth Temple Miniboss Arena", None, None)?;
    b.exit(c, "kazeMB", 6, Some(0), Some(0), "Wind Temple Miniboss Arena", None, None)?;
    Ok(())
}

fn add_bosses(b: &mut CatalogBuilder) -> Result<()> {
    let c = Category::Boss;
    b.nested_entrance(c, "M_NewD2", 10, Some(1), Some(27), "Boss Entrance in Dragon Roost Cavern", "Dragon Roost Cavern")?;
    b.nested_entrance(c, "kindan", 16, Some(0), Some(1), "Boss Entrance in Forbidden Woods", "Forbidden Woods")?;
    b.nested_entrance(c, "Siren", 18, Some(0), Some(27), "Boss Entrance in Tower of the Gods", "Tower of the Gods")?;
    b.nested_entrance(c, "sea", 1, Some(16), Some(27), "Boss Entrance in Forsaken Fortress", "Forsaken Fortress")?;
    b.nested_entrance(c, "M_Dai", 15, Some(0), Some(27), "Boss Entrance in Earth Temple", "Earth Temple")?;
    b.nested_entrance(c, "kaze", 12, Some(0), Some(27), "Boss Entrance in Wind Temple", "Wind Temple")?;

    b.exit(c, "M_DragB", 0, None, Some(0), "Gohma Boss Arena", None, None)?;
    b.exit(c, "kinBOSS", 0, None, Some(0), "Kalle Demos Boss Arena", None, None)?;
    b.exit(c, "SirenB", 0, None, Some(0), "Gohdan Boss Arena", None, None)?;
    b.exit(c, "M2tower", 0, None, Some(16), "Helmaroc King Boss Arena", None, None)?;
    b.exit(c, "M_DaiB", 0, None, Some(0), "Jalhalla Boss Arena", None, None)?;
    b.exit(c, "kazeB", 0, None, Some(0), "Molgera Boss Arena", None, None)?;
    Ok(())
}

fn add_secret_caves(b: &mut CatalogBuilder) -> Result<()> {
    let c = Category::SecretCave;
    b.island_entrance(c, "sea", 44, Some(8), Some(10), "Secret Cave Entrance on Outset Island", "Outset Island", ("sea", 44, 10))?;
    b.island_entrance(c, "sea", 13, Some(2), Some(5), "Secret Cave Entrance on Dragon Roost Island", "Dragon Roost Island", ("sea", 13, 5))?;
    // For Fire Mountain and Ice Ring Isle, the spawn specified is out on the
    // sea rather than at the cave mouth, since the player would get
    // burnt/frozen if placed at the entrance while the island is active.
    b.island_entrance(c, "sea", 20, Some(0), Some(0), "Secret Cave Entrance on Fire Mountain", "Fire Mountain", ("sea", 20, 0))?;
    b.island_entrance(c, "sea", 40, Some(0), Some(0), "Secret Cave Entrance on Ice Ring Isle", "Ice Ring Isle", ("sea", 40, 0))?;
    b.island_entrance(c, "Abesso", 0, Some(1), Some(1), "Secret Cave Entrance on Private Oasis", "Private Oasis", ("Abesso", 0, 1))?;
    b.island_entrance(c, "sea", 29, Some(0), Some(5), "Secret Cave Entrance on Needle Rock Isle", "Needle Rock Isle", ("sea", 29, 5))?;
    b.island_entrance(c, "sea", 47, Some(1), Some(5), "Secret Cave Entrance on Angular Isles", "Angular Isles", ("sea", 47, 5))?;
    b.island_entrance(c, "sea", 48, Some(0), Some(5), "Secret Cave Entrance on Boating Course", "Boating Course", ("sea", 48, 5))?;
    b.island_entrance(c, "sea", 31, Some(0), Some(1), "Secret Cave Entrance on Stone Watcher Island", "Stone Watcher Island", ("sea", 31, 1))?;
    b.island_entrance(c, "sea", 7, Some(0), Some(1), "Secret Cave Entrance on Overlook Island", "Overlook Island", ("sea", 7, 1))?;
    b.island_entrance(c, "sea", 35, Some(0), Some(1), "Secret Cave Entrance on Bird's Peak Rock", "Bird's Peak Rock", ("sea", 35, 1))?;
    b.island_entrance(c, "sea", 12, Some(0), Some(1), "Secret Cave Entrance on Pawprint Isle", "Pawprint Isle", ("sea", 12, 1))?;
    b.island_entrance(c, "sea", 12, Some(1), Some(5), "Secret Cave Entrance on Pawprint Isle Side Isle", "Pawprint Isle", ("sea", 12, 5))?;
    b.island_entrance(c, "sea", 36, Some(0), Some(1), "Secret Cave Entrance on Diamond Steppe Island", "Diamond Steppe Island", ("sea", 36, 1))?;
    b.island_entrance(c, "sea", 34, Some(0), Some(1), "Secret Cave Entrance on Bomb Island", "Bomb Island", ("sea", 34, 1))?;
    b.island_entrance(c, "sea", 16, Some(0), Some(1), "Secret Cave Entrance on Rock Spire Isle", "Rock Spire Isle", ("sea", 16, 1))?;
    b.island_entrance(c, "sea", 38, Some(0), Some(5), "Secret Cave Entrance on Shark Island", "Shark Island", ("sea", 38, 5))?;
    b.island_entrance(c, "sea", 42, Some(0), Some(2), "Secret Cave Entrance on Cliff Plateau Isles", "Cliff Plateau Isles", ("sea", 42, 2))?;
    b.island_entrance(c, "sea", 43, Some(0), Some(5), "Secret Cave Entrance on Horseshoe Island", "Horseshoe Island", ("sea", 43, 5))?;
    b.island_entrance(c, "sea", 2, Some(0), Some(1), "Secret Cave Entrance on Star Island", "Star Island", ("sea", 2, 1))?;

    b.exit(c, "Cave09", 0, Some(1), Some(0), "Savage Labyrinth", None, Some("Outset Island"))?;
    b.exit(c, "TF_06", 0, Some(0), Some(0), "Dragon Roost Island Secret Cave", None, Some("Dragon Roost Island"))?;
    b.exit(c, "MiniKaz", 0, Some(0), Some(0), "Fire Mountain Secret Cave", None, Some("Fire Mountain"))?;
    b.exit(c, "MiniHyo", 0, Some(0), Some(0), "Ice Ring Isle Secret Cave", None, Some("Ice Ring Isle"))?;
    b.exit(c, "TF_04", 0, Some(0), Some(0), "Cabana Labyrinth", None, Some("Private Oasis"))?;
    b.exit(c, "SubD42", 0, Some(0), Some(0), "Needle Rock Isle Secret Cave", None, Some("Needle Rock Isle"))?;
    b.exit(c, "SubD43", 0, Some(0), Some(0), "Angular Isles Secret Cave", None, Some("Angular Isles"))?;
    b.exit(c, "SubD71", 0, Some(0), Some(0), "Boating Course Secret Cave", None, Some("Boating Course"))?;
    b.exit(c, "TF_01", 0, Some(0), Some(0), "Stone Watcher Island Secret Cave", None, Some("Stone Watcher Island"))?;
    b.exit(c, "TF_02", 0, Some(0), Some(0), "Overlook Island Secret Cave", None, Some("Overlook Island"))?;
    b.exit(c, "TF_03", 0, Some(0), Some(0), "Bird's Peak Rock Secret Cave", None, Some("Bird's Peak Rock"))?;
    b.exit(c, "TyuTyu", 0, Some(0), Some(0), "Pawprint Isle Chuchu Cave", None, Some("Pawprint Isle"))?;
    b.exit(c, "Cave07", 0, Some(0), Some(0), "Pawprint Isle Wizzrobe Cave", None, None)?;
    b.exit(c, "WarpD", 0, Some(0), Some(0), "Diamond Steppe Island Warp Maze Cave", None, Some("Diamond Steppe Island"))?;
    b.exit(c, "Cave01", 0, Some(0), Some(0), "Bomb Island Secret Cave", None, Some("Bomb Island"))?;
    b.exit(c, "Cave04", 0, Some(0), Some(0), "Rock Spire Isle Secret Cave", None, Some("Rock Spire Isle"))?;
    b.exit(c, "ITest63", 0, Some(0), Some(0), "Shark Island Secret Cave", None, Some("Shark Island"))?;
    b.exit(c, "Cave03", 0, Some(0), Some(0), "Cliff Plateau Isles Secret Cave", None, Some("Cliff Plateau Isles"))?;
    b.exit(c, "Cave05", 0, Some(0), Some(0), "Horseshoe Island Secret Cave", None, Some("Horseshoe Island"))?;
    b.exit(c, "Cave02", 0, Some(0), Some(0), "Star Island Secret Cave", None, Some("Star Island"))?;
    Ok(())
}

fn add_inner_caves(b: &mut CatalogBuilder) -> Result<()> {
    let c = Category::InnerCave;
    b.nested_entrance(c, "MiniHyo", 0, Some(1), Some(0), "Inner Entrance in Ice Ring Isle Secret Cave", "Ice Ring Isle Secret Cave")?;
    b.nested_entrance(c, "Cave03", 0, Some(1), Some(1), "Inner Entrance in Cliff Plateau Isles Secret Cave", "Cliff Plateau Isles Secret Cave")?;

    b.exit(c, "ITest62", 0, Some(0), Some(0), "Ice Ring Isle Inner Cave", None, None)?;
    b.exit(c, "sea", 42, Some(1), Some(1), "Cliff Plateau Isles Inner Cave", None, None)?;
    Ok(())
}
