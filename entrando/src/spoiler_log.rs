//! Spoiler report for entrance randomization: which entrance leads where,
//! and the full path to every exit buried behind a chain of entrances.

use std::fmt::Write;

use serde::Serialize;

use crate::logic::ProgressionLogic;
use crate::randomize::EntranceRandomizer;

#[derive(Serialize, Clone, Debug)]
pub struct SpoilerConnection {
    pub entrance: String,
    pub exit: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct SpoilerEntrances {
    /// Every connection in the finished world, in catalog order.
    pub entrances: Vec<SpoilerConnection>,
    /// Outer-to-inner entrance names ending in the exit name, one path per
    /// exit at the end of a chain. Empty when nesting is not randomized.
    pub nested_paths: Vec<Vec<String>>,
}

impl SpoilerEntrances {
    pub fn new<L: ProgressionLogic>(randomizer: &EntranceRandomizer<L>) -> SpoilerEntrances {
        let catalog = randomizer.catalog;
        let mut entrances: Vec<SpoilerConnection> = vec![];
        for (en_id, entrance) in catalog.entrances() {
            if let Some(exit) = randomizer.exit_for_entrance(en_id) {
                entrances.push(SpoilerConnection {
                    entrance: entrance.entrance_name.clone(),
                    exit: catalog.exit(exit).unique_name.clone(),
                });
            }
        }
        let nested_paths = if randomizer.settings.nesting_enabled() {
            randomizer.nested_entrance_paths().to_vec()
        } else {
            vec![]
        };
        SpoilerEntrances {
            entrances,
            nested_paths,
        }
    }

    pub fn format(&self) -> String {
        let mut out = String::new();
        out.push_str("Entrances:\n");
        for conn in &self.entrances {
            // The writer is a String, so this cannot actually fail.
            let _ = writeln!(out, "  {:<50} {}", format!("{}:", conn.entrance), conn.exit);
        }
        if !self.nested_paths.is_empty() {
            out.push_str("\nNested entrance paths:\n");
            for path in &self.nested_paths {
                if path.len() < 3 {
                    // Paths like DRI -> Molgera carry no nesting information.
                    continue;
                }
                // The final element is the exit name and keeps its full form;
                // the entrance names leading to it are shortened.
                let mut shortened: Vec<String> = path[..path.len() - 1]
                    .iter()
                    .map(|name| shorten_entrance_name(name))
                    .collect();
                shortened.push(path[path.len() - 1].clone());
                let _ = writeln!(out, "  {}", shortened.join(" -> "));
            }
        }
        out
    }
}

/// Shortens an entrance name to the place name for path display
/// ("Secret Cave Entrance on Pawprint Isle" becomes "Pawprint Isle").
/// Miniboss and boss entrances keep a parenthesized tag so they stay
/// distinguishable from the dungeon exit of the same name, and Dragon Roost
/// Island's two entrances are disambiguated explicitly. Other names pass
/// through unchanged.
pub fn shorten_entrance_name(name: &str) -> String {
    match name {
        "Dungeon Entrance on Dragon Roost Island" => return "Dragon Roost Island (Main)".to_string(),
        "Secret Cave Entrance on Dragon Roost Island" => {
            return "Dragon Roost Island (Pit)".to_string()
        }
        _ => {}
    }
    const PLAIN_PREFIXES: &[&str] = &[
        "Dungeon Entrance on ",
        "Dungeon Entrance in ",
        "Secret Cave Entrance on ",
        "Secret Cave Entrance in ",
        "Inner Entrance on ",
        "Inner Entrance in ",
    ];
    for prefix in PLAIN_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    if let Some(rest) = name.strip_prefix("Miniboss Entrance in ") {
        return format!("{rest} (Miniboss)");
    }
    if let Some(rest) = name.strip_prefix("Boss Entrance in ") {
        return format!("{rest} (Boss)");
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_entrance_name() {
        // Dragon Roost Island has two entrances with the same place name and
        // needs explicit disambiguation.
        assert_eq!(
            shorten_entrance_name("Dungeon Entrance on Dragon Roost Island"),
            "Dragon Roost Island (Main)"
        );
        assert_eq!(
            shorten_entrance_name("Secret Cave Entrance on Dragon Roost Island"),
            "Dragon Roost Island (Pit)"
        );
        assert_eq!(
            shorten_entrance_name("Dungeon Entrance in Forsaken Fortress Sector"),
            "Forsaken Fortress Sector"
        );
        assert_eq!(
            shorten_entrance_name("Secret Cave Entrance on Pawprint Isle"),
            "Pawprint Isle"
        );
        assert_eq!(
            shorten_entrance_name("Inner Entrance in Ice Ring Isle Secret Cave"),
            "Ice Ring Isle Secret Cave"
        );
        // Miniboss and boss entrances keep a tag so they are distinguishable
        // from the dungeon exit of the same name.
        assert_eq!(
            shorten_entrance_name("Miniboss Entrance in Forbidden Woods"),
            "Forbidden Woods (Miniboss)"
        );
        assert_eq!(
            shorten_entrance_name("Boss Entrance in Wind Temple"),
            "Wind Temple (Boss)"
        );
        // Exit names have no prefix to strip.
        assert_eq!(shorten_entrance_name("Gohma Boss Arena"), "Gohma Boss Arena");
    }

    #[test]
    fn test_format_sections() {
        let spoiler = SpoilerEntrances {
            entrances: vec![
                SpoilerConnection {
                    entrance: "Dungeon Entrance on Dragon Roost Island".to_string(),
                    exit: "Forbidden Woods".to_string(),
                },
                SpoilerConnection {
                    entrance: "Secret Cave Entrance on Pawprint Isle".to_string(),
                    exit: "Savage Labyrinth".to_string(),
                },
            ],
            nested_paths: vec![
                // Too short to carry nesting information; must be skipped.
                vec![
                    "Secret Cave Entrance on Star Island".to_string(),
                    "Molgera Boss Arena".to_string(),
                ],
                vec![
                    "Secret Cave Entrance on Dragon Roost Island".to_string(),
                    "Miniboss Entrance in Forbidden Woods".to_string(),
                    "Forbidden Woods Miniboss Arena".to_string(),
                ],
            ],
        };
        let text = spoiler.format();
        assert!(text.starts_with("Entrances:\n"));
        // Connections keep full entrance names, padded into columns.
        assert!(text.contains(
            "  Dungeon Entrance on Dragon Roost Island:           Forbidden Woods\n"
        ));
        assert!(text.contains(
            "  Secret Cave Entrance on Pawprint Isle:             Savage Labyrinth\n"
        ));
        assert!(text.contains("Nested entrance paths:\n"));
        assert!(text.contains(
            "  Dragon Roost Island (Pit) -> Forbidden Woods (Miniboss) -> Forbidden Woods Miniboss Arena\n"
        ));
        assert!(!text.contains("Star Island"));
    }

    #[test]
    fn test_format_skips_paths_section_without_nesting() {
        let spoiler = SpoilerEntrances {
            entrances: vec![SpoilerConnection {
                entrance: "Secret Cave Entrance on Bomb Island".to_string(),
                exit: "Bomb Island Secret Cave".to_string(),
            }],
            nested_paths: vec![],
        };
        let text = spoiler.format();
        assert!(text.starts_with("Entrances:\n"));
        assert!(!text.contains("Nested entrance paths"));
    }
}
