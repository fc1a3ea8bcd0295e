use crate::save::error::ConvertError;
use gvas::GvasFile;
use gvas::error::{DeserializeError, Error as GvasError};
use gvas::game_version::GameVersion;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

const MAX_HINT_EXPANSIONS: usize = 512;

/// Property paths whose map/set element types GVAS does not record.
const PALWORLD_TYPE_HINTS: &[(&str, &str)] = &[
    ("worldSaveData.CharacterContainerSaveData.Key", "StructProperty"),
    ("worldSaveData.CharacterContainerSaveData.Value", "StructProperty"),
    ("worldSaveData.CharacterSaveParameterMap.Key", "StructProperty"),
    ("worldSaveData.CharacterSaveParameterMap.Value", "StructProperty"),
    ("worldSaveData.FoliageGridSaveDataMap.Key", "StructProperty"),
    ("worldSaveData.FoliageGridSaveDataMap.Value", "StructProperty"),
    ("worldSaveData.FoliageGridSaveDataMap.Value.ModelMap.Value", "StructProperty"),
    (
        "worldSaveData.FoliageGridSaveDataMap.Value.ModelMap.Value.InstanceDataMap.Key",
        "StructProperty",
    ),
    (
        "worldSaveData.FoliageGridSaveDataMap.Value.ModelMap.Value.InstanceDataMap.Value",
        "StructProperty",
    ),
    ("worldSaveData.ItemContainerSaveData.Key", "StructProperty"),
    ("worldSaveData.ItemContainerSaveData.Value", "StructProperty"),
    (
        "worldSaveData.MapObjectSaveData.MapObjectSaveData.ConcreteModel.ModuleMap.Value",
        "StructProperty",
    ),
    (
        "worldSaveData.MapObjectSaveData.MapObjectSaveData.Model.EffectMap.Value",
        "StructProperty",
    ),
    ("worldSaveData.MapObjectSpawnerInStageSaveData.Key", "StructProperty"),
    ("worldSaveData.MapObjectSpawnerInStageSaveData.Value", "StructProperty"),
    (
        "worldSaveData.MapObjectSpawnerInStageSaveData.Value.SpawnerDataMapByLevelObjectInstanceId.Key",
        "Guid",
    ),
    (
        "worldSaveData.MapObjectSpawnerInStageSaveData.Value.SpawnerDataMapByLevelObjectInstanceId.Value",
        "StructProperty",
    ),
    (
        "worldSaveData.MapObjectSpawnerInStageSaveData.Value.SpawnerDataMapByLevelObjectInstanceId.Value.ItemMap.Value",
        "StructProperty",
    ),
    ("worldSaveData.WorkSaveData.WorkSaveData.WorkAssignMap.Value", "StructProperty"),
    ("worldSaveData.BaseCampSaveData.Key", "Guid"),
    ("worldSaveData.BaseCampSaveData.Value", "StructProperty"),
    ("worldSaveData.BaseCampSaveData.Value.ModuleMap.Value", "StructProperty"),
    ("worldSaveData.GroupSaveDataMap.Key", "Guid"),
    ("worldSaveData.GroupSaveDataMap.Value", "StructProperty"),
    ("worldSaveData.EnemyCampSaveData.EnemyCampStatusMap.Value", "StructProperty"),
    (
        "worldSaveData.EnemyCampSaveData.EnemyCampStatusMap.Value.TreasureBoxInfoMapBySpawnerName.Value",
        "StructProperty",
    ),
    (
        "worldSaveData.DungeonSaveData.DungeonSaveData.MapObjectSaveData.MapObjectSaveData.Model.EffectMap.Value",
        "StructProperty",
    ),
    (
        "worldSaveData.DungeonSaveData.DungeonSaveData.MapObjectSaveData.MapObjectSaveData.ConcreteModel.ModuleMap.Value",
        "StructProperty",
    ),
    ("worldSaveData.InvaderSaveData.Key", "Guid"),
    ("worldSaveData.InvaderSaveData.Value", "StructProperty"),
    ("worldSaveData.OilrigSaveData.OilrigMap.Value", "StructProperty"),
    ("worldSaveData.SupplySaveData.SupplyInfos.Key", "Guid"),
    ("worldSaveData.SupplySaveData.SupplyInfos.Value", "StructProperty"),
    ("worldSaveData.GuildExtraSaveDataMap.Key", "Guid"),
    ("worldSaveData.GuildExtraSaveDataMap.Value", "StructProperty"),
];

pub fn palworld_hints() -> HashMap<String, String> {
    PALWORLD_TYPE_HINTS
        .iter()
        .map(|(path, ty)| ((*path).to_string(), (*ty).to_string()))
        .collect()
}

/// A parsed GVAS file and the hints that had to be inferred to read it.
pub struct HintedParse {
    pub gvas: GvasFile,
    pub inferred: HashMap<String, String>,
}

/// Parses GVAS bytes with `known` hints, inferring one hint per `MissingHint` error.
///
/// An inferred hint is the Palworld table entry for the reported path with its
/// container segments stripped, or else the kind the parser reports.
pub fn parse_with_auto_hints(
    gvas_bytes: &[u8],
    known: &HashMap<String, String>,
) -> Result<HintedParse, ConvertError> {
    let mut hints = known.clone();
    let mut inferred = HashMap::new();

    for _ in 0..MAX_HINT_EXPANSIONS {
        let result =
            GvasFile::read_with_hints(&mut Cursor::new(gvas_bytes), GameVersion::Default, &hints);
        let (kind, path) = match result {
            Ok(gvas) => return Ok(HintedParse { gvas, inferred }),
            Err(GvasError::Deserialize(DeserializeError::MissingHint(kind, path, _))) => {
                (kind, path.to_string())
            }
            Err(error) => return Err(ConvertError::Gvas(error.to_string())),
        };

        if hints.contains_key(&path) {
            return Err(ConvertError::Gvas(format!(
                "hint for {} was supplied but the parser still reports it missing",
                path
            )));
        }
        let hint = table_hint(&path)
            .map(str::to_string)
            .unwrap_or_else(|| kind.to_string());
        debug!(path = %path, hint = %hint, "inferred GVAS type hint");
        hints.insert(path.clone(), hint.clone());
        inferred.insert(path, hint);
    }

    Err(ConvertError::Gvas(format!(
        "gave up after inferring {} type hints",
        MAX_HINT_EXPANSIONS
    )))
}

/// Looks a parser path up in the hint table, ignoring its property-type segments.
fn table_hint(path: &str) -> Option<&'static str> {
    let stripped = strip_container_segments(path);
    PALWORLD_TYPE_HINTS
        .iter()
        .find(|(table_path, _)| *table_path == stripped)
        .map(|(_, hint)| *hint)
}

fn strip_container_segments(path: &str) -> String {
    path.split('.')
        .filter(|segment| {
            !matches!(
                *segment,
                "StructProperty" | "MapProperty" | "ArrayProperty" | "SetProperty"
            )
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_segments_are_stripped() {
        assert_eq!(
            strip_container_segments(
                "worldSaveData.StructProperty.BaseCampSaveData.MapProperty.Key.StructProperty"
            ),
            "worldSaveData.BaseCampSaveData.Key"
        );
        assert_eq!(strip_container_segments("a.b.c"), "a.b.c");
    }

    #[test]
    fn parser_paths_resolve_through_the_table() {
        assert_eq!(
            table_hint(
                "worldSaveData.StructProperty.GroupSaveDataMap.MapProperty.Key.StructProperty"
            ),
            Some("Guid")
        );
        assert_eq!(
            table_hint("worldSaveData.StructProperty.Unlisted.MapProperty.Key"),
            None
        );
    }

    #[test]
    fn hint_table_covers_character_map() {
        let hints = palworld_hints();
        assert_eq!(
            hints
                .get("worldSaveData.CharacterSaveParameterMap.Value")
                .map(String::as_str),
            Some("StructProperty")
        );
        assert_eq!(
            hints
                .get("worldSaveData.GroupSaveDataMap.Key")
                .map(String::as_str),
            Some("Guid")
        );
        assert_eq!(hints.len(), PALWORLD_TYPE_HINTS.len());
    }

    #[test]
    fn non_gvas_bytes_fail_to_parse() {
        let result = parse_with_auto_hints(b"definitely not gvas", &palworld_hints());
        assert!(matches!(result, Err(ConvertError::Gvas(_))));
    }
}
