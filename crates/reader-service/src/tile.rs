// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Tile files: a JSON document of the form
//!
//! ```json
//! {
//!   "Tiles": { "SmallSquareTile": [{ "guid": "...", "Group": "A" }], "RectangleTile": { "guid": "..." } },
//!   "Groups": [{ "name": "A" }]
//! }
//! ```
//!
//! Tiles are streamed before groups, even though tiles reference groups, so the consumer must be
//! able to handle a reference to a group it has not seen yet. Within each section records keep
//! the order they are written in.

use connector_model::{
    ExternalIdentity, ExternalState, GROUP_KIND, GroupRecord, Record, SourceRecord, TILE_KIND,
    TileRecord,
};
use serde_json::Value;

use crate::{
    error::SourceError,
    source::{RecordSource, SourceOpener},
};

const TILE_ID_FIELD: &str = "guid";
const GROUP_ID_FIELD: &str = "name";

/// Opens tile files from the local file system. The locator is a path.
#[derive(Debug, Default, Clone, Copy)]
pub struct TileFileOpener;

impl SourceOpener for TileFileOpener {
    fn open(&self, locator: &str, scope_id: &str) -> Result<Box<dyn RecordSource>, SourceError> {
        let content = std::fs::read_to_string(locator).map_err(|source| SourceError::Open {
            locator: locator.to_string(),
            source,
        })?;
        let tiles = TileFile::parse(locator, &content, scope_id)?;
        Ok(Box::new(tiles))
    }
}

enum Pending {
    Tile { shape: String, properties: Value },
    Group { properties: Value },
}

/// A parsed tile file. The document is read and validated at open time; individual records are
/// only turned into [`Record`]s as they are requested.
pub struct TileFile {
    scope_id: String,
    pending: std::vec::IntoIter<Pending>,
    position: usize,
}

impl TileFile {
    pub fn parse(locator: &str, content: &str, scope_id: &str) -> Result<Self, SourceError> {
        let malformed = |message: &str| SourceError::Malformed {
            locator: locator.to_string(),
            message: message.to_string(),
        };

        let document: Value =
            serde_json::from_str(content).map_err(|source| SourceError::Parse {
                locator: locator.to_string(),
                source,
            })?;
        let Value::Object(mut document) = document else {
            return Err(malformed("top level must be an object"));
        };

        let mut pending = vec![];

        match document.remove("Tiles") {
            None | Some(Value::Null) => {}
            Some(Value::Object(shapes)) => {
                for (shape, tiles) in shapes {
                    let tiles = match tiles {
                        Value::Array(tiles) => tiles,
                        single => vec![single],
                    };
                    pending.extend(tiles.into_iter().map(|properties| Pending::Tile {
                        shape: shape.clone(),
                        properties,
                    }));
                }
            }
            Some(_) => return Err(malformed("`Tiles` must map shapes to tiles")),
        }

        match document.remove("Groups") {
            None | Some(Value::Null) => {}
            Some(Value::Array(groups)) => {
                pending.extend(groups.into_iter().map(|properties| Pending::Group { properties }))
            }
            Some(Value::Object(groups)) => pending.extend(
                groups
                    .into_iter()
                    .map(|(_, properties)| Pending::Group { properties }),
            ),
            Some(_) => return Err(malformed("`Groups` must be a list or a map of groups")),
        }

        Ok(Self {
            scope_id: scope_id.to_string(),
            pending: pending.into_iter(),
            position: 0,
        })
    }

    fn source_record(
        &self,
        kind: &'static str,
        id_field: &'static str,
        properties: Value,
    ) -> Result<SourceRecord, SourceError> {
        let identifier = properties
            .get(id_field)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(SourceError::MissingField {
                kind,
                position: self.position,
                field: id_field,
            })?;

        Ok(SourceRecord {
            identity: ExternalIdentity::new(&self.scope_id, identifier, kind),
            state: ExternalState::of_content(&properties),
            properties,
        })
    }

    fn convert(&self, pending: Pending) -> Result<Record, SourceError> {
        match pending {
            Pending::Tile { shape, properties } => Ok(Record::Tile(TileRecord {
                shape,
                source: self.source_record(TILE_KIND, TILE_ID_FIELD, properties)?,
            })),
            Pending::Group { properties } => Ok(Record::Group(GroupRecord {
                source: self.source_record(GROUP_KIND, GROUP_ID_FIELD, properties)?,
            })),
        }
    }
}

impl RecordSource for TileFile {
    fn next_record(&mut self) -> Option<Result<Record, SourceError>> {
        let pending = self.pending.next()?;
        self.position += 1;
        Some(self.convert(pending))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn drain(file: &mut TileFile) -> Vec<Result<Record, SourceError>> {
        std::iter::from_fn(|| file.next_record()).collect()
    }

    #[test]
    fn tiles_come_before_groups() {
        let content = json!({
            "Groups": [{"name": "A", "groupType": "Bathroom"}],
            "Tiles": {
                "SmallSquareTile": [{"guid": "t1", "Group": "A"}],
                "RectangleTile": {"guid": "t2"}
            }
        })
        .to_string();

        let mut file = TileFile::parse("tiles.json", &content, "0x2").unwrap();
        let records: Vec<_> = drain(&mut file).into_iter().map(Result::unwrap).collect();

        let kinds: Vec<_> = records.iter().map(Record::kind_name).collect();
        assert_eq!(kinds, vec![TILE_KIND, TILE_KIND, GROUP_KIND]);

        let Record::Group(group) = &records[2] else {
            panic!("expected a group, got {:?}", records[2]);
        };
        assert_eq!(group.name(), "A");
        assert_eq!(group.source.identity.scope_id, "0x2");
    }

    #[test]
    fn shapes_keep_document_order() {
        let content = r#"{
            "Tiles": {
                "SmallSquareTile": { "guid": "s" },
                "RectangleTile": [{ "guid": "r1" }, { "guid": "r2" }],
                "HexagonTile": { "guid": "h" }
            },
            "Groups": { "kitchen": { "name": "K" }, "bath": { "name": "B" } }
        }"#;

        let mut file = TileFile::parse("tiles.json", content, "0x2").unwrap();
        let identifiers: Vec<_> = drain(&mut file)
            .into_iter()
            .map(|record| record.unwrap().identity().identifier.clone())
            .collect();

        assert_eq!(identifiers, vec!["s", "r1", "r2", "h", "K", "B"]);
    }

    #[test]
    fn record_without_id_fails_in_stream() {
        let content = json!({
            "Tiles": {"SmallSquareTile": [{"guid": "t1"}, {"Group": "A"}, {"guid": "t3"}]}
        })
        .to_string();

        let mut file = TileFile::parse("tiles.json", &content, "0x2").unwrap();
        assert!(file.next_record().unwrap().is_ok());
        assert!(matches!(
            file.next_record(),
            Some(Err(SourceError::MissingField {
                kind: TILE_KIND,
                position: 2,
                field: "guid"
            }))
        ));
    }

    #[test]
    fn malformed_documents_are_rejected_at_open() {
        assert!(matches!(
            TileFile::parse("tiles.json", "not json", "s"),
            Err(SourceError::Parse { .. })
        ));
        assert!(matches!(
            TileFile::parse("tiles.json", "[]", "s"),
            Err(SourceError::Malformed { .. })
        ));
        assert!(matches!(
            TileFile::parse("tiles.json", r#"{"Tiles": 3}"#, "s"),
            Err(SourceError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_file_cannot_be_opened() {
        let result = TileFileOpener.open("/nonexistent/tiles.json", "s");
        assert!(matches!(result, Err(SourceError::Open { .. })));
    }
}
