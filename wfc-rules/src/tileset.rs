use crate::types::{
    ActionId, Markers, Symmetry, TileDef, TileId, TileRef, TileRole, TileSetError, Transformation,
};
use log::debug;
use std::collections::HashMap;

/// One oriented variant of a base tile; the unit the solver places.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Position in the catalog's action list.
    pub id: ActionId,
    /// The base tile this action orients.
    pub tile: TileId,
    /// Base orientation, in quarter turns.
    pub rotation: usize,
    /// Copied from the base tile.
    pub weight: f64,
    /// Actions reached by each [`Transformation`] of this one.
    pub transforms: [ActionId; 8],
}

impl Action {
    /// The action reached by applying `transformation`.
    pub fn transform(&self, transformation: Transformation) -> ActionId {
        self.transforms[transformation.index()]
    }
}

/// The expanded catalog: every base tile unrolled into its oriented actions.
#[derive(Debug, Clone)]
pub struct TileSet {
    tiles: Vec<TileDef>,
    actions: Vec<Action>,
    first_occurrence: HashMap<String, ActionId>,
    ground: Option<ActionId>,
    empty: Option<ActionId>,
    sky: Option<ActionId>,
}

impl TileSet {
    /// Expands an ordered catalog into actions.
    ///
    /// Action ids are assigned in catalog order; each tile contributes as many
    /// actions as its symmetry class has orientations.
    ///
    /// # Errors
    ///
    /// Returns `TileSetError::EmptyCatalog` for an empty catalog,
    /// `TileSetError::DuplicateTile` when a name repeats, and
    /// `TileSetError::UnknownMarker` / `TileSetError::DuplicateRole` when the
    /// ground, empty or sky tile cannot be determined unambiguously.
    pub fn expand(tiles: &[TileDef], markers: &Markers) -> Result<Self, TileSetError> {
        if tiles.is_empty() {
            return Err(TileSetError::EmptyCatalog);
        }

        let mut actions = Vec::new();
        let mut first_occurrence = HashMap::new();

        for (tile_index, tile) in tiles.iter().enumerate() {
            let offset = actions.len();
            if first_occurrence
                .insert(tile.name.clone(), ActionId(offset))
                .is_some()
            {
                return Err(TileSetError::DuplicateTile(tile.name.clone()));
            }

            let weight = tile.effective_weight();
            for orientation in 0..tile.symmetry.cardinality() {
                let local = tile.symmetry.transform_table(orientation);
                actions.push(Action {
                    id: ActionId(offset + orientation),
                    tile: TileId(tile_index),
                    rotation: orientation,
                    weight,
                    transforms: local.map(|slot| ActionId(offset + slot)),
                });
            }
        }

        let mut tileset = Self {
            tiles: tiles.to_vec(),
            actions,
            first_occurrence,
            ground: None,
            empty: None,
            sky: None,
        };
        tileset.ground = tileset.resolve_role(TileRole::Ground, markers)?;
        tileset.empty = tileset.resolve_role(TileRole::Empty, markers)?;
        tileset.sky = tileset.resolve_role(TileRole::Sky, markers)?;

        debug!(
            "Expanded {} tiles into {} actions (ground: {:?}, empty: {:?}, sky: {:?})",
            tileset.tiles.len(),
            tileset.actions.len(),
            tileset.ground,
            tileset.empty,
            tileset.sky
        );
        Ok(tileset)
    }

    fn resolve_role(
        &self,
        role: TileRole,
        markers: &Markers,
    ) -> Result<Option<ActionId>, TileSetError> {
        if let Some(name) = markers.get(role) {
            return self
                .first_action(name)
                .map(Some)
                .ok_or_else(|| TileSetError::UnknownMarker {
                    role,
                    name: name.to_owned(),
                });
        }

        let mut flagged = self.tiles.iter().filter(|tile| tile.role == Some(role));
        let Some(first) = flagged.next() else {
            return Ok(None);
        };
        if let Some(second) = flagged.next() {
            return Err(TileSetError::DuplicateRole {
                role,
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }
        Ok(self.first_action(&first.name))
    }

    /// Number of oriented actions.
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Number of base tiles.
    pub fn num_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Every action, indexed by id.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Looks up one action.
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.0)
    }

    /// Base tiles in declaration order.
    pub fn tiles(&self) -> &[TileDef] {
        &self.tiles
    }

    /// Looks up one base tile.
    pub fn tile(&self, id: TileId) -> Option<&TileDef> {
        self.tiles.get(id.0)
    }

    /// The base tile an action was expanded from.
    pub fn tile_of(&self, id: ActionId) -> Option<&TileDef> {
        self.action(id).and_then(|action| self.tile(action.tile))
    }

    /// Symmetry class of the tile owning `id`.
    pub fn symmetry_of(&self, id: ActionId) -> Option<Symmetry> {
        self.tile_of(id).map(|tile| tile.symmetry)
    }

    /// Human readable `"name rotation"` label for an action.
    pub fn label(&self, id: ActionId) -> Option<String> {
        let action = self.action(id)?;
        let tile = self.tile(action.tile)?;
        Some(format!("{} {}", tile.name, action.rotation))
    }

    /// Per-action weights, indexed by action id.
    pub fn weights(&self) -> Vec<f64> {
        self.actions.iter().map(|action| action.weight).collect()
    }

    /// First action emitted for a tile name.
    pub fn first_action(&self, name: &str) -> Option<ActionId> {
        self.first_occurrence.get(name).copied()
    }

    /// Resolves a `"name orientation"` reference through the tile's first action.
    pub fn resolve(&self, tile_ref: &TileRef) -> Result<ActionId, TileSetError> {
        let first = self
            .first_action(&tile_ref.name)
            .ok_or_else(|| TileSetError::UnknownTile(tile_ref.name.clone()))?;
        let transformation = Transformation::from_index(tile_ref.orientation).ok_or_else(|| {
            TileSetError::OrientationOutOfRange {
                tile: tile_ref.name.clone(),
                orientation: tile_ref.orientation,
            }
        })?;
        Ok(self.actions[first.0].transform(transformation))
    }

    /// First action of the ground tile, if one is designated.
    pub fn ground(&self) -> Option<ActionId> {
        self.ground
    }

    /// First action of the empty tile, if one is designated.
    pub fn empty(&self) -> Option<ActionId> {
        self.empty
    }

    /// First action of the sky tile, if one is designated.
    pub fn sky(&self) -> Option<ActionId> {
        self.sky
    }

    /// The designated action for `role`.
    pub fn role_action(&self, role: TileRole) -> Option<ActionId> {
        match role {
            TileRole::Ground => self.ground,
            TileRole::Empty => self.empty,
            TileRole::Sky => self.sky,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<TileDef> {
        vec![
            TileDef::new("block", Symmetry::X),
            TileDef::new("corner", Symmetry::L).with_weight(2.0),
            TileDef::new("tee", Symmetry::T),
            TileDef::new("straight", Symmetry::I),
            TileDef::new("diagonal", Symmetry::Diagonal),
        ]
    }

    #[test]
    fn action_count_is_sum_of_cardinalities() {
        let tileset = TileSet::expand(&catalog(), &Markers::default()).unwrap();
        assert_eq!(tileset.num_actions(), 1 + 4 + 4 + 2 + 2);
        assert_eq!(tileset.num_tiles(), 5);
    }

    #[test]
    fn first_occurrence_and_offsets() {
        let tileset = TileSet::expand(&catalog(), &Markers::default()).unwrap();
        assert_eq!(tileset.first_action("block"), Some(ActionId(0)));
        assert_eq!(tileset.first_action("corner"), Some(ActionId(1)));
        assert_eq!(tileset.first_action("tee"), Some(ActionId(5)));
        assert_eq!(tileset.first_action("straight"), Some(ActionId(9)));
        assert_eq!(tileset.first_action("diagonal"), Some(ActionId(11)));

        let corner_1 = tileset.action(ActionId(2)).unwrap();
        assert_eq!(corner_1.rotation, 1);
        assert_eq!(
            corner_1.transforms.map(|id| id.0),
            [2, 3, 4, 1, 1, 4, 3, 2]
        );
        assert_eq!(corner_1.weight, 2.0);
        assert_eq!(tileset.label(ActionId(2)).as_deref(), Some("corner 1"));
    }

    #[test]
    fn resolve_uses_transform_slots() {
        let tileset = TileSet::expand(&catalog(), &Markers::default()).unwrap();
        let straight_1: TileRef = "straight 1".parse().unwrap();
        assert_eq!(tileset.resolve(&straight_1), Ok(ActionId(10)));
        // Slot 2 of an I tile is a half turn, back to the base orientation.
        let straight_2: TileRef = "straight 2".parse().unwrap();
        assert_eq!(tileset.resolve(&straight_2), Ok(ActionId(9)));

        let missing: TileRef = "arch".parse().unwrap();
        assert_eq!(
            tileset.resolve(&missing),
            Err(TileSetError::UnknownTile("arch".to_owned()))
        );
    }

    #[test]
    fn markers_take_precedence_over_roles() {
        let mut tiles = catalog();
        tiles[0].role = Some(TileRole::Ground);
        let markers = Markers {
            ground: Some("tee".to_owned()),
            ..Markers::default()
        };
        let tileset = TileSet::expand(&tiles, &markers).unwrap();
        assert_eq!(tileset.ground(), Some(ActionId(5)));

        let by_role = TileSet::expand(&tiles, &Markers::default()).unwrap();
        assert_eq!(by_role.ground(), Some(ActionId(0)));
        assert_eq!(by_role.empty(), None);
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let markers = Markers {
            empty: Some("air".to_owned()),
            ..Markers::default()
        };
        let err = TileSet::expand(&catalog(), &markers).unwrap_err();
        assert_eq!(
            err,
            TileSetError::UnknownMarker {
                role: TileRole::Empty,
                name: "air".to_owned()
            }
        );
    }

    #[test]
    fn duplicate_names_and_roles_are_rejected() {
        let mut tiles = catalog();
        tiles.push(TileDef::new("block", Symmetry::I));
        assert_eq!(
            TileSet::expand(&tiles, &Markers::default()).unwrap_err(),
            TileSetError::DuplicateTile("block".to_owned())
        );

        let mut tiles = catalog();
        tiles[0].role = Some(TileRole::Sky);
        tiles[3].role = Some(TileRole::Sky);
        assert!(matches!(
            TileSet::expand(&tiles, &Markers::default()),
            Err(TileSetError::DuplicateRole {
                role: TileRole::Sky,
                ..
            })
        ));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(
            TileSet::expand(&[], &Markers::default()).unwrap_err(),
            TileSetError::EmptyCatalog
        );
    }
}
