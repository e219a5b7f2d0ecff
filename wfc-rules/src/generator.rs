use crate::rules::AdjacencyRules;
use crate::tileset::TileSet;
use crate::types::{ActionId, AdjacencyKind, Direction, NeighborDecl, TileSetError, Transformation};
use log::debug;

/// Builds the six per-direction matrices from adjacency declarations.
///
/// Each declaration names a left and right action (`"tile [orientation]"`).
/// Horizontal declarations are written into `+x` together with their mirrored
/// and half-turned equivalents, and the quarter-turned pair is written into
/// `+y` with the same pattern. Vertical declarations are written into `+z`
/// for all eight transform slots of both actions. The `-x`, `-y` and `-z`
/// matrices are the transposes of their positive counterparts.
///
/// # Errors
///
/// Returns a [`TileSetError`] when a declaration references an unknown tile or
/// a malformed or out-of-range orientation.
pub fn generate_adjacency_rules(
    tileset: &TileSet,
    neighbors: &[NeighborDecl],
) -> Result<AdjacencyRules, TileSetError> {
    let num_actions = tileset.num_actions();
    let mut rules = AdjacencyRules::empty(num_actions);
    debug!(
        "Generating adjacency rules: {} declarations over {} actions",
        neighbors.len(),
        num_actions
    );

    let slot = |id: ActionId, transformation: Transformation| -> ActionId {
        tileset.actions()[id.0].transform(transformation)
    };

    for decl in neighbors {
        let left = tileset.resolve(&decl.left_ref()?)?;
        let right = tileset.resolve(&decl.right_ref()?)?;

        match decl.kind() {
            AdjacencyKind::Horizontal => {
                use Transformation::{MirrorRot180, Mirror, Rot180, Rot90};

                let down = slot(left, Rot90);
                let up = slot(right, Rot90);

                rules.allow(Direction::PosX, right, left);
                rules.allow(
                    Direction::PosX,
                    slot(right, MirrorRot180),
                    slot(left, MirrorRot180),
                );
                rules.allow(Direction::PosX, slot(left, Mirror), slot(right, Mirror));
                rules.allow(Direction::PosX, slot(left, Rot180), slot(right, Rot180));

                rules.allow(Direction::PosY, up, down);
                rules.allow(
                    Direction::PosY,
                    slot(down, MirrorRot180),
                    slot(up, MirrorRot180),
                );
                rules.allow(Direction::PosY, slot(up, Mirror), slot(down, Mirror));
                rules.allow(Direction::PosY, slot(down, Rot180), slot(up, Rot180));
            }
            AdjacencyKind::Vertical => {
                for transformation in Transformation::ALL {
                    rules.allow(
                        Direction::PosZ,
                        slot(left, transformation),
                        slot(right, transformation),
                    );
                }
            }
        }
    }

    rules.transpose_into(Direction::PosX, Direction::NegX);
    rules.transpose_into(Direction::PosY, Direction::NegY);
    rules.transpose_into(Direction::PosZ, Direction::NegZ);

    debug!(
        "Generated rules: +x {} pairs, +y {} pairs, +z {} pairs",
        rules.count_allowed(Direction::PosX),
        rules.count_allowed(Direction::PosY),
        rules.count_allowed(Direction::PosZ)
    );
    Ok(rules)
}
