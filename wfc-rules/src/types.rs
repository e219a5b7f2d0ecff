use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Index of a base tile in the catalog, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

/// Index of an oriented action, unique across the whole catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub usize);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while expanding a catalog or resolving references into it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileSetError {
    /// The rule file declares no tiles.
    #[error("Tile catalog is empty.")]
    EmptyCatalog,
    /// Two tiles share a name.
    #[error("Duplicate tile name: {0}")]
    DuplicateTile(String),
    /// A reference names a tile that is not in the catalog.
    #[error("Unknown tile: {0}")]
    UnknownTile(String),
    /// A reference is not of the form `"name [orientation]"`.
    #[error("Malformed tile reference: '{0}'")]
    InvalidTileRef(String),
    /// A reference asks for a transform slot above 7.
    #[error("Orientation {orientation} out of range for tile '{tile}' (expected 0..=7)")]
    OrientationOutOfRange { tile: String, orientation: usize },
    /// A tile declares a role other than ground, empty or sky.
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    /// A configured marker names a tile that is not in the catalog.
    #[error("Configured {role} tile '{name}' is not in the catalog")]
    UnknownMarker { role: TileRole, name: String },
    /// More than one tile claims the same role.
    #[error("Tiles '{first}' and '{second}' both claim the {role} role")]
    DuplicateRole {
        role: TileRole,
        first: String,
        second: String,
    },
}

// Rotation and mirror maps per symmetry class, indexed by base orientation.
const X_ROTATE: [usize; 1] = [0];
const X_MIRROR: [usize; 1] = [0];
const L_ROTATE: [usize; 4] = [1, 2, 3, 0];
const L_MIRROR: [usize; 4] = [1, 0, 3, 2];
const T_ROTATE: [usize; 4] = [1, 2, 3, 0];
const T_MIRROR: [usize; 4] = [0, 3, 2, 1];
const I_ROTATE: [usize; 2] = [1, 0];
const I_MIRROR: [usize; 2] = [0, 1];
const DIAGONAL_ROTATE: [usize; 2] = [1, 0];
const DIAGONAL_MIRROR: [usize; 2] = [1, 0];

/// Symmetry class of a base tile.
///
/// The class decides how many distinct orientations the tile has and how
/// rotating or mirroring one orientation lands on another.
///
/// Rule files may leave the tag out or set it to null; both read as
/// [`Symmetry::X`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum Symmetry {
    /// Fully symmetric; also the fallback for unrecognised tags.
    #[default]
    X,
    /// Four orientations; mirroring swaps them pairwise.
    L,
    /// Four orientations, mirrored across the stem.
    T,
    /// Two orientations, unchanged by mirroring.
    I,
    /// The `\` class.
    Diagonal,
}

impl Symmetry {
    /// Parses a symmetry tag. Unrecognised tags fall back to [`Symmetry::X`].
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "L" => Self::L,
            "T" => Self::T,
            "I" => Self::I,
            "\\" => Self::Diagonal,
            "X" | "" => Self::X,
            other => {
                log::debug!("Unknown symmetry tag '{other}', treating it as X");
                Self::X
            }
        }
    }

    /// The tag this class is written as in rule files.
    pub fn tag(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::L => "L",
            Self::T => "T",
            Self::I => "I",
            Self::Diagonal => "\\",
        }
    }

    fn maps(self) -> (&'static [usize], &'static [usize]) {
        match self {
            Self::X => (&X_ROTATE, &X_MIRROR),
            Self::L => (&L_ROTATE, &L_MIRROR),
            Self::T => (&T_ROTATE, &T_MIRROR),
            Self::I => (&I_ROTATE, &I_MIRROR),
            Self::Diagonal => (&DIAGONAL_ROTATE, &DIAGONAL_MIRROR),
        }
    }

    /// Number of distinct orientations.
    pub fn cardinality(self) -> usize {
        self.maps().0.len()
    }

    /// Orientation reached by rotating `orientation` a quarter turn.
    pub fn rotate(self, orientation: usize) -> usize {
        self.maps().0[orientation]
    }

    /// Orientation reached by mirroring `orientation`.
    pub fn mirror(self, orientation: usize) -> usize {
        self.maps().1[orientation]
    }

    /// Local transform table for a base orientation, in [`Transformation`] slot order.
    ///
    /// # Panics
    ///
    /// Panics if `orientation >= self.cardinality()`.
    pub fn transform_table(self, orientation: usize) -> [usize; 8] {
        let r1 = self.rotate(orientation);
        let r2 = self.rotate(r1);
        let r3 = self.rotate(r2);
        [
            orientation,
            r1,
            r2,
            r3,
            self.mirror(orientation),
            self.mirror(r1),
            self.mirror(r2),
            self.mirror(r3),
        ]
    }
}

struct SymmetryVisitor;

impl<'de> Visitor<'de> for SymmetryVisitor {
    type Value = Symmetry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a symmetry tag or null")
    }

    fn visit_str<E: de::Error>(self, tag: &str) -> Result<Self::Value, E> {
        Ok(Symmetry::parse(tag))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Symmetry::X)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Symmetry::X)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(SymmetryVisitor)
    }
}

impl<'de> Deserialize<'de> for Symmetry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SymmetryVisitor)
    }
}

impl From<Symmetry> for String {
    fn from(symmetry: Symmetry) -> Self {
        symmetry.tag().to_owned()
    }
}

/// Names the eight slots of an action's transform table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// The orientation itself.
    Identity,
    /// One quarter turn.
    Rot90,
    /// Two quarter turns.
    Rot180,
    /// Three quarter turns.
    Rot270,
    /// Mirrored, no turn.
    Mirror,
    /// Mirrored, then one quarter turn.
    MirrorRot90,
    /// Mirrored, then two quarter turns.
    MirrorRot180,
    /// Mirrored, then three quarter turns.
    MirrorRot270,
}

impl Transformation {
    /// Every slot, in table order.
    pub const ALL: [Self; 8] = [
        Self::Identity,
        Self::Rot90,
        Self::Rot180,
        Self::Rot270,
        Self::Mirror,
        Self::MirrorRot90,
        Self::MirrorRot180,
        Self::MirrorRot270,
    ];

    /// Slot index in the transform table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The transformation in slot `index`, if it is below 8.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Number of quarter turns applied (before mirroring).
    pub fn rotation_steps(self) -> usize {
        self.index() % 4
    }

    /// Whether the slot mirrors before turning.
    pub fn is_mirrored(self) -> bool {
        self.index() >= 4
    }
}

/// One of the six axis directions, in propagator matrix order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards increasing x.
    PosX,
    /// Towards increasing y.
    PosY,
    /// Towards decreasing x.
    NegX,
    /// Towards decreasing y.
    NegY,
    /// Towards increasing z.
    PosZ,
    /// Towards decreasing z.
    NegZ,
}

impl Direction {
    /// Every direction, in matrix order.
    pub const ALL: [Self; 6] = [
        Self::PosX,
        Self::PosY,
        Self::NegX,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Row of this direction in the adjacency matrix.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The direction pointing the other way along the same axis.
    pub fn opposite(self) -> Self {
        match self {
            Self::PosX => Self::NegX,
            Self::PosY => Self::NegY,
            Self::NegX => Self::PosX,
            Self::NegY => Self::PosY,
            Self::PosZ => Self::NegZ,
            Self::NegZ => Self::PosZ,
        }
    }

    /// Short axis label such as `+x`.
    pub fn name(self) -> &'static str {
        match self {
            Self::PosX => "+x",
            Self::PosY => "+y",
            Self::NegX => "-x",
            Self::NegY => "-y",
            Self::PosZ => "+z",
            Self::NegZ => "-z",
        }
    }
}

/// Role a tile can play when seeding boundary constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum TileRole {
    /// Fills the top layer and is removed everywhere else.
    Ground,
    /// Forced onto the outer walls.
    Empty,
    /// Designated but never seeded.
    Sky,
}

impl TileRole {
    /// Lowercase name used in rule files and configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Empty => "empty",
            Self::Sky => "sky",
        }
    }
}

impl fmt::Display for TileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for TileRole {
    type Error = TileSetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "ground" => Ok(Self::Ground),
            "empty" => Ok(Self::Empty),
            "sky" => Ok(Self::Sky),
            _ => Err(TileSetError::UnknownRole(value)),
        }
    }
}

impl From<TileRole> for String {
    fn from(role: TileRole) -> Self {
        role.name().to_owned()
    }
}

/// A base tile as declared in a rule file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TileDef {
    /// Unique name; references address the tile by it.
    pub name: String,
    /// Missing or null reads as [`Symmetry::X`].
    #[serde(default)]
    pub symmetry: Symmetry,
    /// Missing, negative or non-finite weights count as 1.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Boundary seeding role declared in the file.
    #[serde(default)]
    pub role: Option<TileRole>,
    /// Mesh identifier handed to the renderer; defaults to the tile name.
    #[serde(default)]
    pub mesh: Option<String>,
    /// Hidden tiles take part in solving but produce no placement records.
    #[serde(default)]
    pub hidden: bool,
}

impl TileDef {
    /// A visible tile with default weight and no role.
    pub fn new(name: impl Into<String>, symmetry: Symmetry) -> Self {
        Self {
            name: name.into(),
            symmetry,
            weight: None,
            role: None,
            mesh: None,
            hidden: false,
        }
    }

    /// Sets the relative frequency of the tile.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Marks the tile for boundary seeding.
    pub fn with_role(mut self, role: TileRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Overrides the mesh identifier.
    pub fn with_mesh(mut self, mesh: impl Into<String>) -> Self {
        self.mesh = Some(mesh.into());
        self
    }

    /// Excludes the tile from placement output.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Weight used by the solver.
    pub fn effective_weight(&self) -> f64 {
        match self.weight {
            Some(weight) if weight >= 0.0 && weight.is_finite() => weight,
            Some(weight) => {
                log::warn!(
                    "Tile '{}' has invalid weight {}, using 1.0",
                    self.name,
                    weight
                );
                1.0
            }
            None => 1.0,
        }
    }

    /// Mesh identifier, falling back to the tile name.
    pub fn mesh_name(&self) -> &str {
        self.mesh.as_deref().unwrap_or(&self.name)
    }
}

/// Whether a declaration constrains horizontal neighbours or vertical stacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjacencyKind {
    /// Expanded through the rotation and mirror closure in the xy plane.
    Horizontal,
    /// Expanded through all eight transform slots along the z axis.
    Vertical,
}

impl AdjacencyKind {
    /// `"horizontal"` or an empty token is horizontal; every other token is vertical.
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "" | "horizontal" => Self::Horizontal,
            _ => Self::Vertical,
        }
    }

    /// Canonical token written to rule files.
    pub fn token(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// A reference to one orientation of a tile, written `"name [orientation]"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRef {
    /// Name of the referenced tile.
    pub name: String,
    /// Slot in the transform table of the tile's first action.
    pub orientation: usize,
}

impl FromStr for TileRef {
    type Err = TileSetError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parts = text.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| TileSetError::InvalidTileRef(text.to_owned()))?;
        let orientation = match parts.next() {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| TileSetError::InvalidTileRef(text.to_owned()))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(TileSetError::InvalidTileRef(text.to_owned()));
        }
        if orientation >= Transformation::ALL.len() {
            return Err(TileSetError::OrientationOutOfRange {
                tile: name.to_owned(),
                orientation,
            });
        }
        Ok(Self {
            name: name.to_owned(),
            orientation,
        })
    }
}

impl fmt::Display for TileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.orientation)
    }
}

/// One adjacency declaration as written in a rule file.
///
/// References stay textual until the propagator is built so that every
/// resolution failure is reported as a [`TileSetError`] at that point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NeighborDecl {
    /// `"horizontal"`, `"vertical"` or empty for horizontal.
    #[serde(default)]
    pub kind: String,
    /// Left-hand tile reference.
    pub left: String,
    /// Right-hand tile reference.
    pub right: String,
}

impl NeighborDecl {
    /// A horizontal declaration between `left` and `right`.
    pub fn horizontal(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            kind: AdjacencyKind::Horizontal.token().to_owned(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// A vertical declaration between `left` and `right`.
    pub fn vertical(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            kind: AdjacencyKind::Vertical.token().to_owned(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Parsed kind; empty or unknown tokens follow [`AdjacencyKind::from_token`].
    pub fn kind(&self) -> AdjacencyKind {
        AdjacencyKind::from_token(&self.kind)
    }

    /// Parses the left reference.
    pub fn left_ref(&self) -> Result<TileRef, TileSetError> {
        self.left.parse()
    }

    /// Parses the right reference.
    pub fn right_ref(&self) -> Result<TileRef, TileSetError> {
        self.right.parse()
    }
}

/// Tile names designated for boundary seeding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Markers {
    /// Tile seeded on the top layer.
    #[serde(default)]
    pub ground: Option<String>,
    /// Tile seeded on the outer walls.
    #[serde(default)]
    pub empty: Option<String>,
    /// Tile designated as sky.
    #[serde(default)]
    pub sky: Option<String>,
}

impl Markers {
    /// The tile name configured for `role`.
    pub fn get(&self, role: TileRole) -> Option<&str> {
        match role {
            TileRole::Ground => self.ground.as_deref(),
            TileRole::Empty => self.empty.as_deref(),
            TileRole::Sky => self.sky.as_deref(),
        }
    }
}

fn default_voxel_size() -> f32 {
    1.0
}

/// A complete rule file: catalog, adjacency declarations and world scale.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RuleSet {
    /// Edge length of one grid cell in world units.
    #[serde(default = "default_voxel_size")]
    pub voxel_size: f32,
    /// Base tile catalog in declaration order.
    pub tiles: Vec<TileDef>,
    /// Allowed adjacencies.
    #[serde(default)]
    pub neighbors: Vec<NeighborDecl>,
}

impl RuleSet {
    /// A rule set with the default voxel size of 1.
    pub fn new(tiles: Vec<TileDef>, neighbors: Vec<NeighborDecl>) -> Self {
        Self {
            voxel_size: default_voxel_size(),
            tiles,
            neighbors,
        }
    }
}
