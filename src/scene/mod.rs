//! The narrow interfaces a host editor implements to hand scenes to the exporter and receive imported objects.
//! Everything here is in editor space (right handed, Z up) and uses glam types, never game types.

use glam::{Affine3A, Vec3, Vec4};

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSlot {
    pub name: String,
    /// The principled base color, `None` when it is driven by a node graph.
    pub base_color: Option<Vec4>,
}

impl MaterialSlot {
    pub fn new(name: impl Into<String>, base_color: Option<Vec4>) -> Self {
        MaterialSlot {
            name: name.into(),
            base_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Corners, indexing into [`PolyMesh::positions`].
    pub vertices: Vec<u32>,
    pub material_index: usize,
}

impl Polygon {
    pub fn new(vertices: Vec<u32>, material_index: usize) -> Self {
        Polygon {
            vertices,
            material_index,
        }
    }
}

/// Mesh data as the editor stores it: arbitrary polygons, object local positions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolyMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    /// Empty slots are allowed, faces using them are exported with the default material.
    pub materials: Vec<Option<MaterialSlot>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    Empty,
    Camera,
    Light,
    Other,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub selected: bool,
    pub world_transform: Affine3A,
    /// The mesh data without any modifiers.
    pub mesh: Option<PolyMesh>,
    /// The host's evaluation of the modifier stack, if it has one.
    pub evaluated_mesh: Option<PolyMesh>,
}

impl SceneObject {
    pub fn new_mesh(name: impl Into<String>, mesh: PolyMesh) -> Self {
        SceneObject {
            name: name.into(),
            kind: ObjectKind::Mesh,
            selected: false,
            world_transform: Affine3A::IDENTITY,
            mesh: Some(mesh),
            evaluated_mesh: None,
        }
    }

    pub fn with_transform(mut self, world_transform: Affine3A) -> Self {
        self.world_transform = world_transform;
        self
    }

    pub fn with_evaluated_mesh(mut self, evaluated_mesh: PolyMesh) -> Self {
        self.evaluated_mesh = Some(evaluated_mesh);
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// The mesh to export: the evaluated one when modifiers are applied and the host provided it.
    pub fn export_mesh(&self, apply_modifiers: bool) -> Option<&PolyMesh> {
        if apply_modifiers {
            self.evaluated_mesh.as_ref().or(self.mesh.as_ref())
        } else {
            self.mesh.as_ref()
        }
    }
}

/// Scene extraction: a snapshot of every object the host wants to offer for export.
pub trait SceneSource {
    fn objects(&self) -> Vec<SceneObject>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryScene {
    pub objects: Vec<SceneObject>,
}

impl InMemoryScene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        InMemoryScene { objects }
    }
}

impl SceneSource for InMemoryScene {
    fn objects(&self) -> Vec<SceneObject> {
        self.objects.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    pub color: Vec4,
}

/// A triangle mesh object created by an import, positions in editor world space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportedObject {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub materials: Vec<ImportedMaterial>,
    /// Material index per triangle, empty when the object has no materials.
    pub triangle_materials: Vec<usize>,
}

/// Scene construction: the host creates its own objects from what imports hand it.
pub trait SceneBuilder {
    /// Objects added until [`SceneBuilder::end_collection`] belong to a new collection called `name`.
    fn begin_collection(&mut self, name: &str);
    fn end_collection(&mut self);
    fn add_object(&mut self, object: ImportedObject);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedObject {
    pub collection: Option<String>,
    pub object: ImportedObject,
}

/// A [`SceneBuilder`] that just records what it is given.
#[derive(Debug, Clone, Default)]
pub struct CollectedScene {
    pub collections: Vec<String>,
    pub objects: Vec<CollectedObject>,
    active_collection: Option<String>,
}

impl CollectedScene {
    pub fn object(&self, name: &str) -> Option<&ImportedObject> {
        self.objects
            .iter()
            .map(|collected| &collected.object)
            .find(|object| object.name == name)
    }
}

impl SceneBuilder for CollectedScene {
    fn begin_collection(&mut self, name: &str) {
        self.collections.push(name.to_owned());
        self.active_collection = Some(name.to_owned());
    }

    fn end_collection(&mut self) {
        self.active_collection = None;
    }

    fn add_object(&mut self, object: ImportedObject) {
        self.objects.push(CollectedObject {
            collection: self.active_collection.clone(),
            object,
        });
    }
}
