use log::{debug, trace};
use stormworks_files::common::types::{Aabb, SwVec3};
use stormworks_files::mesh::types::{MeshDocument, Shader, SubMesh, Vertex};

use crate::coordinate_systems::editor_to_game;
use crate::export::flatten::FlatMesh;
use crate::export::materials::ExportMaterial;
use crate::export::optimizer::VertexOptimizer;

/// A mesh document ready for encoding, plus the object name `NameMode::Object` embeds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportedMesh {
    pub document: MeshDocument,
    pub object_name: Option<String>,
}

#[derive(Debug, Default)]
struct ShaderBucket {
    triangles: Vec<[Vertex; 3]>,
    material_name: Option<String>,
}

pub enum MeshExporter {}

impl MeshExporter {
    /// Merges the flattened objects into one document with a submesh per used shader, in shader id order. Names come
    /// from the last object (and material) contributing geometry.
    pub fn build(meshes: &[FlatMesh<'_>]) -> ExportedMesh {
        let mut buckets: [ShaderBucket; 4] = Default::default();
        let mut exported = ExportedMesh::default();

        for mesh in meshes {
            if mesh.triangles.is_empty() {
                continue;
            }
            trace!("Collecting {} triangles of {}", mesh.triangles.len(), mesh.object_name);

            for triangle in &mesh.triangles {
                let material = ExportMaterial::resolve(mesh.material(triangle.material_index));
                let normal: SwVec3 = editor_to_game(triangle.normal).into();
                let vertices = triangle
                    .positions
                    .map(|p| Vertex::new(editor_to_game(p).into(), material.color, normal));

                let bucket = &mut buckets[u16::from(material.shader) as usize];
                bucket.triangles.push(vertices);
                if material.name.is_some() {
                    bucket.material_name = material.name;
                }
            }

            exported.document.name = Some(mesh.mesh_name.to_owned());
            exported.object_name = Some(mesh.object_name.to_owned());
        }

        let mut optimizer = VertexOptimizer::default();
        for (shader, bucket) in Shader::ALL.into_iter().zip(buckets) {
            let Some(bounds) = Aabb::from_points(bucket.triangles.iter().flatten().map(|v| v.position)) else {
                continue;
            };

            let index_start = optimizer.indices.len();
            for vertex in bucket.triangles.into_iter().flatten() {
                optimizer.add_vertex(vertex);
            }

            exported.document.submeshes.push(SubMesh {
                index_start: index_start as u32,
                index_count: (optimizer.indices.len() - index_start) as u32,
                shader,
                bounds,
                name: None,
                material_name: bucket.material_name,
            });
        }

        exported.document.vertices = optimizer.vertices;
        exported.document.indices = optimizer.indices;

        debug!(
            "Built mesh with {} vertices, {} triangles and {} submeshes",
            exported.document.vertices.len(),
            exported.document.triangle_count(),
            exported.document.submeshes.len()
        );
        exported
    }
}
