use std::collections::HashMap;

use stormworks_files::mesh::types::{Vertex, VertexKey};

/// Builds a shared vertex pool, reusing the index of any bitwise identical vertex added before.
#[derive(Debug, Default)]
pub struct VertexOptimizer {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    lookup: HashMap<VertexKey, u32>,
}

impl VertexOptimizer {
    pub fn add_vertex(&mut self, vertex: Vertex) {
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(vertex.key()).or_insert(next);
        if index == next {
            self.vertices.push(vertex);
        }
        self.indices.push(index);
    }
}
