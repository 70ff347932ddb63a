use super::cull::TileInstance;

/// Sort instances back to front.
///
/// Farther tiles sit higher on screen (smaller `depth_key`), so an ascending
/// sort paints them first. The sort is stable: instances sharing a key keep
/// their input (grid) order.
pub fn depth_sort(instances: &mut [TileInstance]) {
    instances.sort_by_key(|i| i.depth_key);
}

// ── TileBatch ─────────────────────────────────────────────────────────────────

/// All visible quads of one frame, flattened for a single indexed draw.
///
/// Each quad contributes four vertices and six indices:
///
/// ```text
/// 0──1
/// │ /│
/// 2──3
/// triangles: (0,1,2) and (1,3,2)
/// ```
///
/// The buffers are cleared, not dropped, between frames so their capacity is
/// reused.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TileBatch {
    /// Vertex positions in viewport pixels (y down).
    pub positions: Vec<[f32; 2]>,
    /// Atlas texture coordinates, one per vertex.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TileBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.uvs.clear();
        self.indices.clear();
    }

    pub fn quad_count(&self) -> usize {
        self.positions.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append one quad centred on the instance's screen position.
    pub fn push(&mut self, inst: &TileInstance) {
        let base = self.positions.len() as u32;
        let half = inst.size / 2.0;
        let cx = inst.screen_x as f32;
        let cy = inst.screen_y as f32;
        let (x0, y0, x1, y1) = (cx - half, cy - half, cx + half, cy + half);
        let [u0, v0] = inst.uv.min;
        let [u1, v1] = inst.uv.max;

        self.positions.extend_from_slice(&[[x0, y0], [x1, y0], [x0, y1], [x1, y1]]);
        self.uvs.extend_from_slice(&[[u0, v0], [u1, v0], [u0, v1], [u1, v1]]);
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
    }

    /// Replace the contents with `instances`, in order.
    pub fn fill(&mut self, instances: &[TileInstance]) {
        self.clear();
        self.positions.reserve(instances.len() * 4);
        self.uvs.reserve(instances.len() * 4);
        self.indices.reserve(instances.len() * 6);
        for inst in instances {
            self.push(inst);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
