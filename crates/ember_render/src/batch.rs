//! CPU-side sprite batching.
//!
//! Screens render by pushing quads keyed by resource key; the host streams
//! the accumulated mesh into GPU buffers once per frame. Consecutive quads
//! that share a texture collapse into a single draw call, so sprites
//! emitted in texture order cost one `draw_indexed` each batch instead of
//! one per quad.

use std::sync::Arc;

use crate::vertex::SpriteVertex;

/// A contiguous run of indices sharing one texture binding.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

pub struct QuadSpec<'a> {
    pub texture_key: &'a str,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub color: [f32; 4],
}

#[derive(Default)]
pub struct SpriteBatch {
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn push_quad(&mut self, spec: QuadSpec<'_>) {
        let half_w = spec.width * 0.5;
        let half_h = spec.height * 0.5;
        let base_index = self.vertices.len() as u32;

        self.vertices.push(SpriteVertex {
            position: [spec.center_x - half_w, spec.center_y - half_h],
            tex_coords: [0.0, 1.0],
            color: spec.color,
        });
        self.vertices.push(SpriteVertex {
            position: [spec.center_x + half_w, spec.center_y - half_h],
            tex_coords: [1.0, 1.0],
            color: spec.color,
        });
        self.vertices.push(SpriteVertex {
            position: [spec.center_x + half_w, spec.center_y + half_h],
            tex_coords: [1.0, 0.0],
            color: spec.color,
        });
        self.vertices.push(SpriteVertex {
            position: [spec.center_x - half_w, spec.center_y + half_h],
            tex_coords: [0.0, 0.0],
            color: spec.color,
        });

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        self.push_draw_call(spec.texture_key, draw_start, 6);
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(key: &str) -> QuadSpec<'_> {
        QuadSpec {
            texture_key: key,
            center_x: 0.0,
            center_y: 0.0,
            width: 16.0,
            height: 16.0,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    #[test]
    fn one_quad_is_four_vertices_six_indices() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(quad("a"));
        assert_eq!(batch.vertices().len(), 4);
        assert_eq!(batch.indices().len(), 6);
        assert_eq!(batch.quad_count(), 1);
        assert_eq!(batch.draw_calls().len(), 1);
    }

    #[test]
    fn consecutive_same_texture_quads_merge() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(quad("a"));
        batch.push_quad(quad("a"));
        batch.push_quad(quad("a"));
        assert_eq!(batch.draw_calls().len(), 1);
        assert_eq!(batch.draw_calls()[0].index_count, 18);
    }

    #[test]
    fn texture_change_splits_the_draw_call() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(quad("a"));
        batch.push_quad(quad("b"));
        batch.push_quad(quad("a"));
        let calls = batch.draw_calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].index_start, 0);
        assert_eq!(calls[1].index_start, 6);
        assert_eq!(calls[2].index_start, 12);
    }

    #[test]
    fn clear_empties_everything() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(quad("a"));
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.indices().len(), 0);
        assert_eq!(batch.draw_calls().len(), 0);
    }

    #[test]
    fn quad_corners_follow_center_and_size() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(QuadSpec {
            texture_key: "a",
            center_x: 10.0,
            center_y: 20.0,
            width: 4.0,
            height: 6.0,
            color: [1.0; 4],
        });
        let v = batch.vertices();
        assert_eq!(v[0].position, [8.0, 17.0]);
        assert_eq!(v[2].position, [12.0, 23.0]);
    }
}
