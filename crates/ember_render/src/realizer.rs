//! The GPU-side implementation of the asset layer's realization seam.

use ember_assets::RealizeTexture;

use crate::gpu_context::GpuContext;
use crate::sprite_pipeline::SpritePipeline;
use crate::texture::Texture;

/// A realized texture: the upload plus the bind group the sprite
/// pipeline needs to draw it.
pub struct SpriteTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Holds cloned device/queue/layout handles so the resource manager can
/// own it outright while the render context stays with the host.
pub struct GpuTextureRealizer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture_layout: wgpu::BindGroupLayout,
}

impl GpuTextureRealizer {
    pub fn new(gpu: &GpuContext, pipeline: &SpritePipeline) -> Self {
        Self {
            device: gpu.device.clone(),
            queue: gpu.queue.clone(),
            texture_layout: pipeline.texture_layout.clone(),
        }
    }
}

impl RealizeTexture for GpuTextureRealizer {
    type Texture = SpriteTexture;

    fn realize(
        &self,
        image: &image::DynamicImage,
        label: &str,
    ) -> Result<SpriteTexture, String> {
        if image.width() == 0 || image.height() == 0 {
            return Err(format!("image '{label}' has a zero dimension"));
        }

        let texture = Texture::from_image(&self.device, &self.queue, image, label);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        Ok(SpriteTexture {
            texture,
            bind_group,
        })
    }
}
