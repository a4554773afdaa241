//! GPU texture resources bindable as an effect's diffuse map.

use std::path::{Path, PathBuf};

/// Errors when creating a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to read texture '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode texture '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("pixel data is {actual} bytes, expected {expected} for {width}x{height} rgba8")]
    DataSize {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },
}

/// A 2D RGBA texture uploaded to the GPU.
pub struct Texture {
    texture: wgpu::Texture,
    size: wgpu::Extent3d,
}

impl Texture {
    /// Uploads raw rgba8 pixel data as a texture.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, TextureError> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(TextureError::DataSize {
                expected,
                actual: pixels.len(),
                width,
                height,
            });
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        Ok(Self { texture, size })
    }

    /// Loads and decodes an image file (png/jpeg) into a texture.
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| TextureError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| TextureError::Decode {
                path: path.to_path_buf(),
                source: e,
            })?
            .to_rgba8();

        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Texture".to_owned());

        Self::from_rgba8(
            device,
            queue,
            &label,
            decoded.width(),
            decoded.height(),
            decoded.as_raw(),
        )
    }

    /// Creates a fresh full-texture view.
    pub fn create_view(&self) -> wgpu::TextureView {
        self.texture
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Underlying wgpu texture.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Texture dimensions.
    pub fn size(&self) -> wgpu::Extent3d {
        self.size
    }
}
