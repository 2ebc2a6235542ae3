//! Texture loading: image file -> GPU-resident RGBA pixels.

use crate::batch::TextureId;
use crate::context::GraphicsContext;
use crate::sprite::TextureInfo;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors from decoding or uploading a texture. Resource-load failures are
/// propagated, not fatal — the caller decides whether to substitute a
/// placeholder or abort.
#[derive(Debug)]
pub enum TextureError {
    /// Could not read the file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The bytes are not a decodable image.
    Decode {
        path: PathBuf,
        message: String,
    },

    /// The image is not stored as 8-bit RGBA.
    ///
    /// Non-RGBA sources must be converted before reaching the loader; this
    /// is the boundary contract with the image pipeline.
    UnsupportedFormat {
        path: PathBuf,
        found: String,
    },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Io { path, source } => {
                write!(f, "failed to read '{}': {}", path.display(), source)
            }
            TextureError::Decode { path, message } => {
                write!(f, "failed to decode '{}': {}", path.display(), message)
            }
            TextureError::UnsupportedFormat { path, found } => {
                write!(
                    f,
                    "'{}' is {} but the sprite pipeline requires 8-bit RGBA",
                    path.display(),
                    found
                )
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Decoded RGBA pixels waiting for upload.
#[derive(Debug)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode an image file, rejecting anything that is not natively 8-bit
/// RGBA. Pure CPU work, no GPU involved; `Texture::load` builds on it.
pub fn decode_rgba(path: &Path) -> Result<DecodedImage, TextureError> {
    let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let image = image::load_from_memory(&bytes).map_err(|err| TextureError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    if image.color() != image::ColorType::Rgba8 {
        return Err(TextureError::UnsupportedFormat {
            path: path.to_path_buf(),
            found: format!("{:?}", image.color()),
        });
    }

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

/// A GPU texture holding one sprite atlas.
///
/// Created once per image file and referenced by [`TextureId`] thereafter;
/// pixel contents never change after creation. The batcher only ever sees
/// the id, never the resource.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Decode `path` and upload it.
    pub fn load(context: &GraphicsContext, path: &Path) -> Result<Self, TextureError> {
        let decoded = decode_rgba(path)?;
        tracing::info!(
            path = %path.display(),
            width = decoded.width,
            height = decoded.height,
            "loaded texture"
        );
        Ok(Self::from_rgba8(
            context,
            &decoded.pixels,
            decoded.width,
            decoded.height,
        ))
        // decoded drops here; the CPU-side pixels are gone once uploaded
    }

    /// Upload raw RGBA pixels.
    ///
    /// # Panics
    ///
    /// Panics when `pixels` is not exactly `width * height * 4` bytes.
    pub fn from_rgba8(context: &GraphicsContext, pixels: &[u8], width: u32, height: u32) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "pixel buffer does not match {}x{} RGBA",
            width,
            height
        );

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = context.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite Atlas Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        context.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            id: TextureId::allocate(),
            width,
            height,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// The copyable view the sprite emitter works with.
    pub fn info(&self) -> TextureInfo {
        TextureInfo {
            id: self.id,
            width: self.width,
            height: self.height,
        }
    }
}
