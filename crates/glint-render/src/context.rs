//! Shared graphics context.

use std::fmt;
use std::sync::Arc;

/// Errors raised while bringing up the GPU. All of them are fatal at
/// startup: the caller reports and exits before entering the render loop.
#[derive(Debug)]
pub enum ContextError {
    /// No suitable GPU adapter was found.
    NoAdapter(wgpu::RequestAdapterError),
    /// The adapter refused to create a device.
    Device(wgpu::RequestDeviceError),
    /// A window surface could not be created.
    Surface(wgpu::CreateSurfaceError),
    /// The adapter cannot present to the given surface.
    IncompatibleSurface,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::NoAdapter(err) => {
                write!(f, "no suitable GPU adapter: {}", err)
            }
            ContextError::Device(err) => {
                write!(f, "failed to create GPU device: {}", err)
            }
            ContextError::Surface(err) => {
                write!(f, "failed to create window surface: {}", err)
            }
            ContextError::IncompatibleSurface => {
                write!(f, "adapter cannot present to this surface")
            }
        }
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContextError::NoAdapter(err) => Some(err),
            ContextError::Device(err) => Some(err),
            ContextError::Surface(err) => Some(err),
            ContextError::IncompatibleSurface => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for ContextError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        ContextError::Surface(err)
    }
}

/// A globally shared graphics context.
///
/// Returned as `Arc<Self>` so renderers and window contexts can share it
/// cheaply; dropping the last clone releases the device.
pub struct GraphicsContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GraphicsContext {
    /// Creates a new graphics context asynchronously.
    pub async fn new_owned() -> Result<Arc<Self>, ContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(ContextError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                ..Default::default()
            })
            .await
            .map_err(ContextError::Device)?;

        tracing::info!(adapter = %adapter.get_info().name, "created graphics context");

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
        }))
    }

    /// Creates a new graphics context, blocking until the GPU answers.
    pub fn new_owned_sync() -> Result<Arc<Self>, ContextError> {
        pollster::block_on(Self::new_owned())
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
