pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("trace,wgpu_core=info,wgpu_hal=info,winit=info,naga=info")
        .init();
}
