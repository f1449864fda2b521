//! The application event loop and per-frame animation driver.
//!
//! One frame works through this sequence: advance the mouse tween, move
//! the light, apply the time-based model animation, then record a render
//! pass drawing the active presentation objects (solid mesh, particle
//! cloud, and optionally the light marker) and present.

use std::sync::Arc;

use cgmath::vec2;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    context::Context,
    scene::{Model, ModelDescriptor, Scene},
    tween::{Tween2, map_range},
};

/// Startup configuration for the viewer.
#[derive(Clone, Debug)]
pub struct Settings {
    pub models: Vec<ModelDescriptor>,
    pub show_mesh: bool,
    pub show_particles: bool,
    /// Draw the light marker.
    pub debug_helpers: bool,
    /// Horizontal light travel mapped from the cursor, in world units.
    pub light_range_x: (f32, f32),
    /// Vertical light travel mapped from the cursor, in world units.
    pub light_range_y: (f32, f32),
    pub light_depth: f32,
    /// Seconds the light takes to catch up with the cursor.
    pub mouse_tween_secs: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models: vec![ModelDescriptor {
                name: "statue",
                file: "statue.glb",
                texture_file: "acoustical_shell_1k.jpg",
                material: Default::default(),
                cloud: Default::default(),
                cloud_seed: 0x5717_9b1e,
                attach_on_load: true,
            }],
            show_mesh: true,
            show_particles: true,
            debug_helpers: false,
            light_range_x: (-8.0, 8.0),
            light_range_y: (-4.0, 4.0),
            light_depth: 4.0,
            mouse_tween_secs: 1.0,
        }
    }
}

struct ViewerState {
    ctx: Context,
    scene: Scene,
    mouse: Tween2,
    started: Instant,
    last_frame: Instant,
    is_surface_configured: bool,
}

impl ViewerState {
    async fn new(window: Arc<Window>, settings: &Settings) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;

        // Load all assets concurrently, promise-all style.
        let loads = settings
            .models
            .iter()
            .map(|desc| Model::load(&ctx.device, &ctx.queue, &ctx.cloud_layout, desc));
        let models: Vec<Model> = futures::future::try_join_all(loads).await?;
        let scene = Scene { models };

        let size = ctx.window.inner_size();
        let center = vec2(size.width as f32 / 2.0, size.height as f32 / 2.0);

        Ok(Self {
            ctx,
            scene,
            mouse: Tween2::new(center, settings.mouse_tween_secs),
            started: Instant::now(),
            last_frame: Instant::now(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.is_surface_configured = true;
            self.ctx.resize(width, height);
            self.ctx.update_camera();
        }
    }

    fn render(&mut self, settings: &Settings) -> Result<(), wgpu::SurfaceError> {
        // Keep the redraw loop going at display rate.
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return Ok(());
        }

        let dt = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();
        let time = self.started.elapsed().as_secs_f32();

        // The light trails the cursor through the tween.
        let mouse = self.mouse.advance(dt);
        let light_x = map_range(
            mouse.x,
            0.0,
            self.ctx.config.width as f32,
            settings.light_range_x.0,
            settings.light_range_x.1,
        );
        let light_y = map_range(
            mouse.y,
            0.0,
            self.ctx.config.height as f32,
            settings.light_range_y.0,
            settings.light_range_y.1,
        );
        self.ctx
            .light
            .set_position(&self.ctx.queue, [light_x, light_y, settings.light_depth]);

        for model in &mut self.scene.models {
            model.animate(&self.ctx.queue, time);
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if settings.debug_helpers {
                render_pass.set_pipeline(&self.ctx.pipelines.light);
                render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &self.ctx.light.bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.ctx.light.marker.vertex_buffer.slice(..));
                render_pass.set_index_buffer(
                    self.ctx.light.marker.index_buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                render_pass.draw_indexed(0..self.ctx.light.marker.num_elements, 0, 0..1);
            }

            if settings.show_mesh {
                render_pass.set_pipeline(&self.ctx.pipelines.mesh);
                for model in self.scene.active_models() {
                    render_pass.set_bind_group(0, &model.material.bind_group, &[]);
                    render_pass.set_bind_group(1, &self.ctx.camera.bind_group, &[]);
                    render_pass.set_bind_group(2, &self.ctx.light.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, model.mesh.vertex_buffer.slice(..));
                    render_pass.set_vertex_buffer(1, model.transform_buffer.slice(..));
                    render_pass.set_index_buffer(
                        model.mesh.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    render_pass.draw_indexed(0..model.mesh.num_elements, 0, 0..1);
                }
            }

            // Particles last: they blend against the solid geometry.
            if settings.show_particles {
                render_pass.set_pipeline(&self.ctx.pipelines.particles);
                render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &self.ctx.light.bind_group, &[]);
                for model in self.scene.active_models() {
                    if model.cloud.amount == 0 {
                        continue;
                    }
                    render_pass.set_bind_group(2, &model.cloud.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, model.cloud.quad_buffer.slice(..));
                    render_pass.set_vertex_buffer(1, model.cloud.instance_buffer.slice(..));
                    render_pass.draw(0..6, 0..model.cloud.amount);
                }
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    settings: Settings,
    state: Option<ViewerState>,
}

impl App {
    fn new(settings: Settings) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            settings,
            state: None,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("stipple");
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create window"),
        );

        let state = self
            .async_runtime
            .block_on(ViewerState::new(window, &self.settings));
        let mut state = match state {
            Ok(state) => state,
            Err(e) => panic!("viewer initialization failed: {e:#}"),
        };

        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        state.ctx.window.request_redraw();
        self.state = Some(state);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::CursorMoved { position, .. } => {
                state
                    .mouse
                    .retarget(vec2(position.x as f32, position.y as f32));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Space => {
                    for model in &mut state.scene.models {
                        if model.is_active {
                            model.detach();
                        } else {
                            model.attach();
                        }
                    }
                }
                KeyCode::KeyH => self.settings.debug_helpers = !self.settings.debug_helpers,
                KeyCode::Escape => event_loop.exit(),
                _ => (),
            },
            WindowEvent::RedrawRequested => match state.render(&self.settings) {
                Ok(()) => (),
                // Reconfigure the surface if it's lost or outdated.
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let size = state.ctx.window.inner_size();
                    state.resize(size.width, size.height);
                }
                Err(e) => {
                    log::error!("unable to render: {e}");
                }
            },
            _ => (),
        }
    }
}

/// Run the viewer until the window closes.
pub fn run(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: could not initialize logger: {e}");
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
