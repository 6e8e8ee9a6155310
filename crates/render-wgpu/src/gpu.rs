use glam::Mat4;
use std::collections::BTreeMap;
use std::num::NonZeroU64;
use triview_render::{
    BufferId, GpuSurface, ProgramId, RenderError, UniformBlock, UniformLocation, VertexArrayId,
    VertexLayout,
};

const VERTEX_ENTRY: &str = "vs_main";
const FRAGMENT_ENTRY: &str = "fs_main";

/// Round `size` up to the next multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// wgpu attributes for an interleaved float layout. `None` when an attribute
/// has a component count wgpu has no float format for.
pub fn vertex_attributes(layout: &VertexLayout) -> Option<Vec<wgpu::VertexAttribute>> {
    layout
        .attributes
        .iter()
        .map(|a| {
            let format = match a.components {
                1 => wgpu::VertexFormat::Float32,
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                4 => wgpu::VertexFormat::Float32x4,
                _ => return None,
            };
            Some(wgpu::VertexAttribute {
                format,
                offset: a.offset,
                shader_location: a.location,
            })
        })
        .collect()
}

struct VertexBuffer {
    buffer: Option<wgpu::Buffer>,
    len: u64,
}

struct UniformBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u64,
}

struct Program {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniforms: UniformBlock,
    uniform_buffer: Option<UniformBuffer>,
    /// Uniform snapshots for the draws queued this frame.
    staging: Vec<u8>,
}

struct QueuedDraw {
    program: ProgramId,
    buffer: BufferId,
    vertex_count: u32,
    uniform_offset: u32,
}

/// A window surface plus device, driven through [`GpuSurface`].
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    vertex_layout: VertexLayout,
    uniform_alignment: u64,
    next_id: u32,
    buffers: BTreeMap<BufferId, VertexBuffer>,
    vertex_arrays: BTreeMap<VertexArrayId, BufferId>,
    programs: BTreeMap<ProgramId, Program>,
    clear_color: wgpu::Color,
    draws: Vec<QueuedDraw>,
}

impl WgpuSurface {
    /// Create a surface for `target` (usually an `Arc<winit::window::Window>`)
    /// and pick an adapter and device that can present to it.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("triview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as u64;

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            adapter = %adapter.get_info().name,
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            vertex_layout: VertexLayout::POSITION_COLOR,
            uniform_alignment,
            next_id: 0,
            buffers: BTreeMap::new(),
            vertex_arrays: BTreeMap::new(),
            programs: BTreeMap::new(),
            clear_color: wgpu::Color::BLACK,
            draws: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        tracing::debug!(width, height, "surface resized");
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn compile_module(&self, label: &str, source: &str) -> Result<wgpu::ShaderModule, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompile(format!("{label}: {err}"))),
            None => Ok(module),
        }
    }

    fn build_pipeline(
        &self,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        bind_group_layout: Option<&wgpu::BindGroupLayout>,
    ) -> Result<wgpu::RenderPipeline, RenderError> {
        let attributes = vertex_attributes(&self.vertex_layout)
            .ok_or_else(|| RenderError::Device("unsupported vertex layout".into()))?;

        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.into_iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("triangle_pipeline_layout"),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("triangle_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: self.vertex_layout.stride,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &attributes,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompile(format!("link: {err}"))),
            None => Ok(pipeline),
        }
    }

    /// Make sure every program's uniform buffer can hold this frame's
    /// snapshots, then copy them over.
    fn flush_uniforms(&mut self) {
        for program in self.programs.values_mut() {
            if program.staging.is_empty() {
                continue;
            }
            let Some(layout) = &program.bind_group_layout else {
                continue;
            };
            let needed = program.staging.len() as u64;
            let too_small = program
                .uniform_buffer
                .as_ref()
                .is_none_or(|u| u.capacity < needed);
            if too_small {
                let capacity = needed.next_power_of_two();
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("uniform_buffer"),
                    size: capacity,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("uniform_bind_group"),
                    layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: program.uniforms.binding(),
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &buffer,
                            offset: 0,
                            size: NonZeroU64::new(program.uniforms.byte_size()),
                        }),
                    }],
                });
                program.uniform_buffer = Some(UniformBuffer {
                    buffer,
                    bind_group,
                    capacity,
                });
            }
            if let Some(uniform) = &program.uniform_buffer {
                self.queue.write_buffer(&uniform.buffer, 0, &program.staging);
            }
        }
    }

    fn end_frame(&mut self) {
        self.draws.clear();
        for program in self.programs.values_mut() {
            program.staging.clear();
        }
    }
}

impl GpuSurface for WgpuSurface {
    fn create_buffer(&mut self) -> Result<BufferId, RenderError> {
        let id = BufferId(self.next_id());
        self.buffers.insert(
            id,
            VertexBuffer {
                buffer: None,
                len: 0,
            },
        );
        Ok(id)
    }

    fn upload(&mut self, buffer: BufferId, bytes: &[u8]) -> Result<(), RenderError> {
        let entry = self
            .buffers
            .get_mut(&buffer)
            .ok_or(RenderError::UnknownBuffer(buffer))?;

        let len = bytes.len() as u64;
        let padded = align_to(len, wgpu::COPY_BUFFER_ALIGNMENT);
        let fits = entry.buffer.as_ref().is_some_and(|b| b.size() == padded);
        if !fits {
            if let Some(old) = entry.buffer.take() {
                old.destroy();
            }
            if padded > 0 {
                entry.buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("vertex_buffer"),
                    size: padded,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }));
            }
        }
        if let Some(gpu) = &entry.buffer {
            if padded == len {
                self.queue.write_buffer(gpu, 0, bytes);
            } else {
                let mut data = bytes.to_vec();
                data.resize(padded as usize, 0);
                self.queue.write_buffer(gpu, 0, &data);
            }
        }
        entry.len = len;
        Ok(())
    }

    fn buffer_size(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(&buffer).map(|b| b.len)
    }

    fn create_vertex_array(
        &mut self,
        buffer: BufferId,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId, RenderError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(RenderError::UnknownBuffer(buffer));
        }
        if *layout != self.vertex_layout {
            return Err(RenderError::Device(format!(
                "vertex layout with stride {} does not match the pipeline layout",
                layout.stride
            )));
        }
        let id = VertexArrayId(self.next_id());
        self.vertex_arrays.insert(id, buffer);
        Ok(id)
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramId, RenderError> {
        let vertex_module = self.compile_module("vertex_shader", vertex)?;
        let fragment_module = self.compile_module("fragment_shader", fragment)?;

        let uniforms = UniformBlock::from_source(vertex)?;
        if uniforms.byte_size() > 0 && uniforms.group() != 0 {
            return Err(RenderError::ShaderCompile(format!(
                "uniform block is in @group({}); only @group(0) is bound",
                uniforms.group()
            )));
        }
        let bind_group_layout = (uniforms.byte_size() > 0).then(|| {
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("uniform_bind_group_layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: uniforms.binding(),
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: NonZeroU64::new(uniforms.byte_size()),
                        },
                        count: None,
                    }],
                })
        });

        let pipeline = self.build_pipeline(
            &vertex_module,
            &fragment_module,
            bind_group_layout.as_ref(),
        )?;

        let id = ProgramId(self.next_id());
        tracing::debug!(?id, uniforms = uniforms.len(), "program compiled");
        self.programs.insert(
            id,
            Program {
                pipeline,
                bind_group_layout,
                uniforms,
                uniform_buffer: None,
                staging: Vec::new(),
            },
        );
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(&program)?.uniforms.location(name)
    }

    fn set_uniform_mat4(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        value: &Mat4,
    ) -> Result<(), RenderError> {
        let entry = self
            .programs
            .get_mut(&program)
            .ok_or(RenderError::UnknownProgram(program))?;
        if entry.uniforms.set(location, *value) {
            Ok(())
        } else {
            Err(RenderError::UnknownUniform { program, location })
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color.map(f64::from);
        self.clear_color = wgpu::Color { r, g, b, a };
        self.end_frame();
    }

    fn draw_triangles(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        vertex_count: u32,
    ) -> Result<(), RenderError> {
        let buffer = *self
            .vertex_arrays
            .get(&vertex_array)
            .ok_or(RenderError::UnknownVertexArray(vertex_array))?;
        let alignment = self.uniform_alignment;
        let entry = self
            .programs
            .get_mut(&program)
            .ok_or(RenderError::UnknownProgram(program))?;

        let uniform_offset = if entry.uniforms.byte_size() == 0 {
            0
        } else {
            let offset = align_to(entry.staging.len() as u64, alignment);
            entry.staging.resize(offset as usize, 0);
            entry.staging.extend_from_slice(&entry.uniforms.to_bytes());
            offset as u32
        };

        self.draws.push(QueuedDraw {
            program,
            buffer,
            vertex_count,
            uniform_offset,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.end_frame();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out; frame skipped");
                self.end_frame();
                return Ok(());
            }
            Err(e) => {
                self.end_frame();
                return Err(RenderError::Surface(e.to_string()));
            }
        };

        self.flush_uniforms();

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("triangle_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            for draw in &self.draws {
                let (Some(program), Some(vertices)) = (
                    self.programs.get(&draw.program),
                    self.buffers.get(&draw.buffer),
                ) else {
                    continue;
                };
                let Some(buffer) = &vertices.buffer else {
                    continue;
                };
                pass.set_pipeline(&program.pipeline);
                if let Some(uniform) = &program.uniform_buffer {
                    pass.set_bind_group(0, &uniform.bind_group, &[draw.uniform_offset]);
                }
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.end_frame();
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        match self.buffers.remove(&buffer) {
            Some(VertexBuffer {
                buffer: Some(gpu), ..
            }) => gpu.destroy(),
            Some(_) => {}
            None => tracing::warn!(?buffer, "delete of unknown buffer"),
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.vertex_arrays.remove(&vertex_array).is_none() {
            tracing::warn!(?vertex_array, "delete of unknown vertex array");
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        match self.programs.remove(&program) {
            Some(Program {
                uniform_buffer: Some(uniform),
                ..
            }) => uniform.buffer.destroy(),
            Some(_) => {}
            None => tracing::warn!(?program, "delete of unknown program"),
        }
    }
}
