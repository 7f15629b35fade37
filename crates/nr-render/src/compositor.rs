//! Offscreen frame compositor: renders one RGBA frame per call by walking
//! the active generators and effects in timeline order.

use std::collections::HashMap;
use std::sync::Arc;

use nr_features::AudioFeatures;
use nr_nodes::{
    effect_needs_feedback_texture, effect_params, effect_shader_source, generator_params,
    generator_shader_source, resolve_params, NodeUniforms,
};
use nr_timeline::{BlendMode, EffectKind, GeneratorKind, Node, NodeBody, VisualTimeline};

use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
use crate::gpu::GpuContext;

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const COMPOSITE_SHADER: &str = include_str!("shaders/composite.wgsl");

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniforms {
    opacity: f32,
    blend_mode: u32,
    _pad0: f32,
    _pad1: f32,
}

fn blend_mode_index(mode: BlendMode) -> u32 {
    match mode {
        BlendMode::Normal => 0,
        BlendMode::Add => 1,
        BlendMode::Screen => 2,
        BlendMode::Multiply => 3,
    }
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        RenderTarget { texture, view }
    }
}

pub struct Compositor {
    ctx: Arc<GpuContext>,
    width: u32,
    height: u32,
    sampler: wgpu::Sampler,

    generator_bgl: wgpu::BindGroupLayout,
    effect_bgl: wgpu::BindGroupLayout,
    effect_feedback_bgl: wgpu::BindGroupLayout,
    composite_bgl: wgpu::BindGroupLayout,

    composite_pipeline: wgpu::RenderPipeline,

    generator_pipelines: HashMap<GeneratorKind, wgpu::RenderPipeline>,
    effect_pipelines: HashMap<EffectKind, wgpu::RenderPipeline>,

    acc: [RenderTarget; 2],
    scratch: [RenderTarget; 2],
    feedback_history: RenderTarget,
    current_acc: usize,
}

impl Compositor {
    pub fn new(ctx: Arc<GpuContext>, width: u32, height: u32) -> RenderResult<Self> {
        let device = &ctx.device;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nodereel node sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let generator_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("generator bind group layout"),
            entries: &[uniform_entry(0)],
        });

        let effect_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("effect bind group layout"),
            entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
        });

        let effect_feedback_bgl =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("effect feedback bind group layout"),
                entries: &[
                    uniform_entry(0),
                    texture_entry(1),
                    sampler_entry(2),
                    texture_entry(3),
                    sampler_entry(4),
                ],
            });

        let composite_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite bind group layout"),
            entries: &[
                uniform_entry(0),
                texture_entry(1),
                sampler_entry(2),
                texture_entry(3),
                sampler_entry(4),
            ],
        });

        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite shader"),
            source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER.into()),
        });
        let composite_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("composite pipeline layout"),
            bind_group_layouts: &[&composite_bgl],
            push_constant_ranges: &[],
        });
        let composite_pipeline = full_screen_pipeline(
            device,
            "composite pipeline",
            &composite_layout,
            &composite_shader,
        );

        let acc = [
            RenderTarget::new(device, width, height, "accumulator a"),
            RenderTarget::new(device, width, height, "accumulator b"),
        ];
        let scratch = [
            RenderTarget::new(device, width, height, "scratch a"),
            RenderTarget::new(device, width, height, "scratch b"),
        ];
        let feedback_history = RenderTarget::new(device, width, height, "feedback history");

        Ok(Compositor {
            ctx,
            width,
            height,
            sampler,
            generator_bgl,
            effect_bgl,
            effect_feedback_bgl,
            composite_bgl,
            composite_pipeline,
            generator_pipelines: HashMap::new(),
            effect_pipelines: HashMap::new(),
            acc,
            scratch,
            feedback_history,
            current_acc: 0,
        })
    }

    fn generator_pipeline(&mut self, kind: GeneratorKind) -> RenderResult<&wgpu::RenderPipeline> {
        if !self.generator_pipelines.contains_key(&kind) {
            let source = generator_shader_source(kind)
                .ok_or_else(|| RenderError::ShaderCompile(format!("{kind:?}")))?;
            let device = &self.ctx.device;
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("generator shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("generator pipeline layout"),
                bind_group_layouts: &[&self.generator_bgl],
                push_constant_ranges: &[],
            });
            let pipeline = full_screen_pipeline(device, "generator pipeline", &layout, &shader);
            self.generator_pipelines.insert(kind, pipeline);
        }
        Ok(self.generator_pipelines.get(&kind).unwrap())
    }

    fn effect_pipeline(&mut self, kind: EffectKind) -> RenderResult<&wgpu::RenderPipeline> {
        if !self.effect_pipelines.contains_key(&kind) {
            let source = effect_shader_source(kind)
                .ok_or_else(|| RenderError::ShaderCompile(format!("{kind:?}")))?;
            let device = &self.ctx.device;
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("effect shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let bgl = if effect_needs_feedback_texture(kind) {
                &self.effect_feedback_bgl
            } else {
                &self.effect_bgl
            };
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("effect pipeline layout"),
                bind_group_layouts: &[bgl],
                push_constant_ranges: &[],
            });
            let pipeline = full_screen_pipeline(device, "effect pipeline", &layout, &shader);
            self.effect_pipelines.insert(kind, pipeline);
        }
        Ok(self.effect_pipelines.get(&kind).unwrap())
    }

    /// Opacity ramp: 0 outside [start,end], linear fades
    /// in/out, clamped to [0,1].
    fn node_opacity(node: &Node, time_s: f64) -> f32 {
        if time_s < node.start_time_s || time_s > node.end_time_s {
            return 0.0;
        }
        let mut opacity = node.opacity_base.unwrap_or(1.0);
        if let Some(fade_in) = node.fade_in_s {
            if fade_in > 0.0 {
                let t = (time_s - node.start_time_s) / fade_in;
                opacity *= t.clamp(0.0, 1.0) as f32;
            }
        }
        if let Some(fade_out) = node.fade_out_s {
            if fade_out > 0.0 {
                let t = (node.end_time_s - time_s) / fade_out;
                opacity *= t.clamp(0.0, 1.0) as f32;
            }
        }
        opacity.clamp(0.0, 1.0)
    }

    fn clear(&self, target: &RenderTarget, color: wgpu::Color) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_uniform_only(
        &self,
        pipeline: &wgpu::RenderPipeline,
        bgl: &wgpu::BindGroupLayout,
        uniforms: NodeUniforms,
        target: &RenderTarget,
    ) {
        let device = &self.ctx.device;
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("node uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("generator bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("generator encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("generator pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_effect(
        &self,
        pipeline: &wgpu::RenderPipeline,
        bgl: &wgpu::BindGroupLayout,
        uniforms: NodeUniforms,
        src: &RenderTarget,
        feedback: Option<&RenderTarget>,
        target: &RenderTarget,
    ) {
        let device = &self.ctx.device;
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("effect uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&src.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        if let Some(fb) = feedback {
            entries.push(wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&fb.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("effect bind group"),
            layout: bgl,
            entries: &entries,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("effect encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("effect pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn composite_into(
        &self,
        dst: &RenderTarget,
        src: &RenderTarget,
        opacity: f32,
        blend_mode: BlendMode,
        target: &RenderTarget,
    ) {
        let device = &self.ctx.device;
        let uniforms = CompositeUniforms {
            opacity,
            blend_mode: blend_mode_index(blend_mode),
            _pad0: 0.0,
            _pad1: 0.0,
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("composite uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite bind group"),
            layout: &self.composite_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&dst.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("composite encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.composite_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Render one frame at `time_s` and return RGBA8 pixel bytes,
    /// row-major top-to-bottom (already Y-flipped from GPU space).
    pub fn render_frame(
        &mut self,
        timeline: &VisualTimeline,
        features: &AudioFeatures,
        time_s: f64,
    ) -> RenderResult<Vec<u8>> {
        let audio_frame_idx = features.time_to_frame_index(time_s);
        let background = nr_timeline::evaluate(
            &timeline.background_color,
            time_s,
            timeline.duration_s,
            features,
            audio_frame_idx,
        );
        let clear_color = wgpu::Color {
            r: background as f64,
            g: background as f64,
            b: background as f64,
            a: 1.0,
        };

        let mut current = self.current_acc;
        self.clear(&self.acc[current], clear_color);

        for node in &timeline.nodes {
            if !node.enabled {
                continue;
            }
            let opacity = Self::node_opacity(node, time_s);
            if opacity <= 0.0 {
                continue;
            }
            if let NodeBody::Generator { generator } = &node.body {
                if generator.name == GeneratorKind::Unknown {
                    log::warn!("skipping node {} with unknown generator kind", node.id);
                    continue;
                }
                let spec = generator_params(generator.name);
                let values = resolve_params(
                    spec,
                    &generator.params,
                    time_s,
                    timeline.duration_s,
                    features,
                    audio_frame_idx,
                );
                let uniforms =
                    NodeUniforms::new(time_s as f32, self.width, self.height, &values);
                self.generator_pipeline(generator.name)?;
                let pipeline = self.generator_pipelines.get(&generator.name).unwrap();
                self.draw_uniform_only(pipeline, &self.generator_bgl, uniforms, &self.scratch[0]);

                let next = 1 - current;
                self.composite_into(
                    &self.acc[current],
                    &self.scratch[0],
                    opacity,
                    node.blend_mode,
                    &self.acc[next],
                );
                current = next;
            }
        }

        for node in &timeline.nodes {
            if !node.enabled {
                continue;
            }
            let opacity = Self::node_opacity(node, time_s);
            if opacity <= 0.0 {
                continue;
            }
            if let NodeBody::Effect { effect } = &node.body {
                if effect.name == EffectKind::Unknown {
                    log::warn!("skipping node {} with unknown effect kind", node.id);
                    continue;
                }
                let spec = effect_params(effect.name);
                let values = resolve_params(
                    spec,
                    &effect.params,
                    time_s,
                    timeline.duration_s,
                    features,
                    audio_frame_idx,
                );
                let uniforms =
                    NodeUniforms::new(time_s as f32, self.width, self.height, &values);
                self.effect_pipeline(effect.name)?;
                let pipeline = self.effect_pipelines.get(&effect.name).unwrap();
                let bgl = if effect_needs_feedback_texture(effect.name) {
                    &self.effect_feedback_bgl
                } else {
                    &self.effect_bgl
                };
                let feedback = effect_needs_feedback_texture(effect.name)
                    .then_some(&self.feedback_history);

                self.draw_effect(
                    pipeline,
                    bgl,
                    uniforms,
                    &self.acc[current],
                    feedback,
                    &self.scratch[1],
                );

                if opacity < 1.0 {
                    let next = 1 - current;
                    self.composite_into(
                        &self.acc[current],
                        &self.scratch[1],
                        opacity,
                        BlendMode::Normal,
                        &self.acc[next],
                    );
                    current = next;
                } else {
                    let next = 1 - current;
                    self.copy_texture(&self.scratch[1], &self.acc[next]);
                    current = next;
                }

                if effect_needs_feedback_texture(effect.name) {
                    self.copy_texture(&self.acc[current], &self.feedback_history);
                }
            }
        }

        self.current_acc = current;
        self.read_back(&self.acc[current])
    }

    fn copy_texture(&self, src: &RenderTarget, dst: &RenderTarget) {
        let mut encoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("copy encoder"),
                });
        encoder.copy_texture_to_texture(
            src.texture.as_image_copy(),
            dst.texture.as_image_copy(),
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn read_back(&self, target: &RenderTarget) -> RenderResult<Vec<u8>> {
        let bytes_per_row_unpadded = self.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let bytes_per_row = bytes_per_row_unpadded.div_ceil(align) * align;
        let buffer_size = (bytes_per_row * self.height) as u64;

        let staging = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("readback encoder"),
                });
        encoder.copy_texture_to_buffer(
            target.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.ctx.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::Readback(e.to_string()))?
            .map_err(|e| RenderError::Readback(e.to_string()))?;

        let data = slice.get_mapped_range();
        // GPU origin is bottom-left; the image crate's origin is top-left,
        // so rows are copied out in reverse order here.
        let mut out = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in (0..self.height).rev() {
            let start = (row * bytes_per_row) as usize;
            let end = start + bytes_per_row_unpadded as usize;
            out.extend_from_slice(&data[start..end]);
        }
        drop(data);
        staging.unmap();
        Ok(out)
    }
}

fn full_screen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
