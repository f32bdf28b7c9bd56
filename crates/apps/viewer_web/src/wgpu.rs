use ::wgpu::util::DeviceExt;
use std::borrow::Cow;
use std::collections::HashMap;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use scene::host::NodeId;

use crate::draws::{Globals, SphereDraw, SphereInstance};
use crate::mesh::{PointVertex, Vertex, generate_sphere_mesh};

const MESH_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    // x: ambient, y: directional, z: shininess
    light: vec4<f32>,
    camera_pos: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var base_tex: texture_2d<f32>;
@group(1) @binding(1)
var base_sampler: sampler;

struct VsIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) m0: vec4<f32>,
    @location(4) m1: vec4<f32>,
    @location(5) m2: vec4<f32>,
    @location(6) m3: vec4<f32>,
    @location(7) color: vec4<f32>,
    @location(8) params: vec4<f32>,
};

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
    @location(4) params: vec4<f32>,
};

@vertex
fn vs_main(v: VsIn) -> VsOut {
    let model = mat4x4<f32>(v.m0, v.m1, v.m2, v.m3);
    let world = model * vec4<f32>(v.position, 1.0);
    var out: VsOut;
    out.pos = globals.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (model * vec4<f32>(v.normal, 0.0)).xyz;
    out.uv = v.uv;
    out.color = v.color;
    out.params = v.params;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    // Untextured materials bind a 1x1 white texture.
    let base = in.color.rgb * textureSample(base_tex, base_sampler, in.uv).rgb;
    if (in.params.x < 0.5) {
        return vec4<f32>(base, 1.0);
    }

    let n = normalize(in.normal);
    let l = normalize(globals.light_dir.xyz);
    let view = normalize(globals.camera_pos.xyz - in.world_pos);
    let h = normalize(l + view);
    let diffuse = max(dot(n, l), 0.0) * globals.light.y;
    let specular = pow(max(dot(n, h), 0.0), globals.light.z) * globals.light.y * 0.07;
    return vec4<f32>(base * (globals.light.x + diffuse) + vec3<f32>(specular), 1.0);
}
"#;

const POINTS_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    light: vec4<f32>,
    camera_pos: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
    return VsOut(globals.view_proj * vec4<f32>(position, 1.0), color);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

struct GpuMesh {
    vertex_buffer: ::wgpu::Buffer,
    index_buffer: ::wgpu::Buffer,
    index_count: u32,
}

struct PointCloud {
    buffer: ::wgpu::Buffer,
    count: u32,
}

pub struct GpuRenderer {
    _instance: &'static ::wgpu::Instance,
    surface: ::wgpu::Surface<'static>,
    device: ::wgpu::Device,
    queue: ::wgpu::Queue,
    config: ::wgpu::SurfaceConfiguration,
    depth_view: ::wgpu::TextureView,
    mesh_pipeline: ::wgpu::RenderPipeline,
    points_pipeline: ::wgpu::RenderPipeline,
    globals_buffer: ::wgpu::Buffer,
    globals_bind_group: ::wgpu::BindGroup,
    texture_layout: ::wgpu::BindGroupLayout,
    sampler: ::wgpu::Sampler,
    white_texture: ::wgpu::BindGroup,
    textures: HashMap<String, ::wgpu::BindGroup>,
    spheres: HashMap<(u32, u32), GpuMesh>,
    point_clouds: HashMap<NodeId, PointCloud>,
}

impl std::fmt::Debug for GpuRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuRenderer")
            .field("width", &self.config.width)
            .field("height", &self.config.height)
            .field("textures", &self.textures.len())
            .field("sphere_meshes", &self.spheres.len())
            .finish()
    }
}

fn create_depth_view(device: &::wgpu::Device, config: &::wgpu::SurfaceConfiguration) -> ::wgpu::TextureView {
    let tex = device.create_texture(&::wgpu::TextureDescriptor {
        label: Some("globe-depth"),
        size: ::wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: ::wgpu::TextureDimension::D2,
        format: ::wgpu::TextureFormat::Depth24Plus,
        usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&::wgpu::TextureViewDescriptor::default())
}

fn create_texture_bind_group(
    device: &::wgpu::Device,
    queue: &::wgpu::Queue,
    layout: &::wgpu::BindGroupLayout,
    sampler: &::wgpu::Sampler,
    width: u32,
    height: u32,
    rgba: &[u8],
    label: &str,
) -> ::wgpu::BindGroup {
    let size = ::wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&::wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: ::wgpu::TextureDimension::D2,
        format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        ::wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: ::wgpu::Origin3d::ZERO,
            aspect: ::wgpu::TextureAspect::All,
        },
        rgba,
        ::wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&::wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            ::wgpu::BindGroupEntry {
                binding: 0,
                resource: ::wgpu::BindingResource::TextureView(&view),
            },
            ::wgpu::BindGroupEntry {
                binding: 1,
                resource: ::wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn depth_state(write: bool) -> ::wgpu::DepthStencilState {
    ::wgpu::DepthStencilState {
        format: ::wgpu::TextureFormat::Depth24Plus,
        depth_write_enabled: write,
        depth_compare: ::wgpu::CompareFunction::LessEqual,
        stencil: ::wgpu::StencilState::default(),
        bias: ::wgpu::DepthBiasState::default(),
    }
}

fn primitive(topology: ::wgpu::PrimitiveTopology) -> ::wgpu::PrimitiveState {
    ::wgpu::PrimitiveState {
        topology,
        strip_index_format: None,
        front_face: ::wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: ::wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

const INSTANCE_ATTRIBUTES: [::wgpu::VertexAttribute; 6] = ::wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
    8 => Float32x4,
];

const VERTEX_ATTRIBUTES: [::wgpu::VertexAttribute; 3] = ::wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];

const POINT_ATTRIBUTES: [::wgpu::VertexAttribute; 2] = ::wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
];

impl GpuRenderer {
    pub async fn from_canvas(canvas: &web_sys::HtmlCanvasElement) -> Result<Self, JsValue> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        // `wgpu::Surface` must not outlive its `wgpu::Instance`; the instance
        // lives for the rest of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("globe-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        let mesh_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("globe-mesh-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(MESH_SHADER)),
        });
        let points_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("globe-points-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(POINTS_SHADER)),
        });

        let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("globe-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-globals-bgl"),
            entries: &[::wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: ::wgpu::BindingType::Buffer {
                    ty: ::wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("globe-globals-bg"),
            layout: &globals_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-texture-bgl"),
            entries: &[
                ::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Texture {
                        sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: ::wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                ::wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ::wgpu::ShaderStages::FRAGMENT,
                    ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
            label: Some("globe-sampler"),
            address_mode_u: ::wgpu::AddressMode::Repeat,
            address_mode_v: ::wgpu::AddressMode::ClampToEdge,
            mag_filter: ::wgpu::FilterMode::Linear,
            min_filter: ::wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white_texture = create_texture_bind_group(
            &device,
            &queue,
            &texture_layout,
            &sampler,
            1,
            1,
            &[255, 255, 255, 255],
            "globe-white-texture",
        );

        let mesh_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("globe-mesh-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });
        let points_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("globe-points-pipeline-layout"),
            bind_group_layouts: &[&globals_layout],
            immediate_size: 0,
        });

        let mesh_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("globe-mesh-pipeline"),
            layout: Some(&mesh_layout),
            vertex: ::wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    ::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    },
                    ::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<SphereInstance>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::REPLACE),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive(::wgpu::PrimitiveTopology::TriangleList),
            depth_stencil: Some(depth_state(true)),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let points_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("globe-points-pipeline"),
            layout: Some(&points_layout),
            vertex: ::wgpu::VertexState {
                module: &points_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &POINT_ATTRIBUTES,
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &points_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::REPLACE),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive(::wgpu::PrimitiveTopology::PointList),
            depth_stencil: Some(depth_state(false)),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        tracing::info!(width, height, ?format, "wgpu renderer ready");

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            depth_view,
            mesh_pipeline,
            points_pipeline,
            globals_buffer,
            globals_bind_group,
            texture_layout,
            sampler,
            white_texture,
            textures: HashMap::new(),
            spheres: HashMap::new(),
            point_clouds: HashMap::new(),
        })
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    pub fn install_texture(&mut self, url: &str, width: u32, height: u32, rgba: &[u8]) {
        let bind_group = create_texture_bind_group(
            &self.device,
            &self.queue,
            &self.texture_layout,
            &self.sampler,
            width,
            height,
            rgba,
            url,
        );
        self.textures.insert(url.to_string(), bind_group);
    }

    /// Uploads a point cloud once; later calls for the same node are no-ops.
    pub fn ensure_points(&mut self, node: NodeId, points: &[PointVertex]) {
        if self.point_clouds.contains_key(&node) || points.is_empty() {
            return;
        }
        let buffer = self.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-points"),
            contents: bytemuck::cast_slice(points),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        self.point_clouds.insert(
            node,
            PointCloud {
                buffer,
                count: points.len() as u32,
            },
        );
    }

    fn ensure_sphere(&mut self, segments: (u32, u32)) {
        if self.spheres.contains_key(&segments) {
            return;
        }
        let (vertices, indices) = generate_sphere_mesh(segments.0, segments.1);
        let vertex_buffer = self.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-sphere-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: ::wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
            label: Some("globe-sphere-indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: ::wgpu::BufferUsages::INDEX,
        });
        self.spheres.insert(
            segments,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: indices.len() as u32,
            },
        );
    }

    pub fn render(
        &mut self,
        globals: &Globals,
        spheres: &[SphereDraw],
        points: &[NodeId],
    ) -> Result<(), String> {
        // Group draws sharing a mesh and texture so each group is one
        // instanced call.
        let mut groups: Vec<((u32, u32), Option<&str>, Vec<SphereInstance>)> = Vec::new();
        for draw in spheres {
            self.ensure_sphere(draw.segments);
            let texture = draw.texture_url.as_deref();
            match groups
                .iter_mut()
                .find(|(seg, tex, _)| *seg == draw.segments && *tex == texture)
            {
                Some((_, _, instances)) => instances.push(draw.instance),
                None => groups.push((draw.segments, texture, vec![draw.instance])),
            }
        }
        let instances: Vec<SphereInstance> = groups.iter().flat_map(|(_, _, i)| i.iter().copied()).collect();
        let instance_buffer = (!instances.is_empty()).then(|| {
            self.device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-sphere-instances"),
                contents: bytemuck::cast_slice(&instances),
                usage: ::wgpu::BufferUsages::VERTEX,
            })
        });

        let frame = self
            .surface
            .get_current_texture()
            .map_err(|e| format!("surface acquire failed: {e}"))?;
        let view = frame.texture.create_view(&::wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(globals));

        let mut encoder = self.device.create_command_encoder(&::wgpu::CommandEncoderDescriptor {
            label: Some("globe-encoder"),
        });

        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("globe-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color::BLACK),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(1.0),
                        store: ::wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_bind_group(0, &self.globals_bind_group, &[]);

            if let Some(instance_buffer) = instance_buffer.as_ref() {
                rpass.set_pipeline(&self.mesh_pipeline);
                rpass.set_vertex_buffer(1, instance_buffer.slice(..));
                let mut first = 0u32;
                for (segments, texture, group) in &groups {
                    let count = group.len() as u32;
                    let Some(mesh) = self.spheres.get(segments) else {
                        first += count;
                        continue;
                    };
                    let texture_bg = texture
                        .and_then(|url| self.textures.get(url))
                        .unwrap_or(&self.white_texture);
                    rpass.set_bind_group(1, texture_bg, &[]);
                    rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    rpass.set_index_buffer(mesh.index_buffer.slice(..), ::wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..mesh.index_count, 0, first..first + count);
                    first += count;
                }
            }

            rpass.set_pipeline(&self.points_pipeline);
            for node in points {
                if let Some(cloud) = self.point_clouds.get(node) {
                    rpass.set_vertex_buffer(0, cloud.buffer.slice(..));
                    rpass.draw(0..cloud.count, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// Canvas element by id.
pub fn canvas_by_id(document: &web_sys::Document, id: &str) -> Result<web_sys::HtmlCanvasElement, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("canvas #{id} missing")))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
}
