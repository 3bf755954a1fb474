//! Meshes, materials and the GPU representation of a loaded model.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::{texture, tilt::Tilt};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Scalar factors of a glTF metallic-roughness material.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color_factor: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    // Uniforms require 16 byte alignment
    pub _padding: [f32; 2],
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0; 4],
            metallic: 0.0,
            roughness: 1.0,
            _padding: [0.0; 2],
        }
    }
}

#[derive(Debug)]
pub struct Material {
    #[allow(unused)]
    pub name: String,
    #[allow(unused)]
    pub base_color: texture::Texture,
    pub uniform: MaterialUniform,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        base_color: texture::Texture,
        uniform: MaterialUniform,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} material factors")),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let default_sampler;
        let sampler = match &base_color.sampler {
            Some(sampler) => sampler,
            None => {
                default_sampler = texture::create_default_sampler(device);
                &default_sampler
            }
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&base_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            base_color,
            uniform,
            bind_group,
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    #[allow(unused)]
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

/**
 * The raw transform is what the vertex shader reads at group 1: the model
 * matrix and the matrix used to rotate normals.
 */
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
}

impl From<Tilt> for TransformUniform {
    fn from(tilt: Tilt) -> Self {
        let rotation = cgmath::Matrix4::from(tilt.to_quaternion());
        Self {
            model: rotation.into(),
            // pure rotations keep their inverse transpose
            normal: rotation.into(),
        }
    }
}

/// A renderable model: meshes referencing materials, plus the per-model
/// transform buffer the current tilt is written to every frame.
#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

impl Model {
    pub fn new(device: &wgpu::Device, meshes: Vec<Mesh>, materials: Vec<Material>) -> Self {
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Transform Buffer"),
            contents: bytemuck::cast_slice(&[TransformUniform::from(Tilt::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &transform_layout(device),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
            label: Some("model_transform_bind_group"),
        });
        Self {
            meshes,
            materials,
            transform_buffer,
            transform_bind_group,
        }
    }

    pub fn write_transform(&self, queue: &wgpu::Queue, tilt: Tilt) {
        queue.write_buffer(
            &self.transform_buffer,
            0,
            bytemuck::cast_slice(&[TransformUniform::from(tilt)]),
        );
    }
}

pub fn transform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("model_transform_bind_group_layout"),
    })
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

pub trait DrawModel<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh, material: &'a Material);

    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, material: &'a Material, instances: Range<u32>);

    fn draw_model(&mut self, model: &'a Model);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh, material: &'b Material) {
        self.draw_mesh_instanced(mesh, material, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, material: &'b Material, instances: Range<u32>) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(2, &material.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    /// Expects the camera (0) and environment (3) groups to be bound already.
    fn draw_model(&mut self, model: &'b Model) {
        self.set_bind_group(1, &model.transform_bind_group, &[]);
        for mesh in &model.meshes {
            match model.materials.get(mesh.material) {
                Some(material) => self.draw_mesh(mesh, material),
                None => log::warn!(
                    "mesh {} references missing material {}, skipping",
                    mesh.name,
                    mesh.material
                ),
            }
        }
    }
}
