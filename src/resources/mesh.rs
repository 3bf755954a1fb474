use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/**
 * The viewer only ever rotates the model as a whole, so node hierarchies are
 * flattened at load time: every primitive is transformed by its node's world
 * matrix and becomes one `Mesh`.
 */
pub fn load_meshes(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
    default_material: usize,
) -> Vec<model::Mesh> {
    let mut meshes = Vec::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for node in scene.nodes() {
                visit(node, Matrix4::identity(), buffers, device, default_material, &mut meshes);
            }
        }
        None => log::warn!("glTF document has no scene, nothing to draw"),
    }
    meshes
}

fn visit(
    node: gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
    default_material: usize,
    meshes: &mut Vec<model::Mesh>,
) {
    let local: Matrix4<f32> = node.transform().matrix().into();
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        let name = mesh.name().unwrap_or("unknown_mesh");
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("skipping non-triangle primitive {} of {name}", primitive.index());
                continue;
            }
            let material = primitive.material().index().unwrap_or(default_material);
            if let Some(mesh) = load_primitive(&primitive, name, material, world, buffers, device) {
                meshes.push(mesh);
            }
        }
    }

    for child in node.children() {
        visit(child, world, buffers, device, default_material, meshes);
    }
}

fn load_primitive(
    primitive: &gltf::Primitive,
    name: &str,
    material: usize,
    world: Matrix4<f32>,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
) -> Option<model::Mesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.as_slice()));

    let Some(positions) = reader.read_positions() else {
        log::warn!("primitive {} of {name} has no positions", primitive.index());
        return None;
    };
    let mut vertices: Vec<model::ModelVertex> = positions
        .map(|position| model::ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
        vertices
            .iter_mut()
            .zip(tex_coords)
            .for_each(|(vertex, tex_coords)| vertex.tex_coords = tex_coords);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if indices.is_empty() || indices.iter().any(|&i| i as usize >= vertices.len()) {
        log::warn!("primitive {} of {name} has invalid indices", primitive.index());
        return None;
    }

    match reader.read_normals() {
        Some(normals) => vertices
            .iter_mut()
            .zip(normals)
            .for_each(|(vertex, normal)| vertex.normal = normal),
        None => compute_normals(&mut vertices, &indices),
    }

    bake_transform(&mut vertices, world);

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Some(model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
        material,
    })
}

/// Smooth normals for primitives exported without them: every vertex gets the
/// area weighted sum of its faces' normals.
pub fn compute_normals(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for c in indices.chunks_exact(3) {
        let p0: Vector3<f32> = vertices[c[0] as usize].position.into();
        let p1: Vector3<f32> = vertices[c[1] as usize].position.into();
        let p2: Vector3<f32> = vertices[c[2] as usize].position.into();
        // not normalized, so larger faces weigh more
        let face = (p1 - p0).cross(p2 - p0);
        for &i in c {
            sums[i as usize] += face;
        }
    }
    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        if sum.magnitude2() > 0.0 {
            vertex.normal = sum.normalize().into();
        }
    }
}

/// Moves vertices into model space. Normals use the inverse transpose so
/// non-uniform scales keep them perpendicular.
pub fn bake_transform(vertices: &mut [model::ModelVertex], world: Matrix4<f32>) {
    if world == Matrix4::identity() {
        return;
    }
    let upper = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    let normal_matrix = upper
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(upper);
    for vertex in vertices.iter_mut() {
        let p = world * Vector4::new(vertex.position[0], vertex.position[1], vertex.position[2], 1.0);
        vertex.position = p.truncate().into();
        let n = normal_matrix * Vector3::from(vertex.normal);
        if n.magnitude2() > 0.0 {
            vertex.normal = n.normalize().into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::ModelVertex;

    fn vertex(position: [f32; 3]) -> ModelVertex {
        ModelVertex {
            position,
            ..Default::default()
        }
    }

    #[test]
    fn computes_face_normals_for_ccw_triangle() {
        let mut vertices = vec![vertex([0.0, 0.0, 0.0]), vertex([1.0, 0.0, 0.0]), vertex([0.0, 1.0, 0.0])];
        compute_normals(&mut vertices, &[0, 1, 2]);
        for v in &vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn bakes_translation_into_positions_only() {
        let mut vertices = vec![ModelVertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            tex_coords: [0.5, 0.5],
        }];
        bake_transform(&mut vertices, Matrix4::from_translation(Vector3::new(1.0, 0.0, -1.0)));
        assert_eq!(vertices[0].position, [2.0, 2.0, 2.0]);
        assert_eq!(vertices[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[0].tex_coords, [0.5, 0.5]);
    }

    #[test]
    fn non_uniform_scale_keeps_normals_unit_length() {
        let mut vertices = vec![ModelVertex {
            position: [1.0, 1.0, 0.0],
            normal: [0.70710677, 0.70710677, 0.0],
            tex_coords: [0.0, 0.0],
        }];
        bake_transform(&mut vertices, Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0));
        let n = Vector3::from(vertices[0].normal);
        assert!((n.magnitude() - 1.0).abs() < 1e-5);
        // the inverse transpose leans the normal away from the stretched axis
        assert!(n.y > n.x);
    }
}
