//! Types and constants shared between host code and the triangle shader.
//!
//! `render/shaders/triangle.wgsl` declares the same bindings and layouts by
//! hand. Anything changed here must be changed there in the same commit; the
//! layout assertions below and the WGSL contract test catch the drift.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

/// Buffer slots shared between the shader and the host-side binding calls.
///
/// `Vertices` is the vertex-buffer slot passed to `set_vertex_buffer`;
/// `ViewportSize` is the `@binding` number of the viewport uniform in group 0.
/// The numeric values are part of the contract with the shader.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexInputIndex {
    Vertices = 0,
    ViewportSize = 1,
}

impl VertexInputIndex {
    /// All members in slot order.
    pub const ALL: [VertexInputIndex; 2] = [Self::Vertices, Self::ViewportSize];

    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// Shader location of `Vertex::position`.
pub const POSITION_LOCATION: u32 = 0;

/// Shader location of `Vertex::color`.
pub const COLOR_LOCATION: u32 = 1;

/// One vertex of a 2D colored primitive.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in pixel space, relative to the drawable centre (+Y up).
    /// A value of 100 means 100 pixels from the centre.
    pub position: [f32; 2],

    /// RGBA color, channels in `[0, 1]`.
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        POSITION_LOCATION => Float32x2,
        COLOR_LOCATION => Float32x4
    ];

    #[inline]
    pub const fn new(position: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    /// Vertex-buffer layout matching the shader's `VertexIn`.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Drawable size in physical pixels, read by the vertex stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ViewportUniform {
    pub size: [u32; 2],
    pub padding: [u32; 2], // 16-byte alignment
}

impl ViewportUniform {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            size: [width, height],
            padding: [0; 2],
        }
    }
}

const _: () = {
    assert!(size_of::<Vertex>() == 6 * size_of::<f32>());
    assert!(offset_of!(Vertex, position) == 0);
    assert!(offset_of!(Vertex, color) == 2 * size_of::<f32>());
    assert!(size_of::<ViewportUniform>() == 16);
    assert!(offset_of!(ViewportUniform, size) == 0);
};

#[cfg(test)]
mod tests {
    use super::*;

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn vertex_is_six_floats() {
        assert_eq!(size_of::<Vertex>(), 24);
        assert_eq!(std::mem::align_of::<Vertex>(), std::mem::align_of::<f32>());
    }

    #[test]
    fn vertex_layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, size_of::<Vertex>() as u64);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Vertex);

        let attrs = layout.attributes;
        assert_eq!(attrs.len(), 2);

        assert_eq!(attrs[0].shader_location, POSITION_LOCATION);
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attrs[0].offset, offset_of!(Vertex, position) as u64);

        assert_eq!(attrs[1].shader_location, COLOR_LOCATION);
        assert_eq!(attrs[1].format, wgpu::VertexFormat::Float32x4);
        assert_eq!(attrs[1].offset, offset_of!(Vertex, color) as u64);
    }

    #[test]
    fn vertex_buffer_is_tightly_packed() {
        let verts = [
            Vertex::new([1.0, 2.0], [3.0, 4.0, 5.0, 6.0]),
            Vertex::new([7.0, 8.0], [9.0, 10.0, 11.0, 12.0]),
        ];
        let floats: &[f32] = bytemuck::cast_slice(&verts);
        let expected: Vec<f32> = (1..=12).map(|v| v as f32).collect();
        assert_eq!(floats, expected.as_slice());
    }

    // ── binding indices ───────────────────────────────────────────────────

    #[test]
    fn binding_indices_are_stable() {
        assert_eq!(VertexInputIndex::Vertices.index(), 0);
        assert_eq!(VertexInputIndex::ViewportSize.index(), 1);
    }

    #[test]
    fn binding_indices_are_distinct_and_in_slot_order() {
        let indices: Vec<u32> = VertexInputIndex::ALL.iter().map(|i| i.index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    // ── values ────────────────────────────────────────────────────────────

    #[test]
    fn vertex_fields_read_back() {
        let v = Vertex::new([100.0, 0.0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(v.position, [100.0, 0.0]);
        assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);

        let bytes = bytemuck::bytes_of(&v);
        let back: Vertex = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(back, v);
    }

    #[test]
    fn viewport_uniform_zeroes_padding() {
        let u = ViewportUniform::new(800, 600);
        assert_eq!(u.size, [800, 600]);
        assert_eq!(u.padding, [0, 0]);
    }
}

#[cfg(test)]
mod shader_contract_tests {
    use super::*;

    use naga::{AddressSpace, Binding, ResourceBinding, Scalar, TypeInner, VectorSize};

    const WGSL: &str = include_str!("render/shaders/triangle.wgsl");

    fn module() -> naga::Module {
        naga::front::wgsl::parse_str(WGSL).expect("triangle.wgsl parses")
    }

    fn vector(size: VectorSize, scalar: Scalar) -> TypeInner {
        TypeInner::Vector { size, scalar }
    }

    #[test]
    fn viewport_uniform_binding_matches_index() {
        let module = module();
        let uniforms: Vec<_> = module
            .global_variables
            .iter()
            .filter(|(_, gv)| gv.space == AddressSpace::Uniform)
            .map(|(_, gv)| gv)
            .collect();

        assert_eq!(uniforms.len(), 1);
        assert_eq!(
            uniforms[0].binding,
            Some(ResourceBinding {
                group: 0,
                binding: VertexInputIndex::ViewportSize.index(),
            })
        );
    }

    #[test]
    fn viewport_uniform_block_matches_struct() {
        let module = module();
        let (_, gv) = module
            .global_variables
            .iter()
            .find(|(_, gv)| gv.space == AddressSpace::Uniform)
            .expect("uniform declared");

        let TypeInner::Struct { members, span } = &module.types[gv.ty].inner else {
            panic!("viewport uniform is not a struct");
        };
        assert_eq!(*span as usize, size_of::<ViewportUniform>());
        assert_eq!(members[0].offset as usize, offset_of!(ViewportUniform, size));
        assert_eq!(module.types[members[0].ty].inner, vector(VectorSize::Bi, Scalar::U32));
    }

    #[test]
    fn vertex_inputs_match_vertex_layout() {
        let module = module();
        let vs = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == naga::ShaderStage::Vertex)
            .expect("vertex entry point");
        assert_eq!(vs.name, "vs_main");
        assert_eq!(vs.function.arguments.len(), 1);

        let TypeInner::Struct { members, .. } = &module.types[vs.function.arguments[0].ty].inner
        else {
            panic!("vertex input is not a struct");
        };

        let inputs: Vec<(u32, TypeInner)> = members
            .iter()
            .map(|m| match m.binding {
                Some(Binding::Location { location, .. }) => {
                    (location, module.types[m.ty].inner.clone())
                }
                ref other => panic!("unexpected vertex input binding {other:?}"),
            })
            .collect();

        assert_eq!(
            inputs,
            vec![
                (POSITION_LOCATION, vector(VectorSize::Bi, Scalar::F32)),
                (COLOR_LOCATION, vector(VectorSize::Quad, Scalar::F32)),
            ]
        );
    }

    #[test]
    fn shader_validates() {
        let module = module();
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        validator.validate(&module).expect("triangle.wgsl validates");
    }
}
