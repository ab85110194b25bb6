use crate::gl::{BufferData, BufferTarget, ComponentType, Graphics};

/// Typed backing array of an [`AttributeBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    F32(Vec<f32>),
    U16(Vec<u16>),
}

impl AttributeData {
    pub fn len(&self) -> usize {
        match self {
            AttributeData::F32(v) => v.len(),
            AttributeData::U16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_buffer_data(&self) -> BufferData<'_> {
        match self {
            AttributeData::F32(v) => BufferData::F32(v),
            AttributeData::U16(v) => BufferData::U16(v),
        }
    }
}

/// One GPU buffer plus the array that feeds it.
///
/// The handle is allocated once in [`AttributeBuffer::new`]; replacing
/// `values` and calling [`AttributeBuffer::upload`] reuses it.
pub struct AttributeBuffer<G: Graphics> {
    target: BufferTarget,
    size: i32,
    ty: ComponentType,
    normalized: bool,
    buffer: Option<G::Buffer>,
    values: Option<AttributeData>,
}

impl<G: Graphics> AttributeBuffer<G> {
    pub fn new(gl: &G, target: BufferTarget, size: i32, ty: ComponentType) -> Self {
        let buffer = gl.create_buffer();
        if buffer.is_none() {
            log::warn!(target: "hikari::gl", "createBuffer returned null");
        }
        Self {
            target,
            size,
            ty,
            normalized: false,
            buffer,
            values: None,
        }
    }

    pub fn vertex(gl: &G, size: i32) -> Self {
        Self::new(gl, BufferTarget::Array, size, ComponentType::Float)
    }

    pub fn index(gl: &G) -> Self {
        Self::new(gl, BufferTarget::ElementArray, 3, ComponentType::UnsignedShort)
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn buffer(&self) -> Option<&G::Buffer> {
        self.buffer.as_ref()
    }

    pub fn values(&self) -> Option<&AttributeData> {
        self.values.as_ref()
    }

    pub fn values_mut(&mut self) -> Option<&mut AttributeData> {
        self.values.as_mut()
    }

    pub fn set_values(&mut self, values: AttributeData) {
        self.values = Some(values);
    }

    /// Number of scalar entries in the backing array.
    pub fn len(&self) -> usize {
        self.values.as_ref().map_or(0, AttributeData::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Uploads `values` with a static usage hint. No-op while unset.
    pub fn upload(&self, gl: &G) {
        let Some(values) = &self.values else {
            return;
        };
        gl.bind_buffer(self.target, self.buffer.as_ref());
        gl.buffer_data(self.target, values.as_buffer_data());
    }

    /// Resolves the location of `name` in `program` and, for vertex data,
    /// enables and points the attribute at this buffer.
    pub fn bind_for_program(&self, gl: &G, name: &str, program: &G::Program) -> i32 {
        let location = gl.attrib_location(program, name);
        if self.target == BufferTarget::Array {
            self.point_attribute(gl, location);
        }
        location
    }

    /// Rebinds for a draw call; attribute state is not assumed to survive
    /// between meshes.
    pub fn use_for_draw(&self, gl: &G, location: i32) {
        gl.bind_buffer(self.target, self.buffer.as_ref());
        if self.target == BufferTarget::Array {
            self.point_attribute(gl, location);
        }
    }

    fn point_attribute(&self, gl: &G, location: i32) {
        // -1: inactive in this program
        let Ok(location) = u32::try_from(location) else {
            return;
        };
        gl.enable_vertex_attrib_array(location);
        gl.vertex_attrib_pointer(location, self.size, self.ty, self.normalized, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{BufferContents, HeadlessGl};

    #[test]
    fn upload_without_values_is_a_no_op() {
        let gl = HeadlessGl::new();
        let attr = AttributeBuffer::vertex(&gl, 2);
        attr.upload(&gl);
        assert_eq!(gl.buffer_uploads(attr.buffer().unwrap()), 0);
    }

    #[test]
    fn upload_reuses_the_same_handle() {
        let gl = HeadlessGl::new();
        let mut attr = AttributeBuffer::index(&gl);
        attr.set_values(AttributeData::U16(vec![0, 2, 1]));
        attr.upload(&gl);
        attr.set_values(AttributeData::U16(vec![1, 2, 3]));
        attr.upload(&gl);
        let buffer = attr.buffer().unwrap();
        assert_eq!(gl.buffer_count(), 1);
        assert_eq!(gl.buffer_uploads(buffer), 2);
        assert_eq!(gl.buffer_contents(buffer), Some(BufferContents::U16(vec![1, 2, 3])));
    }

    #[test]
    fn index_buffers_skip_pointer_setup() {
        let gl = HeadlessGl::new();
        let program = gl.create_program().unwrap();
        gl.link_program(&program);
        let attr = AttributeBuffer::index(&gl);
        assert_eq!(attr.bind_for_program(&gl, "index", &program), -1);
        assert!(gl.attribute_pointer(0).is_none());
    }
}
