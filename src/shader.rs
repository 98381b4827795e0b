//! Shader program compilation and typed uniform uploads.
//!
//! GLSL sources are parsed and validated with naga before the backend
//! ever sees them, so compile diagnostics are identical on every
//! backend (including [`DummyBackend`](crate::backend::DummyBackend)).
//! Validation also yields the set of uniform names the program
//! declares, which uniform uploads are checked against.
//!
//! The naga frontend requires every uniform and uniform block to carry
//! an explicit `layout(binding = N)` qualifier; default-block uniforms
//! without one are rejected at compile time.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use static_assertions::assert_impl_all;

use crate::backend::{GpuBackend, ProgramId, UniformValue};
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::types::BufferUsage;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

impl From<ShaderStage> for naga::ShaderStage {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// A compiled and linked shader program.
///
/// Uniforms are uploaded by name. Uploading a name the program never
/// declared is a logged no-op rather than an error, matching how GL
/// treats uniforms the compiler optimized out.
pub struct ShaderProgram {
    backend: Arc<dyn GpuBackend>,
    id: ProgramId,
    uniforms: HashSet<String>,
    released: AtomicBool,
}

impl ShaderProgram {
    /// Compile, validate and link a program from GLSL stage sources.
    pub(crate) fn new(
        backend: Arc<dyn GpuBackend>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, GraphicsError> {
        // Front-end validation runs before any backend allocation, so a
        // failed compile leaks no program handle.
        let vertex_module = compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment_module = compile_stage(ShaderStage::Fragment, fragment_source)?;

        let mut uniforms = HashSet::new();
        collect_uniform_names(&vertex_module, &mut uniforms);
        collect_uniform_names(&fragment_module, &mut uniforms);

        let id = backend.create_program(vertex_source, fragment_source)?;
        log::trace!("Created shader program {:?} with {} uniforms", id, uniforms.len());

        Ok(Self {
            backend,
            id,
            uniforms,
            released: AtomicBool::new(false),
        })
    }

    /// Get the backend handle of this program.
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Whether the program declares a uniform with this name.
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains(name)
    }

    /// Upload a boolean uniform.
    pub fn upload_uniform_bool(&self, name: &str, value: bool) {
        self.upload(name, UniformValue::Bool(value));
    }

    /// Upload an integer uniform.
    pub fn upload_uniform_int(&self, name: &str, value: i32) {
        self.upload(name, UniformValue::Int(value));
    }

    /// Upload a two-component integer vector uniform.
    pub fn upload_uniform_ivec2(&self, name: &str, value: glam::IVec2) {
        self.upload(name, UniformValue::IVec2(value.to_array()));
    }

    /// Upload a float uniform.
    pub fn upload_uniform_float(&self, name: &str, value: f32) {
        self.upload(name, UniformValue::Float(value));
    }

    /// Upload a three-component float vector uniform.
    pub fn upload_uniform_vec3(&self, name: &str, value: glam::Vec3) {
        self.upload(name, UniformValue::Vec3(value.to_array()));
    }

    /// Upload a four-component float vector uniform.
    pub fn upload_uniform_vec4(&self, name: &str, value: glam::Vec4) {
        self.upload(name, UniformValue::Vec4(value.to_array()));
    }

    /// Upload a 4x4 matrix uniform, column-major.
    pub fn upload_uniform_mat4(&self, name: &str, value: &glam::Mat4) {
        self.upload(name, UniformValue::Mat4(value.to_cols_array()));
    }

    fn upload(&self, name: &str, value: UniformValue) {
        if self.released.load(Ordering::Acquire) {
            log::warn!("Uniform '{}' uploaded to a released program", name);
            return;
        }
        if !self.uniforms.contains(name) {
            log::debug!("Program {:?} declares no uniform '{}' (typo?)", self.id, name);
            return;
        }
        self.backend.set_uniform(self.id, name, value);
    }

    /// Bind a named uniform block to a binding point, backed by `buffer`.
    pub fn bind_uniform_block(
        &self,
        name: &str,
        binding: u32,
        buffer: &Buffer,
    ) -> Result<(), GraphicsError> {
        if !buffer.descriptor().usage.contains(BufferUsage::UNIFORM) {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer bound to uniform block '{}' lacks UNIFORM usage",
                name
            )));
        }
        self.backend.bind_uniform_block(self.id, name, binding, buffer.id());
        Ok(())
    }

    /// Free the backend program. Safe to call more than once.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.backend.destroy_program(self.id);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("id", &self.id)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}

fn compile_stage(stage: ShaderStage, source: &str) -> Result<naga::Module, GraphicsError> {
    let options = naga::front::glsl::Options::from(naga::ShaderStage::from(stage));
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, source)
        .map_err(|err| GraphicsError::ShaderCompileFailed {
            stage,
            log: err.emit_to_string(source),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| GraphicsError::ShaderCompileFailed {
        stage,
        log: err.emit_to_string(source),
    })?;

    Ok(module)
}

fn collect_uniform_names(module: &naga::Module, uniforms: &mut HashSet<String>) {
    for (_, variable) in module.global_variables.iter() {
        let is_uniform = matches!(
            variable.space,
            naga::AddressSpace::Uniform | naga::AddressSpace::Handle
        );
        if !is_uniform {
            continue;
        }
        if let Some(name) = &variable.name {
            uniforms.insert(name.clone());
        }
    }
}

assert_impl_all!(ShaderProgram: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    const VALID_VS: &str = r#"
        #version 450 core
        layout(location = 0) in vec2 position;
        layout(binding = 0) uniform mat4 u_view_projection;
        void main() {
            gl_Position = u_view_projection * vec4(position, 0.0, 1.0);
        }
    "#;

    const VALID_FS: &str = r#"
        #version 450 core
        layout(location = 0) out vec4 color;
        layout(binding = 1) uniform vec4 u_tint;
        void main() {
            color = u_tint;
        }
    "#;

    fn backend() -> Arc<DummyBackend> {
        Arc::new(DummyBackend::new())
    }

    #[test]
    fn test_compile_and_reflect_uniforms() {
        let backend = backend();
        let program =
            ShaderProgram::new(backend.clone(), VALID_VS, VALID_FS).unwrap();
        assert!(program.has_uniform("u_view_projection"));
        assert!(program.has_uniform("u_tint"));
        assert!(!program.has_uniform("u_missing"));
        assert_eq!(backend.live_program_count(), 1);
    }

    #[test]
    fn test_invalid_source_reports_stage_and_log() {
        let backend = backend();
        let result = ShaderProgram::new(
            backend.clone(),
            "#version 450 core\nvoid main() { this is not glsl }",
            VALID_FS,
        );
        match result {
            Err(GraphicsError::ShaderCompileFailed { stage, log }) => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected compile failure, got {:?}", other),
        }
        // No backend handle may be left behind by a failed compile.
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_uniform_without_binding_qualifier_is_rejected() {
        // The naga frontend accepts only binding-qualified uniforms;
        // a default-block uniform must fail at the vertex stage.
        let backend = backend();
        let vs = r#"
            #version 450 core
            layout(location = 0) in vec2 position;
            uniform mat4 u_view_projection;
            void main() {
                gl_Position = u_view_projection * vec4(position, 0.0, 1.0);
            }
        "#;
        let result = ShaderProgram::new(backend.clone(), vs, VALID_FS);
        match result {
            Err(GraphicsError::ShaderCompileFailed { stage, log }) => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("expected compile failure, got {:?}", other),
        }
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_unknown_uniform_is_silent_noop() {
        let backend = backend();
        let program =
            ShaderProgram::new(backend.clone(), VALID_VS, VALID_FS).unwrap();
        program.upload_uniform_float("u_missing", 1.0);
        assert_eq!(backend.uniform_value(program.id(), "u_missing"), None);
    }

    #[test]
    fn test_uniform_upload_reaches_backend() {
        let backend = backend();
        let program =
            ShaderProgram::new(backend.clone(), VALID_VS, VALID_FS).unwrap();
        let matrix = glam::Mat4::IDENTITY;
        program.upload_uniform_mat4("u_view_projection", &matrix);
        assert_eq!(
            backend.uniform_value(program.id(), "u_view_projection"),
            Some(UniformValue::Mat4(matrix.to_cols_array()))
        );
    }

    #[test]
    fn test_release_is_idempotent() {
        let backend = backend();
        let program =
            ShaderProgram::new(backend.clone(), VALID_VS, VALID_FS).unwrap();
        program.release();
        program.release();
        assert_eq!(backend.live_program_count(), 0);
        drop(program);
        assert_eq!(backend.live_program_count(), 0);
    }
}
