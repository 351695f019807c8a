use gl;
use gl::types::*;
use hashbrown::HashMap;

use cgmath::Matrix4;

use std::cell::RefCell;
use std::ffi::CString;
use std::mem::MaybeUninit;
use std::ptr;
use std::rc::Rc;

/// Attribute locations every program gets bound to before linking.
pub const ATTRIB_POSITION: GLuint = 0;
pub const ATTRIB_TEXCOORD: GLuint = 1;
pub const ATTRIB_DIFFUSE: GLuint = 2;

pub const UNIFORM_MVP: &str = "modelviewprojection";
pub const UNIFORM_DIFFUSE_TEXTURE: &str = "diffuse_texture";
/// Fragments with an alpha at or below this are discarded, -1 keeps everything.
pub const UNIFORM_ALPHA_THRESHOLD: &str = "alpha_threshold";
pub const ALPHA_THRESHOLD_OFF: f32 = -1.0;

pub static DEFAULT_VERTEX_SOURCE: &str = r#"#version 330 core

in vec3 position;
in vec2 texcoord;
in vec4 diffuse;

out vec2 texcoord_v;
out vec4 diffuse_v;

uniform mat4 modelviewprojection;

void main()
{
  texcoord_v = texcoord;
  diffuse_v = diffuse;
  gl_Position = modelviewprojection * vec4(position, 1.0);
}
"#;

pub static DEFAULT_FRAGMENT_SOURCE: &str = r#"#version 330 core

uniform sampler2D diffuse_texture;
uniform float alpha_threshold = -1.0;

in vec2 texcoord_v;
in vec4 diffuse_v;

layout(location = 0) out vec4 frag_color;

void main()
{
  vec4 color = texture(diffuse_texture, texcoord_v) * diffuse_v;
  if (color.a <= alpha_threshold)
    discard;
  frag_color = color;
}
"#;

#[derive(Debug)]
pub struct ShaderLoadError {
    err_type: &'static str,
    error_message: String,
}

impl ::std::error::Error for ShaderLoadError {
}

impl ShaderLoadError {
    pub (crate) fn new(err_type: &'static str, error_message: String) -> ShaderLoadError {
        ShaderLoadError {
            err_type,
            error_message
        }
    }

    pub fn err_type(&self) -> &'static str {
        self.err_type
    }

    /// The driver's info log.
    pub fn message(&self) -> &str {
        &self.error_message
    }
}

impl ::std::fmt::Display for ShaderLoadError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(f, "error of type {} while loading shader: {}", self.err_type, self.error_message)
    }
}

#[derive(Clone, Copy, Debug)]
enum ShaderBuildStep {
    PrepareSource,
    CompileVertexShader,
    CompileFragmentShader,
    LinkProgram
}

impl ShaderBuildStep {
    fn as_err_type(&self) -> &'static str {
        match *self {
            ShaderBuildStep::PrepareSource => "PREPARE_SOURCE",
            ShaderBuildStep::CompileVertexShader => "COMPILE_VERTEX",
            ShaderBuildStep::CompileFragmentShader => "COMPILE_FRAGMENT",
            ShaderBuildStep::LinkProgram => "LINK_PROGRAM"
        }
    }
}

pub type ShaderProgramPtr = Rc<ShaderProgram>;

/// A linked GLSL program, with its uniform locations cached by name.
#[derive(Debug)]
pub struct ShaderProgram {
    id: GLuint,
    /// -1 is cached too, so a missing uniform is only reported once
    uniforms: RefCell<HashMap<String, GLint>>,
}

impl ShaderProgram {
    /// Check that the build step "step" has been completed successfully, otherwise return an
    /// Error with the proper information
    fn check_build_step(object: GLuint, step: ShaderBuildStep) -> Result<(), ShaderLoadError> {
        unsafe {
            let mut compile_result: MaybeUninit<GLint> = MaybeUninit::uninit();
            let mut info_log_length: MaybeUninit<GLint> = MaybeUninit::uninit();
            let is_program = matches!(step, ShaderBuildStep::LinkProgram);
            if is_program {
                gl::GetProgramiv(object, gl::LINK_STATUS, compile_result.as_mut_ptr());
            } else {
                gl::GetShaderiv(object, gl::COMPILE_STATUS, compile_result.as_mut_ptr());
            }
            if compile_result.assume_init() == i32::from(gl::TRUE) {
                return Ok(());
            }
            // retrieve the error
            if is_program {
                gl::GetProgramiv(object, gl::INFO_LOG_LENGTH, info_log_length.as_mut_ptr());
            } else {
                gl::GetShaderiv(object, gl::INFO_LOG_LENGTH, info_log_length.as_mut_ptr());
            }
            let info_log_length = info_log_length.assume_init().max(1);
            let mut error_message: Vec<u8> = vec![0; info_log_length as usize];
            let mut written: GLsizei = 0;
            if is_program {
                gl::GetProgramInfoLog(object, info_log_length, &mut written, error_message.as_mut_ptr() as *mut GLchar);
            } else {
                gl::GetShaderInfoLog(object, info_log_length, &mut written, error_message.as_mut_ptr() as *mut GLchar);
            }
            error_message.truncate(written.max(0) as usize);
            Err(ShaderLoadError::new(step.as_err_type(), String::from_utf8_lossy(&error_message).into_owned()))
        }
    }

    fn compile(kind: GLenum, source: &str, step: ShaderBuildStep) -> Result<GLuint, ShaderLoadError> {
        let source = CString::new(source)
            .map_err(|e| ShaderLoadError::new(ShaderBuildStep::PrepareSource.as_err_type(), e.to_string()))?;
        unsafe {
            let id = gl::CreateShader(kind);
            gl::ShaderSource(id, 1, &source.as_c_str().as_ptr(), ptr::null());
            gl::CompileShader(id);
            if let Err(e) = Self::check_build_step(id, step) {
                gl::DeleteShader(id);
                return Err(e);
            }
            Ok(id)
        }
    }

    pub fn from_sources(vertex_source: &str, fragment_source: &str) -> Result<ShaderProgram, ShaderLoadError> {
        let vertex_shader_id = Self::compile(gl::VERTEX_SHADER, vertex_source, ShaderBuildStep::CompileVertexShader)?;
        let fragment_shader_id = match Self::compile(gl::FRAGMENT_SHADER, fragment_source, ShaderBuildStep::CompileFragmentShader) {
            Ok(id) => id,
            Err(e) => {
                unsafe { gl::DeleteShader(vertex_shader_id); }
                return Err(e);
            }
        };
        unsafe {
            let program_id = gl::CreateProgram();
            gl::AttachShader(program_id, vertex_shader_id);
            gl::AttachShader(program_id, fragment_shader_id);

            let attribs: [(GLuint, &[u8]); 3] = [
                (ATTRIB_POSITION, b"position\0"),
                (ATTRIB_TEXCOORD, b"texcoord\0"),
                (ATTRIB_DIFFUSE, b"diffuse\0"),
            ];
            for &(location, name) in &attribs {
                gl::BindAttribLocation(program_id, location, name.as_ptr() as *const GLchar);
            }

            gl::LinkProgram(program_id);
            let linked = Self::check_build_step(program_id, ShaderBuildStep::LinkProgram);

            gl::DetachShader(program_id, vertex_shader_id);
            gl::DetachShader(program_id, fragment_shader_id);
            gl::DeleteShader(vertex_shader_id);
            gl::DeleteShader(fragment_shader_id);

            if let Err(e) = linked {
                gl::DeleteProgram(program_id);
                return Err(e);
            }
            log::debug!("linked shader program {}", program_id);
            Ok(ShaderProgram {
                id: program_id,
                uniforms: RefCell::new(HashMap::new()),
            })
        }
    }

    /// Textured, per-vertex colored, no lighting.
    pub fn default_program() -> Result<ShaderProgram, ShaderLoadError> {
        Self::from_sources(DEFAULT_VERTEX_SOURCE, DEFAULT_FRAGMENT_SOURCE)
    }

    pub fn handle(&self) -> GLuint {
        self.id
    }

    pub fn use_program(&self) {
        unsafe { gl::UseProgram(self.id); }
    }

    pub fn uniform_location(&self, name: &str) -> Option<GLint> {
        if let Some(&location) = self.uniforms.borrow().get(name) {
            return if location < 0 { None } else { Some(location) };
        }
        let location = match CString::new(name) {
            Ok(cname) => unsafe { gl::GetUniformLocation(self.id, cname.as_ptr()) },
            Err(_) => -1,
        };
        if location < 0 {
            log::warn!("program {} has no active uniform named {:?}", self.id, name);
        }
        self.uniforms.borrow_mut().insert(name.to_owned(), location);
        if location < 0 { None } else { Some(location) }
    }

    /// The program has to be in use.
    pub fn set_uniform_1i(&self, name: &str, value: GLint) {
        if let Some(location) = self.uniform_location(name) {
            unsafe { gl::Uniform1i(location, value); }
        }
    }

    pub fn set_uniform_1f(&self, name: &str, value: GLfloat) {
        if let Some(location) = self.uniform_location(name) {
            unsafe { gl::Uniform1f(location, value); }
        }
    }

    /// Makes the program current and sets `alpha_threshold`. Programs without the
    /// uniform are left alone.
    pub fn set_alpha_threshold(&self, threshold: f32) {
        self.use_program();
        self.set_uniform_1f(UNIFORM_ALPHA_THRESHOLD, threshold);
    }

    pub fn set_uniform_matrix4(&self, name: &str, mat: &Matrix4<f32>) {
        if let Some(location) = self.uniform_location(name) {
            unsafe { gl::UniformMatrix4fv(location, 1, gl::FALSE, mat as *const _ as *const GLfloat); }
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.id); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_names_the_failing_step() {
        let e = ShaderLoadError::new(ShaderBuildStep::CompileFragmentShader.as_err_type(), "0:3: syntax error".into());
        assert_eq!(e.to_string(), "error of type COMPILE_FRAGMENT while loading shader: 0:3: syntax error");
        assert_eq!(ShaderBuildStep::LinkProgram.as_err_type(), "LINK_PROGRAM");
    }

    #[test]
    fn default_sources_expose_the_vertex_contract() {
        for name in &["position", "texcoord", "diffuse", UNIFORM_MVP] {
            assert!(DEFAULT_VERTEX_SOURCE.contains(name));
        }
        assert!(DEFAULT_FRAGMENT_SOURCE.contains(UNIFORM_DIFFUSE_TEXTURE));
    }

    #[test]
    fn default_fragment_keeps_everything_until_a_threshold_is_set() {
        let declaration = format!("uniform float {} = {:.1};", UNIFORM_ALPHA_THRESHOLD, ALPHA_THRESHOLD_OFF);
        assert!(DEFAULT_FRAGMENT_SOURCE.contains(&declaration));
        assert!(DEFAULT_FRAGMENT_SOURCE.contains("discard"));
    }
}
