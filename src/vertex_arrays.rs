use crate::shader::{ATTRIB_DIFFUSE, ATTRIB_POSITION, ATTRIB_TEXCOORD};

use gl::types::*;
use std::{
    mem::{size_of, MaybeUninit},
    os::raw::c_void,
    ptr,
};

/// The one vertex array object every immediate draw call goes through.
///
/// Streams are re-uploaded on every draw, the buffers only grow.
#[derive(Debug)]
pub struct GLVertexArrays {
    pub (crate) vao: GLuint,
    pub (crate) positions_buffer: GLuint,
    pub (crate) texcoords_buffer: GLuint,
    pub (crate) colors_buffer: GLuint,
    pub (crate) indices_buffer: GLuint,
}

impl GLVertexArrays {
    pub fn new() -> GLVertexArrays {
        let mut vao: MaybeUninit<GLuint> = MaybeUninit::uninit();
        let mut buffers = [0 as GLuint; 4];
        unsafe {
            gl::GenVertexArrays(1, vao.as_mut_ptr());
            gl::GenBuffers(4, buffers.as_mut_ptr());
        }
        let vao = unsafe { vao.assume_init() };
        log::debug!("created vertex array {} with buffers {:?}", vao, buffers);
        GLVertexArrays {
            vao,
            positions_buffer: buffers[0],
            texcoords_buffer: buffers[1],
            colors_buffer: buffers[2],
            indices_buffer: buffers[3],
        }
    }

    pub fn bind(&self) {
        unsafe { gl::BindVertexArray(self.vao); }
    }

    pub fn unbind(&self) {
        unsafe { gl::BindVertexArray(0); }
    }

    unsafe fn upload_attrib(buffer: GLuint, location: GLuint, width: GLint, data: &[f32]) {
        gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
        gl::BufferData(
            gl::ARRAY_BUFFER,
            (data.len() * size_of::<f32>()) as GLsizeiptr,
            data.as_ptr() as *const c_void,
            gl::STREAM_DRAW
        );
        gl::EnableVertexAttribArray(location);
        gl::VertexAttribPointer(location, width, gl::FLOAT, gl::FALSE, 0, ptr::null::<c_void>());
    }

    /// xyz triples. The VAO has to be bound.
    pub fn set_positions(&self, data: &[f32]) {
        unsafe { Self::upload_attrib(self.positions_buffer, ATTRIB_POSITION, 3, data); }
    }

    /// uv pairs, or a constant (0, 0) when `data` is empty.
    pub fn set_texcoords(&self, data: &[f32]) {
        unsafe {
            if data.is_empty() {
                gl::DisableVertexAttribArray(ATTRIB_TEXCOORD);
                gl::VertexAttrib2f(ATTRIB_TEXCOORD, 0.0, 0.0);
            } else {
                Self::upload_attrib(self.texcoords_buffer, ATTRIB_TEXCOORD, 2, data);
            }
        }
    }

    /// rgba quadruples, or constant opaque white when `data` is empty.
    pub fn set_colors(&self, data: &[f32]) {
        unsafe {
            if data.is_empty() {
                gl::DisableVertexAttribArray(ATTRIB_DIFFUSE);
                gl::VertexAttrib4f(ATTRIB_DIFFUSE, 1.0, 1.0, 1.0, 1.0);
            } else {
                Self::upload_attrib(self.colors_buffer, ATTRIB_DIFFUSE, 4, data);
            }
        }
    }

    pub fn set_indices(&self, data: &[u16]) {
        unsafe {
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, self.indices_buffer);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                (data.len() * size_of::<u16>()) as GLsizeiptr,
                data.as_ptr() as *const c_void,
                gl::STREAM_DRAW
            );
        }
    }
}

impl Drop for GLVertexArrays {
    fn drop(&mut self) {
        let buffers = [self.positions_buffer, self.texcoords_buffer, self.colors_buffer, self.indices_buffer];
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(4, buffers.as_ptr());
        }
    }
}
