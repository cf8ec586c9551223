use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use gl;
use gl::types::*;
use log::error;

use crate::driver::GlApi;
use crate::error::DriverError;

/// More than this many queued errors after a single call means the queue isn't draining (a lost
/// context keeps reporting), so stop reading.
const MAX_DRAINED_ERRORS: usize = 32;

/// One binding point of the driver's global state. At most one object per target is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    ArrayBuffer,
    ElementArrayBuffer,
    VertexArray,
    Program,
    Framebuffer,
    Renderbuffer,
}

impl Target {
    fn index(self) -> usize {
        self as usize
    }
}

/// What the driver currently has bound, as far as this context knows. Only
/// [`GlContext::bind`] and [`GlContext::unbind`] change it.
///
/// The element array binding belongs to the bound vertex array, so the table keeps one per vertex
/// array (0 standing for none) and switching vertex arrays switches the element array entry too.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BindingTable {
    bound: [Option<GLuint>; 6],
    elements: HashMap<GLuint, GLuint>,
}

impl BindingTable {
    pub fn get(&self, target: Target) -> Option<GLuint> {
        self.bound[target.index()]
    }

    fn set(&mut self, target: Target, id: Option<GLuint>) {
        self.bound[target.index()] = id;

        match target {
            Target::ElementArrayBuffer => {
                let vertex_array = self.get(Target::VertexArray).unwrap_or(0);
                match id {
                    Some(id) => self.elements.insert(vertex_array, id),
                    None => self.elements.remove(&vertex_array),
                };
            }
            Target::VertexArray => {
                let elements = self.elements.get(&id.unwrap_or(0)).copied();
                self.bound[Target::ElementArrayBuffer.index()] = elements;
            }
            _ => {}
        }
    }

    fn forget(&mut self, id: GLuint, target: Target) {
        match target {
            Target::VertexArray => {
                self.elements.remove(&id);
            }
            Target::ElementArrayBuffer => self.elements.retain(|_, &mut e| e != id),
            _ => {}
        }

        if self.get(target) == Some(id) {
            self.set(target, None);
        }
    }
}

struct Inner {
    api: Box<dyn GlApi>,
    bindings: RefCell<BindingTable>,
}

/// The one rendering context. Cloning is cheap and every clone refers to the same driver and the
/// same binding table; each GPU resource keeps a clone so it can release itself on drop.
#[derive(Clone)]
pub struct GlContext {
    inner: Rc<Inner>,
}

impl fmt::Debug for GlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlContext")
            .field("bindings", &*self.inner.bindings.borrow())
            .finish()
    }
}

impl GlContext {
    pub fn new<A: GlApi + 'static>(api: A) -> Self {
        Self {
            inner: Rc::new(Inner {
                api: Box::new(api),
                bindings: RefCell::new(BindingTable::default()),
            }),
        }
    }

    /// The raw function table. Prefer going through [`gl_call!`](crate::gl_call) so errors are
    /// checked.
    pub fn api(&self) -> &dyn GlApi {
        self.inner.api.as_ref()
    }

    /// The object currently bound to `target`, if any.
    pub fn bound(&self, target: Target) -> Option<GLuint> {
        self.inner.bindings.borrow().get(target)
    }

    pub fn bindings(&self) -> BindingTable {
        self.inner.bindings.borrow().clone()
    }

    /// Makes `id` the active object for `target`.
    pub fn bind(&self, target: Target, id: GLuint) {
        self.issue_bind(target, id);
        self.inner.bindings.borrow_mut().set(target, Some(id));
    }

    /// Clears `target` back to no object, whatever was bound there.
    pub fn unbind(&self, target: Target) {
        self.issue_bind(target, 0);
        self.inner.bindings.borrow_mut().set(target, None);
    }

    /// Forgets `id` wherever it's recorded as bound. Called when an object is deleted, since the
    /// driver drops deleted objects from its bindings by itself.
    pub(crate) fn forget(&self, id: GLuint, targets: &[Target]) {
        let mut bindings = self.inner.bindings.borrow_mut();
        for &target in targets {
            bindings.forget(id, target);
        }
    }

    fn issue_bind(&self, target: Target, id: GLuint) {
        match target {
            Target::ArrayBuffer => gl_call!(self, bind_buffer(gl::ARRAY_BUFFER, id)),
            Target::ElementArrayBuffer => gl_call!(self, bind_buffer(gl::ELEMENT_ARRAY_BUFFER, id)),
            Target::VertexArray => gl_call!(self, bind_vertex_array(id)),
            Target::Program => gl_call!(self, use_program(id)),
            Target::Framebuffer => gl_call!(self, bind_framebuffer(gl::FRAMEBUFFER, id)),
            Target::Renderbuffer => gl_call!(self, bind_renderbuffer(gl::RENDERBUFFER, id)),
        }
    }

    /// Takes every pending error off the driver's queue.
    pub fn drain_errors(&self) -> Vec<DriverError> {
        let mut errors = Vec::new();
        while errors.len() < MAX_DRAINED_ERRORS {
            match DriverError::from_code(self.api().get_error()) {
                Some(e) => errors.push(e),
                None => break,
            }
        }
        errors
    }

    /// Reports every queued driver error against `call`. A driver error means the program put the
    /// driver in a state it didn't expect, so debug builds stop right here.
    pub fn check_errors(&self, call: &str, file: &str, line: u32) {
        let errors = self.drain_errors();
        if errors.is_empty() {
            return;
        }

        for e in &errors {
            error!("[OpenGL Error] {} in {} at {}:{}", e, call, file, line);
        }

        if cfg!(debug_assertions) && !std::thread::panicking() {
            panic!(
                "OpenGL call `{}` at {}:{} raised {} error(s), first: {}",
                call,
                file,
                line,
                errors.len(),
                errors[0]
            );
        }
    }

    /// The driver's `GL_VERSION` string.
    pub fn driver_version(&self) -> String {
        gl_call!(self, get_string(gl::VERSION))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::{Call, MockDriver};

    #[test]
    fn unbind_after_rebinding_leaves_nothing_bound() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());

        gl.bind(Target::ArrayBuffer, 3);
        gl.bind(Target::ArrayBuffer, 7);
        gl.unbind(Target::ArrayBuffer);

        assert_eq!(gl.bound(Target::ArrayBuffer), None);
        assert_eq!(
            driver.calls().last(),
            Some(&Call::BindBuffer { target: gl::ARRAY_BUFFER, id: 0 })
        );
    }

    #[test]
    fn every_target_unbinds_to_none() {
        let gl = GlContext::new(MockDriver::new());

        let targets = [
            Target::ArrayBuffer,
            Target::ElementArrayBuffer,
            Target::VertexArray,
            Target::Program,
            Target::Framebuffer,
            Target::Renderbuffer,
        ];

        for &target in targets.iter() {
            gl.bind(target, 1);
            gl.bind(target, 2);
            assert_eq!(gl.bound(target), Some(2));
            gl.unbind(target);
            assert_eq!(gl.bound(target), None);
        }
    }

    #[test]
    fn targets_are_independent() {
        let gl = GlContext::new(MockDriver::new());

        gl.bind(Target::ArrayBuffer, 1);
        gl.bind(Target::ElementArrayBuffer, 2);
        gl.unbind(Target::ArrayBuffer);

        assert_eq!(gl.bound(Target::ArrayBuffer), None);
        assert_eq!(gl.bound(Target::ElementArrayBuffer), Some(2));
    }

    #[test]
    fn forget_only_clears_matching_ids() {
        let gl = GlContext::new(MockDriver::new());
        gl.bind(Target::ArrayBuffer, 4);
        gl.bind(Target::ElementArrayBuffer, 5);

        gl.forget(4, &[Target::ArrayBuffer, Target::ElementArrayBuffer]);

        assert_eq!(gl.bound(Target::ArrayBuffer), None);
        assert_eq!(gl.bound(Target::ElementArrayBuffer), Some(5));
    }

    #[test]
    fn element_array_follows_the_vertex_array() {
        let gl = GlContext::new(MockDriver::new());

        gl.bind(Target::VertexArray, 1);
        gl.bind(Target::ElementArrayBuffer, 10);
        gl.bind(Target::VertexArray, 2);
        assert_eq!(gl.bound(Target::ElementArrayBuffer), None);

        gl.bind(Target::ElementArrayBuffer, 20);
        gl.bind(Target::VertexArray, 1);
        assert_eq!(gl.bound(Target::ElementArrayBuffer), Some(10));

        gl.unbind(Target::VertexArray);
        assert_eq!(gl.bound(Target::ElementArrayBuffer), None);

        gl.bind(Target::VertexArray, 2);
        assert_eq!(gl.bound(Target::ElementArrayBuffer), Some(20));
    }

    #[test]
    fn deleted_objects_leave_no_element_array_behind() {
        let gl = GlContext::new(MockDriver::new());
        gl.bind(Target::VertexArray, 1);
        gl.bind(Target::ElementArrayBuffer, 10);
        gl.unbind(Target::VertexArray);

        gl.forget(10, &[Target::ElementArrayBuffer]);
        gl.bind(Target::VertexArray, 1);

        assert_eq!(gl.bound(Target::ElementArrayBuffer), None);
    }

    #[test]
    fn drain_collects_every_queued_error() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());
        driver.push_error(gl::INVALID_ENUM);
        driver.push_error(gl::INVALID_VALUE);

        assert_eq!(
            gl.drain_errors(),
            vec![DriverError::InvalidEnum, DriverError::InvalidValue]
        );
        assert!(gl.drain_errors().is_empty());
    }

    #[test]
    #[should_panic(expected = "bind_buffer")]
    fn driver_error_after_a_call_aborts() {
        let driver = MockDriver::new();
        let gl = GlContext::new(driver.clone());
        driver.push_error(gl::INVALID_OPERATION);

        gl.bind(Target::ArrayBuffer, 1);
    }

    #[test]
    fn version_comes_from_the_driver() {
        let gl = GlContext::new(MockDriver::new());
        assert!(gl.driver_version().starts_with("3.3"));
    }
}
