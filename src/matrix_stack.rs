use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3};

/// A LIFO of modelview matrices. Never empty: the bottom entry starts as identity.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    stack: Vec<Matrix4<f32>>,
}

impl Default for MatrixStack {
    fn default() -> MatrixStack {
        MatrixStack::new()
    }
}

impl MatrixStack {
    pub fn new() -> MatrixStack {
        MatrixStack { stack: vec![Matrix4::identity()] }
    }

    pub fn top(&self) -> &Matrix4<f32> {
        // never empty, see `pop`
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Matrix4<f32> {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Duplicates the top.
    pub fn push(&mut self) {
        let top = *self.top();
        self.stack.push(top);
    }

    /// Panics when only one entry is left.
    pub fn pop(&mut self) {
        assert!(self.stack.len() > 1, "modelview stack underflow: pop without matching push");
        self.stack.pop();
    }

    pub fn set(&mut self, mat: Matrix4<f32>) {
        *self.top_mut() = mat;
    }

    pub fn mult(&mut self, mat: &Matrix4<f32>) {
        let top = self.top_mut();
        *top = *top * mat;
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.mult(&Matrix4::from_translation(Vector3::new(x, y, z)));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.mult(&Matrix4::from_nonuniform_scale(x, y, z));
    }

    /// Rotation of `degrees` around the (x, y, z) axis.
    pub fn rotate(&mut self, degrees: f32, x: f32, y: f32, z: f32) {
        let axis = Vector3::new(x, y, z);
        if axis == Vector3::new(0.0, 0.0, 0.0) {
            return;
        }
        self.mult(&Matrix4::from_axis_angle(axis.normalize(), Deg(degrees)));
    }

    /// Back to a single identity entry.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Matrix4::identity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector4, Transform, Point3};

    #[test]
    fn push_pop_restores() {
        let mut stack = MatrixStack::new();
        stack.translate(10.0, 0.0, 0.0);
        stack.push();
        stack.scale(2.0, 2.0, 1.0);
        let p = stack.top().transform_point(Point3::new(1.0, 1.0, 0.0));
        assert_eq!(p, Point3::new(12.0, 2.0, 0.0));
        stack.pop();
        let p = stack.top().transform_point(Point3::new(1.0, 1.0, 0.0));
        assert_eq!(p, Point3::new(11.0, 1.0, 0.0));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn rotation_is_in_degrees() {
        let mut stack = MatrixStack::new();
        stack.rotate(90.0, 0.0, 0.0, 1.0);
        let v = stack.top() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((v.x).abs() < 1e-6 && (v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn popping_the_last_entry_panics() {
        let mut stack = MatrixStack::new();
        stack.push();
        stack.pop();
        stack.pop();
    }

    #[test]
    fn reset_leaves_identity() {
        let mut stack = MatrixStack::new();
        stack.push();
        stack.translate(1.0, 2.0, 3.0);
        stack.push();
        stack.reset();
        assert_eq!(stack.depth(), 1);
        assert_eq!(*stack.top(), Matrix4::identity());
    }
}
