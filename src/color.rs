pub trait ColorType: ::std::fmt::Debug + Clone + Copy + PartialEq {
    const COLOR_MAX_VALUE: Self;
    const COLOR_MIN_VALUE: Self;
}

impl ColorType for u8 {
    const COLOR_MAX_VALUE: u8 = 255;
    const COLOR_MIN_VALUE: u8 = 0;
}

impl ColorType for f32 {
    const COLOR_MAX_VALUE: f32 = 1.0f32;
    const COLOR_MIN_VALUE: f32 = 0.0f32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color<T: ColorType = f32> {
    pub r: T,
    pub g: T,
    pub b: T,
    pub a: T
}

impl<T: ColorType> Color<T> {
    pub fn from_rgba(r: T, g: T, b: T, a: T) -> Color<T> {
        Color {r, g, b, a}
    }

    pub fn from_rgb(r: T, g: T, b: T) -> Color<T> {
        Color {r, g, b, a: T::COLOR_MAX_VALUE}
    }

    pub fn white() -> Color<T> {
        Color::from_rgb(T::COLOR_MAX_VALUE, T::COLOR_MAX_VALUE, T::COLOR_MAX_VALUE)
    }

    pub fn black() -> Color<T> {
        Color::from_rgb(T::COLOR_MIN_VALUE, T::COLOR_MIN_VALUE, T::COLOR_MIN_VALUE)
    }

    pub fn transparent() -> Color<T> {
        Color::from_rgba(T::COLOR_MIN_VALUE, T::COLOR_MIN_VALUE, T::COLOR_MIN_VALUE, T::COLOR_MIN_VALUE)
    }

    pub fn rgb(self) -> (T, T, T) {
        (self.r, self.g, self.b)
    }

    pub fn rgba(self) -> (T, T, T, T) {
        (self.r, self.g, self.b, self.a)
    }

    pub fn to_array(self) -> [T; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Color<u8> {
    pub fn to_color_f32(self) -> Color<f32> {
        Color {
            r: (self.r as f32) / 255.0,
            g: (self.g as f32) / 255.0,
            b: (self.b as f32) / 255.0,
            a: (self.a as f32) / 255.0,
        }
    }
}

impl Color<f32> {
    /// Same color with its alpha multiplied by `alpha`.
    pub fn with_alpha(self, alpha: f32) -> Color<f32> {
        Color { a: self.a * alpha, ..self }
    }
}

impl From<Color<u8>> for Color<f32> {
    fn from(c: Color<u8>) -> Color<f32> {
        c.to_color_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_colors_normalize() {
        let c: Color<f32> = Color::<u8>::from_rgba(255, 0, 51, 255).into();
        assert_eq!(c, Color::from_rgba(1.0, 0.0, 0.2, 1.0));
        assert_eq!(Color::<f32>::black().to_array(), [0.0, 0.0, 0.0, 1.0]);
    }
}
