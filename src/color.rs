use rand::Rng;

/// An rgb color with channels in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Color as set from the hue (0-360), saturation (0-100) and value (0-100) sliders.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// Build from hsv components, all in [0, 1].
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        if s == 0.0 {
            return Color::new(v, v, v);
        }

        let h = h.rem_euclid(1.0) * 6.0;
        let i = h.floor();
        let f = h - i;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        match i as u8 % 6 {
            0 => Color::new(v, t, p),
            1 => Color::new(q, v, p),
            2 => Color::new(p, v, t),
            3 => Color::new(p, q, v),
            4 => Color::new(t, p, v),
            _ => Color::new(v, p, q),
        }
    }

    /// Hue, saturation and value, all in [0, 1].
    pub fn to_hsv(self) -> (f64, f64, f64) {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        if max == min {
            return (0.0, 0.0, max);
        }

        let range = max - min;
        let s = range / max;
        let rc = (max - self.r) / range;
        let gc = (max - self.g) / range;
        let bc = (max - self.b) / range;

        let h = if self.r == max {
            bc - gc
        } else if self.g == max {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };

        ((h / 6.0).rem_euclid(1.0), s, max)
    }

    pub fn with_alpha(self, a: f64) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: a.max(0.0).min(1.0),
        }
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f64| (c.max(0.0).min(1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

impl Hsv {
    pub fn new(hue: f64, saturation: f64, value: f64) -> Self {
        Hsv {
            hue,
            saturation,
            value,
        }
    }

    pub fn to_color(self) -> Color {
        Color::from_hsv(
            self.hue / 360.0,
            self.saturation / 100.0,
            self.value / 100.0,
        )
    }
}

/// A color sharing hue and saturation with `base` whose value is drawn uniformly from
/// `1 - range .. 1 + range`, clamped to [0, 1]. `brightness_range` is in percent.
pub fn jittered_color(base: Color, brightness_range: f64, rng: &mut impl Rng) -> Color {
    let range = brightness_range / 100.0;
    let (h, s, _) = base.to_hsv();

    let value = (1.0 - range + rng.gen::<f64>() * range * 2.0)
        .max(0.0)
        .min(1.0);

    Color::from_hsv(h, s, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn assert_close(a: Color, b: Color) {
        assert!(
            (a.r - b.r).abs() < 1e-9 && (a.g - b.g).abs() < 1e-9 && (a.b - b.b).abs() < 1e-9,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn primary_hues() {
        assert_close(Hsv::new(0.0, 100.0, 100.0).to_color(), Color::new(1.0, 0.0, 0.0));
        assert_close(Hsv::new(120.0, 100.0, 100.0).to_color(), Color::new(0.0, 1.0, 0.0));
        assert_close(Hsv::new(240.0, 100.0, 50.0).to_color(), Color::new(0.0, 0.0, 0.5));
        assert_close(Hsv::new(360.0, 100.0, 100.0).to_color(), Color::new(1.0, 0.0, 0.0));
        assert_close(Hsv::new(77.0, 0.0, 30.0).to_color(), Color::new(0.3, 0.3, 0.3));
    }

    #[test]
    fn hsv_round_trips() {
        let c = Color::from_hsv(0.7, 0.4, 0.9);
        let (h, s, v) = c.to_hsv();
        assert!((h - 0.7).abs() < 1e-9);
        assert!((s - 0.4).abs() < 1e-9);
        assert!((v - 0.9).abs() < 1e-9);
    }

    #[test]
    fn jitter_keeps_hue_and_stays_in_range() {
        let mut rng = Pcg64::seed_from_u64(7);
        let base = Hsv::new(200.0, 80.0, 50.0).to_color();
        let (base_h, base_s, _) = base.to_hsv();

        for _ in 0..100 {
            let c = jittered_color(base, 50.0, &mut rng);
            let (h, s, v) = c.to_hsv();
            assert!((h - base_h).abs() < 1e-9);
            assert!((s - base_s).abs() < 1e-9);
            assert!(v >= 0.5 - 1e-9 && v <= 1.0);
        }
    }

    #[test]
    fn zero_range_gives_full_value() {
        let mut rng = Pcg64::seed_from_u64(1);
        let c = jittered_color(Color::new(0.5, 0.0, 0.0), 0.0, &mut rng);
        assert_close(c, Color::new(1.0, 0.0, 0.0));
    }
}
