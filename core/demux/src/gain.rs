/// Digital gain applied to the converted samples.
///
/// Always finite and within [`Gain::MIN`]..=[`Gain::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Gain(f64);

impl Gain {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 10.0;
    /// Pure format conversion.
    pub const UNITY: Self = Self(1.0);

    /// Clamps `value` into range. Returns `None` for NaN or infinities.
    pub fn new(value: f64) -> Option<Self> {
        value
            .is_finite()
            .then(|| Self(value.clamp(Self::MIN, Self::MAX)))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::UNITY
    }
}
