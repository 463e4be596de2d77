//! Effect trait for per-bus DSP processors.

/// Metadata describing one effect parameter.
pub struct ParamInfo {
    pub id: u16,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamInfo {
    /// Clamp `value` into this parameter's range.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Static metadata about an effect.
pub struct EffectInfo {
    pub name: &'static str,
    pub short_name: &'static str,
    pub params: &'static [ParamInfo],
}

impl EffectInfo {
    /// Look up a parameter by id.
    pub fn param(&self, id: u16) -> Option<&'static ParamInfo> {
        self.params.iter().find(|p| p.id == id)
    }
}

/// Core trait for bus effects.
///
/// `process` works in place on a planar buffer holding `channels` planes of
/// `frames` samples. Implementations size their internal state lazily from
/// the arguments, so the same effect follows a bus whose format changes.
pub trait Effect: Send {
    fn info(&self) -> &EffectInfo;
    fn process(&mut self, frames: u32, channels: u16, sample_rate: u32, samples: &mut [f32]);
    /// Drop all signal history (delay lines, filter state, FIFOs).
    fn reset(&mut self);
    /// Set a parameter, clamped to its range. Returns `false` for an unknown id.
    fn set_param(&mut self, param: u16, value: f32) -> bool;
    /// Current value of a parameter.
    fn param(&self, param: u16) -> Option<f32>;
}
