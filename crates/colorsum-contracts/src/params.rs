pub const COLOR_COUNT_MIN: u32 = 3;
pub const COLOR_COUNT_MAX: u32 = 12;
pub const COLOR_COUNT_DEFAULT: u32 = 6;

pub const MAX_SIDE_MIN: u32 = 128;
pub const MAX_SIDE_MAX: u32 = 2048;
pub const MAX_SIDE_DEFAULT: u32 = 512;
/// Suggested increment for the max-side knob. Not enforced on transport.
pub const MAX_SIDE_STEP: u32 = 64;

/// Transport-ready knob values, always inside their ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteRequestParams {
    pub color_count: u32,
    pub max_side: u32,
}

impl Default for PaletteRequestParams {
    fn default() -> Self {
        Self {
            color_count: COLOR_COUNT_DEFAULT,
            max_side: MAX_SIDE_DEFAULT,
        }
    }
}

/// The two user-tunable knobs, kept exactly as typed.
///
/// Inputs are never rejected. `effective()` clamps at the point of use so
/// the echo shown to the user and the values put on the wire can differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterModel {
    color_count: String,
    max_side: String,
}

impl Default for ParameterModel {
    fn default() -> Self {
        Self {
            color_count: COLOR_COUNT_DEFAULT.to_string(),
            max_side: MAX_SIDE_DEFAULT.to_string(),
        }
    }
}

impl ParameterModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_color_count(&mut self, raw: impl ToString) {
        self.color_count = raw.to_string();
    }

    pub fn set_max_side(&mut self, raw: impl ToString) {
        self.max_side = raw.to_string();
    }

    pub fn color_count_input(&self) -> &str {
        &self.color_count
    }

    pub fn max_side_input(&self) -> &str {
        &self.max_side
    }

    pub fn effective(&self) -> PaletteRequestParams {
        PaletteRequestParams {
            color_count: clamp_knob(
                &self.color_count,
                COLOR_COUNT_MIN,
                COLOR_COUNT_MAX,
                COLOR_COUNT_DEFAULT,
            ),
            max_side: clamp_knob(&self.max_side, MAX_SIDE_MIN, MAX_SIDE_MAX, MAX_SIDE_DEFAULT),
        }
    }
}

/// Clamps a raw knob value into `[min, max]`.
///
/// Integers clamp directly, finite decimals round to the nearest integer
/// first, anything else (empty, NaN, infinities, words) yields `default`.
pub fn clamp_knob(raw: &str, min: u32, max: u32, default: u32) -> u32 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value.clamp(i64::from(min), i64::from(max)) as u32;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.round().clamp(f64::from(min), f64::from(max)) as u32,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_client() {
        let model = ParameterModel::new();
        assert_eq!(model.color_count_input(), "6");
        assert_eq!(model.max_side_input(), "512");
        assert_eq!(model.effective(), PaletteRequestParams::default());
    }

    #[test]
    fn color_count_clamps_integers_into_range() {
        let mut model = ParameterModel::new();
        for (raw, expected) in [(-40, 3), (0, 3), (3, 3), (7, 7), (12, 12), (13, 12), (9000, 12)] {
            model.set_color_count(raw);
            assert_eq!(model.effective().color_count, expected, "input {raw}");
        }
    }

    #[test]
    fn max_side_clamps_integers_into_range() {
        let mut model = ParameterModel::new();
        for (raw, expected) in [(0, 128), (127, 128), (1000, 1000), (2048, 2048), (4096, 2048)] {
            model.set_max_side(raw);
            assert_eq!(model.effective().max_side, expected, "input {raw}");
        }
    }

    #[test]
    fn non_numeric_input_falls_back_to_defaults() {
        let mut model = ParameterModel::new();
        for raw in ["", "   ", "abc", "NaN", "inf", "-infinity", "7px"] {
            model.set_color_count(raw);
            model.set_max_side(raw);
            let effective = model.effective();
            assert_eq!(effective.color_count, COLOR_COUNT_DEFAULT, "input {raw:?}");
            assert_eq!(effective.max_side, MAX_SIDE_DEFAULT, "input {raw:?}");
        }
    }

    #[test]
    fn raw_input_is_echoed_verbatim() {
        let mut model = ParameterModel::new();
        model.set_color_count("  99 ");
        model.set_max_side("banana");
        assert_eq!(model.color_count_input(), "  99 ");
        assert_eq!(model.max_side_input(), "banana");
        assert_eq!(model.effective().color_count, 12);
    }

    #[test]
    fn decimals_round_before_clamping() {
        assert_eq!(clamp_knob("7.6", 3, 12, 6), 8);
        assert_eq!(clamp_knob("2.4", 3, 12, 6), 3);
        assert_eq!(clamp_knob("1e9", 128, 2048, 512), 2048);
        assert_eq!(clamp_knob("99999999999999999999999", 3, 12, 6), 12);
    }
}
