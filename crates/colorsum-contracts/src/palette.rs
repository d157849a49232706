use serde::{Deserialize, Serialize};

/// One dominant color as reported by the palette service.
///
/// Field order is part of the export contract: `hex`, `rgb`, `percent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteColor {
    pub hex: String,
    pub rgb: [u8; 3],
    pub percent: f64,
}

impl PaletteColor {
    pub fn new(hex: impl Into<String>, rgb: [u8; 3], percent: f64) -> Self {
        Self {
            hex: hex.into(),
            rgb,
            percent,
        }
    }

    pub fn rgb_text(&self) -> String {
        self.rgb
            .iter()
            .map(|channel| channel.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Colors ranked by descending usage, in service order. Never reordered.
pub type PaletteResult = Vec<PaletteColor>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::PaletteColor;

    #[test]
    fn palette_color_parses_service_shape() -> anyhow::Result<()> {
        let color: PaletteColor =
            serde_json::from_value(json!({"hex": "#FF0000", "rgb": [255, 0, 0], "percent": 42.5}))?;
        assert_eq!(color, PaletteColor::new("#FF0000", [255, 0, 0], 42.5));
        assert_eq!(color.rgb_text(), "255, 0, 0");
        Ok(())
    }

    #[test]
    fn palette_color_rejects_out_of_range_channel() {
        let parsed = serde_json::from_value::<PaletteColor>(
            json!({"hex": "#FF0000", "rgb": [256, 0, 0], "percent": 1.0}),
        );
        assert!(parsed.is_err());
    }
}
