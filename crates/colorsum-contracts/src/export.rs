use std::path::{Path, PathBuf};

use crate::palette::PaletteColor;

pub const ARTIFACT_STEM: &str = "palette";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Css,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Json, ExportFormat::Css];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "css" => Some(Self::Css),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Css => "css",
        }
    }

    pub fn file_name(self) -> String {
        format!("{ARTIFACT_STEM}.{}", self.extension())
    }

    pub fn encode(self, palette: &[PaletteColor]) -> anyhow::Result<String> {
        match self {
            Self::Json => to_structured_artifact(palette),
            Self::Css => Ok(to_stylesheet_artifact(palette)),
        }
    }
}

/// Pretty-printed JSON array (2-space indent) of the palette in rank order.
pub fn to_structured_artifact(palette: &[PaletteColor]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(palette)?)
}

/// A `:root` block with one `--color-<rank>` custom property per color.
pub fn to_stylesheet_artifact(palette: &[PaletteColor]) -> String {
    let mut css = String::from(":root {\n");
    for (idx, color) in palette.iter().enumerate() {
        css.push_str(&format!("  --color-{}: {};\n", idx + 1, color.hex));
    }
    css.push_str("}\n");
    css
}

/// Encodes `palette` and writes it to `path`, creating parent directories.
pub fn write_artifact(
    path: &Path,
    format: ExportFormat,
    palette: &[PaletteColor],
) -> anyhow::Result<PathBuf> {
    let body = format.encode(palette)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, body)?;
    Ok(path.to_path_buf())
}
