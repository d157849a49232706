use anyhow::Context;
use colorsum_contracts::params::{PaletteRequestParams, ParameterModel};
use reqwest::blocking::multipart::{Form as MultipartForm, Part as MultipartPart};

use crate::acquisition::SelectedImage;
use crate::error::ValidationError;

pub const FILE_FIELD: &str = "file";
pub const COLOR_COUNT_FIELD: &str = "k";
pub const MAX_SIDE_FIELD: &str = "max_side";

/// A self-contained snapshot of one request. Later knob edits or a new
/// selection never reach a payload that has already been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettePayload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub params: PaletteRequestParams,
}

impl PalettePayload {
    pub fn text_fields(&self) -> [(&'static str, String); 2] {
        [
            (COLOR_COUNT_FIELD, self.params.color_count.to_string()),
            (MAX_SIDE_FIELD, self.params.max_side.to_string()),
        ]
    }

    pub fn into_form(self) -> anyhow::Result<MultipartForm> {
        let fields = self.text_fields();
        let part = MultipartPart::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.media_type)
            .with_context(|| format!("invalid media type '{}'", self.media_type))?;
        let mut form = MultipartForm::new().part(FILE_FIELD, part);
        for (name, value) in fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// Only checks that an image is present; type and size are acquisition policy.
pub fn build_request(
    image: Option<&SelectedImage>,
    params: &ParameterModel,
) -> Result<PalettePayload, ValidationError> {
    let Some(image) = image else {
        return Err(ValidationError::missing_image());
    };
    Ok(PalettePayload {
        file_name: image.display_name().to_string(),
        media_type: image.media_type().to_string(),
        bytes: image.bytes().to_vec(),
        params: params.effective(),
    })
}

#[cfg(test)]
mod tests {
    use crate::error::ValidationErrorKind;

    use super::*;

    #[test]
    fn build_request_requires_an_image() {
        let err = build_request(None, &ParameterModel::new()).err();
        assert_eq!(
            err.map(|err| err.kind),
            Some(ValidationErrorKind::MissingImage)
        );
    }

    #[test]
    fn build_request_clamps_knobs_into_text_fields() -> anyhow::Result<()> {
        let image = SelectedImage::from_bytes("dog.png", "image/png", b"woof".to_vec());
        let mut params = ParameterModel::new();
        params.set_color_count(40);
        params.set_max_side("tiny");

        let payload = build_request(Some(&image), &params)?;
        assert_eq!(payload.bytes, b"woof");
        assert_eq!(payload.file_name, "dog.png");
        assert_eq!(
            payload.text_fields(),
            [("k", "12".to_string()), ("max_side", "512".to_string())]
        );
        Ok(())
    }

    #[test]
    fn payload_is_unaffected_by_later_edits() -> anyhow::Result<()> {
        let image = SelectedImage::from_bytes("dog.png", "image/png", b"woof".to_vec());
        let mut params = ParameterModel::new();
        params.set_color_count(4);
        let payload = build_request(Some(&image), &params)?;

        params.set_color_count(9);
        assert_eq!(payload.params.color_count, 4);
        Ok(())
    }

    #[test]
    fn into_form_accepts_image_media_types() -> anyhow::Result<()> {
        let image = SelectedImage::from_bytes("dog.svg", "image/svg+xml", b"<svg/>".to_vec());
        let payload = build_request(Some(&image), &ParameterModel::new())?;
        assert!(!payload.into_form()?.boundary().is_empty());
        Ok(())
    }
}
