//! Client-side orchestration for the palette-extraction service: image
//! acquisition, preview lifetime, request building, the HTTP exchange and
//! the session state machine.

pub mod acquisition;
pub mod client;
pub mod error;
pub mod preview;
pub mod request;
pub mod session;

use std::env;

pub use acquisition::{AcquisitionPolicy, DragResponse, DropZone, SelectedImage};
pub use client::{ClientConfig, PaletteService, SummarizationClient};
pub use error::{SummarizeError, SummarizeErrorKind, ValidationError, ValidationErrorKind};
pub use preview::{PreviewHandle, PreviewResourceManager};
pub use request::{build_request, PalettePayload};
pub use session::{ErrorInfo, Notice, Session, SessionState};

pub fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
