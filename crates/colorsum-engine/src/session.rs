use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::bail;
use colorsum_contracts::events::{EventPayload, EventSink};
use colorsum_contracts::export::{write_artifact, ExportFormat};
use colorsum_contracts::palette::PaletteResult;
use colorsum_contracts::params::ParameterModel;
use serde_json::{json, Value};

use crate::acquisition::{AcquisitionPolicy, DragResponse, DropZone, SelectedImage};
use crate::client::PaletteService;
use crate::error::{SummarizeError, SummarizeErrorKind, ValidationError, ValidationErrorKind};
use crate::preview::{PreviewHandle, PreviewResourceManager};
use crate::request::{build_request, PalettePayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: SummarizeErrorKind,
    pub message: String,
}

impl From<SummarizeError> for ErrorInfo {
    fn from(err: SummarizeError) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Loading,
    Success(PaletteResult),
    Failure(ErrorInfo),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A user-facing message the presentation layer must show and acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Validation(ValidationError),
    Exchange(ErrorInfo),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Self::Validation(err) => err.message.clone(),
            Self::Exchange(info) => format!("Palette request failed: {}", info.message),
        }
    }
}

/// The single stateful orchestrator the presentation layer observes.
///
/// Transitions: `Idle|Success|Failure -> Loading` on submit with an image,
/// `Loading -> Success|Failure` on completion. Submits while loading are
/// refused. The last successful palette stays exportable after a failure.
#[derive(Debug)]
pub struct Session {
    params: ParameterModel,
    policy: AcquisitionPolicy,
    image: Option<SelectedImage>,
    preview: PreviewResourceManager,
    drop_zone: DropZone,
    state: SessionState,
    exportable: Option<PaletteResult>,
    notices: VecDeque<Notice>,
    events: EventSink,
    finished: bool,
}

impl Session {
    pub fn new(
        params: ParameterModel,
        policy: AcquisitionPolicy,
        preview: PreviewResourceManager,
        events: EventSink,
    ) -> Self {
        let session = Self {
            params,
            policy,
            image: None,
            preview,
            drop_zone: DropZone::new(),
            state: SessionState::Idle,
            exportable: None,
            notices: VecDeque::new(),
            events,
            finished: false,
        };
        session.record(
            "session_started",
            json!({
                "max_upload_bytes": policy.max_bytes,
                "k": session.params.color_count_input(),
                "max_side": session.params.max_side_input(),
            }),
        );
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn params(&self) -> &ParameterModel {
        &self.params
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.current()
    }

    pub fn preview_live_count(&self) -> u64 {
        self.preview.live_count()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drop_zone.is_drag_active()
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_loading()
    }

    pub fn can_export(&self) -> bool {
        self.exportable.is_some()
    }

    /// The palette exports read from: the most recent successful result.
    pub fn exportable_palette(&self) -> Option<&PaletteResult> {
        self.exportable.as_ref()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn set_color_count(&mut self, raw: impl ToString) {
        self.params.set_color_count(raw);
        self.record_params();
    }

    pub fn set_max_side(&mut self, raw: impl ToString) {
        self.params.set_max_side(raw);
        self.record_params();
    }

    /// Runs the acquisition gates, then swaps in the new image and its preview.
    /// On rejection the previous selection is left untouched.
    pub fn select_image(&mut self, path: &Path) -> Result<&SelectedImage, ValidationError> {
        let image = match self.policy.acquire(path) {
            Ok(image) => image,
            Err(err) => {
                self.record(
                    "image_rejected",
                    json!({
                        "path": path.to_string_lossy(),
                        "reason": err.message,
                    }),
                );
                return Err(self.notify_validation(err));
            }
        };

        if let Err(err) = self.preview.adopt(&image) {
            let restored = self.restore_previous_preview();
            let tail = if restored {
                "the previous image is still selected"
            } else {
                "the previous selection was cleared"
            };
            let err = ValidationError::new(
                ValidationErrorKind::Unreadable,
                format!("Could not prepare a preview ({err:#}); {tail}."),
            );
            return Err(self.notify_validation(err));
        }

        self.record(
            "image_selected",
            json!({
                "name": image.display_name(),
                "media_type": image.media_type(),
                "bytes": image.size(),
            }),
        );
        Ok(&*self.image.insert(image))
    }

    /// Re-derives the preview for the kept selection, or drops the selection
    /// when that fails too. Either way image and preview agree afterwards.
    fn restore_previous_preview(&mut self) -> bool {
        let Some(previous) = self.image.take() else {
            return false;
        };
        if self.preview.adopt(&previous).is_ok() {
            self.image = Some(previous);
            return true;
        }
        false
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.preview.release();
    }

    pub fn drag_enter(&mut self) -> DragResponse {
        self.drop_zone.drag_enter()
    }

    pub fn drag_over(&mut self) -> DragResponse {
        self.drop_zone.drag_over()
    }

    pub fn drag_leave(&mut self) -> DragResponse {
        self.drop_zone.drag_leave()
    }

    /// Selects the first dropped file through the same gates as `select_image`.
    pub fn drop_files(&mut self, files: &[PathBuf]) -> DragResponse {
        let (response, first) = self.drop_zone.drop(files);
        if let Some(path) = first {
            let _ = self.select_image(path);
        }
        response
    }

    /// Builds the payload from the current selection and knobs and enters `Loading`.
    ///
    /// Without an image, or while another exchange is in flight, nothing
    /// changes except for a validation notice.
    pub fn begin_submit(&mut self) -> Result<PalettePayload, ValidationError> {
        if self.state.is_loading() {
            return Err(self.notify_validation(ValidationError::in_flight()));
        }
        let payload = match build_request(self.image.as_ref(), &self.params) {
            Ok(payload) => payload,
            Err(err) => return Err(self.notify_validation(err)),
        };
        self.transition(SessionState::Loading);
        Ok(payload)
    }

    /// Applies the outcome of the in-flight exchange. Returns false when no
    /// exchange was in flight; the outcome is then dropped.
    pub fn complete(&mut self, outcome: Result<PaletteResult, SummarizeError>) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        match outcome {
            Ok(palette) => {
                self.exportable = Some(palette.clone());
                self.transition(SessionState::Success(palette));
            }
            Err(err) => {
                let info = ErrorInfo::from(err);
                self.notices.push_back(Notice::Exchange(info.clone()));
                self.transition(SessionState::Failure(info));
            }
        }
        true
    }

    /// `begin_submit`, one call to `service`, then `complete`, all inline.
    pub fn submit_with(&mut self, service: &dyn PaletteService) -> Result<&SessionState, ValidationError> {
        let payload = self.begin_submit()?;
        let outcome = service.summarize(payload);
        self.complete(outcome);
        Ok(&self.state)
    }

    /// Writes the exportable palette to `path`. Does not touch the session state.
    pub fn export(&self, format: ExportFormat, path: &Path) -> anyhow::Result<PathBuf> {
        let Some(palette) = self.exportable.as_ref() else {
            bail!("No palette to export yet; submit an image first.");
        };
        let written = write_artifact(path, format, palette)?;
        self.record(
            "export_written",
            json!({
                "format": format.extension(),
                "path": written.to_string_lossy(),
                "colors": palette.len(),
            }),
        );
        Ok(written)
    }

    /// Releases the preview and records `session_finished` once.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let released = self.preview.release();
        self.record(
            "session_finished",
            json!({
                "state": self.state.name(),
                "preview_released": released,
            }),
        );
    }

    fn transition(&mut self, next: SessionState) {
        let mut payload = json!({ "state": next.name() });
        match &next {
            SessionState::Success(palette) => {
                payload["colors"] = json!(palette.len());
            }
            SessionState::Failure(info) => {
                payload["error_kind"] = json!(info.kind.as_str());
                payload["message"] = json!(info.message);
            }
            SessionState::Idle | SessionState::Loading => {}
        }
        self.state = next;
        self.record("state_changed", payload);
    }

    fn notify_validation(&mut self, err: ValidationError) -> ValidationError {
        self.notices.push_back(Notice::Validation(err.clone()));
        err
    }

    fn record_params(&self) {
        let effective = self.params.effective();
        self.record(
            "params_changed",
            json!({
                "k": self.params.color_count_input(),
                "max_side": self.params.max_side_input(),
                "effective_k": effective.color_count,
                "effective_max_side": effective.max_side,
            }),
        );
    }

    fn record(&self, event_type: &str, payload: Value) {
        let payload: EventPayload = match payload {
            Value::Object(map) => map,
            _ => EventPayload::new(),
        };
        if let Err(err) = self.events.emit(event_type, payload) {
            eprintln!("colorsum: event log write failed: {err:#}");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.preview.release();
    }
}
