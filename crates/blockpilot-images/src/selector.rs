//! The image selection pipeline.
//!
//! Drives one file from "user activated the trigger" to "caller received a
//! data URL": open the selection surface, validate the choice, read and
//! encode it, and invoke the completion callback exactly once on success.
//! Validation and read failures surface as user-facing alerts and never
//! reach the callback.

use std::collections::VecDeque;

use crate::config::ImageConfig;
use crate::encode::EncodedImage;
use crate::error::{ImageError, ImageResult};
use crate::file::SelectedFile;
use crate::reader::ImageReader;

/// Attachment size cap in bytes (2 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 2 * 1024 * 1024;

/// Completion callback, supplied at construction time.
///
/// Receives the original file handle and the fully materialized data URL.
/// Invoked at most once per selection attempt, and only on success.
pub type SelectCallback = Box<dyn FnMut(SelectedFile, EncodedImage) + Send>;

/// Where a selection attempt currently is.
///
/// `Idle → Prompting → Reading → Idle` on the success path; validation
/// failures drop straight back to `Idle`. Nothing is retained across
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// No selection in progress
    Idle,
    /// The file-selection surface is open
    Prompting,
    /// A read-to-data-URL operation is in flight
    Reading,
}

/// The image selection component.
///
/// Hosts wire it up with a reader and a completion callback, then forward
/// user events: [`activate`](Self::activate) when the trigger is pressed,
/// [`file_chosen`](Self::file_chosen) when the surface closes. A `disabled`
/// host flag inhibits activation entirely; a `hovered` flag is carried for
/// the trigger's presentation only.
///
/// At most one file is in flight per attempt: activation is refused until
/// the previous attempt has settled, and selection bookkeeping is cleared
/// unconditionally once a read starts, so re-choosing the identical file
/// immediately afterwards triggers a fresh cycle.
pub struct ImageSelector<R> {
    max_attachment_bytes: u64,
    disabled: bool,
    hovered: bool,
    state: SelectorState,
    alerts: VecDeque<String>,
    reader: R,
    on_image_select: SelectCallback,
}

impl<R: ImageReader> ImageSelector<R> {
    /// Create a selector with the default 2 MiB attachment cap.
    pub fn new(reader: R, on_image_select: SelectCallback) -> Self {
        Self {
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            disabled: false,
            hovered: false,
            state: SelectorState::Idle,
            alerts: VecDeque::new(),
            reader,
            on_image_select,
        }
    }

    /// Create a selector with the cap taken from configuration.
    pub fn with_config(config: &ImageConfig, reader: R, on_image_select: SelectCallback) -> Self {
        let mut selector = Self::new(reader, on_image_select);
        selector.max_attachment_bytes = config.attachment.max_bytes;
        selector
    }

    /// Current position in the selection state machine.
    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// Whether the trigger is disabled by the host.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Set the host-supplied disabled flag.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether the pointer is over the trigger.
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Set the transient hover flag. Presentation only.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Attachment size cap in bytes.
    pub fn max_attachment_bytes(&self) -> u64 {
        self.max_attachment_bytes
    }

    /// React to the trigger being pressed.
    ///
    /// # Returns
    ///
    /// `true` if the file-selection surface should open. A disabled trigger
    /// or an attempt already in flight leaves the selector untouched and
    /// returns `false`.
    pub fn activate(&mut self) -> bool {
        if self.disabled || self.state != SelectorState::Idle {
            return false;
        }
        self.state = SelectorState::Prompting;
        true
    }

    /// React to the selection surface being dismissed without a choice.
    pub fn dismiss_prompt(&mut self) {
        if self.state == SelectorState::Prompting {
            self.state = SelectorState::Idle;
        }
    }

    /// Validate a chosen file, in order: MIME category first, size second.
    pub fn validate(&self, file: &SelectedFile) -> ImageResult<()> {
        if !file.is_image() {
            return Err(ImageError::UnsupportedType(file.mime.clone()));
        }
        if file.size_bytes > self.max_attachment_bytes {
            return Err(ImageError::TooLarge {
                size_bytes: file.size_bytes,
                max_bytes: self.max_attachment_bytes,
            });
        }
        Ok(())
    }

    /// First half of a choice: validate and commit to reading.
    ///
    /// Choices are only accepted while the surface is open; anything else is
    /// ignored. A failed validation raises exactly one alert and settles the
    /// attempt. On success the selector moves to `Reading` and returns the
    /// file so the host can run the read (inline or on a spawned task) and
    /// report back via [`complete_read`](Self::complete_read).
    pub fn begin_read(&mut self, file: Option<SelectedFile>) -> Option<SelectedFile> {
        if self.state != SelectorState::Prompting {
            return None;
        }

        let Some(file) = file else {
            // Surface dismissed without a choice.
            self.state = SelectorState::Idle;
            return None;
        };

        if let Err(err) = self.validate(&file) {
            tracing::warn!(name = %file.name, mime = %file.mime, size = file.size_bytes, "attachment rejected: {err}");
            self.push_alert(err.alert_text());
            self.state = SelectorState::Idle;
            return None;
        }

        self.state = SelectorState::Reading;
        Some(file)
    }

    /// Second half of a choice: settle the in-flight read.
    ///
    /// A non-empty encoded result invokes the completion callback exactly
    /// once with the original file handle. Read failures raise an alert
    /// instead; the callback never observes an error. Either way the
    /// selector returns to `Idle`, ready for the same file to be chosen
    /// again.
    pub fn complete_read(&mut self, file: SelectedFile, result: ImageResult<EncodedImage>) {
        if self.state != SelectorState::Reading {
            return;
        }
        self.state = SelectorState::Idle;

        match result {
            Ok(encoded) => {
                tracing::debug!(name = %file.name, mime = %file.mime, "attachment encoded");
                (self.on_image_select)(file, encoded);
            }
            Err(err) => {
                tracing::warn!(name = %file.name, "attachment read failed: {err}");
                self.push_alert(err.alert_text());
            }
        }
    }

    /// React to the selection surface closing with `file` chosen.
    ///
    /// Convenience for hosts that can await the read in place: runs
    /// validation, the read, and completion as one suspending operation.
    /// An absent file is a no-op.
    pub async fn file_chosen(&mut self, file: Option<SelectedFile>) {
        let Some(file) = self.begin_read(file) else {
            return;
        };
        let result = self.reader.read_as_data_url(&file).await;
        self.complete_read(file, result);
    }

    /// Borrow the reader, e.g. to hand a clone to a spawned read task.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Oldest undismissed alert, if any.
    pub fn pending_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    /// Dismiss the oldest alert.
    pub fn dismiss_alert(&mut self) -> Option<String> {
        self.alerts.pop_front()
    }

    fn push_alert(&mut self, message: &str) {
        self.alerts.push_back(message.to_string());
    }
}
