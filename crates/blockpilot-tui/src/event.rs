//! Event plumbing for the TUI.
//!
//! Terminal input is read on a dedicated thread and funneled into the same
//! channel as the app's own completion events, so the event loop has a
//! single thing to wait on.

use std::time::Duration;

use blockpilot_images::{EncodedImage, ImageResult, SelectedFile};
use tokio::sync::mpsc::UnboundedSender;

/// Everything the event loop reacts to.
#[derive(Debug)]
pub enum AppEvent {
    /// Raw terminal input
    Input(crossterm::event::Event),
    /// Periodic tick for spinner updates
    Tick,
    /// An in-flight attachment read settled
    ReadComplete {
        /// The file the read was for
        file: SelectedFile,
        /// The encoded result or the failure
        result: ImageResult<EncodedImage>,
    },
    /// The selection pipeline completed with an encoded attachment
    ImageAttached {
        /// The chosen file's handle
        file: SelectedFile,
        /// The data URL ready to attach
        encoded: EncodedImage,
    },
    /// Board analysis finished
    AnalysisComplete {
        /// Transcript lines to append
        lines: Vec<String>,
    },
    /// Board analysis failed
    AnalysisFailed(String),
}

/// Spawn the terminal input reader thread.
///
/// Sends `Input` for every terminal event and `Tick` roughly four times a
/// second while idle. Stops when the receiving side goes away.
pub fn spawn_input_thread(tx: UnboundedSender<AppEvent>) {
    std::thread::spawn(move || loop {
        let event = match crossterm::event::poll(Duration::from_millis(250)) {
            Ok(true) => match crossterm::event::read() {
                Ok(event) => AppEvent::Input(event),
                Err(_) => return,
            },
            Ok(false) => AppEvent::Tick,
            Err(_) => return,
        };
        if tx.send(event).is_err() {
            return;
        }
    });
}
