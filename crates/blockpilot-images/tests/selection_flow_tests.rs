//! End-to-end tests for the selection pipeline against real files.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use blockpilot_images::{
    EncodedImage, FsImageReader, ImageSelector, SelectedFile, SelectorState,
};
use tempfile::TempDir;

type Received = Arc<Mutex<Vec<(SelectedFile, EncodedImage)>>>;

fn selector() -> (ImageSelector<FsImageReader>, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let selector = ImageSelector::new(
        FsImageReader,
        Box::new(move |file, encoded| sink.lock().unwrap().push((file, encoded))),
    );
    (selector, received)
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(bytes).unwrap();
    path
}

fn png_bytes(total: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
    bytes.resize(total, 0);
    bytes
}

#[tokio::test]
async fn png_under_cap_completes_once_with_data_url() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "board.png", &png_bytes(500 * 1024));
    let (mut selector, received) = selector();

    assert!(selector.activate());
    let file = SelectedFile::from_path(&path).unwrap();
    selector.file_chosen(Some(file.clone())).await;

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    // Same handle in, and a complete data URL out.
    assert_eq!(received[0].0, file);
    assert!(received[0].1.as_str().starts_with("data:image/png;base64,"));
    assert!(received[0].1.as_str().contains(";base64,"));
    assert!(selector.pending_alert().is_none());
}

#[tokio::test]
async fn text_file_alerts_and_never_completes() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "notes.txt", &vec![b'a'; 10 * 1024]);
    let (mut selector, received) = selector();

    assert!(selector.activate());
    let file = SelectedFile::from_path(&path).unwrap();
    assert_eq!(file.mime, "text/plain");
    selector.file_chosen(Some(file)).await;

    assert!(received.lock().unwrap().is_empty());
    assert_eq!(selector.pending_alert(), Some("只支持图片文件"));
    // Exactly one alert for the attempt.
    selector.dismiss_alert();
    assert!(selector.pending_alert().is_none());
}

#[tokio::test]
async fn oversized_jpeg_alerts_and_never_completes() {
    let dir = TempDir::new().unwrap();
    let mut bytes = vec![0xff, 0xd8, 0xff, 0xe0];
    bytes.resize(3 * 1024 * 1024, 0);
    let path = write_file(&dir, "board.jpg", &bytes);
    let (mut selector, received) = selector();

    assert!(selector.activate());
    let file = SelectedFile::from_path(&path).unwrap();
    assert_eq!(file.mime, "image/jpeg");
    selector.file_chosen(Some(file)).await;

    assert!(received.lock().unwrap().is_empty());
    assert_eq!(selector.pending_alert(), Some("文件大小不能超过2MB"));
    selector.dismiss_alert();
    assert!(selector.pending_alert().is_none());
}

#[tokio::test]
async fn reselecting_the_same_file_runs_two_full_cycles() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "board.png", &png_bytes(2048));
    let (mut selector, received) = selector();

    for _ in 0..2 {
        assert!(selector.activate());
        let file = SelectedFile::from_path(&path).unwrap();
        selector.file_chosen(Some(file)).await;
        assert_eq!(selector.state(), SelectorState::Idle);
    }

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].0, received[1].0);
    assert_eq!(received[0].1, received[1].1);
}

#[tokio::test]
async fn disabled_trigger_never_prompts_or_completes() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "board.png", &png_bytes(2048));
    let (mut selector, received) = selector();
    selector.set_disabled(true);

    assert!(!selector.activate());
    assert_eq!(selector.state(), SelectorState::Idle);

    // A choice simulated anyway must be ignored outright.
    let file = SelectedFile::from_path(&path).unwrap();
    selector.file_chosen(Some(file)).await;

    assert!(received.lock().unwrap().is_empty());
    assert!(selector.pending_alert().is_none());
}

#[tokio::test]
async fn dismissing_the_surface_settles_the_attempt() {
    let (mut selector, received) = selector();

    assert!(selector.activate());
    assert_eq!(selector.state(), SelectorState::Prompting);
    selector.file_chosen(None).await;

    assert_eq!(selector.state(), SelectorState::Idle);
    assert!(received.lock().unwrap().is_empty());
    // And the trigger is live again.
    assert!(selector.activate());
}

#[tokio::test]
async fn empty_file_surfaces_a_read_alert() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "empty.png", b"");
    let (mut selector, received) = selector();

    assert!(selector.activate());
    let file = SelectedFile::from_path(&path).unwrap();
    selector.file_chosen(Some(file)).await;

    assert!(received.lock().unwrap().is_empty());
    assert_eq!(selector.pending_alert(), Some("图片读取失败"));
}
