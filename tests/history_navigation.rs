use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use egui::pos2;
use futures::executor::block_on;
use futures::FutureExt;
use raster_paint::codec::{decode_data_url, CodecError, DecodeHandle, EncodedImage, ImageDecoder};
use raster_paint::{DocumentSession, EngineConfig, NotificationLog, PaintError, PixelBuffer, Severity};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session() -> DocumentSession {
    DocumentSession::new(EngineConfig {
        canvas_width: 64,
        canvas_height: 48,
        rng_seed: Some(3),
        ..Default::default()
    })
    .unwrap()
}

fn click(session: &mut DocumentSession, x: f32, y: f32) {
    session.pointer_down_at(pos2(x, y), 0.0).unwrap();
    session.pointer_up().unwrap();
}

fn pixels(session: &DocumentSession) -> Vec<PixelBuffer> {
    session.layers().layers().iter().map(|layer| layer.buffer.clone()).collect()
}

/// Always fails to decode.
struct BrokenDecoder;

impl ImageDecoder for BrokenDecoder {
    fn submit(&self, _image: &EncodedImage) -> DecodeHandle {
        DecodeHandle::ready(Err(CodecError::InvalidDataUrl))
    }
}

/// Decodes normally and counts the requests.
#[derive(Default)]
struct CountingDecoder {
    submitted: AtomicUsize,
}

impl ImageDecoder for CountingDecoder {
    fn submit(&self, image: &EncodedImage) -> DecodeHandle {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        DecodeHandle::ready(decode_data_url(image))
    }
}

/// Never finishes decoding.
struct StalledDecoder;

impl ImageDecoder for StalledDecoder {
    fn submit(&self, _image: &EncodedImage) -> DecodeHandle {
        DecodeHandle::new(futures::future::pending().boxed())
    }
}

#[test]
fn test_undo_redo_is_byte_identical() {
    init();
    let mut session = session();
    let mut states = vec![pixels(&session)];
    for (x, y) in [(10.0, 10.0), (30.0, 20.0), (50.0, 40.0)] {
        click(&mut session, x, y);
        states.push(pixels(&session));
    }
    assert_eq!(session.history().len(), 4);

    for expected in states.iter().rev().skip(1) {
        block_on(session.undo()).unwrap();
        assert_eq!(&pixels(&session), expected);
    }
    assert!(matches!(block_on(session.undo()), Err(PaintError::NothingToUndo)));

    for expected in states.iter().skip(1) {
        block_on(session.redo()).unwrap();
        assert_eq!(&pixels(&session), expected);
    }
    assert!(matches!(block_on(session.redo()), Err(PaintError::NothingToRedo)));
}

#[test]
fn test_new_commit_drops_redo() {
    init();
    let mut session = session();
    let log = NotificationLog::new();
    session.subscribe(log.handler());
    click(&mut session, 10.0, 10.0);
    block_on(session.undo()).unwrap();
    click(&mut session, 20.0, 20.0);
    assert!(matches!(block_on(session.redo()), Err(PaintError::NothingToRedo)));
    let last = log.last().unwrap();
    assert_eq!(last.severity, Severity::Warning);
    assert_eq!(last.message, "Nothing to redo");
}

#[test]
fn test_history_is_capped() {
    init();
    let mut session = session();
    let initial = session.history().entries()[0].layers[0].data.clone();
    for i in 0..50 {
        click(&mut session, 5.0 + i as f32, 24.0);
    }
    let history = session.history();
    assert_eq!(history.len(), 50);
    assert_eq!(history.step(), 49);
    assert_ne!(history.entries()[0].layers[0].data, initial);
    assert!(!history.can_redo());
}

#[test]
fn test_failed_restore_reverts() {
    init();
    let mut session = session().with_decoder(Arc::new(BrokenDecoder));
    let log = NotificationLog::new();
    session.subscribe(log.handler());
    click(&mut session, 20.0, 20.0);
    let before = pixels(&session);

    let result = block_on(session.undo());
    assert!(matches!(result, Err(PaintError::Codec(_))));
    assert_eq!(session.history().step(), 1);
    assert_eq!(session.history().len(), 2);
    assert!(!session.is_restoring());
    assert_eq!(pixels(&session), before);
    assert_eq!(log.last().unwrap().severity, Severity::Error);

    // The session is still usable afterwards.
    click(&mut session, 40.0, 20.0);
    assert_eq!(session.history().len(), 3);
}

#[test]
fn test_restore_decodes_every_layer() {
    init();
    let decoder = Arc::new(CountingDecoder::default());
    let mut session = session().with_decoder(decoder.clone());
    session.add_layer().unwrap();
    session.add_layer().unwrap();
    block_on(session.undo()).unwrap();
    // The restored entry has two layers.
    assert_eq!(decoder.submitted.load(Ordering::SeqCst), 2);
    assert_eq!(session.layers().len(), 2);
    assert_eq!(session.layers().current_index(), 1);
}

#[test]
fn test_undo_restores_layer_metadata() {
    init();
    let mut session = session();
    session.add_layer().unwrap();
    session.rename_layer(1, "Ink").unwrap();
    session.set_layer_opacity(1, 0.25).unwrap();
    let id = session.layers().layers()[1].id;
    click(&mut session, 10.0, 10.0);
    session.delete_layer(1).unwrap();
    assert_eq!(session.layers().len(), 1);

    block_on(session.undo()).unwrap();
    let layer = &session.layers().layers()[1];
    assert_eq!(layer.name, "Ink");
    assert_eq!(layer.opacity, 0.25);
    assert_eq!(layer.id, id);
    assert!(!layer.buffer.is_blank());
}

#[test]
fn test_undo_across_resize_restores_size() {
    init();
    let mut session = session();
    click(&mut session, 10.0, 10.0);
    let before = pixels(&session);
    session.resize_canvas(128, 96).unwrap();
    assert_eq!(session.layers().width(), 128);

    block_on(session.undo()).unwrap();
    assert_eq!((session.layers().width(), session.layers().height()), (64, 48));
    assert_eq!(pixels(&session), before);
}

#[test]
fn test_abandoned_undo_task_rolls_back() {
    init();
    let mut session = session();
    session.add_layer().unwrap();
    let task = session.begin_undo().unwrap();
    assert_eq!(session.history().step(), 0);
    drop(task);

    assert!(!session.is_restoring());
    assert_eq!(session.history().step(), 1);
    assert_eq!(session.layers().len(), 2);
    session.add_layer().unwrap();
    assert_eq!(session.history().len(), 3);
    block_on(session.undo()).unwrap();
    assert_eq!(session.layers().len(), 2);
}

#[test]
fn test_abandoned_decoded_restore_rolls_back() {
    init();
    let mut session = session();
    click(&mut session, 10.0, 10.0);
    let before = pixels(&session);
    let decoded = block_on(session.begin_undo().unwrap().decode());
    assert!(decoded.is_ok());
    drop(decoded);

    assert!(!session.is_restoring());
    assert_eq!(session.history().step(), 1);
    assert_eq!(pixels(&session), before);
}

#[test]
fn test_dropped_undo_future_keeps_session_usable() {
    init();
    let mut session = session().with_decoder(Arc::new(StalledDecoder));
    click(&mut session, 10.0, 10.0);
    let before = pixels(&session);

    // Polled once, then dropped while the decode is still pending.
    assert!(session.undo().now_or_never().is_none());

    assert!(!session.is_restoring());
    assert_eq!(session.history().step(), 1);
    assert_eq!(pixels(&session), before);
    click(&mut session, 30.0, 30.0);
    assert_eq!(session.history().len(), 3);
}

#[test]
fn test_dropped_project_load_keeps_document() {
    init();
    let source = session();
    let json = source.save_project_json().unwrap();

    let mut session = session().with_decoder(Arc::new(StalledDecoder));
    session.add_layer().unwrap();
    assert!(session.load_project(&json).now_or_never().is_none());

    assert!(!session.is_restoring());
    assert_eq!(session.layers().len(), 2);
    assert_eq!(session.history().step(), 1);
    session.add_layer().unwrap();
}
