use egui::pos2;
use raster_paint::{DocumentSession, EngineConfig, NotificationLog, PaintError, Severity, ToolSettings};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session(width: u32, height: u32) -> (DocumentSession, NotificationLog) {
    let session = DocumentSession::new(EngineConfig {
        canvas_width: width,
        canvas_height: height,
        ..Default::default()
    })
    .unwrap();
    let log = NotificationLog::new();
    session.subscribe(log.handler());
    (session, log)
}

#[test]
fn test_last_layer_cannot_be_deleted() {
    init();
    let (mut session, log) = session(32, 32);
    assert!(matches!(session.delete_layer(0), Err(PaintError::LastLayer)));
    assert_eq!(session.layers().len(), 1);
    assert_eq!(session.history().len(), 1);
    let last = log.last().unwrap();
    assert_eq!(last.severity, Severity::Warning);
    assert_eq!(last.message, "Cannot delete the last layer");
}

#[test]
fn test_add_and_delete_commit_history() {
    init();
    let (mut session, log) = session(32, 32);
    assert_eq!(session.add_layer().unwrap(), 1);
    assert_eq!(log.last().unwrap().message, "New layer added");
    session.add_layer().unwrap();
    assert_eq!(session.layers().active().name, "Layer 3");
    session.delete_layer(2).unwrap();
    assert_eq!(session.layers().current_index(), 1);
    assert_eq!(session.history().len(), 4);
}

#[test]
fn test_metadata_edits_do_not_commit() {
    init();
    let (mut session, _) = session(32, 32);
    session.add_layer().unwrap();
    let len = session.history().len();
    session.select_layer(0).unwrap();
    session.toggle_layer_visibility(1).unwrap();
    session.set_layer_opacity(1, 1.7).unwrap();
    session.set_layer_locked(0, true).unwrap();
    session.rename_layer(0, "  Sketch ").unwrap();
    assert_eq!(session.history().len(), len);

    let layers = session.layers().layers();
    assert_eq!(session.layers().current_index(), 0);
    assert!(!layers[1].visible);
    assert_eq!(layers[1].opacity, 1.0);
    assert!(layers[0].locked);
    assert_eq!(layers[0].name, "Sketch");
}

#[test]
fn test_invalid_layer_index() {
    init();
    let (mut session, _) = session(16, 16);
    assert!(matches!(session.select_layer(4), Err(PaintError::InvalidLayerIndex(4))));
    assert!(session.rename_layer(0, "   ").is_err());
    assert!(session.set_layer_opacity(0, f32::NAN).is_err());
}

#[test]
fn test_resize_scales_content() {
    init();
    let (mut session, _) = session(800, 600);
    session
        .apply_settings(ToolSettings {
            color: "#ff0000".to_string(),
            brush_size: 100.0,
            ..Default::default()
        })
        .unwrap();
    session.pointer_down_at(pos2(150.0, 150.0), 0.0).unwrap();
    session.pointer_up().unwrap();
    session.add_layer().unwrap();

    session.resize_canvas(1600, 1200).unwrap();
    let stack = session.layers();
    assert_eq!((stack.width(), stack.height()), (1600, 1200));
    for layer in stack.layers() {
        assert_eq!((layer.buffer.width(), layer.buffer.height()), (1600, 1200));
    }
    let bottom = &stack.layers()[0].buffer;
    assert_eq!(bottom.get(300, 300), Some([255, 0, 0, 255]));
    assert_eq!(bottom.get(100, 100).unwrap()[3], 0);

    let frame = session.composite();
    assert_eq!((frame.width(), frame.height()), (1600, 1200));
    assert_eq!(frame.get(300, 300), Some([255, 0, 0, 255]));
    assert_eq!(frame.get(1000, 1000), Some([255, 255, 255, 255]));
}

#[test]
fn test_resize_rejects_bad_sizes() {
    init();
    let (mut session, log) = session(20, 20);
    assert!(session.resize_canvas(0, 10).is_err());
    assert!(session.resize_canvas(4097, 10).is_err());
    assert_eq!(log.last().unwrap().severity, Severity::Error);
    assert!(session.resize_canvas_from_str("40 by 40").is_err());
    session.resize_canvas_from_str("40x30").unwrap();
    assert_eq!((session.layers().width(), session.layers().height()), (40, 30));
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_clear_all_is_undoable_and_ignores_locks() {
    init();
    let (mut session, _) = session(20, 20);
    session.pointer_down_at(pos2(10.0, 10.0), 0.0).unwrap();
    session.pointer_up().unwrap();
    session.set_layer_locked(0, true).unwrap();
    session.clear_all().unwrap();
    assert!(session.layers().active().buffer.is_blank());
    assert_eq!(session.history().len(), 3);
}
