use egui::pos2;
use futures::executor::block_on;
use image::ImageFormat;
use raster_paint::{DocumentSession, EngineConfig, NotificationLog, PaintError, ProjectData, Severity};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session(width: u32, height: u32) -> DocumentSession {
    DocumentSession::new(EngineConfig {
        canvas_width: width,
        canvas_height: height,
        rng_seed: Some(9),
        ..Default::default()
    })
    .unwrap()
}

fn painted_session() -> DocumentSession {
    let mut session = session(48, 32);
    session.pointer_down_at(pos2(12.0, 12.0), 0.0).unwrap();
    session.pointer_up().unwrap();
    session.add_layer().unwrap();
    session.set_color("#00ff00").unwrap();
    session.pointer_down_at(pos2(30.0, 20.0), 0.0).unwrap();
    session.pointer_up().unwrap();
    session.rename_layer(1, "Highlights").unwrap();
    session.set_layer_opacity(1, 0.5).unwrap();
    session.set_layer_visibility(1, false).unwrap();
    session.set_layer_locked(1, true).unwrap();
    session
}

#[test]
fn test_project_round_trip() {
    init();
    let source = painted_session();
    let json = source.save_project_json().unwrap();

    let mut target = session(10, 10);
    let log = NotificationLog::new();
    target.subscribe(log.handler());
    block_on(target.load_project(&json)).unwrap();

    let (a, b) = (source.layers(), target.layers());
    assert_eq!((b.width(), b.height()), (48, 32));
    assert_eq!(b.len(), 2);
    for (expected, loaded) in a.layers().iter().zip(b.layers()) {
        assert_eq!(loaded.name, expected.name);
        assert_eq!(loaded.visible, expected.visible);
        assert_eq!(loaded.opacity, expected.opacity);
        assert_eq!(loaded.buffer, expected.buffer);
        assert!(!loaded.locked);
    }
    assert_eq!(b.current_index(), 0);
    assert_eq!(target.history().len(), 1);
    assert!(!target.history().can_undo());
    assert_eq!(log.last().unwrap().message, "Project loaded");
}

#[test]
fn test_invalid_project_leaves_document() {
    init();
    let mut session = painted_session();
    let before = session.to_project().unwrap();
    let log = NotificationLog::new();
    session.subscribe(log.handler());

    let result = block_on(session.load_project("{ not json"));
    assert!(matches!(result, Err(PaintError::Project(_))));
    assert_eq!(log.last().unwrap().severity, Severity::Error);

    let oversized = r#"{"width": 9000, "height": 10, "layers": []}"#;
    assert!(matches!(
        block_on(session.load_project(oversized)),
        Err(PaintError::InvalidDimensions { .. })
    ));

    assert_eq!(session.to_project().unwrap(), before);
    assert_eq!(session.history().len(), 4);
}

#[test]
fn test_undecodable_layer_leaves_document() {
    init();
    let mut session = painted_session();
    let before = session.to_project().unwrap();
    let json = r#"{"width": 8, "height": 8, "layers": [
        {"name": "Bad", "visible": true, "opacity": 1.0, "data": "data:image/png;base64,AAAA"}
    ]}"#;
    let result = block_on(session.load_project(json));
    assert!(matches!(result, Err(PaintError::Codec(_))));
    assert!(!session.is_restoring());
    assert_eq!(session.to_project().unwrap(), before);
    assert_eq!(session.history().step(), 3);
}

#[test]
fn test_smaller_layer_images_are_placed_at_origin() {
    init();
    let small = session(4, 4);
    let mut project: ProjectData = small.to_project().unwrap();
    project.width = 8;
    project.height = 6;
    let json = project.to_json().unwrap();

    let mut target = session(2, 2);
    block_on(target.load_project(&json)).unwrap();
    assert_eq!((target.layers().width(), target.layers().height()), (8, 6));
    assert_eq!(target.layers().active().buffer.width(), 8);
}

#[test]
fn test_export_formats() {
    init();
    let session = painted_session();
    let png = session.export_image(ImageFormat::Png).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
    assert_eq!(decoded.dimensions(), (48, 32));
    // Flattened over white, hidden layer excluded.
    assert_eq!(decoded.get_pixel(12, 12).0, [0, 0, 0, 255]);
    assert_eq!(decoded.get_pixel(30, 20).0, [255, 255, 255, 255]);

    let jpeg = session.export_image(ImageFormat::Jpeg).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}
