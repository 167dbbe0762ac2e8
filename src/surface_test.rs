use super::*;

fn svg_string(surface: &SvgSurface) -> String {
    String::from_utf8(surface.to_svg().to_vec()).unwrap()
}

#[test]
fn blank_surface_has_no_drawing() {
    let surface = SvgSurface::new();
    assert!(surface.is_blank());
    let svg = svg_string(&surface);
    assert!(svg.starts_with("<svg "));
    assert!(svg.contains("width=\"0\" height=\"0\""));
    assert!(!svg.contains("<g"));
}

#[test]
fn mount_and_resize_replace_content() {
    let mut surface = SvgSurface::new();
    surface.mount(Shape::group(Some("first"), Vec::new()));
    surface.mount(Shape::group(Some("second"), Vec::new()));
    surface.resize(120.5, 44.0);

    assert!(!surface.is_blank());
    assert_eq!(surface.size(), (120.5, 44.0));
    let svg = svg_string(&surface);
    assert!(svg.contains("width=\"120.5\" height=\"44\""));
    assert!(svg.contains("class=\"second\""));
    assert!(!svg.contains("class=\"first\""));
}

#[test]
fn group_offsets_become_transforms() {
    let mut group = Shape::group(
        Some("diagram"),
        vec![Shape::Circle {
            class: "begin",
            cx: 5.0,
            cy: 5.0,
            r: 5.0,
        }],
    );
    group.translate(10.0, 2.25);
    let mut surface = SvgSurface::new();
    surface.mount(group);
    let svg = svg_string(&surface);
    assert!(svg.contains("<g class=\"diagram\" transform=\"translate(10 2.25)\">"));
    assert!(svg.contains("<circle class=\"begin\" cx=\"5\" cy=\"5\" r=\"5\"/>"));
}

#[test]
fn text_is_escaped() {
    let mut surface = SvgSurface::new();
    surface.mount(Shape::Text {
        class: "label-text",
        x: 0.0,
        y: 0.0,
        width: 35.0,
        height: 10.0,
        content: "\"<&>\"".to_string(),
    });
    let svg = svg_string(&surface);
    assert!(svg.contains(">&quot;&lt;&amp;&gt;&quot;</text>"));
    assert!(svg.contains("y=\"8\""));
}

#[test]
fn path_data_uses_absolute_commands() {
    let d = path_data(&[
        PathCmd::Move(0.0, 10.0),
        PathCmd::Line(20.0, 10.0),
        PathCmd::Quad(30.0, 10.0, 30.0, 20.5),
    ]);
    assert_eq!(d, "M0,10 L20,10 Q30,10 30,20.5");
}
