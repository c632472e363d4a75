#![allow(clippy::float_cmp)]

use super::*;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================
// Tool identifiers
// =============================================================

#[test]
fn tool_names_round_trip() {
    for tool in Tool::ALL {
        assert_eq!(Tool::from_name(tool.name()), Some(tool));
    }
}

#[test]
fn unknown_tool_name_is_none() {
    assert_eq!(Tool::from_name("spraycan"), None);
    assert_eq!(Tool::from_name(""), None);
}

#[test]
fn tool_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Tool::Highlighter).unwrap(), "\"highlighter\"");
}

#[test]
fn composite_serializes_kebab_case() {
    assert_eq!(serde_json::to_string(&CompositeMode::DestinationOut).unwrap(), "\"destination-out\"");
    assert_eq!(serde_json::to_string(&CompositeMode::SourceOver).unwrap(), "\"source-over\"");
}

// =============================================================
// Builder purity
// =============================================================

#[test]
fn build_is_pure_for_every_tool_and_device() {
    let settings = ToolSettings::default();
    for tool in Tool::ALL {
        for device in DeviceType::ALL {
            let a = StrokeStyle::build(Some(tool), device, &settings);
            let b = StrokeStyle::build(Some(tool), device, &settings);
            assert_eq!(a, b, "{tool:?} / {device:?}");
        }
    }
}

// =============================================================
// Table values
// =============================================================

#[test]
fn pencil_mouse_bundle() {
    let style = StrokeStyle::build(Some(Tool::Pencil), DeviceType::Mouse, &ToolSettings::default());
    assert!(approx_eq(style.opacity, 0.85));
    assert!(approx_eq(style.tension, 0.2));
    assert!(approx_eq(style.width, 1.6));
    assert!(approx_eq(style.shadow_blur, 0.2));
    assert_eq!(style.line_cap, LineCap::Round);
    assert_eq!(style.composite, CompositeMode::SourceOver);
    assert_eq!(style.color, "#000000");
}

#[test]
fn touch_widens_and_softens() {
    let settings = ToolSettings::with_tool(Tool::Brush);
    let mouse = StrokeStyle::build(Some(Tool::Brush), DeviceType::Mouse, &settings);
    let touch = StrokeStyle::build(Some(Tool::Brush), DeviceType::Touch, &settings);
    assert!(touch.width > mouse.width);
    assert!(touch.tension < mouse.tension);
    assert!(approx_eq(touch.shadow_blur, 2.0));
}

#[test]
fn compact_form_factor_boosts_touch_only() {
    let mut settings = ToolSettings::default();
    let desktop_touch = StrokeStyle::build(Some(Tool::Pen), DeviceType::Touch, &settings);
    let desktop_mouse = StrokeStyle::build(Some(Tool::Pen), DeviceType::Mouse, &settings);
    settings.form_factor = FormFactor::Compact;
    let compact_touch = StrokeStyle::build(Some(Tool::Pen), DeviceType::Touch, &settings);
    let compact_mouse = StrokeStyle::build(Some(Tool::Pen), DeviceType::Mouse, &settings);
    assert!(approx_eq(compact_touch.width, desktop_touch.width * 1.25));
    assert!(approx_eq(compact_mouse.width, desktop_mouse.width));
}

#[test]
fn tension_never_negative() {
    for tool in Tool::ALL {
        for device in DeviceType::ALL {
            let style = StrokeStyle::build(Some(tool), device, &ToolSettings::default());
            assert!(style.tension >= 0.0);
        }
    }
}

#[test]
fn marker_and_highlighter_use_square_caps() {
    let s = ToolSettings::default();
    assert_eq!(StrokeStyle::build(Some(Tool::Marker), DeviceType::Mouse, &s).line_cap, LineCap::Square);
    let hl = StrokeStyle::build(Some(Tool::Highlighter), DeviceType::Mouse, &s);
    assert_eq!(hl.line_cap, LineCap::Square);
    assert_eq!(hl.composite, CompositeMode::Multiply);
}

// =============================================================
// Eraser
// =============================================================

#[test]
fn eraser_forces_destination_out_and_background_color() {
    for color in ["#ff0000", "#00ff00", "rgba(1,2,3,0.5)"] {
        for device in DeviceType::ALL {
            let settings = ToolSettings { stroke_color: color.to_owned(), ..ToolSettings::with_tool(Tool::Eraser) };
            let style = StrokeStyle::build(Some(Tool::Eraser), device, &settings);
            assert_eq!(style.composite, CompositeMode::DestinationOut);
            assert_eq!(style.color, "#ffffff");
        }
    }
}

// =============================================================
// Unknown tool
// =============================================================

#[test]
fn unknown_tool_falls_back_to_neutral() {
    let style = StrokeStyle::build(None, DeviceType::Mouse, &ToolSettings::default());
    assert!(approx_eq(style.opacity, 1.0));
    assert_eq!(style.line_cap, LineCap::Round);
    assert_eq!(style.composite, CompositeMode::SourceOver);
    assert!(approx_eq(style.width, 2.0));
}

// =============================================================
// Device pressure policy
// =============================================================

#[test]
fn nominal_pressure_ignores_native_value() {
    let mouse = DeviceProfile::for_device(DeviceType::Mouse);
    assert_eq!(mouse.pressure(Some(0.2)), 1.0);
    assert_eq!(DeviceProfile::for_device(DeviceType::Touch).pressure(None), 1.0);
}

#[test]
fn pen_pressure_scales_and_floors() {
    let pen = DeviceProfile::for_device(DeviceType::Pen);
    assert!(approx_eq(pen.pressure(Some(0.5)), 0.75));
    assert!(approx_eq(pen.pressure(Some(0.01)), 0.15));
    assert!(approx_eq(pen.pressure(None), 0.15));
}

#[test]
fn tool_settings_deserialize_camel_case_with_defaults() {
    let json = r##"{"tool":"marker","strokeWidth":4,"strokeColor":"#123456"}"##;
    let settings: ToolSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.tool, "marker");
    assert_eq!(settings.stroke_width, 4.0);
    assert_eq!(settings.interaction, Interaction::Draw);
    assert_eq!(settings.form_factor, FormFactor::Desktop);
}
