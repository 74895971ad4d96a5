// Copyright @yucwang 2026

use std::fmt;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::core::camera::ProjectionMode;
use crate::core::scene::Scene;
use crate::core::sky::{GradientStop, SkyMode, Sun};
use crate::math::constants::{Float, Vector3f};

#[derive(Debug)]
pub enum SceneIoError {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SceneIoError {
    fn from(err: std::io::Error) -> Self {
        SceneIoError::Io(err)
    }
}

impl From<quick_xml::Error> for SceneIoError {
    fn from(err: quick_xml::Error) -> Self {
        SceneIoError::Xml(err)
    }
}

impl From<std::string::FromUtf8Error> for SceneIoError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        SceneIoError::Parse(err.to_string())
    }
}

impl fmt::Display for SceneIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneIoError::Io(err) => write!(f, "scene i/o failed: {}", err),
            SceneIoError::Xml(err) => write!(f, "malformed scene xml: {}", err),
            SceneIoError::Parse(msg) => write!(f, "invalid scene: {}", msg),
            SceneIoError::MissingField(field) => write!(f, "scene is missing <{}>", field),
        }
    }
}

impl std::error::Error for SceneIoError {}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneIoError> {
    let path = path.as_ref();
    log::info!("Loading scene from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    read_scene(&xml)
}

pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<(), SceneIoError> {
    let path = path.as_ref();
    log::info!("Saving scene to: {}.", path.display());
    fs::write(path, write_scene(scene)?)?;
    Ok(())
}

fn element<'a>(name: &'a str, attributes: &[(&str, String)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute((*key, value.as_str()));
    }
    start
}

fn vec3_attributes(v: &Vector3f, names: [&'static str; 3]) -> Vec<(&'static str, String)> {
    vec![(names[0], v.x.to_string()), (names[1], v.y.to_string()), (names[2], v.z.to_string())]
}

/// Serializes the scene configuration. The render mode is not stored.
pub fn write_scene(scene: &Scene) -> Result<String, SceneIoError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let camera = scene.camera();
    let sky = scene.sky();

    writer.write_event(Event::Start(element("scene", &[
        ("name", scene.name().to_string()),
        ("spp", scene.target_spp().to_string()),
    ])))?;
    writer.write_event(Event::Empty(element("canvas", &[
        ("width", scene.width().to_string()),
        ("height", scene.height().to_string()),
    ])))?;

    writer.write_event(Event::Start(element("camera", &[
        ("projection", camera.projection_mode.name().to_string()),
        ("fov", camera.fov.to_string()),
        ("aperture", camera.aperture.to_string()),
        ("subject_distance", camera.subject_distance.to_string()),
        ("shift_x", camera.shift_x.to_string()),
        ("shift_y", camera.shift_y.to_string()),
        ("ipd", camera.interpupillary_distance.to_string()),
    ])))?;
    let position = vec3_attributes(&camera.position, ["x", "y", "z"]);
    writer.write_event(Event::Empty(element("position", &position)))?;
    writer.write_event(Event::Empty(element("orientation", &[
        ("yaw", camera.yaw.to_string()),
        ("pitch", camera.pitch.to_string()),
        ("roll", camera.roll.to_string()),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("camera")))?;

    writer.write_event(Event::Start(element("sky", &[
        ("mode", sky.mode().name().to_string()),
        ("light", sky.light().to_string()),
        ("mirrored", sky.mirrored().to_string()),
    ])))?;
    let color = vec3_attributes(&sky.color(), ["r", "g", "b"]);
    writer.write_event(Event::Empty(element("color", &color)))?;
    for stop in sky.gradient() {
        let mut attributes = vec3_attributes(&stop.color, ["r", "g", "b"]);
        attributes.push(("pos", stop.pos.to_string()));
        writer.write_event(Event::Empty(element("stop", &attributes)))?;
    }
    let sun = sky.sun();
    writer.write_event(Event::Empty(element("sun", &[
        ("azimuth", sun.azimuth.to_string()),
        ("altitude", sun.altitude.to_string()),
        ("turbidity", sun.turbidity.to_string()),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("sky")))?;

    writer.write_event(Event::End(BytesEnd::new("scene")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn parse_float(value: &str) -> Result<Float, SceneIoError> {
    value.trim().parse::<Float>()
        .map_err(|_| SceneIoError::Parse(format!("invalid float: {}", value)))
}

fn parse_attributes(e: &BytesStart) -> Result<Vec<(String, String)>, SceneIoError> {
    let mut attributes = Vec::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?.to_string();
        attributes.push((key, value));
    }
    Ok(attributes)
}

fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn float_attribute(attributes: &[(String, String)],
                   key: &str,
                   default: Float) -> Result<Float, SceneIoError> {
    match attribute(attributes, key) {
        Some(value) => parse_float(value),
        None => Ok(default),
    }
}

fn vec3_attribute(attributes: &[(String, String)],
                  names: [&str; 3],
                  default: Vector3f) -> Result<Vector3f, SceneIoError> {
    Ok(Vector3f::new(
        float_attribute(attributes, names[0], default.x)?,
        float_attribute(attributes, names[1], default.y)?,
        float_attribute(attributes, names[2], default.z)?,
    ))
}

/// Parses a scene configuration written by [`write_scene`]. Missing
/// optional attributes keep their defaults.
pub fn read_scene(xml: &str) -> Result<Scene, SceneIoError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut scene = Scene::new();
    let mut seen_scene = false;
    let mut seen_canvas = false;
    let mut in_camera = false;
    let mut in_sky = false;
    let mut gradient: Option<Vec<GradientStop>> = None;

    loop {
        buf.clear();
        let (e, has_children) = match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(e) => {
                match e.name().as_ref() {
                    b"camera" => in_camera = false,
                    b"sky" => {
                        in_sky = false;
                        if let Some(stops) = gradient.take() {
                            scene.sky_mut().set_gradient(stops);
                        }
                    }
                    _ => {}
                }
                continue;
            }
            _ => continue,
        };

        let attributes = parse_attributes(&e)?;
        match e.name().as_ref() {
            b"scene" => {
                seen_scene = true;
                if let Some(name) = attribute(&attributes, "name") {
                    scene.set_name(name);
                }
                if let Some(spp) = attribute(&attributes, "spp") {
                    let spp = spp.trim().parse::<u32>()
                        .map_err(|_| SceneIoError::Parse(format!("invalid spp: {}", spp)))?;
                    scene.set_target_spp(spp);
                }
            }
            b"canvas" => {
                seen_canvas = true;
                let parse_dim = |key: &'static str| -> Result<usize, SceneIoError> {
                    let value = attribute(&attributes, key).ok_or(SceneIoError::MissingField(key))?;
                    value.trim().parse::<usize>()
                        .map_err(|_| {
                            SceneIoError::Parse(format!("invalid canvas {}: {}", key, value))
                        })
                };
                let width = parse_dim("width")?;
                let height = parse_dim("height")?;
                scene.set_canvas_size(width, height);
            }
            b"camera" => {
                in_camera = has_children;
                let camera = scene.camera_mut();
                if let Some(name) = attribute(&attributes, "projection") {
                    camera.projection_mode = ProjectionMode::from_name(name)
                        .ok_or_else(|| {
                            SceneIoError::Parse(format!("unknown projection: {}", name))
                        })?;
                }
                camera.fov = float_attribute(&attributes, "fov", camera.fov)?;
                camera.aperture = float_attribute(&attributes, "aperture", camera.aperture)?;
                camera.subject_distance =
                    float_attribute(&attributes, "subject_distance", camera.subject_distance)?;
                camera.shift_x = float_attribute(&attributes, "shift_x", camera.shift_x)?;
                camera.shift_y = float_attribute(&attributes, "shift_y", camera.shift_y)?;
                camera.interpupillary_distance =
                    float_attribute(&attributes, "ipd", camera.interpupillary_distance)?;
            }
            b"position" if in_camera => {
                let camera = scene.camera_mut();
                camera.position = vec3_attribute(&attributes, ["x", "y", "z"], camera.position)?;
            }
            b"orientation" if in_camera => {
                let camera = scene.camera_mut();
                camera.yaw = float_attribute(&attributes, "yaw", camera.yaw)?;
                camera.pitch = float_attribute(&attributes, "pitch", camera.pitch)?;
                camera.roll = float_attribute(&attributes, "roll", camera.roll)?;
            }
            b"sky" => {
                in_sky = has_children;
                if has_children {
                    gradient = Some(Vec::new());
                } else {
                    scene.sky_mut().set_gradient(Vec::new());
                }
                let sky = scene.sky_mut();
                if let Some(name) = attribute(&attributes, "mode") {
                    let mode = SkyMode::from_name(name)
                        .ok_or_else(|| SceneIoError::Parse(format!("unknown sky mode: {}", name)))?;
                    sky.set_sky_mode(mode);
                }
                let light = float_attribute(&attributes, "light", sky.light())?;
                sky.set_light(light);
                if let Some(mirrored) = attribute(&attributes, "mirrored") {
                    let mirrored = mirrored.trim().parse::<bool>()
                        .map_err(|_| {
                            SceneIoError::Parse(format!("invalid mirrored flag: {}", mirrored))
                        })?;
                    sky.set_mirrored(mirrored);
                }
            }
            b"color" if in_sky => {
                let sky = scene.sky_mut();
                let color = vec3_attribute(&attributes, ["r", "g", "b"], sky.color())?;
                sky.set_color(color);
            }
            b"stop" if in_sky => {
                let color = vec3_attribute(&attributes, ["r", "g", "b"], Vector3f::zeros())?;
                let pos = float_attribute(&attributes, "pos", 0.0)?;
                if let Some(stops) = gradient.as_mut() {
                    stops.push(GradientStop { color, pos });
                }
            }
            b"sun" if in_sky => {
                let defaults = Sun::default();
                let sun = Sun {
                    azimuth: float_attribute(&attributes, "azimuth", defaults.azimuth)?,
                    altitude: float_attribute(&attributes, "altitude", defaults.altitude)?,
                    turbidity: float_attribute(&attributes, "turbidity", defaults.turbidity)?,
                };
                scene.sky_mut().set_sun(sun);
            }
            _ => {}
        }
    }

    if !seen_scene {
        return Err(SceneIoError::MissingField("scene"));
    }
    if !seen_canvas {
        return Err(SceneIoError::MissingField("canvas"));
    }
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::RenderMode;

    #[test]
    fn test_scene_xml_round_trip() {
        let mut scene = Scene::new();
        scene.set_name("json1");
        scene.set_canvas_size(32, 20);
        scene.set_target_spp(2);
        scene.set_render_mode(RenderMode::Rendering);
        scene.camera_mut().set_projection_mode(ProjectionMode::OdsRight);
        scene.camera_mut().position = Vector3f::new(1.5, -2.0, 0.1);
        scene.camera_mut().yaw = 0.3;
        scene.sky_mut().set_sky_mode(SkyMode::Gradient);
        scene.sky_mut().set_gradient(vec![
            GradientStop::new(0.5, 1.0, 0.25, 0.0),
            GradientStop::new(0.1, 0.2, 0.3, 1.0),
        ]);
        scene.sky_mut().set_mirrored(false);

        let xml = write_scene(&scene).unwrap();
        let parsed = read_scene(&xml).unwrap();

        assert_eq!(parsed.name(), "json1");
        assert_eq!((parsed.width(), parsed.height()), (32, 20));
        assert_eq!(parsed.target_spp(), 2);
        assert_eq!(parsed.camera(), scene.camera());
        assert_eq!(parsed.sky(), scene.sky());
    }

    #[test]
    fn test_missing_canvas_is_rejected() {
        let result = read_scene("<scene name=\"x\" spp=\"1\"></scene>");
        assert!(matches!(result, Err(SceneIoError::MissingField("canvas"))));
    }

    #[test]
    fn test_unknown_projection_is_rejected() {
        let xml = "<scene><canvas width=\"20\" height=\"20\"/>\
                   <camera projection=\"cubemap\"/></scene>";
        assert!(matches!(read_scene(xml), Err(SceneIoError::Parse(_))));
    }

    #[test]
    fn test_empty_gradient_survives_round_trip() {
        let mut scene = Scene::new();
        scene.sky_mut().set_gradient(Vec::new());
        let parsed = read_scene(&write_scene(&scene).unwrap()).unwrap();
        assert!(parsed.sky().gradient().is_empty());
    }
}
