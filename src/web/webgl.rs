//! WebGL2 render backend: a full-bleed canvas drawing the scene's line meshes.

use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, HtmlCanvasElement, HtmlElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebglLoseContext,
};

use crate::camera::PerspectiveCamera;
use crate::scene::{ResourceId, Scene};
use crate::scene_manager::RenderBackend;

const VERTEX_SHADER: &str = r"#version 300 es
in vec3 a_position;
uniform mat4 u_view_projection;
void main() {
    gl_Position = u_view_projection * vec4(a_position, 1.0);
}
";

const FRAGMENT_SHADER: &str = r"#version 300 es
precision mediump float;
uniform vec4 u_color;
out vec4 frag_color;
void main() {
    frag_color = u_color;
}
";

struct Geometry {
    buffer: WebGlBuffer,
    vertex_count: i32,
}

pub struct WebGlBackend {
    canvas: HtmlCanvasElement,
    gl: Gl,
    program: WebGlProgram,
    position_attrib: u32,
    view_projection: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    geometries: HashMap<ResourceId, Geometry>,
    materials: HashMap<ResourceId, [f32; 4]>,
    next_resource: u64,
    pixel_ratio: f64,
}

impl WebGlBackend {
    /// Create a canvas inside `host` and compile the line program.
    pub fn create(document: &Document, host: &HtmlElement) -> Result<Self, JsValue> {
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        let style = canvas.style();
        style.set_property("position", "absolute")?;
        style.set_property("top", "0")?;
        style.set_property("left", "0")?;
        style.set_property("display", "block")?;
        host.append_child(&canvas)?;

        let gl: Gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("webgl2 unavailable"))?
            .dyn_into()?;
        let program = link_program(&gl)?;
        let position = gl.get_attrib_location(&program, "a_position");
        let position_attrib = u32::try_from(position).map_err(|_| JsValue::from_str("a_position not found"))?;
        let view_projection = gl.get_uniform_location(&program, "u_view_projection");
        let color = gl.get_uniform_location(&program, "u_color");

        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);

        let pixel_ratio = web_sys::window().map_or(1.0, |window| window.device_pixel_ratio());
        Ok(Self {
            canvas,
            gl,
            program,
            position_attrib,
            view_projection,
            color,
            geometries: HashMap::new(),
            materials: HashMap::new(),
            next_resource: 0,
            pixel_ratio,
        })
    }

    fn allocate(&mut self) -> ResourceId {
        self.next_resource += 1;
        ResourceId(self.next_resource)
    }
}

impl RenderBackend for WebGlBackend {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn set_size(&mut self, width: f64, height: f64) {
        self.canvas.set_width((width * self.pixel_ratio).round().max(0.0) as u32);
        self.canvas.set_height((height * self.pixel_ratio).round().max(0.0) as u32);
        let style = self.canvas.style();
        for (name, value) in [("width", format!("{width}px")), ("height", format!("{height}px"))] {
            if let Err(err) = style.set_property(name, &value) {
                tracing::warn!(?err, name, "canvas style not applied");
            }
        }
    }

    fn upload_geometry(&mut self, vertices: &[f32]) -> Option<ResourceId> {
        let Some(buffer) = self.gl.create_buffer() else {
            tracing::warn!("webgl buffer allocation failed");
            return None;
        };
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        let data = js_sys::Float32Array::from(vertices);
        self.gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &data, Gl::STATIC_DRAW);
        let vertex_count = i32::try_from(vertices.len() / 3).unwrap_or(i32::MAX);
        let id = self.allocate();
        self.geometries.insert(id, Geometry { buffer, vertex_count });
        Some(id)
    }

    fn create_material(&mut self, color: [f32; 4]) -> Option<ResourceId> {
        let id = self.allocate();
        self.materials.insert(id, color);
        Some(id)
    }

    fn release(&mut self, id: ResourceId) {
        if let Some(geometry) = self.geometries.remove(&id) {
            self.gl.delete_buffer(Some(&geometry.buffer));
        }
        self.materials.remove(&id);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        let Some(view_projection) = camera.view_projection() else {
            return;
        };
        let gl = &self.gl;
        gl.viewport(0, 0, self.canvas.width() as i32, self.canvas.height() as i32);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(Gl::COLOR_BUFFER_BIT);
        gl.use_program(Some(&self.program));
        gl.uniform_matrix4fv_with_f32_array(
            self.view_projection.as_ref(),
            false,
            &view_projection.as_mat4().to_cols_array(),
        );

        for mesh in scene.meshes() {
            let Some(geometry) = self.geometries.get(&mesh.geometry) else {
                continue;
            };
            gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&geometry.buffer));
            gl.vertex_attrib_pointer_with_i32(self.position_attrib, 3, Gl::FLOAT, false, 0, 0);
            gl.enable_vertex_attrib_array(self.position_attrib);
            for material in &mesh.materials {
                let [r, g, b, a] = self.materials.get(&material.resource).copied().unwrap_or(material.color);
                gl.uniform4f(self.color.as_ref(), r, g, b, a);
                gl.draw_arrays(Gl::LINES, 0, geometry.vertex_count);
            }
        }
    }

    fn detach_canvas(&mut self) {
        self.canvas.remove();
    }

    fn lose_context(&mut self) {
        for (_, geometry) in self.geometries.drain() {
            self.gl.delete_buffer(Some(&geometry.buffer));
        }
        self.materials.clear();
        self.gl.delete_program(Some(&self.program));
        match self.gl.get_extension("WEBGL_lose_context") {
            Ok(Some(extension)) => extension.unchecked_into::<WebglLoseContext>().lose_context(),
            Ok(None) => tracing::debug!("WEBGL_lose_context unavailable"),
            Err(err) => tracing::warn!(?err, "WEBGL_lose_context lookup failed"),
        }
    }
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl.create_shader(kind).ok_or_else(|| JsValue::from_str("shader allocation failed"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl.get_shader_parameter(&shader, Gl::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(JsValue::from_str(&format!("shader compile failed: {log}")))
    }
}

fn link_program(gl: &Gl) -> Result<WebGlProgram, JsValue> {
    let vertex = compile_shader(gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
    let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
    let program = gl.create_program().ok_or_else(|| JsValue::from_str("program allocation failed"))?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));
    if gl.get_program_parameter(&program, Gl::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(JsValue::from_str(&format!("program link failed: {log}")))
    }
}
