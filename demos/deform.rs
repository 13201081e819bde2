//! Interactive lattice deformation viewer.
//!
//! ```text
//! cargo run --example deform --features viewer -- [mesh.obj] [config.json]
//! ```
//!
//! Hover to pick a control point, drag with the left button to move it.
//! `r` resets the lattice, `s` and `l` save and load it, `c` toggles face
//! culling and `z` toggles wireframe. Escape quits.

use cagewarp::{
    DeformSession, InputEvent, LatticeView, RenderTarget, SessionConfig, ShapeView, TriMesh,
};
use three_d::{
    Camera, ClearState, ColorMaterial, Context, CpuMaterial, CpuMesh, CpuTexture, Cull, Event,
    FrameOutput, Gm, Indices, InnerSpace, InstancedMesh, Instances, Key, Mat4, Mesh, MouseButton,
    Positions, Quat, Srgba, TextureData, Vec3, Window, WindowSettings, vec2, vec3,
};

const POINT_RADIUS: f32 = 0.02;
const EDGE_RADIUS: f32 = 0.004;
const CHECKER_SIZE: u32 = 256;
const CHECKER_CELLS: u32 = 8;

/// Checkerboard that makes the deformation visible on meshes with texture
/// coordinates.
fn checker_texture() -> CpuTexture {
    let cell = CHECKER_SIZE / CHECKER_CELLS;
    let data = (0..CHECKER_SIZE * CHECKER_SIZE)
        .map(|i| {
            let (x, y) = (i % CHECKER_SIZE, i / CHECKER_SIZE);
            if (x / cell + y / cell) % 2 == 0 {
                [235, 200, 150, 255]
            } else {
                [150, 90, 60, 255]
            }
        })
        .collect();
    CpuTexture {
        data: TextureData::RgbaU8(data),
        width: CHECKER_SIZE,
        height: CHECKER_SIZE,
        ..Default::default()
    }
}

fn edge_transform(a: Vec3, b: Vec3) -> Option<Mat4> {
    let ev = b - a;
    let length = ev.magnitude();
    if length < 1e-6 {
        return None;
    }
    Some(
        Mat4::from_translation(a)
            * Into::<Mat4>::into(Quat::from_arc(vec3(1.0, 0.0, 0.0), ev / length, None))
            * Mat4::from_nonuniform_scale(length, 1.0, 1.0),
    )
}

/// Builds GPU objects from what the session hands over each time the scene
/// changes.
struct Scene {
    context: Context,
    sphere: CpuMesh,
    cylinder: CpuMesh,
    checker: CpuTexture,
    points: Option<Gm<InstancedMesh, ColorMaterial>>,
    selected: Option<Gm<InstancedMesh, ColorMaterial>>,
    grid: Option<Gm<InstancedMesh, ColorMaterial>>,
    shape: Option<Gm<Mesh, ColorMaterial>>,
    wires: Option<Gm<InstancedMesh, ColorMaterial>>,
}

impl Scene {
    fn new(context: &Context) -> Self {
        let mut sphere = CpuMesh::sphere(8);
        sphere.transform(&Mat4::from_scale(POINT_RADIUS)).unwrap();
        let mut cylinder = CpuMesh::cylinder(10);
        cylinder
            .transform(&Mat4::from_nonuniform_scale(1.0, EDGE_RADIUS, EDGE_RADIUS))
            .unwrap();
        Scene {
            context: context.clone(),
            sphere,
            cylinder,
            checker: checker_texture(),
            points: None,
            selected: None,
            grid: None,
            shape: None,
            wires: None,
        }
    }

    fn material(&self, color: Srgba) -> ColorMaterial {
        ColorMaterial::new_opaque(
            &self.context,
            &CpuMaterial {
                albedo: color,
                ..Default::default()
            },
        )
    }

    fn instanced(
        &self,
        transformations: Vec<Mat4>,
        shape: &CpuMesh,
        color: Srgba,
    ) -> Gm<InstancedMesh, ColorMaterial> {
        Gm::new(
            InstancedMesh::new(
                &self.context,
                &Instances {
                    transformations,
                    ..Default::default()
                },
                shape,
            ),
            self.material(color),
        )
    }

    fn objects(&self) -> impl Iterator<Item = &dyn three_d::Object> {
        self.grid
            .iter()
            .flat_map(|g| g.into_iter())
            .chain(self.points.iter().flat_map(|g| g.into_iter()))
            .chain(self.selected.iter().flat_map(|g| g.into_iter()))
            .chain(self.shape.iter().flat_map(|g| g.into_iter()))
            .chain(self.wires.iter().flat_map(|g| g.into_iter()))
    }
}

impl RenderTarget for Scene {
    fn draw_lattice(&mut self, lattice: &LatticeView) {
        // Slightly in front of the shape.
        let at = |i: usize| {
            let p = lattice.points[i];
            vec3(p.x, p.y, 0.01)
        };
        let (rows, cols) = (lattice.dims.rows(), lattice.dims.cols());
        let n = lattice.points.len();
        let mut edges = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let i = row * cols + col;
                if col + 1 < cols && i + 1 < n {
                    edges.extend(edge_transform(at(i), at(i + 1)));
                }
                if row + 1 < rows && i + cols < n {
                    edges.extend(edge_transform(at(i), at(i + cols)));
                }
            }
        }
        let points = (0..n).map(|i| Mat4::from_translation(at(i))).collect();
        self.grid = Some(self.instanced(edges, &self.cylinder, Srgba::new_opaque(60, 60, 60)));
        self.points = Some(self.instanced(points, &self.sphere, Srgba::new_opaque(90, 90, 90)));
        self.selected = lattice.selected.map(|p| {
            self.instanced(
                vec![Mat4::from_translation(vec3(p.x, p.y, 0.02)) * Mat4::from_scale(1.8)],
                &self.sphere,
                Srgba::new_opaque(220, 50, 50),
            )
        });
    }

    fn draw_shape(&mut self, shape: &ShapeView) {
        let positions: Vec<Vec3> = shape
            .positions
            .chunks_exact(3)
            .map(|p| vec3(p[0], p[1], p[2]))
            .collect();
        if shape.modes.wireframe() {
            let edges = shape
                .indices
                .chunks_exact(3)
                .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
                .filter_map(|(a, b)| {
                    edge_transform(positions[a as usize], positions[b as usize])
                })
                .collect();
            self.wires = Some(self.instanced(edges, &self.cylinder, Srgba::new_opaque(40, 90, 200)));
            self.shape = None;
            return;
        }
        let uvs: Option<Vec<three_d::Vec2>> = shape
            .texcoords
            .map(|t| t.chunks_exact(2).map(|uv| vec2(uv[0], uv[1])).collect());
        let mut material = match uvs {
            Some(_) => ColorMaterial::new_opaque(
                &self.context,
                &CpuMaterial {
                    albedo: Srgba::WHITE,
                    albedo_texture: Some(self.checker.clone()),
                    ..Default::default()
                },
            ),
            None => self.material(Srgba::new_opaque(200, 160, 110)),
        };
        let cpumesh = CpuMesh {
            positions: Positions::F32(positions),
            indices: Indices::U32(shape.indices.to_vec()),
            uvs,
            ..Default::default()
        };
        if shape.modes.cull_faces() {
            material.render_states.cull = Cull::Back;
        }
        self.shape = Some(Gm::new(Mesh::new(&self.context, &cpumesh), material));
        self.wires = None;
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let mut args = std::env::args().skip(1);
    let mesh = match args.next() {
        Some(path) => TriMesh::load_obj(path).expect("Cannot load mesh"),
        None => TriMesh::grid([-0.9, -0.6], [0.9, 0.6], 36, 24).expect("Cannot create mesh"),
    };
    let config = match args.next() {
        Some(path) => SessionConfig::from_path(path).expect("Cannot read config"),
        None => SessionConfig::default(),
    };
    let mut session = DeformSession::new(config, mesh).expect("Cannot create session");
    // Window and context.
    let window = Window::new(WindowSettings {
        title: "Lattice deformation".to_string(),
        min_size: (512, 256),
        ..Default::default()
    })
    .unwrap();
    let context = window.gl();
    let extent = session.view().extent;
    let mut camera = Camera::new_orthographic(
        window.viewport(),
        vec3(0.0, 0.0, 1.0),
        vec3(0.0, 0.0, 0.0),
        vec3(0.0, 1.0, 0.0),
        2.0 * extent,
        0.1,
        10.0,
    );
    let mut scene = Scene::new(&context);
    session.render(&mut scene);
    let mut pressed = false;
    // Render loop.
    window.render_loop(move |frame_input| {
        let mut redraw = frame_input.first_frame;
        redraw |= camera.set_viewport(frame_input.viewport);
        let mut inputs = Vec::new();
        for event in frame_input.events.iter() {
            match event {
                Event::MousePress {
                    button: MouseButton::Left,
                    ..
                } => pressed = true,
                Event::MouseRelease {
                    button: MouseButton::Left,
                    ..
                } => pressed = false,
                Event::MouseMotion { position, .. } => {
                    let p = camera.position_at_pixel(*position);
                    inputs.push(InputEvent::PointerMoved {
                        position: glam::vec2(p.x, p.y),
                        pressed,
                    });
                }
                Event::Text(text) => inputs.extend(text.chars().map(InputEvent::Key)),
                Event::KeyPress {
                    kind: Key::Escape, ..
                } => {
                    return FrameOutput {
                        exit: true,
                        ..Default::default()
                    };
                }
                _ => {}
            }
        }
        for input in inputs {
            match session.handle(input) {
                Ok(changed) => redraw |= changed,
                Err(e) => tracing::warn!(error = %e, "input not applied"),
            }
        }
        if redraw {
            session.render(&mut scene);
            frame_input
                .screen()
                .clear(ClearState::color_and_depth(1.0, 1.0, 1.0, 1.0, 1.0))
                .render(&camera, scene.objects(), &[]);
        }
        FrameOutput {
            swap_buffers: redraw,
            ..Default::default()
        }
    });
}
