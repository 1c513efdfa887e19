#![allow(dead_code)]

use adze_mesh::*;
use adze_refine::*;

pub fn vert(mesh: &mut Mesh, model: ModelEntity, x: f64, y: f64, z: f64) -> Entity {
    mesh.create_vertex(model, Point3::new(x, y, z), Vector3::new(0.0, 0.0, 0.0))
}

/// One triangle classified on model face 0.
pub fn tri_mesh(points: [[f64; 3]; 3]) -> (Mesh, Vec<Entity>, Entity) {
    let mut mesh = Mesh::new(2);
    let surface = ModelEntity::new(2, 0);
    let v: Vec<_> = points
        .iter()
        .map(|&[x, y, z]| vert(&mut mesh, surface, x, y, z))
        .collect();
    let tri = mesh.create_element(surface, EntityType::Tri, &v);
    (mesh, v, tri)
}

/// The positively oriented reference tetrahedron.
pub fn tet_mesh() -> (Mesh, Vec<Entity>, Entity) {
    let mut mesh = Mesh::new(3);
    let region = ModelEntity::new(3, 0);
    let v = vec![
        vert(&mut mesh, region, 0.0, 0.0, 0.0),
        vert(&mut mesh, region, 1.0, 0.0, 0.0),
        vert(&mut mesh, region, 0.0, 1.0, 0.0),
        vert(&mut mesh, region, 0.0, 0.0, 1.0),
    ];
    let tet = mesh.create_element(region, EntityType::Tet, &v);
    (mesh, v, tet)
}

/// Size field splitting a fixed set of edges at a fixed parameter.
pub struct MarkEdges {
    pub edges: Vec<Entity>,
    pub place: f64,
}

impl MarkEdges {
    pub fn at_midpoints(edges: Vec<Entity>) -> Self { MarkEdges { edges, place: 0.5 } }
}

impl SizeField for MarkEdges {
    fn should_split(&mut self, _: &Mesh, edge: Entity) -> bool { self.edges.contains(&edge) }
    fn place_split(&mut self, _: &Mesh, _: Entity) -> f64 { self.place }
}

/// Size field splitting nothing.
pub struct MarkNothing;

impl SizeField for MarkNothing {
    fn should_split(&mut self, _: &Mesh, _: Entity) -> bool { false }
}

pub fn run(mesh: &mut Mesh, size: &mut dyn SizeField) -> Result<bool> {
    run_sweep(mesh, size, AdaptOptions::default(), None)
}

pub fn run_uniform(mesh: &mut Mesh) -> Result<bool> {
    run_sweep(mesh, &mut UniformSizeField, AdaptOptions::default(), None)
}

/// Runs one sweep with the given options and an optional layer hook (the
/// hook is how tests probe sweep state between splitting and teardown).
pub fn run_sweep(
    mesh: &mut Mesh,
    size: &mut dyn SizeField,
    options: AdaptOptions,
    hook: Option<Box<dyn LayerHook>>,
) -> Result<bool> {
    let mut solution = NullTransfer;
    let mut shape = NullShape;
    let mut adapt = Adapt::new(mesh, size, &mut solution, &mut shape, options);
    adapt.layer = hook;
    let mut refine = Refine::new(&mut adapt);
    let did = refine.refine(&mut adapt);
    if did.is_ok() {
        assert_eq!(mesh_place_count(&adapt, &refine), 0, "placement tags must not survive");
    }
    refine.destroy(&mut adapt);
    adapt.finish();
    did
}

fn mesh_place_count(adapt: &Adapt<'_>, refine: &Refine) -> usize {
    adapt.mesh.dbl_tag_count(refine.place_tag())
}

/// Signed area (doubled) of a face lying in the z = 0 plane.
pub fn tri_area2(mesh: &Mesh, face: Entity) -> f64 {
    let p: Vec<Point3> = mesh.verts(face).iter().map(|&v| mesh.point(v)).collect();
    (p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[2].x - p[0].x) * (p[1].y - p[0].y)
}

/// Signed volume (times six) of a tetrahedral region.
pub fn tet_volume6(mesh: &Mesh, region: Entity) -> f64 {
    let p: Vec<Point3> = mesh.verts(region).iter().map(|&v| mesh.point(v)).collect();
    let u = p[1] - p[0];
    let v = p[2] - p[0];
    let w = p[3] - p[0];
    u.x * (v.y * w.z - v.z * w.y) - u.y * (v.x * w.z - v.z * w.x) + u.z * (v.x * w.y - v.y * w.x)
}

pub fn find_vertex_at(mesh: &Mesh, x: f64, y: f64, z: f64) -> Option<Entity> {
    let target = Point3::new(x, y, z);
    mesh.iter(0).find(|&v| {
        let p = mesh.point(v);
        (p.x - target.x).abs() < 1e-12
            && (p.y - target.y).abs() < 1e-12
            && (p.z - target.z).abs() < 1e-12
    })
}

/// Live faces whose vertex tuple is a permutation of the given set.
pub fn face_with_verts(mesh: &Mesh, mut want: Vec<Entity>) -> Option<Entity> {
    want.sort_unstable();
    mesh.iter(2).find(|&f| {
        let mut have: Vec<Entity> = mesh.verts(f).to_vec();
        have.sort_unstable();
        have == want
    })
}
