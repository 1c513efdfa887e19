mod common;

use adze_mesh::*;
use adze_refine::*;
use common::*;
use std::cell::RefCell;
use std::rc::Rc;

fn edge_between(mesh: &Mesh, v0: Entity, v1: Entity) -> Entity {
    mesh.find_upward(EntityType::Edge, &[v0, v1]).unwrap()
}

fn assert_positive_partition(mesh: &Mesh, expected_volume6: f64) {
    let regions: Vec<Entity> = mesh.iter(3).collect();
    let total: f64 = regions.iter().map(|&r| tet_volume6(mesh, r)).sum();
    assert!((total - expected_volume6).abs() < 1e-12, "children must fill the parent");
    for r in regions {
        assert!(tet_volume6(mesh, r) > 0.0, "inverted child region");
    }
}

/// Every interior face of a conforming mesh bounds exactly two regions.
fn assert_conforming(mesh: &Mesh) {
    for f in mesh.iter(2) {
        assert!(matches!(mesh.up(f).len(), 1 | 2), "non-manifold face");
    }
}

#[test]
fn one_marked_edge_bisects_the_tet() {
    let (mut mesh, v, tet) = tet_mesh();
    let marked = edge_between(&mesh, v[0], v[1]);
    let mut size = MarkEdges::at_midpoints(vec![marked]);
    assert!(run(&mut mesh, &mut size).unwrap());

    assert!(!mesh.is_live(tet));
    assert_eq!(mesh.count(3), 2);
    assert_eq!(mesh.count(0), 5);
    assert_positive_partition(&mesh, 1.0);
    assert_conforming(&mesh);
}

/// Two adjacent marked edges: propagation reaches the three faces touching
/// either edge plus the region, the split face's children cone to the apex,
/// and the transfer sees the region exactly once.
#[test]
fn two_adjacent_marked_edges_split_by_the_face_template() {
    let (mut mesh, v, tet) = tet_mesh();
    let e01 = edge_between(&mesh, v[0], v[1]);
    let e12 = edge_between(&mesh, v[1], v[2]);

    let counts = Rc::new(RefCell::new((0usize, 0usize, 0usize)));
    struct Probe {
        counts: Rc<RefCell<(usize, usize, usize)>>,
    }
    impl LayerHook for Probe {
        fn flag_new_entities(&mut self, _: &mut Mesh, r: &Refine) {
            *self.counts.borrow_mut() =
                (r.to_split(1).len(), r.to_split(2).len(), r.to_split(3).len());
        }
    }

    /// Records, per on_refine call, the parent and how many of the reported
    /// children are regions (the collected set also carries interior faces).
    struct RegionRecorder {
        seen: Vec<(Entity, usize)>,
    }
    impl SolutionTransfer for RegionRecorder {
        fn transfer_dimension(&self) -> usize { 3 }
        fn on_refine(&mut self, mesh: &mut Mesh, parent: Entity, children: &[Entity]) {
            let tets = children
                .iter()
                .filter(|&&c| mesh.entity_type(c) == EntityType::Tet)
                .count();
            self.seen.push((parent, tets));
        }
    }

    let mut size = MarkEdges::at_midpoints(vec![e01, e12]);
    let mut solution = RegionRecorder { seen: Vec::new() };
    let mut shape = NullShape;
    let mut adapt = Adapt::new(&mut mesh, &mut size, &mut solution, &mut shape, AdaptOptions::default());
    adapt.layer = Some(Box::new(Probe { counts: counts.clone() }));
    let mut refine = Refine::new(&mut adapt);
    assert!(refine.refine(&mut adapt).unwrap());
    refine.destroy(&mut adapt);
    adapt.finish();

    assert_eq!(*counts.borrow(), (2, 3, 1));
    assert_eq!(solution.seen, vec![(tet, 3)]);
    assert_eq!(mesh.count(3), 3);
    assert_positive_partition(&mesh, 1.0);
    assert_conforming(&mesh);
}

#[test]
fn two_opposite_marked_edges_make_four_tets() {
    let (mut mesh, v, _) = tet_mesh();
    let e01 = edge_between(&mesh, v[0], v[1]);
    let e23 = edge_between(&mesh, v[2], v[3]);
    let mut size = MarkEdges::at_midpoints(vec![e01, e23]);
    assert!(run(&mut mesh, &mut size).unwrap());

    assert_eq!(mesh.count(3), 4);
    assert_eq!(mesh.count(0), 6);
    assert_positive_partition(&mesh, 1.0);
    assert_conforming(&mesh);
}

#[test]
fn face_triple_cones_to_the_apex() {
    let (mut mesh, v, _) = tet_mesh();
    let marked = vec![
        edge_between(&mesh, v[0], v[1]),
        edge_between(&mesh, v[1], v[2]),
        edge_between(&mesh, v[2], v[0]),
    ];
    let mut size = MarkEdges::at_midpoints(marked);
    assert!(run(&mut mesh, &mut size).unwrap());

    assert_eq!(mesh.count(3), 4);
    assert_positive_partition(&mesh, 1.0);
    assert_conforming(&mesh);
}

#[test]
fn uniform_tet_split_yields_eight_children() {
    let (mut mesh, _, _) = tet_mesh();
    assert!(run_uniform(&mut mesh).unwrap());

    assert_eq!(mesh.count(0), 10);
    assert_eq!(mesh.count(3), 8);
    assert_positive_partition(&mesh, 1.0);
    assert_conforming(&mesh);
}

/// A vertex star of three marked edges has no bisection template; mark
/// completion promotes the tet to the uniform pattern.
#[test]
fn star_pattern_promotes_to_uniform() {
    let (mut mesh, v, _) = tet_mesh();
    let marked = vec![
        edge_between(&mesh, v[0], v[1]),
        edge_between(&mesh, v[0], v[2]),
        edge_between(&mesh, v[0], v[3]),
    ];
    let mut size = MarkEdges::at_midpoints(marked);
    assert!(run(&mut mesh, &mut size).unwrap());

    assert_eq!(mesh.count(0), 10);
    assert_eq!(mesh.count(3), 8);
    assert_positive_partition(&mesh, 1.0);
}

#[test]
fn path_pattern_promotes_to_uniform() {
    let (mut mesh, v, _) = tet_mesh();
    let marked = vec![
        edge_between(&mesh, v[0], v[1]),
        edge_between(&mesh, v[1], v[2]),
        edge_between(&mesh, v[2], v[3]),
    ];
    let mut size = MarkEdges::at_midpoints(marked);
    assert!(run(&mut mesh, &mut size).unwrap());

    assert_eq!(mesh.count(3), 8);
    assert_positive_partition(&mesh, 1.0);
}

/// Completion ripples: promoting one tet to uniform marks the shared face's
/// edges, which the neighbor then sees.
#[test]
fn completion_propagates_through_a_shared_face() {
    let mut mesh = Mesh::new(3);
    let region = ModelEntity::new(3, 0);
    let v = [
        vert(&mut mesh, region, 0.0, 0.0, 0.0),
        vert(&mut mesh, region, 1.0, 0.0, 0.0),
        vert(&mut mesh, region, 0.0, 1.0, 0.0),
        vert(&mut mesh, region, 0.0, 0.0, 1.0),
        vert(&mut mesh, region, 0.4, 0.4, -1.0),
    ];
    let upper = mesh.create_element(region, EntityType::Tet, &[v[0], v[1], v[2], v[3]]);
    let lower = mesh.create_element(region, EntityType::Tet, &[v[1], v[0], v[2], v[4]]);
    let volume = tet_volume6(&mesh, upper) + tet_volume6(&mesh, lower);
    // a star at v0 of the upper tet, promoted to uniform, marks all edges of
    // the shared face v0-v1-v2
    let marked = vec![
        edge_between(&mesh, v[0], v[1]),
        edge_between(&mesh, v[0], v[2]),
        edge_between(&mesh, v[0], v[3]),
    ];
    let mut size = MarkEdges::at_midpoints(marked);
    assert!(run(&mut mesh, &mut size).unwrap());

    // upper: uniform (8 children); lower: face triple (4 children)
    assert_eq!(mesh.count(3), 12);
    let total: f64 = mesh.iter(3).map(|r| tet_volume6(&mesh, r)).sum();
    assert!((total - volume).abs() < 1e-12);
    assert_conforming(&mesh);
}

#[test]
fn two_tets_conform_across_a_shared_split_edge() {
    let mut mesh = Mesh::new(3);
    let region = ModelEntity::new(3, 0);
    let v = [
        vert(&mut mesh, region, 0.0, 0.0, 0.0),
        vert(&mut mesh, region, 1.0, 0.0, 0.0),
        vert(&mut mesh, region, 0.0, 1.0, 0.0),
        vert(&mut mesh, region, 0.0, 0.0, 1.0),
        vert(&mut mesh, region, 0.4, 0.4, -1.0),
    ];
    mesh.create_element(region, EntityType::Tet, &[v[0], v[1], v[2], v[3]]);
    mesh.create_element(region, EntityType::Tet, &[v[1], v[0], v[2], v[4]]);
    let marked = edge_between(&mesh, v[0], v[1]);
    let mut size = MarkEdges::at_midpoints(vec![marked]);
    assert!(run(&mut mesh, &mut size).unwrap());

    assert_eq!(mesh.count(3), 4);
    assert_eq!(mesh.count(0), 6);
    assert_conforming(&mesh);
    // the split vertex bounds children of both old tets
    let sv = find_vertex_at(&mesh, 0.5, 0.0, 0.0).unwrap();
    let incident = mesh.iter(3).filter(|&r| mesh.verts(r).contains(&sv)).count();
    assert_eq!(incident, 4);
}

#[test]
fn prisms_cannot_be_refined() {
    let mut mesh = Mesh::new(3);
    let region = ModelEntity::new(3, 0);
    let v = [
        vert(&mut mesh, region, 0.0, 0.0, 0.0),
        vert(&mut mesh, region, 1.0, 0.0, 0.0),
        vert(&mut mesh, region, 0.0, 1.0, 0.0),
        vert(&mut mesh, region, 0.0, 0.0, 1.0),
        vert(&mut mesh, region, 1.0, 0.0, 1.0),
        vert(&mut mesh, region, 0.0, 1.0, 1.0),
    ];
    mesh.create_element(region, EntityType::Prism, &v);
    let marked = edge_between(&mesh, v[0], v[1]);
    let mut size = MarkEdges::at_midpoints(vec![marked]);
    assert_eq!(
        run(&mut mesh, &mut size),
        Err(Error::UnsupportedElement(EntityType::Prism))
    );
}
