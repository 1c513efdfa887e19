//! The refinement sweep: dense indexing of everything that splits, split
//! vertices, template dispatch, transfer, teardown.

use crate::adapt::{Adapt, SPLIT};
use crate::errors::{Error, Result};
use crate::{link, marking, matching, templates, transfer};
use adze_mesh::{BuildSink, DblTag, Entity, EntityType, IgnoreSink, IntTag, Mesh, Point3, Vector3};
use cgmath::EuclideanSpace;
use std::time::Instant;

/// State of one refinement sweep: the dense per-dimension lists of entities
/// to split, the children each split produced, and the two tags tying
/// entities to their dense indices and split vertices to their edge
/// parameters.
///
/// The buffers live for one sweep; the tags live as long as the `Refine`
/// itself (release them with [`Refine::destroy`]).
#[derive(Debug)]
pub struct Refine {
    number_tag: IntTag,
    place_tag: DblTag,
    to_split: [Vec<Entity>; 4],
    new_entities: [Vec<Vec<Entity>>; 4],
    should_collect: [bool; 4],
}

impl Refine {
    /// Creates the sweep state and its tags on the mesh.
    pub fn new(a: &mut Adapt<'_>) -> Self {
        Refine {
            number_tag: a.mesh.create_int_tag("adze_refine_number"),
            place_tag: a.mesh.create_dbl_tag("adze_refine_xi"),
            to_split: Default::default(),
            new_entities: Default::default(),
            should_collect: [false; 4],
        }
    }

    /// Releases the tags.
    pub fn destroy(self, a: &mut Adapt<'_>) {
        a.mesh.destroy_int_tag(self.number_tag);
        a.mesh.destroy_dbl_tag(self.place_tag);
    }

    /// Tag key of the dense index stamped on every entity in `to_split`.
    pub fn number_tag(&self) -> IntTag { self.number_tag }

    /// Tag key of the placement parameter carried by each new mid-edge
    /// vertex until the sweep's cleanup.
    pub fn place_tag(&self) -> DblTag { self.place_tag }

    /// Entities of dimension `dim` selected for splitting, densely indexed.
    pub fn to_split(&self, dim: usize) -> &[Entity] { &self.to_split[dim] }

    /// Children recorded per split entity of dimension `dim`; parallel to
    /// [`Refine::to_split`], populated only for collected dimensions.
    pub fn new_entities(&self, dim: usize) -> &[Vec<Entity>] { &self.new_entities[dim] }

    /// Runs one refinement sweep over the mesh borrowed by `a`. Returns
    /// whether any edge split; `false` means the mesh was left untouched.
    ///
    /// Collective: every peer must call this, and a fatal invariant
    /// violation on any peer aborts the job, since a half-split mesh cannot
    /// be repaired.
    pub fn refine(&mut self, a: &mut Adapt<'_>) -> Result<bool> {
        let start = Instant::now();
        let count = marking::mark_edges_to_split(a)?;
        if count == 0 {
            return Ok(false);
        }
        assert!(
            marking::check_flag_consistency(a, 1, SPLIT),
            "peers disagree on which shared edges split"
        );
        self.add_all_marked_edges(a);
        self.reset_collection();
        self.collect_for_transfer(a);
        self.collect_for_matching(a);
        if let Some(mut layer) = a.layer.take() {
            layer.collect(&mut self.should_collect);
            a.layer = Some(layer);
        }
        self.split_elements(a)?;
        self.process_new_elements(a);
        if let Some(mut layer) = a.layer.take() {
            layer.flag_new_entities(a.mesh, self);
            a.layer = Some(layer);
        }
        self.destroy_split_elements(a);
        self.clean_split_verts(a);
        if let Some(mut snapper) = a.snapper.take() {
            snapper.snap(a.mesh);
            a.snapper = Some(snapper);
        }
        self.forget_new_entities();
        log::info!(
            "refined {} edges in {:.6} seconds",
            count,
            start.elapsed().as_secs_f64()
        );
        Ok(true)
    }

    // --- propagation and dense indexing -----------------------------------

    /// Two passes over the marked edges: the first sizes the dense arrays,
    /// the second fills them and stamps each entity with its index. During
    /// the first pass the SPLIT flag doubles as the visited marker on faces
    /// and regions; the second pass clears it there, leaving the flag
    /// meaning "must bisect" on edges only.
    fn add_all_marked_edges(&mut self, a: &mut Adapt<'_>) {
        let edges: Vec<Entity> = a.mesh.iter(1).collect();
        let mut counts = [0usize; 4];
        for &e in &edges {
            if a.get_flag(e, SPLIT) {
                Self::add_edge_pre_allocation(a, e, &mut counts);
            }
        }
        for d in 1..=3 {
            self.to_split[d] = Vec::with_capacity(counts[d]);
        }
        for &e in &edges {
            if a.get_flag(e, SPLIT) {
                self.add_edge_post_allocation(a, e);
            }
        }
        for d in 1..=3 {
            debug_assert_eq!(self.to_split[d].len(), counts[d]);
        }
    }

    fn add_edge_pre_allocation(a: &mut Adapt<'_>, e: Entity, counts: &mut [usize; 4]) {
        counts[1] += 1;
        for f in a.mesh.up(e).to_vec() {
            if !a.get_flag(f, SPLIT) {
                a.set_flag(f, SPLIT);
                counts[2] += 1;
                for r in a.mesh.up(f).to_vec() {
                    if !a.get_flag(r, SPLIT) {
                        a.set_flag(r, SPLIT);
                        counts[3] += 1;
                    }
                }
            }
        }
    }

    fn add_edge_post_allocation(&mut self, a: &mut Adapt<'_>, e: Entity) {
        self.number(a, e, 1);
        for f in a.mesh.up(e).to_vec() {
            if a.get_flag(f, SPLIT) {
                a.clear_flag(f, SPLIT);
                self.number(a, f, 2);
                for r in a.mesh.up(f).to_vec() {
                    if a.get_flag(r, SPLIT) {
                        a.clear_flag(r, SPLIT);
                        self.number(a, r, 3);
                    }
                }
            }
        }
    }

    fn number(&mut self, a: &mut Adapt<'_>, e: Entity, dim: usize) {
        a.mesh.set_int(e, self.number_tag, self.to_split[dim].len() as i32);
        self.to_split[dim].push(e);
    }

    // --- collection --------------------------------------------------------

    /// Edges are always collected: their recorded children are how split
    /// vertices are found.
    fn reset_collection(&mut self) { self.should_collect = [false, true, false, false]; }

    fn collect_for_transfer(&mut self, a: &Adapt<'_>) {
        let td = a
            .solution
            .transfer_dimension()
            .min(a.shape.transfer_dimension())
            .min(a.size_field.transfer_dimension());
        for d in td..=a.mesh.dim() {
            self.should_collect[d] = true;
        }
    }

    fn collect_for_matching(&mut self, a: &Adapt<'_>) {
        if a.options.should_handle_matching {
            for d in 1..a.mesh.dim() {
                self.should_collect[d] = true;
            }
        }
    }

    // --- split vertices ----------------------------------------------------

    /// Creates the mid-edge vertex: placed where the size field says, on the
    /// edge's model entity, with interpolated model parameters when
    /// parametric transfer is on, and with all per-vertex fields defined by
    /// the oracles.
    pub(crate) fn make_split_vert(
        &self,
        a: &mut Adapt<'_>,
        edge: Entity,
        sink: &mut dyn BuildSink,
    ) -> Result<Entity> {
        let place = a.size_field.place_split(a.mesh, edge);
        if !(0.0..=1.0).contains(&place) {
            return Err(Error::PlaceOutOfRange(place));
        }
        // placement is [0,1], the edge parameter runs [-1,1]
        let x = place * 2.0 - 1.0;
        let xi = Vector3::new(x, 0.0, 0.0);
        let point = a.mesh.edge_point(edge, x);
        let param = match a.options.should_transfer_parametric {
            true => transfer::parametric_on_edge_split(a.mesh, edge, place),
            false => Vector3::new(0.0, 0.0, 0.0),
        };
        let model = a.mesh.model(edge);
        let vert = a.mesh.build_vertex(model, point, param, sink);
        a.mesh.set_dbl(vert, self.place_tag, place);
        a.size_field.interpolate(a.mesh, edge, xi, vert);
        a.solution.on_vertex(a.mesh, edge, xi, vert);
        Ok(vert)
    }

    /// Creates the centroid vertex a fully split quad needs, at the mean of
    /// the corner positions and parameters.
    pub(crate) fn make_centroid_vert(
        &self,
        a: &mut Adapt<'_>,
        face: Entity,
        sink: &mut dyn BuildSink,
    ) -> Entity {
        let corners = a.mesh.verts(face).to_vec();
        let n = corners.len() as f64;
        let point = corners
            .iter()
            .fold(Vector3::new(0.0, 0.0, 0.0), |acc, &v| acc + a.mesh.point(v).to_vec())
            / n;
        let param = match a.options.should_transfer_parametric {
            true => {
                corners
                    .iter()
                    .fold(Vector3::new(0.0, 0.0, 0.0), |acc, &v| acc + a.mesh.param(v))
                    / n
            }
            false => Vector3::new(0.0, 0.0, 0.0),
        };
        let model = a.mesh.model(face);
        let vert = a.mesh.build_vertex(model, Point3::from_vec(point), param, sink);
        let xi = Vector3::new(0.0, 0.0, 0.0);
        a.size_field.interpolate(a.mesh, face, xi, vert);
        a.solution.on_vertex(a.mesh, face, xi, vert);
        vert
    }

    /// The lone vertex among the children recorded for split entity `id` of
    /// dimension `dim`, if that dimension was collected and the split made
    /// one.
    pub fn find_split_vert(&self, mesh: &Mesh, dim: usize, id: usize) -> Option<Entity> {
        self.new_entities[dim]
            .get(id)?
            .iter()
            .copied()
            .find(|&e| mesh.entity_type(e) == EntityType::Vertex)
    }

    /// Split vertex of a split parent, located through its dense index.
    pub fn split_vert(&self, mesh: &Mesh, parent: Entity) -> Option<Entity> {
        let id = mesh.int(parent, self.number_tag)? as usize;
        self.find_split_vert(mesh, parent.dim(), id)
    }

    /// Split vertex of the edge spanning two vertices; panics if no such
    /// edge was split. Templates reach their mid-edge vertices this way.
    pub(crate) fn split_vert_between(&self, mesh: &Mesh, v0: Entity, v1: Entity) -> Entity {
        mesh.find_upward(EntityType::Edge, &[v0, v1])
            .and_then(|edge| self.split_vert(mesh, edge))
            .expect("no split vertex between endpoints")
    }

    /// Split vertex of the edge spanning `v0` and `v1`, together with its
    /// placement parameter measured from `v0`. The stored parameter runs
    /// from the edge's own first vertex, so it flips when the caller's
    /// order is the reverse of the edge's.
    pub fn find_placed_split_vert(
        &self,
        mesh: &Mesh,
        v0: Entity,
        v1: Entity,
    ) -> Option<(Entity, f64)> {
        let edge = mesh.find_upward(EntityType::Edge, &[v0, v1])?;
        let vert = self.split_vert(mesh, edge)?;
        let mut place = mesh.dbl(vert, self.place_tag)?;
        if mesh.verts(edge)[0] != v0 {
            place = 1.0 - place;
        }
        Some((vert, place))
    }

    // --- splitting ---------------------------------------------------------

    /// Splits everything in `to_split`, low dimension first, recording
    /// children per parent for each collected dimension.
    fn split_elements(&mut self, a: &mut Adapt<'_>) -> Result<()> {
        for d in 1..=a.mesh.dim() {
            let collect = self.should_collect[d];
            let parents = self.to_split[d].clone();
            if collect {
                self.new_entities[d] = Vec::with_capacity(parents.len());
            }
            for e in parents {
                let mut created = Vec::new();
                match collect {
                    true => templates::split_element(self, a, e, &mut created)?,
                    false => templates::split_element(self, a, e, &mut IgnoreSink)?,
                }
                if collect {
                    self.new_entities[d].push(created);
                }
            }
        }
        Ok(())
    }

    /// Links split vertices across peers, restitches shared adjacency,
    /// propagates matches, and runs the transfers, in that order: transfer
    /// may read cross-peer adjacency, so linking must already be done.
    fn process_new_elements(&mut self, a: &mut Adapt<'_>) {
        link::link_new_verts(self, a);
        if a.mesh.peers() > 1 {
            a.mesh.stitch();
        }
        if a.options.should_handle_matching {
            matching::match_new_elements(self, a);
        }
        self.transfer_elements(a);
    }

    /// Invokes the transfers on every split parent of each dimension at or
    /// above the transfer's own threshold, solution first, then shape; the
    /// two are assumed independent.
    fn transfer_elements(&mut self, a: &mut Adapt<'_>) {
        let dim = a.mesh.dim();
        for d in a.solution.transfer_dimension()..=dim {
            for i in 0..self.to_split[d].len() {
                a.solution
                    .on_refine(a.mesh, self.to_split[d][i], &self.new_entities[d][i]);
            }
        }
        for d in a.shape.transfer_dimension()..=dim {
            for i in 0..self.to_split[d].len() {
                a.shape
                    .on_refine(a.mesh, self.to_split[d][i], &self.new_entities[d][i]);
            }
        }
    }

    // --- teardown ----------------------------------------------------------

    /// Destroys every old top-dimensional element; boundary entities no
    /// longer referenced cascade away with them.
    fn destroy_split_elements(&mut self, a: &mut Adapt<'_>) {
        let dim = a.mesh.dim();
        for e in self.to_split[dim].clone() {
            a.mesh.destroy_element(e);
        }
        for d in 1..=dim {
            self.to_split[d].clear();
        }
    }

    /// Only new mid-edge vertices carry the placement tag; strip it.
    fn clean_split_verts(&mut self, a: &mut Adapt<'_>) {
        for i in 0..self.new_entities[1].len() {
            if let Some(vert) = self.find_split_vert(a.mesh, 1, i) {
                a.mesh.remove_dbl(vert, self.place_tag);
            }
        }
    }

    fn forget_new_entities(&mut self) {
        for d in 0..=3 {
            self.new_entities[d].clear();
        }
    }

    /// Post-sweep teardown for drivers sequencing the phases themselves.
    pub fn cleanup_after(&mut self, a: &mut Adapt<'_>) {
        self.clean_split_verts(a);
        self.forget_new_entities();
    }
}
