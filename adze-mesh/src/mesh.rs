use crate::parallel::{Comm, SerialComm, pack_words, unpack_words};
use crate::tags::Tags;
use crate::{DblTag, Entity, EntityType, IntTag, ModelEntity, Point3, Vector3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Observer for entity construction.
///
/// Splitting one element may create a whole closure of entities (a new
/// vertex, edges, faces). Passing a sink down the construction call chain is
/// how a caller collects exactly the entities one `build_element` cascade
/// created, without any global hook.
pub trait BuildSink {
    /// Called once for every newly created entity, in creation order.
    fn created(&mut self, e: Entity);
}

/// Sink that discards creation notices.
#[derive(Debug, Default)]
pub struct IgnoreSink;

impl BuildSink for IgnoreSink {
    fn created(&mut self, _: Entity) {}
}

impl BuildSink for Vec<Entity> {
    fn created(&mut self, e: Entity) { self.push(e); }
}

#[derive(Debug)]
struct EntityRec {
    etype: EntityType,
    model: ModelEntity,
    /// ordered downward vertices
    verts: SmallVec<[Entity; 8]>,
    /// ordered one-dimension-down boundary entities (vertices for edges)
    down: SmallVec<[Entity; 6]>,
    /// unordered immediate upward adjacency
    up: Vec<Entity>,
    alive: bool,
}

#[derive(Clone, Copy, Debug)]
struct VertexData {
    point: Point3,
    param: Vector3,
}

/// A distributed mesh on one peer: entity arenas per dimension, adjacency,
/// tags, geometric classification, and remote-copy bookkeeping.
///
/// Entity iteration order is arena order and is stable as long as no entity
/// is destroyed, which is what the refinement passes rely on within a sweep.
pub struct Mesh {
    dim: usize,
    comm: Arc<dyn Comm>,
    ents: [Vec<EntityRec>; 4],
    verts: Vec<VertexData>,
    tags: Tags,
    remotes: FxHashMap<Entity, Vec<(usize, Entity)>>,
    matches: FxHashMap<Entity, Vec<(usize, Entity)>>,
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("dim", &self.dim)
            .field("counts", &[self.count(0), self.count(1), self.count(2), self.count(3)])
            .finish()
    }
}

const EMPTY: &[(usize, Entity)] = &[];

impl Mesh {
    /// Creates an empty single-peer mesh of the given element dimension.
    pub fn new(dim: usize) -> Self { Self::with_comm(dim, Arc::new(SerialComm)) }

    /// Creates an empty mesh coupled to a peer bus.
    pub fn with_comm(dim: usize, comm: Arc<dyn Comm>) -> Self {
        assert!((1..=3).contains(&dim), "mesh dimension must be 1, 2, or 3");
        Mesh {
            dim,
            comm,
            ents: Default::default(),
            verts: Vec::new(),
            tags: Tags::default(),
            remotes: FxHashMap::default(),
            matches: FxHashMap::default(),
        }
    }

    /// Element dimension of the mesh.
    #[inline(always)]
    pub fn dim(&self) -> usize { self.dim }

    /// The peer bus.
    #[inline(always)]
    pub fn comm(&self) -> &Arc<dyn Comm> { &self.comm }

    /// This peer's rank.
    #[inline(always)]
    pub fn rank(&self) -> usize { self.comm.rank() }

    /// Number of peers hosting parts of the distributed mesh.
    #[inline(always)]
    pub fn peers(&self) -> usize { self.comm.peers() }

    fn rec(&self, e: Entity) -> &EntityRec {
        let rec = &self.ents[e.dim()][e.index()];
        debug_assert!(rec.alive, "access to destroyed entity {e:?}");
        rec
    }

    /// Whether the handle refers to a live entity.
    pub fn is_live(&self, e: Entity) -> bool {
        self.ents[e.dim()].get(e.index()).is_some_and(|r| r.alive)
    }

    /// Topological type of an entity.
    #[inline(always)]
    pub fn entity_type(&self, e: Entity) -> EntityType { self.rec(e).etype }

    /// Geometric model classification of an entity.
    #[inline(always)]
    pub fn model(&self, e: Entity) -> ModelEntity { self.rec(e).model }

    /// Ordered downward vertices of an entity.
    #[inline(always)]
    pub fn verts(&self, e: Entity) -> &[Entity] { &self.rec(e).verts }

    /// Ordered one-dimension-down boundary entities (the vertices of an
    /// edge, the edges of a face, the faces of a region).
    #[inline(always)]
    pub fn boundary(&self, e: Entity) -> &[Entity] { &self.rec(e).down }

    /// Unordered immediate upward adjacency.
    #[inline(always)]
    pub fn up(&self, e: Entity) -> &[Entity] { &self.rec(e).up }

    /// Boundary edges in canonical order. An edge yields itself, so every
    /// entity of dimension >= 1 has an edge tuple aligned with
    /// [`EntityType::edge_verts`].
    pub fn down_edges(&self, e: Entity) -> SmallVec<[Entity; 12]> {
        match e.dim() {
            1 => SmallVec::from_slice(&[e]),
            2 => SmallVec::from_slice(&self.rec(e).down),
            3 => {
                let rec = self.rec(e);
                rec.etype
                    .edge_verts()
                    .iter()
                    .map(|&[a, b]| {
                        self.find_upward(EntityType::Edge, &[rec.verts[a], rec.verts[b]])
                            .expect("region boundary edge missing")
                    })
                    .collect()
            }
            _ => SmallVec::new(),
        }
    }

    /// Iterates live entities of one dimension in stable arena order.
    pub fn iter(&self, dim: usize) -> impl Iterator<Item = Entity> + '_ {
        self.ents[dim]
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive)
            .map(move |(i, _)| Entity::new(dim, i))
    }

    /// Number of live entities of one dimension.
    pub fn count(&self, dim: usize) -> usize {
        self.ents[dim].iter().filter(|r| r.alive).count()
    }

    /// Spatial position of a vertex.
    #[inline(always)]
    pub fn point(&self, v: Entity) -> Point3 {
        debug_assert!(self.rec(v).alive);
        self.verts[v.index()].point
    }

    /// Moves a vertex (snapping hooks use this).
    pub fn set_point(&mut self, v: Entity, point: Point3) {
        debug_assert!(self.rec(v).alive);
        self.verts[v.index()].point = point;
    }

    /// Geometric-model parameter carried by a vertex.
    #[inline(always)]
    pub fn param(&self, v: Entity) -> Vector3 {
        debug_assert!(self.rec(v).alive);
        self.verts[v.index()].param
    }

    /// Replaces the model parameter of a vertex.
    pub fn set_param(&mut self, v: Entity, param: Vector3) {
        debug_assert!(self.rec(v).alive);
        self.verts[v.index()].param = param;
    }

    /// Evaluates the parametric map of an edge at `x` in `[-1, 1]`.
    pub fn edge_point(&self, edge: Entity, x: f64) -> Point3 {
        let &[v0, v1] = self.verts(edge) else {
            panic!("edge_point on a non-edge entity")
        };
        let t = (x + 1.0) / 2.0;
        self.point(v0) + (self.point(v1) - self.point(v0)) * t
    }

    /// Creates an isolated vertex.
    pub fn create_vertex(&mut self, model: ModelEntity, point: Point3, param: Vector3) -> Entity {
        self.build_vertex(model, point, param, &mut IgnoreSink)
    }

    /// Creates a vertex, reporting it to the sink.
    pub fn build_vertex(
        &mut self,
        model: ModelEntity,
        point: Point3,
        param: Vector3,
        sink: &mut dyn BuildSink,
    ) -> Entity {
        let index = self.ents[0].len();
        self.ents[0].push(EntityRec {
            etype: EntityType::Vertex,
            model,
            verts: SmallVec::new(),
            down: SmallVec::new(),
            up: Vec::new(),
            alive: true,
        });
        self.verts.push(VertexData { point, param });
        let v = Entity::new(0, index);
        sink.created(v);
        v
    }

    /// Creates an element (and any missing boundary entities) from ordered
    /// vertices, without observing the construction.
    pub fn create_element(
        &mut self,
        model: ModelEntity,
        etype: EntityType,
        verts: &[Entity],
    ) -> Entity {
        self.build_element(model, etype, verts, &mut IgnoreSink)
    }

    /// Creates an element from ordered vertices, reusing existing downward
    /// entities and creating missing ones; every *newly created* entity is
    /// reported to the sink. Returns the existing entity when one with the
    /// same vertex set is already present.
    pub fn build_element(
        &mut self,
        model: ModelEntity,
        etype: EntityType,
        verts: &[Entity],
        sink: &mut dyn BuildSink,
    ) -> Entity {
        assert_eq!(verts.len(), etype.vertex_count(), "vertex tuple mismatch for {etype:?}");
        if let Some(e) = self.find_upward(etype, verts) {
            return e;
        }
        let down: SmallVec<[Entity; 6]> = match etype.dim() {
            1 => SmallVec::from_slice(verts),
            2 => etype
                .edge_verts()
                .iter()
                .map(|&[a, b]| {
                    self.build_element(model, EntityType::Edge, &[verts[a], verts[b]], sink)
                })
                .collect(),
            3 => etype
                .face_verts()
                .iter()
                .zip(etype.face_types())
                .map(|(fv, &ftype)| {
                    let fverts: SmallVec<[Entity; 4]> = fv.iter().map(|&i| verts[i]).collect();
                    self.build_element(model, ftype, &fverts, sink)
                })
                .collect(),
            _ => panic!("build_element cannot create vertices"),
        };
        let dim = etype.dim();
        let index = self.ents[dim].len();
        let e = Entity::new(dim, index);
        for &b in &down {
            self.ents[b.dim()][b.index()].up.push(e);
        }
        self.ents[dim].push(EntityRec {
            etype,
            model,
            verts: SmallVec::from_slice(verts),
            down,
            up: Vec::new(),
            alive: true,
        });
        sink.created(e);
        e
    }

    fn same_verts(&self, e: Entity, verts: &[Entity]) -> bool {
        let mine = self.rec(e).verts.as_slice();
        mine.len() == verts.len() && {
            let mut a: SmallVec<[Entity; 8]> = SmallVec::from_slice(mine);
            let mut b: SmallVec<[Entity; 8]> = SmallVec::from_slice(verts);
            a.sort_unstable();
            b.sort_unstable();
            a == b
        }
    }

    /// Finds the live entity of the given type spanning exactly this vertex
    /// set, in any orientation.
    pub fn find_upward(&self, etype: EntityType, verts: &[Entity]) -> Option<Entity> {
        debug_assert_eq!(verts.len(), etype.vertex_count());
        let matches = |e: &Entity| self.rec(*e).etype == etype && self.same_verts(*e, verts);
        match etype.dim() {
            1 => self.up(verts[0]).iter().copied().find(|e| matches(e)),
            2 => {
                let edge = self.find_upward(EntityType::Edge, &verts[..2])?;
                self.up(edge).iter().copied().find(|e| matches(e))
            }
            3 => {
                let edge = self.find_upward(EntityType::Edge, &verts[..2])?;
                self.up(edge)
                    .iter()
                    .flat_map(|&f| self.up(f).iter().copied())
                    .find(|e| matches(e))
            }
            _ => None,
        }
    }

    /// Destroys an element and, recursively, every boundary entity left
    /// without upward adjacency.
    pub fn destroy_element(&mut self, e: Entity) {
        assert!(e.dim() > 0, "vertices are destroyed by cascade only");
        debug_assert!(
            self.rec(e).up.is_empty(),
            "destroying {e:?} while upward adjacency remains"
        );
        self.kill(e);
    }

    fn kill(&mut self, e: Entity) {
        let down = std::mem::take(&mut self.ents[e.dim()][e.index()].down);
        self.ents[e.dim()][e.index()].alive = false;
        self.tags.purge(e);
        self.remotes.remove(&e);
        self.matches.remove(&e);
        for &b in &down {
            let up = &mut self.ents[b.dim()][b.index()].up;
            up.retain(|&u| u != e);
            if up.is_empty() {
                self.kill(b);
            }
        }
    }

    // --- tags ------------------------------------------------------------

    /// Creates a named per-entity integer tag.
    pub fn create_int_tag(&mut self, name: &str) -> IntTag { self.tags.create_int(name) }

    /// Creates a named per-entity floating-point tag.
    pub fn create_dbl_tag(&mut self, name: &str) -> DblTag { self.tags.create_dbl(name) }

    /// Destroys an integer tag and all its values.
    pub fn destroy_int_tag(&mut self, tag: IntTag) { self.tags.ints[tag.0] = None; }

    /// Destroys a floating-point tag and all its values.
    pub fn destroy_dbl_tag(&mut self, tag: DblTag) { self.tags.dbls[tag.0] = None; }

    /// Sets an integer tag value on an entity.
    pub fn set_int(&mut self, e: Entity, tag: IntTag, value: i32) {
        self.tags.int_mut(tag).data.insert(e, value);
    }

    /// Reads an integer tag value.
    pub fn int(&self, e: Entity, tag: IntTag) -> Option<i32> {
        self.tags.int(tag).data.get(&e).copied()
    }

    /// Removes an integer tag value from an entity.
    pub fn remove_int(&mut self, e: Entity, tag: IntTag) {
        self.tags.int_mut(tag).data.remove(&e);
    }

    /// Sets a floating-point tag value on an entity.
    pub fn set_dbl(&mut self, e: Entity, tag: DblTag, value: f64) {
        self.tags.dbl_mut(tag).data.insert(e, value);
    }

    /// Reads a floating-point tag value.
    pub fn dbl(&self, e: Entity, tag: DblTag) -> Option<f64> {
        self.tags.dbl(tag).data.get(&e).copied()
    }

    /// Removes a floating-point tag value from an entity.
    pub fn remove_dbl(&mut self, e: Entity, tag: DblTag) {
        self.tags.dbl_mut(tag).data.remove(&e);
    }

    /// Number of entities carrying a value of the given tag.
    pub fn dbl_tag_count(&self, tag: DblTag) -> usize { self.tags.dbl(tag).data.len() }

    /// Name an integer tag was created with.
    pub fn int_tag_name(&self, tag: IntTag) -> &str { &self.tags.int(tag).name }

    /// Name a floating-point tag was created with.
    pub fn dbl_tag_name(&self, tag: DblTag) -> &str { &self.tags.dbl(tag).name }

    // --- sharing ----------------------------------------------------------

    /// Remote copies of an entity: `(peer, handle-on-that-peer)` pairs.
    pub fn remotes(&self, e: Entity) -> &[(usize, Entity)] {
        self.remotes.get(&e).map_or(EMPTY, Vec::as_slice)
    }

    /// Whether any other peer holds a copy of this entity.
    #[inline]
    pub fn is_shared(&self, e: Entity) -> bool { !self.remotes(e).is_empty() }

    /// Registers a remote copy, replacing a stale handle for the same peer.
    pub fn add_remote(&mut self, e: Entity, peer: usize, handle: Entity) {
        let list = self.remotes.entry(e).or_default();
        match list.iter_mut().find(|(p, _)| *p == peer) {
            Some(slot) => slot.1 = handle,
            None => list.push((peer, handle)),
        }
    }

    /// Periodic matches of an entity: `(peer, handle)` pairs; the peer may
    /// be this one for a same-part periodic pairing.
    pub fn matches_of(&self, e: Entity) -> &[(usize, Entity)] {
        self.matches.get(&e).map_or(EMPTY, Vec::as_slice)
    }

    /// Registers a periodic match.
    pub fn add_match(&mut self, e: Entity, peer: usize, handle: Entity) {
        let list = self.matches.entry(e).or_default();
        if !list.contains(&(peer, handle)) {
            list.push((peer, handle));
        }
    }

    /// Re-derives remote copies for entities whose downward vertices are all
    /// shared with some peer but which have no remote copy there yet, which
    /// is the state new child entities are in right after their split
    /// vertices have been linked. Collective.
    pub fn stitch(&mut self) {
        let peers = self.comm.peers();
        if peers == 1 {
            return;
        }
        let rank = self.comm.rank();
        let mut out = vec![Vec::<u64>::new(); peers];
        for dim in 1..self.dim {
            for e in self.iter(dim) {
                for q in self.candidate_peers(e) {
                    debug_assert_ne!(q, rank);
                    let words = &mut out[q];
                    words.push(self.rec(e).etype as u64);
                    for &v in self.verts(e) {
                        let (_, handle) = self.remotes(v)
                            .iter()
                            .copied()
                            .find(|&(p, _)| p == q)
                            .expect("candidate peer shares every vertex");
                        words.push(handle.to_word());
                    }
                    words.push(e.to_word());
                }
            }
        }
        let incoming = self
            .comm
            .exchange(out.iter().map(|w| pack_words(w)).collect());
        for (src, message) in incoming.iter().enumerate() {
            let words = unpack_words(message);
            let mut at = 0;
            while at < words.len() {
                let etype = etype_from_code(words[at]);
                let nv = etype.vertex_count();
                let verts: SmallVec<[Entity; 8]> = words[at + 1..at + 1 + nv]
                    .iter()
                    .map(|&w| Entity::from_word(w))
                    .collect();
                let handle = Entity::from_word(words[at + 1 + nv]);
                at += nv + 2;
                if let Some(local) = self.find_upward(etype, &verts) {
                    if !self.remotes(local).iter().any(|&(p, _)| p == src) {
                        self.add_remote(local, src, handle);
                    }
                }
            }
        }
        log::debug!("stitched shared adjacency on peer {rank}");
    }

    /// Peers holding copies of every downward vertex of `e` while `e` itself
    /// has no remote copy there.
    fn candidate_peers(&self, e: Entity) -> Vec<usize> {
        let vs = self.verts(e);
        let mut candidates: Vec<usize> = self.remotes(vs[0]).iter().map(|&(p, _)| p).collect();
        for &v in &vs[1..] {
            candidates.retain(|&q| self.remotes(v).iter().any(|&(p, _)| p == q));
            if candidates.is_empty() {
                break;
            }
        }
        candidates.retain(|&q| !self.remotes(e).iter().any(|&(p, _)| p == q));
        candidates
    }
}

fn etype_from_code(code: u64) -> EntityType {
    use EntityType::*;
    match code {
        0 => Vertex,
        1 => Edge,
        2 => Tri,
        3 => Quad,
        4 => Tet,
        5 => Hex,
        6 => Prism,
        7 => Pyramid,
        _ => panic!("bad entity type code {code} in bus message"),
    }
}
