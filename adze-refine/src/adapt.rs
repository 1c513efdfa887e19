use crate::hooks::{LayerHook, Snapper};
use crate::options::AdaptOptions;
use crate::size_field::SizeField;
use crate::transfer::{ShapeHandler, SolutionTransfer};
use adze_mesh::{Entity, IntTag, Mesh};

/// The edge (or, transiently during propagation, the face/region) is
/// selected for splitting.
pub(crate) const SPLIT: i32 = 1 << 0;
/// The size field looked at the edge and declined.
pub(crate) const DONT_SPLIT: i32 = 1 << 1;

/// Everything one refinement sweep borrows: the mesh, the oracles, the
/// options, and the optional external hooks. `Adapt` owns only its flag tag;
/// the entity graph belongs to the mesh substrate, the refinement buffers to
/// [`Refine`](crate::Refine).
pub struct Adapt<'a> {
    /// the mesh being refined
    pub mesh: &'a mut Mesh,
    /// decides which edges split and where
    pub size_field: &'a mut dyn SizeField,
    /// keeps solution fields defined across the sweep
    pub solution: &'a mut dyn SolutionTransfer,
    /// keeps element shape data defined across the sweep
    pub shape: &'a mut dyn ShapeHandler,
    /// recognized sweep options
    pub options: AdaptOptions,
    /// boundary-layer coordination hook
    pub layer: Option<Box<dyn LayerHook + 'a>>,
    /// post-sweep boundary snapping hook
    pub snapper: Option<Box<dyn Snapper + 'a>>,
    flags_tag: IntTag,
}

impl std::fmt::Debug for Adapt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapt")
            .field("mesh", &self.mesh)
            .field("options", &self.options)
            .finish()
    }
}

impl<'a> Adapt<'a> {
    /// Borrows the collaborators of a sweep and creates the flag tag.
    pub fn new(
        mesh: &'a mut Mesh,
        size_field: &'a mut dyn SizeField,
        solution: &'a mut dyn SolutionTransfer,
        shape: &'a mut dyn ShapeHandler,
        options: AdaptOptions,
    ) -> Self {
        let flags_tag = mesh.create_int_tag("adze_flags");
        Adapt {
            mesh,
            size_field,
            solution,
            shape,
            options,
            layer: None,
            snapper: None,
            flags_tag,
        }
    }

    /// Destroys the flag tag. Call when no further sweeps will run on this
    /// mesh.
    pub fn finish(self) { self.mesh.destroy_int_tag(self.flags_tag); }

    pub(crate) fn get_flag(&self, e: Entity, flag: i32) -> bool {
        self.mesh.int(e, self.flags_tag).unwrap_or(0) & flag != 0
    }

    pub(crate) fn set_flag(&mut self, e: Entity, flag: i32) {
        let flags = self.mesh.int(e, self.flags_tag).unwrap_or(0);
        self.mesh.set_int(e, self.flags_tag, flags | flag);
    }

    pub(crate) fn clear_flag(&mut self, e: Entity, flag: i32) {
        let flags = self.mesh.int(e, self.flags_tag).unwrap_or(0);
        self.mesh.set_int(e, self.flags_tag, flags & !flag);
    }
}
