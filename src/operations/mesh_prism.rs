use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, debug_span, info, warn};

use crate::cancel::CancellationToken;
use crate::error::{MesherError, MeshingStage, Result};
use crate::geometry::{Bounds2, PrismStructure};
use crate::mesh::{ImmutableMesh, Quad, Segment3};
use crate::options::MesherOptions;
use crate::spatial::SpatialPolygonIndex;
use crate::tessellation::{
    AdaptiveGridBuilder, CapFacing, CapMesh, CapStats, CapTessellator, LoopFacing, SideFaces,
    ZLevelBuilder,
};

/// How the footprint caps are tessellated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapStrategy {
    /// Axis-aligned rectangular footprint meshed on an adaptive grid.
    AdaptiveGrid(Bounds2),
    /// Any other footprint: constrained triangulation plus quad pairing.
    Generic,
}

impl CapStrategy {
    /// Picks the strategy for a structure's footprint.
    #[must_use]
    pub fn select(structure: &PrismStructure, options: &MesherOptions) -> Self {
        structure
            .footprint()
            .axis_aligned_rectangle(options.epsilon())
            .map_or(Self::Generic, Self::AdaptiveGrid)
    }
}

/// Counters gathered during one meshing run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshingStats {
    pub side_quads: usize,
    pub cap_quads: usize,
    pub internal_surface_quads: usize,
    pub triangles: usize,
    pub rejected_pairings: usize,
    pub low_quality_rejections: usize,
    pub dropped_triangles: usize,
    /// `None` when both caps are disabled.
    pub cap_strategy: Option<CapStrategy>,
}

impl MeshingStats {
    /// Total quads of every kind.
    #[must_use]
    pub fn total_quads(&self) -> usize {
        self.side_quads + self.cap_quads + self.internal_surface_quads
    }

    fn absorb(&mut self, cap: &CapStats) {
        self.triangles += cap.emitted_triangles;
        self.rejected_pairings += cap.rejected_pairings;
        self.low_quality_rejections += cap.low_quality_rejections;
        self.dropped_triangles += cap.dropped_triangles;
    }
}

/// Result of a successful meshing run.
#[derive(Debug, Clone)]
pub struct PrismMeshOutput {
    pub mesh: ImmutableMesh,
    pub z_levels: Vec<f64>,
    pub stats: MeshingStats,
}

/// Meshes a prism structure into a quad-dominant surface.
///
/// Runs validation, Z-level construction, side faces, caps, internal
/// surfaces and auxiliary geometry in that order. The cancellation token is
/// checked before every stage and inside the per-loop work of each stage.
pub struct MeshPrism<'a> {
    structure: &'a PrismStructure,
    options: &'a MesherOptions,
}

impl<'a> MeshPrism<'a> {
    /// Creates a new `MeshPrism` operation.
    #[must_use]
    pub fn new(structure: &'a PrismStructure, options: &'a MesherOptions) -> Self {
        Self { structure, options }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// - [`MesherError::Validation`] if the options or the structure are
    ///   invalid; no geometry is generated in that case.
    /// - [`MesherError::Processing`] if a later stage fails or panics.
    /// - [`MesherError::Cancelled`] if `cancel` fires.
    pub fn execute(&self, cancel: &CancellationToken) -> Result<PrismMeshOutput> {
        let structure = self.structure;
        let options = self.options;

        cancel.check()?;
        {
            let _span = debug_span!("stage", stage = %MeshingStage::Validate).entered();
            options.validate()?;
            structure.validate()?;
        }

        let z_levels = run_stage(MeshingStage::BuildZLevels, cancel, || {
            ZLevelBuilder::new(structure, options.target_edge_length_z(), options.epsilon())
                .execute(cancel)
        })?;

        let mut stats = MeshingStats::default();

        let sides = run_stage(MeshingStage::GenerateSides, cancel, || {
            self.side_quads(&z_levels, cancel)
        })?;
        stats.side_quads = sides.len();
        let mut mesh = ImmutableMesh::new().with_quads(sides);

        let caps = run_stage(MeshingStage::GenerateCaps, cancel, || {
            self.caps(&z_levels, cancel)
        })?;
        if let Some((strategy, caps)) = caps {
            stats.cap_strategy = Some(strategy);
            stats.cap_quads = caps.quads.len();
            stats.absorb(&caps.stats);
            mesh = mesh.with_quads(caps.quads).with_triangles(caps.triangles);
        }

        let internal = run_stage(MeshingStage::GenerateInternalSurfaces, cancel, || {
            self.internal_surfaces(cancel)
        })?;
        stats.internal_surface_quads = internal.quads.len();
        stats.absorb(&internal.stats);
        mesh = mesh
            .with_quads(internal.quads)
            .with_triangles(internal.triangles);

        let mesh = run_stage(MeshingStage::Accumulate, cancel, || {
            Ok(self.accumulate(&mesh))
        })?;

        info!(
            quads = stats.total_quads(),
            triangles = stats.triangles,
            z_levels = z_levels.len(),
            "prism meshed"
        );
        Ok(PrismMeshOutput {
            mesh,
            z_levels,
            stats,
        })
    }

    fn side_quads(&self, z_levels: &[f64], cancel: &CancellationToken) -> Result<Vec<Quad>> {
        let target = self.options.target_edge_length_xy();
        let mut quads =
            SideFaces::new(self.structure.footprint().points(), LoopFacing::Outward, target)
                .execute(z_levels);
        for hole in self.structure.holes() {
            cancel.check()?;
            quads.extend(SideFaces::new(hole.points(), LoopFacing::Inward, target).execute(z_levels));
        }
        debug!(count = quads.len(), "generated side quads");
        Ok(quads)
    }

    fn caps(
        &self,
        z_levels: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Option<(CapStrategy, CapMesh)>> {
        let structure = self.structure;
        let options = self.options;
        let mut wanted = Vec::with_capacity(2);
        if options.generate_bottom_cap() {
            wanted.push((z_levels.first().copied(), CapFacing::Down));
        }
        if options.generate_top_cap() {
            wanted.push((z_levels.last().copied(), CapFacing::Up));
        }
        if wanted.is_empty() {
            debug!("caps disabled");
            return Ok(None);
        }

        let strategy = CapStrategy::select(structure, options);
        debug!(?strategy, "selected cap strategy");
        let mut out = CapMesh::default();

        match strategy {
            CapStrategy::AdaptiveGrid(domain) => {
                let builder = AdaptiveGridBuilder::new(domain, structure, options);
                let grid = builder.build_grid(cancel)?;
                let hole_indices: Vec<SpatialPolygonIndex> = structure
                    .holes()
                    .iter()
                    .map(|h| SpatialPolygonIndex::with_resolution(h, options.index_resolution()))
                    .collect();
                for (z, facing) in wanted {
                    let Some(z) = z else { continue };
                    out.quads
                        .extend(builder.cap_quads(&grid, &hole_indices, z, facing, cancel)?);
                }
            }
            CapStrategy::Generic => {
                let tessellator =
                    CapTessellator::new(structure.footprint(), structure.holes(), options);
                for (z, facing) in wanted {
                    let Some(z) = z else { continue };
                    merge_cap(&mut out, tessellator.execute(z, facing, cancel)?);
                }
            }
        }

        debug!(quads = out.quads.len(), triangles = out.triangles.len(), "generated caps");
        Ok(Some((strategy, out)))
    }

    fn internal_surfaces(&self, cancel: &CancellationToken) -> Result<CapMesh> {
        let mut out = CapMesh::default();
        for surface in self.structure.internal_surfaces() {
            cancel.check()?;
            let cap = CapTessellator::new(&surface.outer, &surface.holes, self.options).execute(
                surface.elevation,
                CapFacing::Up,
                cancel,
            )?;
            merge_cap(&mut out, cap);
        }
        Ok(out)
    }

    fn accumulate(&self, mesh: &ImmutableMesh) -> ImmutableMesh {
        let structure = self.structure;
        let segments: Vec<Segment3> = structure
            .segments()
            .iter()
            .copied()
            .chain(
                structure
                    .constraint_segments()
                    .iter()
                    .map(|s| s.to_segment3()),
            )
            .collect();
        mesh.with_points(structure.points().iter().copied())
            .with_segments(segments)
    }
}

fn merge_cap(into: &mut CapMesh, cap: CapMesh) {
    into.quads.extend(cap.quads);
    into.triangles.extend(cap.triangles);
    let (a, b) = (&mut into.stats, cap.stats);
    a.paired_quads += b.paired_quads;
    a.emitted_triangles += b.emitted_triangles;
    a.dropped_triangles += b.dropped_triangles;
    a.rejected_pairings += b.rejected_pairings;
    a.low_quality_rejections += b.low_quality_rejections;
}

/// Runs one stage, normalizing its failures and panics to
/// [`MesherError::Processing`]. Cancellation passes through unchanged.
fn run_stage<T>(
    stage: MeshingStage,
    cancel: &CancellationToken,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    cancel.check()?;
    let _span = debug_span!("stage", stage = %stage).entered();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(MesherError::Cancelled)) => {
            warn!(stage = stage.code(), "meshing cancelled");
            Err(MesherError::Cancelled)
        }
        Ok(Err(err)) => Err(MesherError::Processing {
            stage,
            message: err.to_string(),
        }),
        Err(payload) => Err(MesherError::Processing {
            stage,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{TessellationError, ValidationError};
    use crate::geometry::{ConstraintSegment, InternalSurface, Polygon2D};
    use crate::math::{Point2, Point3};
    use crate::mesh::{IndexedMesh, MeshAdjacency};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon2D {
        Polygon2D::new(vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
        .unwrap()
    }

    fn octagon(radius: f64) -> Polygon2D {
        let pts = (0..8)
            .map(|i| {
                let a = f64::from(i) * std::f64::consts::FRAC_PI_4 + 0.3;
                Point2::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        Polygon2D::new(pts).unwrap()
    }

    fn mesh(structure: &PrismStructure, options: &MesherOptions) -> PrismMeshOutput {
        MeshPrism::new(structure, options)
            .execute(&CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn unit_cube() {
        let s = PrismStructure::new(rect(0.0, 0.0, 1.0, 1.0), 0.0, 1.0).unwrap();
        let options = MesherOptions::default().with_target_edge_lengths(1.0, 1.0);
        let out = mesh(&s, &options);
        assert_eq!(out.mesh.quads().len(), 6);
        assert_eq!(out.z_levels, vec![0.0, 1.0]);
        let indexed = IndexedMesh::from_mesh(&out.mesh, options.epsilon());
        assert_eq!(indexed.vertices.len(), 8);
        assert!(MeshAdjacency::new(&indexed).execute().is_closed());
    }

    #[test]
    fn rectangle_quad_count() {
        let s = PrismStructure::new(rect(0.0, 0.0, 20.0, 10.0), -5.0, 5.0).unwrap();
        let options = MesherOptions::default().with_target_edge_lengths(2.0, 2.0);
        let out = mesh(&s, &options);
        let quads = out.mesh.quads().len();
        assert!(quads > 200 && quads < 300, "{quads}");
        assert_eq!(out.stats.side_quads, 150);
        assert_eq!(out.stats.cap_quads, 100);
        assert!(matches!(
            out.stats.cap_strategy,
            Some(CapStrategy::AdaptiveGrid(_))
        ));
    }

    #[test]
    fn caps_are_flat_and_sides_unscored() {
        let s = PrismStructure::new(rect(0.0, 0.0, 3.0, 2.0), 0.5, 2.5).unwrap();
        let out = mesh(&s, &MesherOptions::default());
        let (scored, unscored): (Vec<&Quad>, Vec<&Quad>) =
            out.mesh.quads().iter().partition(|q| q.quality.is_some());
        assert_eq!(unscored.len(), out.stats.side_quads);
        for q in scored {
            let z = q.vertices[0].z;
            assert!(q.vertices.iter().all(|v| v.z == z));
            assert!(z == 0.5 || z == 2.5);
            assert!((0.0..=1.0).contains(&q.quality.unwrap()));
        }
    }

    #[test]
    fn octagon_is_manifold() {
        let s = PrismStructure::new(octagon(5.0), 0.0, 3.0).unwrap();
        let options = MesherOptions::default();
        let out = mesh(&s, &options);
        assert_eq!(out.stats.cap_strategy, Some(CapStrategy::Generic));
        let indexed = IndexedMesh::from_mesh(&out.mesh, options.epsilon());
        let report = MeshAdjacency::new(&indexed).execute();
        assert_eq!(report.non_manifold_edges, 0);
        assert_eq!(report.boundary_edges, 0);
    }

    #[test]
    fn invalid_options_fail_before_geometry() {
        let s = PrismStructure::new(rect(0.0, 0.0, 1.0, 1.0), 0.0, 1.0).unwrap();
        let options = MesherOptions::default().with_target_edge_length_xy(-1.0);
        let err = MeshPrism::new(&s, &options)
            .execute(&CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            MesherError::Validation(ValidationError::NonPositiveLength { .. })
        ));
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn hole_adds_inward_sides_and_carves_caps() {
        let s = PrismStructure::new(rect(0.0, 0.0, 10.0, 10.0), 0.0, 1.0)
            .unwrap()
            .with_hole(rect(4.0, 4.0, 6.0, 6.0));
        let out = mesh(&s, &MesherOptions::default());
        // 40 outer spans + 8 hole spans, one level pair.
        assert_eq!(out.stats.side_quads, 48);
        assert_eq!(out.stats.cap_quads, 2 * (100 - 4));
    }

    #[test]
    fn internal_surface_meshed_at_its_elevation() {
        let s = PrismStructure::new(rect(0.0, 0.0, 4.0, 4.0), 0.0, 2.0)
            .unwrap()
            .with_internal_surface(InternalSurface::new(rect(1.0, 1.0, 3.0, 3.0), 1.25));
        let out = mesh(&s, &MesherOptions::default());
        assert!(out.z_levels.contains(&1.25));
        assert!(out.stats.internal_surface_quads > 0);
        let at_level = out
            .mesh
            .quads()
            .iter()
            .filter(|q| q.vertices.iter().all(|v| v.z == 1.25))
            .count();
        assert_eq!(at_level, out.stats.internal_surface_quads);
    }

    #[test]
    fn auxiliary_geometry_is_accumulated() {
        let s = PrismStructure::new(rect(0.0, 0.0, 4.0, 4.0), 0.0, 2.0)
            .unwrap()
            .with_point(Point3::new(1.0, 1.0, 0.7))
            .with_segment(Segment3::new(
                Point3::new(1.0, 1.0, 0.5),
                Point3::new(2.0, 2.0, 0.5),
            ))
            .with_constraint_segment(ConstraintSegment::new(
                Point2::new(0.5, 0.5),
                Point2::new(3.5, 0.5),
                1.5,
            ));
        let out = mesh(&s, &MesherOptions::default());
        assert_eq!(out.mesh.points(), &[Point3::new(1.0, 1.0, 0.7)]);
        assert_eq!(out.mesh.segments().len(), 2);
        assert_eq!(out.mesh.segments()[1].start.z, 1.5);
        for z in [0.7, 0.5, 1.5] {
            assert!(out.z_levels.contains(&z));
        }
    }

    #[test]
    fn caps_can_be_disabled() {
        let s = PrismStructure::new(rect(0.0, 0.0, 2.0, 2.0), 0.0, 1.0).unwrap();
        let options = MesherOptions::default().with_caps(false, false);
        let out = mesh(&s, &options);
        assert_eq!(out.stats.cap_quads, 0);
        assert_eq!(out.stats.cap_strategy, None);
        assert!(out.mesh.quads().iter().all(|q| q.quality.is_none()));

        let top_only = mesh(&s, &MesherOptions::default().with_caps(false, true));
        assert_eq!(top_only.stats.cap_quads, 4);
        assert!(top_only
            .mesh
            .quads()
            .iter()
            .filter(|q| q.quality.is_some())
            .all(|q| q.vertices[0].z == 1.0));
    }

    #[test]
    fn cancellation_is_reported() {
        let s = PrismStructure::new(rect(0.0, 0.0, 2.0, 2.0), 0.0, 1.0).unwrap();
        let options = MesherOptions::default();
        let token = CancellationToken::new();
        token.cancel();
        let err = MeshPrism::new(&s, &options).execute(&token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn stage_errors_are_tagged() {
        let token = CancellationToken::new();
        let err = run_stage(MeshingStage::GenerateCaps, &token, || -> Result<()> {
            Err(TessellationError::Failed("bad constraint".into()).into())
        })
        .unwrap_err();
        assert_eq!(err.stage(), Some(MeshingStage::GenerateCaps));
        assert!(err.to_string().contains("bad constraint"));

        let err = run_stage(MeshingStage::GenerateSides, &token, || -> Result<()> {
            Err(MesherError::Cancelled)
        })
        .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn stage_panics_are_tagged() {
        let token = CancellationToken::new();
        let err = run_stage(MeshingStage::Accumulate, &token, || -> Result<()> {
            panic!("exploded")
        })
        .unwrap_err();
        assert_eq!(err.stage(), Some(MeshingStage::Accumulate));
        assert!(err.to_string().contains("exploded"));
    }
}
