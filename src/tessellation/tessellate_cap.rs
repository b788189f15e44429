//! Generic cap tessellation: constrained Delaunay triangulation of a
//! polygon with holes, followed by greedy pairing into quads.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};
use tracing::{debug, trace, warn};

use crate::cancel::CancellationToken;
use crate::error::{Result, TessellationError};
use crate::geometry::Polygon2D;
use crate::math::distance_2d::point_to_loop_dist;
use crate::math::polygon_2d::subdivide_loop;
use crate::math::{lift, Point2};
use crate::mesh::{Quad, Triangle};
use crate::options::MesherOptions;
use crate::spatial::SpatialPolygonIndex;

use super::quad_pairing::QuadPairing;
use super::CapFacing;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Interior lattice points closer than this fraction of the target length to
/// a boundary are skipped.
const INTERIOR_CLEARANCE: f64 = 0.5;

/// Counters describing one cap tessellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapStats {
    pub paired_quads: usize,
    pub emitted_triangles: usize,
    pub dropped_triangles: usize,
    pub rejected_pairings: usize,
    pub low_quality_rejections: usize,
}

/// Faces of one tessellated cap, already lifted and oriented.
#[derive(Debug, Clone, Default)]
pub struct CapMesh {
    pub quads: Vec<Quad>,
    pub triangles: Vec<Triangle>,
    pub stats: CapStats,
}

/// Tessellates an arbitrary polygon with holes into a quad-dominant cap.
pub struct CapTessellator<'a> {
    outer: &'a Polygon2D,
    holes: &'a [Polygon2D],
    options: &'a MesherOptions,
}

impl<'a> CapTessellator<'a> {
    /// Creates a new `CapTessellator`.
    #[must_use]
    pub fn new(outer: &'a Polygon2D, holes: &'a [Polygon2D], options: &'a MesherOptions) -> Self {
        Self {
            outer,
            holes,
            options,
        }
    }

    /// Tessellates the cap at elevation `z`.
    ///
    /// Boundary loops are subdivided at the XY target length exactly as side
    /// faces are, so caps and walls share their seam vertices.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::Failed`] if the triangulation rejects a
    /// point or a boundary constraint, and
    /// [`MesherError::Cancelled`](crate::MesherError::Cancelled) if `cancel`
    /// fires.
    pub fn execute(&self, z: f64, facing: CapFacing, cancel: &CancellationToken) -> Result<CapMesh> {
        let target = self.options.target_edge_length_xy();
        let outer_loop = subdivide_loop(self.outer.points(), target);
        let hole_loops: Vec<Vec<Point2>> = self
            .holes
            .iter()
            .map(|h| subdivide_loop(h.points(), target))
            .collect();

        let mut cdt = Cdt::new();
        insert_constraint_loop(&mut cdt, &outer_loop)?;
        for hole in &hole_loops {
            insert_constraint_loop(&mut cdt, hole)?;
        }
        cancel.check()?;

        if self.options.cap_interior_points() {
            let inserted = self.insert_interior_points(&mut cdt, &outer_loop, &hole_loops, cancel)?;
            trace!(inserted, "inserted interior cap points");
        }

        let interior = classify_interior_faces(&cdt);
        cancel.check()?;

        let positions: Vec<Point2> = cdt
            .vertices()
            .map(|v| {
                let p = v.position();
                Point2::new(p.x, p.y)
            })
            .collect();
        let triangles: Vec<[usize; 3]> = cdt
            .inner_faces()
            .filter(|f| interior.contains(&f.fix().index()))
            .map(|f| f.vertices().map(|v| v.fix().index()))
            .collect();

        let outcome =
            QuadPairing::new(&positions, &triangles, self.options.min_cap_quad_quality()).execute();
        cancel.check()?;

        let mut mesh = CapMesh {
            quads: Vec::with_capacity(outcome.quads.len()),
            triangles: Vec::new(),
            stats: CapStats {
                paired_quads: outcome.quads.len(),
                rejected_pairings: outcome.rejected_pairings,
                low_quality_rejections: outcome.low_quality,
                ..CapStats::default()
            },
        };

        for paired in &outcome.quads {
            let vertices = paired.indices.map(|i| lift(&positions[i], z));
            mesh.quads
                .push(facing.orient_quad(Quad::scored(vertices, paired.quality)));
        }

        if self.options.emit_rejected_triangles() {
            mesh.triangles = outcome
                .leftover
                .iter()
                .map(|&t| {
                    let tri = Triangle::new(triangles[t].map(|i| lift(&positions[i], z)));
                    facing.orient_triangle(tri)
                })
                .collect();
            mesh.stats.emitted_triangles = mesh.triangles.len();
        } else if !outcome.leftover.is_empty() {
            mesh.stats.dropped_triangles = outcome.leftover.len();
            warn!(
                dropped = outcome.leftover.len(),
                z, "unpaired cap triangles dropped; cap surface is open"
            );
        }

        debug!(
            z,
            triangles = triangles.len(),
            quads = mesh.stats.paired_quads,
            leftover = outcome.leftover.len(),
            "tessellated cap"
        );
        Ok(mesh)
    }

    /// Inserts a square lattice of interior points at the target spacing.
    ///
    /// Points inside a hole, outside the outer loop, or within half a target
    /// length of any boundary are skipped.
    fn insert_interior_points(
        &self,
        cdt: &mut Cdt,
        outer_loop: &[Point2],
        hole_loops: &[Vec<Point2>],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let target = self.options.target_edge_length_xy();
        let clearance = INTERIOR_CLEARANCE * target;
        let resolution = self.options.index_resolution();
        let outer_index = SpatialPolygonIndex::with_resolution(self.outer, resolution);
        let hole_indices: Vec<SpatialPolygonIndex> = self
            .holes
            .iter()
            .map(|h| SpatialPolygonIndex::with_resolution(h, resolution))
            .collect();

        let bounds = self.outer.bounds();
        let columns = (bounds.width() / target).floor() as usize;
        let rows = (bounds.height() / target).floor() as usize;

        let mut inserted = 0;
        for row in 1..=rows {
            cancel.check()?;
            let y = bounds.min.y + target * row as f64;
            for column in 1..=columns {
                let p = Point2::new(bounds.min.x + target * column as f64, y);
                if !outer_index.is_inside(&p) || hole_indices.iter().any(|h| h.is_inside(&p)) {
                    continue;
                }
                if point_to_loop_dist(&p, outer_loop) < clearance
                    || hole_loops
                        .iter()
                        .any(|h| point_to_loop_dist(&p, h) < clearance)
                {
                    continue;
                }
                cdt.insert(SpadePoint2::new(p.x, p.y))
                    .map_err(|e: InsertionError| {
                        TessellationError::Failed(format!("CDT insert: {e}"))
                    })?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

/// Inserts a closed loop and constrains each of its edges.
fn insert_constraint_loop(cdt: &mut Cdt, points: &[Point2]) -> Result<()> {
    if points.len() < 3 {
        return Err(
            TessellationError::Failed("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let mut handles = Vec::with_capacity(points.len());
    for p in points {
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(TessellationError::Failed(format!(
                "boundary edge {i} crosses an existing constraint"
            ))
            .into());
        }
        cdt.add_constraint(from, to);
    }

    Ok(())
}

/// Returns the indices of inner faces that lie inside the constrained region.
///
/// Faces bordering the unbounded face start at depth 0 (or 1 across a
/// constraint); each constraint crossed during the breadth-first walk adds
/// one. Odd depth means interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();
    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        let Some(inner) = edge.rev().face().as_inner() else {
            continue;
        };
        let idx = inner.fix().index();
        if depth_map.contains_key(&idx) {
            continue;
        }
        let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
        depth_map.insert(idx, depth);
        if depth % 2 == 1 {
            interior.insert(idx);
        }
        queue.push_back((inner.fix(), depth));
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        for edge in cdt.face(face_fix).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let next = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(n_idx, next);
            if next % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), next));
        }
    }

    interior
}
