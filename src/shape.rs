use log::debug;

use crate::geometry::{Contour, Shape};

/// How the sub-paths of one vector path are split into solids and holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Solid fill: sub-paths wound like the first one are solids, opposite
    /// windings cut holes into the smallest solid around them.
    Solid,
    /// Line art: nesting depth decides, regardless of winding. Even depth is
    /// solid, odd depth is a hole in its parent.
    EvenOdd,
}

/// Groups closed sub-paths into shapes ready for extrusion.
pub fn shapes_from_subpaths(subpaths: &[Contour], mode: FillMode) -> Vec<Shape> {
    let rings: Vec<&Contour> = subpaths.iter().filter(|c| c.len() >= 3).collect();
    match rings.len() {
        0 => Vec::new(),
        1 => vec![Shape::new(rings[0].clone())],
        _ => match mode {
            FillMode::Solid => group_by_winding(&rings),
            FillMode::EvenOdd => group_by_nesting(&rings),
        },
    }
}

fn group_by_winding(rings: &[&Contour]) -> Vec<Shape> {
    let solid_clockwise = rings[0].is_clockwise();
    let (solids, holes): (Vec<&Contour>, Vec<&Contour>) = rings
        .iter()
        .copied()
        .partition(|ring| ring.is_clockwise() == solid_clockwise);

    let mut shapes: Vec<Shape> = solids.iter().map(|s| Shape::new((*s).clone())).collect();
    for hole in holes {
        match smallest_enclosing(&solids, hole) {
            Some(index) => shapes[index].holes.push(hole.clone()),
            None => {
                debug!("hole without an enclosing solid, keeping it as a solid");
                shapes.push(Shape::new(hole.clone()));
            }
        }
    }
    shapes
}

fn group_by_nesting(rings: &[&Contour]) -> Vec<Shape> {
    let parents: Vec<Option<usize>> = rings
        .iter()
        .map(|ring| smallest_enclosing(rings, ring))
        .collect();
    let depth_of = |mut index: usize| {
        let mut depth = 0usize;
        while let Some(parent) = parents[index] {
            depth += 1;
            index = parent;
            if depth > rings.len() {
                break;
            }
        }
        depth
    };

    let mut shapes = Vec::new();
    let mut shape_of_ring = vec![None; rings.len()];
    for (index, ring) in rings.iter().enumerate() {
        if depth_of(index) % 2 == 0 {
            shape_of_ring[index] = Some(shapes.len());
            shapes.push(Shape::new((*ring).clone()));
        }
    }
    for (index, ring) in rings.iter().enumerate() {
        if depth_of(index) % 2 == 1 {
            if let Some(shape) = parents[index].and_then(|parent| shape_of_ring[parent]) {
                shapes[shape].holes.push((*ring).clone());
            }
        }
    }
    shapes
}

/// Index of the smallest ring in `candidates` that encloses `ring`.
fn smallest_enclosing(candidates: &[&Contour], ring: &Contour) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| !std::ptr::eq(**candidate, ring) && candidate.encloses(ring))
        .min_by(|(_, a), (_, b)| a.signed_area().abs().total_cmp(&b.signed_area().abs()))
        .map(|(index, _)| index)
}
