// paint.rs - Window difference counts placed on assembly contig coordinates

use crate::core::cigar::{map_positions, IndelMode};
use crate::core::thresholds::{Thresholds, WindowClass};
use crate::core::window::window_differences;
use crate::data::alignment::{Alignment, Orientation};
use crate::data::assembly::Assembly;
use std::collections::HashMap;
use std::fmt;

const WINDOW_SIZE_PER_STEP: usize = 100;

/// Window points of one alignment: `(contig position, difference count)`
/// plus the contig span the alignment covers
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPoints {
    pub start: usize,
    pub end: usize,
    pub points: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct PaintedContig {
    pub name: String,
    pub length: usize,
    pub alignments: Vec<AlignmentPoints>,
}

/// Half-open regions of one contig, together tiling `[0, length)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContigRegions {
    pub vertical: Vec<(usize, usize)>,
    pub horizontal: Vec<(usize, usize)>,
    pub unaligned: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct PaintedAssembly {
    pub name: String,
    pub contigs: Vec<PaintedContig>,
    index: HashMap<String, usize>,
}

impl PaintedContig {
    pub fn new(name: &str, length: usize) -> Self {
        Self {
            name: name.to_string(),
            length,
            alignments: Vec::new(),
        }
    }

    /// Every window point of every alignment, ordered by position
    pub fn window_differences(&self) -> Vec<(usize, usize)> {
        let mut all: Vec<(usize, usize)> = self
            .alignments
            .iter()
            .flat_map(|a| a.points.iter().copied())
            .collect();
        all.sort_by_key(|&(pos, _)| pos);
        all
    }

    pub fn max_differences(&self) -> usize {
        self.alignments
            .iter()
            .flat_map(|a| a.points.iter().map(|&(_, d)| d))
            .max()
            .unwrap_or(0)
    }

    /// Classify every contig position. Each alignment span is split between
    /// its window points at the midpoints of neighbouring positions; ambiguous
    /// windows count as horizontal and horizontal beats vertical where
    /// alignments overlap.
    pub fn regions(&self, thresholds: &Thresholds) -> ContigRegions {
        const UNALIGNED: u8 = 0;
        const VERTICAL: u8 = 1;
        const HORIZONTAL: u8 = 2;

        let mut labels = vec![UNALIGNED; self.length];
        for alignment in &self.alignments {
            let mut points = alignment.points.clone();
            points.sort_by_key(|&(pos, _)| pos);
            let end = alignment.end.min(self.length);

            for (k, &(pos, differences)) in points.iter().enumerate() {
                let lo = if k == 0 {
                    alignment.start
                } else {
                    (points[k - 1].0 + pos) / 2
                };
                let hi = match points.get(k + 1) {
                    Some(&(next, _)) => (pos + next) / 2,
                    None => end,
                };
                let label = match thresholds.classify(differences) {
                    WindowClass::Vertical => VERTICAL,
                    WindowClass::Ambiguous | WindowClass::Horizontal => HORIZONTAL,
                };
                for l in labels.iter_mut().take(hi.min(end)).skip(lo) {
                    *l = (*l).max(label);
                }
            }
        }

        let mut regions = ContigRegions::default();
        let mut start = 0;
        while start < labels.len() {
            let label = labels[start];
            let mut end = start + 1;
            while end < labels.len() && labels[end] == label {
                end += 1;
            }
            match label {
                VERTICAL => regions.vertical.push((start, end)),
                HORIZONTAL => regions.horizontal.push((start, end)),
                _ => regions.unaligned.push((start, end)),
            }
            start = end;
        }
        regions
    }
}

impl ContigRegions {
    pub fn vertical_length(&self) -> usize {
        self.vertical.iter().map(|(s, e)| e - s).sum()
    }

    pub fn horizontal_length(&self) -> usize {
        self.horizontal.iter().map(|(s, e)| e - s).sum()
    }

    pub fn unaligned_length(&self) -> usize {
        self.unaligned.iter().map(|(s, e)| e - s).sum()
    }
}

/// Regions of several contigs as `contig:start-end`, comma-separated
pub struct RegionList<'a>(pub Vec<(&'a str, &'a [(usize, usize)])>);

impl fmt::Display for RegionList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (contig, ranges) in &self.0 {
            for (start, end) in ranges.iter() {
                if !first {
                    write!(f, ",")?;
                }
                write!(f, "{}:{}-{}", contig, start, end)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl PaintedAssembly {
    pub fn new(assembly: &Assembly) -> Self {
        let contigs: Vec<PaintedContig> = assembly
            .contigs
            .iter()
            .map(|c| PaintedContig::new(&c.name, c.length))
            .collect();
        let index = contigs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            name: assembly.name.clone(),
            contigs,
            index,
        }
    }

    pub fn contig(&self, name: &str) -> Option<&PaintedContig> {
        self.index.get(name).map(|&i| &self.contigs[i])
    }

    /// Place the windows of one alignment on this assembly's side of it.
    /// `window_size` must be a positive multiple of 100; the step is
    /// `window_size / 100`.
    pub fn add_alignment(
        &mut self,
        alignment: &Alignment,
        orientation: Orientation,
        window_size: usize,
        indel_mode: IndelMode,
    ) -> Result<(), String> {
        if window_size == 0 || window_size % WINDOW_SIZE_PER_STEP != 0 {
            return Err(format!(
                "Window size must be a positive multiple of {}, got {}",
                WINDOW_SIZE_PER_STEP, window_size
            ));
        }
        let window_step = window_size / WINDOW_SIZE_PER_STEP;

        let (contig_name, start, end) = alignment.span(orientation);
        let &contig_index = self.index.get(contig_name).ok_or_else(|| {
            format!("Contig '{}' not found in assembly {}", contig_name, self.name)
        })?;
        let contig = &mut self.contigs[contig_index];
        if end > contig.length {
            return Err(format!(
                "Alignment span {}-{} exceeds contig {} length {}",
                start, end, contig_name, contig.length
            ));
        }

        let trace = alignment.trace_for(orientation);
        let positions = map_positions(&trace, start, end)?;
        let (trace, positions) = indel_mode.apply_with_positions(&trace, &positions);

        let points = window_differences(&trace, window_size, window_step)
            .into_iter()
            .map(|(offset, differences)| {
                let position = (positions[offset] + positions[offset + window_size - 1]) / 2;
                (position, differences)
            })
            .collect();

        contig.alignments.push(AlignmentPoints { start, end, points });
        Ok(())
    }

    /// Regions for every contig, in assembly order
    pub fn regions(&self, thresholds: &Thresholds) -> Vec<(String, ContigRegions)> {
        self.contigs
            .iter()
            .map(|c| (c.name.clone(), c.regions(thresholds)))
            .collect()
    }
}
