// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Rect;

use super::{
    maximize_scale, AtlasPacker, DimensionsConstraint, PackError, PackerSettings, Packing,
    ScaleConstraint, MAX_SIDE, MIN_SCALE,
};
use crate::glyph::{frame_axis, wrap_axis, GlyphGeometry};

/// The uniform cell layout chosen by a [`GridPacker`].
///
/// Cell dimensions include the spacing, so cells tile the atlas exactly and the
/// last column and row end `spacing` pixels past the atlas edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    /// Cell width in pixels, spacing included.
    pub cell_width: u32,
    /// Cell height in pixels, spacing included.
    pub cell_height: u32,
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Horizontal distance from the cell's left edge to the glyph origin, in shape
    /// units, when the origin is fixed horizontally.
    pub origin_x: Option<f64>,
    /// Vertical distance from the cell's bottom edge to the glyph origin, in shape
    /// units, when the origin is fixed vertically.
    pub origin_y: Option<f64>,
    /// Whether some glyph is larger than its cell and gets cut off.
    pub cutoff: bool,
}

/// Everything decided about a grid at one scale, before anything is placed.
#[derive(Clone, Copy, Debug)]
struct GridPlan {
    layout: GridLayout,
    width: u32,
    height: u32,
    unplaced: usize,
}

/// Gives every glyph a cell of the same size.
///
/// The cell is either fixed, capping glyph size and cutting off larger glyphs,
/// or derived from the largest glyph and optionally snapped to a constraint.
/// Cells are filled left to right, starting at the top row.
#[derive(Clone, Debug, Default)]
pub struct GridPacker {
    settings: PackerSettings,
    cell: Option<(u32, u32)>,
    cell_constraint: DimensionsConstraint,
    columns: Option<u32>,
    fixed_origin_x: bool,
    fixed_origin_y: bool,
    packing: Option<Packing>,
    layout: Option<GridLayout>,
}

impl GridPacker {
    /// Creates a packer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the cell dimensions, spacing included.
    pub fn set_cell_dimensions(&mut self, width: u32, height: u32) {
        self.cell = Some((width, height));
    }

    /// Derives the cell from the largest glyph and snaps it to `constraint`.
    pub fn set_cell_dimensions_constraint(&mut self, constraint: DimensionsConstraint) {
        self.cell = None;
        self.cell_constraint = constraint;
    }

    /// Fixes the number of columns.
    pub fn set_columns(&mut self, columns: u32) {
        self.columns = Some(columns);
    }

    /// Pins the glyph origin to the same place in every cell, per axis.
    pub fn set_fixed_origin(&mut self, x: bool, y: bool) {
        self.fixed_origin_x = x;
        self.fixed_origin_y = y;
    }

    /// The grid chosen by the last successful pack.
    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    /// Whether the last successful pack cut off any glyph.
    pub fn has_cutoff(&self) -> bool {
        self.layout.is_some_and(|layout| layout.cutoff)
    }

    /// Cell dimensions of the last successful pack, spacing included.
    pub fn cell_dimensions(&self) -> Option<(u32, u32)> {
        self.layout
            .map(|layout| (layout.cell_width, layout.cell_height))
    }

    /// Column count of the last successful pack.
    pub fn columns(&self) -> Option<u32> {
        self.layout.map(|layout| layout.columns)
    }

    /// Row count of the last successful pack.
    pub fn rows(&self) -> Option<u32> {
        self.layout.map(|layout| layout.rows)
    }

    /// The pinned glyph origin of the last successful pack, per fixed axis.
    pub fn fixed_origin(&self) -> (Option<f64>, Option<f64>) {
        self.layout
            .map_or((None, None), |layout| (layout.origin_x, layout.origin_y))
    }

    fn plan(&self, glyphs: &[GlyphGeometry], scale: f64) -> Result<GridPlan, PackError> {
        let attributes = self.settings.attributes(scale);
        let spacing = self.settings.spacing;

        let mut count = 0_usize;
        let mut need_width = 0;
        let mut need_height = 0;
        let mut union: Option<Rect> = None;
        for glyph in glyphs {
            let (Some((width, height)), Some(padded)) =
                (glyph.wrapped_size(&attributes), glyph.padded_bounds(&attributes))
            else {
                continue;
            };
            count += 1;
            need_width = need_width.max(width);
            need_height = need_height.max(height);
            union = Some(union.map_or(padded, |union| union.union(padded)));
        }
        let Some(union) = union else {
            return Err(PackError::Infeasible);
        };
        if self.fixed_origin_x {
            need_width = wrap_axis(union.x0, union.x1, scale, attributes.align_origin_x).0;
        }
        if self.fixed_origin_y {
            need_height = wrap_axis(union.y0, union.y1, scale, attributes.align_origin_y).0;
        }

        let (cell_width, cell_height) = match self.cell {
            Some(cell) => cell,
            None => {
                if need_width.max(need_height) > MAX_SIDE {
                    return Err(PackError::Infeasible);
                }
                let width = need_width.checked_add(spacing).ok_or(PackError::Infeasible)?;
                let height = need_height.checked_add(spacing).ok_or(PackError::Infeasible)?;
                self.cell_constraint
                    .snap(width, height)
                    .ok_or(PackError::Infeasible)?
            }
        };
        if cell_width <= spacing || cell_height <= spacing {
            return Err(PackError::Infeasible);
        }
        let content_width = cell_width - spacing;
        let content_height = cell_height - spacing;
        let cutoff = need_width > content_width || need_height > content_height;
        let origin_x = self.fixed_origin_x.then(|| {
            frame_axis(union.x0, union.x1, content_width, scale, attributes.align_origin_x)
        });
        let origin_y = self.fixed_origin_y.then(|| {
            frame_axis(union.y0, union.y1, content_height, scale, attributes.align_origin_y)
        });

        let count_u32 = u32::try_from(count).map_err(|_| PackError::Infeasible)?;
        let (columns, rows, width, height, unplaced) = match self.settings.dimensions {
            Some((width, height)) => {
                if width == 0 || height == 0 {
                    return Err(PackError::Infeasible);
                }
                let fit_columns = width.saturating_add(spacing) / cell_width;
                let fit_rows = height.saturating_add(spacing) / cell_height;
                let columns = self.columns.map_or(fit_columns, |c| c.min(fit_columns));
                let (rows, capacity) = if columns == 0 {
                    (0, 0)
                } else {
                    let rows = count_u32.div_ceil(columns).min(fit_rows);
                    let capacity = u64::from(columns) * u64::from(fit_rows);
                    (rows, usize::try_from(capacity).unwrap_or(usize::MAX))
                };
                (columns, rows, width, height, count.saturating_sub(capacity))
            }
            None => {
                let columns = match self.columns {
                    Some(columns) => columns,
                    None => near_square_columns(count_u32, cell_width, cell_height),
                };
                let rows = count_u32.div_ceil(columns);
                let width = columns.checked_mul(cell_width).ok_or(PackError::Infeasible)?;
                let height = rows.checked_mul(cell_height).ok_or(PackError::Infeasible)?;
                let (width, height) = self
                    .settings
                    .dimensions_constraint
                    .snap(width - spacing, height - spacing)
                    .ok_or(PackError::Infeasible)?;
                (columns, rows, width, height, 0)
            }
        };

        Ok(GridPlan {
            layout: GridLayout {
                cell_width,
                cell_height,
                columns,
                rows,
                origin_x,
                origin_y,
                cutoff,
            },
            width,
            height,
            unplaced,
        })
    }

    fn apply(&self, glyphs: &mut [GlyphGeometry], scale: f64, plan: &GridPlan) {
        let attributes = self.settings.attributes(scale);
        let layout = &plan.layout;
        let spacing = self.settings.spacing;
        let capacity = layout.columns.saturating_mul(layout.rows);
        let mut cell = 0_u32;
        for glyph in glyphs.iter_mut() {
            if glyph.is_whitespace() {
                glyph.wrap_box(&attributes);
                continue;
            }
            glyph.frame_box(
                &attributes,
                layout.cell_width - spacing,
                layout.cell_height - spacing,
                layout.origin_x,
                layout.origin_y,
            );
            if cell < capacity {
                let column = cell % layout.columns;
                let row = cell / layout.columns;
                glyph.place_box(
                    column * layout.cell_width,
                    plan.height.saturating_add(spacing) - (row + 1) * layout.cell_height,
                );
            }
            cell += 1;
        }
    }

    fn fits(&self, glyphs: &[GlyphGeometry], scale: f64) -> bool {
        self.plan(glyphs, scale)
            .is_ok_and(|plan| plan.unplaced == 0 && !plan.layout.cutoff)
    }
}

/// Column count that makes the grid closest to square, preferring smaller
/// areas and then fewer columns.
fn near_square_columns(count: u32, cell_width: u32, cell_height: u32) -> u32 {
    (1..=count.max(1))
        .min_by_key(|&columns| {
            let width = u64::from(columns) * u64::from(cell_width);
            let height = u64::from(count.div_ceil(columns)) * u64::from(cell_height);
            (width.max(height), width.saturating_mul(height))
        })
        .unwrap_or(1)
}

impl AtlasPacker for GridPacker {
    fn settings(&self) -> &PackerSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PackerSettings {
        &mut self.settings
    }

    fn packing(&self) -> Option<&Packing> {
        self.packing.as_ref()
    }

    fn pack(&mut self, glyphs: &mut [GlyphGeometry]) -> Result<Packing, PackError> {
        self.packing = None;
        self.layout = None;
        if self.columns == Some(0) {
            return Err(PackError::Infeasible);
        }

        let scale = match self.settings.scale {
            ScaleConstraint::Fixed(scale) => scale,
            ScaleConstraint::Minimum(floor)
                if self.settings.dimensions.is_some() || self.cell.is_some() =>
            {
                maximize_scale(floor, |scale| self.fits(glyphs, scale))
                    .unwrap_or(floor.max(MIN_SCALE))
            }
            ScaleConstraint::Minimum(floor) => floor,
        };
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(PackError::Infeasible);
        }

        let plan = self.plan(glyphs, scale)?;
        if plan.unplaced > 0 {
            return Err(PackError::Unplaced(plan.unplaced));
        }
        self.apply(glyphs, scale, &plan);
        let packing = Packing {
            width: plan.width,
            height: plan.height,
            scale,
            pixel_range: self.settings.range.to_pixels(scale),
        };
        self.packing = Some(packing);
        self.layout = Some(plan.layout);
        Ok(packing)
    }
}
