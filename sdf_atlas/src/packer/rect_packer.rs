// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A maximal-rectangles bin packer.
//!
//! Keeps the list of maximal free rectangles of the bin and places every box
//! into the free rectangle that leaves the shortest leftover side. Boxes are
//! placed largest first, which makes the result depend only on the box sizes
//! and their order.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Rect {
    fn right(self) -> u32 {
        self.x + self.width
    }

    fn top(self) -> u32 {
        self.y + self.height
    }

    fn intersects(self, other: Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }

    fn contains(self, other: Self) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }
}

struct RectPacker {
    free: Vec<Rect>,
}

impl RectPacker {
    fn new(width: u32, height: u32) -> Self {
        let mut free = Vec::new();
        if width > 0 && height > 0 {
            free.push(Rect {
                x: 0,
                y: 0,
                width,
                height,
            });
        }
        Self { free }
    }

    /// Finds the best free spot for a box without claiming it.
    fn find(&self, width: u32, height: u32) -> Option<Rect> {
        let mut best: Option<(Rect, (u32, u32))> = None;
        for free in &self.free {
            if free.width < width || free.height < height {
                continue;
            }
            let leftover_x = free.width - width;
            let leftover_y = free.height - height;
            let score = (leftover_x.min(leftover_y), leftover_x.max(leftover_y));
            if best.is_none_or(|(_, best_score)| score < best_score) {
                best = Some((
                    Rect {
                        x: free.x,
                        y: free.y,
                        width,
                        height,
                    },
                    score,
                ));
            }
        }
        best.map(|(rect, _)| rect)
    }

    fn claim(&mut self, used: Rect) {
        let mut index = 0;
        while index < self.free.len() {
            let free = self.free[index];
            if !free.intersects(used) {
                index += 1;
                continue;
            }
            self.free.swap_remove(index);
            if used.x > free.x {
                self.free.push(Rect {
                    width: used.x - free.x,
                    ..free
                });
            }
            if used.right() < free.right() {
                self.free.push(Rect {
                    x: used.right(),
                    width: free.right() - used.right(),
                    ..free
                });
            }
            if used.y > free.y {
                self.free.push(Rect {
                    height: used.y - free.y,
                    ..free
                });
            }
            if used.top() < free.top() {
                self.free.push(Rect {
                    y: used.top(),
                    height: free.top() - used.top(),
                    ..free
                });
            }
        }
        self.prune();
    }

    /// Removes free rectangles that are contained in others.
    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut removed_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                if self.free[j].contains(self.free[i]) {
                    self.free.remove(i);
                    removed_i = true;
                    break;
                }
                if self.free[i].contains(self.free[j]) {
                    self.free.remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed_i {
                i += 1;
            }
        }
    }
}

/// Packs boxes of the given sizes into a `width` by `height` bin.
///
/// Returns the bottom-left corner of each box in input order, or `None` for
/// boxes that did not fit. Empty boxes are never placed.
pub(crate) fn pack_rectangles(
    width: u32,
    height: u32,
    sizes: &[(u32, u32)],
) -> Vec<Option<(u32, u32)>> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by_key(|&index| {
        let (w, h) = sizes[index];
        core::cmp::Reverse(u64::from(w) * u64::from(h))
    });

    let mut packer = RectPacker::new(width, height);
    let mut placements = vec![None; sizes.len()];
    for index in order {
        let (w, h) = sizes[index];
        if w == 0 || h == 0 {
            continue;
        }
        if let Some(rect) = packer.find(w, h) {
            packer.claim(rect);
            placements[index] = Some((rect.x, rect.y));
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(sizes: &[(u32, u32)], placements: &[Option<(u32, u32)>]) {
        let rects: Vec<Rect> = sizes
            .iter()
            .zip(placements)
            .filter_map(|(&(width, height), placement)| {
                placement.map(|(x, y)| Rect {
                    x,
                    y,
                    width,
                    height,
                })
            })
            .collect();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn fills_exact_bin() {
        let sizes = [(8, 8), (8, 8), (8, 8), (8, 8)];
        let placements = pack_rectangles(16, 16, &sizes);
        assert!(placements.iter().all(Option::is_some));
        assert_disjoint(&sizes, &placements);
    }

    #[test]
    fn reports_boxes_that_do_not_fit() {
        let sizes = [(10, 10), (10, 10), (10, 10)];
        let placements = pack_rectangles(20, 10, &sizes);
        assert_eq!(placements.iter().filter(|p| p.is_none()).count(), 1);
        assert_disjoint(&sizes, &placements);
    }

    #[test]
    fn mixed_sizes_fit_tight_square() {
        // Boxes of 30x30, 20x40, 25x25 and 10x10, each grown by 2 px of spacing.
        let sizes = [(32, 32), (22, 42), (27, 27), (12, 12)];
        let placements = pack_rectangles(62, 62, &sizes);
        assert!(placements.iter().all(Option::is_some));
        assert_disjoint(&sizes, &placements);
        for (&(w, h), placement) in sizes.iter().zip(&placements) {
            let (x, y) = placement.unwrap();
            assert!(x + w <= 62 && y + h <= 62);
        }
    }

    #[test]
    fn empty_bin_places_nothing() {
        let placements = pack_rectangles(0, 10, &[(1, 1)]);
        assert_eq!(placements, [None]);
    }
}
