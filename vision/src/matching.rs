use image::GrayImage;
use rayon::prelude::*;

/// Template pixels at or below this value are left out of a masked template.
const MASK_THRESHOLD: u8 = 10;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of `image`.
    pub fn of(image: &GrayImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn intersection(&self, other: &Region) -> u64 {
        let width = self.right().min(other.right()).saturating_sub(self.x.max(other.x));
        let height = self.bottom().min(other.bottom()).saturating_sub(self.y.max(other.y));
        width as u64 * height as u64
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Grown by `margin` on every side, then clipped to `bounds`.
    pub fn expand(&self, margin: u32, bounds: &Region) -> Region {
        let x = self.x.saturating_sub(margin).max(bounds.x);
        let y = self.y.saturating_sub(margin).max(bounds.y);
        let right = self.right().saturating_add(margin).min(bounds.right());
        let bottom = self.bottom().saturating_add(margin).min(bounds.bottom());
        Region::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    pub fn clip(&self, bounds: &Region) -> Region {
        self.expand(0, bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub region: Region,
    pub score: f32,
}

/// A reference image prepared for normalized cross-correlation.
#[derive(Debug, Clone)]
pub struct Template {
    width: u32,
    height: u32,
    /// Offset and mean-subtracted value of every pixel taking part in matching.
    points: Vec<(u32, u32, f64)>,
    norm: f64,
}

impl Template {
    /// Every pixel takes part in matching.
    pub fn new(image: &GrayImage) -> Self {
        Self::build(image, |_| true)
    }

    /// Only pixels brighter than the mask threshold take part in matching.
    pub fn masked(image: &GrayImage) -> Self {
        Self::build(image, |value| value > MASK_THRESHOLD)
    }

    fn build(image: &GrayImage, keep: impl Fn(u8) -> bool) -> Self {
        let kept: Vec<(u32, u32, f64)> = image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| keep(pixel[0]))
            .map(|(x, y, pixel)| (x, y, pixel[0] as f64))
            .collect();

        let mean = match kept.len() {
            0 => 0.0,
            n => kept.iter().map(|p| p.2).sum::<f64>() / n as f64,
        };
        let points: Vec<(u32, u32, f64)> =
            kept.into_iter().map(|(x, y, v)| (x, y, v - mean)).collect();
        let norm = points.iter().map(|p| p.2 * p.2).sum::<f64>().sqrt();

        Self {
            width: image.width(),
            height: image.height(),
            points,
            norm,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// A flat or fully masked template correlates with nothing.
    pub fn is_flat(&self) -> bool {
        self.norm <= f64::EPSILON
    }

    fn fits(&self, window: &Region) -> bool {
        !self.is_flat() && self.width <= window.width && self.height <= window.height
    }

    /// Correlation coefficient in [-1, 1] for the placement whose top-left
    /// corner is (x, y). The placement must lie inside `image`.
    pub fn score_at(&self, image: &GrayImage, x: u32, y: u32) -> f32 {
        if self.is_flat() {
            return 0.0;
        }
        let stride = image.width() as usize;
        let raw = image.as_raw();
        let n = self.points.len() as f64;

        let (mut dot, mut sum, mut sum_sq) = (0.0, 0.0, 0.0);
        for &(dx, dy, t) in &self.points {
            let value = raw[(y + dy) as usize * stride + (x + dx) as usize] as f64;
            dot += t * value;
            sum += value;
            sum_sq += value * value;
        }

        let variance = sum_sq - sum * sum / n;
        if variance <= 1e-9 {
            return 0.0;
        }
        (dot / (self.norm * variance.sqrt())) as f32
    }
}

/// Every placement of `template` inside `search` scoring at least `threshold`,
/// with overlapping placements suppressed.
pub fn find_matches(
    image: &GrayImage,
    template: &Template,
    search: Region,
    threshold: f32,
    overlap: f32,
) -> Vec<Match> {
    let search = search.clip(&Region::of(image));
    if !template.fits(&search) {
        return Vec::new();
    }

    let cols = search.width - template.width() + 1;
    let rows = search.height - template.height() + 1;

    let candidates: Vec<Match> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|dy| {
            let y = search.y + dy;
            (0..cols).filter_map(move |dx| {
                let x = search.x + dx;
                let score = template.score_at(image, x, y);
                (score >= threshold).then(|| Match {
                    region: Region::new(x, y, template.width(), template.height()),
                    score,
                })
            })
        })
        .collect();

    suppress_overlaps(candidates, overlap)
}

/// Highest score of `template` anywhere inside `window`, if it fits there.
pub fn best_score(image: &GrayImage, template: &Template, window: Region) -> Option<f32> {
    let window = window.clip(&Region::of(image));
    if !template.fits(&window) {
        return None;
    }

    let mut best = f32::MIN;
    for y in window.y..=window.bottom() - template.height() {
        for x in window.x..=window.right() - template.width() {
            best = best.max(template.score_at(image, x, y));
        }
    }
    Some(best)
}

/// Keeps the strongest matches. A candidate is dropped when the share of its
/// own area covered by an already kept match exceeds `overlap`.
pub fn suppress_overlaps(mut candidates: Vec<Match>, overlap: f32) -> Vec<Match> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Match> = Vec::new();
    for candidate in candidates {
        let area = candidate.region.area().max(1) as f32;
        let covered = kept
            .iter()
            .any(|k| k.region.intersection(&candidate.region) as f32 / area > overlap);
        if !covered {
            kept.push(candidate);
        }
    }
    kept
}
