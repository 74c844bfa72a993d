use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, VariantNames};
use crate::{
    error::Result,
    traits::ContourExtractor,
    types::{BorderKind, Contour},
};

/// Which contours are kept and how they are linked
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContourRetrieval {
    /// Every border, with parent links forming the full nesting tree
    #[default]
    Tree,
    /// Only the outermost borders
    External,
    /// Every border, without parent links
    List,
}

/// How boundary points are stored
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChainApproximation {
    /// Keep every boundary pixel
    None,
    /// Collapse straight horizontal, vertical and diagonal runs to their end points
    #[default]
    Simple,
}

/// Imageproc-based contour extractor
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor {
    pub retrieval: ContourRetrieval,
    pub approximation: ChainApproximation,
}

impl ImageprocContourExtractor {
    pub fn new(retrieval: ContourRetrieval, approximation: ChainApproximation) -> Self {
        Self { retrieval, approximation }
    }
}

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, image: &GrayImage) -> Result<Vec<Contour>> {
        let raw = imageproc::contours::find_contours::<i32>(image);
        let found = raw.len();

        let approximate = |points: Vec<[i32; 2]>| match self.approximation {
            ChainApproximation::None => points,
            ChainApproximation::Simple => compress_chain(&points),
        };

        let contours: Vec<Contour> = raw
            .into_iter()
            .filter(|c| match self.retrieval {
                ContourRetrieval::External => c.parent.is_none(),
                ContourRetrieval::Tree | ContourRetrieval::List => true,
            })
            .map(|c| {
                let points = c.points.iter().map(|p| [p.x, p.y]).collect();
                let parent = match self.retrieval {
                    ContourRetrieval::Tree => c.parent,
                    ContourRetrieval::External | ContourRetrieval::List => None,
                };
                Contour::new(approximate(points), BorderKind::from(c.border_type), parent)
            })
            .collect();

        tracing::debug!(
            found,
            kept = contours.len(),
            retrieval = %self.retrieval,
            approximation = %self.approximation,
            "extracted contours"
        );

        Ok(contours)
    }
}

/// Drops every point that lies in the middle of a straight run, so each
/// horizontal, vertical or diagonal segment keeps only its two end points.
///
/// The chain is treated as closed. Consecutive duplicates are removed first.
pub fn compress_chain(points: &[[i32; 2]]) -> Vec<[i32; 2]> {
    let mut chain: Vec<[i32; 2]> = Vec::with_capacity(points.len());
    for &p in points {
        if chain.last() != Some(&p) {
            chain.push(p);
        }
    }
    while chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }

    let n = chain.len();
    if n < 3 {
        return chain;
    }

    let step = |from: [i32; 2], to: [i32; 2]| [(to[0] - from[0]).signum(), (to[1] - from[1]).signum()];

    let kept: Vec<[i32; 2]> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            step(prev, chain[i]) != step(chain[i], next)
        })
        .map(|i| chain[i])
        .collect();

    if kept.is_empty() {
        // Only possible for a degenerate chain; keep one point so the contour survives
        vec![chain[0]]
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filled_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        img
    }

    fn ring_image() -> GrayImage {
        let mut img = filled_rect(60, 60, 10, 10, 50, 50);
        for y in 20..40 {
            for x in 20..40 {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
        img
    }

    #[test]
    fn test_compress_chain_square_keeps_corners() {
        let mut points = Vec::new();
        for x in 0..5 {
            points.push([x, 0]);
        }
        for y in 1..5 {
            points.push([4, y]);
        }
        for x in (0..4).rev() {
            points.push([x, 4]);
        }
        for y in (1..4).rev() {
            points.push([0, y]);
        }

        let compressed = compress_chain(&points);
        assert_eq!(compressed, vec![[0, 0], [4, 0], [4, 4], [0, 4]]);
    }

    #[test]
    fn test_compress_chain_keeps_tiny_chains() {
        assert_eq!(compress_chain(&[[3, 3]]), vec![[3, 3]]);
        assert_eq!(compress_chain(&[[3, 3], [4, 3]]), vec![[3, 3], [4, 3]]);
        assert!(compress_chain(&[]).is_empty());
    }

    #[test]
    fn test_simple_approximation_on_filled_rect() {
        let image = filled_rect(100, 100, 20, 20, 80, 80);
        let contours = ImageprocContourExtractor::default()
            .extract_contours(&image)
            .expect("extraction should succeed");

        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(contours[0].border, BorderKind::Outer);
    }

    #[test]
    fn test_no_approximation_keeps_every_pixel() {
        let image = filled_rect(100, 100, 20, 20, 80, 80);
        let extractor = ImageprocContourExtractor::new(ContourRetrieval::Tree, ChainApproximation::None);
        let contours = extractor.extract_contours(&image).expect("extraction should succeed");

        assert_eq!(contours.len(), 1);
        // 60x60 block: border pixels on a 59-step square
        assert_eq!(contours[0].len(), 4 * 59);
    }

    #[test]
    fn test_tree_retrieval_links_hole_to_outer() {
        let contours = ImageprocContourExtractor::default()
            .extract_contours(&ring_image())
            .expect("extraction should succeed");

        assert_eq!(contours.len(), 2);
        let hole = contours
            .iter()
            .find(|c| c.border == BorderKind::Hole)
            .expect("ring has a hole border");
        let parent = hole.parent.expect("hole has a parent");
        assert_eq!(contours[parent].border, BorderKind::Outer);
    }

    #[test]
    fn test_external_retrieval_drops_holes() {
        let extractor = ImageprocContourExtractor::new(ContourRetrieval::External, ChainApproximation::Simple);
        let contours = extractor.extract_contours(&ring_image()).expect("extraction should succeed");

        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].border, BorderKind::Outer);
    }

    #[test]
    fn test_list_retrieval_drops_parents() {
        let extractor = ImageprocContourExtractor::new(ContourRetrieval::List, ChainApproximation::Simple);
        let contours = extractor.extract_contours(&ring_image()).expect("extraction should succeed");

        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| c.parent.is_none()));
    }

    #[test]
    fn test_empty_image_has_no_contours() {
        let contours = ImageprocContourExtractor::default()
            .extract_contours(&GrayImage::new(16, 16))
            .expect("extraction should succeed");
        assert!(contours.is_empty());
    }
}
