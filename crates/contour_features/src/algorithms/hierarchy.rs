use crate::types::{Contour, HierarchyNode};

/// Builds the next/previous/first-child/parent table from the parent links
/// of the contours. Siblings are ordered by their position in `contours`.
pub fn build_hierarchy(contours: &[Contour]) -> Vec<HierarchyNode> {
    let mut nodes = vec![HierarchyNode::default(); contours.len()];
    // Last child seen so far, per parent; index contours.len() stands for the root
    let mut last_child: Vec<Option<usize>> = vec![None; contours.len() + 1];

    for (i, contour) in contours.iter().enumerate() {
        let parent = contour.parent.filter(|&p| p < contours.len() && p != i);
        nodes[i].parent = parent;

        let slot = parent.unwrap_or(contours.len());
        match last_child[slot] {
            Some(prev) => {
                nodes[prev].next = Some(i);
                nodes[i].previous = Some(prev);
            }
            None => {
                if let Some(p) = parent {
                    nodes[p].first_child = Some(i);
                }
            }
        }
        last_child[slot] = Some(i);
    }

    nodes
}

/// Nesting depth of each contour; top-level contours have depth 0
pub fn contour_depths(hierarchy: &[HierarchyNode]) -> Vec<usize> {
    hierarchy
        .iter()
        .map(|node| {
            let mut depth = 0;
            let mut current = node.parent;
            while let Some(p) = current {
                depth += 1;
                // A malformed table could loop; depth can never exceed the node count
                if depth > hierarchy.len() {
                    break;
                }
                current = hierarchy[p].parent;
            }
            depth
        })
        .collect()
}
