//! Vertical distribution of timeline nodes.

use serde::Serialize;

/// An item with its stable index and vertical center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placed<T> {
    pub item: T,
    pub index: usize,
    pub y: f64,
}

/// Spread items evenly between `node_size / 2` and `height - node_size / 2`,
/// in input order. One item is centered; a canvas too short for the box
/// size stacks everything on the center line.
pub fn place_vertically<I>(items: I, node_size: f64, height: f64) -> Vec<Placed<I::Item>>
where
    I: IntoIterator,
{
    let items: Vec<I::Item> = items.into_iter().collect();
    let n = items.len();
    let top = node_size / 2.0;
    let bottom = height - node_size / 2.0;
    let center = height / 2.0;

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let y = if n == 1 || bottom <= top {
                center
            } else {
                top + (bottom - top) * index as f64 / (n - 1) as f64
            };
            Placed { item, index, y }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(place_vertically(Vec::<u8>::new(), 20.0, 300.0).is_empty());
    }

    #[test]
    fn test_single_centered() {
        let placed = place_vertically(["a"], 20.0, 300.0);
        assert_eq!(placed[0].y, 150.0);
        assert_eq!(placed[0].index, 0);
    }

    #[test]
    fn test_even_spacing() {
        let placed = place_vertically(["a", "b", "c"], 20.0, 300.0);
        let ys: Vec<f64> = placed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![10.0, 150.0, 290.0]);
        assert_eq!(placed[2].item, "c");
        assert_eq!(placed[2].index, 2);
    }

    #[test]
    fn test_short_canvas() {
        let placed = place_vertically([1, 2], 20.0, 10.0);
        assert!(placed.iter().all(|p| p.y == 5.0));
    }
}
