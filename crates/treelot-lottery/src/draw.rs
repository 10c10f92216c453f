//! Where a node's candidate number comes from.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use treelot_protocol::{NodeId, CANDIDATE_RANGE};

use crate::LotteryError;

/// Source of a node's local candidate number.
pub trait CandidateDraw: Send {
    fn draw(&mut self, node: NodeId) -> u32;
}

/// Uniform draw over [`CANDIDATE_RANGE`].
pub struct RandomDraw {
    rng: StdRng,
}

impl RandomDraw {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CandidateDraw for RandomDraw {
    fn draw(&mut self, _node: NodeId) -> u32 {
        self.rng.gen_range(CANDIDATE_RANGE)
    }
}

/// Always returns the injected value. Used to make reductions deterministic.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub u32);

impl CandidateDraw for FixedDraw {
    fn draw(&mut self, _node: NodeId) -> u32 {
        self.0
    }
}

/// How a factory equips each node it builds with a draw.
#[derive(Debug, Clone)]
pub enum DrawSource {
    /// Independent random draws. With a seed, node `n` uses `seed + n`.
    Random { seed: Option<u64> },
    /// Injected per-node values; every node in the tree needs one.
    Fixed(HashMap<NodeId, u32>),
}

impl Default for DrawSource {
    fn default() -> Self {
        DrawSource::Random { seed: None }
    }
}

impl DrawSource {
    pub fn fixed<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        DrawSource::Fixed(
            values
                .into_iter()
                .map(|(node, value)| (NodeId(node), value))
                .collect(),
        )
    }

    /// Build the draw for one node.
    pub fn for_node(&self, node: NodeId) -> Result<Box<dyn CandidateDraw>, LotteryError> {
        match self {
            DrawSource::Random { seed: None } => Ok(Box::new(RandomDraw::from_entropy())),
            DrawSource::Random { seed: Some(seed) } => Ok(Box::new(RandomDraw::seeded(
                seed.wrapping_add(u64::from(node.0)),
            ))),
            DrawSource::Fixed(values) => values
                .get(&node)
                .map(|v| Box::new(FixedDraw(*v)) as Box<dyn CandidateDraw>)
                .ok_or(LotteryError::MissingDraw(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_draw_stays_in_range() {
        let mut draw = RandomDraw::seeded(7);
        for _ in 0..1_000 {
            assert!(CANDIDATE_RANGE.contains(&draw.draw(NodeId(0))));
        }
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let source = DrawSource::Random { seed: Some(42) };
        let mut a = source.for_node(NodeId(3)).unwrap();
        let mut b = source.for_node(NodeId(3)).unwrap();
        let xs: Vec<u32> = (0..16).map(|_| a.draw(NodeId(3))).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.draw(NodeId(3))).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_fixed_source_requires_every_node() {
        let source = DrawSource::fixed([(0, 10), (1, 20)]);
        assert_eq!(source.for_node(NodeId(1)).unwrap().draw(NodeId(1)), 20);
        assert!(matches!(
            source.for_node(NodeId(2)),
            Err(LotteryError::MissingDraw(NodeId(2)))
        ));
    }
}
