//! Genome representations.
//!
//! A genome is an ordered sequence of words of one primitive kind, or an
//! operator tree. The concrete variation operators for each kind live with
//! the breeding pipelines; this module only carries the data, the resizing
//! rule, and a default point perturbation used by the stock mutation
//! pipeline.

use crate::Result;
use crate::rng::MersenneTwister;
use brood_error::brood_bail;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenomeKind {
    Int,
    Long,
    Float,
    Double,
    Bit,
    Tree,
}

/// An operator-tree node: an opcode tag and its argument subtrees.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNode {
    pub op: i32,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(op: i32) -> Self {
        TreeNode {
            op,
            children: Vec::new(),
        }
    }

    pub fn node(op: i32, children: Vec<TreeNode>) -> Self {
        TreeNode { op, children }
    }

    /// Total node count of the subtree rooted here.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Genome {
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Bit(Vec<bool>),
    Tree(TreeNode),
}

impl Genome {
    pub fn kind(&self) -> GenomeKind {
        match self {
            Genome::Int(_) => GenomeKind::Int,
            Genome::Long(_) => GenomeKind::Long,
            Genome::Float(_) => GenomeKind::Float,
            Genome::Double(_) => GenomeKind::Double,
            Genome::Bit(_) => GenomeKind::Bit,
            Genome::Tree(_) => GenomeKind::Tree,
        }
    }

    /// Word count for vector genomes, node count for trees.
    pub fn len(&self) -> usize {
        match self {
            Genome::Int(words) => words.len(),
            Genome::Long(words) => words.len(),
            Genome::Float(words) => words.len(),
            Genome::Double(words) => words.len(),
            Genome::Bit(words) => words.len(),
            Genome::Tree(root) => root.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize a vector genome to `length` words: the shorter prefix of the
    /// old genome is copied into the front of a zeroed buffer, and anything
    /// past it is dropped.
    pub fn resize(&mut self, length: usize) -> Result<()> {
        fn resized<T: Copy + Default>(old: &[T], length: usize) -> Vec<T> {
            let mut fresh = vec![T::default(); length];
            let keep = old.len().min(length);
            fresh[..keep].copy_from_slice(&old[..keep]);
            fresh
        }

        match self {
            Genome::Int(words) => *words = resized(words, length),
            Genome::Long(words) => *words = resized(words, length),
            Genome::Float(words) => *words = resized(words, length),
            Genome::Double(words) => *words = resized(words, length),
            Genome::Bit(words) => *words = resized(words, length),
            Genome::Tree(_) => brood_bail!(Breed: "tree genomes cannot be resized"),
        }
        Ok(())
    }

    /// Point-perturb each word with probability `rate`: unit steps for
    /// integer kinds, a standard-normal nudge for real kinds, a flip for
    /// bits. Trees are left untouched; tree variation is a pipeline concern.
    pub fn perturb(&mut self, rng: &mut MersenneTwister, rate: f32) {
        match self {
            Genome::Int(words) => {
                for word in words.iter_mut() {
                    if rng.next_f32() < rate {
                        *word = word.wrapping_add(if rng.next_bool() { 1 } else { -1 });
                    }
                }
            }
            Genome::Long(words) => {
                for word in words.iter_mut() {
                    if rng.next_f32() < rate {
                        *word = word.wrapping_add(if rng.next_bool() { 1 } else { -1 });
                    }
                }
            }
            Genome::Float(words) => {
                for word in words.iter_mut() {
                    if rng.next_f32() < rate {
                        *word += rng.gaussian() as f32;
                    }
                }
            }
            Genome::Double(words) => {
                for word in words.iter_mut() {
                    if rng.next_f32() < rate {
                        *word += rng.gaussian();
                    }
                }
            }
            Genome::Bit(words) => {
                for word in words.iter_mut() {
                    if rng.next_f32() < rate {
                        *word = !*word;
                    }
                }
            }
            Genome::Tree(_) => {}
        }
    }
}
