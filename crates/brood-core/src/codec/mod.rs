//! Individual serialization.
//!
//! Two encodings exist: a binary one for the wire and checkpoint streams
//! (big-endian integers, IEEE-754 network byte order for reals) and a
//! human-readable one for population text files, built from the
//! self-delimiting tokens in [code]. Both are prototype-driven on the read
//! side: the reader is told what genome and fitness shape to expect, and a
//! stream produced for a different shape fails instead of quietly
//! reinterpreting bytes.

pub mod code;

use crate::Result;
use crate::fitness::{Fitness, MultiObjective, Spea2Fitness};
use crate::genome::{Genome, GenomeKind, TreeNode};
use crate::individual::Individual;
use crate::species::{Species, SpeciesId};
use brood_error::{brood_bail, brood_err};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const GENOME_INT: u8 = 0;
const GENOME_LONG: u8 = 1;
const GENOME_FLOAT: u8 = 2;
const GENOME_DOUBLE: u8 = 3;
const GENOME_BIT: u8 = 4;
const GENOME_TREE: u8 = 5;

const FITNESS_SCALAR: u8 = 0;
const FITNESS_MULTI: u8 = 1;
const FITNESS_SPEA2: u8 = 2;

pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    writer.write_u8(if value { 1 } else { 0 })?;
    Ok(())
}

pub fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(brood_err!(Codec: "malformed boolean byte {}", other)),
    }
}

fn genome_tag(kind: GenomeKind) -> u8 {
    match kind {
        GenomeKind::Int => GENOME_INT,
        GenomeKind::Long => GENOME_LONG,
        GenomeKind::Float => GENOME_FLOAT,
        GenomeKind::Double => GENOME_DOUBLE,
        GenomeKind::Bit => GENOME_BIT,
        GenomeKind::Tree => GENOME_TREE,
    }
}

pub fn write_genome<W: Write>(writer: &mut W, genome: &Genome) -> Result<()> {
    writer.write_u8(genome_tag(genome.kind()))?;
    writer.write_i32::<BigEndian>(genome.len() as i32)?;

    match genome {
        Genome::Int(words) => {
            for word in words {
                writer.write_i32::<BigEndian>(*word)?;
            }
        }
        Genome::Long(words) => {
            for word in words {
                writer.write_i64::<BigEndian>(*word)?;
            }
        }
        Genome::Float(words) => {
            for word in words {
                writer.write_f32::<BigEndian>(*word)?;
            }
        }
        Genome::Double(words) => {
            for word in words {
                writer.write_f64::<BigEndian>(*word)?;
            }
        }
        Genome::Bit(words) => {
            for word in words {
                write_bool(writer, *word)?;
            }
        }
        Genome::Tree(root) => write_tree(writer, root)?,
    }
    Ok(())
}

fn write_tree<W: Write>(writer: &mut W, node: &TreeNode) -> Result<()> {
    writer.write_i32::<BigEndian>(node.op)?;
    writer.write_i32::<BigEndian>(node.children.len() as i32)?;
    for child in &node.children {
        write_tree(writer, child)?;
    }
    Ok(())
}

pub fn read_genome<R: Read>(reader: &mut R, expected: GenomeKind) -> Result<Genome> {
    let tag = reader.read_u8()?;
    if tag != genome_tag(expected) {
        brood_bail!(Codec:
            "stream holds a genome of tag {} but a {:?} genome was expected", tag, expected);
    }

    let length = reader.read_i32::<BigEndian>()?;
    if length < 0 {
        brood_bail!(Codec: "negative genome length {}", length);
    }
    let length = length as usize;

    Ok(match expected {
        GenomeKind::Int => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(reader.read_i32::<BigEndian>()?);
            }
            Genome::Int(words)
        }
        GenomeKind::Long => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(reader.read_i64::<BigEndian>()?);
            }
            Genome::Long(words)
        }
        GenomeKind::Float => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(reader.read_f32::<BigEndian>()?);
            }
            Genome::Float(words)
        }
        GenomeKind::Double => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(reader.read_f64::<BigEndian>()?);
            }
            Genome::Double(words)
        }
        GenomeKind::Bit => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(read_bool(reader)?);
            }
            Genome::Bit(words)
        }
        GenomeKind::Tree => {
            let mut remaining = length;
            let root = read_tree(reader, &mut remaining)?;
            if remaining != 0 {
                brood_bail!(Codec: "tree genome used {} fewer nodes than declared", remaining);
            }
            Genome::Tree(root)
        }
    })
}

fn read_tree<R: Read>(reader: &mut R, remaining: &mut usize) -> Result<TreeNode> {
    if *remaining == 0 {
        brood_bail!(Codec: "tree genome holds more nodes than declared");
    }
    *remaining -= 1;

    let op = reader.read_i32::<BigEndian>()?;
    let arity = reader.read_i32::<BigEndian>()?;
    if arity < 0 {
        brood_bail!(Codec: "negative tree arity {}", arity);
    }

    let mut children = Vec::with_capacity(arity as usize);
    for _ in 0..arity {
        children.push(read_tree(reader, remaining)?);
    }
    Ok(TreeNode { op, children })
}

pub fn write_fitness<W: Write>(writer: &mut W, fitness: &Fitness) -> Result<()> {
    match fitness {
        Fitness::Scalar(value) => {
            writer.write_u8(FITNESS_SCALAR)?;
            writer.write_f32::<BigEndian>(*value)?;
        }
        Fitness::Multi(multi) => {
            writer.write_u8(FITNESS_MULTI)?;
            write_objectives(writer, multi)?;
        }
        Fitness::Spea2(spea2) => {
            writer.write_u8(FITNESS_SPEA2)?;
            write_objectives(writer, spea2.objectives())?;
            writer.write_f32::<BigEndian>(spea2.archive_rank())?;
        }
    }
    Ok(())
}

fn write_objectives<W: Write>(writer: &mut W, multi: &MultiObjective) -> Result<()> {
    writer.write_i32::<BigEndian>(multi.objectives().len() as i32)?;
    for objective in multi.objectives() {
        writer.write_f32::<BigEndian>(*objective)?;
    }
    write_bool(writer, multi.maximize())
}

pub fn read_fitness<R: Read>(reader: &mut R, prototype: &Fitness) -> Result<Fitness> {
    let tag = reader.read_u8()?;
    let expected = match prototype {
        Fitness::Scalar(_) => FITNESS_SCALAR,
        Fitness::Multi(_) => FITNESS_MULTI,
        Fitness::Spea2(_) => FITNESS_SPEA2,
    };
    if tag != expected {
        brood_bail!(Codec:
            "stream holds a fitness of tag {} but a {} fitness was expected", tag, prototype.kind());
    }

    match prototype {
        Fitness::Scalar(_) => Ok(Fitness::Scalar(reader.read_f32::<BigEndian>()?)),
        Fitness::Multi(multi) => Ok(Fitness::Multi(read_objectives(reader, multi)?)),
        Fitness::Spea2(spea2) => {
            let objectives = read_objectives(reader, spea2.objectives())?;
            let mut fitness = Spea2Fitness::new(objectives);
            fitness.set_archive_rank(reader.read_f32::<BigEndian>()?);
            Ok(Fitness::Spea2(fitness))
        }
    }
}

fn read_objectives<R: Read>(reader: &mut R, prototype: &MultiObjective) -> Result<MultiObjective> {
    let count = reader.read_i32::<BigEndian>()?;
    if count as usize != prototype.spec().num_objectives() {
        brood_bail!(Codec:
            "stream holds {} objectives but the species defines {}",
            count, prototype.spec().num_objectives());
    }

    let mut values = Vec::with_capacity(count as usize);
    for _ in 0..count {
        values.push(reader.read_f32::<BigEndian>()?);
    }

    let maximize = read_bool(reader)?;
    if maximize != prototype.maximize() {
        brood_bail!(Codec:
            "stream optimizes in the opposite direction from the species");
    }

    let mut fitness = MultiObjective::new(prototype.spec().clone());
    fitness.set_objectives(values)?;
    Ok(fitness)
}

pub fn write_individual<W: Write>(writer: &mut W, individual: &Individual) -> Result<()> {
    write_bool(writer, individual.evaluated)?;
    write_fitness(writer, &individual.fitness)?;
    write_genome(writer, &individual.genome)
}

pub fn read_individual<R: Read>(
    reader: &mut R,
    species_id: SpeciesId,
    species: &Species,
) -> Result<Individual> {
    let evaluated = read_bool(reader)?;
    let fitness = read_fitness(reader, &species.fitness_prototype)?;
    let genome = read_genome(reader, species.genome_prototype.kind())?;

    Ok(Individual {
        genome,
        fitness,
        evaluated,
        species: species_id,
    })
}

/// Render an individual for a population text file.
pub fn individual_to_text(individual: &Individual) -> String {
    let mut out = String::new();
    out.push_str("Evaluated: ");
    out.push_str(&code::encode_bool(individual.evaluated));
    out.push('\n');

    out.push_str("Fitness: ");
    out.push_str(&fitness_to_tokens(&individual.fitness));
    out.push('\n');

    out.push_str(&genome_to_tokens(&individual.genome));
    out.push('\n');
    out
}

fn fitness_to_tokens(fitness: &Fitness) -> String {
    fn objectives(multi: &MultiObjective) -> String {
        let mut out = code::encode_i32(multi.objectives().len() as i32);
        for objective in multi.objectives() {
            out.push(' ');
            out.push_str(&code::encode_f32(*objective));
        }
        out.push(' ');
        out.push_str(&code::encode_bool(multi.maximize()));
        out
    }

    match fitness {
        Fitness::Scalar(value) => code::encode_f32(*value),
        Fitness::Multi(multi) => objectives(multi),
        Fitness::Spea2(spea2) => format!(
            "{} {}",
            objectives(spea2.objectives()),
            code::encode_f32(spea2.archive_rank())
        ),
    }
}

fn genome_to_tokens(genome: &Genome) -> String {
    let mut out = code::encode_i32(genome.len() as i32);
    match genome {
        Genome::Int(words) => {
            for word in words {
                out.push(' ');
                out.push_str(&code::encode_i32(*word));
            }
        }
        Genome::Long(words) => {
            for word in words {
                out.push(' ');
                out.push_str(&code::encode_i64(*word));
            }
        }
        Genome::Float(words) => {
            for word in words {
                out.push(' ');
                out.push_str(&code::encode_f32(*word));
            }
        }
        Genome::Double(words) => {
            for word in words {
                out.push(' ');
                out.push_str(&code::encode_f64(*word));
            }
        }
        Genome::Bit(words) => {
            for word in words {
                out.push(' ');
                out.push_str(&code::encode_bool(*word));
            }
        }
        Genome::Tree(root) => tree_to_tokens(root, &mut out),
    }
    out
}

fn tree_to_tokens(node: &TreeNode, out: &mut String) {
    out.push(' ');
    out.push_str(&code::encode_i32(node.op));
    out.push(' ');
    out.push_str(&code::encode_i32(node.children.len() as i32));
    for child in &node.children {
        tree_to_tokens(child, out);
    }
}

/// Parse an individual previously rendered by [individual_to_text].
pub fn individual_from_text(
    text: &str,
    species_id: SpeciesId,
    species: &Species,
) -> Result<Individual> {
    let mut lines = text.lines();

    let evaluated_line = lines
        .next()
        .and_then(|line| line.strip_prefix("Evaluated: "))
        .ok_or_else(|| brood_err!(Codec: "missing 'Evaluated:' line"))?;
    let evaluated = code::Decoder::new(evaluated_line).decode_bool()?;

    let fitness_line = lines
        .next()
        .and_then(|line| line.strip_prefix("Fitness: "))
        .ok_or_else(|| brood_err!(Codec: "missing 'Fitness:' line"))?;
    let fitness = fitness_from_tokens(fitness_line, &species.fitness_prototype)?;

    let genome_line = lines
        .next()
        .ok_or_else(|| brood_err!(Codec: "missing genome line"))?;
    let genome = genome_from_tokens(genome_line, species.genome_prototype.kind())?;

    Ok(Individual {
        genome,
        fitness,
        evaluated,
        species: species_id,
    })
}

fn fitness_from_tokens(line: &str, prototype: &Fitness) -> Result<Fitness> {
    let mut decoder = code::Decoder::new(line);

    fn objectives(
        decoder: &mut code::Decoder<'_>,
        prototype: &MultiObjective,
    ) -> Result<MultiObjective> {
        let count = decoder.decode_i32()?;
        if count as usize != prototype.spec().num_objectives() {
            brood_bail!(Codec:
                "text holds {} objectives but the species defines {}",
                count, prototype.spec().num_objectives());
        }

        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            values.push(decoder.decode_f32()?);
        }
        if decoder.decode_bool()? != prototype.maximize() {
            brood_bail!(Codec: "text optimizes in the opposite direction from the species");
        }

        let mut fitness = MultiObjective::new(prototype.spec().clone());
        fitness.set_objectives(values)?;
        Ok(fitness)
    }

    match prototype {
        Fitness::Scalar(_) => Ok(Fitness::Scalar(decoder.decode_f32()?)),
        Fitness::Multi(multi) => Ok(Fitness::Multi(objectives(&mut decoder, multi)?)),
        Fitness::Spea2(spea2) => {
            let base = objectives(&mut decoder, spea2.objectives())?;
            let mut fitness = Spea2Fitness::new(base);
            fitness.set_archive_rank(decoder.decode_f32()?);
            Ok(Fitness::Spea2(fitness))
        }
    }
}

fn genome_from_tokens(line: &str, kind: GenomeKind) -> Result<Genome> {
    let mut decoder = code::Decoder::new(line);
    let length = decoder.decode_i32()?;
    if length < 0 {
        brood_bail!(Codec: "negative genome length {}", length);
    }
    let length = length as usize;

    Ok(match kind {
        GenomeKind::Int => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(decoder.decode_i32()?);
            }
            Genome::Int(words)
        }
        GenomeKind::Long => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(decoder.decode_i64()?);
            }
            Genome::Long(words)
        }
        GenomeKind::Float => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(decoder.decode_f32()?);
            }
            Genome::Float(words)
        }
        GenomeKind::Double => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(decoder.decode_f64()?);
            }
            Genome::Double(words)
        }
        GenomeKind::Bit => {
            let mut words = Vec::with_capacity(length);
            for _ in 0..length {
                words.push(decoder.decode_bool()?);
            }
            Genome::Bit(words)
        }
        GenomeKind::Tree => {
            let mut remaining = length;
            let root = tree_from_tokens(&mut decoder, &mut remaining)?;
            if remaining != 0 {
                brood_bail!(Codec: "tree genome used {} fewer nodes than declared", remaining);
            }
            Genome::Tree(root)
        }
    })
}

fn tree_from_tokens(decoder: &mut code::Decoder<'_>, remaining: &mut usize) -> Result<TreeNode> {
    if *remaining == 0 {
        brood_bail!(Codec: "tree genome holds more nodes than declared");
    }
    *remaining -= 1;

    let op = decoder.decode_i32()?;
    let arity = decoder.decode_i32()?;
    if arity < 0 {
        brood_bail!(Codec: "negative tree arity {}", arity);
    }

    let mut children = Vec::with_capacity(arity as usize);
    for _ in 0..arity {
        children.push(tree_from_tokens(decoder, remaining)?);
    }
    Ok(TreeNode { op, children })
}
