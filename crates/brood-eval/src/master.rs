//! Master-side handle to one connected slave.
//!
//! The master accepts the slave's socket, reads its name, pushes its own
//! generator state so the pseudo-random stream survives checkpoints, and
//! from then on drives the slave with one-byte opcodes. Requests batch any
//! number of individuals; replies come back one marker byte per individual
//! in request order.

use crate::connection::Connection;
use crate::protocol::{Opcode, ResultKind};
use crate::wire;
use brood_core::{Fitness, Individual, MersenneTwister, Result, Species, codec};
use brood_error::brood_err;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::net::TcpListener;

/// A slave's answer for one evaluated individual.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalReply {
    Nothing,
    Individual(Individual),
    Fitness { evaluated: bool, fitness: Fitness },
}

pub struct MasterConnection {
    conn: Connection,
    slave_name: String,
}

impl MasterConnection {
    /// Accept one slave and perform the handshake: read the slave's name,
    /// send the master's generator state.
    pub fn accept(listener: &TcpListener, rng: &MersenneTwister, compress: bool) -> Result<Self> {
        let (stream, peer) = listener.accept()?;
        let mut conn = Connection::wrap(stream, compress)?;

        let slave_name = wire::read_string(&mut conn)?;
        rng.write_state(&mut conn)?;
        conn.flush()?;

        tracing::info!(slave = %slave_name, peer = %peer, "slave connected");
        Ok(MasterConnection { conn, slave_name })
    }

    pub fn slave_name(&self) -> &str {
        &self.slave_name
    }

    /// Dispatch a batch of individuals from one subpopulation for plain
    /// evaluation. `update_fitness[i]` tells the slave whether the caller
    /// wants individual `i`'s new fitness back.
    pub fn evaluate_simple(
        &mut self,
        subpop: usize,
        individuals: &[Individual],
        update_fitness: &[bool],
        species: &Species,
    ) -> Result<Vec<EvalReply>> {
        if individuals.len() != update_fitness.len() {
            return Err(brood_err!(Protocol:
                "{} individuals but {} update flags", individuals.len(), update_fitness.len()));
        }

        self.conn.write_u8(Opcode::EvaluateSimple.as_byte())?;
        wire::write_count(&mut self.conn, individuals.len())?;
        wire::write_count(&mut self.conn, subpop)?;
        for (individual, update) in individuals.iter().zip(update_fitness.iter()) {
            codec::write_individual(&mut self.conn, individual)?;
            codec::write_bool(&mut self.conn, *update)?;
        }
        self.conn.flush()?;

        self.read_replies(individuals, species)
    }

    /// Dispatch a batch spanning subpopulations for grouped evaluation.
    pub fn evaluate_grouped(
        &mut self,
        batch: &[(usize, Individual, bool)],
        count_victories_only: bool,
        species: &[Species],
    ) -> Result<Vec<EvalReply>> {
        self.conn.write_u8(Opcode::EvaluateGrouped.as_byte())?;
        wire::write_count(&mut self.conn, batch.len())?;
        for (subpop, individual, update) in batch {
            wire::write_count(&mut self.conn, *subpop)?;
            codec::write_individual(&mut self.conn, individual)?;
            codec::write_bool(&mut self.conn, *update)?;
        }
        codec::write_bool(&mut self.conn, count_victories_only)?;
        self.conn.flush()?;

        let mut replies = Vec::with_capacity(batch.len());
        for (_, individual, _) in batch {
            let spec = &species[individual.species.0];
            replies.push(self.read_reply(individual, spec)?);
        }
        Ok(replies)
    }

    fn read_replies(
        &mut self,
        individuals: &[Individual],
        species: &Species,
    ) -> Result<Vec<EvalReply>> {
        let mut replies = Vec::with_capacity(individuals.len());
        for individual in individuals {
            replies.push(self.read_reply(individual, species)?);
        }
        Ok(replies)
    }

    fn read_reply(&mut self, individual: &Individual, species: &Species) -> Result<EvalReply> {
        match ResultKind::from_byte(self.conn.read_u8()?)? {
            ResultKind::Nothing => Ok(EvalReply::Nothing),
            ResultKind::Individual => {
                let returned = codec::read_individual(&mut self.conn, individual.species, species)?;
                Ok(EvalReply::Individual(returned))
            }
            ResultKind::Fitness => {
                let evaluated = codec::read_bool(&mut self.conn)?;
                let fitness = codec::read_fitness(&mut self.conn, &species.fitness_prototype)?;
                Ok(EvalReply::Fitness { evaluated, fitness })
            }
        }
    }

    /// Ask the slave to persist its generator state into `rng`.
    pub fn checkpoint(&mut self, rng: &mut MersenneTwister) -> Result<()> {
        self.conn.write_u8(Opcode::Checkpoint.as_byte())?;
        self.conn.flush()?;
        rng.read_state(&mut self.conn)
    }

    /// Tell the slave to close its socket and exit cleanly.
    pub fn shutdown(mut self) -> Result<()> {
        self.conn.write_u8(Opcode::Shutdown.as_byte())?;
        self.conn.flush()?;
        Ok(())
    }
}
