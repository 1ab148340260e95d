//! The slave runtime.
//!
//! A slave resolves the master endpoint from its parameter database,
//! connects (retrying forever at a fixed 100 ms cadence), hands over its
//! name, adopts the master's generator state, and then serves one-byte
//! opcodes until it is told to shut down. Losing the socket after a
//! successful handshake is routine: the slave logs a warning and goes back
//! to the connect loop. Failing the handshake itself, or failing to write
//! results back, is fatal.

use crate::connection::Connection;
use crate::protocol::Opcode;
use crate::wire;
use brood_breeders::{MuCommaLambdaBreeder, MuPlusLambdaBreeder, MutationPipeline, Spea2Breeder};
use brood_core::{
    BroodError, Checkpoint, ErrorSink, Evolution, EvolutionState, EvolveOutcome, Fitness,
    GenomeSumContest, GenomeSumProblem, Genome, GroupMember, GroupedProblem, Individual,
    MultiObjective, ParameterDatabase, Population, Problem, Registry, Result, Spea2Fitness,
    Species, SpeciesId, Subpopulation, codec,
};
use brood_error::{brood_bail, brood_err};
use brood_selectors::{EsSelector, Spea2TournamentSelector};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const P_SLAVE_NAME: &str = "eval.slave-name";
pub const P_MASTER_HOST: &str = "eval.master.host";
pub const P_MASTER_PORT: &str = "eval.master.port";
pub const P_COMPRESSION: &str = "eval.compression";
pub const P_RETURN_INDS: &str = "eval.return-inds";
pub const P_PROBLEM: &str = "eval.problem";
pub const P_RUN_TIME: &str = "runtime";
pub const P_RUN_EVOLVE: &str = "run-evolve";
pub const P_STATE: &str = "state";
pub const P_SEED: &str = "seed";
pub const P_BREED: &str = "breed";
pub const P_BREEDTHREADS: &str = "breedthreads";
pub const P_GENERATIONS: &str = "generations";

const RECONNECT_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_SEED: u32 = 4357;

#[derive(Debug, Clone)]
pub struct SlaveConfig {
    pub name: Option<String>,
    pub host: String,
    pub port: u16,
    pub compression: bool,
    pub return_individuals: bool,
    pub run_evolve: bool,
    pub run_time: Duration,
}

impl SlaveConfig {
    /// Read and validate the slave parameter family, accumulating every
    /// problem into the sink so a misconfigured run reports them all.
    pub fn from_params(params: &ParameterDatabase, sink: &mut ErrorSink) -> Option<SlaveConfig> {
        fn collect<T>(sink: &mut ErrorSink, result: Result<T>) -> Option<T> {
            match result {
                Ok(value) => Some(value),
                Err(error) => {
                    sink.push(error);
                    None
                }
            }
        }

        let host = collect(sink, params.get_string(P_MASTER_HOST));
        let port = collect(sink, params.get_u16(P_MASTER_PORT));
        let compression = collect(sink, params.get_bool_or(P_COMPRESSION, false));
        let return_individuals = collect(sink, params.get_bool_or(P_RETURN_INDS, false));
        let run_evolve = collect(sink, params.get_bool_or(P_RUN_EVOLVE, false));
        let run_time = match params.has(P_RUN_TIME) {
            true => collect(sink, params.get_u64(P_RUN_TIME)),
            false => Some(1000),
        };

        Some(SlaveConfig {
            name: params.get(P_SLAVE_NAME).map(str::to_owned),
            host: host?,
            port: port?,
            compression: compression?,
            return_individuals: return_individuals?,
            run_evolve: run_evolve?,
            run_time: Duration::from_millis(run_time?),
        })
    }
}

/// The stock registry: the three breeding strategies and the stock problem,
/// keyed by the tags parameter files use.
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_breeder("mu-comma-lambda", |params, subpops| {
        Ok(Box::new(MuCommaLambdaBreeder::from_params(params, subpops)?))
    });
    registry.register_breeder("mu-plus-lambda", |params, subpops| {
        Ok(Box::new(MuPlusLambdaBreeder::from_params(params, subpops)?))
    });
    registry.register_breeder("spea2", |_, _| Ok(Box::new(Spea2Breeder::new())));
    registry.register_problem("genome-sum", |_| Ok(Arc::new(GenomeSumProblem::new())));
    registry
}

/// Build an evolution state from the species and population parameter
/// families: genome prototype, fitness shape, pipeline, per-thread
/// generators.
pub fn build_state(params: &ParameterDatabase) -> Result<EvolutionState> {
    let genome_size = params.get_usize_or("species.genome-size", 4)?;
    let genome_kind = params.get_string_or("species.genome-type", "double");
    let prototype = match genome_kind.as_str() {
        "int" => Genome::Int(vec![0; genome_size]),
        "long" => Genome::Long(vec![0; genome_size]),
        "float" => Genome::Float(vec![0.0; genome_size]),
        "double" => Genome::Double(vec![0.0; genome_size]),
        "bit" => Genome::Bit(vec![false; genome_size]),
        other => {
            brood_bail!(InvalidConfig: "species.genome-type '{}' is not recognized", other)
        }
    };

    let breeder_tag = params.get_string_or(P_BREED, "mu-comma-lambda");
    let fitness_prototype = match (breeder_tag.as_str(), params.objective_spec()?) {
        ("spea2", Some(spec)) => Fitness::Spea2(Spea2Fitness::new(MultiObjective::new(
            Arc::new(spec),
        ))),
        ("spea2", None) => {
            brood_bail!(InvalidConfig: "breed 'spea2' requires multi.num-objectives")
        }
        (_, Some(spec)) => Fitness::Multi(MultiObjective::new(Arc::new(spec))),
        (_, None) => Fitness::Scalar(0.0),
    };

    let rate = if params.has("mutate.rate") {
        params.get_f32("mutate.rate")?
    } else {
        0.25
    };
    let pipeline: Box<dyn brood_core::BreedingPipeline> = if breeder_tag == "spea2" {
        let size = params.get_usize_or("spea2.tournament-size", 2)?;
        Box::new(MutationPipeline::new(
            Box::new(Spea2TournamentSelector::new(size)),
            rate,
        ))
    } else {
        Box::new(MutationPipeline::new(Box::new(EsSelector::new()), rate))
    };

    let species = Species::new("slave", prototype, fitness_prototype, pipeline);

    let seed = match params.get(P_SEED) {
        Some("time") => std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u32)
            .unwrap_or(DEFAULT_SEED),
        Some(_) => params.get_u64(P_SEED)? as u32,
        None => DEFAULT_SEED,
    };
    let breedthreads = params.get_usize_or(P_BREEDTHREADS, 1)?;

    let mut state = EvolutionState::new(vec![species], breedthreads, seed);
    let subpops = params.get_usize_or("pop.subpops", 1)?.max(1);
    state.population = Population::new(
        (0..subpops)
            .map(|_| Subpopulation::new(SpeciesId(0)))
            .collect(),
    );
    Ok(state)
}

/// A restart file: the parameter database that shaped the run plus the
/// state snapshot.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SlaveCheckpoint {
    pub params: Vec<(String, String)>,
    pub state: Checkpoint,
}

impl SlaveCheckpoint {
    pub fn save(
        path: impl AsRef<std::path::Path>,
        params: &ParameterDatabase,
        state: &EvolutionState,
    ) -> Result<()> {
        let snapshot = SlaveCheckpoint {
            params: params
                .entries()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            state: Checkpoint::of(state),
        };
        let encoded = serde_json::to_string(&snapshot)
            .map_err(|e| brood_err!(Codec: "checkpoint encode failed: {}", e))?;
        std::fs::write(path, encoded)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<(ParameterDatabase, Checkpoint)> {
        let contents = std::fs::read_to_string(path)?;
        let snapshot: SlaveCheckpoint = serde_json::from_str(&contents)
            .map_err(|e| brood_err!(Codec: "checkpoint decode failed: {}", e))?;

        let mut params = ParameterDatabase::new();
        for (key, value) in snapshot.params {
            params.set(key, value);
        }
        Ok((params, snapshot.state))
    }
}

pub struct Slave {
    config: SlaveConfig,
    params: ParameterDatabase,
    registry: Registry,
    state: EvolutionState,
    problem: Arc<dyn Problem>,
    grouped: Arc<dyn GroupedProblem>,
}

impl Slave {
    pub fn from_params(params: ParameterDatabase) -> Result<Self> {
        let mut sink = ErrorSink::new();
        let config = SlaveConfig::from_params(&params, &mut sink);
        sink.exit_if_errors()?;
        let config =
            config.ok_or_else(|| brood_err!(InvalidConfig: "slave configuration incomplete"))?;

        let state_tag = params.get_string_or(P_STATE, "simple");
        if state_tag != "simple" {
            brood_bail!(InvalidConfig: "state '{}' is not recognized", state_tag);
        }

        let registry = default_registry();
        let state = build_state(&params)?;
        let problem_tag = params.get_string_or(P_PROBLEM, "genome-sum");
        let problem = registry.create_problem(&problem_tag, &params)?;

        Ok(Slave {
            config,
            params,
            registry,
            state,
            problem,
            grouped: Arc::new(GenomeSumContest::new()),
        })
    }

    /// Restore population, generation, and generator state from a restart
    /// snapshot.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        checkpoint.restore(&mut self.state);
    }

    /// Serve masters until one sends the shutdown opcode. Returns the
    /// process exit code.
    pub fn run(&mut self) -> Result<i32> {
        loop {
            let stream = self.connect();
            let mut conn = self.handshake(stream)?;

            match self.serve(&mut conn) {
                Ok(code) => return Ok(code),
                Err(error) if error.is_io() => {
                    tracing::warn!(error = %error, "lost the master; reconnecting");
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn connect(&self) -> TcpStream {
        let address = (self.config.host.as_str(), self.config.port);
        loop {
            match TcpStream::connect(address) {
                Ok(stream) => return stream,
                Err(error) => {
                    tracing::debug!(error = %error, host = %self.config.host,
                        port = self.config.port, "master not reachable yet");
                    std::thread::sleep(RECONNECT_DELAY);
                }
            }
        }
    }

    fn handshake(&mut self, stream: TcpStream) -> Result<Connection> {
        let name = match &self.config.name {
            Some(name) => name.clone(),
            None => {
                let address = stream
                    .local_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "unknown".to_owned());
                let millis = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_millis())
                    .unwrap_or(0);
                format!("{}/{}", address, millis)
            }
        };

        let mut conn = Connection::wrap(stream, self.config.compression)?;
        wire::write_string(&mut conn, &name)?;
        conn.flush()?;
        self.state.random[0].read_state(&mut conn)?;

        tracing::info!(name = %name, "handshake complete; adopted master generator state");
        Ok(conn)
    }

    fn serve(&mut self, conn: &mut Connection) -> Result<i32> {
        loop {
            let opcode = Opcode::from_byte(conn.read_u8()?)?;
            match opcode {
                Opcode::Shutdown => {
                    tracing::info!("master requested shutdown");
                    return Ok(0);
                }
                Opcode::EvaluateSimple => {
                    let (subpop, batch) = self.read_simple_request(conn)?;
                    self.respond_simple(conn, subpop, batch).map_err(fatal_write)?;
                }
                Opcode::EvaluateGrouped => {
                    let (members, count_victories_only) = self.read_grouped_request(conn)?;
                    self.respond_grouped(conn, members, count_victories_only)
                        .map_err(fatal_write)?;
                }
                Opcode::Checkpoint => {
                    self.state.random[0]
                        .write_state(conn)
                        .and_then(|_| conn.flush())
                        .map_err(fatal_write)?;
                }
            }
        }
    }

    fn species_of_subpop(&self, subpop: usize) -> Result<(SpeciesId, &Species)> {
        let id = self
            .state
            .population
            .subpops
            .get(subpop)
            .ok_or_else(|| brood_err!(Protocol: "request names unknown subpopulation {}", subpop))?
            .species;
        Ok((id, self.state.species(id)?))
    }

    fn read_simple_request(
        &mut self,
        conn: &mut Connection,
    ) -> Result<(usize, Vec<(Individual, bool)>)> {
        let count = wire::read_count(conn)?;
        let subpop = wire::read_count(conn)?;
        let (id, species) = self.species_of_subpop(subpop)?;

        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let individual = codec::read_individual(conn, id, species)?;
            let update = codec::read_bool(conn)?;
            batch.push((individual, update));
        }
        Ok((subpop, batch))
    }

    fn respond_simple(
        &mut self,
        conn: &mut Connection,
        subpop: usize,
        batch: Vec<(Individual, bool)>,
    ) -> Result<()> {
        let updates: Vec<bool> = batch.iter().map(|(_, update)| *update).collect();
        let individuals: Vec<Individual> =
            batch.into_iter().map(|(individual, _)| individual).collect();

        let evaluated = if self.config.run_evolve {
            self.re_evolve(individuals)?
        } else {
            let (_, species) = self.species_of_subpop(subpop)?;
            let mut evaluated = individuals;
            for individual in evaluated.iter_mut() {
                self.problem.evaluate(individual, species, subpop, 0)?;
            }
            evaluated
        };

        for (individual, update) in evaluated.iter().zip(updates) {
            self.write_result(conn, individual, update)?;
        }
        conn.flush()
    }

    fn read_grouped_request(
        &mut self,
        conn: &mut Connection,
    ) -> Result<(Vec<GroupMember>, bool)> {
        let count = wire::read_count(conn)?;

        let mut members = Vec::with_capacity(count);
        for _ in 0..count {
            let subpop = wire::read_count(conn)?;
            let (id, species) = self.species_of_subpop(subpop)?;
            let individual = codec::read_individual(conn, id, species)?;
            let update_fitness = codec::read_bool(conn)?;
            members.push(GroupMember {
                subpop,
                individual,
                update_fitness,
            });
        }

        let count_victories_only = codec::read_bool(conn)?;
        Ok((members, count_victories_only))
    }

    fn respond_grouped(
        &mut self,
        conn: &mut Connection,
        mut members: Vec<GroupMember>,
        count_victories_only: bool,
    ) -> Result<()> {
        self.grouped
            .evaluate_group(&mut members, &self.state.species, count_victories_only)?;

        for member in &members {
            self.write_result(conn, &member.individual, member.update_fitness)?;
        }
        conn.flush()
    }

    fn write_result(
        &self,
        conn: &mut Connection,
        individual: &Individual,
        update: bool,
    ) -> Result<()> {
        use crate::protocol::ResultKind;

        if self.config.return_individuals {
            conn.write_u8(ResultKind::Individual.as_byte())?;
            codec::write_individual(conn, individual)?;
        } else if update {
            conn.write_u8(ResultKind::Fitness.as_byte())?;
            codec::write_bool(conn, individual.evaluated)?;
            codec::write_fitness(conn, &individual.fitness)?;
        } else {
            conn.write_u8(ResultKind::Nothing.as_byte())?;
        }
        Ok(())
    }

    /// Evolve the incoming batch locally in a throwaway state for up to
    /// `runtime` milliseconds, then hand back the best of the final brood.
    fn re_evolve(&self, individuals: Vec<Individual>) -> Result<Vec<Individual>> {
        let count = individuals.len();
        if count == 0 {
            return Ok(individuals);
        }

        let mut state = build_state(&self.params)?;
        state.population.subpops.truncate(1);

        let breeder_tag = self.params.get_string_or(P_BREED, "mu-comma-lambda");
        if breeder_tag == "spea2" {
            state.population.subpops[0].archive_size = self
                .params
                .get_usize_or("spea2.archive-size", count.div_ceil(2))?
                .clamp(1, count);
        }
        state.population.subpops[0].individuals = individuals;

        let breeder = self.registry.create_breeder(&breeder_tag, &self.params, 1)?;
        let max_generations = if self.params.has(P_GENERATIONS) {
            Some(self.params.get_usize(P_GENERATIONS)?)
        } else {
            None
        };

        let mut evolution = Evolution::new(
            state,
            breeder,
            Arc::clone(&self.problem),
            max_generations,
        );

        let deadline = Instant::now() + self.config.run_time;
        let mut generations = 0usize;
        loop {
            if evolution.evolve()? == EvolveOutcome::Done {
                break;
            }
            generations += 1;
            if Instant::now() >= deadline {
                break;
            }
        }
        evolution.evaluate()?;
        tracing::debug!(generations, "re-evolution finished");

        let mut brood = evolution.state.population.subpops.swap_remove(0);
        if brood.len() < count {
            brood_bail!(Evaluation:
                "re-evolution produced {} individuals for a batch of {}", brood.len(), count);
        }
        brood.rank_sort();
        brood.individuals.truncate(count);
        Ok(brood.individuals)
    }
}

/// Failures while writing results back are not survivable; strip the I/O
/// flavor so the reconnect logic does not mistake them for a lost read.
fn fatal_write(error: BroodError) -> BroodError {
    match error {
        BroodError::Io { source } => {
            brood_err!(Protocol: "failed writing results to the master: {}", source)
        }
        other => other,
    }
}
