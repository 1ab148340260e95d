use brood_core::*;
use brood_eval::*;
use std::net::TcpListener;
use std::thread::JoinHandle;

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn slave_params(port: u16) -> ParameterDatabase {
    let mut params = ParameterDatabase::new();
    params.set("eval.master.host", "127.0.0.1");
    params.set("eval.master.port", port.to_string());
    params.set("eval.slave-name", "test-slave");
    params.set("species.genome-type", "int");
    params.set("species.genome-size", "3");
    params
}

fn start_slave(params: ParameterDatabase) -> JoinHandle<Result<i32>> {
    std::thread::spawn(move || Slave::from_params(params)?.run())
}

fn slave_species(params: &ParameterDatabase) -> Species {
    build_state(params).unwrap().species[0].clone()
}

fn int_individual(species: &Species, words: Vec<i32>) -> Individual {
    let mut individual = species.new_individual(SpeciesId(0));
    individual.genome = Genome::Int(words);
    individual
}

#[test]
fn slave_shuts_down_cleanly_on_opcode_zero() {
    let (listener, port) = listener();
    let params = slave_params(port);
    let handle = start_slave(params);

    let rng = MersenneTwister::new(1);
    let master = MasterConnection::accept(&listener, &rng, false).unwrap();
    assert_eq!(master.slave_name(), "test-slave");
    master.shutdown().unwrap();

    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn evaluate_simple_returns_fitness_only_where_requested() {
    let (listener, port) = listener();
    let params = slave_params(port);
    let species = slave_species(&params);
    let handle = start_slave(params);

    let rng = MersenneTwister::new(1);
    let mut master = MasterConnection::accept(&listener, &rng, false).unwrap();

    let batch = vec![
        int_individual(&species, vec![1, 2, 3]),
        int_individual(&species, vec![4, 5, 6]),
    ];
    let replies = master
        .evaluate_simple(0, &batch, &[true, false], &species)
        .unwrap();

    assert_eq!(replies.len(), 2);
    assert_eq!(
        replies[0],
        EvalReply::Fitness {
            evaluated: true,
            fitness: Fitness::Scalar(6.0),
        }
    );
    assert_eq!(replies[1], EvalReply::Nothing);

    master.shutdown().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn evaluate_simple_can_return_whole_individuals() {
    let (listener, port) = listener();
    let mut params = slave_params(port);
    params.set("eval.return-inds", "true");
    let species = slave_species(&params);
    let handle = start_slave(params);

    let rng = MersenneTwister::new(1);
    let mut master = MasterConnection::accept(&listener, &rng, false).unwrap();

    let batch = vec![int_individual(&species, vec![7, 0, 2])];
    let replies = master
        .evaluate_simple(0, &batch, &[false], &species)
        .unwrap();

    match &replies[0] {
        EvalReply::Individual(returned) => {
            assert_eq!(returned.genome, Genome::Int(vec![7, 0, 2]));
            assert!(returned.evaluated);
            assert_eq!(returned.fitness, Fitness::Scalar(9.0));
        }
        other => panic!("expected a full individual, got {:?}", other),
    }

    master.shutdown().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn compressed_streams_carry_the_same_protocol() {
    let (listener, port) = listener();
    let mut params = slave_params(port);
    params.set("eval.compression", "true");
    let species = slave_species(&params);
    let handle = start_slave(params);

    let rng = MersenneTwister::new(5);
    let mut master = MasterConnection::accept(&listener, &rng, true).unwrap();

    let batch = vec![
        int_individual(&species, vec![10, 10, 10]),
        int_individual(&species, vec![1, 1, 1]),
    ];
    let replies = master
        .evaluate_simple(0, &batch, &[true, true], &species)
        .unwrap();

    assert_eq!(
        replies[0],
        EvalReply::Fitness {
            evaluated: true,
            fitness: Fitness::Scalar(30.0),
        }
    );
    assert_eq!(
        replies[1],
        EvalReply::Fitness {
            evaluated: true,
            fitness: Fitness::Scalar(3.0),
        }
    );

    master.shutdown().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn grouped_evaluation_counts_victories() {
    let (listener, port) = listener();
    let params = slave_params(port);
    let species = slave_species(&params);
    let handle = start_slave(params);

    let rng = MersenneTwister::new(1);
    let mut master = MasterConnection::accept(&listener, &rng, false).unwrap();

    let batch = vec![
        (0usize, int_individual(&species, vec![1, 2, 3]), true),
        (0usize, int_individual(&species, vec![5, 5, 5]), true),
    ];
    let replies = master
        .evaluate_grouped(&batch, true, std::slice::from_ref(&species))
        .unwrap();

    assert_eq!(
        replies[0],
        EvalReply::Fitness {
            evaluated: true,
            fitness: Fitness::Scalar(0.0),
        }
    );
    assert_eq!(
        replies[1],
        EvalReply::Fitness {
            evaluated: true,
            fitness: Fitness::Scalar(1.0),
        }
    );

    master.shutdown().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn generator_state_survives_the_wire_round_trip() {
    let (listener, port) = listener();
    let params = slave_params(port);
    let handle = start_slave(params);

    let mut master_rng = MersenneTwister::new(777);
    for _ in 0..123 {
        master_rng.next_u32();
    }

    let mut master = MasterConnection::accept(&listener, &master_rng, false).unwrap();

    // The slave adopted the master's state at handshake; a checkpoint reads
    // it back, and both generators must continue identically.
    let mut recovered = MersenneTwister::new(0);
    master.checkpoint(&mut recovered).unwrap();

    for _ in 0..10_000 {
        assert_eq!(master_rng.next_u32(), recovered.next_u32());
    }

    master.shutdown().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn run_evolve_improves_the_batch_locally() {
    let (listener, port) = listener();
    let mut params = slave_params(port);
    params.set("run-evolve", "true");
    params.set("runtime", "200");
    params.set("generations", "3");
    params.set("es.mu.0", "2");
    params.set("es.lambda.0", "4");
    params.set("mutate.rate", "0.5");
    let species = slave_species(&params);
    let handle = start_slave(params);

    let rng = MersenneTwister::new(1);
    let mut master = MasterConnection::accept(&listener, &rng, false).unwrap();

    let batch: Vec<Individual> = (0..4)
        .map(|i| int_individual(&species, vec![i, i, i]))
        .collect();
    let replies = master
        .evaluate_simple(0, &batch, &[true, true, true, true], &species)
        .unwrap();

    assert_eq!(replies.len(), 4);
    for reply in &replies {
        match reply {
            EvalReply::Fitness { evaluated, .. } => assert!(*evaluated),
            other => panic!("expected fitness replies, got {:?}", other),
        }
    }

    master.shutdown().unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn missing_master_parameters_are_reported_together() {
    let mut params = ParameterDatabase::new();
    params.set("eval.compression", "maybe");

    let mut sink = ErrorSink::new();
    let config = SlaveConfig::from_params(&params, &mut sink);
    assert!(config.is_none());

    let err = sink.exit_if_errors().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("eval.master.host"));
    assert!(message.contains("eval.master.port"));
    assert!(message.contains("eval.compression"));
}
