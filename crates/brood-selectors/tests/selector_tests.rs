mod utilities;

#[cfg(test)]
mod selector_tests {
    use crate::utilities::population_utils;
    use brood_core::*;
    use brood_selectors::*;
    use rstest::*;

    fn select_all(
        selector: &mut dyn Selector,
        subpop: &Subpopulation,
        species: &Species,
        mu: usize,
        lambda: usize,
        start: usize,
        count: usize,
    ) -> Vec<usize> {
        let mut rng = MersenneTwister::new(42);
        let mut counter = ProducedCounter::new(start);
        let mut selected = Vec::with_capacity(count);

        for _ in 0..count {
            let mut ctx = BreedContext {
                parents: subpop,
                species,
                rng: &mut rng,
                counter: &mut counter,
                mu,
                lambda,
                subpop: 0,
                generation: 0,
                thread: 0,
            };
            selected.push(selector.select(&mut ctx).unwrap());
        }
        selected
    }

    #[rstest]
    #[case(2, 10, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1])]
    #[case(5, 10, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4])]
    #[case(1, 4, vec![0, 0, 0, 0])]
    fn es_selector_walks_parent_blocks(
        #[case] mu: usize,
        #[case] lambda: usize,
        #[case] expected: Vec<usize>,
    ) {
        let mut subpop = population_utils::scalar_subpop(&[1.0, 9.0, 5.0, 3.0, 7.0]);
        subpop.rank_sort();
        let species = population_utils::scalar_species();

        let mut selector = EsSelector::new();
        let selected = select_all(&mut selector, &subpop, &species, mu, lambda, 0, lambda);

        assert_eq!(selected, expected);
    }

    #[rstest]
    #[case(2, 10, 5, vec![1, 1, 1, 1, 1])]
    #[case(5, 10, 6, vec![3, 3, 4, 4])]
    fn es_selector_honors_thread_slot_base(
        #[case] mu: usize,
        #[case] lambda: usize,
        #[case] start: usize,
        #[case] expected: Vec<usize>,
    ) {
        let mut subpop = population_utils::scalar_subpop(&[1.0, 9.0, 5.0, 3.0, 7.0]);
        subpop.rank_sort();
        let species = population_utils::scalar_species();

        let mut selector = EsSelector::new();
        let selected = select_all(
            &mut selector,
            &subpop,
            &species,
            mu,
            lambda,
            start,
            expected.len(),
        );

        assert_eq!(selected, expected);
    }

    #[test]
    fn es_selector_records_once_per_selection() {
        let mut subpop = population_utils::scalar_subpop(&[1.0, 2.0, 3.0]);
        subpop.rank_sort();
        let species = population_utils::scalar_species();

        let mut rng = MersenneTwister::new(1);
        let mut counter = ProducedCounter::new(0);
        let mut selector = EsSelector::new();

        for expected in 1..=3 {
            let mut ctx = BreedContext {
                parents: &subpop,
                species: &species,
                rng: &mut rng,
                counter: &mut counter,
                mu: 1,
                lambda: 3,
                subpop: 0,
                generation: 0,
                thread: 0,
            };
            selector.select(&mut ctx).unwrap();
            assert_eq!(counter.produced(), expected);
        }
    }

    #[test]
    fn es_selector_refuses_to_run_outside_es_breeding() {
        let subpop = population_utils::scalar_subpop(&[1.0, 2.0]);
        let species = population_utils::scalar_species();

        let mut rng = MersenneTwister::new(1);
        let mut counter = ProducedCounter::new(0);
        let mut ctx = BreedContext {
            parents: &subpop,
            species: &species,
            rng: &mut rng,
            counter: &mut counter,
            mu: 0,
            lambda: 0,
            subpop: 0,
            generation: 0,
            thread: 0,
        };

        assert!(EsSelector::new().select(&mut ctx).is_err());
    }

    #[test]
    fn spea2_tournament_samples_only_the_archive() {
        let subpop = population_utils::spea2_subpop(
            &[
                vec![0.0, 1.0],
                vec![1.0, 2.0],
                vec![2.0, 3.0],
                vec![3.0, 4.0],
                vec![4.0, 5.0],
            ],
            &[0.9, 0.8, 0.2, 0.5, 0.1],
            3,
        );
        let species = population_utils::spea2_species(2);

        let mut rng = MersenneTwister::new(7);
        let mut counter = ProducedCounter::new(0);
        let mut selector = Spea2TournamentSelector::new(2);

        for _ in 0..200 {
            let mut ctx = BreedContext {
                parents: &subpop,
                species: &species,
                rng: &mut rng,
                counter: &mut counter,
                mu: 0,
                lambda: 0,
                subpop: 0,
                generation: 0,
                thread: 0,
            };
            let selected = selector.select(&mut ctx).unwrap();
            assert!(subpop.archive_range().contains(&selected));
        }

        // Archive tournaments never touch the production counter.
        assert_eq!(counter.produced(), 0);
    }

    #[test]
    fn spea2_tournament_prefers_lower_archive_ranks() {
        let subpop = population_utils::spea2_subpop(
            &[vec![0.0, 1.0], vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]],
            &[2.0, 1.5, 0.9, 0.1],
            4,
        );
        let species = population_utils::spea2_species(2);

        let mut rng = MersenneTwister::new(11);
        let mut counter = ProducedCounter::new(0);
        // A tournament as large as the archive all but guarantees the best
        // rank appears among the entrants.
        let mut selector = Spea2TournamentSelector::new(16);

        let mut wins = 0;
        for _ in 0..100 {
            let mut ctx = BreedContext {
                parents: &subpop,
                species: &species,
                rng: &mut rng,
                counter: &mut counter,
                mu: 0,
                lambda: 0,
                subpop: 0,
                generation: 0,
                thread: 0,
            };
            if selector.select(&mut ctx).unwrap() == 3 {
                wins += 1;
            }
        }

        assert!(wins > 90);
    }
}
