pub mod population_utils;
