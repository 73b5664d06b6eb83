mod utils;

mod propagation_tests;
