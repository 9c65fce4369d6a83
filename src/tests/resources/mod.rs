mod compute_tests;
mod network_tests;
mod optional_tests;
