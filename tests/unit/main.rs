mod config_tests;
mod fusion_fixture_tests;
mod topics_tests;
