//! different utility modules used throughout the project
/// logger setup and csv reports of convergence results
pub mod logger;
/// png plots of resampled curves and convergence history
pub mod plots;
/// typed study configuration built on the task document parser
pub mod study_config;
/// parse document with structure like " title1 key1: value1, value2 key2: value2 title2 key3:value3, value4" into HashMap
pub mod task_parser;
///
mod task_parser_tests;
