mod exposition_tests;
mod parser_tests;
