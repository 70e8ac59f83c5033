pub mod ast;
pub mod codegen;
pub mod constraints;
pub mod driver;
pub mod lexer;
pub mod loader;
pub mod output;
pub mod parser;
pub mod semantic;

pub use driver::{
    generate, generate_with, GenerateError, GenerateOptions, GenerateReport, OutputMode,
};
