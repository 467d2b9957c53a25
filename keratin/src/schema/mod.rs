pub mod compile;
pub mod stringize;
pub mod ty;

#[cfg(test)]
mod compile_test;
