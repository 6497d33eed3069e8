pub mod rollup;
pub mod window;
pub mod wrong_answers;
