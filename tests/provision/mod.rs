mod bdd_steps;
mod scenarios;
pub mod test_doubles;
pub mod test_helpers;
