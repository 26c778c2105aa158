mod csv_read;
mod fields;
mod resolve;
mod run;
mod store;
#[cfg(test)]
mod tests;
mod transform;

pub use run::run;
