pub mod pipelines;

#[cfg(test)]
pub(crate) mod testing;
