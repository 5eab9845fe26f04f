pub mod reference_pool;
