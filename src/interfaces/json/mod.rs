pub mod context_reader;
