// ufa — unit & frame analyzer
//
// Library root. Analysis phases are added as modules here.

pub mod compdb;
pub mod cursor;
pub mod diag;
pub mod dimension;
pub mod expr;
pub mod interproc;
pub mod message;
pub mod pool;
pub mod priors;
pub mod provider;
pub mod scope;
pub mod summary;
pub mod typeinfo;
pub mod walker;
