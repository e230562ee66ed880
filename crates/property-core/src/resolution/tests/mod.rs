mod common;
mod matching;
mod service;
