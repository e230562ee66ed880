mod common;
mod deal;
