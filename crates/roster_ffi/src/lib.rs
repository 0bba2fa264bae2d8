//! Flutter bridge for the roster board.

pub mod api;
